//! Atomic session state and frame counters.
//!
//! Both cells are shared between the public client handle and the
//! connection task, so they use plain atomics instead of locks.

use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};

/// Lifecycle state of a session.
///
/// Transitions only move forward, except error/close which always resets
/// to `Disconnected`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum SessionState {
    Disconnected = 0,
    Negotiating = 1,
    Upgrading = 2,
    Connected = 3,
    Closing = 4,
}

impl SessionState {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => SessionState::Negotiating,
            2 => SessionState::Upgrading,
            3 => SessionState::Connected,
            4 => SessionState::Closing,
            _ => SessionState::Disconnected,
        }
    }
}

/// Lock-free cell holding a [`SessionState`].
pub struct AtomicSessionState(AtomicU8);

impl AtomicSessionState {
    pub fn new(state: SessionState) -> Self {
        Self(AtomicU8::new(state as u8))
    }

    #[inline]
    pub fn get(&self) -> SessionState {
        SessionState::from_u8(self.0.load(Ordering::Acquire))
    }

    #[inline]
    pub fn set(&self, state: SessionState) {
        self.0.store(state as u8, Ordering::Release);
    }

    #[inline]
    pub fn is_disconnected(&self) -> bool {
        self.get() == SessionState::Disconnected
    }

    #[inline]
    pub fn is_connected(&self) -> bool {
        self.get() == SessionState::Connected
    }

    #[inline]
    pub fn is_closing(&self) -> bool {
        self.get() == SessionState::Closing
    }
}

impl Default for AtomicSessionState {
    fn default() -> Self {
        Self::new(SessionState::Disconnected)
    }
}

/// Atomic frame counters shared with the connection task.
#[derive(Default)]
pub struct AtomicMetrics {
    frames_sent: AtomicU64,
    frames_received: AtomicU64,
}

impl AtomicMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn increment_sent(&self) {
        self.frames_sent.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn increment_received(&self) {
        self.frames_received.fetch_add(1, Ordering::Relaxed);
    }

    pub fn frames_sent(&self) -> u64 {
        self.frames_sent.load(Ordering::Relaxed)
    }

    pub fn frames_received(&self) -> u64 {
        self.frames_received.load(Ordering::Relaxed)
    }
}

/// Point-in-time metrics snapshot.
#[derive(Debug, Clone)]
pub struct Metrics {
    pub frames_sent: u64,
    pub frames_received: u64,
    pub state: SessionState,
}
