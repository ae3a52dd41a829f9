/// Callbacks for a single logical namespace multiplexed over the connection.
///
/// Implement this trait to receive the traffic of one namespace (`"/"` is
/// the default/root namespace). The client holds only a non-owning handle
/// to the subscriber; the registering application controls its lifetime,
/// and a subscriber that has been dropped is simply skipped during routing.
///
/// Callbacks are invoked from the connection task. They should return
/// quickly; anything long-running belongs on a channel or spawned task of
/// the application's own.
///
/// # Example
///
/// ```ignore
/// #[derive(Default)]
/// struct ChatSubscriber;
///
/// impl NamespaceSubscriber for ChatSubscriber {
///     fn on_event(&self, event: &str, body: &str) {
///         println!("{event}: {body}");
///     }
/// }
/// ```
pub trait NamespaceSubscriber: Send + Sync {
    /// The server acknowledged the namespace connection.
    ///
    /// `body` is the raw text of the CONNECT frame, usually empty.
    fn on_connect(&self, body: &str) {
        let _ = body;
    }

    /// The server requested this namespace be disconnected.
    ///
    /// The registry entry is removed right after this callback; if it was
    /// the root or last namespace the whole session is torn down.
    fn on_disconnect_requested(&self) {}

    /// An event frame arrived for this namespace.
    ///
    /// `body` is the event's single argument: decoded when it is a JSON
    /// string literal, raw argument text otherwise.
    fn on_event(&self, event: &str, body: &str);

    /// The server reported a namespace-scoped error.
    fn on_error(&self, body: &str) {
        let _ = body;
    }

    /// The underlying transport closed; no further callbacks will arrive.
    fn on_socket_closed(&self) {}
}
