/// Errors that can occur while instructing the host about a connection.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The host side stopped listening for actions.
    #[error("link closed: {0}")]
    Closed(String),
}
