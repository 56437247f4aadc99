//! Error types for the protocol layer.

/// Errors that can occur while turning raw transport input into
/// protocol values.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// The display name was empty (or only whitespace) after trimming.
    ///
    /// An empty identity key would collide with every other empty name,
    /// so it is refused before it reaches the session registry.
    #[error("identity name must not be empty")]
    EmptyIdentity,

    /// The raw command text did not contain a command name.
    #[error("invalid command: {0:?}")]
    InvalidCommand(String),
}
