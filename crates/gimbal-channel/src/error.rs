/// Errors that can occur in the channel layer.
///
/// Every variant is fatal to the session that owns the channel: the
/// session layer moves to `Failed` and releases the channel when it sees
/// one of these.
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    /// The device path does not exist (unplugged, wrong name).
    #[error("port not found: {0}")]
    NotFound(String),

    /// The port exists but could not be opened, usually because another
    /// program holds it.
    #[error("permission denied (port may be open elsewhere): {0}")]
    PermissionDenied(String),

    /// The device did not accept the bytes in time.
    #[error("write timed out")]
    WriteTimeout,

    /// The channel was already closed.
    #[error("channel closed")]
    Closed,

    /// Any other I/O failure on the underlying stream.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// A serial driver error that carries no I/O error kind.
    #[error("serial error: {0}")]
    Serial(String),
}
