/// Errors raised by a transport or one of its connections.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The peer went away before the operation finished.
    #[error("connection closed: {0}")]
    ConnectionClosed(String),

    /// Writing a frame failed.
    #[error("send failed: {0}")]
    SendFailed(#[source] std::io::Error),

    /// Reading a frame failed.
    #[error("receive failed: {0}")]
    ReceiveFailed(#[source] std::io::Error),

    /// Binding the listener or accepting a socket failed.
    #[error("accept failed: {0}")]
    AcceptFailed(#[source] std::io::Error),

    /// An accepted socket never became a usable connection.
    #[error("handshake failed: {0}")]
    HandshakeFailed(#[source] std::io::Error),
}
