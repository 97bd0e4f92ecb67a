use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LiveError {
    /// The factory has no producer for this topic.
    #[error("Unknown live topic: {0}")]
    UnknownTopic(String),

    #[error("Producer failed: {0}")]
    Producer(String),

    /// Delivery to one subscriber failed. The subscriber is dropped.
    #[error("Send failed: {0}")]
    Send(String),

    #[error("Subscriber closed")]
    Closed,
}
