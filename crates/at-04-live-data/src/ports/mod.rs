//! Ports: the producer side supplied by configuration and the subscriber
//! side supplied by the transport.

use async_trait::async_trait;

use crate::domain::error::LiveError;
use crate::domain::event::{LiveEvent, SubscriberId};

/// Source of values for one topic.
///
/// The hub polls `next` from a single task and never concurrently.
#[async_trait]
pub trait LiveProducer: Send {
    /// Wait for the next value.
    ///
    /// # Returns
    /// - `None`: the source is exhausted and the topic ends
    /// - `Some(Err(_))`: the source failed and the topic ends
    async fn next(&mut self) -> Option<Result<LiveEvent, LiveError>>;

    /// Release the source. Called once when the topic ends.
    async fn close(&mut self) {}
}

/// Opens producers by topic name.
pub trait ProducerFactory: Send + Sync {
    /// Called with the topic's map entry locked; keep it cheap and defer I/O
    /// to the producer's first `next`.
    fn open(&self, topic: &str) -> Result<Box<dyn LiveProducer>, LiveError>;
}

/// One connected client.
#[async_trait]
pub trait LiveSubscriber: Send + Sync {
    fn id(&self) -> SubscriberId;

    /// Deliver one event. An error drops the subscriber from its topic.
    async fn send(&self, event: &LiveEvent) -> Result<(), LiveError>;

    /// Called when the topic ends while the subscriber is still attached, or
    /// after a failed send.
    async fn close(&self);
}
