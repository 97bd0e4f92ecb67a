use async_trait::async_trait;
use futures::stream::{BoxStream, Stream, StreamExt};
use serde_json::Value;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

use crate::domain::error::LiveError;
use crate::domain::event::LiveEvent;
use crate::ports::{LiveProducer, ProducerFactory};

/// Producer backed by any `Stream`. The topic ends when the stream does.
pub struct StreamProducer {
    stream: BoxStream<'static, Result<LiveEvent, LiveError>>,
}

impl StreamProducer {
    pub fn new<S>(stream: S) -> Self
    where
        S: Stream<Item = Result<LiveEvent, LiveError>> + Send + 'static,
    {
        Self {
            stream: stream.boxed(),
        }
    }

    /// Producer of plain values that cannot fail.
    pub fn from_values<S>(stream: S) -> Self
    where
        S: Stream<Item = Value> + Send + 'static,
    {
        Self::new(stream.map(|v| Ok(LiveEvent::new(v))))
    }

    /// Producer fed through a channel. The topic ends once every sender is
    /// dropped.
    pub fn from_receiver(rx: mpsc::Receiver<Value>) -> Self {
        Self::from_values(ReceiverStream::new(rx))
    }
}

#[async_trait]
impl LiveProducer for StreamProducer {
    async fn next(&mut self) -> Option<Result<LiveEvent, LiveError>> {
        self.stream.next().await
    }
}

/// Factory delegating to a closure.
pub struct FnProducerFactory<F>(F);

impl<F> FnProducerFactory<F>
where
    F: Fn(&str) -> Result<Box<dyn LiveProducer>, LiveError> + Send + Sync,
{
    pub fn new(f: F) -> Self {
        Self(f)
    }
}

impl<F> ProducerFactory for FnProducerFactory<F>
where
    F: Fn(&str) -> Result<Box<dyn LiveProducer>, LiveError> + Send + Sync,
{
    fn open(&self, topic: &str) -> Result<Box<dyn LiveProducer>, LiveError> {
        (self.0)(topic)
    }
}
