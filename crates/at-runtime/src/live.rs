//! Demo live-data source.
//!
//! Every topic is a random walk between 0 and 100, one value per tick.
//! Topics are independent; the walk starts over when a topic is reopened.

use std::time::Duration;

use at_04_live_data::{LiveError, LiveProducer, ProducerFactory, StreamProducer};
use futures::StreamExt;
use rand::Rng;
use serde_json::json;
use tokio::time::{interval, MissedTickBehavior};
use tokio_stream::wrappers::IntervalStream;
use tracing::debug;

const LOWER: f64 = 0.0;
const UPPER: f64 = 100.0;
const MAX_STEP: f64 = 5.0;

/// Opens a random walk for any topic under `prefix`.
#[derive(Debug, Clone)]
pub struct RandomWalkFactory {
    prefix: String,
    period: Duration,
}

impl RandomWalkFactory {
    pub fn new(prefix: impl Into<String>, period: Duration) -> Self {
        Self {
            prefix: prefix.into(),
            period,
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }
}

impl ProducerFactory for RandomWalkFactory {
    fn open(&self, topic: &str) -> Result<Box<dyn LiveProducer>, LiveError> {
        if !topic.starts_with(&self.prefix) {
            return Err(LiveError::UnknownTopic(topic.to_string()));
        }
        debug!(topic, period_ms = self.period.as_millis() as u64, "Opening random walk");

        let mut ticks = interval(self.period);
        ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut value = rand::thread_rng().gen_range(LOWER..UPPER);
        let stream = IntervalStream::new(ticks).map(move |_| {
            value = step(value, rand::thread_rng().gen_range(-MAX_STEP..=MAX_STEP));
            json!((value * 10.0).round() / 10.0)
        });
        Ok(Box::new(StreamProducer::from_values(stream)))
    }
}

/// Next walk position, reflected back into range.
fn step(value: f64, delta: f64) -> f64 {
    let next = value + delta;
    if next < LOWER {
        LOWER + (LOWER - next)
    } else if next > UPPER {
        UPPER - (next - UPPER)
    } else {
        next
    }
}
