//! `LiveDataHub`: one producer task per topic, fanned out to every
//! subscriber of that topic.

use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use futures::future::join_all;
use futures::FutureExt;
use tokio::sync::Notify;
use tokio::task::AbortHandle;
use tracing::{debug, error, info, warn};

use crate::domain::error::LiveError;
use crate::domain::event::SubscriberId;
use crate::ports::{LiveProducer, LiveSubscriber, ProducerFactory};

type Topics = DashMap<String, TopicEntry>;
type Client = Arc<dyn LiveSubscriber>;

struct TopicEntry {
    /// Distinguishes this topic instance from a later one with the same name.
    generation: u64,
    clients: HashMap<SubscriberId, Client>,
    /// Signalled when `clients` becomes empty.
    emptied: Arc<Notify>,
    task: Option<AbortHandle>,
}

/// Why a topic task stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
enum StopReason {
    NoSubscribers,
    Exhausted,
    ProducerFailed(String),
    /// Entry removed from outside, e.g. by `shutdown`.
    Detached,
}

/// Reference-counted fan-out of live values.
///
/// A topic exists while it has subscribers. The first subscription opens a
/// producer through the factory and spawns the topic task; later ones only
/// join the client set. The task ends when the last subscriber leaves or the
/// producer ends, and then closes the producer and any remaining clients.
///
/// ```text
/// subscribe(t, c) ──► entry(t) ──vacant──► factory.open(t) ──► spawn task
///                              └─occupied─► clients += c
///
/// task: loop {
///     clients empty?          ──► remove entry, stop
///     next() | emptied        ──► value
///     join_all(send to all)   ──► drop failed clients
/// }
/// ```
pub struct LiveDataHub {
    topics: Arc<Topics>,
    factory: Arc<dyn ProducerFactory>,
    next_generation: AtomicU64,
}

impl LiveDataHub {
    pub fn new(factory: Arc<dyn ProducerFactory>) -> Self {
        Self {
            topics: Arc::new(DashMap::new()),
            factory,
            next_generation: AtomicU64::new(1),
        }
    }

    /// Attach `client` to `topic`, starting its producer if needed.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn subscribe(&self, topic: &str, client: Client) -> Result<(), LiveError> {
        let id = client.id();
        match self.topics.entry(topic.to_string()) {
            Entry::Occupied(mut occupied) => {
                occupied.get_mut().clients.insert(id, client);
                debug!(topic, subscriber = %id, "Joined live topic");
            }
            Entry::Vacant(vacant) => {
                let producer = self.factory.open(topic)?;
                let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);
                let emptied = Arc::new(Notify::new());

                let task = tokio::spawn(run_topic(
                    Arc::clone(&self.topics),
                    topic.to_string(),
                    generation,
                    producer,
                    Arc::clone(&emptied),
                ));

                let mut entry = vacant.insert(TopicEntry {
                    generation,
                    clients: HashMap::new(),
                    emptied,
                    task: Some(task.abort_handle()),
                });
                entry.clients.insert(id, client);
                info!(topic, generation, subscriber = %id, "Started live topic");
            }
        }
        Ok(())
    }

    /// Detach one subscriber. Returns whether it was attached.
    ///
    /// Delivery to the remaining subscribers is not interrupted.
    pub fn unsubscribe(&self, topic: &str, id: SubscriberId) -> bool {
        let (removed, emptied) = match self.topics.get_mut(topic) {
            Some(mut entry) => {
                let removed = entry.clients.remove(&id).is_some();
                let emptied = entry.clients.is_empty().then(|| Arc::clone(&entry.emptied));
                (removed, emptied)
            }
            None => (false, None),
        };
        // outside the shard lock
        if let Some(notify) = emptied {
            notify.notify_one();
        }
        if removed {
            debug!(topic, subscriber = %id, "Left live topic");
        }
        removed
    }

    pub fn is_active(&self, topic: &str) -> bool {
        self.topics.contains_key(topic)
    }

    pub fn topic_count(&self) -> usize {
        self.topics.len()
    }

    pub fn subscriber_count(&self, topic: &str) -> usize {
        self.topics.get(topic).map_or(0, |e| e.clients.len())
    }

    pub fn total_subscribers(&self) -> usize {
        self.topics.iter().map(|e| e.clients.len()).sum()
    }

    /// Stop every topic task and close all subscribers.
    pub async fn shutdown(&self) {
        let names: Vec<String> = self.topics.iter().map(|e| e.key().clone()).collect();
        let mut clients = Vec::new();
        for name in names {
            if let Some((_, entry)) = self.topics.remove(&name) {
                if let Some(task) = &entry.task {
                    task.abort();
                }
                clients.extend(entry.clients.into_values());
            }
        }
        info!(subscribers = clients.len(), "Live data hub shut down");
        join_all(clients.iter().map(|c| c.close())).await;
    }
}

/// Removes the topic entry when the task ends, including on abort.
struct TopicGuard {
    topics: Arc<Topics>,
    topic: String,
    generation: u64,
}

impl TopicGuard {
    /// Remove this topic's entry if it is still ours and hand back the
    /// clients that were attached.
    fn detach(&self) -> Vec<Client> {
        self.topics
            .remove_if(&self.topic, |_, e| e.generation == self.generation)
            .map(|(_, entry)| entry.clients.into_values().collect())
            .unwrap_or_default()
    }
}

impl Drop for TopicGuard {
    fn drop(&mut self) {
        let clients = self.detach();
        if clients.is_empty() {
            return;
        }
        // only reached when the task was aborted mid-loop
        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            handle.spawn(async move {
                join_all(clients.iter().map(|c| c.close())).await;
            });
        }
    }
}

async fn run_topic(
    topics: Arc<Topics>,
    topic: String,
    generation: u64,
    mut producer: Box<dyn LiveProducer>,
    emptied: Arc<Notify>,
) {
    let guard = TopicGuard {
        topics: Arc::clone(&topics),
        topic: topic.clone(),
        generation,
    };

    let outcome = AssertUnwindSafe(pump(
        &topics,
        &topic,
        generation,
        producer.as_mut(),
        &emptied,
    ))
    .catch_unwind()
    .await;

    match outcome {
        Ok(StopReason::ProducerFailed(e)) => {
            warn!(topic = %topic, generation, error = %e, "Live producer failed")
        }
        Ok(reason) => info!(topic = %topic, generation, ?reason, "Live topic stopped"),
        Err(_) => error!(topic = %topic, generation, "Live topic task panicked"),
    }

    let remaining = guard.detach();
    producer.close().await;
    join_all(remaining.iter().map(|c| c.close())).await;
}

async fn pump(
    topics: &Topics,
    topic: &str,
    generation: u64,
    producer: &mut dyn LiveProducer,
    emptied: &Notify,
) -> StopReason {
    loop {
        if topics
            .remove_if(topic, |_, e| e.generation == generation && e.clients.is_empty())
            .is_some()
        {
            return StopReason::NoSubscribers;
        }

        let next = tokio::select! {
            _ = emptied.notified() => continue,
            next = producer.next() => next,
        };
        let event = match next {
            None => return StopReason::Exhausted,
            Some(Err(e)) => return StopReason::ProducerFailed(e.to_string()),
            Some(Ok(event)) => event,
        };

        let clients: Vec<Client> = match topics.get(topic) {
            Some(e) if e.generation == generation => e.clients.values().cloned().collect(),
            _ => return StopReason::Detached,
        };

        let results = join_all(clients.iter().map(|c| {
            let event = &event;
            async move { c.send(event).await }
        }))
        .await;

        let failed: Vec<&Client> = clients
            .iter()
            .zip(results)
            .filter_map(|(client, result)| match result {
                Ok(()) => None,
                Err(e) => {
                    warn!(topic, subscriber = %client.id(), error = %e, "Dropping live subscriber");
                    Some(client)
                }
            })
            .collect();
        if failed.is_empty() {
            continue;
        }

        if let Some(mut entry) = topics.get_mut(topic) {
            if entry.generation == generation {
                for client in &failed {
                    entry.clients.remove(&client.id());
                }
            }
        }
        join_all(failed.iter().map(|c| c.close())).await;
    }
}
