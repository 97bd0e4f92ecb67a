//! # Live Flows
//!
//! Live fields rendered by the detail view carry a topic; clients subscribe
//! to that topic on the live-data hub.
//!
//! ```text
//! handle_detail ──► {"type": "live", "topic": t, "initial": v}
//!                                       │
//! subscribe(t) ──► ProducerFactory::open(t) (once per topic) ──► fan-out
//! ```

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    use async_trait::async_trait;
    use parking_lot::Mutex;
    use serde_json::{json, Value};
    use tokio::sync::mpsc;
    use tokio::time::timeout;

    use at_01_column_model::LiveValue;
    use at_02_resolver::{ColumnSchema, InMemoryResolver};
    use at_03_view_pipeline::{AdminConfig, DetailView, ListView, Resource, ViewPipeline};
    use at_04_live_data::{
        FnProducerFactory, LiveDataHub, LiveError, LiveEvent, LiveProducer, LiveSubscriber,
        StreamProducer, SubscriberId,
    };

    // =========================================================================
    // FIXTURES
    // =========================================================================

    fn sensors() -> Arc<InMemoryResolver> {
        let rows = [
            json!({"id": 1, "name": "boiler", "topic": "sensors/boiler", "last": 71}),
            json!({"id": 2, "name": "chiller", "topic": "sensors/chiller", "last": 4}),
        ];
        Arc::new(
            InMemoryResolver::new(
                vec![
                    ColumnSchema::integer("id", "ID"),
                    ColumnSchema::text("name", "Name"),
                    ColumnSchema::text("topic", "Topic"),
                    ColumnSchema::integer("last", "Last"),
                ],
                "id",
            )
            .unwrap()
            .with_rows(rows.into_iter().filter_map(|r| r.as_object().cloned())),
        )
    }

    fn pipeline() -> ViewPipeline {
        let live = LiveValue {
            topic_ref: "topic".to_string(),
            initial_ref: Some("last".to_string()),
            history: false,
        };
        let config = AdminConfig::new("Plant").resource(
            Resource::new("Sensors", sensors())
                .with_list(ListView::new(vec!["name".into(), ("Reading", live.clone()).into()]))
                .with_detail(DetailView::new(vec![
                    "name".into(),
                    ("Reading", live).into(),
                ])),
        );
        ViewPipeline::new(config).unwrap()
    }

    /// Hub whose topics are fed by test-held senders.
    struct Feeds {
        hub: LiveDataHub,
        opened: Arc<AtomicUsize>,
        senders: Arc<Mutex<Vec<(String, mpsc::Sender<Value>)>>>,
    }

    impl Feeds {
        fn new() -> Self {
            let opened = Arc::new(AtomicUsize::new(0));
            let senders = Arc::new(Mutex::new(Vec::new()));
            let (counter, registry) = (Arc::clone(&opened), Arc::clone(&senders));
            let factory = FnProducerFactory::new(move |topic: &str| {
                if !topic.starts_with("sensors/") {
                    return Err(LiveError::UnknownTopic(topic.to_string()));
                }
                counter.fetch_add(1, Ordering::SeqCst);
                let (tx, rx) = mpsc::channel(16);
                registry.lock().push((topic.to_string(), tx));
                Ok(Box::new(StreamProducer::from_receiver(rx)) as Box<dyn LiveProducer>)
            });
            Self {
                hub: LiveDataHub::new(Arc::new(factory)),
                opened,
                senders,
            }
        }

        fn sender(&self, topic: &str) -> mpsc::Sender<Value> {
            self.senders
                .lock()
                .iter()
                .rev()
                .find(|(t, _)| t == topic)
                .map(|(_, tx)| tx.clone())
                .unwrap()
        }
    }

    /// Forwards received values to a channel the test reads.
    struct Client {
        id: SubscriberId,
        tx: mpsc::UnboundedSender<Value>,
        closed: AtomicUsize,
    }

    impl Client {
        fn new() -> (Arc<Self>, mpsc::UnboundedReceiver<Value>) {
            let (tx, rx) = mpsc::unbounded_channel();
            let client = Arc::new(Self {
                id: SubscriberId::new(),
                tx,
                closed: AtomicUsize::new(0),
            });
            (client, rx)
        }
    }

    #[async_trait]
    impl LiveSubscriber for Client {
        fn id(&self) -> SubscriberId {
            self.id
        }

        async fn send(&self, event: &LiveEvent) -> Result<(), LiveError> {
            self.tx
                .send(event.value.clone())
                .map_err(|e| LiveError::Send(e.to_string()))
        }

        async fn close(&self) {
            self.closed.fetch_add(1, Ordering::SeqCst);
        }
    }

    async fn recv(rx: &mut mpsc::UnboundedReceiver<Value>) -> Value {
        timeout(Duration::from_secs(2), rx.recv())
            .await
            .expect("timed out waiting for a live value")
            .expect("channel closed")
    }

    async fn wait_until(mut done: impl FnMut() -> bool) {
        timeout(Duration::from_secs(2), async {
            while !done() {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("condition not reached");
    }

    fn live_field(detail: &at_03_view_pipeline::DetailResponse) -> Value {
        detail
            .fields
            .iter()
            .find(|(head, _)| head.display == "Reading")
            .map(|(_, value)| value.clone())
            .unwrap()
    }

    // =========================================================================
    // DETAIL VIEW -> HUB
    // =========================================================================

    #[tokio::test]
    async fn test_detail_live_field_subscribes_and_receives() {
        let pipeline = pipeline();
        let feeds = Feeds::new();

        let detail = pipeline.handle_detail("Sensors", "1").await.unwrap();
        let field = live_field(&detail);
        assert_eq!(field["type"], "live");
        assert_eq!(field["initial"], 71);
        let topic = field["topic"].as_str().unwrap().to_string();

        let (client, mut rx) = Client::new();
        feeds.hub.subscribe(&topic, client).unwrap();

        feeds.sender(&topic).send(json!(72)).await.unwrap();
        assert_eq!(recv(&mut rx).await, json!(72));

        feeds.hub.shutdown().await;
    }

    #[tokio::test]
    async fn test_list_rows_share_nothing_across_topics() {
        let pipeline = pipeline();
        let feeds = Feeds::new();

        let list = pipeline
            .handle_list("Sensors", Default::default())
            .await
            .unwrap();
        let topics: Vec<String> = list
            .data
            .iter()
            .map(|row| row.last().unwrap()["topic"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(topics, vec!["sensors/boiler", "sensors/chiller"]);

        let (boiler, mut boiler_rx) = Client::new();
        let (chiller, mut chiller_rx) = Client::new();
        feeds.hub.subscribe(&topics[0], boiler).unwrap();
        feeds.hub.subscribe(&topics[1], chiller).unwrap();
        assert_eq!(feeds.hub.topic_count(), 2);

        feeds.sender(&topics[1]).send(json!(3)).await.unwrap();
        feeds.sender(&topics[0]).send(json!(70)).await.unwrap();
        assert_eq!(recv(&mut chiller_rx).await, json!(3));
        assert_eq!(recv(&mut boiler_rx).await, json!(70));

        feeds.hub.shutdown().await;
    }

    // =========================================================================
    // REFERENCE COUNTING
    // =========================================================================

    #[tokio::test]
    async fn test_many_subscribers_one_producer() {
        let feeds = Feeds::new();
        let mut receivers = Vec::new();
        for _ in 0..5 {
            let (client, rx) = Client::new();
            feeds.hub.subscribe("sensors/boiler", client).unwrap();
            receivers.push(rx);
        }
        assert_eq!(feeds.opened.load(Ordering::SeqCst), 1);
        assert_eq!(feeds.hub.subscriber_count("sensors/boiler"), 5);

        feeds.sender("sensors/boiler").send(json!(75)).await.unwrap();
        for rx in &mut receivers {
            assert_eq!(recv(rx).await, json!(75));
        }

        feeds.hub.shutdown().await;
    }

    #[tokio::test]
    async fn test_last_unsubscribe_stops_topic_and_reopen_starts_fresh() {
        let feeds = Feeds::new();
        let (a, _a_rx) = Client::new();
        let (b, mut b_rx) = Client::new();
        let (a_id, b_id) = (a.id(), b.id());

        feeds.hub.subscribe("sensors/boiler", a.clone()).unwrap();
        feeds.hub.subscribe("sensors/boiler", b).unwrap();

        assert!(feeds.hub.unsubscribe("sensors/boiler", a_id));
        feeds.sender("sensors/boiler").send(json!(1)).await.unwrap();
        assert_eq!(recv(&mut b_rx).await, json!(1));
        assert_eq!(a.closed.load(Ordering::SeqCst), 0);

        assert!(feeds.hub.unsubscribe("sensors/boiler", b_id));
        wait_until(|| !feeds.hub.is_active("sensors/boiler")).await;
        assert!(!feeds.hub.unsubscribe("sensors/boiler", b_id));

        let (c, mut c_rx) = Client::new();
        feeds.hub.subscribe("sensors/boiler", c).unwrap();
        assert_eq!(feeds.opened.load(Ordering::SeqCst), 2);
        feeds.sender("sensors/boiler").send(json!(2)).await.unwrap();
        assert_eq!(recv(&mut c_rx).await, json!(2));

        feeds.hub.shutdown().await;
    }

    #[tokio::test]
    async fn test_exhausted_producer_closes_clients() {
        let feeds = Feeds::new();
        let (client, _rx) = Client::new();
        feeds.hub.subscribe("sensors/boiler", client.clone()).unwrap();

        feeds.senders.lock().clear();
        wait_until(|| client.closed.load(Ordering::SeqCst) == 1).await;
        assert!(!feeds.hub.is_active("sensors/boiler"));
    }

    #[tokio::test]
    async fn test_unknown_topic_rejected_without_entry() {
        let feeds = Feeds::new();
        let (client, _rx) = Client::new();
        let err = feeds.hub.subscribe("weather/today", client).unwrap_err();
        assert_eq!(err, LiveError::UnknownTopic("weather/today".to_string()));
        assert_eq!(feeds.hub.topic_count(), 0);
        assert_eq!(feeds.opened.load(Ordering::SeqCst), 0);
    }
}
