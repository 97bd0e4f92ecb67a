//! # AdminTable Runtime
//!
//! Wires the subsystems into one server process.
//!
//! ## Startup Sequence
//!
//! 1. Parse the command line and load the gateway configuration
//! 2. Initialize logging from the `AT_*` environment
//! 3. Seed the demo stores and build the admin configuration
//! 4. Build the view pipeline with the configured page limits
//! 5. Start the live-data hub and the API gateway
//! 6. Serve until Ctrl+C, then stop the hub
//!
//! ```text
//! DemoData ──► AdminConfig ──► ViewPipeline ─┐
//!                                            ├──► ApiGatewayService ──► HTTP / WS
//! RandomWalkFactory ──► LiveDataHub ─────────┘
//! ```

#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod config;
pub mod demo;
pub mod live;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use at_03_view_pipeline::ViewPipeline;
use at_04_live_data::LiveDataHub;
use at_05_api_gateway::{ApiGatewayService, GatewayConfig};
use tracing::info;

use crate::demo::DemoData;
use crate::live::RandomWalkFactory;

/// Prefix of every topic the demo producer serves.
pub const TOPIC_PREFIX: &str = "some/topic/";

/// The assembled server.
pub struct AdminRuntime {
    data: DemoData,
    pipeline: Arc<ViewPipeline>,
    hub: Arc<LiveDataHub>,
    gateway: ApiGatewayService,
}

impl AdminRuntime {
    /// Build every subsystem. Fails on an invalid configuration before any
    /// socket is bound.
    pub fn new(config: GatewayConfig, live_interval: Duration) -> Result<Self> {
        info!("Creating AdminTable runtime");

        let data = DemoData::seed(TOPIC_PREFIX).context("Failed to seed demo data")?;

        let pipeline = ViewPipeline::new(demo::admin_config(&data))
            .and_then(|p| {
                p.with_page_limits(config.limits.default_per_page, config.limits.max_per_page)
            })
            .context("Invalid admin configuration")?;
        let pipeline = Arc::new(pipeline);

        let hub = Arc::new(LiveDataHub::new(Arc::new(RandomWalkFactory::new(
            TOPIC_PREFIX,
            live_interval,
        ))));

        let gateway = ApiGatewayService::new(config, Arc::clone(&pipeline), Arc::clone(&hub))
            .context("Failed to create API gateway")?;

        Ok(Self {
            data,
            pipeline,
            hub,
            gateway,
        })
    }

    pub fn data(&self) -> &DemoData {
        &self.data
    }

    pub fn pipeline(&self) -> Arc<ViewPipeline> {
        Arc::clone(&self.pipeline)
    }

    pub fn hub(&self) -> Arc<LiveDataHub> {
        Arc::clone(&self.hub)
    }

    pub fn gateway(&self) -> &ApiGatewayService {
        &self.gateway
    }

    /// Serve until `shutdown` resolves.
    pub async fn run<F>(&self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let http = &self.gateway.config().http;
        info!("===========================================");
        info!("  AdminTable Runtime v{}", env!("CARGO_PKG_VERSION"));
        info!("===========================================");
        info!(host = %http.host, port = http.port, "Serving admin API");

        self.gateway.start(shutdown).await?;

        info!("Shutdown complete");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use at_03_view_pipeline::ListQuery;
    use at_04_live_data::{LiveError, LiveEvent, LiveSubscriber, SubscriberId};

    #[tokio::test]
    async fn test_runtime_applies_page_limits() {
        let mut config = GatewayConfig::default();
        config.limits.default_per_page = 1;
        config.limits.max_per_page = 2;
        let runtime = AdminRuntime::new(config, Duration::from_millis(10)).unwrap();

        let list = runtime
            .pipeline()
            .handle_list(demo::USERS, ListQuery::default())
            .await
            .unwrap();
        assert_eq!(list.data.len(), 1);
        assert_eq!(list.pagination.total, 2);

        let err = runtime
            .pipeline()
            .handle_list(demo::USERS, ListQuery::default().per_page(3))
            .await
            .unwrap_err();
        assert_eq!(err.class().status_code(), 400);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = GatewayConfig::default();
        config.limits.default_per_page = 0;
        assert!(AdminRuntime::new(config, Duration::from_millis(10)).is_err());
    }

    #[tokio::test]
    async fn test_run_disabled_returns() {
        let mut config = GatewayConfig::default();
        config.http.enabled = false;
        let runtime = AdminRuntime::new(config, Duration::from_millis(10)).unwrap();
        runtime.run(std::future::pending()).await.unwrap();
    }

    /// Collects every value pushed to it.
    #[derive(Default)]
    struct Recorder {
        id: SubscriberId,
        values: parking_lot::Mutex<Vec<serde_json::Value>>,
    }

    #[async_trait::async_trait]
    impl LiveSubscriber for Recorder {
        fn id(&self) -> SubscriberId {
            self.id
        }

        async fn send(&self, event: &LiveEvent) -> Result<(), LiveError> {
            self.values.lock().push(event.value.clone());
            Ok(())
        }

        async fn close(&self) {}
    }

    #[tokio::test]
    async fn test_user_topics_are_served() {
        let runtime = AdminRuntime::new(GatewayConfig::default(), Duration::from_millis(5)).unwrap();
        let topic = runtime.data().users.get("1").unwrap()["topic_value"]
            .as_str()
            .unwrap()
            .to_string();

        let recorder = Arc::new(Recorder::default());
        runtime.hub().subscribe(&topic, recorder.clone()).unwrap();
        assert_eq!(runtime.hub().topic_count(), 1);

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!recorder.values.lock().is_empty());

        assert!(runtime.hub().subscribe("elsewhere", recorder.clone()).is_err());
        runtime.hub().shutdown().await;
    }
}
