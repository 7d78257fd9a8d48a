//! Accept loop wiring listener, pipeline and shutdown together.

use std::sync::Arc;

use crate::cache;
use crate::config::BridgeConfig;
use crate::error::WireResult;
use crate::lifecycle::Shutdown;
use crate::net::{serve_connection, FramingLimits, Listener, ListenerError};
use crate::routing::{Interface, Router};
use crate::server::Pipeline;

/// HTTP host for a set of interfaces.
#[derive(Debug, Clone)]
pub struct Server {
    pipeline: Arc<Pipeline>,
    limits: FramingLimits,
}

impl Server {
    pub fn new(pipeline: Pipeline, limits: FramingLimits) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
            limits,
        }
    }

    /// Build the router from `interfaces` and everything else from `config`.
    pub fn from_config(config: &BridgeConfig, interfaces: &[Arc<dyn Interface>]) -> WireResult<Self> {
        let router = Arc::new(Router::from_interfaces(interfaces)?);
        let cache = cache::from_config(&config.cache);
        let pipeline = Pipeline::from_config(router, &config.transport, cache);
        Ok(Self::new(pipeline, FramingLimits::from(&config.transport)))
    }

    pub fn pipeline(&self) -> &Arc<Pipeline> {
        &self.pipeline
    }

    /// Serve until `shutdown` triggers, then wait for in-flight transactions.
    pub async fn run(&self, listener: Listener, shutdown: &Shutdown) -> Result<(), ListenerError> {
        let mut signal = shutdown.subscribe();

        loop {
            tokio::select! {
                _ = signal.recv() => break,
                accepted = listener.accept() => {
                    let (stream, peer_addr, permit) = match accepted {
                        Ok(accepted) => accepted,
                        Err(ListenerError::Accept(e)) => {
                            tracing::warn!(error = %e, "Accept failed");
                            continue;
                        }
                        Err(e) => return Err(e),
                    };

                    let pipeline = Arc::clone(&self.pipeline);
                    let limits = self.limits;
                    tokio::spawn(async move {
                        let _permit = permit;
                        if let Err(e) = serve_connection(stream, pipeline, limits).await {
                            tracing::warn!(peer_addr = %peer_addr, error = %e, "Connection failed");
                        }
                    });
                }
            }
        }

        tracing::info!("Listener stopped, draining connections");
        if tokio::time::timeout(self.limits.read_timeout, listener.drain())
            .await
            .is_err()
        {
            tracing::warn!("Drain timed out");
        }
        Ok(())
    }
}
