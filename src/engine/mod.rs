//! The synchronization engine
//!
//! Owns every moving part: the signed client, retry controller, rate
//! governor, and device registry, plus the explicit `shutdown` and
//! `connected` flags. There is no module-level state; hosts hold an
//! `Arc<Engine>` and forward their lifecycle events as plain method calls.

mod dispatch;
mod sync;

pub use dispatch::{map_command, map_infrared};

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::api::{ApiClient, Credentials};
use crate::config::Config;
use crate::governor::RateGovernor;
use crate::host::{ObjectDescriptor, Responder, StateWriter};
use crate::registry::DeviceRegistry;
use crate::retry::{Retrier, RetryContext, RetryPolicy};
use crate::{Error, Result};

/// Path of the connection indicator object
const CONNECTION_PATH: &str = "info.connection";

/// The synchronization engine
pub struct Engine {
    api: ApiClient,
    retrier: Retrier,
    governor: RateGovernor,
    registry: DeviceRegistry,
    state: Arc<dyn StateWriter>,
    config: Config,
    shutdown: AtomicBool,
    connected: AtomicBool,
}

impl Engine {
    /// Build an engine from validated configuration and a host state writer
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be constructed
    pub fn new(config: Config, state: Arc<dyn StateWriter>) -> Result<Self> {
        let credentials = Credentials {
            token: config.token.clone(),
            secret: config.secret.clone(),
        };
        let api = ApiClient::new(&config.base_url, credentials, config.request_timeout())?;
        let governor = RateGovernor::new(config.min_request_spacing());

        state.ensure_object(
            CONNECTION_PATH,
            &ObjectDescriptor::status("Connected to provider", crate::catalog::FieldType::Boolean),
        );

        Ok(Self {
            api,
            retrier: Retrier::new(RetryPolicy::default()),
            governor,
            registry: DeviceRegistry::new(),
            state,
            config,
            shutdown: AtomicBool::new(false),
            connected: AtomicBool::new(false),
        })
    }

    /// The device registry (observable truth)
    #[must_use]
    pub fn registry(&self) -> &DeviceRegistry {
        &self.registry
    }

    /// Whether the last provider exchange succeeded
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    /// Whether shutdown has begun
    #[must_use]
    pub fn is_shutting_down(&self) -> bool {
        self.shutdown.load(Ordering::SeqCst)
    }

    /// Begin shutdown: no new sweeps or commands are started, in-flight
    /// calls finish but their results are discarded
    pub fn shutdown(&self) {
        if !self.shutdown.swap(true, Ordering::SeqCst) {
            tracing::info!("engine shutting down");
        }
    }

    /// Run until shutdown: initial discovery, then the periodic sync sweep
    ///
    /// # Errors
    ///
    /// Returns error if initial discovery fails (startup aborts connecting)
    pub async fn run(self: &Arc<Self>) -> Result<()> {
        let count = self.discover().await?;
        tracing::info!(devices = count, "discovery complete");

        self.sync_all().await;

        let mut ticker = tokio::time::interval(self.config.poll_interval());
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        ticker.tick().await; // first tick fires immediately; already synced

        loop {
            ticker.tick().await;
            if self.is_shutting_down() {
                break;
            }
            if !self.is_connected() {
                // The provider went away; re-establish through a fresh
                // discovery before sweeping again
                match self.discover().await {
                    Ok(count) => tracing::info!(devices = count, "provider rediscovered"),
                    Err(err) => {
                        tracing::warn!(error = %err, "rediscovery failed, will retry next tick");
                        continue;
                    }
                }
            }
            self.sync_all().await;
        }

        Ok(())
    }

    /// Handle a host command intent addressed at a control object
    ///
    /// Ignored (successfully) while shutting down.
    ///
    /// # Errors
    ///
    /// Returns error if the address is malformed or dispatch fails
    pub async fn handle_command(
        self: &Arc<Self>,
        address: &str,
        value: &serde_json::Value,
    ) -> Result<()> {
        if self.is_shutting_down() {
            tracing::debug!(address, "ignoring command during shutdown");
            return Ok(());
        }

        let (device_id, command) = parse_control_address(address)
            .ok_or_else(|| Error::InvalidRequest(format!("bad control address: {address}")))?;

        self.dispatch(&device_id, &command, value).await
    }

    /// Answer a host snapshot request through the responder seam
    pub fn handle_request(&self, request: &str, responder: &dyn Responder) {
        match request {
            "devices" => {
                let devices: Vec<serde_json::Value> = self
                    .registry
                    .snapshot()
                    .into_iter()
                    .map(|d| {
                        let category = match d.category {
                            crate::registry::DeviceCategory::Physical => "physical",
                            crate::registry::DeviceCategory::Infrared => "infrared",
                        };
                        serde_json::json!({
                            "id": d.id,
                            "name": d.name,
                            "type": d.device_type,
                            "category": category,
                            "status": d.status,
                        })
                    })
                    .collect();
                responder.respond(serde_json::json!({ "devices": devices }));
            }
            other => {
                tracing::warn!(request = other, "unknown host request");
                responder.respond(serde_json::json!({ "error": format!("unknown request: {other}") }));
            }
        }
    }

    /// Flip the connection indicator, logging and publishing transitions
    fn set_connected(&self, connected: bool) {
        let previous = self.connected.swap(connected, Ordering::SeqCst);
        if previous != connected {
            if connected {
                tracing::info!("provider connection established");
            } else {
                tracing::warn!("provider connection lost");
            }
            self.state
                .write_state(CONNECTION_PATH, &serde_json::Value::Bool(connected), true);
        }
    }

    /// Run `f` through the retry controller with each attempt throttled by
    /// the rate governor
    async fn governed<T, F, Fut>(&self, operation: &str, context: &RetryContext, f: F) -> Result<T>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        self.retrier
            .run(operation, context, || self.governor.throttle(|| f()))
            .await
    }
}

/// Host object path for a device status field
fn status_path(device_id: &str, field: &str) -> String {
    format!("devices.{device_id}.status.{field}")
}

/// Host object path for a device control object
fn control_path(device_id: &str, command: &str) -> String {
    format!("devices.{device_id}.control.{command}")
}

/// Parse `devices.{id}.control.{command}` into its parts
fn parse_control_address(address: &str) -> Option<(String, String)> {
    let rest = address.strip_prefix("devices.")?;
    let (device_id, tail) = rest.split_once('.')?;
    let command = tail.strip_prefix("control.")?;
    if device_id.is_empty() || command.is_empty() {
        return None;
    }
    Some((device_id.to_string(), command.to_string()))
}
