//! Switchbridge - cloud synchronization bridge for SwitchBot smart devices
//!
//! This library keeps a local mirror of remote device state consistent with
//! the provider's rate-limited cloud API and relays user commands back:
//! - Signed request client (per-call HMAC headers, closed error taxonomy)
//! - Retry controller with bounded exponential backoff per logical operation
//! - Rate governor enforcing a floor on outbound call cadence
//! - Device registry and periodic status synchronizer
//! - Command dispatcher with post-command resync
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │                  Host process                    │
//! │   lifecycle events  │  command intents  │  state │
//! └──────────────────────┬──────────────────────────┘
//!                        │
//! ┌──────────────────────▼──────────────────────────┐
//! │                    Engine                        │
//! │  Dispatcher │ Synchronizer │ Device Registry     │
//! └──────────────────────┬──────────────────────────┘
//!                        │
//! ┌──────────────────────▼──────────────────────────┐
//! │   Retry Controller → Rate Governor → Client      │
//! └──────────────────────┬──────────────────────────┘
//!                        │
//!                 Provider cloud API
//! ```

pub mod api;
pub mod catalog;
pub mod config;
pub mod engine;
pub mod error;
pub mod governor;
pub mod host;
pub mod registry;
pub mod retry;

pub use api::{ApiClient, CommandRequest, Credentials};
pub use config::Config;
pub use engine::{map_command, map_infrared, Engine};
pub use error::{Error, Result};
pub use governor::RateGovernor;
pub use host::{LogStateWriter, ObjectDescriptor, Responder, StateWriter};
pub use registry::{Device, DeviceCategory, DeviceRegistry};
pub use retry::{Retrier, RetryContext, RetryPolicy};
