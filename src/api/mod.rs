//! Provider cloud API: signed request client and wire types

pub mod auth;
pub mod client;
pub mod types;

pub use auth::Credentials;
pub use client::ApiClient;
pub use types::{CommandRequest, DeviceListBody, Envelope, InfraredRemote, PhysicalDevice};
