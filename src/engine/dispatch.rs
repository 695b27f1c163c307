//! Command dispatch: local intent to provider command schema

use std::sync::Arc;
use std::time::Duration;

use crate::api::CommandRequest;
use crate::registry::DeviceCategory;
use crate::retry::RetryContext;
use crate::{Error, Result};

use super::Engine;

/// Delay before the post-command resync of the target device
const RESYNC_DELAY: Duration = Duration::from_secs(2);

/// Map a physical-device command name and value to the provider's
/// `{command, parameter}` shape
///
/// Pure function; returns `None` for names outside the supported set so the
/// caller can reject without sending anything.
#[must_use]
pub fn map_command(command: &str, value: &serde_json::Value) -> Option<CommandRequest> {
    match command {
        "turnOn" | "turnOff" | "press" | "pause" | "lock" | "unlock" => {
            Some(CommandRequest::new(command, "default"))
        }
        "setPosition" => {
            // Positional encoding: index, mode ("ff" = default), position
            let position = raw_parameter(value);
            Some(CommandRequest::new(command, format!("0,ff,{position}")))
        }
        "setBrightness" | "setColor" | "setColorTemperature" => {
            Some(CommandRequest::new(command, raw_parameter(value)))
        }
        _ => None,
    }
}

/// Map an infrared send value to a provider command
///
/// The value is either an already-structured object, a string holding a
/// JSON object (parsed leniently), or a bare command name. Parse failures
/// fall back to wrapping the raw value with the default parameter.
#[must_use]
pub fn map_infrared(value: &serde_json::Value) -> CommandRequest {
    let structured = match value {
        serde_json::Value::Object(map) => Some(map.clone()),
        serde_json::Value::String(raw) => serde_json::from_str::<serde_json::Value>(raw)
            .ok()
            .and_then(|parsed| parsed.as_object().cloned()),
        _ => None,
    };

    if let Some(map) = structured {
        if let Some(command) = map.get("command").and_then(serde_json::Value::as_str) {
            let parameter = map
                .get("parameter")
                .map_or_else(|| "default".to_string(), raw_parameter);
            return CommandRequest::new(command, parameter);
        }
    }

    CommandRequest::new(raw_parameter(value), "default")
}

/// Render a JSON value as a provider parameter string
///
/// Strings pass through unquoted; everything else uses its JSON rendering.
fn raw_parameter(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

impl Engine {
    /// Translate and send a command intent, then schedule a follow-up
    /// resync of the target device
    ///
    /// # Errors
    ///
    /// Returns `UnknownDevice` if the id is not registered,
    /// `UnsupportedCommand` if a physical device does not accept the
    /// command, or the request-path error otherwise
    pub async fn dispatch(
        self: &Arc<Self>,
        device_id: &str,
        command: &str,
        value: &serde_json::Value,
    ) -> Result<()> {
        let device = self
            .registry
            .get(device_id)
            .ok_or_else(|| Error::UnknownDevice(device_id.to_string()))?;

        let request = match device.category {
            DeviceCategory::Physical => {
                if !device.supports_command(command) {
                    return Err(Error::UnsupportedCommand {
                        device_id: device_id.to_string(),
                        command: command.to_string(),
                    });
                }
                map_command(command, value).ok_or_else(|| Error::UnsupportedCommand {
                    device_id: device_id.to_string(),
                    command: command.to_string(),
                })?
            }
            DeviceCategory::Infrared => map_infrared(value),
        };

        tracing::info!(
            device_id,
            command = %request.command,
            parameter = %request.parameter,
            "dispatching command"
        );

        let context = RetryContext::new()
            .with("device", device_id)
            .with("command", &request.command);
        self.governed("device-command", &context, || {
            self.api.send_command(device_id, &request)
        })
        .await?;

        // A successful exchange means the provider is reachable again
        self.set_connected(true);

        // The command succeeded; reflect the provider's new state shortly.
        // Only physical devices have pollable status.
        if device.category == DeviceCategory::Physical {
            self.schedule_resync(device_id);
        }

        Ok(())
    }

    /// One-shot resync of a single device after [`RESYNC_DELAY`]
    ///
    /// Failure here is logged and swallowed: the command itself already
    /// succeeded.
    fn schedule_resync(self: &Arc<Self>, device_id: &str) {
        let engine = Arc::clone(self);
        let device_id = device_id.to_string();

        tokio::spawn(async move {
            tokio::time::sleep(RESYNC_DELAY).await;
            if engine.is_shutting_down() {
                return;
            }
            if let Err(err) = engine.sync_device(&device_id).await {
                tracing::warn!(device_id = %device_id, error = %err, "post-command resync failed");
            }
        });
    }
}
