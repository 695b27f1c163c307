//! Wire types for the provider cloud API

use serde::{Deserialize, Serialize};

/// Logical success code inside the provider envelope
pub const STATUS_SUCCESS: i64 = 100;

/// Provider response envelope
///
/// Every endpoint wraps its payload in `{statusCode, message, body}`. A
/// transport-level 2xx does not imply success; `status_code` must also be
/// [`STATUS_SUCCESS`].
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope {
    /// Provider logical status code (100 = success)
    pub status_code: i64,
    /// Human-readable provider message
    #[serde(default)]
    pub message: String,
    /// Endpoint-specific payload
    #[serde(default)]
    pub body: serde_json::Value,
}

/// Payload of `GET /devices`
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceListBody {
    /// Physical devices bound to the account
    #[serde(default)]
    pub device_list: Vec<PhysicalDevice>,
    /// Virtual infrared remotes configured on hubs
    #[serde(default)]
    pub infrared_remote_list: Vec<InfraredRemote>,
}

/// A physical device entry from the device list
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhysicalDevice {
    /// Provider-assigned identifier
    pub device_id: String,
    /// User-assigned name
    #[serde(default)]
    pub device_name: String,
    /// Provider type string (e.g. "Bot", "Curtain")
    #[serde(default)]
    pub device_type: String,
}

/// A virtual infrared remote entry from the device list
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InfraredRemote {
    /// Provider-assigned identifier
    pub device_id: String,
    /// User-assigned name
    #[serde(default)]
    pub device_name: String,
    /// Remote type string (e.g. "TV", "Air Conditioner")
    #[serde(default)]
    pub remote_type: String,
}

/// Body of `POST /devices/{id}/commands`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandRequest {
    /// Provider command name
    pub command: String,
    /// Command parameter; "default" when the command takes none
    pub parameter: String,
    /// Command class; "command" for everything this engine sends
    pub command_type: String,
}

impl CommandRequest {
    /// Build a command request of type "command"
    #[must_use]
    pub fn new(command: impl Into<String>, parameter: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            parameter: parameter.into(),
            command_type: "command".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_device_list_envelope() {
        let raw = r#"{
            "statusCode": 100,
            "message": "success",
            "body": {
                "deviceList": [
                    {"deviceId": "A1", "deviceName": "Desk Bot", "deviceType": "Bot"}
                ],
                "infraredRemoteList": [
                    {"deviceId": "02-1", "deviceName": "TV", "remoteType": "TV"}
                ]
            }
        }"#;

        let envelope: Envelope = serde_json::from_str(raw).unwrap();
        assert_eq!(envelope.status_code, STATUS_SUCCESS);

        let body: DeviceListBody = serde_json::from_value(envelope.body).unwrap();
        assert_eq!(body.device_list.len(), 1);
        assert_eq!(body.device_list[0].device_id, "A1");
        assert_eq!(body.infrared_remote_list[0].remote_type, "TV");
    }

    #[test]
    fn missing_body_defaults_to_null() {
        let raw = r#"{"statusCode": 190, "message": "device offline"}"#;
        let envelope: Envelope = serde_json::from_str(raw).unwrap();
        assert_eq!(envelope.status_code, 190);
        assert!(envelope.body.is_null());
    }

    #[test]
    fn command_request_serializes_camel_case() {
        let cmd = CommandRequest::new("turnOn", "default");
        let json = serde_json::to_value(&cmd).unwrap();
        assert_eq!(json["command"], "turnOn");
        assert_eq!(json["parameter"], "default");
        assert_eq!(json["commandType"], "command");
    }
}
