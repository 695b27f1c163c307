//! Shared test utilities

use std::sync::{Arc, Mutex};

use switchbridge::{Config, Engine, ObjectDescriptor, StateWriter};

/// A recorded `write_state` call
#[derive(Debug, Clone)]
pub struct StateWrite {
    pub path: String,
    pub value: serde_json::Value,
    pub authoritative: bool,
}

/// State writer that records every call for assertions
#[derive(Debug, Default)]
pub struct RecordingStateWriter {
    pub objects: Mutex<Vec<String>>,
    pub writes: Mutex<Vec<StateWrite>>,
}

impl RecordingStateWriter {
    pub fn writes_for(&self, path: &str) -> Vec<StateWrite> {
        self.writes
            .lock()
            .unwrap()
            .iter()
            .filter(|w| w.path == path)
            .cloned()
            .collect()
    }
}

impl StateWriter for RecordingStateWriter {
    fn ensure_object(&self, path: &str, _descriptor: &ObjectDescriptor) {
        self.objects.lock().unwrap().push(path.to_string());
    }

    fn write_state(&self, path: &str, value: &serde_json::Value, authoritative: bool) {
        self.writes.lock().unwrap().push(StateWrite {
            path: path.to_string(),
            value: value.clone(),
            authoritative,
        });
    }
}

/// Build an engine pointed at a mock provider, with rate-governor spacing
/// disabled so tests run at full speed
pub fn test_engine(base_url: &str) -> (Arc<Engine>, Arc<RecordingStateWriter>) {
    let config = Config {
        token: "test-token".into(),
        secret: "test-secret".into(),
        base_url: base_url.to_string(),
        poll_interval_ms: 60_000,
        request_timeout_ms: 5_000,
        min_request_spacing_ms: 0,
    }
    .validated()
    .expect("test config is valid");

    let state = Arc::new(RecordingStateWriter::default());
    let engine = Engine::new(config, Arc::clone(&state) as Arc<dyn StateWriter>)
        .expect("engine builds");

    (Arc::new(engine), state)
}

/// Provider envelope with logical success
pub fn success_body(body: serde_json::Value) -> serde_json::Value {
    serde_json::json!({
        "statusCode": 100,
        "message": "success",
        "body": body,
    })
}

/// A device list with one Bot and one infrared TV remote
pub fn default_device_list() -> serde_json::Value {
    success_body(serde_json::json!({
        "deviceList": [
            {"deviceId": "A1", "deviceName": "Desk Bot", "deviceType": "Bot"}
        ],
        "infraredRemoteList": [
            {"deviceId": "02-1", "deviceName": "Living Room TV", "remoteType": "TV"}
        ]
    }))
}
