//! Capability seams toward the host process
//!
//! The engine never talks to host storage or messaging directly; it depends
//! on two narrow traits supplied at construction. A host embedding the
//! engine implements them against its own object store; the standalone
//! binary uses the tracing-backed writer.

use crate::catalog::FieldType;

/// Descriptor for an object the engine wants the host to materialize
#[derive(Debug, Clone)]
pub struct ObjectDescriptor {
    /// Display name
    pub name: String,
    /// Semantic value type
    pub kind: FieldType,
    /// Whether the host should accept writes (command objects) or treat it
    /// as read-only telemetry (status fields)
    pub writable: bool,
}

impl ObjectDescriptor {
    /// Read-only telemetry object
    #[must_use]
    pub fn status(name: &str, kind: FieldType) -> Self {
        Self {
            name: name.to_string(),
            kind,
            writable: false,
        }
    }

    /// Writable command object
    #[must_use]
    pub fn control(name: &str) -> Self {
        Self {
            name: name.to_string(),
            kind: FieldType::Text,
            writable: true,
        }
    }
}

/// Host-side state store the engine publishes into
///
/// Assumed reliable and cheap; calls are synchronous and carry no retry
/// semantics of their own.
pub trait StateWriter: Send + Sync {
    /// Idempotently create an object at `path`
    fn ensure_object(&self, path: &str, descriptor: &ObjectDescriptor);

    /// Write a value at `path`; `authoritative` marks provider-confirmed
    /// state as opposed to locally echoed intent
    fn write_state(&self, path: &str, value: &serde_json::Value, authoritative: bool);
}

/// Host-side reply channel for snapshot requests
pub trait Responder: Send + Sync {
    /// Deliver the response payload to whoever asked
    fn respond(&self, payload: serde_json::Value);
}

/// State writer that logs instead of persisting
///
/// Backs the standalone binary, where there is no host store to write into.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogStateWriter;

impl StateWriter for LogStateWriter {
    fn ensure_object(&self, path: &str, descriptor: &ObjectDescriptor) {
        tracing::debug!(path, name = %descriptor.name, writable = descriptor.writable, "object ensured");
    }

    fn write_state(&self, path: &str, value: &serde_json::Value, authoritative: bool) {
        tracing::info!(path, %value, authoritative, "state");
    }
}
