//! In-process registry of known devices
//!
//! The registry is the only source of observable truth exposed outward.
//! Mutation is coarse on purpose: whole-record replacement at discovery,
//! whole-status-map replacement at sync. Last writer wins; there is no
//! field-level partial mutation from concurrent call sites.

use std::collections::HashMap;
use std::sync::RwLock;

use chrono::{DateTime, Utc};

use crate::catalog::{self, TypeDescriptor, UNKNOWN};

/// Where a device lives in the provider's model
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceCategory {
    /// A real device with pollable status
    Physical,
    /// A virtual infrared remote; send-only, never polled
    Infrared,
}

/// A known device
///
/// `id` and `category` are immutable for the device's lifetime; discovery
/// replaces the rest of the record in place.
#[derive(Debug, Clone)]
pub struct Device {
    /// Provider-assigned identifier
    pub id: String,
    /// Human-readable name
    pub name: String,
    /// Physical or infrared
    pub category: DeviceCategory,
    /// Provider type string (key into the capability table)
    pub device_type: String,
    /// Capabilities resolved from the catalog; empty for unknown types
    pub descriptor: TypeDescriptor,
    /// Current status fields, replaced wholesale on each sync
    pub status: serde_json::Map<String, serde_json::Value>,
    /// When status was last reconciled from the provider
    pub last_synced: Option<DateTime<Utc>>,
}

impl Device {
    /// Build a physical device, resolving capabilities from the catalog
    ///
    /// Unknown type strings degrade to an empty descriptor rather than
    /// failing.
    #[must_use]
    pub fn physical(id: &str, name: &str, device_type: &str) -> Self {
        let descriptor = catalog::lookup(device_type).unwrap_or(UNKNOWN);
        Self {
            id: id.to_string(),
            name: name.to_string(),
            category: DeviceCategory::Physical,
            device_type: device_type.to_string(),
            descriptor,
            status: serde_json::Map::new(),
            last_synced: None,
        }
    }

    /// Build an infrared remote device
    #[must_use]
    pub fn infrared(id: &str, name: &str, remote_type: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            category: DeviceCategory::Infrared,
            device_type: remote_type.to_string(),
            descriptor: UNKNOWN,
            status: serde_json::Map::new(),
            last_synced: None,
        }
    }

    /// Whether this device accepts the given command name
    ///
    /// Infrared remotes accept anything (the provider forwards arbitrary
    /// learned commands); physical devices are bound to their catalog entry.
    #[must_use]
    pub fn supports_command(&self, command: &str) -> bool {
        match self.category {
            DeviceCategory::Infrared => true,
            DeviceCategory::Physical => self.descriptor.commands.contains(&command),
        }
    }
}

/// Registry of known devices, keyed by provider identifier
#[derive(Debug, Default)]
pub struct DeviceRegistry {
    devices: RwLock<HashMap<String, Device>>,
}

impl DeviceRegistry {
    /// Create an empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a device record
    ///
    /// An existing record's category is immutable; a category flip from the
    /// provider is logged and ignored. Status carries over so a rediscovery
    /// does not blank out the last known state.
    pub fn upsert(&self, mut device: Device) {
        let mut map = self.devices.write().unwrap_or_else(|e| e.into_inner());

        if let Some(existing) = map.get(&device.id) {
            if existing.category != device.category {
                tracing::warn!(
                    device_id = %device.id,
                    "provider changed device category; keeping original"
                );
                device.category = existing.category;
            }
            device.status = existing.status.clone();
            device.last_synced = existing.last_synced;
        }

        map.insert(device.id.clone(), device);
    }

    /// Replace a device's entire status map
    ///
    /// Returns false if the device is not registered.
    pub fn replace_status(
        &self,
        device_id: &str,
        status: serde_json::Map<String, serde_json::Value>,
    ) -> bool {
        let mut map = self.devices.write().unwrap_or_else(|e| e.into_inner());
        map.get_mut(device_id).is_some_and(|device| {
            device.status = status;
            device.last_synced = Some(Utc::now());
            true
        })
    }

    /// Snapshot of one device
    #[must_use]
    pub fn get(&self, device_id: &str) -> Option<Device> {
        self.devices
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(device_id)
            .cloned()
    }

    /// Identifiers of all physical devices (the pollable set)
    #[must_use]
    pub fn physical_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self
            .devices
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .values()
            .filter(|d| d.category == DeviceCategory::Physical)
            .map(|d| d.id.clone())
            .collect();
        ids.sort();
        ids
    }

    /// Snapshot of every device, sorted by identifier
    #[must_use]
    pub fn snapshot(&self) -> Vec<Device> {
        let mut devices: Vec<Device> = self
            .devices
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .values()
            .cloned()
            .collect();
        devices.sort_by(|a, b| a.id.cmp(&b.id));
        devices
    }

    /// Number of registered devices
    #[must_use]
    pub fn len(&self) -> usize {
        self.devices.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// Whether the registry is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(fields: &[(&str, serde_json::Value)]) -> serde_json::Map<String, serde_json::Value> {
        fields
            .iter()
            .map(|(k, v)| ((*k).to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn upsert_and_get() {
        let registry = DeviceRegistry::new();
        registry.upsert(Device::physical("A1", "Desk Bot", "Bot"));

        let device = registry.get("A1").unwrap();
        assert_eq!(device.name, "Desk Bot");
        assert_eq!(device.category, DeviceCategory::Physical);
        assert!(device.supports_command("press"));
        assert!(!device.supports_command("setPosition"));
    }

    #[test]
    fn unknown_type_registers_with_empty_capabilities() {
        let registry = DeviceRegistry::new();
        registry.upsert(Device::physical("X9", "Mystery", "Quantum Kettle"));

        let device = registry.get("X9").unwrap();
        assert!(device.descriptor.commands.is_empty());
        assert!(device.descriptor.status_fields.is_empty());
        assert!(!device.supports_command("turnOn"));
    }

    #[test]
    fn infrared_accepts_any_command() {
        let registry = DeviceRegistry::new();
        registry.upsert(Device::infrared("02-1", "Living Room TV", "TV"));

        let device = registry.get("02-1").unwrap();
        assert!(device.supports_command("volumeUp"));
    }

    #[test]
    fn replace_status_is_whole_map() {
        let registry = DeviceRegistry::new();
        registry.upsert(Device::physical("A1", "Desk Bot", "Bot"));

        assert!(registry.replace_status(
            "A1",
            status(&[("power", "on".into()), ("battery", 80.into())])
        ));
        assert!(registry.replace_status("A1", status(&[("power", "off".into())])));

        let device = registry.get("A1").unwrap();
        // Old fields do not linger after a whole-map replace
        assert_eq!(device.status.len(), 1);
        assert_eq!(device.status["power"], "off");
        assert!(device.last_synced.is_some());
    }

    #[test]
    fn replace_status_unknown_device_is_false() {
        let registry = DeviceRegistry::new();
        assert!(!registry.replace_status("nope", status(&[])));
    }

    #[test]
    fn rediscovery_preserves_status_and_category() {
        let registry = DeviceRegistry::new();
        registry.upsert(Device::physical("A1", "Desk Bot", "Bot"));
        registry.replace_status("A1", status(&[("power", "on".into())]));

        // Same id rediscovered with a new name and a bogus category flip
        registry.upsert(Device::infrared("A1", "Renamed Bot", "Bot"));

        let device = registry.get("A1").unwrap();
        assert_eq!(device.name, "Renamed Bot");
        assert_eq!(device.category, DeviceCategory::Physical);
        assert_eq!(device.status["power"], "on");
    }

    #[test]
    fn physical_ids_excludes_infrared() {
        let registry = DeviceRegistry::new();
        registry.upsert(Device::physical("B2", "Curtain", "Curtain"));
        registry.upsert(Device::physical("A1", "Bot", "Bot"));
        registry.upsert(Device::infrared("02-1", "TV", "TV"));

        assert_eq!(registry.physical_ids(), vec!["A1", "B2"]);
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn snapshot_is_sorted_and_detached() {
        let registry = DeviceRegistry::new();
        registry.upsert(Device::physical("B2", "Curtain", "Curtain"));
        registry.upsert(Device::physical("A1", "Bot", "Bot"));

        let snapshot = registry.snapshot();
        assert_eq!(snapshot[0].id, "A1");
        assert_eq!(snapshot[1].id, "B2");

        // Mutating after the snapshot does not affect it
        registry.replace_status("A1", status(&[("power", "on".into())]));
        assert!(snapshot[0].status.is_empty());
    }
}
