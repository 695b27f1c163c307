//! Discovery and the periodic status sweep

use crate::host::ObjectDescriptor;
use crate::registry::Device;
use crate::retry::RetryContext;
use crate::{Error, Result};

use super::{control_path, status_path, Engine};

impl Engine {
    /// Fetch the full device list and reconcile it into the registry
    ///
    /// Unknown provider types register with empty capability sets; they are
    /// never an error. Returns the number of devices seen.
    ///
    /// # Errors
    ///
    /// Returns error if the governed request fails; the connection flag is
    /// cleared before propagating
    pub async fn discover(&self) -> Result<usize> {
        let context = RetryContext::new();
        let result = self
            .governed("discover-devices", &context, || self.api.list_devices())
            .await;

        let body = match result {
            Ok(body) => body,
            Err(err) => {
                self.set_connected(false);
                return Err(err);
            }
        };

        if self.is_shutting_down() {
            return Ok(0);
        }

        let mut count = 0;

        for entry in &body.device_list {
            let device = Device::physical(&entry.device_id, &entry.device_name, &entry.device_type);
            if device.descriptor.commands.is_empty() && device.descriptor.status_fields.is_empty() {
                tracing::debug!(
                    device_id = %entry.device_id,
                    device_type = %entry.device_type,
                    "unsupported device type, registering as opaque"
                );
            }
            self.ensure_device_objects(&device);
            self.registry.upsert(device);
            count += 1;
        }

        for entry in &body.infrared_remote_list {
            let device = Device::infrared(&entry.device_id, &entry.device_name, &entry.remote_type);
            self.ensure_device_objects(&device);
            self.registry.upsert(device);
            count += 1;
        }

        self.set_connected(true);
        tracing::debug!(
            physical = body.device_list.len(),
            infrared = body.infrared_remote_list.len(),
            "device list reconciled"
        );

        Ok(count)
    }

    /// Poll every physical device's status once
    ///
    /// Skipped entirely while shutting down or disconnected. Each device is
    /// polled independently through the governed retried path; one device's
    /// failure never aborts the sweep for the others.
    pub async fn sync_all(&self) {
        if self.is_shutting_down() {
            tracing::debug!("skipping sync sweep: shutting down");
            return;
        }
        if !self.is_connected() {
            tracing::debug!("skipping sync sweep: not connected");
            return;
        }

        let ids = self.registry.physical_ids();
        if ids.is_empty() {
            return;
        }

        let sweeps = ids.iter().map(|id| async move {
            match self.sync_device(id).await {
                Ok(()) => true,
                Err(err) => {
                    if matches!(err, Error::AuthFailed(_) | Error::Forbidden(_)) {
                        self.set_connected(false);
                    }
                    tracing::warn!(device_id = %id, error = %err, "device sync failed");
                    false
                }
            }
        });

        let results = futures::future::join_all(sweeps).await;
        let succeeded = results.iter().filter(|ok| **ok).count();

        if succeeded > 0 {
            self.set_connected(true);
        } else {
            // Every device failed; treat the provider as unreachable
            self.set_connected(false);
        }

        tracing::debug!(total = ids.len(), succeeded, "sync sweep complete");
    }

    /// Fetch one device's status and replace its status map wholesale
    ///
    /// # Errors
    ///
    /// Returns error if the governed request fails or the device vanished
    /// from the registry
    pub async fn sync_device(&self, device_id: &str) -> Result<()> {
        let context = RetryContext::new().with("device", device_id);
        let status = self
            .governed("update-device-status", &context, || {
                self.api.device_status(device_id)
            })
            .await?;

        // A successful exchange means the provider is reachable again
        self.set_connected(true);

        if self.is_shutting_down() {
            // Result discarded; shutdown began while the call was in flight
            return Ok(());
        }

        if !self.registry.replace_status(device_id, status.clone()) {
            return Err(Error::UnknownDevice(device_id.to_string()));
        }

        for (field, value) in &status {
            self.state
                .write_state(&status_path(device_id, field), value, true);
        }

        tracing::trace!(device_id, fields = status.len(), "device status reconciled");
        Ok(())
    }

    /// Idempotently create host objects for a device's controls and status
    /// fields
    pub(super) fn ensure_device_objects(&self, device: &Device) {
        if device.category == crate::registry::DeviceCategory::Infrared {
            // IR remotes take one free-form send object instead of typed
            // per-command controls
            self.state.ensure_object(
                &control_path(&device.id, "send"),
                &ObjectDescriptor::control("send"),
            );
            return;
        }
        for command in device.descriptor.commands {
            self.state.ensure_object(
                &control_path(&device.id, command),
                &ObjectDescriptor::control(command),
            );
        }
        for (field, kind) in device.descriptor.status_fields {
            self.state.ensure_object(
                &status_path(&device.id, field),
                &ObjectDescriptor::status(field, *kind),
            );
        }
    }
}
