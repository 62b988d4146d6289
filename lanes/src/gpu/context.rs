//! GPU context management
//!
//! Wraps the wgpu adapter, device and queue used by the verification
//! pipeline.

use super::{GpuError, GpuResult};

/// GPU context that manages the device, queue, and adapter.
///
/// Created once per `GpuLanes` and reused for every batch.
pub struct GpuContext {
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub adapter: wgpu::Adapter,
}

impl GpuContext {
    /// Create a new GPU context, preferring a discrete adapter.
    ///
    /// # Errors
    ///
    /// Returns `GpuError::NoAdapter` if no suitable GPU is found.
    /// Returns `GpuError::DeviceCreation` if device creation fails.
    pub async fn new() -> GpuResult<Self> {
        Self::with_options(wgpu::PowerPreference::HighPerformance).await
    }

    /// Create a new GPU context with specific power preference.
    pub async fn with_options(power_preference: wgpu::PowerPreference) -> GpuResult<Self> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let adapter = match instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference,
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
        {
            Ok(adapter) => adapter,
            Err(_) => return Err(GpuError::NoAdapter),
        };

        let info = adapter.get_info();
        log::info!("Selected GPU: {} ({:?})", info.name, info.backend);

        // The kernel binds five storage buffers; ask for the adapter's limits
        // so large batches are not capped by the conservative defaults.
        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("k1 verification device"),
                required_limits: adapter.limits(),
                ..Default::default()
            })
            .await?;

        Ok(Self {
            device,
            queue,
            adapter,
        })
    }

    /// Get information about the selected GPU adapter.
    pub fn adapter_info(&self) -> wgpu::AdapterInfo {
        self.adapter.get_info()
    }
}
