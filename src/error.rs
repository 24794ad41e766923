//! Error types for sparkfield.
//!
//! Setup failures (no adapter, no device, no surface, bad configuration) are
//! fatal and surface as [`SimulationError`]. Nothing at frame time returns an
//! error; degenerate settings degrade instead.

use std::fmt;

/// Errors from device setup or buffer readback.
#[derive(Debug)]
pub enum GpuError {
    /// The window surface could not be created.
    SurfaceCreation(wgpu::CreateSurfaceError),
    /// No adapter on the primary backends, or none that can present to the
    /// window.
    NoAdapter,
    /// The adapter offers no texture format for the window surface.
    NoSurfaceFormat,
    /// The adapter refused the device request.
    DeviceCreation(wgpu::RequestDeviceError),
    /// A readback staging buffer could not be mapped.
    BufferMapping(String),
}

impl fmt::Display for GpuError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GpuError::SurfaceCreation(e) => write!(f, "cannot create window surface: {}", e),
            GpuError::NoAdapter => write!(
                f,
                "no GPU adapter with compute support on the primary backends"
            ),
            GpuError::NoSurfaceFormat => {
                write!(f, "the GPU adapter supports no format for the window surface")
            }
            GpuError::DeviceCreation(e) => write!(f, "GPU device request failed: {}", e),
            GpuError::BufferMapping(msg) => write!(f, "readback mapping failed: {}", msg),
        }
    }
}

impl std::error::Error for GpuError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            GpuError::SurfaceCreation(e) => Some(e),
            GpuError::DeviceCreation(e) => Some(e),
            _ => None,
        }
    }
}

impl From<wgpu::CreateSurfaceError> for GpuError {
    fn from(e: wgpu::CreateSurfaceError) -> Self {
        GpuError::SurfaceCreation(e)
    }
}

impl From<wgpu::RequestDeviceError> for GpuError {
    fn from(e: wgpu::RequestDeviceError) -> Self {
        GpuError::DeviceCreation(e)
    }
}

/// Errors from loading a sprite image.
#[derive(Debug)]
pub enum TextureError {
    /// The bytes are not a decodable image.
    ImageLoad(image::ImageError),
    /// The sprite file could not be read.
    Io(std::io::Error),
}

impl fmt::Display for TextureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TextureError::ImageLoad(e) => write!(f, "cannot decode sprite image: {}", e),
            TextureError::Io(e) => write!(f, "cannot read sprite file: {}", e),
        }
    }
}

impl std::error::Error for TextureError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TextureError::ImageLoad(e) => Some(e),
            TextureError::Io(e) => Some(e),
        }
    }
}

impl From<image::ImageError> for TextureError {
    fn from(e: image::ImageError) -> Self {
        TextureError::ImageLoad(e)
    }
}

impl From<std::io::Error> for TextureError {
    fn from(e: std::io::Error) -> Self {
        TextureError::Io(e)
    }
}

/// Errors that can occur while loading settings.
#[derive(Debug)]
pub enum ConfigError {
    /// The settings document is not valid JSON for [`crate::Settings`].
    Json(serde_json::Error),
    /// Failed to read the settings file.
    Io(std::io::Error),
    /// No built-in preset has this name.
    UnknownPreset(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Json(e) => write!(f, "Invalid settings document: {}", e),
            ConfigError::Io(e) => write!(f, "Failed to read settings file: {}", e),
            ConfigError::UnknownPreset(name) => write!(f, "Unknown preset '{}'", name),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Json(e) => Some(e),
            ConfigError::Io(e) => Some(e),
            ConfigError::UnknownPreset(_) => None,
        }
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(e: serde_json::Error) -> Self {
        ConfigError::Json(e)
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(e: std::io::Error) -> Self {
        ConfigError::Io(e)
    }
}

/// Errors that can occur when starting a simulation.
#[derive(Debug)]
pub enum SimulationError {
    /// Failed to create event loop.
    EventLoop(winit::error::EventLoopError),
    /// Failed to create window.
    Window(winit::error::OsError),
    /// GPU initialization failed.
    Gpu(GpuError),
    /// Settings could not be loaded.
    Config(ConfigError),
}

impl fmt::Display for SimulationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimulationError::EventLoop(e) => write!(f, "Failed to create event loop: {}", e),
            SimulationError::Window(e) => write!(f, "Failed to create window: {}", e),
            SimulationError::Gpu(e) => write!(f, "GPU error: {}", e),
            SimulationError::Config(e) => write!(f, "Configuration error: {}", e),
        }
    }
}

impl std::error::Error for SimulationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SimulationError::EventLoop(e) => Some(e),
            SimulationError::Window(e) => Some(e),
            SimulationError::Gpu(e) => Some(e),
            SimulationError::Config(e) => Some(e),
        }
    }
}

impl From<winit::error::EventLoopError> for SimulationError {
    fn from(e: winit::error::EventLoopError) -> Self {
        SimulationError::EventLoop(e)
    }
}

impl From<winit::error::OsError> for SimulationError {
    fn from(e: winit::error::OsError) -> Self {
        SimulationError::Window(e)
    }
}

impl From<GpuError> for SimulationError {
    fn from(e: GpuError) -> Self {
        SimulationError::Gpu(e)
    }
}

impl From<ConfigError> for SimulationError {
    fn from(e: ConfigError) -> Self {
        SimulationError::Config(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_gpu_error_messages() {
        let no_adapter = GpuError::NoAdapter.to_string();
        assert!(no_adapter.contains("adapter"));
        assert!(!no_adapter.contains("DX12"));

        let no_format = GpuError::NoSurfaceFormat.to_string();
        assert!(no_format.contains("format"));
        assert!(GpuError::NoSurfaceFormat.source().is_none());
    }

    #[test]
    fn test_setup_errors_wrap_gpu_errors() {
        let err = SimulationError::from(GpuError::NoSurfaceFormat);
        assert!(matches!(err, SimulationError::Gpu(GpuError::NoSurfaceFormat)));
        assert!(err.to_string().contains("format"));
        assert!(err.source().is_some());
    }

    #[test]
    fn test_config_error_source() {
        let err = ConfigError::UnknownPreset("Nope".into());
        assert_eq!(err.to_string(), "Unknown preset 'Nope'");
        assert!(err.source().is_none());
    }
}
