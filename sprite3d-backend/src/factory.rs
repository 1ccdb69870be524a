//! Backend selection from the host driver id

use crate::backend::{BackendKind, RenderBackend};
use crate::d3d9::{D3d9Backend, D3d9Device};
use crate::error::BackendError;
use crate::ogl::{GlApi, OglBackend};

/// Device access handed over by the embedding layer
pub enum BackendDevice {
    D3d9(Box<dyn D3d9Device>),
    Ogl(Box<dyn GlApi>),
}

impl BackendDevice {
    pub fn kind(&self) -> BackendKind {
        match self {
            BackendDevice::D3d9(_) => BackendKind::D3d9,
            BackendDevice::Ogl(_) => BackendKind::Ogl,
        }
    }
}

/// Create the backend for `driver_id`
///
/// Fails for unknown drivers and when the supplied device is for the other
/// pipeline.
pub fn create_backend(
    driver_id: &str,
    device: BackendDevice,
) -> Result<Box<dyn RenderBackend>, BackendError> {
    let kind = BackendKind::from_driver_id(driver_id)?;
    if device.kind() != kind {
        return Err(BackendError::DeviceMismatch {
            expected: kind,
            given: device.kind(),
        });
    }

    log::info!("creating {} render backend", kind.driver_id());
    Ok(match device {
        BackendDevice::D3d9(device) => Box::new(D3d9Backend::new(device)),
        BackendDevice::Ogl(gl) => Box::new(OglBackend::new(gl)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake::{RecordingD3d9, RecordingGl};

    #[test]
    fn test_create_by_driver_id() {
        let backend =
            create_backend("D3D9", BackendDevice::D3d9(Box::new(RecordingD3d9::new()))).unwrap();
        assert_eq!(backend.kind(), BackendKind::D3d9);

        let backend = create_backend("ogl", BackendDevice::Ogl(Box::new(RecordingGl::new()))).unwrap();
        assert_eq!(backend.kind(), BackendKind::Ogl);
    }

    #[test]
    fn test_mismatched_device() {
        let result = create_backend("ogl", BackendDevice::D3d9(Box::new(RecordingD3d9::new())));
        assert!(matches!(
            result,
            Err(BackendError::DeviceMismatch {
                expected: BackendKind::Ogl,
                given: BackendKind::D3d9
            })
        ));
    }

    #[test]
    fn test_unsupported_driver() {
        let result = create_backend("vulkan", BackendDevice::Ogl(Box::new(RecordingGl::new())));
        assert!(matches!(result, Err(BackendError::UnsupportedDriver(_))));
    }
}
