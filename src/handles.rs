//! Scoped ownership of SDK resources.
//!
//! Construction acquires, drop releases: holding one of these values
//! keeps the underlying SDK object alive, dropping it issues the
//! matching destroy call. Destroy failures in `Drop` are discarded,
//! there is nowhere to report them.

use std::sync::{Arc, Mutex};

use crate::manager::Inner;
use crate::sdk::{CalibratorHandle, ContextHandle, ImageHandle, SdkApi, SdkResult};

/// Owned SDK execution context, destroyed when dropped.
pub(crate) struct Context {
    sdk: Arc<dyn SdkApi>,
    handle: ContextHandle,
}

impl Context {
    /// Create a fresh context on the SDK.
    pub(crate) fn create(sdk: Arc<dyn SdkApi>) -> SdkResult<Self> {
        let handle = sdk.context_create()?;
        Ok(Self { sdk, handle })
    }

    pub(crate) fn handle(&self) -> ContextHandle {
        self.handle
    }
}

impl Drop for Context {
    fn drop(&mut self) {
        let _ = self.sdk.context_destroy(self.handle);
    }
}

/// Image buffer bound to a manager's context, released on drop.
///
/// Obtained through [`crate::ResourceManager::new_image`]. Release does
/// not depend on the context still being compiled.
pub struct Image {
    sdk: Arc<dyn SdkApi>,
    ctx: ContextHandle,
    handle: ImageHandle,
}

impl Image {
    pub(crate) fn new(sdk: Arc<dyn SdkApi>, ctx: ContextHandle, handle: ImageHandle) -> Self {
        Self { sdk, ctx, handle }
    }

    /// The raw handle, for passing to further SDK calls.
    pub fn handle(&self) -> ImageHandle {
        self.handle
    }
}

impl Drop for Image {
    fn drop(&mut self) {
        let _ = self.sdk.image_destroy(self.ctx, self.handle);
    }
}

/// Sensor calibrator bound to a manager's context, released on drop.
///
/// Obtained through [`crate::ResourceManager::new_calibrator`]. The
/// destroy call is skipped once the owning manager has torn the
/// compiled context down, mirroring the creation precondition.
pub struct Calibrator {
    sdk: Arc<dyn SdkApi>,
    state: Arc<Mutex<Inner>>,
    ctx: ContextHandle,
    handle: CalibratorHandle,
}

impl Calibrator {
    pub(crate) fn new(
        sdk: Arc<dyn SdkApi>,
        state: Arc<Mutex<Inner>>,
        ctx: ContextHandle,
        handle: CalibratorHandle,
    ) -> Self {
        Self {
            sdk,
            state,
            ctx,
            handle,
        }
    }

    /// The raw handle, for passing to further SDK calls.
    pub fn handle(&self) -> CalibratorHandle {
        self.handle
    }
}

impl Drop for Calibrator {
    fn drop(&mut self) {
        let compiled = self
            .state
            .lock()
            .map(|inner| inner.has_compiled_context)
            .unwrap_or(false);
        if compiled {
            let _ = self.sdk.calibrator_destroy(self.ctx, self.handle);
        }
    }
}
