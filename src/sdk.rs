//! Typed surface over the VoxRec SDK's C-style handle API.
//!
//! Every SDK object is addressed by an opaque handle; each entry point
//! returns a status that is either success or one of the [`SdkError`]
//! codes. The manager drives the SDK exclusively through the [`SdkApi`]
//! trait, so native bindings and the in-memory [`crate::sim::SimSdk`]
//! are interchangeable.

use std::path::Path;

use crate::types::{FrameSize, Severity, StreamKind};

// -- handles --

/// Opaque handle to an SDK execution context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContextHandle(pub(crate) u64);

/// Opaque handle to a license object bound to a context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LicenseHandle(pub(crate) u64);

/// Opaque handle to an options set bound to a context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OptionsHandle(pub(crate) u64);

/// Opaque handle to a capture sensor bound to a context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SensorHandle(pub(crate) u64);

/// Opaque handle to a reconstruction volume.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VolumeHandle(pub(crate) u64);

/// Opaque handle to an image buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ImageHandle(pub(crate) u64);

/// Opaque handle to a sensor calibrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CalibratorHandle(pub(crate) u64);

// -- status codes --

/// Failure codes surfaced by SDK calls.
///
/// The initialization sequence treats most of these uniformly as stage
/// failure; only [`SdkError::InvalidLicense`] and [`SdkError::Unspecified`]
/// are distinguished, during license authentication.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SdkError {
    #[error("unspecified SDK error")]
    Unspecified,

    #[error("invalid or missing license")]
    InvalidLicense,

    #[error("invalid handle")]
    InvalidHandle,

    #[error("no matching capture device")]
    DeviceNotFound,

    #[error("file not found")]
    FileNotFound,

    #[error("operation not supported")]
    Unsupported,

    #[error("unknown option key")]
    UnknownOption,
}

/// Result of a raw SDK call.
pub type SdkResult<T = ()> = Result<T, SdkError>;

/// Callback receiving log lines the SDK emits for a context.
pub type LogCallback = Box<dyn Fn(Severity, &str) + Send + Sync>;

// -- option keys --

/// Compile-options key selecting the OpenCL device (`-1` = automatic).
pub const OPT_DEVICE_ID: &str = "opencl.device_id";

/// Capture-options key telling whether the device supports `kind`.
pub fn stream_supported_key(kind: StreamKind) -> &'static str {
    match kind {
        StreamKind::Aux => "frame_info.supports_aux",
        StreamKind::Depth => "frame_info.supports_depth",
        StreamKind::Preview => "frame_info.supports_preview",
    }
}

/// Capture-options key holding the frame width of `kind`.
pub fn stream_width_key(kind: StreamKind) -> &'static str {
    match kind {
        StreamKind::Aux => "frame_info.aux_size.width",
        StreamKind::Depth => "frame_info.depth_size.width",
        StreamKind::Preview => "frame_info.preview_size.width",
    }
}

/// Capture-options key holding the frame height of `kind`.
pub fn stream_height_key(kind: StreamKind) -> &'static str {
    match kind {
        StreamKind::Aux => "frame_info.aux_size.height",
        StreamKind::Depth => "frame_info.depth_size.height",
        StreamKind::Preview => "frame_info.preview_size.height",
    }
}

// -- SDK surface --

/// The subset of the VoxRec SDK consumed by the lifecycle manager.
///
/// One method per SDK entry point. Handles returned by a method stay
/// valid until the matching destroy call, or until their owning context
/// is destroyed (volumes excepted, which outlive contexts).
/// Implementations must tolerate calls from any thread.
pub trait SdkApi: Send + Sync {
    // Context
    fn context_create(&self) -> SdkResult<ContextHandle>;
    fn context_destroy(&self, ctx: ContextHandle) -> SdkResult;
    /// Register the callback the SDK forwards its log lines to.
    fn context_set_log_callback(&self, ctx: ContextHandle, callback: LogCallback) -> SdkResult;
    /// Make `options` the set consulted by [`SdkApi::context_compile`].
    fn context_bind_compile_options(&self, ctx: ContextHandle, options: OptionsHandle)
        -> SdkResult;
    /// Compile the OpenCL programs for the device selected in the bound
    /// compile options.
    fn context_compile(&self, ctx: ContextHandle) -> SdkResult;

    // License
    fn license_create(&self, ctx: ContextHandle) -> SdkResult<LicenseHandle>;
    /// Authenticate against the license file at `file`.
    fn license_authenticate(
        &self,
        ctx: ContextHandle,
        license: LicenseHandle,
        file: &Path,
    ) -> SdkResult;

    // Options
    fn options_create(&self, ctx: ContextHandle) -> SdkResult<OptionsHandle>;
    fn options_get_bool(&self, ctx: ContextHandle, options: OptionsHandle, key: &str)
        -> SdkResult<bool>;
    fn options_get_int(&self, ctx: ContextHandle, options: OptionsHandle, key: &str)
        -> SdkResult<i32>;
    fn options_set(
        &self,
        ctx: ContextHandle,
        options: OptionsHandle,
        key: &str,
        value: &str,
    ) -> SdkResult;
    /// Merge the pairs stored in the file at `file` into `options`.
    fn options_load_from_file(
        &self,
        ctx: ContextHandle,
        options: OptionsHandle,
        file: &Path,
    ) -> SdkResult;

    // Sensor
    /// Create a sensor for the capture device identified by `device`.
    /// Creation does not open the device yet.
    fn sensor_create(&self, ctx: ContextHandle, device: &str) -> SdkResult<SensorHandle>;
    fn sensor_open(&self, ctx: ContextHandle, sensor: SensorHandle) -> SdkResult;
    /// Fill `options` with the capture descriptors of the sensor
    /// (`frame_info.*` keys).
    fn sensor_bind_capture_options(
        &self,
        ctx: ContextHandle,
        sensor: SensorHandle,
        options: OptionsHandle,
    ) -> SdkResult;
    /// Frame size of one stream, [`SdkError::Unsupported`] when the
    /// sensor has no such stream.
    fn sensor_image_size(
        &self,
        ctx: ContextHandle,
        sensor: SensorHandle,
        stream: StreamKind,
    ) -> SdkResult<FrameSize>;

    // Volume
    fn volume_create(&self, ctx: ContextHandle) -> SdkResult<VolumeHandle>;

    // Image
    fn image_create(&self, ctx: ContextHandle) -> SdkResult<ImageHandle>;
    fn image_destroy(&self, ctx: ContextHandle, image: ImageHandle) -> SdkResult;

    // Calibrator
    fn calibrator_create(&self, ctx: ContextHandle) -> SdkResult<CalibratorHandle>;
    fn calibrator_destroy(&self, ctx: ContextHandle, calibrator: CalibratorHandle) -> SdkResult;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capture_option_keys_follow_the_frame_info_scheme() {
        for kind in StreamKind::ALL {
            assert!(stream_supported_key(kind).starts_with("frame_info.supports_"));
            assert!(stream_width_key(kind).ends_with("_size.width"));
            assert!(stream_height_key(kind).ends_with("_size.height"));
        }
        assert_eq!(stream_width_key(StreamKind::Depth), "frame_info.depth_size.width");
    }
}
