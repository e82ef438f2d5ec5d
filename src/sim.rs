//! Deterministic in-memory stand-in for the native VoxRec SDK.
//!
//! [`SimSdk`] implements [`SdkApi`] against plain tables so lifecycle
//! behavior can be exercised without the vendor library, an OpenCL
//! runtime or camera hardware. Failure injection covers the interesting
//! paths (license verdicts, missing devices, compile failures, slow
//! calls), and [`SimStats`] counts calls for ownership assertions. The
//! demos run against it too.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use crate::sdk::{
    stream_height_key, stream_supported_key, stream_width_key, CalibratorHandle, ContextHandle,
    ImageHandle, LicenseHandle, LogCallback, OptionsHandle, SdkApi, SdkError, SdkResult,
    SensorHandle, VolumeHandle, OPT_DEVICE_ID,
};
use crate::types::{FrameSize, Severity, StreamKind};

const SIM_VERSION: &str = "2.4.1-sim";

/// Authentication outcome configured for a license file path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LicenseVerdict {
    /// Authentication succeeds.
    Valid,
    /// Authentication reports an invalid license.
    Invalid,
    /// Authentication reports an unspecified error.
    Error,
    /// The license file cannot be read at all.
    Missing,
}

/// Description of one simulated capture device.
#[derive(Debug, Clone, Default)]
pub struct SensorProfile {
    streams: HashMap<StreamKind, FrameSize>,
    fail_open: bool,
}

impl SensorProfile {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a supported stream with its frame size.
    pub fn with_stream(mut self, kind: StreamKind, width: u32, height: u32) -> Self {
        self.streams.insert(kind, FrameSize::new(width, height));
        self
    }

    /// Let `sensor_create` succeed but make the subsequent open fail.
    pub fn failing_open(mut self) -> Self {
        self.fail_open = true;
        self
    }

    /// An RGB-D device supporting every stream kind at the same size.
    pub fn rgbd(width: u32, height: u32) -> Self {
        Self::new()
            .with_stream(StreamKind::Aux, width, height)
            .with_stream(StreamKind::Depth, width, height)
            .with_stream(StreamKind::Preview, width, height)
    }
}

/// Builder configuring the simulated environment.
#[derive(Debug)]
pub struct SimBuilder {
    licenses: HashMap<PathBuf, LicenseVerdict>,
    sensors: HashMap<String, SensorProfile>,
    option_files: HashMap<PathBuf, Vec<(String, String)>>,
    opencl_devices: u32,
    fail_compile: bool,
    compile_delay: Duration,
    open_delay: Duration,
}

impl Default for SimBuilder {
    fn default() -> Self {
        Self {
            licenses: HashMap::new(),
            sensors: HashMap::new(),
            option_files: HashMap::new(),
            opencl_devices: 1,
            fail_compile: false,
            compile_delay: Duration::ZERO,
            open_delay: Duration::ZERO,
        }
    }
}

impl SimBuilder {
    /// Configure the authentication outcome for a license file path.
    /// Paths never configured authenticate as [`LicenseVerdict::Invalid`].
    pub fn license(mut self, file: impl Into<PathBuf>, verdict: LicenseVerdict) -> Self {
        self.licenses.insert(file.into(), verdict);
        self
    }

    /// Add a capture device reachable under the identifier `device`.
    pub fn sensor(mut self, device: impl Into<String>, profile: SensorProfile) -> Self {
        self.sensors.insert(device.into(), profile);
        self
    }

    /// Provide a loadable compile-options file with the given pairs.
    pub fn option_file(mut self, file: impl Into<PathBuf>, pairs: &[(&str, &str)]) -> Self {
        self.option_files.insert(
            file.into(),
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        );
        self
    }

    /// Number of OpenCL devices present (default 1).
    pub fn opencl_devices(mut self, count: u32) -> Self {
        self.opencl_devices = count;
        self
    }

    /// Make every compile call fail regardless of device selection.
    pub fn failing_compile(mut self) -> Self {
        self.fail_compile = true;
        self
    }

    /// Sleep inside `context_compile`, keeping cycles observable
    /// mid-flight.
    pub fn compile_delay(mut self, delay: Duration) -> Self {
        self.compile_delay = delay;
        self
    }

    /// Sleep inside `sensor_open`.
    pub fn open_delay(mut self, delay: Duration) -> Self {
        self.open_delay = delay;
        self
    }

    pub fn build(self) -> SimSdk {
        SimSdk {
            licenses: self.licenses,
            sensors: self.sensors,
            option_files: self.option_files,
            opencl_devices: self.opencl_devices,
            fail_compile: self.fail_compile,
            compile_delay: self.compile_delay,
            open_delay: self.open_delay,
            state: Mutex::new(SimState::default()),
            callbacks: Mutex::new(HashMap::new()),
        }
    }
}

/// Call counters, for asserting resource ownership in tests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SimStats {
    pub contexts_created: u32,
    pub contexts_destroyed: u32,
    pub live_contexts: u32,
    pub peak_live_contexts: u32,
    pub volumes_created: u32,
    pub sensors_created: u32,
    pub images_created: u32,
    pub images_destroyed: u32,
    pub calibrators_created: u32,
    pub calibrators_destroyed: u32,
}

#[derive(Default)]
struct SimState {
    next_id: u64,
    contexts: HashMap<ContextHandle, ContextState>,
    /// Volumes outlive the context that created them.
    volumes: Vec<VolumeHandle>,
    stats: SimStats,
}

#[derive(Default)]
struct ContextState {
    licensed: bool,
    compiled: bool,
    compile_options: Option<OptionsHandle>,
    licenses: Vec<LicenseHandle>,
    options: HashMap<OptionsHandle, HashMap<String, String>>,
    sensors: HashMap<SensorHandle, SensorState>,
    images: HashSet<ImageHandle>,
    calibrators: HashSet<CalibratorHandle>,
}

struct SensorState {
    device: String,
    opened: bool,
}

/// In-memory [`SdkApi`] implementation.
pub struct SimSdk {
    licenses: HashMap<PathBuf, LicenseVerdict>,
    sensors: HashMap<String, SensorProfile>,
    option_files: HashMap<PathBuf, Vec<(String, String)>>,
    opencl_devices: u32,
    fail_compile: bool,
    compile_delay: Duration,
    open_delay: Duration,
    state: Mutex<SimState>,
    callbacks: Mutex<HashMap<ContextHandle, LogCallback>>,
}

impl SimSdk {
    pub fn builder() -> SimBuilder {
        SimBuilder::default()
    }

    /// A sim with one valid license, one RGB-D device and one OpenCL
    /// device: everything a successful cycle needs.
    pub fn ready(license: &str, device: &str) -> SimSdk {
        Self::builder()
            .license(license, LicenseVerdict::Valid)
            .sensor(device, SensorProfile::rgbd(640, 480))
            .build()
    }

    /// Snapshot of the call counters.
    pub fn stats(&self) -> SimStats {
        self.lock().stats
    }

    fn lock(&self) -> MutexGuard<'_, SimState> {
        self.state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn next_id(state: &mut SimState) -> u64 {
        state.next_id += 1;
        state.next_id
    }

    /// Forward a log line to the callback registered for `ctx`, if any.
    /// Called without the state lock held.
    fn log(&self, ctx: ContextHandle, severity: Severity, message: &str) {
        if let Ok(callbacks) = self.callbacks.lock() {
            if let Some(callback) = callbacks.get(&ctx) {
                callback(severity, message);
            }
        }
    }
}

impl SdkApi for SimSdk {
    fn context_create(&self) -> SdkResult<ContextHandle> {
        let mut state = self.lock();
        let handle = ContextHandle(Self::next_id(&mut state));
        state.contexts.insert(handle, ContextState::default());
        state.stats.contexts_created += 1;
        state.stats.live_contexts += 1;
        state.stats.peak_live_contexts =
            state.stats.peak_live_contexts.max(state.stats.live_contexts);
        Ok(handle)
    }

    fn context_destroy(&self, ctx: ContextHandle) -> SdkResult {
        let mut state = self.lock();
        if state.contexts.remove(&ctx).is_none() {
            return Err(SdkError::InvalidHandle);
        }
        state.stats.contexts_destroyed += 1;
        state.stats.live_contexts -= 1;
        drop(state);
        if let Ok(mut callbacks) = self.callbacks.lock() {
            callbacks.remove(&ctx);
        }
        Ok(())
    }

    fn context_set_log_callback(&self, ctx: ContextHandle, callback: LogCallback) -> SdkResult {
        if !self.lock().contexts.contains_key(&ctx) {
            return Err(SdkError::InvalidHandle);
        }
        if let Ok(mut callbacks) = self.callbacks.lock() {
            callbacks.insert(ctx, callback);
        }
        self.log(
            ctx,
            Severity::Info,
            &format!("VoxRec SDK {} ready", SIM_VERSION),
        );
        Ok(())
    }

    fn context_bind_compile_options(
        &self,
        ctx: ContextHandle,
        options: OptionsHandle,
    ) -> SdkResult {
        let mut state = self.lock();
        let ctx_state = state.contexts.get_mut(&ctx).ok_or(SdkError::InvalidHandle)?;
        if !ctx_state.options.contains_key(&options) {
            return Err(SdkError::InvalidHandle);
        }
        ctx_state.compile_options = Some(options);
        Ok(())
    }

    fn context_compile(&self, ctx: ContextHandle) -> SdkResult {
        if !self.compile_delay.is_zero() {
            std::thread::sleep(self.compile_delay);
        }

        let mut state = self.lock();
        let ctx_state = state.contexts.get_mut(&ctx).ok_or(SdkError::InvalidHandle)?;

        if !ctx_state.licensed {
            drop(state);
            self.log(
                ctx,
                Severity::Error,
                "cannot compile: no authenticated license",
            );
            return Err(SdkError::InvalidLicense);
        }
        if self.fail_compile {
            drop(state);
            self.log(ctx, Severity::Error, "OpenCL program build failed");
            return Err(SdkError::Unspecified);
        }

        let requested = ctx_state
            .compile_options
            .and_then(|options| ctx_state.options.get(&options))
            .and_then(|kv| kv.get(OPT_DEVICE_ID))
            .and_then(|v| v.parse::<i32>().ok())
            .unwrap_or(-1);

        let available = self.opencl_devices as i32;
        // -1 means pick the first device, if there is one.
        let selected = if requested < 0 {
            if available > 0 {
                0
            } else {
                -1
            }
        } else {
            requested
        };
        if selected < 0 || selected >= available {
            drop(state);
            self.log(
                ctx,
                Severity::Error,
                &format!(
                    "OpenCL device {} not available ({} present)",
                    requested, available
                ),
            );
            return Err(SdkError::Unspecified);
        }

        ctx_state.compiled = true;
        drop(state);
        self.log(
            ctx,
            Severity::Info,
            &format!("compiled OpenCL kernels for device {}", selected),
        );
        Ok(())
    }

    fn license_create(&self, ctx: ContextHandle) -> SdkResult<LicenseHandle> {
        let mut state = self.lock();
        let id = Self::next_id(&mut state);
        let ctx_state = state.contexts.get_mut(&ctx).ok_or(SdkError::InvalidHandle)?;
        let handle = LicenseHandle(id);
        ctx_state.licenses.push(handle);
        Ok(handle)
    }

    fn license_authenticate(
        &self,
        ctx: ContextHandle,
        license: LicenseHandle,
        file: &Path,
    ) -> SdkResult {
        let verdict = self
            .licenses
            .get(file)
            .copied()
            .unwrap_or(LicenseVerdict::Invalid);

        let mut state = self.lock();
        let ctx_state = state.contexts.get_mut(&ctx).ok_or(SdkError::InvalidHandle)?;
        if !ctx_state.licenses.contains(&license) {
            return Err(SdkError::InvalidHandle);
        }

        let result = match verdict {
            LicenseVerdict::Valid => {
                ctx_state.licensed = true;
                Ok(())
            }
            LicenseVerdict::Invalid => Err(SdkError::InvalidLicense),
            LicenseVerdict::Error => Err(SdkError::Unspecified),
            LicenseVerdict::Missing => Err(SdkError::FileNotFound),
        };
        drop(state);

        match &result {
            Ok(()) => self.log(
                ctx,
                Severity::Info,
                &format!("license {} accepted", file.display()),
            ),
            Err(e) => self.log(
                ctx,
                Severity::Warning,
                &format!("license {} rejected: {}", file.display(), e),
            ),
        }
        result
    }

    fn options_create(&self, ctx: ContextHandle) -> SdkResult<OptionsHandle> {
        let mut state = self.lock();
        let id = Self::next_id(&mut state);
        let ctx_state = state.contexts.get_mut(&ctx).ok_or(SdkError::InvalidHandle)?;
        let handle = OptionsHandle(id);
        ctx_state.options.insert(handle, HashMap::new());
        Ok(handle)
    }

    fn options_get_bool(
        &self,
        ctx: ContextHandle,
        options: OptionsHandle,
        key: &str,
    ) -> SdkResult<bool> {
        let state = self.lock();
        let kv = state
            .contexts
            .get(&ctx)
            .ok_or(SdkError::InvalidHandle)?
            .options
            .get(&options)
            .ok_or(SdkError::InvalidHandle)?;
        match kv.get(key) {
            Some(v) => Ok(v == "true" || v == "1"),
            None => Err(SdkError::UnknownOption),
        }
    }

    fn options_get_int(
        &self,
        ctx: ContextHandle,
        options: OptionsHandle,
        key: &str,
    ) -> SdkResult<i32> {
        let state = self.lock();
        let kv = state
            .contexts
            .get(&ctx)
            .ok_or(SdkError::InvalidHandle)?
            .options
            .get(&options)
            .ok_or(SdkError::InvalidHandle)?;
        match kv.get(key) {
            Some(v) => v.parse().map_err(|_| SdkError::Unspecified),
            None => Err(SdkError::UnknownOption),
        }
    }

    fn options_set(
        &self,
        ctx: ContextHandle,
        options: OptionsHandle,
        key: &str,
        value: &str,
    ) -> SdkResult {
        let mut state = self.lock();
        let kv = state
            .contexts
            .get_mut(&ctx)
            .ok_or(SdkError::InvalidHandle)?
            .options
            .get_mut(&options)
            .ok_or(SdkError::InvalidHandle)?;
        kv.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn options_load_from_file(
        &self,
        ctx: ContextHandle,
        options: OptionsHandle,
        file: &Path,
    ) -> SdkResult {
        let pairs = self
            .option_files
            .get(file)
            .ok_or(SdkError::FileNotFound)?
            .clone();

        let mut state = self.lock();
        let kv = state
            .contexts
            .get_mut(&ctx)
            .ok_or(SdkError::InvalidHandle)?
            .options
            .get_mut(&options)
            .ok_or(SdkError::InvalidHandle)?;
        for (key, value) in pairs {
            kv.insert(key, value);
        }
        drop(state);

        self.log(
            ctx,
            Severity::Info,
            &format!("loaded compile options from {}", file.display()),
        );
        Ok(())
    }

    fn sensor_create(&self, ctx: ContextHandle, device: &str) -> SdkResult<SensorHandle> {
        let known = self.sensors.contains_key(device);
        let mut state = self.lock();
        if !state.contexts.contains_key(&ctx) {
            return Err(SdkError::InvalidHandle);
        }
        if !known {
            drop(state);
            self.log(
                ctx,
                Severity::Warning,
                &format!("no capture device matches '{}'", device),
            );
            return Err(SdkError::DeviceNotFound);
        }

        let id = Self::next_id(&mut state);
        let ctx_state = state.contexts.get_mut(&ctx).ok_or(SdkError::InvalidHandle)?;
        let handle = SensorHandle(id);
        ctx_state.sensors.insert(
            handle,
            SensorState {
                device: device.to_string(),
                opened: false,
            },
        );
        state.stats.sensors_created += 1;
        Ok(handle)
    }

    fn sensor_open(&self, ctx: ContextHandle, sensor: SensorHandle) -> SdkResult {
        if !self.open_delay.is_zero() {
            std::thread::sleep(self.open_delay);
        }

        let mut state = self.lock();
        let ctx_state = state.contexts.get_mut(&ctx).ok_or(SdkError::InvalidHandle)?;
        let sensor_state = ctx_state
            .sensors
            .get_mut(&sensor)
            .ok_or(SdkError::InvalidHandle)?;
        let device = sensor_state.device.clone();

        let fail = self
            .sensors
            .get(&device)
            .map(|profile| profile.fail_open)
            .unwrap_or(true);
        if fail {
            drop(state);
            self.log(
                ctx,
                Severity::Warning,
                &format!("could not open capture device '{}'", device),
            );
            return Err(SdkError::Unspecified);
        }

        sensor_state.opened = true;
        drop(state);
        self.log(
            ctx,
            Severity::Info,
            &format!("capture device '{}' opened", device),
        );
        Ok(())
    }

    fn sensor_bind_capture_options(
        &self,
        ctx: ContextHandle,
        sensor: SensorHandle,
        options: OptionsHandle,
    ) -> SdkResult {
        let mut state = self.lock();
        let ctx_state = state.contexts.get_mut(&ctx).ok_or(SdkError::InvalidHandle)?;
        let device = ctx_state
            .sensors
            .get(&sensor)
            .ok_or(SdkError::InvalidHandle)?
            .device
            .clone();
        let profile = self.sensors.get(&device).cloned().unwrap_or_default();
        let kv = ctx_state
            .options
            .get_mut(&options)
            .ok_or(SdkError::InvalidHandle)?;

        for kind in StreamKind::ALL {
            match profile.streams.get(&kind) {
                Some(size) => {
                    kv.insert(stream_supported_key(kind).to_string(), "true".to_string());
                    kv.insert(stream_width_key(kind).to_string(), size.width.to_string());
                    kv.insert(stream_height_key(kind).to_string(), size.height.to_string());
                }
                None => {
                    kv.insert(stream_supported_key(kind).to_string(), "false".to_string());
                }
            }
        }
        Ok(())
    }

    fn sensor_image_size(
        &self,
        ctx: ContextHandle,
        sensor: SensorHandle,
        stream: StreamKind,
    ) -> SdkResult<FrameSize> {
        let state = self.lock();
        let sensor_state = state
            .contexts
            .get(&ctx)
            .ok_or(SdkError::InvalidHandle)?
            .sensors
            .get(&sensor)
            .ok_or(SdkError::InvalidHandle)?;
        self.sensors
            .get(&sensor_state.device)
            .and_then(|profile| profile.streams.get(&stream))
            .copied()
            .ok_or(SdkError::Unsupported)
    }

    fn volume_create(&self, ctx: ContextHandle) -> SdkResult<VolumeHandle> {
        let mut state = self.lock();
        if !state.contexts.contains_key(&ctx) {
            return Err(SdkError::InvalidHandle);
        }
        let handle = VolumeHandle(Self::next_id(&mut state));
        state.volumes.push(handle);
        state.stats.volumes_created += 1;
        drop(state);
        self.log(ctx, Severity::Info, "reconstruction volume allocated");
        Ok(handle)
    }

    fn image_create(&self, ctx: ContextHandle) -> SdkResult<ImageHandle> {
        let mut state = self.lock();
        let id = Self::next_id(&mut state);
        let ctx_state = state.contexts.get_mut(&ctx).ok_or(SdkError::InvalidHandle)?;
        let handle = ImageHandle(id);
        ctx_state.images.insert(handle);
        state.stats.images_created += 1;
        Ok(handle)
    }

    fn image_destroy(&self, ctx: ContextHandle, image: ImageHandle) -> SdkResult {
        let mut state = self.lock();
        let ctx_state = state.contexts.get_mut(&ctx).ok_or(SdkError::InvalidHandle)?;
        if !ctx_state.images.remove(&image) {
            return Err(SdkError::InvalidHandle);
        }
        state.stats.images_destroyed += 1;
        Ok(())
    }

    fn calibrator_create(&self, ctx: ContextHandle) -> SdkResult<CalibratorHandle> {
        let mut state = self.lock();
        let id = Self::next_id(&mut state);
        let ctx_state = state.contexts.get_mut(&ctx).ok_or(SdkError::InvalidHandle)?;
        let handle = CalibratorHandle(id);
        ctx_state.calibrators.insert(handle);
        state.stats.calibrators_created += 1;
        Ok(handle)
    }

    fn calibrator_destroy(&self, ctx: ContextHandle, calibrator: CalibratorHandle) -> SdkResult {
        let mut state = self.lock();
        let ctx_state = state.contexts.get_mut(&ctx).ok_or(SdkError::InvalidHandle)?;
        if !ctx_state.calibrators.remove(&calibrator) {
            return Err(SdkError::InvalidHandle);
        }
        state.stats.calibrators_destroyed += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn context_lifecycle_is_counted() {
        let sim = SimSdk::builder().build();
        let first = sim.context_create().unwrap();
        let second = sim.context_create().unwrap();
        assert_ne!(first, second);

        sim.context_destroy(first).unwrap();
        assert_eq!(sim.context_destroy(first), Err(SdkError::InvalidHandle));

        let stats = sim.stats();
        assert_eq!(stats.contexts_created, 2);
        assert_eq!(stats.contexts_destroyed, 1);
        assert_eq!(stats.live_contexts, 1);
        assert_eq!(stats.peak_live_contexts, 2);
    }

    #[test]
    fn destroyed_contexts_reject_further_calls() {
        let sim = SimSdk::builder().build();
        let ctx = sim.context_create().unwrap();
        sim.context_destroy(ctx).unwrap();

        assert_eq!(sim.options_create(ctx), Err(SdkError::InvalidHandle));
        assert_eq!(sim.license_create(ctx), Err(SdkError::InvalidHandle));
        assert_eq!(sim.context_compile(ctx), Err(SdkError::InvalidHandle));
        assert_eq!(sim.volume_create(ctx), Err(SdkError::InvalidHandle));
    }

    #[test]
    fn license_verdicts_map_to_status_codes() {
        let cases = [
            (LicenseVerdict::Valid, Ok(())),
            (LicenseVerdict::Invalid, Err(SdkError::InvalidLicense)),
            (LicenseVerdict::Error, Err(SdkError::Unspecified)),
            (LicenseVerdict::Missing, Err(SdkError::FileNotFound)),
        ];
        for (verdict, expected) in cases {
            let sim = SimSdk::builder().license("key.sig", verdict).build();
            let ctx = sim.context_create().unwrap();
            let license = sim.license_create(ctx).unwrap();
            assert_eq!(
                sim.license_authenticate(ctx, license, Path::new("key.sig")),
                expected
            );
        }

        // Unconfigured paths authenticate as invalid.
        let sim = SimSdk::builder().build();
        let ctx = sim.context_create().unwrap();
        let license = sim.license_create(ctx).unwrap();
        assert_eq!(
            sim.license_authenticate(ctx, license, Path::new("other.sig")),
            Err(SdkError::InvalidLicense)
        );
    }

    #[test]
    fn compile_needs_a_license_and_an_existing_device() {
        let sim = SimSdk::builder().license("key.sig", LicenseVerdict::Valid).build();
        let ctx = sim.context_create().unwrap();

        assert_eq!(sim.context_compile(ctx), Err(SdkError::InvalidLicense));

        let license = sim.license_create(ctx).unwrap();
        sim.license_authenticate(ctx, license, Path::new("key.sig"))
            .unwrap();
        sim.context_compile(ctx).unwrap();

        // Out-of-range device selection.
        let options = sim.options_create(ctx).unwrap();
        sim.context_bind_compile_options(ctx, options).unwrap();
        sim.options_set(ctx, options, OPT_DEVICE_ID, "5").unwrap();
        assert_eq!(sim.context_compile(ctx), Err(SdkError::Unspecified));

        // No devices at all: even automatic selection fails.
        let sim = SimSdk::builder()
            .license("key.sig", LicenseVerdict::Valid)
            .opencl_devices(0)
            .build();
        let ctx = sim.context_create().unwrap();
        let license = sim.license_create(ctx).unwrap();
        sim.license_authenticate(ctx, license, Path::new("key.sig"))
            .unwrap();
        assert_eq!(sim.context_compile(ctx), Err(SdkError::Unspecified));
    }

    #[test]
    fn capture_options_expose_stream_capabilities() {
        let sim = SimSdk::builder()
            .sensor(
                "depth-cam",
                SensorProfile::new().with_stream(StreamKind::Depth, 320, 240),
            )
            .build();
        let ctx = sim.context_create().unwrap();
        let sensor = sim.sensor_create(ctx, "depth-cam").unwrap();
        let options = sim.options_create(ctx).unwrap();
        sim.sensor_bind_capture_options(ctx, sensor, options).unwrap();

        assert!(sim
            .options_get_bool(ctx, options, stream_supported_key(StreamKind::Depth))
            .unwrap());
        assert_eq!(
            sim.options_get_int(ctx, options, stream_width_key(StreamKind::Depth))
                .unwrap(),
            320
        );
        assert_eq!(
            sim.options_get_int(ctx, options, stream_height_key(StreamKind::Depth))
                .unwrap(),
            240
        );

        assert!(!sim
            .options_get_bool(ctx, options, stream_supported_key(StreamKind::Aux))
            .unwrap());
        assert_eq!(
            sim.options_get_int(ctx, options, stream_width_key(StreamKind::Aux)),
            Err(SdkError::UnknownOption)
        );
    }

    #[test]
    fn option_files_merge_into_the_target_set() {
        let sim = SimSdk::builder()
            .option_file("/cfg/opts", &[(OPT_DEVICE_ID, "2"), ("volume.res", "256")])
            .build();
        let ctx = sim.context_create().unwrap();
        let options = sim.options_create(ctx).unwrap();

        assert_eq!(
            sim.options_load_from_file(ctx, options, Path::new("/cfg/missing")),
            Err(SdkError::FileNotFound)
        );

        sim.options_load_from_file(ctx, options, Path::new("/cfg/opts"))
            .unwrap();
        assert_eq!(sim.options_get_int(ctx, options, OPT_DEVICE_ID).unwrap(), 2);
        assert_eq!(sim.options_get_int(ctx, options, "volume.res").unwrap(), 256);
    }

    #[test]
    fn log_callback_receives_sdk_lines() {
        let sim = SimSdk::builder().license("key.sig", LicenseVerdict::Valid).build();
        let ctx = sim.context_create().unwrap();

        let lines = Arc::new(Mutex::new(Vec::new()));
        let sink = lines.clone();
        sim.context_set_log_callback(
            ctx,
            Box::new(move |severity, message| {
                sink.lock().unwrap().push((severity, message.to_string()));
            }),
        )
        .unwrap();

        let license = sim.license_create(ctx).unwrap();
        sim.license_authenticate(ctx, license, Path::new("key.sig"))
            .unwrap();

        let lines = lines.lock().unwrap();
        assert!(lines
            .iter()
            .any(|(severity, message)| *severity == Severity::Info
                && message.contains("license")));
    }
}
