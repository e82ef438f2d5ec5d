//! Ownership and lifecycle of the SDK's core resources.
//!
//! [`ResourceManager`] holds the one SDK execution context an application
//! works with, plus the sensor and reconstruction volume that hang off
//! it. `initialize()` runs the staged startup sequence on a background
//! worker thread; progress and the outcome arrive as [`InitEvent`]s on
//! subscribed [`EventStream`]s.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::JoinHandle;

use crate::config::ConfigStore;
use crate::events::{EventHub, EventStream};
use crate::handles::{Calibrator, Context, Image};
use crate::sdk::{
    ContextHandle, LogCallback, SdkApi, SdkError, SdkResult, SensorHandle, VolumeHandle,
    OPT_DEVICE_ID,
};
use crate::types::{FrameSize, InitEvent, Stage, StreamKind, Streams};
use crate::{Result, VoxrecError};

/// Handle state shared between the manager, the init worker and
/// outstanding calibrators.
pub(crate) struct Inner {
    pub(crate) context: Option<Context>,
    pub(crate) sensor: Option<SensorHandle>,
    pub(crate) volume: Option<VolumeHandle>,
    pub(crate) has_compiled_context: bool,
    pub(crate) has_sensor: bool,
    pub(crate) has_volume: bool,
    /// Probed frame sizes, indexed by [`StreamKind::index`]. Slots keep
    /// their last value until the next successful sensor stage probes
    /// them again.
    pub(crate) sizes: [Option<FrameSize>; 3],
}

impl Inner {
    fn new() -> Self {
        Self {
            context: None,
            sensor: None,
            volume: None,
            has_compiled_context: false,
            has_sensor: false,
            has_volume: false,
            sizes: [None; 3],
        }
    }
}

fn lock_inner(state: &Mutex<Inner>) -> MutexGuard<'_, Inner> {
    state.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
}

/// Owner of the SDK context, sensor and reconstruction volume.
///
/// Initialization runs in four steps: reset (destroy and recreate the
/// context, attach the log callback), LICENSE (authenticate), OPENCL
/// (select a device and compile; the volume is allocated on first
/// success), SENSOR (create, open and probe the capture device). Stages
/// always all run; a failed stage leaves its flag cleared and the cycle
/// reports failure, but later stages still get their chance.
///
/// A cycle runs on a dedicated worker thread. While one is in flight,
/// further `initialize()` calls are ignored. All accessors are safe to
/// call concurrently, but values read between `SequenceStarted` and
/// `Finished` are a snapshot of a cycle in progress.
pub struct ResourceManager {
    sdk: Arc<dyn SdkApi>,
    config: Arc<dyn ConfigStore>,
    streams: Streams,
    hub: Arc<EventHub>,
    state: Arc<Mutex<Inner>>,
    initializing: Arc<AtomicBool>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl ResourceManager {
    /// Create a manager that probes every stream kind after sensor open.
    pub fn new(sdk: Arc<dyn SdkApi>, config: Arc<dyn ConfigStore>) -> Self {
        Self::with_streams(sdk, config, Streams::all())
    }

    /// Create a manager that probes only the given stream kinds.
    pub fn with_streams(
        sdk: Arc<dyn SdkApi>,
        config: Arc<dyn ConfigStore>,
        streams: Streams,
    ) -> Self {
        Self {
            sdk,
            config,
            streams,
            hub: Arc::new(EventHub::new()),
            state: Arc::new(Mutex::new(Inner::new())),
            initializing: Arc::new(AtomicBool::new(false)),
            worker: Mutex::new(None),
        }
    }

    /// Subscribe to initialization notifications.
    ///
    /// The stream receives every event emitted after this call; subscribe
    /// before `initialize()` to observe a full cycle.
    pub fn subscribe(&self) -> EventStream {
        self.hub.subscribe()
    }

    /// Start an initialization cycle on the worker thread.
    ///
    /// Non-blocking. Returns `true` when a new cycle was started and
    /// `false` when one is already in flight (the call is then a no-op).
    /// Completion and outcome are reported through the terminal
    /// [`InitEvent::Finished`] event, not through this return value.
    pub fn initialize(&self) -> bool {
        if self
            .initializing
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            log::debug!("initialize ignored: a cycle is already in flight");
            return false;
        }

        let mut slot = match self.worker.lock() {
            Ok(slot) => slot,
            Err(_) => {
                self.initializing.store(false, Ordering::Release);
                return false;
            }
        };
        // The previous worker already cleared the flag, so this join only
        // reaps a finished thread.
        if let Some(old) = slot.take() {
            let _ = old.join();
        }

        let worker = InitWorker {
            sdk: self.sdk.clone(),
            config: self.config.clone(),
            streams: self.streams,
            hub: self.hub.clone(),
            state: self.state.clone(),
        };
        let initializing = self.initializing.clone();

        let spawned = std::thread::Builder::new()
            .name("voxrec-init".into())
            .spawn(move || {
                worker.run();
                initializing.store(false, Ordering::Release);
            });

        match spawned {
            Ok(handle) => {
                *slot = Some(handle);
                true
            }
            Err(e) => {
                log::error!("failed to spawn init worker: {}", e);
                self.initializing.store(false, Ordering::Release);
                false
            }
        }
    }

    /// Whether an initialization cycle is currently in flight.
    pub fn is_initializing(&self) -> bool {
        self.initializing.load(Ordering::Acquire)
    }

    /// The current SDK context, if one exists.
    pub fn context(&self) -> Option<ContextHandle> {
        self.lock().context.as_ref().map(Context::handle)
    }

    /// The current sensor. Present from sensor creation on, even when the
    /// subsequent open failed; check [`ResourceManager::has_sensor`] for
    /// an opened one.
    pub fn sensor(&self) -> Option<SensorHandle> {
        self.lock().sensor
    }

    /// The reconstruction volume, allocated by the first successful
    /// OPENCL stage and reused by every later cycle.
    pub fn volume(&self) -> Option<VolumeHandle> {
        self.lock().volume
    }

    /// Frame size probed for `kind`, `None` while unknown or unsupported.
    pub fn frame_size(&self, kind: StreamKind) -> Option<FrameSize> {
        self.lock().sizes[kind.index()]
    }

    /// Size of the auxiliary RGB stream.
    pub fn rgb_size(&self) -> Option<FrameSize> {
        self.frame_size(StreamKind::Aux)
    }

    /// Size of the depth stream.
    pub fn depth_size(&self) -> Option<FrameSize> {
        self.frame_size(StreamKind::Depth)
    }

    /// Size of the rendered volume preview stream.
    pub fn preview_size(&self) -> Option<FrameSize> {
        self.frame_size(StreamKind::Preview)
    }

    pub fn has_compiled_context(&self) -> bool {
        self.lock().has_compiled_context
    }

    pub fn has_sensor(&self) -> bool {
        self.lock().has_sensor
    }

    pub fn has_volume(&self) -> bool {
        self.lock().has_volume
    }

    /// The stream kinds this manager probes after opening a sensor.
    pub fn streams(&self) -> Streams {
        self.streams
    }

    /// Allocate an image buffer on the current context.
    ///
    /// Needs a compiled context; fails with
    /// [`VoxrecError::ContextNotCompiled`] before the first successful
    /// OPENCL stage. The buffer is released when the returned [`Image`]
    /// drops.
    pub fn new_image(&self) -> Result<Image> {
        let ctx = {
            let inner = self.lock();
            if !inner.has_compiled_context {
                return Err(VoxrecError::ContextNotCompiled);
            }
            inner
                .context
                .as_ref()
                .map(Context::handle)
                .ok_or(VoxrecError::ContextNotCompiled)?
        };
        let handle = self.sdk.image_create(ctx)?;
        Ok(Image::new(self.sdk.clone(), ctx, handle))
    }

    /// Allocate a sensor calibrator on the current context.
    ///
    /// Needs a compiled context and an open sensor; fails with
    /// [`VoxrecError::ContextNotCompiled`] or
    /// [`VoxrecError::SensorNotOpen`] otherwise. The calibrator is
    /// released when the returned [`Calibrator`] drops, unless the
    /// manager tore the context down first.
    pub fn new_calibrator(&self) -> Result<Calibrator> {
        let ctx = {
            let inner = self.lock();
            if !inner.has_compiled_context {
                return Err(VoxrecError::ContextNotCompiled);
            }
            if !inner.has_sensor {
                return Err(VoxrecError::SensorNotOpen);
            }
            inner
                .context
                .as_ref()
                .map(Context::handle)
                .ok_or(VoxrecError::ContextNotCompiled)?
        };
        let handle = self.sdk.calibrator_create(ctx)?;
        Ok(Calibrator::new(
            self.sdk.clone(),
            self.state.clone(),
            ctx,
            handle,
        ))
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        lock_inner(&self.state)
    }
}

impl Drop for ResourceManager {
    fn drop(&mut self) {
        // A running cycle is never cancelled; wait it out.
        if let Ok(mut slot) = self.worker.lock() {
            if let Some(handle) = slot.take() {
                let _ = handle.join();
            }
        }

        // Clearing the flags and removing the context happen in one
        // critical section; outstanding calibrators that lock afterwards
        // see the cleared flag and skip their destroy call.
        let context = {
            let mut inner = self.lock();
            inner.has_compiled_context = false;
            inner.has_sensor = false;
            inner.sensor = None;
            inner.context.take()
        };
        drop(context);
    }
}

/// One initialization cycle, run to completion on the worker thread.
struct InitWorker {
    sdk: Arc<dyn SdkApi>,
    config: Arc<dyn ConfigStore>,
    streams: Streams,
    hub: Arc<EventHub>,
    state: Arc<Mutex<Inner>>,
}

impl InitWorker {
    fn run(&self) {
        log::info!("starting SDK initialization");

        {
            let mut inner = self.lock();
            inner.has_compiled_context = false;
            inner.has_sensor = false;
            // has_volume stays: the volume is allocated at most once and
            // survives context recreation.
        }

        self.hub.emit(InitEvent::SequenceStarted);

        // The old context, and the sensor bound to it, must be gone
        // before the new one exists. Dropping outside the lock keeps the
        // destroy call from blocking accessors.
        let previous = {
            let mut inner = self.lock();
            inner.sensor = None;
            inner.context.take()
        };
        drop(previous);

        let ctx = match Context::create(self.sdk.clone()) {
            Ok(context) => {
                let handle = context.handle();
                let hub = self.hub.clone();
                let callback: LogCallback = Box::new(move |severity, message| {
                    hub.emit(InitEvent::Log {
                        severity,
                        message: message.to_string(),
                    });
                });
                if let Err(e) = self.sdk.context_set_log_callback(handle, callback) {
                    log::warn!("could not attach SDK log callback: {}", e);
                }
                self.lock().context = Some(context);
                Some(handle)
            }
            Err(e) => {
                log::error!("context creation failed: {}", e);
                None
            }
        };

        self.hub.emit(InitEvent::StageStarted(Stage::License));
        let ok = ctx.map_or(false, |c| self.apply_license(c));
        self.hub.emit(InitEvent::StageFinished(Stage::License, ok));

        self.hub.emit(InitEvent::StageStarted(Stage::OpenCl));
        let ok = ctx.map_or(false, |c| self.compile_context(c));
        self.hub.emit(InitEvent::StageFinished(Stage::OpenCl, ok));

        self.hub.emit(InitEvent::StageStarted(Stage::Sensor));
        let ok = ctx.map_or(false, |c| self.open_sensor(c));
        self.hub.emit(InitEvent::StageFinished(Stage::Sensor, ok));

        let success = {
            let inner = self.lock();
            inner.has_compiled_context && inner.has_sensor && inner.has_volume
        };
        log::info!("SDK initialization finished (success={})", success);
        self.hub.emit(InitEvent::Finished(success));
    }

    /// LICENSE stage: authenticate against the configured license file.
    ///
    /// Only the invalid-license and unspecified outcomes fail the stage.
    /// Any other authentication error leaves the stage successful; the
    /// context is then still unlicensed and later stages surface that.
    fn apply_license(&self, ctx: ContextHandle) -> bool {
        let license = match self.sdk.license_create(ctx) {
            Ok(license) => license,
            Err(e) => {
                log::warn!("license object creation failed: {}", e);
                return false;
            }
        };

        let file = self.config.license_file();
        match self.sdk.license_authenticate(ctx, license, &file) {
            Err(SdkError::InvalidLicense) | Err(SdkError::Unspecified) => {
                log::warn!("license authentication failed ({})", file.display());
                false
            }
            _ => true,
        }
    }

    /// OPENCL stage: bind compile options, apply the configuration and
    /// compile. The first success also allocates the reconstruction
    /// volume.
    fn compile_context(&self, ctx: ContextHandle) -> bool {
        let compiled = match self.try_compile(ctx) {
            Ok(()) => true,
            Err(e) => {
                log::warn!("context compilation failed: {}", e);
                false
            }
        };

        if compiled && self.lock().volume.is_none() {
            match self.sdk.volume_create(ctx) {
                Ok(volume) => {
                    let mut inner = self.lock();
                    inner.volume = Some(volume);
                    inner.has_volume = true;
                }
                Err(e) => log::warn!("volume allocation failed: {}", e),
            }
        }

        self.lock().has_compiled_context = compiled;
        compiled
    }

    fn try_compile(&self, ctx: ContextHandle) -> SdkResult {
        let options = self.sdk.options_create(ctx)?;
        self.sdk.context_bind_compile_options(ctx, options)?;

        if let Some(file) = self.config.config_file() {
            self.sdk.options_load_from_file(ctx, options, &file)?;
        }

        // The configured device wins over anything the options file set.
        let device = self.config.opencl_device();
        self.sdk
            .options_set(ctx, options, OPT_DEVICE_ID, &device.to_string())?;

        self.sdk.context_compile(ctx)
    }

    /// SENSOR stage: create and open the configured capture device, then
    /// probe the frame size of every configured stream kind.
    fn open_sensor(&self, ctx: ContextHandle) -> bool {
        // Sensors cannot exist on an uncompiled context; skip the SDK
        // entirely.
        if !self.lock().has_compiled_context {
            return false;
        }

        let sensor = match self.try_open(ctx) {
            Ok(sensor) => Some(sensor),
            Err(e) => {
                log::warn!("sensor open failed: {}", e);
                None
            }
        };

        if let Some(sensor) = sensor {
            for kind in self.streams.kinds() {
                let size = self.sdk.sensor_image_size(ctx, sensor, kind).ok();
                self.lock().sizes[kind.index()] = size;
                self.hub.emit(InitEvent::FrameSize(kind, size));
            }
        }

        let opened = sensor.is_some();
        self.lock().has_sensor = opened;
        opened
    }

    fn try_open(&self, ctx: ContextHandle) -> SdkResult<SensorHandle> {
        let device = self.config.sensor_device();
        let sensor = self.sdk.sensor_create(ctx, &device)?;
        // Keep the handle even when the open below fails.
        self.lock().sensor = Some(sensor);
        self.sdk.sensor_open(ctx, sensor)?;
        Ok(sensor)
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        lock_inner(&self.state)
    }
}
