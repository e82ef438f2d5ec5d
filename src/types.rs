use std::fmt;

/// Width and height of one sensor image stream, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameSize {
    pub width: u32,
    pub height: u32,
}

impl FrameSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl fmt::Display for FrameSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Severity of a log line forwarded from the SDK's log callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Error => "error",
        })
    }
}

/// The three externally visible initialization stages, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// License authentication against the configured license file.
    License,
    /// Compile-option setup and OpenCL compilation of the context.
    OpenCl,
    /// Creating, opening and probing the configured capture device.
    Sensor,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Stage::License => "LICENSE",
            Stage::OpenCl => "OPENCL",
            Stage::Sensor => "SENSOR",
        })
    }
}

/// One kind of sensor image stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StreamKind {
    /// Auxiliary RGB stream.
    Aux,
    /// Depth stream.
    Depth,
    /// Rendered (phong-shaded) preview of the reconstruction volume.
    Preview,
}

impl StreamKind {
    /// Every stream kind, in probe order.
    pub const ALL: [StreamKind; 3] = [StreamKind::Aux, StreamKind::Depth, StreamKind::Preview];

    /// The capability flag corresponding to this kind.
    pub fn flag(self) -> Streams {
        match self {
            StreamKind::Aux => Streams::AUX,
            StreamKind::Depth => Streams::DEPTH,
            StreamKind::Preview => Streams::PREVIEW,
        }
    }

    pub(crate) fn index(self) -> usize {
        match self {
            StreamKind::Aux => 0,
            StreamKind::Depth => 1,
            StreamKind::Preview => 2,
        }
    }
}

impl fmt::Display for StreamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            StreamKind::Aux => "aux",
            StreamKind::Depth => "depth",
            StreamKind::Preview => "preview",
        })
    }
}

bitflags::bitflags! {
    /// Set of image streams a manager probes after opening a sensor.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Streams: u32 {
        const AUX     = 1 << 0;
        const DEPTH   = 1 << 1;
        const PREVIEW = 1 << 2;
    }
}

impl Streams {
    /// Stream kinds contained in this set, in probe order.
    pub fn kinds(self) -> impl Iterator<Item = StreamKind> {
        StreamKind::ALL
            .into_iter()
            .filter(move |kind| self.contains(kind.flag()))
    }
}

/// Notification emitted during an initialization cycle.
///
/// Events arrive on an [`crate::EventStream`] in the order the worker
/// produced them. `Finished` is always the terminal event of a cycle; the
/// manager accepts a new `initialize()` call only after it fired.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InitEvent {
    /// Log line forwarded from the SDK.
    Log { severity: Severity, message: String },
    /// A new initialization cycle has begun.
    SequenceStarted,
    /// The given stage is about to run.
    StageStarted(Stage),
    /// The given stage finished with the given outcome.
    StageFinished(Stage, bool),
    /// Frame size probed for one stream kind. `None` means the open
    /// sensor does not support the stream.
    FrameSize(StreamKind, Option<FrameSize>),
    /// Terminal event carrying the aggregate outcome of the cycle.
    Finished(bool),
}
