use crate::sdk::SdkError;

/// Errors that can occur when driving the VoxRec SDK.
#[derive(Debug, thiserror::Error)]
pub enum VoxrecError {
    #[error("SDK call failed: {0}")]
    Sdk(#[from] SdkError),

    #[error("OpenCL context has not been compiled")]
    ContextNotCompiled,

    #[error("No sensor is open")]
    SensorNotOpen,

    #[error("Event stream stopped")]
    StreamStopped,

    #[error("Timeout waiting for an event")]
    Timeout,
}
