//! # voxrec - resource lifecycle manager for the VoxRec reconstruction SDK
//!
//! The VoxRec SDK does volumetric 3D reconstruction from RGB-D sensors
//! behind an opaque C-style handle API. This crate owns those handles and
//! runs the staged startup sequence an application needs before any
//! reconstruction can happen:
//! - context reset: destroy the previous context, create a fresh one,
//!   attach the log callback
//! - LICENSE: authenticate against the configured license file
//! - OPENCL: select a device and compile the context (the reconstruction
//!   volume is allocated on first success)
//! - SENSOR: create and open the configured capture device, probe frame
//!   sizes
//!
//! The sequence runs on a background worker; progress, SDK log lines and
//! the aggregate outcome arrive as [`InitEvent`]s on subscribed
//! [`EventStream`]s. The [`sim`] module provides a full in-memory SDK, so
//! everything here runs without the vendor library or hardware.
//!
//! ## Quick Start
//! ```
//! use std::sync::Arc;
//! use std::time::Duration;
//! use voxrec::config::{MemoryConfig, KEY_SENSOR_DEVICE};
//! use voxrec::sim::SimSdk;
//! use voxrec::ResourceManager;
//!
//! let sdk = Arc::new(SimSdk::ready("license.sig", "sim-rgbd"));
//! let config = Arc::new(MemoryConfig::new().with(KEY_SENSOR_DEVICE, "sim-rgbd"));
//!
//! let manager = ResourceManager::new(sdk, config);
//! let events = manager.subscribe();
//! manager.initialize();
//!
//! assert!(events.wait_finished(Duration::from_secs(5)).unwrap());
//! assert!(manager.has_volume());
//! println!("depth: {:?}", manager.depth_size());
//! ```

pub mod error;
pub mod types;
pub mod sdk;
pub mod config;
pub mod events;
pub mod handles;
pub mod manager;
pub mod sim;

pub use error::VoxrecError;
pub use events::EventStream;
pub use handles::{Calibrator, Image};
pub use manager::ResourceManager;
pub use types::*;

/// Result type alias for voxrec operations.
pub type Result<T> = std::result::Result<T, VoxrecError>;
