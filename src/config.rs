//! Configuration lookups backing the initialization sequence.
//!
//! The manager reads settings through the [`ConfigStore`] trait and
//! re-reads them on every cycle, so values changed between `initialize()`
//! calls take effect on the next cycle. [`MemoryConfig`] backs tests,
//! demos and embedding applications; [`EnvConfig`] maps keys onto
//! `VOXREC_*` environment variables.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;

// -- keys --

/// Identifier of the capture device passed to sensor creation. No
/// default; sensor creation fails while unset.
pub const KEY_SENSOR_DEVICE: &str = "sensor.device";

/// Path of the license file to authenticate against.
pub const KEY_LICENSE_FILE: &str = "license.file";

/// Path of a compile-options file loaded before compilation.
pub const KEY_CONFIG_FILE: &str = "compile.options_file";

/// Numeric id of the OpenCL device to compile for.
pub const KEY_OPENCL_DEVICE: &str = "opencl.device";

// -- defaults --

pub const DEFAULT_LICENSE_FILE: &str = "license.sig";

/// The empty path: no compile-options file is loaded.
pub const DEFAULT_CONFIG_FILE: &str = "";

/// `-1` lets the SDK pick an OpenCL device.
pub const DEFAULT_OPENCL_DEVICE: i32 = -1;

/// Read-only key/value lookups for initialization settings.
///
/// Implementations supply [`ConfigStore::value`]; the typed accessors
/// apply the documented defaults on top.
pub trait ConfigStore: Send + Sync {
    /// The raw value stored for `key`, or `None` when unset.
    fn value(&self, key: &str) -> Option<String>;

    /// Capture device identifier (empty string while unset).
    fn sensor_device(&self) -> String {
        self.value(KEY_SENSOR_DEVICE).unwrap_or_default()
    }

    /// License file path, falling back to [`DEFAULT_LICENSE_FILE`].
    fn license_file(&self) -> PathBuf {
        PathBuf::from(
            self.value(KEY_LICENSE_FILE)
                .unwrap_or_else(|| DEFAULT_LICENSE_FILE.to_string()),
        )
    }

    /// Compile-options file to load, or `None` when the value equals the
    /// default empty path.
    fn config_file(&self) -> Option<PathBuf> {
        self.value(KEY_CONFIG_FILE)
            .filter(|v| v != DEFAULT_CONFIG_FILE)
            .map(PathBuf::from)
    }

    /// OpenCL device id, falling back to [`DEFAULT_OPENCL_DEVICE`] when
    /// unset or unparseable.
    fn opencl_device(&self) -> i32 {
        self.value(KEY_OPENCL_DEVICE)
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(DEFAULT_OPENCL_DEVICE)
    }
}

/// In-memory store. Values can be changed at any time; the next cycle
/// picks them up.
#[derive(Debug, Default)]
pub struct MemoryConfig {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a value, replacing any previous one.
    pub fn set(&self, key: &str, value: &str) {
        if let Ok(mut values) = self.values.lock() {
            values.insert(key.to_string(), value.to_string());
        }
    }

    /// Remove a value so lookups fall back to the default.
    pub fn unset(&self, key: &str) {
        if let Ok(mut values) = self.values.lock() {
            values.remove(key);
        }
    }

    /// Builder-style [`MemoryConfig::set`] for construction chains.
    pub fn with(self, key: &str, value: &str) -> Self {
        self.set(key, value);
        self
    }
}

impl ConfigStore for MemoryConfig {
    fn value(&self, key: &str) -> Option<String> {
        self.values.lock().ok()?.get(key).cloned()
    }
}

/// Store backed by environment variables.
///
/// A key maps to `VOXREC_` plus the key upper-cased with separators
/// turned into underscores, e.g. `license.file` reads
/// `VOXREC_LICENSE_FILE`. Blank variables count as unset.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvConfig;

impl EnvConfig {
    pub fn new() -> Self {
        Self
    }

    fn var_name(key: &str) -> String {
        let mut name = String::from("VOXREC_");
        for ch in key.chars() {
            name.push(match ch {
                '.' | '-' | ' ' => '_',
                c => c.to_ascii_uppercase(),
            });
        }
        name
    }
}

impl ConfigStore for EnvConfig {
    fn value(&self, key: &str) -> Option<String> {
        std::env::var(Self::var_name(key))
            .ok()
            .filter(|v| !v.trim().is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_store_set_get_unset() {
        let config = MemoryConfig::new();
        assert_eq!(config.value(KEY_SENSOR_DEVICE), None);

        config.set(KEY_SENSOR_DEVICE, "rgbd-0");
        assert_eq!(config.value(KEY_SENSOR_DEVICE).as_deref(), Some("rgbd-0"));
        assert_eq!(config.sensor_device(), "rgbd-0");

        config.unset(KEY_SENSOR_DEVICE);
        assert_eq!(config.value(KEY_SENSOR_DEVICE), None);
        assert_eq!(config.sensor_device(), "");
    }

    #[test]
    fn defaults_apply_while_keys_are_unset() {
        let config = MemoryConfig::new();
        assert_eq!(config.license_file(), PathBuf::from(DEFAULT_LICENSE_FILE));
        assert_eq!(config.config_file(), None);
        assert_eq!(config.opencl_device(), DEFAULT_OPENCL_DEVICE);
    }

    #[test]
    fn explicit_default_options_path_still_means_none() {
        let config = MemoryConfig::new().with(KEY_CONFIG_FILE, DEFAULT_CONFIG_FILE);
        assert_eq!(config.config_file(), None);

        config.set(KEY_CONFIG_FILE, "/etc/voxrec/options.cfg");
        assert_eq!(
            config.config_file(),
            Some(PathBuf::from("/etc/voxrec/options.cfg"))
        );
    }

    #[test]
    fn unparseable_device_id_falls_back_to_default() {
        let config = MemoryConfig::new().with(KEY_OPENCL_DEVICE, "fast");
        assert_eq!(config.opencl_device(), DEFAULT_OPENCL_DEVICE);

        config.set(KEY_OPENCL_DEVICE, " 2 ");
        assert_eq!(config.opencl_device(), 2);
    }

    #[test]
    fn env_store_maps_keys_to_prefixed_variables() {
        assert_eq!(EnvConfig::var_name(KEY_LICENSE_FILE), "VOXREC_LICENSE_FILE");
        assert_eq!(
            EnvConfig::var_name(KEY_CONFIG_FILE),
            "VOXREC_COMPILE_OPTIONS_FILE"
        );

        // Key invented for this test so parallel tests cannot collide.
        std::env::set_var("VOXREC_ROUND_TRIP_PROBE", "hello");
        let config = EnvConfig::new();
        assert_eq!(config.value("round.trip_probe").as_deref(), Some("hello"));

        std::env::set_var("VOXREC_ROUND_TRIP_PROBE", "  ");
        assert_eq!(config.value("round.trip_probe"), None);
    }
}
