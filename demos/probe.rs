//! Inspect a sensor's capture descriptors through the options path.
//!
//! After a successful cycle the sensor's capture options are bound to a
//! fresh options set and the `frame_info.*` keys are read back. This is
//! the same data the manager gets from its direct image-size probes,
//! through the SDK's other access path.
//!
//! Usage: cargo run --example probe

use std::sync::Arc;
use std::time::Duration;

use voxrec::config::{MemoryConfig, KEY_SENSOR_DEVICE};
use voxrec::sdk::{stream_height_key, stream_supported_key, stream_width_key, SdkApi};
use voxrec::sim::{LicenseVerdict, SensorProfile, SimSdk};
use voxrec::{ResourceManager, StreamKind};

fn main() {
    env_logger::init();

    let sdk = Arc::new(
        SimSdk::builder()
            .license("license.sig", LicenseVerdict::Valid)
            .sensor(
                "structured-light-0",
                SensorProfile::new()
                    .with_stream(StreamKind::Aux, 1280, 1024)
                    .with_stream(StreamKind::Depth, 640, 480),
            )
            .build(),
    );
    let config = Arc::new(MemoryConfig::new().with(KEY_SENSOR_DEVICE, "structured-light-0"));

    let manager = ResourceManager::new(sdk.clone(), config);
    let events = manager.subscribe();
    manager.initialize();

    match events.wait_finished(Duration::from_secs(5)) {
        Ok(true) => {}
        Ok(false) => {
            eprintln!("Initialization failed");
            std::process::exit(1);
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }

    let ctx = manager.context().expect("context after successful cycle");
    let sensor = manager.sensor().expect("sensor after successful cycle");

    let options = sdk.options_create(ctx).expect("options set");
    sdk.sensor_bind_capture_options(ctx, sensor, options)
        .expect("bind capture options");

    println!("capture descriptors of {:?}:", sensor);
    for kind in StreamKind::ALL {
        let supported = sdk
            .options_get_bool(ctx, options, stream_supported_key(kind))
            .unwrap_or(false);
        if supported {
            let width = sdk
                .options_get_int(ctx, options, stream_width_key(kind))
                .unwrap_or(0);
            let height = sdk
                .options_get_int(ctx, options, stream_height_key(kind))
                .unwrap_or(0);
            println!("  {:<8} {}x{}", kind.to_string(), width, height);
        } else {
            println!("  {:<8} not supported", kind.to_string());
        }
    }
}
