//! Run one initialization cycle against the simulated SDK and print
//! every notification.
//!
//! Usage: cargo run --example init

use std::sync::Arc;
use std::time::Duration;

use voxrec::config::{MemoryConfig, KEY_OPENCL_DEVICE, KEY_SENSOR_DEVICE};
use voxrec::sim::{LicenseVerdict, SensorProfile, SimSdk};
use voxrec::{InitEvent, ResourceManager, StreamKind};

fn main() {
    env_logger::init();

    let sdk = Arc::new(
        SimSdk::builder()
            .license("license.sig", LicenseVerdict::Valid)
            .sensor(
                "rgbd-0",
                SensorProfile::new()
                    .with_stream(StreamKind::Aux, 640, 480)
                    .with_stream(StreamKind::Depth, 320, 240)
                    .with_stream(StreamKind::Preview, 640, 480),
            )
            .opencl_devices(2)
            .build(),
    );
    let config = Arc::new(
        MemoryConfig::new()
            .with(KEY_SENSOR_DEVICE, "rgbd-0")
            .with(KEY_OPENCL_DEVICE, "1"),
    );

    let manager = ResourceManager::new(sdk, config);
    let events = manager.subscribe();

    if !manager.initialize() {
        eprintln!("An initialization cycle is already running");
        std::process::exit(1);
    }

    loop {
        match events.recv_timeout(Duration::from_secs(5)) {
            Ok(InitEvent::Log { severity, message }) => {
                println!("    [{}] {}", severity, message)
            }
            Ok(InitEvent::SequenceStarted) => println!("sequence started"),
            Ok(InitEvent::StageStarted(stage)) => println!("{} ...", stage),
            Ok(InitEvent::StageFinished(stage, ok)) => {
                println!("{} {}", stage, if ok { "ok" } else { "FAILED" })
            }
            Ok(InitEvent::FrameSize(kind, Some(size))) => {
                println!("    {} stream: {}", kind, size)
            }
            Ok(InitEvent::FrameSize(kind, None)) => {
                println!("    {} stream: not supported", kind)
            }
            Ok(InitEvent::Finished(ok)) => {
                println!("initialization {}", if ok { "succeeded" } else { "FAILED" });
                break;
            }
            Err(e) => {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        }
    }

    println!();
    println!("context:  {:?}", manager.context());
    println!("sensor:   {:?}", manager.sensor());
    println!("volume:   {:?}", manager.volume());
    println!("rgb:      {:?}", manager.rgb_size());
    println!("depth:    {:?}", manager.depth_size());
    println!("preview:  {:?}", manager.preview_size());
}
