//! Broadcast initialization notifications as JSON over WebSocket.
//!
//! Stands in for a desktop frontend's notification wiring: a cycle runs
//! against the simulated SDK every few seconds and every event goes to
//! all connected clients, one JSON object per message.
//!
//! Usage:
//!   cargo run --example monitor
//!   websocat ws://localhost:9001

use std::net::{TcpListener, TcpStream};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tungstenite::Message;

use voxrec::config::{MemoryConfig, KEY_SENSOR_DEVICE};
use voxrec::sim::{LicenseVerdict, SensorProfile, SimSdk};
use voxrec::{InitEvent, ResourceManager};

const PORT: u16 = 9001;
const CYCLE_INTERVAL: Duration = Duration::from_secs(15);

type WsClient = Arc<Mutex<tungstenite::WebSocket<TcpStream>>>;

fn main() {
    env_logger::init();

    let sdk = Arc::new(
        SimSdk::builder()
            .license("license.sig", LicenseVerdict::Valid)
            .sensor("rgbd-0", SensorProfile::rgbd(640, 480))
            .compile_delay(Duration::from_millis(400))
            .open_delay(Duration::from_millis(250))
            .build(),
    );
    let config = Arc::new(MemoryConfig::new().with(KEY_SENSOR_DEVICE, "rgbd-0"));
    let manager = Arc::new(ResourceManager::new(sdk, config));
    let events = manager.subscribe();

    let clients: Arc<Mutex<Vec<WsClient>>> = Arc::new(Mutex::new(Vec::new()));

    // Forward every notification to all connected clients.
    let broadcast_clients = clients.clone();
    std::thread::Builder::new()
        .name("voxrec-broadcast".into())
        .spawn(move || loop {
            let event = match events.recv() {
                Ok(event) => event,
                Err(_) => break,
            };
            let msg = Message::Text(event_json(&event));
            let mut list = broadcast_clients.lock().unwrap();
            list.retain(|client| client.lock().unwrap().send(msg.clone()).is_ok());
        })
        .expect("Failed to spawn broadcast thread");

    // Re-run the initialization sequence periodically.
    let cycle_manager = manager.clone();
    std::thread::Builder::new()
        .name("voxrec-cycle".into())
        .spawn(move || loop {
            if cycle_manager.initialize() {
                eprintln!("[INIT] cycle started");
            }
            std::thread::sleep(CYCLE_INTERVAL);
        })
        .expect("Failed to spawn cycle thread");

    let listener = TcpListener::bind(format!("0.0.0.0:{}", PORT)).unwrap_or_else(|e| {
        eprintln!("Failed to bind port {}: {}", PORT, e);
        std::process::exit(1);
    });
    eprintln!("[WS] Listening on ws://localhost:{}", PORT);

    for stream in listener.incoming() {
        let stream = match stream {
            Ok(s) => s,
            Err(e) => {
                eprintln!("[WS] accept error: {}", e);
                continue;
            }
        };
        // Write timeout keeps one slow client from stalling the broadcast.
        stream.set_write_timeout(Some(Duration::from_secs(2))).ok();

        match tungstenite::accept(stream) {
            Ok(ws) => {
                let mut list = clients.lock().unwrap();
                list.push(Arc::new(Mutex::new(ws)));
                eprintln!("[WS] Client connected ({} total)", list.len());
            }
            Err(e) => eprintln!("[WS] handshake error: {}", e),
        }
    }
}

/// One hand-formatted JSON object per event.
fn event_json(event: &InitEvent) -> String {
    match event {
        InitEvent::Log { severity, message } => format!(
            "{{\"type\":\"log\",\"severity\":\"{}\",\"message\":\"{}\"}}",
            severity,
            escape(message)
        ),
        InitEvent::SequenceStarted => "{\"type\":\"sequence_started\"}".to_string(),
        InitEvent::StageStarted(stage) => {
            format!("{{\"type\":\"stage_started\",\"stage\":\"{}\"}}", stage)
        }
        InitEvent::StageFinished(stage, ok) => format!(
            "{{\"type\":\"stage_finished\",\"stage\":\"{}\",\"ok\":{}}}",
            stage, ok
        ),
        InitEvent::FrameSize(kind, Some(size)) => format!(
            "{{\"type\":\"frame_size\",\"stream\":\"{}\",\"width\":{},\"height\":{}}}",
            kind, size.width, size.height
        ),
        InitEvent::FrameSize(kind, None) => format!(
            "{{\"type\":\"frame_size\",\"stream\":\"{}\",\"supported\":false}}",
            kind
        ),
        InitEvent::Finished(ok) => format!("{{\"type\":\"finished\",\"ok\":{}}}", ok),
    }
}

fn escape(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}
