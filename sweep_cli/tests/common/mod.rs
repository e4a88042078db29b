#![allow(dead_code)]

use std::fs;
use std::io::{Read, Write};
use std::net::TcpListener;
use std::path::PathBuf;
use std::thread;

/// Config tuned so the simulated station runs in milliseconds.
pub fn write_config(dir: &tempfile::TempDir, printer_port: u16) -> PathBuf {
    let toml = format!(
        r#"
[printer]
host = "127.0.0.1"
port = {printer_port}
api_key = "test-key"
timeout_ms = 2000

[arm]
calibration_pause_ms = 0
settle_ms = 0

[intervals]
idle_ms = 5
printing_ms = 5
removing_ms = 5

[network]
retry_ms = 5

[scale]
samples = 5
sample_delay_us = 10
ready_timeout_ms = 50

[status]
bind = "127.0.0.1"
port = 0
"#
    );
    let path = dir.path().join("cfg.toml");
    fs::write(&path, toml).unwrap();
    path
}

pub fn status_body(printing: bool, target: f64) -> String {
    format!(
        r#"{{"state":{{"text":"x","flags":{{"printing":{printing}}}}},"temperature":{{"tool0":{{"actual":0.0,"target":{target}}}}}}}"#
    )
}

/// Answers each request with the next body from `bodies`, repeating the last.
pub fn fake_printer(bodies: Vec<String>) -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    thread::spawn(move || {
        let mut served = 0usize;
        for conn in listener.incoming() {
            let Ok(mut sock) = conn else { continue };
            let mut buf = [0u8; 1024];
            let _ = sock.read(&mut buf);
            let body = &bodies[served.min(bodies.len() - 1)];
            served += 1;
            let _ = write!(
                sock,
                "HTTP/1.0 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\n\r\n{body}",
                body.len()
            );
        }
    });
    port
}
