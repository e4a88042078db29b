//! Minimal status web page.
//!
//! Every request, whatever its path, gets the current snapshot rendered as
//! HTML. Connections are served one at a time on a single thread.

use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::thread;
use std::time::Duration;

use eyre::WrapErr;
use sweep_core::status::{StatusHandle, render_html};
use tracing::{debug, info, warn};

const REQUEST_BYTES: usize = 1024;
const CLIENT_TIMEOUT: Duration = Duration::from_secs(5);
const RESPONSE_HEAD: &str = "HTTP/1.1 200 OK\r\nContent-type: text/html\r\n\r\n";

fn handle(mut stream: TcpStream, status: &StatusHandle) -> std::io::Result<()> {
    stream.set_read_timeout(Some(CLIENT_TIMEOUT))?;
    stream.set_write_timeout(Some(CLIENT_TIMEOUT))?;
    let mut buf = [0u8; REQUEST_BYTES];
    let n = stream.read(&mut buf)?;
    if let Some(line) = String::from_utf8_lossy(&buf[..n]).lines().next() {
        debug!(request = line, "status request");
    }
    let page = render_html(&status.load());
    stream.write_all(RESPONSE_HEAD.as_bytes())?;
    stream.write_all(page.as_bytes())?;
    stream.flush()
}

/// Serve status pages from `listener` on a background thread.
pub fn serve(listener: TcpListener, status: StatusHandle) -> eyre::Result<thread::JoinHandle<()>> {
    let addr = listener.local_addr().wrap_err("status server: no local address")?;
    info!(%addr, "status server listening");
    thread::Builder::new()
        .name("status-http".into())
        .spawn(move || {
            for conn in listener.incoming() {
                let result = conn.and_then(|stream| handle(stream, &status));
                if let Err(e) = result {
                    warn!(error = %e, "status request failed");
                }
            }
        })
        .wrap_err("status server: spawn thread")
}

/// Bind `bind:port` and start serving.
pub fn start(bind: &str, port: u16, status: StatusHandle) -> eyre::Result<thread::JoinHandle<()>> {
    let listener = TcpListener::bind((bind, port))
        .wrap_err_with(|| format!("status server: bind {bind}:{port}"))?;
    serve(listener, status)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sweep_core::{ControllerState, StatusView};

    fn get(port: u16) -> String {
        let mut s = TcpStream::connect(("127.0.0.1", port)).unwrap();
        s.write_all(b"GET / HTTP/1.1\r\nHost: x\r\n\r\n").unwrap();
        s.shutdown(std::net::Shutdown::Write).unwrap();
        let mut out = String::new();
        s.set_read_timeout(Some(Duration::from_secs(5))).unwrap();
        let mut buf = [0u8; 4096];
        loop {
            match s.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => out.push_str(&String::from_utf8_lossy(&buf[..n])),
                Err(e) => panic!("read: {e}"),
            }
        }
        out
    }

    #[test]
    fn serves_the_latest_snapshot() {
        let status = StatusHandle::new();
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let _h = serve(listener, status.clone()).unwrap();

        let page = get(port);
        assert!(page.starts_with("HTTP/1.1 200 OK\r\nContent-type: text/html\r\n\r\n"));
        assert!(page.contains("Connecting"), "{page}");

        status.publish(StatusView {
            state: ControllerState::Removing,
            last_error: "HTTP Error: 500 <oops>".into(),
            collected_prints: 4,
            baseline_weight: 600,
        });
        let page = get(port);
        assert!(page.contains("Removing"), "{page}");
        assert!(page.contains("&lt;oops&gt;"), "{page}");
        assert!(page.contains("Collected Prints: 4"), "{page}");
    }
}
