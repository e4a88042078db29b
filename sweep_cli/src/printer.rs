//! Printer status over the printer's REST API.
//!
//! One HTTP/1.0 `GET` per poll; the connection is closed by the server after
//! the response, so the whole reply is read to EOF.

use std::io::{Read, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

use serde::Deserialize;
use sweep_traits::{PrinterSnapshot, PrinterStatus};
use thiserror::Error;
use tracing::{debug, trace};

/// Cap on the response size; a printer status document is a few KiB.
const MAX_RESPONSE_BYTES: u64 = 256 * 1024;

#[derive(Debug, Error)]
pub enum PrinterError {
    #[error("HTTP Error: {code}\nResponse content: {body}")]
    Status { code: u16, body: String },
    #[error("JSON decoding failed: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("malformed HTTP response: {0}")]
    Malformed(&'static str),
    #[error("request failed: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Deserialize)]
struct PrinterDoc {
    state: StateDoc,
    temperature: TemperatureDoc,
}

#[derive(Debug, Deserialize)]
struct StateDoc {
    flags: FlagsDoc,
}

#[derive(Debug, Deserialize)]
struct FlagsDoc {
    printing: bool,
}

#[derive(Debug, Deserialize)]
struct TemperatureDoc {
    tool0: ToolDoc,
}

#[derive(Debug, Deserialize)]
struct ToolDoc {
    /// `null` while the heater is off.
    target: Option<f64>,
}

impl From<PrinterDoc> for PrinterSnapshot {
    fn from(doc: PrinterDoc) -> Self {
        Self {
            is_printing: doc.state.flags.printing,
            nozzle_target: doc.temperature.tool0.target.unwrap_or(0.0),
        }
    }
}

/// Decode the status document into the fields the controller needs.
pub fn parse_snapshot(body: &[u8]) -> Result<PrinterSnapshot, PrinterError> {
    let doc: PrinterDoc = serde_json::from_slice(body)?;
    Ok(doc.into())
}

/// Split a raw HTTP response into status code and body.
fn split_response(raw: &[u8]) -> Result<(u16, &[u8]), PrinterError> {
    let head_end = raw
        .windows(4)
        .position(|w| w == b"\r\n\r\n")
        .ok_or(PrinterError::Malformed("no header terminator"))?;
    let head = std::str::from_utf8(&raw[..head_end])
        .map_err(|_| PrinterError::Malformed("non-utf8 headers"))?;
    let status_line = head
        .lines()
        .next()
        .ok_or(PrinterError::Malformed("empty status line"))?;
    let mut parts = status_line.split_whitespace();
    match parts.next() {
        Some(v) if v.starts_with("HTTP/") => {}
        _ => return Err(PrinterError::Malformed("not an HTTP response")),
    }
    let code = parts
        .next()
        .and_then(|c| c.parse::<u16>().ok())
        .ok_or(PrinterError::Malformed("bad status code"))?;
    Ok((code, &raw[head_end + 4..]))
}

pub struct HttpPrinter {
    host: String,
    port: u16,
    path: String,
    api_key: String,
    timeout: Duration,
}

impl HttpPrinter {
    pub fn new(host: impl Into<String>, port: u16, api_key: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port,
            path: "/api/printer".to_string(),
            api_key: api_key.into(),
            timeout: Duration::from_secs(5),
        }
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn from_config(cfg: &sweep_config::Printer) -> Self {
        Self::new(cfg.host.clone(), cfg.port, cfg.api_key.clone())
            .with_path(cfg.path.clone())
            .with_timeout(Duration::from_millis(cfg.timeout_ms))
    }

    fn connect(&self) -> Result<TcpStream, PrinterError> {
        let mut last = None;
        for addr in (self.host.as_str(), self.port).to_socket_addrs()? {
            match TcpStream::connect_timeout(&addr, self.timeout) {
                Ok(s) => return Ok(s),
                Err(e) => last = Some(e),
            }
        }
        Err(last
            .unwrap_or_else(|| std::io::Error::new(std::io::ErrorKind::NotFound, "no address for printer host"))
            .into())
    }

    /// Perform one status request.
    pub fn get(&self) -> Result<PrinterSnapshot, PrinterError> {
        let mut stream = self.connect()?;
        stream.set_read_timeout(Some(self.timeout))?;
        stream.set_write_timeout(Some(self.timeout))?;

        let request = format!(
            "GET {} HTTP/1.0\r\nHost: {}\r\nX-Api-Key: {}\r\nAccept: application/json\r\nConnection: close\r\n\r\n",
            self.path, self.host, self.api_key
        );
        stream.write_all(request.as_bytes())?;

        let mut raw = Vec::new();
        stream.take(MAX_RESPONSE_BYTES).read_to_end(&mut raw)?;
        let (code, body) = split_response(&raw)?;
        trace!(code, bytes = body.len(), "printer response");
        if !(200..300).contains(&code) {
            return Err(PrinterError::Status {
                code,
                body: String::from_utf8_lossy(body).into_owned(),
            });
        }
        let snapshot = parse_snapshot(body)?;
        debug!(
            printing = snapshot.is_printing,
            target = snapshot.nozzle_target,
            "printer status"
        );
        Ok(snapshot)
    }
}

impl PrinterStatus for HttpPrinter {
    fn fetch(&mut self) -> Result<PrinterSnapshot, Box<dyn std::error::Error + Send + Sync>> {
        Ok(self.get()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::net::TcpListener;
    use std::thread;

    const PRINTING: &str = r#"{"state":{"text":"Printing","flags":{"printing":true,"operational":true}},"temperature":{"tool0":{"actual":214.8,"target":215.0},"bed":{"actual":60.1,"target":60.0}}}"#;

    /// Serve one canned response and hand back the request it received.
    fn serve_once(response: String) -> (u16, thread::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let handle = thread::spawn(move || {
            let (mut sock, _) = listener.accept().unwrap();
            let mut buf = [0u8; 1024];
            let n = sock.read(&mut buf).unwrap();
            sock.write_all(response.as_bytes()).unwrap();
            String::from_utf8_lossy(&buf[..n]).into_owned()
        });
        (port, handle)
    }

    #[rstest]
    #[case(PRINTING, true, 215.0)]
    #[case(r#"{"state":{"flags":{"printing":false}},"temperature":{"tool0":{"target":28.0}}}"#, false, 28.0)]
    #[case(r#"{"state":{"flags":{"printing":false}},"temperature":{"tool0":{"target":null}}}"#, false, 0.0)]
    fn snapshot_fields_are_extracted(#[case] body: &str, #[case] printing: bool, #[case] target: f64) {
        let s = parse_snapshot(body.as_bytes()).unwrap();
        assert_eq!(s.is_printing, printing);
        assert!((s.nozzle_target - target).abs() < f64::EPSILON);
    }

    #[rstest]
    #[case(r#"{"temperature":{"tool0":{"target":28.0}}}"#)]
    #[case(r#"{"state":{"flags":{}},"temperature":{"tool0":{"target":28.0}}}"#)]
    #[case(r#"{"state":{"flags":{"printing":true}}}"#)]
    #[case(r#"{"state":{"flags":{"printing":true}},"temperature":{"bed":{"target":60.0}}}"#)]
    fn missing_required_field_is_a_decode_error(#[case] body: &str) {
        assert!(matches!(
            parse_snapshot(body.as_bytes()),
            Err(PrinterError::Decode(_))
        ));
    }

    #[rstest]
    fn get_sends_api_key_and_decodes_body() {
        let (port, handle) = serve_once(format!(
            "HTTP/1.0 200 OK\r\nContent-Type: application/json\r\n\r\n{PRINTING}"
        ));
        let printer = HttpPrinter::new("127.0.0.1", port, "secret").with_timeout(Duration::from_secs(2));
        let s = printer.get().unwrap();
        assert!(s.is_printing);

        let request = handle.join().unwrap();
        assert!(request.starts_with("GET /api/printer HTTP/1.0\r\n"), "{request}");
        assert!(request.contains("X-Api-Key: secret\r\n"), "{request}");
    }

    #[rstest]
    fn non_2xx_keeps_code_and_body() {
        let (port, handle) = serve_once("HTTP/1.0 403 FORBIDDEN\r\n\r\nInvalid API key".to_string());
        let mut printer = HttpPrinter::new("127.0.0.1", port, "bad").with_timeout(Duration::from_secs(2));
        let err = printer.fetch().unwrap_err();
        let pe = err.downcast_ref::<PrinterError>().unwrap();
        assert!(matches!(pe, PrinterError::Status { code: 403, body } if body == "Invalid API key"));
        assert!(err.to_string().starts_with("HTTP Error: 403"));
        handle.join().unwrap();
    }

    #[rstest]
    fn any_2xx_status_is_accepted() {
        let (port, handle) = serve_once(format!(
            "HTTP/1.0 203 Non-Authoritative Information\r\n\r\n{PRINTING}"
        ));
        let printer = HttpPrinter::new("127.0.0.1", port, "k").with_timeout(Duration::from_secs(2));
        assert!(printer.get().unwrap().is_printing);
        handle.join().unwrap();
    }

    #[rstest]
    fn garbage_body_is_a_decode_error() {
        let (port, handle) = serve_once("HTTP/1.0 200 OK\r\n\r\n<html>".to_string());
        let printer = HttpPrinter::new("127.0.0.1", port, "k").with_timeout(Duration::from_secs(2));
        assert!(matches!(printer.get(), Err(PrinterError::Decode(_))));
        handle.join().unwrap();
    }

    #[rstest]
    fn refused_connection_is_io() {
        let port = {
            let l = TcpListener::bind("127.0.0.1:0").unwrap();
            l.local_addr().unwrap().port()
        };
        let printer = HttpPrinter::new("127.0.0.1", port, "k").with_timeout(Duration::from_millis(200));
        assert!(matches!(printer.get(), Err(PrinterError::Io(_))));
    }

    #[rstest]
    fn response_without_headers_is_malformed() {
        assert!(matches!(split_response(b"hello"), Err(PrinterError::Malformed(_))));
    }
}
