//! Minimal HTTP/1.1 "platform API" server and client for integration tests.
//!
//! The server answers every request with a scripted status: the first
//! `failures` requests get `failure_status`, later ones get 200 with a small
//! body. It counts requests so tests can assert on the number of attempts.

use std::io::{Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use cfops_core::CloudError;

pub struct PlatformServer {
    pub addr: SocketAddr,
    requests: Arc<AtomicU32>,
}

impl PlatformServer {
    pub fn requests(&self) -> u32 {
        self.requests.load(Ordering::SeqCst)
    }
}

/// Starts a server in a background thread. It runs until the process exits.
pub fn start(failures: u32, failure_status: u16) -> PlatformServer {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let addr = listener.local_addr().unwrap();
    let requests = Arc::new(AtomicU32::new(0));
    let counter = Arc::clone(&requests);
    thread::spawn(move || {
        for stream in listener.incoming().flatten() {
            let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
            let status = if n <= failures { failure_status } else { 200 };
            thread::spawn(move || handle(stream, status));
        }
    });
    PlatformServer { addr, requests }
}

/// An address nothing listens on (bound once, then released).
pub fn refused_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    listener.local_addr().unwrap()
}

fn handle(mut stream: TcpStream, status: u16) {
    let _ = stream.set_read_timeout(Some(Duration::from_secs(2)));
    let mut buf = [0u8; 4096];
    if !matches!(stream.read(&mut buf), Ok(n) if n > 0) {
        return;
    }
    let (reason, body) = match status {
        200 => ("OK", "{\"name\":\"platform\",\"api_version\":\"2.0\"}"),
        404 => ("Not Found", "{\"error\":\"not found\"}"),
        502 => ("Bad Gateway", ""),
        503 => ("Service Unavailable", ""),
        _ => ("Error", ""),
    };
    let response = format!(
        "HTTP/1.1 {} {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        reason,
        body.len(),
        body
    );
    let _ = stream.write_all(response.as_bytes());
}

/// Connected "client session" for the test platform.
#[derive(Debug, Clone)]
pub struct PlatformClient {
    pub addr: SocketAddr,
}

impl PlatformClient {
    /// GET `path`; non-2xx responses become `CloudError::http`.
    pub fn get(&self, path: &str) -> anyhow::Result<String> {
        let mut stream = TcpStream::connect(self.addr)?;
        stream.set_read_timeout(Some(Duration::from_secs(2)))?;
        write!(stream, "GET {} HTTP/1.1\r\nHost: {}\r\n\r\n", path, self.addr)?;
        let mut response = String::new();
        stream.read_to_string(&mut response)?;

        let status = response
            .lines()
            .next()
            .and_then(|line| line.split_whitespace().nth(1))
            .and_then(|code| code.parse::<u16>().ok())
            .ok_or_else(|| anyhow::anyhow!("malformed response from {}", self.addr))?;
        let body = response
            .split_once("\r\n\r\n")
            .map(|(_, body)| body.to_string())
            .unwrap_or_default();
        if !(200..300).contains(&status) {
            return Err(CloudError::http(status, format!("GET {} returned HTTP {}", path, status)).into());
        }
        Ok(body)
    }
}
