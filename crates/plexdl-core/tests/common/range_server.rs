//! Minimal HTTP/1.1 server that supports Range GET for integration tests.
//!
//! Serves a single static body. Responds to `Range: bytes=N-` with 206 Partial
//! Content unless ranges are switched off, in which case it always sends the
//! whole body with 200. Every request's Range header is recorded.

use std::io::{Read, Write};
use std::net::TcpListener;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

#[derive(Debug, Clone, Copy)]
pub struct RangeServerOptions {
    /// If false, GET ignores Range and always returns 200 with the full body.
    pub support_ranges: bool,
    /// Answer every request with this status and a short text body instead.
    pub fail_with: Option<u16>,
    /// Send the body in pieces of this size, sleeping `chunk_delay` between them.
    pub chunk_size: usize,
    pub chunk_delay: Duration,
}

impl Default for RangeServerOptions {
    fn default() -> Self {
        Self {
            support_ranges: true,
            fail_with: None,
            chunk_size: 64 * 1024,
            chunk_delay: Duration::ZERO,
        }
    }
}

impl RangeServerOptions {
    /// Slow enough that a test can cancel after the first chunk lands.
    pub fn trickle() -> Self {
        Self {
            chunk_size: 16 * 1024,
            chunk_delay: Duration::from_millis(40),
            ..Self::default()
        }
    }
}

/// Running server. Lives until the process exits.
#[derive(Debug, Clone)]
pub struct RangeServer {
    url: String,
    requests: Arc<Mutex<Vec<Option<String>>>>,
}

impl RangeServer {
    /// URL of the served file, e.g. "http://127.0.0.1:12345/library/parts/1/file.mkv".
    pub fn url(&self) -> &str {
        &self.url
    }

    /// `Range` header of every GET so far (`None` for unranged requests).
    pub fn requests(&self) -> Vec<Option<String>> {
        self.requests.lock().unwrap().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

/// Starts a server in a background thread serving `body`.
pub fn start(body: Vec<u8>) -> RangeServer {
    start_with_options(body, RangeServerOptions::default())
}

/// Like `start` but allows customizing server behavior (ranges off, errors, slow body).
pub fn start_with_options(body: Vec<u8>, opts: RangeServerOptions) -> RangeServer {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    let body = Arc::new(body);
    let requests = Arc::new(Mutex::new(Vec::new()));
    let log = Arc::clone(&requests);
    thread::spawn(move || {
        for stream in listener.incoming().flatten() {
            let body = Arc::clone(&body);
            let log = Arc::clone(&log);
            thread::spawn(move || handle(stream, &body, opts, &log));
        }
    });
    RangeServer {
        url: format!("http://127.0.0.1:{}/library/parts/1/file.mkv", port),
        requests,
    }
}

fn handle(
    mut stream: std::net::TcpStream,
    body: &[u8],
    opts: RangeServerOptions,
    log: &Mutex<Vec<Option<String>>>,
) {
    let _ = stream.set_read_timeout(Some(Duration::from_secs(2)));
    let _ = stream.set_write_timeout(Some(Duration::from_secs(2)));
    let mut buf = [0u8; 8192];
    let n = match stream.read(&mut buf) {
        Ok(0) => return,
        Ok(n) => n,
        Err(_) => return,
    };
    let request = match std::str::from_utf8(&buf[..n]) {
        Ok(s) => s,
        Err(_) => return,
    };
    let (method, range_header, range) = parse_request(request);
    if !method.eq_ignore_ascii_case("GET") {
        let _ = stream.write_all(b"HTTP/1.1 405 Method Not Allowed\r\nContent-Length: 0\r\n\r\n");
        return;
    }
    log.lock().unwrap().push(range_header);

    if let Some(code) = opts.fail_with {
        let text = b"no such part";
        let response = format!(
            "HTTP/1.1 {} Error\r\nContent-Length: {}\r\nContent-Type: text/plain\r\n\r\n",
            code,
            text.len()
        );
        let _ = stream.write_all(response.as_bytes());
        let _ = stream.write_all(text);
        return;
    }

    let total = body.len() as u64;
    let (status, content_range, slice) = match range {
        Some(start) if opts.support_ranges => {
            if start >= total {
                (
                    "416 Range Not Satisfiable",
                    Some(format!("bytes */{}", total)),
                    &body[0..0],
                )
            } else {
                (
                    "206 Partial Content",
                    Some(format!("bytes {}-{}/{}", start, total - 1, total)),
                    &body[start as usize..],
                )
            }
        }
        _ => ("200 OK", None, body),
    };
    let mut response = format!("HTTP/1.1 {}\r\nContent-Length: {}\r\n", status, slice.len());
    if let Some(cr) = content_range {
        response.push_str(&format!("Content-Range: {}\r\n", cr));
    }
    if opts.support_ranges {
        response.push_str("Accept-Ranges: bytes\r\n");
    }
    response.push_str("\r\n");
    if stream.write_all(response.as_bytes()).is_err() {
        return;
    }
    for piece in slice.chunks(opts.chunk_size.max(1)) {
        if stream.write_all(piece).is_err() || stream.flush().is_err() {
            return;
        }
        if !opts.chunk_delay.is_zero() {
            thread::sleep(opts.chunk_delay);
        }
    }
}

/// Returns (method, raw Range header value, start offset of `bytes=N-`).
fn parse_request(request: &str) -> (&str, Option<String>, Option<u64>) {
    let mut method = "";
    let mut raw = None;
    let mut start = None;
    for line in request.lines() {
        let line = line.trim();
        if line.is_empty() {
            break;
        }
        if method.is_empty() {
            method = line.split_whitespace().next().unwrap_or("");
            continue;
        }
        if let Some((name, value)) = line.split_once(':') {
            if name.trim().eq_ignore_ascii_case("range") {
                let value = value.trim();
                raw = Some(value.to_string());
                if let Some(ranges) = value.strip_prefix("bytes=") {
                    if let Some((a, _)) = ranges.split_once('-') {
                        start = a.trim().parse::<u64>().ok();
                    }
                }
            }
        }
    }
    (method, raw, start)
}
