//! Minimal HTTP/1.1 server answering fixed paths with canned JSON.
//!
//! Unknown paths get 404. The `X-Plex-Token` header of each request is recorded.

use std::collections::HashMap;
use std::io::{Read, Write};
use std::net::TcpListener;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct JsonServer {
    base: String,
    tokens: Arc<Mutex<Vec<Option<String>>>>,
}

impl JsonServer {
    /// e.g. "http://127.0.0.1:12345"
    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn tokens(&self) -> Vec<Option<String>> {
        self.tokens.lock().unwrap().clone()
    }
}

/// Serves `routes` (path without query -> JSON body) until the process exits.
pub fn start(routes: &[(&str, &str)]) -> JsonServer {
    let routes: Arc<HashMap<String, String>> = Arc::new(
        routes
            .iter()
            .map(|(p, b)| (p.to_string(), b.to_string()))
            .collect(),
    );
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    let tokens = Arc::new(Mutex::new(Vec::new()));
    let log = Arc::clone(&tokens);
    thread::spawn(move || {
        for stream in listener.incoming().flatten() {
            let routes = Arc::clone(&routes);
            let log = Arc::clone(&log);
            thread::spawn(move || handle(stream, &routes, &log));
        }
    });
    JsonServer {
        base: format!("http://127.0.0.1:{}", port),
        tokens,
    }
}

fn handle(
    mut stream: std::net::TcpStream,
    routes: &HashMap<String, String>,
    log: &Mutex<Vec<Option<String>>>,
) {
    let _ = stream.set_read_timeout(Some(Duration::from_secs(2)));
    let mut buf = [0u8; 8192];
    let n = match stream.read(&mut buf) {
        Ok(0) | Err(_) => return,
        Ok(n) => n,
    };
    let Ok(request) = std::str::from_utf8(&buf[..n]) else {
        return;
    };
    let mut lines = request.lines();
    let path = lines
        .next()
        .and_then(|l| l.split_whitespace().nth(1))
        .unwrap_or("/")
        .split('?')
        .next()
        .unwrap_or("/")
        .to_string();
    let token = lines
        .take_while(|l| !l.trim().is_empty())
        .filter_map(|l| l.split_once(':'))
        .find(|(name, _)| name.trim().eq_ignore_ascii_case("x-plex-token"))
        .map(|(_, v)| v.trim().to_string());
    log.lock().unwrap().push(token);

    let (status, body) = match routes.get(&path) {
        Some(body) => ("200 OK", body.as_str()),
        None => ("404 Not Found", "{}"),
    };
    let response = format!(
        "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\n\r\n{}",
        status,
        body.len(),
        body
    );
    let _ = stream.write_all(response.as_bytes());
}
