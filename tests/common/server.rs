//! Minimal HTTP/1.1 server for integration tests.
//!
//! Serves fixed routes, answers everything else with 404 and counts the
//! well-formed requests it receives. Non-HTTP traffic (e.g. a TLS hello from
//! an `https://` attempt) is dropped without being counted.

use std::collections::HashMap;
use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

#[derive(Debug, Clone)]
pub enum Route {
    /// 200 with the full body.
    Body(Vec<u8>),
    /// Announces `declared` bytes, sends `sent`, then stalls.
    Stall { declared: u64, sent: Vec<u8> },
}

pub struct TestServer {
    port: u16,
    hits: Arc<AtomicUsize>,
}

impl TestServer {
    /// Starts a server in a background thread. It runs until the process exits.
    pub fn start(routes: Vec<(&'static str, Route)>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
        let port = listener.local_addr().unwrap().port();
        let routes: Arc<HashMap<&'static str, Route>> = Arc::new(routes.into_iter().collect());
        let hits = Arc::new(AtomicUsize::new(0));

        let counter = Arc::clone(&hits);
        thread::spawn(move || {
            for stream in listener.incoming().flatten() {
                let routes = Arc::clone(&routes);
                let counter = Arc::clone(&counter);
                thread::spawn(move || handle(stream, &routes, &counter));
            }
        });
        Self { port, hits }
    }

    /// Full `http://` URL for `path`.
    pub fn url(&self, path: &str) -> String {
        format!("http://127.0.0.1:{}{}", self.port, path)
    }

    /// `path` without a scheme, as a user would type it.
    pub fn bare(&self, path: &str) -> String {
        format!("127.0.0.1:{}{}", self.port, path)
    }

    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }
}

fn handle(mut stream: TcpStream, routes: &HashMap<&'static str, Route>, hits: &AtomicUsize) {
    let _ = stream.set_read_timeout(Some(Duration::from_secs(2)));
    let Some(path) = read_request_path(&mut stream) else {
        return;
    };
    hits.fetch_add(1, Ordering::SeqCst);

    match routes.get(path.as_str()) {
        Some(Route::Body(body)) => {
            let head = format!(
                "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                body.len()
            );
            let _ = stream.write_all(head.as_bytes());
            let _ = stream.write_all(body);
        }
        Some(Route::Stall { declared, sent }) => {
            let head = format!(
                "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                declared
            );
            let _ = stream.write_all(head.as_bytes());
            let _ = stream.write_all(sent);
            let _ = stream.flush();
            thread::sleep(Duration::from_secs(30));
        }
        None => {
            let body = b"not found";
            let head = format!(
                "HTTP/1.1 404 Not Found\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                body.len()
            );
            let _ = stream.write_all(head.as_bytes());
            let _ = stream.write_all(body);
        }
    }
    let _ = stream.flush();
}

fn read_request_path(stream: &mut TcpStream) -> Option<String> {
    let mut request = Vec::new();
    let mut buf = [0u8; 4096];
    loop {
        let n = stream.read(&mut buf).ok()?;
        if n == 0 {
            return None;
        }
        request.extend_from_slice(&buf[..n]);
        if !request[0].is_ascii_uppercase() {
            return None;
        }
        if request.windows(4).any(|w| w == b"\r\n\r\n") {
            break;
        }
    }
    let request = std::str::from_utf8(&request).ok()?;
    let mut request_line = request.lines().next()?.split_whitespace();
    match (request_line.next()?, request_line.next()?) {
        ("GET", path) => Some(path.to_owned()),
        _ => None,
    }
}
