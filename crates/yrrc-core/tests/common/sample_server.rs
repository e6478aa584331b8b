//! Minimal HTTP/1.1 server standing in for the files endpoint in integration tests.
//!
//! Serves `GET /files/<hash>/download`. Each hash can be given a status and
//! body; unknown hashes get 404. Every request is recorded with its
//! `X-apikey` header so tests can assert what was (not) requested.

use std::collections::HashMap;
use std::io::{Read, Write};
use std::net::TcpListener;
use std::sync::{Arc, Condvar, Mutex};
use std::thread;
use std::time::Duration;

#[derive(Debug, Clone)]
pub enum Reply {
    /// Status line code and body.
    Body(u16, Vec<u8>),
    /// 302 to `/storage/<hash>`, which then serves the body with 200.
    Redirect(Vec<u8>),
    /// Hold the response until `other` has been requested too (or 2s pass),
    /// then answer 200 with the body.
    AwaitOther { other: String, body: Vec<u8> },
}

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub path: String,
    pub api_key: Option<String>,
}

#[derive(Default)]
struct State {
    requests: Vec<RecordedRequest>,
    /// Hashes whose AwaitOther reply saw the other hash arrive in time.
    overlapped: Vec<String>,
}

pub struct SampleServer {
    pub base_url: String,
    state: Arc<(Mutex<State>, Condvar)>,
}

impl SampleServer {
    /// Starts a server in a background thread. The server runs until the process exits.
    pub fn start(replies: HashMap<String, Reply>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
        let port = listener.local_addr().unwrap().port();
        let replies = Arc::new(replies);
        let state: Arc<(Mutex<State>, Condvar)> = Arc::default();
        let thread_state = Arc::clone(&state);
        thread::spawn(move || {
            for stream in listener.incoming().flatten() {
                let replies = Arc::clone(&replies);
                let state = Arc::clone(&thread_state);
                thread::spawn(move || handle(stream, &replies, &state));
            }
        });
        SampleServer {
            base_url: format!("http://127.0.0.1:{}/files", port),
            state,
        }
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.0.lock().unwrap().requests.clone()
    }

    /// Hashes requested at `/files/<hash>/download`.
    pub fn requested_hashes(&self) -> Vec<String> {
        let mut out: Vec<String> = self
            .requests()
            .iter()
            .filter_map(|r| {
                r.path
                    .strip_prefix("/files/")
                    .and_then(|p| p.strip_suffix("/download"))
                    .map(str::to_string)
            })
            .collect();
        out.sort();
        out
    }

    pub fn overlapped(&self) -> Vec<String> {
        self.state.0.lock().unwrap().overlapped.clone()
    }
}

fn handle(
    mut stream: std::net::TcpStream,
    replies: &HashMap<String, Reply>,
    state: &(Mutex<State>, Condvar),
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
    let (path, api_key) = parse_request(request);
    {
        let (lock, cvar) = state;
        lock.lock().unwrap().requests.push(RecordedRequest {
            path: path.to_string(),
            api_key,
        });
        cvar.notify_all();
    }

    if let Some(hash) = path.strip_prefix("/storage/") {
        match replies.get(hash) {
            Some(Reply::Redirect(body)) => respond(&mut stream, "200 OK", &[], body),
            _ => respond(&mut stream, "404 Not Found", &[], b""),
        }
        return;
    }

    let hash = match path
        .strip_prefix("/files/")
        .and_then(|p| p.strip_suffix("/download"))
    {
        Some(h) => h,
        None => {
            respond(&mut stream, "404 Not Found", &[], b"");
            return;
        }
    };

    match replies.get(hash) {
        Some(Reply::Body(code, body)) => {
            respond(&mut stream, &status_line(*code), &[], body);
        }
        Some(Reply::Redirect(_)) => {
            let location = format!("Location: /storage/{}", hash);
            respond(&mut stream, "302 Found", &[location.as_str()], b"");
        }
        Some(Reply::AwaitOther { other, body }) => {
            let (lock, cvar) = state;
            let guard = lock.lock().unwrap();
            let wanted = format!("/files/{}/download", other);
            let (mut guard, _) = cvar
                .wait_timeout_while(guard, Duration::from_secs(2), |s| {
                    !s.requests.iter().any(|r| r.path == wanted)
                })
                .unwrap();
            if guard.requests.iter().any(|r| r.path == wanted) {
                guard.overlapped.push(hash.to_string());
            }
            drop(guard);
            respond(&mut stream, "200 OK", &[], body);
        }
        None => respond(&mut stream, "404 Not Found", &[], b"{\"error\": \"NotFoundError\"}"),
    }
}

fn status_line(code: u16) -> String {
    let reason = match code {
        200 => "OK",
        401 => "Unauthorized",
        404 => "Not Found",
        429 => "Too Many Requests",
        500 => "Internal Server Error",
        _ => "Status",
    };
    format!("{} {}", code, reason)
}

fn respond(stream: &mut std::net::TcpStream, status: &str, headers: &[&str], body: &[u8]) {
    let mut head = format!(
        "HTTP/1.1 {}\r\nContent-Length: {}\r\nConnection: close\r\n",
        status,
        body.len()
    );
    for h in headers {
        head.push_str(h);
        head.push_str("\r\n");
    }
    head.push_str("\r\n");
    let _ = stream.write_all(head.as_bytes());
    let _ = stream.write_all(body);
}

/// Returns (path, optional X-apikey value).
fn parse_request(request: &str) -> (&str, Option<String>) {
    let mut path = "";
    let mut api_key = None;
    for (i, line) in request.lines().enumerate() {
        if i == 0 {
            path = line.split_whitespace().nth(1).unwrap_or("");
            continue;
        }
        if line.trim().is_empty() {
            break;
        }
        if let Some((name, value)) = line.split_once(':') {
            if name.trim().eq_ignore_ascii_case("x-apikey") {
                api_key = Some(value.trim().to_string());
            }
        }
    }
    (path, api_key)
}
