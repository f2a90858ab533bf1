//! Minimal HTTP/1.1 server that serves a fake Maven repository for
//! integration tests.
//!
//! Files are served from an in-memory map. Any path ending in `/` that is a
//! prefix of a served file gets a generated HTML index with a `../` link and
//! one anchor per child (directories with a trailing slash). Every request is
//! counted per path.

#![allow(dead_code)]

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

type Hook = Arc<dyn Fn(&str) + Send + Sync>;

#[derive(Default)]
pub struct RepoBuilder {
    files: BTreeMap<String, Vec<u8>>,
    hook: Option<Hook>,
}

impl RepoBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn file(mut self, path: &str, body: impl Into<Vec<u8>>) -> Self {
        self.files.insert(path.trim_start_matches('/').to_string(), body.into());
        self
    }

    /// A `.pom` whose dependencies name `deps` as group ids.
    pub fn pom(self, path: &str, own_group: &str, deps: &[&str]) -> Self {
        let mut xml = String::from(
            "<?xml version=\"1.0\"?>\n<project xmlns=\"http://maven.apache.org/POM/4.0.0\">\n",
        );
        xml.push_str(&format!("  <groupId>{own_group}</groupId>\n  <dependencies>\n"));
        for d in deps {
            xml.push_str(&format!(
                "    <dependency><groupId>{d}</groupId><artifactId>x</artifactId></dependency>\n"
            ));
        }
        xml.push_str("  </dependencies>\n</project>\n");
        self.file(path, xml)
    }

    /// Called with the request path (no leading slash) before responding.
    pub fn on_request(mut self, hook: impl Fn(&str) + Send + Sync + 'static) -> Self {
        self.hook = Some(Arc::new(hook));
        self
    }

    pub fn start(self) -> RepoServer {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
        let port = listener.local_addr().unwrap().port();
        let inner = Arc::new(Inner {
            files: self.files,
            hook: self.hook,
            hits: Mutex::new(HashMap::new()),
            fail_files: AtomicBool::new(false),
        });
        let accept = Arc::clone(&inner);
        thread::spawn(move || {
            for stream in listener.incoming().flatten() {
                let inner = Arc::clone(&accept);
                thread::spawn(move || handle(stream, &inner));
            }
        });
        RepoServer {
            base: format!("http://127.0.0.1:{port}/"),
            inner,
        }
    }
}

struct Inner {
    files: BTreeMap<String, Vec<u8>>,
    hook: Option<Hook>,
    hits: Mutex<HashMap<String, usize>>,
    fail_files: AtomicBool,
}

/// Handle to a running server. The server lives until the process exits.
pub struct RepoServer {
    pub base: String,
    inner: Arc<Inner>,
}

impl RepoServer {
    /// Requests seen for `path` (no leading slash; listings end in `/`).
    pub fn hits(&self, path: &str) -> usize {
        self.inner.hits.lock().unwrap().get(path).copied().unwrap_or(0)
    }

    pub fn total_hits(&self) -> usize {
        self.inner.hits.lock().unwrap().values().sum()
    }

    /// Requests for files (not listings).
    pub fn file_hits(&self) -> usize {
        self.inner
            .hits
            .lock()
            .unwrap()
            .iter()
            .filter(|(p, _)| !p.is_empty() && !p.ends_with('/'))
            .map(|(_, n)| n)
            .sum()
    }

    /// While set, file requests get 503; listings still work.
    pub fn set_fail_files(&self, fail: bool) {
        self.inner.fail_files.store(fail, Ordering::SeqCst);
    }

    /// Every served file path.
    pub fn paths(&self) -> Vec<String> {
        self.inner.files.keys().cloned().collect()
    }
}

/// Base URL on which nothing listens.
pub fn dead_base() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    format!("http://127.0.0.1:{port}/")
}

fn handle(mut stream: TcpStream, inner: &Inner) {
    let _ = stream.set_read_timeout(Some(Duration::from_secs(2)));
    let _ = stream.set_write_timeout(Some(Duration::from_secs(2)));
    let mut buf = [0u8; 8192];
    let n = match stream.read(&mut buf) {
        Ok(0) | Err(_) => return,
        Ok(n) => n,
    };
    let Ok(request) = std::str::from_utf8(&buf[..n]) else {
        return;
    };
    let mut first = request.lines().next().unwrap_or("").split_whitespace();
    let method = first.next().unwrap_or("");
    let path = first.next().unwrap_or("/").trim_start_matches('/').to_string();

    *inner.hits.lock().unwrap().entry(path.clone()).or_insert(0) += 1;
    if let Some(hook) = &inner.hook {
        hook(&path);
    }

    if !method.eq_ignore_ascii_case("GET") {
        respond(&mut stream, "405 Method Not Allowed", "text/plain", b"");
        return;
    }
    if path.is_empty() || path.ends_with('/') {
        match listing(&inner.files, &path) {
            Some(html) => respond(&mut stream, "200 OK", "text/html", html.as_bytes()),
            None => respond(&mut stream, "404 Not Found", "text/plain", b"not found"),
        }
        return;
    }
    if inner.fail_files.load(Ordering::SeqCst) {
        respond(&mut stream, "503 Service Unavailable", "text/plain", b"busy");
        return;
    }
    match inner.files.get(&path) {
        Some(body) => respond(&mut stream, "200 OK", "application/octet-stream", body),
        None => respond(&mut stream, "404 Not Found", "text/plain", b"not found"),
    }
}

fn listing(files: &BTreeMap<String, Vec<u8>>, dir: &str) -> Option<String> {
    let mut children = BTreeSet::new();
    for key in files.keys() {
        let Some(rest) = key.strip_prefix(dir) else {
            continue;
        };
        match rest.split_once('/') {
            Some((child, _)) => children.insert(format!("{child}/")),
            None => children.insert(rest.to_string()),
        };
    }
    if children.is_empty() {
        return None;
    }
    let mut html = format!("<html><head><title>Index of /{dir}</title></head><body><pre>\n");
    html.push_str("<a href=\"../\">../</a>\n");
    for c in children {
        html.push_str(&format!("<a href=\"{c}\" title=\"{c}\">{c}</a>    2024-01-01 00:00    -\n"));
    }
    html.push_str("</pre></body></html>\n");
    Some(html)
}

fn respond(stream: &mut TcpStream, status: &str, content_type: &str, body: &[u8]) {
    let head = format!(
        "HTTP/1.1 {status}\r\nContent-Type: {content_type}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        body.len()
    );
    let _ = stream.write_all(head.as_bytes());
    let _ = stream.write_all(body);
    let _ = stream.flush();
}
