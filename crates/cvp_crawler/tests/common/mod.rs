//! Local archive server with per-page latency, for tests that need requests
//! to overlap. Paper pages under `/fast/` are answered at once, pages under
//! `/slow/` after the configured delay.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

struct ArchiveState {
    listings: HashMap<u32, String>,
    delay: Duration,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

pub struct SlowArchive {
    pub base_url: String,
    state: Arc<ArchiveState>,
}

impl SlowArchive {
    /// `listings` maps a year to the body served at `/CVPR{year}`.
    pub async fn start(listings: HashMap<u32, String>, delay: Duration) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind test archive");
        let addr = listener.local_addr().expect("test archive address");
        let state = Arc::new(ArchiveState {
            listings,
            delay,
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        });

        let accept_state = state.clone();
        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                let state = accept_state.clone();
                tokio::spawn(async move {
                    let _ = serve(stream, state).await;
                });
            }
        });

        Self {
            base_url: format!("http://{}", addr),
            state,
        }
    }

    /// Highest number of requests the server was handling at the same time.
    pub fn max_in_flight(&self) -> usize {
        self.state.max_in_flight.load(Ordering::SeqCst)
    }
}

async fn serve(mut stream: TcpStream, state: Arc<ArchiveState>) -> std::io::Result<()> {
    let mut request = Vec::new();
    let mut buf = [0u8; 1024];
    while !request.windows(4).any(|w| w == b"\r\n\r\n") {
        let n = stream.read(&mut buf).await?;
        if n == 0 {
            return Ok(());
        }
        request.extend_from_slice(&buf[..n]);
    }

    let head = String::from_utf8_lossy(&request);
    let target = head.split_whitespace().nth(1).unwrap_or("/");
    let path = target.split('?').next().unwrap_or("/").to_string();

    let current = state.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
    state.max_in_flight.fetch_max(current, Ordering::SeqCst);
    let (status, body) = route(&state, &path).await;
    // leave the count before the client can observe the response
    state.in_flight.fetch_sub(1, Ordering::SeqCst);

    let response = format!(
        "HTTP/1.1 {}\r\nContent-Type: text/html\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        body.len(),
        body
    );
    stream.write_all(response.as_bytes()).await?;
    stream.shutdown().await
}

async fn route(state: &ArchiveState, path: &str) -> (&'static str, String) {
    if let Some(year) = path.strip_prefix("/CVPR").and_then(|y| y.parse::<u32>().ok()) {
        return match state.listings.get(&year) {
            Some(body) => ("200 OK", body.clone()),
            None => ("404 Not Found", String::new()),
        };
    }

    if path.starts_with("/slow/") {
        tokio::time::sleep(state.delay).await;
    } else if !path.starts_with("/fast/") {
        return ("404 Not Found", String::new());
    }

    let page = format!(
        r#"<html><body><div id="authors">A. Author</div><div id="abstract">Abstract of {}.</div></body></html>"#,
        path
    );
    ("200 OK", page)
}
