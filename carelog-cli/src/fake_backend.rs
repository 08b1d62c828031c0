//! Minimal HTTP/1.1 backend for tests: canned JSON per route, request log.

use std::sync::{Arc, Mutex};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use crate::api::ApiClient;
use crate::config::ApiSection;

type Route = dyn Fn(&str, &str) -> (u16, String) + Send + Sync;

pub struct FakeBackend {
    base_url: String,
    requests: Arc<Mutex<Vec<String>>>,
}

impl FakeBackend {
    /// Serve `route(method, path_and_query)` on an ephemeral local port.
    pub async fn start<F>(route: F) -> Self
    where
        F: Fn(&str, &str) -> (u16, String) + Send + Sync + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());
        let requests = Arc::new(Mutex::new(Vec::new()));
        let route: Arc<Route> = Arc::new(route);

        let log = requests.clone();
        tokio::spawn(async move {
            while let Ok((sock, _)) = listener.accept().await {
                tokio::spawn(serve(sock, route.clone(), log.clone()));
            }
        });

        Self { base_url, requests }
    }

    pub fn client(&self, page_limit: u32) -> ApiClient {
        ApiClient::new(&ApiSection {
            base_url: self.base_url.clone(),
            page_limit,
        })
    }

    /// `"METHOD /path?query"` for every request received so far.
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

async fn serve(mut sock: TcpStream, route: Arc<Route>, log: Arc<Mutex<Vec<String>>>) {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    let head_end = loop {
        let n = sock.read(&mut chunk).await.unwrap();
        if n == 0 {
            return;
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let head = String::from_utf8_lossy(&buf[..head_end]).to_string();
    let content_length = head
        .lines()
        .filter_map(|l| l.split_once(':'))
        .find(|(k, _)| k.eq_ignore_ascii_case("content-length"))
        .and_then(|(_, v)| v.trim().parse::<usize>().ok())
        .unwrap_or(0);
    while buf.len() < head_end + content_length {
        let n = sock.read(&mut chunk).await.unwrap();
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
    }

    let mut parts = head.split_whitespace();
    let method = parts.next().unwrap_or_default().to_string();
    let target = parts.next().unwrap_or_default().to_string();
    log.lock().unwrap().push(format!("{method} {target}"));

    let (status, body) = route(&method, &target);
    let resp = format!(
        "HTTP/1.1 {status} Fake\r\n\
         Content-Type: application/json\r\n\
         Content-Length: {}\r\n\
         Connection: close\r\n\r\n{body}",
        body.len()
    );
    sock.write_all(resp.as_bytes()).await.unwrap();
    let _ = sock.shutdown().await;
}

/// Backend JSON for one instance row.
pub fn row(id: i64, scheduled: &str, status: &str) -> String {
    serde_json::json!({
        "id": id,
        "reminder_id": 1,
        "scheduled_datetime": scheduled,
        "status": status,
    })
    .to_string()
}
