#![allow(dead_code)]

use std::io::Read;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use parking_lot::Mutex;
use tiny_http::{Header, Response, Server};

#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: String,
    pub url: String,
    pub user_agent: Option<String>,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

impl Recorded {
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// In-process HTTP backend answering a fixed number of requests.
pub struct Backend {
    pub base_url: String,
    requests: Arc<Mutex<Vec<Recorded>>>,
    handle: Option<JoinHandle<()>>,
}

impl Backend {
    pub fn serve<F>(expected: usize, respond: F) -> Self
    where
        F: Fn(&Recorded) -> (u16, String) + Send + 'static,
    {
        let server = Server::http("127.0.0.1:0").expect("bind test server");
        let addr = server.server_addr().to_ip().expect("ip listener");
        let requests = Arc::new(Mutex::new(Vec::new()));
        let recorded = requests.clone();
        let handle = thread::spawn(move || {
            for _ in 0..expected {
                let Ok(mut request) = server.recv() else {
                    return;
                };
                let mut body = Vec::new();
                let _ = request.as_reader().read_to_end(&mut body);
                let header = |name: &'static str| {
                    request
                        .headers()
                        .iter()
                        .find(|h| h.field.equiv(name))
                        .map(|h| h.value.as_str().to_string())
                };
                let entry = Recorded {
                    method: request.method().as_str().to_string(),
                    url: request.url().to_string(),
                    user_agent: header("User-Agent"),
                    content_type: header("Content-Type"),
                    body,
                };
                let (status, payload) = respond(&entry);
                recorded.lock().push(entry);
                let json = Header::from_bytes("Content-Type", "application/json")
                    .expect("content type header");
                let _ = request.respond(
                    Response::from_string(payload)
                        .with_status_code(status)
                        .with_header(json),
                );
            }
        });
        Self {
            base_url: format!("http://{addr}"),
            requests,
            handle: Some(handle),
        }
    }

    /// Waits for every expected request and returns them in arrival order.
    pub fn finish(mut self) -> Vec<Recorded> {
        if let Some(handle) = self.handle.take() {
            handle.join().expect("test server thread");
        }
        self.requests.lock().clone()
    }
}

pub const FEED: &str = r#"[
  {"_id": "a1", "title": "Harbor at dawn", "mediaType": "video", "mediaPath": "uploads/harbor.mp4",
   "uploadDate": "2024-03-15T12:00:00.000Z", "comments": [], "__v": 0},
  {"_id": "b2", "title": "Market stalls", "mediaType": "image", "mediaPath": "uploads/market.jpg",
   "uploadDate": "2024-03-14T09:30:00.000Z",
   "comments": [{"name": "Ana", "text": "Colorful!", "date": "2024-03-14T10:00:00.000Z"}]}
]"#;
