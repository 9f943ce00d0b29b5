//! In-process SOAP endpoint for transport and gateway tests.
//!
//! Each connection gets the next canned reply in order, the last one repeating. Requests are
//! captured with their headers so tests can assert on exactly what went over the wire.

use crate::config::GatewayConfig;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

pub(crate) const TEST_API_ENDPOINT: &str = "http://www.dosespot.com/API/11/";

pub(crate) fn test_config(soap_endpoint: &str) -> GatewayConfig {
    GatewayConfig::new(123, 456, "secret", soap_endpoint, TEST_API_ENDPOINT)
        .expect("test configuration is valid")
}

/// Wrap reply content in a SOAP envelope.
pub(crate) fn reply_document(content: &str) -> String {
    format!(
        "<?xml version=\"1.0\" encoding=\"utf-8\"?>\
         <soap:Envelope xmlns:soap=\"http://schemas.xmlsoap.org/soap/envelope/\" \
         xmlns:xsi=\"http://www.w3.org/2001/XMLSchema-instance\" \
         xmlns:xsd=\"http://www.w3.org/2001/XMLSchema\">\
         <soap:Body>{content}</soap:Body></soap:Envelope>"
    )
}

#[derive(Clone, Debug)]
pub(crate) struct CannedReply {
    status: u16,
    body: String,
    delay: Option<Duration>,
}

impl CannedReply {
    pub(crate) fn ok(body: String) -> Self {
        Self::status(200, body)
    }

    pub(crate) fn status(status: u16, body: String) -> Self {
        Self {
            status,
            body,
            delay: None,
        }
    }

    /// Hold the response headers back for `delay`.
    pub(crate) fn delayed(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

#[derive(Clone, Debug)]
pub(crate) struct CapturedRequest {
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl CapturedRequest {
    /// Header value by case-insensitive name.
    pub(crate) fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

pub(crate) struct FakeSoapServer {
    addr: SocketAddr,
    captured: Arc<Mutex<Vec<CapturedRequest>>>,
    accept_loop: JoinHandle<()>,
}

impl FakeSoapServer {
    pub(crate) async fn start(replies: Vec<CannedReply>) -> Self {
        assert!(!replies.is_empty(), "at least one canned reply is needed");

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let captured = Arc::new(Mutex::new(Vec::new()));
        let replies = Arc::new(replies);
        let served = Arc::new(AtomicUsize::new(0));

        let accept_loop = {
            let captured = Arc::clone(&captured);
            tokio::spawn(async move {
                while let Ok((stream, _)) = listener.accept().await {
                    let index = served.fetch_add(1, Ordering::SeqCst).min(replies.len() - 1);
                    let reply = replies[index].clone();
                    let captured = Arc::clone(&captured);
                    tokio::spawn(async move {
                        let _ = serve(stream, reply, captured).await;
                    });
                }
            })
        };

        Self {
            addr,
            captured,
            accept_loop,
        }
    }

    pub(crate) fn url(&self) -> String {
        format!("http://{}/api/11/api.asmx", self.addr)
    }

    pub(crate) async fn requests(&self) -> Vec<CapturedRequest> {
        self.captured.lock().await.clone()
    }
}

impl Drop for FakeSoapServer {
    fn drop(&mut self) {
        self.accept_loop.abort();
    }
}

async fn serve(
    mut stream: TcpStream,
    reply: CannedReply,
    captured: Arc<Mutex<Vec<CapturedRequest>>>,
) -> std::io::Result<()> {
    let mut buffer = Vec::new();
    let mut chunk = [0u8; 4096];

    let header_end = loop {
        let read = stream.read(&mut chunk).await?;
        if read == 0 {
            return Ok(());
        }
        buffer.extend_from_slice(&chunk[..read]);
        if let Some(position) = buffer.windows(4).position(|w| w == b"\r\n\r\n") {
            break position + 4;
        }
    };

    let head = String::from_utf8_lossy(&buffer[..header_end]).into_owned();
    let headers: Vec<(String, String)> = head
        .lines()
        .skip(1)
        .filter_map(|line| line.split_once(':'))
        .map(|(key, value)| (key.trim().to_owned(), value.trim().to_owned()))
        .collect();
    let content_length = headers
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case("content-length"))
        .and_then(|(_, value)| value.parse::<usize>().ok())
        .unwrap_or(0);

    while buffer.len() < header_end + content_length {
        let read = stream.read(&mut chunk).await?;
        if read == 0 {
            break;
        }
        buffer.extend_from_slice(&chunk[..read]);
    }
    let body = String::from_utf8_lossy(&buffer[header_end..]).into_owned();

    captured.lock().await.push(CapturedRequest { headers, body });

    if let Some(delay) = reply.delay {
        tokio::time::sleep(delay).await;
    }

    let response = format!(
        "HTTP/1.1 {} {}\r\nContent-Type: text/xml; charset=utf-8\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        reply.status,
        if reply.status == 200 { "OK" } else { "Error" },
        reply.body.len(),
        reply.body
    );
    stream.write_all(response.as_bytes()).await?;
    stream.shutdown().await
}
