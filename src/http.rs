// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::pin::Pin;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;

const USER_AGENT: &str = concat!("stationcheck/", env!("CARGO_PKG_VERSION"));

/// Redirect hops followed before giving up
const MAX_REDIRECTS: usize = 10;

/// Upper bound on a whole request, body included
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Upper bound on establishing the connection
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// A streaming response body
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, reqwest::Error>> + Send>>;

/// HTTP response with status and body stream
pub struct HttpResponse {
    /// HTTP status code
    pub status: u16,
    /// Raw Content-Type header value, if present
    pub content_type: Option<String>,
    /// Response body as a stream of bytes
    pub body: ByteStream,
}

/// Response headers of a probe request; the body is never read
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeResponse {
    /// HTTP status code
    pub status: u16,
    /// Raw Content-Type header value, if present
    pub content_type: Option<String>,
    /// URL after following redirects
    pub final_url: String,
}

impl ProbeResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// HTTP client abstraction for testability
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// Request the URL and return only the response headers
    async fn probe(&self, url: &str) -> Result<ProbeResponse, reqwest::Error>;

    /// Get a streaming response for the URL's body
    async fn get_stream(&self, url: &str) -> Result<HttpResponse, reqwest::Error>;
}

/// Default HTTP client implementation using reqwest
#[derive(Clone)]
pub struct ReqwestClient {
    client: reqwest::Client,
}

impl ReqwestClient {
    /// Create a client with the default timeouts, redirect limit and User-Agent
    pub fn new() -> Result<Self, reqwest::Error> {
        Self::with_timeouts(DEFAULT_TIMEOUT, DEFAULT_CONNECT_TIMEOUT)
    }

    /// Create a client enforcing the given request and connect timeouts
    pub fn with_timeouts(
        timeout: Duration,
        connect_timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(connect_timeout)
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self { client })
    }
}

fn content_type_header(response: &reqwest::Response) -> Option<String> {
    response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(String::from)
}

#[async_trait]
impl HttpClient for ReqwestClient {
    async fn probe(&self, url: &str) -> Result<ProbeResponse, reqwest::Error> {
        // GET, not HEAD: the body is never read and the connection closes
        // when the response is dropped.
        let response = self.client.get(url).send().await?;

        Ok(ProbeResponse {
            status: response.status().as_u16(),
            content_type: content_type_header(&response),
            final_url: response.url().to_string(),
        })
    }

    async fn get_stream(&self, url: &str) -> Result<HttpResponse, reqwest::Error> {
        let response = self.client.get(url).send().await?;
        let status = response.status().as_u16();
        let content_type = content_type_header(&response);

        let body: ByteStream = Box::pin(response.bytes_stream());

        Ok(HttpResponse {
            status,
            content_type,
            body,
        })
    }
}


#[cfg(test)]
pub(crate) mod testing {
    use std::time::Duration;

    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    const HANG: Duration = Duration::from_secs(60);

    /// A server that accepts connections and never answers
    pub async fn silent_server() -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            while let Ok((socket, _)) = listener.accept().await {
                tokio::spawn(async move {
                    let _socket = socket;
                    tokio::time::sleep(HANG).await;
                });
            }
        });

        format!("http://{addr}/live.mp3")
    }

    /// A server that sends headers and the start of a playlist, then stalls
    pub async fn stalled_body_server(content_type: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                tokio::spawn(async move {
                    let mut request = [0u8; 1024];
                    let _ = socket.read(&mut request).await;

                    let head = format!(
                        "HTTP/1.1 200 OK\r\nContent-Type: {content_type}\r\nContent-Length: 10000\r\n\r\n"
                    );
                    let _ = socket.write_all(head.as_bytes()).await;
                    let _ = socket
                        .write_all(b"#EXTINF:-1,Partial\nhttp://x/a.mp3\n")
                        .await;
                    let _ = socket.flush().await;

                    tokio::time::sleep(HANG).await;
                });
            }
        });

        format!("http://{addr}/live.m3u")
    }
}
