use bytes::Bytes;
use http_body_util::{BodyExt as _, Full};
use hyper::Request;
use hyper::body::Incoming;
use hyper_rustls::{HttpsConnector, HttpsConnectorBuilder};
use hyper_util::client::legacy::Client;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::rt::TokioExecutor;
use std::time::{Duration, Instant};
use tokio::io::{AsyncWrite, AsyncWriteExt as _};

use super::{Error, Result, Transfer};

const USER_AGENT: &str = concat!("netgauge/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Clone)]
pub struct HttpClient {
    inner: Client<HttpsConnector<HttpConnector>, Full<Bytes>>,
}

impl Default for HttpClient {
    fn default() -> Self {
        // The OS-level TCP connect timeout can be tens of seconds; an unreachable
        // endpoint must fail well inside a single probe budget.
        Self::new(Some(Duration::from_secs(3)))
    }
}

impl HttpClient {
    #[must_use]
    pub fn new(connect_timeout: Option<Duration>) -> Self {
        let mut http_connector = HttpConnector::new();
        http_connector.enforce_http(false);
        http_connector.set_connect_timeout(connect_timeout);
        http_connector.set_nodelay(true);

        let https_connector = HttpsConnectorBuilder::new()
            .with_webpki_roots()
            .https_or_http()
            .enable_http1()
            .wrap_connector(http_connector);

        let inner = Client::builder(TokioExecutor::new()).build(https_connector);

        Self { inner }
    }

    /// GET `url` and stream the response body into `sink`.
    ///
    /// The whole exchange (connect, headers, body) is bounded by `timeout`.
    pub async fn download<W>(&self, url: &str, timeout: Duration, sink: &mut W) -> Result<Transfer>
    where
        W: AsyncWrite + Unpin + Send,
    {
        let started = Instant::now();
        let bytes = match tokio::time::timeout(timeout, self.download_into(url, sink)).await {
            Ok(res) => res?,
            Err(_) => return Err(Error::Timeout(timeout)),
        };

        Ok(Transfer {
            bytes,
            elapsed: started.elapsed(),
        })
    }

    /// POST `body` to `url` and wait for the full response.
    pub async fn upload(&self, url: &str, body: Bytes, timeout: Duration) -> Result<Transfer> {
        let started = Instant::now();
        let bytes = match tokio::time::timeout(timeout, self.upload_from(url, body)).await {
            Ok(res) => res?,
            Err(_) => return Err(Error::Timeout(timeout)),
        };

        Ok(Transfer {
            bytes,
            elapsed: started.elapsed(),
        })
    }

    async fn download_into<W>(&self, url: &str, sink: &mut W) -> Result<u64>
    where
        W: AsyncWrite + Unpin + Send,
    {
        let uri = parse_uri(url)?;
        let req = Request::get(uri)
            .header(http::header::USER_AGENT, USER_AGENT)
            .body(Full::new(Bytes::new()))?;

        let res = self.send(req).await?;
        let mut body = res.into_body();

        let mut bytes = 0u64;
        while let Some(frame) = body.frame().await {
            let frame = frame?;
            if let Ok(data) = frame.into_data() {
                bytes = bytes.saturating_add(data.len() as u64);
                sink.write_all(&data).await?;
            }
        }
        sink.flush().await?;

        Ok(bytes)
    }

    async fn upload_from(&self, url: &str, body: Bytes) -> Result<u64> {
        let uri = parse_uri(url)?;
        let len = body.len() as u64;
        let req = Request::post(uri)
            .header(http::header::USER_AGENT, USER_AGENT)
            .header(http::header::CONTENT_TYPE, "application/octet-stream")
            .header(http::header::CONTENT_LENGTH, len)
            .body(Full::new(body))?;

        let res = self.send(req).await?;

        // The upload only counts once the server has acknowledged it.
        res.into_body().collect().await?;

        Ok(len)
    }

    async fn send(&self, req: Request<Full<Bytes>>) -> Result<hyper::Response<Incoming>> {
        let res = self.inner.request(req).await?;
        let status = res.status();
        if !status.is_success() {
            return Err(Error::Status(status.as_u16()));
        }
        Ok(res)
    }
}

fn parse_uri(url: &str) -> Result<hyper::Uri> {
    let parsed = url::Url::parse(url).map_err(|_| Error::InvalidUrl(url.to_string()))?;
    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return Err(Error::UnsupportedScheme(url.to_string()));
    }

    url.parse().map_err(|_| Error::InvalidUrl(url.to_string()))
}
