//! Pinning gateway upload client
//!
//! Wraps the multipart `pinFileToIPFS` request behind a transport trait so
//! the pipeline can be exercised without a network. The client re-runs logo
//! validation before touching the transport, translates every failure mode
//! into a structured [`UploadOutcome`], and never lets an error cross its
//! boundary as a panic or a thrown `Err`.

use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream;
use log::{debug, warn};
use reqwest::multipart::{Form, Part};
use reqwest::Body;
use serde::{Deserialize, Serialize};
use serde_json::json;
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::config::PinningConfig;
use crate::logo::{self, ImageRules, LogoFile};

const UPLOAD_CHUNK_SIZE: usize = 64 * 1024;

/// Progress callback, invoked with a percentage in [0, 100].
pub type ProgressFn = dyn Fn(u8) + Send + Sync;

/// Monotonic progress reporter. Percentages are only forwarded when they
/// exceed everything reported so far, so byte-level updates arriving after
/// a stage marker can never move the needle backwards.
#[derive(Clone)]
pub struct ProgressReporter {
    inner: Arc<ReporterInner>,
}

struct ReporterInner {
    callback: Option<Box<ProgressFn>>,
    last: AtomicU8,
}

impl ProgressReporter {
    pub fn new(callback: Option<Box<ProgressFn>>) -> Self {
        ProgressReporter {
            inner: Arc::new(ReporterInner {
                callback,
                last: AtomicU8::new(0),
            }),
        }
    }

    pub fn disabled() -> Self {
        Self::new(None)
    }

    pub fn report(&self, percent: u8) {
        let percent = percent.min(100);
        let previous = self.inner.last.fetch_max(percent, Ordering::SeqCst);
        if percent > previous {
            if let Some(callback) = &self.inner.callback {
                callback(percent);
            }
        }
    }

    /// Map transport byte counts onto the 20-90 band. A transport that never
    /// knows its totals simply never calls this.
    pub fn bytes_sent(&self, sent: u64, total: u64) {
        if total == 0 {
            return;
        }
        let fraction = (sent as f64 / total as f64).min(1.0);
        self.report((20.0 + fraction * 70.0) as u8);
    }

    pub fn last(&self) -> u8 {
        self.inner.last.load(Ordering::SeqCst)
    }
}

/// Everything a transport needs to pin one file.
#[derive(Debug, Clone)]
pub struct PinRequest {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Bytes,
    pub metadata: serde_json::Value,
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("gateway returned status {status}: {message}")]
    Status { status: u16, message: String },
    #[error("{0}")]
    Network(String),
}

/// Seam between the upload client and the wire. The real implementation is
/// [`HttpPinningTransport`]; tests substitute a mock.
#[async_trait]
pub trait PinningTransport: Send + Sync {
    /// Submit the multipart request, reporting byte progress when the
    /// transport knows sent/total counts. Returns the raw response body on a
    /// 2xx status.
    async fn pin_file(
        &self,
        request: PinRequest,
        progress: ProgressReporter,
    ) -> Result<String, TransportError>;
}

/// reqwest-backed transport for the Pinata pinning API.
pub struct HttpPinningTransport {
    client: reqwest::Client,
    config: PinningConfig,
}

impl HttpPinningTransport {
    pub fn new(config: PinningConfig) -> Self {
        let client = reqwest::ClientBuilder::new()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        HttpPinningTransport { client, config }
    }
}

#[async_trait]
impl PinningTransport for HttpPinningTransport {
    async fn pin_file(
        &self,
        request: PinRequest,
        progress: ProgressReporter,
    ) -> Result<String, TransportError> {
        let total = request.bytes.len() as u64;
        let sent = Arc::new(AtomicU64::new(0));
        let stream_progress = progress.clone();

        let chunks = chunk_bytes(&request.bytes, UPLOAD_CHUNK_SIZE);
        let counting = stream::iter(chunks.into_iter().map(move |chunk| {
            let len = chunk.len() as u64;
            let so_far = sent.fetch_add(len, Ordering::SeqCst) + len;
            stream_progress.bytes_sent(so_far, total);
            Ok::<Bytes, std::io::Error>(chunk)
        }));

        let part = Part::stream_with_length(Body::wrap_stream(counting), total)
            .file_name(request.file_name.clone())
            .mime_str(&request.content_type)
            .map_err(|e| TransportError::Network(format!("invalid content type: {}", e)))?;

        let form = Form::new()
            .part("file", part)
            .text("pinataMetadata", request.metadata.to_string());

        let url = format!(
            "{}/pinning/pinFileToIPFS",
            self.config.api_base.trim_end_matches('/')
        );
        debug!("pinning {} ({} bytes) to {}", request.file_name, total, url);

        let response = self
            .client
            .post(&url)
            .header("pinata_api_key", &self.config.api_key)
            .header("pinata_secret_api_key", &self.config.secret_api_key)
            .multipart(form)
            .send()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;

        if !status.is_success() {
            warn!("pinning gateway returned {}", status);
            return Err(TransportError::Status {
                status: status.as_u16(),
                message: status
                    .canonical_reason()
                    .unwrap_or("unexpected status")
                    .to_string(),
            });
        }

        Ok(body)
    }
}

fn chunk_bytes(bytes: &Bytes, chunk_size: usize) -> Vec<Bytes> {
    let mut chunks = Vec::with_capacity(bytes.len() / chunk_size + 1);
    let mut offset = 0;
    while offset < bytes.len() {
        let end = usize::min(offset + chunk_size, bytes.len());
        chunks.push(bytes.slice(offset..end));
        offset = end;
    }
    chunks
}

/// Successful pin response from the gateway. Only `IpfsHash` is required.
#[derive(Debug, Clone, Deserialize)]
struct PinataResponse {
    #[serde(rename = "IpfsHash")]
    ipfs_hash: String,
    #[serde(rename = "PinSize", default)]
    #[allow(dead_code)]
    pin_size: Option<u64>,
    #[serde(rename = "Timestamp", default)]
    #[allow(dead_code)]
    timestamp: Option<String>,
}

/// Normalized result of one upload attempt.
#[derive(Debug, Clone, Serialize)]
pub struct UploadOutcome {
    pub success: bool,
    pub hash: Option<String>,
    pub url: Option<String>,
    pub error: Option<String>,
}

impl UploadOutcome {
    fn succeeded(hash: String, url: String) -> Self {
        UploadOutcome {
            success: true,
            hash: Some(hash),
            url: Some(url),
            error: None,
        }
    }

    fn failure(error: String) -> Self {
        UploadOutcome {
            success: false,
            hash: None,
            url: None,
            error: Some(error),
        }
    }
}

/// Upload client: validation gate, metadata construction, transport call,
/// response parsing, URL derivation.
pub struct UploadClient<T> {
    transport: T,
    gateway: String,
    rules: ImageRules,
}

impl<T: PinningTransport> UploadClient<T> {
    pub fn new(transport: T, gateway: impl Into<String>) -> Self {
        UploadClient {
            transport,
            gateway: gateway.into(),
            rules: ImageRules::default(),
        }
    }

    pub fn with_rules(transport: T, gateway: impl Into<String>, rules: ImageRules) -> Self {
        UploadClient {
            transport,
            gateway: gateway.into(),
            rules,
        }
    }

    /// Fire-and-wait upload.
    pub async fn upload(&self, file: &LogoFile) -> UploadOutcome {
        self.upload_inner(file, ProgressReporter::disabled()).await
    }

    /// Upload with a monotonically non-decreasing progress callback:
    /// 10 after validation, 20 after body construction, 20-90 proportional
    /// to bytes sent, 95 on response receipt, 100 on successful parse.
    pub async fn upload_with_progress(
        &self,
        file: &LogoFile,
        on_progress: Box<ProgressFn>,
    ) -> UploadOutcome {
        self.upload_inner(file, ProgressReporter::new(Some(on_progress)))
            .await
    }

    async fn upload_inner(&self, file: &LogoFile, progress: ProgressReporter) -> UploadOutcome {
        let validation = logo::validate(file, &self.rules).await;
        if !validation.valid {
            let message = validation
                .error
                .unwrap_or_else(|| "Logo failed validation".to_string());
            return UploadOutcome::failure(message);
        }
        progress.report(10);

        let digest = hex::encode(Sha256::digest(&file.bytes));
        let mut keyvalues = json!({
            "size": validation.size,
            "type": validation.content_type,
            "sha256": digest,
        });
        if let Some(dims) = &validation.dimensions {
            keyvalues["width"] = json!(dims.width);
            keyvalues["height"] = json!(dims.height);
        }
        let metadata = json!({
            "name": file.file_name,
            "keyvalues": keyvalues,
        });

        let request = PinRequest {
            file_name: file.file_name.clone(),
            content_type: file.content_type.clone(),
            bytes: file.bytes.clone(),
            metadata,
        };
        progress.report(20);

        let body = match self.transport.pin_file(request, progress.clone()).await {
            Ok(body) => body,
            Err(err @ TransportError::Status { .. }) => {
                return UploadOutcome::failure(format!("Upload failed: {}", err));
            }
            Err(TransportError::Network(message)) => {
                return UploadOutcome::failure(format!("Network error during upload: {}", message));
            }
        };
        progress.report(95);

        let parsed: PinataResponse = match serde_json::from_str(&body) {
            Ok(parsed) => parsed,
            Err(_) => {
                return UploadOutcome::failure(
                    "Unexpected response from pinning gateway".to_string(),
                );
            }
        };
        progress.report(100);

        let url = format!(
            "{}/{}",
            self.gateway.trim_end_matches('/'),
            parsed.ipfs_hash
        );
        UploadOutcome::succeeded(parsed.ipfs_hash, url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    fn collecting_reporter() -> (ProgressReporter, Arc<Mutex<Vec<u8>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let reporter = ProgressReporter::new(Some(Box::new(move |pct| {
            sink.lock().unwrap().push(pct);
        })));
        (reporter, seen)
    }

    #[test]
    fn test_reporter_is_monotonic() {
        let (reporter, seen) = collecting_reporter();

        reporter.report(10);
        reporter.report(20);
        reporter.report(15); // stale update, must be swallowed
        reporter.report(95);
        reporter.report(95); // duplicate, must be swallowed
        reporter.report(100);

        assert_eq!(*seen.lock().unwrap(), vec![10, 20, 95, 100]);
        assert_eq!(reporter.last(), 100);
    }

    #[test]
    fn test_reporter_clamps_overflow() {
        let (reporter, seen) = collecting_reporter();
        reporter.report(250);
        assert_eq!(*seen.lock().unwrap(), vec![100]);
    }

    #[test]
    fn test_bytes_sent_maps_onto_band() {
        let (reporter, seen) = collecting_reporter();

        reporter.bytes_sent(0, 1000);
        reporter.bytes_sent(500, 1000);
        reporter.bytes_sent(1000, 1000);
        // Overshooting totals stays clamped at the top of the band
        reporter.bytes_sent(2000, 1000);

        assert_eq!(*seen.lock().unwrap(), vec![20, 55, 90]);
    }

    #[test]
    fn test_bytes_sent_without_total_is_silent() {
        let (reporter, seen) = collecting_reporter();
        reporter.bytes_sent(100, 0);
        assert!(seen.lock().unwrap().is_empty());
    }

    #[test]
    fn test_chunk_bytes_covers_input() {
        let data = Bytes::from(vec![7u8; 150_000]);
        let chunks = chunk_bytes(&data, UPLOAD_CHUNK_SIZE);

        assert_eq!(chunks.len(), 3);
        let total: usize = chunks.iter().map(|c| c.len()).sum();
        assert_eq!(total, 150_000);
    }

    #[test]
    fn test_pinata_response_parsing() {
        let body = r#"{"IpfsHash":"QmTestHash","PinSize":1234,"Timestamp":"2024-01-01T00:00:00Z"}"#;
        let parsed: PinataResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.ipfs_hash, "QmTestHash");

        assert!(serde_json::from_str::<PinataResponse>(r#"{"status":"ok"}"#).is_err());
    }
}
