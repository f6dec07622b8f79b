//! HTTP client for the generative-media REST API.
//!
//! The API key travels in the `x-goog-api-key` header so it never appears
//! in URLs or logs.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use crate::config::DaemonConfig;
use crate::error::{DaemonError, ErrorCode, Result};
use crate::media::PcmBuffer;
use crate::types::{JobHandle, PollStatus, SpeechRequest, VideoRequest};

use super::wire::{error_message, Operation, PredictRequest, SpeechBody, SpeechResponse};
use super::{SpeechProvider, VideoProvider};

const API_KEY_HEADER: &str = "x-goog-api-key";

/// Timeout for submit, poll and speech calls.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Timeout for downloading a finished video.
const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(600);

/// Client for video jobs, speech synthesis and result downloads.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    video_model: String,
    speech_model: String,
}

impl GeminiClient {
    /// Creates a client from the daemon configuration and a resolved key.
    pub fn new(config: &DaemonConfig, api_key: impl Into<String>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(30))
            .user_agent(concat!("genmedia-daemon/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| {
                DaemonError::with_source(
                    ErrorCode::SubmissionFailed,
                    "Failed to create HTTP client",
                    e,
                )
            })?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            video_model: config.video_model.clone(),
            speech_model: config.speech_model.clone(),
        })
    }

    /// Speech model this client synthesizes with.
    pub fn speech_model(&self) -> &str {
        &self.speech_model
    }

    fn model_url(&self, model: &str, method: &str) -> String {
        format!("{}/models/{}:{}", self.base_url, model, method)
    }

    /// Downloads a finished video to `dest`, reporting (received, total) bytes.
    ///
    /// `total` is 0 when the server does not send a content length.
    pub async fn download<F>(&self, uri: &str, dest: &Path, mut on_progress: F) -> Result<u64>
    where
        F: FnMut(u64, u64),
    {
        info!(dest = %dest.display(), "Downloading generated video");

        let response = self
            .http
            .get(uri)
            .header(API_KEY_HEADER, &self.api_key)
            .timeout(DOWNLOAD_TIMEOUT)
            .send()
            .await
            .map_err(|e| DaemonError::download_failed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DaemonError::download_failed(error_message(status.as_u16(), &body)));
        }

        let total = response.content_length().unwrap_or(0);

        if let Some(parent) = dest.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await.map_err(|e| {
                    DaemonError::output_write_failed(format!(
                        "Failed to create directory {}: {}",
                        parent.display(),
                        e
                    ))
                })?;
            }
        }

        let mut file = tokio::fs::File::create(dest).await.map_err(|e| {
            DaemonError::output_write_failed(format!(
                "Failed to create file {}: {}",
                dest.display(),
                e
            ))
        })?;

        let mut received: u64 = 0;
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| DaemonError::download_failed(e.to_string()))?;
            file.write_all(&chunk).await.map_err(|e| {
                DaemonError::output_write_failed(format!("Failed to write file: {}", e))
            })?;
            received += chunk.len() as u64;
            on_progress(received, total);
        }

        file.flush()
            .await
            .map_err(|e| DaemonError::output_write_failed(format!("Failed to flush file: {}", e)))?;

        debug!(bytes = received, "Download finished");
        Ok(received)
    }
}

#[async_trait]
impl VideoProvider for GeminiClient {
    async fn submit(&self, request: &VideoRequest) -> Result<JobHandle> {
        let url = self.model_url(&self.video_model, "predictLongRunning");
        debug!(model = %self.video_model, aspect_ratio = %request.aspect_ratio, "Submitting video job");

        let response = self
            .http
            .post(&url)
            .header(API_KEY_HEADER, &self.api_key)
            .timeout(REQUEST_TIMEOUT)
            .json(&PredictRequest::from_request(request))
            .send()
            .await
            .map_err(|e| DaemonError::submission_failed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DaemonError::submission_failed(error_message(status.as_u16(), &body)));
        }

        let operation: Operation = response
            .json()
            .await
            .map_err(|e| DaemonError::submission_failed(format!("Invalid response: {}", e)))?;

        if let Some(error) = operation.error {
            return Err(DaemonError::submission_failed(error.describe()));
        }

        info!(handle = %operation.name, "Video job accepted");
        Ok(JobHandle::new(operation.name))
    }

    async fn poll(&self, handle: &JobHandle) -> Result<PollStatus> {
        let url = format!("{}/{}", self.base_url, handle.as_str());

        let response = self
            .http
            .get(&url)
            .header(API_KEY_HEADER, &self.api_key)
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await
            .map_err(|e| DaemonError::polling_failed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DaemonError::polling_failed(error_message(status.as_u16(), &body)));
        }

        let operation: Operation = response
            .json()
            .await
            .map_err(|e| DaemonError::polling_failed(format!("Invalid response: {}", e)))?;

        operation.poll_status()
    }

    async fn fetch_result(
        &self,
        uri: &str,
        dest: &Path,
        on_progress: &(dyn Fn(u64, u64) + Send + Sync),
    ) -> Result<u64> {
        self.download(uri, dest, |received, total| on_progress(received, total))
            .await
    }
}

#[async_trait]
impl SpeechProvider for GeminiClient {
    async fn synthesize(&self, request: &SpeechRequest) -> Result<PcmBuffer> {
        let url = self.model_url(&self.speech_model, "generateContent");
        debug!(model = %self.speech_model, voice = %request.voice, chars = request.text.len(), "Requesting speech");

        let response = self
            .http
            .post(&url)
            .header(API_KEY_HEADER, &self.api_key)
            .timeout(REQUEST_TIMEOUT)
            .json(&SpeechBody::from_request(request))
            .send()
            .await
            .map_err(|e| DaemonError::speech_failed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DaemonError::speech_failed(error_message(status.as_u16(), &body)));
        }

        let body: SpeechResponse = response
            .json()
            .await
            .map_err(|e| DaemonError::speech_failed(format!("Invalid response: {}", e)))?;

        body.into_pcm()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::InlineImage;
    use tempfile::tempdir;
    use tokio::io::AsyncReadExt;
    use tokio::net::{TcpListener, TcpStream};

    /// Serves one canned response per connection, in order, and hands back
    /// the raw requests it saw.
    async fn canned_server(
        responses: Vec<(&'static str, Vec<u8>)>,
    ) -> (String, tokio::task::JoinHandle<Vec<String>>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());
        let handle = tokio::spawn(async move {
            let mut requests = Vec::new();
            for (status, body) in responses {
                let (mut socket, _) = listener.accept().await.unwrap();
                requests.push(read_request(&mut socket).await);
                let head = format!(
                    "HTTP/1.1 {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                    status,
                    body.len()
                );
                socket.write_all(head.as_bytes()).await.unwrap();
                socket.write_all(&body).await.unwrap();
                socket.shutdown().await.unwrap();
            }
            requests
        });
        (base_url, handle)
    }

    /// Reads the request head and as much body as Content-Length announces.
    async fn read_request(socket: &mut TcpStream) -> String {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 4096];
        loop {
            let n = socket.read(&mut chunk).await.unwrap();
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);
            if let Some(end) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
                let head = String::from_utf8_lossy(&buf[..end]).to_lowercase();
                let body_len = head
                    .lines()
                    .find_map(|line| line.strip_prefix("content-length:"))
                    .and_then(|value| value.trim().parse::<usize>().ok())
                    .unwrap_or(0);
                if buf.len() >= end + 4 + body_len {
                    break;
                }
            }
        }
        String::from_utf8_lossy(&buf).to_string()
    }

    fn client_for(base_url: &str) -> GeminiClient {
        let config = DaemonConfig {
            base_url: base_url.to_string(),
            ..Default::default()
        };
        GeminiClient::new(&config, "test-key").unwrap()
    }

    fn video_request() -> VideoRequest {
        VideoRequest {
            prompt: "test".to_string(),
            image: InlineImage {
                mime_type: "image/png".to_string(),
                data_base64: "iVBORw0K".to_string(),
            },
            aspect_ratio: Default::default(),
        }
    }

    #[test]
    fn model_urls() {
        let config = DaemonConfig {
            base_url: "https://api.example/v1beta/".to_string(),
            ..Default::default()
        };
        let client = GeminiClient::new(&config, "key").unwrap();
        assert_eq!(
            client.model_url("veo-2.0-generate-001", "predictLongRunning"),
            "https://api.example/v1beta/models/veo-2.0-generate-001:predictLongRunning"
        );
        assert_eq!(client.speech_model(), config.speech_model);
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_submission_failure() {
        let config = DaemonConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            ..Default::default()
        };
        let client = GeminiClient::new(&config, "key").unwrap();
        let err = client.submit(&video_request()).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::SubmissionFailed);

        let err = client.poll(&JobHandle::new("operations/x")).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::PollingFailed);
    }

    #[tokio::test]
    async fn submit_rejection_carries_envelope_message() {
        let body = br#"{"error":{"code":403,"message":"API key not valid","status":"PERMISSION_DENIED"}}"#;
        let (base_url, server) = canned_server(vec![("403 Forbidden", body.to_vec())]).await;

        let err = client_for(&base_url)
            .submit(&video_request())
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::SubmissionFailed);
        assert!(err.message.contains("HTTP 403"), "{}", err.message);
        assert!(err.message.contains("API key not valid"), "{}", err.message);

        let requests = server.await.unwrap();
        assert!(requests[0].starts_with("POST /models/veo-2.0-generate-001:predictLongRunning "));
        assert!(requests[0].to_lowercase().contains("x-goog-api-key: test-key"));
        assert!(requests[0].contains("\"bytesBase64Encoded\":\"iVBORw0K\""));
    }

    #[tokio::test]
    async fn accepted_submission_returns_operation_name() {
        let body = br#"{"name":"models/veo/operations/abc123"}"#;
        let (base_url, server) = canned_server(vec![("200 OK", body.to_vec())]).await;

        let handle = client_for(&base_url).submit(&video_request()).await.unwrap();
        assert_eq!(handle.as_str(), "models/veo/operations/abc123");
        server.await.unwrap();
    }

    #[tokio::test]
    async fn unavailable_status_is_polling_failure() {
        let (base_url, server) =
            canned_server(vec![("503 Service Unavailable", b"upstream overloaded".to_vec())]).await;

        let err = client_for(&base_url)
            .poll(&JobHandle::new("operations/abc"))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::PollingFailed);
        assert!(err.message.ends_with("HTTP 503: upstream overloaded"), "{}", err.message);

        let requests = server.await.unwrap();
        assert!(requests[0].starts_with("GET /operations/abc "));
    }

    #[tokio::test]
    async fn finished_operation_yields_uri() {
        let body = br#"{
            "name": "operations/abc",
            "done": true,
            "response": {"generateVideoResponse": {"generatedSamples": [
                {"video": {"uri": "https://media.example/abc.mp4"}}
            ]}}
        }"#;
        let (base_url, server) = canned_server(vec![("200 OK", body.to_vec())]).await;

        let status = client_for(&base_url)
            .poll(&JobHandle::new("operations/abc"))
            .await
            .unwrap();
        assert_eq!(
            status,
            PollStatus::Done {
                uri: "https://media.example/abc.mp4".to_string()
            }
        );
        server.await.unwrap();
    }

    #[tokio::test]
    async fn download_writes_file_and_reports_progress() {
        let payload: Vec<u8> = (0..100_000u32).map(|i| (i % 251) as u8).collect();
        let (base_url, server) = canned_server(vec![("200 OK", payload.clone())]).await;
        let dir = tempdir().unwrap();
        let dest = dir.path().join("videos").join("clip.mp4");

        let mut progress = Vec::new();
        let written = client_for(&base_url)
            .download(&format!("{}/files/abc:download", base_url), &dest, |received, total| {
                progress.push((received, total))
            })
            .await
            .unwrap();

        let len = payload.len() as u64;
        assert_eq!(written, len);
        assert_eq!(std::fs::read(&dest).unwrap(), payload);
        assert_eq!(progress.last(), Some(&(len, len)));
        assert!(progress.windows(2).all(|w| w[0].0 < w[1].0));
        assert!(progress.iter().all(|&(_, total)| total == len));

        let requests = server.await.unwrap();
        assert!(requests[0].starts_with("GET /files/abc:download "));
    }

    #[tokio::test]
    async fn failed_download_is_download_failure() {
        let (base_url, server) = canned_server(vec![("404 Not Found", Vec::new())]).await;
        let dir = tempdir().unwrap();

        let err = client_for(&base_url)
            .download(&format!("{}/files/gone", base_url), &dir.path().join("x.mp4"), |_, _| {})
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::DownloadFailed);
        assert!(err.message.ends_with("HTTP 404"), "{}", err.message);
        assert!(!dir.path().join("x.mp4").exists());
        server.await.unwrap();
    }
}
