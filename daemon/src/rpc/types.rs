//! JSON-RPC types for the daemon protocol.
//!
//! Request/response envelopes, method parameters and results, and the
//! notifications pushed while video jobs run.

use serde::{Deserialize, Serialize};

use crate::error::DaemonError;
use crate::types::{AspectRatio, JobStatus};

/// JSON-RPC version constant.
pub const JSONRPC_VERSION: &str = "2.0";

/// A JSON-RPC request ID.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum RequestId {
    Integer(i64),
    String(String),
}

impl From<i64> for RequestId {
    fn from(id: i64) -> Self {
        RequestId::Integer(id)
    }
}

impl From<String> for RequestId {
    fn from(id: String) -> Self {
        RequestId::String(id)
    }
}

/// A JSON-RPC request wrapper.
#[derive(Debug, Deserialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    pub method: String,
    pub id: RequestId,
    #[serde(default)]
    pub params: serde_json::Value,
}

/// A JSON-RPC response wrapper.
#[derive(Debug, Serialize)]
pub struct JsonRpcResponse<T: Serialize> {
    pub jsonrpc: &'static str,
    pub id: RequestId,
    pub result: T,
}

impl<T: Serialize> JsonRpcResponse<T> {
    pub fn new(id: RequestId, result: T) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            id,
            result,
        }
    }
}

/// A JSON-RPC error response.
#[derive(Debug, Serialize)]
pub struct JsonRpcErrorResponse {
    pub jsonrpc: &'static str,
    pub id: Option<RequestId>,
    pub error: JsonRpcError,
}

impl JsonRpcErrorResponse {
    pub fn new(id: Option<RequestId>, error: JsonRpcError) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            id,
            error,
        }
    }
}

/// A JSON-RPC error object.
#[derive(Debug, Serialize)]
pub struct JsonRpcError {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<JsonRpcErrorData>,
}

/// Extended error data for application-specific errors.
#[derive(Debug, Serialize)]
pub struct JsonRpcErrorData {
    pub error_code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl JsonRpcError {
    /// Creates a parse error (-32700).
    pub fn parse_error(message: impl Into<String>) -> Self {
        Self {
            code: -32700,
            message: message.into(),
            data: None,
        }
    }

    /// Creates an invalid request error (-32600).
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self {
            code: -32600,
            message: message.into(),
            data: None,
        }
    }

    /// Creates a method not found error (-32601).
    pub fn method_not_found(method: &str) -> Self {
        Self {
            code: -32601,
            message: format!("Method not found: {}", method),
            data: None,
        }
    }

    /// Creates an invalid params error (-32602).
    pub fn invalid_params(message: impl Into<String>) -> Self {
        Self {
            code: -32602,
            message: message.into(),
            data: None,
        }
    }

    /// Creates an internal error (-32603).
    pub fn internal_error(message: impl Into<String>) -> Self {
        Self {
            code: -32603,
            message: message.into(),
            data: None,
        }
    }
}

impl From<DaemonError> for JsonRpcError {
    fn from(err: DaemonError) -> Self {
        Self {
            code: err.code.rpc_code(),
            message: err.message,
            data: Some(JsonRpcErrorData {
                error_code: err.code.as_str().to_string(),
                details: Some(err.code.recovery_hint().to_string()),
            }),
        }
    }
}

// ============================================================================
// Methods
// ============================================================================

/// Parameters for `generate_video`.
#[derive(Debug, Deserialize)]
pub struct GenerateVideoParams {
    /// Text description of the desired motion.
    pub prompt: String,

    /// Path to the source image on the daemon's filesystem.
    pub image_path: String,

    /// Output aspect ratio ("16:9" or "9:16").
    #[serde(default)]
    pub aspect_ratio: AspectRatio,

    /// Whether to download the finished video into the output directory.
    #[serde(default)]
    pub download: bool,
}

/// Response for `generate_video`. The job continues in the background.
#[derive(Debug, Serialize)]
pub struct GenerateVideoResult {
    pub job_id: String,
    pub status: JobStatus,
}

/// Parameters for `synthesize_speech`.
#[derive(Debug, Deserialize)]
pub struct SynthesizeSpeechParams {
    /// Text to speak.
    pub text: String,

    /// Prebuilt voice name; the configured default when absent.
    pub voice: Option<String>,
}

/// Response for `synthesize_speech`.
#[derive(Debug, Serialize)]
pub struct SynthesizeSpeechResult {
    pub clip_id: String,
    /// Absolute path to the WAV file.
    pub path: String,
    pub voice: String,
    pub duration_sec: f32,
    pub sample_rate: u32,
    /// True when an identical earlier request was reused.
    pub cached: bool,
}

/// A voice entry for `list_voices`.
#[derive(Debug, Serialize)]
pub struct VoiceInfo {
    pub name: &'static str,
    pub style: &'static str,
}

/// Response for `list_voices`.
#[derive(Debug, Serialize)]
pub struct ListVoicesResult {
    pub voices: Vec<VoiceInfo>,
    pub default_voice: String,
}

/// Parameters for `set_api_key`.
#[derive(Debug, Deserialize)]
pub struct SetApiKeyParams {
    pub api_key: String,
}

// ============================================================================
// Notifications
// ============================================================================

/// A JSON-RPC notification (no id field).
#[derive(Debug, Serialize)]
pub struct JsonRpcNotification<T: Serialize> {
    pub jsonrpc: &'static str,
    pub method: &'static str,
    pub params: T,
}

impl<T: Serialize> JsonRpcNotification<T> {
    pub fn new(method: &'static str, params: T) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            method,
            params,
        }
    }
}

/// Progress notification sent after submission and before each wait.
#[derive(Debug, Serialize)]
pub struct GenerationProgressParams {
    pub job_id: String,
    /// Display text.
    pub message: String,
    /// Status checks made so far.
    pub poll_count: u32,
}

/// Notification sent when a video job finishes successfully.
#[derive(Debug, Serialize)]
pub struct GenerationCompleteParams {
    pub job_id: String,
    /// Playable URI returned by the provider.
    pub uri: String,
    /// Local file, when the download was requested.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    pub poll_count: u32,
    /// Wall-clock time from submission to completion.
    pub elapsed_sec: f32,
}

/// Notification sent when a video job fails.
#[derive(Debug, Serialize)]
pub struct GenerationErrorParams {
    pub job_id: String,
    /// Error code.
    pub code: String,
    /// Human-readable error message.
    pub message: String,
}

/// Download progress notification, sent every 10%.
#[derive(Debug, Serialize)]
pub struct DownloadProgressParams {
    pub job_id: String,
    pub bytes_downloaded: u64,
    pub bytes_total: u64,
}
