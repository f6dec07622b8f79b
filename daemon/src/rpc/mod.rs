//! JSON-RPC module for daemon communication.
//!
//! Provides the JSON-RPC 2.0 server implementation for:
//! - `generate_video`: Start an image-to-video job
//! - `synthesize_speech`: Synthesize a WAV clip
//! - `list_voices`: Prebuilt voice catalogue
//! - `set_api_key` / `clear_api_key`: Key storage
//! - `ping`: Health check
//! - `shutdown`: Graceful shutdown
//!
//! Notifications:
//! - `generation_progress`: Job submitted, or waiting for the next check
//! - `download_progress`: Result download progress
//! - `generation_complete`: Successful completion
//! - `generation_error`: Job failure

pub mod methods;
pub mod server;
pub mod types;

// Re-export commonly used types
pub use server::{run_server, serve, Notifier, Providers, ServerState};
pub use types::{
    GenerateVideoParams, GenerateVideoResult, GenerationCompleteParams, GenerationErrorParams,
    GenerationProgressParams, JsonRpcError, JsonRpcErrorResponse, JsonRpcNotification,
    JsonRpcRequest, JsonRpcResponse, RequestId,
};
