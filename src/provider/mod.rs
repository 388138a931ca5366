pub mod http;

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::AppError;

pub use http::HttpSpeechProvider;

/// One item yielded by a provider stream. Only audio units contribute bytes
/// to the response; metadata markers (word boundaries, timing) are surfaced
/// here in case a caller ever needs them, but the gateway discards them.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamUnit {
    Audio(Bytes),
    Metadata(serde_json::Value),
}

/// A remote text-to-speech backend reachable over the network.
#[async_trait]
pub trait SpeechProvider: Send + Sync {
    /// Open a synthesis stream for (text, voice).
    async fn open_stream(
        &self,
        text: &str,
        voice: &str,
    ) -> Result<Box<dyn SynthesisStream>, AppError>;
}

/// Pull side of an open synthesis stream. Units arrive in provider order;
/// `Ok(None)` means the stream finished normally.
#[async_trait]
pub trait SynthesisStream: Send {
    async fn next_unit(&mut self) -> Result<Option<StreamUnit>, AppError>;
}
