pub mod handlers;
pub mod routes;

use serde::{Deserialize, Serialize};

/// Body of `POST /tts`. Both fields are optional at the wire level; the
/// handler rejects a missing or empty `text` and substitutes the configured
/// default voice when `voice` is absent.
#[derive(Debug, Deserialize)]
pub struct SynthesisRequest {
    pub text: Option<String>,
    pub voice: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}
