use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;

use super::{HealthResponse, SynthesisRequest};
use crate::api::routes::AppState;
use crate::error::AppError;
use crate::provider::{SpeechProvider, StreamUnit};

pub async fn synthesize(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SynthesisRequest>,
) -> Result<Response, AppError> {
    tracing::info!(?request, "Received synthesis request");

    let text = match request.text.as_deref() {
        Some(t) if !t.is_empty() => t,
        _ => return Err(AppError::BadRequest("Text is required".into())),
    };

    let voice = request
        .voice
        .as_deref()
        .unwrap_or(&state.config.default_voice);

    let audio = tokio::time::timeout(
        state.config.synthesis_timeout(),
        collect_audio(state.provider.as_ref(), text, voice),
    )
    .await
    .map_err(|_| {
        AppError::Provider(format!(
            "synthesis timed out after {}s",
            state.config.synthesis_timeout_secs
        ))
    })??;

    tracing::info!(voice, audio_bytes = audio.len(), "Synthesis complete");

    Ok((StatusCode::OK, [(header::CONTENT_TYPE, "audio/mpeg")], audio).into_response())
}

/// Drain the provider stream to completion, appending audio bytes in
/// arrival order. Non-audio units carry no payload for the response and
/// are skipped. Either the whole payload is returned or an error is;
/// a partial accumulation is never surfaced as success.
async fn collect_audio(
    provider: &dyn SpeechProvider,
    text: &str,
    voice: &str,
) -> Result<Vec<u8>, AppError> {
    let mut stream = provider.open_stream(text, voice).await?;

    let mut audio = Vec::new();
    while let Some(unit) = stream.next_unit().await? {
        match unit {
            StreamUnit::Audio(data) => audio.extend_from_slice(&data),
            StreamUnit::Metadata(_) => {}
        }
    }

    Ok(audio)
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
