use std::collections::VecDeque;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use bytes::{Bytes, BytesMut};
use futures::stream::BoxStream;
use futures::StreamExt;
use serde::Serialize;

use super::{SpeechProvider, StreamUnit, SynthesisStream};
use crate::error::AppError;

#[derive(Debug, Serialize)]
struct StreamRequest<'a> {
    text: &'a str,
    voice: &'a str,
}

/// Client for a provider exposing `POST {base_url}/synthesize/stream`.
///
/// The response body is newline-delimited JSON, one envelope per stream
/// unit: `{"type":"audio","data":"<base64>"}` for audio fragments, any
/// other `type` is a metadata marker passed through as-is.
pub struct HttpSpeechProvider {
    client: reqwest::Client,
    base_url: String,
}

impl HttpSpeechProvider {
    pub fn new(base_url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url,
        }
    }
}

#[async_trait]
impl SpeechProvider for HttpSpeechProvider {
    async fn open_stream(
        &self,
        text: &str,
        voice: &str,
    ) -> Result<Box<dyn SynthesisStream>, AppError> {
        let url = format!("{}/synthesize/stream", self.base_url);

        let response = self
            .client
            .post(&url)
            .json(&StreamRequest { text, voice })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Provider(format!(
                "provider returned {}: {}",
                status, body
            )));
        }

        Ok(Box::new(NdjsonUnitStream {
            body: response.bytes_stream().boxed(),
            buffer: BytesMut::new(),
            pending: VecDeque::new(),
            exhausted: false,
        }))
    }
}

struct NdjsonUnitStream {
    body: BoxStream<'static, reqwest::Result<Bytes>>,
    buffer: BytesMut,
    pending: VecDeque<StreamUnit>,
    exhausted: bool,
}

impl NdjsonUnitStream {
    /// Decode every complete line currently buffered.
    fn drain_lines(&mut self) -> Result<(), AppError> {
        while let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') {
            let line = self.buffer.split_to(pos + 1);
            if let Some(unit) = decode_line(&line)? {
                self.pending.push_back(unit);
            }
        }
        Ok(())
    }
}

#[async_trait]
impl SynthesisStream for NdjsonUnitStream {
    async fn next_unit(&mut self) -> Result<Option<StreamUnit>, AppError> {
        loop {
            if let Some(unit) = self.pending.pop_front() {
                return Ok(Some(unit));
            }

            if self.exhausted {
                // A final unit may lack the trailing newline.
                let rest = self.buffer.split();
                return decode_line(&rest);
            }

            match self.body.next().await {
                Some(Ok(chunk)) => {
                    self.buffer.extend_from_slice(&chunk);
                    self.drain_lines()?;
                }
                Some(Err(e)) => return Err(AppError::Provider(e.to_string())),
                None => self.exhausted = true,
            }
        }
    }
}

fn decode_line(raw: &[u8]) -> Result<Option<StreamUnit>, AppError> {
    let line = std::str::from_utf8(raw)
        .map_err(|e| AppError::Provider(format!("non-UTF-8 stream unit: {}", e)))?
        .trim();

    if line.is_empty() {
        return Ok(None);
    }

    let value: serde_json::Value = serde_json::from_str(line)?;
    match value.get("type").and_then(|t| t.as_str()) {
        Some("audio") => {
            let encoded = value
                .get("data")
                .and_then(|d| d.as_str())
                .ok_or_else(|| AppError::Provider("audio unit missing data field".into()))?;
            let data = BASE64
                .decode(encoded)
                .map_err(|e| AppError::Provider(format!("invalid audio payload: {}", e)))?;
            Ok(Some(StreamUnit::Audio(data.into())))
        }
        Some(_) => Ok(Some(StreamUnit::Metadata(value))),
        None => Err(AppError::Provider("stream unit missing type tag".into())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_audio_unit() {
        let unit = decode_line(br#"{"type":"audio","data":"QUI="}"#).unwrap();
        assert_eq!(unit, Some(StreamUnit::Audio(Bytes::from_static(b"AB"))));
    }

    #[test]
    fn non_audio_unit_is_metadata() {
        let unit = decode_line(br#"{"type":"WordBoundary","offset":1250000}"#)
            .unwrap()
            .unwrap();
        match unit {
            StreamUnit::Metadata(value) => {
                assert_eq!(value["type"], "WordBoundary");
                assert_eq!(value["offset"], 1250000);
            }
            other => panic!("expected metadata, got {:?}", other),
        }
    }

    #[test]
    fn blank_lines_are_skipped() {
        assert_eq!(decode_line(b"\n").unwrap(), None);
        assert_eq!(decode_line(b"  \r\n").unwrap(), None);
    }

    #[test]
    fn missing_type_tag_is_an_error() {
        let err = decode_line(br#"{"data":"QUI="}"#).unwrap_err();
        assert!(err.to_string().contains("type tag"));
    }

    #[test]
    fn audio_unit_without_data_is_an_error() {
        let err = decode_line(br#"{"type":"audio"}"#).unwrap_err();
        assert!(err.to_string().contains("data field"));
    }

    #[test]
    fn invalid_base64_is_an_error() {
        let err = decode_line(br#"{"type":"audio","data":"!!!"}"#).unwrap_err();
        assert!(err.to_string().contains("invalid audio payload"));
    }

    #[test]
    fn malformed_json_is_an_error() {
        let err = decode_line(b"not json\n").unwrap_err();
        assert!(err.to_string().contains("malformed stream unit"));
    }
}
