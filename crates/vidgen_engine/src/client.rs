use std::time::Duration;

use futures_util::StreamExt;
use reqwest::header::{ACCEPT, CACHE_CONTROL, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use url::Url;
use vidgen_core::{DurationUnit, GenerationRequest, JobState, StatusReport, SubmitReceipt};
use vidgen_logging::{vg_debug, vg_warn};

use crate::poll::StatusSource;
use crate::{BackendError, FailureKind};

const DEFAULT_MODEL_ID: &str = "default-model";

/// How a generation request is put on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SubmitEncoding {
    /// `GET <submit_path>?prompt=...&duration=...`
    #[default]
    Query,
    /// `POST <submit_path>` with a JSON body.
    Json,
}

#[derive(Debug, Clone)]
pub struct ClientSettings {
    pub base_url: String,
    pub submit_path: String,
    /// Status lookups go to `<status_path>/<job_id>`.
    pub status_path: String,
    pub encoding: SubmitEncoding,
    pub connect_timeout: Duration,
    /// Per request; unrelated to the poll interval.
    pub request_timeout: Duration,
    pub max_bytes: u64,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5001".to_string(),
            submit_path: "/video/generate".to_string(),
            status_path: "/video/status".to_string(),
            encoding: SubmitEncoding::Query,
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
            max_bytes: 1024 * 1024,
        }
    }
}

#[async_trait::async_trait]
pub trait Submitter: Send + Sync {
    /// Sends one generation request. No retry.
    async fn submit(&self, request: &GenerationRequest) -> Result<SubmitReceipt, BackendError>;
}

#[derive(Debug, Clone)]
pub struct ReqwestBackend {
    settings: ClientSettings,
    client: reqwest::Client,
}

impl ReqwestBackend {
    pub fn new(settings: ClientSettings) -> Result<Self, BackendError> {
        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .build()
            .map_err(|err| BackendError::new(FailureKind::Network, err.to_string()))?;
        Ok(Self { settings, client })
    }

    pub fn settings(&self) -> &ClientSettings {
        &self.settings
    }

    fn endpoint(&self, path: &str) -> Result<Url, BackendError> {
        let joined = format!("{}{}", self.settings.base_url.trim_end_matches('/'), path);
        Url::parse(&joined)
            .map_err(|err| BackendError::new(FailureKind::InvalidUrl, err.to_string()))
    }

    fn status_url(&self, job_id: &str) -> Result<Url, BackendError> {
        let mut url = self.endpoint(&self.settings.status_path)?;
        url.path_segments_mut()
            .map_err(|_| BackendError::new(FailureKind::InvalidUrl, "base url cannot hold a path"))?
            .pop_if_empty()
            .push(job_id);
        Ok(url)
    }

    fn build_submit(
        &self,
        request: &GenerationRequest,
    ) -> Result<reqwest::RequestBuilder, BackendError> {
        let mut url = self.endpoint(&self.settings.submit_path)?;
        match self.settings.encoding {
            SubmitEncoding::Query => {
                append_query(&mut url, request);
                Ok(self.client.get(url))
            }
            SubmitEncoding::Json => {
                let body = serde_json::to_vec(&SubmitPayload::from_request(request)).map_err(
                    |err| BackendError::new(FailureKind::InvalidResponse, err.to_string()),
                )?;
                Ok(self
                    .client
                    .post(url)
                    .header(CONTENT_TYPE, "application/json")
                    .body(body))
            }
        }
    }

    /// Sends the request and returns the body of a 2xx response.
    async fn send(&self, builder: reqwest::RequestBuilder) -> Result<Vec<u8>, BackendError> {
        let response = builder
            .header(ACCEPT, "application/json")
            .header(CACHE_CONTROL, "no-cache")
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = self.read_body(response).await.unwrap_or_default();
            let text = String::from_utf8_lossy(&body).trim().to_string();
            let detail = if text.is_empty() {
                status.canonical_reason().unwrap_or_default().to_string()
            } else {
                text
            };
            return Err(BackendError::new(
                FailureKind::HttpStatus(status.as_u16()),
                format!("API error: {} - {}", status.as_u16(), detail),
            ));
        }

        self.read_body(response).await
    }

    async fn read_body(&self, response: reqwest::Response) -> Result<Vec<u8>, BackendError> {
        let max_bytes = self.settings.max_bytes;
        if let Some(content_len) = response.content_length() {
            if content_len > max_bytes {
                return Err(too_large(max_bytes, content_len));
            }
        }

        let mut bytes = Vec::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(map_reqwest_error)?;
            let next_len = bytes.len() as u64 + chunk.len() as u64;
            if next_len > max_bytes {
                return Err(too_large(max_bytes, next_len));
            }
            bytes.extend_from_slice(&chunk);
        }
        Ok(bytes)
    }
}

#[async_trait::async_trait]
impl Submitter for ReqwestBackend {
    async fn submit(&self, request: &GenerationRequest) -> Result<SubmitReceipt, BackendError> {
        let builder = self.build_submit(request)?;
        vg_debug!(
            "Submitting generation request ({:?} encoding)",
            self.settings.encoding
        );
        let body = self.send(builder).await?;
        decode_submit(&body)
    }
}

#[async_trait::async_trait]
impl StatusSource for ReqwestBackend {
    async fn fetch_status(&self, job_id: &str) -> Result<StatusReport, BackendError> {
        let url = self.status_url(job_id)?;
        vg_debug!("Fetching status from {url}");
        let body = self.send(self.client.get(url)).await?;
        decode_status(&body)
    }
}

fn append_query(url: &mut Url, request: &GenerationRequest) {
    let mut pairs = url.query_pairs_mut();
    pairs
        .append_pair("prompt", request.trimmed_prompt())
        .append_pair("duration", &request.duration.to_string())
        .append_pair("quality", &request.quality)
        .append_pair("style", &request.style)
        .append_pair("force_replicate", bool_text(request.routing.force_replicate))
        .append_pair("use_hunyuan", bool_text(request.routing.use_hunyuan))
        .append_pair("human_focus", bool_text(request.human_focus));
    if request.duration_unit == DurationUnit::Minutes {
        pairs.append_pair("duration_unit", request.duration_unit.as_str());
    }
    if let Some((width, height)) = request.resolution {
        pairs.append_pair("video_size", &format!("{height},{width}"));
    }
    if let Some(model_id) = request.model_id.as_deref() {
        pairs.append_pair("model_id", model_id);
    }
}

fn bool_text(value: bool) -> &'static str {
    if value {
        "true"
    } else {
        "false"
    }
}

#[derive(Debug, Serialize)]
struct SubmitPayload<'a> {
    model_id: &'a str,
    prompt: &'a str,
    duration: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    duration_unit: Option<&'static str>,
    quality: &'a str,
    style: &'a str,
    force_replicate: bool,
    use_hunyuan: bool,
    human_focus: bool,
    /// `[height, width]`
    #[serde(skip_serializing_if = "Option::is_none")]
    video_size: Option<[u32; 2]>,
}

impl<'a> SubmitPayload<'a> {
    fn from_request(request: &'a GenerationRequest) -> Self {
        Self {
            model_id: request.model_id.as_deref().unwrap_or(DEFAULT_MODEL_ID),
            prompt: request.trimmed_prompt(),
            duration: request.duration,
            duration_unit: (request.duration_unit == DurationUnit::Minutes)
                .then(|| request.duration_unit.as_str()),
            quality: &request.quality,
            style: &request.style,
            force_replicate: request.routing.force_replicate,
            use_hunyuan: request.routing.use_hunyuan,
            human_focus: request.human_focus,
            video_size: request.resolution.map(|(width, height)| [height, width]),
        }
    }
}

#[derive(Debug, Deserialize)]
struct SubmitBody {
    job_id: Option<Value>,
    video_id: Option<Value>,
    id: Option<Value>,
    status: Option<String>,
    video_url: Option<String>,
    error: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct StatusBody {
    status: Option<String>,
    progress: Option<Value>,
    message: Option<String>,
    video_url: Option<String>,
    error: Option<Value>,
}

pub(crate) fn decode_submit(body: &[u8]) -> Result<SubmitReceipt, BackendError> {
    let parsed: SubmitBody = decode_json(body)?;
    if let Some(error) = parsed.error.as_ref().and_then(value_text) {
        return Err(BackendError::new(FailureKind::Rejected, error));
    }

    let job_id = [&parsed.job_id, &parsed.video_id, &parsed.id]
        .into_iter()
        .find_map(|value| value.as_ref().and_then(value_text))
        .ok_or_else(|| {
            BackendError::new(FailureKind::MissingJobId, "response did not include a job id")
        })?;

    Ok(SubmitReceipt {
        job_id,
        state: parsed.status.as_deref().map(JobState::parse),
        video_url: parsed.video_url.filter(|url| !url.is_empty()),
    })
}

pub(crate) fn decode_status(body: &[u8]) -> Result<StatusReport, BackendError> {
    let parsed: StatusBody = decode_json(body)?;
    let state = parsed
        .status
        .as_deref()
        .map(JobState::parse)
        .ok_or_else(|| BackendError::new(FailureKind::InvalidResponse, "status missing"))?;

    let progress = parsed.progress.as_ref().and_then(|value| match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().trim_end_matches('%').parse().ok(),
        _ => None,
    });
    if parsed.progress.is_some() && progress.is_none() {
        vg_warn!("Ignoring unreadable progress value {:?}", parsed.progress);
    }

    Ok(StatusReport {
        state,
        progress,
        message: parsed.message,
        video_url: parsed.video_url.filter(|url| !url.is_empty()),
        error: parsed.error.as_ref().and_then(value_text),
    })
}

fn decode_json<'a, T: Deserialize<'a>>(body: &'a [u8]) -> Result<T, BackendError> {
    serde_json::from_slice(body)
        .map_err(|err| BackendError::new(FailureKind::InvalidResponse, err.to_string()))
}

/// Text of a string or number field; empty strings and nulls count as absent.
fn value_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) if !text.is_empty() => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        Value::Null | Value::String(_) | Value::Bool(false) => None,
        other => Some(other.to_string()),
    }
}

fn too_large(max_bytes: u64, actual: u64) -> BackendError {
    BackendError::new(
        FailureKind::TooLarge {
            max_bytes,
            actual: Some(actual),
        },
        "response too large",
    )
}

pub(crate) fn map_reqwest_error(err: reqwest::Error) -> BackendError {
    if err.is_timeout() {
        return BackendError::new(FailureKind::Timeout, err.to_string());
    }
    BackendError::new(FailureKind::Network, err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn submit_id_falls_back_through_aliases() {
        let receipt = decode_submit(br#"{"video_id": "v-1", "id": "other"}"#).unwrap();
        assert_eq!(receipt.job_id, "v-1");

        let receipt = decode_submit(br#"{"id": 42, "status": "QUEUED"}"#).unwrap();
        assert_eq!(receipt.job_id, "42");
        assert_eq!(receipt.state, Some(JobState::Queued));

        let receipt = decode_submit(br#"{"job_id": "", "video_id": "v-2"}"#).unwrap();
        assert_eq!(receipt.job_id, "v-2");
    }

    #[test]
    fn submit_error_field_is_a_rejection() {
        let err = decode_submit(br#"{"job_id": "j", "error": "quota exceeded"}"#).unwrap_err();
        assert_eq!(err.kind, FailureKind::Rejected);
        assert_eq!(err.message, "quota exceeded");

        let receipt = decode_submit(br#"{"job_id": "j", "error": null}"#).unwrap();
        assert_eq!(receipt.job_id, "j");
    }

    #[test]
    fn submit_without_id_is_reported() {
        let err = decode_submit(br#"{"status": "queued"}"#).unwrap_err();
        assert_eq!(err.kind, FailureKind::MissingJobId);

        let err = decode_submit(b"<html>").unwrap_err();
        assert_eq!(err.kind, FailureKind::InvalidResponse);
    }

    #[test]
    fn status_progress_accepts_numbers_and_strings() {
        let report = decode_status(br#"{"status": "Processing", "progress": "42.5"}"#).unwrap();
        assert_eq!(report.state, JobState::Processing);
        assert_eq!(report.progress, Some(42.5));

        let report = decode_status(br#"{"status": "running", "progress": 7}"#).unwrap();
        assert_eq!(report.progress, Some(7.0));

        let report = decode_status(br#"{"status": "processing", "progress": []}"#).unwrap();
        assert_eq!(report.progress, None);
    }

    #[test]
    fn status_without_state_is_invalid() {
        let err = decode_status(br#"{"progress": 5}"#).unwrap_err();
        assert_eq!(err.kind, FailureKind::InvalidResponse);
    }

    #[test]
    fn json_payload_orders_video_size_height_first() {
        let request = GenerationRequest::new("  river  ").with_resolution(1280, 720);
        let payload = serde_json::to_value(SubmitPayload::from_request(&request)).unwrap();
        assert_eq!(payload["video_size"], serde_json::json!([720, 1280]));
        assert_eq!(payload["prompt"], "river");
        assert_eq!(payload["model_id"], DEFAULT_MODEL_ID);
        assert!(payload.get("duration_unit").is_none());
    }
}
