//! HTTP client for the upstream registration API.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::records::{decode_records, CandidateRecord};
use crate::registration::SubmissionPayload;

const FALLBACK_REJECTION: &str = "registration failed";

/// Anything that can produce the full list of submitted records.
#[async_trait]
pub trait RecordSource: Send + Sync {
    async fn fetch_records(&self) -> Result<Vec<CandidateRecord>, ClientError>;
}

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("failed to load records")]
    LoadFailed { status: Option<u16> },
    #[error("failed to load records: response was not a JSON array ({0})")]
    Decode(#[from] serde_json::Error),
    #[error("{message}")]
    Rejected { status: u16, message: String },
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("unable to read attachment {path}: {source}")]
    Attachment {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// PDF uploaded with a registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl Attachment {
    pub fn from_path(path: &Path) -> Result<Self, ClientError> {
        let bytes = std::fs::read(path).map_err(|source| ClientError::Attachment {
            path: path.display().to_string(),
            source,
        })?;
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "documento.pdf".to_string());
        Ok(Self { file_name, bytes })
    }
}

/// Talks to `FORMULATION_URL`: `GET` lists records, `POST` submits a registration.
#[derive(Clone)]
pub struct PortalClient {
    http: Client,
    formulation_url: String,
}

impl PortalClient {
    pub fn new(formulation_url: impl Into<String>, timeout: Duration) -> Result<Self, ClientError> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            formulation_url: formulation_url.into(),
        })
    }

    pub fn formulation_url(&self) -> &str {
        &self.formulation_url
    }

    /// Sends one multipart registration. There is no retry; the caller decides whether to resubmit.
    pub async fn submit(
        &self,
        payload: &SubmissionPayload,
        attachment: Option<Attachment>,
    ) -> Result<(), ClientError> {
        let mut form = Form::new();
        for (name, value) in payload.text_parts() {
            form = form.text(name.to_string(), value.to_string());
        }

        if let Some(attachment) = attachment {
            let part = Part::bytes(attachment.bytes)
                .file_name(attachment.file_name)
                .mime_str(mime::APPLICATION_PDF.as_ref())?;
            form = form.part("pdf", part);
        }

        let response = self
            .http
            .post(&self.formulation_url)
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            info!(curp = %payload.curp(), "registration accepted");
            return Ok(());
        }

        let reason = status.canonical_reason().unwrap_or("").to_string();
        let body = response.bytes().await.unwrap_or_default();
        let message = rejection_message(status.as_u16(), &reason, &body);
        warn!(status = status.as_u16(), %message, "registration rejected");

        Err(ClientError::Rejected {
            status: status.as_u16(),
            message,
        })
    }
}

#[async_trait]
impl RecordSource for PortalClient {
    async fn fetch_records(&self) -> Result<Vec<CandidateRecord>, ClientError> {
        let response = self
            .http
            .get(&self.formulation_url)
            .send()
            .await
            .map_err(|err| {
                warn!(error = %err, url = %self.formulation_url, "record fetch failed");
                ClientError::LoadFailed {
                    status: err.status().map(|status| status.as_u16()),
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            warn!(status = status.as_u16(), "record fetch returned an error status");
            return Err(ClientError::LoadFailed {
                status: Some(status.as_u16()),
            });
        }

        let body = response.bytes().await?;
        let records = decode_records(&body)?;
        debug!(count = records.len(), "fetched candidate records");
        Ok(records)
    }
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: Option<String>,
}

/// Message shown for a rejected submission: the body's `error` field, a generic message when
/// the JSON has none, or `"<status> <reason>"` when the body is not JSON at all.
pub fn rejection_message(status: u16, reason: &str, body: &[u8]) -> String {
    match serde_json::from_slice::<ErrorBody>(body) {
        Ok(ErrorBody {
            error: Some(message),
        }) if !message.trim().is_empty() => message,
        Ok(_) => FALLBACK_REJECTION.to_string(),
        Err(_) => format!("{status} {reason}").trim_end().to_string(),
    }
}
