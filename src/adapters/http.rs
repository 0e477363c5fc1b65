//! HTTP token-classification backend.
//!
//! Talks to a HuggingFace-inference-style endpoint: POST the chunk
//! text, receive a JSON array of labeled matches with chunk-local
//! offsets. Wire offsets are never trusted directly; everything goes
//! through the shared resolution step.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::domain::{Chunk, EntityKind, EntitySpan};

use super::{is_placeholder_echo, resolve_detections, Detector, LabelMap, RawDetection};

/// One detection as returned over the wire.
///
/// Field names follow the HuggingFace token-classification schema with
/// aliases for the common variants.
#[derive(Debug, Deserialize)]
struct WireDetection {
    #[serde(alias = "word", default)]
    text: String,

    #[serde(alias = "entity_group", alias = "entity", default)]
    label: String,

    #[serde(default)]
    score: f64,

    #[serde(default)]
    start: usize,

    #[serde(default)]
    end: usize,
}

/// Remote NER backend reachable over HTTP.
pub struct HttpNerDetector {
    name: String,
    endpoint: String,
    labels: LabelMap,
    client: reqwest::Client,
    bearer_token: Option<String>,
    suppress_placeholder_echoes: bool,
}

impl HttpNerDetector {
    /// Create a detector for `endpoint`, normalizing labels via `labels`.
    pub fn new(name: impl Into<String>, endpoint: impl Into<String>, labels: LabelMap) -> Self {
        Self {
            name: name.into(),
            endpoint: endpoint.into(),
            labels,
            client: reqwest::Client::new(),
            bearer_token: None,
            suppress_placeholder_echoes: false,
        }
    }

    /// Label mapping for general-purpose NER models that report
    /// PER/LOC/ORG/MISC/DATE entity groups (camembert-ner-with-dates
    /// and similar).
    pub fn ner_label_map() -> LabelMap {
        LabelMap::new()
            .map("PER", EntityKind::Name)
            .map("LOC", EntityKind::Location)
            .map("ORG", EntityKind::Organization)
            .map("MISC", EntityKind::Misc)
            .map("DATE", EntityKind::Date)
    }

    /// Label mapping for PII-specialized models with fine-grained
    /// labels (piiranha and similar).
    pub fn pii_label_map() -> LabelMap {
        LabelMap::new()
            .map("GIVENNAME", EntityKind::Name)
            .map("SURNAME", EntityKind::Name)
            .map("TELEPHONENUM", EntityKind::Phone)
            .map("EMAIL", EntityKind::Email)
            .map("DATEOFBIRTH", EntityKind::Date)
            .map("SOCIALNUM", EntityKind::Id)
            .map("DRIVERLICENSENUM", EntityKind::Id)
            .map("IDCARDNUM", EntityKind::Id)
            .map("STREET", EntityKind::Address)
            .map("BUILDINGNUM", EntityKind::Address)
            .map("ZIPCODE", EntityKind::Address)
            .map("CITY", EntityKind::Location)
            .map("COUNTRY", EntityKind::Location)
    }

    /// Authenticate requests with a bearer token
    pub fn with_bearer_token(mut self, token: impl Into<String>) -> Self {
        self.bearer_token = Some(token.into());
        self
    }

    /// Drop detections that are echoes of placeholder tokens, so that
    /// feeding already redacted text back through the pipeline does not
    /// re-tag the markers.
    pub fn with_placeholder_suppression(mut self) -> Self {
        self.suppress_placeholder_echoes = true;
        self
    }

    async fn call_backend(&self, text: &str) -> Result<Vec<WireDetection>> {
        let mut request = self.client.post(&self.endpoint).json(&json!({ "inputs": text }));

        if let Some(ref token) = self.bearer_token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .with_context(|| format!("Request to '{}' failed", self.name))?
            .error_for_status()
            .with_context(|| format!("Backend '{}' returned an error status", self.name))?;

        response
            .json::<Vec<WireDetection>>()
            .await
            .with_context(|| format!("Backend '{}' returned malformed JSON", self.name))
    }

    /// Check that the backend is reachable and answers
    pub async fn health_check(&self) -> Result<()> {
        self.call_backend("ping").await?;
        Ok(())
    }
}

#[async_trait]
impl Detector for HttpNerDetector {
    fn name(&self) -> &str {
        &self.name
    }

    async fn detect(&self, chunk: &Chunk) -> Result<Vec<EntitySpan>> {
        let wire = self.call_backend(&chunk.text).await?;

        debug!(
            detector = %self.name,
            chunk = chunk.index,
            raw = wire.len(),
            "Backend responded"
        );

        let raw: Vec<RawDetection> = wire
            .into_iter()
            .filter(|d| !(self.suppress_placeholder_echoes && is_placeholder_echo(&d.text)))
            .map(|d| RawDetection {
                text: d.text,
                label: d.label,
                score: d.score,
                start: d.start,
                end: d.end,
            })
            .collect();

        Ok(resolve_detections(chunk, raw, &self.labels, &self.name))
    }
}
