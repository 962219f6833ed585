//! Activation handshake and selection reporting.
//!
//! An opener (the window that asked for a pick) enables Select mode either
//! by message or through query parameters, and receives an
//! `ELEMENT_SELECTED` report once the operator confirms a node.

use crate::ElementInfo;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;

/// Messages accepted from the opener
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum OpenerMessage {
    #[serde(rename = "ENABLE_SELECTOR", rename_all = "camelCase")]
    EnableSelector {
        #[serde(default)]
        return_url: Option<String>,
        #[serde(default)]
        step_index: Option<u32>,
    },
}

impl OpenerMessage {
    pub fn from_json(raw: &str) -> Result<Self> {
        serde_json::from_str(raw).context("Failed to parse opener message")
    }
}

/// Where to report a pick and which step it belongs to
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ActivationRequest {
    pub return_url: Option<String>,
    pub step_index: Option<u32>,
}

impl ActivationRequest {
    /// Read `enableSelector=1&returnUrl=…&stepIndex=…` from a page URL
    ///
    /// Returns `None` when the flag is absent or not `1`.
    pub fn from_url(raw: &str) -> Result<Option<Self>> {
        let url = Url::parse(raw).with_context(|| format!("Invalid page URL: {}", raw))?;
        Ok(Self::from_pairs(url.query_pairs()))
    }

    /// Same as [`ActivationRequest::from_url`] for a bare query string
    pub fn from_query(query: &str) -> Option<Self> {
        let query = query.strip_prefix('?').unwrap_or(query);
        Self::from_pairs(url::form_urlencoded::parse(query.as_bytes()))
    }

    fn from_pairs<'a>(
        pairs: impl Iterator<Item = (std::borrow::Cow<'a, str>, std::borrow::Cow<'a, str>)>,
    ) -> Option<Self> {
        let mut enabled = false;
        let mut request = ActivationRequest::default();
        for (key, value) in pairs {
            match key.as_ref() {
                "enableSelector" => enabled = value == "1",
                "returnUrl" if !value.is_empty() => request.return_url = Some(value.into_owned()),
                "stepIndex" => request.step_index = value.parse().ok(),
                _ => {}
            }
        }
        enabled.then_some(request)
    }
}

impl From<OpenerMessage> for ActivationRequest {
    fn from(message: OpenerMessage) -> Self {
        match message {
            OpenerMessage::EnableSelector {
                return_url,
                step_index,
            } => ActivationRequest {
                return_url,
                step_index,
            },
        }
    }
}

/// Payload of a confirmed pick
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionReport {
    pub selector: String,
    pub stable_id: Option<String>,
    pub step_index: Option<u32>,
    pub element_info: ElementInfo,
}

/// Messages sent to the opener
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum OutboundMessage {
    #[serde(rename = "SELECTOR_READY")]
    SelectorReady,
    #[serde(rename = "ELEMENT_SELECTED")]
    ElementSelected(SelectionReport),
}

impl OutboundMessage {
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).context("Failed to serialize opener message")
    }
}

/// Record persisted so a reopened host page can recover the last pick
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredSelection {
    pub selector: String,
    pub stable_id: Option<String>,
    pub step_index: Option<u32>,
    pub return_url: Option<String>,
    pub selected_at: DateTime<Utc>,
}

impl StoredSelection {
    pub fn from_report(report: &SelectionReport, request: &ActivationRequest) -> Self {
        Self {
            selector: report.selector.clone(),
            stable_id: report.stable_id.clone(),
            step_index: report.step_index,
            return_url: request.return_url.clone(),
            selected_at: Utc::now(),
        }
    }
}

/// The window that requested a pick
pub trait OpenerChannel {
    fn post(&mut self, message: &OutboundMessage) -> Result<()>;
}

/// Opener that keeps every message it receives
#[derive(Debug, Default, Clone)]
pub struct RecordingOpener {
    messages: Vec<OutboundMessage>,
}

impl RecordingOpener {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> &[OutboundMessage] {
        &self.messages
    }

    pub fn last_report(&self) -> Option<&SelectionReport> {
        self.messages.iter().rev().find_map(|m| match m {
            OutboundMessage::ElementSelected(report) => Some(report),
            OutboundMessage::SelectorReady => None,
        })
    }
}

impl OpenerChannel for RecordingOpener {
    fn post(&mut self, message: &OutboundMessage) -> Result<()> {
        tracing::debug!(payload = %message.to_json()?, "opener message");
        self.messages.push(message.clone());
        Ok(())
    }
}
