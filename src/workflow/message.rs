use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::dom::dom_model::Document;
use crate::error::{FormSnapshotError, Result};
use crate::fill::fill::FillSession;
use crate::snapshot::snapshot_model::{FieldData, FieldValue, SelectorEntry};
use crate::workflow::context::PageContext;
use crate::workflow::save::{SaveOutcome, manual_save};

/// Messages a page receives from the extension shell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Request {
    FillForm {
        #[serde(default, deserialize_with = "lenient_data")]
        data: FieldData,
        #[serde(default, deserialize_with = "lenient_selectors")]
        selectors: Vec<SelectorEntry>,
    },
    ManualSaveTrigger,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AckStatus {
    Success,
}

/// Immediate reply to `fill_form`; sent before the fill has finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ack {
    pub status: AckStatus,
}

impl Ack {
    pub fn success() -> Self {
        Ack {
            status: AckStatus::Success,
        }
    }
}

#[derive(Debug)]
pub enum Response {
    /// Attempt 0 has run; the caller's timer drives `session` from here on.
    Filling { ack: Ack, session: FillSession },
    Save(SaveOutcome),
    /// The site is not enabled.
    Inactive,
}

pub fn parse_request(json: &str) -> Result<Request> {
    serde_json::from_str(json).map_err(|e| FormSnapshotError::json_parse("request", e))
}

pub fn handle_request(doc: &mut Document, request: Request, page: &mut PageContext) -> Result<Response> {
    if !page.is_active() {
        debug!(hostname = %page.hostname, "site not enabled, ignoring request");
        return Ok(Response::Inactive);
    }

    match request {
        Request::FillForm { data, selectors } => {
            debug!(fields = data.len(), hints = selectors.len(), "fill requested");
            let session = FillSession::start(doc, data, &selectors, page.fill);
            Ok(Response::Filling {
                ack: Ack::success(),
                session,
            })
        }
        Request::ManualSaveTrigger => manual_save(doc, page).map(Response::Save),
    }
}

fn lenient_data<'de, D>(deserializer: D) -> std::result::Result<FieldData, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(value
        .as_object()
        .map(|map| {
            map.iter()
                .map(|(k, v)| (k.clone(), FieldValue::from_value_lossy(v)))
                .collect()
        })
        .unwrap_or_default())
}

/// Anything but an array is ignored, as are entries missing `key` or `selector`.
fn lenient_selectors<'de, D>(deserializer: D) -> std::result::Result<Vec<SelectorEntry>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(value
        .as_array()
        .map(|entries| {
            entries
                .iter()
                .filter_map(|e| serde_json::from_value::<SelectorEntry>(e.clone()).ok())
                .filter(|e| !e.key.is_empty() && !e.selector.is_empty())
                .collect()
        })
        .unwrap_or_default())
}
