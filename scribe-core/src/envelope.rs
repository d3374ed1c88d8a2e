//! The uniform result shape returned by every gateway call

use serde::{Deserialize, Serialize};

use crate::CrudMode;

/// One fetched row, columns in select order
pub type Row = serde_json::Map<String, serde_json::Value>;

/// Result envelope
///
/// Gateway calls never return `Err`; callers branch on `success` and read
/// `message` for the reason of a failure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub success: bool,
    pub message: String,
    pub data: Vec<Row>,
    pub rows_affected: u64,
    /// Present for INSERT only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_insert_id: Option<u64>,
}

impl Envelope {
    /// An unsuccessful, empty envelope shaped for `mode`
    pub fn for_mode(mode: Option<CrudMode>) -> Self {
        Self {
            last_insert_id: matches!(mode, Some(CrudMode::Insert)).then_some(0),
            ..Self::default()
        }
    }

    /// A failure envelope carrying `message`
    pub fn failure(mode: Option<CrudMode>, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            ..Self::for_mode(mode)
        }
    }

    /// The first fetched row, if any
    pub fn first(&self) -> Option<&Row> {
        self.data.first()
    }
}
