use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

/// A saved single-file web program.
///
/// Wire names are camelCase so records round-trip with the JSON the
/// original frontend persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Program {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Full HTML document text.
    pub content: String,
    /// Creation time, epoch milliseconds.
    pub created_at: i64,
    /// Last save time, epoch milliseconds.
    pub updated_at: i64,
}

impl Program {
    /// Creates a new program with a fresh id and current timestamps.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        content: impl Into<String>,
        description: Option<String>,
    ) -> Self {
        let now = current_epoch_ms();
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            description,
            content: content.into(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// Current wall-clock time as epoch milliseconds.
#[must_use]
pub fn current_epoch_ms() -> i64 {
    let now = OffsetDateTime::now_utc();
    i64::try_from(now.unix_timestamp_nanos() / 1_000_000).unwrap_or(i64::MAX)
}
