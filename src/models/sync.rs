use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncStatus {
    Running,
    Success,
    Partial,
    Error,
}

impl SyncStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncStatus::Running => "running",
            SyncStatus::Success => "success",
            SyncStatus::Partial => "partial",
            SyncStatus::Error => "error",
        }
    }
}

/// Append-only record of one pipeline run.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct SyncLog {
    pub id: Uuid,
    pub sync_type: String,
    pub status: String,
    pub records_synced: i32,
    pub records_failed: i32,
    pub error_message: Option<String>,
    pub metadata: serde_json::Value,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct SyncLogQuery {
    #[validate(range(min = 1, max = 100))]
    pub limit: Option<i64>,
    #[validate(range(min = 0))]
    pub offset: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct SyncLogListResponse {
    pub logs: Vec<SyncLog>,
    pub total: usize,
}
