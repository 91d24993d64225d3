use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// A stored resume as returned by the Resource API.
///
/// `data` holds the free-form section tree authored in the dashboard form;
/// only the renderer interprets it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResumeRecord {
    pub id: Uuid,
    pub title: String,
    /// Name of the visual theme the preview renders with.
    #[serde(default = "default_theme")]
    pub theme: String,
    #[serde(default)]
    pub data: Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Body for creating or replacing a resume.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResumeDraft {
    pub title: String,
    pub theme: String,
    pub data: Value,
}

fn default_theme() -> String {
    "classic".to_string()
}
