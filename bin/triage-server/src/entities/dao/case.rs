use chrono::{DateTime, Utc};

/// A single row in the `analysis_cases` table: one closed (or in-flight)
/// defect investigation, searchable as reference material for new analyses.
///
/// Wide table, so the row is decoded with `sqlx::FromRow` instead of the
/// hand-mapped tuples used for the narrow chat tables.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CaseRecord {
    pub id: String,
    pub customer: String,
    pub product_model: String,
    pub lot_id: Option<String>,
    pub cell_id: Option<String>,
    pub defect_type: String,
    pub defect_description: String,
    pub root_cause: Option<String>,
    pub analysis_result: Option<String>,
    pub corrective_action: Option<String>,
    /// JSON-encoded string array.
    pub tags: String,
    pub reported_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl CaseRecord {
    /// Decoded tag list; a malformed tags column yields an empty list.
    pub fn tag_list(&self) -> Vec<String> {
        serde_json::from_str(&self.tags).unwrap_or_default()
    }
}
