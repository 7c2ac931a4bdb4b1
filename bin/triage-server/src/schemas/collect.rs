//! Views over [`triage_collect`] sessions.
//!
//! The collection state machine itself lives in the `triage-collect` crate;
//! these types only shape its state for the wire.

use serde::{Deserialize, Serialize};
use triage_collect::{AnalysisTarget, CollectSession, StepRecords, StepState};
use utoipa::ToSchema;

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateCollectSessionRequest {
    /// Id of one of the selectable analysis targets.
    pub target_id: String,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct StepToggleRequest {
    pub enabled: bool,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct ConfirmStepRequest {
    #[serde(default)]
    pub comment: Option<String>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RestartCollectRequest {
    pub target_id: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ContextResponse {
    /// The assembled analysis context, ready to submit as a system turn.
    pub context: String,
}

/// Full session view: phase, target, per-step progress, and the records of
/// the step currently on screen.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CollectSessionResponse {
    pub session_id: String,
    /// `"init"`, a step name, or `"final_review"`.
    pub phase: String,
    #[schema(value_type = Object)]
    pub target: AnalysisTarget,
    pub steps: Vec<StepView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub current_records: Option<StepRecords>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StepView {
    pub step: String,
    pub label: String,
    pub description: String,
    pub enabled: bool,
    pub confirmed: bool,
    pub skipped: bool,
    pub comment: Option<String>,
    /// How many records the step fetched; absent until the step is entered.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record_count: Option<usize>,
}

impl StepView {
    fn from_state(state: &StepState) -> Self {
        Self {
            step: state.step.to_string(),
            label: state.step.label().to_string(),
            description: state.step.description().to_string(),
            enabled: state.enabled,
            confirmed: state.confirmed,
            skipped: state.skipped,
            comment: state.comment.clone(),
            record_count: state.records.as_ref().map(|r| r.len()),
        }
    }
}

impl CollectSessionResponse {
    pub fn from_session(id: &str, session: &CollectSession) -> Self {
        Self {
            session_id: id.to_string(),
            phase: session.phase().name(),
            target: session.target().clone(),
            steps: session.steps().iter().map(StepView::from_state).collect(),
            current_records: session.current_records().cloned(),
        }
    }
}
