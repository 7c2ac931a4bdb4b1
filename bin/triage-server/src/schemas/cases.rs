use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::entities::CaseRecord;

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CaseResponse {
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
    pub tags: Vec<String>,
    pub reported_at: String,
    pub created_at: String,
}

/// Query parameters for `GET /api/analysis-cases`.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct CaseListParams {
    pub customer: Option<String>,
    pub product_model: Option<String>,
    pub defect_type: Option<String>,
    pub search: Option<String>,
    pub limit: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SimilarCasesRequest {
    #[serde(default)]
    pub customer: Option<String>,
    #[serde(default)]
    pub product_model: Option<String>,
    #[serde(default)]
    pub defect_type: Option<String>,
    #[serde(default)]
    pub keywords: Option<Vec<String>>,
}

/// Two-phase similarity result: strict matches first, then looser ones with
/// the strict hits filtered out.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SimilarMatchesResponse {
    pub exact_matches: Vec<CaseResponse>,
    pub partial_matches: Vec<CaseResponse>,
    pub total_found: usize,
}

/// Fallback when the request carried no usable terms.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RecentCasesResponse {
    pub similar_cases: Vec<CaseResponse>,
    pub match_type: String,
}

impl CaseRecord {
    pub fn to_response(&self) -> CaseResponse {
        CaseResponse {
            id: self.id.clone(),
            customer: self.customer.clone(),
            product_model: self.product_model.clone(),
            lot_id: self.lot_id.clone(),
            cell_id: self.cell_id.clone(),
            defect_type: self.defect_type.clone(),
            defect_description: self.defect_description.clone(),
            root_cause: self.root_cause.clone(),
            analysis_result: self.analysis_result.clone(),
            corrective_action: self.corrective_action.clone(),
            tags: self.tag_list(),
            reported_at: self.reported_at.to_rfc3339(),
            created_at: self.created_at.to_rfc3339(),
        }
    }
}
