//! Record shapes for every data source a collection step can pull from.
//!
//! Field names serialize in camelCase — the step payloads go to browser
//! clients verbatim.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// The defect under investigation: the identifiers every step filter keys on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisTarget {
    pub id: String,
    pub customer: String,
    pub product_model: String,
    pub lot_id: String,
    pub cell_id: String,
    pub defect_type: String,
    pub defect_description: String,
    pub registered_at: DateTime<Utc>,
}

// ── ERP ────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErpShipment {
    pub shipment_id: String,
    pub shipment_date: NaiveDate,
    pub customer: String,
    pub product_model: String,
    pub shipment_lot_id: String,
    pub quantity: u32,
    pub destination: String,
    pub invoice_no: String,
    pub po_number: String,
    pub status: String,
}

// ── MES ────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MesProduction {
    pub production_id: String,
    pub production_date: NaiveDate,
    pub production_lot_id: String,
    pub product_model: String,
    pub line_id: String,
    pub line_name: String,
    pub shift_type: String,
    pub planned_qty: u32,
    pub actual_qty: u32,
    pub good_qty: u32,
    pub defect_qty: u32,
    pub yield_rate: f64,
    pub start_time: String,
    pub end_time: String,
    pub operator: String,
    pub supervisor: String,
}

// ── LOT tracking ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProcessResult {
    Pass,
    Fail,
    Rework,
}

/// One process station a LOT passed through.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessStep {
    pub step_no: u32,
    pub process_name: String,
    pub process_id: String,
    pub start_time: NaiveDateTime,
    pub end_time: NaiveDateTime,
    pub equipment_id: String,
    pub equipment_name: String,
    pub operator: String,
    pub result: ProcessResult,
    /// Free-form process parameters (name → value), source-system specific.
    pub parameters: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LotTracking {
    pub tracking_id: String,
    pub shipment_lot_id: String,
    pub production_lot_id: String,
    pub inspection_lot_id: String,
    pub material_lot_ids: Vec<String>,
    pub process_flow: Vec<ProcessStep>,
}

// ── Quality inspection ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ItemResult {
    Ok,
    Ng,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InspectionResult {
    Pass,
    Fail,
    Conditional,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InspectionItem {
    pub item_name: String,
    pub standard: String,
    pub measured_value: String,
    pub result: ItemResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remarks: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QualityInspection {
    pub inspection_id: String,
    pub inspection_lot_id: String,
    pub inspection_type: String,
    pub inspection_date: NaiveDate,
    pub inspector_id: String,
    pub inspector_name: String,
    pub sample_size: u32,
    pub pass_qty: u32,
    pub fail_qty: u32,
    pub result: InspectionResult,
    pub inspection_items: Vec<InspectionItem>,
}

// ── Defect history ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    Critical,
    Major,
    Minor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DefectStatus {
    Open,
    Analyzing,
    Resolved,
    Closed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DefectRecord {
    pub defect_id: String,
    pub detection_date: NaiveDate,
    pub lot_id: String,
    pub cell_id: String,
    pub defect_type: String,
    pub defect_code: String,
    pub defect_location: String,
    pub severity: Severity,
    pub detected_by: String,
    pub detection_stage: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub root_cause: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub corrective_action: Option<String>,
    pub status: DefectStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

// ── Process equipment ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaintenanceRecord {
    pub maintenance_id: String,
    pub maintenance_date: NaiveDate,
    pub maintenance_type: String,
    pub description: String,
    pub technician: String,
    /// Minutes the equipment was held for this maintenance.
    pub duration: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParameterStatus {
    Normal,
    Warning,
    Alarm,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParameterLogEntry {
    pub timestamp: NaiveDateTime,
    pub parameter_name: String,
    pub set_value: f64,
    pub actual_value: f64,
    pub unit: String,
    pub status: ParameterStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EquipmentRecord {
    pub equipment_id: String,
    pub equipment_name: String,
    pub equipment_type: String,
    pub process_id: String,
    pub process_name: String,
    pub operation_date: NaiveDate,
    /// Hours in each state over the operation date.
    pub running_time: f64,
    pub idle_time: f64,
    pub down_time: f64,
    pub maintenance_history: Vec<MaintenanceRecord>,
    pub parameter_log: Vec<ParameterLogEntry>,
}

// ── Development history ────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DevelopmentRecord {
    pub development_id: String,
    pub product_model: String,
    pub version: String,
    pub development_date: NaiveDate,
    pub engineer: String,
    pub change_type: String,
    pub description: String,
    pub related_documents: Vec<String>,
    pub test_results: String,
    pub approval_status: String,
}

// ── Tests ──────────────────────────────────────────────────────────────────────
