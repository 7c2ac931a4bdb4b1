//! Rendering of the final context document.
//!
//! The document is the hand-off artifact of a collection session: one
//! markdown block with the target identity, a section per confirmed step
//! summarising its records, the analyst's comments, and a list of whatever
//! was skipped. Chat clients send it as the system-context preamble of the
//! first exchange with the analysis model.

use std::fmt::Write;

use crate::data::*;
use crate::session::{StepRecords, StepState};

/// Render the document for a finished session.
pub fn render(target: &AnalysisTarget, steps: &[StepState]) -> String {
    let mut doc = String::new();

    let _ = writeln!(doc, "# Quality analysis data package");
    let _ = writeln!(doc);
    let _ = writeln!(doc, "Target: {}", target.id);
    let _ = writeln!(doc, "Customer: {}", target.customer);
    let _ = writeln!(doc, "Product model: {}", target.product_model);
    let _ = writeln!(doc, "LOT: {}", target.lot_id);
    let _ = writeln!(doc, "Cell: {}", target.cell_id);
    let _ = writeln!(doc, "Defect type: {}", target.defect_type);
    let _ = writeln!(doc, "Description: {}", target.defect_description);

    for state in steps {
        if !state.confirmed || state.skipped {
            continue;
        }
        let _ = writeln!(doc);
        let _ = writeln!(doc, "## {}", state.step.label());
        let _ = writeln!(doc);
        match &state.records {
            Some(records) if !records.is_empty() => render_records(&mut doc, records),
            _ => {
                let _ = writeln!(doc, "No matching records.");
            }
        }
        if let Some(comment) = &state.comment {
            let _ = writeln!(doc);
            let _ = writeln!(doc, "[User comment] {comment}");
        }
    }

    let skipped: Vec<&StepState> = steps
        .iter()
        .filter(|s| s.skipped || !s.enabled)
        .collect();
    if !skipped.is_empty() {
        let _ = writeln!(doc);
        let _ = writeln!(doc, "## Skipped sources");
        let _ = writeln!(doc);
        for state in skipped {
            let _ = writeln!(doc, "- {}", state.step.label());
        }
    }

    doc
}

fn render_records(doc: &mut String, records: &StepRecords) {
    match records {
        StepRecords::ErpShipment(list) => {
            for s in list {
                let _ = writeln!(
                    doc,
                    "- {} | {} | {} | {} | {} | qty {} | {} | {}",
                    s.shipment_id,
                    s.shipment_date,
                    s.customer,
                    s.product_model,
                    s.shipment_lot_id,
                    s.quantity,
                    s.destination,
                    s.status
                );
            }
        }
        StepRecords::MesProduction(list) => {
            for p in list {
                let _ = writeln!(
                    doc,
                    "- {} | {} | {} | {} {} | planned {} / actual {} / good {} / defect {} | yield {:.1}% | {}-{}",
                    p.production_id,
                    p.production_date,
                    p.product_model,
                    p.line_id,
                    p.line_name,
                    p.planned_qty,
                    p.actual_qty,
                    p.good_qty,
                    p.defect_qty,
                    p.yield_rate,
                    p.start_time,
                    p.end_time
                );
            }
        }
        StepRecords::LotTracking(list) => {
            for t in list {
                let _ = writeln!(
                    doc,
                    "- {}: shipment {} <- production {} <- inspection {} | materials: {}",
                    t.tracking_id,
                    t.shipment_lot_id,
                    t.production_lot_id,
                    t.inspection_lot_id,
                    t.material_lot_ids.join(", ")
                );
                for step in &t.process_flow {
                    let _ = writeln!(
                        doc,
                        "  {}. {} on {} ({}) by {} -> {:?}",
                        step.step_no,
                        step.process_name,
                        step.equipment_name,
                        step.equipment_id,
                        step.operator,
                        step.result
                    );
                }
            }
        }
        StepRecords::QualityInspection(list) => {
            for q in list {
                let _ = writeln!(
                    doc,
                    "- {} | {} {} | {} | sample {} (pass {} / fail {}) -> {:?}",
                    q.inspection_id,
                    q.inspection_type,
                    q.inspection_lot_id,
                    q.inspection_date,
                    q.sample_size,
                    q.pass_qty,
                    q.fail_qty,
                    q.result
                );
                for item in &q.inspection_items {
                    let remark = item
                        .remarks
                        .as_deref()
                        .map(|r| format!(" ({r})"))
                        .unwrap_or_default();
                    let _ = writeln!(
                        doc,
                        "  {}: standard {} measured {} -> {:?}{}",
                        item.item_name, item.standard, item.measured_value, item.result, remark
                    );
                }
            }
        }
        StepRecords::DefectHistory(list) => {
            for defect in list {
                let _ = writeln!(
                    doc,
                    "- {} | {} | {} {} | {} at {} | {:?}/{:?} | detected by {} ({})",
                    defect.defect_id,
                    defect.detection_date,
                    defect.lot_id,
                    defect.cell_id,
                    defect.defect_type,
                    defect.defect_location,
                    defect.severity,
                    defect.status,
                    defect.detected_by,
                    defect.detection_stage
                );
                if let Some(cause) = &defect.root_cause {
                    let _ = writeln!(doc, "  Root cause: {cause}");
                }
                if let Some(action) = &defect.corrective_action {
                    let _ = writeln!(doc, "  Corrective action: {action}");
                }
            }
        }
        StepRecords::ProcessEquipment(list) => {
            for eq in list {
                let _ = writeln!(
                    doc,
                    "- {} {} ({}) | {} | run {:.1}h / idle {:.1}h / down {:.1}h",
                    eq.equipment_id,
                    eq.equipment_name,
                    eq.process_name,
                    eq.operation_date,
                    eq.running_time,
                    eq.idle_time,
                    eq.down_time
                );
                for m in &eq.maintenance_history {
                    let _ = writeln!(
                        doc,
                        "  Maint {} {} ({}): {} [{} min]",
                        m.maintenance_id, m.maintenance_date, m.maintenance_type, m.description, m.duration
                    );
                }
                for p in &eq.parameter_log {
                    if !matches!(p.status, ParameterStatus::Normal) {
                        let _ = writeln!(
                            doc,
                            "  {:?} {} {}: set {} actual {} {}",
                            p.status,
                            p.timestamp,
                            p.parameter_name,
                            p.set_value,
                            p.actual_value,
                            p.unit
                        );
                    }
                }
            }
        }
        StepRecords::DevelopmentHistory(list) => {
            for dev in list {
                let _ = writeln!(
                    doc,
                    "- {} | {} {} | {} | {} by {}: {} [{}]",
                    dev.development_id,
                    dev.product_model,
                    dev.version,
                    dev.development_date,
                    dev.change_type,
                    dev.engineer,
                    dev.description,
                    dev.approval_status
                );
                let _ = writeln!(doc, "  Test results: {}", dev.test_results);
            }
        }
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────
