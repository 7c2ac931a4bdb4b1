//! The in-memory table set collection steps pull from, plus the per-step
//! filter rules.
//!
//! Filters mirror how the source systems are keyed: ERP by shipment LOT, MES
//! and development history by product model, defect history by cell or defect
//! type. LOT tracking, quality and equipment extracts are small enough that
//! the full table is returned and the analyst prunes by eye.

use chrono::{NaiveDate, NaiveDateTime, Utc};
use serde_json::json;

use crate::data::*;

/// Reference tables and the selectable analysis targets.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    pub targets: Vec<AnalysisTarget>,
    pub erp_shipments: Vec<ErpShipment>,
    pub mes_productions: Vec<MesProduction>,
    pub lot_trackings: Vec<LotTracking>,
    pub quality_inspections: Vec<QualityInspection>,
    pub defect_records: Vec<DefectRecord>,
    pub equipment_records: Vec<EquipmentRecord>,
    pub development_records: Vec<DevelopmentRecord>,
}

impl Dataset {
    pub fn target(&self, id: &str) -> Option<&AnalysisTarget> {
        self.targets.iter().find(|t| t.id == id)
    }

    // ── Step filters ──────────────────────────────────────────────────────────

    pub fn erp_for(&self, target: &AnalysisTarget) -> Vec<ErpShipment> {
        self.erp_shipments
            .iter()
            .filter(|s| s.shipment_lot_id == target.lot_id)
            .cloned()
            .collect()
    }

    pub fn mes_for(&self, target: &AnalysisTarget) -> Vec<MesProduction> {
        self.mes_productions
            .iter()
            .filter(|p| p.product_model == target.product_model)
            .cloned()
            .collect()
    }

    pub fn lot_tracking_for(&self, _target: &AnalysisTarget) -> Vec<LotTracking> {
        self.lot_trackings.clone()
    }

    pub fn quality_for(&self, _target: &AnalysisTarget) -> Vec<QualityInspection> {
        self.quality_inspections.clone()
    }

    pub fn defects_for(&self, target: &AnalysisTarget) -> Vec<DefectRecord> {
        self.defect_records
            .iter()
            .filter(|d| d.cell_id == target.cell_id || d.defect_type == target.defect_type)
            .cloned()
            .collect()
    }

    pub fn equipment_for(&self, _target: &AnalysisTarget) -> Vec<EquipmentRecord> {
        self.equipment_records.clone()
    }

    pub fn development_for(&self, target: &AnalysisTarget) -> Vec<DevelopmentRecord> {
        self.development_records
            .iter()
            .filter(|d| d.product_model == target.product_model)
            .cloned()
            .collect()
    }

    /// The built-in reference dataset: three investigation targets with
    /// cross-referenced records in every table.
    pub fn builtin() -> Self {
        Self {
            targets: builtin_targets(),
            erp_shipments: builtin_erp(),
            mes_productions: builtin_mes(),
            lot_trackings: builtin_lots(),
            quality_inspections: builtin_quality(),
            defect_records: builtin_defects(),
            equipment_records: builtin_equipment(),
            development_records: builtin_development(),
        }
    }
}

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).expect("valid builtin date")
}

fn ts(y: i32, m: u32, day: u32, h: u32, min: u32) -> NaiveDateTime {
    d(y, m, day).and_hms_opt(h, min, 0).expect("valid builtin time")
}

fn builtin_targets() -> Vec<AnalysisTarget> {
    vec![
        AnalysisTarget {
            id: "TGT-2024-001".into(),
            customer: "Apple".into(),
            product_model: "OLED_67_FHD".into(),
            lot_id: "LOT20241203001".into(),
            cell_id: "CELL-1203-0047".into(),
            defect_type: "Mura".into(),
            defect_description: "Cluster mura in the upper-left quadrant after reliability test"
                .into(),
            registered_at: "2024-12-06T09:15:00Z".parse().unwrap_or_else(|_| Utc::now()),
        },
        AnalysisTarget {
            id: "TGT-2024-002".into(),
            customer: "Dell".into(),
            product_model: "AMOLED_55_4K".into(),
            lot_id: "LOT20241204001".into(),
            cell_id: "CELL-1204-0112".into(),
            defect_type: "Bright Dot".into(),
            defect_description: "Single always-on sub-pixel reported from incoming inspection"
                .into(),
            registered_at: "2024-12-07T14:40:00Z".parse().unwrap_or_else(|_| Utc::now()),
        },
        AnalysisTarget {
            id: "TGT-2024-003".into(),
            customer: "Sony".into(),
            product_model: "OLED_77_8K".into(),
            lot_id: "LOT20241205001".into(),
            cell_id: "CELL-1205-0009".into(),
            defect_type: "Line Defect".into(),
            defect_description: "Intermittent horizontal line at mid-grey, field return".into(),
            registered_at: "2024-12-09T08:05:00Z".parse().unwrap_or_else(|_| Utc::now()),
        },
    ]
}

fn builtin_erp() -> Vec<ErpShipment> {
    vec![
        ErpShipment {
            shipment_id: "SHP-2024-12-001".into(),
            shipment_date: d(2024, 12, 3),
            customer: "Apple".into(),
            product_model: "OLED_67_FHD".into(),
            shipment_lot_id: "LOT20241203001".into(),
            quantity: 1200,
            destination: "Austin DC".into(),
            invoice_no: "INV-88123".into(),
            po_number: "PO-55210".into(),
            status: "SHIPPED".into(),
        },
        ErpShipment {
            shipment_id: "SHP-2024-12-002".into(),
            shipment_date: d(2024, 12, 4),
            customer: "Dell".into(),
            product_model: "AMOLED_55_4K".into(),
            shipment_lot_id: "LOT20241204001".into(),
            quantity: 800,
            destination: "Juarez Plant 2".into(),
            invoice_no: "INV-88157".into(),
            po_number: "PO-55433".into(),
            status: "SHIPPED".into(),
        },
        ErpShipment {
            shipment_id: "SHP-2024-12-003".into(),
            shipment_date: d(2024, 12, 5),
            customer: "Sony".into(),
            product_model: "OLED_77_8K".into(),
            shipment_lot_id: "LOT20241205001".into(),
            quantity: 150,
            destination: "Inazawa TV Works".into(),
            invoice_no: "INV-88192".into(),
            po_number: "PO-55518".into(),
            status: "IN_TRANSIT".into(),
        },
    ]
}

fn builtin_mes() -> Vec<MesProduction> {
    vec![
        MesProduction {
            production_id: "PRD-2024-1201-A".into(),
            production_date: d(2024, 12, 1),
            production_lot_id: "PLOT20241201A".into(),
            product_model: "OLED_67_FHD".into(),
            line_id: "L1".into(),
            line_name: "Module line 1".into(),
            shift_type: "DAY".into(),
            planned_qty: 1300,
            actual_qty: 1285,
            good_qty: 1248,
            defect_qty: 37,
            yield_rate: 97.1,
            start_time: "08:00".into(),
            end_time: "20:00".into(),
            operator: "D. Park".into(),
            supervisor: "H. Meyer".into(),
        },
        MesProduction {
            production_id: "PRD-2024-1202-A".into(),
            production_date: d(2024, 12, 2),
            production_lot_id: "PLOT20241202A".into(),
            product_model: "AMOLED_55_4K".into(),
            line_id: "L2".into(),
            line_name: "Module line 2".into(),
            shift_type: "NIGHT".into(),
            planned_qty: 900,
            actual_qty: 860,
            good_qty: 851,
            defect_qty: 9,
            yield_rate: 99.0,
            start_time: "20:00".into(),
            end_time: "08:00".into(),
            operator: "M. Silva".into(),
            supervisor: "H. Meyer".into(),
        },
        MesProduction {
            production_id: "PRD-2024-1203-B".into(),
            production_date: d(2024, 12, 3),
            production_lot_id: "PLOT20241203B".into(),
            product_model: "OLED_77_8K".into(),
            line_id: "L4".into(),
            line_name: "Large-panel line".into(),
            shift_type: "DAY".into(),
            planned_qty: 180,
            actual_qty: 176,
            good_qty: 168,
            defect_qty: 8,
            yield_rate: 95.5,
            start_time: "08:00".into(),
            end_time: "20:00".into(),
            operator: "J. Okafor".into(),
            supervisor: "S. Tanaka".into(),
        },
    ]
}

fn builtin_lots() -> Vec<LotTracking> {
    vec![
        LotTracking {
            tracking_id: "TRK-20241203-001".into(),
            shipment_lot_id: "LOT20241203001".into(),
            production_lot_id: "PLOT20241201A".into(),
            inspection_lot_id: "ILOT20241202A".into(),
            material_lot_ids: vec!["MLOT-GLS-8841".into(), "MLOT-OLE-2217".into()],
            process_flow: vec![
                ProcessStep {
                    step_no: 1,
                    process_name: "TFT deposition".into(),
                    process_id: "P-TFT".into(),
                    start_time: ts(2024, 11, 29, 6, 10),
                    end_time: ts(2024, 11, 29, 11, 45),
                    equipment_id: "EQ-TFT-03".into(),
                    equipment_name: "Sputter 03".into(),
                    operator: "K. Novak".into(),
                    result: ProcessResult::Pass,
                    parameters: json!({ "chamberTemp": 245, "pressure": 0.42 }),
                },
                ProcessStep {
                    step_no: 2,
                    process_name: "OLED evaporation".into(),
                    process_id: "P-EVP".into(),
                    start_time: ts(2024, 11, 30, 2, 0),
                    end_time: ts(2024, 11, 30, 9, 30),
                    equipment_id: "EQ-EVP-01".into(),
                    equipment_name: "Evaporator 01".into(),
                    operator: "D. Park".into(),
                    result: ProcessResult::Pass,
                    parameters: json!({ "rateAps": 1.8, "vacuum": 2.1e-7 }),
                },
                ProcessStep {
                    step_no: 3,
                    process_name: "Encapsulation".into(),
                    process_id: "P-ENC".into(),
                    start_time: ts(2024, 11, 30, 13, 20),
                    end_time: ts(2024, 11, 30, 16, 0),
                    equipment_id: "EQ-ENC-02".into(),
                    equipment_name: "TFE coater 02".into(),
                    operator: "M. Silva".into(),
                    result: ProcessResult::Rework,
                    parameters: json!({ "layerCount": 3, "n2Flow": 120 }),
                },
                ProcessStep {
                    step_no: 4,
                    process_name: "Module assembly".into(),
                    process_id: "P-MOD".into(),
                    start_time: ts(2024, 12, 1, 8, 5),
                    end_time: ts(2024, 12, 1, 19, 40),
                    equipment_id: "EQ-MOD-11".into(),
                    equipment_name: "Bonder 11".into(),
                    operator: "J. Okafor".into(),
                    result: ProcessResult::Pass,
                    parameters: json!({ "bondForce": 35, "alignTolUm": 4 }),
                },
            ],
        },
        LotTracking {
            tracking_id: "TRK-20241204-001".into(),
            shipment_lot_id: "LOT20241204001".into(),
            production_lot_id: "PLOT20241202A".into(),
            inspection_lot_id: "ILOT20241203A".into(),
            material_lot_ids: vec!["MLOT-GLS-8850".into(), "MLOT-OLE-2224".into()],
            process_flow: vec![
                ProcessStep {
                    step_no: 1,
                    process_name: "TFT deposition".into(),
                    process_id: "P-TFT".into(),
                    start_time: ts(2024, 12, 1, 5, 30),
                    end_time: ts(2024, 12, 1, 10, 50),
                    equipment_id: "EQ-TFT-01".into(),
                    equipment_name: "Sputter 01".into(),
                    operator: "K. Novak".into(),
                    result: ProcessResult::Pass,
                    parameters: json!({ "chamberTemp": 243, "pressure": 0.44 }),
                },
                ProcessStep {
                    step_no: 2,
                    process_name: "OLED evaporation".into(),
                    process_id: "P-EVP".into(),
                    start_time: ts(2024, 12, 1, 22, 10),
                    end_time: ts(2024, 12, 2, 5, 25),
                    equipment_id: "EQ-EVP-02".into(),
                    equipment_name: "Evaporator 02".into(),
                    operator: "M. Silva".into(),
                    result: ProcessResult::Pass,
                    parameters: json!({ "rateAps": 1.7, "vacuum": 1.9e-7 }),
                },
            ],
        },
    ]
}

fn builtin_quality() -> Vec<QualityInspection> {
    vec![
        QualityInspection {
            inspection_id: "INSP-2024-1202-A".into(),
            inspection_lot_id: "ILOT20241202A".into(),
            inspection_type: "OQC".into(),
            inspection_date: d(2024, 12, 2),
            inspector_id: "QA-214".into(),
            inspector_name: "R. Fischer".into(),
            sample_size: 125,
            pass_qty: 123,
            fail_qty: 2,
            result: InspectionResult::Conditional,
            inspection_items: vec![
                InspectionItem {
                    item_name: "Luminance uniformity".into(),
                    standard: ">= 92 %".into(),
                    measured_value: "90.4 %".into(),
                    result: ItemResult::Ng,
                    remarks: Some("Two panels below floor; waived for B-grade".into()),
                },
                InspectionItem {
                    item_name: "Color coordinates".into(),
                    standard: "Δu'v' <= 0.004".into(),
                    measured_value: "0.003".into(),
                    result: ItemResult::Ok,
                    remarks: None,
                },
                InspectionItem {
                    item_name: "Dark spot count".into(),
                    standard: "0".into(),
                    measured_value: "0".into(),
                    result: ItemResult::Ok,
                    remarks: None,
                },
            ],
        },
        QualityInspection {
            inspection_id: "INSP-2024-1203-A".into(),
            inspection_lot_id: "ILOT20241203A".into(),
            inspection_type: "IQC".into(),
            inspection_date: d(2024, 12, 3),
            inspector_id: "QA-108".into(),
            inspector_name: "A. Costa".into(),
            sample_size: 80,
            pass_qty: 80,
            fail_qty: 0,
            result: InspectionResult::Pass,
            inspection_items: vec![InspectionItem {
                item_name: "Bright dot count".into(),
                standard: "0".into(),
                measured_value: "0".into(),
                result: ItemResult::Ok,
                remarks: None,
            }],
        },
    ]
}

fn builtin_defects() -> Vec<DefectRecord> {
    vec![
        DefectRecord {
            defect_id: "DEF-2024-0981".into(),
            detection_date: d(2024, 12, 5),
            lot_id: "LOT20241203001".into(),
            cell_id: "CELL-1203-0047".into(),
            defect_type: "Mura".into(),
            defect_code: "MUR-03".into(),
            defect_location: "Upper-left quadrant".into(),
            severity: Severity::Major,
            detected_by: "Reliability lab".into(),
            detection_stage: "Post-RA 240h".into(),
            root_cause: None,
            corrective_action: None,
            status: DefectStatus::Analyzing,
            image_url: Some("/defects/DEF-2024-0981.png".into()),
        },
        DefectRecord {
            defect_id: "DEF-2024-0862".into(),
            detection_date: d(2024, 11, 18),
            lot_id: "LOT20241118002".into(),
            cell_id: "CELL-1118-0330".into(),
            defect_type: "Mura".into(),
            defect_code: "MUR-01".into(),
            defect_location: "Center band".into(),
            severity: Severity::Minor,
            detected_by: "OQC".into(),
            detection_stage: "Final inspection".into(),
            root_cause: Some("TFE thickness drift on coater 02".into()),
            corrective_action: Some("Coater 02 nozzle replaced, CpK re-qualified".into()),
            status: DefectStatus::Closed,
            image_url: None,
        },
        DefectRecord {
            defect_id: "DEF-2024-0914".into(),
            detection_date: d(2024, 12, 6),
            lot_id: "LOT20241204001".into(),
            cell_id: "CELL-1204-0112".into(),
            defect_type: "Bright Dot".into(),
            defect_code: "BDT-02".into(),
            defect_location: "x=1820 y=443".into(),
            severity: Severity::Critical,
            detected_by: "Customer IQC".into(),
            detection_stage: "Incoming inspection".into(),
            root_cause: None,
            corrective_action: None,
            status: DefectStatus::Open,
            image_url: None,
        },
        DefectRecord {
            defect_id: "DEF-2024-0755".into(),
            detection_date: d(2024, 10, 30),
            lot_id: "LOT20241030005".into(),
            cell_id: "CELL-1030-0881".into(),
            defect_type: "Scratch".into(),
            defect_code: "SCR-11".into(),
            defect_location: "Bottom edge".into(),
            severity: Severity::Minor,
            detected_by: "Module line 1".into(),
            detection_stage: "Assembly".into(),
            root_cause: Some("Tray misalignment in unloader".into()),
            corrective_action: Some("Unloader guide rail adjusted".into()),
            status: DefectStatus::Closed,
            image_url: None,
        },
    ]
}

fn builtin_equipment() -> Vec<EquipmentRecord> {
    vec![
        EquipmentRecord {
            equipment_id: "EQ-ENC-02".into(),
            equipment_name: "TFE coater 02".into(),
            equipment_type: "Thin-film encapsulation".into(),
            process_id: "P-ENC".into(),
            process_name: "Encapsulation".into(),
            operation_date: d(2024, 11, 30),
            running_time: 18.5,
            idle_time: 3.0,
            down_time: 2.5,
            maintenance_history: vec![
                MaintenanceRecord {
                    maintenance_id: "MNT-5521".into(),
                    maintenance_date: d(2024, 11, 24),
                    maintenance_type: "Preventive".into(),
                    description: "Nozzle cleaning and flow calibration".into(),
                    technician: "G. Byrne".into(),
                    duration: 180,
                },
                MaintenanceRecord {
                    maintenance_id: "MNT-5544".into(),
                    maintenance_date: d(2024, 11, 30),
                    maintenance_type: "Corrective".into(),
                    description: "N2 flow controller swap after alarm".into(),
                    technician: "G. Byrne".into(),
                    duration: 95,
                },
            ],
            parameter_log: vec![
                ParameterLogEntry {
                    timestamp: ts(2024, 11, 30, 13, 30),
                    parameter_name: "N2 flow".into(),
                    set_value: 120.0,
                    actual_value: 111.5,
                    unit: "sccm".into(),
                    status: ParameterStatus::Warning,
                },
                ParameterLogEntry {
                    timestamp: ts(2024, 11, 30, 14, 10),
                    parameter_name: "N2 flow".into(),
                    set_value: 120.0,
                    actual_value: 98.2,
                    unit: "sccm".into(),
                    status: ParameterStatus::Alarm,
                },
                ParameterLogEntry {
                    timestamp: ts(2024, 11, 30, 15, 5),
                    parameter_name: "N2 flow".into(),
                    set_value: 120.0,
                    actual_value: 119.6,
                    unit: "sccm".into(),
                    status: ParameterStatus::Normal,
                },
            ],
        },
        EquipmentRecord {
            equipment_id: "EQ-EVP-01".into(),
            equipment_name: "Evaporator 01".into(),
            equipment_type: "OLED evaporation".into(),
            process_id: "P-EVP".into(),
            process_name: "OLED evaporation".into(),
            operation_date: d(2024, 11, 30),
            running_time: 21.0,
            idle_time: 2.5,
            down_time: 0.5,
            maintenance_history: vec![MaintenanceRecord {
                maintenance_id: "MNT-5538".into(),
                maintenance_date: d(2024, 11, 27),
                maintenance_type: "Preventive".into(),
                description: "Crucible refill and rate sensor check".into(),
                technician: "P. Lindqvist".into(),
                duration: 240,
            }],
            parameter_log: vec![ParameterLogEntry {
                timestamp: ts(2024, 11, 30, 4, 45),
                parameter_name: "Deposition rate".into(),
                set_value: 1.8,
                actual_value: 1.79,
                unit: "Å/s".into(),
                status: ParameterStatus::Normal,
            }],
        },
    ]
}

fn builtin_development() -> Vec<DevelopmentRecord> {
    vec![
        DevelopmentRecord {
            development_id: "DEV-2024-114".into(),
            product_model: "OLED_67_FHD".into(),
            version: "C3".into(),
            development_date: d(2024, 10, 14),
            engineer: "L. Huang".into(),
            change_type: "Process change".into(),
            description: "TFE stack reduced from 4 to 3 layers to improve takt time".into(),
            related_documents: vec!["ECN-2024-0452".into(), "DOE-TFE-31".into()],
            test_results: "RA 500h pass on 45/45 samples".into(),
            approval_status: "Approved".into(),
        },
        DevelopmentRecord {
            development_id: "DEV-2024-121".into(),
            product_model: "OLED_67_FHD".into(),
            version: "C4".into(),
            development_date: d(2024, 11, 22),
            engineer: "L. Huang".into(),
            change_type: "Material change".into(),
            description: "Blue host material switched to vendor B lot-qualified grade".into(),
            related_documents: vec!["ECN-2024-0497".into()],
            test_results: "LT95 projection within spec; mura screening pending".into(),
            approval_status: "Conditional".into(),
        },
        DevelopmentRecord {
            development_id: "DEV-2024-097".into(),
            product_model: "AMOLED_55_4K".into(),
            version: "B7".into(),
            development_date: d(2024, 9, 2),
            engineer: "T. Abadi".into(),
            change_type: "Design change".into(),
            description: "Demura LUT resolution doubled for low-grey uniformity".into(),
            related_documents: vec!["ECN-2024-0388".into(), "VAL-DMR-12".into()],
            test_results: "Low-grey mura score improved 0.8 → 0.3".into(),
            approval_status: "Approved".into(),
        },
    ]
}

// ── Tests ──────────────────────────────────────────────────────────────────────
