//! Guided collection of manufacturing records for defect analysis.
//!
//! An analyst investigating a customer defect walks a fixed sequence of data
//! sources (ERP shipments, MES production runs, lot tracking, quality
//! inspections, defect history, equipment logs, development history), confirms
//! or skips each one, and ends up with a single text document that bundles
//! everything confirmed — ready to hand to an LLM as analysis context.
//!
//! The crate is deliberately I/O-free: [`CollectSession`] is a synchronous
//! state machine, and [`Dataset`] is an in-memory table set with the filter
//! rules each step applies. Callers own the session lifecycle (the HTTP
//! server keeps sessions in shared state keyed by id).

pub mod context;
pub mod data;
pub mod dataset;
pub mod session;
pub mod steps;

pub use data::{
    AnalysisTarget, DefectRecord, DevelopmentRecord, EquipmentRecord, ErpShipment,
    InspectionItem, LotTracking, MaintenanceRecord, MesProduction, ParameterLogEntry,
    ProcessStep, QualityInspection,
};
pub use dataset::Dataset;
pub use session::{CollectError, CollectSession, StepRecords, StepState};
pub use steps::{CollectStep, Phase};
