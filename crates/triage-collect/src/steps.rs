//! The collection step sequence and session phase.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

/// One data-gathering step, in canonical collection order.
///
/// The order of the variants is the order an analyst walks them; iteration
/// via `strum::IntoEnumIterator` yields exactly that order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum CollectStep {
    ErpShipment,
    MesProduction,
    LotTracking,
    QualityInspection,
    DefectHistory,
    ProcessEquipment,
    DevelopmentHistory,
}

impl CollectStep {
    /// Human-readable step name for views and the context document.
    pub fn label(&self) -> &'static str {
        match self {
            CollectStep::ErpShipment => "ERP shipment records",
            CollectStep::MesProduction => "MES production results",
            CollectStep::LotTracking => "LOT tracking",
            CollectStep::QualityInspection => "Quality inspection results",
            CollectStep::DefectHistory => "Defect history",
            CollectStep::ProcessEquipment => "Process equipment logs",
            CollectStep::DevelopmentHistory => "Development history",
        }
    }

    /// What the step pulls in, shown before the analyst starts it.
    pub fn description(&self) -> &'static str {
        match self {
            CollectStep::ErpShipment => "Shipment records matching the target LOT",
            CollectStep::MesProduction => "Production runs for the target product model",
            CollectStep::LotTracking => "LOT genealogy and per-process flow",
            CollectStep::QualityInspection => "Incoming/outgoing inspection results",
            CollectStep::DefectHistory => "Defects matching the target cell or defect type",
            CollectStep::ProcessEquipment => "Equipment operation, maintenance and parameter logs",
            CollectStep::DevelopmentHistory => "Design and process changes for the product model",
        }
    }
}

/// Where a [`crate::CollectSession`] currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Target chosen, steps still toggleable, nothing fetched yet.
    Init,
    /// Collecting the named step.
    Step(CollectStep),
    /// All enabled steps visited; the context document can be produced.
    FinalReview,
}

impl Phase {
    /// Stable string form used on the wire (`"init"`, a step name, or
    /// `"final_review"`).
    pub fn name(&self) -> String {
        match self {
            Phase::Init => "init".to_owned(),
            Phase::Step(s) => s.to_string(),
            Phase::FinalReview => "final_review".to_owned(),
        }
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod test {
    use super::*;
    use std::str::FromStr;
    use strum::IntoEnumIterator;

    #[test]
    fn steps_iterate_in_collection_order() {
        let order: Vec<CollectStep> = CollectStep::iter().collect();
        assert_eq!(order[0], CollectStep::ErpShipment);
        assert_eq!(order[1], CollectStep::MesProduction);
        assert_eq!(order[2], CollectStep::LotTracking);
        assert_eq!(order[3], CollectStep::QualityInspection);
        assert_eq!(order[4], CollectStep::DefectHistory);
        assert_eq!(order[5], CollectStep::ProcessEquipment);
        assert_eq!(order[6], CollectStep::DevelopmentHistory);
    }

    #[test]
    fn step_names_round_trip_through_snake_case() {
        for step in CollectStep::iter() {
            let name = step.to_string();
            assert_eq!(CollectStep::from_str(&name).unwrap(), step, "name {name}");
        }
        assert_eq!(
            CollectStep::from_str("erp_shipment").unwrap(),
            CollectStep::ErpShipment
        );
        assert!(CollectStep::from_str("final_review").is_err());
    }

    #[test]
    fn phase_names_are_stable() {
        assert_eq!(Phase::Init.name(), "init");
        assert_eq!(Phase::Step(CollectStep::LotTracking).name(), "lot_tracking");
        assert_eq!(Phase::FinalReview.name(), "final_review");
    }
}
