//! The collection session state machine.
//!
//! Lifecycle: a session is created against an [`AnalysisTarget`] in the
//! `init` phase with every step enabled. Steps may be toggled while still in
//! `init`; `start` enters the first enabled step and fetches its records.
//! `confirm` (with an optional analyst comment) or `skip` advances to the
//! next enabled step, and past the last one the session reaches
//! `final_review`, where the context document can be rendered or the whole
//! collection restarted against a different target.

use serde::Serialize;
use strum::IntoEnumIterator;
use thiserror::Error;

use crate::context;
use crate::data::*;
use crate::dataset::Dataset;
use crate::steps::{CollectStep, Phase};

/// Errors for operations issued in the wrong phase.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CollectError {
    /// Step toggling is only allowed before `start`.
    #[error("collection already started")]
    AlreadyStarted,

    /// `confirm`/`skip` before `start`.
    #[error("collection not started")]
    NotStarted,

    /// `confirm`/`skip` after the last step.
    #[error("collection already complete")]
    Complete,

    /// Context document requested before reaching final review.
    #[error("collection not finished")]
    NotFinished,
}

/// Records fetched for one step.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum StepRecords {
    ErpShipment(Vec<ErpShipment>),
    MesProduction(Vec<MesProduction>),
    LotTracking(Vec<LotTracking>),
    QualityInspection(Vec<QualityInspection>),
    DefectHistory(Vec<DefectRecord>),
    ProcessEquipment(Vec<EquipmentRecord>),
    DevelopmentHistory(Vec<DevelopmentRecord>),
}

impl StepRecords {
    pub fn len(&self) -> usize {
        match self {
            StepRecords::ErpShipment(v) => v.len(),
            StepRecords::MesProduction(v) => v.len(),
            StepRecords::LotTracking(v) => v.len(),
            StepRecords::QualityInspection(v) => v.len(),
            StepRecords::DefectHistory(v) => v.len(),
            StepRecords::ProcessEquipment(v) => v.len(),
            StepRecords::DevelopmentHistory(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Per-step progress inside a session.
#[derive(Debug, Clone)]
pub struct StepState {
    pub step: CollectStep,
    pub enabled: bool,
    pub confirmed: bool,
    pub skipped: bool,
    pub comment: Option<String>,
    /// Fetched when the step becomes current; `None` until then.
    pub records: Option<StepRecords>,
}

impl StepState {
    fn fresh(step: CollectStep) -> Self {
        Self {
            step,
            enabled: true,
            confirmed: false,
            skipped: false,
            comment: None,
            records: None,
        }
    }
}

/// One analyst's walk through the collection steps for one target.
#[derive(Debug, Clone)]
pub struct CollectSession {
    target: AnalysisTarget,
    phase: Phase,
    steps: Vec<StepState>,
}

impl CollectSession {
    pub fn new(target: AnalysisTarget) -> Self {
        Self {
            target,
            phase: Phase::Init,
            steps: CollectStep::iter().map(StepState::fresh).collect(),
        }
    }

    pub fn target(&self) -> &AnalysisTarget {
        &self.target
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn steps(&self) -> &[StepState] {
        &self.steps
    }

    fn state_mut(&mut self, step: CollectStep) -> &mut StepState {
        // Every CollectStep variant has exactly one StepState.
        self.steps
            .iter_mut()
            .find(|s| s.step == step)
            .expect("step state present for every step")
    }

    /// Enable or disable a step. Only allowed before `start`.
    pub fn set_enabled(&mut self, step: CollectStep, enabled: bool) -> Result<(), CollectError> {
        if self.phase != Phase::Init {
            return Err(CollectError::AlreadyStarted);
        }
        self.state_mut(step).enabled = enabled;
        Ok(())
    }

    /// Leave `init` and enter the first enabled step, fetching its records.
    ///
    /// With every step disabled the session goes straight to final review.
    pub fn start(&mut self, data: &Dataset) -> Result<Phase, CollectError> {
        if self.phase != Phase::Init {
            return Err(CollectError::AlreadyStarted);
        }
        self.phase = match self.first_enabled() {
            Some(step) => {
                self.enter(step, data);
                Phase::Step(step)
            }
            None => Phase::FinalReview,
        };
        Ok(self.phase)
    }

    /// Confirm the current step's records, record the analyst's comment, and
    /// advance.
    pub fn confirm(
        &mut self,
        data: &Dataset,
        comment: Option<String>,
    ) -> Result<Phase, CollectError> {
        let step = self.current_step()?;
        {
            let state = self.state_mut(step);
            state.confirmed = true;
            state.comment = comment.filter(|c| !c.trim().is_empty());
        }
        Ok(self.advance(step, data))
    }

    /// Pass over the current step without taking its records.
    pub fn skip(&mut self, data: &Dataset) -> Result<Phase, CollectError> {
        let step = self.current_step()?;
        self.state_mut(step).skipped = true;
        Ok(self.advance(step, data))
    }

    /// Throw away all progress and point the session at a new target.
    pub fn restart(&mut self, target: AnalysisTarget) {
        self.target = target;
        self.phase = Phase::Init;
        self.steps = CollectStep::iter().map(StepState::fresh).collect();
    }

    /// Records of the step currently being collected.
    pub fn current_records(&self) -> Option<&StepRecords> {
        match self.phase {
            Phase::Step(step) => self
                .steps
                .iter()
                .find(|s| s.step == step)
                .and_then(|s| s.records.as_ref()),
            _ => None,
        }
    }

    /// Render the final context document. Only valid in final review.
    pub fn context_document(&self) -> Result<String, CollectError> {
        if self.phase != Phase::FinalReview {
            return Err(CollectError::NotFinished);
        }
        Ok(context::render(&self.target, &self.steps))
    }

    fn current_step(&self) -> Result<CollectStep, CollectError> {
        match self.phase {
            Phase::Init => Err(CollectError::NotStarted),
            Phase::FinalReview => Err(CollectError::Complete),
            Phase::Step(step) => Ok(step),
        }
    }

    fn first_enabled(&self) -> Option<CollectStep> {
        self.steps.iter().find(|s| s.enabled).map(|s| s.step)
    }

    fn next_enabled(&self, after: CollectStep) -> Option<CollectStep> {
        self.steps
            .iter()
            .skip_while(|s| s.step != after)
            .skip(1)
            .find(|s| s.enabled)
            .map(|s| s.step)
    }

    fn advance(&mut self, from: CollectStep, data: &Dataset) -> Phase {
        self.phase = match self.next_enabled(from) {
            Some(next) => {
                self.enter(next, data);
                Phase::Step(next)
            }
            None => Phase::FinalReview,
        };
        self.phase
    }

    fn enter(&mut self, step: CollectStep, data: &Dataset) {
        let records = fetch(step, data, &self.target);
        self.state_mut(step).records = Some(records);
    }
}

/// Pull the records a step presents, applying that source's filter rule.
fn fetch(step: CollectStep, data: &Dataset, target: &AnalysisTarget) -> StepRecords {
    match step {
        CollectStep::ErpShipment => StepRecords::ErpShipment(data.erp_for(target)),
        CollectStep::MesProduction => StepRecords::MesProduction(data.mes_for(target)),
        CollectStep::LotTracking => StepRecords::LotTracking(data.lot_tracking_for(target)),
        CollectStep::QualityInspection => {
            StepRecords::QualityInspection(data.quality_for(target))
        }
        CollectStep::DefectHistory => StepRecords::DefectHistory(data.defects_for(target)),
        CollectStep::ProcessEquipment => {
            StepRecords::ProcessEquipment(data.equipment_for(target))
        }
        CollectStep::DevelopmentHistory => {
            StepRecords::DevelopmentHistory(data.development_for(target))
        }
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod test {
    use super::*;
    use proptest::prelude::*;

    fn session() -> (Dataset, CollectSession) {
        let data = Dataset::builtin();
        let target = data.target("TGT-2024-001").unwrap().clone();
        (data, CollectSession::new(target))
    }

    #[test]
    fn walks_all_steps_in_order_when_everything_enabled() {
        let (data, mut s) = session();
        assert_eq!(s.start(&data).unwrap(), Phase::Step(CollectStep::ErpShipment));

        let mut visited = vec![CollectStep::ErpShipment];
        loop {
            match s.confirm(&data, None).unwrap() {
                Phase::Step(step) => visited.push(step),
                Phase::FinalReview => break,
                Phase::Init => unreachable!("confirm never returns to init"),
            }
        }
        let expected: Vec<CollectStep> = CollectStep::iter().collect();
        assert_eq!(visited, expected);
    }

    #[test]
    fn disabled_steps_are_passed_over() {
        let (data, mut s) = session();
        s.set_enabled(CollectStep::ErpShipment, false).unwrap();
        s.set_enabled(CollectStep::LotTracking, false).unwrap();

        assert_eq!(
            s.start(&data).unwrap(),
            Phase::Step(CollectStep::MesProduction)
        );
        assert_eq!(
            s.confirm(&data, None).unwrap(),
            Phase::Step(CollectStep::QualityInspection)
        );

        let erp = &s.steps()[0];
        assert!(!erp.enabled);
        assert!(erp.records.is_none(), "disabled step must not fetch");
    }

    #[test]
    fn toggling_after_start_is_rejected() {
        let (data, mut s) = session();
        s.start(&data).unwrap();
        assert_eq!(
            s.set_enabled(CollectStep::DefectHistory, false),
            Err(CollectError::AlreadyStarted)
        );
    }

    #[test]
    fn confirm_before_start_is_rejected() {
        let (data, mut s) = session();
        assert_eq!(s.confirm(&data, None), Err(CollectError::NotStarted));
        assert_eq!(s.skip(&data), Err(CollectError::NotStarted));
    }

    #[test]
    fn all_steps_disabled_goes_straight_to_review() {
        let (data, mut s) = session();
        for step in CollectStep::iter() {
            s.set_enabled(step, false).unwrap();
        }
        assert_eq!(s.start(&data).unwrap(), Phase::FinalReview);
        assert!(s.context_document().unwrap().contains("TGT-2024-001"));
    }

    #[test]
    fn entering_a_step_fetches_filtered_records() {
        let (data, mut s) = session();
        s.start(&data).unwrap();
        let records = s.current_records().expect("records fetched on entry");
        match records {
            StepRecords::ErpShipment(v) => {
                assert_eq!(v.len(), 1);
                assert_eq!(v[0].shipment_lot_id, "LOT20241203001");
            }
            other => panic!("expected ERP records, got {other:?}"),
        }
    }

    #[test]
    fn blank_comments_are_dropped() {
        let (data, mut s) = session();
        s.start(&data).unwrap();
        s.confirm(&data, Some("   ".into())).unwrap();
        assert!(s.steps()[0].comment.is_none());

        s.confirm(&data, Some("yield dip matches defect window".into()))
            .unwrap();
        assert_eq!(
            s.steps()[1].comment.as_deref(),
            Some("yield dip matches defect window")
        );
    }

    #[test]
    fn restart_clears_progress_and_switches_target() {
        let (data, mut s) = session();
        s.start(&data).unwrap();
        s.confirm(&data, Some("note".into())).unwrap();
        s.skip(&data).unwrap();

        let next = data.target("TGT-2024-002").unwrap().clone();
        s.restart(next);

        assert_eq!(s.phase(), Phase::Init);
        assert_eq!(s.target().id, "TGT-2024-002");
        assert!(s
            .steps()
            .iter()
            .all(|st| st.enabled && !st.confirmed && !st.skipped && st.records.is_none()));
    }

    #[test]
    fn context_requires_final_review() {
        let (data, mut s) = session();
        assert_eq!(s.context_document(), Err(CollectError::NotFinished));
        s.start(&data).unwrap();
        assert_eq!(s.context_document(), Err(CollectError::NotFinished));
        while !matches!(s.phase(), Phase::FinalReview) {
            s.confirm(&data, None).unwrap();
        }
        assert!(s.context_document().is_ok());
        assert_eq!(s.confirm(&data, None), Err(CollectError::Complete));
    }

    proptest! {
        /// Whatever the enable mask and confirm/skip choices, the session
        /// visits exactly the enabled steps, in canonical order, and lands in
        /// final review.
        #[test]
        fn visits_exactly_the_enabled_steps(mask in proptest::collection::vec(any::<bool>(), 7),
                                            skips in proptest::collection::vec(any::<bool>(), 7)) {
            let data = Dataset::builtin();
            let target = data.target("TGT-2024-001").unwrap().clone();
            let mut s = CollectSession::new(target);

            for (step, &enabled) in CollectStep::iter().zip(mask.iter()) {
                s.set_enabled(step, enabled).unwrap();
            }

            let mut visited = Vec::new();
            let mut phase = s.start(&data).unwrap();
            let mut turn = 0usize;
            while let Phase::Step(step) = phase {
                visited.push(step);
                phase = if skips[turn % skips.len()] {
                    s.skip(&data).unwrap()
                } else {
                    s.confirm(&data, None).unwrap()
                };
                turn += 1;
            }

            let expected: Vec<CollectStep> = CollectStep::iter()
                .zip(mask.iter())
                .filter(|&(_, &enabled)| enabled)
                .map(|(step, _)| step)
                .collect();
            prop_assert_eq!(visited, expected);
            prop_assert_eq!(phase, Phase::FinalReview);
        }
    }
}
