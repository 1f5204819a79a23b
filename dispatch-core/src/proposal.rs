//! Dispatch proposal reconciliation.
//!
//! A proposal combines two provenance classes: system recommendations (each
//! with its own match score and selection flag) and units the dispatcher
//! added by hand. Manual units are selected unless their id is in the
//! deselected set. The reconciled view lists recommendations first, then
//! manual additions in insertion order.

use crate::compliance::DispatchCandidate;
use crate::error::{DispatchError, Result};
use crate::units::Unit;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::debug;

/// Match score reported for units the dispatcher picked explicitly.
pub const MANUAL_MATCH_SCORE: u8 = 100;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Readiness {
    Ready,
    Warning,
    Missing,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RouteStatus {
    Optimal,
    Diverted,
}

/// A system-suggested resource.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    pub unit: Unit,
    pub match_score: u8,
    pub traffic_info: String,
    pub equipment: Readiness,
    pub crew: Readiness,
    pub route: RouteStatus,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provenance {
    Recommended,
    Manual,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
struct RecommendedSlot {
    recommendation: Recommendation,
    selected: bool,
}

/// One row of the reconciled proposal.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ProposalEntry<'a> {
    Recommended {
        recommendation: &'a Recommendation,
        selected: bool,
    },
    Manual {
        unit: &'a Unit,
        selected: bool,
    },
}

impl<'a> ProposalEntry<'a> {
    pub fn unit(&self) -> &'a Unit {
        match *self {
            ProposalEntry::Recommended { recommendation, .. } => &recommendation.unit,
            ProposalEntry::Manual { unit, .. } => unit,
        }
    }

    pub fn id(&self) -> &'a str {
        &self.unit().id
    }

    pub fn provenance(&self) -> Provenance {
        match self {
            ProposalEntry::Recommended { .. } => Provenance::Recommended,
            ProposalEntry::Manual { .. } => Provenance::Manual,
        }
    }

    pub fn is_manual(&self) -> bool {
        matches!(self, ProposalEntry::Manual { .. })
    }

    pub fn match_score(&self) -> u8 {
        match self {
            ProposalEntry::Recommended { recommendation, .. } => recommendation.match_score,
            ProposalEntry::Manual { .. } => MANUAL_MATCH_SCORE,
        }
    }

    pub fn is_selected(&self) -> bool {
        match self {
            ProposalEntry::Recommended { selected, .. } | ProposalEntry::Manual { selected, .. } => {
                *selected
            }
        }
    }
}

impl DispatchCandidate for ProposalEntry<'_> {
    fn unit_type_code(&self) -> &str {
        self.unit().unit_type.code()
    }

    fn is_selected(&self) -> bool {
        ProposalEntry::is_selected(self)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DispatchProposal {
    recommended: Vec<RecommendedSlot>,
    manual: Vec<Unit>,
    deselected_manual: BTreeSet<String>,
}

impl DispatchProposal {
    /// Every recommendation starts out selected.
    pub fn with_recommendations(recommendations: Vec<Recommendation>) -> Self {
        Self {
            recommended: recommendations
                .into_iter()
                .map(|recommendation| RecommendedSlot {
                    recommendation,
                    selected: true,
                })
                .collect(),
            manual: Vec::new(),
            deselected_manual: BTreeSet::new(),
        }
    }

    pub fn entries(&self) -> Vec<ProposalEntry<'_>> {
        let recommended = self.recommended.iter().map(|slot| ProposalEntry::Recommended {
            recommendation: &slot.recommendation,
            selected: slot.selected,
        });
        let manual = self.manual.iter().map(|unit| ProposalEntry::Manual {
            unit,
            selected: !self.deselected_manual.contains(&unit.id),
        });
        recommended.chain(manual).collect()
    }

    pub fn selected_units(&self) -> Vec<&Unit> {
        self.entries()
            .into_iter()
            .filter(ProposalEntry::is_selected)
            .map(|e| e.unit())
            .collect()
    }

    pub fn manual_units(&self) -> &[Unit] {
        &self.manual
    }

    pub fn contains(&self, unit_id: &str) -> bool {
        self.recommended.iter().any(|s| s.recommendation.unit.id == unit_id)
            || self.manual.iter().any(|u| u.id == unit_id)
    }

    pub fn len(&self) -> usize {
        self.recommended.len() + self.manual.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Adds a manual unit. Returns `false` if a unit with the same id is
    /// already part of the proposal.
    pub fn add(&mut self, unit: Unit) -> bool {
        if self.contains(&unit.id) {
            debug!(unit_id = %unit.id, "unit already in proposal");
            return false;
        }
        debug!(unit_id = %unit.id, "manual unit added to proposal");
        self.manual.push(unit);
        true
    }

    /// Removes a manual unit and forgets its deselection.
    pub fn remove(&mut self, unit_id: &str) -> Option<Unit> {
        self.deselected_manual.remove(unit_id);
        let idx = self.manual.iter().position(|u| u.id == unit_id)?;
        debug!(unit_id, "manual unit removed from proposal");
        Some(self.manual.remove(idx))
    }

    /// Flips inclusion of one unit. Returns the new selection state.
    pub fn toggle(&mut self, unit_id: &str, provenance: Provenance) -> Result<bool> {
        match provenance {
            Provenance::Manual => {
                if !self.manual.iter().any(|u| u.id == unit_id) {
                    return Err(DispatchError::NotInProposal(unit_id.to_string()));
                }
                let selected = if self.deselected_manual.remove(unit_id) {
                    true
                } else {
                    self.deselected_manual.insert(unit_id.to_string());
                    false
                };
                Ok(selected)
            }
            Provenance::Recommended => {
                let slot = self
                    .recommended
                    .iter_mut()
                    .find(|s| s.recommendation.unit.id == unit_id)
                    .ok_or_else(|| DispatchError::NotInProposal(unit_id.to_string()))?;
                slot.selected = !slot.selected;
                Ok(slot.selected)
            }
        }
    }

    /// Copies the roster's live status and position onto the proposal's copy
    /// of `unit`. Display fields (ETA, distance) stay as proposed. Returns
    /// `false` if the unit is not part of the proposal.
    pub fn refresh_unit(&mut self, unit: &Unit) -> bool {
        let slot = self
            .recommended
            .iter_mut()
            .map(|s| &mut s.recommendation.unit)
            .chain(self.manual.iter_mut())
            .find(|u| u.id == unit.id);
        let Some(entry) = slot else {
            return false;
        };
        entry.status = unit.status;
        entry.status_last_updated = unit.status_last_updated;
        entry.location = unit.location;
        true
    }

    pub fn provenance_of(&self, unit_id: &str) -> Option<Provenance> {
        if self.recommended.iter().any(|s| s.recommendation.unit.id == unit_id) {
            Some(Provenance::Recommended)
        } else if self.manual.iter().any(|u| u.id == unit_id) {
            Some(Provenance::Manual)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::units::{GeoPoint, UnitStatus, UnitType};
    use chrono::Utc;

    fn unit(id: &str, unit_type: UnitType) -> Unit {
        Unit::new(
            id,
            format!("IN {id}"),
            unit_type,
            UnitStatus::S1,
            GeoPoint { lat: 48.76, lng: 11.42 },
            Utc::now(),
        )
    }

    fn recommendation(id: &str, unit_type: UnitType, score: u8) -> Recommendation {
        Recommendation {
            unit: unit(id, unit_type),
            match_score: score,
            traffic_info: "Clear".into(),
            equipment: Readiness::Ready,
            crew: Readiness::Ready,
            route: RouteStatus::Optimal,
        }
    }

    fn proposal() -> DispatchProposal {
        DispatchProposal::with_recommendations(vec![
            recommendation("REC-1", UnitType::Rtw, 94),
            recommendation("REC-2", UnitType::Nef, 89),
        ])
    }

    fn selection(p: &DispatchProposal) -> Vec<(String, bool)> {
        p.entries()
            .iter()
            .map(|e| (e.id().to_string(), e.is_selected()))
            .collect()
    }

    #[test]
    fn recommendations_come_first_then_manual_units() {
        let mut p = proposal();
        p.add(unit("UNIT-007", UnitType::Hlf));
        let entries = p.entries();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].provenance(), Provenance::Recommended);
        assert_eq!(entries[0].match_score(), 94);
        assert!(entries[2].is_manual());
        assert_eq!(entries[2].match_score(), MANUAL_MATCH_SCORE);
        assert!(entries.iter().all(|e| e.is_selected()));
    }

    #[test]
    fn add_is_idempotent() {
        let mut p = proposal();
        assert!(p.add(unit("UNIT-007", UnitType::Hlf)));
        assert!(!p.add(unit("UNIT-007", UnitType::Hlf)));
        assert!(!p.add(unit("REC-1", UnitType::Rtw)));
        assert_eq!(p.len(), 3);
    }

    #[test]
    fn remove_then_add_restores_fresh_selection() {
        let mut p = proposal();
        p.add(unit("UNIT-007", UnitType::Hlf));
        assert_eq!(p.toggle("UNIT-007", Provenance::Manual), Ok(false));

        let removed = p.remove("UNIT-007").expect("removed");
        assert_eq!(removed.id, "UNIT-007");
        assert!(!p.contains("UNIT-007"));

        p.add(unit("UNIT-007", UnitType::Hlf));
        let entry = p.entries().into_iter().find(|e| e.id() == "UNIT-007").expect("entry");
        assert!(entry.is_selected());
    }

    #[test]
    fn remove_does_not_touch_recommendations() {
        let mut p = proposal();
        assert!(p.remove("REC-1").is_none());
        assert!(p.contains("REC-1"));
    }

    #[test]
    fn toggling_one_unit_leaves_others_untouched() {
        let mut p = proposal();
        p.add(unit("UNIT-007", UnitType::Hlf));
        p.add(unit("UNIT-008", UnitType::Dlk));

        let ids: Vec<(String, Provenance)> = p
            .entries()
            .iter()
            .map(|e| (e.id().to_string(), e.provenance()))
            .collect();

        for (id, provenance) in &ids {
            let before = selection(&p);
            p.toggle(id, *provenance).expect("toggle");
            let after = selection(&p);
            for ((b_id, b_sel), (a_id, a_sel)) in before.iter().zip(after.iter()) {
                assert_eq!(b_id, a_id);
                if b_id == id {
                    assert_ne!(b_sel, a_sel);
                } else {
                    assert_eq!(b_sel, a_sel, "toggling {id} changed {b_id}");
                }
            }
        }
    }

    #[test]
    fn toggle_twice_restores_selection() {
        let mut p = proposal();
        assert_eq!(p.toggle("REC-2", Provenance::Recommended), Ok(false));
        assert_eq!(p.toggle("REC-2", Provenance::Recommended), Ok(true));
    }

    #[test]
    fn toggle_unknown_or_wrong_provenance_fails() {
        let mut p = proposal();
        assert_eq!(
            p.toggle("REC-1", Provenance::Manual),
            Err(DispatchError::NotInProposal("REC-1".into()))
        );
        assert!(p.toggle("nope", Provenance::Recommended).is_err());
    }

    #[test]
    fn refresh_keeps_display_fields_but_updates_status() {
        let mut p = proposal();
        let mut picked = unit("UNIT-007", UnitType::Hlf);
        picked.eta = Some("6 min".into());
        p.add(picked);

        let mut live = unit("UNIT-007", UnitType::Hlf);
        live.set_status(UnitStatus::S3, Utc::now());
        assert!(p.refresh_unit(&live));

        let mut rec_live = unit("REC-2", UnitType::Nef);
        rec_live.set_status(UnitStatus::S4, Utc::now());
        assert!(p.refresh_unit(&rec_live));
        assert!(!p.refresh_unit(&unit("ghost", UnitType::Rtw)));

        let entries = p.entries();
        let manual = entries.iter().find(|e| e.id() == "UNIT-007").expect("manual");
        assert_eq!(manual.unit().status, UnitStatus::S3);
        assert_eq!(manual.unit().eta.as_deref(), Some("6 min"));
        let rec = entries.iter().find(|e| e.id() == "REC-2").expect("rec");
        assert_eq!(rec.unit().status, UnitStatus::S4);
    }

    #[test]
    fn selected_units_skip_deselected_entries() {
        let mut p = proposal();
        p.add(unit("UNIT-007", UnitType::Hlf));
        p.toggle("REC-1", Provenance::Recommended).expect("toggle");
        p.toggle("UNIT-007", Provenance::Manual).expect("toggle");
        let ids: Vec<&str> = p.selected_units().iter().map(|u| u.id.as_str()).collect();
        assert_eq!(ids, vec!["REC-2"]);
        assert_eq!(p.provenance_of("UNIT-007"), Some(Provenance::Manual));
        assert_eq!(p.provenance_of("x"), None);
    }
}
