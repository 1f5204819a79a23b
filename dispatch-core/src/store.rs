//! Application state for one dispatcher console.
//!
//! All mutations are synchronous reducers on [`CadState`]; callers own the
//! state and decide how to share it. Every reducer that touches the call
//! text or unit statuses re-runs the supervisor so the advisory never lags
//! behind the state it was derived from.

use crate::call::{CallData, CallField, CallIntake, ScheduledTransport};
use crate::compliance::{self, ComplianceReport};
use crate::error::{DispatchError, Result};
use crate::hospitals::{self, Hospital};
use crate::incidents::{Incident, IncidentFilter, IncidentStatus};
use crate::proposal::{DispatchProposal, Provenance, Recommendation};
use crate::protocols;
use crate::rules::Classification;
use crate::supervisor::{self, Advisory, RecommendationStatus, Sentiment, Supervisor};
use crate::units::{Unit, UnitCategory, UnitStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

const DEFAULT_PICKER_ETA: &str = "Calculated from Map";
const DEFAULT_PICKER_DISTANCE: &str = "-- km";

/// A unit listed on more than one open incident.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentConflict {
    pub unit_id: String,
    pub incident_ids: Vec<String>,
}

/// Result of alarming a proposal: units put on the incident, and selected
/// proposal units that could not be because they are not on the roster.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlarmOutcome {
    pub assigned: Vec<String>,
    pub skipped: Vec<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RosterGroups {
    pub ems: Vec<Unit>,
    pub fire: Vec<Unit>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct CadState {
    incidents: Vec<Incident>,
    units: Vec<Unit>,
    hospitals: Vec<Hospital>,
    intake: CallIntake,
    proposal: DispatchProposal,
    supervisor: Supervisor,
    selected_unit_id: Option<String>,
}

impl CadState {
    pub fn new(
        incidents: Vec<Incident>,
        units: Vec<Unit>,
        hospitals: Vec<Hospital>,
        call: CallData,
        recommendations: Vec<Recommendation>,
    ) -> Self {
        Self {
            incidents,
            units,
            hospitals,
            intake: CallIntake::new(call),
            proposal: DispatchProposal::with_recommendations(recommendations),
            supervisor: Supervisor::default(),
            selected_unit_id: None,
        }
    }

    // ── queries ──────────────────────────────────────────────────────────

    pub fn incidents(&self) -> &[Incident] {
        &self.incidents
    }

    pub fn units(&self) -> &[Unit] {
        &self.units
    }

    pub fn hospitals(&self) -> Vec<Hospital> {
        hospitals::sorted_for_display(&self.hospitals)
    }

    pub fn intake(&self) -> &CallIntake {
        &self.intake
    }

    pub fn proposal(&self) -> &DispatchProposal {
        &self.proposal
    }

    pub fn supervisor(&self) -> &Supervisor {
        &self.supervisor
    }

    pub fn selected_unit_id(&self) -> Option<&str> {
        self.selected_unit_id.as_deref()
    }

    pub fn unit(&self, unit_id: &str) -> Result<&Unit> {
        self.units
            .iter()
            .find(|u| u.id == unit_id)
            .ok_or_else(|| DispatchError::UnknownUnit(unit_id.to_string()))
    }

    pub fn incident(&self, incident_id: &str) -> Result<&Incident> {
        self.incidents
            .iter()
            .find(|i| i.id == incident_id)
            .ok_or_else(|| DispatchError::UnknownIncident(incident_id.to_string()))
    }

    pub fn open_incidents(&self) -> Vec<&Incident> {
        self.incidents.iter().filter(|i| i.is_open()).collect()
    }

    pub fn filtered_incidents(&self, filter: IncidentFilter) -> Vec<&Incident> {
        self.incidents.iter().filter(|i| filter.matches(i)).collect()
    }

    /// First incident still waiting for units.
    pub fn active_incident(&self) -> Option<&Incident> {
        self.incidents
            .iter()
            .find(|i| matches!(i.status, IncidentStatus::Open | IncidentStatus::Dispatching))
    }

    /// Available (S1/S2) units matching the search term.
    pub fn free_units(&self, search: &str) -> Vec<&Unit> {
        self.units
            .iter()
            .filter(|u| u.status.is_available() && u.matches_search(search))
            .collect()
    }

    /// Roster picker: every unit matching the term, grouped by category.
    pub fn roster_search(&self, term: &str) -> RosterGroups {
        let mut groups = RosterGroups::default();
        for unit in self.units.iter().filter(|u| u.matches_search(term)) {
            match unit.category {
                UnitCategory::Ems => groups.ems.push(unit.clone()),
                UnitCategory::Fire => groups.fire.push(unit.clone()),
            }
        }
        groups
    }

    pub fn units_requesting_voice_contact(&self) -> Vec<&Unit> {
        self.units
            .iter()
            .filter(|u| u.status.requests_voice_contact())
            .collect()
    }

    pub fn overdue_units(&self, now: DateTime<Utc>) -> Vec<&Unit> {
        self.units.iter().filter(|u| u.is_overdue(now)).collect()
    }

    /// Units listed on more than one open incident. Double assignment is
    /// reported, not prevented.
    pub fn assignment_conflicts(&self) -> Vec<AssignmentConflict> {
        let mut conflicts = Vec::new();
        for unit in &self.units {
            let incident_ids: Vec<String> = self
                .incidents
                .iter()
                .filter(|i| i.is_open() && i.is_assigned(&unit.id))
                .map(|i| i.id.clone())
                .collect();
            if incident_ids.len() > 1 {
                conflicts.push(AssignmentConflict {
                    unit_id: unit.id.clone(),
                    incident_ids,
                });
            }
        }
        conflicts
    }

    pub fn advisory(&self) -> Advisory<'_> {
        self.supervisor.advisory(&self.units)
    }

    /// Closest hospital with free beds that lists `specialty`.
    pub fn nearest_accepting_hospital(&self, specialty: &str) -> Option<&Hospital> {
        hospitals::nearest_accepting(&self.hospitals, specialty)
    }

    pub fn sentiment(&self) -> Sentiment {
        supervisor::assess_sentiment(&self.intake.analysis_text())
    }

    /// Categories the proposal must cover: the live recommendation's units
    /// unless it was rejected, else `fallback`.
    pub fn required_categories(&self, fallback: &[String]) -> Vec<String> {
        match self.supervisor.recommendation() {
            Some(rec) if rec.status != RecommendationStatus::Rejected => rec.units.clone(),
            _ => fallback.to_vec(),
        }
    }

    pub fn compliance(&self, fallback: &[String]) -> ComplianceReport {
        let required = self.required_categories(fallback);
        compliance::check_compliance(&required, &self.proposal.entries())
    }

    // ── incidents ────────────────────────────────────────────────────────

    pub fn add_incident(&mut self, incident: Incident) -> Result<()> {
        if self.incident(&incident.id).is_ok() {
            return Err(DispatchError::DuplicateIncident(incident.id));
        }
        info!(incident_id = %incident.id, "incident added");
        self.incidents.push(incident);
        Ok(())
    }

    pub fn update_incident_status(&mut self, incident_id: &str, status: IncidentStatus) -> Result<()> {
        let incident = self.incident_mut(incident_id)?;
        info!(incident_id, from = ?incident.status, to = ?status, "incident status changed");
        incident.status = status;
        Ok(())
    }

    /// Puts a unit on an incident and moves it to S3.
    pub fn assign_unit(&mut self, incident_id: &str, unit_id: &str) -> Result<()> {
        self.unit(unit_id)?;
        let others: Vec<String> = self
            .incidents
            .iter()
            .filter(|i| i.id != incident_id && i.is_open() && i.is_assigned(unit_id))
            .map(|i| i.id.clone())
            .collect();

        let incident = self.incident_mut(incident_id)?;
        if !incident.is_assigned(unit_id) {
            incident.assigned_units.push(unit_id.to_string());
        }
        if !others.is_empty() {
            warn!(unit_id, incident_id, ?others, "unit already assigned to other open incidents");
        }

        let now = Utc::now();
        self.unit_mut(unit_id)?.set_status(UnitStatus::S3, now);
        self.refresh_proposal_unit(unit_id);
        info!(unit_id, incident_id, "unit assigned");
        self.reanalyze();
        Ok(())
    }

    /// Assigns a unit and marks the incident active.
    pub fn dispatch_unit(&mut self, incident_id: &str, unit_id: &str) -> Result<()> {
        self.assign_unit(incident_id, unit_id)?;
        self.update_incident_status(incident_id, IncidentStatus::Active)
    }

    /// Assigns every selected proposal unit that exists in the roster.
    pub fn alarm_proposal(&mut self, incident_id: &str) -> Result<AlarmOutcome> {
        self.incident(incident_id)?;
        let ids: Vec<String> = self
            .proposal
            .selected_units()
            .into_iter()
            .map(|u| u.id.clone())
            .collect();

        let mut outcome = AlarmOutcome::default();
        for id in ids {
            if self.unit(&id).is_err() {
                warn!(unit_id = %id, incident_id, "proposal unit not on roster; skipped");
                outcome.skipped.push(id);
                continue;
            }
            self.assign_unit(incident_id, &id)?;
            outcome.assigned.push(id);
        }

        if !outcome.assigned.is_empty() {
            self.update_incident_status(incident_id, IncidentStatus::Active)?;
        }
        Ok(outcome)
    }

    // ── units ────────────────────────────────────────────────────────────

    pub fn update_unit_status(&mut self, unit_id: &str, status: UnitStatus) -> Result<()> {
        let unit = self.unit_mut(unit_id)?;
        info!(unit_id, from = %unit.status, to = %status, "unit status changed");
        unit.set_status(status, Utc::now());
        self.refresh_proposal_unit(unit_id);
        self.reanalyze();
        Ok(())
    }

    /// Processes an S5 request; the unit returns to S3.
    pub fn acknowledge_voice_contact(&mut self, unit_id: &str) -> Result<()> {
        if !self.unit(unit_id)?.status.requests_voice_contact() {
            return Err(DispatchError::NotRequestingVoiceContact(unit_id.to_string()));
        }
        self.update_unit_status(unit_id, UnitStatus::S3)
    }

    /// Selects a unit, or clears the selection if it was already selected.
    pub fn toggle_unit_selection(&mut self, unit_id: &str) -> Result<Option<&str>> {
        self.unit(unit_id)?;
        if self.selected_unit_id.as_deref() == Some(unit_id) {
            self.selected_unit_id = None;
        } else {
            self.selected_unit_id = Some(unit_id.to_string());
        }
        Ok(self.selected_unit_id.as_deref())
    }

    // ── dispatch proposal ────────────────────────────────────────────────

    pub fn add_to_dispatch_proposal(&mut self, mut unit: Unit) -> bool {
        unit.eta.get_or_insert_with(|| DEFAULT_PICKER_ETA.to_string());
        unit.distance
            .get_or_insert_with(|| DEFAULT_PICKER_DISTANCE.to_string());
        self.proposal.add(unit)
    }

    /// Adds a roster unit by id, as the unit picker does.
    pub fn add_roster_unit_to_proposal(&mut self, unit_id: &str) -> Result<bool> {
        let unit = self.unit(unit_id)?.clone();
        Ok(self.add_to_dispatch_proposal(unit))
    }

    pub fn remove_from_dispatch_proposal(&mut self, unit_id: &str) -> Option<Unit> {
        self.proposal.remove(unit_id)
    }

    pub fn toggle_resource_selection(&mut self, unit_id: &str, provenance: Provenance) -> Result<bool> {
        self.proposal.toggle(unit_id, provenance)
    }

    // ── call intake ──────────────────────────────────────────────────────

    pub fn add_key_fact(&mut self, tag: &str) -> Option<Classification> {
        self.intake.add_key_fact(tag)
    }

    pub fn remove_key_fact(&mut self, tag: &str) -> bool {
        self.intake.remove_key_fact(tag)
    }

    pub fn select_classification(&mut self, code: &str, description: &str) {
        self.intake.select_classification(code, description);
    }

    pub fn clear_manual_code(&mut self) {
        self.intake.clear_manual_code();
    }

    pub fn edit_call_field(&mut self, field: CallField, value: &str) {
        self.intake.edit_field(field, value);
        self.reanalyze();
    }

    pub fn drop_on_field(&mut self, field: CallField, text: &str, dragged_kind: Option<&str>) -> bool {
        let accepted = self.intake.drop_text(field, text, dragged_kind);
        if accepted {
            self.reanalyze();
        }
        accepted
    }

    pub fn append_transcript(&mut self, line: impl Into<String>) {
        self.intake.append_transcript(line);
        self.reanalyze();
    }

    pub fn set_scheduled_transport(&mut self, scheduled: Option<ScheduledTransport>) {
        self.intake.set_scheduled(scheduled);
    }

    pub fn set_affected_person_count(&mut self, count: Option<u32>) {
        self.intake.set_affected_person_count(count);
    }

    // ── recommendation ───────────────────────────────────────────────────

    pub fn accept_recommendation(&mut self) -> Result<()> {
        self.supervisor.accept()
    }

    pub fn reject_recommendation(&mut self) -> Result<()> {
        self.supervisor.reject()
    }

    pub fn add_recommended_category(&mut self, category: &str) -> Result<()> {
        self.supervisor.add_unit(category)
    }

    pub fn remove_recommended_category(&mut self, category: &str) -> Result<()> {
        self.supervisor.remove_unit(category)
    }

    pub fn trigger_quick_action(&mut self, code: &str) -> Result<()> {
        let action = protocols::find_quick_action(code)
            .ok_or_else(|| DispatchError::UnknownQuickAction(code.to_string()))?;
        self.supervisor.manual_trigger(&action);
        Ok(())
    }

    /// Re-runs the supervisor. Returns `true` if the recommendation changed.
    pub fn reanalyze(&mut self) -> bool {
        self.supervisor.observe(&self.intake, &self.units)
    }

    fn refresh_proposal_unit(&mut self, unit_id: &str) {
        if let Some(unit) = self.units.iter().find(|u| u.id == unit_id) {
            self.proposal.refresh_unit(unit);
        }
    }

    fn unit_mut(&mut self, unit_id: &str) -> Result<&mut Unit> {
        self.units
            .iter_mut()
            .find(|u| u.id == unit_id)
            .ok_or_else(|| DispatchError::UnknownUnit(unit_id.to_string()))
    }

    fn incident_mut(&mut self, incident_id: &str) -> Result<&mut Incident> {
        self.incidents
            .iter_mut()
            .find(|i| i.id == incident_id)
            .ok_or_else(|| DispatchError::UnknownIncident(incident_id.to_string()))
    }
}
