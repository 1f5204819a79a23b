use crate::drop;
use crate::error::ConsoleError;
use crate::state::AppState;
use chrono::Utc;
use dispatch_core::call::{CallData, CallField, ScheduledTransport};
use dispatch_core::hospitals::Hospital;
use dispatch_core::incidents::{Incident, IncidentFilter, IncidentLocation, IncidentStatus, Priority};
use dispatch_core::proposal::{ProposalEntry, Provenance, Readiness, RouteStatus};
use dispatch_core::protocols::{self, QuickAction};
use dispatch_core::store::AssignmentConflict;
use dispatch_core::supervisor::{Advisory, AiRecommendation, Sentiment, VoiceContactNotice};
use dispatch_core::units::{Unit, UnitStatus};
use dispatch_core::{CadState, DispatchError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{info, warn};

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnitDto {
    #[serde(flatten)]
    pub unit: Unit,
    pub status_label: String,
    pub minutes_in_status: i64,
    pub overdue: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RosterDto {
    pub ems: Vec<UnitDto>,
    pub fire: Vec<UnitDto>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionDto {
    pub selected_unit_id: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncidentDto {
    #[serde(flatten)]
    pub incident: Incident,
    pub headline: String,
}

/// Incident as entered by the dispatcher; status, creation time and
/// assignments are filled in on creation.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewIncident {
    pub id: String,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub keyword: Option<String>,
    #[serde(rename = "type")]
    pub incident_type: String,
    pub category: String,
    pub location: IncidentLocation,
    pub priority: Priority,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallDto {
    pub call: CallData,
    pub key_facts: Vec<String>,
    pub derived_fields: Vec<CallField>,
    pub manual_code: bool,
    pub dispatch_ready: bool,
    pub sentiment: Sentiment,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProposalEntryDto {
    pub unit: Unit,
    pub provenance: Provenance,
    pub match_score: u8,
    pub selected: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub traffic_info: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub equipment: Option<Readiness>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crew: Option<Readiness>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub route: Option<RouteStatus>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProposalDto {
    pub entries: Vec<ProposalEntryDto>,
    pub selected_count: usize,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComplianceDto {
    pub required: Vec<String>,
    pub checks: BTreeMap<String, bool>,
    pub missing: Vec<String>,
    pub compliant: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum AdvisoryDto {
    VoiceContact { notice: VoiceContactNotice },
    Recommendation { recommendation: AiRecommendation },
    Idle {
        #[serde(rename = "quickActions")]
        quick_actions: Vec<QuickAction>,
    },
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum RecommendationDecision {
    Accept,
    Reject,
    AddUnit { category: String },
    RemoveUnit { category: String },
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlarmDto {
    pub incident: Incident,
    pub assigned: Vec<String>,
    pub skipped: Vec<String>,
}

fn unit_dto(unit: &Unit) -> UnitDto {
    let now = Utc::now();
    UnitDto {
        unit: unit.clone(),
        status_label: unit.status.label().to_string(),
        minutes_in_status: unit.minutes_in_status(now),
        overdue: unit.is_overdue(now),
    }
}

fn incident_dto(incident: &Incident) -> IncidentDto {
    IncidentDto {
        headline: incident.headline().to_string(),
        incident: incident.clone(),
    }
}

fn call_dto(cad: &CadState) -> CallDto {
    let intake = cad.intake();
    CallDto {
        call: intake.call().clone(),
        key_facts: intake.key_facts().to_vec(),
        derived_fields: intake.derived_fields().iter().copied().collect(),
        manual_code: intake.has_manual_code(),
        dispatch_ready: intake.is_dispatch_ready(),
        sentiment: cad.sentiment(),
    }
}

fn entry_dto(entry: &ProposalEntry<'_>) -> ProposalEntryDto {
    let mut dto = ProposalEntryDto {
        unit: entry.unit().clone(),
        provenance: entry.provenance(),
        match_score: entry.match_score(),
        selected: entry.is_selected(),
        traffic_info: None,
        equipment: None,
        crew: None,
        route: None,
    };
    if let ProposalEntry::Recommended { recommendation, .. } = entry {
        dto.traffic_info = Some(recommendation.traffic_info.clone());
        dto.equipment = Some(recommendation.equipment);
        dto.crew = Some(recommendation.crew);
        dto.route = Some(recommendation.route);
    }
    dto
}

pub(crate) fn advisory_dto(cad: &CadState) -> AdvisoryDto {
    match cad.advisory() {
        Advisory::VoiceContact(notice) => AdvisoryDto::VoiceContact { notice },
        Advisory::Recommendation(rec) => AdvisoryDto::Recommendation {
            recommendation: rec.clone(),
        },
        Advisory::Idle => AdvisoryDto::Idle {
            quick_actions: protocols::quick_actions(),
        },
    }
}

// ── incidents & units ───────────────────────────────────────────────────

pub fn list_incidents(state: &AppState, filter: IncidentFilter) -> Result<Vec<Incident>, ConsoleError> {
    state.with_cad(|cad| Ok(cad.filtered_incidents(filter).into_iter().cloned().collect()))
}

/// Everything not yet closed, as offered in the dispatch action panel.
pub fn list_open_incidents(state: &AppState) -> Result<Vec<IncidentDto>, ConsoleError> {
    state.with_cad(|cad| Ok(cad.open_incidents().into_iter().map(incident_dto).collect()))
}

pub fn add_incident(state: &AppState, new: NewIncident) -> Result<IncidentDto, ConsoleError> {
    if new.id.trim().is_empty() {
        return Err(ConsoleError::Payload("incident id is required".into()));
    }
    let incident = Incident {
        id: new.id,
        code: new.code,
        keyword: new.keyword,
        incident_type: new.incident_type,
        category: new.category,
        location: new.location,
        priority: new.priority,
        status: IncidentStatus::Open,
        created_at: Utc::now(),
        description: new.description,
        assigned_units: Vec::new(),
    };
    state.with_cad(|cad| {
        let dto = incident_dto(&incident);
        cad.add_incident(incident)?;
        Ok(dto)
    })
}

pub fn update_incident_status(
    state: &AppState,
    incident_id: String,
    status: IncidentStatus,
) -> Result<IncidentDto, ConsoleError> {
    state.with_cad(|cad| {
        cad.update_incident_status(&incident_id, status)?;
        Ok(incident_dto(cad.incident(&incident_id)?))
    })
}

pub fn list_assignment_conflicts(state: &AppState) -> Result<Vec<AssignmentConflict>, ConsoleError> {
    state.with_cad(|cad| Ok(cad.assignment_conflicts()))
}

/// Roster, optionally narrowed by a call-sign / type search.
pub fn list_units(state: &AppState, search: Option<String>) -> Result<Vec<UnitDto>, ConsoleError> {
    state.with_cad(|cad| {
        let term = search.as_deref().unwrap_or("");
        Ok(cad
            .units()
            .iter()
            .filter(|u| u.matches_search(term))
            .map(unit_dto)
            .collect())
    })
}

/// Units in S1/S2, optionally narrowed by search.
pub fn list_free_units(state: &AppState, search: Option<String>) -> Result<Vec<UnitDto>, ConsoleError> {
    state.with_cad(|cad| {
        Ok(cad
            .free_units(search.as_deref().unwrap_or(""))
            .into_iter()
            .map(unit_dto)
            .collect())
    })
}

/// Unit picker listing, grouped into EMS and fire.
pub fn roster_search(state: &AppState, search: Option<String>) -> Result<RosterDto, ConsoleError> {
    state.with_cad(|cad| {
        let groups = cad.roster_search(search.as_deref().unwrap_or(""));
        Ok(RosterDto {
            ems: groups.ems.iter().map(unit_dto).collect(),
            fire: groups.fire.iter().map(unit_dto).collect(),
        })
    })
}

pub fn list_overdue_units(state: &AppState) -> Result<Vec<UnitDto>, ConsoleError> {
    state.with_cad(|cad| Ok(cad.overdue_units(Utc::now()).into_iter().map(unit_dto).collect()))
}

pub fn toggle_unit_selection(state: &AppState, unit_id: String) -> Result<SelectionDto, ConsoleError> {
    state.with_cad(|cad| {
        let selected = cad.toggle_unit_selection(&unit_id)?.map(ToString::to_string);
        Ok(SelectionDto {
            selected_unit_id: selected,
        })
    })
}

pub fn update_unit_status(state: &AppState, unit_id: String, status: String) -> Result<UnitDto, ConsoleError> {
    let status: UnitStatus = status.parse()?;
    state.with_cad(|cad| {
        cad.update_unit_status(&unit_id, status)?;
        Ok(unit_dto(cad.unit(&unit_id)?))
    })
}

pub fn acknowledge_voice_contact(state: &AppState, unit_id: String) -> Result<UnitDto, ConsoleError> {
    state.with_cad(|cad| {
        cad.acknowledge_voice_contact(&unit_id)?;
        info!(unit_id = %unit_id, "voice contact acknowledged");
        Ok(unit_dto(cad.unit(&unit_id)?))
    })
}

pub fn dispatch_unit(state: &AppState, incident_id: String, unit_id: String) -> Result<Incident, ConsoleError> {
    state.with_cad(|cad| {
        cad.dispatch_unit(&incident_id, &unit_id)?;
        Ok(cad.incident(&incident_id)?.clone())
    })
}

pub fn alarm_proposal(state: &AppState, incident_id: String) -> Result<AlarmDto, ConsoleError> {
    state.with_cad(|cad| {
        let outcome = cad.alarm_proposal(&incident_id)?;
        info!(
            incident_id = %incident_id,
            assigned = outcome.assigned.len(),
            skipped = outcome.skipped.len(),
            "proposal alarmed"
        );
        Ok(AlarmDto {
            incident: cad.incident(&incident_id)?.clone(),
            assigned: outcome.assigned,
            skipped: outcome.skipped,
        })
    })
}

pub fn list_hospitals(state: &AppState) -> Result<Vec<Hospital>, ConsoleError> {
    state.with_cad(|cad| Ok(cad.hospitals()))
}

/// `None` when no hospital with free beds lists the specialty.
pub fn nearest_hospital(state: &AppState, specialty: String) -> Result<Option<Hospital>, ConsoleError> {
    state.with_cad(|cad| Ok(cad.nearest_accepting_hospital(&specialty).cloned()))
}

// ── call intake ─────────────────────────────────────────────────────────

pub fn get_call(state: &AppState) -> Result<CallDto, ConsoleError> {
    state.with_cad(|cad| Ok(call_dto(cad)))
}

pub fn add_key_fact(state: &AppState, tag: String) -> Result<CallDto, ConsoleError> {
    state.with_cad(|cad| {
        if let Some(classification) = cad.add_key_fact(&tag) {
            info!(code = %classification.code, "call classified from tag");
        }
        Ok(call_dto(cad))
    })
}

pub fn remove_key_fact(state: &AppState, tag: String) -> Result<CallDto, ConsoleError> {
    state.with_cad(|cad| {
        cad.remove_key_fact(&tag);
        Ok(call_dto(cad))
    })
}

pub fn clear_manual_code(state: &AppState) -> Result<CallDto, ConsoleError> {
    state.with_cad(|cad| {
        cad.clear_manual_code();
        Ok(call_dto(cad))
    })
}

pub fn select_classification(state: &AppState, code: String, description: String) -> Result<CallDto, ConsoleError> {
    if code.trim().is_empty() {
        return Err(ConsoleError::Payload("classification code is required".into()));
    }
    state.with_cad(|cad| {
        cad.select_classification(&code, &description);
        Ok(call_dto(cad))
    })
}

pub fn edit_call_field(state: &AppState, field: CallField, value: String) -> Result<CallDto, ConsoleError> {
    state.with_cad(|cad| {
        cad.edit_call_field(field, &value);
        Ok(call_dto(cad))
    })
}

/// Returns whether the drop was accepted.
pub fn drop_on_field(
    state: &AppState,
    field: CallField,
    text: String,
    dragged_kind: Option<String>,
) -> Result<bool, ConsoleError> {
    state.with_cad(|cad| Ok(cad.drop_on_field(field, &text, dragged_kind.as_deref())))
}

pub fn append_transcript(state: &AppState, line: String) -> Result<CallDto, ConsoleError> {
    state.with_cad(|cad| {
        cad.append_transcript(line);
        Ok(call_dto(cad))
    })
}

pub fn set_scheduled_transport(
    state: &AppState,
    scheduled: Option<ScheduledTransport>,
) -> Result<CallDto, ConsoleError> {
    state.with_cad(|cad| {
        cad.set_scheduled_transport(scheduled);
        Ok(call_dto(cad))
    })
}

pub fn set_affected_person_count(state: &AppState, count: Option<u32>) -> Result<CallDto, ConsoleError> {
    state.with_cad(|cad| {
        cad.set_affected_person_count(count);
        Ok(call_dto(cad))
    })
}

// ── dispatch proposal ───────────────────────────────────────────────────

pub fn get_proposal(state: &AppState) -> Result<ProposalDto, ConsoleError> {
    state.with_cad(|cad| {
        let entries: Vec<ProposalEntryDto> = cad.proposal().entries().iter().map(entry_dto).collect();
        let selected_count = entries.iter().filter(|e| e.selected).count();
        Ok(ProposalDto {
            entries,
            selected_count,
        })
    })
}

/// Adds a roster unit by id. Returns `false` if it was already proposed.
pub fn add_unit_to_proposal(state: &AppState, unit_id: String) -> Result<bool, ConsoleError> {
    state.with_cad(|cad| Ok(cad.add_roster_unit_to_proposal(&unit_id)?))
}

/// Adds a dragged unit or map vehicle. Malformed payloads are logged and
/// ignored.
pub fn drop_unit_payload(state: &AppState, raw: String) -> Result<bool, ConsoleError> {
    let unit = match drop::parse_drop_payload(&raw) {
        Ok(unit) => unit,
        Err(err) => {
            warn!(error = %err, "ignoring malformed drop payload");
            return Ok(false);
        }
    };
    state.with_cad(|cad| Ok(cad.add_to_dispatch_proposal(unit)))
}

pub fn remove_unit_from_proposal(state: &AppState, unit_id: String) -> Result<bool, ConsoleError> {
    state.with_cad(|cad| Ok(cad.remove_from_dispatch_proposal(&unit_id).is_some()))
}

/// Flips one unit's selection. Without an explicit provenance the unit's
/// current one is used.
pub fn toggle_resource(
    state: &AppState,
    unit_id: String,
    provenance: Option<Provenance>,
) -> Result<bool, ConsoleError> {
    state.with_cad(|cad| {
        let provenance = provenance
            .or_else(|| cad.proposal().provenance_of(&unit_id))
            .ok_or_else(|| DispatchError::NotInProposal(unit_id.clone()))?;
        Ok(cad.toggle_resource_selection(&unit_id, provenance)?)
    })
}

pub fn get_compliance(state: &AppState) -> Result<ComplianceDto, ConsoleError> {
    let fallback = state.config.required_categories.clone();
    state.with_cad(|cad| {
        let required = cad.required_categories(&fallback);
        let report = cad.compliance(&fallback);
        Ok(ComplianceDto {
            required,
            checks: report.as_map(),
            missing: report.missing().into_iter().map(ToString::to_string).collect(),
            compliant: report.is_compliant(),
        })
    })
}

// ── advisory ────────────────────────────────────────────────────────────

pub fn get_advisory(state: &AppState) -> Result<AdvisoryDto, ConsoleError> {
    state.with_cad(|cad| Ok(advisory_dto(cad)))
}

pub fn decide_recommendation(state: &AppState, decision: RecommendationDecision) -> Result<AdvisoryDto, ConsoleError> {
    state.with_cad(|cad| {
        match &decision {
            RecommendationDecision::Accept => cad.accept_recommendation()?,
            RecommendationDecision::Reject => cad.reject_recommendation()?,
            RecommendationDecision::AddUnit { category } => cad.add_recommended_category(category)?,
            RecommendationDecision::RemoveUnit { category } => cad.remove_recommended_category(category)?,
        }
        Ok(advisory_dto(cad))
    })
}

pub fn trigger_quick_action(state: &AppState, code: String) -> Result<AdvisoryDto, ConsoleError> {
    state.with_cad(|cad| {
        cad.trigger_quick_action(&code)?;
        Ok(advisory_dto(cad))
    })
}
