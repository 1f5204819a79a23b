use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post, put};
use axum::{Json, Router};
use console::commands::{self, NewIncident, RecommendationDecision};
use console::error::ConsoleError;
use console::state::AppState;
use dispatch_core::call::{CallField, ScheduledTransport};
use dispatch_core::hospitals::Hospital;
use dispatch_core::incidents::{IncidentFilter, IncidentStatus};
use dispatch_core::proposal::Provenance;
use dispatch_core::DispatchError;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

pub struct ApiError(ConsoleError);

impl From<ConsoleError> for ApiError {
    fn from(err: ConsoleError) -> Self {
        Self(err)
    }
}

pub fn status_for(err: &ConsoleError) -> StatusCode {
    match err {
        ConsoleError::Dispatch(e) => match e {
            DispatchError::UnknownUnit(_)
            | DispatchError::UnknownIncident(_)
            | DispatchError::NotInProposal(_) => StatusCode::NOT_FOUND,
            DispatchError::NoRecommendation
            | DispatchError::NotRequestingVoiceContact(_)
            | DispatchError::DuplicateIncident(_) => StatusCode::CONFLICT,
            DispatchError::UnknownQuickAction(_)
            | DispatchError::InvalidStatus(_)
            | DispatchError::InvalidUnitType(_)
            | DispatchError::InvalidPriority(_) => StatusCode::BAD_REQUEST,
        },
        ConsoleError::Payload(_) | ConsoleError::Json(_) => StatusCode::BAD_REQUEST,
        ConsoleError::Config(_) | ConsoleError::StatePoisoned => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = status_for(&self.0);
        if status.is_server_error() {
            error!(error = %self.0, "request failed");
        } else {
            debug!(error = %self.0, %status, "request rejected");
        }
        (status, Json(serde_json::json!({ "error": self.0.to_string() }))).into_response()
    }
}

type ApiResult<T> = Result<Json<T>, ApiError>;

#[derive(Debug, Default, Deserialize)]
pub struct IncidentQuery {
    #[serde(default)]
    pub filter: IncidentFilter,
}

#[derive(Debug, Default, Deserialize)]
pub struct UnitQuery {
    pub search: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct HospitalQuery {
    #[serde(default)]
    pub specialty: String,
}

#[derive(Debug, Deserialize)]
pub struct IncidentStatusBody {
    pub status: IncidentStatus,
}

#[derive(Debug, Deserialize)]
pub struct ScheduledBody {
    pub scheduled: Option<ScheduledTransport>,
}

#[derive(Debug, Deserialize)]
pub struct PersonCountBody {
    pub count: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct StatusBody {
    pub status: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnitRef {
    pub unit_id: String,
}

#[derive(Debug, Deserialize)]
pub struct TagBody {
    pub tag: String,
}

#[derive(Debug, Deserialize)]
pub struct ClassificationBody {
    pub code: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Deserialize)]
pub struct FieldBody {
    pub field: CallField,
    pub value: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDropBody {
    pub field: CallField,
    pub text: String,
    pub dragged_kind: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TranscriptBody {
    pub line: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToggleBody {
    pub unit_id: String,
    pub provenance: Option<Provenance>,
}

#[derive(Debug, Deserialize)]
pub struct QuickActionBody {
    pub code: String,
}

#[derive(Debug, Serialize)]
pub struct Changed {
    pub changed: bool,
}

pub fn console_router(state: AppState) -> Router {
    Router::new()
        .route("/incidents", get(list_incidents).post(add_incident))
        .route("/incidents/open", get(list_open_incidents))
        .route("/incidents/conflicts", get(list_conflicts))
        .route("/incidents/:id/status", post(update_incident_status))
        .route("/incidents/:id/dispatch", post(dispatch_unit))
        .route("/incidents/:id/alarm", post(alarm_proposal))
        .route("/units", get(list_units))
        .route("/units/free", get(list_free_units))
        .route("/units/roster", get(roster_search))
        .route("/units/overdue", get(list_overdue_units))
        .route("/units/:id/status", post(update_unit_status))
        .route("/units/:id/acknowledge", post(acknowledge_voice_contact))
        .route("/units/:id/select", post(toggle_unit_selection))
        .route("/call", get(get_call))
        .route("/call/tags", post(add_key_fact))
        .route("/call/tags/:tag", delete(remove_key_fact))
        .route(
            "/call/classification",
            post(select_classification).delete(clear_manual_code),
        )
        .route("/call/fields", post(edit_call_field))
        .route("/call/drop", post(drop_on_field))
        .route("/call/transcript", post(append_transcript))
        .route("/call/scheduled", put(set_scheduled_transport))
        .route("/call/affected-persons", put(set_affected_person_count))
        .route("/proposal", get(get_proposal))
        .route("/proposal/units", post(add_unit_to_proposal))
        .route("/proposal/units/:id", delete(remove_unit_from_proposal))
        .route("/proposal/drop", post(drop_unit_payload))
        .route("/proposal/toggle", post(toggle_resource))
        .route("/compliance", get(get_compliance))
        .route("/advisory", get(get_advisory))
        .route("/advisory/decision", post(decide_recommendation))
        .route("/advisory/quick-action", post(trigger_quick_action))
        .route("/hospitals", get(list_hospitals))
        .route("/hospitals/nearest", get(nearest_hospital))
        .with_state(state)
}

async fn list_incidents(
    State(state): State<AppState>,
    Query(query): Query<IncidentQuery>,
) -> ApiResult<Vec<dispatch_core::incidents::Incident>> {
    Ok(Json(commands::list_incidents(&state, query.filter)?))
}

async fn add_incident(
    State(state): State<AppState>,
    Json(body): Json<NewIncident>,
) -> ApiResult<commands::IncidentDto> {
    Ok(Json(commands::add_incident(&state, body)?))
}

async fn list_open_incidents(State(state): State<AppState>) -> ApiResult<Vec<commands::IncidentDto>> {
    Ok(Json(commands::list_open_incidents(&state)?))
}

async fn update_incident_status(
    State(state): State<AppState>,
    Path(incident_id): Path<String>,
    Json(body): Json<IncidentStatusBody>,
) -> ApiResult<commands::IncidentDto> {
    Ok(Json(commands::update_incident_status(&state, incident_id, body.status)?))
}

async fn list_conflicts(
    State(state): State<AppState>,
) -> ApiResult<Vec<dispatch_core::store::AssignmentConflict>> {
    Ok(Json(commands::list_assignment_conflicts(&state)?))
}

async fn dispatch_unit(
    State(state): State<AppState>,
    Path(incident_id): Path<String>,
    Json(body): Json<UnitRef>,
) -> ApiResult<dispatch_core::incidents::Incident> {
    Ok(Json(commands::dispatch_unit(&state, incident_id, body.unit_id)?))
}

async fn alarm_proposal(
    State(state): State<AppState>,
    Path(incident_id): Path<String>,
) -> ApiResult<commands::AlarmDto> {
    Ok(Json(commands::alarm_proposal(&state, incident_id)?))
}

async fn list_units(
    State(state): State<AppState>,
    Query(query): Query<UnitQuery>,
) -> ApiResult<Vec<commands::UnitDto>> {
    Ok(Json(commands::list_units(&state, query.search)?))
}

async fn list_free_units(
    State(state): State<AppState>,
    Query(query): Query<UnitQuery>,
) -> ApiResult<Vec<commands::UnitDto>> {
    Ok(Json(commands::list_free_units(&state, query.search)?))
}

async fn roster_search(
    State(state): State<AppState>,
    Query(query): Query<UnitQuery>,
) -> ApiResult<commands::RosterDto> {
    Ok(Json(commands::roster_search(&state, query.search)?))
}

async fn list_overdue_units(State(state): State<AppState>) -> ApiResult<Vec<commands::UnitDto>> {
    Ok(Json(commands::list_overdue_units(&state)?))
}

async fn toggle_unit_selection(
    State(state): State<AppState>,
    Path(unit_id): Path<String>,
) -> ApiResult<commands::SelectionDto> {
    Ok(Json(commands::toggle_unit_selection(&state, unit_id)?))
}

async fn update_unit_status(
    State(state): State<AppState>,
    Path(unit_id): Path<String>,
    Json(body): Json<StatusBody>,
) -> ApiResult<commands::UnitDto> {
    Ok(Json(commands::update_unit_status(&state, unit_id, body.status)?))
}

async fn acknowledge_voice_contact(
    State(state): State<AppState>,
    Path(unit_id): Path<String>,
) -> ApiResult<commands::UnitDto> {
    Ok(Json(commands::acknowledge_voice_contact(&state, unit_id)?))
}

async fn get_call(State(state): State<AppState>) -> ApiResult<commands::CallDto> {
    Ok(Json(commands::get_call(&state)?))
}

async fn add_key_fact(
    State(state): State<AppState>,
    Json(body): Json<TagBody>,
) -> ApiResult<commands::CallDto> {
    Ok(Json(commands::add_key_fact(&state, body.tag)?))
}

async fn remove_key_fact(
    State(state): State<AppState>,
    Path(tag): Path<String>,
) -> ApiResult<commands::CallDto> {
    Ok(Json(commands::remove_key_fact(&state, tag)?))
}

async fn clear_manual_code(State(state): State<AppState>) -> ApiResult<commands::CallDto> {
    Ok(Json(commands::clear_manual_code(&state)?))
}

async fn select_classification(
    State(state): State<AppState>,
    Json(body): Json<ClassificationBody>,
) -> ApiResult<commands::CallDto> {
    Ok(Json(commands::select_classification(&state, body.code, body.description)?))
}

async fn edit_call_field(
    State(state): State<AppState>,
    Json(body): Json<FieldBody>,
) -> ApiResult<commands::CallDto> {
    Ok(Json(commands::edit_call_field(&state, body.field, body.value)?))
}

async fn drop_on_field(
    State(state): State<AppState>,
    Json(body): Json<FieldDropBody>,
) -> ApiResult<Changed> {
    let changed = commands::drop_on_field(&state, body.field, body.text, body.dragged_kind)?;
    Ok(Json(Changed { changed }))
}

async fn append_transcript(
    State(state): State<AppState>,
    Json(body): Json<TranscriptBody>,
) -> ApiResult<commands::CallDto> {
    Ok(Json(commands::append_transcript(&state, body.line)?))
}

async fn set_scheduled_transport(
    State(state): State<AppState>,
    Json(body): Json<ScheduledBody>,
) -> ApiResult<commands::CallDto> {
    Ok(Json(commands::set_scheduled_transport(&state, body.scheduled)?))
}

async fn set_affected_person_count(
    State(state): State<AppState>,
    Json(body): Json<PersonCountBody>,
) -> ApiResult<commands::CallDto> {
    Ok(Json(commands::set_affected_person_count(&state, body.count)?))
}

async fn get_proposal(State(state): State<AppState>) -> ApiResult<commands::ProposalDto> {
    Ok(Json(commands::get_proposal(&state)?))
}

async fn add_unit_to_proposal(
    State(state): State<AppState>,
    Json(body): Json<UnitRef>,
) -> ApiResult<Changed> {
    let changed = commands::add_unit_to_proposal(&state, body.unit_id)?;
    Ok(Json(Changed { changed }))
}

async fn remove_unit_from_proposal(
    State(state): State<AppState>,
    Path(unit_id): Path<String>,
) -> ApiResult<Changed> {
    let changed = commands::remove_unit_from_proposal(&state, unit_id)?;
    Ok(Json(Changed { changed }))
}

/// Takes the raw drag payload so malformed JSON is ignored rather than
/// rejected by the extractor.
async fn drop_unit_payload(State(state): State<AppState>, body: String) -> ApiResult<Changed> {
    let changed = commands::drop_unit_payload(&state, body)?;
    Ok(Json(Changed { changed }))
}

async fn toggle_resource(
    State(state): State<AppState>,
    Json(body): Json<ToggleBody>,
) -> ApiResult<serde_json::Value> {
    let selected = commands::toggle_resource(&state, body.unit_id, body.provenance)?;
    Ok(Json(serde_json::json!({ "selected": selected })))
}

async fn get_compliance(State(state): State<AppState>) -> ApiResult<commands::ComplianceDto> {
    Ok(Json(commands::get_compliance(&state)?))
}

async fn get_advisory(State(state): State<AppState>) -> ApiResult<commands::AdvisoryDto> {
    Ok(Json(commands::get_advisory(&state)?))
}

async fn decide_recommendation(
    State(state): State<AppState>,
    Json(decision): Json<RecommendationDecision>,
) -> ApiResult<commands::AdvisoryDto> {
    Ok(Json(commands::decide_recommendation(&state, decision)?))
}

async fn trigger_quick_action(
    State(state): State<AppState>,
    Json(body): Json<QuickActionBody>,
) -> ApiResult<commands::AdvisoryDto> {
    Ok(Json(commands::trigger_quick_action(&state, body.code)?))
}

async fn list_hospitals(State(state): State<AppState>) -> ApiResult<Vec<Hospital>> {
    Ok(Json(commands::list_hospitals(&state)?))
}

/// `null` when no hospital with free beds lists the specialty.
async fn nearest_hospital(
    State(state): State<AppState>,
    Query(query): Query<HospitalQuery>,
) -> ApiResult<Option<Hospital>> {
    Ok(Json(commands::nearest_hospital(&state, query.specialty)?))
}
