use chrono::Utc;
use dispatch_core::call::CallData;
use dispatch_core::incidents::{Incident, IncidentLocation, IncidentStatus, Priority};
use dispatch_core::proposal::{Provenance, Readiness, Recommendation, RouteStatus};
use dispatch_core::rules::classify_tag;
use dispatch_core::seed;
use dispatch_core::supervisor::Advisory;
use dispatch_core::units::{GeoPoint, Unit, UnitStatus, UnitType};
use dispatch_core::CadState;
use std::collections::BTreeMap;

fn unit(id: &str, unit_type: UnitType, status: UnitStatus) -> Unit {
    Unit::new(
        id,
        format!("Florian München {id}"),
        unit_type,
        status,
        GeoPoint { lat: 48.137, lng: 11.575 },
        Utc::now(),
    )
}

fn open_incident(id: &str) -> Incident {
    Incident {
        id: id.into(),
        code: None,
        keyword: None,
        incident_type: "Unclassified".into(),
        category: "Rescue".into(),
        location: IncidentLocation {
            address: "1 Marienplatz, 80331 Munich".into(),
            lat: 48.137,
            lng: 11.575,
        },
        priority: Priority::Two,
        status: IncidentStatus::Open,
        created_at: Utc::now(),
        description: None,
        assigned_units: Vec::new(),
    }
}

fn required(codes: &[&str]) -> Vec<String> {
    codes.iter().map(|c| c.to_string()).collect()
}

#[test]
fn fire_tags_classify_as_b3_priority_one() {
    for tag in ["Fire on 2nd floor", "Brandgeruch", "smoke in stairwell", "RAUCH", "wildfire"] {
        let classification = classify_tag(tag).expect(tag);
        assert_eq!(classification.code, "B3", "tag {tag}");
        assert_eq!(classification.priority, Priority::One);
    }
    assert!(classify_tag("fell down the stairs").is_none());
}

#[test]
fn deselected_hlf_and_missing_nef_fail_compliance() {
    let rtw = unit("UNIT-001", UnitType::Rtw, UnitStatus::S1);
    let hlf = unit("UNIT-002", UnitType::Hlf, UnitStatus::S1);
    let mut state = CadState::new(
        vec![open_incident("INC-1")],
        vec![rtw.clone(), hlf.clone()],
        Vec::new(),
        CallData::default(),
        Vec::new(),
    );

    assert!(state.add_to_dispatch_proposal(rtw));
    assert!(state.add_to_dispatch_proposal(hlf));
    assert_eq!(state.toggle_resource_selection("UNIT-002", Provenance::Manual), Ok(false));

    let report = state.compliance(&required(&["RTW", "NEF", "HLF"]));
    let expected: BTreeMap<String, bool> = [("RTW", true), ("NEF", false), ("HLF", false)]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();
    assert_eq!(report.as_map(), expected);
}

#[test]
fn recommendation_and_manual_units_reconcile_into_one_proposal() {
    let mut state = CadState::new(
        vec![open_incident("INC-1")],
        vec![unit("UNIT-009", UnitType::Nef, UnitStatus::S2)],
        Vec::new(),
        CallData::default(),
        vec![Recommendation {
            unit: unit("REC-1", UnitType::Rtw, UnitStatus::S2),
            match_score: 94,
            traffic_info: "Clear".into(),
            equipment: Readiness::Ready,
            crew: Readiness::Ready,
            route: RouteStatus::Optimal,
        }],
    );

    assert_eq!(state.add_roster_unit_to_proposal("UNIT-009"), Ok(true));
    assert_eq!(state.add_roster_unit_to_proposal("UNIT-009"), Ok(false));
    assert_eq!(state.proposal().len(), 2);

    state.toggle_resource_selection("UNIT-009", Provenance::Manual).expect("toggle");
    let removed = state.remove_from_dispatch_proposal("UNIT-009").expect("manual unit");
    assert!(state.add_to_dispatch_proposal(removed));
    let entries = state.proposal().entries();
    assert!(entries.iter().all(|e| e.is_selected()));
    assert_eq!(entries[0].provenance(), Provenance::Recommended);
    assert_eq!(entries[1].provenance(), Provenance::Manual);
}

#[test]
fn voice_contact_request_suppresses_recommendation_swapping() {
    let mut state = CadState::new(
        vec![open_incident("INC-1")],
        vec![unit("UNIT-001", UnitType::Rtw, UnitStatus::S1)],
        Vec::new(),
        CallData::default(),
        Vec::new(),
    );

    state.assign_unit("INC-1", "UNIT-001").expect("assign");
    assert_eq!(state.unit("UNIT-001").map(|u| u.status), Ok(UnitStatus::S3));

    state.append_transcript("Es brennt! Feuer im Dachstuhl.");
    assert_eq!(
        state.supervisor().recommendation().map(|r| r.code.as_str()),
        Some("B3")
    );

    state.update_unit_status("UNIT-001", UnitStatus::S5).expect("s5");
    match state.advisory() {
        Advisory::VoiceContact(notice) => {
            assert_eq!(notice.unit_ids, vec!["UNIT-001"]);
            assert!(notice.message.contains("Florian München UNIT-001"));
        }
        other => panic!("expected voice contact notice, got {other:?}"),
    }

    state.append_transcript("Der Mann atmet nicht mehr, Reanimation!");
    assert_eq!(
        state.supervisor().recommendation().map(|r| r.code.as_str()),
        Some("B3"),
        "recommendation must not swap while S5 is pending"
    );

    state.acknowledge_voice_contact("UNIT-001").expect("ack");
    assert_eq!(state.unit("UNIT-001").map(|u| u.status), Ok(UnitStatus::S3));
    match state.advisory() {
        Advisory::Recommendation(rec) => assert_eq!(rec.code, "R0"),
        other => panic!("expected recommendation, got {other:?}"),
    }
}

#[test]
fn alarming_the_seeded_proposal_commits_recommended_units() {
    let mut state = seed::demo_state(20, Utc::now());
    state
        .toggle_resource_selection("REC-4", Provenance::Recommended)
        .expect("toggle");

    let outcome = state.alarm_proposal("INC-2025-004").expect("alarm");
    assert_eq!(outcome.assigned, vec!["REC-1", "REC-2", "REC-3"]);
    assert!(outcome.skipped.is_empty());

    let incident = state.incident("INC-2025-004").expect("incident");
    assert_eq!(incident.status, IncidentStatus::Active);
    assert_eq!(incident.assigned_units, vec!["REC-1", "REC-2", "REC-3"]);
    assert_eq!(state.unit("REC-4").map(|u| u.status), Ok(UnitStatus::S2));
}
