//! Synthetic Munich fleet, incidents and hospitals.
//!
//! Everything here is derived from the unit index, so two runs with the same
//! fleet size and clock produce identical state.

use crate::call::CallData;
use crate::hospitals::{BedStatus, Hospital};
use crate::incidents::{Incident, IncidentLocation, IncidentStatus, Priority};
use crate::proposal::{Readiness, Recommendation, RouteStatus};
use crate::store::CadState;
use crate::units::{GeoPoint, Unit, UnitStatus, UnitType};
use chrono::{DateTime, Duration, Utc};

pub const DEFAULT_CALL_ID: &str = "C-2024-001";

const CENTER: GeoPoint = GeoPoint { lat: 48.137, lng: 11.575 };
const SPREAD: f64 = 0.1;

const CAPABILITIES: [&str; 7] = ["Fire", "Tech", "HazMat", "HighRescue", "WaterRescue", "ALS", "Doctor"];

// No S5 in the rotation: a fresh console starts without pending voice contact.
const STATUS_ROTATION: [UnitStatus; 8] = [
    UnitStatus::S1,
    UnitStatus::S2,
    UnitStatus::S1,
    UnitStatus::S3,
    UnitStatus::S4,
    UnitStatus::S1,
    UnitStatus::S2,
    UnitStatus::S6,
];

fn jitter(i: usize, salt: usize) -> f64 {
    let bucket = (i * salt + 17) % 100;
    (bucket as f64 / 100.0 - 0.5) * SPREAD
}

/// `count` units with ids `UNIT-001`, `UNIT-002`, …
pub fn generate_units(count: usize, now: DateTime<Utc>) -> Vec<Unit> {
    (1..=count)
        .map(|i| {
            let unit_type = UnitType::ALL[(i * 5) % UnitType::ALL.len()];
            let status = STATUS_ROTATION[i % STATUS_ROTATION.len()];
            let call_sign = format!(
                "Florian München {}/{}-{}",
                i % 10 + 1,
                (i * 7) % 50 + 10,
                i % 5 + 1
            );
            let location = GeoPoint {
                lat: CENTER.lat + jitter(i, 37),
                lng: CENTER.lng + jitter(i, 53),
            };
            let updated = now - Duration::minutes(((i * 13) % 60) as i64);

            let mut unit = Unit::new(format!("UNIT-{i:03}"), call_sign, unit_type, status, location, updated);
            unit.capabilities = CAPABILITIES
                .iter()
                .enumerate()
                .filter(|(idx, _)| (i + idx) % 3 == 0)
                .map(|(_, c)| c.to_string())
                .collect();
            unit
        })
        .collect()
}

#[allow(clippy::too_many_arguments)]
fn recommended(
    id: &str,
    call_sign: &str,
    unit_type: UnitType,
    score: u8,
    eta: &str,
    distance: &str,
    traffic: &str,
    equipment: Readiness,
    crew: Readiness,
    route: RouteStatus,
    location: GeoPoint,
    now: DateTime<Utc>,
) -> Recommendation {
    let mut unit = Unit::new(id, call_sign, unit_type, UnitStatus::S2, location, now);
    unit.eta = Some(eta.to_string());
    unit.distance = Some(distance.to_string());
    Recommendation {
        unit,
        match_score: score,
        traffic_info: traffic.to_string(),
        equipment,
        crew,
        route,
    }
}

/// The four system-suggested resources every new proposal starts with.
pub fn recommendations(now: DateTime<Utc>) -> Vec<Recommendation> {
    use Readiness::*;
    use RouteStatus::*;
    vec![
        recommended(
            "REC-1", "IN-RK 74/1", UnitType::Rtw, 94, "5 min", "3.2 km", "Clear",
            Ready, Ready, Optimal, GeoPoint { lat: 48.772, lng: 11.441 }, now,
        ),
        recommended(
            "REC-2", "IN-RK 76/1", UnitType::Nef, 89, "7 min", "5.1 km", "Heavy Traffic",
            Ready, Ready, Diverted, GeoPoint { lat: 48.741, lng: 11.462 }, now,
        ),
        recommended(
            "REC-3", "IN-FW 10/1", UnitType::Hlf, 91, "4 min", "2.8 km", "Clear",
            Missing, Ready, Optimal, GeoPoint { lat: 48.760, lng: 11.401 }, now,
        ),
        recommended(
            "REC-4", "IN-FW 30/1", UnitType::Dlk, 88, "6 min", "4.5 km", "Clear",
            Ready, Warning, Optimal, GeoPoint { lat: 48.781, lng: 11.398 }, now,
        ),
    ]
}

#[allow(clippy::too_many_arguments)]
fn incident(
    id: &str,
    keyword: &str,
    code: &str,
    incident_type: &str,
    category: &str,
    address: &str,
    (lat, lng): (f64, f64),
    priority: Priority,
    status: IncidentStatus,
    created_at: DateTime<Utc>,
) -> Incident {
    Incident {
        id: id.into(),
        code: Some(code.into()),
        keyword: Some(keyword.into()),
        incident_type: incident_type.into(),
        category: category.into(),
        location: IncidentLocation {
            address: address.into(),
            lat,
            lng,
        },
        priority,
        status,
        created_at,
        description: None,
        assigned_units: Vec::new(),
    }
}

pub fn incidents(now: DateTime<Utc>) -> Vec<Incident> {
    let ago = |m: i64| now - Duration::minutes(m);

    let mut room_fire = incident(
        "INC-2025-001", "Room Fire", "B3", "B3 - Structure Fire", "Fire",
        "45 Leopold Street, 80802 Munich", (48.155, 11.585),
        Priority::One, IncidentStatus::Dispatching, ago(5),
    );
    room_fire.description = Some("Smoke from window on 3rd floor, persons reported in danger.".into());

    let mut cpr = incident(
        "INC-2025-002", "CPR / Cardiac", "R2", "R2 - Resuscitation", "Rescue",
        "1 Marienplatz, 80331 Munich", (48.137, 11.575),
        Priority::One, IncidentStatus::Active, ago(15),
    );
    cpr.assigned_units.push("UNIT-003".into());

    vec![
        room_fire,
        cpr,
        incident(
            "INC-2025-003", "MVA Trapped", "THL3", "THL 3 - MVA Persons Trapped", "Tech",
            "Mittlerer Ring / Donnersbergerbrücke", (48.142, 11.535),
            Priority::One, IncidentStatus::Active, ago(25),
        ),
        incident(
            "INC-2025-004", "Helpless Person", "R1", "R1 - Medical", "Rescue",
            "Munich Central Station", (48.140, 11.560),
            Priority::Two, IncidentStatus::Open, ago(2),
        ),
        incident(
            "INC-2025-005", "BMA Alarm", "BMA", "BMA - Commercial Fire Alarm", "Fire",
            "Messe München", (48.135, 11.698),
            Priority::Three, IncidentStatus::Open, ago(1),
        ),
    ]
}

pub fn hospitals() -> Vec<Hospital> {
    let hospital = |id: &str, name: &str, address: &str, distance_km: f64, status, specialties: &[&str]| Hospital {
        id: id.into(),
        name: name.into(),
        address: address.into(),
        distance_km,
        status,
        specialties: specialties.iter().map(|s| s.to_string()).collect(),
    };
    vec![
        hospital("HOSP-001", "Grosshadern Hospital", "15 Marchioninistraße", 5.2, BedStatus::Available,
            &["Level 1 Trauma", "Stroke", "Cath Lab", "Neuro"]),
        hospital("HOSP-002", "Schwabing Hospital", "1 Koerner Plaza", 3.8, BedStatus::Limited,
            &["Pediatrics", "Trauma", "Burn Center"]),
        hospital("HOSP-003", "Rechts der Isar", "22 Ismaninger Str.", 2.1, BedStatus::Full,
            &["Maximalversorger", "Trauma", "Stroke", "Herzkatheter"]),
        hospital("HOSP-004", "Bogenhausen Hospital", "77 Englschalkinger Str.", 6.5, BedStatus::Available,
            &["Trauma", "Urology", "Neuro"]),
        hospital("HOSP-005", "Third Order Hospital", "44 Menzinger Str.", 8.1, BedStatus::Available,
            &["Pediatrics", "Obstetrics"]),
    ]
}

/// Empty intake for the call on the line.
pub fn default_call() -> CallData {
    CallData {
        id: DEFAULT_CALL_ID.into(),
        lat: Some(48.765),
        lng: Some(11.424),
        ..CallData::default()
    }
}

/// A console with `fleet_size` generated units plus the recommended units.
pub fn demo_state(fleet_size: usize, now: DateTime<Utc>) -> CadState {
    let recommendations = recommendations(now);
    let mut units = generate_units(fleet_size, now);
    if let Some(on_scene) = units.iter_mut().find(|u| u.id == "UNIT-003") {
        on_scene.set_status(UnitStatus::S4, now - Duration::minutes(12));
    }
    units.extend(recommendations.iter().map(|r| r.unit.clone()));

    CadState::new(incidents(now), units, hospitals(), default_call(), recommendations)
}
