//! Normalizes drag-and-drop payloads into roster units.
//!
//! Three shapes arrive on the proposal drop zone: an already canonical
//! `unit.v1` record, the unit object the call-taking UI serializes, and the
//! vehicle object dragged from the map. All go through `unit.v1` validation
//! before becoming a [`Unit`].

use crate::error::ConsoleError;
use chrono::Utc;
use dispatch_core::units::{GeoPoint, Unit, UnitStatus, UnitType};
use serde_json::Value;
use unit_registry::{normalize_type_code, parse_unit_v1, validate_unit_v1, CanonicalUnitV1, SCHEMA_UNIT_V1};

pub trait DropAdapter: Send + Sync + 'static {
    fn parse(&self, payload: &Value) -> Result<CanonicalUnitV1, String>;
}

pub struct CadUnitAdapter;
pub struct MapVehicleAdapter;

fn required_str<'a>(payload: &'a Value, key: &str) -> Result<&'a str, String> {
    payload
        .get(key)
        .and_then(Value::as_str)
        .ok_or_else(|| format!("payload missing '{key}'"))
}

fn optional_string(payload: &Value, key: &str) -> Option<String> {
    payload.get(key).and_then(Value::as_str).map(ToString::to_string)
}

fn category_for(type_code: &str) -> String {
    type_code
        .parse::<UnitType>()
        .map(|t| t.category().label().to_string())
        .unwrap_or_default()
}

impl DropAdapter for CadUnitAdapter {
    fn parse(&self, payload: &Value) -> Result<CanonicalUnitV1, String> {
        let type_code = required_str(payload, "type")?.to_string();
        let location = payload
            .get("location")
            .ok_or_else(|| "payload missing 'location'".to_string())?;
        let coord = |key: &str| {
            location
                .get(key)
                .and_then(Value::as_f64)
                .ok_or_else(|| format!("location missing '{key}'"))
        };

        let unit = CanonicalUnitV1 {
            schema: SCHEMA_UNIT_V1.into(),
            id: required_str(payload, "id")?.to_string(),
            call_sign: required_str(payload, "callSign")?.to_string(),
            category: optional_string(payload, "category").unwrap_or_else(|| category_for(&type_code)),
            type_code,
            status_code: required_str(payload, "status")?.to_string(),
            lat: coord("lat")?,
            lng: coord("lng")?,
            capabilities: payload
                .get("capabilities")
                .and_then(Value::as_array)
                .map(|arr| {
                    arr.iter()
                        .filter_map(|v| v.as_str().map(ToString::to_string))
                        .collect()
                })
                .unwrap_or_default(),
            eta: optional_string(payload, "eta"),
            distance: optional_string(payload, "distance"),
        };
        validate_unit_v1(&unit)?;
        Ok(unit)
    }
}

impl DropAdapter for MapVehicleAdapter {
    fn parse(&self, payload: &Value) -> Result<CanonicalUnitV1, String> {
        let position = payload
            .get("position")
            .and_then(Value::as_array)
            .filter(|p| p.len() == 2)
            .ok_or_else(|| "vehicle missing 'position' pair".to_string())?;
        let (Some(lat), Some(lng)) = (position[0].as_f64(), position[1].as_f64()) else {
            return Err("vehicle position is not numeric".into());
        };

        let subtype = required_str(payload, "subtype")?;
        let type_code = normalize_type_code(subtype)
            .ok_or_else(|| format!("unsupported vehicle subtype '{subtype}'"))?
            .to_string();
        let status_code = match payload.get("status").and_then(Value::as_str) {
            Some("Available") => "S1",
            _ => "S3",
        };

        let unit = CanonicalUnitV1 {
            schema: SCHEMA_UNIT_V1.into(),
            id: required_str(payload, "id")?.to_string(),
            call_sign: required_str(payload, "name")?.to_string(),
            category: optional_string(payload, "category").unwrap_or_else(|| category_for(&type_code)),
            type_code,
            status_code: status_code.into(),
            lat,
            lng,
            capabilities: Vec::new(),
            eta: None,
            distance: None,
        };
        validate_unit_v1(&unit)?;
        Ok(unit)
    }
}

/// Builds a roster unit from a validated record. The category follows the
/// unit type.
pub fn to_unit(canonical: CanonicalUnitV1) -> Result<Unit, ConsoleError> {
    let unit_type: UnitType = canonical.type_code.parse()?;
    let status: UnitStatus = canonical.status_code.parse()?;

    let mut unit = Unit::new(
        canonical.id,
        canonical.call_sign,
        unit_type,
        status,
        GeoPoint {
            lat: canonical.lat,
            lng: canonical.lng,
        },
        Utc::now(),
    );
    unit.capabilities = canonical.capabilities;
    unit.eta = canonical.eta;
    unit.distance = canonical.distance;
    Ok(unit)
}

/// Parses a raw drop payload. Payloads carrying a `schema` tag are read as
/// canonical records; otherwise the unit shape is tried first, then the map
/// vehicle shape.
pub fn parse_drop_payload(raw: &str) -> Result<Unit, ConsoleError> {
    let payload: Value = serde_json::from_str(raw)?;
    if payload.get("schema").is_some() {
        let canonical = parse_unit_v1(raw).map_err(ConsoleError::Payload)?;
        return to_unit(canonical);
    }
    let canonical = match CadUnitAdapter.parse(&payload) {
        Ok(unit) => unit,
        Err(unit_err) => MapVehicleAdapter
            .parse(&payload)
            .map_err(|vehicle_err| {
                ConsoleError::Payload(format!("not a unit ({unit_err}) nor a vehicle ({vehicle_err})"))
            })?,
    };
    to_unit(canonical)
}
