use serde::{Deserialize, Serialize};

pub const SCHEMA_UNIT_V1: &str = "unit.v1";

pub const KNOWN_TYPE_CODES: [&str; 6] = ["RTW", "NEF", "KTW", "HLF", "DLK", "ELW"];
pub const KNOWN_STATUS_CODES: [&str; 6] = ["S1", "S2", "S3", "S4", "S5", "S6"];

/// Vehicle classes folded into a known type code. `LF` pumpers are booked
/// as `HLF`.
pub const TYPE_CODE_ALIASES: [(&str, &str); 1] = [("LF", "HLF")];

/// Maps a map-vehicle subtype such as `"HLF 20"` or `"DLK 23/12"` onto a
/// known type code by its leading token. Returns `None` for vehicle classes
/// the roster has no type for (`MTW`, `GW-L1`, ...).
pub fn normalize_type_code(subtype: &str) -> Option<&'static str> {
    let head = subtype.split_whitespace().next()?.to_ascii_uppercase();
    KNOWN_TYPE_CODES
        .iter()
        .copied()
        .find(|code| *code == head)
        .or_else(|| {
            TYPE_CODE_ALIASES
                .iter()
                .find(|(alias, _)| *alias == head)
                .map(|(_, code)| *code)
        })
}

/// Source-independent shape every dropped or imported unit is normalized to.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CanonicalUnitV1 {
    pub schema: String,
    pub id: String,
    pub call_sign: String,
    pub type_code: String,
    pub category: String,
    pub status_code: String,
    pub lat: f64,
    pub lng: f64,
    #[serde(default)]
    pub capabilities: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eta: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance: Option<String>,
}

pub fn validate_unit_v1(unit: &CanonicalUnitV1) -> Result<(), String> {
    if unit.schema != SCHEMA_UNIT_V1 {
        return Err(format!("unsupported schema '{}'", unit.schema));
    }
    if unit.id.trim().is_empty() {
        return Err("id is required".into());
    }
    if unit.call_sign.trim().is_empty() {
        return Err("call_sign is required".into());
    }
    if !KNOWN_TYPE_CODES.contains(&unit.type_code.to_uppercase().as_str()) {
        return Err(format!("invalid type code '{}'", unit.type_code));
    }
    if !KNOWN_STATUS_CODES.contains(&unit.status_code.to_uppercase().as_str()) {
        return Err(format!("invalid status code '{}'", unit.status_code));
    }
    if !(-90.0..=90.0).contains(&unit.lat) || !(-180.0..=180.0).contains(&unit.lng) {
        return Err(format!("coordinates out of range ({}, {})", unit.lat, unit.lng));
    }
    Ok(())
}

/// Parses and validates a serialized `unit.v1` record.
pub fn parse_unit_v1(raw: &str) -> Result<CanonicalUnitV1, String> {
    let unit: CanonicalUnitV1 = serde_json::from_str(raw).map_err(|e| e.to_string())?;
    validate_unit_v1(&unit)?;
    Ok(unit)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit() -> CanonicalUnitV1 {
        CanonicalUnitV1 {
            schema: SCHEMA_UNIT_V1.into(),
            id: "UNIT-007".into(),
            call_sign: "Florian München 3/44-2".into(),
            type_code: "HLF".into(),
            category: "Fire".into(),
            status_code: "S2".into(),
            lat: 48.14,
            lng: 11.58,
            capabilities: vec!["Tech".into()],
            eta: None,
            distance: None,
        }
    }

    #[test]
    fn validates_unit_v1() {
        assert!(validate_unit_v1(&unit()).is_ok());
    }

    #[test]
    fn rejects_foreign_schema_and_blank_ids() {
        let mut u = unit();
        u.schema = "alert.v1".into();
        assert!(validate_unit_v1(&u).is_err());

        let mut u = unit();
        u.call_sign = "  ".into();
        assert_eq!(validate_unit_v1(&u), Err("call_sign is required".to_string()));
    }

    #[test]
    fn rejects_unknown_codes_and_bad_coordinates() {
        let mut u = unit();
        u.type_code = "TLF".into();
        assert!(validate_unit_v1(&u).is_err());

        let mut u = unit();
        u.status_code = "S9".into();
        assert!(validate_unit_v1(&u).is_err());

        let mut u = unit();
        u.lat = 123.0;
        assert!(validate_unit_v1(&u).is_err());
    }

    #[test]
    fn normalizes_vehicle_subtypes() {
        assert_eq!(normalize_type_code("HLF 20"), Some("HLF"));
        assert_eq!(normalize_type_code("DLK 23/12"), Some("DLK"));
        assert_eq!(normalize_type_code("ELW 1"), Some("ELW"));
        assert_eq!(normalize_type_code(" rtw "), Some("RTW"));
        assert_eq!(normalize_type_code("LF 10"), Some("HLF"));
        assert_eq!(normalize_type_code("LF 20 KatS"), Some("HLF"));

        assert_eq!(normalize_type_code("MTW"), None);
        assert_eq!(normalize_type_code("GW-L1"), None);
        assert_eq!(normalize_type_code("TLF 16/25"), None);
        assert_eq!(normalize_type_code(""), None);
    }

    #[test]
    fn parses_serialized_record() {
        let raw = serde_json::to_string(&unit()).expect("serialize");
        assert!(!raw.contains("eta"));
        assert_eq!(parse_unit_v1(&raw), Ok(unit()));
        assert!(parse_unit_v1("{\"schema\":\"unit.v1\"}").is_err());
    }
}
