use crate::error::DispatchError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Minutes a unit may stay committed (S3/S4) before the roster flags it.
pub const OVERDUE_AFTER_MINUTES: i64 = 30;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum UnitType {
    #[serde(rename = "RTW")]
    Rtw,
    #[serde(rename = "NEF")]
    Nef,
    #[serde(rename = "KTW")]
    Ktw,
    #[serde(rename = "HLF")]
    Hlf,
    #[serde(rename = "DLK")]
    Dlk,
    #[serde(rename = "ELW")]
    Elw,
}

impl UnitType {
    pub const ALL: [UnitType; 6] = [
        UnitType::Rtw,
        UnitType::Nef,
        UnitType::Ktw,
        UnitType::Hlf,
        UnitType::Dlk,
        UnitType::Elw,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            UnitType::Rtw => "RTW",
            UnitType::Nef => "NEF",
            UnitType::Ktw => "KTW",
            UnitType::Hlf => "HLF",
            UnitType::Dlk => "DLK",
            UnitType::Elw => "ELW",
        }
    }

    pub fn category(&self) -> UnitCategory {
        match self {
            UnitType::Rtw | UnitType::Nef | UnitType::Ktw => UnitCategory::Ems,
            UnitType::Hlf | UnitType::Dlk | UnitType::Elw => UnitCategory::Fire,
        }
    }
}

impl fmt::Display for UnitType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for UnitType {
    type Err = DispatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        UnitType::ALL
            .into_iter()
            .find(|t| t.code() == upper)
            .ok_or_else(|| DispatchError::InvalidUnitType(s.to_string()))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum UnitCategory {
    Fire,
    #[serde(rename = "EMS")]
    Ems,
}

impl UnitCategory {
    pub fn label(&self) -> &'static str {
        match self {
            UnitCategory::Fire => "Fire",
            UnitCategory::Ems => "EMS",
        }
    }
}

/// Radio status reported by a unit.
///
/// S3 and S4 share transition rules; they differ only in the label shown to
/// the dispatcher. Any status may follow any other.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum UnitStatus {
    S1,
    S2,
    S3,
    S4,
    S5,
    S6,
}

impl UnitStatus {
    pub const ALL: [UnitStatus; 6] = [
        UnitStatus::S1,
        UnitStatus::S2,
        UnitStatus::S3,
        UnitStatus::S4,
        UnitStatus::S5,
        UnitStatus::S6,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            UnitStatus::S1 => "S1",
            UnitStatus::S2 => "S2",
            UnitStatus::S3 => "S3",
            UnitStatus::S4 => "S4",
            UnitStatus::S5 => "S5",
            UnitStatus::S6 => "S6",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            UnitStatus::S1 => "available in station",
            UnitStatus::S2 => "available on road",
            UnitStatus::S3 => "en route",
            UnitStatus::S4 => "on scene",
            UnitStatus::S5 => "requesting voice contact",
            UnitStatus::S6 => "out of service",
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, UnitStatus::S1 | UnitStatus::S2)
    }

    pub fn is_committed(&self) -> bool {
        matches!(self, UnitStatus::S3 | UnitStatus::S4)
    }

    pub fn requests_voice_contact(&self) -> bool {
        matches!(self, UnitStatus::S5)
    }

    pub fn is_out_of_service(&self) -> bool {
        matches!(self, UnitStatus::S6)
    }
}

impl fmt::Display for UnitStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for UnitStatus {
    type Err = DispatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        UnitStatus::ALL
            .into_iter()
            .find(|st| st.code() == upper)
            .ok_or_else(|| DispatchError::InvalidStatus(s.to_string()))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Unit {
    pub id: String,
    pub call_sign: String,
    #[serde(rename = "type")]
    pub unit_type: UnitType,
    pub category: UnitCategory,
    pub status: UnitStatus,
    pub location: GeoPoint,
    pub capabilities: Vec<String>,
    pub status_last_updated: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eta: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance: Option<String>,
}

impl Unit {
    pub fn new(
        id: impl Into<String>,
        call_sign: impl Into<String>,
        unit_type: UnitType,
        status: UnitStatus,
        location: GeoPoint,
        status_last_updated: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            call_sign: call_sign.into(),
            unit_type,
            category: unit_type.category(),
            status,
            location,
            capabilities: Vec::new(),
            status_last_updated,
            eta: None,
            distance: None,
        }
    }

    pub fn set_status(&mut self, status: UnitStatus, at: DateTime<Utc>) {
        self.status = status;
        self.status_last_updated = at;
    }

    pub fn minutes_in_status(&self, now: DateTime<Utc>) -> i64 {
        (now - self.status_last_updated).num_minutes().max(0)
    }

    /// Display flag only; elapsed time never drives a status change.
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        self.status.is_committed() && self.minutes_in_status(now) > OVERDUE_AFTER_MINUTES
    }

    pub fn matches_search(&self, term: &str) -> bool {
        let term = term.trim().to_lowercase();
        self.call_sign.to_lowercase().contains(&term)
            || self.unit_type.code().to_lowercase().contains(&term)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn unit(status: UnitStatus, updated: DateTime<Utc>) -> Unit {
        Unit::new(
            "UNIT-001",
            "Florian München 1/46-1",
            UnitType::Hlf,
            status,
            GeoPoint { lat: 48.137, lng: 11.575 },
            updated,
        )
    }

    #[test]
    fn category_follows_vehicle_type() {
        assert_eq!(UnitType::Rtw.category(), UnitCategory::Ems);
        assert_eq!(UnitType::Ktw.category(), UnitCategory::Ems);
        assert_eq!(UnitType::Dlk.category(), UnitCategory::Fire);
        assert_eq!(UnitType::Elw.category(), UnitCategory::Fire);
    }

    #[test]
    fn parses_codes_case_insensitively() {
        assert_eq!("rtw".parse::<UnitType>(), Ok(UnitType::Rtw));
        assert_eq!(" s5 ".parse::<UnitStatus>(), Ok(UnitStatus::S5));
        assert!(matches!(
            "TLF".parse::<UnitType>(),
            Err(DispatchError::InvalidUnitType(_))
        ));
        assert!(matches!(
            "S9".parse::<UnitStatus>(),
            Err(DispatchError::InvalidStatus(_))
        ));
    }

    #[test]
    fn status_groups() {
        assert!(UnitStatus::S1.is_available());
        assert!(UnitStatus::S2.is_available());
        assert!(UnitStatus::S3.is_committed());
        assert!(UnitStatus::S4.is_committed());
        assert!(UnitStatus::S5.requests_voice_contact());
        assert!(UnitStatus::S6.is_out_of_service());
        assert!(!UnitStatus::S5.is_available());
    }

    #[test]
    fn wire_names_match_console_codes() {
        let json = serde_json::to_value(unit(UnitStatus::S3, Utc::now())).expect("serialize");
        assert_eq!(json["type"], "HLF");
        assert_eq!(json["status"], "S3");
        assert_eq!(json["category"], "Fire");
        assert_eq!(json["callSign"], "Florian München 1/46-1");
        assert!(json.get("eta").is_none());
    }

    #[test]
    fn set_status_stamps_time() {
        let start = Utc::now() - Duration::minutes(50);
        let mut u = unit(UnitStatus::S1, start);
        let now = Utc::now();
        u.set_status(UnitStatus::S4, now);
        assert_eq!(u.status, UnitStatus::S4);
        assert_eq!(u.status_last_updated, now);
        assert_eq!(u.minutes_in_status(now), 0);
    }

    #[test]
    fn overdue_only_for_committed_units() {
        let now = Utc::now();
        let long_ago = now - Duration::minutes(45);
        assert!(unit(UnitStatus::S3, long_ago).is_overdue(now));
        assert!(unit(UnitStatus::S4, long_ago).is_overdue(now));
        assert!(!unit(UnitStatus::S1, long_ago).is_overdue(now));
        assert!(!unit(UnitStatus::S3, now - Duration::minutes(10)).is_overdue(now));
    }

    #[test]
    fn search_matches_call_sign_or_type() {
        let u = unit(UnitStatus::S1, Utc::now());
        assert!(u.matches_search("münchen 1"));
        assert!(u.matches_search("hlf"));
        assert!(!u.matches_search("rtw"));
        assert!(u.matches_search(""));
    }
}
