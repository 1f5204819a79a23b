use crate::rules::IncidentPattern;
use serde::{Deserialize, Serialize};

/// Dispatch protocol proposed for a recognised incident pattern.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ResponseProtocol {
    pub code: String,
    pub keyword: String,
    pub description: String,
    pub confidence: f32,
    pub units: Vec<String>,
    pub reasoning: String,
}

/// One-click classification offered while no recommendation is shown.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct QuickAction {
    pub label: String,
    pub code: String,
    pub keyword: String,
    pub description: String,
    pub units: Vec<String>,
}

fn units(codes: &[&str]) -> Vec<String> {
    codes.iter().map(|c| c.to_string()).collect()
}

pub fn resuscitation_protocol() -> ResponseProtocol {
    ResponseProtocol {
        code: "R0".into(),
        keyword: "Reanimation".into(),
        description: "Cardiac arrest".into(),
        confidence: 0.98,
        units: units(&["RTW", "NEF", "HLF"]),
        reasoning: "Detected: breathing failure / resuscitation".into(),
    }
}

pub fn building_fire_protocol() -> ResponseProtocol {
    ResponseProtocol {
        code: "B3".into(),
        keyword: "Wohnungsbrand".into(),
        description: "Fire in building".into(),
        confidence: 0.95,
        units: units(&["HLF", "DLK", "ELW", "RTW"]),
        reasoning: "Detected: fire with building reference".into(),
    }
}

pub fn traffic_entrapment_protocol() -> ResponseProtocol {
    ResponseProtocol {
        code: "THL3".into(),
        keyword: "VU Person klemmt".into(),
        description: "Serious traffic collision".into(),
        confidence: 0.90,
        units: units(&["HLF", "RW", "RTW", "NEF", "Pol"]),
        reasoning: "Detected: traffic collision with person trapped".into(),
    }
}

pub fn small_fire_protocol() -> ResponseProtocol {
    ResponseProtocol {
        code: "B1".into(),
        keyword: "Kleinbrand".into(),
        description: "Outdoor / waste bin fire".into(),
        confidence: 0.70,
        units: units(&["HLF"]),
        reasoning: "Detected: generic fire keyword".into(),
    }
}

pub fn protocol_for(pattern: IncidentPattern) -> Option<ResponseProtocol> {
    match pattern {
        IncidentPattern::Resuscitation => Some(resuscitation_protocol()),
        IncidentPattern::BuildingFire => Some(building_fire_protocol()),
        IncidentPattern::TrafficEntrapment => Some(traffic_entrapment_protocol()),
        IncidentPattern::SmallFire => Some(small_fire_protocol()),
        IncidentPattern::Unclassified => None,
    }
}

pub fn quick_actions() -> Vec<QuickAction> {
    vec![
        QuickAction {
            label: "Reanimation".into(),
            code: "R0".into(),
            keyword: "Herz-Kreislauf-Stillstand".into(),
            description: "Resuscitation in progress".into(),
            units: units(&["RTW", "NEF", "HLF"]),
        },
        QuickAction {
            label: "Feuer Groß".into(),
            code: "B4".into(),
            keyword: "Brand Industrie/Wohn".into(),
            description: "Open fire, persons at risk".into(),
            units: units(&["ELW", "HLF", "HLF", "DLK", "RTW"]),
        },
        QuickAction {
            label: "VU Person klemmt".into(),
            code: "THL3".into(),
            keyword: "Verkehrsunfall".into(),
            description: "Car against tree, person trapped".into(),
            units: units(&["HLF", "RW", "RTW", "NEF", "Pol"]),
        },
    ]
}

pub fn find_quick_action(code: &str) -> Option<QuickAction> {
    quick_actions()
        .into_iter()
        .find(|a| a.code.eq_ignore_ascii_case(code.trim()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_classified_pattern_has_a_protocol() {
        for pattern in [
            IncidentPattern::Resuscitation,
            IncidentPattern::BuildingFire,
            IncidentPattern::TrafficEntrapment,
            IncidentPattern::SmallFire,
        ] {
            let protocol = protocol_for(pattern).expect("protocol");
            assert!(!protocol.units.is_empty());
            assert!(protocol.confidence > 0.0 && protocol.confidence <= 1.0);
        }
        assert!(protocol_for(IncidentPattern::Unclassified).is_none());
    }

    #[test]
    fn quick_action_lookup_is_case_insensitive() {
        let action = find_quick_action("thl3").expect("action");
        assert_eq!(action.label, "VU Person klemmt");
        assert!(find_quick_action("X9").is_none());
    }
}
