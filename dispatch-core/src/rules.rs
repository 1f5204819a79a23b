use crate::incidents::Priority;
use serde::{Deserialize, Serialize};

/// One row of the tag classification table.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct KeywordRule {
    pub keywords: &'static [&'static str],
    pub code: &'static str,
    pub priority: Priority,
}

/// Evaluated top to bottom; the first row with a matching keyword wins.
pub const TAG_RULES: [KeywordRule; 3] = [
    KeywordRule {
        keywords: &["fire", "brand", "smoke", "rauch"],
        code: "B3",
        priority: Priority::One,
    },
    KeywordRule {
        keywords: &["roof", "dach"],
        code: "B4",
        priority: Priority::One,
    },
    KeywordRule {
        keywords: &["cpr", "cardiac", "reanimation"],
        code: "R2",
        priority: Priority::One,
    },
];

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    pub code: String,
    pub priority: Priority,
    pub matched_keyword: String,
}

pub fn classify_tag(tag: &str) -> Option<Classification> {
    let lower = tag.trim().to_lowercase();
    if lower.is_empty() {
        return None;
    }

    TAG_RULES.iter().find_map(|rule| {
        rule.keywords
            .iter()
            .find(|kw| lower.contains(*kw))
            .map(|kw| Classification {
                code: rule.code.to_string(),
                priority: rule.priority,
                matched_keyword: kw.to_string(),
            })
    })
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IncidentPattern {
    Resuscitation,
    BuildingFire,
    TrafficEntrapment,
    SmallFire,
    Unclassified,
}

/// Pattern for lowercase call text (transcript plus notes).
pub fn detect_pattern(text: &str) -> IncidentPattern {
    let has = |needle: &str| text.contains(needle);
    let has_any = |needles: &[&str]| needles.iter().any(|n| text.contains(n));

    if has("reanimation") || (has("nicht") && has("atmet")) || has("not breathing") {
        IncidentPattern::Resuscitation
    } else if has_any(&["feuer", "fire"])
        && has_any(&["dach", "gebäude", "wohnung", "roof", "building", "apartment"])
    {
        IncidentPattern::BuildingFire
    } else if has_any(&["verkehrsunfall", "car accident"]) && has_any(&["eingeklemmt", "trapped"]) {
        IncidentPattern::TrafficEntrapment
    } else if has_any(&["feuer", "brand", "fire"]) {
        IncidentPattern::SmallFire
    } else {
        IncidentPattern::Unclassified
    }
}

/// Trigger words found in `text` for a pattern, in table order.
pub fn matched_keywords(pattern: IncidentPattern, text: &str) -> Vec<String> {
    let words: &[&str] = match pattern {
        IncidentPattern::Resuscitation => &["reanimation", "nicht", "atmet", "not breathing"],
        IncidentPattern::BuildingFire => &[
            "feuer", "fire", "dach", "gebäude", "wohnung", "roof", "building", "apartment",
        ],
        IncidentPattern::TrafficEntrapment => {
            &["verkehrsunfall", "car accident", "eingeklemmt", "trapped"]
        }
        IncidentPattern::SmallFire => &["feuer", "brand", "fire"],
        IncidentPattern::Unclassified => &[],
    };
    words
        .iter()
        .filter(|w| text.contains(*w))
        .map(|w| w.to_string())
        .collect()
}
