//! Recommendation lifecycle driven by the call text and the unit roster.
//!
//! The "supervisor" is a deterministic rule table (see [`crate::rules`]):
//! transcript text is matched against ordered patterns and the first hit
//! proposes a [`ResponseProtocol`]. Units requesting voice contact (S5) take
//! precedence over any keyword suggestion.

use crate::call::CallIntake;
use crate::error::{DispatchError, Result};
use crate::protocols::{self, QuickAction, ResponseProtocol};
use crate::rules;
use crate::units::Unit;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

const STRESS_PATTERNS: [&str; 7] = [
    "schnell",
    "hilfe",
    "bitte",
    "blut",
    "nicht atmet",
    "notfall",
    "starb",
];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecommendationStatus {
    Analyzing,
    Suggested,
    Accepted,
    Rejected,
}

impl RecommendationStatus {
    /// Accepted or rejected recommendations are never replaced by analysis.
    pub fn is_settled(&self) -> bool {
        matches!(self, RecommendationStatus::Accepted | RecommendationStatus::Rejected)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AiRecommendation {
    pub code: String,
    pub keyword: String,
    pub description: String,
    pub confidence: f32,
    pub reasoning: String,
    pub matched_keywords: Vec<String>,
    pub units: Vec<String>,
    pub status: RecommendationStatus,
}

impl AiRecommendation {
    fn from_protocol(protocol: ResponseProtocol, matched_keywords: Vec<String>) -> Self {
        Self {
            code: protocol.code,
            keyword: protocol.keyword,
            description: protocol.description,
            confidence: protocol.confidence,
            reasoning: protocol.reasoning,
            matched_keywords,
            units: protocol.units,
            status: RecommendationStatus::Suggested,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoiceContactNotice {
    pub unit_ids: Vec<String>,
    pub call_signs: Vec<String>,
    pub message: String,
}

/// What the recommendation panel should show right now.
#[derive(Clone, Debug, PartialEq)]
pub enum Advisory<'a> {
    VoiceContact(VoiceContactNotice),
    Recommendation(&'a AiRecommendation),
    Idle,
}

pub fn voice_contact_notice(units: &[Unit]) -> Option<VoiceContactNotice> {
    let requesting: Vec<&Unit> = units
        .iter()
        .filter(|u| u.status.requests_voice_contact())
        .collect();
    if requesting.is_empty() {
        return None;
    }

    let call_signs: Vec<String> = requesting.iter().map(|u| u.call_sign.clone()).collect();
    Some(VoiceContactNotice {
        unit_ids: requesting.iter().map(|u| u.id.clone()).collect(),
        message: format!("Units requesting voice contact: {}", call_signs.join(", ")),
        call_signs,
    })
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Supervisor {
    recommendation: Option<AiRecommendation>,
}

impl Supervisor {
    pub fn recommendation(&self) -> Option<&AiRecommendation> {
        self.recommendation.as_ref()
    }

    /// Re-evaluates the call. Returns `true` when the recommendation changed.
    pub fn observe(&mut self, intake: &CallIntake, units: &[Unit]) -> bool {
        if units.iter().any(|u| u.status.requests_voice_contact()) {
            debug!("voice contact pending; keyword analysis suppressed");
            return false;
        }

        let text = intake.analysis_text();
        if text.trim().is_empty() {
            return false;
        }

        let pattern = rules::detect_pattern(&text);
        match protocols::protocol_for(pattern) {
            Some(protocol) => {
                if let Some(current) = &self.recommendation {
                    if current.status.is_settled() || current.code == protocol.code {
                        return false;
                    }
                }
                info!(code = %protocol.code, ?pattern, "recommendation suggested");
                let matched = rules::matched_keywords(pattern, &text);
                self.recommendation = Some(AiRecommendation::from_protocol(protocol, matched));
                true
            }
            None => match &self.recommendation {
                Some(current) if !current.status.is_settled() => {
                    debug!(code = %current.code, "recommendation withdrawn");
                    self.recommendation = None;
                    true
                }
                _ => false,
            },
        }
    }

    pub fn advisory<'a>(&'a self, units: &[Unit]) -> Advisory<'a> {
        if let Some(notice) = voice_contact_notice(units) {
            return Advisory::VoiceContact(notice);
        }
        match &self.recommendation {
            Some(rec) => Advisory::Recommendation(rec),
            None => Advisory::Idle,
        }
    }

    pub fn accept(&mut self) -> Result<()> {
        self.set_status(RecommendationStatus::Accepted)
    }

    pub fn reject(&mut self) -> Result<()> {
        self.set_status(RecommendationStatus::Rejected)
    }

    pub fn add_unit(&mut self, category: &str) -> Result<()> {
        let rec = self
            .recommendation
            .as_mut()
            .ok_or(DispatchError::NoRecommendation)?;
        let category = category.trim();
        if !category.is_empty() {
            rec.units.push(category.to_string());
        }
        Ok(())
    }

    /// Removes every occurrence of `category`.
    pub fn remove_unit(&mut self, category: &str) -> Result<()> {
        let rec = self
            .recommendation
            .as_mut()
            .ok_or(DispatchError::NoRecommendation)?;
        rec.units.retain(|u| u != category);
        Ok(())
    }

    pub fn manual_trigger(&mut self, action: &QuickAction) {
        info!(code = %action.code, "manual classification triggered");
        self.recommendation = Some(AiRecommendation {
            code: action.code.clone(),
            keyword: action.keyword.clone(),
            description: action.description.clone(),
            confidence: 1.0,
            reasoning: "Manual selection".into(),
            matched_keywords: Vec::new(),
            units: action.units.clone(),
            status: RecommendationStatus::Suggested,
        });
    }

    pub fn clear(&mut self) {
        self.recommendation = None;
    }

    fn set_status(&mut self, status: RecommendationStatus) -> Result<()> {
        let rec = self
            .recommendation
            .as_mut()
            .ok_or(DispatchError::NoRecommendation)?;
        info!(code = %rec.code, ?status, "recommendation decided");
        rec.status = status;
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SentimentLabel {
    Calm,
    Concerned,
    Panicked,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Sentiment {
    pub score: f32,
    pub label: SentimentLabel,
}

/// Caller stress estimate from lowercase call text.
pub fn assess_sentiment(text: &str) -> Sentiment {
    let mut score = 0.2_f32;
    score += STRESS_PATTERNS.iter().filter(|p| text.contains(*p)).count() as f32 * 0.15;
    score += text.matches('!').count() as f32 * 0.1;
    let score = score.min(1.0);

    let label = if score > 0.7 {
        SentimentLabel::Panicked
    } else if score > 0.4 {
        SentimentLabel::Concerned
    } else {
        SentimentLabel::Calm
    };
    Sentiment { score, label }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::call::{CallData, CallField};
    use crate::units::{GeoPoint, UnitStatus, UnitType};
    use chrono::Utc;

    fn unit(id: &str, status: UnitStatus) -> Unit {
        Unit::new(
            id,
            format!("Florian {id}"),
            UnitType::Rtw,
            status,
            GeoPoint { lat: 48.1, lng: 11.5 },
            Utc::now(),
        )
    }

    fn intake_with(lines: &[&str]) -> CallIntake {
        let mut intake = CallIntake::new(CallData::default());
        for line in lines {
            intake.append_transcript(*line);
        }
        intake
    }

    #[test]
    fn suggests_protocol_for_matching_transcript() {
        let mut sup = Supervisor::default();
        let intake = intake_with(&["Es ist Feuer in der Wohnung!"]);
        assert!(sup.observe(&intake, &[]));

        let rec = sup.recommendation().expect("recommendation");
        assert_eq!(rec.code, "B3");
        assert_eq!(rec.status, RecommendationStatus::Suggested);
        assert_eq!(rec.units, vec!["HLF", "DLK", "ELW", "RTW"]);
        assert!(rec.matched_keywords.contains(&"feuer".to_string()));
    }

    #[test]
    fn same_code_does_not_replace_recommendation() {
        let mut sup = Supervisor::default();
        let mut intake = intake_with(&["kleiner brand im hof"]);
        assert!(sup.observe(&intake, &[]));
        sup.add_unit("RTW").expect("add");

        intake.append_transcript("der brand wird größer");
        assert!(!sup.observe(&intake, &[]));
        assert_eq!(sup.recommendation().map(|r| r.units.len()), Some(2));
    }

    #[test]
    fn settled_recommendation_survives_new_text() {
        let mut sup = Supervisor::default();
        let mut intake = intake_with(&["brand im keller"]);
        sup.observe(&intake, &[]);
        sup.accept().expect("accept");

        intake.append_transcript("er atmet nicht");
        assert!(!sup.observe(&intake, &[]));
        let rec = sup.recommendation().expect("recommendation");
        assert_eq!(rec.code, "B1");
        assert_eq!(rec.status, RecommendationStatus::Accepted);
    }

    #[test]
    fn unmatched_text_withdraws_unsettled_recommendation() {
        let mut sup = Supervisor::default();
        let mut intake = intake_with(&["brand"]);
        sup.observe(&intake, &[]);
        assert!(sup.recommendation().is_some());

        intake = intake_with(&["alles wieder gut"]);
        assert!(sup.observe(&intake, &[]));
        assert!(sup.recommendation().is_none());
    }

    #[test]
    fn voice_contact_suppresses_analysis_and_takes_over_advisory() {
        let mut sup = Supervisor::default();
        let units = vec![unit("UNIT-001", UnitStatus::S5), unit("UNIT-002", UnitStatus::S1)];
        let intake = intake_with(&["reanimation läuft"]);

        assert!(!sup.observe(&intake, &units));
        assert!(sup.recommendation().is_none());
        match sup.advisory(&units) {
            Advisory::VoiceContact(notice) => {
                assert_eq!(notice.unit_ids, vec!["UNIT-001"]);
                assert!(notice.message.contains("Florian UNIT-001"));
            }
            other => panic!("expected voice contact notice, got {other:?}"),
        }

        let cleared = vec![unit("UNIT-001", UnitStatus::S3), unit("UNIT-002", UnitStatus::S1)];
        assert!(sup.observe(&intake, &cleared));
        assert!(matches!(sup.advisory(&cleared), Advisory::Recommendation(r) if r.code == "R0"));
    }

    #[test]
    fn decisions_require_a_recommendation() {
        let mut sup = Supervisor::default();
        assert_eq!(sup.accept(), Err(DispatchError::NoRecommendation));
        assert_eq!(sup.add_unit("RTW"), Err(DispatchError::NoRecommendation));
        assert!(matches!(sup.advisory(&[]), Advisory::Idle));
    }

    #[test]
    fn manual_trigger_replaces_and_unit_edits_apply() {
        let mut sup = Supervisor::default();
        let action = protocols::find_quick_action("B4").expect("quick action");
        sup.manual_trigger(&action);
        sup.remove_unit("HLF").expect("remove");
        sup.add_unit("KTW").expect("add");

        let rec = sup.recommendation().expect("recommendation");
        assert_eq!(rec.confidence, 1.0);
        assert_eq!(rec.units, vec!["ELW", "DLK", "RTW", "KTW"]);
        sup.reject().expect("reject");
        assert_eq!(
            sup.recommendation().map(|r| r.status),
            Some(RecommendationStatus::Rejected)
        );
    }

    #[test]
    fn empty_call_text_is_ignored() {
        let mut sup = Supervisor::default();
        let mut intake = CallIntake::default();
        intake.edit_field(CallField::Notes, "   ");
        assert!(!sup.observe(&intake, &[]));
    }

    #[test]
    fn sentiment_rises_with_stress_markers() {
        assert_eq!(assess_sentiment("guten tag").label, SentimentLabel::Calm);
        let concerned = assess_sentiment("bitte hilfe");
        assert_eq!(concerned.label, SentimentLabel::Concerned);
        let panicked = assess_sentiment("hilfe! schnell! er blutet, notfall!");
        assert_eq!(panicked.label, SentimentLabel::Panicked);
        assert!(assess_sentiment("!!!!!!!!!!!!!!").score <= 1.0);
    }
}
