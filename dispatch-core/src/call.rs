//! Call intake: the call currently being taken, its key-fact tags and the
//! bookkeeping of which fields the system filled in on its own.

use crate::incidents::Priority;
use crate::rules::{self, Classification};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::debug;

const LOCATION_AUTOFILL_STREETS: [&str; 3] = ["leo", "haupt", "mari"];

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduledTransport {
    pub patient_name: String,
    pub transport_type: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallData {
    pub id: String,
    pub caller_name: String,
    pub caller_phone: String,
    pub location: String,
    pub notes: String,
    pub transcript: Vec<String>,
    pub priority: Option<Priority>,
    pub summary: String,
    pub code: Option<String>,
    pub keyword: String,
    pub zip: String,
    pub city: String,
    pub district: String,
    pub street: String,
    pub floor: String,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub scheduled: Option<ScheduledTransport>,
    pub affected_person_count: Option<u32>,
}

/// Editable intake fields, used both for edits and for derived-field badges.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CallField {
    CallerName,
    CallerPhone,
    Location,
    KeyFacts,
    Code,
    Notes,
    Summary,
    Zip,
    City,
    District,
    Street,
    Floor,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CallIntake {
    call: CallData,
    key_facts: Vec<String>,
    derived: BTreeSet<CallField>,
    manual_code: bool,
}

impl CallIntake {
    pub fn new(call: CallData) -> Self {
        let key_facts = call
            .keyword
            .split(", ")
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(ToString::to_string)
            .collect();
        Self {
            call,
            key_facts,
            derived: BTreeSet::new(),
            manual_code: false,
        }
    }

    pub fn call(&self) -> &CallData {
        &self.call
    }

    pub fn key_facts(&self) -> &[String] {
        &self.key_facts
    }

    pub fn derived_fields(&self) -> &BTreeSet<CallField> {
        &self.derived
    }

    pub fn is_derived(&self, field: CallField) -> bool {
        self.derived.contains(&field)
    }

    pub fn has_manual_code(&self) -> bool {
        self.manual_code
    }

    /// Adds a tag and classifies it. Returns the classification that was
    /// applied to the call, if any.
    pub fn add_key_fact(&mut self, tag: &str) -> Option<Classification> {
        if !self.push_key_fact(tag) {
            return None;
        }
        self.derived.insert(CallField::KeyFacts);

        if self.manual_code {
            debug!(tag = tag.trim(), "manual code pinned; skipping classification");
            return None;
        }

        let classification = rules::classify_tag(tag)?;
        debug!(
            tag = tag.trim(),
            code = %classification.code,
            keyword = %classification.matched_keyword,
            "tag classified"
        );
        self.call.code = Some(classification.code.clone());
        self.call.priority = Some(classification.priority);
        self.derived.insert(CallField::Code);
        Some(classification)
    }

    pub fn remove_key_fact(&mut self, tag: &str) -> bool {
        let before = self.key_facts.len();
        self.key_facts.retain(|f| f != tag);
        self.sync_keyword();
        self.key_facts.len() != before
    }

    /// Explicit code choice by the dispatcher. Authoritative over later
    /// tag classification until [`CallIntake::clear_manual_code`].
    pub fn select_classification(&mut self, code: &str, description: &str) {
        self.call.code = Some(code.trim().to_string());
        self.call.priority = Some(Priority::One);
        self.manual_code = true;
        self.derived.remove(&CallField::Code);
        if self.push_key_fact(description) {
            self.derived.insert(CallField::KeyFacts);
        }
    }

    pub fn clear_manual_code(&mut self) {
        self.manual_code = false;
        self.call.code = None;
        self.call.priority = None;
        self.derived.remove(&CallField::Code);
    }

    /// Dispatcher edit. Clears the derived badge of the edited field.
    pub fn edit_field(&mut self, field: CallField, value: &str) {
        self.derived.remove(&field);
        self.set_field(field, value);

        if field == CallField::Location {
            self.autofill_location();
        }
    }

    /// Text dragged from the transcript onto a field.
    ///
    /// `dragged_kind` is the suffix of an `application/x-cad-<kind>` drag
    /// type. Typed drags onto location or caller name must carry the matching
    /// kind; untyped drags are always accepted.
    pub fn drop_text(&mut self, field: CallField, text: &str, dragged_kind: Option<&str>) -> bool {
        if let Some(kind) = dragged_kind {
            let kind = kind.to_lowercase();
            let rejected = match field {
                CallField::Location => kind != "location",
                CallField::CallerName => kind != "callername",
                _ => false,
            };
            if rejected {
                debug!(?field, %kind, "drop rejected: kind mismatch");
                return false;
            }
        }

        if text.is_empty() {
            return false;
        }

        match field {
            CallField::KeyFacts => {
                self.add_key_fact(text);
            }
            // A dropped code is derived, not a manual pin.
            CallField::Code => {
                let code = text.trim();
                if code.is_empty() {
                    return false;
                }
                self.call.code = Some(code.to_string());
                self.manual_code = false;
            }
            _ => self.edit_field(field, text),
        }
        self.derived.insert(field);
        true
    }

    pub fn append_transcript(&mut self, line: impl Into<String>) {
        self.call.transcript.push(line.into());
    }

    pub fn set_scheduled(&mut self, scheduled: Option<ScheduledTransport>) {
        self.call.scheduled = scheduled;
    }

    pub fn set_affected_person_count(&mut self, count: Option<u32>) {
        self.call.affected_person_count = count;
    }

    /// Lowercase transcript and notes, the text the supervisor analyses.
    pub fn analysis_text(&self) -> String {
        format!("{} {}", self.call.transcript.join(" "), self.call.notes).to_lowercase()
    }

    pub fn is_dispatch_ready(&self) -> bool {
        self.call.location.chars().count() > 3
            && self.call.code.as_deref().is_some_and(|c| !c.is_empty())
    }

    fn push_key_fact(&mut self, tag: &str) -> bool {
        let tag = tag.trim();
        if tag.is_empty() || self.key_facts.iter().any(|f| f == tag) {
            return false;
        }
        self.key_facts.push(tag.to_string());
        self.sync_keyword();
        true
    }

    fn sync_keyword(&mut self) {
        self.call.keyword = self.key_facts.join(", ");
    }

    fn set_field(&mut self, field: CallField, value: &str) {
        let value = value.to_string();
        match field {
            CallField::CallerName => self.call.caller_name = value,
            CallField::CallerPhone => self.call.caller_phone = value,
            CallField::Location => self.call.location = value,
            CallField::Notes => self.call.notes = value,
            CallField::Summary => self.call.summary = value,
            CallField::Zip => self.call.zip = value,
            CallField::City => self.call.city = value,
            CallField::District => self.call.district = value,
            CallField::Street => self.call.street = value,
            CallField::Floor => self.call.floor = value,
            CallField::Code => {
                self.call.code = (!value.trim().is_empty()).then(|| value.trim().to_string());
                self.manual_code = self.call.code.is_some();
            }
            CallField::KeyFacts => {
                self.key_facts = value
                    .split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(ToString::to_string)
                    .collect();
                self.sync_keyword();
            }
        }
    }

    fn autofill_location(&mut self) {
        let lower = self.call.location.to_lowercase();
        if lower.chars().count() <= 3 {
            return;
        }
        if LOCATION_AUTOFILL_STREETS.iter().any(|s| lower.contains(s)) {
            self.call.zip = "80331".into();
            self.call.city = "Munich".into();
            self.call.district = "Old Town".into();
            self.derived.insert(CallField::Location);
        }
    }
}

impl Default for CallIntake {
    fn default() -> Self {
        Self::new(CallData::default())
    }
}
