use crate::error::DispatchError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Priority {
    #[serde(rename = "1")]
    One,
    #[serde(rename = "2")]
    Two,
    #[serde(rename = "3")]
    Three,
}

impl Priority {
    pub fn code(&self) -> &'static str {
        match self {
            Priority::One => "1",
            Priority::Two => "2",
            Priority::Three => "3",
        }
    }
}

impl FromStr for Priority {
    type Err = DispatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "1" => Ok(Priority::One),
            "2" => Ok(Priority::Two),
            "3" => Ok(Priority::Three),
            other => Err(DispatchError::InvalidPriority(other.to_string())),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IncidentStatus {
    Open,
    Dispatching,
    Active,
    Closed,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct IncidentLocation {
    pub address: String,
    pub lat: f64,
    pub lng: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Incident {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keyword: Option<String>,
    #[serde(rename = "type")]
    pub incident_type: String,
    pub category: String,
    pub location: IncidentLocation,
    pub priority: Priority,
    pub status: IncidentStatus,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub assigned_units: Vec<String>,
}

impl Incident {
    pub fn is_open(&self) -> bool {
        self.status != IncidentStatus::Closed
    }

    pub fn is_assigned(&self, unit_id: &str) -> bool {
        self.assigned_units.iter().any(|id| id == unit_id)
    }

    /// Code when known, otherwise the free-text type.
    pub fn headline(&self) -> &str {
        self.code.as_deref().unwrap_or(&self.incident_type)
    }
}

/// Incident overview filters.
///
/// Categories come from mixed German/English seed data, so the category
/// filters test both spellings.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IncidentFilter {
    #[default]
    All,
    Fire,
    Rescue,
    Technical,
    PriorityOne,
    Active,
    Dispatching,
}

impl IncidentFilter {
    pub fn matches(&self, incident: &Incident) -> bool {
        let category = incident.category.to_lowercase();
        match self {
            IncidentFilter::All => true,
            IncidentFilter::PriorityOne => incident.priority == Priority::One,
            IncidentFilter::Active => incident.status == IncidentStatus::Active,
            IncidentFilter::Dispatching => incident.status == IncidentStatus::Dispatching,
            IncidentFilter::Fire => category.contains("feuer") || category.contains("fire"),
            IncidentFilter::Rescue => {
                category.contains("rettung") || category.contains("rescue") || category.contains("ems")
            }
            IncidentFilter::Technical => category.contains("technisch") || category.contains("tech"),
        }
    }
}
