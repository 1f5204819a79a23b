use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum BedStatus {
    Available,
    Limited,
    Full,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Hospital {
    pub id: String,
    pub name: String,
    pub address: String,
    pub distance_km: f64,
    pub status: BedStatus,
    pub specialties: Vec<String>,
}

impl Hospital {
    pub fn has_specialty(&self, specialty: &str) -> bool {
        let wanted = specialty.to_lowercase();
        self.specialties.iter().any(|s| s.to_lowercase().contains(&wanted))
    }
}

/// Available first, then Limited, then Full; nearest first within a status.
pub fn sorted_for_display(hospitals: &[Hospital]) -> Vec<Hospital> {
    let mut out = hospitals.to_vec();
    out.sort_by(|a, b| {
        a.status
            .cmp(&b.status)
            .then_with(|| a.distance_km.total_cmp(&b.distance_km))
    });
    out
}

pub fn nearest_accepting<'a>(hospitals: &'a [Hospital], specialty: &str) -> Option<&'a Hospital> {
    hospitals
        .iter()
        .filter(|h| h.status != BedStatus::Full && h.has_specialty(specialty))
        .min_by(|a, b| a.distance_km.total_cmp(&b.distance_km))
}
