use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Anything that can stand in a dispatch proposal for compliance checks.
pub trait DispatchCandidate {
    fn unit_type_code(&self) -> &str;
    fn is_selected(&self) -> bool;
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryCheck {
    pub category: String,
    pub satisfied: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComplianceReport {
    pub checks: Vec<CategoryCheck>,
}

impl ComplianceReport {
    pub fn is_compliant(&self) -> bool {
        self.checks.iter().all(|c| c.satisfied)
    }

    pub fn missing(&self) -> Vec<&str> {
        self.checks
            .iter()
            .filter(|c| !c.satisfied)
            .map(|c| c.category.as_str())
            .collect()
    }

    pub fn satisfied(&self, category: &str) -> Option<bool> {
        self.checks
            .iter()
            .find(|c| c.category == category)
            .map(|c| c.satisfied)
    }

    pub fn as_map(&self) -> BTreeMap<String, bool> {
        self.checks
            .iter()
            .map(|c| (c.category.clone(), c.satisfied))
            .collect()
    }
}

/// A category is satisfied by one selected candidate whose type code
/// contains it. Quantities are not checked.
pub fn check_compliance<C: DispatchCandidate>(required: &[String], candidates: &[C]) -> ComplianceReport {
    let checks = required
        .iter()
        .map(|category| CategoryCheck {
            category: category.clone(),
            satisfied: candidates
                .iter()
                .any(|c| c.is_selected() && c.unit_type_code().contains(category.as_str())),
        })
        .collect();
    ComplianceReport { checks }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Candidate(&'static str, bool);

    impl DispatchCandidate for Candidate {
        fn unit_type_code(&self) -> &str {
            self.0
        }

        fn is_selected(&self) -> bool {
            self.1
        }
    }

    fn required(codes: &[&str]) -> Vec<String> {
        codes.iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn deselected_units_do_not_count() {
        let report = check_compliance(
            &required(&["RTW", "NEF", "HLF"]),
            &[Candidate("RTW", true), Candidate("HLF", false)],
        );
        let expected: BTreeMap<String, bool> = [
            ("HLF".to_string(), false),
            ("NEF".to_string(), false),
            ("RTW".to_string(), true),
        ]
        .into_iter()
        .collect();
        assert_eq!(report.as_map(), expected);
        assert!(!report.is_compliant());
        assert_eq!(report.missing(), vec!["NEF", "HLF"]);
    }

    #[test]
    fn empty_selection_satisfies_nothing() {
        let report = check_compliance::<Candidate>(&required(&["RTW", "HLF"]), &[]);
        assert_eq!(report.missing(), vec!["RTW", "HLF"]);
    }

    #[test]
    fn one_unit_satisfies_a_repeated_category() {
        let report = check_compliance(&required(&["HLF", "HLF"]), &[Candidate("HLF", true)]);
        assert!(report.is_compliant());
    }

    #[test]
    fn matching_is_substring_and_case_sensitive() {
        let report = check_compliance(&required(&["LF", "rtw"]), &[Candidate("HLF", true), Candidate("RTW", true)]);
        assert_eq!(report.satisfied("LF"), Some(true));
        assert_eq!(report.satisfied("rtw"), Some(false));
        assert_eq!(report.satisfied("ELW"), None);
    }

    #[test]
    fn no_requirements_is_compliant() {
        let report = check_compliance(&[], &[Candidate("RTW", false)]);
        assert!(report.is_compliant());
        assert!(report.checks.is_empty());
    }
}
