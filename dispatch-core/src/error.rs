use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    #[error("unknown unit '{0}'")]
    UnknownUnit(String),

    #[error("unknown incident '{0}'")]
    UnknownIncident(String),

    #[error("incident '{0}' already exists")]
    DuplicateIncident(String),

    #[error("unit '{0}' is not part of the dispatch proposal")]
    NotInProposal(String),

    #[error("unknown quick action '{0}'")]
    UnknownQuickAction(String),

    #[error("no recommendation to act on")]
    NoRecommendation,

    #[error("unit '{0}' is not requesting voice contact")]
    NotRequestingVoiceContact(String),

    #[error("invalid unit status '{0}'")]
    InvalidStatus(String),

    #[error("invalid unit type '{0}'")]
    InvalidUnitType(String),

    #[error("invalid priority '{0}'")]
    InvalidPriority(String),
}

pub type Result<T> = std::result::Result<T, DispatchError>;
