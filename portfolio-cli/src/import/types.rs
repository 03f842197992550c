//! Closed enum domains for normalized portfolio fields
//!
//! Every enum here is the target of a normalizer in [`super::normalize`].
//! The database stores the `as_str()` representation.

/// Project priority
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::High => "High",
            Priority::Medium => "Medium",
            Priority::Low => "Low",
        }
    }
}

/// Functional Requirements Specification gate status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrsStatus {
    Draft,
    Review,
    Signoff,
}

impl FrsStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FrsStatus::Draft => "Draft",
            FrsStatus::Review => "Review",
            FrsStatus::Signoff => "Signoff",
        }
    }
}

/// Development status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DevStatus {
    NotStarted,
    InDevelopment,
    Testing,
    Uat,
    Deployed,
    OnHold,
}

impl DevStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DevStatus::NotStarted => "Not Started",
            DevStatus::InDevelopment => "In Development",
            DevStatus::Testing => "Testing",
            DevStatus::Uat => "UAT",
            DevStatus::Deployed => "Deployed",
            DevStatus::OnHold => "On Hold",
        }
    }
}

/// Red/Amber/Green traffic-light health indicator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RagStatus {
    Green,
    Amber,
    Red,
}

impl RagStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RagStatus::Green => "Green",
            RagStatus::Amber => "Amber",
            RagStatus::Red => "Red",
        }
    }
}

/// The five fixed delivery phases of a project
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseName {
    Frs,
    Development,
    Testing,
    Uat,
    Deployment,
}

impl PhaseName {
    /// All phases in delivery order; also the creation order for new projects
    pub const ALL: [PhaseName; 5] = [
        PhaseName::Frs,
        PhaseName::Development,
        PhaseName::Testing,
        PhaseName::Uat,
        PhaseName::Deployment,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PhaseName::Frs => "FRS",
            PhaseName::Development => "Development",
            PhaseName::Testing => "Testing",
            PhaseName::Uat => "UAT",
            PhaseName::Deployment => "Deployment",
        }
    }

    /// Normalized header key of this phase's column on the status sheet
    pub fn header_key(&self) -> &'static str {
        match self {
            PhaseName::Frs => "frs",
            PhaseName::Development => "development",
            PhaseName::Testing => "testing",
            PhaseName::Uat => "uat",
            PhaseName::Deployment => "deployment",
        }
    }
}

/// Phase progress status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseStatus {
    Pending,
    InProgress,
    Completed,
    Blocked,
}

impl PhaseStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PhaseStatus::Pending => "Pending",
            PhaseStatus::InProgress => "In Progress",
            PhaseStatus::Completed => "Completed",
            PhaseStatus::Blocked => "Blocked",
        }
    }
}

/// Risk impact severity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RiskImpact {
    Low,
    Medium,
    High,
    Critical,
}

impl RiskImpact {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskImpact::Low => "Low",
            RiskImpact::Medium => "Medium",
            RiskImpact::High => "High",
            RiskImpact::Critical => "Critical",
        }
    }
}

/// Risk probability
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RiskProbability {
    Low,
    Medium,
    High,
}

impl RiskProbability {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskProbability::Low => "Low",
            RiskProbability::Medium => "Medium",
            RiskProbability::High => "High",
        }
    }
}

/// Derived risk score. Never read from source data, always recomputed
/// from the impact x probability matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RiskScore {
    Low,
    Medium,
    High,
    Critical,
}

impl RiskScore {
    /// Fixed 4x3 lookup matrix (impact rows x probability columns)
    pub fn from_matrix(impact: RiskImpact, probability: RiskProbability) -> RiskScore {
        use RiskImpact as I;
        use RiskProbability as P;
        match (impact, probability) {
            (I::Low, P::Low) => RiskScore::Low,
            (I::Low, P::Medium) => RiskScore::Low,
            (I::Low, P::High) => RiskScore::Medium,
            (I::Medium, P::Low) => RiskScore::Low,
            (I::Medium, P::Medium) => RiskScore::Medium,
            (I::Medium, P::High) => RiskScore::High,
            (I::High, P::Low) => RiskScore::Medium,
            (I::High, P::Medium) => RiskScore::High,
            (I::High, P::High) => RiskScore::Critical,
            (I::Critical, P::Low) => RiskScore::High,
            (I::Critical, P::Medium) => RiskScore::Critical,
            (I::Critical, P::High) => RiskScore::Critical,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskScore::Low => "Low",
            RiskScore::Medium => "Medium",
            RiskScore::High => "High",
            RiskScore::Critical => "Critical",
        }
    }
}

/// Risk lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RiskStatus {
    Open,
    InProgress,
    Mitigated,
    Closed,
}

impl RiskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskStatus::Open => "Open",
            RiskStatus::InProgress => "In Progress",
            RiskStatus::Mitigated => "Mitigated",
            RiskStatus::Closed => "Closed",
        }
    }
}

/// Change request type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeType {
    Scope,
    Schedule,
    Budget,
    Resource,
}

impl ChangeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeType::Scope => "Scope",
            ChangeType::Schedule => "Schedule",
            ChangeType::Budget => "Budget",
            ChangeType::Resource => "Resource",
        }
    }
}

/// Change request lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeStatus {
    Pending,
    UnderReview,
    Approved,
    Rejected,
}

impl ChangeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeStatus::Pending => "Pending",
            ChangeStatus::UnderReview => "Under Review",
            ChangeStatus::Approved => "Approved",
            ChangeStatus::Rejected => "Rejected",
        }
    }
}

macro_rules! impl_display {
    ($($ty:ty),+) => {
        $(impl std::fmt::Display for $ty {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.as_str())
            }
        })+
    };
}

impl_display!(
    Priority,
    FrsStatus,
    DevStatus,
    RagStatus,
    PhaseName,
    PhaseStatus,
    RiskImpact,
    RiskProbability,
    RiskScore,
    RiskStatus,
    ChangeType,
    ChangeStatus
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_risk_matrix_corners() {
        assert_eq!(
            RiskScore::from_matrix(RiskImpact::High, RiskProbability::High),
            RiskScore::Critical
        );
        assert_eq!(
            RiskScore::from_matrix(RiskImpact::Low, RiskProbability::Low),
            RiskScore::Low
        );
        assert_eq!(
            RiskScore::from_matrix(RiskImpact::Critical, RiskProbability::Low),
            RiskScore::High
        );
        assert_eq!(
            RiskScore::from_matrix(RiskImpact::Medium, RiskProbability::High),
            RiskScore::High
        );
    }

    #[test]
    fn test_phase_order() {
        let names: Vec<&str> = PhaseName::ALL.iter().map(|p| p.as_str()).collect();
        assert_eq!(names, ["FRS", "Development", "Testing", "UAT", "Deployment"]);
    }
}
