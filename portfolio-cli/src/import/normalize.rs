//! Free-text to closed-enum normalizers
//!
//! Source registers are hand-typed and bilingual (English/French), so every
//! normalizer is a total function: lowercase substring matching against an
//! ordered rule list, falling back to a fixed default. Rules are evaluated
//! top to bottom; the first keyword hit wins. Adding a synonym is a
//! one-entry change to the relevant table.

use super::types::{
    ChangeStatus, ChangeType, DevStatus, FrsStatus, PhaseStatus, Priority, RagStatus, RiskImpact,
    RiskProbability, RiskStatus,
};

/// One entry in an ordered keyword-match table
struct Rule<T> {
    keywords: &'static [&'static str],
    value: T,
}

fn first_match<T: Copy>(input: &str, rules: &[Rule<T>], default: T) -> T {
    let s = input.trim().to_lowercase();
    if s.is_empty() {
        return default;
    }
    for rule in rules {
        if rule.keywords.iter().any(|k| s.contains(k)) {
            return rule.value;
        }
    }
    default
}

const PRIORITY_RULES: &[Rule<Priority>] = &[
    Rule { keywords: &["high", "haute", "élev", "urgent"], value: Priority::High },
    Rule { keywords: &["low", "basse", "faible"], value: Priority::Low },
];

pub fn priority(input: &str) -> Priority {
    first_match(input, PRIORITY_RULES, Priority::Medium)
}

const RAG_RULES: &[Rule<RagStatus>] = &[
    Rule { keywords: &["green", "vert"], value: RagStatus::Green },
    Rule { keywords: &["red", "rouge"], value: RagStatus::Red },
    Rule { keywords: &["amber", "orange", "jaune"], value: RagStatus::Amber },
];

/// Amber is both a literal match and the fallback
pub fn rag_status(input: &str) -> RagStatus {
    first_match(input, RAG_RULES, RagStatus::Amber)
}

const FRS_RULES: &[Rule<FrsStatus>] = &[
    Rule { keywords: &["sign", "approuv", "approv", "validé", "valide"], value: FrsStatus::Signoff },
    Rule { keywords: &["review", "revue", "relecture"], value: FrsStatus::Review },
];

pub fn frs_status(input: &str) -> FrsStatus {
    first_match(input, FRS_RULES, FrsStatus::Draft)
}

const DEV_RULES: &[Rule<DevStatus>] = &[
    Rule { keywords: &["deploy", "prod", "live"], value: DevStatus::Deployed },
    Rule { keywords: &["uat", "recette"], value: DevStatus::Uat },
    Rule { keywords: &["test"], value: DevStatus::Testing },
    Rule { keywords: &["develop", "progress", "cours"], value: DevStatus::InDevelopment },
    Rule { keywords: &["hold", "pause", "attente"], value: DevStatus::OnHold },
];

pub fn dev_status(input: &str) -> DevStatus {
    first_match(input, DEV_RULES, DevStatus::NotStarted)
}

/// Phase cells carry checkmarks, dashes and shorthand, so the bare "x" and
/// dash forms are exact matches rather than substring rules.
pub fn phase_status(input: &str) -> PhaseStatus {
    let s = input.trim().to_lowercase();
    if s.is_empty() || s == "-" || s == "–" {
        return PhaseStatus::Pending;
    }
    if s == "x"
        || s.contains('✓')
        || s.contains('✔')
        || s.contains("done")
        || s.contains("complet")
        || s.contains("termin")
    {
        return PhaseStatus::Completed;
    }
    if s.contains("block") || s.contains("bloqu") {
        return PhaseStatus::Blocked;
    }
    if s.contains("progress") || s.contains("cours") {
        return PhaseStatus::InProgress;
    }
    PhaseStatus::Pending
}

const IMPACT_RULES: &[Rule<RiskImpact>] = &[
    Rule { keywords: &["critic", "critique"], value: RiskImpact::Critical },
    Rule { keywords: &["high", "haute", "élev", "major"], value: RiskImpact::High },
    Rule { keywords: &["low", "basse", "faible", "minor", "mineur"], value: RiskImpact::Low },
];

pub fn risk_impact(input: &str) -> RiskImpact {
    first_match(input, IMPACT_RULES, RiskImpact::Medium)
}

// Low rules run first: "unlikely" contains "likely".
const PROBABILITY_RULES: &[Rule<RiskProbability>] = &[
    Rule { keywords: &["unlikely", "rare", "low", "basse", "faible"], value: RiskProbability::Low },
    Rule { keywords: &["likely", "probable", "high", "haute", "élev"], value: RiskProbability::High },
];

pub fn risk_probability(input: &str) -> RiskProbability {
    first_match(input, PROBABILITY_RULES, RiskProbability::Medium)
}

const RISK_STATUS_RULES: &[Rule<RiskStatus>] = &[
    Rule { keywords: &["clos", "fermé", "ferme", "resolved"], value: RiskStatus::Closed },
    Rule { keywords: &["mitig", "attén", "atten"], value: RiskStatus::Mitigated },
    Rule { keywords: &["progress", "cours"], value: RiskStatus::InProgress },
];

pub fn risk_status(input: &str) -> RiskStatus {
    first_match(input, RISK_STATUS_RULES, RiskStatus::Open)
}

const CHANGE_TYPE_RULES: &[Rule<ChangeType>] = &[
    Rule { keywords: &["sched", "calendrier", "délai", "delai", "planning", "date"], value: ChangeType::Schedule },
    Rule { keywords: &["budget", "coût", "cout", "cost"], value: ChangeType::Budget },
    Rule { keywords: &["resource", "ressource", "staff"], value: ChangeType::Resource },
    Rule { keywords: &["scope", "périmètre", "perimetre", "portée", "portee"], value: ChangeType::Scope },
];

pub fn change_type(input: &str) -> ChangeType {
    first_match(input, CHANGE_TYPE_RULES, ChangeType::Scope)
}

const CHANGE_STATUS_RULES: &[Rule<ChangeStatus>] = &[
    Rule { keywords: &["approv", "approuv", "accept"], value: ChangeStatus::Approved },
    Rule { keywords: &["reject", "rejet", "refus"], value: ChangeStatus::Rejected },
    Rule { keywords: &["review", "revue", "étude", "etude"], value: ChangeStatus::UnderReview },
];

pub fn change_status(input: &str) -> ChangeStatus {
    first_match(input, CHANGE_STATUS_RULES, ChangeStatus::Pending)
}

/// Completion percentages arrive either as a 0-100 number or as an Excel
/// percent cell (a 0.0-1.0 fraction). Clamped to 0..=100.
pub fn completion_percent(raw: f64) -> i64 {
    if !raw.is_finite() {
        return 0;
    }
    let value = if raw > 0.0 && raw <= 1.0 { raw * 100.0 } else { raw };
    (value.round() as i64).clamp(0, 100)
}
