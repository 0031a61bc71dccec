//! Keyword-based intent detection for operator questions.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::plant::Kpi;

/// What the operator is asking for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Intent {
    /// List of capabilities.
    Help,
    /// Setpoint recommendation.
    Optimize,
    /// Recent warnings and alerts.
    Alerts,
    /// Current value of one or more KPIs.
    Kpi {
        /// Requested KPIs in canonical order.
        kpis: Vec<Kpi>,
    },
    /// Overall plant overview.
    Status,
    /// Salutation.
    Greeting,
    /// Nothing recognised.
    Unknown,
}

/// Intent label used for metrics and responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum IntentKind {
    /// See [`Intent::Help`].
    Help,
    /// See [`Intent::Optimize`].
    Optimize,
    /// See [`Intent::Alerts`].
    Alerts,
    /// See [`Intent::Kpi`].
    Kpi,
    /// See [`Intent::Status`].
    Status,
    /// See [`Intent::Greeting`].
    Greeting,
    /// See [`Intent::Unknown`].
    Unknown,
}

impl Intent {
    /// Label without payload.
    pub fn kind(&self) -> IntentKind {
        match self {
            Intent::Help => IntentKind::Help,
            Intent::Optimize => IntentKind::Optimize,
            Intent::Alerts => IntentKind::Alerts,
            Intent::Kpi { .. } => IntentKind::Kpi,
            Intent::Status => IntentKind::Status,
            Intent::Greeting => IntentKind::Greeting,
            Intent::Unknown => IntentKind::Unknown,
        }
    }
}

// Patterns are literals exercised by the tests below.
fn pattern(re: &str) -> Regex {
    Regex::new(re).expect("intent pattern must compile")
}

static HELP: Lazy<Regex> = Lazy::new(|| pattern(r"(?i)\b(help|what can you do|commands)\b"));
static OPTIMIZE: Lazy<Regex> =
    Lazy::new(|| pattern(r"(?i)\b(optimi[sz]\w*|recommend\w*|suggest\w*|improve\w*|setpoints?)\b"));
static ALERTS: Lazy<Regex> = Lazy::new(|| pattern(r"(?i)\b(alerts?|alarms?|warnings?|logs?)\b"));
static STATUS: Lazy<Regex> =
    Lazy::new(|| pattern(r"(?i)\b(status|overview|summary|how is the (plant|kiln))\b"));
static GREETING: Lazy<Regex> =
    Lazy::new(|| pattern(r"(?i)^\s*(hi|hello|hey|good (morning|afternoon|evening))\b"));

static KPI_PATTERNS: Lazy<Vec<(Kpi, Regex)>> = Lazy::new(|| {
    vec![
        (Kpi::Spc, pattern(r"(?i)\b(spc|power|energy|kwh)\b")),
        (
            Kpi::Tsr,
            pattern(r"(?i)\b(tsr|thermal substitution|alternative fuels?|afr)\b"),
        ),
        (
            Kpi::ClinkerQuality,
            pattern(r"(?i)\b(clinker|quality|free lime)\b"),
        ),
        (Kpi::Co2, pattern(r"(?i)(\bco2\b|co₂|\bemissions?\b|\bcarbon\b)")),
    ]
});

/// Detect the intent of a message. The first matching rule wins.
pub fn detect_intent(message: &str) -> Intent {
    if HELP.is_match(message) {
        return Intent::Help;
    }
    if OPTIMIZE.is_match(message) {
        return Intent::Optimize;
    }
    if ALERTS.is_match(message) {
        return Intent::Alerts;
    }

    let kpis: Vec<Kpi> = KPI_PATTERNS
        .iter()
        .filter(|(_, re)| re.is_match(message))
        .map(|(kpi, _)| *kpi)
        .collect();
    if !kpis.is_empty() {
        return Intent::Kpi { kpis };
    }

    if STATUS.is_match(message) {
        return Intent::Status;
    }
    if GREETING.is_match(message) {
        return Intent::Greeting;
    }
    Intent::Unknown
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn detects_help_first() {
        assert_eq!(detect_intent("help me optimize"), Intent::Help);
    }

    #[test]
    fn detects_optimization_requests() {
        assert_eq!(detect_intent("Can you recommend new setpoints?"), Intent::Optimize);
        assert_eq!(detect_intent("optimise the kiln"), Intent::Optimize);
    }

    #[test]
    fn detects_alerts() {
        assert_eq!(detect_intent("any alarms in the last hour?"), Intent::Alerts);
    }

    #[test]
    fn detects_multiple_kpis_in_canonical_order() {
        assert_eq!(
            detect_intent("what are co2 and power right now"),
            Intent::Kpi {
                kpis: vec![Kpi::Spc, Kpi::Co2]
            }
        );
        assert_eq!(
            detect_intent("How is clinker quality?"),
            Intent::Kpi {
                kpis: vec![Kpi::ClinkerQuality]
            }
        );
        assert_eq!(
            detect_intent("CO₂ please"),
            Intent::Kpi {
                kpis: vec![Kpi::Co2]
            }
        );
    }

    #[test]
    fn detects_status_and_greeting() {
        assert_eq!(detect_intent("give me an overview"), Intent::Status);
        assert_eq!(detect_intent("Hello there"), Intent::Greeting);
        assert_eq!(detect_intent("Good morning"), Intent::Greeting);
    }

    #[test]
    fn unknown_when_nothing_matches() {
        assert_eq!(detect_intent("what is the meaning of life"), Intent::Unknown);
        assert_eq!(detect_intent("powerful"), Intent::Unknown);
    }

    #[test]
    fn intent_kind_labels() {
        assert_eq!(Intent::Kpi { kpis: vec![] }.kind().to_string(), "kpi");
        assert_eq!(Intent::Unknown.kind().to_string(), "unknown");
    }
}
