//! Reply composition from live plant data.

use std::fmt::Write;

use strum::IntoEnumIterator;

use crate::optimizer::{optimize, SearchOptions, Setpoints};
use crate::plant::{AlertThresholds, Kpi, KpiSample, LogLevel, PlantHistory};

use super::intent::Intent;

/// Number of recent log entries quoted in an alerts reply.
const ALERTS_QUOTED: usize = 3;

const HELP_TEXT: &str = "I can report live KPIs (SPC, TSR, clinker quality, CO₂), \
summarise recent warnings and alerts, give a plant overview, and recommend \
kiln setpoints. Try \"what is the SPC?\" or \"recommend setpoints\".";

const NO_DATA: &str = "No plant data has been received yet. Please try again in a few seconds.";

fn describe(kpi: Kpi, sample: &KpiSample) -> String {
    format!(
        "{} is {:.1} {}",
        kpi.title(),
        sample.values().get(kpi),
        kpi.unit()
    )
}

fn spc_band(spc: f64, thresholds: &AlertThresholds) -> &'static str {
    match thresholds.classify_spc(spc) {
        Some(LogLevel::Alert) => "critical",
        Some(_) => "high",
        None => "within normal range",
    }
}

/// Compose the assistant's answer for an intent.
pub fn compose_reply(intent: &Intent, history: &PlantHistory, thresholds: &AlertThresholds) -> String {
    match intent {
        Intent::Help => HELP_TEXT.to_string(),
        Intent::Greeting => {
            "Hello! I'm Plant GPT, your kiln assistant. Ask me about KPIs, alerts or setpoints."
                .to_string()
        }
        Intent::Unknown => {
            format!("Sorry, I didn't understand that. {HELP_TEXT}")
        }
        Intent::Kpi { kpis } => match history.latest() {
            Some(sample) => {
                let parts: Vec<String> = kpis.iter().map(|k| describe(*k, sample)).collect();
                let mut reply = format!("{}.", parts.join("; "));
                if kpis.contains(&Kpi::Spc) {
                    let _ = write!(reply, " SPC is {}.", spc_band(sample.spc, thresholds));
                }
                reply
            }
            None => NO_DATA.to_string(),
        },
        Intent::Status => match history.latest() {
            Some(sample) => {
                let parts: Vec<String> = Kpi::iter().map(|k| describe(k, sample)).collect();
                format!(
                    "Kiln is running. {}. {} alerts and {} warnings in the recent log.",
                    parts.join("; "),
                    history.log_count(LogLevel::Alert),
                    history.log_count(LogLevel::Warning)
                )
            }
            None => NO_DATA.to_string(),
        },
        Intent::Alerts => {
            let recent: Vec<String> = history
                .logs()
                .filter(|l| l.level != LogLevel::Info)
                .take(ALERTS_QUOTED)
                .map(|l| format!("[{}] {}", l.level, l.message))
                .collect();
            if recent.is_empty() {
                "No warnings or alerts in the recent log.".to_string()
            } else {
                format!(
                    "{} alerts and {} warnings recently. Latest: {}",
                    history.log_count(LogLevel::Alert),
                    history.log_count(LogLevel::Warning),
                    recent.join(" | ")
                )
            }
        }
        Intent::Optimize => match optimize(Setpoints::default(), &SearchOptions::default()) {
            Ok(result) => {
                let s = result.recommended.setpoints;
                format!(
                    "Recommended setpoints: feed {:.0} t/h, fuel {:.1} t/h, alternative fuel {:.0} %, \
kiln speed {:.2} rpm. Predicted change: SPC {:+.1} kWh/t, CO₂ {:+.2}, TSR {:+.1} %, \
clinker quality {:+.1} %.",
                    s.kiln_feed_tph,
                    s.fuel_tph,
                    s.alt_fuel_pct,
                    s.kiln_speed_rpm,
                    result.deltas.spc,
                    result.deltas.co2,
                    result.deltas.tsr,
                    result.deltas.clinker_quality
                )
            }
            Err(e) => format!("The optimizer could not produce a recommendation: {e}"),
        },
    }
}
