use serde::{Deserialize, Serialize};

/// Ordinal risk band derived from an application's total score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RiskBand {
    #[serde(rename = "HIGH RISK")]
    High,
    #[serde(rename = "MEDIUM RISK")]
    Medium,
    #[serde(rename = "LOW RISK")]
    Low,
}

impl RiskBand {
    /// Band thresholds: below 55 high, 55 to just under 70 medium, 70
    /// and above low. Total over all reals, no failure mode.
    pub fn classify(total_score: f64) -> Self {
        if total_score < 55.0 {
            RiskBand::High
        } else if total_score < 70.0 {
            RiskBand::Medium
        } else {
            RiskBand::Low
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            RiskBand::High => "HIGH RISK",
            RiskBand::Medium => "MEDIUM RISK",
            RiskBand::Low => "LOW RISK",
        }
    }
}
