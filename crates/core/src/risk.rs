//! Risk-tier vocabulary for completed analyses.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Ordinal risk category. Variant order is the severity order, so the
/// derived `Ord` compares tiers correctly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskTier {
    Low,
    Gray,
    Warning,
    High,
}

impl RiskTier {
    /// All tiers from least to most severe.
    pub const ORDERED: [RiskTier; 4] = [
        RiskTier::Low,
        RiskTier::Gray,
        RiskTier::Warning,
        RiskTier::High,
    ];

    /// Wire representation of the tier.
    pub fn as_str(self) -> &'static str {
        match self {
            RiskTier::Low => "LOW",
            RiskTier::Gray => "GRAY",
            RiskTier::Warning => "WARNING",
            RiskTier::High => "HIGH",
        }
    }

    /// Zero-based position on the severity scale.
    pub fn ordinal(self) -> usize {
        self as usize
    }

    /// Position of the tier on a 0–100 severity scale, used when
    /// rendering the tier as a filled bar.
    pub fn scale_percent(self) -> f64 {
        (self.ordinal() + 1) as f64 / Self::ORDERED.len() as f64 * 100.0
    }
}

impl fmt::Display for RiskTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RiskTier {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "LOW" => Ok(RiskTier::Low),
            "GRAY" => Ok(RiskTier::Gray),
            "WARNING" => Ok(RiskTier::Warning),
            "HIGH" => Ok(RiskTier::High),
            other => Err(CoreError::UnknownTier(other.to_string())),
        }
    }
}

/// Model confidence label attached to a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    High,
    Medium,
    Low,
}

impl Confidence {
    /// Wire representation of the confidence label.
    pub fn as_str(self) -> &'static str {
        match self {
            Confidence::High => "high",
            Confidence::Medium => "medium",
            Confidence::Low => "low",
        }
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Direction in which an explanation feature pushed the risk estimate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Positive,
    Negative,
}
