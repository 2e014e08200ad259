//! Weights and tier ladders used by the churn estimator.
//!
//! [`ScoringConfig::default`] carries the production constants. A JSON file
//! can override any subset of them; missing keys keep their defaults.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::models::RiskFactor;

const WEIGHT_TOLERANCE: f64 = 0.001;

/// One rung of a [`Ladder`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tier {
    pub bound: f64,
    pub points: u32,
}

/// Ordered tiers; the first tier the value clears awards its points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Ladder(pub Vec<Tier>);

impl Ladder {
    pub fn new(tiers: &[(f64, u32)]) -> Self {
        Ladder(
            tiers
                .iter()
                .map(|&(bound, points)| Tier { bound, points })
                .collect(),
        )
    }

    /// Points for the first tier with `value > bound`, else 0.
    pub fn above(&self, value: f64) -> u32 {
        self.0
            .iter()
            .find(|tier| value > tier.bound)
            .map_or(0, |tier| tier.points)
    }

    /// Points for the first tier with `value < bound`, else 0.
    pub fn below(&self, value: f64) -> u32 {
        self.0
            .iter()
            .find(|tier| value < tier.bound)
            .map_or(0, |tier| tier.points)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FactorWeights {
    pub login_frequency: f64,
    pub engagement_drop: f64,
    pub payment_issues: f64,
    pub content_consumption: f64,
    pub session_duration: f64,
    pub message_activity: f64,
}

impl Default for FactorWeights {
    fn default() -> Self {
        FactorWeights {
            login_frequency: 0.25,
            engagement_drop: 0.20,
            payment_issues: 0.20,
            content_consumption: 0.15,
            session_duration: 0.10,
            message_activity: 0.10,
        }
    }
}

impl FactorWeights {
    pub fn get(&self, factor: RiskFactor) -> f64 {
        match factor {
            RiskFactor::LoginFrequency => self.login_frequency,
            RiskFactor::EngagementDrop => self.engagement_drop,
            RiskFactor::PaymentIssues => self.payment_issues,
            RiskFactor::ContentConsumption => self.content_consumption,
            RiskFactor::SessionDuration => self.session_duration,
            RiskFactor::MessageActivity => self.message_activity,
        }
    }

    pub fn total(&self) -> f64 {
        RiskFactor::ALL.iter().map(|&factor| self.get(factor)).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoginThresholds {
    pub short_window_days: i64,
    pub long_window_days: i64,
    /// Used as days-since-last-seen when a member has never been seen.
    pub never_seen_days: i64,
    pub short_window_logins: Ladder,
    pub long_window_logins: Ladder,
    pub days_since_seen: Ladder,
}

impl Default for LoginThresholds {
    fn default() -> Self {
        LoginThresholds {
            short_window_days: 7,
            long_window_days: 30,
            never_seen_days: 999,
            short_window_logins: Ladder::new(&[(1.0, 40), (2.0, 20)]),
            long_window_logins: Ladder::new(&[(4.0, 30), (8.0, 15)]),
            days_since_seen: Ladder::new(&[(14.0, 30), (7.0, 15)]),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngagementThresholds {
    pub min_baseline_samples: usize,
    /// Baseline means at or below this are treated as unmeasurable.
    pub baseline_epsilon: f64,
    pub content_view_drop: Ladder,
    pub message_drop: Ladder,
    pub session_drop: Ladder,
}

impl Default for EngagementThresholds {
    fn default() -> Self {
        EngagementThresholds {
            min_baseline_samples: 4,
            baseline_epsilon: 1e-9,
            content_view_drop: Ladder::new(&[(50.0, 35), (30.0, 20), (15.0, 10)]),
            message_drop: Ladder::new(&[(60.0, 30), (40.0, 15), (20.0, 8)]),
            session_drop: Ladder::new(&[(50.0, 35), (30.0, 20), (15.0, 10)]),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaymentThresholds {
    pub no_history_score: u32,
    pub considered_payments: usize,
    pub failure_rate: Ladder,
    pub latest_failed_penalty: u32,
}

impl Default for PaymentThresholds {
    fn default() -> Self {
        PaymentThresholds {
            no_history_score: 50,
            considered_payments: 6,
            failure_rate: Ladder::new(&[(50.0, 80), (30.0, 60), (10.0, 30), (0.0, 15)]),
            latest_failed_penalty: 20,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContentThresholds {
    pub window_days: i64,
    pub no_consumption_score: u32,
    pub content_views: Ladder,
}

impl Default for ContentThresholds {
    fn default() -> Self {
        ContentThresholds {
            window_days: 7,
            no_consumption_score: 90,
            content_views: Ladder::new(&[(2.0, 60), (5.0, 30)]),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionThresholds {
    pub no_metrics_score: u32,
    pub average_secs: Ladder,
}

impl Default for SessionThresholds {
    fn default() -> Self {
        SessionThresholds {
            no_metrics_score: 50,
            average_secs: Ladder::new(&[(60.0, 80), (180.0, 60), (300.0, 40), (600.0, 20)]),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MessageThresholds {
    pub window_days: i64,
    pub messages: Ladder,
}

impl Default for MessageThresholds {
    fn default() -> Self {
        MessageThresholds {
            window_days: 14,
            messages: Ladder::new(&[(1.0, 70), (3.0, 40), (7.0, 20)]),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfidenceThresholds {
    pub base: u32,
    pub tenure_days: Ladder,
    pub activities: Ladder,
    pub metrics_rows: Ladder,
    pub payments: Ladder,
}

impl Default for ConfidenceThresholds {
    fn default() -> Self {
        ConfidenceThresholds {
            base: 50,
            tenure_days: Ladder::new(&[(60.0, 20), (30.0, 10)]),
            activities: Ladder::new(&[(100.0, 15), (50.0, 10), (20.0, 5)]),
            metrics_rows: Ladder::new(&[(30.0, 10), (14.0, 5)]),
            payments: Ladder::new(&[(6.0, 5), (3.0, 3)]),
        }
    }
}

/// Minimum churn score for each bucket above "low".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskLevelThresholds {
    pub medium: u8,
    pub high: u8,
    pub critical: u8,
}

impl Default for RiskLevelThresholds {
    fn default() -> Self {
        RiskLevelThresholds {
            medium: 40,
            high: 70,
            critical: 85,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChurnDateSettings {
    /// Scores below this get no predicted date.
    pub min_score: u8,
    pub horizon_days: f64,
    pub days_per_point: f64,
    pub min_days: i64,
}

impl Default for ChurnDateSettings {
    fn default() -> Self {
        ChurnDateSettings {
            min_score: 40,
            horizon_days: 120.0,
            days_per_point: 1.2,
            min_days: 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecommendationSettings {
    pub max_factors: usize,
    /// Factors scoring below this are not actionable.
    pub min_score: u8,
}

impl Default for RecommendationSettings {
    fn default() -> Self {
        RecommendationSettings {
            max_factors: 3,
            min_score: 30,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub weights: FactorWeights,
    pub login: LoginThresholds,
    pub engagement: EngagementThresholds,
    pub payment: PaymentThresholds,
    pub content: ContentThresholds,
    pub session: SessionThresholds,
    pub message: MessageThresholds,
    pub confidence: ConfidenceThresholds,
    pub risk_levels: RiskLevelThresholds,
    pub churn_date: ChurnDateSettings,
    pub recommendations: RecommendationSettings,
}

impl ScoringConfig {
    /// Loads overrides from a JSON file and validates the result.
    pub fn from_path(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|source| Error::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        let config: ScoringConfig =
            serde_json::from_str(&raw).map_err(|source| Error::ConfigParse {
                path: path.to_path_buf(),
                source,
            })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        for factor in RiskFactor::ALL {
            let weight = self.weights.get(factor);
            if !weight.is_finite() || weight < 0.0 {
                return Err(Error::InvalidWeights(format!(
                    "{factor} has weight {weight}"
                )));
            }
        }

        let total = self.weights.total();
        if (total - 1.0).abs() > WEIGHT_TOLERANCE {
            return Err(Error::InvalidWeights(format!(
                "weights sum to {total:.3}, expected 1.000"
            )));
        }

        Ok(())
    }
}
