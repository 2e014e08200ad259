use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemberStatus {
    Active,
    Paused,
    Cancelled,
    Expired,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Member {
    pub id: Uuid,
    pub email: String,
    pub joined_at: DateTime<Utc>,
    pub last_seen_at: Option<DateTime<Utc>>,
    pub status: MemberStatus,
    pub tier: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    Login,
    ContentView,
    Message,
    Download,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    pub id: Uuid,
    pub member_id: Uuid,
    pub kind: ActivityKind,
    pub created_at: DateTime<Utc>,
    pub metadata: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricsPeriod {
    Daily,
    Weekly,
    Monthly,
}

/// Aggregated engagement counts for one member over one period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngagementMetrics {
    pub member_id: Uuid,
    pub date: NaiveDate,
    pub period: MetricsPeriod,
    pub login_count: i32,
    pub content_views: i32,
    pub messages_sent: i32,
    pub downloads: i32,
    pub session_duration_secs: i32,
    pub feature_usage: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Succeeded,
    Failed,
    Pending,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    pub id: Uuid,
    pub member_id: Uuid,
    pub amount_cents: i64,
    pub currency: String,
    pub status: PaymentStatus,
    pub processed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

/// The six signals combined into a churn score, in declared order.
///
/// Declared order matters: it breaks ties when picking the top factor and
/// when ranking recommendations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskFactor {
    LoginFrequency,
    EngagementDrop,
    PaymentIssues,
    ContentConsumption,
    SessionDuration,
    MessageActivity,
}

impl RiskFactor {
    pub const ALL: [RiskFactor; 6] = [
        RiskFactor::LoginFrequency,
        RiskFactor::EngagementDrop,
        RiskFactor::PaymentIssues,
        RiskFactor::ContentConsumption,
        RiskFactor::SessionDuration,
        RiskFactor::MessageActivity,
    ];
}

/// Per-factor scores, each in 0..=100. Serializes as a map keyed by factor name.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FactorScores {
    pub login_frequency: u8,
    pub engagement_drop: u8,
    pub payment_issues: u8,
    pub content_consumption: u8,
    pub session_duration: u8,
    pub message_activity: u8,
}

impl FactorScores {
    pub fn get(&self, factor: RiskFactor) -> u8 {
        match factor {
            RiskFactor::LoginFrequency => self.login_frequency,
            RiskFactor::EngagementDrop => self.engagement_drop,
            RiskFactor::PaymentIssues => self.payment_issues,
            RiskFactor::ContentConsumption => self.content_consumption,
            RiskFactor::SessionDuration => self.session_duration,
            RiskFactor::MessageActivity => self.message_activity,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (RiskFactor, u8)> + '_ {
        RiskFactor::ALL
            .into_iter()
            .map(move |factor| (factor, self.get(factor)))
    }

    /// Highest-scoring factor; the first declared factor wins ties.
    pub fn top(&self) -> RiskFactor {
        let mut best = RiskFactor::LoginFrequency;
        for (factor, score) in self.iter() {
            if score > self.get(best) {
                best = factor;
            }
        }
        best
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChurnPrediction {
    pub member_id: Uuid,
    pub churn_score: u8,
    pub confidence: u8,
    pub risk_level: RiskLevel,
    pub factors: FactorScores,
    pub top_risk_factor: RiskFactor,
    pub predicted_churn_date: Option<DateTime<Utc>>,
    pub recommendations: Vec<String>,
    pub calculated_at: DateTime<Utc>,
}

/// A stored prediction joined with the member it belongs to.
#[derive(Debug, Clone)]
pub struct ScoredMember {
    pub email: String,
    pub tier: Option<String>,
    pub prediction: ChurnPrediction,
}

macro_rules! text_enum {
    ($ty:ident, $err:ident, { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $ty {
            pub fn as_str(self) -> &'static str {
                match self {
                    $($ty::$variant => $text),+
                }
            }
        }

        impl FromStr for $ty {
            type Err = Error;

            fn from_str(value: &str) -> Result<Self, Self::Err> {
                match value.trim().to_ascii_lowercase().as_str() {
                    $($text => Ok($ty::$variant),)+
                    _ => Err(Error::$err(value.to_string())),
                }
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

text_enum!(MemberStatus, UnknownMemberStatus, {
    Active => "active",
    Paused => "paused",
    Cancelled => "cancelled",
    Expired => "expired",
});

text_enum!(ActivityKind, UnknownActivityKind, {
    Login => "login",
    ContentView => "content_view",
    Message => "message",
    Download => "download",
});

text_enum!(MetricsPeriod, UnknownPeriod, {
    Daily => "daily",
    Weekly => "weekly",
    Monthly => "monthly",
});

text_enum!(PaymentStatus, UnknownPaymentStatus, {
    Succeeded => "succeeded",
    Failed => "failed",
    Pending => "pending",
});

text_enum!(RiskLevel, UnknownRiskLevel, {
    Low => "low",
    Medium => "medium",
    High => "high",
    Critical => "critical",
});

text_enum!(RiskFactor, UnknownRiskFactor, {
    LoginFrequency => "login_frequency",
    EngagementDrop => "engagement_drop",
    PaymentIssues => "payment_issues",
    ContentConsumption => "content_consumption",
    SessionDuration => "session_duration",
    MessageActivity => "message_activity",
});
