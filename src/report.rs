use std::collections::HashMap;
use std::fmt::Write;

use chrono::{DateTime, Utc};

use crate::models::{RiskFactor, RiskLevel, ScoredMember};

#[derive(Debug, Clone, PartialEq)]
pub struct LevelSummary {
    pub risk_level: RiskLevel,
    pub count: usize,
    pub avg_score: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FactorSummary {
    pub factor: RiskFactor,
    /// Members for whom this factor scored highest.
    pub leading_count: usize,
    pub avg_score: f64,
}

/// Member counts per risk level, most severe first. Empty levels are omitted.
pub fn summarize_by_level(members: &[ScoredMember]) -> Vec<LevelSummary> {
    let mut map: HashMap<RiskLevel, (usize, u32)> = HashMap::new();

    for member in members {
        let entry = map.entry(member.prediction.risk_level).or_insert((0, 0));
        entry.0 += 1;
        entry.1 += u32::from(member.prediction.churn_score);
    }

    let mut summaries: Vec<LevelSummary> = map
        .into_iter()
        .map(|(risk_level, (count, total))| LevelSummary {
            risk_level,
            count,
            avg_score: f64::from(total) / count as f64,
        })
        .collect();

    summaries.sort_by(|a, b| b.risk_level.cmp(&a.risk_level));
    summaries
}

/// Per-factor averages across members, ordered by how often each factor leads.
pub fn summarize_by_factor(members: &[ScoredMember]) -> Vec<FactorSummary> {
    if members.is_empty() {
        return Vec::new();
    }

    let mut summaries: Vec<FactorSummary> = RiskFactor::ALL
        .iter()
        .map(|&factor| {
            let total: u32 = members
                .iter()
                .map(|member| u32::from(member.prediction.factors.get(factor)))
                .sum();
            FactorSummary {
                factor,
                leading_count: members
                    .iter()
                    .filter(|member| member.prediction.top_risk_factor == factor)
                    .count(),
                avg_score: f64::from(total) / members.len() as f64,
            }
        })
        .collect();

    summaries.sort_by(|a, b| b.leading_count.cmp(&a.leading_count));
    summaries
}

pub fn build_report(
    generated_at: DateTime<Utc>,
    members: &[ScoredMember],
    limit: usize,
) -> String {
    let levels = summarize_by_level(members);
    let factors = summarize_by_factor(members);

    let mut output = String::new();

    let _ = writeln!(output, "# Member Churn Risk Report");
    let _ = writeln!(
        output,
        "Generated {} from the latest score of {} members",
        generated_at.format("%Y-%m-%d %H:%M UTC"),
        members.len()
    );
    let _ = writeln!(output);
    let _ = writeln!(output, "## Risk Mix");

    if levels.is_empty() {
        let _ = writeln!(output, "No members have been scored yet.");
    } else {
        for summary in levels.iter() {
            let _ = writeln!(
                output,
                "- {}: {} members (avg score {:.1})",
                summary.risk_level, summary.count, summary.avg_score
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Leading Risk Factors");

    if factors.is_empty() {
        let _ = writeln!(output, "No factor data available.");
    } else {
        for summary in factors.iter() {
            let _ = writeln!(
                output,
                "- {}: top factor for {} members (avg {:.1})",
                summary.factor, summary.leading_count, summary.avg_score
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Highest Risk Members");

    let at_risk: Vec<&ScoredMember> = members
        .iter()
        .filter(|member| member.prediction.risk_level != RiskLevel::Low)
        .take(limit)
        .collect();

    if at_risk.is_empty() {
        let _ = writeln!(output, "No members above low risk.");
    } else {
        for member in at_risk {
            let prediction = &member.prediction;
            let churn_date = prediction
                .predicted_churn_date
                .map_or_else(|| "n/a".to_string(), |date| date.date_naive().to_string());
            let _ = writeln!(
                output,
                "### {} ({})",
                member.email,
                member.tier.as_deref().unwrap_or("no tier")
            );
            let _ = writeln!(
                output,
                "Score {} ({}, confidence {}), top factor {}, predicted churn {}",
                prediction.churn_score,
                prediction.risk_level,
                prediction.confidence,
                prediction.top_risk_factor,
                churn_date
            );
            for action in &prediction.recommendations {
                let _ = writeln!(output, "- {action}");
            }
            let _ = writeln!(output);
        }
    }

    output
}
