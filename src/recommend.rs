use crate::models::{FactorScores, RiskFactor};
use crate::thresholds::RecommendationSettings;

/// Retention actions for each factor, most important first.
pub fn actions_for(factor: RiskFactor) -> [&'static str; 2] {
    match factor {
        RiskFactor::LoginFrequency => [
            "Send a personalized re-engagement email highlighting what they've missed",
            "Offer exclusive early-access content to bring them back",
        ],
        RiskFactor::EngagementDrop => [
            "Reach out with a personal check-in message to understand the drop in engagement",
            "Recommend content similar to what they engaged with most in the past",
        ],
        RiskFactor::PaymentIssues => [
            "Contact the member to update their payment method",
            "Offer an alternative billing option such as annual or quarterly plans",
        ],
        RiskFactor::ContentConsumption => [
            "Share a curated digest of your most popular recent content",
            "Create a getting-started guide that points to your best content",
        ],
        RiskFactor::SessionDuration => [
            "Publish shorter, more focused content that fits into brief visits",
            "Add interactive content such as polls or Q&As to deepen sessions",
        ],
        RiskFactor::MessageActivity => [
            "Invite them to join a community discussion or live event",
            "Send a direct message asking for feedback on what they'd like to see",
        ],
    }
}

/// Ranks factors by score and returns the actions for the actionable leaders.
///
/// Factors are ranked descending (ties keep declared order), capped at
/// `max_factors`, and any factor below `min_score` is skipped.
pub fn recommend(factors: &FactorScores, settings: &RecommendationSettings) -> Vec<String> {
    let mut ranked: Vec<(RiskFactor, u8)> = factors.iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1));

    ranked
        .into_iter()
        .take(settings.max_factors)
        .filter(|&(_, score)| score >= settings.min_score)
        .flat_map(|(factor, _)| actions_for(factor))
        .map(str::to_string)
        .collect()
}
