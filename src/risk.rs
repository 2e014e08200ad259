use chrono::{DateTime, Duration, Utc};

use crate::models::{
    Activity, ActivityKind, ChurnPrediction, EngagementMetrics, FactorScores, Member, Payment,
    PaymentStatus, RiskLevel,
};
use crate::recommend;
use crate::thresholds::{
    ChurnDateSettings, ConfidenceThresholds, ContentThresholds, EngagementThresholds,
    FactorWeights, LoginThresholds, MessageThresholds, PaymentThresholds, RiskLevelThresholds,
    ScoringConfig, SessionThresholds,
};

/// Absorbs float error in `horizon - score * slope` before flooring.
const DAYS_EPSILON: f64 = 1e-9;

/// Everything the estimator looks at for one member.
///
/// Window selection is up to the caller: `recent_metrics` is normally the
/// last two weeks and `historical_metrics` the 30 to 60 days before that.
#[derive(Debug, Clone, Copy)]
pub struct ChurnInput<'a> {
    pub member: &'a Member,
    pub activities: &'a [Activity],
    pub recent_metrics: &'a [EngagementMetrics],
    pub historical_metrics: &'a [EngagementMetrics],
    /// Most recent first.
    pub payments: &'a [Payment],
}

pub fn estimate(
    input: &ChurnInput<'_>,
    config: &ScoringConfig,
    now: DateTime<Utc>,
) -> ChurnPrediction {
    let factors = FactorScores {
        login_frequency: login_frequency_risk(input.member, input.activities, &config.login, now),
        engagement_drop: engagement_drop_risk(
            input.recent_metrics,
            input.historical_metrics,
            &config.engagement,
        ),
        payment_issues: payment_issues_risk(input.payments, &config.payment),
        content_consumption: content_consumption_risk(input.activities, &config.content, now),
        session_duration: session_duration_risk(input.recent_metrics, &config.session),
        message_activity: message_activity_risk(input.activities, &config.message, now),
    };

    let churn_score = overall_score(&factors, &config.weights);

    ChurnPrediction {
        member_id: input.member.id,
        churn_score,
        confidence: confidence_level(input, &config.confidence, now),
        risk_level: risk_level(churn_score, &config.risk_levels),
        top_risk_factor: factors.top(),
        predicted_churn_date: predict_churn_date(churn_score, &config.churn_date, now),
        recommendations: recommend::recommend(&factors, &config.recommendations),
        factors,
        calculated_at: now,
    }
}

pub fn login_frequency_risk(
    member: &Member,
    activities: &[Activity],
    thresholds: &LoginThresholds,
    now: DateTime<Utc>,
) -> u8 {
    let short = count_since(
        activities,
        ActivityKind::Login,
        now - Duration::days(thresholds.short_window_days),
    );
    let long = count_since(
        activities,
        ActivityKind::Login,
        now - Duration::days(thresholds.long_window_days),
    );
    let days_since_seen = member
        .last_seen_at
        .map_or(thresholds.never_seen_days, |seen| (now - seen).num_days());

    clamp_score(
        thresholds.short_window_logins.below(short as f64)
            + thresholds.long_window_logins.below(long as f64)
            + thresholds.days_since_seen.above(days_since_seen as f64),
    )
}

/// Compares recent engagement against the historical baseline.
///
/// Returns 0 when the baseline has too few rows or the recent window is
/// empty. A metric whose baseline mean is zero contributes nothing.
pub fn engagement_drop_risk(
    recent: &[EngagementMetrics],
    historical: &[EngagementMetrics],
    thresholds: &EngagementThresholds,
) -> u8 {
    if historical.len() < thresholds.min_baseline_samples || recent.is_empty() {
        return 0;
    }

    let drop_pct = |metric: fn(&EngagementMetrics) -> i32| {
        percent_drop(
            mean(recent, metric),
            mean(historical, metric),
            thresholds.baseline_epsilon,
        )
    };

    let content = drop_pct(|m| m.content_views)
        .map_or(0, |pct| thresholds.content_view_drop.above(pct));
    let messages = drop_pct(|m| m.messages_sent)
        .map_or(0, |pct| thresholds.message_drop.above(pct));
    let session = drop_pct(|m| m.session_duration_secs)
        .map_or(0, |pct| thresholds.session_drop.above(pct));

    clamp_score(content + messages + session)
}

pub fn payment_issues_risk(payments: &[Payment], thresholds: &PaymentThresholds) -> u8 {
    let Some(latest) = payments.first() else {
        return clamp_score(thresholds.no_history_score);
    };

    let considered = &payments[..payments.len().min(thresholds.considered_payments.max(1))];
    let failed = considered
        .iter()
        .filter(|payment| payment.status == PaymentStatus::Failed)
        .count();
    let failure_rate = failed as f64 / considered.len() as f64 * 100.0;

    let mut points = thresholds.failure_rate.above(failure_rate);
    if latest.status == PaymentStatus::Failed {
        points += thresholds.latest_failed_penalty;
    }

    clamp_score(points)
}

pub fn content_consumption_risk(
    activities: &[Activity],
    thresholds: &ContentThresholds,
    now: DateTime<Utc>,
) -> u8 {
    let cutoff = now - Duration::days(thresholds.window_days);
    let views = count_since(activities, ActivityKind::ContentView, cutoff);
    let downloads = count_since(activities, ActivityKind::Download, cutoff);

    if views == 0 && downloads == 0 {
        return clamp_score(thresholds.no_consumption_score);
    }

    clamp_score(thresholds.content_views.below(views as f64))
}

pub fn session_duration_risk(recent: &[EngagementMetrics], thresholds: &SessionThresholds) -> u8 {
    if recent.is_empty() {
        return clamp_score(thresholds.no_metrics_score);
    }

    let average = mean(recent, |m| m.session_duration_secs);
    clamp_score(thresholds.average_secs.below(average))
}

pub fn message_activity_risk(
    activities: &[Activity],
    thresholds: &MessageThresholds,
    now: DateTime<Utc>,
) -> u8 {
    let messages = count_since(
        activities,
        ActivityKind::Message,
        now - Duration::days(thresholds.window_days),
    );
    clamp_score(thresholds.messages.below(messages as f64))
}

/// How much data backs the score: tenure plus the volume of each input.
pub fn confidence_level(
    input: &ChurnInput<'_>,
    thresholds: &ConfidenceThresholds,
    now: DateTime<Utc>,
) -> u8 {
    let tenure_days = (now - input.member.joined_at).num_days();
    let metrics_rows = input.recent_metrics.len() + input.historical_metrics.len();

    clamp_score(
        thresholds.base
            + thresholds.tenure_days.above(tenure_days as f64)
            + thresholds.activities.above(input.activities.len() as f64)
            + thresholds.metrics_rows.above(metrics_rows as f64)
            + thresholds.payments.above(input.payments.len() as f64),
    )
}

/// Days until the member is expected to churn, or `None` below the cutoff.
pub fn days_until_churn(score: u8, settings: &ChurnDateSettings) -> Option<i64> {
    if score < settings.min_score {
        return None;
    }

    let raw = settings.horizon_days - f64::from(score) * settings.days_per_point;
    let days = (raw + DAYS_EPSILON).floor() as i64;
    Some(days.max(settings.min_days))
}

pub fn predict_churn_date(
    score: u8,
    settings: &ChurnDateSettings,
    now: DateTime<Utc>,
) -> Option<DateTime<Utc>> {
    days_until_churn(score, settings).map(|days| now + Duration::days(days))
}

/// Weighted sum of the factor scores, rounded half away from zero.
pub fn overall_score(factors: &FactorScores, weights: &FactorWeights) -> u8 {
    let total: f64 = factors
        .iter()
        .map(|(factor, score)| f64::from(score) * weights.get(factor))
        .sum();
    total.round().clamp(0.0, 100.0) as u8
}

pub fn risk_level(score: u8, thresholds: &RiskLevelThresholds) -> RiskLevel {
    if score >= thresholds.critical {
        RiskLevel::Critical
    } else if score >= thresholds.high {
        RiskLevel::High
    } else if score >= thresholds.medium {
        RiskLevel::Medium
    } else {
        RiskLevel::Low
    }
}

fn count_since(activities: &[Activity], kind: ActivityKind, cutoff: DateTime<Utc>) -> usize {
    activities
        .iter()
        .filter(|activity| activity.kind == kind && activity.created_at >= cutoff)
        .count()
}

fn mean(metrics: &[EngagementMetrics], value: fn(&EngagementMetrics) -> i32) -> f64 {
    if metrics.is_empty() {
        return 0.0;
    }
    metrics.iter().map(|m| f64::from(value(m))).sum::<f64>() / metrics.len() as f64
}

/// Percentage fall from `baseline` to `recent`; `None` when the baseline is
/// too small to compare against.
fn percent_drop(recent: f64, baseline: f64, epsilon: f64) -> Option<f64> {
    if baseline <= epsilon {
        return None;
    }
    Some((baseline - recent) / baseline * 100.0)
}

fn clamp_score(points: u32) -> u8 {
    points.min(100) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use uuid::Uuid;

    use crate::models::{MemberStatus, MetricsPeriod, RiskFactor};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
    }

    fn member(joined_days_ago: i64, last_seen_days_ago: Option<i64>) -> Member {
        Member {
            id: Uuid::from_u128(0x5eed),
            email: "avery@example.com".to_string(),
            joined_at: now() - Duration::days(joined_days_ago),
            last_seen_at: last_seen_days_ago.map(|days| now() - Duration::days(days)),
            status: MemberStatus::Active,
            tier: Some("supporter".to_string()),
        }
    }

    fn activity(kind: ActivityKind, days_ago: i64) -> Activity {
        Activity {
            id: Uuid::new_v4(),
            member_id: Uuid::from_u128(0x5eed),
            kind,
            created_at: now() - Duration::days(days_ago) - Duration::hours(1),
            metadata: None,
        }
    }

    fn activities(kind: ActivityKind, days_ago: &[i64]) -> Vec<Activity> {
        days_ago.iter().map(|&days| activity(kind, days)).collect()
    }

    fn metrics(content_views: i32, messages_sent: i32, session_secs: i32) -> EngagementMetrics {
        EngagementMetrics {
            member_id: Uuid::from_u128(0x5eed),
            date: now().date_naive(),
            period: MetricsPeriod::Daily,
            login_count: 1,
            content_views,
            messages_sent,
            downloads: 0,
            session_duration_secs: session_secs,
            feature_usage: None,
        }
    }

    fn payment(status: PaymentStatus, days_ago: i64) -> Payment {
        Payment {
            id: Uuid::new_v4(),
            member_id: Uuid::from_u128(0x5eed),
            amount_cents: 500,
            currency: "USD".to_string(),
            status,
            processed_at: now() - Duration::days(days_ago),
        }
    }

    fn payments(statuses: &[PaymentStatus]) -> Vec<Payment> {
        statuses
            .iter()
            .enumerate()
            .map(|(i, &status)| payment(status, 30 * i as i64))
            .collect()
    }

    fn uniform(score: u8) -> FactorScores {
        FactorScores {
            login_frequency: score,
            engagement_drop: score,
            payment_issues: score,
            content_consumption: score,
            session_duration: score,
            message_activity: score,
        }
    }

    #[test]
    fn never_seen_member_without_logins_is_maximal_login_risk() {
        let t = LoginThresholds::default();
        assert_eq!(login_frequency_risk(&member(90, None), &[], &t, now()), 100);
    }

    #[test]
    fn login_risk_adds_tiers() {
        let t = LoginThresholds::default();

        let regular = activities(ActivityKind::Login, &[0, 1, 3, 9, 12, 15, 20, 25]);
        assert_eq!(login_frequency_risk(&member(90, Some(0)), &regular, &t, now()), 0);

        let fading = activities(ActivityKind::Login, &[2, 10, 15, 20, 25]);
        assert_eq!(login_frequency_risk(&member(90, Some(10)), &fading, &t, now()), 50);

        let old = activities(ActivityKind::Login, &[40, 45]);
        assert_eq!(login_frequency_risk(&member(90, Some(40)), &old, &t, now()), 100);
    }

    #[test]
    fn days_since_seen_boundaries() {
        let t = LoginThresholds::default();
        let steady = activities(ActivityKind::Login, &[0, 1, 3, 9, 12, 15, 20, 25]);
        let score = |days| login_frequency_risk(&member(90, Some(days)), &steady, &t, now());
        assert_eq!(score(7), 0);
        assert_eq!(score(8), 15);
        assert_eq!(score(14), 15);
        assert_eq!(score(15), 30);
    }

    #[test]
    fn login_risk_ignores_other_activity() {
        let t = LoginThresholds::default();
        let views = activities(ActivityKind::ContentView, &[0, 0, 1, 1, 2, 2, 3, 3]);
        assert_eq!(login_frequency_risk(&member(90, Some(0)), &views, &t, now()), 70);
    }

    #[test]
    fn engagement_drop_needs_a_baseline() {
        let t = EngagementThresholds::default();
        let recent = vec![metrics(0, 0, 0)];
        let history = vec![metrics(10, 10, 600); 3];
        assert_eq!(engagement_drop_risk(&recent, &history, &t), 0);
        assert_eq!(engagement_drop_risk(&[], &vec![metrics(10, 10, 600); 8], &t), 0);
    }

    #[test]
    fn engagement_drop_scores_each_metric() {
        let t = EngagementThresholds::default();
        let history = vec![metrics(10, 10, 600); 4];

        // 60% content drop, 50% message drop, 25% session drop.
        let recent = vec![metrics(4, 5, 450)];
        assert_eq!(engagement_drop_risk(&recent, &history, &t), 35 + 15 + 10);

        let collapsed = vec![metrics(0, 0, 0); 2];
        assert_eq!(engagement_drop_risk(&collapsed, &history, &t), 100);

        let growing = vec![metrics(20, 20, 1200)];
        assert_eq!(engagement_drop_risk(&growing, &history, &t), 0);
    }

    #[test]
    fn zero_baseline_contributes_no_drop() {
        let t = EngagementThresholds::default();
        let history = vec![metrics(0, 0, 600); 5];
        let recent = vec![metrics(0, 0, 0)];
        assert_eq!(engagement_drop_risk(&recent, &history, &t), 35);

        let silent_history = vec![metrics(0, 0, 0); 5];
        assert_eq!(engagement_drop_risk(&recent, &silent_history, &t), 0);
    }

    #[test]
    fn payment_risk_defaults_without_history() {
        assert_eq!(payment_issues_risk(&[], &PaymentThresholds::default()), 50);
    }

    #[test]
    fn payment_risk_tracks_failures() {
        use PaymentStatus::{Failed, Pending, Succeeded};
        let t = PaymentThresholds::default();

        assert_eq!(payment_issues_risk(&payments(&[Succeeded; 6]), &t), 0);
        assert_eq!(
            payment_issues_risk(&payments(&[Succeeded, Succeeded, Failed, Succeeded]), &t),
            30
        );
        assert_eq!(
            payment_issues_risk(&payments(&[Failed, Succeeded, Succeeded, Succeeded, Succeeded, Succeeded]), &t),
            50
        );
        assert_eq!(
            payment_issues_risk(&payments(&[Failed, Failed, Failed, Failed, Succeeded, Pending]), &t),
            100
        );
        assert_eq!(payment_issues_risk(&payments(&[Failed]), &t), 100);
    }

    #[test]
    fn payment_risk_only_considers_recent_payments() {
        use PaymentStatus::{Failed, Succeeded};
        let t = PaymentThresholds::default();
        let history = payments(&[
            Succeeded, Succeeded, Succeeded, Succeeded, Succeeded, Succeeded, Failed, Failed, Failed,
        ]);
        assert_eq!(payment_issues_risk(&history, &t), 0);
    }

    #[test]
    fn content_risk_tiers() {
        let t = ContentThresholds::default();
        assert_eq!(content_consumption_risk(&[], &t, now()), 90);

        let single = activities(ActivityKind::ContentView, &[1]);
        assert_eq!(content_consumption_risk(&single, &t, now()), 60);

        let downloads_only = activities(ActivityKind::Download, &[1, 2, 3]);
        assert_eq!(content_consumption_risk(&downloads_only, &t, now()), 60);

        let some = activities(ActivityKind::ContentView, &[0, 1, 2, 3]);
        assert_eq!(content_consumption_risk(&some, &t, now()), 30);

        let plenty = activities(ActivityKind::ContentView, &[0, 1, 2, 3, 4]);
        assert_eq!(content_consumption_risk(&plenty, &t, now()), 0);

        let stale = activities(ActivityKind::ContentView, &[8, 9, 10, 11, 12]);
        assert_eq!(content_consumption_risk(&stale, &t, now()), 90);
    }

    #[test]
    fn session_risk_tiers() {
        let t = SessionThresholds::default();
        assert_eq!(session_duration_risk(&[], &t), 50);
        assert_eq!(session_duration_risk(&[metrics(0, 0, 59)], &t), 80);
        assert_eq!(session_duration_risk(&[metrics(0, 0, 60), metrics(0, 0, 180)], &t), 60);
        assert_eq!(session_duration_risk(&[metrics(0, 0, 299)], &t), 40);
        assert_eq!(session_duration_risk(&[metrics(0, 0, 599)], &t), 20);
        assert_eq!(session_duration_risk(&[metrics(0, 0, 600)], &t), 0);
    }

    #[test]
    fn message_risk_tiers() {
        let t = MessageThresholds::default();
        assert_eq!(message_activity_risk(&[], &t, now()), 70);

        let count = |n: usize| {
            let days: Vec<i64> = (0..n as i64).collect();
            message_activity_risk(&activities(ActivityKind::Message, &days), &t, now())
        };
        assert_eq!(count(2), 40);
        assert_eq!(count(6), 20);
        assert_eq!(count(7), 0);

        let old = activities(ActivityKind::Message, &[20, 21, 22, 23, 24, 25, 26]);
        assert_eq!(message_activity_risk(&old, &t, now()), 70);
    }

    #[test]
    fn confidence_grows_with_data() {
        let t = ConfidenceThresholds::default();
        let newcomer = member(5, Some(1));
        let input = ChurnInput {
            member: &newcomer,
            activities: &[],
            recent_metrics: &[],
            historical_metrics: &[],
            payments: &[],
        };
        assert_eq!(confidence_level(&input, &t, now()), 50);

        let veteran = member(90, Some(0));
        let log = activities(ActivityKind::Login, &[1; 120]);
        let recent = vec![metrics(1, 1, 300); 14];
        let history = vec![metrics(1, 1, 300); 26];
        let paid = payments(&[PaymentStatus::Succeeded; 8]);
        let input = ChurnInput {
            member: &veteran,
            activities: &log,
            recent_metrics: &recent,
            historical_metrics: &history,
            payments: &paid,
        };
        assert_eq!(confidence_level(&input, &t, now()), 100);

        let midway = member(45, Some(0));
        let log = activities(ActivityKind::Login, &[1; 30]);
        let paid = payments(&[PaymentStatus::Succeeded; 4]);
        let input = ChurnInput {
            member: &midway,
            activities: &log,
            recent_metrics: &recent,
            historical_metrics: &[],
            payments: &paid,
        };
        assert_eq!(confidence_level(&input, &t, now()), 50 + 10 + 5 + 0 + 3);
    }

    #[test]
    fn churn_date_starts_at_forty() {
        let settings = ChurnDateSettings::default();
        assert_eq!(predict_churn_date(39, &settings, now()), None);
        assert_eq!(
            predict_churn_date(40, &settings, now()),
            Some(now() + Duration::days(72))
        );
        assert_eq!(days_until_churn(100, &settings), Some(1));
    }

    #[test]
    fn churn_date_never_moves_later_as_score_rises() {
        let settings = ChurnDateSettings::default();
        let mut previous = i64::MAX;
        for score in 40..=100u8 {
            let days = days_until_churn(score, &settings).unwrap();
            assert!(days <= previous, "score {score} predicted {days} days");
            assert!(days >= 1);
            previous = days;
        }
    }

    #[test]
    fn overall_score_is_weighted_sum() {
        let weights = FactorWeights::default();
        let login_only = FactorScores {
            login_frequency: 100,
            ..FactorScores::default()
        };
        assert_eq!(overall_score(&login_only, &weights), 25);

        let mixed = FactorScores {
            login_frequency: 40,
            engagement_drop: 0,
            payment_issues: 50,
            content_consumption: 60,
            session_duration: 80,
            message_activity: 20,
        };
        // 10 + 0 + 10 + 9 + 8 + 2
        assert_eq!(overall_score(&mixed, &weights), 39);
        assert_eq!(overall_score(&uniform(100), &weights), 100);
        assert_eq!(overall_score(&uniform(0), &weights), 0);
    }

    #[test]
    fn risk_level_boundaries() {
        let weights = FactorWeights::default();
        let thresholds = RiskLevelThresholds::default();
        let level = |score| risk_level(overall_score(&uniform(score), &weights), &thresholds);

        assert_eq!(level(39), RiskLevel::Low);
        assert_eq!(level(40), RiskLevel::Medium);
        assert_eq!(level(69), RiskLevel::Medium);
        assert_eq!(level(70), RiskLevel::High);
        assert_eq!(level(84), RiskLevel::High);
        assert_eq!(level(85), RiskLevel::Critical);
    }

    #[test]
    fn estimates_a_drifting_member() {
        let drifting = member(10, None);
        let log = activities(ActivityKind::ContentView, &[2]);
        let input = ChurnInput {
            member: &drifting,
            activities: &log,
            recent_metrics: &[],
            historical_metrics: &[],
            payments: &[],
        };

        let prediction = estimate(&input, &ScoringConfig::default(), now());
        assert_eq!(
            prediction.factors,
            FactorScores {
                login_frequency: 100,
                engagement_drop: 0,
                payment_issues: 50,
                content_consumption: 60,
                session_duration: 50,
                message_activity: 70,
            }
        );
        assert_eq!(prediction.churn_score, 56);
        assert_eq!(prediction.risk_level, RiskLevel::Medium);
        assert_eq!(prediction.confidence, 50);
        assert_eq!(prediction.top_risk_factor, RiskFactor::LoginFrequency);
        assert_eq!(prediction.predicted_churn_date, Some(now() + Duration::days(52)));
        assert_eq!(prediction.recommendations.len(), 6);
        assert_eq!(
            prediction.recommendations[0],
            recommend::actions_for(RiskFactor::LoginFrequency)[0]
        );
        assert_eq!(
            prediction.recommendations[2],
            recommend::actions_for(RiskFactor::MessageActivity)[0]
        );
        assert_eq!(
            prediction.recommendations[4],
            recommend::actions_for(RiskFactor::ContentConsumption)[0]
        );
        assert_eq!(prediction.calculated_at, now());
    }

    #[test]
    fn estimates_a_healthy_member() {
        let regular = member(90, Some(0));
        let days: Vec<i64> = (0..30).collect();
        let mut log = activities(ActivityKind::Login, &days);
        log.extend(activities(ActivityKind::ContentView, &[0, 1, 2, 3, 4, 5]));
        log.extend(activities(ActivityKind::Message, &[0, 1, 2, 4, 6, 8, 10, 12]));
        let recent = vec![metrics(5, 3, 900); 14];
        let history = vec![metrics(5, 3, 900); 30];
        let paid = payments(&[PaymentStatus::Succeeded; 8]);

        let input = ChurnInput {
            member: &regular,
            activities: &log,
            recent_metrics: &recent,
            historical_metrics: &history,
            payments: &paid,
        };

        let prediction = estimate(&input, &ScoringConfig::default(), now());
        assert_eq!(prediction.factors, FactorScores::default());
        assert_eq!(prediction.churn_score, 0);
        assert_eq!(prediction.risk_level, RiskLevel::Low);
        assert_eq!(prediction.top_risk_factor, RiskFactor::LoginFrequency);
        assert_eq!(prediction.predicted_churn_date, None);
        assert!(prediction.recommendations.is_empty());
        assert_eq!(prediction.confidence, 50 + 20 + 5 + 10 + 5);
    }

    #[test]
    fn worst_case_member_stays_in_range() {
        use PaymentStatus::Failed;
        let lapsed = member(400, Some(60));
        let history = vec![metrics(20, 20, 1800); 10];
        let recent = vec![metrics(0, 0, 30); 3];
        let failed = payments(&[Failed; 6]);
        let input = ChurnInput {
            member: &lapsed,
            activities: &[],
            recent_metrics: &recent,
            historical_metrics: &history,
            payments: &failed,
        };

        let prediction = estimate(&input, &ScoringConfig::default(), now());
        assert!(prediction.factors.iter().all(|(_, score)| score <= 100));
        assert_eq!(prediction.factors.payment_issues, 100);
        assert_eq!(prediction.factors.engagement_drop, 100);
        assert!(prediction.churn_score <= 100);
        assert_eq!(prediction.risk_level, RiskLevel::Critical);
        assert_eq!(prediction.recommendations.len(), 6);
    }

    #[test]
    fn estimate_is_repeatable_for_a_fixed_time() {
        let drifting = member(40, Some(9));
        let log = activities(ActivityKind::Login, &[3, 12]);
        let paid = payments(&[PaymentStatus::Failed, PaymentStatus::Succeeded]);
        let input = ChurnInput {
            member: &drifting,
            activities: &log,
            recent_metrics: &[],
            historical_metrics: &[],
            payments: &paid,
        };
        let config = ScoringConfig::default();

        let first = serde_json::to_string(&estimate(&input, &config, now())).unwrap();
        let second = serde_json::to_string(&estimate(&input, &config, now())).unwrap();
        assert_eq!(first, second);
    }
}
