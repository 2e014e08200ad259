use std::path::Path;

use anyhow::Context;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::models::{
    Activity, ActivityKind, ChurnPrediction, EngagementMetrics, Member, MemberStatus,
    MetricsPeriod, Payment, PaymentStatus, ScoredMember,
};

pub async fn init_db(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

/// Inserts or refreshes a member keyed by email, returning its id.
pub async fn upsert_member(
    pool: &PgPool,
    email: &str,
    joined_at: DateTime<Utc>,
    last_seen_at: Option<DateTime<Utc>>,
    status: MemberStatus,
    tier: Option<&str>,
) -> anyhow::Result<Uuid> {
    let id: Uuid = sqlx::query(
        r#"
        INSERT INTO membervault.members (id, email, joined_at, last_seen_at, status, tier)
        VALUES ($1, $2, $3, $4, $5, $6)
        ON CONFLICT (email) DO UPDATE
        SET joined_at = EXCLUDED.joined_at,
            last_seen_at = EXCLUDED.last_seen_at,
            status = EXCLUDED.status,
            tier = EXCLUDED.tier
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(email)
    .bind(joined_at)
    .bind(last_seen_at)
    .bind(status.as_str())
    .bind(tier)
    .fetch_one(pool)
    .await?
    .get("id");

    Ok(id)
}

/// Returns whether a new row was written.
pub async fn insert_activity(
    pool: &PgPool,
    member_id: Uuid,
    kind: ActivityKind,
    created_at: DateTime<Utc>,
    metadata: Option<&serde_json::Value>,
    source_key: &str,
) -> anyhow::Result<bool> {
    let result = sqlx::query(
        r#"
        INSERT INTO membervault.activities
        (id, member_id, kind, created_at, metadata, source_key)
        VALUES ($1, $2, $3, $4, $5, $6)
        ON CONFLICT (source_key) DO NOTHING
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(member_id)
    .bind(kind.as_str())
    .bind(created_at)
    .bind(metadata)
    .bind(source_key)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn upsert_metrics(pool: &PgPool, metrics: &EngagementMetrics) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        INSERT INTO membervault.engagement_metrics
        (member_id, date, period, login_count, content_views, messages_sent,
         downloads, session_duration_secs, feature_usage)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        ON CONFLICT (member_id, date, period) DO UPDATE
        SET login_count = EXCLUDED.login_count,
            content_views = EXCLUDED.content_views,
            messages_sent = EXCLUDED.messages_sent,
            downloads = EXCLUDED.downloads,
            session_duration_secs = EXCLUDED.session_duration_secs,
            feature_usage = EXCLUDED.feature_usage
        "#,
    )
    .bind(metrics.member_id)
    .bind(metrics.date)
    .bind(metrics.period.as_str())
    .bind(metrics.login_count)
    .bind(metrics.content_views)
    .bind(metrics.messages_sent)
    .bind(metrics.downloads)
    .bind(metrics.session_duration_secs)
    .bind(metrics.feature_usage.as_ref())
    .execute(pool)
    .await?;

    Ok(())
}

/// Returns whether a new row was written.
pub async fn insert_payment(
    pool: &PgPool,
    member_id: Uuid,
    amount_cents: i64,
    currency: &str,
    status: PaymentStatus,
    processed_at: DateTime<Utc>,
    source_key: &str,
) -> anyhow::Result<bool> {
    let result = sqlx::query(
        r#"
        INSERT INTO membervault.payments
        (id, member_id, amount_cents, currency, status, processed_at, source_key)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        ON CONFLICT (source_key) DO NOTHING
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(member_id)
    .bind(amount_cents)
    .bind(currency)
    .bind(status.as_str())
    .bind(processed_at)
    .bind(source_key)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

struct SeedMember {
    email: &'static str,
    tier: &'static str,
    joined_days_ago: i64,
    last_seen_days_ago: i64,
    login_days: Vec<i64>,
    view_days: Vec<i64>,
    message_days: Vec<i64>,
    /// (content views, messages, session seconds) for the recent and baseline windows.
    recent: (i32, i32, i32),
    baseline: (i32, i32, i32),
    payments: Vec<PaymentStatus>,
}

fn seed_members() -> Vec<SeedMember> {
    use PaymentStatus::{Failed, Pending, Succeeded};

    vec![
        SeedMember {
            email: "avery.lee@example.com",
            tier: "inner-circle",
            joined_days_ago: 180,
            last_seen_days_ago: 0,
            login_days: (0..30).collect(),
            view_days: vec![0, 1, 2, 3, 5, 6],
            message_days: vec![0, 1, 3, 5, 7, 9, 11, 13],
            recent: (6, 3, 840),
            baseline: (6, 3, 900),
            payments: vec![Succeeded; 6],
        },
        SeedMember {
            email: "jules.moreno@example.com",
            tier: "supporter",
            joined_days_ago: 75,
            last_seen_days_ago: 12,
            login_days: vec![12, 20, 26],
            view_days: vec![12],
            message_days: vec![],
            recent: (1, 0, 90),
            baseline: (5, 2, 600),
            payments: vec![Failed, Succeeded, Succeeded],
        },
        SeedMember {
            email: "kiara.patel@example.com",
            tier: "supporter",
            joined_days_ago: 20,
            last_seen_days_ago: 2,
            login_days: vec![2, 9, 15],
            view_days: vec![2, 3],
            message_days: vec![9],
            recent: (2, 1, 240),
            baseline: (0, 0, 0),
            payments: vec![Pending],
        },
    ]
}

pub async fn seed(pool: &PgPool) -> anyhow::Result<()> {
    let now = Utc::now();
    let today = now.date_naive();

    for member in seed_members() {
        let member_id = upsert_member(
            pool,
            member.email,
            now - Duration::days(member.joined_days_ago),
            Some(now - Duration::days(member.last_seen_days_ago)),
            MemberStatus::Active,
            Some(member.tier),
        )
        .await?;

        let kinds = [
            (ActivityKind::Login, &member.login_days),
            (ActivityKind::ContentView, &member.view_days),
            (ActivityKind::Message, &member.message_days),
        ];
        for (kind, days) in kinds {
            for &days_ago in days {
                let created_at = now - Duration::days(days_ago);
                let source_key =
                    format!("seed-{}-{}-{}", member.email, kind, created_at.date_naive());
                insert_activity(pool, member_id, kind, created_at, None, &source_key).await?;
            }
        }

        let windows = [(0..14, member.recent), (30..60, member.baseline)];
        for (days, (content_views, messages_sent, session_secs)) in windows {
            if member.joined_days_ago < days.end {
                continue;
            }
            for days_ago in days {
                upsert_metrics(
                    pool,
                    &EngagementMetrics {
                        member_id,
                        date: today - Duration::days(days_ago),
                        period: MetricsPeriod::Daily,
                        login_count: 1,
                        content_views,
                        messages_sent,
                        downloads: 0,
                        session_duration_secs: session_secs,
                        feature_usage: None,
                    },
                )
                .await?;
            }
        }

        for (index, status) in member.payments.iter().enumerate() {
            let processed_at = now - Duration::days(30 * index as i64 + 1);
            let source_key = format!("seed-{}-payment-{index}", member.email);
            insert_payment(pool, member_id, 800, "USD", *status, processed_at, &source_key)
                .await?;
        }

        tracing::debug!(email = member.email, "seeded member");
    }

    Ok(())
}

fn member_from_row(row: &PgRow) -> anyhow::Result<Member> {
    Ok(Member {
        id: row.get("id"),
        email: row.get("email"),
        joined_at: row.get("joined_at"),
        last_seen_at: row.get("last_seen_at"),
        status: row.get::<String, _>("status").parse()?,
        tier: row.get("tier"),
    })
}

pub async fn fetch_members(
    pool: &PgPool,
    email: Option<&str>,
    status: Option<MemberStatus>,
) -> anyhow::Result<Vec<Member>> {
    let mut query = String::from(
        "SELECT id, email, joined_at, last_seen_at, status, tier \
         FROM membervault.members",
    );

    if email.is_some() {
        query.push_str(" WHERE email = $1");
    } else if status.is_some() {
        query.push_str(" WHERE status = $1");
    }
    query.push_str(" ORDER BY joined_at");

    let mut rows = sqlx::query(&query);

    if let Some(value) = email {
        rows = rows.bind(value);
    } else if let Some(value) = status {
        rows = rows.bind(value.as_str());
    }

    let records = rows.fetch_all(pool).await?;
    records.iter().map(member_from_row).collect()
}

pub async fn member_id_by_email(pool: &PgPool, email: &str) -> anyhow::Result<Uuid> {
    let row = sqlx::query("SELECT id FROM membervault.members WHERE email = $1")
        .bind(email)
        .fetch_optional(pool)
        .await?
        .with_context(|| format!("no member with email {email}"))?;
    Ok(row.get("id"))
}

pub async fn fetch_activities(
    pool: &PgPool,
    member_id: Uuid,
    since: DateTime<Utc>,
) -> anyhow::Result<Vec<Activity>> {
    let rows = sqlx::query(
        "SELECT id, member_id, kind, created_at, metadata \
         FROM membervault.activities \
         WHERE member_id = $1 AND created_at >= $2 \
         ORDER BY created_at DESC",
    )
    .bind(member_id)
    .bind(since)
    .fetch_all(pool)
    .await?;

    let mut activities = Vec::with_capacity(rows.len());
    for row in rows {
        activities.push(Activity {
            id: row.get("id"),
            member_id: row.get("member_id"),
            kind: row.get::<String, _>("kind").parse()?,
            created_at: row.get("created_at"),
            metadata: row.get("metadata"),
        });
    }

    Ok(activities)
}

/// Daily metrics rows with `since <= date < until`.
pub async fn fetch_daily_metrics(
    pool: &PgPool,
    member_id: Uuid,
    since: NaiveDate,
    until: NaiveDate,
) -> anyhow::Result<Vec<EngagementMetrics>> {
    let rows = sqlx::query(
        "SELECT member_id, date, period, login_count, content_views, messages_sent, \
         downloads, session_duration_secs, feature_usage \
         FROM membervault.engagement_metrics \
         WHERE member_id = $1 AND period = 'daily' AND date >= $2 AND date < $3 \
         ORDER BY date DESC",
    )
    .bind(member_id)
    .bind(since)
    .bind(until)
    .fetch_all(pool)
    .await?;

    let mut metrics = Vec::with_capacity(rows.len());
    for row in rows {
        metrics.push(EngagementMetrics {
            member_id: row.get("member_id"),
            date: row.get("date"),
            period: row.get::<String, _>("period").parse()?,
            login_count: row.get("login_count"),
            content_views: row.get("content_views"),
            messages_sent: row.get("messages_sent"),
            downloads: row.get("downloads"),
            session_duration_secs: row.get("session_duration_secs"),
            feature_usage: row.get("feature_usage"),
        });
    }

    Ok(metrics)
}

/// All payments for a member, most recent first.
pub async fn fetch_payments(pool: &PgPool, member_id: Uuid) -> anyhow::Result<Vec<Payment>> {
    let rows = sqlx::query(
        "SELECT id, member_id, amount_cents, currency, status, processed_at \
         FROM membervault.payments \
         WHERE member_id = $1 \
         ORDER BY processed_at DESC",
    )
    .bind(member_id)
    .fetch_all(pool)
    .await?;

    let mut payments = Vec::with_capacity(rows.len());
    for row in rows {
        payments.push(Payment {
            id: row.get("id"),
            member_id: row.get("member_id"),
            amount_cents: row.get("amount_cents"),
            currency: row.get("currency"),
            status: row.get::<String, _>("status").parse()?,
            processed_at: row.get("processed_at"),
        });
    }

    Ok(payments)
}

pub async fn save_prediction(pool: &PgPool, prediction: &ChurnPrediction) -> anyhow::Result<Uuid> {
    let id = Uuid::new_v4();
    sqlx::query(
        r#"
        INSERT INTO membervault.churn_scores
        (id, member_id, churn_score, confidence, risk_level, factors, top_risk_factor,
         predicted_churn_date, recommendations, calculated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        "#,
    )
    .bind(id)
    .bind(prediction.member_id)
    .bind(i16::from(prediction.churn_score))
    .bind(i16::from(prediction.confidence))
    .bind(prediction.risk_level.as_str())
    .bind(serde_json::to_value(prediction.factors)?)
    .bind(prediction.top_risk_factor.as_str())
    .bind(prediction.predicted_churn_date)
    .bind(serde_json::to_value(&prediction.recommendations)?)
    .bind(prediction.calculated_at)
    .execute(pool)
    .await?;

    Ok(id)
}

fn scored_member_from_row(row: &PgRow) -> anyhow::Result<ScoredMember> {
    let churn_score: i16 = row.get("churn_score");
    let confidence: i16 = row.get("confidence");

    Ok(ScoredMember {
        email: row.get("email"),
        tier: row.get("tier"),
        prediction: ChurnPrediction {
            member_id: row.get("member_id"),
            churn_score: u8::try_from(churn_score).context("churn_score out of range")?,
            confidence: u8::try_from(confidence).context("confidence out of range")?,
            risk_level: row.get::<String, _>("risk_level").parse()?,
            factors: serde_json::from_value(row.get("factors"))?,
            top_risk_factor: row.get::<String, _>("top_risk_factor").parse()?,
            predicted_churn_date: row.get("predicted_churn_date"),
            recommendations: serde_json::from_value(row.get("recommendations"))?,
            calculated_at: row.get("calculated_at"),
        },
    })
}

/// Latest stored prediction per member, highest churn score first.
pub async fn fetch_latest_predictions(pool: &PgPool) -> anyhow::Result<Vec<ScoredMember>> {
    let rows = sqlx::query(
        "SELECT * FROM ( \
            SELECT DISTINCT ON (cs.member_id) \
                cs.member_id, m.email, m.tier, cs.churn_score, cs.confidence, cs.risk_level, \
                cs.factors, cs.top_risk_factor, cs.predicted_churn_date, cs.recommendations, \
                cs.calculated_at \
            FROM membervault.churn_scores cs \
            JOIN membervault.members m ON m.id = cs.member_id \
            ORDER BY cs.member_id, cs.calculated_at DESC \
         ) latest \
         ORDER BY churn_score DESC, email",
    )
    .fetch_all(pool)
    .await?;

    rows.iter().map(scored_member_from_row).collect()
}

pub async fn import_members(pool: &PgPool, csv_path: &Path) -> anyhow::Result<usize> {
    #[derive(serde::Deserialize)]
    struct CsvRow {
        email: String,
        joined_at: DateTime<Utc>,
        last_seen_at: Option<DateTime<Utc>>,
        status: MemberStatus,
        tier: Option<String>,
    }

    let mut reader = csv::Reader::from_path(csv_path)?;
    let mut imported = 0usize;

    for result in reader.deserialize::<CsvRow>() {
        let row = result?;
        upsert_member(
            pool,
            &row.email,
            row.joined_at,
            row.last_seen_at,
            row.status,
            row.tier.as_deref(),
        )
        .await?;
        imported += 1;
    }

    Ok(imported)
}

pub async fn import_activities(pool: &PgPool, csv_path: &Path) -> anyhow::Result<usize> {
    #[derive(serde::Deserialize)]
    struct CsvRow {
        email: String,
        kind: ActivityKind,
        created_at: DateTime<Utc>,
        metadata: Option<String>,
        source_key: Option<String>,
    }

    let mut reader = csv::Reader::from_path(csv_path)?;
    let mut inserted = 0usize;

    for result in reader.deserialize::<CsvRow>() {
        let row = result?;
        let member_id = member_id_by_email(pool, &row.email).await?;
        let metadata = row
            .metadata
            .as_deref()
            .map(serde_json::from_str::<serde_json::Value>)
            .transpose()
            .context("activity metadata must be JSON")?;
        let source_key = row
            .source_key
            .unwrap_or_else(|| format!("import-{}", Uuid::new_v4()));

        if insert_activity(
            pool,
            member_id,
            row.kind,
            row.created_at,
            metadata.as_ref(),
            &source_key,
        )
        .await?
        {
            inserted += 1;
        }
    }

    Ok(inserted)
}

pub async fn import_metrics(pool: &PgPool, csv_path: &Path) -> anyhow::Result<usize> {
    #[derive(serde::Deserialize)]
    struct CsvRow {
        email: String,
        date: NaiveDate,
        period: MetricsPeriod,
        login_count: i32,
        content_views: i32,
        messages_sent: i32,
        downloads: i32,
        session_duration_secs: i32,
    }

    let mut reader = csv::Reader::from_path(csv_path)?;
    let mut imported = 0usize;

    for result in reader.deserialize::<CsvRow>() {
        let row = result?;
        let member_id = member_id_by_email(pool, &row.email).await?;
        upsert_metrics(
            pool,
            &EngagementMetrics {
                member_id,
                date: row.date,
                period: row.period,
                login_count: row.login_count,
                content_views: row.content_views,
                messages_sent: row.messages_sent,
                downloads: row.downloads,
                session_duration_secs: row.session_duration_secs,
                feature_usage: None,
            },
        )
        .await?;
        imported += 1;
    }

    Ok(imported)
}

pub async fn import_payments(pool: &PgPool, csv_path: &Path) -> anyhow::Result<usize> {
    #[derive(serde::Deserialize)]
    struct CsvRow {
        email: String,
        amount_cents: i64,
        currency: String,
        status: PaymentStatus,
        processed_at: DateTime<Utc>,
        source_key: Option<String>,
    }

    let mut reader = csv::Reader::from_path(csv_path)?;
    let mut inserted = 0usize;

    for result in reader.deserialize::<CsvRow>() {
        let row = result?;
        let member_id = member_id_by_email(pool, &row.email).await?;
        let source_key = row
            .source_key
            .unwrap_or_else(|| format!("import-{}", Uuid::new_v4()));

        if insert_payment(
            pool,
            member_id,
            row.amount_cents,
            &row.currency,
            row.status,
            row.processed_at,
            &source_key,
        )
        .await?
        {
            inserted += 1;
        }
    }

    Ok(inserted)
}
