use std::path::PathBuf;

use anyhow::Context;
use chrono::Utc;
use clap::{ArgGroup, Parser, Subcommand, ValueEnum};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing_subscriber::EnvFilter;

use membervault_churn::config::AppConfig;
use membervault_churn::models::{ChurnPrediction, Member, MemberStatus, ScoredMember};
use membervault_churn::risk::{self, ChurnInput};
use membervault_churn::thresholds::ScoringConfig;
use membervault_churn::{db, report};

#[derive(Parser)]
#[command(name = "membervault-churn")]
#[command(about = "Churn risk scoring for MemberVault creators", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum ImportKind {
    Members,
    Activities,
    Metrics,
    Payments,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or upgrade the database schema
    InitDb,
    /// Load realistic seed data
    Seed,
    /// Import records from a CSV file
    Import {
        #[arg(long, value_enum)]
        kind: ImportKind,
        #[arg(long)]
        csv: PathBuf,
    },
    /// Score churn risk and store the predictions
    #[command(group(
        ArgGroup::new("scope")
            .args(["email", "status"])
            .multiple(false)
    ))]
    Score {
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        status: Option<MemberStatus>,
        #[arg(long, default_value_t = 10)]
        limit: usize,
        /// Print every prediction as a JSON line
        #[arg(long)]
        json: bool,
        /// JSON file overriding the default weights and thresholds
        #[arg(long)]
        scoring_config: Option<PathBuf>,
    },
    /// Generate a markdown report from the latest stored scores
    Report {
        #[arg(long, default_value = "churn-report.md")]
        out: PathBuf,
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
}

async fn score_member(
    pool: &PgPool,
    config: &AppConfig,
    scoring: &ScoringConfig,
    member: &Member,
) -> anyhow::Result<ChurnPrediction> {
    let now = Utc::now();
    let windows = config.windows(now);

    let activities = db::fetch_activities(pool, member.id, windows.activity_since).await?;
    let recent_metrics = db::fetch_daily_metrics(
        pool,
        member.id,
        windows.recent_since.date_naive(),
        (now + chrono::Duration::days(1)).date_naive(),
    )
    .await?;
    let historical_metrics = db::fetch_daily_metrics(
        pool,
        member.id,
        windows.baseline_since.date_naive(),
        windows.baseline_until.date_naive(),
    )
    .await?;
    let payments = db::fetch_payments(pool, member.id).await?;

    let input = ChurnInput {
        member,
        activities: &activities,
        recent_metrics: &recent_metrics,
        historical_metrics: &historical_metrics,
        payments: &payments,
    };
    let prediction = risk::estimate(&input, scoring, now);

    tracing::debug!(
        member = %member.email,
        activities = activities.len(),
        recent_metrics = recent_metrics.len(),
        historical_metrics = historical_metrics.len(),
        payments = payments.len(),
        score = prediction.churn_score,
        "scored member"
    );

    Ok(prediction)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = AppConfig::from_env()?;

    let pool = PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .connect(&config.database_url)
        .await
        .context("failed to connect to Postgres")?;

    match cli.command {
        Commands::InitDb => {
            db::init_db(&pool).await?;
            println!("Schema ready.");
        }
        Commands::Seed => {
            db::seed(&pool).await?;
            println!("Seed data inserted.");
        }
        Commands::Import { kind, csv } => {
            let inserted = match kind {
                ImportKind::Members => db::import_members(&pool, &csv).await?,
                ImportKind::Activities => db::import_activities(&pool, &csv).await?,
                ImportKind::Metrics => db::import_metrics(&pool, &csv).await?,
                ImportKind::Payments => db::import_payments(&pool, &csv).await?,
            };
            tracing::info!(rows = inserted, path = %csv.display(), "import finished");
            println!("Imported {inserted} rows from {}.", csv.display());
        }
        Commands::Score {
            email,
            status,
            limit,
            json,
            scoring_config,
        } => {
            let scoring = match scoring_config {
                Some(path) => ScoringConfig::from_path(&path)?,
                None => ScoringConfig::default(),
            };

            let members = db::fetch_members(&pool, email.as_deref(), status).await?;
            if members.is_empty() {
                println!("No members match this scope.");
                return Ok(());
            }
            tracing::info!(members = members.len(), "scoring members");

            let mut scored = Vec::with_capacity(members.len());
            for member in members {
                let prediction = score_member(&pool, &config, &scoring, &member).await?;
                db::save_prediction(&pool, &prediction).await?;
                scored.push(ScoredMember {
                    email: member.email,
                    tier: member.tier,
                    prediction,
                });
            }
            scored.sort_by(|a, b| b.prediction.churn_score.cmp(&a.prediction.churn_score));

            if json {
                for member in &scored {
                    println!("{}", serde_json::to_string(&member.prediction)?);
                }
                return Ok(());
            }

            println!("Top members by churn risk:");
            for member in scored.iter().take(limit) {
                let prediction = &member.prediction;
                println!(
                    "- {} score {} ({}, confidence {}) top factor {}",
                    member.email,
                    prediction.churn_score,
                    prediction.risk_level,
                    prediction.confidence,
                    prediction.top_risk_factor
                );
            }
        }
        Commands::Report { out, limit } => {
            let members = db::fetch_latest_predictions(&pool).await?;
            let report = report::build_report(Utc::now(), &members, limit);
            std::fs::write(&out, report)
                .with_context(|| format!("failed to write {}", out.display()))?;
            println!("Report written to {}.", out.display());
        }
    }

    Ok(())
}
