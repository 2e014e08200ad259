//! Churn risk scoring for members of a creator membership platform.
//!
//! [`risk::estimate`] is the entry point: it turns one member's activity,
//! engagement metrics and payment history into a [`models::ChurnPrediction`].
//! The remaining modules load those inputs from Postgres and report on the
//! stored predictions.

pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod recommend;
pub mod report;
pub mod risk;
pub mod thresholds;
