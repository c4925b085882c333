use std::env;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::damage::{compute_damage, DamageResult, Target};
use crate::data::build::{CharacterBuild, SpAllocation};
use crate::data::catalog::Catalogs;
use crate::data::loader::{load_catalogs, LoadError, DEFAULT_CATALOG_DIR};
use crate::data::stat::StatBlock;
use crate::error::CalcError;
use crate::optimizer::{optimize, OptimizeOutcome, OptimizeRequest};
use crate::sp_tree::{resolve_sp_tree, SpTreeState};
use crate::stats::{compute_stats, CalculatedStats};

/// Environment variable naming the catalog directory.
pub const DATA_DIR_ENV: &str = "BUILDCALC_DATA";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Invalid request body: {0}")]
    Parse(#[source] serde_json::Error),

    #[error(transparent)]
    Calc(#[from] CalcError),

    #[error("catalogs unavailable: {0}")]
    Catalogs(#[from] LoadError),

    #[error("unable to encode response: {0}")]
    Encode(#[source] serde_json::Error),
}

impl ApiError {
    /// HTTP status for the error.
    pub fn status(&self) -> (u16, &'static str) {
        match self {
            Self::Parse(_) | Self::Calc(_) => (400, "Bad Request"),
            Self::Catalogs(_) | Self::Encode(_) => (500, "Internal Server Error"),
        }
    }
}

pub fn data_dir() -> PathBuf {
    env::var_os(DATA_DIR_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CATALOG_DIR))
}

/// Catalogs are re-read on every request so edits to the data files apply
/// without a restart.
pub fn request_catalogs() -> Result<Catalogs, ApiError> {
    Ok(load_catalogs(&data_dir())?)
}

#[derive(Debug, Clone, Deserialize)]
pub struct StatsRequest {
    pub build: CharacterBuild,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DamageRequest {
    pub build: CharacterBuild,
    #[serde(default)]
    pub skill: Option<String>,
    #[serde(default)]
    pub target: Target,
}

#[derive(Debug, Clone, Serialize)]
pub struct DamageResponse {
    pub final_stats: StatBlock,
    pub crit_rate: f64,
    pub damage: DamageResult,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SpTreeRequest {
    pub job: String,
    #[serde(default)]
    pub sp: SpAllocation,
}

pub fn health_payload() -> Result<String, ApiError> {
    serde_json::to_string_pretty(&serde_json::json!({
        "status": "ok",
        "service": "buildcalc-api",
        "version": env!("CARGO_PKG_VERSION")
    }))
    .map_err(ApiError::Encode)
}

pub fn stats_payload(body: &str, catalogs: &Catalogs) -> Result<String, ApiError> {
    let request: StatsRequest = serde_json::from_str(body).map_err(ApiError::Parse)?;
    let stats: CalculatedStats = compute_stats(&request.build, catalogs)?;
    encode(&stats)
}

pub fn damage_payload(body: &str, catalogs: &Catalogs) -> Result<String, ApiError> {
    let request: DamageRequest = serde_json::from_str(body).map_err(ApiError::Parse)?;
    let stats = compute_stats(&request.build, catalogs)?;
    let damage = compute_damage(
        &request.build,
        &stats,
        request.skill.as_deref(),
        &request.target,
        catalogs,
    )?;
    encode(&DamageResponse {
        final_stats: stats.final_stats,
        crit_rate: stats.crit_rate,
        damage,
    })
}

pub fn optimize_payload(body: &str, catalogs: &Catalogs) -> Result<String, ApiError> {
    let request: OptimizeRequest = serde_json::from_str(body).map_err(ApiError::Parse)?;
    let outcome: OptimizeOutcome = optimize(&request, catalogs, |_, _| {})?;
    encode(&outcome)
}

pub fn sp_tree_payload(body: &str, catalogs: &Catalogs) -> Result<String, ApiError> {
    let request: SpTreeRequest = serde_json::from_str(body).map_err(ApiError::Parse)?;
    let job = catalogs.job(&request.job).map_err(CalcError::from)?;
    request
        .sp
        .validate(catalogs.constants.max_sp_per_branch)
        .map_err(CalcError::from)?;
    let state: SpTreeState = resolve_sp_tree(&request.sp, &job.sp_tiers);
    encode(&state)
}

fn encode<T: Serialize>(value: &T) -> Result<String, ApiError> {
    serde_json::to_string_pretty(value).map_err(ApiError::Encode)
}
