//! Client configuration.
//!
//! Layering: `.env` (via dotenvy) -> process environment -> CLI flags.
//! The API base address is resolved once at startup and never changes after.

use std::path::PathBuf;

use crate::cli::ClientArgs;
use crate::domain::VendorWeights;
use crate::error::{AppError, EXIT_USAGE};

pub const DEFAULT_API_BASE: &str = "http://127.0.0.1:5000";
pub const DEFAULT_LOG_FILE: &str = "procure.log";

#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    pub api_base: String,
    pub log_file: PathBuf,
    /// Forwarded to the vendor endpoint only when set; the server has its own defaults.
    pub weights: Option<VendorWeights>,
}

impl ClientConfig {
    pub fn from_args(args: &ClientArgs) -> Result<Self, AppError> {
        dotenvy::dotenv().ok();
        Self::resolve(
            args,
            std::env::var("PROCURE_API_BASE").ok(),
            std::env::var("PROCURE_LOG_FILE").ok(),
        )
    }

    fn resolve(
        args: &ClientArgs,
        env_api_base: Option<String>,
        env_log_file: Option<String>,
    ) -> Result<Self, AppError> {
        let api_base = args
            .api_base
            .clone()
            .or(env_api_base)
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string());

        if !(api_base.starts_with("http://") || api_base.starts_with("https://")) {
            return Err(AppError::new(
                EXIT_USAGE,
                format!("API base must start with http:// or https:// (got '{api_base}')."),
            ));
        }

        let log_file = args
            .log_file
            .clone()
            .or_else(|| env_log_file.map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_FILE));

        let weights = weights_from_args(args)?;

        Ok(Self {
            api_base,
            log_file,
            weights,
        })
    }
}

fn weights_from_args(args: &ClientArgs) -> Result<Option<VendorWeights>, AppError> {
    if args.w_price.is_none() && args.w_delivery.is_none() && args.w_reliability.is_none() {
        return Ok(None);
    }
    let defaults = VendorWeights::default();
    let weights = VendorWeights {
        price: args.w_price.unwrap_or(defaults.price),
        delivery: args.w_delivery.unwrap_or(defaults.delivery),
        reliability: args.w_reliability.unwrap_or(defaults.reliability),
    };
    for (name, v) in [
        ("price", weights.price),
        ("delivery", weights.delivery),
        ("reliability", weights.reliability),
    ] {
        if !(v.is_finite() && (0.0..=100.0).contains(&v)) {
            return Err(AppError::new(
                EXIT_USAGE,
                format!("Weight for {name} must be between 0 and 100 (got {v})."),
            ));
        }
    }
    Ok(Some(weights))
}
