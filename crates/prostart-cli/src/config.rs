use std::env;
use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;

use tracing::{debug, warn};

const DEFAULT_DB_PATH: &str = "prostart.db";

pub struct Config {
    pub db_path: PathBuf,
    /// Fill empty collections with demo data on open.
    pub seed: bool,
}

impl Config {
    /// Environment (after `.env`) with an optional command-line override for the store path.
    pub fn load(db_override: Option<PathBuf>) -> Self {
        let db_path = db_override.unwrap_or_else(|| {
            env::var("PROSTART_DB_PATH")
                .unwrap_or_else(|_| DEFAULT_DB_PATH.into())
                .into()
        });

        Self {
            db_path,
            seed: parse_or("PROSTART_SEED", env::var("PROSTART_SEED").ok(), true),
        }
    }
}

fn parse_or<T>(key: &str, raw: Option<String>, default: T) -> T
where
    T: FromStr + Display,
    T::Err: Display,
{
    match raw {
        Some(raw) => raw.trim().parse().unwrap_or_else(|e| {
            warn!("Invalid {key} value '{raw}': {e}; using default {default}");
            default
        }),
        None => {
            debug!("{key} not set, using default: {default}");
            default
        }
    }
}
