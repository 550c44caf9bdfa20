use anyhow::{Context, Result};
use serde::Deserialize;

use crate::resolver::DEFAULT_FOLDER;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub snapshot_path: String,
    pub outbox_dir: String,
    pub session: SessionConfig,
}

/// Defaults applied by [`crate::MailSession`].
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    pub default_folder: String,
    pub keep_live_items: bool,
    pub log_accounts: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        SessionConfig {
            default_folder: DEFAULT_FOLDER.to_string(),
            keep_live_items: false,
            log_accounts: false,
        }
    }
}

const REQUIRED_VARS: [&str; 1] = ["MAIL_SNAPSHOT_PATH"];

impl Config {
    pub fn new() -> Result<Self> {
        Self::check_required_env_vars()?;

        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the configuration from any variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let flag = |name: &str| {
            lookup(name)
                .map(|value| value.trim().eq_ignore_ascii_case("true"))
                .unwrap_or(false)
        };

        Ok(Config {
            snapshot_path: lookup("MAIL_SNAPSHOT_PATH").context("MAIL_SNAPSHOT_PATH must be set")?,
            outbox_dir: lookup("MAIL_OUTBOX_DIR").unwrap_or_else(|| "./outbox".to_string()),
            session: SessionConfig {
                default_folder: lookup("MAIL_DEFAULT_FOLDER")
                    .filter(|folder| !folder.trim().is_empty())
                    .unwrap_or_else(|| DEFAULT_FOLDER.to_string()),
                keep_live_items: flag("MAIL_KEEP_LIVE_ITEMS"),
                log_accounts: flag("MAIL_LOG_ACCOUNTS"),
            },
        })
    }

    fn check_required_env_vars() -> Result<()> {
        let missing_vars: Vec<&str> = REQUIRED_VARS
            .iter()
            .copied()
            .filter(|var| std::env::var(var).is_err())
            .collect();

        if !missing_vars.is_empty() {
            anyhow::bail!(
                "Missing environment variables: {}\n\
                 \n\
                 💡 Solutions :\n\
                 1. Create a .env file:\n\
                    MAIL_SNAPSHOT_PATH=./mailbox.json\n\
                 \n\
                 2. Or export the variables manually:\n\
                    export MAIL_SNAPSHOT_PATH=/path/to/mailbox.json\n\
                    export MAIL_OUTBOX_DIR=./outbox",
                missing_vars.join(", ")
            );
        }

        Ok(())
    }
}
