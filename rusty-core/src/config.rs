//! Configuration management for the bot

#[path = "config_tests.rs"]
mod config_tests;

use anyhow::{Context as _, Result};
use rusty_widgets::DoneBehavior;
use tokio::time::Duration;

const DEFAULT_PAGINATOR_TIMEOUT_SECS: u64 = 120;
/// One week.
const MAX_PAGINATOR_TIMEOUT_SECS: u64 = 604_800;

/// Source of environment variables.
pub trait ReadEnv {
    fn var(&self, key: &str) -> Option<String>;
}

/// Reads the real process environment.
pub struct SystemEnv;

impl ReadEnv for SystemEnv {
    fn var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

/// Complete bot configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Bot token from the Discord developer portal
    pub discord_token: String,
    pub paginator: PaginatorConfig,
}

/// Defaults applied to every paginator the commands spawn
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaginatorConfig {
    /// `None` keeps paginators interactive until closed.
    pub timeout: Option<Duration>,
    pub done: DoneBehavior,
}

impl Default for PaginatorConfig {
    fn default() -> Self {
        Self {
            timeout: Some(Duration::from_secs(DEFAULT_PAGINATOR_TIMEOUT_SECS)),
            done: DoneBehavior {
                remove_reactions: true,
                ..DoneBehavior::default()
            },
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_reader(&SystemEnv)
    }

    pub fn from_reader(env: &impl ReadEnv) -> Result<Self> {
        let discord_token = env.var("DISCORD_TOKEN").context("DISCORD_TOKEN not set")?;
        let defaults = PaginatorConfig::default();

        let timeout = match env.var("PAGINATOR_TIMEOUT_SECS") {
            Some(raw) => {
                let secs = raw
                    .trim()
                    .parse::<u64>()
                    .with_context(|| format!("invalid PAGINATOR_TIMEOUT_SECS: {raw}"))?;
                anyhow::ensure!(
                    secs <= MAX_PAGINATOR_TIMEOUT_SECS,
                    "PAGINATOR_TIMEOUT_SECS must be at most {MAX_PAGINATOR_TIMEOUT_SECS}, got {secs}"
                );
                (secs > 0).then(|| Duration::from_secs(secs))
            }
            None => defaults.timeout,
        };

        let color = env
            .var("PAGINATOR_DONE_COLOR")
            .map(|raw| {
                parse_color(&raw).with_context(|| format!("invalid PAGINATOR_DONE_COLOR: {raw}"))
            })
            .transpose()?;

        let delete_message = parse_flag(
            env.var("PAGINATOR_DELETE_WHEN_DONE"),
            defaults.done.delete_message,
        );
        let remove_reactions = parse_flag(
            env.var("PAGINATOR_REMOVE_REACTIONS_WHEN_DONE"),
            defaults.done.remove_reactions,
        );

        Ok(Config {
            discord_token,
            paginator: PaginatorConfig {
                timeout,
                done: DoneBehavior {
                    delete_message,
                    color,
                    remove_reactions,
                },
            },
        })
    }
}

fn parse_flag(raw: Option<String>, default: bool) -> bool {
    match raw {
        Some(value) => value.trim().eq_ignore_ascii_case("true"),
        None => default,
    }
}

/// Parse `0x2f3136`, `#2f3136` or `2f3136` into an RGB color.
fn parse_color(raw: &str) -> Option<u32> {
    let trimmed = raw.trim();
    let hex = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix('#'))
        .unwrap_or(trimmed);

    u32::from_str_radix(hex, 16)
        .ok()
        .filter(|color| *color <= 0xff_ff_ff)
}
