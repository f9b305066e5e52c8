//! Client settings read from the environment.

use anyhow::Context;
use bonsai_core::config::NetworkConfig;
use bonsai_core::game::{Speed, MAX_PLAYERS, MIN_PLAYERS};

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub network: NetworkConfig,
    pub name: String,
    /// Session to join, or the id to host under with `host`
    pub session: Option<String>,
    pub host: bool,
    pub speed: Speed,
    /// Human seats the host waits for, itself included
    pub players: usize,
    /// Host-driven bot seats
    pub bots: usize,
    pub seed: Option<u64>,
}

impl ClientConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let network = NetworkConfig::from_lookup(&lookup);
        let name = lookup("BONSAI_NAME")
            .unwrap_or_else(|| format!("Gardener {}", rand::random::<u16>()));
        let session = lookup("BONSAI_SESSION");
        let host = session.is_none() || lookup("BONSAI_HOST").is_some_and(|v| v == "1");

        let speed = match lookup("BONSAI_SPEED") {
            Some(raw) => raw.parse::<Speed>().context("BONSAI_SPEED")?,
            None => Speed::default(),
        };
        let players = parse_or(&lookup, "BONSAI_PLAYERS", 2)?;
        let bots = parse_or(&lookup, "BONSAI_BOTS", 0)?;
        let seed = lookup("BONSAI_SEED")
            .map(|raw| raw.parse::<u64>().context("BONSAI_SEED"))
            .transpose()?;

        let seats = players + bots;
        if host && !(MIN_PLAYERS..=MAX_PLAYERS).contains(&seats) {
            anyhow::bail!(
                "{players} players and {bots} bots make {seats} seats, need {MIN_PLAYERS} to {MAX_PLAYERS}"
            );
        }

        Ok(Self {
            network,
            name,
            session,
            host,
            speed,
            players,
            bots,
            seed,
        })
    }
}

fn parse_or(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: usize,
) -> anyhow::Result<usize> {
    match lookup(key) {
        Some(raw) => raw.parse::<usize>().with_context(|| format!("{key}={raw}")),
        None => Ok(default),
    }
}
