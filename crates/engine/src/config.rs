//! Engine configuration from the environment and an optional rules file
//!
//! | Variable | Meaning | Default |
//! |----------|---------|---------|
//! | `BLOCK_PUZZLE_SEED` | RNG seed | wall clock |
//! | `BLOCK_PUZZLE_GRID_SIZE` | grid side, overrides the rules file | 8 |
//! | `BLOCK_PUZZLE_DIFFICULTY` | `easy` / `normal` / `hard` | normal |
//! | `BLOCK_PUZZLE_MODE` | `classic` / `zen` | classic |
//! | `BLOCK_PUZZLE_RULES_PATH` | JSON rules document | built-in tables |
//! | `BLOCK_PUZZLE_EVENT_LOG` | JSONL event log path | none |
//!
//! Unparseable values fall back to the default. A rules file that cannot be
//! read or fails validation is an `InvalidConfig` error.

use std::path::Path;

use crate::core::{Clock, EngineError, EngineResult, RulesConfig, SystemClock};
use crate::snapshot::{parse_difficulty, parse_mode};
use crate::types::{Difficulty, GameMode};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    pub seed: u32,
    pub difficulty: Difficulty,
    pub mode: GameMode,
    pub rules: RulesConfig,
    pub event_log_path: Option<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            seed: 1,
            difficulty: Difficulty::default(),
            mode: GameMode::default(),
            rules: RulesConfig::default(),
            event_log_path: None,
        }
    }
}

impl EngineConfig {
    /// Create from environment variables
    pub fn from_env() -> EngineResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as `from_env`, reading variables through `lookup`
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> EngineResult<Self> {
        let var = |key: &str| {
            lookup(key)
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
        };

        let seed = var("BLOCK_PUZZLE_SEED")
            .and_then(|s| s.parse().ok())
            .unwrap_or_else(|| SystemClock.now_ms() as u32);
        let difficulty = var("BLOCK_PUZZLE_DIFFICULTY")
            .and_then(|s| parse_difficulty(&s))
            .unwrap_or_default();
        let mode = var("BLOCK_PUZZLE_MODE")
            .and_then(|s| parse_mode(&s))
            .unwrap_or_default();

        let mut rules = match var("BLOCK_PUZZLE_RULES_PATH") {
            Some(path) => load_rules(&path)?,
            None => RulesConfig::default(),
        };
        if let Some(size) = var("BLOCK_PUZZLE_GRID_SIZE").and_then(|s| s.parse().ok()) {
            rules.grid_size = size;
        }
        rules.validate()?;

        Ok(Self {
            seed,
            difficulty,
            mode,
            rules,
            event_log_path: var("BLOCK_PUZZLE_EVENT_LOG"),
        })
    }
}

/// Parse and validate a JSON rules document
pub fn rules_from_json(s: &str) -> EngineResult<RulesConfig> {
    let rules: RulesConfig = serde_json::from_str(s).map_err(|e| {
        EngineError::invalid_config("rules document is not valid JSON").with_details(e.to_string())
    })?;
    rules.validate()?;
    Ok(rules)
}

/// Read a rules file from disk
pub fn load_rules(path: impl AsRef<Path>) -> EngineResult<RulesConfig> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|e| {
        EngineError::invalid_config("cannot read rules file")
            .with_details(format!("{}: {}", path.display(), e))
    })?;
    rules_from_json(&text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ErrorKind;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_config_from_vars() {
        let config = EngineConfig::from_lookup(lookup(&[
            ("BLOCK_PUZZLE_SEED", "1234"),
            ("BLOCK_PUZZLE_GRID_SIZE", "10"),
            ("BLOCK_PUZZLE_DIFFICULTY", "Hard"),
            ("BLOCK_PUZZLE_MODE", "zen"),
            ("BLOCK_PUZZLE_EVENT_LOG", " /tmp/events.jsonl "),
        ]))
        .unwrap();
        assert_eq!(config.seed, 1234);
        assert_eq!(config.rules.grid_size, 10);
        assert_eq!(config.difficulty, Difficulty::Hard);
        assert_eq!(config.mode, GameMode::Zen);
        assert_eq!(config.event_log_path.as_deref(), Some("/tmp/events.jsonl"));
    }

    #[test]
    fn test_bad_values_fall_back() {
        let config = EngineConfig::from_lookup(lookup(&[
            ("BLOCK_PUZZLE_SEED", "1"),
            ("BLOCK_PUZZLE_DIFFICULTY", "nightmare"),
            ("BLOCK_PUZZLE_MODE", ""),
            ("BLOCK_PUZZLE_GRID_SIZE", "big"),
        ]))
        .unwrap();
        assert_eq!(config.difficulty, Difficulty::Normal);
        assert_eq!(config.mode, GameMode::Classic);
        assert_eq!(config.rules.grid_size, 8);
        assert!(config.event_log_path.is_none());
    }

    #[test]
    fn test_out_of_range_grid_is_invalid() {
        let err = EngineConfig::from_lookup(lookup(&[("BLOCK_PUZZLE_GRID_SIZE", "30")]))
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidConfig);
    }

    #[test]
    fn test_missing_rules_file() {
        let err = EngineConfig::from_lookup(lookup(&[(
            "BLOCK_PUZZLE_RULES_PATH",
            "/nonexistent/block_puzzle_rules.json",
        )]))
        .unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidConfig);
    }

    #[test]
    fn test_rules_from_json() {
        let rules = rules_from_json(r#"{"zen_reroll_limit": 2, "power_ups": {"bomb_radius": 2}}"#)
            .unwrap();
        assert_eq!(rules.zen_reroll_limit, 2);
        assert_eq!(rules.power_ups.bomb_radius, 2);
        assert_eq!(rules.power_ups.cooldown_ms.get(crate::types::PowerUpKind::Hint), 3_000);

        assert!(rules_from_json("{").is_err());
        assert!(rules_from_json(r#"{"combo": {"multipliers_pct": [5, 1]}}"#).is_err());
    }
}
