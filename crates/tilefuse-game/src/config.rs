use std::io::Read;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use serde::Deserialize;

use tilefuse_rules::engine::SpawnPolicy;

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct Config {
    /// Board side length.
    #[serde(default = "defaults::dimension")]
    pub dimension: usize,

    /// Tile value that wins the game.
    #[serde(default = "defaults::threshold")]
    pub threshold: u32,

    /// RNG seed for tile spawning; omit for entropy.
    #[serde(default)]
    pub seed: Option<u64>,

    #[serde(default)]
    pub queue: Queue,

    #[serde(default)]
    pub spawn: Spawn,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct Queue {
    /// Most pending moves held at once; extra inputs are dropped.
    #[serde(default = "defaults::capacity")]
    pub capacity: usize,

    /// Pause after a board-changing move, in milliseconds.
    #[serde(default = "defaults::settle_ms")]
    pub settle_ms: u64,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct Spawn {
    /// Probability that a spawned tile is a 4 instead of a 2.
    #[serde(default = "defaults::four_chance")]
    pub four_chance: f64,

    /// Tiles placed when a game starts.
    #[serde(default = "defaults::initial_tiles")]
    pub initial_tiles: usize,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            dimension: defaults::dimension(),
            threshold: defaults::threshold(),
            seed: None,
            queue: Queue::default(),
            spawn: Spawn::default(),
        }
    }
}

impl Default for Queue {
    fn default() -> Self {
        Queue {
            capacity: defaults::capacity(),
            settle_ms: defaults::settle_ms(),
        }
    }
}

impl Default for Spawn {
    fn default() -> Self {
        Spawn {
            four_chance: defaults::four_chance(),
            initial_tiles: defaults::initial_tiles(),
        }
    }
}

impl Config {
    pub fn from_toml<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let mut file = std::fs::File::open(path)
            .with_context(|| format!("failed to open {}", path.display()))?;
        let mut contents = String::new();
        file.read_to_string(&mut contents)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let cfg: Self = toml::from_str(&contents)
            .with_context(|| format!("failed to parse {}", path.display()))?;
        Ok(cfg)
    }

    /// Reject configurations the engine would assert on.
    pub fn validate(&self) -> Result<()> {
        if self.dimension < 2 {
            bail!("dimension must be at least 2, got {}", self.dimension);
        }
        if self.threshold < 8 {
            bail!("threshold must be at least 8, got {}", self.threshold);
        }
        if self.queue.capacity == 0 {
            bail!("queue capacity must be at least 1");
        }
        if !(0.0..=1.0).contains(&self.spawn.four_chance) {
            bail!(
                "spawn four_chance must be within 0..=1, got {}",
                self.spawn.four_chance
            );
        }
        if self.spawn.initial_tiles > self.dimension * self.dimension {
            bail!(
                "initial_tiles {} does not fit a {}x{} board",
                self.spawn.initial_tiles,
                self.dimension,
                self.dimension
            );
        }
        Ok(())
    }

    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.queue.settle_ms)
    }

    pub fn spawn_policy(&self) -> SpawnPolicy {
        SpawnPolicy {
            four_chance: self.spawn.four_chance,
        }
    }
}

mod defaults {
    pub fn dimension() -> usize {
        4
    }
    pub fn threshold() -> u32 {
        2048
    }
    pub fn capacity() -> usize {
        100
    }
    pub fn settle_ms() -> u64 {
        300
    }
    pub fn four_chance() -> f64 {
        0.1
    }
    pub fn initial_tiles() -> usize {
        2
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn empty_document_yields_defaults() {
        let cfg: Config = toml::from_str("").expect("empty config parses");
        assert_eq!(cfg, Config::default());
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.settle(), Duration::from_millis(300));
    }

    #[test]
    fn partial_document_keeps_remaining_defaults() {
        let cfg: Config = toml::from_str(
            r#"
            dimension = 5
            seed = 99

            [queue]
            settle_ms = 150
            "#,
        )
        .expect("partial config parses");
        assert_eq!(cfg.dimension, 5);
        assert_eq!(cfg.threshold, 2048);
        assert_eq!(cfg.seed, Some(99));
        assert_eq!(cfg.queue.capacity, 100);
        assert_eq!(cfg.settle(), Duration::from_millis(150));
        assert_eq!(cfg.spawn.initial_tiles, 2);
    }

    #[test]
    fn from_toml_reads_a_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("game.toml");
        let mut file = std::fs::File::create(&path).expect("create config");
        writeln!(file, "threshold = 64").expect("write config");

        let cfg = Config::from_toml(&path).expect("config loads");
        assert_eq!(cfg.threshold, 64);
        assert_eq!(cfg.dimension, 4);

        assert!(Config::from_toml(dir.path().join("missing.toml")).is_err());
    }

    #[test]
    fn validate_rejects_out_of_range_values() {
        let mut cfg = Config::default();
        cfg.dimension = 1;
        assert!(cfg.validate().is_err());

        let mut cfg = Config::default();
        cfg.threshold = 4;
        assert!(cfg.validate().is_err());

        let mut cfg = Config::default();
        cfg.spawn.four_chance = 1.5;
        assert!(cfg.validate().is_err());

        let mut cfg = Config::default();
        cfg.dimension = 2;
        cfg.spawn.initial_tiles = 5;
        assert!(cfg.validate().is_err());
    }
}
