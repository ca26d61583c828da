//! Configuration system for the ecosystem simulation.
//!
//! Supports YAML configuration files with sensible defaults. The default
//! configuration is the classic wolf-sheep-grass setup; [`Config::bee_colony`]
//! gives the pheromone foraging setup.

use crate::agent::PerSpecies;
use crate::error::{Result, SimError};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub world: WorldConfig,
    #[serde(default = "GrazerConfig::sheep")]
    pub sheep: GrazerConfig,
    #[serde(default = "GrazerConfig::wolves")]
    pub wolves: GrazerConfig,
    #[serde(default)]
    pub bees: BeeConfig,
    #[serde(default)]
    pub grass: GrassConfig,
    #[serde(default)]
    pub chemical: ChemicalConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Grid geometry and random seed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldConfig {
    /// Number of columns (toroidal)
    pub width: usize,
    /// Number of rows (toroidal)
    pub height: usize,
    /// Seed for the world's random stream
    pub seed: u64,
}

/// Parameters shared by grid-bound, energy-limited species (sheep, wolves)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GrazerConfig {
    /// Number of agents placed at start
    pub initial_count: usize,
    /// Per-tick reproduction probability (0.0 - 1.0)
    pub reproduce: f64,
    /// Energy gained per meal
    pub gain_from_food: f64,
    /// Energy of agents placed at start
    pub initial_energy: f64,
    /// Energy lost per tick while metabolising
    pub energy_loss: f64,
}

/// Bee movement and pheromone parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BeeConfig {
    pub initial_count: usize,
    /// Per-tick reproduction probability (0.0 - 1.0)
    pub reproduce: f64,
    /// Speed on a chemical-free patch
    pub base_speed: f64,
    /// Degrees of heading change per unit of chemical
    pub turn_rate: f64,
    /// Speed bonus is chemical^2 / speed_divisor
    pub speed_divisor: f64,
    /// Chemical dropped after each move
    pub deposit: f64,
}

/// Grass regrowth configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GrassConfig {
    /// When disabled sheep neither eat nor starve
    pub enabled: bool,
    /// Ticks for an eaten patch to grow back
    pub regrowth_time: u32,
    /// Fraction of patches grown at start (0.0 - 1.0)
    pub initial_grown_fraction: f64,
}

/// Chemical field dynamics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChemicalConfig {
    /// Fraction of a cell's chemical sent to each of its 8 neighbors per tick
    pub diffusion_rate: f64,
    /// Fraction of chemical retained after evaporation
    pub retention: f64,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Ticks between debug summaries
    pub stats_interval: u64,
    /// Log level (error, warn, info, debug, trace)
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            world: WorldConfig::default(),
            sheep: GrazerConfig::sheep(),
            wolves: GrazerConfig::wolves(),
            bees: BeeConfig::default(),
            grass: GrassConfig::default(),
            chemical: ChemicalConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            width: 20,
            height: 20,
            seed: 42,
        }
    }
}

impl GrazerConfig {
    pub fn sheep() -> Self {
        Self {
            initial_count: 100,
            reproduce: 0.04,
            gain_from_food: 4.0,
            initial_energy: 8.0,
            energy_loss: 1.0,
        }
    }

    pub fn wolves() -> Self {
        Self {
            initial_count: 50,
            reproduce: 0.05,
            gain_from_food: 20.0,
            initial_energy: 40.0,
            energy_loss: 1.0,
        }
    }

    fn validate(&self, name: &str) -> Result<()> {
        check_probability(&format!("{name}.reproduce"), self.reproduce)?;
        check_non_negative(&format!("{name}.gain_from_food"), self.gain_from_food)?;
        check_non_negative(&format!("{name}.initial_energy"), self.initial_energy)?;
        check_non_negative(&format!("{name}.energy_loss"), self.energy_loss)?;
        Ok(())
    }
}

impl Default for BeeConfig {
    fn default() -> Self {
        Self {
            initial_count: 0,
            reproduce: 0.0,
            base_speed: 10.0,
            turn_rate: 6.0,
            speed_divisor: 60.0,
            deposit: 2.0,
        }
    }
}

impl Default for GrassConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            regrowth_time: 30,
            initial_grown_fraction: 0.5,
        }
    }
}

impl Default for ChemicalConfig {
    fn default() -> Self {
        Self {
            diffusion_rate: 0.05,
            retention: 0.9,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            stats_interval: 50,
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    /// Pheromone foraging preset: bees only, no grass, no grazers
    pub fn bee_colony() -> Self {
        Self {
            world: WorldConfig {
                width: 100,
                height: 100,
                seed: 42,
            },
            sheep: GrazerConfig {
                initial_count: 0,
                ..GrazerConfig::sheep()
            },
            wolves: GrazerConfig {
                initial_count: 0,
                ..GrazerConfig::wolves()
            },
            bees: BeeConfig {
                initial_count: 10,
                ..BeeConfig::default()
            },
            grass: GrassConfig {
                enabled: false,
                ..GrassConfig::default()
            },
            chemical: ChemicalConfig::default(),
            logging: LoggingConfig::default(),
        }
    }

    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a YAML file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let yaml = serde_yaml::to_string(self)?;
        std::fs::write(path, yaml)?;
        Ok(())
    }

    /// Agents placed at initialisation, per species
    pub fn initial_counts(&self) -> PerSpecies<usize> {
        PerSpecies {
            sheep: self.sheep.initial_count,
            wolves: self.wolves.initial_count,
            bees: self.bees.initial_count,
        }
    }

    /// Same configuration with a different seed
    pub fn with_seed(&self, seed: u64) -> Self {
        let mut config = self.clone();
        config.world.seed = seed;
        config
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.world.width == 0 || self.world.height == 0 {
            return Err(SimError::InvalidConfig(
                "width and height must be > 0".to_string(),
            ));
        }

        self.sheep.validate("sheep")?;
        self.wolves.validate("wolves")?;

        check_probability("bees.reproduce", self.bees.reproduce)?;
        check_non_negative("bees.base_speed", self.bees.base_speed)?;
        check_non_negative("bees.deposit", self.bees.deposit)?;
        if !self.bees.turn_rate.is_finite() {
            return Err(SimError::InvalidConfig(
                "bees.turn_rate must be finite".to_string(),
            ));
        }
        if !(self.bees.speed_divisor.is_finite() && self.bees.speed_divisor > 0.0) {
            return Err(SimError::InvalidConfig(
                "bees.speed_divisor must be positive and finite".to_string(),
            ));
        }

        check_probability("grass.initial_grown_fraction", self.grass.initial_grown_fraction)?;

        check_non_negative("chemical.diffusion_rate", self.chemical.diffusion_rate)?;
        if self.chemical.diffusion_rate * 8.0 > 1.0 {
            return Err(SimError::InvalidConfig(format!(
                "chemical.diffusion_rate {} sends more than a cell holds (max 0.125)",
                self.chemical.diffusion_rate
            )));
        }
        check_probability("chemical.retention", self.chemical.retention)?;

        if self.logging.stats_interval == 0 {
            return Err(SimError::InvalidConfig(
                "logging.stats_interval must be > 0".to_string(),
            ));
        }
        Ok(())
    }
}

fn check_probability(name: &str, value: f64) -> Result<()> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(SimError::InvalidConfig(format!(
            "{name} must be within [0, 1], got {value}"
        )))
    }
}

fn check_non_negative(name: &str, value: f64) -> Result<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(SimError::InvalidConfig(format!(
            "{name} must be non-negative and finite, got {value}"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_valid() {
        assert!(Config::default().validate().is_ok());
        assert!(Config::bee_colony().validate().is_ok());
    }

    #[test]
    fn test_config_roundtrip() {
        let config = Config::bee_colony();
        let yaml = serde_yaml::to_string(&config).unwrap();
        let loaded: Config = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(config, loaded);
    }

    #[test]
    fn test_missing_sections_use_defaults() {
        let yaml = "world:\n  width: 30\n  height: 10\n  seed: 7\n";
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.world.width, 30);
        assert_eq!(config.sheep, GrazerConfig::sheep());
        assert_eq!(config.wolves, GrazerConfig::wolves());
        assert!(config.grass.enabled);
    }

    #[test]
    fn test_rejects_zero_dimensions() {
        let mut config = Config::default();
        config.world.height = 0;
        assert!(matches!(config.validate(), Err(SimError::InvalidConfig(_))));
    }

    #[test]
    fn test_rejects_bad_probability() {
        let mut config = Config::default();
        config.wolves.reproduce = 1.5;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("wolves.reproduce"));

        let mut config = Config::default();
        config.sheep.reproduce = -0.1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_negative_rates() {
        let mut config = Config::default();
        config.chemical.diffusion_rate = -0.01;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.sheep.gain_from_food = f64::NAN;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_overdiffusion() {
        let mut config = Config::default();
        config.chemical.diffusion_rate = 0.125;
        assert!(config.validate().is_ok());
        config.chemical.diffusion_rate = 0.2;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");

        let config = Config::default().with_seed(99);
        config.save(&path).unwrap();
        let loaded = Config::from_file(&path).unwrap();
        assert_eq!(loaded.world.seed, 99);
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_from_file_validates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.yaml");

        let mut config = Config::default();
        config.world.width = 0;
        config.save(&path).unwrap();
        assert!(matches!(
            Config::from_file(&path),
            Err(SimError::InvalidConfig(_))
        ));
    }
}
