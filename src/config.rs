use anyhow::anyhow;
use config::{Config, ConfigError, Environment, File, FileFormat};
use serde::Deserialize;
use tracing::{error, info};

use robotboard_driver::{Direction, MotorChannel, Speed, TimeoutPolicy};

pub const DEFAULT_CONFIG_PATH: &str = "config/default.toml";
const ENV_PREFIX: &str = "ROBOTBOARD";

#[derive(Debug, Clone, Deserialize)]
pub struct BenchConfig {
    pub bench: BenchSettings,
    #[serde(default)]
    pub sonar: SonarSettings,
    pub world: WorldSettings,
    #[serde(default)]
    pub drive: Vec<DriveStep>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BenchSettings {
    pub duration_ms: u64,
    pub sample_period_ms: u64,
    pub stop_distance_cm: u32,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SonarSettings {
    #[serde(default)]
    pub timeout_policy: TimeoutPolicy,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WorldSettings {
    pub obstacle_cm: f64,
    pub cm_per_s_at_full_duty: f64,
    #[serde(default)]
    pub line_a: bool,
    #[serde(default)]
    pub line_b: bool,
    #[serde(default)]
    pub line_c: bool,
    #[serde(default = "default_line_d_raw")]
    pub line_d_raw: u16,
}

fn default_line_d_raw() -> u16 {
    1023
}

/// One entry of the scripted drive sequence.
#[derive(Debug, Clone, Deserialize)]
pub struct DriveStep {
    pub motor: u8,
    pub direction: Direction,
    pub speed: i32,
    #[serde(default)]
    pub hold_ms: u64,
}

impl DriveStep {
    pub fn resolve(&self) -> anyhow::Result<(MotorChannel, Direction, Speed)> {
        let channel = MotorChannel::try_from(self.motor).map_err(|e| anyhow!(e))?;
        let speed = Speed::try_from(self.speed).map_err(|e| anyhow!(e))?;
        Ok((channel, self.direction, speed))
    }
}

impl BenchConfig {
    /// Reject settings the bench cannot run with.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.bench.sample_period_ms == 0 {
            return Err(anyhow!("bench.sample_period_ms must be positive"));
        }
        if self.world.obstacle_cm < 0.0 {
            return Err(anyhow!("world.obstacle_cm must not be negative"));
        }
        for (i, step) in self.drive.iter().enumerate() {
            step.resolve().map_err(|e| anyhow!("drive step {}: {}", i + 1, e))?;
        }
        Ok(())
    }
}

pub fn load_config(path: &str) -> Result<BenchConfig, ConfigError> {
    info!("Attempting to load configuration from {}", path);

    let settings = Config::builder()
        .add_source(File::new(path, FileFormat::Toml).required(true))
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
        .build()
        .and_then(|c| c.try_deserialize::<BenchConfig>());

    match settings {
        Ok(config) => {
            info!("Successfully loaded configuration: {:?}", config);
            Ok(config)
        }
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            Err(e)
        }
    }
}

#[cfg(test)]
pub fn parse_config(toml: &str) -> Result<BenchConfig, ConfigError> {
    Config::builder()
        .add_source(File::from_str(toml, FileFormat::Toml))
        .build()?
        .try_deserialize()
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
        [bench]
        duration_ms = 1000
        sample_period_ms = 50
        stop_distance_cm = 10

        [world]
        obstacle_cm = 80.0
        cm_per_s_at_full_duty = 40.0
    "#;

    #[test]
    fn test_minimal_config_defaults() {
        let config = parse_config(MINIMAL).unwrap();
        assert_eq!(config.bench.duration_ms, 1000);
        assert_eq!(config.sonar.timeout_policy, TimeoutPolicy::Error);
        assert_eq!(config.world.line_d_raw, 1023);
        assert!(!config.world.line_a);
        assert!(config.drive.is_empty());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_drive_steps_and_policy() {
        let toml = format!(
            "{}\n{}",
            MINIMAL,
            r#"
            [sonar]
            timeout_policy = "report_zero"

            [[drive]]
            motor = 2
            direction = "reverse"
            speed = 250
            hold_ms = 300
            "#
        );
        let config = parse_config(&toml).unwrap();
        assert_eq!(config.sonar.timeout_policy, TimeoutPolicy::ReportZero);
        assert_eq!(config.drive.len(), 1);
        let (channel, direction, speed) = config.drive[0].resolve().unwrap();
        assert_eq!(channel, MotorChannel::Two);
        assert_eq!(direction, Direction::Reverse);
        assert_eq!(speed.get(), 250);
    }

    #[test]
    fn test_validate_rejects_bad_step() {
        let toml = format!(
            "{}\n{}",
            MINIMAL,
            r#"
            [[drive]]
            motor = 3
            direction = "forward"
            speed = 100
            "#
        );
        let config = parse_config(&toml).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_out_of_range_speed() {
        let toml = format!(
            "{}\n{}",
            MINIMAL,
            r#"
            [[drive]]
            motor = 1
            direction = "forward"
            speed = 2048
            "#
        );
        let config = parse_config(&toml).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_unknown_direction_fails_to_parse() {
        let toml = format!(
            "{}\n{}",
            MINIMAL,
            r#"
            [[drive]]
            motor = 1
            direction = "sideways"
            speed = 100
            "#
        );
        assert!(parse_config(&toml).is_err());
    }

    #[test]
    fn test_env_overrides_file_value() {
        // SAFETY: no other test reads or writes this variable.
        unsafe { std::env::set_var("ROBOTBOARD_BENCH__DURATION_MS", "1234") };
        let config = load_config(DEFAULT_CONFIG_PATH);
        unsafe { std::env::remove_var("ROBOTBOARD_BENCH__DURATION_MS") };

        let config = config.unwrap();
        assert_eq!(config.bench.duration_ms, 1234);
        // Untouched keys still come from the file.
        assert_eq!(config.bench.sample_period_ms, 100);
    }

    #[test]
    fn test_shipped_default_config_is_valid() {
        let config = parse_config(include_str!("../config/default.toml")).unwrap();
        assert!(config.validate().is_ok());
        assert!(!config.drive.is_empty());
    }
}
