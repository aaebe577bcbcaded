// pelagos_sim/src/simulation/config/mod.rs

//! Loading, resolving, and validating the run configuration.
//!
//! The scenario TOML and the CLI overrides are merged into one immutable
//! [`RunConfig`] before anything else happens. The data source is resolved
//! here, once, into a tagged [`SourceConfig`]; the rest of the node only
//! ever dispatches on that enum.

use bevy::prelude::Resource;
use figment::{
    providers::{Format, Toml},
    Figment,
};
use nalgebra::{Isometry3, Translation3, UnitQuaternion, Vector3};
use serde::Deserialize;
use std::path::PathBuf;

use pelagos_core::survey::load::{
    RawArchiveLoader, SerializedLoader, SimulationDirLoader, SubmapLoader,
};

use crate::cli::Cli;
use crate::simulation::utils::serde_helpers;

/// Fatal configuration error. Aborts the run before any timer starts.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to load scenario {}: {detail}", path.display())]
    Scenario { path: PathBuf, detail: String },
    #[error("more than one source override given; pick one of --simulation, --original, --serialized")]
    ContradictorySource,
    #[error("no data source selected; add a [source] table to the scenario or pass an override")]
    MissingSource,
    #[error("motion period must be positive and finite, got {0}")]
    InvalidMotionPeriod(f64),
    #[error("publish period must be positive and finite, got {0}")]
    InvalidPublishPeriod(f64),
    #[error("noise stddev must be non-negative and finite, got {0}")]
    InvalidNoise(f64),
}

// =========================================================================
// == Top-Level Configuration Resource ==
// =========================================================================

/// The immutable, fully resolved configuration for one run.
#[derive(Resource, Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)] // Fail if the TOML has tables we don't know
pub struct RunConfig {
    #[serde(default)]
    pub run: RunSettings,

    /// Resolved from the scenario's `[source]` table or a CLI override.
    /// `None` only transiently, before `resolve` finishes.
    #[serde(default)]
    pub source: Option<SourceConfig>,

    #[serde(default)]
    pub survey: SurveyConfig,

    #[serde(default)]
    pub motion: MotionConfig,
}

impl RunConfig {
    /// Merges the scenario file with the CLI and validates the result.
    pub fn resolve(cli: &Cli) -> Result<Self, ConfigError> {
        let mut config: RunConfig = Figment::new()
            .merge(Toml::file(&cli.scenario))
            .extract()
            .map_err(|e| ConfigError::Scenario {
                path: cli.scenario.clone(),
                detail: e.to_string(),
            })?;

        let overrides = [
            cli.simulation
                .clone()
                .map(|input_path| SourceConfig::Simulation { input_path }),
            cli.original.clone().map(|input_path| SourceConfig::Original {
                input_path,
                output_path: default_output_path(),
            }),
            cli.serialized
                .clone()
                .map(|input_path| SourceConfig::Serialized { input_path }),
        ];
        let mut given = overrides.into_iter().flatten();
        if let Some(first) = given.next() {
            if given.next().is_some() {
                return Err(ConfigError::ContradictorySource);
            }
            config.source = Some(first);
        }
        if config.source.is_none() {
            return Err(ConfigError::MissingSource);
        }

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let motion = &self.motion;
        if !motion.period.is_finite() || motion.period <= 0.0 {
            return Err(ConfigError::InvalidMotionPeriod(motion.period));
        }
        if !self.survey.publish_period.is_finite() || self.survey.publish_period <= 0.0 {
            return Err(ConfigError::InvalidPublishPeriod(self.survey.publish_period));
        }
        for stddev in [motion.velocity_noise_stddev, motion.yaw_rate_noise_stddev] {
            if !stddev.is_finite() || stddev < 0.0 {
                return Err(ConfigError::InvalidNoise(stddev));
            }
        }
        Ok(())
    }

    /// The resolved source. Only valid after `resolve` succeeded.
    pub fn source(&self) -> &SourceConfig {
        self.source
            .as_ref()
            .expect("RunConfig::resolve guarantees a source")
    }
}

// =========================================================================
// == Configuration Sub-Structs ==
// These map directly to the tables of a scenario.toml file.
// =========================================================================

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunSettings {
    /// Optional seed for the pseudo-random number generator for determinism.
    pub seed: Option<u64>,
    /// Optional wall-clock duration after which the node shuts itself down.
    /// Without it the node runs until the process is signaled.
    pub duration_seconds: Option<f64>,
}

/// The three mutually exclusive data sources, resolved once at parse time.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "mode")]
#[serde(rename_all = "snake_case")]
pub enum SourceConfig {
    /// A directory of simulator-produced submap files.
    Simulation { input_path: PathBuf },
    /// A raw ground-truth archive needing the one-time map extraction. The
    /// extracted collection is re-serialized to `output_path`.
    Original {
        input_path: PathBuf,
        #[serde(default = "default_output_path")]
        output_path: PathBuf,
    },
    /// A previously serialized collection archive.
    Serialized { input_path: PathBuf },
}

fn default_output_path() -> PathBuf {
    PathBuf::from("output_cereal")
}

impl SourceConfig {
    /// Dispatches to the loader implementing this source.
    pub fn loader(&self) -> Box<dyn SubmapLoader> {
        match self {
            SourceConfig::Simulation { input_path } => Box::new(SimulationDirLoader {
                dir: input_path.clone(),
            }),
            SourceConfig::Original { input_path, .. } => Box::new(RawArchiveLoader {
                path: input_path.clone(),
            }),
            SourceConfig::Serialized { input_path } => Box::new(SerializedLoader {
                path: input_path.clone(),
            }),
        }
    }

    pub fn describe(&self) -> String {
        match self {
            SourceConfig::Simulation { input_path } => {
                format!("simulation directory {}", input_path.display())
            }
            SourceConfig::Original { input_path, .. } => {
                format!("raw ground-truth archive {}", input_path.display())
            }
            SourceConfig::Serialized { input_path } => {
                format!("serialized collection {}", input_path.display())
            }
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SurveyConfig {
    /// Minimum spatial separation enforced on every submap cloud.
    #[serde(default = "default_downsample_radius")]
    pub downsample_radius: f64,
    /// Seconds between point-cloud publications.
    #[serde(default = "default_publish_period")]
    pub publish_period: f64,
}

impl Default for SurveyConfig {
    fn default() -> Self {
        Self {
            downsample_radius: default_downsample_radius(),
            publish_period: default_publish_period(),
        }
    }
}

fn default_downsample_radius() -> f64 {
    2.0
}

fn default_publish_period() -> f64 {
    10.0
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MotionConfig {
    /// Seconds between vehicle state updates.
    #[serde(default = "default_motion_period")]
    pub period: f64,
    /// Commanded forward speed, m/s.
    #[serde(default = "default_surge_speed")]
    pub surge_speed: f64,
    /// Commanded vertical speed, m/s (negative dives).
    #[serde(default)]
    pub heave_speed: f64,
    /// Commanded turn rate, rad/s.
    #[serde(default)]
    pub yaw_rate: f64,
    /// Gaussian noise applied to the commanded linear speeds.
    #[serde(default = "default_velocity_noise_stddev")]
    pub velocity_noise_stddev: f64,
    /// Gaussian noise applied to the commanded turn rate.
    #[serde(default = "default_yaw_rate_noise_stddev")]
    pub yaw_rate_noise_stddev: f64,
    #[serde(default)]
    pub initial_pose: Pose,
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            period: default_motion_period(),
            surge_speed: default_surge_speed(),
            heave_speed: 0.0,
            yaw_rate: 0.0,
            velocity_noise_stddev: default_velocity_noise_stddev(),
            yaw_rate_noise_stddev: default_yaw_rate_noise_stddev(),
            initial_pose: Pose::default(),
        }
    }
}

fn default_motion_period() -> f64 {
    1.0
}

fn default_surge_speed() -> f64 {
    1.5
}

fn default_velocity_noise_stddev() -> f64 {
    0.02
}

fn default_yaw_rate_noise_stddev() -> f64 {
    0.005
}

// =========================================================================
// == Helper Structs for Nested Configuration ==
// =========================================================================

#[derive(Deserialize, Debug, Clone, Copy, Default)]
pub struct Pose {
    #[serde(with = "serde_helpers::vec3_from_array", default)]
    pub translation: Vector3<f64>,

    #[serde(with = "serde_helpers::quat_from_euler_deg", default)]
    pub rotation: UnitQuaternion<f64>,
}

impl Pose {
    pub fn to_isometry(&self) -> Isometry3<f64> {
        Isometry3::from_parts(Translation3::from(self.translation), self.rotation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn cli(scenario: &str) -> Cli {
        Cli {
            scenario: PathBuf::from(scenario),
            simulation: None,
            original: None,
            serialized: None,
        }
    }

    #[test]
    fn test_defaults_fill_missing_tables() {
        let config: RunConfig = toml::from_str("[source]\nmode = \"serialized\"\ninput_path = \"run\"").unwrap();
        assert_abs_diff_eq!(config.survey.downsample_radius, 2.0);
        assert_abs_diff_eq!(config.survey.publish_period, 10.0);
        assert_abs_diff_eq!(config.motion.period, 1.0);
        assert!(config.run.seed.is_none());
        assert!(matches!(
            config.source,
            Some(SourceConfig::Serialized { .. })
        ));
    }

    #[test]
    fn test_source_table_is_tagged_by_mode() {
        let config: RunConfig = toml::from_str(
            "[source]\nmode = \"original\"\ninput_path = \"dive7.praw\"",
        )
        .unwrap();
        match config.source.unwrap() {
            SourceConfig::Original {
                input_path,
                output_path,
            } => {
                assert_eq!(input_path, PathBuf::from("dive7.praw"));
                assert_eq!(output_path, PathBuf::from("output_cereal"));
            }
            other => panic!("unexpected source: {other:?}"),
        }
    }

    #[test]
    fn test_two_cli_overrides_are_contradictory() {
        let mut args = cli("missing.toml");
        args.simulation = Some(PathBuf::from("submaps/"));
        args.serialized = Some(PathBuf::from("run.cereal"));
        let err = RunConfig::resolve(&args).unwrap_err();
        assert!(matches!(err, ConfigError::ContradictorySource));
    }

    #[test]
    fn test_no_source_anywhere_is_an_error() {
        // The scenario file does not exist and no override is given.
        let err = RunConfig::resolve(&cli("does_not_exist.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::MissingSource));
    }

    #[test]
    fn test_single_override_wins() {
        let mut args = cli("does_not_exist.toml");
        args.original = Some(PathBuf::from("gt.praw"));
        let config = RunConfig::resolve(&args).unwrap();
        assert!(matches!(config.source(), SourceConfig::Original { .. }));
    }

    #[test]
    fn test_non_positive_motion_period_is_rejected() {
        let config: RunConfig = toml::from_str(
            "[source]\nmode = \"serialized\"\ninput_path = \"run\"\n\n[motion]\nperiod = 0.0",
        )
        .unwrap();
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidMotionPeriod(_)));
    }

    #[test]
    fn test_unknown_table_is_rejected() {
        let result = toml::from_str::<RunConfig>("[viewer]\nenabled = true");
        assert!(result.is_err());
    }

    #[test]
    fn test_initial_pose_parses_from_arrays() {
        let config: RunConfig = toml::from_str(
            "[source]\nmode = \"serialized\"\ninput_path = \"run\"\n\n[motion.initial_pose]\ntranslation = [2.0, 0.0, -45.0]\nrotation = [0.0, 0.0, 180.0]",
        )
        .unwrap();
        let pose = config.motion.initial_pose.to_isometry();
        assert_abs_diff_eq!(pose.translation.vector.z, -45.0, epsilon = 1e-12);
        assert_abs_diff_eq!(
            pose.rotation.euler_angles().2.abs(),
            std::f64::consts::PI,
            epsilon = 1e-9
        );
    }
}
