//! API server configuration

use config::{Config, ConfigBuilder, ConfigError, Environment, File, builder::DefaultState};
use serde::Deserialize;
use survey_core::GeoPoint;

const DEFAULT_CAMERA: &str = "DJI Mavic 3 Enterprise";

/// API server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    /// REST API port
    pub api_port: u16,
    /// Enable CORS for all origins (development)
    pub cors_permissive: bool,
    /// Camera preset used when a request names none
    pub default_camera: String,
    /// Home position before any is set through the API
    #[serde(default)]
    pub default_home: Option<GeoPoint>,
    /// Leg count above which a plan request is refused
    pub max_legs: usize,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            api_port: 3000,
            cors_permissive: true,
            default_camera: DEFAULT_CAMERA.to_string(),
            default_home: None,
            max_legs: 2000,
        }
    }
}

impl ApiConfig {
    /// Load from `.env`, an optional `survey.toml`, then `SURVEY_*` variables
    ///
    /// Nested keys use a double underscore: `SURVEY_DEFAULT_HOME__LATITUDE`.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let builder = Self::defaults()?
            .add_source(File::with_name("survey").required(false))
            .add_source(
                Environment::with_prefix("SURVEY")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            );
        builder.build()?.try_deserialize()
    }

    fn defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        let defaults = Self::default();
        Config::builder()
            .set_default("api_port", i64::from(defaults.api_port))?
            .set_default("cors_permissive", defaults.cors_permissive)?
            .set_default("default_camera", defaults.default_camera)?
            .set_default("max_legs", defaults.max_legs as i64)
    }
}
