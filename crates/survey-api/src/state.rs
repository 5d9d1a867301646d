//! Application state management

use crate::config::ApiConfig;

use parking_lot::RwLock;
use std::sync::Arc;
use survey_core::{Camera, GeoPoint};
use survey_telemetry::MetricsCollector;
use tracing::info;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub metrics: Arc<MetricsCollector>,
    /// Camera used when a request names none
    pub default_camera: Camera,
    /// Home position shared by all plans until changed
    home: Arc<RwLock<Option<GeoPoint>>>,
}

impl AppState {
    pub fn new(config: ApiConfig) -> anyhow::Result<Self> {
        let default_camera = Camera::preset(&config.default_camera)?;
        info!("Default camera: {}", default_camera.name);

        let metrics = Arc::new(MetricsCollector::new()?);
        let home = Arc::new(RwLock::new(config.default_home));

        Ok(Self {
            config,
            metrics,
            default_camera,
            home,
        })
    }

    pub fn home(&self) -> Option<GeoPoint> {
        *self.home.read()
    }

    pub fn set_home(&self, home: GeoPoint) {
        *self.home.write() = Some(home);
        self.metrics.record_home_update();
        info!("Home set to {:.6}, {:.6}", home.latitude, home.longitude);
    }
}
