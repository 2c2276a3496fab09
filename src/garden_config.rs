//! Tunables for a garden instance.
//!
//! Defaults reproduce the stock garden. Hosts may override any subset by
//! passing JSON; missing fields keep their default.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::app_response::AppResponse;

pub const DEFAULT_STORAGE_KEY: &str = "idea_garden_save_v9";
/// Shortest id a host may configure; below this the id space fills up fast.
pub const MIN_ID_LENGTH: usize = 6;
pub const FALLBACK_DESCRIPTION: &str = "A clear and professional description of your idea.";

/// Closed numeric range `[min, max]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Span {
    pub min: f64,
    pub max: f64,
}

impl Span {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn width(&self) -> f64 {
        self.max - self.min
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GardenConfig {
    /// Key of the single slot holding the serialized garden.
    pub storage_key: String,
    /// strftime pattern for the `date` field.
    pub date_format: String,
    pub placement: Span,
    pub scale: Span,
    /// How long a new idea stays in the spotlight, in milliseconds.
    pub spotlight_ms: u64,
    pub planting_ms: u64,
    pub bloomed_ms: u64,
    pub id_length: usize,
    /// Fixed seed for placement and grass; `None` draws from the thread RNG.
    pub seed: Option<u64>,
    pub grass: GrassConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GrassConfig {
    pub count: usize,
    pub min_distance: f64,
    pub max_attempts: u32,
    pub area: Span,
    pub scale: Span,
}

impl Default for GardenConfig {
    fn default() -> Self {
        Self {
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            date_format: "%-m/%-d/%Y".to_string(),
            placement: Span::new(22.0, 78.0),
            scale: Span::new(1.1, 1.35),
            spotlight_ms: 3500,
            planting_ms: 800,
            bloomed_ms: 2000,
            id_length: 9,
            seed: None,
            grass: GrassConfig::default(),
        }
    }
}

impl Default for GrassConfig {
    fn default() -> Self {
        Self {
            count: 30,
            min_distance: 8.0,
            max_attempts: 80,
            area: Span::new(15.0, 85.0),
            scale: Span::new(0.3, 0.7),
        }
    }
}

impl GardenConfig {
    pub fn from_json(json: &str) -> Result<Self, AppResponse> {
        let config: GardenConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), AppResponse> {
        if self.storage_key.is_empty() {
            return Err(AppResponse::ValidationError("storage_key cannot be empty".to_string()));
        }
        if self.id_length < MIN_ID_LENGTH {
            return Err(AppResponse::ValidationError(format!(
                "id_length must be at least {MIN_ID_LENGTH}, got {}",
                self.id_length
            )));
        }
        for (name, span) in [
            ("placement", self.placement),
            ("scale", self.scale),
            ("grass.area", self.grass.area),
            ("grass.scale", self.grass.scale),
        ] {
            if !(span.min <= span.max) {
                return Err(AppResponse::ValidationError(format!(
                    "{name} range is inverted: {} > {}",
                    span.min, span.max
                )));
            }
        }
        Ok(())
    }

    pub fn spotlight(&self) -> Duration {
        Duration::from_millis(self.spotlight_ms)
    }

    pub fn planting(&self) -> Duration {
        Duration::from_millis(self.planting_ms)
    }

    pub fn bloomed(&self) -> Duration {
        Duration::from_millis(self.bloomed_ms)
    }
}
