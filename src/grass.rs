//! Decorative grass patches, placed once per garden mount.
//!
//! Purely cosmetic: nothing here touches ideas. Points are drawn by rejection
//! sampling and a point that cannot find room within the attempt budget is
//! accepted anyway, so generation always terminates.

use log::debug;
use serde::Serialize;

use crate::garden_config::GrassConfig;
use crate::random_source::RandomSource;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GrassPatch {
    pub id: usize,
    pub x: f64,
    pub y: f64,
    pub scale: f64,
    /// Set when the attempt budget ran out and the point was forced in.
    pub crowded: bool,
}

impl GrassPatch {
    pub fn distance_to(&self, x: f64, y: f64) -> f64 {
        ((self.x - x).powi(2) + (self.y - y).powi(2)).sqrt()
    }
}

pub fn scatter_grass<R: RandomSource>(config: &GrassConfig, random: &mut R) -> Vec<GrassPatch> {
    let area = config.area;
    let mut patches: Vec<GrassPatch> = Vec::with_capacity(config.count);

    for id in 0..config.count {
        let mut attempts = 0;
        let (x, y, crowded) = loop {
            let x = random.in_span(area.min, area.width());
            let y = random.in_span(area.min, area.width());
            attempts += 1;

            let too_close = patches
                .iter()
                .any(|patch| patch.distance_to(x, y) < config.min_distance);
            if !too_close {
                break (x, y, false);
            }
            if attempts >= config.max_attempts {
                break (x, y, true);
            }
        };

        let scale = random.in_span(config.scale.min, config.scale.width());
        patches.push(GrassPatch { id, x, y, scale, crowded });
    }

    debug!(
        "Scattered {} grass patches, {} crowded",
        patches.len(),
        patches.iter().filter(|p| p.crowded).count()
    );
    patches
}
