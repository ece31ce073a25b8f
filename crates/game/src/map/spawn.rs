use glam::Vec3;
use rand::Rng;

use crate::error::SessionError;

use super::ArenaMap;

/// Spawn positions discovered from `spawn_0`, `spawn_1`, ... markers.
///
/// Discovery stops at the first missing index, so a gap hides every later marker.
#[derive(Debug, Clone)]
pub struct SpawnPoints {
    points: Vec<Vec3>,
}

impl SpawnPoints {
    pub fn from_map(map: &ArenaMap) -> Result<Self, SessionError> {
        let mut points = Vec::new();
        while let Some(marker) = map.marker(&format!("spawn_{}", points.len())) {
            points.push(marker.position);
        }

        if points.is_empty() {
            log::error!("map has no spawn_0 marker");
            return Err(SessionError::MissingSpawnPoint);
        }
        log::debug!("found {} spawn points", points.len());
        Ok(Self { points })
    }

    pub fn pick<R: Rng>(&self, rng: &mut R) -> Vec3 {
        self.points[rng.random_range(0..self.points.len())]
    }

    pub fn points(&self) -> &[Vec3] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}
