//! Spawn record persisted next to a world's save data

use serde::{Deserialize, Serialize};

/// World-relative spawn position plus the world it was recorded in
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpawnRecord {
    pub world: String,
    pub x: f64,
    pub y: f64,
    pub z: f64,
    #[serde(default)]
    pub yaw: f32,
    #[serde(default)]
    pub pitch: f32,
}

impl SpawnRecord {
    pub fn new(world: impl Into<String>, x: f64, y: f64, z: f64) -> Self {
        Self {
            world: world.into(),
            x,
            y,
            z,
            yaw: 0.0,
            pitch: 0.0,
        }
    }

    pub fn with_rotation(mut self, yaw: f32, pitch: f32) -> Self {
        self.yaw = yaw;
        self.pitch = pitch.clamp(-90.0, 90.0);
        self
    }

    /// Integer block coordinates, as the storage engine records spawn
    pub fn block_position(&self) -> (i64, i64, i64) {
        (
            self.x.floor() as i64,
            self.y.floor() as i64,
            self.z.floor() as i64,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rotation_clamps_pitch() {
        let record = SpawnRecord::new("quintus", 0.5, 64.0, -0.5).with_rotation(90.0, 120.0);
        assert_eq!(record.pitch, 90.0);
        assert_eq!(record.block_position(), (0, 64, -1));
    }

    #[test]
    fn test_missing_rotation_defaults_to_zero() {
        let record: SpawnRecord =
            serde_json::from_str(r#"{"world":"a","x":1.0,"y":2.0,"z":3.0}"#).unwrap();
        assert_eq!(record.yaw, 0.0);
        assert_eq!(record.pitch, 0.0);
    }
}
