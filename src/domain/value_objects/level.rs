//! Level settings applied by the world host

use std::collections::BTreeMap;

/// Midday in the storage engine's day cycle
pub const DEFAULT_DAY_TIME: i64 = 6000;

/// Host-side settings applied to a freshly created or imported world
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelSettings {
    pub game_rules: BTreeMap<String, String>,
    pub time: i64,
    pub clear_weather: bool,
    pub auto_save: bool,
}

impl LevelSettings {
    /// Settings for a generated void world
    pub fn void_world() -> Self {
        let mut game_rules = BTreeMap::new();
        game_rules.insert("doMobSpawning".to_string(), "false".to_string());
        Self {
            game_rules,
            time: DEFAULT_DAY_TIME,
            clear_weather: false,
            auto_save: true,
        }
    }

    /// Builder-friendly settings for a world imported from elsewhere
    pub fn imported() -> Self {
        let mut settings = Self::void_world();
        settings
            .game_rules
            .insert("mobGriefing".to_string(), "false".to_string());
        settings.clear_weather = true;
        settings
    }
}
