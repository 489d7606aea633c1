//! Engine settings
//!
//! Tunables for turn animation and the solved check. Persisted in
//! LocalStorage on the web build.

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::CubeError;

/// Engine tunables
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    // === Animation ===
    /// Layer rotation speed (radians per second)
    pub max_angular_speed: f32,
    /// Fixed simulation step (seconds)
    pub tick_dt: f32,
    /// Maximum fixed steps run by a single `update` call
    pub max_substeps: u32,
    /// Remaining angle below which a turn counts as finished (radians)
    pub completion_epsilon: f32,

    // === Solved check ===
    /// Allowed `|dot - 1|` per face normal
    pub orientation_tolerance: f32,

    // === Scramble ===
    /// Number of moves generated by a default scramble
    pub scramble_length: usize,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            max_angular_speed: MAX_ANGULAR_SPEED,
            tick_dt: SIM_DT,
            max_substeps: MAX_SUBSTEPS,
            completion_epsilon: COMPLETION_EPSILON,
            orientation_tolerance: ORIENTATION_TOLERANCE,
            scramble_length: DEFAULT_SCRAMBLE_LENGTH,
        }
    }
}

impl EngineSettings {
    /// Reject values the engine cannot run with
    pub fn validate(&self) -> Result<(), CubeError> {
        fn positive(name: &'static str, value: f32) -> Result<(), CubeError> {
            if value.is_finite() && value > 0.0 {
                Ok(())
            } else {
                Err(CubeError::InvalidSetting {
                    name,
                    reason: format!("must be a positive number, got {value}"),
                })
            }
        }

        positive("max_angular_speed", self.max_angular_speed)?;
        positive("tick_dt", self.tick_dt)?;
        positive("completion_epsilon", self.completion_epsilon)?;
        positive("orientation_tolerance", self.orientation_tolerance)?;
        if self.max_substeps == 0 {
            return Err(CubeError::InvalidSetting {
                name: "max_substeps",
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    /// Parse and validate settings from JSON (missing fields take defaults)
    pub fn from_json(json: &str) -> Result<Self, CubeError> {
        let settings: Self = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn to_json(&self) -> Result<String, CubeError> {
        Ok(serde_json::to_string(self)?)
    }

    /// LocalStorage key
    #[allow(dead_code)]
    const STORAGE_KEY: &'static str = "cube_sim_settings";

    /// Load settings from LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(Some(json)) = storage.get_item(Self::STORAGE_KEY) {
                match Self::from_json(&json) {
                    Ok(settings) => {
                        log::info!("Loaded settings from LocalStorage");
                        return settings;
                    }
                    Err(e) => log::warn!("Ignoring stored settings: {e}"),
                }
            }
        }

        log::info!("Using default settings");
        Self::default()
    }

    /// Save settings to LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn save(&self) {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(json) = self.to_json() {
                let _ = storage.set_item(Self::STORAGE_KEY, &json);
                log::info!("Settings saved");
            }
        }
    }

    /// Native stubs
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load() -> Self {
        Self::default()
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn save(&self) {
        // No-op for native
    }
}
