//! Game settings and preferences
//!
//! Persisted to LocalStorage separately from the high score.

use serde::{Deserialize, Serialize};

/// Player preferences
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    // === Simulation ===
    /// Fixed-timestep accumulator (deterministic) vs. raw frame delta
    pub fixed_timestep: bool,

    // === Visual effects ===
    /// Juice/spark particles
    pub particles: bool,
    /// Floating score popups
    pub score_popups: bool,
    /// Critical/bomb screen flashes
    pub flashes: bool,

    // === HUD ===
    /// Show FPS counter
    pub show_fps: bool,

    // === Audio ===
    /// Master volume (0.0 - 1.0)
    pub master_volume: f32,
    /// Sound effects volume (0.0 - 1.0)
    pub sfx_volume: f32,
    /// Mute when window loses focus
    pub mute_on_blur: bool,

    // === Accessibility ===
    /// Reduced motion (suppresses flashes regardless of the flashes toggle)
    pub reduced_motion: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            fixed_timestep: true,

            particles: true,
            score_popups: true,
            flashes: true,

            show_fps: false,

            master_volume: 0.8,
            sfx_volume: 1.0,
            mute_on_blur: true,

            reduced_motion: false,
        }
    }
}

impl Settings {
    /// Effective flash setting (respects reduced_motion)
    pub fn effective_flashes(&self) -> bool {
        self.flashes && !self.reduced_motion
    }

    /// Combined audio gain
    pub fn effective_volume(&self) -> f32 {
        (self.master_volume * self.sfx_volume).clamp(0.0, 1.0)
    }

    /// LocalStorage key
    #[allow(dead_code)]
    const STORAGE_KEY: &'static str = "slice_rush_settings";

    /// Load settings from LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(Some(json)) = storage.get_item(Self::STORAGE_KEY) {
                if let Ok(settings) = serde_json::from_str(&json) {
                    log::info!("loaded settings from LocalStorage");
                    return settings;
                }
            }
        }

        log::info!("using default settings");
        Self::default()
    }

    /// Save settings to LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn save(&self) {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(json) = serde_json::to_string(self) {
                let _ = storage.set_item(Self::STORAGE_KEY, &json);
                log::info!("settings saved");
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
