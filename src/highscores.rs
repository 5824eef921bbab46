//! Persisted best score
//!
//! A single numeric value under a fixed LocalStorage key, read at startup
//! and written through whenever the in-memory best increases. Storage
//! failures are swallowed; gameplay never depends on persistence working.

use serde::{Deserialize, Serialize};

/// The stored best score
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default)]
pub struct HighScore {
    pub score: u64,
}

impl HighScore {
    /// LocalStorage key (used only in wasm32)
    #[allow(dead_code)]
    const STORAGE_KEY: &'static str = "slice_rush_highscore";

    pub fn new(score: u64) -> Self {
        Self { score }
    }

    /// Record a score; returns true when it beats the stored best,
    /// persisting immediately in that case
    pub fn submit(&mut self, score: u64) -> bool {
        if score > self.score {
            self.score = score;
            self.save();
            true
        } else {
            false
        }
    }

    /// Load the stored best from LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(Some(json)) = storage.get_item(Self::STORAGE_KEY) {
                if let Ok(best) = serde_json::from_str::<HighScore>(&json) {
                    log::info!("loaded high score: {}", best.score);
                    return best;
                }
            }
        }

        log::info!("no stored high score, starting fresh");
        Self::default()
    }

    /// Write through to LocalStorage (WASM only); failures are ignored
    #[cfg(target_arch = "wasm32")]
    pub fn save(&self) {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(json) = serde_json::to_string(self) {
                let _ = storage.set_item(Self::STORAGE_KEY, &json);
                log::info!("high score saved: {}", self.score);
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
