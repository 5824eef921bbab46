//! Slice Rush - an arcade swipe-slicing game
//!
//! Core modules:
//! - `sim`: Host-independent simulation (spawning, physics, slice collision,
//!   score/combo/lives state machine)
//! - `highscores`: Persisted best score (LocalStorage on web)
//! - `settings`: Player preferences
//! - `audio`: Procedural Web Audio sound effects (wasm only)

pub mod highscores;
pub mod settings;
pub mod sim;

#[cfg(target_arch = "wasm32")]
pub mod audio;

pub use highscores::HighScore;
pub use settings::Settings;

/// Game configuration constants
pub mod consts {
    /// Fixed simulation timestep (120 Hz)
    pub const SIM_DT: f32 = 1.0 / 120.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;

    /// Logical viewport defaults (host may override with canvas size)
    pub const VIEW_WIDTH: f32 = 800.0;
    pub const VIEW_HEIGHT: f32 = 600.0;
    /// Horizontal inset for spawn positions
    pub const SPAWN_MARGIN: f32 = 60.0;
    /// Entities past bounds.y + this margin are culled
    pub const KILL_MARGIN: f32 = 80.0;

    /// Downward acceleration, px/s²
    pub const GRAVITY: f32 = 480.0;
    /// Particles fall slower than gameplay entities
    pub const PARTICLE_GRAVITY_FACTOR: f32 = 0.35;

    /// Spawn pacing: interval = max(MIN, BASE - wave * DECAY)
    pub const BASE_SPAWN_INTERVAL: f32 = 1.6;
    pub const SPAWN_INTERVAL_DECAY: f32 = 0.1;
    pub const MIN_SPAWN_INTERVAL: f32 = 0.55;
    /// Stagger between fruits of a normal batch (seconds)
    pub const BATCH_STAGGER: f32 = 0.12;

    /// Critical throw: rare tight cluster of 4-5 fruits
    pub const CRITICAL_CHANCE: f64 = 0.05;
    pub const CRITICAL_STAGGER: f32 = 0.06;
    pub const CRITICAL_FLASH_DURATION: f32 = 0.4;

    /// Bomb chance per batch: min(BASE + wave * PER_WAVE, MAX)
    pub const BOMB_CHANCE_BASE: f64 = 0.05;
    pub const BOMB_CHANCE_PER_WAVE: f64 = 0.02;
    pub const BOMB_CHANCE_MAX: f64 = 0.25;

    /// Special fruit gating
    pub const SPECIAL_MIN_WAVE: u32 = 2;
    pub const SPECIAL_CHANCE: f64 = 0.08;
    /// Guaranteed special after this many batches without one
    pub const SPECIAL_GUARANTEE_BATCHES: u32 = 12;

    /// Launch tuning
    pub const LAUNCH_SPEED_BASE: f32 = 540.0;
    pub const LAUNCH_SPEED_PER_WAVE: f32 = 12.0;
    pub const LAUNCH_SPEED_JITTER: f32 = 60.0;
    /// Fraction of horizontal distance-to-center converted to drift velocity
    pub const CENTER_DRIFT: f32 = 0.45;
    pub const DRIFT_JITTER: f32 = 40.0;

    /// Combo streak window (seconds between consecutive slices)
    pub const COMBO_WINDOW: f64 = 0.8;
    /// Score multiplier cap
    pub const MAX_MULTIPLIER: u32 = 8;

    /// Enlarged hitbox for fruits and specials (bombs use exact radius)
    pub const FRUIT_HITBOX_SCALE: f32 = 1.15;

    /// Sliced half lifetime (seconds)
    pub const HALF_TTL: f32 = 2.0;
    /// Sideways push given to sliced halves
    pub const HALF_SPLIT_SPEED: f32 = 160.0;

    /// Power-up effect tuning
    pub const EFFECT_DURATION: f32 = 5.0;
    pub const FREEZE_TIME_SCALE: f32 = 0.4;
    pub const FRENZY_TIME_SCALE: f32 = 0.5;
    pub const FRENZY_BURST_COUNT: u32 = 8;
    pub const FRENZY_BURST_STAGGER: f32 = 0.15;
    /// Flat bonus for slicing any special fruit
    pub const SPECIAL_BONUS: u64 = 50;

    /// Wave banner display time
    pub const WAVE_BANNER_DURATION: f32 = 1.5;
    /// Bomb flash display time
    pub const BOMB_FLASH_DURATION: f32 = 0.5;

    /// Trail buffer capacity (points)
    pub const TRAIL_CAPACITY: usize = 24;
    /// Points considered by the collision resolver (newest-last)
    pub const TRAIL_WINDOW: usize = 5;
    /// Pointer speed above this counts as an active swipe (px/s)
    pub const SWIPE_SPEED_THRESHOLD: f32 = 900.0;
    /// A trail whose newest point is older than this is stale: the pointer
    /// stopped or tracking was lost, so the blade is inert (seconds)
    pub const TRAIL_STALE_AGE: f64 = 0.1;

    /// Starting lives
    pub const START_LIVES: u8 = 3;
    /// Particle cap keeps the cosmetic load bounded
    pub const MAX_PARTICLES: usize = 256;
}
