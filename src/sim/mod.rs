//! Host-independent game simulation
//!
//! All gameplay logic lives here. This module must stay pure:
//! - Seeded RNG only
//! - No rendering, audio or platform dependencies
//! - Outcomes reported as drainable events, never as side effects

pub mod collision;
pub mod spawner;
pub mod state;
pub mod tick;
pub mod trail;

pub use collision::{resolve_slices, segment_circle_hit};
pub use state::{
    ActiveEffect, Body, Bomb, Fruit, FruitKind, GameEvent, GamePhase, GameState, GameStats,
    Particle, ScorePopup, SlicedHalf, SpawnAction, Special, SpecialKind,
};
pub use tick::{TickInput, tick};
pub use trail::{Trail, TrailPoint};
