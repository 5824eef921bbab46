//! Wave-driven entity spawning
//!
//! Batches are decided when the wave-dependent interval elapses; individual
//! throws inside a batch are staggered through the scheduled-spawn queue on
//! `GameState` rather than host timers, so a reset cancels them all.

use glam::Vec2;
use rand::Rng;

use super::state::{
    Body, Bomb, Fruit, FruitKind, GameEvent, GameState, ScheduledSpawn, SpawnAction, Special,
    SpecialKind,
};
use crate::consts::*;

/// Seconds between batches at the given wave, floored at the minimum
pub fn spawn_interval(wave: u32) -> f32 {
    (BASE_SPAWN_INTERVAL - wave as f32 * SPAWN_INTERVAL_DECAY).max(MIN_SPAWN_INTERVAL)
}

/// Per-tick spawner work: fire due scheduled throws, then decide whether a
/// new batch is owed
pub fn update(state: &mut GameState) {
    fire_due_spawns(state);

    if state.time - state.last_batch_time >= spawn_interval(state.wave) as f64 {
        schedule_batch(state);
    }
}

/// Recompute the difficulty tier from total slices; raises the wave banner
/// and an event when it advances
pub fn update_wave(state: &mut GameState) {
    let wave = state.stats.fruits_sliced / 10 + 1;
    if wave > state.wave {
        state.wave = wave;
        state.wave_banner = WAVE_BANNER_DURATION;
        state.events.push(GameEvent::WaveStarted { wave });
    }
}

fn fire_due_spawns(state: &mut GameState) {
    let now = state.time;
    let mut due: Vec<SpawnAction> = Vec::new();
    state.spawn_queue.retain(|entry| {
        if entry.fire_time <= now {
            due.push(entry.action);
            false
        } else {
            true
        }
    });
    for action in due {
        match action {
            SpawnAction::Fruit => spawn_fruit(state),
            SpawnAction::Bomb => spawn_bomb(state),
            SpawnAction::Special(kind) => spawn_special(state, kind),
        }
    }
}

/// Decide one batch: a rare critical cluster, or 1..=min(3, wave) fruits
/// with independent bomb and special rolls
fn schedule_batch(state: &mut GameState) {
    state.last_batch_time = state.time;
    state.batches_since_special += 1;

    if state.rng.random_bool(CRITICAL_CHANCE) {
        let count = state.rng.random_range(4..=5u32);
        for i in 0..count {
            schedule(state, i as f32 * CRITICAL_STAGGER, SpawnAction::Fruit);
        }
        state.critical_flash = CRITICAL_FLASH_DURATION;
        state.events.push(GameEvent::CriticalThrow);
    } else {
        let max_count = state.wave.min(3).max(1);
        let count = state.rng.random_range(1..=max_count);
        for i in 0..count {
            schedule(state, i as f32 * BATCH_STAGGER, SpawnAction::Fruit);
        }

        // At most one bomb per batch, never during a frenzy burst
        if state.bomb_suppress <= 0.0 {
            let chance =
                (BOMB_CHANCE_BASE + state.wave as f64 * BOMB_CHANCE_PER_WAVE).min(BOMB_CHANCE_MAX);
            if state.rng.random_bool(chance) {
                schedule(state, count as f32 * BATCH_STAGGER, SpawnAction::Bomb);
            }
        }
    }

    // Special roll: probability from a minimum wave, or forced by the
    // guarantee counter
    if state.wave >= SPECIAL_MIN_WAVE {
        let forced = state.batches_since_special >= SPECIAL_GUARANTEE_BATCHES;
        if forced || state.rng.random_bool(SPECIAL_CHANCE) {
            let kind = if state.rng.random_bool(0.5) {
                SpecialKind::Frenzy
            } else {
                SpecialKind::Freeze
            };
            schedule(state, 0.0, SpawnAction::Special(kind));
            state.batches_since_special = 0;
        }
    }
}

/// Queue the frenzy bonus burst: extra fruits in rapid succession
pub fn queue_frenzy_burst(state: &mut GameState) {
    for i in 0..FRENZY_BURST_COUNT {
        schedule(state, i as f32 * FRENZY_BURST_STAGGER, SpawnAction::Fruit);
    }
}

fn schedule(state: &mut GameState, delay: f32, action: SpawnAction) {
    state.spawn_queue.push(ScheduledSpawn {
        fire_time: state.time + delay as f64,
        action,
    });
}

/// Launch kinematics shared by every thrown entity: random x inside the
/// margins, horizontal drift biased toward screen center, upward velocity
/// growing slightly with wave, randomized spin
fn launch_body(state: &mut GameState) -> Body {
    let x = state
        .rng
        .random_range(SPAWN_MARGIN..state.bounds.x - SPAWN_MARGIN);
    let drift = (state.bounds.x / 2.0 - x) * CENTER_DRIFT
        + state.rng.random_range(-DRIFT_JITTER..DRIFT_JITTER);
    let speed = LAUNCH_SPEED_BASE
        + state.wave as f32 * LAUNCH_SPEED_PER_WAVE
        + state
            .rng
            .random_range(-LAUNCH_SPEED_JITTER..LAUNCH_SPEED_JITTER);

    Body {
        pos: Vec2::new(x, state.bounds.y + 20.0),
        vel: Vec2::new(drift, -speed),
        rot: state.rng.random_range(0.0..std::f32::consts::TAU),
        rot_vel: state.rng.random_range(-4.0..4.0),
    }
}

fn spawn_fruit(state: &mut GameState) {
    let kind = FruitKind::ALL[state.rng.random_range(0..FruitKind::ALL.len())];
    let body = launch_body(state);
    let id = state.next_entity_id();
    state.fruits.push(Fruit { id, kind, body });
}

fn spawn_bomb(state: &mut GameState) {
    let body = launch_body(state);
    let id = state.next_entity_id();
    state.bombs.push(Bomb { id, body });
}

fn spawn_special(state: &mut GameState, kind: SpecialKind) {
    let body = launch_body(state);
    let id = state.next_entity_id();
    state.specials.push(Special { id, kind, body });
}
