//! Per-step simulation orchestrator
//!
//! `tick` advances the whole game by one timestep: phase transitions, slice
//! collision, physics, culling and spawning. The host drives it from a
//! fixed-timestep accumulator by default, but any positive `dt` works.

use super::collision::resolve_slices;
use super::spawner;
use super::state::{GameEvent, GamePhase, GameState};
use crate::consts::*;

/// One-shot commands for a single tick. The pointer trail itself lives on
/// `GameState` and is appended by the input producers between ticks.
#[derive(Debug, Clone, Copy, Default)]
pub struct TickInput {
    /// Start a run from the menu
    pub start: bool,
    /// Start a fresh run from game over
    pub restart: bool,
    /// Return to the menu
    pub to_menu: bool,
    /// Seed for the run begun by start/restart
    pub seed: u64,
}

/// Advance the game state by one timestep
pub fn tick(state: &mut GameState, input: &TickInput, dt: f32) {
    match state.phase {
        GamePhase::Menu => {
            if input.start {
                state.start_run(input.seed);
                log::info!("run started, seed {}", input.seed);
            }
            return;
        }
        GamePhase::GameOver => {
            if input.restart {
                state.start_run(input.seed);
                log::info!("run restarted, seed {}", input.seed);
            } else if input.to_menu {
                state.to_menu();
            }
            return;
        }
        GamePhase::Playing => {}
    }

    if input.to_menu {
        state.to_menu();
        return;
    }

    state.time += dt as f64;
    decay_timers(state, dt);

    resolve_slices(state);
    spawner::update_wave(state);

    // A bomb slice ends the run mid-tick; nothing further moves
    if state.phase != GamePhase::Playing {
        return;
    }

    step_physics(state, dt);
    if state.phase != GamePhase::Playing {
        return;
    }

    spawner::update(state);
}

fn decay_timers(state: &mut GameState, dt: f32) {
    state.critical_flash = (state.critical_flash - dt).max(0.0);
    state.wave_banner = (state.wave_banner - dt).max(0.0);
    state.bomb_flash = (state.bomb_flash - dt).max(0.0);
    state.bomb_suppress = (state.bomb_suppress - dt).max(0.0);

    if let Some(effect) = &mut state.effect {
        effect.remaining -= dt;
        if effect.remaining <= 0.0 {
            state.effect = None;
        }
    }
}

/// Advance every live entity and cull what left the playfield.
///
/// Fruits crossing the kill line count as misses: lives drop once by the
/// number missed this tick (batched, so three simultaneous misses cannot
/// trigger three separate game-over transitions).
fn step_physics(state: &mut GameState, dt: f32) {
    let ts = state.time_scale();
    let kill_y = state.bounds.y + KILL_MARGIN;

    for fruit in &mut state.fruits {
        fruit.body.step(dt, ts, GRAVITY);
    }
    for bomb in &mut state.bombs {
        bomb.body.step(dt, ts, GRAVITY);
    }
    for special in &mut state.specials {
        special.body.step(dt, ts, GRAVITY);
    }
    for half in &mut state.halves {
        half.body.step(dt, ts, GRAVITY);
        half.ttl -= dt;
    }
    for particle in &mut state.particles {
        particle.pos += particle.vel * (dt * ts);
        particle.vel.y += GRAVITY * PARTICLE_GRAVITY_FACTOR * dt * ts;
        particle.life -= dt;
    }
    for popup in &mut state.popups {
        popup.pos.y -= 40.0 * dt * ts;
        popup.life -= dt;
    }

    // Unsliced fruits past the bottom are misses
    let before = state.fruits.len();
    state.fruits.retain(|f| f.body.pos.y <= kill_y);
    let missed = (before - state.fruits.len()) as u32;
    if missed > 0 {
        state.stats.lives = state.stats.lives.saturating_sub(missed.min(255) as u8);
        state.events.push(GameEvent::Missed { count: missed });
        if state.stats.lives == 0 {
            state.end_run();
        }
    }

    // Everything else despawns silently
    state.bombs.retain(|b| b.body.pos.y <= kill_y);
    state.specials.retain(|s| s.body.pos.y <= kill_y);
    state.halves.retain(|h| h.ttl > 0.0);
    state.particles.retain(|p| p.life > 0.0);
    state.popups.retain(|p| p.life > 0.0);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::state::{ActiveEffect, Body, Fruit, FruitKind, SpecialKind};
    use glam::Vec2;

    fn state() -> GameState {
        GameState::new(9, Vec2::new(VIEW_WIDTH, VIEW_HEIGHT), 0)
    }

    fn falling_fruit(s: &mut GameState, y: f32) {
        let id = s.next_entity_id();
        s.fruits.push(Fruit {
            id,
            kind: FruitKind::Apple,
            body: Body {
                pos: Vec2::new(400.0, y),
                vel: Vec2::new(0.0, 300.0),
                rot: 0.0,
                rot_vel: 0.0,
            },
        });
    }

    #[test]
    fn menu_phase_skips_simulation() {
        let mut s = state();
        tick(&mut s, &TickInput::default(), SIM_DT);
        assert_eq!(s.time, 0.0);
        assert!(s.fruits.is_empty());
        assert_eq!(s.phase, GamePhase::Menu);
    }

    #[test]
    fn start_input_begins_a_run() {
        let mut s = state();
        let input = TickInput {
            start: true,
            seed: 123,
            ..Default::default()
        };
        tick(&mut s, &input, SIM_DT);
        assert_eq!(s.phase, GamePhase::Playing);
    }

    #[test]
    fn three_simultaneous_misses_end_the_run_once() {
        let mut s = state();
        s.start_run(1);
        // All three already past the kill line after one step
        let y = s.bounds.y + KILL_MARGIN + 10.0;
        for _ in 0..3 {
            falling_fruit(&mut s, y);
        }

        tick(&mut s, &TickInput::default(), SIM_DT);

        assert_eq!(s.stats.lives, 0);
        assert_eq!(s.phase, GamePhase::GameOver);
        assert!(s
            .events
            .iter()
            .any(|e| matches!(e, GameEvent::Missed { count: 3 })));
        let game_overs = s
            .events
            .iter()
            .filter(|e| matches!(e, GameEvent::GameOver { .. }))
            .count();
        assert_eq!(game_overs, 1);
    }

    #[test]
    fn single_miss_costs_one_life() {
        let mut s = state();
        s.start_run(1);
        let y = s.bounds.y + KILL_MARGIN + 10.0;
        falling_fruit(&mut s, y);

        tick(&mut s, &TickInput::default(), SIM_DT);

        assert_eq!(s.stats.lives, START_LIVES - 1);
        assert_eq!(s.phase, GamePhase::Playing);
    }

    #[test]
    fn bombs_falling_off_screen_cost_nothing() {
        let mut s = state();
        s.start_run(1);
        let id = s.next_entity_id();
        s.bombs.push(crate::sim::state::Bomb {
            id,
            body: Body {
                pos: Vec2::new(400.0, s.bounds.y + KILL_MARGIN + 10.0),
                vel: Vec2::new(0.0, 300.0),
                rot: 0.0,
                rot_vel: 0.0,
            },
        });

        tick(&mut s, &TickInput::default(), SIM_DT);

        assert!(s.bombs.is_empty());
        assert_eq!(s.stats.lives, START_LIVES);
    }

    #[test]
    fn effect_expires_and_time_scale_returns_to_one() {
        let mut s = state();
        s.start_run(1);
        s.effect = Some(ActiveEffect {
            kind: SpecialKind::Freeze,
            remaining: 2.0 * SIM_DT,
        });
        assert!(s.time_scale() < 1.0);

        for _ in 0..3 {
            tick(&mut s, &TickInput::default(), SIM_DT);
        }
        assert!(s.effect.is_none());
        assert_eq!(s.time_scale(), 1.0);
    }

    #[test]
    fn slow_motion_scales_entity_motion() {
        let mut s = state();
        s.start_run(1);
        falling_fruit(&mut s, 100.0);
        let start_y = s.fruits[0].body.pos.y;
        s.effect = Some(ActiveEffect {
            kind: SpecialKind::Freeze,
            remaining: 10.0,
        });
        tick(&mut s, &TickInput::default(), SIM_DT);
        let slow_delta = s.fruits[0].body.pos.y - start_y;

        let mut fast = state();
        fast.start_run(1);
        falling_fruit(&mut fast, 100.0);
        tick(&mut fast, &TickInput::default(), SIM_DT);
        let full_delta = fast.fruits[0].body.pos.y - start_y;

        assert!(slow_delta < full_delta);
        assert!((slow_delta / full_delta - FREEZE_TIME_SCALE).abs() < 0.01);
    }

    #[test]
    fn slow_motion_scales_particle_motion_too() {
        let vel = Vec2::new(500.0, 0.0);
        let particle = crate::sim::state::Particle {
            pos: Vec2::new(100.0, 100.0),
            vel,
            color: 0,
            size: 3.0,
            life: 10.0,
        };

        let mut slow = state();
        slow.start_run(1);
        slow.particles.push(particle.clone());
        slow.effect = Some(ActiveEffect {
            kind: SpecialKind::Freeze,
            remaining: 10.0,
        });
        tick(&mut slow, &TickInput::default(), SIM_DT);
        let slow_dx = slow.particles[0].pos.x - 100.0;

        let mut full = state();
        full.start_run(1);
        full.particles.push(particle);
        tick(&mut full, &TickInput::default(), SIM_DT);
        let full_dx = full.particles[0].pos.x - 100.0;

        assert!(slow_dx < full_dx);
        assert!((slow_dx / full_dx - FREEZE_TIME_SCALE).abs() < 0.01);
    }

    #[test]
    fn halves_expire_by_ttl() {
        let mut s = state();
        s.start_run(1);
        s.halves.push(crate::sim::state::SlicedHalf {
            kind: FruitKind::Apple,
            body: Body {
                pos: Vec2::new(400.0, 100.0),
                vel: Vec2::ZERO,
                rot: 0.0,
                rot_vel: 0.0,
            },
            ttl: 2.0 * SIM_DT,
        });
        for _ in 0..3 {
            tick(&mut s, &TickInput::default(), SIM_DT);
        }
        assert!(s.halves.is_empty());
    }

    #[test]
    fn spawner_produces_entities_over_time() {
        let mut s = state();
        s.start_run(77);
        // Three sim-seconds is enough for at least one batch to land
        for _ in 0..(3.0 / SIM_DT) as u32 {
            tick(&mut s, &TickInput::default(), SIM_DT);
        }
        let total = s.fruits.len() + s.bombs.len() + s.specials.len() + s.spawn_queue.len();
        assert!(total > 0 || s.stats.lives < START_LIVES);
    }

    #[test]
    fn restart_from_game_over_clears_pending_spawns() {
        let mut s = state();
        s.start_run(1);
        s.spawn_queue.push(crate::sim::state::ScheduledSpawn {
            fire_time: 0.1,
            action: crate::sim::state::SpawnAction::Fruit,
        });
        s.stats.lives = 0;
        s.end_run();

        let input = TickInput {
            restart: true,
            seed: 2,
            ..Default::default()
        };
        tick(&mut s, &input, SIM_DT);
        assert_eq!(s.phase, GamePhase::Playing);
        assert!(s.spawn_queue.is_empty());

        // Nothing stale fires into the new run; the first real batch is
        // still a full interval away
        for _ in 0..5 {
            tick(&mut s, &TickInput::default(), SIM_DT);
        }
        assert!(s.fruits.is_empty());
    }

    #[test]
    fn to_menu_clears_live_entities() {
        let mut s = state();
        s.start_run(1);
        falling_fruit(&mut s, 100.0);
        let input = TickInput {
            to_menu: true,
            ..Default::default()
        };
        tick(&mut s, &input, SIM_DT);
        assert_eq!(s.phase, GamePhase::Menu);
        assert!(s.fruits.is_empty());
    }

    #[test]
    fn idle_blade_from_an_old_swipe_does_not_slice() {
        let mut s = state();
        s.start_run(1);
        falling_fruit(&mut s, 100.0);
        // A fast swipe recorded long ago; the pointer has been still since
        s.trail.push(Vec2::new(200.0, 100.0), 0.00);
        s.trail.push(Vec2::new(600.0, 100.0), 0.01);
        s.time = 100.0;

        tick(&mut s, &TickInput::default(), SIM_DT);

        assert_eq!(s.fruits.len(), 1);
        assert_eq!(s.stats.fruits_sliced, 0);
        assert!(s.halves.is_empty());
    }

    #[test]
    fn swipe_during_tick_slices_fruit() {
        let mut s = state();
        s.start_run(1);
        falling_fruit(&mut s, 100.0);
        s.trail.push(Vec2::new(200.0, 100.0), 0.00);
        s.trail.push(Vec2::new(600.0, 100.0), 0.01);

        tick(&mut s, &TickInput::default(), SIM_DT);

        assert!(s.fruits.is_empty());
        assert_eq!(s.stats.fruits_sliced, 1);
        assert_eq!(s.halves.len(), 2);
    }
}
