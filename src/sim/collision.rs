//! Swipe-segment vs. entity collision detection and slice resolution
//!
//! The blade is the polyline through the newest trail points. Each segment
//! is tested against every live entity with the standard quadratic
//! line/circle intersection; hits resolve immediately and independently, so
//! a single swipe can chain several slices in one tick (the combo basis).

use glam::Vec2;

use super::state::{
    Body, Bomb, EXPLOSION_PALETTE, Fruit, GameEvent, GamePhase, GameState, Particle, SPECIAL_PALETTE,
    ScorePopup, SlicedHalf, Special,
};
use crate::consts::*;

/// Parametric intersection of segment a->b with a circle.
///
/// Solves |a + t(b-a) - center|² = radius² and returns the smallest root in
/// [0, 1], or None when the segment never crosses the circle boundary.
pub fn segment_circle_hit(a: Vec2, b: Vec2, center: Vec2, radius: f32) -> Option<f32> {
    let d = b - a;
    let f = a - center;

    let qa = d.dot(d);
    if qa <= f32::EPSILON {
        // Degenerate segment: treat as a point test
        return (f.length_squared() <= radius * radius).then_some(0.0);
    }

    let qb = 2.0 * f.dot(d);
    let qc = f.dot(f) - radius * radius;
    let disc = qb * qb - 4.0 * qa * qc;
    if disc < 0.0 {
        return None;
    }

    let sqrt_disc = disc.sqrt();
    let t1 = (-qb - sqrt_disc) / (2.0 * qa);
    let t2 = (-qb + sqrt_disc) / (2.0 * qa);
    if (0.0..=1.0).contains(&t1) {
        Some(t1)
    } else if (0.0..=1.0).contains(&t2) {
        Some(t2)
    } else {
        None
    }
}

/// Run slice detection for this tick.
///
/// No work happens unless the pointer is actively swiping and at least two
/// trail points exist. Per segment the check order is fruits, then specials,
/// then bombs; bombs are skipped entirely while immunity is active, and a
/// bomb hit ends the run without suppressing fruit slices already resolved
/// on the same segment.
pub fn resolve_slices(state: &mut GameState) {
    if state.phase != GamePhase::Playing || !state.trail.is_swiping(state.time) {
        return;
    }

    let window = state.trail.window();
    if window.len() < 2 {
        return;
    }
    let segments: Vec<(Vec2, Vec2)> = window
        .windows(2)
        .map(|pair| (pair[0].pos, pair[1].pos))
        .collect();

    for (a, b) in segments {
        slice_fruits(state, a, b);
        slice_specials(state, a, b);
        if !state.bomb_immune() && slice_bombs(state, a, b) {
            return; // run ended
        }
        if state.phase != GamePhase::Playing {
            return;
        }
    }
}

fn slice_fruits(state: &mut GameState, a: Vec2, b: Vec2) {
    let mut i = 0;
    while i < state.fruits.len() {
        let hit = {
            let fruit = &state.fruits[i];
            segment_circle_hit(a, b, fruit.body.pos, fruit.hitbox_radius()).is_some()
        };
        if hit {
            let fruit = state.fruits.remove(i);
            let swipe_angle = (b.y - a.y).atan2(b.x - a.x);
            slice_fruit(state, fruit, swipe_angle);
        } else {
            i += 1;
        }
    }
}

/// Resolve one fruit slice: combo/score, halves, juice, popup, event
fn slice_fruit(state: &mut GameState, fruit: Fruit, swipe_angle: f32) {
    let (points, combo) = state.award_slice(fruit.kind.points());

    state.events.push(GameEvent::Sliced {
        kind: fruit.kind,
        pos: fruit.body.pos,
        combo,
    });

    spawn_halves(state, &fruit, swipe_angle);
    spawn_juice(state, fruit.body.pos, fruit.kind.palette(), 10);
    state.popups.push(ScorePopup {
        pos: fruit.body.pos,
        points,
        combo: combo >= 2,
        life: ScorePopup::TTL,
    });
}

/// Two halves split perpendicular to the local swipe direction, damped and
/// with opposite spins
fn spawn_halves(state: &mut GameState, fruit: &Fruit, swipe_angle: f32) {
    let perp = Vec2::new(-swipe_angle.sin(), swipe_angle.cos());
    for sign in [-1.0f32, 1.0] {
        let vel = Vec2::new(fruit.body.vel.x * 0.5, fruit.body.vel.y * 0.3)
            + perp * sign * HALF_SPLIT_SPEED;
        state.halves.push(SlicedHalf {
            kind: fruit.kind,
            body: Body {
                pos: fruit.body.pos,
                vel,
                rot: fruit.body.rot,
                rot_vel: sign * 6.0,
            },
            ttl: HALF_TTL,
        });
    }
}

fn slice_specials(state: &mut GameState, a: Vec2, b: Vec2) {
    let mut i = 0;
    while i < state.specials.len() {
        let hit = {
            let special = &state.specials[i];
            segment_circle_hit(a, b, special.body.pos, special.hitbox_radius()).is_some()
        };
        if hit {
            let special = state.specials.remove(i);
            activate_special(state, special);
        } else {
            i += 1;
        }
    }
}

/// Flat bonus score plus the timed global effect; frenzy additionally
/// queues a bonus fruit burst and suppresses bomb spawns
fn activate_special(state: &mut GameState, special: Special) {
    state.add_score(SPECIAL_BONUS);
    state.events.push(GameEvent::SpecialActivated {
        kind: special.kind,
        pos: special.body.pos,
    });
    state.popups.push(ScorePopup {
        pos: special.body.pos,
        points: SPECIAL_BONUS,
        combo: false,
        life: ScorePopup::TTL,
    });
    spawn_juice(state, special.body.pos, SPECIAL_PALETTE, 14);

    state.effect = Some(super::state::ActiveEffect {
        kind: special.kind,
        remaining: EFFECT_DURATION,
    });
    if special.kind.bomb_immunity() {
        state.bomb_suppress = EFFECT_DURATION;
        super::spawner::queue_frenzy_burst(state);
    }
}

/// Returns true when a bomb was sliced (run over)
fn slice_bombs(state: &mut GameState, a: Vec2, b: Vec2) -> bool {
    let hit = state
        .bombs
        .iter()
        .position(|bomb| segment_circle_hit(a, b, bomb.body.pos, bomb.hitbox_radius()).is_some());

    let Some(idx) = hit else { return false };
    let bomb: Bomb = state.bombs.remove(idx);

    state.events.push(GameEvent::BombHit {
        pos: bomb.body.pos,
    });
    state.bomb_flash = BOMB_FLASH_DURATION;
    spawn_juice(state, bomb.body.pos, EXPLOSION_PALETTE, 24);
    state.stats.lives = 0;
    state.end_run();
    true
}

/// Cosmetic burst of juice/spark particles around a point
fn spawn_juice(state: &mut GameState, pos: Vec2, color: u32, count: u32) {
    use rand::Rng;
    for _ in 0..count {
        let angle = state.rng.random_range(0.0..std::f32::consts::TAU);
        let speed = state.rng.random_range(60.0..240.0);
        let size = state.rng.random_range(2.0..6.0);
        let life = state.rng.random_range(0.4..0.9);
        state.push_particle(Particle {
            pos,
            vel: Vec2::new(angle.cos(), angle.sin()) * speed,
            color,
            size,
            life,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::state::{FruitKind, SpecialKind};
    use proptest::prelude::*;

    fn playing_state() -> GameState {
        let mut s = GameState::new(42, Vec2::new(VIEW_WIDTH, VIEW_HEIGHT), 0);
        s.start_run(42);
        s
    }

    fn fruit_at(state: &mut GameState, kind: FruitKind, pos: Vec2) {
        let id = state.next_entity_id();
        state.fruits.push(Fruit {
            id,
            kind,
            body: Body {
                pos,
                vel: Vec2::ZERO,
                rot: 0.0,
                rot_vel: 0.0,
            },
        });
    }

    fn bomb_at(state: &mut GameState, pos: Vec2) {
        let id = state.next_entity_id();
        state.bombs.push(Bomb {
            id,
            body: Body {
                pos,
                vel: Vec2::ZERO,
                rot: 0.0,
                rot_vel: 0.0,
            },
        });
    }

    /// Fast horizontal swipe through y=100 from x=0 to x=400
    fn swipe(state: &mut GameState) {
        state.trail.clear();
        state.trail.push(Vec2::new(0.0, 100.0), 0.00);
        state.trail.push(Vec2::new(200.0, 100.0), 0.01);
        state.trail.push(Vec2::new(400.0, 100.0), 0.02);
    }

    #[test]
    fn hit_triggers_at_enlarged_boundary_not_beyond() {
        let r = FruitKind::Apple.radius() * FRUIT_HITBOX_SCALE;

        // Segment passing just inside the hitbox boundary
        let just_inside = segment_circle_hit(
            Vec2::new(-100.0, r - 0.5),
            Vec2::new(100.0, r - 0.5),
            Vec2::ZERO,
            r,
        );
        assert!(just_inside.is_some());

        // And just beyond it
        let just_outside = segment_circle_hit(
            Vec2::new(-100.0, r + 0.5),
            Vec2::new(100.0, r + 0.5),
            Vec2::ZERO,
            r,
        );
        assert!(just_outside.is_none());
    }

    #[test]
    fn slicing_a_fruit_spawns_two_halves_and_scores() {
        let mut s = playing_state();
        fruit_at(&mut s, FruitKind::Watermelon, Vec2::new(200.0, 100.0));
        swipe(&mut s);
        resolve_slices(&mut s);

        assert!(s.fruits.is_empty());
        assert_eq!(s.halves.len(), 2);
        assert_eq!(s.stats.score, FruitKind::Watermelon.points());
        assert_eq!(s.stats.fruits_sliced, 1);
        assert_eq!(s.popups.len(), 1);
        assert!(s
            .events
            .iter()
            .any(|e| matches!(e, GameEvent::Sliced { combo: 1, .. })));

        // Halves move apart and spin opposite ways
        let (h0, h1) = (&s.halves[0], &s.halves[1]);
        assert!(h0.body.rot_vel * h1.body.rot_vel < 0.0);
        assert!((h0.body.vel - h1.body.vel).length() > 1.0);
    }

    #[test]
    fn one_swipe_chains_multiple_slices() {
        let mut s = playing_state();
        fruit_at(&mut s, FruitKind::Apple, Vec2::new(100.0, 100.0));
        fruit_at(&mut s, FruitKind::Apple, Vec2::new(300.0, 100.0));
        swipe(&mut s);
        resolve_slices(&mut s);

        assert!(s.fruits.is_empty());
        assert_eq!(s.stats.combo, 2);
        // 10 x1 + 10 x2
        assert_eq!(s.stats.score, 30);
    }

    #[test]
    fn no_swipe_means_no_collisions() {
        let mut s = playing_state();
        fruit_at(&mut s, FruitKind::Apple, Vec2::new(200.0, 100.0));
        // Slow trail: under the swipe threshold
        s.trail.push(Vec2::new(0.0, 100.0), 0.0);
        s.trail.push(Vec2::new(400.0, 100.0), 10.0);
        resolve_slices(&mut s);
        assert_eq!(s.fruits.len(), 1);
    }

    #[test]
    fn bomb_slice_zeroes_lives_and_ends_run() {
        let mut s = playing_state();
        s.stats.lives = 3;
        bomb_at(&mut s, Vec2::new(200.0, 100.0));
        swipe(&mut s);
        resolve_slices(&mut s);

        assert_eq!(s.stats.lives, 0);
        assert_eq!(s.phase, GamePhase::GameOver);
        assert!(s.events.iter().any(|e| matches!(e, GameEvent::BombHit { .. })));
        assert!(s.events.iter().any(|e| matches!(e, GameEvent::GameOver { .. })));
    }

    #[test]
    fn fruit_on_same_segment_still_scores_when_bomb_ends_run() {
        let mut s = playing_state();
        fruit_at(&mut s, FruitKind::Apple, Vec2::new(100.0, 100.0));
        bomb_at(&mut s, Vec2::new(300.0, 100.0));
        swipe(&mut s);
        resolve_slices(&mut s);

        assert_eq!(s.stats.score, FruitKind::Apple.points());
        assert_eq!(s.phase, GamePhase::GameOver);
    }

    #[test]
    fn frenzy_immunity_skips_bombs() {
        let mut s = playing_state();
        s.effect = Some(super::super::state::ActiveEffect {
            kind: SpecialKind::Frenzy,
            remaining: 3.0,
        });
        bomb_at(&mut s, Vec2::new(200.0, 100.0));
        swipe(&mut s);
        resolve_slices(&mut s);

        assert_eq!(s.phase, GamePhase::Playing);
        assert_eq!(s.bombs.len(), 1);
    }

    #[test]
    fn slicing_freeze_special_activates_slow_motion() {
        let mut s = playing_state();
        let id = s.next_entity_id();
        s.specials.push(Special {
            id,
            kind: SpecialKind::Freeze,
            body: Body {
                pos: Vec2::new(200.0, 100.0),
                vel: Vec2::ZERO,
                rot: 0.0,
                rot_vel: 0.0,
            },
        });
        swipe(&mut s);
        resolve_slices(&mut s);

        assert!(s.specials.is_empty());
        assert_eq!(s.stats.score, SPECIAL_BONUS);
        assert!((s.time_scale() - FREEZE_TIME_SCALE).abs() < f32::EPSILON);
        assert!(!s.bomb_immune());
        // Activation sparkles use their own palette, not a fruit's
        assert!(s.particles.iter().all(|p| p.color == SPECIAL_PALETTE));
    }

    #[test]
    fn slicing_frenzy_queues_bonus_burst_and_immunity() {
        let mut s = playing_state();
        let id = s.next_entity_id();
        s.specials.push(Special {
            id,
            kind: SpecialKind::Frenzy,
            body: Body {
                pos: Vec2::new(200.0, 100.0),
                vel: Vec2::ZERO,
                rot: 0.0,
                rot_vel: 0.0,
            },
        });
        swipe(&mut s);
        resolve_slices(&mut s);

        assert!(s.bomb_immune());
        assert!(s.bomb_suppress > 0.0);
        assert_eq!(s.spawn_queue.len(), FRENZY_BURST_COUNT as usize);
    }

    proptest! {
        /// Any horizontal segment whose closest approach is inside the
        /// radius must report a hit with a root in [0, 1]
        #[test]
        fn crossing_segments_always_hit(
            offset in -0.99f32..0.99,
            radius in 5.0f32..60.0,
            cx in -100.0f32..100.0,
            cy in -100.0f32..100.0,
        ) {
            let center = Vec2::new(cx, cy);
            let y = cy + offset * radius;
            let a = Vec2::new(cx - radius * 3.0, y);
            let b = Vec2::new(cx + radius * 3.0, y);
            let t = segment_circle_hit(a, b, center, radius);
            prop_assert!(t.is_some());
            let t = t.unwrap();
            prop_assert!((0.0..=1.0).contains(&t));
        }

        /// Segments fully outside the circle never hit
        #[test]
        fn distant_segments_never_hit(
            radius in 5.0f32..60.0,
            gap in 1.0f32..50.0,
        ) {
            let center = Vec2::ZERO;
            let y = radius + gap;
            let a = Vec2::new(-200.0, y);
            let b = Vec2::new(200.0, y);
            prop_assert!(segment_circle_hit(a, b, center, radius).is_none());
        }
    }
}
