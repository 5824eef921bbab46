//! Game state and core simulation types
//!
//! Everything the simulation mutates lives on `GameState`; the host only
//! reads entity collections and scalar flags for rendering, and drains the
//! per-tick event queue for audio/HUD reactions.

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;

use super::trail::Trail;
use crate::consts::*;

/// Current phase of gameplay
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GamePhase {
    /// Title/menu screen, no simulation
    Menu,
    /// Active gameplay
    Playing,
    /// Run ended (bomb or no lives left)
    GameOver,
}

/// The six throwable fruit kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FruitKind {
    Apple,
    Banana,
    Orange,
    Watermelon,
    Strawberry,
    Pineapple,
}

impl FruitKind {
    pub const ALL: [FruitKind; 6] = [
        FruitKind::Apple,
        FruitKind::Banana,
        FruitKind::Orange,
        FruitKind::Watermelon,
        FruitKind::Strawberry,
        FruitKind::Pineapple,
    ];

    /// Base point value before the combo multiplier
    pub fn points(self) -> u64 {
        match self {
            FruitKind::Apple => 10,
            FruitKind::Orange => 10,
            FruitKind::Banana => 15,
            FruitKind::Watermelon => 20,
            FruitKind::Strawberry => 25,
            FruitKind::Pineapple => 30,
        }
    }

    /// Visual radius; collisions use `hitbox_radius`
    pub fn radius(self) -> f32 {
        match self {
            FruitKind::Apple => 25.0,
            FruitKind::Orange => 26.0,
            FruitKind::Banana => 28.0,
            FruitKind::Watermelon => 40.0,
            FruitKind::Strawberry => 20.0,
            FruitKind::Pineapple => 36.0,
        }
    }

    /// Juice particle palette index for this kind
    pub fn palette(self) -> u32 {
        match self {
            FruitKind::Apple => 0,
            FruitKind::Banana => 1,
            FruitKind::Orange => 2,
            FruitKind::Watermelon => 3,
            FruitKind::Strawberry => 4,
            FruitKind::Pineapple => 5,
        }
    }
}

/// Special fruit kinds and the timed effect each grants
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpecialKind {
    /// Slow motion plus a bonus fruit burst with bombs suppressed
    Frenzy,
    /// Slow motion only
    Freeze,
}

impl SpecialKind {
    pub fn time_scale(self) -> f32 {
        match self {
            SpecialKind::Frenzy => FRENZY_TIME_SCALE,
            SpecialKind::Freeze => FREEZE_TIME_SCALE,
        }
    }

    /// Frenzy also grants bomb immunity for its duration
    pub fn bomb_immunity(self) -> bool {
        matches!(self, SpecialKind::Frenzy)
    }
}

/// Shared kinematic fields for thrown entities
#[derive(Debug, Clone, Copy)]
pub struct Body {
    pub pos: Vec2,
    pub vel: Vec2,
    pub rot: f32,
    pub rot_vel: f32,
}

impl Body {
    /// Advance one step under gravity at the given time scale
    pub fn step(&mut self, dt: f32, time_scale: f32, gravity: f32) {
        let s = dt * time_scale;
        self.pos += self.vel * s;
        self.vel.y += gravity * s;
        self.rot += self.rot_vel * s;
    }
}

/// A throwable fruit
#[derive(Debug, Clone)]
pub struct Fruit {
    pub id: u32,
    pub kind: FruitKind,
    pub body: Body,
}

impl Fruit {
    /// Enlarged collision radius for forgiving slice detection
    pub fn hitbox_radius(&self) -> f32 {
        self.kind.radius() * FRUIT_HITBOX_SCALE
    }
}

/// A bomb: instant game over when sliced without immunity
#[derive(Debug, Clone)]
pub struct Bomb {
    pub id: u32,
    pub body: Body,
}

impl Bomb {
    pub const RADIUS: f32 = 30.0;

    /// Bombs collide at exact radius, no enlargement
    pub fn hitbox_radius(&self) -> f32 {
        Self::RADIUS
    }
}

/// A special fruit carrying a timed power-up effect
#[derive(Debug, Clone)]
pub struct Special {
    pub id: u32,
    pub kind: SpecialKind,
    pub body: Body,
}

impl Special {
    pub const RADIUS: f32 = 28.0;

    pub fn hitbox_radius(&self) -> f32 {
        Self::RADIUS * FRUIT_HITBOX_SCALE
    }
}

/// One of the two halves of a sliced fruit; decorative, expires by TTL
#[derive(Debug, Clone)]
pub struct SlicedHalf {
    pub kind: FruitKind,
    pub body: Body,
    /// Seconds of life remaining
    pub ttl: f32,
}

/// Cosmetic juice/spark particle; never collides
#[derive(Debug, Clone)]
pub struct Particle {
    pub pos: Vec2,
    pub vel: Vec2,
    /// Palette index (fruit kinds 0-5, explosion 6, special 7)
    pub color: u32,
    pub size: f32,
    /// Seconds of life remaining
    pub life: f32,
}

/// Explosion palette index for bomb particles
pub const EXPLOSION_PALETTE: u32 = 6;
/// Sparkle palette index for special-fruit activation particles
pub const SPECIAL_PALETTE: u32 = 7;

/// Floating score text; cosmetic
#[derive(Debug, Clone)]
pub struct ScorePopup {
    pub pos: Vec2,
    pub points: u64,
    /// Whether this slice extended a combo (>= 2)
    pub combo: bool,
    /// Seconds of life remaining
    pub life: f32,
}

impl ScorePopup {
    pub const TTL: f32 = 1.0;
}

/// Active timed power-up effect
#[derive(Debug, Clone, Copy)]
pub struct ActiveEffect {
    pub kind: SpecialKind,
    /// Seconds remaining
    pub remaining: f32,
}

/// Score, lives, combo - one instance per session, fully reset on restart
/// except for the persisted high score
#[derive(Debug, Clone)]
pub struct GameStats {
    pub score: u64,
    pub lives: u8,
    pub combo: u32,
    pub max_combo: u32,
    pub fruits_sliced: u32,
    /// Best score across games; survives resets
    pub high_score: u64,
    /// Sim-clock timestamp of the most recent slice
    pub last_slice_time: f64,
}

impl GameStats {
    pub fn new(high_score: u64) -> Self {
        Self {
            score: 0,
            lives: START_LIVES,
            combo: 0,
            max_combo: 0,
            fruits_sliced: 0,
            high_score,
            last_slice_time: f64::NEG_INFINITY,
        }
    }
}

/// Discrete notifications for the audio/HUD layer, at most one per cause
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GameEvent {
    /// A fruit was sliced; combo is the streak count after this slice
    Sliced {
        kind: FruitKind,
        pos: Vec2,
        combo: u32,
    },
    /// A special fruit was sliced and its effect activated
    SpecialActivated { kind: SpecialKind, pos: Vec2 },
    /// A bomb was sliced
    BombHit { pos: Vec2 },
    /// Fruits fell past the bottom unsliced this tick
    Missed { count: u32 },
    /// Difficulty tier advanced
    WaveStarted { wave: u32 },
    /// A critical throw batch was rolled
    CriticalThrow,
    /// The run ended
    GameOver { score: u64 },
    /// Score exceeded the stored best; host should persist now
    NewHighScore { score: u64 },
}

/// A spawn scheduled for a future sim-clock instant
///
/// Replaces fire-and-forget host timers: entries are drained against the
/// clock each tick and the whole queue is cleared on reset, so a staggered
/// throw can never leak into a fresh game.
#[derive(Debug, Clone, Copy)]
pub struct ScheduledSpawn {
    pub fire_time: f64,
    pub action: SpawnAction,
}

/// What a scheduled entry spawns when it fires
#[derive(Debug, Clone, Copy)]
pub enum SpawnAction {
    Fruit,
    Bomb,
    Special(SpecialKind),
}

/// Complete simulation state
#[derive(Debug, Clone)]
pub struct GameState {
    /// Run seed (RNG is reseeded from the host on restart)
    pub seed: u64,
    pub rng: Pcg32,
    pub phase: GamePhase,
    /// Sim clock in seconds, resets with each run
    pub time: f64,
    /// Logical viewport size
    pub bounds: Vec2,
    pub stats: GameStats,
    /// Difficulty tier: fruits_sliced / 10 + 1
    pub wave: u32,
    pub fruits: Vec<Fruit>,
    pub bombs: Vec<Bomb>,
    pub specials: Vec<Special>,
    pub halves: Vec<SlicedHalf>,
    pub particles: Vec<Particle>,
    pub popups: Vec<ScorePopup>,
    pub effect: Option<ActiveEffect>,
    /// Pending staggered spawns, drained each tick
    pub spawn_queue: Vec<ScheduledSpawn>,
    /// Clock value when the last batch was emitted
    pub last_batch_time: f64,
    /// Batches since a special spawned, for the guarantee counter
    pub batches_since_special: u32,
    /// While > 0, bombs are suppressed from spawn rolls (frenzy burst)
    pub bomb_suppress: f32,
    /// Visual flash timers, decayed per tick
    pub critical_flash: f32,
    pub wave_banner: f32,
    pub bomb_flash: f32,
    /// Events raised this tick, drained by the host
    pub events: Vec<GameEvent>,
    /// Pointer trail snapshot consumed by the collision resolver
    pub trail: Trail,
    next_id: u32,
}

impl GameState {
    pub fn new(seed: u64, bounds: Vec2, high_score: u64) -> Self {
        Self {
            seed,
            rng: Pcg32::seed_from_u64(seed),
            phase: GamePhase::Menu,
            time: 0.0,
            bounds,
            stats: GameStats::new(high_score),
            wave: 1,
            fruits: Vec::new(),
            bombs: Vec::new(),
            specials: Vec::new(),
            halves: Vec::new(),
            particles: Vec::new(),
            popups: Vec::new(),
            effect: None,
            spawn_queue: Vec::new(),
            last_batch_time: 0.0,
            batches_since_special: 0,
            bomb_suppress: 0.0,
            critical_flash: 0.0,
            wave_banner: 0.0,
            bomb_flash: 0.0,
            events: Vec::new(),
            trail: Trail::new(),
            next_id: 1,
        }
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Begin a fresh run: clear every live collection, pending spawn and
    /// timed effect, reset stats, keep only the high score
    pub fn start_run(&mut self, seed: u64) {
        let high_score = self.stats.high_score;
        self.seed = seed;
        self.rng = Pcg32::seed_from_u64(seed);
        self.time = 0.0;
        self.stats = GameStats::new(high_score);
        self.wave = 1;
        self.fruits.clear();
        self.bombs.clear();
        self.specials.clear();
        self.halves.clear();
        self.particles.clear();
        self.popups.clear();
        self.effect = None;
        self.spawn_queue.clear();
        self.last_batch_time = 0.0;
        self.batches_since_special = 0;
        self.bomb_suppress = 0.0;
        self.critical_flash = 0.0;
        self.wave_banner = WAVE_BANNER_DURATION;
        self.bomb_flash = 0.0;
        self.events.clear();
        self.trail.clear();
        self.phase = GamePhase::Playing;
    }

    /// Leave for the menu without starting a new run
    pub fn to_menu(&mut self) {
        self.fruits.clear();
        self.bombs.clear();
        self.specials.clear();
        self.halves.clear();
        self.particles.clear();
        self.popups.clear();
        self.effect = None;
        self.spawn_queue.clear();
        self.events.clear();
        self.trail.clear();
        self.phase = GamePhase::Menu;
    }

    /// Global time-scale from the active power-up effect
    pub fn time_scale(&self) -> f32 {
        self.effect.map(|e| e.kind.time_scale()).unwrap_or(1.0)
    }

    /// Whether bomb slices are currently ignored
    pub fn bomb_immune(&self) -> bool {
        self.effect.map(|e| e.kind.bomb_immunity()).unwrap_or(false)
    }

    /// Award points for one sliced fruit, advancing the combo streak.
    /// Returns (points awarded, combo count after this slice).
    pub fn award_slice(&mut self, base_points: u64) -> (u64, u32) {
        let within_window = self.time - self.stats.last_slice_time <= COMBO_WINDOW;
        self.stats.combo = if within_window { self.stats.combo + 1 } else { 1 };
        self.stats.last_slice_time = self.time;
        self.stats.max_combo = self.stats.max_combo.max(self.stats.combo);
        self.stats.fruits_sliced += 1;

        let multiplier = self.stats.combo.min(MAX_MULTIPLIER) as u64;
        let points = base_points * multiplier;
        self.add_score(points);
        (points, self.stats.combo)
    }

    /// Add points and keep the high score write-through
    pub fn add_score(&mut self, points: u64) {
        self.stats.score += points;
        if self.stats.score > self.stats.high_score {
            self.stats.high_score = self.stats.score;
            self.events.push(GameEvent::NewHighScore {
                score: self.stats.score,
            });
        }
    }

    /// Transition to game over exactly once
    pub fn end_run(&mut self) {
        if self.phase == GamePhase::GameOver {
            return;
        }
        self.phase = GamePhase::GameOver;
        self.spawn_queue.clear();
        self.effect = None;
        self.events.push(GameEvent::GameOver {
            score: self.stats.score,
        });
    }

    /// Push a particle, evicting the oldest when at capacity
    pub fn push_particle(&mut self, particle: Particle) {
        if self.particles.len() >= MAX_PARTICLES {
            self.particles.remove(0);
        }
        self.particles.push(particle);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state() -> GameState {
        GameState::new(7, Vec2::new(VIEW_WIDTH, VIEW_HEIGHT), 0)
    }

    #[test]
    fn combo_increments_within_window_and_resets_after() {
        let mut s = state();
        s.start_run(7);

        s.time = 1.0;
        let (_, c1) = s.award_slice(10);
        s.time = 1.2;
        let (_, c2) = s.award_slice(10);
        s.time = 1.4;
        let (p3, c3) = s.award_slice(10);
        assert_eq!((c1, c2, c3), (1, 2, 3));
        assert_eq!(p3, 30); // base 10 x multiplier 3

        // Gap beyond the window resets the streak
        s.time = 1.4 + COMBO_WINDOW + 0.01;
        let (p4, c4) = s.award_slice(10);
        assert_eq!(c4, 1);
        assert_eq!(p4, 10);
    }

    #[test]
    fn multiplier_caps_at_eight() {
        let mut s = state();
        s.start_run(7);
        for i in 0..12u32 {
            s.time = i as f64 * 0.1;
            let (points, combo) = s.award_slice(10);
            assert_eq!(combo, i + 1);
            assert_eq!(points, 10 * (combo.min(MAX_MULTIPLIER) as u64));
        }
        assert_eq!(s.stats.max_combo, 12);
    }

    #[test]
    fn high_score_is_write_through_and_survives_restart() {
        let mut s = state();
        s.start_run(1);
        s.add_score(500);
        assert_eq!(s.stats.high_score, 500);
        assert!(s
            .events
            .iter()
            .any(|e| matches!(e, GameEvent::NewHighScore { score: 500 })));

        s.start_run(2);
        assert_eq!(s.stats.score, 0);
        assert_eq!(s.stats.high_score, 500);

        // A lower-scoring game never lowers the stored best
        s.add_score(100);
        assert_eq!(s.stats.high_score, 500);
    }

    #[test]
    fn restart_resets_stats_and_clears_collections() {
        let mut s = state();
        s.start_run(1);
        s.time = 3.0;
        s.award_slice(10);
        s.stats.lives = 1;
        s.spawn_queue.push(ScheduledSpawn {
            fire_time: 99.0,
            action: SpawnAction::Fruit,
        });
        let id = s.next_entity_id();
        s.fruits.push(Fruit {
            id,
            kind: FruitKind::Apple,
            body: Body {
                pos: Vec2::ZERO,
                vel: Vec2::ZERO,
                rot: 0.0,
                rot_vel: 0.0,
            },
        });

        s.start_run(2);
        assert_eq!(s.stats.lives, START_LIVES);
        assert_eq!(s.stats.score, 0);
        assert_eq!(s.stats.combo, 0);
        assert_eq!(s.stats.max_combo, 0);
        assert_eq!(s.stats.fruits_sliced, 0);
        assert_eq!(s.wave, 1);
        assert!(s.fruits.is_empty());
        assert!(s.spawn_queue.is_empty());
    }

    #[test]
    fn game_over_fires_once() {
        let mut s = state();
        s.start_run(1);
        s.end_run();
        s.end_run();
        let count = s
            .events
            .iter()
            .filter(|e| matches!(e, GameEvent::GameOver { .. }))
            .count();
        assert_eq!(count, 1);
        assert_eq!(s.phase, GamePhase::GameOver);
    }
}
