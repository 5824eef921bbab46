//! Audio system using Web Audio API
//!
//! Procedurally generated sound effects - no external files needed.
//! One effect per discrete game event; the host maps drained sim events
//! onto these.

use web_sys::{AudioContext, GainNode, OscillatorNode, OscillatorType};

/// Sound effect types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundEffect {
    /// A fruit was sliced
    Slice,
    /// A slice extended a combo (streak >= 2)
    Combo,
    /// A bomb was sliced
    Bomb,
    /// A fruit fell unsliced
    Miss,
    /// A special fruit activated its effect
    Special,
    /// A critical throw batch launched
    Critical,
    /// Difficulty tier advanced
    WaveUp,
    /// The run ended
    GameOver,
    /// New best score
    HighScore,
}

/// Audio manager for the game
pub struct AudioManager {
    ctx: Option<AudioContext>,
    volume: f32,
    muted: bool,
}

impl Default for AudioManager {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioManager {
    pub fn new() -> Self {
        // May fail outside a secure context
        let ctx = AudioContext::new().ok();
        if ctx.is_none() {
            log::warn!("failed to create AudioContext - audio disabled");
        }
        Self {
            ctx,
            volume: 0.8,
            muted: false,
        }
    }

    /// Resume audio context (required after user gesture)
    pub fn resume(&self) {
        if let Some(ctx) = &self.ctx {
            let _ = ctx.resume();
        }
    }

    /// Set combined volume (0.0 - 1.0)
    pub fn set_volume(&mut self, vol: f32) {
        self.volume = vol.clamp(0.0, 1.0);
    }

    /// Mute/unmute all audio
    pub fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
    }

    fn effective_volume(&self) -> f32 {
        if self.muted { 0.0 } else { self.volume }
    }

    /// Play a sound effect
    pub fn play(&self, effect: SoundEffect) {
        let vol = self.effective_volume();
        if vol <= 0.0 {
            return;
        }

        let Some(ctx) = &self.ctx else { return };

        // Browsers suspend the context until a user gesture
        if ctx.state() == web_sys::AudioContextState::Suspended {
            let _ = ctx.resume();
        }

        match effect {
            SoundEffect::Slice => self.play_slice(ctx, vol),
            SoundEffect::Combo => self.play_combo(ctx, vol),
            SoundEffect::Bomb => self.play_bomb(ctx, vol),
            SoundEffect::Miss => self.play_miss(ctx, vol),
            SoundEffect::Special => self.play_special(ctx, vol),
            SoundEffect::Critical => self.play_critical(ctx, vol),
            SoundEffect::WaveUp => self.play_wave_up(ctx, vol),
            SoundEffect::GameOver => self.play_game_over(ctx, vol),
            SoundEffect::HighScore => self.play_high_score(ctx, vol),
        }
    }

    // === Sound generators ===

    /// Create an oscillator with gain envelope
    fn create_osc(
        &self,
        ctx: &AudioContext,
        freq: f32,
        osc_type: OscillatorType,
    ) -> Option<(OscillatorNode, GainNode)> {
        let osc = ctx.create_oscillator().ok()?;
        let gain = ctx.create_gain().ok()?;

        osc.set_type(osc_type);
        osc.frequency().set_value(freq);
        osc.connect_with_audio_node(&gain).ok()?;
        gain.connect_with_audio_node(&ctx.destination()).ok()?;

        Some((osc, gain))
    }

    /// Slice - quick bright swish
    fn play_slice(&self, ctx: &AudioContext, vol: f32) {
        let Some((osc, gain)) = self.create_osc(ctx, 1200.0, OscillatorType::Sawtooth) else {
            return;
        };
        let t = ctx.current_time();

        gain.gain().set_value_at_time(vol * 0.3, t).ok();
        gain.gain()
            .exponential_ramp_to_value_at_time(0.01, t + 0.12)
            .ok();
        osc.frequency().set_value_at_time(1200.0, t).ok();
        osc.frequency()
            .exponential_ramp_to_value_at_time(300.0, t + 0.1)
            .ok();

        osc.start().ok();
        osc.stop_with_when(t + 0.15).ok();
    }

    /// Combo - rising two-note ping on top of the swish
    fn play_combo(&self, ctx: &AudioContext, vol: f32) {
        self.play_slice(ctx, vol);
        let Some((osc, gain)) = self.create_osc(ctx, 660.0, OscillatorType::Sine) else {
            return;
        };
        let t = ctx.current_time();

        gain.gain().set_value_at_time(vol * 0.25, t).ok();
        gain.gain()
            .exponential_ramp_to_value_at_time(0.01, t + 0.2)
            .ok();
        osc.frequency().set_value_at_time(660.0, t).ok();
        osc.frequency().set_value_at_time(880.0, t + 0.08).ok();

        osc.start().ok();
        osc.stop_with_when(t + 0.22).ok();
    }

    /// Bomb - low boom with noise-like rumble
    fn play_bomb(&self, ctx: &AudioContext, vol: f32) {
        let t = ctx.current_time();

        if let Some((osc, gain)) = self.create_osc(ctx, 120.0, OscillatorType::Sawtooth) {
            gain.gain().set_value_at_time(vol * 0.6, t).ok();
            gain.gain()
                .exponential_ramp_to_value_at_time(0.01, t + 0.5)
                .ok();
            osc.frequency().set_value_at_time(120.0, t).ok();
            osc.frequency()
                .exponential_ramp_to_value_at_time(30.0, t + 0.45)
                .ok();
            osc.start().ok();
            osc.stop_with_when(t + 0.5).ok();
        }

        // Crackle on top
        if let Some((osc, gain)) = self.create_osc(ctx, 800.0, OscillatorType::Square) {
            gain.gain().set_value_at_time(vol * 0.2, t).ok();
            gain.gain()
                .exponential_ramp_to_value_at_time(0.01, t + 0.2)
                .ok();
            osc.frequency().set_value_at_time(800.0, t).ok();
            osc.frequency().set_value_at_time(500.0, t + 0.05).ok();
            osc.frequency().set_value_at_time(900.0, t + 0.1).ok();
            osc.frequency().set_value_at_time(300.0, t + 0.15).ok();
            osc.start().ok();
            osc.stop_with_when(t + 0.22).ok();
        }
    }

    /// Miss - short descending womp
    fn play_miss(&self, ctx: &AudioContext, vol: f32) {
        let Some((osc, gain)) = self.create_osc(ctx, 300.0, OscillatorType::Triangle) else {
            return;
        };
        let t = ctx.current_time();

        gain.gain().set_value_at_time(vol * 0.3, t).ok();
        gain.gain()
            .exponential_ramp_to_value_at_time(0.01, t + 0.25)
            .ok();
        osc.frequency().set_value_at_time(300.0, t).ok();
        osc.frequency()
            .exponential_ramp_to_value_at_time(120.0, t + 0.2)
            .ok();

        osc.start().ok();
        osc.stop_with_when(t + 0.3).ok();
    }

    /// Special - shimmering upward sweep
    fn play_special(&self, ctx: &AudioContext, vol: f32) {
        let t = ctx.current_time();

        if let Some((osc, gain)) = self.create_osc(ctx, 440.0, OscillatorType::Sine) {
            gain.gain().set_value_at_time(vol * 0.3, t).ok();
            gain.gain()
                .exponential_ramp_to_value_at_time(0.01, t + 0.5)
                .ok();
            osc.frequency().set_value_at_time(440.0, t).ok();
            osc.frequency()
                .exponential_ramp_to_value_at_time(1760.0, t + 0.4)
                .ok();
            osc.start().ok();
            osc.stop_with_when(t + 0.5).ok();
        }

        if let Some((osc, gain)) = self.create_osc(ctx, 880.0, OscillatorType::Triangle) {
            gain.gain().set_value_at_time(vol * 0.15, t + 0.1).ok();
            gain.gain()
                .exponential_ramp_to_value_at_time(0.01, t + 0.5)
                .ok();
            osc.start().ok();
            osc.stop_with_when(t + 0.5).ok();
        }
    }

    /// Critical throw - urgent double beep
    fn play_critical(&self, ctx: &AudioContext, vol: f32) {
        let Some((osc, gain)) = self.create_osc(ctx, 988.0, OscillatorType::Square) else {
            return;
        };
        let t = ctx.current_time();

        gain.gain().set_value_at_time(vol * 0.2, t).ok();
        gain.gain().set_value_at_time(0.0, t + 0.06).ok();
        gain.gain().set_value_at_time(vol * 0.2, t + 0.1).ok();
        gain.gain()
            .exponential_ramp_to_value_at_time(0.01, t + 0.2)
            .ok();

        osc.start().ok();
        osc.stop_with_when(t + 0.22).ok();
    }

    /// Wave up - short rising fanfare
    fn play_wave_up(&self, ctx: &AudioContext, vol: f32) {
        let Some((osc, gain)) = self.create_osc(ctx, 523.0, OscillatorType::Triangle) else {
            return;
        };
        let t = ctx.current_time();

        gain.gain().set_value_at_time(vol * 0.3, t).ok();
        gain.gain()
            .exponential_ramp_to_value_at_time(0.01, t + 0.4)
            .ok();
        osc.frequency().set_value_at_time(523.0, t).ok();
        osc.frequency().set_value_at_time(659.0, t + 0.1).ok();
        osc.frequency().set_value_at_time(784.0, t + 0.2).ok();

        osc.start().ok();
        osc.stop_with_when(t + 0.45).ok();
    }

    /// Game over - slow descending tones
    fn play_game_over(&self, ctx: &AudioContext, vol: f32) {
        let Some((osc, gain)) = self.create_osc(ctx, 392.0, OscillatorType::Sine) else {
            return;
        };
        let t = ctx.current_time();

        gain.gain().set_value_at_time(vol * 0.4, t).ok();
        gain.gain()
            .exponential_ramp_to_value_at_time(0.01, t + 1.0)
            .ok();
        osc.frequency().set_value_at_time(392.0, t).ok();
        osc.frequency().set_value_at_time(330.0, t + 0.25).ok();
        osc.frequency().set_value_at_time(262.0, t + 0.5).ok();
        osc.frequency().set_value_at_time(196.0, t + 0.75).ok();

        osc.start().ok();
        osc.stop_with_when(t + 1.1).ok();
    }

    /// New high score - bright ascending arpeggio
    fn play_high_score(&self, ctx: &AudioContext, vol: f32) {
        let Some((osc, gain)) = self.create_osc(ctx, 523.0, OscillatorType::Sine) else {
            return;
        };
        let t = ctx.current_time();

        gain.gain().set_value_at_time(vol * 0.35, t).ok();
        gain.gain()
            .exponential_ramp_to_value_at_time(0.01, t + 0.7)
            .ok();
        osc.frequency().set_value_at_time(523.0, t).ok();
        osc.frequency().set_value_at_time(659.0, t + 0.12).ok();
        osc.frequency().set_value_at_time(784.0, t + 0.24).ok();
        osc.frequency().set_value_at_time(1047.0, t + 0.36).ok();

        osc.start().ok();
        osc.stop_with_when(t + 0.75).ok();
    }
}
