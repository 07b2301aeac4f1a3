/// Sound engine: procedural 8-bit style sound effects via rodio.
///
/// All sounds are generated as in-memory WAV buffers at init time.
/// One-shot cues are fire-and-forget (non-blocking) via rodio's Sink.
/// The siren and the frightened warble share a single looping Sink. The
/// warble wins while it runs; the siren it displaced comes back after.
///
/// Compile with `--no-default-features` or without "sound" feature
/// to disable audio entirely (the stub SoundEngine does nothing).

#[cfg(feature = "sound")]
mod inner {
    use std::io::Cursor;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::{Arc, Mutex};

    use rodio::{OutputStream, OutputStreamHandle, Sink, Source};
    use tracing::warn;

    use crate::sim::event::{GameEvent, SirenState};
    use crate::sim::ports::Audio;

    const SAMPLE_RATE: u32 = 22050;

    #[derive(Clone, Copy, PartialEq, Eq, Debug)]
    enum LoopKind {
        Siren,
        Frightened,
    }

    /// Pre-generated WAV buffers for each sound effect.
    pub struct SoundEngine {
        _stream: OutputStream,
        handle: OutputStreamHandle,
        sfx_intro: Arc<Vec<u8>>,
        sfx_waka: [Arc<Vec<u8>>; 2],
        sfx_ghost: Arc<Vec<u8>>,
        sfx_die: Arc<Vec<u8>>,
        sfx_bonus: Arc<Vec<u8>>,
        sfx_pause: Arc<Vec<u8>>,
        sfx_record: Arc<Vec<u8>>,
        sfx_clear: Arc<Vec<u8>>,
        sfx_game_over: Arc<Vec<u8>>,
        loop_siren: Arc<Vec<u8>>,
        loop_siren_fast: Arc<Vec<u8>>,
        loop_fright: Arc<Vec<u8>>,
        waka_flip: AtomicBool,
        intro: Mutex<Option<Sink>>,
        looping: Mutex<Option<(LoopKind, Sink)>>,
        /// Last siren the game asked for, resumed when the warble ends.
        siren: Mutex<SirenState>,
    }

    impl SoundEngine {
        pub fn new() -> Option<Self> {
            let (stream, handle) = OutputStream::try_default().ok()?;

            // ── Generate all sound buffers ──
            Some(SoundEngine {
                _stream: stream,
                handle,
                sfx_intro: Arc::new(make_wav(&gen_intro())),
                sfx_waka: [
                    Arc::new(make_wav(&gen_waka(420.0, 260.0))),
                    Arc::new(make_wav(&gen_waka(260.0, 420.0))),
                ],
                sfx_ghost: Arc::new(make_wav(&gen_ghost_eaten())),
                sfx_die: Arc::new(make_wav(&gen_die())),
                sfx_bonus: Arc::new(make_wav(&gen_bonus())),
                sfx_pause: Arc::new(make_wav(&gen_blip(660.0, 0.08, 0.25))),
                sfx_record: Arc::new(make_wav(&gen_record())),
                sfx_clear: Arc::new(make_wav(&gen_clear())),
                sfx_game_over: Arc::new(make_wav(&gen_game_over())),
                loop_siren: Arc::new(make_wav(&gen_siren(0.40))),
                loop_siren_fast: Arc::new(make_wav(&gen_siren(0.25))),
                loop_fright: Arc::new(make_wav(&gen_fright())),
                waka_flip: AtomicBool::new(false),
                intro: Mutex::new(None),
                looping: Mutex::new(None),
                siren: Mutex::new(SirenState::Off),
            })
        }

        fn sink(&self, buf: &Arc<Vec<u8>>) -> Option<Sink> {
            let sink = Sink::try_new(&self.handle).ok()?;
            let cursor = Cursor::new(buf.as_ref().clone());
            let src = rodio::Decoder::new(cursor).ok()?;
            sink.append(src);
            Some(sink)
        }

        fn play(&self, buf: &Arc<Vec<u8>>) {
            if let Some(sink) = self.sink(buf) {
                sink.detach(); // fire-and-forget
            }
        }

        fn start_loop(&self, kind: LoopKind, buf: &Arc<Vec<u8>>) {
            let Ok(mut slot) = self.looping.lock() else { return };
            let Ok(sink) = Sink::try_new(&self.handle) else { return };
            match rodio::Decoder::new(Cursor::new(buf.as_ref().clone())) {
                Ok(src) => sink.append(src.repeat_infinite()),
                Err(e) => {
                    warn!("loop decode failed: {e}");
                    return;
                }
            }
            if let Some((_, old)) = slot.replace((kind, sink)) {
                old.stop();
            }
        }

        /// Stop the loop if it is `kind`, or any loop for `None`.
        fn stop_loop(&self, kind: Option<LoopKind>) {
            let Ok(mut slot) = self.looping.lock() else { return };
            let matches = match (&*slot, kind) {
                (Some(_), None) => true,
                (Some((current, _)), Some(k)) => *current == k,
                (None, _) => false,
            };
            if matches {
                if let Some((_, sink)) = slot.take() {
                    sink.stop();
                }
            }
        }

        fn hold_loop(&self, paused: bool) {
            if let Ok(slot) = self.looping.lock() {
                if let Some((_, sink)) = slot.as_ref() {
                    if paused { sink.pause() } else { sink.play() }
                }
            }
        }

        fn loop_kind(&self) -> Option<LoopKind> {
            self.looping.lock().ok().and_then(|slot| slot.as_ref().map(|(k, _)| *k))
        }

        fn set_siren(&self, siren: SirenState) {
            if let Ok(mut s) = self.siren.lock() {
                *s = siren;
            }
            if self.loop_kind() == Some(LoopKind::Frightened) {
                return;
            }
            self.play_siren(siren);
        }

        fn play_siren(&self, siren: SirenState) {
            match siren {
                SirenState::Normal => self.start_loop(LoopKind::Siren, &self.loop_siren),
                SirenState::Fast => self.start_loop(LoopKind::Siren, &self.loop_siren_fast),
                SirenState::Off => self.stop_loop(Some(LoopKind::Siren)),
            }
        }

        fn play_waka(&self) {
            let flip = self.waka_flip.fetch_xor(true, Ordering::Relaxed);
            self.play(&self.sfx_waka[flip as usize]);
        }
    }

    impl Audio for SoundEngine {
        fn on_event(&self, event: &GameEvent) {
            match event {
                GameEvent::StartupCue => {
                    if let Ok(mut intro) = self.intro.lock() {
                        *intro = self.sink(&self.sfx_intro);
                    }
                }
                GameEvent::PelletEaten | GameEvent::PowerPelletEaten => self.play_waka(),
                GameEvent::GhostEaten { .. } => self.play(&self.sfx_ghost),
                GameEvent::PlayerKilled => self.stop_loop(None),
                GameEvent::DeathAnimation => self.play(&self.sfx_die),
                GameEvent::BonusEaten { .. } => self.play(&self.sfx_bonus),
                GameEvent::Siren(siren) => self.set_siren(*siren),
                GameEvent::FrightenedStarted => self.start_loop(LoopKind::Frightened, &self.loop_fright),
                GameEvent::FrightenedEnded => {
                    self.stop_loop(Some(LoopKind::Frightened));
                    let siren = self.siren.lock().map(|s| *s).unwrap_or(SirenState::Off);
                    self.play_siren(siren);
                }
                GameEvent::Paused => {
                    self.hold_loop(true);
                    self.play(&self.sfx_pause);
                }
                GameEvent::Resumed => {
                    self.hold_loop(false);
                    self.play(&self.sfx_pause);
                }
                GameEvent::HighScoreBeaten => self.play(&self.sfx_record),
                GameEvent::LevelCleared { .. } => {
                    self.stop_loop(None);
                    self.play(&self.sfx_clear);
                }
                GameEvent::GameOver { .. } => {
                    self.stop_loop(None);
                    self.play(&self.sfx_game_over);
                }
                GameEvent::BonusSpawned(_) | GameEvent::BonusExpired | GameEvent::LifeLost { .. } => {}
            }
        }

        fn intro_playing(&self) -> bool {
            self.intro
                .lock()
                .map(|intro| intro.as_ref().is_some_and(|s| !s.empty()))
                .unwrap_or(false)
        }
    }

    // ════════════════════════════════════════════════════════════
    //  Waveform generators: all produce Vec<f32> mono samples
    // ════════════════════════════════════════════════════════════

    fn square(t: f32, freq: f32) -> f32 {
        if (t * freq).fract() < 0.5 { 1.0 } else { -1.0 }
    }

    /// Simple sine blip at given frequency and duration
    fn gen_blip(freq: f32, duration: f32, volume: f32) -> Vec<f32> {
        let n = (SAMPLE_RATE as f32 * duration) as usize;
        (0..n)
            .map(|i| {
                let t = i as f32 / SAMPLE_RATE as f32;
                let env = 1.0 - (i as f32 / n as f32); // linear fade out
                (t * freq * 2.0 * std::f32::consts::PI).sin() * env * volume
            })
            .collect()
    }

    /// Sequence of (freq, seconds) square-wave notes; freq 0 is a rest.
    fn gen_melody(notes: &[(f32, f32)], volume: f32) -> Vec<f32> {
        let mut samples = Vec::new();
        for &(freq, dur) in notes {
            let n = (SAMPLE_RATE as f32 * dur) as usize;
            for i in 0..n {
                let t = i as f32 / SAMPLE_RATE as f32;
                let env = 1.0 - (i as f32 / n as f32) * 0.4;
                let wave = if freq > 0.0 { square(t, freq) } else { 0.0 };
                samples.push(wave * env * volume);
            }
        }
        samples
    }

    /// Intro jingle, about four seconds.
    fn gen_intro() -> Vec<f32> {
        let b4 = 494.0;
        let b5 = 988.0;
        let fs5 = 740.0;
        let ds5 = 622.0;
        let c5 = 523.0;
        let c6 = 1047.0;
        let g5 = 784.0;
        let e5 = 659.0;
        let bar_b = [(b4, 0.13), (b5, 0.13), (fs5, 0.13), (ds5, 0.13), (b5, 0.07), (fs5, 0.2), (ds5, 0.27)];
        let bar_c = [(c5, 0.13), (c6, 0.13), (g5, 0.13), (e5, 0.13), (c6, 0.07), (g5, 0.2), (e5, 0.27)];
        let tail = [(ds5, 0.07), (e5, 0.07), (698.0, 0.13), (698.0, 0.07), (fs5, 0.07), (g5, 0.13),
                    (g5, 0.07), (831.0, 0.07), (880.0, 0.13), (b5, 0.27)];
        let mut notes: Vec<(f32, f32)> = Vec::new();
        notes.extend_from_slice(&bar_b);
        notes.extend_from_slice(&bar_c);
        notes.extend_from_slice(&bar_b);
        notes.extend_from_slice(&tail);
        gen_melody(&notes, 0.12)
    }

    /// One chomp: a quick pitch sweep.
    fn gen_waka(from: f32, to: f32) -> Vec<f32> {
        let n = (SAMPLE_RATE as f32 * 0.07) as usize;
        let mut phase = 0.0_f32;
        (0..n)
            .map(|i| {
                let t = i as f32 / n as f32;
                let freq = from + (to - from) * t;
                phase += freq / SAMPLE_RATE as f32;
                let wave = if phase.fract() < 0.5 { 1.0 } else { -1.0 };
                wave * (1.0 - t * 0.5) * 0.1
            })
            .collect()
    }

    /// Ghost eaten: fast rising sweep
    fn gen_ghost_eaten() -> Vec<f32> {
        let n = (SAMPLE_RATE as f32 * 0.25) as usize;
        let mut phase = 0.0_f32;
        (0..n)
            .map(|i| {
                let t = i as f32 / n as f32;
                let freq = 200.0 + t * t * 1600.0;
                phase += freq / SAMPLE_RATE as f32;
                (phase * 2.0 * std::f32::consts::PI).sin() * (1.0 - t * 0.3) * 0.3
            })
            .collect()
    }

    /// Death: long falling warble
    fn gen_die() -> Vec<f32> {
        let n = (SAMPLE_RATE as f32 * 1.2) as usize;
        let mut phase = 0.0_f32;
        (0..n)
            .map(|i| {
                let t = i as f32 / n as f32;
                let wobble = ((t * 12.0).fract() - 0.5) * 120.0;
                let freq = 800.0 - t * 650.0 + wobble;
                phase += freq / SAMPLE_RATE as f32;
                let env = 1.0 - t.powf(3.0);
                (phase * 2.0 * std::f32::consts::PI).sin() * env * 0.3
            })
            .collect()
    }

    /// Bonus item: bright two-note chime
    fn gen_bonus() -> Vec<f32> {
        let pairs = [(784.0_f32, 0.08), (1047.0, 0.15)]; // G5, C6
        let mut samples = Vec::new();
        for &(freq, dur) in &pairs {
            let n = (SAMPLE_RATE as f32 * dur) as usize;
            for i in 0..n {
                let t = i as f32 / SAMPLE_RATE as f32;
                let env = 1.0 - (i as f32 / n as f32).powf(0.5);
                let wave = (t * freq * 2.0 * std::f32::consts::PI).sin() * 0.7
                    + (t * freq * 2.0 * 2.0 * std::f32::consts::PI).sin() * 0.3;
                samples.push(wave * env * 0.3);
            }
        }
        samples
    }

    /// New record: ascending arpeggio C6→E6→G6→C7
    fn gen_record() -> Vec<f32> {
        gen_melody(&[(1047.0, 0.06), (1319.0, 0.06), (1568.0, 0.06), (2093.0, 0.18)], 0.12)
    }

    /// Level clear: victory ascending fanfare
    fn gen_clear() -> Vec<f32> {
        let notes = [523.0_f32, 659.0, 784.0, 1047.0]; // C5→E5→G5→C6
        let note_dur = 0.1;
        let mut samples = Vec::new();
        for &freq in &notes {
            let n = (SAMPLE_RATE as f32 * note_dur) as usize;
            for i in 0..n {
                let t = i as f32 / SAMPLE_RATE as f32;
                let env = 1.0 - (i as f32 / n as f32) * 0.3;
                let wave = (t * freq * 2.0 * std::f32::consts::PI).sin() * 0.6
                    + (t * freq * 2.0 * 2.0 * std::f32::consts::PI).sin() * 0.3
                    + (t * freq * 3.0 * 2.0 * std::f32::consts::PI).sin() * 0.1;
                samples.push(wave * env * 0.3);
            }
        }
        samples
    }

    /// Game over: sad descending tone
    fn gen_game_over() -> Vec<f32> {
        gen_melody(&[(440.0, 0.18), (370.0, 0.18), (311.0, 0.18), (261.0, 0.4)], 0.12)
    }

    /// One siren cycle: sine gliding up and back down over `period` seconds.
    fn gen_siren(period: f32) -> Vec<f32> {
        let n = (SAMPLE_RATE as f32 * period) as usize;
        let mut phase = 0.0_f32;
        (0..n)
            .map(|i| {
                let t = i as f32 / n as f32;
                let tri = 1.0 - (2.0 * t - 1.0).abs();
                let freq = 380.0 + tri * 320.0;
                phase += freq / SAMPLE_RATE as f32;
                (phase * 2.0 * std::f32::consts::PI).sin() * 0.12
            })
            .collect()
    }

    /// Frightened warble: low, fast square wobble.
    fn gen_fright() -> Vec<f32> {
        let n = (SAMPLE_RATE as f32 * 0.16) as usize;
        let mut phase = 0.0_f32;
        (0..n)
            .map(|i| {
                let t = i as f32 / n as f32;
                let freq = 180.0 + t * 420.0;
                phase += freq / SAMPLE_RATE as f32;
                let wave = if phase.fract() < 0.5 { 1.0 } else { -1.0 };
                wave * 0.07
            })
            .collect()
    }

    // ════════════════════════════════════════════════════════════
    //  WAV encoder: wraps f32 samples into a valid WAV buffer
    // ════════════════════════════════════════════════════════════

    fn make_wav(samples: &[f32]) -> Vec<u8> {
        let num_channels: u16 = 1;
        let bits_per_sample: u16 = 16;
        let byte_rate = SAMPLE_RATE * (num_channels as u32) * (bits_per_sample as u32) / 8;
        let block_align = num_channels * bits_per_sample / 8;
        let data_size = samples.len() as u32 * 2; // 16-bit = 2 bytes per sample
        let file_size = 36 + data_size;

        let mut buf = Vec::with_capacity(44 + data_size as usize);

        // RIFF header
        buf.extend_from_slice(b"RIFF");
        buf.extend_from_slice(&file_size.to_le_bytes());
        buf.extend_from_slice(b"WAVE");

        // fmt chunk
        buf.extend_from_slice(b"fmt ");
        buf.extend_from_slice(&16u32.to_le_bytes()); // chunk size
        buf.extend_from_slice(&1u16.to_le_bytes());  // PCM format
        buf.extend_from_slice(&num_channels.to_le_bytes());
        buf.extend_from_slice(&SAMPLE_RATE.to_le_bytes());
        buf.extend_from_slice(&byte_rate.to_le_bytes());
        buf.extend_from_slice(&block_align.to_le_bytes());
        buf.extend_from_slice(&bits_per_sample.to_le_bytes());

        // data chunk
        buf.extend_from_slice(b"data");
        buf.extend_from_slice(&data_size.to_le_bytes());

        for &s in samples {
            let val = (s.clamp(-1.0, 1.0) * 32767.0) as i16;
            buf.extend_from_slice(&val.to_le_bytes());
        }

        buf
    }

}

// ════════════════════════════════════════════════════════════
//  Public API, compiles to no-ops when sound feature is off
// ════════════════════════════════════════════════════════════

#[cfg(feature = "sound")]
pub use inner::SoundEngine;

#[cfg(not(feature = "sound"))]
pub struct SoundEngine;

#[cfg(not(feature = "sound"))]
impl SoundEngine {
    pub fn new() -> Option<Self> { Some(SoundEngine) }
}

#[cfg(not(feature = "sound"))]
impl crate::sim::ports::Audio for SoundEngine {
    fn on_event(&self, _event: &crate::sim::event::GameEvent) {}
    fn intro_playing(&self) -> bool { false }
}
