//! Built-in one-bar demo pattern covering every voice

use anyhow::Result;
use nether_synth::{AudioEngine, Voice};

/// Steps per bar (sixteenth notes)
pub const STEPS: usize = 16;

/// Step length in seconds (120 BPM)
pub const STEP_SECONDS: f32 = 0.125;

/// Lead notes are released this many steps after they start
const LEAD_GATE: usize = 2;

const KICK_HZ: f32 = 55.0;
const SNARE_HZ: f32 = 180.0;
const HI_HAT_HZ: f32 = 8_000.0;

const BASS: [(usize, f32); 4] = [(0, 55.0), (6, 65.41), (8, 73.42), (14, 49.0)];
const LEAD: [(usize, f32); 6] = [
    (0, 440.0),
    (3, 523.25),
    (6, 659.25),
    (8, 587.33),
    (11, 523.25),
    (14, 493.88),
];

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Event {
    Note(Voice, f32),
    Release(Voice),
}

/// Events that fire at `step` (wraps every bar)
pub fn events(step: usize) -> Vec<Event> {
    let step = step % STEPS;
    let mut out = Vec::new();

    if step % 4 == 0 {
        out.push(Event::Note(Voice::Kick, KICK_HZ));
    }
    if step % 8 == 4 {
        out.push(Event::Note(Voice::Snare, SNARE_HZ));
    }
    if step % 2 == 0 {
        out.push(Event::Note(Voice::HiHat, HI_HAT_HZ));
    }

    for &(at, hz) in &BASS {
        if at == step {
            out.push(Event::Note(Voice::Bass, hz));
        }
    }

    // Releases go first so a note starting on the same step is not cut
    if LEAD.iter().any(|&(at, _)| (at + LEAD_GATE) % STEPS == step) {
        out.push(Event::Release(Voice::Lead));
        out.push(Event::Release(Voice::SuperLead));
    }
    for &(at, hz) in &LEAD {
        if at == step {
            out.push(Event::Note(Voice::Lead, hz));
            // A fifth up, an octave down
            out.push(Event::Note(Voice::SuperLead, hz * 0.75));
        }
    }

    out
}

/// Apply one step's events to the engine as a single locked edit
pub fn trigger(engine: &AudioEngine, step: usize) -> Result<()> {
    let mut mixer = engine.lock();
    for event in events(step) {
        match event {
            Event::Note(voice, hz) => mixer.synth_mut(voice).play(hz)?,
            Event::Release(voice) => mixer.synth_mut(voice).request_release(),
        }
    }
    Ok(())
}
