use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use gloo::timers::callback::Interval;
use wasm_bindgen::JsValue;
use web_sys::{AudioContext, GainNode, OscillatorNode, OscillatorType};

const MASTER_GAIN: f32 = 0.5;
const DRONE_GAIN: f32 = 0.03;
const DRONE_BASE_HZ: f32 = 55.0;
const DRONE_DETUNE_HZ: f32 = 0.8;
const MELODY_INTERVAL_MS: u32 = 2700;
const MELODY_GAIN: f32 = 0.05;
const MELODY_SECONDS: f64 = 1.4;
const SNAP_HZ: f32 = 880.0;
const SNAP_GAIN: f32 = 0.16;
const SNAP_SECONDS: f64 = 0.18;
const SOLVE_GAIN: f32 = 0.14;
const SOLVE_NOTE_SECONDS: f64 = 0.32;
const SOLVE_NOTES_HZ: [f32; 3] = [523.25, 659.25, 783.99];
const PENTATONIC_HZ: [f32; 5] = [220.0, 261.63, 293.66, 329.63, 392.0];

// Ambient drone plus short placement tones. All failures are swallowed: a
// browser without audio (or a rejected context) leaves the game silent but
// otherwise unaffected.
pub(crate) struct AudioEngine {
    ctx: AudioContext,
    master: GainNode,
    drones: Vec<OscillatorNode>,
    melody_timer: RefCell<Option<Interval>>,
    melody_step: Cell<usize>,
    muted: Cell<bool>,
}

impl AudioEngine {
    pub(crate) fn start(muted: bool) -> Option<Rc<Self>> {
        match Self::build(muted) {
            Ok(engine) => Some(engine),
            Err(_) => {
                gloo::console::warn!("audio unavailable, continuing muted");
                None
            }
        }
    }

    fn build(muted: bool) -> Result<Rc<Self>, JsValue> {
        let ctx = AudioContext::new()?;
        let master = ctx.create_gain()?;
        master
            .gain()
            .set_value(if muted { 0.0 } else { MASTER_GAIN });
        master.connect_with_audio_node(&ctx.destination())?;

        let mut drones = Vec::with_capacity(2);
        for detune in [0.0, DRONE_DETUNE_HZ] {
            let osc = ctx.create_oscillator()?;
            osc.set_type(OscillatorType::Sine);
            osc.frequency().set_value(DRONE_BASE_HZ + detune);
            let gain = ctx.create_gain()?;
            gain.gain().set_value(DRONE_GAIN);
            osc.connect_with_audio_node(&gain)?;
            gain.connect_with_audio_node(&master)?;
            osc.start()?;
            drones.push(osc);
        }

        let engine = Rc::new(Self {
            ctx,
            master,
            drones,
            melody_timer: RefCell::new(None),
            melody_step: Cell::new(0),
            muted: Cell::new(muted),
        });
        let weak: Weak<Self> = Rc::downgrade(&engine);
        let timer = Interval::new(MELODY_INTERVAL_MS, move || {
            if let Some(engine) = weak.upgrade() {
                engine.melody_tick();
            }
        });
        *engine.melody_timer.borrow_mut() = Some(timer);
        Ok(engine)
    }

    // Browsers keep a context suspended until a user gesture; called from the
    // first pointer interaction.
    pub(crate) fn resume_if_suspended(&self) {
        let _ = self.ctx.resume();
    }

    pub(crate) fn set_muted(&self, muted: bool) {
        self.muted.set(muted);
        self.master
            .gain()
            .set_value(if muted { 0.0 } else { MASTER_GAIN });
    }

    pub(crate) fn snap(&self) {
        if self.muted.get() {
            return;
        }
        let _ = self.tone(SNAP_HZ, SNAP_GAIN, 0.0, SNAP_SECONDS);
    }

    pub(crate) fn solved(&self) {
        if self.muted.get() {
            return;
        }
        for (index, freq) in SOLVE_NOTES_HZ.iter().enumerate() {
            let offset = index as f64 * SOLVE_NOTE_SECONDS * 0.5;
            let _ = self.tone(*freq, SOLVE_GAIN, offset, SOLVE_NOTE_SECONDS);
        }
    }

    fn melody_tick(&self) {
        if self.muted.get() {
            return;
        }
        let step = self.melody_step.get();
        self.melody_step.set(step.wrapping_add(1));
        let freq = PENTATONIC_HZ[(step * 3 + step / PENTATONIC_HZ.len()) % PENTATONIC_HZ.len()];
        let _ = self.tone(freq, MELODY_GAIN, 0.0, MELODY_SECONDS);
    }

    fn tone(&self, freq: f32, peak: f32, offset_s: f64, duration_s: f64) -> Result<(), JsValue> {
        let start = self.ctx.current_time() + offset_s;
        let osc = self.ctx.create_oscillator()?;
        osc.set_type(OscillatorType::Sine);
        osc.frequency().set_value(freq);
        let gain = self.ctx.create_gain()?;
        gain.gain().set_value_at_time(0.0, start)?;
        gain.gain()
            .linear_ramp_to_value_at_time(peak, start + duration_s * 0.15)?;
        gain.gain()
            .linear_ramp_to_value_at_time(0.0, start + duration_s)?;
        osc.connect_with_audio_node(&gain)?;
        gain.connect_with_audio_node(&self.master)?;
        osc.start_with_when(start)?;
        osc.stop_with_when(start + duration_s)?;
        Ok(())
    }
}

impl Drop for AudioEngine {
    fn drop(&mut self) {
        self.melody_timer.borrow_mut().take();
        for osc in &self.drones {
            let _ = osc.stop();
        }
        let _ = self.ctx.close();
    }
}
