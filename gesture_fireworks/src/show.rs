//! Scripted phrase show.
//!
//! The sequencer is a countdown advanced by the render tick: skipping the
//! tick (pause) freezes the show exactly where it is.

use log::debug;

#[derive(Clone, Debug, PartialEq)]
pub struct ShowConfig {
    pub phrases:         Vec<String>,
    /// Seconds each phrase stays on screen before the next launch.
    pub display_seconds: f32,
    /// World units per font pixel.
    pub scale:           f32,
    pub target_y:        f32,
}

impl Default for ShowConfig {
    fn default() -> Self {
        ShowConfig {
            phrases:         ["2026", "HAPPY", "NEW YEAR", "CHEERS"].map(String::from).to_vec(),
            display_seconds: 4.0,
            scale:           0.35,
            target_y:        15.0,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Sequencer {
    phrases: Vec<String>,
    display: f32,
    index:   usize,
    next_in: f32,
    running: bool,
}

impl Sequencer {
    pub fn new(cfg: &ShowConfig) -> Self {
        Sequencer {
            phrases: cfg.phrases.clone(),
            display: cfg.display_seconds,
            index:   0,
            next_in: 0.0,
            running: false,
        }
    }

    /// Begin cycling. The first phrase launches on the next tick. Returns
    /// false if already running or there is nothing to show.
    pub fn start(&mut self) -> bool {
        if self.running || self.phrases.is_empty() { return false; }
        self.running = true;
        self.next_in = 0.0;
        true
    }

    /// Advance the countdown; yields the phrase to launch when it expires.
    pub fn tick(&mut self, dt: f32) -> Option<String> {
        if !self.running { return None; }
        self.next_in -= dt;
        if self.next_in > 0.0 { return None; }

        let phrase = self.phrases[self.index].clone();
        debug!("show phrase {} '{}'", self.index, phrase);
        self.index   = (self.index + 1) % self.phrases.len();
        self.next_in += self.display;
        Some(phrase)
    }

    pub fn is_running(&self)    -> bool  { self.running }
    /// Index of the phrase that launches next.
    pub fn current_index(&self) -> usize { self.index }
    pub fn next_in(&self)       -> f32   { self.next_in }
}
