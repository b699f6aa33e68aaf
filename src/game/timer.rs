use chess::Color;
use log::{debug, info, warn};

pub const BLITZ_SECONDS: u32 = 5 * 60;
pub const RAPID_SECONDS: u32 = 10 * 60;
pub const CLASSICAL_SECONDS: u32 = 30 * 60;

/// Fixed time-control tiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimeControl {
    #[default]
    Blitz,
    Rapid,
    Classical,
}

impl TimeControl {
    /// Look up a tier by name; anything unrecognised is blitz.
    pub fn from_tier(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "rapid" => TimeControl::Rapid,
            "classical" => TimeControl::Classical,
            "blitz" => TimeControl::Blitz,
            other => {
                warn!("Unknown time control '{}', using blitz", other);
                TimeControl::Blitz
            }
        }
    }

    pub fn seconds(self) -> u32 {
        match self {
            TimeControl::Blitz => BLITZ_SECONDS,
            TimeControl::Rapid => RAPID_SECONDS,
            TimeControl::Classical => CLASSICAL_SECONDS,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// The tick belonged to a clock that has since been stopped or restarted
    Ignored,
    Ticked { color: Color, remaining: u32 },
    /// The running clock hit zero; every clock is now stopped
    Flagged(Color),
}

/// Two countdown clocks, at most one of which runs at any time.
///
/// Every start and stop bumps a generation counter. A scheduled tick carries
/// the generation it was scheduled under, so a tick that arrives after the
/// clock was stopped or handed over is dropped.
#[derive(Debug, Clone)]
pub struct TimerCoordinator {
    white_seconds: u32,
    black_seconds: u32,
    running: Option<Color>,
    generation: u64,
    flagged: Option<Color>,
}

impl TimerCoordinator {
    pub fn new(seconds: u32) -> Self {
        TimerCoordinator {
            white_seconds: seconds,
            black_seconds: seconds,
            running: None,
            generation: 0,
            flagged: None,
        }
    }

    /// Stop everything, then run `color`'s clock from its remaining time.
    ///
    /// Returns the generation ticks must carry, or `None` once a clock has
    /// flagged.
    pub fn start(&mut self, color: Color) -> Option<u64> {
        self.stop_all();
        if self.flagged.is_some() {
            return None;
        }
        self.running = Some(color);
        debug!("Started {:?} clock at {}s", color, self.remaining(color));
        Some(self.generation)
    }

    pub fn stop_all(&mut self) {
        self.running = None;
        self.generation += 1;
    }

    pub fn reset_all(&mut self, seconds: u32) {
        self.stop_all();
        self.white_seconds = seconds;
        self.black_seconds = seconds;
        self.flagged = None;
        info!("Clocks reset to {}s", seconds);
    }

    pub fn tick(&mut self, generation: u64) -> TickOutcome {
        let color = match self.running {
            Some(color) if generation == self.generation => color,
            _ => return TickOutcome::Ignored,
        };
        let remaining = match color {
            Color::White => &mut self.white_seconds,
            Color::Black => &mut self.black_seconds,
        };
        *remaining = remaining.saturating_sub(1);
        if *remaining == 0 {
            self.stop_all();
            self.flagged = Some(color);
            warn!("{:?} ran out of time", color);
            return TickOutcome::Flagged(color);
        }
        TickOutcome::Ticked {
            color,
            remaining: *remaining,
        }
    }

    pub fn remaining(&self, color: Color) -> u32 {
        match color {
            Color::White => self.white_seconds,
            Color::Black => self.black_seconds,
        }
    }

    pub fn running(&self) -> Option<Color> {
        self.running
    }

    pub fn is_running(&self, color: Color) -> bool {
        self.running == Some(color)
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// The side that lost on time, if any
    pub fn flagged(&self) -> Option<Color> {
        self.flagged
    }
}
