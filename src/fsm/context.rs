//! Shared mutable context threaded through every FSM handler.
//!
//! `FsmContext` is the single struct that state handlers read from and
//! write to.  It contains the latest baseline-adjusted sensor snapshot,
//! the pump commands, timing information and configuration.  The control
//! loop owns it; nothing else can reach it.

use crate::config::SystemConfig;
use crate::sensors::mpr121::CHANNEL_COUNT;

// ---------------------------------------------------------------------------
// Sensor-side domain types
// ---------------------------------------------------------------------------

/// Binary state of the float switch at the top of the float chamber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FloatState {
    /// Liquid present at the top of the chamber.
    Tripped,
    #[default]
    Dry,
}

impl FloatState {
    pub fn label(self) -> &'static str {
        match self {
            Self::Tripped => "tripped",
            Self::Dry => "dry",
        }
    }
}

/// One rung of the capacitive level ladder, bottom (1) to top (6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum WaterLevel {
    L1 = 1,
    L2 = 2,
    L3 = 3,
    L4 = 4,
    L5 = 5,
    L6 = 6,
}

impl WaterLevel {
    /// Bottom-up order.
    pub const ALL: [WaterLevel; 6] = [
        Self::L1,
        Self::L2,
        Self::L3,
        Self::L4,
        Self::L5,
        Self::L6,
    ];

    /// 1-based rank.
    pub fn rank(self) -> u8 {
        self as u8
    }

    /// Electrode this level is wired to.
    pub fn channel(self, level_channels: &[u8; 6]) -> u8 {
        level_channels[self as usize - 1]
    }
}

/// A point-in-time snapshot of every sensor, already baseline-adjusted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SensorSnapshot {
    /// `raw - baseline` for every electrode, indexed by channel.
    pub diffs: [i32; CHANNEL_COUNT],
    /// Float switch reading.
    pub float: FloatState,
}

impl SensorSnapshot {
    /// Diff for one ladder level.
    pub fn level_diff(&self, level: WaterLevel, level_channels: &[u8; 6]) -> i32 {
        self.diffs[level.channel(level_channels) as usize]
    }

    /// Diffs for all six levels, bottom-up.  Used for diagnostics.
    pub fn level_diffs(&self, level_channels: &[u8; 6]) -> [i32; 6] {
        WaterLevel::ALL.map(|l| self.level_diff(l, level_channels))
    }
}

// ---------------------------------------------------------------------------
// Actuator commands (written by state handlers; applied by the service)
// ---------------------------------------------------------------------------

/// Which chamber's pump.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PumpSide {
    Left,
    Right,
}

/// Desired pump outputs after an FSM tick.
///
/// The service applies "off" outputs first, then sleeps for
/// `settle_before_start_ms`, then applies "on" outputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PumpCommands {
    pub left: bool,
    pub right: bool,
    /// One-shot pause between the stop and start halves of this command.
    pub settle_before_start_ms: u32,
}

impl PumpCommands {
    /// Both pumps off.
    pub fn all_off() -> Self {
        Self::default()
    }

    pub fn is_on(&self, side: PumpSide) -> bool {
        match side {
            PumpSide::Left => self.left,
            PumpSide::Right => self.right,
        }
    }

    pub fn set(&mut self, side: PumpSide, on: bool) {
        match side {
            PumpSide::Left => self.left = on,
            PumpSide::Right => self.right = on,
        }
    }
}

// ---------------------------------------------------------------------------
// FsmContext
// ---------------------------------------------------------------------------

/// The shared context passed to every state handler function.
pub struct FsmContext {
    // -- Timing --
    /// Ticks elapsed since the current state was entered.
    pub ticks_in_state: u64,
    /// Monotonic total tick count.
    pub total_ticks: u64,
    /// Nominal duration of one tick (the inter-cycle delay).
    pub tick_period_ms: u32,

    // -- Sensor data --
    /// Latest sensor snapshot.  Updated before each FSM tick.
    pub sensors: SensorSnapshot,

    // -- Actuator outputs --
    pub commands: PumpCommands,

    // -- Configuration --
    pub config: SystemConfig,
}

impl FsmContext {
    pub fn new(config: SystemConfig) -> Self {
        Self {
            ticks_in_state: 0,
            total_ticks: 0,
            tick_period_ms: config.loop_delay_ms,
            sensors: SensorSnapshot::default(),
            commands: PumpCommands::all_off(),
            config,
        }
    }

    /// Milliseconds spent in the current state, counted in whole cycles.
    pub fn ms_in_state(&self) -> u64 {
        self.ticks_in_state * u64::from(self.tick_period_ms)
    }

    /// True when `level` has crossed the dryness threshold this cycle.
    ///
    /// One-sided comparison with no hysteresis band.
    pub fn level_crossed(&self, level: WaterLevel) -> bool {
        self.sensors.level_diff(level, &self.config.level_channels) < self.config.dry_threshold
    }
}
