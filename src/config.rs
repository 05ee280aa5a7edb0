//! System configuration parameters
//!
//! All tunable parameters for the AquaAuto transfer demo.  Defaults match
//! the values the apparatus was tuned with.  A build-time JSON override can
//! be supplied through [`SystemConfig::from_json`]; nothing is persisted.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::sensors::mpr121;

/// Where the per-channel reference zero-point is taken from at calibration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BaselineSource {
    /// Filtered electrode data, the same value read every cycle.
    Filtered,
    /// The controller's own baseline-tracking register.
    ChipBaseline,
}

/// Core system configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemConfig {
    // --- Sensing ---
    /// Diff (raw - baseline) below which a level counts as crossed.
    pub dry_threshold: i32,
    /// MPR121 electrode for each water level, bottom (level 1) to top (level 6).
    pub level_channels: [u8; 6],
    /// Baseline capture source.
    pub baseline_source: BaselineSource,
    /// I²C address of the capacitive controller (0x5A - 0x5D).
    pub mpr121_address: u8,
    /// Float switch input level that means "liquid at the top".
    pub float_trip_high: bool,

    // --- Timing ---
    /// Pause at the end of every control cycle (milliseconds).
    pub loop_delay_ms: u32,
    /// Pause between stopping one pump and starting the other.
    pub settle_delay_ms: u32,
    /// Pause before the first fill starts.
    pub startup_delay_ms: u32,
    /// Pause after sensor detection so the first readings are stable.
    pub sensor_warmup_ms: u32,
    /// Poll period of the manual pre-positioning buttons.
    pub manual_poll_ms: u32,
    /// Pause after pre-positioning before the baseline is captured.
    pub pre_position_settle_ms: u32,

    // --- Stall protection (disabled when `None`) ---
    //
    // Both limits count whole cycles times `loop_delay_ms`.  The settle and
    // startup pauses are not included, so wall-clock time in a state runs
    // longer than the figure checked here.
    /// Longest time a single drain level may take.
    pub level_timeout_ms: Option<u32>,
    /// Longest time the fill (float side) may take.
    pub fill_timeout_ms: Option<u32>,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            // Sensing
            dry_threshold: 20,
            level_channels: [6, 7, 8, 9, 10, 11],
            baseline_source: BaselineSource::Filtered,
            mpr121_address: mpr121::DEFAULT_ADDRESS,
            float_trip_high: true, // normally-closed float on a pull-up

            // Timing
            loop_delay_ms: 500,
            settle_delay_ms: 2000,
            startup_delay_ms: 2000,
            sensor_warmup_ms: 2000,
            manual_poll_ms: 500,
            pre_position_settle_ms: 1000,

            // Stall protection
            level_timeout_ms: None,
            fill_timeout_ms: None,
        }
    }
}

impl SystemConfig {
    /// Parse a (possibly partial) JSON document over the defaults and
    /// validate the result.
    pub fn from_json(doc: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(doc).map_err(|e| {
            log::warn!("config parse error: {}", e);
            ConfigError::Parse
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values that would make the machine misbehave.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.dry_threshold <= 0 {
            return Err(ConfigError::Invalid("dry_threshold must be positive"));
        }
        if self
            .level_channels
            .iter()
            .any(|&ch| ch as usize >= mpr121::CHANNEL_COUNT)
        {
            return Err(ConfigError::Invalid("level channel out of range"));
        }
        if self.level_channels.windows(2).any(|w| w[0] >= w[1]) {
            return Err(ConfigError::Invalid(
                "level channels must be strictly ascending",
            ));
        }
        if !(mpr121::DEFAULT_ADDRESS..=mpr121::MAX_ADDRESS).contains(&self.mpr121_address) {
            return Err(ConfigError::Invalid("mpr121_address must be 0x5A-0x5D"));
        }
        if self.loop_delay_ms == 0 {
            return Err(ConfigError::Invalid("loop_delay_ms must be non-zero"));
        }
        if self.manual_poll_ms == 0 {
            return Err(ConfigError::Invalid("manual_poll_ms must be non-zero"));
        }
        if self.level_timeout_ms == Some(0) || self.fill_timeout_ms == Some(0) {
            return Err(ConfigError::Invalid("timeouts must be non-zero when set"));
        }
        Ok(())
    }
}
