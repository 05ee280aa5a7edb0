//! Baseline capture and baseline-adjusted readings.
//!
//! At the end of setup every electrode is sampled once and the values are
//! frozen as the baseline.  From then on each reading is reported as
//! `raw - baseline`; electrode count and conditions are assumed stable for
//! the rest of the run, so the baseline is never refreshed.
//!
//! Read failures after capture are not fatal: the last good value for the
//! affected input is reused and a warning is logged.

use log::{info, warn};

use crate::app::ports::SensorPort;
use crate::config::BaselineSource;
use crate::error::SensorError;
use crate::fsm::context::{FloatState, SensorSnapshot};
use crate::sensors::mpr121::CHANNEL_COUNT;

/// Per-electrode reference values, captured once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Baseline {
    values: [u16; CHANNEL_COUNT],
}

impl Baseline {
    /// Sample all electrodes.  Any read failure aborts the capture: a
    /// partial baseline would skew every diff that follows.
    pub fn capture(
        sensor: &mut impl SensorPort,
        source: BaselineSource,
    ) -> Result<Self, SensorError> {
        let mut values = [0u16; CHANNEL_COUNT];
        for (ch, slot) in (0u8..).zip(values.iter_mut()) {
            *slot = match source {
                BaselineSource::Filtered => sensor.read_channel(ch)?,
                BaselineSource::ChipBaseline => sensor.read_chip_baseline(ch)?,
            };
        }
        info!("Baseline captured ({:?}): {:?}", source, values);
        Ok(Self { values })
    }

    pub fn from_values(values: [u16; CHANNEL_COUNT]) -> Self {
        Self { values }
    }

    pub fn value(&self, channel: u8) -> Option<u16> {
        self.values.get(channel as usize).copied()
    }

    pub fn values(&self) -> &[u16; CHANNEL_COUNT] {
        &self.values
    }

    /// Signed distance of `raw` from this channel's baseline.
    ///
    /// Out-of-range channels have no baseline and read as zero difference.
    pub fn diff(&self, channel: u8, raw: u16) -> i32 {
        self.value(channel)
            .map_or(0, |base| i32::from(raw) - i32::from(base))
    }
}

/// Baseline plus the last good reading of every input.
pub struct Calibration {
    baseline: Baseline,
    last_raw: [u16; CHANNEL_COUNT],
    last_float: FloatState,
}

impl Calibration {
    pub fn new(baseline: Baseline) -> Self {
        Self {
            last_raw: *baseline.values(),
            baseline,
            last_float: FloatState::default(),
        }
    }

    pub fn baseline(&self) -> &Baseline {
        &self.baseline
    }

    /// Current `raw - baseline` for one electrode.
    ///
    /// Channels outside the controller's range are rejected.
    pub fn current_diff(
        &mut self,
        sensor: &mut impl SensorPort,
        channel: u8,
    ) -> Result<i32, SensorError> {
        if channel as usize >= CHANNEL_COUNT {
            return Err(SensorError::InvalidChannel(channel));
        }
        let raw = self.read_or_last(sensor, channel);
        Ok(self.baseline.diff(channel, raw))
    }

    /// Baseline-adjusted snapshot of every electrode and the float switch.
    pub fn snapshot(&mut self, sensor: &mut impl SensorPort) -> SensorSnapshot {
        let mut diffs = [0i32; CHANNEL_COUNT];
        for (ch, slot) in (0u8..).zip(diffs.iter_mut()) {
            let raw = self.read_or_last(sensor, ch);
            *slot = self.baseline.diff(ch, raw);
        }

        let float = match sensor.read_float() {
            Ok(state) => {
                self.last_float = state;
                state
            }
            Err(e) => {
                warn!("Float switch read failed ({}), reusing {}", e, self.last_float.label());
                self.last_float
            }
        };

        SensorSnapshot { diffs, float }
    }

    fn read_or_last(&mut self, sensor: &mut impl SensorPort, channel: u8) -> u16 {
        let idx = channel as usize;
        match sensor.read_channel(channel) {
            Ok(raw) => {
                self.last_raw[idx] = raw;
                raw
            }
            Err(e) => {
                warn!("Electrode {} read failed ({}), reusing last value", channel, e);
                self.last_raw[idx]
            }
        }
    }
}
