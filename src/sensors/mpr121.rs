//! MPR121 12-channel capacitive touch controller over I²C.
//!
//! Only the pieces the level ladder needs: detection, the electrode
//! configuration, and reads of the filtered-data and baseline registers.
//! Touch/release status bits are never used.
//!
//! ## Detection
//!
//! After a soft reset the chip's CONFIG2 register reads back `0x24`.
//! Anything else (or a NAK) means there is no MPR121 at that address.

use embedded_hal::i2c::{Error as _, I2c};
use log::{debug, info};

use crate::error::SensorError;

/// Default address (ADDR pin to GND).  Tie to 3V3 / SDA / SCL for 0x5B-0x5D.
pub const DEFAULT_ADDRESS: u8 = 0x5A;
/// Highest address selectable with the ADDR pin.
pub const MAX_ADDRESS: u8 = 0x5D;
/// Number of electrodes.
pub const CHANNEL_COUNT: usize = 12;

/// Register map (subset).
mod reg {
    pub const FILTDATA_0L: u8 = 0x04;
    pub const BASELINE_0: u8 = 0x1E;
    pub const MHDR: u8 = 0x2B;
    pub const NHDR: u8 = 0x2C;
    pub const NCLR: u8 = 0x2D;
    pub const FDLR: u8 = 0x2E;
    pub const MHDF: u8 = 0x2F;
    pub const NHDF: u8 = 0x30;
    pub const NCLF: u8 = 0x31;
    pub const FDLF: u8 = 0x32;
    pub const NHDT: u8 = 0x33;
    pub const NCLT: u8 = 0x34;
    pub const FDLT: u8 = 0x35;
    pub const TOUCHTH_0: u8 = 0x41;
    pub const RELEASETH_0: u8 = 0x42;
    pub const DEBOUNCE: u8 = 0x5B;
    pub const CONFIG1: u8 = 0x5C;
    pub const CONFIG2: u8 = 0x5D;
    pub const ECR: u8 = 0x5E;
    pub const SOFTRESET: u8 = 0x80;
}

/// CONFIG2 power-on value, used as the identity check.
const CONFIG2_RESET_VALUE: u8 = 0x24;
const SOFTRESET_MAGIC: u8 = 0x63;
const TOUCH_THRESHOLD: u8 = 12;
const RELEASE_THRESHOLD: u8 = 6;
/// Baseline tracking on, all 12 electrodes enabled.
const ECR_RUN_ALL: u8 = 0x8F;

pub struct Mpr121<I2C> {
    i2c: I2C,
    address: u8,
}

impl<I2C> Mpr121<I2C>
where
    I2C: I2c,
{
    pub fn new(i2c: I2C, address: u8) -> Self {
        Self { i2c, address }
    }

    /// Reset, verify identity, and start all electrodes.
    pub fn init(&mut self) -> Result<(), SensorError> {
        self.write_reg(reg::SOFTRESET, SOFTRESET_MAGIC)
            .map_err(|_| SensorError::NotDetected)?;
        self.write_reg(reg::ECR, 0x00)?;

        let config2 = self
            .read_reg(reg::CONFIG2)
            .map_err(|_| SensorError::NotDetected)?;
        if config2 != CONFIG2_RESET_VALUE {
            debug!("mpr121: CONFIG2 = {:#04x}, expected {:#04x}", config2, CONFIG2_RESET_VALUE);
            return Err(SensorError::NotDetected);
        }

        for ch in 0..CHANNEL_COUNT as u8 {
            self.write_reg(reg::TOUCHTH_0 + 2 * ch, TOUCH_THRESHOLD)?;
            self.write_reg(reg::RELEASETH_0 + 2 * ch, RELEASE_THRESHOLD)?;
        }

        // Baseline filter: rising, falling, touched.
        let filter: &[(u8, u8)] = &[
            (reg::MHDR, 0x01),
            (reg::NHDR, 0x01),
            (reg::NCLR, 0x0E),
            (reg::FDLR, 0x00),
            (reg::MHDF, 0x01),
            (reg::NHDF, 0x05),
            (reg::NCLF, 0x01),
            (reg::FDLF, 0x00),
            (reg::NHDT, 0x00),
            (reg::NCLT, 0x00),
            (reg::FDLT, 0x00),
            (reg::DEBOUNCE, 0x00),
            (reg::CONFIG1, 0x10), // 16 µA charge current
            (reg::CONFIG2, 0x20), // 0.5 µs encoding, 1 ms period
        ];
        for &(r, v) in filter {
            self.write_reg(r, v)?;
        }

        self.write_reg(reg::ECR, ECR_RUN_ALL)?;
        info!("mpr121: detected at {:#04x}", self.address);
        Ok(())
    }

    /// 10-bit filtered electrode data.
    pub fn filtered_data(&mut self, channel: u8) -> Result<u16, SensorError> {
        Self::check_channel(channel)?;
        let mut buf = [0u8; 2];
        self.i2c
            .write_read(self.address, &[reg::FILTDATA_0L + 2 * channel], &mut buf)
            .map_err(Self::bus_error)?;
        Ok(u16::from_le_bytes(buf) & 0x03FF)
    }

    /// Baseline-tracking value, scaled to the filtered-data range.
    pub fn baseline_data(&mut self, channel: u8) -> Result<u16, SensorError> {
        Self::check_channel(channel)?;
        let raw = self.read_reg(reg::BASELINE_0 + channel)?;
        Ok(u16::from(raw) << 2)
    }

    /// Give the bus back (tests, re-use by other drivers).
    pub fn release(self) -> I2C {
        self.i2c
    }

    fn check_channel(channel: u8) -> Result<(), SensorError> {
        if channel as usize >= CHANNEL_COUNT {
            return Err(SensorError::InvalidChannel(channel));
        }
        Ok(())
    }

    fn write_reg(&mut self, reg: u8, value: u8) -> Result<(), SensorError> {
        self.i2c
            .write(self.address, &[reg, value])
            .map_err(Self::bus_error)
    }

    fn read_reg(&mut self, reg: u8) -> Result<u8, SensorError> {
        let mut buf = [0u8; 1];
        self.i2c
            .write_read(self.address, &[reg], &mut buf)
            .map_err(Self::bus_error)?;
        Ok(buf[0])
    }

    fn bus_error(e: I2C::Error) -> SensorError {
        debug!("mpr121: i2c error {:?}", e.kind());
        SensorError::Bus
    }
}
