//! AquaAuto Transfer Demo: Main Entry Point
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  HardwareAdapter                        LogEventSink           │
//! │  (Sensor + Actuator + ManualControl)    (EventSink)            │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │  bring_up (setup phase) ──▶ AppService (transfer loop) │    │
//! │  │  Calibration · FSM · StallMonitor                      │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use anyhow::Result;
use esp_idf_hal::delay::FreeRtos;
use esp_idf_hal::gpio::{AnyIOPin, AnyInputPin, AnyOutputPin, Input, PinDriver, Pull};
use esp_idf_hal::i2c::{I2cConfig, I2cDriver};
use esp_idf_hal::peripherals::Peripherals;
use esp_idf_hal::units::Hertz;
use log::{error, info, warn};

use aquaauto::adapters::hardware::HardwareAdapter;
use aquaauto::adapters::log_sink::LogEventSink;
use aquaauto::app::setup::bring_up;
use aquaauto::config::SystemConfig;
use aquaauto::drivers::button::ManualButtons;
use aquaauto::drivers::pump::PumpDriver;
use aquaauto::pins;
use aquaauto::sensors::float_switch::FloatSwitch;
use aquaauto::sensors::mpr121::Mpr121;

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  AquaAuto MF Demo v{}             ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    // ── 2. Config (defaults, or a build-time JSON override) ───
    let config = match option_env!("AQUAAUTO_CONFIG_JSON") {
        Some(doc) => SystemConfig::from_json(doc).unwrap_or_else(|e| {
            warn!("Build-time config rejected ({}), using defaults", e);
            SystemConfig::default()
        }),
        None => SystemConfig::default(),
    };

    // ── 3. Peripherals ────────────────────────────────────────
    let peripherals = Peripherals::take()?;

    // SAFETY: each GPIO number below is claimed exactly once, here, and
    // none of them is also taken through `peripherals.pins`.
    let (sda, scl, out_left, out_right, in_float, in_left, in_right, in_start) = unsafe {
        (
            AnyIOPin::new(pins::I2C_SDA_GPIO),
            AnyIOPin::new(pins::I2C_SCL_GPIO),
            AnyOutputPin::new(pins::PUMP_LEFT_GPIO),
            AnyOutputPin::new(pins::PUMP_RIGHT_GPIO),
            AnyInputPin::new(pins::FLOAT_TOP_GPIO),
            AnyInputPin::new(pins::BUTTON_PUMP_LEFT_GPIO),
            AnyInputPin::new(pins::BUTTON_PUMP_RIGHT_GPIO),
            AnyInputPin::new(pins::BUTTON_START_GPIO),
        )
    };

    // Pumps first, so both SSRs are driven low as early as possible.
    let pump_left = PumpDriver::new(PinDriver::output(out_left)?);
    let pump_right = PumpDriver::new(PinDriver::output(out_right)?);

    let pulled_up = |pin: AnyInputPin| -> Result<PinDriver<'static, AnyInputPin, Input>> {
        let mut driver = PinDriver::input(pin)?;
        driver.set_pull(Pull::Up)?;
        Ok(driver)
    };
    let float = FloatSwitch::new(pulled_up(in_float)?, config.float_trip_high);
    let buttons = ManualButtons::new(
        pulled_up(in_left)?,
        pulled_up(in_right)?,
        pulled_up(in_start)?,
    );

    let i2c_config = I2cConfig::new().baudrate(Hertz(pins::I2C_BAUD_HZ));
    let i2c = I2cDriver::new(peripherals.i2c0, sda, scl, &i2c_config)?;

    // ── 4. Sensor detection ───────────────────────────────────
    let mut mpr121 = Mpr121::new(i2c, config.mpr121_address);
    if let Err(e) = mpr121.init() {
        error!("MPR121 not found, check wiring? ({}), suspending execution", e);
        park();
    }
    info!("MPR121 found at 0x{:02X}", config.mpr121_address);

    let mut hw = HardwareAdapter::new(mpr121, pump_left, pump_right, float, buttons);
    let mut delay = FreeRtos;
    let mut sink = LogEventSink::new();

    // ── 5. Setup phase ────────────────────────────────────────
    let mut app = match bring_up(&mut hw, &mut delay, config, &mut sink) {
        Ok(app) => app,
        Err(e) => {
            error!("Bring-up failed: {}, suspending execution", e);
            park();
        }
    };

    // ── 6. Transfer loop (returns only on a halt) ─────────────
    app.start(&mut sink);
    let fault = app.run(&mut hw, &mut delay, &mut sink);
    error!("Transfer halted: {}, reset required", fault);
    park();
}

/// Idle forever.  The pumps are already off; only a reset gets out.
fn park() -> ! {
    loop {
        FreeRtos::delay_ms(1000);
    }
}
