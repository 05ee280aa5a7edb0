//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events to
//! the `log` facade (the ESP-IDF logger on target, which goes to UART /
//! USB-CDC).  One tagged line per event so the console can be grepped.

use core::fmt::Write;

use heapless::String;
use log::{error, info, warn};

use crate::app::events::{AppEvent, CycleReport};
use crate::app::ports::EventSink;

/// Long enough for a cycle line with six negative four-digit diffs.
const LINE_CAP: usize = 160;

/// Adapter that logs every [`AppEvent`] to the serial console.
#[derive(Debug, Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Started(state) => {
                info!("START | initial_state={}", state);
            }
            AppEvent::Cycle(report) => {
                info!("{}", format_cycle(report));
            }
            AppEvent::StateChanged { from, to } => {
                info!("STATE | {} -> {}", from, to);
            }
            AppEvent::BaselineCaptured(values) => {
                info!("BASELINE | {:?}", values);
            }
            AppEvent::ManualControl { left, right } => {
                info!("MANUAL | left={} right={}", on_off(*left), on_off(*right));
            }
            AppEvent::ManualConflict => {
                warn!("MANUAL | both buttons held, pumps off");
            }
            AppEvent::PumpWriteFailed { side, on } => {
                warn!("PUMP | {:?} {} write failed, retrying", side, on_off(*on));
            }
            AppEvent::Halted(fault) => {
                error!("HALT | {} | pumps off, reset required", fault);
            }
        }
    }
}

fn on_off(on: bool) -> &'static str {
    if on { "on" } else { "off" }
}

/// `CYCLE | #12 | state=DrainWaitLevel3 | diffs=[3, 40, 41, 44, 47, 52] | float=dry`
pub fn format_cycle(report: &CycleReport) -> String<LINE_CAP> {
    let mut line = String::new();
    // A full buffer truncates the line; nothing else can fail here.
    let _ = write!(line, "CYCLE | #{} | state=", report.cycle);
    let _ = match report.state {
        Some(state) => write!(line, "{}", state),
        None => line.write_str("?"),
    };
    let _ = write!(
        line,
        " | diffs={:?} | float={}",
        report.level_diffs,
        report.float.label()
    );
    line
}
