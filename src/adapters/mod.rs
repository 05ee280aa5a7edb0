//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter    | Implements         | Connects to                    |
//! |------------|--------------------|--------------------------------|
//! | `hardware` | SensorPort         | MPR121 over I²C, float GPIO    |
//! |            | ActuatorPort       | Pump SSR GPIOs                 |
//! |            | ManualControlPort  | Jog / Start button GPIOs       |
//! | `log_sink` | EventSink          | Serial log output              |

pub mod hardware;
pub mod log_sink;
