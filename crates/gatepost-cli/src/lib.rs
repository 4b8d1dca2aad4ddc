//! Wiring of the gatepost terminal binary.
//!
//! Everything the `gatepost` binary needs besides `main` itself: the TOML
//! configuration, the device-identity file, the sysfs GPIO relay and exit
//! button, and the console status display.

pub mod config;
pub mod display;
pub mod gpio;
pub mod identity;

pub use config::{Config, ConfigError};
pub use display::ConsoleDisplay;
pub use gpio::{SysfsButton, SysfsGpio, SysfsRelay};
pub use identity::{IdentityError, provision_identity, read_identity};
