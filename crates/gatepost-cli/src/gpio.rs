//! Relay output and exit button on sysfs GPIO lines.
//!
//! Lines are exported through `<base>/export` and driven through
//! `<base>/gpioN/value`. The base is `/sys/class/gpio` on a real board;
//! tests point it at a temporary directory.

use gatepost_hardware::{ExitButton, HardwareError, Relay, Result};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

pub const SYSFS_GPIO_BASE: &str = "/sys/class/gpio";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    In,
    Out,
}

impl Direction {
    fn as_str(&self) -> &'static str {
        match self {
            Direction::In => "in",
            Direction::Out => "out",
        }
    }
}

/// One exported GPIO line.
#[derive(Debug, Clone)]
pub struct SysfsGpio {
    line: u32,
    active_low: bool,
    value_path: PathBuf,
}

impl SysfsGpio {
    /// Export `line` under `base` and set its direction.
    ///
    /// A line that is already exported is reused.
    pub async fn export(
        base: impl AsRef<Path>,
        line: u32,
        direction: Direction,
        active_low: bool,
    ) -> Result<Self> {
        let base = base.as_ref();
        let dir = base.join(format!("gpio{line}"));

        if fs::metadata(&dir).await.is_err() {
            fs::write(base.join("export"), line.to_string())
                .await
                .map_err(|e| gpio_error(line, "export", e))?;
            debug!(line, "GPIO exported");
        }

        fs::write(dir.join("direction"), direction.as_str())
            .await
            .map_err(|e| gpio_error(line, "set direction", e))?;

        info!(line, direction = direction.as_str(), active_low, "GPIO ready");
        Ok(Self {
            line,
            active_low,
            value_path: dir.join("value"),
        })
    }

    pub fn line(&self) -> u32 {
        self.line
    }

    /// Drive the line to its logical level.
    pub async fn write(&self, active: bool) -> Result<()> {
        let level = if active != self.active_low { "1" } else { "0" };
        fs::write(&self.value_path, level)
            .await
            .map_err(|e| gpio_error(self.line, "write", e))
    }

    /// Logical level of the line.
    pub async fn read(&self) -> Result<bool> {
        let raw = fs::read_to_string(&self.value_path)
            .await
            .map_err(|e| gpio_error(self.line, "read", e))?;

        let high = match raw.trim() {
            "1" => true,
            "0" => false,
            other => {
                return Err(HardwareError::invalid_data(format!(
                    "GPIO {} value {other:?}",
                    self.line
                )));
            }
        };
        Ok(high != self.active_low)
    }
}

fn gpio_error(line: u32, action: &str, error: std::io::Error) -> HardwareError {
    if error.kind() == ErrorKind::NotFound {
        HardwareError::disconnected(format!("GPIO {line}"))
    } else {
        HardwareError::communication(format!("GPIO {line} {action}: {error}"))
    }
}

/// Gate relay on an output line.
#[derive(Debug)]
pub struct SysfsRelay {
    gpio: SysfsGpio,
}

impl SysfsRelay {
    /// Export the line as an output and start released.
    pub async fn open(base: impl AsRef<Path>, line: u32, active_low: bool) -> Result<Self> {
        let gpio = SysfsGpio::export(base, line, Direction::Out, active_low).await?;
        gpio.write(false).await?;
        Ok(Self { gpio })
    }
}

impl Relay for SysfsRelay {
    async fn set_active(&mut self, active: bool) -> Result<()> {
        debug!(line = self.gpio.line(), active, "Relay");
        self.gpio.write(active).await
    }
}

/// Exit button on an input line, reporting each press once.
#[derive(Debug)]
pub struct SysfsButton {
    gpio: SysfsGpio,
    was_down: bool,
}

impl SysfsButton {
    pub async fn open(base: impl AsRef<Path>, line: u32, active_low: bool) -> Result<Self> {
        let gpio = SysfsGpio::export(base, line, Direction::In, active_low).await?;
        let was_down = gpio.read().await?;
        Ok(Self { gpio, was_down })
    }
}

impl ExitButton for SysfsButton {
    async fn is_pressed(&mut self) -> Result<bool> {
        let down = self.gpio.read().await?;
        let pressed = down && !self.was_down;
        self.was_down = down;
        Ok(pressed)
    }
}
