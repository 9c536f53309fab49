//! Linux GPIO character-device backend.
//!
//! Maps the driver's pin roles onto `gpiocdev` line requests, one request per
//! line, so a TEA5757 module can be driven straight from e.g. a Raspberry Pi
//! header. DATA direction flips are done by reconfiguring the line; the
//! requested level is remembered so `set_high`/`set_low` are safe to call in
//! either direction.

use embedded_hal::digital::{self, ErrorType, InputPin, OutputPin};
use gpiocdev::line::{Bias, Offset, Value};
use gpiocdev::request::{Config, Request};
use thiserror::Error;

use tea5757::bitbang::BidiPin;

/// Consumer label attached to every requested line.
const CONSUMER: &str = "tea5757";

/// Failed to set up a GPIO line request.
#[derive(Debug, Error)]
#[error("failed to request line {offset} on {chip}: {source}")]
pub struct LinuxGpioError {
    pub chip: String,
    pub offset: Offset,
    #[source]
    pub source: gpiocdev::Error,
}

/// Error performing an operation on an already-requested line.
#[derive(Debug, Error)]
#[error("GPIO line operation failed: {0}")]
pub struct LineError(pub gpiocdev::Error);

impl digital::Error for LineError {
    fn kind(&self) -> digital::ErrorKind {
        digital::ErrorKind::Other
    }
}

fn request(chip: &str, cfg: Config, offset: Offset) -> Result<Request, LinuxGpioError> {
    Request::from_config(cfg)
        .on_chip(chip)
        .with_consumer(CONSUMER)
        .request()
        .map_err(|source| LinuxGpioError {
            chip: chip.to_string(),
            offset,
            source,
        })
}

/// Push-pull output line (CLOCK, WRITE_ENABLE).
pub struct OutputLine {
    req: Request,
    offset: Offset,
}

impl OutputLine {
    pub fn open(chip: &str, offset: Offset, initial: Value) -> Result<Self, LinuxGpioError> {
        let mut cfg = Config::default();
        cfg.with_line(offset).as_output(initial);
        let req = request(chip, cfg, offset)?;
        log::debug!("requested output line {offset} on {chip}");
        Ok(Self { req, offset })
    }
}

impl ErrorType for OutputLine {
    type Error = LineError;
}

impl OutputPin for OutputLine {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.req
            .set_value(self.offset, Value::Inactive)
            .map(|_| ())
            .map_err(LineError)
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.req
            .set_value(self.offset, Value::Active)
            .map(|_| ())
            .map_err(LineError)
    }
}

/// Pull-up biased input line (MO_ST).
///
/// The kernel pull-up is requested, but the stereo indication depends on a
/// robust high level; an external pull-up on the module side is still
/// recommended.
pub struct InputLine {
    req: Request,
    offset: Offset,
}

impl InputLine {
    pub fn open(chip: &str, offset: Offset) -> Result<Self, LinuxGpioError> {
        let mut cfg = Config::default();
        cfg.with_line(offset).as_input().with_bias(Bias::PullUp);
        let req = request(chip, cfg, offset)?;
        log::debug!("requested input line {offset} on {chip}");
        Ok(Self { req, offset })
    }
}

impl ErrorType for InputLine {
    type Error = LineError;
}

impl InputPin for InputLine {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        Ok(self.req.value(self.offset).map_err(LineError)? == Value::Active)
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        self.is_high().map(|high| !high)
    }
}

/// Bidirectional line for the DATA role.
///
/// Starts released (input with pull-up), the bus idle convention.
pub struct BidiLine {
    req: Request,
    offset: Offset,
    is_output: bool,
    level: Value,
}

impl BidiLine {
    pub fn open(chip: &str, offset: Offset) -> Result<Self, LinuxGpioError> {
        let mut cfg = Config::default();
        cfg.with_line(offset).as_input().with_bias(Bias::PullUp);
        let req = request(chip, cfg, offset)?;
        log::debug!("requested bidirectional line {offset} on {chip}");
        Ok(Self {
            req,
            offset,
            is_output: false,
            level: Value::Active,
        })
    }

    fn set_level(&mut self, level: Value) -> Result<(), LineError> {
        self.level = level;
        if self.is_output {
            self.req
                .set_value(self.offset, level)
                .map(|_| ())
                .map_err(LineError)?;
        }
        Ok(())
    }

    fn set_direction(&mut self, output: bool) {
        if self.is_output == output {
            return;
        }
        let mut cfg = Config::default();
        if output {
            cfg.with_line(self.offset).as_output(self.level);
        } else {
            cfg.with_line(self.offset).as_input().with_bias(Bias::PullUp);
        }
        if let Err(e) = self.req.reconfigure(&cfg) {
            log::error!("failed to flip DATA line {} direction: {e}", self.offset);
        }
        self.is_output = output;
    }
}

impl ErrorType for BidiLine {
    type Error = LineError;
}

impl OutputPin for BidiLine {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.set_level(Value::Inactive)
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.set_level(Value::Active)
    }
}

impl InputPin for BidiLine {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        if self.is_output {
            return Ok(self.level == Value::Active);
        }
        Ok(self.req.value(self.offset).map_err(LineError)? == Value::Active)
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        self.is_high().map(|high| !high)
    }
}

impl BidiPin for BidiLine {
    fn set_to_input(&mut self) {
        self.set_direction(false);
    }

    fn set_to_output(&mut self) {
        self.set_direction(true);
    }
}
