#![cfg_attr(not(test), no_std)]

//! Driver for the Philips TEA5757 self-tuning AM/FM radio ("radio-on-chip").
//!
//! The chip is programmed through a single 25-bit shift register over a
//! 3-wire bit-banged bus (CLOCK, bidirectional DATA, WRITE_ENABLE); a fourth
//! line, MO_ST, reports stereo pilot detection. This crate splits the work
//! the way the hardware does:
//!
//! - [`command`]: pure encoders from tuning parameters to the 25-bit
//!   control word, and back from the status word.
//! - [`bitbang`]: the wire protocol over `embedded-hal` pins, behind the
//!   [`Tea5757Bus`] trait.
//! - [`driver`]: [`Tea5757`], the preset/search/status operation surface.
//!
//! Tuning granularity is 0.1 MHz on FM and 10 kHz on AM. Not compatible with
//! the (I2C-controlled) TEA5767.

pub mod bitbang;
pub mod command;
pub mod driver;

pub use bitbang::{BidiPin, Error, Tea5757BitBang, Tea5757Bus};
pub use command::{Band, PortConfig, SearchDirection, SearchLevel};
pub use driver::Tea5757;
