//! TEA5757 bit-banged 3-wire bus (CLOCK, DATA, WRITE_ENABLE) plus the MO_ST
//! status input.
//!
//! Wire protocol, per the device datasheet:
//! - write: `WR_EN↑`, 25 data bits MSB first with one clock pulse each, `WR_EN↓`
//! - read:  a clock-less `WR_EN` pulse rewinds the chip's read pointer, after
//!   which the first (most significant) bit is already on the line; 24 more
//!   bits follow one clock pulse each
//! - DATA is bidirectional and idles high as an input; the chip sits in read
//!   mode whenever `WR_EN` is low, so the bus is left that way between
//!   transfers.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};

use crate::command::{WORD_BITS, WORD_MSB};

/// A bidirectional GPIO line (used for TEA5757 DATA).
///
/// The TEA5757 uses a single data pin in both directions. During reads the
/// host must release the line (switch it to input) so the chip can drive it,
/// and reclaim it as an output before shifting a command out. While the line
/// is an input it must be biased high (the idle/read convention of the bus),
/// either by a pull-up kept active in input mode or by an external resistor.
pub trait BidiPin: OutputPin + InputPin {
    /// Switch the pin to input mode (enabling the input path if applicable).
    fn set_to_input(&mut self);
    /// Switch the pin to output mode, driving the last level set.
    fn set_to_output(&mut self);
}

/// Errors returned by the bit-bang bus, one variant per line.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Error<MostE, ClkE, DataE, WrE> {
    /// Error reading MO_ST.
    MoSt(MostE),
    /// Error driving CLOCK.
    Clock(ClkE),
    /// Error driving/reading DATA.
    Data(DataE),
    /// Error driving WRITE_ENABLE.
    WrEn(WrE),
}

/// Word-level bus interface to a TEA5757.
///
/// [`Tea5757BitBang`] is the pin-level implementation; a test double or a
/// remoted transport can stand in behind the same trait.
pub trait Tea5757Bus {
    type Error;

    /// Shift a 25-bit control word out to the device, MSB first.
    fn write_word(&mut self, word: u32) -> Result<(), Self::Error>;

    /// Shift the 25-bit status word in from the device, MSB first.
    fn read_word(&mut self) -> Result<u32, Self::Error>;

    /// Sample the MO_ST line. `true` means the stereo pilot is detected
    /// (the chip pulls the line low on a stereo FM station).
    fn stereo_pilot(&mut self) -> Result<bool, Self::Error>;
}

/// Bit-banged TEA5757 bus implementation.
///
/// `CLK` and `WR` are push-pull outputs, `MOST` is an input (give it a solid
/// pull-up; the stereo indication depends on a robust high level), and `DATA`
/// must be bidirectional ([`BidiPin`]).
pub struct Tea5757BitBang<MOST, CLK, DATA, WR, D> {
    mo_st: MOST,
    clock: CLK,
    data: DATA,
    wr_en: WR,
    delay: D,
    /// Delay used throughout the waveform (microseconds).
    t_us: u32,
}

impl<MOST, CLK, DATA, WR, D> Tea5757BitBang<MOST, CLK, DATA, WR, D>
where
    MOST: InputPin,
    CLK: OutputPin,
    DATA: BidiPin,
    WR: OutputPin,
    D: DelayNs,
{
    /// Minimum clock-high hold the chip is specified for; also the default
    /// bit delay.
    pub const MIN_DELAY_US: u32 = 5;

    /// Create a new bus instance and put the lines into their idle state:
    /// WR_EN low (read mode), CLOCK low, DATA released high.
    pub fn new(
        mo_st: MOST,
        mut clock: CLK,
        mut data: DATA,
        mut wr_en: WR,
        delay: D,
    ) -> Result<Self, Error<MOST::Error, CLK::Error, DATA::Error, WR::Error>> {
        wr_en.set_low().map_err(Error::WrEn)?;
        clock.set_low().map_err(Error::Clock)?;
        data.set_high().map_err(Error::Data)?;
        data.set_to_input();

        Ok(Self {
            mo_st,
            clock,
            data,
            wr_en,
            delay,
            t_us: Self::MIN_DELAY_US,
        })
    }

    /// Set the delay used by the waveform, in microseconds.
    ///
    /// Values below the 5 µs datasheet minimum are clamped; longer holds are
    /// always safe.
    #[inline]
    pub fn set_timing_us(&mut self, t_us: u32) {
        self.t_us = t_us.max(Self::MIN_DELAY_US);
    }

    /// Destroy the bus and return the owned pins and delay.
    #[inline]
    pub fn free(self) -> (MOST, CLK, DATA, WR, D) {
        (self.mo_st, self.clock, self.data, self.wr_en, self.delay)
    }

    #[inline(always)]
    fn dly(&mut self) {
        self.delay.delay_us(self.t_us);
    }

    /// One clock pulse: high, hold, low. Exactly one per bit in both
    /// directions.
    fn clock_pulse(&mut self) -> Result<(), Error<MOST::Error, CLK::Error, DATA::Error, WR::Error>> {
        self.clock.set_high().map_err(Error::Clock)?;
        self.dly();
        self.clock.set_low().map_err(Error::Clock)?;
        Ok(())
    }

    fn write_word_raw(
        &mut self,
        mut word: u32,
    ) -> Result<(), Error<MOST::Error, CLK::Error, DATA::Error, WR::Error>> {
        // Enter write mode and claim the data line.
        self.wr_en.set_high().map_err(Error::WrEn)?;
        self.data.set_to_output();

        for _ in 0..WORD_BITS {
            if word & WORD_MSB == 0 {
                self.data.set_low().map_err(Error::Data)?;
            } else {
                self.data.set_high().map_err(Error::Data)?;
            }
            self.clock_pulse()?;
            word <<= 1;
        }

        // Back to read (idle) mode: release DATA high, drop WR_EN.
        self.data.set_high().map_err(Error::Data)?;
        self.data.set_to_input();
        self.wr_en.set_low().map_err(Error::WrEn)?;
        Ok(())
    }

    fn read_word_raw(
        &mut self,
    ) -> Result<u32, Error<MOST::Error, CLK::Error, DATA::Error, WR::Error>> {
        // The chip is already in read mode (it is kept so while idle).
        // Toggling WR_EN without clocking rewinds its read pointer.
        self.wr_en.set_high().map_err(Error::WrEn)?;
        self.dly();
        self.wr_en.set_low().map_err(Error::WrEn)?;

        // The MSB is on the line as soon as WR_EN is back low.
        self.dly();
        let mut word: u32 = if self.data.is_high().map_err(Error::Data)? {
            1
        } else {
            0
        };

        for _ in 0..WORD_BITS - 1 {
            word <<= 1;
            self.clock_pulse()?;
            if self.data.is_high().map_err(Error::Data)? {
                word |= 1;
            }
        }
        Ok(word)
    }
}

impl<MOST, CLK, DATA, WR, D> Tea5757Bus for Tea5757BitBang<MOST, CLK, DATA, WR, D>
where
    MOST: InputPin,
    CLK: OutputPin,
    DATA: BidiPin,
    WR: OutputPin,
    D: DelayNs,
{
    type Error = Error<MOST::Error, CLK::Error, DATA::Error, WR::Error>;

    #[inline]
    fn write_word(&mut self, word: u32) -> Result<(), Self::Error> {
        self.write_word_raw(word)
    }

    #[inline]
    fn read_word(&mut self) -> Result<u32, Self::Error> {
        self.read_word_raw()
    }

    #[inline]
    fn stereo_pilot(&mut self) -> Result<bool, Self::Error> {
        self.mo_st.is_low().map_err(Error::MoSt)
    }
}
