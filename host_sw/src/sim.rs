//! Behavioral simulation of the TEA5757 shift register.
//!
//! [`SimChip`] hands out in-process pin handles implementing the driver's pin
//! traits, all sharing one chip model:
//!
//! - while WRITE_ENABLE is high, each rising clock edge shifts the resolved
//!   DATA level into a 25-bit register, latched when WRITE_ENABLE falls;
//! - a clock-less WRITE_ENABLE pulse rewinds the read pointer, after which
//!   the chip presents its status word on DATA MSB first, advancing one bit
//!   per rising clock edge;
//! - DATA resolves to the host level while the host drives it, the chip's
//!   bit while the chip does, and pull-up high otherwise.
//!
//! The simulated delay only counts; the chip uses the running total to
//! measure how long each clock pulse was held.

use std::cell::RefCell;
use std::convert::Infallible;
use std::rc::Rc;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{ErrorType, InputPin, OutputPin};

use tea5757::bitbang::BidiPin;
use tea5757::command::{WORD_BITS, WORD_MASK};

#[derive(Debug)]
struct ChipState {
    clock_high: bool,
    wr_en_high: bool,
    host_drives_data: bool,
    host_data_level: bool,
    mo_st_high: bool,

    shift_in: u32,
    clocks_while_wr_en: u32,
    status: u32,
    read_pos: u32,
    read_armed: bool,
    words: Vec<u32>,

    delay_ns: u64,
    clock_rise_at: Option<u64>,
    min_clock_hold_ns: Option<u64>,
}

impl ChipState {
    fn new() -> Self {
        Self {
            clock_high: false,
            wr_en_high: false,
            host_drives_data: false,
            host_data_level: true,
            mo_st_high: true,

            shift_in: 0,
            clocks_while_wr_en: 0,
            status: 0,
            read_pos: 0,
            read_armed: false,
            words: Vec::new(),

            delay_ns: 0,
            clock_rise_at: None,
            min_clock_hold_ns: None,
        }
    }

    fn chip_drives_data(&self) -> bool {
        !self.wr_en_high && self.read_armed && self.read_pos < WORD_BITS
    }

    fn data_level(&self) -> bool {
        if self.host_drives_data {
            self.host_data_level
        } else if self.chip_drives_data() {
            (self.status >> (WORD_BITS - 1 - self.read_pos)) & 1 == 1
        } else {
            // Released line, held high by the pull-up.
            true
        }
    }

    fn clock_edge(&mut self, high: bool) {
        if high && !self.clock_high {
            self.clock_rise_at = Some(self.delay_ns);
            if self.wr_en_high {
                let bit = self.data_level() as u32;
                self.shift_in = (self.shift_in << 1) | bit;
                self.clocks_while_wr_en += 1;
            } else if self.read_armed && self.read_pos < WORD_BITS {
                self.read_pos += 1;
            }
        } else if !high && self.clock_high {
            if let Some(start) = self.clock_rise_at.take() {
                let hold = self.delay_ns - start;
                self.min_clock_hold_ns = Some(match self.min_clock_hold_ns {
                    Some(min) => min.min(hold),
                    None => hold,
                });
            }
        }
        self.clock_high = high;
    }

    fn wr_en_edge(&mut self, high: bool) {
        if high && !self.wr_en_high {
            self.shift_in = 0;
            self.clocks_while_wr_en = 0;
            self.read_armed = false;
        } else if !high && self.wr_en_high {
            if self.clocks_while_wr_en == WORD_BITS {
                self.status = self.shift_in & WORD_MASK;
                self.words.push(self.status);
            } else if self.clocks_while_wr_en == 0 {
                // A clock-less pulse is the read pointer rewind.
                self.read_armed = true;
                self.read_pos = 0;
            }
        }
        self.wr_en_high = high;
    }
}

/// A simulated TEA5757 plus the wiring to it.
///
/// Cloneable handles for each pin role are produced by the accessor methods;
/// the [`SimChip`] itself stays with the test for inspection.
pub struct SimChip {
    state: Rc<RefCell<ChipState>>,
}

impl SimChip {
    pub fn new() -> Self {
        Self {
            state: Rc::new(RefCell::new(ChipState::new())),
        }
    }

    pub fn mo_st(&self) -> SimMoStPin {
        SimMoStPin {
            state: Rc::clone(&self.state),
        }
    }

    pub fn clock(&self) -> SimClockPin {
        SimClockPin {
            state: Rc::clone(&self.state),
        }
    }

    pub fn data(&self) -> SimDataPin {
        SimDataPin {
            state: Rc::clone(&self.state),
        }
    }

    pub fn wr_en(&self) -> SimWrEnPin {
        SimWrEnPin {
            state: Rc::clone(&self.state),
        }
    }

    pub fn delay(&self) -> SimDelay {
        SimDelay {
            state: Rc::clone(&self.state),
        }
    }

    /// Load the status register the chip will present on the next read.
    pub fn set_status(&self, word: u32) {
        self.state.borrow_mut().status = word & WORD_MASK;
    }

    /// Drive the MO_ST line: a stereo pilot pulls it low.
    pub fn set_stereo(&self, stereo: bool) {
        self.state.borrow_mut().mo_st_high = !stereo;
    }

    /// The last complete word shifted into the chip, if any.
    pub fn last_word(&self) -> Option<u32> {
        self.state.borrow().words.last().copied()
    }

    /// Every complete word shifted into the chip, oldest first.
    pub fn words(&self) -> Vec<u32> {
        self.state.borrow().words.clone()
    }

    /// Whether the host has released the DATA line (input direction).
    pub fn host_releases_data(&self) -> bool {
        !self.state.borrow().host_drives_data
    }

    /// The resolved DATA line level.
    pub fn data_line_high(&self) -> bool {
        self.state.borrow().data_level()
    }

    pub fn wr_en_high(&self) -> bool {
        self.state.borrow().wr_en_high
    }

    pub fn clock_high(&self) -> bool {
        self.state.borrow().clock_high
    }

    /// Shortest observed clock-high hold, in nanoseconds.
    pub fn min_clock_hold_ns(&self) -> Option<u64> {
        self.state.borrow().min_clock_hold_ns
    }

    /// Total simulated time spent in delays, in nanoseconds.
    pub fn total_delay_ns(&self) -> u64 {
        self.state.borrow().delay_ns
    }
}

impl Default for SimChip {
    fn default() -> Self {
        Self::new()
    }
}

/// MO_ST handle.
pub struct SimMoStPin {
    state: Rc<RefCell<ChipState>>,
}

impl ErrorType for SimMoStPin {
    type Error = Infallible;
}

impl InputPin for SimMoStPin {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        Ok(self.state.borrow().mo_st_high)
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        Ok(!self.state.borrow().mo_st_high)
    }
}

/// CLOCK handle.
pub struct SimClockPin {
    state: Rc<RefCell<ChipState>>,
}

impl ErrorType for SimClockPin {
    type Error = Infallible;
}

impl OutputPin for SimClockPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.state.borrow_mut().clock_edge(false);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.state.borrow_mut().clock_edge(true);
        Ok(())
    }
}

/// DATA handle (bidirectional).
pub struct SimDataPin {
    state: Rc<RefCell<ChipState>>,
}

impl ErrorType for SimDataPin {
    type Error = Infallible;
}

impl OutputPin for SimDataPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.state.borrow_mut().host_data_level = false;
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.state.borrow_mut().host_data_level = true;
        Ok(())
    }
}

impl InputPin for SimDataPin {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        Ok(self.state.borrow().data_level())
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        Ok(!self.state.borrow().data_level())
    }
}

impl BidiPin for SimDataPin {
    fn set_to_input(&mut self) {
        self.state.borrow_mut().host_drives_data = false;
    }

    fn set_to_output(&mut self) {
        self.state.borrow_mut().host_drives_data = true;
    }
}

/// WRITE_ENABLE handle.
pub struct SimWrEnPin {
    state: Rc<RefCell<ChipState>>,
}

impl ErrorType for SimWrEnPin {
    type Error = Infallible;
}

impl OutputPin for SimWrEnPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.state.borrow_mut().wr_en_edge(false);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.state.borrow_mut().wr_en_edge(true);
        Ok(())
    }
}

/// Counting delay; advances the chip's notion of time without sleeping.
pub struct SimDelay {
    state: Rc<RefCell<ChipState>>,
}

impl DelayNs for SimDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.state.borrow_mut().delay_ns += ns as u64;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tea5757::command::{self, Band, PortConfig, SearchDirection, SearchLevel};
    use tea5757::{Tea5757, Tea5757BitBang, Tea5757Bus};

    type SimBus = Tea5757BitBang<SimMoStPin, SimClockPin, SimDataPin, SimWrEnPin, SimDelay>;

    fn bus_on(sim: &SimChip) -> SimBus {
        Tea5757BitBang::new(sim.mo_st(), sim.clock(), sim.data(), sim.wr_en(), sim.delay())
            .unwrap()
    }

    #[test]
    fn round_trip_preserves_all_25_bits() {
        let patterns = [
            0,
            WORD_MASK,
            0b1_0101_0101_0101_0101_0101_0101,
            0b0_1010_1010_1010_1010_1010_1010,
            1,
            1 << (WORD_BITS - 1),
            0x123_4567,
        ];
        for pattern in patterns {
            let sim = SimChip::new();
            let mut bus = bus_on(&sim);
            bus.write_word(pattern).unwrap();
            assert_eq!(bus.read_word().unwrap(), pattern, "pattern {pattern:#027b}");
        }
    }

    #[test]
    fn transmit_leaves_bus_idle() {
        let sim = SimChip::new();
        let mut bus = bus_on(&sim);
        for pattern in [0, WORD_MASK, 0x00A_5A5A] {
            bus.write_word(pattern).unwrap();
            assert!(sim.host_releases_data());
            assert!(sim.data_line_high());
            assert!(!sim.wr_en_high());
            assert!(!sim.clock_high());
        }
    }

    #[test]
    fn consecutive_reads_agree() {
        let sim = SimChip::new();
        let mut bus = bus_on(&sim);
        sim.set_status(0x15A_5A5A & WORD_MASK);
        let first = bus.read_word().unwrap();
        let second = bus.read_word().unwrap();
        assert_eq!(first, 0x15A_5A5A & WORD_MASK);
        assert_eq!(first, second);
    }

    #[test]
    fn preset_transmits_the_encoded_word() {
        let sim = SimChip::new();
        let mut radio = Tea5757::new(bus_on(&sim));
        radio.preset(Band::Fm, 1017).unwrap();
        assert_eq!(
            sim.last_word(),
            Some(command::preset_word(Band::Fm, 1017, PortConfig::DVD_MODULE))
        );

        radio.preset(Band::Am, 99).unwrap();
        assert_eq!(
            sim.last_word(),
            Some(command::preset_word(Band::Am, 99, PortConfig::DVD_MODULE))
        );
        assert_eq!(sim.words().len(), 2);
    }

    #[test]
    fn search_transmits_the_encoded_word() {
        let sim = SimChip::new();
        let mut radio = Tea5757::with_port_config(bus_on(&sim), PortConfig::STEREO_MODULE);
        radio
            .search(Band::Am, SearchLevel::Level3, SearchDirection::Up)
            .unwrap();
        assert_eq!(
            sim.last_word(),
            Some((1 << 24) | (1 << 23) | (1 << 20) | (1 << 17))
        );
    }

    #[test]
    fn pll_frequency_masks_the_status_word() {
        let sim = SimChip::new();
        let mut radio = Tea5757::new(bus_on(&sim));
        for status in [0, WORD_MASK, 0x1AB_CDEF & WORD_MASK, (1 << 24) | 8996] {
            sim.set_status(status);
            assert_eq!(radio.pll_frequency().unwrap(), (status & 0x7FFF) as u16);
        }
    }

    #[test]
    fn stereo_follows_the_mo_st_line() {
        let sim = SimChip::new();
        let mut radio = Tea5757::new(bus_on(&sim));
        assert!(!radio.is_stereo().unwrap());

        sim.set_stereo(true);
        assert!(radio.is_stereo().unwrap());

        sim.set_stereo(false);
        assert!(!radio.is_stereo().unwrap());
    }

    #[test]
    fn clock_hold_meets_the_datasheet_minimum() {
        let sim = SimChip::new();
        let mut bus = bus_on(&sim);
        bus.write_word(0x155_5555).unwrap();
        bus.read_word().unwrap();
        assert!(sim.min_clock_hold_ns().unwrap() >= 5_000);
    }

    #[test]
    fn slower_timing_is_respected() {
        let sim = SimChip::new();
        let mut bus = bus_on(&sim);
        bus.set_timing_us(20);
        bus.write_word(0).unwrap();
        assert!(sim.min_clock_hold_ns().unwrap() >= 20_000);
        // 25 clock pulses, one hold each.
        assert!(sim.total_delay_ns() >= 25 * 20_000);
    }

    #[test]
    fn timing_cannot_go_below_the_minimum() {
        let sim = SimChip::new();
        let mut bus = bus_on(&sim);
        bus.set_timing_us(1);
        bus.write_word(0).unwrap();
        assert!(sim.min_clock_hold_ns().unwrap() >= 5_000);
    }
}
