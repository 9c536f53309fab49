//! High-level tuning operations on top of a [`Tea5757Bus`].

use crate::bitbang::Tea5757Bus;
use crate::command::{self, Band, PortConfig, SearchDirection, SearchLevel};

/// A TEA5757 accessed through some bus, carrying the module's fixed port
/// configuration.
pub struct Tea5757<BUS> {
    bus: BUS,
    port: PortConfig,
}

impl<BUS> Tea5757<BUS> {
    /// Wrap a bus using the default (DVD module) port configuration.
    pub const fn new(bus: BUS) -> Self {
        Self::with_port_config(bus, PortConfig::DVD_MODULE)
    }

    /// Wrap a bus with an explicit port configuration for the hardware at
    /// hand.
    pub const fn with_port_config(bus: BUS, port: PortConfig) -> Self {
        Self { bus, port }
    }

    /// The port configuration OR'ed into every transmitted command.
    #[inline]
    pub const fn port_config(&self) -> PortConfig {
        self.port
    }

    /// Destroy the driver and return the bus.
    #[inline]
    pub fn free(self) -> BUS {
        self.bus
    }
}

impl<BUS> Tea5757<BUS>
where
    BUS: Tea5757Bus,
{
    /// Tune straight to `frequency` on `band`.
    ///
    /// Units are those of the band: 0.1 MHz steps on FM (880..=1080),
    /// 10 kHz steps on AM (53..=170).
    pub fn preset(&mut self, band: Band, frequency: u16) -> Result<(), BUS::Error> {
        self.bus
            .write_word(command::preset_word(band, frequency, self.port))
    }

    /// Start a search for the next station on `band`, stopping at signals
    /// above `level`, moving in `direction`.
    pub fn search(
        &mut self,
        band: Band,
        level: SearchLevel,
        direction: SearchDirection,
    ) -> Result<(), BUS::Error> {
        self.bus
            .write_word(command::search_word(band, level, direction, self.port))
    }

    /// Read back the PLL divider register.
    ///
    /// The chip only reports a divider after a search; it reads 0 in preset
    /// mode or when no station was found. Converting the divider to a
    /// frequency is the caller's business: on FM the tuned frequency in
    /// 0.1 MHz steps is `divider / 8 - 107`, on AM in 10 kHz steps it is
    /// `divider / 10 - 45`.
    pub fn pll_frequency(&mut self) -> Result<u16, BUS::Error> {
        Ok(command::pll_divider(self.bus.read_word()?))
    }

    /// Whether the chip detects a stereo pilot. Only meaningful on FM.
    pub fn is_stereo(&mut self) -> Result<bool, BUS::Error> {
        self.bus.stereo_pilot()
    }
}
