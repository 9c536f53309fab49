use embedded_hal::delay::DelayNs;

/// `DelayNs` backed by the OS scheduler.
///
/// Coarse, but the tuner bus only needs minimum holds; oversleeping a 5 µs
/// delay is always safe.
pub struct HostDelay;

impl DelayNs for HostDelay {
    fn delay_ns(&mut self, ns: u32) {
        std::thread::sleep(std::time::Duration::from_nanos(ns as u64));
    }
}
