//! Line configuration.
//!
//! The line format is fixed at 8 data bits, no parity, 1 stop bit; only the
//! bit rate is configurable. [`UartConfig::BUILD`] carries the clock and baud
//! rate baked in by the build script (`IRQSERIAL_CLOCK_HZ`,
//! `IRQSERIAL_BAUD`).

use irqserial_core::static_assert;

use crate::error::ConfigError;
use crate::hw::UartPeripheral;

mod generated {
    include!(concat!(env!("OUT_DIR"), "/build_config.rs"));
}

pub use generated::{BUILD_BAUD, BUILD_CLOCK_HZ};

/// Computes the baud-rate divisor `clock_hz / baud` (integer division).
///
/// # Errors
///
/// Returns [`ConfigError::BaudOutOfRange`] if `baud` is zero, or the divisor
/// falls outside `min..=max` (a zero divisor, baud faster than the clock, is
/// always rejected).
pub const fn baud_divisor(
    clock_hz: u32,
    baud: u32,
    min: u32,
    max: u32,
) -> Result<u32, ConfigError> {
    if baud == 0 {
        return Err(ConfigError::BaudOutOfRange { divisor: 0 });
    }
    let divisor = clock_hz / baud;
    if divisor == 0 || divisor < min || divisor > max {
        return Err(ConfigError::BaudOutOfRange { divisor });
    }
    Ok(divisor)
}

/// Smallest divisor any supported peripheral accepts; both chip families
/// oversample each bit 16 times.
pub const MIN_SUPPORTED_DIVISOR: u32 = 16;

// Rejects an `IRQSERIAL_BAUD` no chip can produce when the crate is built,
// before any peripheral is chosen.
static_assert!(
    BUILD_CLOCK_HZ / BUILD_BAUD >= MIN_SUPPORTED_DIVISOR,
    "Baud rate out of range: IRQSERIAL_BAUD exceeds IRQSERIAL_CLOCK_HZ / 16"
);

/// Clock and bit rate for [`Uart::configure`](crate::Uart::configure).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UartConfig {
    /// Peripheral input clock in Hz.
    pub clock_hz: u32,
    /// Line speed in bits per second.
    pub baud: u32,
}

impl UartConfig {
    /// The configuration baked in at build time.
    pub const BUILD: Self = Self::new(BUILD_CLOCK_HZ, BUILD_BAUD);

    /// Creates a configuration.
    #[must_use]
    pub const fn new(clock_hz: u32, baud: u32) -> Self {
        Self { clock_hz, baud }
    }

    /// Returns the divisor for peripheral `P`.
    ///
    /// # Errors
    ///
    /// See [`baud_divisor`].
    pub const fn check<P: UartPeripheral>(&self) -> Result<u32, ConfigError> {
        baud_divisor(self.clock_hz, self.baud, P::MIN_DIVISOR, P::MAX_DIVISOR)
    }

    /// Returns `self`, failing const evaluation if the divisor does not fit
    /// peripheral `P`.
    ///
    /// Use in a `const` item to turn a bad build configuration into a
    /// compile error:
    ///
    /// ```ignore
    /// const CONFIG: UartConfig = UartConfig::BUILD.validated::<Stm32Usart>();
    /// ```
    ///
    /// # Panics
    ///
    /// Panics (at compile time, in const context) if [`check`](Self::check)
    /// fails.
    #[must_use]
    pub const fn validated<P: UartPeripheral>(self) -> Self {
        match self.check::<P>() {
            Ok(_) => self,
            Err(_) => panic!("Baud rate out of range"),
        }
    }
}

impl Default for UartConfig {
    fn default() -> Self {
        Self::BUILD
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockUart;

    static_assert!(
        UartConfig::new(16_000_000, 9600).check::<MockUart>().is_ok(),
        "Baud rate out of range"
    );

    const MIN: u32 = 16;
    const MAX: u32 = 0xFFFF;

    #[test]
    fn divisor_for_16mhz_9600() {
        assert_eq!(baud_divisor(16_000_000, 9600, MIN, MAX), Ok(1666));
    }

    #[test]
    fn divisor_for_24mhz_9600() {
        assert_eq!(baud_divisor(24_000_000, 9600, MIN, MAX), Ok(2500));
    }

    #[test]
    fn divisor_above_register_range() {
        assert_eq!(
            baud_divisor(16_000_000, 200, MIN, MAX),
            Err(ConfigError::BaudOutOfRange { divisor: 80_000 })
        );
    }

    #[test]
    fn divisor_at_register_limits() {
        assert_eq!(baud_divisor(MAX, 1, MIN, MAX), Ok(MAX));
        assert!(baud_divisor(MAX + 1, 1, MIN, MAX).is_err());
        assert_eq!(baud_divisor(16_000_000, 1_000_000, MIN, MAX), Ok(16));
    }

    #[test]
    fn divisor_below_oversampling_rejected() {
        assert_eq!(
            baud_divisor(16_000_000, 2_000_000, MIN, MAX),
            Err(ConfigError::BaudOutOfRange { divisor: 8 })
        );
        assert_eq!(
            baud_divisor(16_000_000, 1_066_667, MIN, MAX),
            Err(ConfigError::BaudOutOfRange { divisor: 14 })
        );
    }

    #[test]
    fn zero_baud_rejected() {
        assert_eq!(
            baud_divisor(16_000_000, 0, MIN, MAX),
            Err(ConfigError::BaudOutOfRange { divisor: 0 })
        );
    }

    #[test]
    fn baud_faster_than_clock_rejected() {
        assert_eq!(
            baud_divisor(9600, 115_200, 0, MAX),
            Err(ConfigError::BaudOutOfRange { divisor: 0 })
        );
    }

    #[test]
    fn validated_passes_good_config_through() {
        const CONFIG: UartConfig = UartConfig::new(16_000_000, 9600).validated::<MockUart>();
        assert_eq!(CONFIG.baud, 9600);
    }

    #[test]
    #[should_panic(expected = "Baud rate out of range")]
    fn validated_rejects_bad_config() {
        let _ = UartConfig::new(16_000_000, 100).validated::<MockUart>();
    }

    #[test]
    fn default_is_build_config() {
        assert_eq!(UartConfig::default(), UartConfig::BUILD);
        assert_eq!(UartConfig::BUILD.clock_hz, BUILD_CLOCK_HZ);
    }
}
