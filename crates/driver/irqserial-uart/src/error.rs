//! Driver error types.

use core::fmt;

/// The transmit queue has no free slot.
///
/// Recoverable: nothing was queued, so the caller may retry once the
/// interrupt handler has drained some bytes, or drop the byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueFull;

impl fmt::Display for QueueFull {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("transmit queue full")
    }
}

/// Errors that can occur while configuring the UART.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// `clock_hz / baud` is zero or does not fit the peripheral's divisor
    /// register. The peripheral was left untouched.
    BaudOutOfRange {
        /// The divisor that was computed (zero when `baud` was zero).
        divisor: u32,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BaudOutOfRange { divisor } => {
                write!(f, "baud rate out of range (divisor {divisor})")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_queue_full() {
        assert_eq!(format!("{QueueFull}"), "transmit queue full");
    }

    #[test]
    fn display_baud_out_of_range() {
        assert_eq!(
            format!("{}", ConfigError::BaudOutOfRange { divisor: 70_000 }),
            "baud rate out of range (divisor 70000)"
        );
    }

    #[test]
    fn error_equality() {
        assert_eq!(
            ConfigError::BaudOutOfRange { divisor: 0 },
            ConfigError::BaudOutOfRange { divisor: 0 }
        );
        assert_ne!(
            ConfigError::BaudOutOfRange { divisor: 0 },
            ConfigError::BaudOutOfRange { divisor: 1 }
        );
    }
}
