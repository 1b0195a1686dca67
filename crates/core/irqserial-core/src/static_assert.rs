//! Compile-time checks on build configuration.

/// Fails compilation when `cond` is false.
///
/// Expands to an anonymous `const` item, so it may appear at module scope.
/// Without a message the failing expression is reported verbatim.
///
/// The driver uses it to refuse an `IRQSERIAL_CLOCK_HZ` / `IRQSERIAL_BAUD`
/// pair that no supported peripheral can produce.
///
/// # Examples
///
/// ```ignore
/// use irqserial_core::static_assert;
/// static_assert!(BUILD_CLOCK_HZ / BUILD_BAUD >= 16, "Baud rate out of range");
/// ```
#[macro_export]
macro_rules! static_assert {
    ($cond:expr $(,)?) => {
        const _: () = if !$cond {
            panic!(concat!("static assertion failed: ", stringify!($cond)));
        };
    };
    ($cond:expr, $msg:literal $(,)?) => {
        const _: () = if !$cond {
            panic!($msg);
        };
    };
}

#[cfg(test)]
mod tests {
    const QUEUE_SIZE: usize = 16;

    static_assert!(QUEUE_SIZE >= 2);
    static_assert!(16_000_000 / 9600 == 1666, "divisor arithmetic");
    static_assert!(usize::BITS >= 16,);
}
