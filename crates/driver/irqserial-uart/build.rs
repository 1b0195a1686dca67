//! Build script for irqserial-uart: bakes the default clock and baud rate.
//!
//! `IRQSERIAL_CLOCK_HZ` and `IRQSERIAL_BAUD` override the defaults
//! (16 MHz, 9600 baud). The values land in `UartConfig::BUILD`; whether the
//! resulting divisor fits a given peripheral is checked at compile time by
//! `UartConfig::validated`.

use std::env;
use std::fs;
use std::path::Path;

const DEFAULT_CLOCK_HZ: u32 = 16_000_000;
const DEFAULT_BAUD: u32 = 9600;

fn read_u32(name: &str, default: u32) -> u32 {
    println!("cargo:rerun-if-env-changed={name}");
    match env::var(name) {
        Ok(raw) => {
            let cleaned: String = raw.chars().filter(|c| *c != '_').collect();
            match cleaned.trim().parse::<u32>() {
                Ok(0) => panic!("{name} must be non-zero"),
                Ok(value) => value,
                Err(err) => panic!("{name}={raw:?} is not a valid u32: {err}"),
            }
        }
        Err(env::VarError::NotPresent) => default,
        Err(err) => panic!("{name}: {err}"),
    }
}

fn main() {
    let clock_hz = read_u32("IRQSERIAL_CLOCK_HZ", DEFAULT_CLOCK_HZ);
    let baud = read_u32("IRQSERIAL_BAUD", DEFAULT_BAUD);

    let out_dir = env::var("OUT_DIR").expect("OUT_DIR is set by cargo");
    let dest = Path::new(&out_dir).join("build_config.rs");
    let contents = format!(
        "/// Peripheral clock in Hz baked in at build time.\n\
         pub const BUILD_CLOCK_HZ: u32 = {clock_hz};\n\
         /// Baud rate baked in at build time.\n\
         pub const BUILD_BAUD: u32 = {baud};\n"
    );
    fs::write(&dest, contents).expect("failed to write build_config.rs");
}
