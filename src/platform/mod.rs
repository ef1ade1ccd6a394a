//! Platform drivers: everything that touches a memory-mapped register
//!
//! The kernel proper consumes three capabilities from whichever SoC driver
//! is bound: `init()` (clocks, console, LED pin), the `led` switch, and
//! the `uart` log sink. Exactly one driver binds at compile time via a
//! Cargo feature; there is no runtime dispatch.

#[cfg(all(target_os = "none", feature = "platform-rp2040"))]
mod rp2040;

#[cfg(all(target_os = "none", feature = "platform-rp2040"))]
pub use rp2040::{init, led, uart};

#[cfg(all(target_os = "none", not(feature = "platform-rp2040")))]
compile_error!(
    "device build with no platform driver; enable the `platform-rp2040` feature or supply one"
);

#[cfg(not(target_os = "none"))]
mod hosted;

#[cfg(not(target_os = "none"))]
pub use hosted::{init, led, uart};

// End of File
