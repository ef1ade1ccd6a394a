//! Hosted stand-in platform, so the kernel library and its tests build on
//! a development machine. The LED is a flag; the UART goes nowhere.

/// Nothing to bring up on a host
pub fn init() {}

pub mod led {
    use core::sync::atomic::{AtomicBool, Ordering};

    static LIT: AtomicBool = AtomicBool::new(false);

    pub fn on() {
        LIT.store(true, Ordering::Relaxed);
    }

    pub fn off() {
        LIT.store(false, Ordering::Relaxed);
    }

    pub fn toggle() {
        LIT.fetch_xor(true, Ordering::Relaxed);
    }

    #[cfg(test)]
    pub(crate) fn is_lit() -> bool {
        LIT.load(Ordering::Relaxed)
    }
}

pub mod uart {
    /// A sink that discards everything; the logger's rendering is tested
    /// against a plain `String` instead.
    pub struct Tx;

    impl core::fmt::Write for Tx {
        fn write_str(&mut self, _s: &str) -> core::fmt::Result {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::led;

    #[test]
    fn led_toggles() {
        led::off();
        led::toggle();
        assert!(led::is_lit());
        led::toggle();
        assert!(!led::is_lit());
        led::on();
        assert!(led::is_lit());
    }
}

// End of File
