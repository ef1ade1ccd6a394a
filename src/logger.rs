//! Kernel logging: the `log` facade wired to the platform UART

use core::fmt;

use log::{Level, LevelFilter, Log, Metadata, Record};

struct KernelLog;

static LOGGER: KernelLog = KernelLog;

impl Log for KernelLog {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let mut tx = crate::platform::uart::Tx;
        let _ = write_record(&mut tx, record.level(), record.target(), record.args());
    }

    fn flush(&self) {}
}

/// Render one log line as `{level} {scope}: {message}\n`.
///
/// Split out from the sink so the format is checkable without a device.
/// The newline becomes `\r\n` in the UART transmit layer, not here.
fn write_record(
    w: &mut dyn fmt::Write,
    level: Level,
    scope: &str,
    args: &fmt::Arguments,
) -> fmt::Result {
    if scope.is_empty() {
        writeln!(w, "{level}: {args}")
    } else {
        writeln!(w, "{level} {scope}: {args}")
    }
}

/// Install the kernel logger.
///
/// Uses `set_logger_racy` because the safe installer needs a
/// compare-and-swap, which ARMv6-M does not have. That is fine here: this
/// runs once, on the reset path, on one core, before interrupts exist.
pub(crate) fn init() {
    let max_level = if cfg!(debug_assertions) {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    // SAFETY: single call site, single core, nothing else running yet
    unsafe {
        let _ = log::set_logger_racy(&LOGGER);
    }
    log::set_max_level(max_level);
}


// End of File
