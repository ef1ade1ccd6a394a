//! UART0 console: 9600 8N1, FIFOs on, transmit only
//!
//! TX is GPIO0. The sink is best-effort: a full FIFO gets a bounded wait
//! and then the byte is dropped - the console must never wedge the kernel.

use super::{IO_BANK0_BASE, XOSC_HZ, read_reg, write_reg};

const UART0_BASE: usize = 0x4003_4000;

const UARTDR: usize = 0x00;
const UARTFR: usize = 0x18;
const UARTIBRD: usize = 0x24;
const UARTFBRD: usize = 0x28;
const UARTLCR_H: usize = 0x2C;
const UARTCR: usize = 0x30;

/// UARTFR: transmit FIFO full
const FR_TXFF: u32 = 1 << 5;

/// UARTLCR_H: 8 data bits, FIFOs enabled
const LCR_H_8N1_FIFO: u32 = (0b11 << 5) | (1 << 4);

/// UARTCR: UART enabled, transmitter enabled
const CR_ENABLE_TX: u32 = (1 << 0) | (1 << 8);

const BAUD: u32 = 9600;

/// Spins to allow per byte before dropping it
const TX_PATIENCE: u32 = 100_000;

/// Bring UART0 up on the peripheral clock
pub(crate) fn init() {
    // Divisor = clk_peri / (16 * baud), as a 16.6 fixed-point number.
    // 12 MHz / (16 * 9600) = 78.125 -> integer 78, fraction 8/64.
    let div = (8 * XOSC_HZ) / BAUD;
    write_reg(UART0_BASE + UARTIBRD, div >> 7);
    write_reg(UART0_BASE + UARTFBRD, ((div & 0x7F) + 1) / 2);
    write_reg(UART0_BASE + UARTLCR_H, LCR_H_8N1_FIFO);
    write_reg(UART0_BASE + UARTCR, CR_ENABLE_TX);

    // GPIO0 -> UART0 TX (funcsel 2)
    let gpio0_ctrl = IO_BANK0_BASE + 0x04;
    write_reg(gpio0_ctrl, 2);
}

/// The log sink handed to the kernel logger
pub struct Tx;

impl core::fmt::Write for Tx {
    fn write_str(&mut self, s: &str) -> core::fmt::Result {
        for byte in s.bytes() {
            write_byte(byte);
        }
        Ok(())
    }
}

/// Queue one byte, expanding `\n` to `\r\n` for terminals
fn write_byte(byte: u8) {
    if byte == b'\n' {
        push_raw(b'\r');
    }
    push_raw(byte);
}

fn push_raw(byte: u8) {
    for _ in 0..TX_PATIENCE {
        if read_reg(UART0_BASE + UARTFR) & FR_TXFF == 0 {
            write_reg(UART0_BASE + UARTDR, u32::from(byte));
            return;
        }
        cortex_m::asm::nop();
    }
    // FIFO stayed full; the byte is lost, which beats hanging the kernel.
}

// End of File
