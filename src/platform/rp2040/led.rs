//! The board LED on GPIO25, driven through SIO

use super::{IO_BANK0_BASE, write_reg};

const SIO_BASE: usize = 0xD000_0000;

const GPIO_OUT_SET: usize = 0x14;
const GPIO_OUT_CLR: usize = 0x18;
const GPIO_OUT_XOR: usize = 0x1C;
const GPIO_OE_SET: usize = 0x24;

const LED_PIN: u32 = 25;
const LED_MASK: u32 = 1 << LED_PIN;

/// Route GPIO25 to SIO and make it an output, starting dark
pub(crate) fn init() {
    // funcsel 5 = SIO
    let gpio25_ctrl = IO_BANK0_BASE + (LED_PIN as usize) * 8 + 4;
    write_reg(gpio25_ctrl, 5);
    write_reg(SIO_BASE + GPIO_OE_SET, LED_MASK);
    off();
}

pub fn on() {
    write_reg(SIO_BASE + GPIO_OUT_SET, LED_MASK);
}

pub fn off() {
    write_reg(SIO_BASE + GPIO_OUT_CLR, LED_MASK);
}

pub fn toggle() {
    write_reg(SIO_BASE + GPIO_OUT_XOR, LED_MASK);
}

// End of File
