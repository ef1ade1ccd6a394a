//! RP2040 platform driver
//!
//! Owns the SoC bring-up the kernel needs and nothing more: deassert the
//! resets for the blocks we use, start the crystal oscillator, run the
//! whole clock tree straight off the 12 MHz crystal (no PLL - a
//! cooperative kernel has no use for speed it would spend spinning), then
//! hand over to the UART console and LED pin.
//!
//! Register addresses are RP2040 datasheet constants. The `+0x2000` /
//! `+0x3000` aliases are the chip's atomic bit-set / bit-clear mirrors,
//! which make the reset dance race-free without read-modify-write.

pub mod led;
pub mod uart;

const RESETS_BASE: usize = 0x4000_C000;
const CLOCKS_BASE: usize = 0x4000_8000;
const XOSC_BASE: usize = 0x4002_4000;
pub(crate) const IO_BANK0_BASE: usize = 0x4001_4000;

/// Atomic register mirrors
const ATOMIC_SET: usize = 0x2000;
const ATOMIC_CLR: usize = 0x3000;

/// RESETS.RESET bits for the blocks this driver touches
const RESET_IO_BANK0: u32 = 1 << 5;
const RESET_PADS_BANK0: u32 = 1 << 8;
const RESET_UART0: u32 = 1 << 22;

/// CLOCKS register offsets
const CLK_REF_CTRL: usize = 0x30;
const CLK_REF_SELECTED: usize = 0x38;
const CLK_SYS_CTRL: usize = 0x3C;
const CLK_SYS_SELECTED: usize = 0x44;
const CLK_PERI_CTRL: usize = 0x48;

/// XOSC register offsets and fields
const XOSC_CTRL: usize = 0x00;
const XOSC_STATUS: usize = 0x04;
const XOSC_STARTUP: usize = 0x0C;
const XOSC_ENABLE: u32 = 0xFAB << 12;
const XOSC_RANGE_1_15MHZ: u32 = 0xAA0;
const XOSC_STATUS_STABLE: u32 = 1 << 31;

/// Crystal frequency on every RP2040 board we care about
pub(crate) const XOSC_HZ: u32 = 12_000_000;

pub(crate) fn write_reg(addr: usize, value: u32) {
    // SAFETY: every address passed in this module is a device register
    // from the RP2040 datasheet, and MMIO is always valid to write
    unsafe { (addr as *mut u32).write_volatile(value) }
}

pub(crate) fn read_reg(addr: usize) -> u32 {
    // SAFETY: as for write_reg
    unsafe { (addr as *const u32).read_volatile() }
}

/// Bring the SoC up far enough for the kernel: clocks, console, LED.
///
/// Runs before `.data`/`.bss` are initialised, so it must not touch any
/// static - registers and locals only.
pub fn init() {
    release_resets(RESET_IO_BANK0 | RESET_PADS_BANK0 | RESET_UART0);
    start_xosc();
    switch_clocks_to_xosc();
    uart::init();
    led::init();
}

/// Deassert the given RESETS bits and wait for the blocks to come back
fn release_resets(bits: u32) {
    write_reg(RESETS_BASE + ATOMIC_CLR, bits);
    let reset_done = RESETS_BASE + 0x8;
    while read_reg(reset_done) & bits != bits {
        cortex_m::asm::nop();
    }
}

/// Start the crystal oscillator and wait for it to stabilise
fn start_xosc() {
    // Startup delay in units of 256 crystal cycles; about 1 ms.
    write_reg(XOSC_BASE + XOSC_STARTUP, XOSC_HZ / 1000 / 256);
    write_reg(XOSC_BASE + XOSC_CTRL, XOSC_ENABLE | XOSC_RANGE_1_15MHZ);
    while read_reg(XOSC_BASE + XOSC_STATUS) & XOSC_STATUS_STABLE == 0 {
        cortex_m::asm::nop();
    }
}

/// Run clk_ref, clk_sys and clk_peri from the crystal.
///
/// clk_ref and clk_sys use glitchless muxes that report their selection in
/// the SELECTED register (one-hot by source index); clk_peri is a plain
/// aux mux with an enable.
fn switch_clocks_to_xosc() {
    // clk_ref <- xosc (source 2)
    write_reg(CLOCKS_BASE + CLK_REF_CTRL, 0x2);
    while read_reg(CLOCKS_BASE + CLK_REF_SELECTED) & (1 << 2) == 0 {
        cortex_m::asm::nop();
    }
    // clk_sys <- clk_ref (source 0)
    write_reg(CLOCKS_BASE + CLK_SYS_CTRL, 0x0);
    while read_reg(CLOCKS_BASE + CLK_SYS_SELECTED) & (1 << 0) == 0 {
        cortex_m::asm::nop();
    }
    // clk_peri <- xosc (auxsrc 4), enabled
    write_reg(CLOCKS_BASE + CLK_PERI_CTRL, (1 << 11) | (4 << 5));
}

// End of File
