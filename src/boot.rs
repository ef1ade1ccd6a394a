//! Boot code: the vector table and the reset path

use core::arch::asm;

use crate::{KernelError, layout, logger, platform};

unsafe extern "C" {
    /// Start of the vector table emitted below; also its VTOR value
    static _vector_table: u32;
}

unsafe extern "Rust" {
    /// The kernel entry point, provided by the application binary.
    ///
    /// Expected definition:
    ///
    /// ```ignore
    /// #[unsafe(no_mangle)]
    /// fn kmain() -> Result<(), krill::KernelError> { ... }
    /// ```
    ///
    /// Runs on the boot stack as the kernel process. Returning `Err` gets
    /// the error and a backtrace logged; returning at all halts the core.
    safe fn kmain() -> Result<(), KernelError>;
}

// The ARMv6-M vector table: initial stack pointer, reset, then the
// exception slots. Architecturally reserved slots hold zero; everything
// else lands in a named handler that panics. The `.word` of a Rust
// function gives a Thumb-bit-set address, which is what the core expects
// to load into pc.
core::arch::global_asm!(
    r#"
    .section .startup, "a", %progbits
    .global _vector_table
    _vector_table:
        .word __kernel_stack_end
        .word _start
        .word _handler_nmi
        .word _handler_hard_fault
        .word _handler_mem_manage
        .word _handler_bus_fault
        .word _handler_usage_fault
        .word 0
        .word 0
        .word 0
        .word 0
        .word _handler_svcall
        .word _handler_debug_monitor
        .word 0
        .word _handler_pendsv
        .word _handler_systick
    .size _vector_table, . - _vector_table
    "#
);

/// The reset handler.
///
/// The core arrives here straight out of the second-stage bootloader, on
/// the boot stack from vector slot 0. Statics are unusable until `.bss`
/// and `.data` are initialised, so the platform init that precedes them
/// touches registers and locals only.
#[unsafe(no_mangle)]
pub extern "C" fn _start() -> ! {
    platform::init();
    // SAFETY: region bounds come from kernel.ld, word-aligned, and nothing
    // else is running yet
    unsafe {
        zero_bss();
        copy_data();
    }
    // The boot ROM leaves VTOR on its own table; point it at ours so the
    // handlers below actually catch faults. 256-aligned by the layout.
    // SAFETY: VTOR is the architected SCB register at 0xE000ED08
    unsafe {
        let table = (&raw const _vector_table) as usize as u32;
        (0xE000_ED08 as *mut u32).write_volatile(table);
    }
    logger::init();
    log::info!("krill: RAM image ready");

    match kmain() {
        Ok(()) => log::info!("kmain returned; halting"),
        Err(error) => {
            log::error!("kmain failed: {:?}", error);
            log_backtrace();
            panic!("kmain failed: {error:?}");
        }
    }
    halt()
}

/// Word-wise zero of `[__kernel_bss_start, __kernel_bss_end)`
///
/// # Safety
///
/// Call once, from the reset path, before anything reads a static.
unsafe fn zero_bss() {
    let (mut word, end) = layout::bss_region();
    while word < end {
        // SAFETY: in-bounds by the linker's section arithmetic; volatile
        // so the compiler cannot fold this into a call that needs .data
        unsafe {
            word.write_volatile(0);
            word = word.add(1);
        }
    }
}

/// Word-wise copy of the `.data` flash image into RAM
///
/// # Safety
///
/// As for [`zero_bss`].
unsafe fn copy_data() {
    let (mut word, end) = layout::data_region();
    let mut source = layout::data_source();
    while word < end {
        // SAFETY: as for zero_bss; source and destination are the same
        // length by construction
        unsafe {
            word.write_volatile(source.read_volatile());
            word = word.add(1);
            source = source.add(1);
        }
    }
}

/// Log the return addresses hanging off the r7 frame chain.
///
/// Best-effort: meaningful only where code was built with frame pointers,
/// and bounded both in depth and to the kernel stack.
fn log_backtrace() {
    let (stack_start, stack_end) = layout::stack_region();
    let mut fp: usize;
    // SAFETY: reading a register has no side effects
    unsafe { asm!("mov {}, r7", out(reg) fp) };
    for depth in 0..16 {
        if fp < stack_start || fp + 8 > stack_end || !fp.is_multiple_of(4) {
            break;
        }
        // Frame layout with Thumb frame pointers: fp -> {saved r7, saved lr}.
        // SAFETY: just range-checked against the kernel stack
        let (saved_fp, return_addr) =
            unsafe { ((fp as *const usize).read(), (fp as *const usize).add(1).read()) };
        log::error!("  frame {}: return {:#010x}", depth, return_addr);
        if saved_fp <= fp {
            break;
        }
        fp = saved_fp;
    }
}

/// Park the core forever
pub(crate) fn halt() -> ! {
    loop {
        cortex_m::asm::wfi();
    }
}

macro_rules! exception_handler {
    ($name:ident, $label:literal) => {
        #[unsafe(no_mangle)]
        extern "C" fn $name() -> ! {
            panic!(concat!("unhandled exception: ", $label));
        }
    };
}

exception_handler!(_handler_nmi, "NMI");
exception_handler!(_handler_hard_fault, "HardFault");
exception_handler!(_handler_mem_manage, "MemManage");
exception_handler!(_handler_bus_fault, "BusFault");
exception_handler!(_handler_usage_fault, "UsageFault");
exception_handler!(_handler_svcall, "SVCall");
exception_handler!(_handler_debug_monitor, "DebugMonitor");
exception_handler!(_handler_pendsv, "PendSV");
exception_handler!(_handler_systick, "SysTick");

// End of File
