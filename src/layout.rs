//! The linker-symbol interface
//!
//! `kernel.ld` defines these; only their addresses mean anything. Each
//! accessor hands back raw bounds so the boot code can iterate without
//! ever forming a reference to uninitialised memory.

unsafe extern "C" {
    static mut __kernel_bss_start: u32;
    static mut __kernel_bss_end: u32;
    static mut __kernel_data_start: u32;
    static mut __kernel_data_end: u32;
    static __kernel_data_source: u32;
    static __kernel_stack_start: u32;
    static __kernel_stack_end: u32;
    static mut __kernel_heap_start: u32;
    static mut __kernel_heap_end: u32;
}

/// `[start, end)` of `.bss`, word-aligned by the linker script
pub(crate) fn bss_region() -> (*mut u32, *mut u32) {
    // SAFETY: only the addresses are taken, never the values
    unsafe { (&raw mut __kernel_bss_start, &raw mut __kernel_bss_end) }
}

/// `[start, end)` of `.data` in RAM, word-aligned by the linker script
pub(crate) fn data_region() -> (*mut u32, *mut u32) {
    // SAFETY: as for bss_region
    unsafe { (&raw mut __kernel_data_start, &raw mut __kernel_data_end) }
}

/// The flash image `.data` is loaded from
pub(crate) fn data_source() -> *const u32 {
    // SAFETY: as for bss_region
    unsafe { &raw const __kernel_data_source }
}

/// `[start, end)` of the boot stack, as plain addresses for bounds checks
pub(crate) fn stack_region() -> (usize, usize) {
    // SAFETY: as for bss_region
    unsafe {
        (
            (&raw const __kernel_stack_start) as usize,
            (&raw const __kernel_stack_end) as usize,
        )
    }
}

/// `[start, end)` of the heap region handed to [`heap::init`](crate::heap::init)
pub fn heap_region() -> (*mut u8, *mut u8) {
    // SAFETY: as for bss_region
    unsafe {
        (
            (&raw mut __kernel_heap_start).cast::<u8>(),
            (&raw mut __kernel_heap_end).cast::<u8>(),
        )
    }
}

// End of File
