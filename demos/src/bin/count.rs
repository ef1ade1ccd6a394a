//! Two bounded counter tasks taking strict turns
//!
//! Shows the static-stack path: `Stack` + `Process::create` + pinned local
//! processes, no heap involved. Both tasks count four rounds and exit with
//! their totals, so the scheduler drains and `kmain` gets to report.

#![cfg_attr(target_os = "none", no_std)]
#![cfg_attr(target_os = "none", no_main)]

#[cfg(target_os = "none")]
mod app {
    use core::ffi::c_void;
    use core::ptr;

    use krill::{KernelError, Process, Scheduler, Stack};

    static SCHEDULER: Scheduler = Scheduler::new();

    static FIRST_STACK: Stack<1024> = Stack::new();
    static SECOND_STACK: Stack<1024> = Stack::new();

    #[unsafe(no_mangle)]
    fn kmain() -> Result<(), KernelError> {
        // SAFETY: each stack is taken exactly once
        let (first_stack, second_stack) = unsafe { (FIRST_STACK.take(), SECOND_STACK.take()) };
        let mut first = Process::create(count, ptr::null_mut(), first_stack, "first");
        let mut second = Process::create(count, ptr::null_mut(), second_stack, "second");
        // SAFETY: both processes live in this frame, which outlives run()
        unsafe {
            SCHEDULER.enqueue(&mut first);
            SCHEDULER.enqueue(&mut second);
        }
        SCHEDULER.run();
        log::info!(
            "totals: first {:?}, second {:?}",
            first.exit_code(),
            second.exit_code()
        );
        Ok(())
    }

    extern "C" fn count(_args: *mut c_void) -> u32 {
        let mut total = 0;
        for round in 1..=4u32 {
            total += round;
            log::info!("round {}", round);
            krill::yield_now();
        }
        total
    }
}

/// Keeps host builds compiling; the demo only runs on the device.
#[cfg(not(target_os = "none"))]
fn main() {}

// End of File
