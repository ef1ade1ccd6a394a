//! One entry function, three tasks, three arguments
//!
//! The task argument travels through the primed stack into argument
//! register zero; each task gets its own multiplier and hands back a
//! distinguishable exit code.

#![cfg_attr(target_os = "none", no_std)]
#![cfg_attr(target_os = "none", no_main)]

#[cfg(target_os = "none")]
mod app {
    use core::ffi::c_void;

    use krill::{KernelError, Process, Scheduler, SpawnOpts};

    #[unsafe(no_mangle)]
    fn kmain() -> Result<(), KernelError> {
        let (heap_start, heap_end) = krill::layout::heap_region();
        krill::heap::init(heap_start, heap_end);

        let scheduler = Scheduler::new();
        let mut tasks = [core::ptr::null_mut::<Process>(); 3];
        for (index, slot) in tasks.iter_mut().enumerate() {
            let process: *mut Process = Process::spawn(
                times_seven,
                (index + 1) as *mut c_void,
                SpawnOpts {
                    stack_size: 1024,
                    name: "times-seven",
                },
            )?;
            // SAFETY: heap-spawned, so pinned and immortal
            unsafe { scheduler.enqueue(&mut *process) };
            *slot = process;
        }
        scheduler.run();
        for &task in &tasks {
            // SAFETY: exited tasks stay readable on the heap
            let task = unsafe { &*task };
            log::info!("{}: exit {:?}", task.name(), task.exit_code());
        }
        Ok(())
    }

    extern "C" fn times_seven(args: *mut c_void) -> u32 {
        let multiplier = args as usize as u32;
        krill::yield_now();
        multiplier * 7
    }
}

/// Keeps host builds compiling; the demo only runs on the device.
#[cfg(not(target_os = "none"))]
fn main() {}

// End of File
