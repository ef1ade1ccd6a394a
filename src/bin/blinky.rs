//! The kernel's demo payload: blink the board LED from two tasks
//!
//! One task turns the LED on, one turns it off, and a heartbeat task keeps
//! the console alive. Each gets its period handed in through the opaque
//! task argument.

#![cfg_attr(target_os = "none", no_std)]
#![cfg_attr(target_os = "none", no_main)]

#[cfg(target_os = "none")]
mod app {
    use core::ffi::c_void;
    use core::ptr;

    use krill::{KernelError, Process, Scheduler, SpawnOpts};

    /// Scheduler turns between LED edges; sleep is a yield loop, so this
    /// is "fast enough to see" rather than a unit of time.
    const BLINK_TURNS: usize = 50_000;

    const HEARTBEAT_TURNS: usize = 400_000;

    #[unsafe(no_mangle)]
    fn kmain() -> Result<(), KernelError> {
        let (heap_start, heap_end) = krill::layout::heap_region();
        krill::heap::init(heap_start, heap_end);

        let scheduler = Scheduler::new();
        let on_task = Process::spawn(
            led_on,
            BLINK_TURNS as *mut c_void,
            SpawnOpts {
                stack_size: 1024,
                name: "led-on",
            },
        )?;
        let off_task = Process::spawn(
            led_off,
            BLINK_TURNS as *mut c_void,
            SpawnOpts {
                stack_size: 1024,
                name: "led-off",
            },
        )?;
        let beat_task = Process::spawn(
            heartbeat,
            ptr::null_mut(),
            SpawnOpts {
                stack_size: 1024,
                name: "heartbeat",
            },
        )?;
        // SAFETY: spawned processes live on the kernel heap; nothing moves
        // or frees them
        unsafe {
            scheduler.enqueue(on_task);
            scheduler.enqueue(off_task);
            scheduler.enqueue(beat_task);
        }

        log::info!("blinky: {} tasks ready", scheduler.runnable());
        scheduler.run();
        log::warn!("no processes left");
        Ok(())
    }

    extern "C" fn led_on(args: *mut c_void) -> u32 {
        let turns = args as usize as u32;
        loop {
            krill::platform::led::on();
            krill::sleep(turns);
        }
    }

    extern "C" fn led_off(args: *mut c_void) -> u32 {
        let turns = args as usize as u32;
        loop {
            krill::platform::led::off();
            krill::sleep(turns);
        }
    }

    extern "C" fn heartbeat(_args: *mut c_void) -> u32 {
        let mut beats: u32 = 0;
        loop {
            beats += 1;
            log::info!("heartbeat {}", beats);
            krill::sleep(HEARTBEAT_TURNS as u32);
        }
    }
}

/// Keeps host builds of the workspace compiling; the kernel only runs on
/// the device.
#[cfg(not(target_os = "none"))]
fn main() {}

// End of File
