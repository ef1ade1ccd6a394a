//! Scheduler scenarios over the hosted context switch
//!
//! These are real multi-stack switches: the hosted `switch_context` has the
//! same contract as the ARMv6-M one, so task code here genuinely suspends
//! and resumes on its own primed stack.
//!
//! The scheduler and heap are process-wide singletons, so every test takes
//! the file-wide lock. Task bodies avoid panicking machinery - results are
//! recorded into statics and asserted from the test thread.

use std::ffi::c_void;
use std::ptr;
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use krill::{Process, Scheduler, SpawnOpts};

fn lock() -> MutexGuard<'static, ()> {
    static LOCK: Mutex<()> = Mutex::new(());
    LOCK.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Give the global heap a fresh region big enough for a test's tasks
fn init_heap() {
    let region = Box::leak(vec![0u8; 1024 * 1024].into_boxed_slice());
    let start = region.as_mut_ptr();
    let end = unsafe { start.add(region.len()) };
    krill::heap::init(start, end);
}

const TASK_STACK: usize = 64 * 1024;

fn spawn(entry: krill::EntryFn, args: *mut c_void, name: &'static str) -> &'static mut Process {
    Process::spawn(
        entry,
        args,
        SpawnOpts {
            stack_size: TASK_STACK,
            name,
        },
    )
    .expect("test heap exhausted")
}

mod alternation {
    use super::*;

    static T1_TURN: AtomicU32 = AtomicU32::new(0);
    static T2_TURN: AtomicU32 = AtomicU32::new(0);
    static SEEN: Mutex<Vec<(u32, u32)>> = Mutex::new(Vec::new());

    fn record() {
        SEEN.lock().unwrap().push((
            T1_TURN.load(Ordering::Relaxed),
            T2_TURN.load(Ordering::Relaxed),
        ));
    }

    extern "C" fn first(_args: *mut c_void) -> u32 {
        for _ in 0..4 {
            T1_TURN.fetch_add(1, Ordering::Relaxed);
            record();
            krill::yield_now();
        }
        0
    }

    extern "C" fn second(_args: *mut c_void) -> u32 {
        for _ in 0..4 {
            T2_TURN.fetch_add(1, Ordering::Relaxed);
            record();
            krill::yield_now();
        }
        0
    }

    /// Two tasks in strict FIFO rotation: the interleaving of their
    /// counters is fully determined, four turns each.
    #[test]
    fn two_tasks_alternate_in_fifo_order() {
        let _guard = super::lock();
        super::init_heap();
        T1_TURN.store(0, Ordering::Relaxed);
        T2_TURN.store(0, Ordering::Relaxed);
        SEEN.lock().unwrap().clear();

        let scheduler = Scheduler::new();
        let one = super::spawn(first, ptr::null_mut(), "t1");
        let two = super::spawn(second, ptr::null_mut(), "t2");
        unsafe {
            scheduler.enqueue(one);
            scheduler.enqueue(two);
        }
        scheduler.run();

        assert_eq!(
            *SEEN.lock().unwrap(),
            vec![
                (1, 0),
                (1, 1),
                (2, 1),
                (2, 2),
                (3, 2),
                (3, 3),
                (4, 3),
                (4, 4)
            ]
        );
        assert_eq!(one.exit_code(), Some(0));
        assert_eq!(two.exit_code(), Some(0));
        assert!(one.stack_healthy() && two.stack_healthy());
    }
}

mod preservation {
    use super::*;

    static BYSTANDER_TURNS: AtomicU32 = AtomicU32::new(0);

    extern "C" fn accumulate(_args: *mut c_void) -> u32 {
        // `acc` lives in this task's registers and stack across ten
        // switches; the exit code proves nothing leaked between tasks.
        let mut acc = 0u32;
        for i in 1..=10 {
            acc += i;
            krill::yield_now();
        }
        acc
    }

    extern "C" fn bystander(_args: *mut c_void) -> u32 {
        for _ in 0..12 {
            BYSTANDER_TURNS.fetch_add(1, Ordering::Relaxed);
            krill::yield_now();
        }
        0
    }

    /// Locals survive yields with another task dirtying the registers in
    /// between.
    #[test]
    fn locals_survive_switches() {
        let _guard = super::lock();
        super::init_heap();
        BYSTANDER_TURNS.store(0, Ordering::Relaxed);

        let scheduler = Scheduler::new();
        let acc = super::spawn(accumulate, ptr::null_mut(), "accumulate");
        let noise = super::spawn(bystander, ptr::null_mut(), "bystander");
        unsafe {
            scheduler.enqueue(acc);
            scheduler.enqueue(noise);
        }
        scheduler.run();

        assert_eq!(acc.exit_code(), Some(55));
        assert_eq!(noise.exit_code(), Some(0));
        assert_eq!(BYSTANDER_TURNS.load(Ordering::Relaxed), 12);
    }
}

mod exit_order {
    use super::*;

    static ORDER: Mutex<Vec<usize>> = Mutex::new(Vec::new());

    extern "C" fn yield_then_exit(args: *mut c_void) -> u32 {
        krill::yield_now();
        ORDER.lock().unwrap().push(args as usize);
        42
    }

    extern "C" fn yield_then_exit_directly(args: *mut c_void) -> u32 {
        krill::yield_now();
        ORDER.lock().unwrap().push(args as usize);
        // The explicit path, not the trampoline return.
        krill::exit(42);
    }

    /// Three tasks that yield once and exit drain in enqueue order, and
    /// every exit code sticks - whether exit is called or returned into.
    #[test]
    fn drain_order_is_fifo_and_exit_codes_stick() {
        let _guard = super::lock();
        super::init_heap();
        ORDER.lock().unwrap().clear();

        let scheduler = Scheduler::new();
        let a = super::spawn(yield_then_exit, 0 as *mut c_void, "a");
        let b = super::spawn(yield_then_exit, 1 as *mut c_void, "b");
        let c = super::spawn(yield_then_exit_directly, 2 as *mut c_void, "c");
        unsafe {
            scheduler.enqueue(a);
            scheduler.enqueue(b);
            scheduler.enqueue(c);
        }
        scheduler.run();

        assert_eq!(*ORDER.lock().unwrap(), vec![0, 1, 2]);
        for task in [&*a, &*b, &*c] {
            assert_eq!(task.exit_code(), Some(42));
            assert!(task.stack_healthy());
        }
        assert_eq!(scheduler.runnable(), 0);
    }
}

mod trampoline {
    use super::*;

    static HANDED: AtomicUsize = AtomicUsize::new(0);

    extern "C" fn capture_args(args: *mut c_void) -> u32 {
        HANDED.store(args as usize, Ordering::Relaxed);
        7
    }

    /// The opaque argument arrives in argument register zero and the
    /// return value becomes the exit code.
    #[test]
    fn args_arrive_and_return_value_becomes_exit_code() {
        let _guard = super::lock();
        super::init_heap();
        HANDED.store(0, Ordering::Relaxed);

        let scheduler = Scheduler::new();
        let task = super::spawn(capture_args, 0xDEADBEEF as *mut c_void, "probe");
        unsafe { scheduler.enqueue(task) };
        scheduler.run();

        assert_eq!(HANDED.load(Ordering::Relaxed), 0xDEADBEEF);
        assert_eq!(task.exit_code(), Some(7));
    }
}

mod misuse {
    use super::*;

    extern "C" fn single(_args: *mut c_void) -> u32 {
        krill::yield_now();
        1
    }

    /// Yielding with no scheduler running panics without poisoning
    /// anything: a full run still works afterwards.
    #[test]
    fn yield_outside_a_task_panics_and_leaves_no_damage() {
        let _guard = super::lock();
        super::init_heap();

        let result = std::panic::catch_unwind(krill::yield_now);
        assert!(result.is_err());

        let scheduler = Scheduler::new();
        let task = super::spawn(single, ptr::null_mut(), "survivor");
        unsafe { scheduler.enqueue(task) };
        scheduler.run();
        assert_eq!(task.exit_code(), Some(1));
    }

    /// An empty queue is a clean no-op, and a drained scheduler can be
    /// reused for another round.
    #[test]
    fn empty_run_returns_and_scheduler_is_reusable() {
        let _guard = super::lock();
        super::init_heap();

        let scheduler = Scheduler::new();
        scheduler.run();
        assert_eq!(scheduler.runnable(), 0);

        let task = super::spawn(single, ptr::null_mut(), "late");
        unsafe { scheduler.enqueue(task) };
        scheduler.run();
        assert_eq!(task.exit_code(), Some(1));
    }
}

// End of File
