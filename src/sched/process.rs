//! Holds the [`Process`] type and methods

// Copyright (c) 2025 Ferrous Systems
// SPDX-License-Identifier: GPL-3.0-or-later

use core::ffi::c_void;
use core::mem::offset_of;

use crate::sched::queue::QueueLink;
use crate::stack_pusher::StackPusher;
use crate::{AllocError, asm, heap};

/// The function signature for task entry points.
///
/// `extern "C"` because the trampoline calls it from assembly with the
/// platform ABI: the opaque argument arrives in argument register zero, and
/// the returned exit code leaves in the same register, where
/// [`exit`](crate::sched::exit) expects its first argument.
pub type EntryFn = extern "C" fn(*mut c_void) -> u32;

/// Saved machine state sufficient to resume a suspended execution.
///
/// The minimum AAPCS-correct set on ARMv6-M: stack pointer, frame pointer
/// (r7), program counter. The remaining callee-saved registers are
/// preserved on the task's own stack by the switch routine, not here.
///
/// `repr(C)` with exported offsets because the switch assembly addresses
/// the fields relative to a raw context pointer.
#[repr(C)]
#[derive(Debug)]
pub struct Context {
    sp: usize,
    fp: usize,
    pc: usize,
}

impl Context {
    /// The offset, in bytes, to the saved stack pointer
    pub(crate) const SP_OFFSET: usize = offset_of!(Context, sp);

    /// The offset, in bytes, to the saved frame pointer
    pub(crate) const FP_OFFSET: usize = offset_of!(Context, fp);

    /// The offset, in bytes, to the saved program counter
    pub(crate) const PC_OFFSET: usize = offset_of!(Context, pc);

    /// A context that has never run; filled in by the first switch away.
    const fn empty() -> Context {
        Context { sp: 0, fp: 0, pc: 0 }
    }
}

/// The stack a process runs its frames in.
///
/// The process does not own the bytes - they are externally provided and
/// must outlive it - but it owns all frame usage of them until its exit
/// code is set.
#[derive(Debug, Clone, Copy)]
struct StackRegion {
    base: *mut u8,
    len: usize,
}

impl StackRegion {
    /// The boot stack: placed by the linker, so the kernel process cannot
    /// name its bounds. Treated as containing any stack pointer.
    const KERNEL: StackRegion = StackRegion {
        base: core::ptr::null_mut(),
        len: usize::MAX,
    };

    fn contains(&self, sp: usize) -> bool {
        let base = self.base as usize;
        sp >= base && sp <= base.wrapping_add(self.len)
    }
}

/// One schedulable task.
pub struct Process {
    /// Saved state while suspended; stale while running.
    pub(crate) context: Context,
    stack: StackRegion,
    name: &'static str,
    /// Set exactly once, at termination. A process with an exit code is
    /// never scheduled again.
    exit_code: Option<u32>,
    /// Run-queue linkage; see [`QueueLink`].
    pub(crate) link: QueueLink,
}

impl Process {
    /// The smallest stack [`Process::create`] accepts: the priming
    /// parameter block, one switch frame, and headroom for the trampoline's
    /// call into the entry function.
    pub const MIN_STACK_SIZE: usize =
        (2 * size_of::<usize>()) + asm::SWITCH_FRAME_SIZE + (8 * size_of::<usize>());

    /// Create a process that will run `entry(args)` on `stack`.
    ///
    /// Primes the stack so the first switch into this process lands in the
    /// task trampoline: the parameter block `[args, entry]` is pushed at
    /// the stack top and the saved context points `{sp}` at it, with the
    /// trampoline as the saved pc and an empty frame chain.
    ///
    /// Panics if the stack is misaligned, has a misaligned length, or is
    /// too small to hold a switch frame.
    pub fn create(
        entry: EntryFn,
        args: *mut c_void,
        stack: &'static mut [u8],
        name: &'static str,
    ) -> Process {
        let base = stack.as_mut_ptr();
        let len = stack.len();
        assert!(
            (base as usize).is_multiple_of(asm::STACK_ALIGN) && len.is_multiple_of(asm::STACK_ALIGN),
            "stack for {name} breaks the {}-byte stack alignment",
            asm::STACK_ALIGN
        );
        assert!(
            len >= Self::MIN_STACK_SIZE,
            "stack for {name} is too small to hold a switch frame"
        );

        // SAFETY: the asserts above guarantee room below the top for the
        // two-word parameter block
        let mut pusher = unsafe { StackPusher::new(base.add(len).cast::<usize>()) };
        pusher.push(entry as usize);
        pusher.push(args as usize);

        Process {
            context: Context {
                sp: pusher.current() as usize,
                fp: 0,
                pc: asm::task_trampoline as usize,
            },
            stack: StackRegion { base, len },
            name,
            exit_code: None,
            link: QueueLink::new(),
        }
    }

    /// Create a process on a heap-allocated stack.
    ///
    /// Both the stack and the Process record come from the kernel heap, so
    /// the returned reference is pinned for free. The only failure is the
    /// allocator running dry.
    pub fn spawn(
        entry: EntryFn,
        args: *mut c_void,
        opts: SpawnOpts,
    ) -> Result<&'static mut Process, AllocError> {
        let stack = heap::alloc_stack(opts.stack_size)?;
        heap::alloc_value(Process::create(entry, args, stack, opts.name))
    }

    /// The kernel's own execution: the singleton that runs `kmain` on the
    /// boot stack and becomes current only when the queue is empty.
    pub(crate) const fn kernel() -> Process {
        Process {
            context: Context::empty(),
            stack: StackRegion::KERNEL,
            name: "kernel",
            exit_code: None,
            link: QueueLink::new(),
        }
    }

    /// This process's label
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// The exit code, once the process has terminated
    pub fn exit_code(&self) -> Option<u32> {
        self.exit_code
    }

    pub(crate) fn set_exit_code(&mut self, code: u32) {
        debug_assert!(self.exit_code.is_none(), "exit code set twice");
        self.exit_code = Some(code);
    }

    /// Whether the saved stack pointer lies inside this process's stack
    /// with the architecture's alignment. Meaningful while suspended; the
    /// saved value is stale while the process runs.
    pub fn stack_healthy(&self) -> bool {
        self.stack.contains(self.context.sp) && self.context.sp.is_multiple_of(asm::STACK_ALIGN)
    }
}

/// Options for [`Process::spawn`]
pub struct SpawnOpts {
    /// Bytes of stack to allocate; rounded up to the stack alignment
    pub stack_size: usize,
    /// Label for the new process
    pub name: &'static str,
}

#[cfg(test)]
mod tests {
    extern crate std;

    use std::boxed::Box;

    use super::*;

    extern "C" fn nop_entry(_args: *mut c_void) -> u32 {
        0
    }

    fn leaked_stack<const N: usize>() -> &'static mut [u8] {
        // Box the array inside a Stack to get the right alignment.
        let stack: &'static crate::Stack<N> = Box::leak(Box::new(crate::Stack::new()));
        unsafe { stack.take() }
    }

    #[test]
    fn priming_builds_the_parameter_block() {
        let stack = leaked_stack::<1024>();
        let base = stack.as_ptr() as usize;
        let top = base + stack.len();
        let p = Process::create(nop_entry, 0xD00D as *mut c_void, stack, "primed");

        // sp sits one parameter block below the top, aligned.
        assert_eq!(p.context.sp, top - 2 * size_of::<usize>());
        assert!(p.stack_healthy());
        assert_eq!(p.context.pc, asm::task_trampoline as usize);
        assert_eq!(p.context.fp, 0);

        // The block reads [args, entry] going up the stack, exactly what
        // the trampoline pops.
        let words = p.context.sp as *const usize;
        unsafe {
            assert_eq!(words.read(), 0xD00D);
            assert_eq!(words.add(1).read(), nop_entry as usize);
        }
        assert_eq!(p.name(), "primed");
        assert_eq!(p.exit_code(), None);
    }

    #[test]
    #[should_panic(expected = "too small")]
    fn undersized_stack_is_rejected() {
        // Large enough to be aligned, smaller than a switch frame + block.
        let stack = leaked_stack::<32>();
        let _ = Process::create(nop_entry, core::ptr::null_mut(), stack, "tiny");
    }

    #[test]
    #[should_panic(expected = "stack alignment")]
    fn misaligned_stack_is_rejected() {
        let stack = leaked_stack::<1024>();
        // Knock the base off alignment by a word.
        let skewed = &mut stack[4..];
        // SAFETY: test-only lifetime laundering; the stack is leaked.
        let skewed: &'static mut [u8] = unsafe { core::mem::transmute(skewed) };
        let _ = Process::create(nop_entry, core::ptr::null_mut(), skewed, "skewed");
    }
}

// End of File
