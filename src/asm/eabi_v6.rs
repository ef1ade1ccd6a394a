//! Armv6-M EABI context switch

use core::arch::{asm, naked_asm};

use crate::sched::Context;

/// AAPCS stack alignment at public interfaces
pub const STACK_ALIGN: usize = 8;

/// Bytes [`switch_context`] pushes on the outgoing task's stack.
///
/// Eight words: r4-r6, LR, and r8-r11. An even word count, so an aligned
/// stack stays aligned while the task is suspended. r7 travels in the
/// [`Context`] instead.
pub const SWITCH_FRAME_SIZE: usize = 8 * 4;

/// Suspend the execution described by `prev` and resume the one in `next`.
///
/// Saves the callee-saved register set and LR on the outgoing task's own
/// stack, records `{sp, r7, resume-pc}` in `prev`, then installs `next`'s
/// `{sp, r7, pc}` and jumps. The call appears to return normally - much
/// later, when some other caller names `prev` as its `next`.
///
/// Armv6-M constraints shape the body: `push`/`pop` reglists only encode
/// r0-r7 (plus LR/PC), so r8-r11 are shuffled through low registers;
/// `str`/`ldr` cannot name SP or r7, so both bounce through r2; `adr`
/// yields the resume label with a clear Thumb bit, which must be set by
/// hand before the address is stored as a PC.
///
/// The clobber list covers r0-r6, r8-r12 and LR. It deliberately omits r7
/// and SP: both are carried across the switch in the asm body itself, and
/// the compiler must keep treating r7 as the frame pointer.
///
/// # Safety
///
/// `prev` must be the context of the running task and `next` a context
/// primed by stack priming or filled by an earlier save. Interrupts must be
/// masked, and both saved stack pointers must satisfy the stack invariants.
pub(crate) unsafe fn switch_context(prev: *mut Context, next: *const Context) {
    // SAFETY: contract forwarded to the caller
    unsafe {
        asm!(
            // Callee-saved state rides on the outgoing task's own stack.
            "push {{r4, r5, r6, lr}}",
            "mov r3, r8",
            "mov r4, r9",
            "mov r5, r10",
            "mov r6, r11",
            "push {{r3, r4, r5, r6}}",
            // Record the outgoing context: sp, fp, resume point.
            "mov r2, sp",
            "str r2, [r0, {sp_off}]",
            "mov r2, r7",
            "str r2, [r0, {fp_off}]",
            "adr r2, 2f",
            "adds r2, #1",
            "str r2, [r0, {pc_off}]",
            // Install the incoming context and go. The incoming pc is
            // either 2f (a task suspended here) or the trampoline (a task
            // that has never run).
            "ldr r2, [r1, {sp_off}]",
            "mov sp, r2",
            "ldr r2, [r1, {fp_off}]",
            "mov r7, r2",
            "ldr r2, [r1, {pc_off}]",
            "bx r2",
            ".p2align 2",
            "2:",
            // Back on this task's stack; mirror the save exactly.
            "pop {{r3, r4, r5, r6}}",
            "mov r8, r3",
            "mov r9, r4",
            "mov r10, r5",
            "mov r11, r6",
            "pop {{r4, r5, r6}}",
            "pop {{r3}}",
            "mov lr, r3",
            inout("r0") prev => _,
            inout("r1") next => _,
            out("r2") _,
            out("r3") _,
            out("r4") _,
            out("r5") _,
            out("r6") _,
            out("r8") _,
            out("r9") _,
            out("r10") _,
            out("r11") _,
            out("r12") _,
            out("lr") _,
            sp_off = const Context::SP_OFFSET,
            fp_off = const Context::FP_OFFSET,
            pc_off = const Context::PC_OFFSET,
        );
    }
}

/// First instructions a new task ever runs.
///
/// Stack priming leaves `[args, entry]` at the stack pointer. Pop `args`
/// into r0 (argument zero by AAPCS) and `entry` into a scratch register,
/// call through, and hand whatever comes back straight to
/// [`exit`](crate::sched::exit) - the return value is already sitting in
/// r0, which is also `exit`'s first argument.
///
/// Naked because there is no frame to build: this code owns a freshly
/// primed stack and never returns.
#[unsafe(naked)]
pub(crate) unsafe extern "C" fn task_trampoline() -> ! {
    naked_asm!(
        "pop {{r0, r3}}",
        // The switch that got us here ran with interrupts masked, and the
        // spawner's critical-section guard stayed on the spawner's stack.
        // A fresh task starts with interrupts live.
        "cpsie i",
        "blx r3",
        "ldr r3, 3f",
        "bx r3",
        ".p2align 2",
        "3:",
        ".word {exit}",
        exit = sym crate::sched::exit,
    )
}

// End of File
