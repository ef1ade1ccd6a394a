//! Hosted (SysV) context switches for running the scheduler under `cargo test`
//!
//! Same contract as the Armv6-M routine: callee-saved state on the outgoing
//! stack, `{sp, fp, pc}` in the context, parameter-block trampoline. The
//! frame pointer slot holds rbp / x29 instead of r7.

use core::arch::{asm, naked_asm};

use crate::sched::Context;

/// SysV stack alignment at call boundaries (both x86-64 and aarch64)
pub const STACK_ALIGN: usize = 16;

/// Bytes [`switch_context`] pushes on the outgoing task's stack
#[cfg(target_arch = "x86_64")]
pub const SWITCH_FRAME_SIZE: usize = 5 * 8;

/// Bytes [`switch_context`] pushes on the outgoing task's stack.
///
/// x19-x28 and x30, plus d8-d15: unlike x86-64, aarch64 has callee-saved
/// SIMD registers, and a suspended task must get them back intact.
#[cfg(target_arch = "aarch64")]
pub const SWITCH_FRAME_SIZE: usize = 160;

#[cfg(not(any(target_arch = "x86_64", target_arch = "aarch64")))]
compile_error!("no hosted context-switch routine for this host architecture");

/// Suspend the execution described by `prev` and resume the one in `next`.
///
/// See the Armv6-M routine for the full contract; this is the x86-64 SysV
/// rendition. rbp is carried in the context like r7 is on Arm.
///
/// # Safety
///
/// As for the Armv6-M routine: `prev` is the running context, `next` is
/// primed or previously saved, stacks satisfy the invariants.
#[cfg(target_arch = "x86_64")]
pub(crate) unsafe fn switch_context(prev: *mut Context, next: *const Context) {
    // SAFETY: contract forwarded to the caller
    unsafe {
        asm!(
            "push rbx",
            "push r12",
            "push r13",
            "push r14",
            "push r15",
            "lea rax, [rip + 2f]",
            "mov [rdi + {pc_off}], rax",
            "mov [rdi + {fp_off}], rbp",
            "mov [rdi + {sp_off}], rsp",
            "mov rsp, [rsi + {sp_off}]",
            "mov rbp, [rsi + {fp_off}]",
            "jmp qword ptr [rsi + {pc_off}]",
            "2:",
            "pop r15",
            "pop r14",
            "pop r13",
            "pop r12",
            "pop rbx",
            inout("rdi") prev => _,
            inout("rsi") next => _,
            clobber_abi("C"),
            sp_off = const Context::SP_OFFSET,
            fp_off = const Context::FP_OFFSET,
            pc_off = const Context::PC_OFFSET,
        );
    }
}

/// First instructions a new task ever runs (x86-64).
///
/// The primed stack holds `[args, entry]`; args goes to rdi, the entry's
/// return value rides eax into edi for [`exit`](crate::sched::exit).
#[cfg(target_arch = "x86_64")]
#[unsafe(naked)]
pub(crate) unsafe extern "C" fn task_trampoline() -> ! {
    naked_asm!(
        "pop rdi",
        "pop rax",
        "call rax",
        "mov edi, eax",
        "jmp {exit}",
        exit = sym crate::sched::exit,
    )
}

/// Suspend the execution described by `prev` and resume the one in `next`.
///
/// aarch64 SysV rendition; x29 is carried in the context like r7 is on
/// ARMv6-M. SP must stay 16-aligned at every step here - the core faults on
/// a misaligned SP access, not just at call boundaries.
///
/// # Safety
///
/// As for the Armv6-M routine.
#[cfg(target_arch = "aarch64")]
pub(crate) unsafe fn switch_context(prev: *mut Context, next: *const Context) {
    // SAFETY: contract forwarded to the caller
    unsafe {
        asm!(
            "sub sp, sp, {frame}",
            "stp x19, x20, [sp]",
            "stp x21, x22, [sp, #16]",
            "stp x23, x24, [sp, #32]",
            "stp x25, x26, [sp, #48]",
            "stp x27, x28, [sp, #64]",
            "str x30, [sp, #80]",
            "stp d8, d9, [sp, #96]",
            "stp d10, d11, [sp, #112]",
            "stp d12, d13, [sp, #128]",
            "stp d14, d15, [sp, #144]",
            "adr x9, 2f",
            "str x9, [x0, {pc_off}]",
            "str x29, [x0, {fp_off}]",
            "mov x9, sp",
            "str x9, [x0, {sp_off}]",
            "ldr x9, [x1, {sp_off}]",
            "mov sp, x9",
            "ldr x29, [x1, {fp_off}]",
            "ldr x9, [x1, {pc_off}]",
            "br x9",
            "2:",
            "ldp x19, x20, [sp]",
            "ldp x21, x22, [sp, #16]",
            "ldp x23, x24, [sp, #32]",
            "ldp x25, x26, [sp, #48]",
            "ldp x27, x28, [sp, #64]",
            "ldr x30, [sp, #80]",
            "ldp d8, d9, [sp, #96]",
            "ldp d10, d11, [sp, #112]",
            "ldp d12, d13, [sp, #128]",
            "ldp d14, d15, [sp, #144]",
            "add sp, sp, {frame}",
            inout("x0") prev => _,
            inout("x1") next => _,
            clobber_abi("C"),
            frame = const SWITCH_FRAME_SIZE,
            sp_off = const Context::SP_OFFSET,
            fp_off = const Context::FP_OFFSET,
            pc_off = const Context::PC_OFFSET,
        );
    }
}

/// First instructions a new task ever runs (aarch64).
#[cfg(target_arch = "aarch64")]
#[unsafe(naked)]
pub(crate) unsafe extern "C" fn task_trampoline() -> ! {
    naked_asm!(
        "ldp x0, x9, [sp], #16",
        "blr x9",
        "b {exit}",
        exit = sym crate::sched::exit,
    )
}

// End of File
