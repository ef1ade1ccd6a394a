//! Appropriate assembly language routines for the architecture
//!
//! Each implementation provides the same three items: `switch_context`, the
//! task trampoline, and the stack geometry constants the scheduler sizes
//! frames with. Device builds get the ARMv6-M routines; host builds get a
//! SysV equivalent so the scheduler can be exercised by `cargo test`.

#[cfg(all(
    arm_abi = "eabi",
    any(arm_architecture = "v6-m", arm_architecture = "v8-m.base")
))]
mod eabi_v6;

#[cfg(all(
    arm_abi = "eabi",
    any(arm_architecture = "v6-m", arm_architecture = "v8-m.base")
))]
pub(crate) use eabi_v6::{switch_context, task_trampoline};

#[cfg(all(
    arm_abi = "eabi",
    any(arm_architecture = "v6-m", arm_architecture = "v8-m.base")
))]
pub use eabi_v6::{STACK_ALIGN, SWITCH_FRAME_SIZE};

#[cfg(all(
    target_os = "none",
    not(all(
        arm_abi = "eabi",
        any(arm_architecture = "v6-m", arm_architecture = "v8-m.base")
    ))
))]
compile_error!(
    "no context-switch routine for this target; krill only runs on ARMv6-M class cores"
);

#[cfg(not(target_os = "none"))]
mod hosted;

#[cfg(not(target_os = "none"))]
pub(crate) use hosted::{switch_context, task_trampoline};

#[cfg(not(target_os = "none"))]
pub use hosted::{STACK_ALIGN, SWITCH_FRAME_SIZE};

// End of File
