//! Scoped interrupt masking for the kernel's critical regions

use core::marker::PhantomData;

/// Proof that interrupts are masked.
///
/// Obtained from [`enter`]. Remembers the PRIMASK state sampled on entry,
/// so nested sections restore exactly what they found. Released on drop;
/// [`exit`] is a named drop for the paths that want to be explicit.
///
/// The guard is deliberately not `Copy` and cannot be constructed outside
/// this module. It is also not `Send`: a guard taken before a context
/// switch stays on the suspended task's stack and is released on that
/// task's side once it is scheduled again.
pub struct Guard {
    was_active: bool,
    _not_send: PhantomData<*mut ()>,
}

/// Mask interrupts, remembering whether they were live.
pub fn enter() -> Guard {
    let was_active = interrupts_active();
    disable_interrupts();
    Guard {
        was_active,
        _not_send: PhantomData,
    }
}

/// Unmask interrupts if, and only if, they were live when `guard` was taken.
pub fn exit(guard: Guard) {
    drop(guard);
}

impl Drop for Guard {
    fn drop(&mut self) {
        if self.was_active {
            // SAFETY: interrupts were enabled when this guard was taken, so
            // whatever the guard protected must be consistent again by now.
            unsafe { enable_interrupts() }
        }
    }
}

#[cfg(target_os = "none")]
fn interrupts_active() -> bool {
    cortex_m::register::primask::read().is_active()
}

#[cfg(target_os = "none")]
fn disable_interrupts() {
    cortex_m::interrupt::disable();
}

#[cfg(target_os = "none")]
unsafe fn enable_interrupts() {
    // SAFETY: forwarded to the caller via Guard::drop's reasoning
    unsafe { cortex_m::interrupt::enable() }
}

// Hosted builds have no PRIMASK. It is per-core state, and the hosted
// equivalent of a core is a thread, so a thread-local flag stands in for
// it - which also keeps parallel tests out of each other's hair.

#[cfg(not(target_os = "none"))]
mod primask_sim {
    use core::cell::Cell;

    std::thread_local! {
        static ACTIVE: Cell<bool> = const { Cell::new(true) };
    }

    pub(super) fn active() -> bool {
        ACTIVE.with(Cell::get)
    }

    pub(super) fn set(value: bool) {
        ACTIVE.with(|active| active.set(value));
    }
}

#[cfg(not(target_os = "none"))]
fn interrupts_active() -> bool {
    primask_sim::active()
}

#[cfg(not(target_os = "none"))]
fn disable_interrupts() {
    primask_sim::set(false);
}

#[cfg(not(target_os = "none"))]
unsafe fn enable_interrupts() {
    primask_sim::set(true);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn restores_prior_state() {
        assert!(interrupts_active());
        let guard = enter();
        assert!(!interrupts_active());
        exit(guard);
        assert!(interrupts_active());
    }

    #[test]
    fn nested_sections_unwind_in_order() {
        let outer = enter();
        assert!(!interrupts_active());
        let inner = enter();
        assert!(!interrupts_active());
        // Dropping the inner guard must not unmask: interrupts were already
        // off when it was taken.
        exit(inner);
        assert!(!interrupts_active());
        exit(outer);
        assert!(interrupts_active());
    }
}

// End of File
