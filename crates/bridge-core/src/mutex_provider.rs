//! Pluggable mutex abstraction.
//!
//! Real Cryptoki libraries let the caller supply its own mutex
//! primitives via `CK_C_INITIALIZE_ARGS`; this bridge models the same
//! three-way choice even though its own internal locking always uses
//! `parking_lot` under the hood. The selection is informational at this
//! layer: it governs whether `Runtime` treats itself as single-threaded
//! (no-op) or not, and is fixed once at `initialize`.

/// Caller-supplied mutex callback set. Providing any one of the four
/// implies all four must be provided.
pub struct MutexCallbacks {
    pub create: fn() -> u64,
    pub destroy: fn(u64),
    pub lock: fn(u64),
    pub unlock: fn(u64),
}

pub enum MutexProvider {
    /// The library's own native mutexes (what every lock in this crate
    /// actually is, regardless of provider choice).
    Native,
    /// Caller-supplied callbacks, recorded for API fidelity.
    Callbacks(MutexCallbacks),
    /// The caller asserts it will never call this library from more than
    /// one thread at a time.
    NoLocking,
}

impl MutexProvider {
    #[must_use]
    pub fn locking_enabled(&self) -> bool {
        !matches!(self, Self::NoLocking)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_locking_provider_disables_locking() {
        assert!(!MutexProvider::NoLocking.locking_enabled());
        assert!(MutexProvider::Native.locking_enabled());
    }
}
