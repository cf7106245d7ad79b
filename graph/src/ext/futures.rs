use std::sync::{Arc, Weak};

use crate::cheap_clone::CheapClone;

/// Cancels the operation it guards when dropped.
#[derive(Debug, Default)]
pub struct CancelGuard {
    /// This is the only strong reference, handles only hold weak ones
    alive: Arc<()>,
}

impl CancelGuard {
    /// Creates a guard that is not canceled yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// A more readable `drop`.
    pub fn cancel(self) {}

    pub fn handle(&self) -> CancelHandle {
        CancelHandle {
            guard: Arc::downgrade(&self.alive),
        }
    }
}

/// A shared handle to a guard. The handle may outlive the guard, in which
/// case it reports that it has been canceled.
///
/// Dropping a handle has no effect.
#[derive(Clone, Debug)]
pub struct CancelHandle {
    guard: Weak<()>,
}

impl CheapClone for CancelHandle {}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Canceled;

pub trait CancelToken {
    fn is_canceled(&self) -> bool;
    fn check_cancel(&self) -> Result<(), Canceled> {
        if self.is_canceled() {
            Err(Canceled)
        } else {
            Ok(())
        }
    }
}

impl CancelToken for CancelHandle {
    fn is_canceled(&self) -> bool {
        // Has been canceled if and only if the guard is gone.
        self.guard.upgrade().is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handle_sees_cancelation() {
        let guard = CancelGuard::new();
        let handle = guard.handle();
        let other = handle.cheap_clone();
        assert!(handle.check_cancel().is_ok());
        guard.cancel();
        assert_eq!(Err(Canceled), handle.check_cancel());
        assert!(other.is_canceled());
    }
}
