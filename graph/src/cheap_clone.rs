use slog::Logger;
use std::rc::Rc;
use std::sync::Arc;

/// Things that are fast to clone in the context of an application such as
/// this: reference counted pointers and handles. Using `cheap_clone` instead
/// of `clone` documents that the clone is cheap at the call site.
pub trait CheapClone: Clone {
    #[inline]
    fn cheap_clone(&self) -> Self {
        self.clone()
    }
}

impl<T: ?Sized> CheapClone for Rc<T> {}
impl<T: ?Sized> CheapClone for Arc<T> {}
impl CheapClone for Logger {}
