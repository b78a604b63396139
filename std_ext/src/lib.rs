use std::sync::Arc;

// Method syntax for `Arc::clone` that passes `clippy::clone_on_ref_ptr`.
pub trait ArcExt {
    #[must_use]
    fn clone_arc(&self) -> Self;
}

impl<T: ?Sized> ArcExt for Arc<T> {
    fn clone_arc(&self) -> Self {
        Self::clone(self)
    }
}
