//! The side-effect hook wrapped around each release-and-settle step.

use std::fmt;
use std::future::Future;
use std::rc::Rc;

use futures_lite::future::BoxedLocal;

type Wrap = dyn Fn(BoxedLocal<()>) -> BoxedLocal<()>;

/// Wraps every release-and-settle step in a harness-specific scope.
///
/// The hook receives the step as a future and must drive it to completion,
/// typically by awaiting it between some setup and teardown:
///
/// ```
/// use schedlab::ActHook;
/// use std::cell::Cell;
/// use std::rc::Rc;
///
/// let depth = Rc::new(Cell::new(0));
/// let seen = Rc::clone(&depth);
/// let hook = ActHook::new(move |body| {
///     let seen = Rc::clone(&seen);
///     async move {
///         seen.set(seen.get() + 1);
///         body.await;
///         seen.set(seen.get() - 1);
///     }
/// });
/// # let _ = hook;
/// ```
///
/// Resolution order is per call (the `*_with` wait operations), then per
/// scheduler instance, then [`ActHook::identity`]. Hooks never nest: exactly
/// one wraps each step.
#[derive(Clone)]
pub struct ActHook(Rc<Wrap>);

impl ActHook {
    /// Creates a hook from a wrapping function.
    pub fn new<F, Fut>(wrap: F) -> Self
    where
        F: Fn(BoxedLocal<()>) -> Fut + 'static,
        Fut: Future<Output = ()> + 'static,
    {
        Self(Rc::new(move |body| Box::pin(wrap(body))))
    }

    /// A hook that runs the step unchanged.
    #[must_use]
    pub fn identity() -> Self {
        Self(Rc::new(|body| body))
    }

    pub(crate) fn run(&self, body: BoxedLocal<()>) -> BoxedLocal<()> {
        (self.0)(body)
    }
}

impl Default for ActHook {
    fn default() -> Self {
        Self::identity()
    }
}

impl fmt::Debug for ActHook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ActHook").finish_non_exhaustive()
    }
}
