//! Functions whose invocations are individually scheduled.

use std::fmt::{self, Debug};
use std::future::Future;
use std::rc::Rc;

use super::Scheduler;
use super::handle::Scheduled;
use crate::types::TaskKind;

/// Argument lists accepted by [`ScheduledFn::call`].
///
/// Implemented for `()` and tuples of up to four `Debug` values. The rendered
/// form becomes part of the task label: `name(arg0,arg1)`.
pub trait CallArgs {
    /// Renders the arguments, comma separated, without parentheses.
    fn render_args(&self) -> String;
}

impl CallArgs for () {
    fn render_args(&self) -> String {
        String::new()
    }
}

macro_rules! impl_call_args {
    ($($name:ident . $idx:tt),+) => {
        impl<$($name: Debug),+> CallArgs for ($($name,)+) {
            fn render_args(&self) -> String {
                [$(format!("{:?}", self.$idx)),+].join(",")
            }
        }
    };
}

impl_call_args!(A.0);
impl_call_args!(A.0, B.1);
impl_call_args!(A.0, B.1, C.2);
impl_call_args!(A.0, B.1, C.2, D.3);

/// A function wrapped by [`Scheduler::schedule_function`].
///
/// Every [`call`](Self::call) registers a new `function` task; the wrapped
/// function builds the computation immediately but it does not run until the
/// scheduler releases it. Clones share the scheduler and the function, so a
/// continuation can call it again to recurse.
pub struct ScheduledFn<F> {
    scheduler: Scheduler,
    name: Rc<str>,
    f: Rc<F>,
}

impl<F> ScheduledFn<F> {
    pub(crate) fn new(scheduler: Scheduler, name: &str, f: F) -> Self {
        Self {
            scheduler,
            name: Rc::from(name),
            f: Rc::new(f),
        }
    }

    /// Name used in labels.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Invokes the function and schedules the resulting computation.
    pub fn call<A, Fut, T, E>(&self, args: A) -> Scheduled<T, E>
    where
        F: Fn(A) -> Fut,
        A: CallArgs,
        Fut: Future<Output = Result<T, E>> + 'static,
        T: Debug + 'static,
        E: Debug + 'static,
    {
        let label = format!("{}({})", self.name, args.render_args());
        let computation = (self.f)(args);
        self.scheduler
            .schedule_kind(TaskKind::Function, label, None, computation)
    }
}

impl<F> Clone for ScheduledFn<F> {
    fn clone(&self) -> Self {
        Self {
            scheduler: self.scheduler.clone(),
            name: Rc::clone(&self.name),
            f: Rc::clone(&self.f),
        }
    }
}

impl<F> fmt::Debug for ScheduledFn<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScheduledFn")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selector::FifoSelector;
    use std::convert::Infallible;

    #[test]
    fn args_render_comma_separated() {
        assert_eq!(().render_args(), "");
        assert_eq!((1,).render_args(), "1");
        assert_eq!((1, "a").render_args(), "1,\"a\"");
        assert_eq!((1, 2, 3, Some(4)).render_args(), "1,2,3,Some(4)");
    }

    #[test]
    fn each_call_is_a_labelled_function_task() {
        let scheduler = Scheduler::with_selector(FifoSelector);
        let add = scheduler.schedule_function("add", |(a, b): (i32, i32)| async move {
            Ok::<_, Infallible>(a + b)
        });
        let first = add.call((1, 2));
        let second = add.clone().call((3, 4));
        assert_ne!(first.id(), second.id());

        let pending = scheduler.pending_tasks();
        assert_eq!(pending.len(), 2);
        assert_eq!(pending[0].kind, TaskKind::Function);
        assert_eq!(pending[0].label, "add(1,2)");
        assert_eq!(pending[1].label, "add(3,4)");
        assert_eq!(add.name(), "add");
    }
}
