use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

/// Future that suspends the current ambient task exactly once.
///
/// Awaiting it is a suspension boundary: anything the task does afterwards is
/// outside the continuation pass of the settlement that resumed it.
#[derive(Debug)]
#[must_use = "futures do nothing unless awaited"]
pub struct YieldNow {
    yielded: bool,
}

impl Future for YieldNow {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        if self.yielded {
            Poll::Ready(())
        } else {
            self.yielded = true;
            cx.waker().wake_by_ref();
            Poll::Pending
        }
    }
}

/// Yields back to the executor, letting other woken tasks run first.
///
/// Inside a continuation pass this ends the pass for the calling task: its
/// next poll waits until the releasing wait operation blocks or finishes.
pub fn yield_now() -> YieldNow {
    YieldNow { yielded: false }
}
