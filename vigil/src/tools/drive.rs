use crate::reactor::ReactorHandle;

use std::cell::Cell;
use std::rc::Rc;
use std::time::{Duration, Instant};

/// Runs up to `iterations` non-blocking loop iterations.
///
/// Stops at the first iteration that dispatches nothing. Returns the
/// number of callbacks that ran.
///
/// # Examples
///
/// ```rust,no_run
/// use vigil::{Reactor, tools::run_max_iterations};
///
/// let reactor = Reactor::new().unwrap();
/// reactor.post_task(|| println!("hello"));
///
/// assert_eq!(run_max_iterations(&reactor, 10), 1);
/// ```
pub fn run_max_iterations(handle: &ReactorHandle, iterations: usize) -> usize {
    let mut ran = 0;

    while ran < iterations && handle.run_once(false) {
        ran += 1;
    }

    ran
}

/// Runs the loop until `condition` returns `true` or `timeout` elapses.
///
/// A delayed task is posted to wake a blocked wait when the time is up, and
/// is cancelled again if the condition is met first. The deadline is also
/// checked on the clock before every iteration, so a persistently ready
/// watch cannot hold off the timeout. The loop gives up early once an
/// iteration dispatches nothing and no task is left, since nothing could
/// change the condition anymore. Returns whether the condition was met.
pub fn run_until<F>(handle: &ReactorHandle, timeout: Duration, mut condition: F) -> bool
where
    F: FnMut() -> bool,
{
    let deadline = Instant::now().checked_add(timeout);
    let timed_out = Rc::new(Cell::new(false));

    let flag = Rc::clone(&timed_out);
    let timeout_task = handle.post_delayed_task(move || flag.set(true), timeout);
    if timeout_task.is_null() {
        return condition();
    }

    let met = loop {
        if condition() {
            break true;
        }
        if timed_out.get() || deadline.is_some_and(|deadline| Instant::now() >= deadline) {
            break false;
        }

        if !handle.run_once(true) && !handle.has_tasks() {
            break condition();
        }
    };

    if !timed_out.get() {
        handle.cancel_task(timeout_task);
    }

    met
}
