use crate::reactor::ReactorHandle;

use std::cell::RefCell;

thread_local! {
    /// Thread-local handle to the current reactor.
    ///
    /// Installed by [`Reactor::set_as_current`](crate::Reactor::set_as_current)
    /// and removed by [`Reactor::release_from_current`](crate::Reactor::release_from_current)
    /// or when that reactor is dropped. At most one reactor is current per
    /// thread.
    static CURRENT_REACTOR: RefCell<Option<ReactorHandle>> = const { RefCell::new(None) };
}

/// Returns a handle to the reactor current on the calling thread, if any.
///
/// This is meant for the boundaries where no handle is otherwise
/// available; code that already has a handle should pass it along.
pub fn current() -> Option<ReactorHandle> {
    CURRENT_REACTOR
        .try_with(|current| {
            current
                .borrow()
                .as_ref()
                .filter(|handle| handle.is_alive())
                .cloned()
        })
        .ok()
        .flatten()
}

pub(crate) fn set_current(handle: &ReactorHandle) {
    CURRENT_REACTOR.with(|current| {
        let mut current = current.borrow_mut();

        if let Some(existing) = current.as_ref() {
            assert!(
                !existing.is_alive(),
                "a reactor is already current on this thread"
            );
        }

        *current = Some(handle.clone());
    });
}

pub(crate) fn release_current(handle: &ReactorHandle) {
    CURRENT_REACTOR.with(|current| {
        let mut current = current.borrow_mut();

        assert!(
            current.as_ref().is_some_and(|c| c.same_loop(handle)),
            "reactor released from current without being current"
        );

        *current = None;
    });
}

/// Clears the registry if it points at `handle`.
///
/// Called when a reactor is dropped; tolerates thread teardown.
pub(crate) fn release_if_current(handle: &ReactorHandle) {
    let _ = CURRENT_REACTOR.try_with(|current| {
        if let Ok(mut current) = current.try_borrow_mut()
            && current.as_ref().is_some_and(|c| c.same_loop(handle))
        {
            *current = None;
        }
    });
}
