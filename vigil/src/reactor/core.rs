use super::event::Event;
use super::poller::Poller;
use super::timer::{DelayedTask, TimerQueue};
use super::watch::{Direction, WatchTable, WatchedDescriptor};
use crate::error::{Error, Result};
use crate::runtime::builder::MAX_EVENT_CAPACITY;
use crate::runtime::context;
use crate::runtime::task::{NULL_TASK, TaskId, TaskIdAllocator, WatchCallback};

use std::cell::{Cell, RefCell};
use std::ops::Deref;
use std::os::fd::RawFd;
use std::panic::Location;
use std::rc::{Rc, Weak};
use std::time::{Duration, Instant};
use tracing::{debug, error, trace, warn};

/// Deadline used when `now + delay` does not fit in an [`Instant`].
const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

/// The reactor.
///
/// A reactor multiplexes delayed callbacks with file-descriptor readiness
/// watches on the thread that drives it. Each call to
/// [`run_once`](ReactorHandle::run_once) waits for the next ready item and
/// dispatches at most one callback, synchronously, before returning.
///
/// `Reactor` owns the loop state; all scheduling, cancellation and run
/// operations live on [`ReactorHandle`], which the reactor dereferences
/// to. Callbacks that need to reenter the loop capture a cloned handle.
///
/// The type is neither `Send` nor `Sync`: tasks can only be posted from the
/// thread that owns the reactor.
pub struct Reactor {
    /// Shared loop state. Handles hold weak references to it.
    inner: Rc<Inner>,

    /// Handle returned by [`Deref`].
    handle: ReactorHandle,
}

/// A handle to a [`Reactor`].
///
/// Handles are cheap to clone and do not keep the reactor alive. Once the
/// reactor is dropped, posting through a handle returns [`NULL_TASK`],
/// cancelling returns `false` and running dispatches nothing.
#[derive(Clone)]
pub struct ReactorHandle {
    inner: Weak<Inner>,
}

struct Inner {
    /// Everything a dispatch may mutate. Never borrowed across a callback.
    state: RefCell<State>,

    /// Set by [`ReactorHandle::break_loop`], consumed by `run`.
    should_stop: Cell<bool>,

    /// Whether a `run` call is in progress.
    running: Cell<bool>,
}

struct State {
    ids: TaskIdAllocator,
    timers: TimerQueue,
    watches: WatchTable,
    poller: Poller,

    /// Readiness collected by the last wait.
    events: Vec<Event>,

    /// Last watch dispatched, used to rotate among ready watches.
    last_watch: TaskId,
}

/// The single unit of work picked by one loop iteration.
enum Dispatch {
    Timer(DelayedTask),

    /// A non-persistent watch, already removed from the table.
    OneShot(WatchedDescriptor),

    /// A persistent watch, still registered, with its callback lent out.
    Persistent {
        id: TaskId,
        callback: WatchCallback,
        location: &'static Location<'static>,
    },
}

/// A task taken out of its table by a cancellation.
enum Removed {
    Timer(DelayedTask),
    Watch(WatchedDescriptor),
}

impl Reactor {
    /// Creates a reactor with default settings.
    ///
    /// See [`ReactorBuilder`](crate::ReactorBuilder) to configure it.
    pub fn new() -> Result<Self> {
        crate::ReactorBuilder::new().build()
    }

    pub(crate) fn with_event_capacity(event_capacity: usize) -> Result<Self> {
        let event_capacity = event_capacity.clamp(1, MAX_EVENT_CAPACITY);
        let poller = Poller::new(event_capacity).map_err(Error::PollerInit)?;

        let inner = Rc::new(Inner {
            state: RefCell::new(State {
                ids: TaskIdAllocator::new(),
                timers: TimerQueue::new(),
                watches: WatchTable::new(),
                poller,
                events: Vec::with_capacity(event_capacity),
                last_watch: NULL_TASK,
            }),
            should_stop: Cell::new(false),
            running: Cell::new(false),
        });

        let handle = ReactorHandle {
            inner: Rc::downgrade(&inner),
        };

        Ok(Self { inner, handle })
    }

    /// Returns a new handle to this reactor.
    pub fn handle(&self) -> ReactorHandle {
        self.handle.clone()
    }

    /// Makes this reactor the current one for the calling thread.
    ///
    /// # Panics
    ///
    /// Panics if another live reactor is already current on this thread.
    pub fn set_as_current(&self) {
        context::set_current(&self.handle);
    }

    /// Releases this reactor from being the current one for the calling
    /// thread.
    ///
    /// # Panics
    ///
    /// Panics if this reactor is not the current one.
    pub fn release_from_current(&self) {
        context::release_current(&self.handle);
    }
}

impl Deref for Reactor {
    type Target = ReactorHandle;

    fn deref(&self) -> &ReactorHandle {
        &self.handle
    }
}

impl Drop for Reactor {
    fn drop(&mut self) {
        context::release_if_current(&self.handle);

        // A `run` in progress on this reactor returns after the current callback.
        self.inner.should_stop.set(true);

        let Ok(state) = self.inner.state.try_borrow() else {
            return;
        };
        if !state.timers.is_empty() || !state.watches.is_empty() {
            debug!(
                timers = state.timers.len(),
                watches = state.watches.len(),
                "dropping reactor with pending tasks"
            );
        }
    }
}

impl ReactorHandle {
    /// Schedules `callback` to run once `delay` has elapsed.
    ///
    /// The delay is a lower bound: the callback never runs earlier, but may
    /// run later if the loop is busy. Returns the id of the new task, or
    /// [`NULL_TASK`] if the reactor no longer exists.
    ///
    /// Once the task fires or is cancelled its id may be reused.
    #[track_caller]
    pub fn post_delayed_task<F>(&self, callback: F, delay: Duration) -> TaskId
    where
        F: FnOnce() + 'static,
    {
        let location = Location::caller();
        let Some(inner) = self.inner.upgrade() else {
            warn!(%location, "posting to a dropped reactor");
            return NULL_TASK;
        };

        let now = Instant::now();
        let deadline = now
            .checked_add(delay)
            .unwrap_or_else(|| now + FAR_FUTURE);

        let mut state = inner.state.borrow_mut();
        let id = state.next_id();
        state.timers.insert(DelayedTask {
            id,
            deadline,
            callback: Box::new(callback),
            location,
        });

        debug!(task = %id, ?delay, %location, "posted delayed task");
        id
    }

    /// Schedules `callback` to run as soon as possible.
    ///
    /// Equivalent to [`post_delayed_task`](Self::post_delayed_task) with a
    /// zero delay.
    #[track_caller]
    pub fn post_task<F>(&self, callback: F) -> TaskId
    where
        F: FnOnce() + 'static,
    {
        self.post_delayed_task(callback, Duration::ZERO)
    }

    /// Watches `fd` for readiness in `direction`.
    ///
    /// `callback` runs each time a read (or write) on `fd` would not block;
    /// for reads this includes end-of-stream. A non-persistent watch is
    /// removed right before its single dispatch. A persistent watch keeps
    /// firing while the descriptor stays ready, until cancelled.
    ///
    /// Returns [`NULL_TASK`] without installing anything if `fd` is
    /// negative, already watched in `direction`, or refused by the OS
    /// poller.
    #[track_caller]
    pub fn watch_file_descriptor<F>(
        &self,
        fd: RawFd,
        direction: Direction,
        persistent: bool,
        callback: F,
    ) -> TaskId
    where
        F: FnMut() + 'static,
    {
        let location = Location::caller();
        let Some(inner) = self.inner.upgrade() else {
            warn!(%location, fd, "watching through a dropped reactor");
            return NULL_TASK;
        };

        let mut state = inner.state.borrow_mut();
        if let Err(err) = state.arm(fd, direction) {
            drop(state);
            warn!(
                fd,
                ?direction,
                %location,
                error = %err,
                label = err.as_label(),
                "rejected file descriptor watch"
            );
            return NULL_TASK;
        }

        let id = state.next_id();
        state.watches.add(WatchedDescriptor {
            id,
            fd,
            direction,
            persistent,
            callback: Some(Box::new(callback)),
            location,
        });

        debug!(task = %id, fd, ?direction, persistent, %location, "watching file descriptor");
        id
    }

    /// Cancels a scheduled task.
    ///
    /// Returns `true` if the task was pending and will now never run.
    /// Returns `false` for [`NULL_TASK`], unknown ids, tasks already
    /// cancelled, delayed tasks that already ran or are running, and
    /// non-persistent watches that already fired. A persistent watch may
    /// cancel itself from its own callback.
    pub fn cancel_task(&self, id: TaskId) -> bool {
        if id.is_null() {
            return false;
        }

        let Some(inner) = self.inner.upgrade() else {
            return false;
        };

        let removed = inner.state.borrow_mut().remove(id);
        match removed {
            Some(Removed::Timer(task)) => {
                debug!(task = %id, location = %task.location, "cancelled delayed task");
                true
            }
            Some(Removed::Watch(watch)) => {
                debug!(task = %id, fd = watch.fd, location = %watch.location, "cancelled watch");
                true
            }
            None => false,
        }
    }

    /// Runs one iteration of the loop, dispatching at most one task.
    ///
    /// With `may_block` set, waits until a watched descriptor is ready or
    /// the earliest delayed task is due; otherwise only checks what is
    /// ready right now. Returns immediately with `false` when no task is
    /// registered at all. Ready watches are served before due timers.
    ///
    /// Returns whether a callback ran.
    pub fn run_once(&self, may_block: bool) -> bool {
        let Some(inner) = self.inner.upgrade() else {
            return false;
        };

        match inner.run_once(may_block) {
            Ok(ran) => ran,
            Err(err) => {
                error!(error = %err, label = err.as_label(), "reactor iteration failed");
                false
            }
        }
    }

    /// Runs the loop until no task is left or [`break_loop`](Self::break_loop)
    /// is called.
    pub fn run(&self) {
        let Some(inner) = self.inner.upgrade() else {
            return;
        };

        let was_running = inner.running.replace(true);
        inner.should_stop.set(false);
        debug!("reactor running");

        while !inner.should_stop.get() {
            match inner.run_once(true) {
                Ok(true) => {}
                Ok(false) if !inner.has_tasks() => break,
                Ok(false) => {}
                Err(err) => {
                    error!(error = %err, label = err.as_label(), "reactor stopped");
                    break;
                }
            }
        }

        inner.should_stop.set(false);
        inner.running.set(was_running);
        debug!("reactor stopped running");
    }

    /// Makes the running [`run`](Self::run) return once the current callback
    /// returns, without dispatching anything else.
    pub fn break_loop(&self) {
        if let Some(inner) = self.inner.upgrade() {
            inner.should_stop.set(true);
        }
    }

    /// Returns `true` while a [`run`](Self::run) call is in progress.
    pub fn is_running(&self) -> bool {
        self.inner.upgrade().is_some_and(|inner| inner.running.get())
    }

    /// Returns `true` if any delayed task or watch is registered.
    pub fn has_tasks(&self) -> bool {
        self.inner.upgrade().is_some_and(|inner| inner.has_tasks())
    }

    /// Returns `true` if the reactor behind this handle still exists.
    pub fn is_alive(&self) -> bool {
        self.inner.strong_count() > 0
    }

    /// Returns `true` if both handles refer to the same reactor.
    pub fn same_loop(&self, other: &ReactorHandle) -> bool {
        Weak::ptr_eq(&self.inner, &other.inner)
    }
}

impl Inner {
    fn has_tasks(&self) -> bool {
        let state = self.state.borrow();
        !state.timers.is_empty() || !state.watches.is_empty()
    }

    fn run_once(&self, may_block: bool) -> Result<bool> {
        let dispatch = {
            let mut state = self.state.borrow_mut();

            if state.timers.is_empty() && state.watches.is_empty() {
                return Ok(false);
            }

            let timeout = if may_block {
                state
                    .timers
                    .peek_deadline()
                    .map(|deadline| deadline.saturating_duration_since(Instant::now()))
            } else {
                Some(Duration::ZERO)
            };

            state.wait(timeout)?;
            state.next_dispatch(Instant::now())
        };

        match dispatch {
            Some(dispatch) => {
                self.dispatch(dispatch);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Runs the picked callback with no borrow of the state held.
    fn dispatch(&self, dispatch: Dispatch) {
        match dispatch {
            Dispatch::Timer(task) => {
                trace!(task = %task.id, location = %task.location, "running delayed task");
                (task.callback)();
            }
            Dispatch::OneShot(mut watch) => {
                trace!(task = %watch.id, fd = watch.fd, location = %watch.location, "running watch");
                if let Some(callback) = watch.callback.as_mut() {
                    callback();
                }
            }
            Dispatch::Persistent {
                id,
                callback,
                location,
            } => {
                trace!(task = %id, %location, "running persistent watch");
                let mut lent = Lent {
                    inner: self,
                    id,
                    callback: Some(callback),
                };
                if let Some(callback) = lent.callback.as_mut() {
                    callback();
                }
            }
        }
    }
}

/// A persistent watch callback on loan for the duration of its call.
///
/// Dropping the loan returns the callback to its watch, also when the
/// callback unwinds. If the watch was cancelled meanwhile, the callback is
/// dropped here, outside any borrow of the state.
struct Lent<'a> {
    inner: &'a Inner,
    id: TaskId,
    callback: Option<WatchCallback>,
}

impl Drop for Lent<'_> {
    fn drop(&mut self) {
        let Some(callback) = self.callback.take() else {
            return;
        };

        let leftover = match self.inner.state.try_borrow_mut() {
            Ok(mut state) => state.watches.restore_callback(self.id, callback),
            Err(_) => Some(callback),
        };
        drop(leftover);
    }
}

impl State {
    fn next_id(&mut self) -> TaskId {
        let timers = &self.timers;
        let watches = &self.watches;
        self.ids.next(|id| timers.contains(id) || watches.contains(id))
    }

    /// Validates a new watch and registers its direction with the poller.
    fn arm(&mut self, fd: RawFd, direction: Direction) -> Result<()> {
        self.watches.check(fd, direction)?;

        let current = self.watches.interest(fd);
        let wanted = current.with(direction);

        let registered = if current.is_empty() {
            self.poller.register(fd, wanted)
        } else {
            self.poller.reregister(fd, wanted)
        };

        registered.map_err(|source| Error::Register { fd, source })
    }

    /// Shrinks the poller registration of `fd` to its remaining watches.
    fn disarm(&mut self, fd: RawFd) {
        let remaining = self.watches.interest(fd);

        if remaining.is_empty() {
            self.poller.deregister(fd);
        } else if let Err(err) = self.poller.reregister(fd, remaining) {
            debug!(fd, error = %err, "failed to narrow poller interest");
        }
    }

    fn remove(&mut self, id: TaskId) -> Option<Removed> {
        if let Some(task) = self.timers.cancel(id) {
            return Some(Removed::Timer(task));
        }

        let watch = self.watches.remove(id)?;
        self.disarm(watch.fd);

        Some(Removed::Watch(watch))
    }

    fn wait(&mut self, timeout: Option<Duration>) -> Result<()> {
        self.poller.poll(&mut self.events, timeout).map_err(Error::Wait)
    }

    /// Picks the next task to run: a ready watch if any, else a due timer.
    ///
    /// Ready watches rotate by id: the first one after the last dispatched
    /// watch wins, wrapping to the lowest.
    fn next_dispatch(&mut self, now: Instant) -> Option<Dispatch> {
        let ready = self.watches.poll_ready(&self.events);

        let picked = ready
            .iter()
            .copied()
            .find(|&id| id > self.last_watch)
            .or_else(|| ready.first().copied());

        if let Some(id) = picked {
            self.last_watch = id;

            let persistent = self.watches.get(id).is_some_and(|watch| watch.persistent);
            if persistent {
                let location = self.watches.get(id)?.location;
                let callback = self.watches.take_callback(id)?;

                return Some(Dispatch::Persistent {
                    id,
                    callback,
                    location,
                });
            }

            let watch = self.watches.remove(id)?;
            self.disarm(watch.fd);

            return Some(Dispatch::OneShot(watch));
        }

        self.timers.pop_ready(now).map(Dispatch::Timer)
    }
}
