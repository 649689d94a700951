mod common;

use common::ScopedPipe;

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::{Duration, Instant};
use vigil::tools::{run_max_iterations, run_until};
use vigil::{Direction, MAX_EVENT_CAPACITY, NULL_TASK, Reactor, ReactorBuilder};

#[test_log::test]
fn test_run_once_without_tasks_returns_false() {
    let reactor = Reactor::new().unwrap();

    let start = Instant::now();
    assert!(!reactor.run_once(true));
    assert!(!reactor.run_once(false));
    assert!(start.elapsed() < Duration::from_secs(1));
}

#[test_log::test]
fn test_run_once_blocks_until_timer_is_due() {
    let reactor = Reactor::new().unwrap();
    let called = Rc::new(Cell::new(false));

    let flag = called.clone();
    reactor.post_delayed_task(move || flag.set(true), Duration::from_millis(30));

    let start = Instant::now();
    while !reactor.run_once(true) {}

    assert!(called.get());
    assert!(start.elapsed() >= Duration::from_millis(30));
}

#[test_log::test]
fn test_run_drains_all_tasks() {
    let reactor = Reactor::new().unwrap();
    let count = Rc::new(Cell::new(0));

    for delay in [0, 5, 10] {
        let count = count.clone();
        reactor.post_delayed_task(
            move || count.set(count.get() + 1),
            Duration::from_millis(delay),
        );
    }

    reactor.run();

    assert_eq!(count.get(), 3);
    assert!(!reactor.has_tasks());
}

#[test_log::test]
fn test_run_without_tasks_returns() {
    let reactor = Reactor::new().unwrap();

    reactor.run();

    assert!(!reactor.is_running());
}

#[test_log::test]
fn test_break_loop_stops_after_current_task() {
    let reactor = Reactor::new().unwrap();
    let order = Rc::new(RefCell::new(Vec::new()));

    let (handle, log) = (reactor.handle(), order.clone());
    reactor.post_task(move || {
        log.borrow_mut().push("first");
        handle.break_loop();
        log.borrow_mut().push("after break");
    });
    let log = order.clone();
    reactor.post_task(move || log.borrow_mut().push("second"));

    reactor.run();
    assert_eq!(*order.borrow(), vec!["first", "after break"]);
    assert!(reactor.has_tasks());

    // A fresh run starts with the stop request cleared.
    reactor.run();
    assert_eq!(*order.borrow(), vec!["first", "after break", "second"]);
}

#[test_log::test]
fn test_break_loop_with_idle_watch() {
    let reactor = Reactor::new().unwrap();
    let pipe = ScopedPipe::new();

    let idle = reactor.watch_file_descriptor(pipe.reader, Direction::Read, true, || {});
    assert_ne!(idle, NULL_TASK);

    let handle = reactor.handle();
    reactor.post_delayed_task(move || handle.break_loop(), Duration::from_millis(20));

    // Without the break this would block on the reader forever.
    reactor.run();

    assert!(reactor.cancel_task(idle));
}

#[test_log::test]
fn test_run_returns_once_watch_is_cancelled() {
    let reactor = Reactor::new().unwrap();
    let pipe = ScopedPipe::new();

    let idle = reactor.watch_file_descriptor(pipe.reader, Direction::Read, true, || {});
    let handle = reactor.handle();
    let cancelled = Rc::new(Cell::new(false));

    let result = cancelled.clone();
    reactor.post_delayed_task(
        move || result.set(handle.cancel_task(idle)),
        Duration::from_millis(20),
    );

    reactor.run();

    assert!(cancelled.get());
    assert!(!reactor.has_tasks());
}

#[test_log::test]
fn test_is_running_inside_callback() {
    let reactor = Reactor::new().unwrap();
    let observed = Rc::new(Cell::new(false));

    let (handle, flag) = (reactor.handle(), observed.clone());
    reactor.post_task(move || flag.set(handle.is_running()));

    assert!(!reactor.is_running());
    reactor.run();

    assert!(observed.get());
    assert!(!reactor.is_running());
}

#[test_log::test]
fn test_run_until_times_out() {
    let reactor = Reactor::new().unwrap();

    let start = Instant::now();
    let met = run_until(&reactor, Duration::from_millis(20), || false);

    assert!(!met);
    assert!(start.elapsed() >= Duration::from_millis(20));
    assert!(!reactor.has_tasks());
}

#[test_log::test]
fn test_run_until_cancels_its_timeout() {
    let reactor = Reactor::new().unwrap();
    let called = Rc::new(Cell::new(false));

    let flag = called.clone();
    reactor.post_task(move || flag.set(true));

    let watched = called.clone();
    assert!(run_until(&reactor, Duration::from_secs(10), move || watched.get()));
    assert!(!reactor.has_tasks());
}

#[test_log::test]
fn test_run_until_times_out_with_ready_watch() {
    let reactor = Reactor::new().unwrap();
    let pipe = ScopedPipe::new();

    let fired = Rc::new(Cell::new(0));
    let count = fired.clone();
    let watch = reactor.watch_file_descriptor(pipe.writer, Direction::Write, true, move || {
        count.set(count.get() + 1)
    });

    let start = Instant::now();
    let met = run_until(&reactor, Duration::from_millis(50), || false);

    assert!(!met);
    assert!(start.elapsed() >= Duration::from_millis(50));
    assert!(start.elapsed() < Duration::from_secs(5));
    assert!(fired.get() > 0);

    assert!(reactor.cancel_task(watch));
    assert!(!reactor.has_tasks());
}

#[test_log::test]
fn test_run_until_gives_up_when_reactor_is_gone() {
    let reactor = Rc::new(RefCell::new(Some(Reactor::new().unwrap())));
    let handle = reactor.borrow().as_ref().unwrap().handle();

    let slot = reactor.clone();
    handle.post_task(move || {
        slot.borrow_mut().take();
    });

    let start = Instant::now();
    let met = run_until(&handle, Duration::from_secs(10), || false);

    assert!(!met);
    assert!(reactor.borrow().is_none());
    assert!(start.elapsed() < Duration::from_secs(5));
}

#[test_log::test]
fn test_builder_configures_event_capacity() {
    let reactor = ReactorBuilder::new().event_capacity(1).build().unwrap();
    let first = ScopedPipe::new();
    let second = ScopedPipe::new();
    first.write(b"x");
    second.write(b"y");

    let count = Rc::new(Cell::new(0));
    for fd in [first.reader, second.reader] {
        let count = count.clone();
        reactor.watch_file_descriptor(fd, Direction::Read, false, move || {
            count.set(count.get() + 1)
        });
    }

    assert_eq!(run_max_iterations(&reactor, 10), 2);
    assert_eq!(count.get(), 2);
}

#[test]
#[should_panic(expected = "event_capacity must be > 0")]
fn test_builder_rejects_zero_capacity() {
    let _ = ReactorBuilder::new().event_capacity(0);
}

#[test]
#[should_panic(expected = "event_capacity must be <= 65536")]
fn test_builder_rejects_oversized_capacity() {
    let _ = ReactorBuilder::new().event_capacity(usize::MAX);
}

#[test_log::test]
fn test_builder_accepts_max_capacity() {
    let reactor = ReactorBuilder::new()
        .event_capacity(MAX_EVENT_CAPACITY)
        .build()
        .unwrap();

    reactor.post_task(|| {});
    assert_eq!(run_max_iterations(&reactor, 10), 1);
}

#[test_log::test]
fn test_handle_outlives_reactor() {
    let reactor = Reactor::new().unwrap();
    let handle = reactor.handle();
    let pending = handle.post_task(|| {});

    assert!(handle.is_alive());
    drop(reactor);

    assert!(!handle.is_alive());
    assert_eq!(handle.post_task(|| {}), NULL_TASK);
    assert!(!handle.cancel_task(pending));
    assert!(!handle.run_once(true));
    handle.run();
}

#[test_log::test]
fn test_reactor_dropped_from_callback() {
    let reactor = Rc::new(RefCell::new(Some(Reactor::new().unwrap())));
    let handle = reactor.borrow().as_ref().unwrap().handle();

    let slot = reactor.clone();
    handle.post_task(move || {
        slot.borrow_mut().take();
    });
    handle.post_task(|| panic!("ran after its reactor was dropped"));

    assert!(handle.run_once(false));
    assert!(reactor.borrow().is_none());
    assert!(!handle.run_once(false));
}
