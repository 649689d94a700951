//! Helpers for driving a reactor.
//!
//! Mostly useful in tests and in small programs that want to step a loop
//! by hand rather than hand control to [`run`](crate::ReactorHandle::run):
//! - [`run_max_iterations`] runs whatever is ready without blocking,
//! - [`run_until`] blocks until a condition holds or a timeout passes.

mod drive;

#[doc(inline)]
pub use drive::{run_max_iterations, run_until};
