use crate::error::Result;
use crate::reactor::Reactor;

/// Default number of readiness events collected per wait.
const DEFAULT_EVENT_CAPACITY: usize = 64;

/// Largest event capacity accepted; the OS wait takes the count as a C `int`.
pub const MAX_EVENT_CAPACITY: usize = 1 << 16;

/// Builder for configuring and creating a reactor.
///
/// # Examples
///
/// ```rust,no_run
/// let reactor = vigil::ReactorBuilder::new()
///     .event_capacity(256)
///     .build()
///     .unwrap();
/// ```
pub struct ReactorBuilder {
    /// Number of readiness events the OS may report per wait.
    event_capacity: usize,
}

impl ReactorBuilder {
    /// Creates a new `ReactorBuilder` with default configuration.
    pub fn new() -> Self {
        Self {
            event_capacity: DEFAULT_EVENT_CAPACITY,
        }
    }

    /// Sets how many readiness events a single wait may collect.
    ///
    /// Descriptors beyond this count that are ready at the same time are
    /// reported by later waits.
    ///
    /// # Panics
    ///
    /// Panics if `n == 0` or `n` exceeds [`MAX_EVENT_CAPACITY`].
    pub fn event_capacity(mut self, n: usize) -> Self {
        assert!(n > 0, "event_capacity must be > 0");
        assert!(
            n <= MAX_EVENT_CAPACITY,
            "event_capacity must be <= {MAX_EVENT_CAPACITY}"
        );

        self.event_capacity = n;
        self
    }

    /// Builds the reactor, creating the OS poller.
    pub fn build(self) -> Result<Reactor> {
        Reactor::with_event_capacity(self.event_capacity)
    }
}

impl Default for ReactorBuilder {
    fn default() -> Self {
        Self::new()
    }
}
