//! Time source for echo timing

/// Monotonic microsecond clock with a short blocking delay
///
/// The sensor busy-polls the echo line, so it needs a time base finer than the
/// executor's timers and a delay that does not yield.
pub trait Clock {
    /// Microseconds since an arbitrary fixed point
    fn now_micros(&self) -> u64;

    /// Block the caller for `us` microseconds
    fn delay_us(&mut self, us: u32);
}
