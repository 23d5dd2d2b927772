//! Cycle counter abstraction

/// Free-running cycle counter
///
/// Counts hardware cycles since the last [`reset`](CycleTimer::reset). The
/// rate is fixed per device and converted to microseconds by the caller, so
/// implementations never scale.
///
/// A counter that would overflow `u32` should saturate rather than wrap: the
/// decoder reads any very long interval as a frame gap.
pub trait CycleTimer {
    /// Restart counting from zero
    fn reset(&mut self);

    /// Cycles since the last reset
    fn elapsed(&self) -> u32;

    /// Read the elapsed count and restart in one step
    fn lap(&mut self) -> u32 {
        let elapsed = self.elapsed();
        self.reset();
        elapsed
    }
}
