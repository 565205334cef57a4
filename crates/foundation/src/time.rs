/// Monotonic timestamp in milliseconds.
#[derive(Copy, Clone, Debug, Default, PartialEq, PartialOrd)]
pub struct Time(pub f64);

impl Time {
    pub const ZERO: Time = Time(0.0);

    pub fn after_ms(self, delay_ms: u32) -> Time {
        Time(self.0 + f64::from(delay_ms))
    }

    /// Milliseconds from `self` until `later`, saturating at zero.
    pub fn until(self, later: Time) -> f64 {
        (later.0 - self.0).max(0.0)
    }
}
