//! Driven port: wall clock.

/// Time source abstraction (for testability)
pub trait TimeSource: Send + Sync {
    /// Current unix time in fractional seconds
    fn now(&self) -> f64;
}

/// Default time source using system time
pub struct SystemTimeSource;

impl TimeSource for SystemTimeSource {
    fn now(&self) -> f64 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs_f64()
    }
}
