use std::time::Duration;

/// Dummy timer when `timing` is disabled (zero-sized).
pub(crate) struct Timer;

impl Timer {
    #[inline(always)]
    pub fn start() -> Self {
        Self
    }

    #[inline(always)]
    pub fn elapsed(&self) -> Duration {
        Duration::ZERO
    }
}

/// Dummy timings when `timing` is disabled (zero-sized).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SearchTimings;

impl SearchTimings {
    #[inline(always)]
    pub fn add_validate(&mut self, _d: Duration) {}
    #[inline(always)]
    pub fn add_serialize(&mut self, _d: Duration) {}
    #[inline(always)]
    pub fn add_query(&mut self, _d: Duration) {}

    #[inline(always)]
    pub fn merge(&mut self, _other: &SearchTimings) {}

    #[inline(always)]
    pub fn total(&self) -> Duration {
        Duration::ZERO
    }

    #[inline(always)]
    pub fn report(&self, _num_queries: usize) {}
}
