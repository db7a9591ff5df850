use std::time::{Duration, Instant};

/// Timer that tracks elapsed time when timing is enabled.
pub(crate) struct Timer(Instant);

impl Timer {
    #[inline]
    pub fn start() -> Self {
        Self(Instant::now())
    }

    #[inline]
    pub fn elapsed(&self) -> Duration {
        self.0.elapsed()
    }
}

/// Wall time per search phase.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SearchTimings {
    /// Parameter checks and the NaN/Inf scan of both point sets.
    pub validate: Duration,
    /// Key computation and sorting, summed over curves.
    pub serialize: Duration,
    /// Windowing, ranking and output assembly for all queries.
    pub query: Duration,
}

impl SearchTimings {
    #[inline]
    pub fn add_validate(&mut self, d: Duration) {
        self.validate += d;
    }

    #[inline]
    pub fn add_serialize(&mut self, d: Duration) {
        self.serialize += d;
    }

    #[inline]
    pub fn add_query(&mut self, d: Duration) {
        self.query += d;
    }

    /// Accumulate another set of timings into this one.
    #[inline]
    pub fn merge(&mut self, other: &SearchTimings) {
        self.validate += other.validate;
        self.serialize += other.serialize;
        self.query += other.query;
    }

    #[inline]
    pub fn total(&self) -> Duration {
        self.validate + self.serialize + self.query
    }

    /// Log the breakdown at debug level.
    pub fn report(&self, num_queries: usize) {
        let ms = |d: Duration| d.as_secs_f64() * 1000.0;
        tracing::debug!(
            num_queries,
            validate_ms = ms(self.validate),
            serialize_ms = ms(self.serialize),
            query_ms = ms(self.query),
            total_ms = ms(self.total()),
            "serial neighbor timings"
        );
    }
}
