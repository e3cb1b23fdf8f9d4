use crate::constants::FALLBACK_INTERVAL_SECS;
use std::time::Duration;

/// Pause between successive sends: the time the source needs to refill `buffer_size` samples.
/// Falls back to `FALLBACK_INTERVAL_SECS` when the rate is not a positive finite number,
/// or when the quotient does not fit in a `Duration`.
pub fn stream_interval(buffer_size: usize, sample_rate: f64) -> Duration {
    let fallback = Duration::from_secs_f64(FALLBACK_INTERVAL_SECS);
    if !(sample_rate.is_finite() && sample_rate > 0.0) {
        return fallback;
    }
    Duration::try_from_secs_f64(buffer_size as f64 / sample_rate).unwrap_or(fallback)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interval_is_buffer_over_rate() {
        assert_eq!(stream_interval(200, 100.0), Duration::from_secs(2));
        assert_eq!(stream_interval(200, 250.0), Duration::from_millis(800));
    }

    #[test]
    fn unknown_rate_falls_back() {
        assert_eq!(stream_interval(200, 0.0), Duration::from_millis(100));
        assert_eq!(stream_interval(200, -5.0), Duration::from_millis(100));
        assert_eq!(stream_interval(200, f64::NAN), Duration::from_millis(100));
        assert_eq!(stream_interval(200, f64::INFINITY), Duration::from_millis(100));
    }

    #[test]
    fn tiny_rate_does_not_overflow() {
        assert_eq!(stream_interval(200, 1e-18), Duration::from_millis(100));
        assert_eq!(stream_interval(1, f64::MIN_POSITIVE), Duration::from_millis(100));
    }
}
