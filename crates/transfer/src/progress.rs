use std::sync::Mutex;
use std::time::{Duration, Instant};

struct SpeedSample {
    bytes: u64,
    timestamp: Instant,
}

/// Calculates transfer speed using a sliding window of samples.
pub struct SpeedCalculator {
    inner: Mutex<SpeedInner>,
}

struct SpeedInner {
    samples: Vec<SpeedSample>,
    max_samples: usize,
    window_size: Duration,
    total_bytes: u64,
    started_at: Option<Instant>,
}

impl Default for SpeedCalculator {
    fn default() -> Self {
        Self::new(None, None)
    }
}

impl SpeedCalculator {
    /// Creates a new calculator.
    ///
    /// - `window_size`: time window for speed calculation (default 10 s).
    /// - `max_samples`: maximum retained samples (default 100).
    pub fn new(window_size: Option<Duration>, max_samples: Option<usize>) -> Self {
        Self {
            inner: Mutex::new(SpeedInner {
                samples: Vec::new(),
                max_samples: max_samples.unwrap_or(100),
                window_size: window_size.unwrap_or(Duration::from_secs(10)),
                total_bytes: 0,
                started_at: None,
            }),
        }
    }

    /// Marks the start of the transfer. Used by [`average`](Self::average).
    pub fn start(&self) {
        let mut s = self.inner.lock().unwrap();
        let now = Instant::now();
        s.started_at = Some(now);
        s.samples.push(SpeedSample {
            bytes: 0,
            timestamp: now,
        });
    }

    /// Records a sample of `bytes` transferred at the current instant.
    pub fn add_sample(&self, bytes: u64) {
        let mut s = self.inner.lock().unwrap();
        let now = Instant::now();
        s.total_bytes += bytes;
        s.started_at.get_or_insert(now);
        s.samples.push(SpeedSample {
            bytes,
            timestamp: now,
        });

        // Prune samples outside the window.
        let cutoff = now.checked_sub(s.window_size).unwrap_or(now);
        s.samples.retain(|sample| sample.timestamp >= cutoff);

        if s.samples.len() > s.max_samples {
            let excess = s.samples.len() - s.max_samples;
            s.samples.drain(..excess);
        }
    }

    /// Returns the speed in bytes/second within the window.
    ///
    /// Returns 0.0 if fewer than 2 samples. The first sample only marks
    /// the window start, its bytes are not counted.
    pub fn bytes_per_second(&self) -> f64 {
        let s = self.inner.lock().unwrap();
        if s.samples.len() < 2 {
            return 0.0;
        }

        let first = &s.samples[0];
        let last = &s.samples[s.samples.len() - 1];
        let elapsed = last.timestamp.duration_since(first.timestamp);
        if elapsed.is_zero() {
            return 0.0;
        }

        let bytes: u64 = s.samples[1..].iter().map(|sample| sample.bytes).sum();
        bytes as f64 / elapsed.as_secs_f64()
    }

    /// Average speed since [`start`](Self::start) (or the first sample).
    pub fn average(&self) -> f64 {
        let s = self.inner.lock().unwrap();
        let Some(started) = s.started_at else {
            return 0.0;
        };
        let elapsed = started.elapsed();
        if elapsed.is_zero() {
            return 0.0;
        }
        s.total_bytes as f64 / elapsed.as_secs_f64()
    }

    /// Total bytes recorded.
    pub fn total_bytes(&self) -> u64 {
        self.inner.lock().unwrap().total_bytes
    }
}
