//! Fixed-capacity reservoir sampler (Algorithm R) used to approximate
//! percentiles over an unbounded stream.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

pub const DEFAULT_CAPACITY: usize = 50_000;

pub struct ReservoirSampler {
    capacity: usize,
    buffer: Vec<f64>,
    count: u64,
    rng: StdRng,
}

impl ReservoirSampler {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            buffer: Vec::with_capacity(capacity.min(1024)),
            count: 0,
            rng: StdRng::from_entropy(),
        }
    }

    /// Deterministic sampler for tests — the source's reservoir was
    /// unseeded, which makes golden-output tests flaky; this fixes that.
    pub fn with_seed(capacity: usize, seed: u64) -> Self {
        Self {
            capacity,
            buffer: Vec::with_capacity(capacity.min(1024)),
            count: 0,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn update(&mut self, x: f64) {
        self.count += 1;
        if self.buffer.len() < self.capacity {
            self.buffer.push(x);
        } else {
            let i = self.rng.gen_range(0..self.count);
            if i < self.capacity as u64 {
                self.buffer[i as usize] = x;
            }
        }
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// p-th percentile (0..100) of the sample via linear interpolation.
    /// `None` when the sample is empty.
    pub fn percentile(&self, p: f64) -> Option<f64> {
        if self.buffer.is_empty() {
            return None;
        }
        let mut sorted = self.buffer.clone();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap());

        if sorted.len() == 1 {
            return Some(sorted[0]);
        }

        let rank = (p / 100.0) * (sorted.len() - 1) as f64;
        let lo = rank.floor() as usize;
        let hi = rank.ceil() as usize;
        if lo == hi {
            return Some(sorted[lo]);
        }
        let frac = rank - lo as f64;
        Some(sorted[lo] + frac * (sorted[hi] - sorted[lo]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_sampler_percentile_is_none() {
        let s = ReservoirSampler::with_seed(10, 1);
        assert_eq!(s.percentile(50.0), None);
    }

    #[test]
    fn percentile_monotone_on_non_empty_sample() {
        let mut s = ReservoirSampler::with_seed(DEFAULT_CAPACITY, 7);
        for x in [5.0, 1.0, 9.0, 3.0, 7.0, 2.0, 8.0, 4.0, 6.0, 10.0] {
            s.update(x);
        }
        let p50 = s.percentile(50.0).unwrap();
        let p90 = s.percentile(90.0).unwrap();
        let p95 = s.percentile(95.0).unwrap();
        let p99 = s.percentile(99.0).unwrap();
        let max = s.percentile(100.0).unwrap();
        let min = s.percentile(0.0).unwrap();
        assert!(min <= p50);
        assert!(p50 <= p90);
        assert!(p90 <= p95);
        assert!(p95 <= p99);
        assert!(p99 <= max);
    }

    #[test]
    fn under_capacity_keeps_every_sample() {
        let mut s = ReservoirSampler::with_seed(100, 42);
        for i in 0..50 {
            s.update(i as f64);
        }
        assert_eq!(s.len(), 50);
    }

    #[test]
    fn over_capacity_caps_buffer_size() {
        let mut s = ReservoirSampler::with_seed(10, 42);
        for i in 0..1000 {
            s.update(i as f64);
        }
        assert_eq!(s.len(), 10);
    }

    #[test]
    fn same_seed_is_deterministic() {
        let data: Vec<f64> = (0..500).map(|i| i as f64).collect();
        let mut a = ReservoirSampler::with_seed(50, 99);
        let mut b = ReservoirSampler::with_seed(50, 99);
        for &x in &data {
            a.update(x);
            b.update(x);
        }
        assert_eq!(a.percentile(50.0), b.percentile(50.0));
    }
}
