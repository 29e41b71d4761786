/// Regroups native capture packets into fixed-size periods.
///
/// Platform audio APIs hand over whatever packet size they like. The
/// delivery contract is exactly `buffer_size × channel_count` samples per
/// callback, so backends feed every native packet through a `PeriodBuffer`
/// and forward only whole periods. Leftover samples wait for the next packet.
///
/// Samples are never dropped or reordered. Whole periods inside a packet are
/// emitted straight from the packet slice without copying.
#[derive(Debug)]
pub struct PeriodBuffer {
    pending: Vec<f32>,
    period_len: usize,
}

impl PeriodBuffer {
    /// `period_len` is in samples (frames × channels). Zero is treated as one.
    pub fn new(period_len: usize) -> Self {
        let period_len = period_len.max(1);
        Self {
            pending: Vec::with_capacity(period_len),
            period_len,
        }
    }

    /// Push a native packet, calling `emit` once per completed period.
    ///
    /// Returns the number of periods emitted.
    pub fn push<F>(&mut self, samples: &[f32], mut emit: F) -> usize
    where
        F: FnMut(&[f32]),
    {
        let mut emitted = 0;
        let mut rest = samples;

        // Top up a partially filled period first
        if !self.pending.is_empty() {
            let needed = self.period_len - self.pending.len();
            let take = needed.min(rest.len());
            self.pending.extend_from_slice(&rest[..take]);
            rest = &rest[take..];

            if self.pending.len() < self.period_len {
                return 0;
            }
            emit(&self.pending);
            self.pending.clear();
            emitted += 1;
        }

        let mut periods = rest.chunks_exact(self.period_len);
        for period in periods.by_ref() {
            emit(period);
            emitted += 1;
        }
        self.pending.extend_from_slice(periods.remainder());

        emitted
    }

    /// Samples waiting for the next packet.
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Drop any partial period.
    pub fn reset(&mut self) {
        self.pending.clear();
    }

    pub fn period_len(&self) -> usize {
        self.period_len
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect(buf: &mut PeriodBuffer, samples: &[f32]) -> Vec<Vec<f32>> {
        let mut out = Vec::new();
        buf.push(samples, |p| out.push(p.to_vec()));
        out
    }

    #[test]
    fn exact_period_passes_through() {
        let mut buf = PeriodBuffer::new(4);
        let out = collect(&mut buf, &[1.0, 2.0, 3.0, 4.0]);

        assert_eq!(out, vec![vec![1.0, 2.0, 3.0, 4.0]]);
        assert!(buf.is_empty());
    }

    #[test]
    fn short_packets_accumulate() {
        let mut buf = PeriodBuffer::new(4);

        assert!(collect(&mut buf, &[1.0, 2.0]).is_empty());
        assert_eq!(buf.pending(), 2);
        assert!(collect(&mut buf, &[3.0]).is_empty());

        let out = collect(&mut buf, &[4.0, 5.0]);
        assert_eq!(out, vec![vec![1.0, 2.0, 3.0, 4.0]]);
        assert_eq!(buf.pending(), 1);
    }

    #[test]
    fn long_packet_splits_into_periods() {
        let mut buf = PeriodBuffer::new(3);
        let samples: Vec<f32> = (0..10).map(|i| i as f32).collect();

        let out = collect(&mut buf, &samples);

        assert_eq!(out.len(), 3);
        assert_eq!(out[0], vec![0.0, 1.0, 2.0]);
        assert_eq!(out[2], vec![6.0, 7.0, 8.0]);
        assert_eq!(buf.pending(), 1);
    }

    #[test]
    fn order_is_preserved_across_packets() {
        let mut buf = PeriodBuffer::new(5);
        let mut seen = Vec::new();

        for chunk in (0..23).map(|i| i as f32).collect::<Vec<_>>().chunks(3) {
            buf.push(chunk, |p| {
                assert_eq!(p.len(), 5);
                seen.extend_from_slice(p);
            });
        }

        let expected: Vec<f32> = (0..20).map(|i| i as f32).collect();
        assert_eq!(seen, expected);
        assert_eq!(buf.pending(), 3);
    }

    #[test]
    fn returns_emitted_count() {
        let mut buf = PeriodBuffer::new(2);
        assert_eq!(buf.push(&[0.0; 7], |_| {}), 3);
        assert_eq!(buf.push(&[0.0; 1], |_| {}), 1);
    }

    #[test]
    fn reset_discards_partial_period() {
        let mut buf = PeriodBuffer::new(4);
        collect(&mut buf, &[1.0, 2.0]);
        buf.reset();

        assert!(buf.is_empty());
        assert!(collect(&mut buf, &[3.0, 4.0]).is_empty());
    }

    #[test]
    fn zero_period_is_clamped() {
        let buf = PeriodBuffer::new(0);
        assert_eq!(buf.period_len(), 1);
    }
}
