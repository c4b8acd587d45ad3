/// Bounded FIFO of mono samples between an audio callback and a blocking
/// reader.
///
/// The callback side never waits: when the reader falls behind, `write`
/// discards the oldest queued samples and reports how many it threw away.
/// Not synchronized; backends share it as `Arc<parking_lot::Mutex<_>>`.
#[derive(Debug)]
pub struct RingBuffer {
    slots: Vec<i16>,
    head: usize,
    len: usize,
}

impl RingBuffer {
    /// A ring holding at most `capacity` samples (at least one).
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: vec![0; capacity.max(1)],
            head: 0,
            len: 0,
        }
    }

    /// Queue `samples`, returning how many queued or incoming samples were
    /// discarded to make room.
    pub fn write(&mut self, samples: &[i16]) -> usize {
        let capacity = self.capacity();
        let skipped = samples.len().saturating_sub(capacity);
        let incoming = &samples[skipped..];

        let evicted = (self.len + incoming.len()).saturating_sub(capacity);
        self.head = (self.head + evicted) % capacity;
        self.len -= evicted;

        let tail = (self.head + self.len) % capacity;
        let first = incoming.len().min(capacity - tail);
        self.slots[tail..tail + first].copy_from_slice(&incoming[..first]);
        self.slots[..incoming.len() - first].copy_from_slice(&incoming[first..]);
        self.len += incoming.len();

        skipped + evicted
    }

    /// Dequeue up to `dest.len()` samples into the front of `dest`.
    pub fn read_into(&mut self, dest: &mut [i16]) -> usize {
        let capacity = self.capacity();
        let count = dest.len().min(self.len);

        let first = count.min(capacity - self.head);
        dest[..first].copy_from_slice(&self.slots[self.head..self.head + first]);
        dest[first..count].copy_from_slice(&self.slots[..count - first]);

        self.head = (self.head + count) % capacity;
        self.len -= count;
        count
    }

    /// Samples queued for reading.
    pub fn count(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Drop everything queued.
    pub fn reset(&mut self) {
        self.head = 0;
        self.len = 0;
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain(ring: &mut RingBuffer, count: usize) -> Vec<i16> {
        let mut out = vec![0; count];
        let n = ring.read_into(&mut out);
        out.truncate(n);
        out
    }

    #[test]
    fn callback_periods_come_out_in_order() {
        let mut ring = RingBuffer::new(2048);
        let mut expected = Vec::new();
        let mut received = Vec::new();

        // Producer writes 96-sample periods, consumer reads 64-sample chunks.
        for period_index in 0..40i16 {
            let period: Vec<i16> = (0..96).map(|i| period_index * 100 + i).collect();
            expected.extend_from_slice(&period);
            assert_eq!(ring.write(&period), 0);
            received.extend(drain(&mut ring, 64));
        }
        let backlog = ring.count();
        received.extend(drain(&mut ring, backlog));

        assert_eq!(received, expected);
        assert!(ring.is_empty());
    }

    #[test]
    fn stalled_reader_loses_oldest_with_exact_counts() {
        let mut ring = RingBuffer::new(256);
        let mut dropped = 0;
        for period in 0..10i16 {
            dropped += ring.write(&[period; 100]);
        }

        assert_eq!(dropped, 1000 - 256);
        assert_eq!(ring.count(), 256);
        let kept = drain(&mut ring, 256);
        assert_eq!(&kept[..56], &[7; 56]);
        assert_eq!(&kept[56..156], &[8; 100]);
        assert_eq!(&kept[156..], &[9; 100]);
    }

    #[test]
    fn oversized_period_keeps_its_tail_and_evicts_queue() {
        let mut ring = RingBuffer::new(4);
        ring.write(&[-1, -2]);

        let batch: Vec<i16> = (1..=6).collect();
        assert_eq!(ring.write(&batch), 2 + 2);
        assert_eq!(drain(&mut ring, 8), vec![3, 4, 5, 6]);
    }

    #[test]
    fn read_into_spans_the_wrap_point() {
        let mut ring = RingBuffer::new(5);
        ring.write(&[0, 0, 0, 0]);
        drain(&mut ring, 4);

        // Head sits at slot 4; this write wraps to slots 0..3.
        ring.write(&[10, 11, 12, 13]);
        let mut dest = [0i16; 6];
        assert_eq!(ring.read_into(&mut dest), 4);
        assert_eq!(dest, [10, 11, 12, 13, 0, 0]);
    }

    #[test]
    fn eviction_across_the_wrap_point() {
        let mut ring = RingBuffer::new(5);
        ring.write(&[1, 2, 3]);
        drain(&mut ring, 2);
        ring.write(&[4, 5, 6, 7]);

        assert_eq!(ring.write(&[8, 9]), 2);
        assert_eq!(drain(&mut ring, 5), vec![5, 6, 7, 8, 9]);
    }

    #[test]
    fn short_dest_leaves_remainder_queued() {
        let mut ring = RingBuffer::new(8);
        ring.write(&[1, 2, 3, 4, 5]);

        let mut dest = [0i16; 2];
        assert_eq!(ring.read_into(&mut dest), 2);
        assert_eq!(ring.count(), 3);
        assert_eq!(ring.read_into(&mut [0i16; 0]), 0);
        assert_eq!(drain(&mut ring, 3), vec![3, 4, 5]);
    }

    #[test]
    fn reset_after_overflow_starts_clean() {
        let mut ring = RingBuffer::new(3);
        ring.write(&[1, 2, 3, 4, 5]);
        ring.reset();

        assert!(ring.is_empty());
        assert_eq!(ring.write(&[6]), 0);
        assert_eq!(drain(&mut ring, 3), vec![6]);
    }

    #[test]
    fn zero_capacity_holds_one_sample() {
        let mut ring = RingBuffer::new(0);
        assert_eq!(ring.capacity(), 1);
        assert_eq!(ring.write(&[]), 0);
        assert_eq!(ring.write(&[1, 2]), 1);
        assert_eq!(drain(&mut ring, 2), vec![2]);
    }
}
