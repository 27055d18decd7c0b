//! Uniform replay buffer.
//!
//! Fixed-capacity ring storage with uniform random sampling: insertion
//! overwrites the oldest transition once full, and every stored transition
//! has equal probability of being drawn. Pushes go through a lock-free
//! queue that is consolidated into the ring lazily, so the interaction loop
//! never blocks on the sampler.

use crossbeam_queue::SegQueue;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::core::transition::Transition;

/// Replay buffer sizing and sampling parameters.
#[derive(Debug, Clone)]
pub struct ReplayBufferConfig {
    /// Maximum number of transitions to store.
    pub capacity: usize,
    /// Minimum transitions before training starts.
    pub min_size: usize,
    /// Minibatch size for sampling.
    pub batch_size: usize,
}

impl Default for ReplayBufferConfig {
    fn default() -> Self {
        Self {
            capacity: 100_000,
            min_size: 1_000,
            batch_size: 256,
        }
    }
}

impl ReplayBufferConfig {
    pub fn new(capacity: usize, min_size: usize, batch_size: usize) -> Self {
        Self {
            capacity,
            min_size,
            batch_size,
        }
    }
}

/// Ring storage with O(1) insert and random access.
struct RingBuffer {
    buffer: Vec<Transition>,
    capacity: usize,
    write_pos: usize,
    len: usize,
}

impl RingBuffer {
    fn new(capacity: usize) -> Self {
        Self {
            buffer: Vec::with_capacity(capacity),
            capacity,
            write_pos: 0,
            len: 0,
        }
    }

    fn push(&mut self, item: Transition) {
        if self.buffer.len() < self.capacity {
            self.buffer.push(item);
            self.len = self.buffer.len();
        } else {
            self.buffer[self.write_pos] = item;
        }
        self.write_pos = (self.write_pos + 1) % self.capacity;
        self.len = self.len.min(self.capacity);
    }

    #[inline]
    fn get(&self, idx: usize) -> &Transition {
        debug_assert!(idx < self.len, "index {} past fill count {}", idx, self.len);
        &self.buffer[idx]
    }

    #[inline]
    fn len(&self) -> usize {
        self.len
    }

    fn clear(&mut self) {
        self.buffer.clear();
        self.write_pos = 0;
        self.len = 0;
    }
}

/// Thread-safe uniform replay buffer.
///
/// Sampling only ever indexes into the consolidated fill count, so a batch
/// can never contain slots that have not been written yet.
pub struct ReplayBuffer {
    config: ReplayBufferConfig,
    pending: SegQueue<Transition>,
    storage: RwLock<RingBuffer>,
    size: AtomicUsize,
    pending_size: AtomicUsize,
}

impl ReplayBuffer {
    pub fn new(config: ReplayBufferConfig) -> Self {
        Self {
            pending: SegQueue::new(),
            storage: RwLock::new(RingBuffer::new(config.capacity)),
            size: AtomicUsize::new(0),
            pending_size: AtomicUsize::new(0),
            config,
        }
    }

    /// Push a single transition (lock-free).
    pub fn push(&self, transition: Transition) {
        self.pending.push(transition);
        self.pending_size.fetch_add(1, Ordering::Release);
    }

    /// Uniform random sample with replacement.
    ///
    /// Returns `None` while fewer than `batch_size` transitions are stored.
    pub fn sample(&self, batch_size: usize) -> Option<Vec<Transition>> {
        self.consolidate();

        let storage = self.storage.read();
        if storage.len() < batch_size {
            return None;
        }

        let mut samples = Vec::with_capacity(batch_size);
        for _ in 0..batch_size {
            let idx = fastrand::usize(..storage.len());
            samples.push(storage.get(idx).clone());
        }
        Some(samples)
    }

    /// Sample distinct transitions via partial Fisher-Yates.
    pub fn sample_without_replacement(&self, batch_size: usize) -> Option<Vec<Transition>> {
        self.consolidate();

        let storage = self.storage.read();
        if storage.len() < batch_size {
            return None;
        }

        let mut indices: Vec<usize> = (0..storage.len()).collect();
        for i in 0..batch_size {
            let j = fastrand::usize(i..indices.len());
            indices.swap(i, j);
        }

        Some(
            indices[..batch_size]
                .iter()
                .map(|&idx| storage.get(idx).clone())
                .collect(),
        )
    }

    /// Sample using the configured batch size.
    pub fn sample_batch(&self) -> Option<Vec<Transition>> {
        self.sample(self.config.batch_size)
    }

    /// Enough transitions collected to start gradient updates.
    pub fn is_training_ready(&self) -> bool {
        self.consolidate();
        self.size.load(Ordering::Acquire) >= self.config.min_size
    }

    /// Move pending transitions into the ring.
    pub fn consolidate(&self) {
        let mut storage = self.storage.write();
        let mut count = 0;

        while let Some(trans) = self.pending.pop() {
            storage.push(trans);
            count += 1;
        }

        if count > 0 {
            let pending = self.pending_size.load(Ordering::Acquire);
            self.pending_size.fetch_sub(count.min(pending), Ordering::Release);
            self.size.store(storage.len(), Ordering::Release);
        }
    }

    /// Consolidated fill count.
    pub fn len(&self) -> usize {
        self.size.load(Ordering::Relaxed)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn pending_len(&self) -> usize {
        self.pending_size.load(Ordering::Relaxed)
    }

    pub fn capacity(&self) -> usize {
        self.config.capacity
    }

    /// Fill fraction in [0, 1].
    pub fn utilization(&self) -> f32 {
        self.size.load(Ordering::Relaxed) as f32 / self.config.capacity as f32
    }

    pub fn clear(&self) {
        while self.pending.pop().is_some() {}
        self.pending_size.store(0, Ordering::Release);

        let mut storage = self.storage.write();
        storage.clear();
        self.size.store(0, Ordering::Release);
    }

    pub fn config(&self) -> &ReplayBufferConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_transition(state_val: f32) -> Transition {
        Transition::new(
            vec![state_val],
            vec![0.5, -0.5],
            1.0,
            vec![state_val + 1.0],
            false,
            false,
        )
    }

    #[test]
    fn test_ring_buffer_push_and_get() {
        let mut rb = RingBuffer::new(3);
        rb.push(make_transition(1.0));
        rb.push(make_transition(2.0));
        assert_eq!(rb.len(), 2);
        assert_eq!(rb.get(0).state[0], 1.0);
        assert_eq!(rb.get(1).state[0], 2.0);
    }

    #[test]
    fn test_ring_buffer_overwrites_oldest() {
        let mut rb = RingBuffer::new(3);
        for i in 0..4 {
            rb.push(make_transition(i as f32));
        }
        assert_eq!(rb.len(), 3);
        // Slot 0 was overwritten by the 4th push.
        assert_eq!(rb.get(0).state[0], 3.0);
        assert_eq!(rb.get(1).state[0], 1.0);
        assert_eq!(rb.get(2).state[0], 2.0);
    }

    #[test]
    fn test_push_and_consolidate() {
        let buffer = ReplayBuffer::new(ReplayBufferConfig::new(100, 5, 3));

        for i in 0..10 {
            buffer.push(make_transition(i as f32));
        }
        assert_eq!(buffer.len(), 0);
        assert_eq!(buffer.pending_len(), 10);

        buffer.consolidate();
        assert_eq!(buffer.len(), 10);
        assert_eq!(buffer.pending_len(), 0);
    }

    #[test]
    fn test_sample_respects_fill_count() {
        let buffer = ReplayBuffer::new(ReplayBufferConfig::new(100, 5, 3));

        for i in 0..10 {
            buffer.push(make_transition(i as f32));
        }

        // Every sampled state must be one of the 10 written values.
        for _ in 0..20 {
            let batch = buffer.sample(3).unwrap();
            for t in batch {
                assert!(t.state[0] >= 0.0 && t.state[0] < 10.0);
            }
        }
    }

    #[test]
    fn test_sample_insufficient_returns_none() {
        let buffer = ReplayBuffer::new(ReplayBufferConfig::new(100, 5, 10));
        for i in 0..5 {
            buffer.push(make_transition(i as f32));
        }
        assert!(buffer.sample(10).is_none());
    }

    #[test]
    fn test_training_ready_gate() {
        let buffer = ReplayBuffer::new(ReplayBufferConfig::new(100, 10, 5));

        for i in 0..5 {
            buffer.push(make_transition(i as f32));
        }
        assert!(!buffer.is_training_ready());

        for i in 5..10 {
            buffer.push(make_transition(i as f32));
        }
        assert!(buffer.is_training_ready());
    }

    #[test]
    fn test_capacity_enforced() {
        let buffer = ReplayBuffer::new(ReplayBufferConfig::new(5, 2, 2));
        for i in 0..10 {
            buffer.push(make_transition(i as f32));
        }
        buffer.consolidate();
        assert_eq!(buffer.len(), 5);

        // Only the newest five survive.
        let batch = buffer.sample(5).unwrap();
        for t in batch {
            assert!(t.state[0] >= 5.0);
        }
    }

    #[test]
    fn test_utilization() {
        let buffer = ReplayBuffer::new(ReplayBufferConfig::new(100, 5, 3));
        for i in 0..50 {
            buffer.push(make_transition(i as f32));
        }
        buffer.consolidate();
        assert!((buffer.utilization() - 0.5).abs() < 0.01);
    }

    #[test]
    fn test_sample_without_replacement_unique() {
        let buffer = ReplayBuffer::new(ReplayBufferConfig::new(100, 5, 5));
        for i in 0..10 {
            buffer.push(make_transition(i as f32));
        }

        let batch = buffer.sample_without_replacement(5).unwrap();
        assert_eq!(batch.len(), 5);

        let mut states: Vec<f32> = batch.iter().map(|t| t.state[0]).collect();
        states.sort_by(|a, b| a.partial_cmp(b).unwrap());
        for i in 1..states.len() {
            assert!(states[i] != states[i - 1]);
        }
    }

    #[test]
    fn test_clear() {
        let buffer = ReplayBuffer::new(ReplayBufferConfig::new(100, 5, 3));
        for i in 0..10 {
            buffer.push(make_transition(i as f32));
        }
        buffer.consolidate();
        assert_eq!(buffer.len(), 10);

        buffer.clear();
        assert_eq!(buffer.len(), 0);
        assert_eq!(buffer.pending_len(), 0);
        assert!(!buffer.is_training_ready());
    }
}
