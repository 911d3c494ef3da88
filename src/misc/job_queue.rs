//! Priority queue shared between pricing workers.
//!
//! All jobs of a round are pushed before the workers start, so `get_job`
//! never has to wait: an empty queue means the round is done.

use binary_heap_plus::BinaryHeap;
use compare::Compare;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

/// Thread-safe priority queue, ordered by the comparator `C`
pub struct JobQueue<T, C>
where
    C: Compare<T>,
{
    queue: Mutex<BinaryHeap<T, C>>,
    flushing: AtomicBool,
    completed: AtomicUsize,
}

impl<T, C: Compare<T>> JobQueue<T, C> {
    /// Create empty queue
    pub fn new(compare: C) -> Self {
        Self {
            queue: Mutex::new(BinaryHeap::from_vec_cmp(Vec::new(), compare)),
            flushing: AtomicBool::new(false),
            completed: AtomicUsize::new(0),
        }
    }

    /// push job, ignored once the queue is flushing
    pub fn add_job(&self, job: T) {
        if self.flushing.load(Ordering::SeqCst) {
            return;
        }
        let mut lq = self.queue.lock().unwrap_or_else(PoisonError::into_inner);
        lq.push(job);
    }

    /// pop the job with the highest priority
    pub fn get_job(&self) -> Option<T> {
        if self.flushing.load(Ordering::SeqCst) {
            return None;
        }
        let mut lq = self.queue.lock().unwrap_or_else(PoisonError::into_inner);
        lq.pop()
    }

    pub fn job_done(&self) {
        self.completed.fetch_add(1, Ordering::SeqCst);
    }

    /// Drop all remaining jobs, workers stop at their next `get_job`
    pub fn flush_and_terminate(&self) {
        self.flushing.store(true, Ordering::SeqCst);
        self.queue
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    pub fn is_flushing(&self) -> bool {
        self.flushing.load(Ordering::SeqCst)
    }

    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }

    /// return number of elements in queue
    pub fn len(&self) -> usize {
        self.queue
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
