#![forbid(unsafe_code)]

//! Animation-frame scheduler with per-owner coalescing.
//!
//! Each owner has at most one pending callback. Scheduling again before the
//! next frame boundary replaces (cancels) the earlier callback, so only the
//! most recent request runs. [`FrameScheduler::run_frame`] is the frame
//! boundary: it runs every callback queued before it was called, in the
//! order they were scheduled.
//!
//! # Invariants
//!
//! 1. At most one pending callback per owner.
//! 2. A callback runs exactly once, unless canceled or replaced first.
//! 3. Callbacks scheduled while a frame is running wait for the next frame.
//! 4. Canceling an owner whose callback was taken for the running frame but
//!    has not run yet still prevents it from running.
//!
//! # Failure Modes
//!
//! - `cancel()` with nothing pending is a no-op returning `false`.
//! - `run_frame()` with nothing pending only advances the frame counter.

use std::cell::RefCell;
use std::fmt;
use std::hash::Hash;
use std::rc::Rc;

use ahash::AHashMap;
use web_time::Instant;

/// Identifies one scheduled callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FrameHandle(u64);

impl FrameHandle {
    #[inline]
    pub const fn id(self) -> u64 {
        self.0
    }
}

struct Pending {
    handle: FrameHandle,
    callback: Box<dyn FnOnce()>,
}

struct SchedulerInner<K> {
    pending: AHashMap<K, Pending>,
    /// Callbacks taken for the running frame that have not run yet.
    in_flight: AHashMap<K, FrameHandle>,
    next_handle: u64,
    frames: u64,
    last_frame_at: Option<Instant>,
}

/// Shared, owner-keyed frame scheduler.
pub struct FrameScheduler<K> {
    inner: Rc<RefCell<SchedulerInner<K>>>,
}

impl<K> Clone for FrameScheduler<K> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<K: Copy + Eq + Hash + fmt::Debug + 'static> Default for FrameScheduler<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: fmt::Debug> fmt::Debug for FrameScheduler<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("FrameScheduler")
            .field("pending", &inner.pending.len())
            .field("frames", &inner.frames)
            .finish()
    }
}

impl<K: Copy + Eq + Hash + fmt::Debug + 'static> FrameScheduler<K> {
    /// Create a scheduler with nothing pending.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RefCell::new(SchedulerInner {
                pending: AHashMap::new(),
                in_flight: AHashMap::new(),
                next_handle: 1,
                frames: 0,
                last_frame_at: None,
            })),
        }
    }

    /// Run `callback` at the next frame boundary, replacing any callback
    /// `owner` already has pending.
    pub fn schedule_once(&self, owner: K, callback: impl FnOnce() + 'static) -> FrameHandle {
        let mut inner = self.inner.borrow_mut();
        let handle = FrameHandle(inner.next_handle);
        inner.next_handle += 1;
        let replaced_pending = inner
            .pending
            .insert(
                owner,
                Pending {
                    handle,
                    callback: Box::new(callback),
                },
            )
            .map(|p| p.handle);
        let replaced_in_flight = inner.in_flight.remove(&owner);
        let replaced = replaced_pending.or(replaced_in_flight);
        tracing::trace!(?owner, handle = handle.0, ?replaced, "frame callback scheduled");
        handle
    }

    /// Drop `owner`'s pending callback. Returns whether one was pending.
    pub fn cancel(&self, owner: K) -> bool {
        let mut inner = self.inner.borrow_mut();
        let was_pending = inner.pending.remove(&owner).is_some();
        let was_in_flight = inner.in_flight.remove(&owner).is_some();
        let canceled = was_pending || was_in_flight;
        if canceled {
            tracing::trace!(?owner, "frame callback canceled");
        }
        canceled
    }

    /// Whether `owner` has a callback waiting to run.
    pub fn is_pending(&self, owner: K) -> bool {
        let inner = self.inner.borrow();
        inner.pending.contains_key(&owner) || inner.in_flight.contains_key(&owner)
    }

    /// Handle of `owner`'s waiting callback.
    pub fn pending_handle(&self, owner: K) -> Option<FrameHandle> {
        let inner = self.inner.borrow();
        inner
            .pending
            .get(&owner)
            .map(|p| p.handle)
            .or_else(|| inner.in_flight.get(&owner).copied())
    }

    /// Number of callbacks waiting for the next frame.
    pub fn pending_count(&self) -> usize {
        self.inner.borrow().pending.len()
    }

    /// Frame boundary: run every callback queued so far, returning how many
    /// ran.
    pub fn run_frame(&self) -> usize {
        let batch: Vec<(K, Pending)> = {
            let mut inner = self.inner.borrow_mut();
            let mut batch: Vec<(K, Pending)> = inner.pending.drain().collect();
            batch.sort_by_key(|(_, pending)| pending.handle);
            inner.in_flight = batch.iter().map(|(owner, p)| (*owner, p.handle)).collect();
            inner.frames += 1;
            inner.last_frame_at = Some(Instant::now());
            batch
        };

        let mut ran = 0;
        for (owner, pending) in batch {
            let live = self.inner.borrow_mut().in_flight.remove(&owner) == Some(pending.handle);
            if live {
                (pending.callback)();
                ran += 1;
            }
        }
        self.inner.borrow_mut().in_flight.clear();
        tracing::trace!(ran, "frame complete");
        ran
    }

    /// Run frames until nothing is pending or `max_frames` elapse.
    /// Returns the number of frames run.
    pub fn run_until_idle(&self, max_frames: usize) -> usize {
        let mut frames = 0;
        while frames < max_frames && self.pending_count() > 0 {
            self.run_frame();
            frames += 1;
        }
        frames
    }

    /// Number of frame boundaries so far.
    pub fn frame_count(&self) -> u64 {
        self.inner.borrow().frames
    }

    /// When the last frame boundary started.
    pub fn last_frame_at(&self) -> Option<Instant> {
        self.inner.borrow().last_frame_at
    }
}
