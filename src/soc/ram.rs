//! RAM and its free-frame pool.
//!
//! RAM is a fixed array of page frames. Which frames are free is tracked by
//! a separate `FramePool` with its own lock: it starts out holding every
//! frame, loses a frame whenever that frame is written, and regains frames
//! when a finished process is cleaned up.

use crate::common::sync::lock;
use crate::common::{SimError, Word};
use crate::soc::page::Page;
use crate::soc::traits::PageStore;
use std::collections::VecDeque;
use std::sync::{Arc, Condvar, Mutex};
use std::time::Duration;

/// Pool of free RAM frame indices, handed out oldest-freed first.
pub struct FramePool {
    free: Mutex<VecDeque<usize>>,
    available: Condvar,
}

impl FramePool {
    /// Creates a pool holding frames `0..frame_count`.
    pub fn new(frame_count: usize) -> Self {
        Self {
            free: Mutex::new((0..frame_count).collect()),
            available: Condvar::new(),
        }
    }

    /// Removes and returns the next free frame.
    pub fn take(&self) -> Option<usize> {
        lock(&self.free).pop_front()
    }

    /// Returns a frame to the pool. Frames already in the pool are ignored.
    pub fn release(&self, frame: usize) {
        let mut free = lock(&self.free);
        if !free.contains(&frame) {
            free.push_back(frame);
            self.available.notify_all();
        }
    }

    /// Removes a specific frame from the pool if it is present.
    pub fn claim(&self, frame: usize) {
        lock(&self.free).retain(|&f| f != frame);
    }

    /// Number of free frames.
    pub fn len(&self) -> usize {
        lock(&self.free).len()
    }

    /// Returns `true` when no frame is free.
    pub fn is_empty(&self) -> bool {
        lock(&self.free).is_empty()
    }

    /// Blocks until a frame is free or the timeout elapses.
    ///
    /// # Returns
    ///
    /// `true` if at least one frame is free on return.
    pub fn wait_for_frame(&self, timeout: Duration) -> bool {
        let free = lock(&self.free);
        let (free, _) = self
            .available
            .wait_timeout_while(free, timeout, |free| free.is_empty())
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        !free.is_empty()
    }

    /// Wakes every waiter, used when shutting down.
    pub fn wake_all(&self) {
        self.available.notify_all();
    }
}

/// Main memory: a fixed array of page frames.
pub struct Ram {
    page_size: usize,
    frames: Mutex<Vec<Page>>,
    pool: Arc<FramePool>,
}

impl Ram {
    /// Creates RAM with every frame empty and free.
    ///
    /// # Arguments
    ///
    /// * `frame_count` - Number of frames
    /// * `page_size` - Words per frame
    pub fn new(frame_count: usize, page_size: usize) -> Self {
        Self {
            page_size,
            frames: Mutex::new((0..frame_count).map(|_| Page::new(page_size)).collect()),
            pool: Arc::new(FramePool::new(frame_count)),
        }
    }

    /// Words per frame.
    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Number of frames.
    pub fn frame_count(&self) -> usize {
        lock(&self.frames).len()
    }

    /// The free-frame pool.
    pub fn pool(&self) -> &Arc<FramePool> {
        &self.pool
    }

    /// Copies a page into a frame and drops the frame from the free pool.
    ///
    /// # Arguments
    ///
    /// * `frame` - Destination frame index
    /// * `page` - Source page; the frame's previous contents are replaced,
    ///   empty slots included
    pub fn write_frame(&self, frame: usize, page: &Page) -> Result<(), SimError> {
        {
            let mut frames = lock(&self.frames);
            let len = frames.len();
            let slot = frames.get_mut(frame).ok_or(SimError::PageOutOfRange {
                structure: "RAM frame",
                index: frame,
                len,
            })?;
            *slot = page.clone();
        }
        self.pool.claim(frame);
        Ok(())
    }

    /// Reads one word of a frame.
    pub fn read_word(&self, frame: usize, offset: usize) -> Result<Option<Word>, SimError> {
        let frames = lock(&self.frames);
        frames
            .get(frame)
            .ok_or(SimError::PageOutOfRange {
                structure: "RAM frame",
                index: frame,
                len: frames.len(),
            })?
            .read(offset)
    }
}

impl PageStore for Ram {
    fn name(&self) -> &str {
        "ram"
    }

    fn page_count(&self) -> usize {
        self.frame_count()
    }

    fn read_page(&self, index: usize) -> Result<Page, SimError> {
        let frames = lock(&self.frames);
        frames
            .get(index)
            .cloned()
            .ok_or(SimError::PageOutOfRange {
                structure: "RAM frame",
                index,
                len: frames.len(),
            })
    }

    fn snapshot(&self) -> Result<Vec<Page>, SimError> {
        Ok(lock(&self.frames).clone())
    }
}
