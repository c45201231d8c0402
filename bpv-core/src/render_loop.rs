/// Per-frame update-and-draw loop bookkeeping
///
/// A [`FrameScheduler`] delivers "next display refresh" callbacks identified by a
/// [`FrameHandle`]. [`RenderLoop`] keeps at most one of those handles outstanding, so a viewer can
/// never end up with two loops feeding one surface, and cancellation is a synchronous call that
/// revokes the outstanding handle before it returns.
use std::collections::VecDeque;

use crate::error::SchedulerError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameHandle(pub u64);

/// Host side of frame scheduling, the `requestAnimationFrame` seam
pub trait FrameScheduler {
    /// Ask for one callback on the next display refresh
    fn request_frame(&mut self) -> Result<FrameHandle, SchedulerError>;

    /// Revoke a requested callback. Must be a no-op for handles that already fired.
    fn cancel_frame(&mut self, handle: FrameHandle);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LoopPhase {
    Stopped,
    Scheduled(FrameHandle),
    InFrame,
}

#[derive(Debug)]
pub struct RenderLoop {
    phase: LoopPhase,
    iterations: u64,
}

impl RenderLoop {
    pub fn new() -> Self {
        Self {
            phase: LoopPhase::Stopped,
            iterations: 0,
        }
    }

    /// Schedule the first iteration. Returns false if the loop was already running or the
    /// scheduler refused the request.
    pub fn start<S: FrameScheduler + ?Sized>(&mut self, scheduler: &mut S) -> bool {
        if self.phase != LoopPhase::Stopped {
            return false;
        }
        self.schedule(scheduler);
        self.is_running()
    }

    pub fn is_running(&self) -> bool {
        self.phase != LoopPhase::Stopped
    }

    pub fn iterations(&self) -> u64 {
        self.iterations
    }

    /// Claim a fired callback. Only the outstanding handle is accepted.
    pub fn begin(&mut self, handle: FrameHandle) -> bool {
        match self.phase {
            LoopPhase::Scheduled(pending) if pending == handle => {
                self.phase = LoopPhase::InFrame;
                self.iterations += 1;
                true
            }
            _ => false,
        }
    }

    /// Finish an iteration by requesting the next one
    pub fn end<S: FrameScheduler + ?Sized>(&mut self, scheduler: &mut S) {
        if self.phase == LoopPhase::InFrame {
            self.schedule(scheduler);
        }
    }

    /// A refused request stops the loop instead of waiting on a callback that never fires
    fn schedule<S: FrameScheduler + ?Sized>(&mut self, scheduler: &mut S) {
        self.phase = match scheduler.request_frame() {
            Ok(handle) => LoopPhase::Scheduled(handle),
            Err(err) => {
                tracing::error!(%err, "render loop stopped");
                LoopPhase::Stopped
            }
        };
    }

    /// Stop the loop, revoking any outstanding callback. Returns false if it was not running.
    pub fn cancel<S: FrameScheduler + ?Sized>(&mut self, scheduler: &mut S) -> bool {
        match std::mem::replace(&mut self.phase, LoopPhase::Stopped) {
            LoopPhase::Stopped => false,
            LoopPhase::Scheduled(handle) => {
                scheduler.cancel_frame(handle);
                true
            }
            LoopPhase::InFrame => true,
        }
    }
}

impl Default for RenderLoop {
    fn default() -> Self {
        Self::new()
    }
}

/// In-process scheduler: requested frames wait in a queue until the host signals a refresh
#[derive(Debug, Default)]
pub struct FrameQueue {
    next_id: u64,
    queued: VecDeque<FrameHandle>,
}

impl FrameQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handles due on this refresh. Frames requested while handling them wait for the next one.
    pub fn take_due(&mut self) -> Vec<FrameHandle> {
        self.queued.drain(..).collect()
    }

    pub fn pending(&self) -> usize {
        self.queued.len()
    }
}

impl FrameScheduler for FrameQueue {
    fn request_frame(&mut self) -> Result<FrameHandle, SchedulerError> {
        self.next_id += 1;
        let handle = FrameHandle(self.next_id);
        self.queued.push_back(handle);
        Ok(handle)
    }

    fn cancel_frame(&mut self, handle: FrameHandle) {
        self.queued.retain(|queued| *queued != handle);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_start_schedules_once() {
        let mut queue = FrameQueue::new();
        let mut render_loop = RenderLoop::new();
        assert!(render_loop.start(&mut queue));
        assert!(!render_loop.start(&mut queue));
        assert_eq!(queue.pending(), 1);
    }

    #[test]
    fn test_iteration_reschedules() {
        let mut queue = FrameQueue::new();
        let mut render_loop = RenderLoop::new();
        render_loop.start(&mut queue);

        for _ in 0..3 {
            let due = queue.take_due();
            assert_eq!(due.len(), 1);
            assert!(render_loop.begin(due[0]));
            render_loop.end(&mut queue);
        }
        assert_eq!(render_loop.iterations(), 3);
        assert_eq!(queue.pending(), 1);
    }

    #[test]
    fn test_cancel_revokes_outstanding_frame() {
        let mut queue = FrameQueue::new();
        let mut render_loop = RenderLoop::new();
        render_loop.start(&mut queue);
        assert!(render_loop.cancel(&mut queue));
        assert_eq!(queue.pending(), 0);
        assert!(!render_loop.is_running());
        assert!(!render_loop.cancel(&mut queue));
    }

    #[test]
    fn test_stale_handle_is_rejected() {
        let mut queue = FrameQueue::new();
        let mut render_loop = RenderLoop::new();
        render_loop.start(&mut queue);
        let first = queue.take_due()[0];
        render_loop.cancel(&mut queue);
        render_loop.start(&mut queue);
        assert!(!render_loop.begin(first));
        assert_eq!(render_loop.iterations(), 0);
    }

    /// Grants `budget` requests, then refuses
    struct Exhausting {
        queue: FrameQueue,
        budget: usize,
    }

    impl FrameScheduler for Exhausting {
        fn request_frame(&mut self) -> Result<FrameHandle, SchedulerError> {
            if self.budget == 0 {
                return Err(SchedulerError::Refused("no window".into()));
            }
            self.budget -= 1;
            self.queue.request_frame()
        }

        fn cancel_frame(&mut self, handle: FrameHandle) {
            self.queue.cancel_frame(handle);
        }
    }

    #[test]
    fn test_refused_start_leaves_loop_stopped() {
        let mut scheduler = Exhausting {
            queue: FrameQueue::new(),
            budget: 0,
        };
        let mut render_loop = RenderLoop::new();
        assert!(!render_loop.start(&mut scheduler));
        assert!(!render_loop.is_running());
        assert!(!render_loop.cancel(&mut scheduler));
    }

    #[test]
    fn test_refused_reschedule_stops_loop() {
        let mut scheduler = Exhausting {
            queue: FrameQueue::new(),
            budget: 1,
        };
        let mut render_loop = RenderLoop::new();
        assert!(render_loop.start(&mut scheduler));
        let handle = scheduler.queue.take_due()[0];
        assert!(render_loop.begin(handle));
        render_loop.end(&mut scheduler);
        assert!(!render_loop.is_running());
        assert_eq!(scheduler.queue.pending(), 0);

        // a fresh start works again once the host can schedule
        scheduler.budget = 1;
        assert!(render_loop.start(&mut scheduler));
    }

    #[test]
    fn test_cancel_inside_frame_stops_rescheduling() {
        let mut queue = FrameQueue::new();
        let mut render_loop = RenderLoop::new();
        render_loop.start(&mut queue);
        let handle = queue.take_due()[0];
        assert!(render_loop.begin(handle));
        assert!(render_loop.cancel(&mut queue));
        render_loop.end(&mut queue);
        assert_eq!(queue.pending(), 0);
        assert!(!render_loop.is_running());
    }
}
