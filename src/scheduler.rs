//! Poll scheduler - named periodic tasks with skip-based backpressure
//!
//! Each task is Idle, InFlight or Scheduled. A task reschedules itself only when its
//! request completes, so a task never has more than one request outstanding. Firing a
//! task that is still in flight is counted as a skipped tick and does nothing.
//!
//! The scheduler is a pure state machine over explicit instants; the runtime owns the
//! actual timers.

use std::fmt;

use tokio::time::{Duration, Instant};
use tracing::{debug, info};

use crate::config::Config;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskKind {
    Status,
    Data,
    Logs,
    Chart,
}

impl TaskKind {
    pub const ALL: [TaskKind; 4] = [TaskKind::Status, TaskKind::Data, TaskKind::Logs, TaskKind::Chart];

    fn index(self) -> usize {
        match self {
            TaskKind::Status => 0,
            TaskKind::Data => 1,
            TaskKind::Logs => 2,
            TaskKind::Chart => 3,
        }
    }
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TaskKind::Status => "status",
            TaskKind::Data => "data",
            TaskKind::Logs => "logs",
            TaskKind::Chart => "chart",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    Idle,
    InFlight,
    Scheduled(Instant),
}

/// Per-task poll intervals
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollIntervals {
    pub status: Duration,
    pub data: Duration,
    pub logs: Duration,
    pub chart: Duration,
}

impl PollIntervals {
    pub fn uniform(every: Duration) -> Self {
        Self { status: every, data: every, logs: every, chart: every }
    }

    pub fn from_config(config: &Config) -> Self {
        Self {
            status: Duration::from_millis(config.status_interval_ms),
            data: Duration::from_millis(config.data_interval_ms),
            logs: Duration::from_millis(config.logs_interval_ms),
            chart: Duration::from_millis(config.chart_interval_ms),
        }
    }

    fn get(&self, kind: TaskKind) -> Duration {
        match kind {
            TaskKind::Status => self.status,
            TaskKind::Data => self.data,
            TaskKind::Logs => self.logs,
            TaskKind::Chart => self.chart,
        }
    }
}

#[derive(Debug, Clone)]
struct Task {
    interval: Duration,
    state: TaskState,
    failures: u32,
    skipped: u64,
}

#[derive(Debug, Clone)]
pub struct PollScheduler {
    tasks: [Task; 4],
    max_backoff: Duration,
    chart_visible: bool,
    running: bool,
}

impl PollScheduler {
    pub fn new(intervals: PollIntervals, max_backoff: Duration) -> Self {
        let task = |kind| Task {
            interval: intervals.get(kind),
            state: TaskState::Idle,
            failures: 0,
            skipped: 0,
        };
        Self {
            tasks: TaskKind::ALL.map(task),
            max_backoff,
            chart_visible: true,
            running: false,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        let mut scheduler = Self::new(PollIntervals::from_config(config), config.max_backoff());
        scheduler.chart_visible = config.chart_visible;
        scheduler
    }

    fn task(&self, kind: TaskKind) -> &Task {
        &self.tasks[kind.index()]
    }

    fn task_mut(&mut self, kind: TaskKind) -> &mut Task {
        &mut self.tasks[kind.index()]
    }

    fn gated(&self, kind: TaskKind) -> bool {
        kind == TaskKind::Chart && !self.chart_visible
    }

    /// Schedule every task to run at `now`; a hidden chart stays Idle
    pub fn start(&mut self, now: Instant) {
        self.running = true;
        for kind in TaskKind::ALL {
            let state = if self.gated(kind) { TaskState::Idle } else { TaskState::Scheduled(now) };
            let task = self.task_mut(kind);
            task.state = state;
            task.failures = 0;
        }
        info!(chart_visible = self.chart_visible, "Poll scheduler started");
    }

    /// Mark a task in flight; returns false (no request) if stopped, gated or already in flight
    pub fn fire(&mut self, kind: TaskKind, _now: Instant) -> bool {
        if !self.running || self.gated(kind) {
            return false;
        }
        let task = self.task_mut(kind);
        if task.state == TaskState::InFlight {
            task.skipped += 1;
            debug!(task = %kind, skipped = task.skipped, "Tick skipped, request still in flight");
            return false;
        }
        task.state = TaskState::InFlight;
        true
    }

    /// Fire every scheduled task whose deadline has passed
    pub fn fire_due(&mut self, now: Instant) -> Vec<TaskKind> {
        let due: Vec<TaskKind> = TaskKind::ALL
            .into_iter()
            .filter(|kind| matches!(self.task(*kind).state, TaskState::Scheduled(at) if at <= now))
            .collect();
        due.into_iter().filter(|kind| self.fire(*kind, now)).collect()
    }

    /// Record a finished request and schedule the next run
    ///
    /// Completions for tasks that are not in flight (e.g. after `stop`) are ignored.
    pub fn complete(&mut self, kind: TaskKind, success: bool, now: Instant) {
        let running = self.running;
        let gated = self.gated(kind);
        let max_backoff = self.max_backoff;
        let task = self.task_mut(kind);
        if task.state != TaskState::InFlight {
            return;
        }

        if success {
            task.failures = 0;
        } else {
            task.failures = task.failures.saturating_add(1);
        }

        if !running || gated {
            task.state = TaskState::Idle;
            return;
        }

        let delay = backoff_delay(task.interval, task.failures, max_backoff);
        if task.failures > 0 {
            debug!(task = %kind, failures = task.failures, delay_ms = delay.as_millis(), "Backing off");
        }
        task.state = TaskState::Scheduled(now + delay);
    }

    /// Suspend or resume the chart task; resuming starts fresh without catch-up
    pub fn set_chart_visible(&mut self, visible: bool, now: Instant) {
        if self.chart_visible == visible {
            return;
        }
        self.chart_visible = visible;
        let running = self.running;
        let task = self.task_mut(TaskKind::Chart);
        match (visible, task.state) {
            (false, TaskState::Scheduled(_)) => task.state = TaskState::Idle,
            (true, TaskState::Idle) if running => {
                task.state = TaskState::Scheduled(now);
                task.failures = 0;
            }
            _ => {}
        }
        debug!(visible, "Chart visibility changed");
    }

    /// Clear every timer; later fires are no-ops
    pub fn stop(&mut self) {
        self.running = false;
        for task in &mut self.tasks {
            task.state = TaskState::Idle;
            task.failures = 0;
        }
        info!("Poll scheduler stopped");
    }

    /// Earliest pending deadline, if any
    pub fn next_deadline(&self) -> Option<Instant> {
        if !self.running {
            return None;
        }
        self.tasks
            .iter()
            .filter_map(|task| match task.state {
                TaskState::Scheduled(due) => Some(due),
                _ => None,
            })
            .min()
    }

    pub fn state(&self, kind: TaskKind) -> TaskState {
        self.task(kind).state
    }

    pub fn skipped(&self, kind: TaskKind) -> u64 {
        self.task(kind).skipped
    }

    pub fn failures(&self, kind: TaskKind) -> u32 {
        self.task(kind).failures
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn chart_visible(&self) -> bool {
        self.chart_visible
    }
}

/// interval * 2^failures, capped at `max`
fn backoff_delay(interval: Duration, failures: u32, max: Duration) -> Duration {
    if failures == 0 {
        return interval;
    }
    let factor = 1u32 << failures.min(16);
    interval.saturating_mul(factor).min(max).max(interval)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECOND: Duration = Duration::from_secs(1);

    fn scheduler() -> PollScheduler {
        PollScheduler::new(PollIntervals::uniform(SECOND), Duration::from_secs(8))
    }

    #[test]
    fn test_start_schedules_all_now() {
        let now = Instant::now();
        let mut s = scheduler();
        assert_eq!(s.next_deadline(), None);
        s.start(now);
        for kind in TaskKind::ALL {
            assert_eq!(s.state(kind), TaskState::Scheduled(now));
        }
        assert_eq!(s.fire_due(now), TaskKind::ALL.to_vec());
    }

    #[test]
    fn test_fire_while_in_flight_is_skipped() {
        let now = Instant::now();
        let mut s = scheduler();
        s.start(now);
        assert!(s.fire(TaskKind::Data, now));
        assert!(!s.fire(TaskKind::Data, now + SECOND));
        assert!(!s.fire(TaskKind::Data, now + SECOND * 2));
        assert_eq!(s.skipped(TaskKind::Data), 2);
        assert_eq!(s.state(TaskKind::Data), TaskState::InFlight);

        // no timer while in flight, so nothing is due for it
        assert!(!s.fire_due(now + SECOND * 5).contains(&TaskKind::Data));
    }

    #[test]
    fn test_complete_reschedules_after_interval() {
        let now = Instant::now();
        let mut s = scheduler();
        s.start(now);
        s.fire_due(now);
        s.complete(TaskKind::Status, true, now + Duration::from_millis(300));
        assert_eq!(
            s.state(TaskKind::Status),
            TaskState::Scheduled(now + Duration::from_millis(1300))
        );
        assert_eq!(s.next_deadline(), Some(now + Duration::from_millis(1300)));
    }

    #[test]
    fn test_backoff_grows_capped_and_resets() {
        let now = Instant::now();
        let mut s = scheduler();
        s.start(now);

        let mut delays = Vec::new();
        let mut t = now;
        for _ in 0..5 {
            assert!(s.fire(TaskKind::Logs, t));
            s.complete(TaskKind::Logs, false, t);
            let TaskState::Scheduled(due) = s.state(TaskKind::Logs) else {
                panic!("logs not rescheduled");
            };
            delays.push(due - t);
            t = due;
        }
        assert_eq!(delays, vec![SECOND * 2, SECOND * 4, SECOND * 8, SECOND * 8, SECOND * 8]);

        assert!(s.fire(TaskKind::Logs, t));
        s.complete(TaskKind::Logs, true, t);
        assert_eq!(s.failures(TaskKind::Logs), 0);
        assert_eq!(s.state(TaskKind::Logs), TaskState::Scheduled(t + SECOND));
    }

    #[test]
    fn test_chart_visibility_gating() {
        let now = Instant::now();
        let mut s = scheduler();
        s.start(now);

        s.set_chart_visible(false, now);
        assert_eq!(s.state(TaskKind::Chart), TaskState::Idle);
        assert!(!s.fire(TaskKind::Chart, now));
        assert!(!s.fire_due(now + SECOND * 10).contains(&TaskKind::Chart));

        s.set_chart_visible(true, now + SECOND * 10);
        assert_eq!(s.state(TaskKind::Chart), TaskState::Scheduled(now + SECOND * 10));
    }

    #[test]
    fn test_hidden_while_in_flight_parks_idle() {
        let now = Instant::now();
        let mut s = scheduler();
        s.start(now);
        assert!(s.fire(TaskKind::Chart, now));
        s.set_chart_visible(false, now);
        assert_eq!(s.state(TaskKind::Chart), TaskState::InFlight);
        s.complete(TaskKind::Chart, true, now + SECOND);
        assert_eq!(s.state(TaskKind::Chart), TaskState::Idle);
    }

    #[test]
    fn test_stop_clears_timers() {
        let now = Instant::now();
        let mut s = scheduler();
        s.start(now);
        s.fire(TaskKind::Status, now);
        s.stop();

        assert_eq!(s.next_deadline(), None);
        assert!(!s.fire(TaskKind::Data, now));
        assert!(s.fire_due(now + SECOND * 60).is_empty());
        s.complete(TaskKind::Status, true, now);
        assert_eq!(s.state(TaskKind::Status), TaskState::Idle);
    }
}
