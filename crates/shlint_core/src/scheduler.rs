//! Per-key debounced task scheduling.
//!
//! Each key owns a small state machine:
//!
//! ```text
//! Idle --trigger--> TimerPending --timer--> Running --done--> Idle
//!                    ^      |                 |   ^
//!                    +------+ trigger         |   | done, rerun starts at once
//!                    (timer restarted)        v   |
//!                                        RunningWithRerun
//! ```
//!
//! Calls made while a timer is pending restart the timer and replace the
//! task. Calls made while a task runs never interrupt it; they collapse into
//! a single rerun that starts as soon as the current run finishes.

use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, error};

type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send + 'static>>;
type Task<T> = Box<dyn FnOnce() -> BoxFuture<T> + Send + 'static>;

/// Observable state of one key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    TimerPending,
    Running,
    RunningWithRerun,
}

/// Resolves to the output of the run that absorbed a `trigger` call.
///
/// Yields `None` when the key was cancelled before the run happened, or when
/// the task panicked.
#[derive(Debug)]
pub struct Completion<T> {
    rx: oneshot::Receiver<T>,
}

impl<T> Future for Completion<T> {
    type Output = Option<T>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.rx).poll(cx).map(Result::ok)
    }
}

struct Pending<T> {
    task: Task<T>,
    waiters: Vec<oneshot::Sender<T>>,
}

enum SlotState {
    TimerPending { timer: JoinHandle<()>, timer_id: u64 },
    Running,
}

struct Slot<T> {
    state: SlotState,
    pending: Option<Pending<T>>,
}

struct Shared<K, T> {
    slots: HashMap<K, Slot<T>>,
    next_id: u64,
}

impl<K, T> Shared<K, T> {
    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }
}

/// Coalesces bursts of work per key into at most one pending and one
/// in-flight task.
pub struct Debouncer<K, T> {
    shared: Arc<Mutex<Shared<K, T>>>,
}

impl<K, T> Clone for Debouncer<K, T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<K, T> Default for Debouncer<K, T>
where
    K: Eq + Hash + Clone + Send + std::fmt::Debug + 'static,
    T: Clone + Send + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, T> Debouncer<K, T>
where
    K: Eq + Hash + Clone + Send + std::fmt::Debug + 'static,
    T: Clone + Send + 'static,
{
    pub fn new() -> Self {
        Self {
            shared: Arc::new(Mutex::new(Shared {
                slots: HashMap::new(),
                next_id: 0,
            })),
        }
    }

    /// Schedules `task` for `key` after `delay`.
    ///
    /// Must be called from within a tokio runtime.
    pub fn trigger<F, Fut>(&self, key: K, delay: Duration, task: F) -> Completion<T>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = T> + Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        let task: Task<T> = Box::new(move || Box::pin(task()));

        let mut guard = self.shared.lock();
        let shared = &mut *guard;
        let timer_id = shared.next_id();

        match shared.slots.get_mut(&key) {
            None => {
                let timer = self.arm_timer(key.clone(), delay, timer_id);
                shared.slots.insert(
                    key,
                    Slot {
                        state: SlotState::TimerPending { timer, timer_id },
                        pending: Some(Pending {
                            task,
                            waiters: vec![tx],
                        }),
                    },
                );
            }
            Some(slot) => {
                let mut waiters = slot
                    .pending
                    .take()
                    .map(|p| p.waiters)
                    .unwrap_or_default();
                waiters.push(tx);
                slot.pending = Some(Pending { task, waiters });

                if let SlotState::TimerPending { timer, .. } = &slot.state {
                    debug!("Restarting debounce timer for {:?}", key);
                    timer.abort();
                    let timer = self.arm_timer(key, delay, timer_id);
                    slot.state = SlotState::TimerPending { timer, timer_id };
                } else {
                    debug!("Rerun requested for {:?} while running", key);
                }
            }
        }

        Completion { rx }
    }

    /// Drops any pending timer or rerun for `key`.
    ///
    /// A task already running is not interrupted and keeps the key busy until
    /// it finishes, so a later `trigger` queues behind it instead of starting
    /// a second run.
    pub fn cancel(&self, key: &K) {
        let mut guard = self.shared.lock();
        let Some(slot) = guard.slots.get_mut(key) else {
            return;
        };
        match &slot.state {
            SlotState::Running => slot.pending = None,
            SlotState::TimerPending { timer, .. } => {
                timer.abort();
                guard.slots.remove(key);
            }
        }
    }

    /// Cancels every key.
    pub fn cancel_all(&self) {
        self.shared.lock().slots.retain(|_, slot| match &slot.state {
            SlotState::Running => {
                slot.pending = None;
                true
            }
            SlotState::TimerPending { timer, .. } => {
                timer.abort();
                false
            }
        });
    }

    /// Current phase of `key`.
    pub fn phase(&self, key: &K) -> Phase {
        match self.shared.lock().slots.get(key) {
            None => Phase::Idle,
            Some(slot) => match (&slot.state, &slot.pending) {
                (SlotState::TimerPending { .. }, _) => Phase::TimerPending,
                (SlotState::Running, None) => Phase::Running,
                (SlotState::Running, Some(_)) => Phase::RunningWithRerun,
            },
        }
    }

    pub fn is_idle(&self, key: &K) -> bool {
        self.phase(key) == Phase::Idle
    }

    fn arm_timer(&self, key: K, delay: Duration, timer_id: u64) -> JoinHandle<()> {
        let shared = Arc::clone(&self.shared);
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            fire(shared, key, timer_id).await;
        })
    }
}

async fn fire<K, T>(shared: Arc<Mutex<Shared<K, T>>>, key: K, timer_id: u64)
where
    K: Eq + Hash + Clone + Send + std::fmt::Debug + 'static,
    T: Clone + Send + 'static,
{
    let mut pending = {
        let mut guard = shared.lock();
        let Some(slot) = guard.slots.get_mut(&key) else {
            return;
        };
        // A restarted timer may still wake up once; only the latest counts.
        match slot.state {
            SlotState::TimerPending { timer_id: id, .. } if id == timer_id => {}
            _ => return,
        }
        let Some(pending) = slot.pending.take() else {
            guard.slots.remove(&key);
            return;
        };
        slot.state = SlotState::Running;
        pending
    };

    loop {
        let Pending { task, waiters } = pending;

        // Run on its own task so a panic stays contained.
        let outcome = tokio::spawn(task()).await;

        let next = {
            let mut guard = shared.lock();
            let next = guard.slots.get_mut(&key).and_then(|slot| slot.pending.take());
            if next.is_none() {
                guard.slots.remove(&key);
            }
            next
        };

        match outcome {
            Ok(value) => {
                for waiter in waiters {
                    let _ = waiter.send(value.clone());
                }
            }
            Err(e) => error!("Scheduled task for {:?} failed: {}", key, e),
        }

        match next {
            Some(next) => pending = next,
            None => break,
        }
    }
}
