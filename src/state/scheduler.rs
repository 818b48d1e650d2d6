//! Per-room task table.
//!
//! At most one task exists per `(room, purpose)`. Arming replaces the previous
//! task; a task that fires must win [`Scheduler::complete`] with its token before
//! it may touch the room, so a superseded task can never act on a newer phase.

use std::{
    sync::atomic::{AtomicU64, Ordering},
    time::Duration,
};

use dashmap::DashMap;
use futures::future::BoxFuture;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::state::outbox::TimerPurpose;

type TaskKey = (String, TimerPurpose);

struct ScheduledTask {
    token: u64,
    handle: JoinHandle<()>,
}

/// Table of armed timers.
#[derive(Default)]
pub struct Scheduler {
    tasks: DashMap<TaskKey, ScheduledTask>,
    next_token: AtomicU64,
}

impl Scheduler {
    /// Empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `task(token)` after `after`, replacing whatever was armed for the same key.
    pub fn arm<F>(&self, room_id: &str, purpose: TimerPurpose, after: Duration, task: F)
    where
        F: FnOnce(u64) -> BoxFuture<'static, ()>,
    {
        let token = self.next_token.fetch_add(1, Ordering::Relaxed);
        let fire = task(token);
        let handle = tokio::spawn(async move {
            tokio::time::sleep(after).await;
            fire.await;
        });

        debug!(room_id = %room_id, ?purpose, ?after, token, "timer armed");
        let previous = self.tasks.insert(
            (room_id.to_string(), purpose),
            ScheduledTask { token, handle },
        );
        if let Some(previous) = previous {
            previous.handle.abort();
        }
    }

    /// Cancel the task armed for `(room_id, purpose)`, if any.
    pub fn cancel(&self, room_id: &str, purpose: &TimerPurpose) {
        if let Some((_, task)) = self.tasks.remove(&(room_id.to_string(), purpose.clone())) {
            debug!(room_id = %room_id, ?purpose, token = task.token, "timer cancelled");
            task.handle.abort();
        }
    }

    /// Claim a fired task. Returns `false` when it was cancelled or replaced meanwhile.
    pub fn complete(&self, room_id: &str, purpose: &TimerPurpose, token: u64) -> bool {
        self.tasks
            .remove_if(&(room_id.to_string(), purpose.clone()), |_, task| {
                task.token == token
            })
            .is_some()
    }

    /// Cancel every task of a room.
    pub fn cancel_room(&self, room_id: &str) {
        self.tasks.retain(|(id, _), task| {
            if id == room_id {
                task.handle.abort();
                false
            } else {
                true
            }
        });
    }

    /// Whether a task is armed for `(room_id, purpose)`.
    pub fn is_armed(&self, room_id: &str, purpose: &TimerPurpose) -> bool {
        self.tasks
            .contains_key(&(room_id.to_string(), purpose.clone()))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use futures::FutureExt;
    use tokio::sync::mpsc;

    use super::*;

    fn recorder(
        scheduler: &Arc<Scheduler>,
        room_id: &'static str,
        purpose: TimerPurpose,
        tx: mpsc::UnboundedSender<u64>,
    ) -> impl FnOnce(u64) -> BoxFuture<'static, ()> {
        let scheduler = scheduler.clone();
        move |token| {
            async move {
                if scheduler.complete(room_id, &purpose, token) {
                    let _ = tx.send(token);
                }
            }
            .boxed()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn fires_once_after_delay() {
        let scheduler = Arc::new(Scheduler::new());
        let (tx, mut rx) = mpsc::unbounded_channel();
        let task = recorder(&scheduler, "AB23CD", TimerPurpose::PhaseEnd, tx);
        scheduler.arm("AB23CD", TimerPurpose::PhaseEnd, Duration::from_secs(20), task);

        tokio::time::sleep(Duration::from_secs(19)).await;
        assert!(rx.try_recv().is_err());

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert!(rx.recv().await.is_some());
        assert!(!scheduler.is_armed("AB23CD", &TimerPurpose::PhaseEnd));
    }

    #[tokio::test(start_paused = true)]
    async fn rearming_supersedes_previous_task() {
        let scheduler = Arc::new(Scheduler::new());
        let (tx, mut rx) = mpsc::unbounded_channel();

        let first = recorder(&scheduler, "AB23CD", TimerPurpose::TimeSync, tx.clone());
        scheduler.arm("AB23CD", TimerPurpose::TimeSync, Duration::from_secs(5), first);
        let second = recorder(&scheduler, "AB23CD", TimerPurpose::TimeSync, tx);
        scheduler.arm("AB23CD", TimerPurpose::TimeSync, Duration::from_secs(10), second);

        tokio::time::sleep(Duration::from_secs(11)).await;
        assert_eq!(rx.recv().await, Some(1));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_room_drops_every_task_of_that_room() {
        let scheduler = Arc::new(Scheduler::new());
        let (tx, mut rx) = mpsc::unbounded_channel();
        for purpose in [TimerPurpose::PhaseEnd, TimerPurpose::Intermission] {
            let task = recorder(&scheduler, "AB23CD", purpose.clone(), tx.clone());
            scheduler.arm("AB23CD", purpose, Duration::from_secs(1), task);
        }
        let other = recorder(&scheduler, "ZZ23CD", TimerPurpose::PhaseEnd, tx);
        scheduler.arm("ZZ23CD", TimerPurpose::PhaseEnd, Duration::from_secs(1), other);

        scheduler.cancel_room("AB23CD");
        tokio::time::sleep(Duration::from_secs(2)).await;

        assert!(rx.recv().await.is_some());
        assert!(rx.try_recv().is_err());
        assert!(!scheduler.is_armed("AB23CD", &TimerPurpose::PhaseEnd));
    }
}
