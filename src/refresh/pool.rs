use crate::error::AppError;

use futures::FutureExt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, warn};

#[derive(Debug)]
pub enum TaskOutcome<T> {
    Succeeded(T),
    Failed(AppError),
    TimedOut,
}

impl<T> TaskOutcome<T> {
    pub fn succeeded(self) -> Option<T> {
        match self {
            TaskOutcome::Succeeded(value) => Some(value),
            _ => None,
        }
    }

    pub fn is_timed_out(&self) -> bool {
        matches!(self, TaskOutcome::TimedOut)
    }
}

/// Runs one task per item with at most `concurrency` in flight, each under
/// its own timeout. Outcomes come back in input order.
///
/// Without a tokio runtime every item runs serially in the caller's
/// executor. Items whose spawned task never reported back (cancelled by a
/// shutting-down runtime) are retried serially.
#[derive(Debug, Clone)]
pub struct BoundedPool {
    name: &'static str,
    concurrency: usize,
    timeout: Duration,
}

impl BoundedPool {
    pub fn new(name: &'static str, concurrency: usize, timeout: Duration) -> Self {
        Self {
            name,
            concurrency: concurrency.max(1),
            timeout,
        }
    }

    pub async fn run<I, T, F, Fut>(&self, items: Vec<I>, task: F) -> Vec<TaskOutcome<T>>
    where
        I: Clone + Send + 'static,
        T: Send + 'static,
        F: Fn(I) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Option<T>> + Send + 'static,
    {
        if Handle::try_current().is_err() {
            warn!("[{}] No async runtime, running {} tasks serially", self.name, items.len());
            let mut outcomes = Vec::with_capacity(items.len());
            for item in items {
                outcomes.push(run_one(task(item), None).await);
            }
            return outcomes;
        }

        let task = Arc::new(task);
        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let mut set = JoinSet::new();

        for (index, item) in items.iter().cloned().enumerate() {
            let task = Arc::clone(&task);
            let semaphore = Arc::clone(&semaphore);
            let timeout = self.timeout;
            set.spawn(async move {
                let _permit = match semaphore.acquire_owned().await {
                    Ok(permit) => permit,
                    Err(e) => return (index, TaskOutcome::Failed(AppError::Pool(e.to_string()))),
                };
                (index, run_one(task(item), Some(timeout)).await)
            });
        }

        let slots = self.join_all(set, &items, task.as_ref()).await;

        let outcomes: Vec<TaskOutcome<T>> = slots
            .into_iter()
            .map(|slot| {
                slot.unwrap_or_else(|| TaskOutcome::Failed(AppError::Pool("task lost".to_string())))
            })
            .collect();

        debug!(
            "[{}] {} tasks: {} succeeded, {} timed out",
            self.name,
            outcomes.len(),
            outcomes.iter().filter(|o| matches!(o, TaskOutcome::Succeeded(_))).count(),
            outcomes.iter().filter(|o| o.is_timed_out()).count()
        );
        outcomes
    }

    /// Drains `set` into per-item slots. Items whose task ended in a
    /// `JoinError` are run again serially.
    async fn join_all<I, T, F, Fut>(
        &self,
        mut set: JoinSet<(usize, TaskOutcome<T>)>,
        items: &[I],
        task: &F,
    ) -> Vec<Option<TaskOutcome<T>>>
    where
        I: Clone,
        T: Send + 'static,
        F: Fn(I) -> Fut,
        Fut: Future<Output = Option<T>>,
    {
        let mut slots: Vec<Option<TaskOutcome<T>>> = items.iter().map(|_| None).collect();
        while let Some(joined) = set.join_next().await {
            match joined {
                Ok((index, outcome)) => slots[index] = Some(outcome),
                Err(e) => warn!("[{}] Pool task did not complete: {}", self.name, e),
            }
        }

        let pending: Vec<usize> = slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.is_none())
            .map(|(index, _)| index)
            .collect();
        if !pending.is_empty() {
            warn!(
                "[{}] Falling back to serial execution for {} tasks",
                self.name,
                pending.len()
            );
            for index in pending {
                slots[index] = Some(run_one(task(items[index].clone()), Some(self.timeout)).await);
            }
        }

        slots
    }
}

async fn run_one<T, Fut>(fut: Fut, timeout: Option<Duration>) -> TaskOutcome<T>
where
    Fut: Future<Output = Option<T>>,
{
    let guarded = AssertUnwindSafe(fut).catch_unwind();
    let result = match timeout {
        Some(limit) => match tokio::time::timeout(limit, guarded).await {
            Ok(result) => result,
            Err(_) => return TaskOutcome::TimedOut,
        },
        None => guarded.await,
    };

    match result {
        Ok(Some(value)) => TaskOutcome::Succeeded(value),
        Ok(None) => TaskOutcome::Failed(AppError::Pool("task produced no result".to_string())),
        Err(_) => TaskOutcome::Failed(AppError::Pool("task panicked".to_string())),
    }
}
