//! Bounded concurrent task execution
//!
//! A fixed number of workers pull tasks by index from a shared counter.
//! Every task runs exactly once and its result lands in the slot matching
//! its input position, whatever order the tasks finish in.

use futures::future::join_all;
use futures::FutureExt;
use std::fmt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};
use tracing::debug;

use crate::utils::panic_message;

/// Why a scheduled task produced no value
#[derive(Debug, Clone, PartialEq)]
pub enum TaskError<E> {
    /// The task returned an error
    Failed(E),
    /// The task panicked; holds the panic message
    Panicked(String),
}

impl<E: fmt::Display> fmt::Display for TaskError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskError::Failed(err) => write!(f, "{}", err),
            TaskError::Panicked(message) => write!(f, "task panicked: {}", message),
        }
    }
}

impl<E: fmt::Debug + fmt::Display> std::error::Error for TaskError<E> {}

pub type TaskResult<T, E> = Result<T, TaskError<E>>;

/// Run `tasks` with at most `limit` in flight
///
/// A `limit` of zero is treated as one. The returned vector has one entry
/// per task, in input order.
pub async fn run_concurrent<T, E, F, Fut>(tasks: Vec<F>, limit: usize) -> Vec<TaskResult<T, E>>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let total = tasks.len();
    if total == 0 {
        return Vec::new();
    }

    let workers = limit.max(1).min(total);
    debug!("Scheduling {} tasks on {} workers", total, workers);

    let slots: Vec<Mutex<Option<F>>> = tasks.into_iter().map(|t| Mutex::new(Some(t))).collect();
    let next = AtomicUsize::new(0);
    let slots = &slots;
    let next = &next;

    let worker = move |_id: usize| {
        async move {
            let mut done = Vec::new();
            loop {
                let index = next.fetch_add(1, Ordering::SeqCst);
                if index >= total {
                    break;
                }
                let task = slots[index]
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .take();
                let Some(task) = task else {
                    continue;
                };

                let result = match AssertUnwindSafe(async move { task().await })
                    .catch_unwind()
                    .await
                {
                    Ok(Ok(value)) => Ok(value),
                    Ok(Err(err)) => Err(TaskError::Failed(err)),
                    Err(payload) => Err(TaskError::Panicked(panic_message(payload.as_ref()))),
                };
                done.push((index, result));
            }
            done
        }
    };

    let mut collected: Vec<(usize, TaskResult<T, E>)> = join_all((0..workers).map(worker))
        .await
        .into_iter()
        .flatten()
        .collect();
    collected.sort_by_key(|(index, _)| *index);
    collected.into_iter().map(|(_, result)| result).collect()
}
