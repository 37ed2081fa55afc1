// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::utils::errors::GroupError;
use futures::FutureExt;
use metrics::counter;
use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// 单个任务的终止状态
enum TaskOutcome<T, E> {
    Completed(Result<T, E>),
    Panicked(String),
    /// 取消信号先于启动到达，操作从未被调用
    Skipped,
}

/// 并发任务组
///
/// 以有限并发运行一组相互独立的操作，按输入下标收集结果。
///
/// - 全部成功时，`results[i]` 对应 `inputs[i]`，与完成顺序无关；
/// - 任一任务失败时，发出取消信号：尚未启动的任务不再启动，已在运行的任务允许自然结束
///   （结果被丢弃），然后返回**时间上最先被观察到**的错误，而不是下标最小的错误；
/// - 返回前等待所有已启动任务结束，不会遗留后台任务。
///
/// 任务组本身从不重试。
#[derive(Clone, Debug)]
pub struct TaskGroup {
    /// 名称（用于日志与指标）
    name: String,
    /// 最大并发数，0 表示不限制
    concurrency_cap: usize,
}

impl TaskGroup {
    /// 创建新的任务组
    ///
    /// # 参数
    ///
    /// * `name` - 任务组名称
    /// * `concurrency_cap` - 最大并发数，0 表示不限制
    pub fn new(name: impl Into<String>, concurrency_cap: usize) -> Self {
        Self {
            name: name.into(),
            concurrency_cap,
        }
    }

    /// 创建不限并发的任务组
    pub fn unbounded(name: impl Into<String>) -> Self {
        Self::new(name, 0)
    }

    /// 运行任务组
    ///
    /// # 参数
    ///
    /// * `inputs` - 有序输入，下标即任务标识
    /// * `op` - 每个输入调用恰好一次的操作；第二个参数是任务组的取消令牌，
    ///   支持协作取消的操作（如 Fetcher）应当遵守它
    ///
    /// # 返回值
    ///
    /// * `Ok(Vec<T>)` - 与输入等长且顺序一致的结果
    /// * `Err(GroupError)` - 最先观察到的失败
    pub async fn run<I, T, E, F, Fut>(&self, inputs: Vec<I>, op: F) -> Result<Vec<T>, GroupError<E>>
    where
        I: Send + 'static,
        T: Send + 'static,
        E: std::error::Error + Send + 'static,
        F: Fn(I, CancellationToken) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
    {
        self.run_with_cancel(inputs, &CancellationToken::new(), op)
            .await
    }

    /// 在外部取消令牌下运行任务组
    ///
    /// `parent` 被取消时，尚未启动的任务不再启动；若因此没有得到完整结果，
    /// 返回 [`GroupError::Cancelled`]。
    pub async fn run_with_cancel<I, T, E, F, Fut>(
        &self,
        inputs: Vec<I>,
        parent: &CancellationToken,
        op: F,
    ) -> Result<Vec<T>, GroupError<E>>
    where
        I: Send + 'static,
        T: Send + 'static,
        E: std::error::Error + Send + 'static,
        F: Fn(I, CancellationToken) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
    {
        let total = inputs.len();
        if total == 0 {
            return Ok(Vec::new());
        }

        counter!("task_group_runs_total", "group" => self.name.clone()).increment(1);
        debug!(
            "Task group {} starting {} tasks (cap {})",
            self.name, total, self.concurrency_cap
        );
        let started = Instant::now();

        let cancel = parent.child_token();
        let semaphore = (self.concurrency_cap > 0)
            .then(|| Arc::new(Semaphore::new(self.concurrency_cap)));
        let op = Arc::new(op);

        let mut set = JoinSet::new();
        for (index, input) in inputs.into_iter().enumerate() {
            let op = op.clone();
            let cancel = cancel.clone();
            let semaphore = semaphore.clone();

            set.spawn(async move {
                let _permit = match semaphore {
                    Some(semaphore) => tokio::select! {
                        biased;
                        _ = cancel.cancelled() => return (index, TaskOutcome::Skipped),
                        permit = semaphore.acquire_owned() => match permit {
                            Ok(permit) => Some(permit),
                            Err(_) => return (index, TaskOutcome::Skipped),
                        },
                    },
                    None => None,
                };

                if cancel.is_cancelled() {
                    return (index, TaskOutcome::Skipped);
                }

                let outcome = match AssertUnwindSafe(op(input, cancel.clone()))
                    .catch_unwind()
                    .await
                {
                    Ok(result) => TaskOutcome::Completed(result),
                    Err(payload) => TaskOutcome::Panicked(panic_message(payload.as_ref())),
                };

                // Cancel before the permit is released so no waiter can slip in.
                if !matches!(outcome, TaskOutcome::Completed(Ok(_))) {
                    cancel.cancel();
                }
                (index, outcome)
            });
        }

        // Slots are addressed by index, so each task owns exactly one of them.
        let mut slots: Vec<Option<T>> = std::iter::repeat_with(|| None).take(total).collect();
        let mut first_error: Option<GroupError<E>> = None;
        let mut skipped = 0usize;

        while let Some(joined) = set.join_next().await {
            let (index, outcome) = match joined {
                Ok(joined) => joined,
                Err(join_error) => {
                    if first_error.is_none() {
                        first_error = Some(GroupError::Join(join_error.to_string()));
                        cancel.cancel();
                    }
                    continue;
                }
            };

            match outcome {
                TaskOutcome::Completed(Ok(value)) => {
                    if first_error.is_none() {
                        slots[index] = Some(value);
                    } else {
                        debug!(
                            "Task group {}: discarding result of task {} after failure",
                            self.name, index
                        );
                    }
                }
                TaskOutcome::Completed(Err(error)) => {
                    if first_error.is_none() {
                        warn!(
                            "Task group {}: task {} failed, cancelling remaining tasks: {}",
                            self.name, index, error
                        );
                        first_error = Some(GroupError::TaskFailed {
                            index,
                            source: error,
                        });
                        cancel.cancel();
                    } else {
                        debug!(
                            "Task group {}: ignoring later failure of task {}: {}",
                            self.name, index, error
                        );
                    }
                }
                TaskOutcome::Panicked(message) => {
                    if first_error.is_none() {
                        warn!(
                            "Task group {}: task {} panicked: {}",
                            self.name, index, message
                        );
                        first_error = Some(GroupError::TaskPanicked { index, message });
                        cancel.cancel();
                    }
                }
                TaskOutcome::Skipped => skipped += 1,
            }
        }

        if let Some(error) = first_error {
            counter!("task_group_failures_total", "group" => self.name.clone()).increment(1);
            debug!(
                "Task group {} failed after {:?} ({} tasks never started)",
                self.name,
                started.elapsed(),
                skipped
            );
            return Err(error);
        }

        debug!(
            "Task group {} completed {} tasks in {:?}",
            self.name,
            total,
            started.elapsed()
        );

        slots
            .into_iter()
            .collect::<Option<Vec<T>>>()
            .ok_or(GroupError::Cancelled)
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
