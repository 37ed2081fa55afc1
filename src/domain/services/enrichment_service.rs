// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::enrichment::{Candidate, EnrichmentRecord, Job};
use crate::domain::models::notification::ApplicationNotification;
use crate::domain::repositories::record_sink::{RecordSink, SinkError};
use crate::engines::fetcher::Fetcher;
use crate::utils::errors::{FetchError, GroupError};
use crate::workers::task_group::TaskGroup;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

/// 流水线状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineState {
    Received,
    Fetching,
    FetchFailed,
    Fetched,
    Storing,
    StoreFailed,
    Completed,
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            PipelineState::Received => "received",
            PipelineState::Fetching => "fetching",
            PipelineState::FetchFailed => "fetch_failed",
            PipelineState::Fetched => "fetched",
            PipelineState::Storing => "storing",
            PipelineState::StoreFailed => "store_failed",
            PipelineState::Completed => "completed",
        };
        f.write_str(label)
    }
}

/// 流水线错误类型
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Invalid notification: {0}")]
    InvalidNotification(String),

    #[error("Could not retrieve upstream data: {0}")]
    Fetch(#[source] GroupError<FetchError>),

    #[error("Could not persist data: {0}")]
    Store(#[source] GroupError<SinkError>),
}

impl PipelineError {
    /// 错误发生时流水线所处的终止状态
    pub fn state(&self) -> PipelineState {
        match self {
            PipelineError::InvalidNotification(_) => PipelineState::Received,
            PipelineError::Fetch(_) => PipelineState::FetchFailed,
            PipelineError::Store(_) => PipelineState::StoreFailed,
        }
    }

    /// 抓取阶段是否因限流耗尽而失败
    pub fn is_rate_limited(&self) -> bool {
        match self {
            PipelineError::Fetch(group) => group
                .task_error()
                .map(FetchError::is_rate_limited)
                .unwrap_or(false),
            _ => false,
        }
    }
}

/// 流水线运行结果
#[derive(Debug, Clone, Serialize)]
pub struct PipelineOutcome {
    pub state: PipelineState,
    pub record: EnrichmentRecord,
}

#[derive(Debug, Clone)]
enum FetchTarget {
    Candidate(String),
    Job(String),
}

#[derive(Debug)]
enum Fetched {
    Candidate(Candidate),
    Job(Job),
}

#[derive(Debug, Clone, Copy)]
enum StoreTarget {
    Candidate,
    Job,
}

/// Webhook 富化流水线
///
/// 两个阶段严格串行：先并发抓取候选人与职位，全部成功后组装记录，
/// 再并发写入存储。任一阶段失败即终止，流水线本身从不重试阶段。
#[derive(Clone)]
pub struct EnrichmentPipeline {
    fetcher: Arc<Fetcher>,
    sink: Arc<dyn RecordSink>,
    candidate_endpoint: String,
    job_endpoint: String,
}

impl EnrichmentPipeline {
    /// 创建新的富化流水线
    ///
    /// # 参数
    ///
    /// * `fetcher` - 抓取器
    /// * `sink` - 记录存储
    /// * `candidate_endpoint` - 候选人接口前缀，拼接ID后得到完整URL
    /// * `job_endpoint` - 职位接口前缀
    pub fn new(
        fetcher: Arc<Fetcher>,
        sink: Arc<dyn RecordSink>,
        candidate_endpoint: impl Into<String>,
        job_endpoint: impl Into<String>,
    ) -> Self {
        Self {
            fetcher,
            sink,
            candidate_endpoint: candidate_endpoint.into(),
            job_endpoint: job_endpoint.into(),
        }
    }

    /// 处理一条申请变更通知
    ///
    /// # 返回值
    ///
    /// * `Ok(PipelineOutcome)` - 状态为 [`PipelineState::Completed`]
    /// * `Err(PipelineError)` - 终止状态见 [`PipelineError::state`]
    pub async fn handle(
        &self,
        notification: &ApplicationNotification,
    ) -> Result<PipelineOutcome, PipelineError> {
        let hook_id = notification.hook.id.as_str();
        debug!("Pipeline {} entered state {}", hook_id, PipelineState::Received);

        let candidate_id = required_id(&notification.data.candidate, "candidate")?;
        let job_id = required_id(&notification.data.job, "job")?;

        info!("Pipeline {} entered state {}", hook_id, PipelineState::Fetching);
        let (candidate, job) = match self.fetch_stage(candidate_id, job_id).await {
            Ok(fetched) => fetched,
            Err(e) => {
                error!("Pipeline {} entered state {}: {}", hook_id, e.state(), e);
                return Err(e);
            }
        };

        let record = EnrichmentRecord::assemble(notification, candidate, job);
        debug!("Pipeline {} entered state {}", hook_id, PipelineState::Fetched);

        info!("Pipeline {} entered state {}", hook_id, PipelineState::Storing);
        let record = Arc::new(record);
        if let Err(e) = self.store_stage(record.clone()).await {
            error!("Pipeline {} entered state {}: {}", hook_id, e.state(), e);
            return Err(e);
        }

        info!("Pipeline {} entered state {}", hook_id, PipelineState::Completed);
        Ok(PipelineOutcome {
            state: PipelineState::Completed,
            record: Arc::unwrap_or_clone(record),
        })
    }

    async fn fetch_stage(
        &self,
        candidate_id: &str,
        job_id: &str,
    ) -> Result<(Candidate, Job), PipelineError> {
        let fetcher = self.fetcher.clone();
        let candidate_endpoint = self.candidate_endpoint.clone();
        let job_endpoint = self.job_endpoint.clone();

        let targets = vec![
            FetchTarget::Candidate(candidate_id.to_string()),
            FetchTarget::Job(job_id.to_string()),
        ];

        let fetched = TaskGroup::unbounded("enrichment_fetch")
            .run(targets, move |target, cancel| {
                let fetcher = fetcher.clone();
                let candidate_endpoint = candidate_endpoint.clone();
                let job_endpoint = job_endpoint.clone();
                async move {
                    match target {
                        FetchTarget::Candidate(id) => {
                            let url = format!("{}{}", candidate_endpoint, id);
                            fetch_json(&fetcher, &url, &cancel).await.map(Fetched::Candidate)
                        }
                        FetchTarget::Job(id) => {
                            let url = format!("{}{}", job_endpoint, id);
                            fetch_json(&fetcher, &url, &cancel).await.map(Fetched::Job)
                        }
                    }
                }
            })
            .await
            .map_err(PipelineError::Fetch)?;

        let mut fetched = fetched.into_iter();
        match (fetched.next(), fetched.next()) {
            (Some(Fetched::Candidate(candidate)), Some(Fetched::Job(job))) => Ok((candidate, job)),
            // Slot order follows input order, so only a cancelled run lands here.
            _ => Err(PipelineError::Fetch(GroupError::Cancelled)),
        }
    }

    async fn store_stage(&self, record: Arc<EnrichmentRecord>) -> Result<(), PipelineError> {
        let sink = self.sink.clone();

        TaskGroup::unbounded("enrichment_store")
            .run(
                vec![StoreTarget::Candidate, StoreTarget::Job],
                move |target, _cancel| {
                    let sink = sink.clone();
                    let record = record.clone();
                    async move {
                        match target {
                            StoreTarget::Candidate => sink.store_candidate(&record).await,
                            StoreTarget::Job => sink.store_job(&record).await,
                        }
                    }
                },
            )
            .await
            .map_err(PipelineError::Store)?;

        Ok(())
    }
}

fn required_id<'a>(value: &'a str, field: &str) -> Result<&'a str, PipelineError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(PipelineError::InvalidNotification(format!(
            "missing {} identifier",
            field
        )));
    }
    Ok(trimmed)
}

async fn fetch_json<T: DeserializeOwned>(
    fetcher: &Fetcher,
    url: &str,
    cancel: &CancellationToken,
) -> Result<T, FetchError> {
    let response = fetcher.fetch_with_cancel(url, cancel).await?;
    serde_json::from_slice(&response.body)
        .map_err(|e| FetchError::Malformed(format!("{}: {}", url, e)))
}
