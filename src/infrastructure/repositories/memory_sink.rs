// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::enrichment::{Candidate, EnrichmentRecord, Job};
use crate::domain::repositories::record_sink::{RecordSink, SinkError};
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::debug;

/// 内存存储实现
///
/// 状态归实例所有，克隆后共享同一份数据。
#[derive(Clone, Default)]
pub struct InMemorySink {
    candidates: Arc<DashMap<String, Candidate>>,
    jobs: Arc<DashMap<String, Job>>,
    unavailable: Arc<AtomicBool>,
}

impl InMemorySink {
    /// 创建新的内存存储
    pub fn new() -> Self {
        Self::default()
    }

    /// 切换可用状态，不可用时所有写入返回 [`SinkError::Unavailable`]
    pub fn set_available(&self, available: bool) {
        self.unavailable.store(!available, Ordering::SeqCst);
    }

    pub fn candidate(&self, id: &str) -> Option<Candidate> {
        self.candidates.get(id).map(|entry| entry.value().clone())
    }

    pub fn job(&self, id: &str) -> Option<Job> {
        self.jobs.get(id).map(|entry| entry.value().clone())
    }

    pub fn candidate_count(&self) -> usize {
        self.candidates.len()
    }

    pub fn job_count(&self) -> usize {
        self.jobs.len()
    }

    fn ensure_available(&self) -> Result<(), SinkError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(SinkError::Unavailable("in-memory sink disabled".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl RecordSink for InMemorySink {
    async fn store_candidate(&self, record: &EnrichmentRecord) -> Result<(), SinkError> {
        self.ensure_available()?;
        if record.candidate.id.is_empty() {
            return Err(SinkError::Rejected("candidate without id".to_string()));
        }

        debug!("Storing candidate_{}", record.candidate.id);
        self.candidates
            .insert(record.candidate.id.clone(), record.candidate.clone());
        Ok(())
    }

    async fn store_job(&self, record: &EnrichmentRecord) -> Result<(), SinkError> {
        self.ensure_available()?;
        if record.job.id.is_empty() {
            return Err(SinkError::Rejected("job without id".to_string()));
        }

        debug!("Storing job_{}", record.job.id);
        self.jobs.insert(record.job.id.clone(), record.job.clone());
        Ok(())
    }
}
