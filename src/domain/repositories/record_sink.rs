// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::enrichment::EnrichmentRecord;
use async_trait::async_trait;
use thiserror::Error;

/// 存储错误类型
#[derive(Error, Debug)]
pub enum SinkError {
    #[error("存储不可用: {0}")]
    Unavailable(String),

    #[error("记录被拒绝: {0}")]
    Rejected(String),
}

/// 富化记录存储特质
///
/// 存储方拥有记录的持久化生命周期；流水线不会重试存储调用。
#[async_trait]
pub trait RecordSink: Send + Sync {
    /// 存储候选人部分
    async fn store_candidate(&self, record: &EnrichmentRecord) -> Result<(), SinkError>;
    /// 存储职位部分
    async fn store_job(&self, record: &EnrichmentRecord) -> Result<(), SinkError>;
}
