// Copyright 2025 Kirky.X
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use crate::utils::errors::FetchError;
use async_trait::async_trait;
use bytes::Bytes;
use std::collections::HashMap;
use thiserror::Error;

/// 引擎错误类型
#[derive(Error, Debug)]
pub enum EngineError {
    /// 请求失败
    #[error("Request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),
    /// 超时
    #[error("Timeout")]
    Timeout,
}

impl EngineError {
    /// 判断错误是否可重试
    ///
    /// # 返回值
    ///
    /// 如果错误是可重试的则返回true，否则返回false
    pub fn is_retryable(&self) -> bool {
        match self {
            EngineError::RequestFailed(e) => !e.is_builder(),
            EngineError::Timeout => true,
        }
    }
}

impl From<EngineError> for FetchError {
    fn from(err: EngineError) -> Self {
        if err.is_retryable() {
            FetchError::TransientNetwork(err.to_string())
        } else {
            FetchError::InvalidTarget(err.to_string())
        }
    }
}

/// 上游响应
///
/// 传输层只负责取回字节，状态码的语义由 Fetcher 判定。
#[derive(Debug, Clone)]
pub struct UpstreamResponse {
    /// HTTP状态码
    pub status: u16,
    /// 响应头（键为小写）
    pub headers: HashMap<String, String>,
    /// 响应内容
    pub body: Bytes,
}

impl UpstreamResponse {
    pub fn new(status: u16, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            headers: HashMap::new(),
            body: body.into(),
        }
    }

    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// 上游客户端特质
#[async_trait]
pub trait UpstreamClient: Send + Sync {
    /// 获取目标资源
    async fn get(&self, url: &str) -> Result<UpstreamResponse, EngineError>;

    /// 引擎名称
    fn name(&self) -> &'static str;
}
