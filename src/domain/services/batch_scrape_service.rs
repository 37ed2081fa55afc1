// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::scraped_record::ScrapedRecord;
use crate::domain::services::extraction_service::{ExtractError, Extractor};
use crate::engines::fetcher::Fetcher;
use crate::utils::errors::{FetchError, GroupError};
use crate::workers::task_group::TaskGroup;
use std::sync::Arc;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument};

/// 抓取错误类型
#[derive(Error, Debug)]
pub enum ScrapeError {
    #[error("Failed to fetch {url}: {source}")]
    Fetch {
        url: String,
        #[source]
        source: FetchError,
    },
    #[error("Failed to extract {url}: {source}")]
    Extract {
        url: String,
        #[source]
        source: ExtractError,
    },
}

impl ScrapeError {
    pub fn url(&self) -> &str {
        match self {
            ScrapeError::Fetch { url, .. } | ScrapeError::Extract { url, .. } => url,
        }
    }

    pub fn fetch_error(&self) -> Option<&FetchError> {
        match self {
            ScrapeError::Fetch { source, .. } => Some(source),
            ScrapeError::Extract { .. } => None,
        }
    }
}

/// 批量抓取服务
///
/// 每个URL一个任务：抓取后立即提取，没有第二阶段。
#[derive(Clone)]
pub struct BatchScrapeService {
    fetcher: Arc<Fetcher>,
    extractor: Arc<dyn Extractor>,
    group: TaskGroup,
}

impl BatchScrapeService {
    /// 创建新的批量抓取服务
    ///
    /// # 参数
    ///
    /// * `fetcher` - 抓取器
    /// * `extractor` - 结构化提取器
    /// * `concurrency` - 批次内最大并发数，0 表示不限制
    pub fn new(fetcher: Arc<Fetcher>, extractor: Arc<dyn Extractor>, concurrency: usize) -> Self {
        Self {
            fetcher,
            extractor,
            group: TaskGroup::new("batch_scrape", concurrency),
        }
    }

    /// 抓取单个URL
    pub async fn scrape_one(&self, url: &str) -> Result<ScrapedRecord, ScrapeError> {
        scrape(&self.fetcher, self.extractor.as_ref(), url, &CancellationToken::new()).await
    }

    /// 批量抓取
    ///
    /// # 返回值
    ///
    /// * `Ok(Vec<ScrapedRecord>)` - 与输入顺序一致的记录
    /// * `Err(GroupError<ScrapeError>)` - 最先观察到的失败；其余任务的结果不会返回
    #[instrument(skip(self, urls), fields(count = urls.len()))]
    pub async fn scrape_many(
        &self,
        urls: Vec<String>,
    ) -> Result<Vec<ScrapedRecord>, GroupError<ScrapeError>> {
        let fetcher = self.fetcher.clone();
        let extractor = self.extractor.clone();

        let records = self
            .group
            .run(urls, move |url, cancel| {
                let fetcher = fetcher.clone();
                let extractor = extractor.clone();
                async move { scrape(&fetcher, extractor.as_ref(), &url, &cancel).await }
            })
            .await?;

        info!("Scraped {} urls", records.len());
        Ok(records)
    }
}

async fn scrape(
    fetcher: &Fetcher,
    extractor: &dyn Extractor,
    url: &str,
    cancel: &CancellationToken,
) -> Result<ScrapedRecord, ScrapeError> {
    let response = fetcher
        .fetch_with_cancel(url, cancel)
        .await
        .map_err(|source| ScrapeError::Fetch {
            url: url.to_string(),
            source,
        })?;

    let extraction = extractor
        .extract(&response.body)
        .map_err(|source| ScrapeError::Extract {
            url: url.to_string(),
            source,
        })?;

    Ok(ScrapedRecord {
        url: url.to_string(),
        title: extraction.title,
        body: extraction.body_text,
        links: extraction.links,
    })
}
