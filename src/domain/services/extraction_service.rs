// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use scraper::{Html, Selector};
use thiserror::Error;

/// 提取错误类型
#[derive(Error, Debug)]
pub enum ExtractError {
    /// 选择器无效
    #[error("Invalid selector {0}")]
    InvalidSelector(String),
}

/// 结构化提取结果
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extraction {
    pub title: String,
    pub body_text: String,
    pub links: Vec<String>,
}

/// 结构化提取器特质
///
/// 每次调用都必须只依赖本次输入；实现不得在调用之间累积状态。
pub trait Extractor: Send + Sync {
    fn extract(&self, body: &[u8]) -> Result<Extraction, ExtractError>;
}

/// 提取服务
///
/// 基于 `scraper` 从 HTML 中提取标题、正文文本与链接。
#[derive(Debug, Clone, Copy, Default)]
pub struct ExtractionService;

impl ExtractionService {
    fn selector(css: &str) -> Result<Selector, ExtractError> {
        Selector::parse(css).map_err(|e| ExtractError::InvalidSelector(format!("{}: {}", css, e)))
    }
}

impl Extractor for ExtractionService {
    fn extract(&self, body: &[u8]) -> Result<Extraction, ExtractError> {
        let html = String::from_utf8_lossy(body);

        // Parsed per call; the document never outlives this function.
        let document = Html::parse_document(&html);
        let title_selector = Self::selector("title")?;
        let body_selector = Self::selector("body")?;
        let link_selector = Self::selector("a[href]")?;

        let title = document
            .select(&title_selector)
            .next()
            .map(|element| element.text().collect::<String>().trim().to_string())
            .unwrap_or_default();

        let body_text = document
            .select(&body_selector)
            .next()
            .map(|element| element.text().collect::<String>().trim().to_string())
            .unwrap_or_default();

        let links = document
            .select(&link_selector)
            .filter_map(|element| element.value().attr("href"))
            .map(|href| href.trim().to_string())
            .filter(|href| !href.is_empty())
            .collect();

        Ok(Extraction {
            title,
            body_text,
            links,
        })
    }
}
