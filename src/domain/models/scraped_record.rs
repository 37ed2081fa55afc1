// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use serde::{Deserialize, Serialize};

/// 抓取记录
///
/// 每个输入URL对应一条结构化提取结果，批次完成后归调用方所有。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScrapedRecord {
    /// 来源URL
    pub url: String,
    /// 页面标题
    pub title: String,
    /// 正文文本
    pub body: String,
    /// 外链（按文档顺序）
    pub links: Vec<String>,
}
