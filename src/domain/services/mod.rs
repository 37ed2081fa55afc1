// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域服务模块
///
/// 包含的服务：
/// - 富化服务（enrichment_service）：Webhook 通知的两阶段富化流水线
/// - 批量抓取服务（batch_scrape_service）：按URL并发抓取并提取
/// - 提取服务（extraction_service）：从 HTML 中提取标题、正文与链接
pub mod batch_scrape_service;
pub mod enrichment_service;
pub mod extraction_service;
