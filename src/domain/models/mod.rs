// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域模型模块
///
/// 该模块定义了系统的核心业务实体，包括：
/// - 通知（notification）：Webhook 传入的变更通知
/// - 富化记录（enrichment）：候选人、职位以及合并后的记录
/// - 抓取记录（scraped_record）：批量抓取的结构化结果
pub mod enrichment;
pub mod notification;
pub mod scraped_record;
