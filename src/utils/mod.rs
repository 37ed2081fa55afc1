// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 工具模块
///
/// - 错误类型（errors）：抓取与任务组错误
/// - 重试策略（retry_policy）：指数退避与重试判定
/// - 遥测（telemetry）：日志初始化
pub mod errors;
pub mod retry_policy;
pub mod telemetry;
