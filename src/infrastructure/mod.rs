// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 基础设施层模块
///
/// 包含的子模块：
/// - 指标（metrics）：Prometheus 指标导出
/// - 仓库实现（repositories）：领域存储接口的具体实现
///
/// 基础设施层依赖于领域层的抽象接口，而不是相反。
pub mod metrics;
pub mod repositories;
