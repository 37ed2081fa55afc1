// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 配置模块
///
/// 处理应用程序的配置设置和环境变量
pub mod config;

/// 领域模块
///
/// 包含通知与富化记录模型、存储接口以及富化和批量抓取服务
pub mod domain;

/// 引擎模块
///
/// 上游HTTP客户端、按目标限流器以及带重试的抓取器
pub mod engines;

/// 基础设施模块
///
/// 提供存储实现与指标导出
pub mod infrastructure;

/// 表示层模块
///
/// 处理HTTP请求和响应，包括路由和处理器
pub mod presentation;

/// 工具模块
///
/// 提供错误类型、重试策略与日志初始化
pub mod utils;

/// 工作器模块
///
/// 实现有界并发的任务组
pub mod workers;
