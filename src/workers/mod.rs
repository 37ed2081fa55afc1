// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 工作器模块
///
/// 提供有界并发的任务组执行：按下标收集结果、首个失败即取消其余任务
pub mod task_group;

pub use task_group::TaskGroup;
