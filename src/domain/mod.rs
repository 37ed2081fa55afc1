// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域层模块
///
/// 该模块包含系统的核心业务逻辑，包括：
/// - 领域模型（models）：通知、富化记录与抓取记录
/// - 仓库接口（repositories）：记录存储抽象接口
/// - 服务（services）：富化流水线、批量抓取与内容提取
///
/// 领域层不依赖于任何具体的存储或传输实现。
pub mod models;
pub mod repositories;
pub mod services;
