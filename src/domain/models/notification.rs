// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Webhook 钩子元信息
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Hook {
    /// 钩子ID
    pub id: String,
    /// 资源类型
    #[serde(default)]
    pub resource: String,
    /// 动作标签（created、updated 等）
    #[serde(default)]
    pub action: String,
    /// 目标
    #[serde(default)]
    pub target: String,
}

/// Webhook 通知载荷
///
/// 通知只携带资源的一小部分，完整数据需要从上游同步获取。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HookPayload<T> {
    pub hook: Hook,
    /// 关联账户
    #[serde(default)]
    pub linked_account: String,
    pub data: T,
}

/// 申请记录（通知中的数据部分）
///
/// `candidate` 与 `job` 是上游资源的标识符。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Application {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub remote_id: String,
    #[serde(default)]
    pub candidate: String,
    #[serde(default)]
    pub job: String,
    #[serde(default)]
    pub applied_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub rejected_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub credited_to: Option<serde_json::Value>,
    #[serde(default)]
    pub current_stage: String,
    #[serde(default)]
    pub reject_reason: Option<serde_json::Value>,
    #[serde(default)]
    pub remote_data: Option<serde_json::Value>,
}

/// 申请变更通知
pub type ApplicationNotification = HookPayload<Application>;
