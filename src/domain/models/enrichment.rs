// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::notification::ApplicationNotification;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 候选人（上游完整数据）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    #[serde(alias = "ID")]
    pub id: String,
    #[serde(alias = "FullName", alias = "fullName", default)]
    pub full_name: String,
    #[serde(alias = "Email", default)]
    pub email: String,
}

/// 职位（上游完整数据）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job {
    #[serde(alias = "ID")]
    pub id: String,
    #[serde(alias = "Name", default)]
    pub name: String,
    #[serde(alias = "Description", default)]
    pub description: String,
}

/// 富化记录
///
/// 由两次抓取结果与通知中的关联字段合并而成；创建后不可变，交给存储阶段后即被丢弃。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichmentRecord {
    /// 触发本次富化的钩子ID
    pub hook_id: String,
    /// 动作标签
    pub action: String,
    /// 关联账户
    pub linked_account: String,
    /// 申请ID
    pub application_id: String,
    /// 申请的远端ID
    pub remote_id: String,
    /// 当前阶段
    pub current_stage: String,
    pub candidate: Candidate,
    pub job: Job,
    /// 富化完成时间
    pub enriched_at: DateTime<Utc>,
}

impl EnrichmentRecord {
    /// 组装富化记录
    pub fn assemble(notification: &ApplicationNotification, candidate: Candidate, job: Job) -> Self {
        Self {
            hook_id: notification.hook.id.clone(),
            action: notification.hook.action.clone(),
            linked_account: notification.linked_account.clone(),
            application_id: notification.data.id.clone(),
            remote_id: notification.data.remote_id.clone(),
            current_stage: notification.data.current_stage.clone(),
            candidate,
            job,
            enriched_at: Utc::now(),
        }
    }
}
