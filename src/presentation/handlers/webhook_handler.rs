// Copyright 2025 Kirky.X
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use crate::domain::models::notification::ApplicationNotification;
use crate::domain::services::enrichment_service::EnrichmentPipeline;
use crate::presentation::errors::AppError;
use axum::{Extension, Json};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::info;

/// 接收申请变更通知
///
/// 同步运行富化流水线，完成后返回最终状态与富化记录。
pub async fn receive_application(
    Extension(pipeline): Extension<Arc<EnrichmentPipeline>>,
    Json(notification): Json<ApplicationNotification>,
) -> Result<Json<Value>, AppError> {
    info!(
        "Received {} notification {} for application {}",
        notification.hook.action, notification.hook.id, notification.data.id
    );

    let outcome = pipeline.handle(&notification).await?;

    Ok(Json(json!({
        "status": outcome.state,
        "hook_id": notification.hook.id,
        "record": outcome.record,
    })))
}
