//! sw_notification_click tool implementation.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use swcache_worker::{ClickOutcome, NotificationClick};

use super::{WorkerContext, json_result};

/// Parameters for the sw_notification_click tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwNotificationClickParams {
    /// Id of the clicked notification, as returned by sw_push.
    #[serde(default)]
    pub notification_id: Option<String>,

    /// Action button that was clicked ("view" or "close"); omit for the body.
    #[serde(default)]
    pub action: Option<String>,
}

#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct SwNotificationClickOutput {
    pub outcome: ClickOutcome,
}

/// Implementation of the sw_notification_click tool.
pub async fn click_impl(ctx: &WorkerContext, params: SwNotificationClickParams) -> Result<CallToolResult, McpError> {
    let click = NotificationClick { notification_id: params.notification_id, action: params.action };
    let outcome = ctx.manager.notification_click(click).await?;
    json_result(&SwNotificationClickOutput { outcome })
}
