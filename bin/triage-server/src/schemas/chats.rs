use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::entities::{ChatRecord, MessageRecord};

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChatResponse {
    pub id: String,
    pub title: String,
    pub user_id: String,
    pub model_name: String,
    pub group_id: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ChatListResponse {
    pub chats: Vec<ChatResponse>,
}

/// Chat plus its full transcript, oldest message first.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ChatDetailResponse {
    #[serde(flatten)]
    pub chat: ChatResponse,
    pub messages: Vec<MessageResponse>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MessageResponse {
    pub id: String,
    pub chat_id: String,
    pub role: String,
    pub content: String,
    pub created_at: String,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateChatRequest {
    #[serde(default)]
    pub model_name: Option<String>,
    #[serde(default)]
    pub group_id: Option<String>,
}

/// Partial update.  `groupId` distinguishes "absent" (leave as is) from
/// `null` (detach from its group), hence the nested `Option`.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateChatRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub model_name: Option<String>,
    #[serde(default, deserialize_with = "crate::schemas::double_option")]
    #[schema(value_type = Option<String>)]
    pub group_id: Option<Option<String>>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct BulkMessagesRequest {
    /// A missing array is treated like an empty one (rejected with 400, not
    /// a deserialization error).
    #[serde(default)]
    pub messages: Vec<IncomingMessage>,
}

/// One entry of a bulk transcript save; blank or missing content is dropped.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct IncomingMessage {
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BulkSaveResponse {
    pub success: bool,
    pub count: usize,
}

impl ChatRecord {
    pub fn to_response(&self) -> ChatResponse {
        ChatResponse {
            id: self.id.clone(),
            title: self.title.clone(),
            user_id: self.user_id.clone(),
            model_name: self.model_name.clone(),
            group_id: self.group_id.clone(),
            created_at: self.created_at.to_rfc3339(),
            updated_at: self.updated_at.to_rfc3339(),
        }
    }
}

impl MessageRecord {
    pub fn to_response(&self) -> MessageResponse {
        MessageResponse {
            id: self.id.clone(),
            chat_id: self.chat_id.clone(),
            role: self.role.clone(),
            content: self.content.clone(),
            created_at: self.created_at.to_rfc3339(),
        }
    }
}
