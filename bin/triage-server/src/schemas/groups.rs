use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::entities::ChatGroupRecord;

/// A chat group with its chat ids and nested subgroups.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GroupNode {
    pub id: String,
    pub name: String,
    pub color: Option<String>,
    pub parent_id: Option<String>,
    pub created_at: String,
    pub updated_at: String,
    pub chats: Vec<GroupChatRef>,
    #[schema(no_recursion)]
    pub children: Vec<GroupNode>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct GroupChatRef {
    pub id: String,
}

/// Flat group shape for create/update responses.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GroupResponse {
    pub id: String,
    pub name: String,
    pub color: Option<String>,
    pub parent_id: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateGroupRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub parent_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct UpdateGroupRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
}

impl ChatGroupRecord {
    pub fn to_response(&self) -> GroupResponse {
        GroupResponse {
            id: self.id.clone(),
            name: self.name.clone(),
            color: self.color.clone(),
            parent_id: self.parent_id.clone(),
            created_at: self.created_at.to_rfc3339(),
            updated_at: self.updated_at.to_rfc3339(),
        }
    }
}
