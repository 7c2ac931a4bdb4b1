use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::entities::{UserGroupRecord, UserRecord};

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AdminGroupResponse {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub created_at: String,
    pub updated_at: String,
    #[serde(rename = "_count")]
    pub count: GroupCounts,
    /// Member list, only populated for the single-group view.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub users: Option<Vec<GroupMember>>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct GroupCounts {
    pub users: i64,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GroupMember {
    pub id: String,
    pub name: Option<String>,
    pub email: String,
    pub role: String,
    pub is_active: bool,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateUserGroupRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// Partial update; `description` accepts an explicit `null` to clear it.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct UpdateUserGroupRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "crate::schemas::double_option")]
    #[schema(value_type = Option<String>)]
    pub description: Option<Option<String>>,
}

impl UserGroupRecord {
    pub fn to_admin_response(
        &self,
        member_count: i64,
        members: Option<Vec<GroupMember>>,
    ) -> AdminGroupResponse {
        AdminGroupResponse {
            id: self.id.clone(),
            name: self.name.clone(),
            description: self.description.clone(),
            created_at: self.created_at.to_rfc3339(),
            updated_at: self.updated_at.to_rfc3339(),
            count: GroupCounts {
                users: member_count,
            },
            users: members,
        }
    }
}

impl UserRecord {
    pub fn to_member(&self) -> GroupMember {
        GroupMember {
            id: self.id.clone(),
            name: self.name.clone(),
            email: self.email.clone(),
            role: self.role.clone(),
            is_active: self.is_active,
        }
    }
}
