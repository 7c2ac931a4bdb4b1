use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::entities::{UserGroupRecord, UserRecord};

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AdminUserResponse {
    pub id: String,
    pub name: Option<String>,
    pub email: String,
    pub role: String,
    pub is_active: bool,
    pub user_group_id: Option<String>,
    /// The group the user belongs to, `null` when none.
    pub user_group: Option<UserGroupRef>,
    pub created_at: String,
    pub updated_at: String,
    #[serde(rename = "_count")]
    pub count: UserCounts,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct UserGroupRef {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserCounts {
    pub chats: i64,
    /// Only computed for the single-user view.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chat_groups: Option<i64>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub user_group_id: Option<String>,
}

/// Partial update; `userGroupId` uses a nested `Option` so that an explicit
/// `null` detaches the user from its group while an absent field leaves the
/// membership alone.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub is_active: Option<bool>,
    #[serde(default, deserialize_with = "crate::schemas::double_option")]
    #[schema(value_type = Option<String>)]
    pub user_group_id: Option<Option<String>>,
}

impl UserRecord {
    /// Admin view of a user row.  `group` is the resolved membership (if
    /// any); `chat_groups` is only passed for the single-user view.
    pub fn to_admin_response(
        &self,
        group: Option<&UserGroupRecord>,
        chats: i64,
        chat_groups: Option<i64>,
    ) -> AdminUserResponse {
        AdminUserResponse {
            id: self.id.clone(),
            name: self.name.clone(),
            email: self.email.clone(),
            role: self.role.clone(),
            is_active: self.is_active,
            user_group_id: self.group_id.clone(),
            user_group: group.map(|g| UserGroupRef {
                id: g.id.clone(),
                name: g.name.clone(),
            }),
            created_at: self.created_at.to_rfc3339(),
            updated_at: self.updated_at.to_rfc3339(),
            count: UserCounts {
                chats,
                chat_groups,
            },
        }
    }
}
