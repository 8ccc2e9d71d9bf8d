use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockroom_auth::Role;
use stockroom_core::{AuditEntryId, UserId};

/// One immutable line of the audit trail.
///
/// `user_name` and `user_role` are joined from the users table on read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEntry {
    pub id: AuditEntryId,
    pub action: String,
    pub date: DateTime<Utc>,
    pub user_id: UserId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_role: Option<Role>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_joined_user_fields() {
        let entry = AuditEntry {
            id: AuditEntryId::new(1),
            action: "Logged in".into(),
            date: Utc::now(),
            user_id: UserId::new(3),
            user_name: Some("Tom Chen".into()),
            user_role: Some(Role::Viewer),
        };
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["userId"], 3);
        assert_eq!(json["userName"], "Tom Chen");
        assert_eq!(json["userRole"], "Viewer");
    }
}
