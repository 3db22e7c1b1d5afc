use serde::{Deserialize, Serialize};

use super::enums::UserRole;

/// Id used for the unauthenticated "skip" session.
pub const GUEST_USER_ID: &str = "guest";

/// Signed-in user as supplied by the identity provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub name: String,
    pub role: UserRole,
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub avatar: String,
    /// Short readable id for patients, e.g. `PC-12345`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patient_display_id: Option<String>,
    /// For caregivers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linked_patient_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caregiver_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caregiver_email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caregiver_phone: Option<String>,
}

impl User {
    pub fn new(id: &str, name: &str, role: UserRole, email: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            role,
            email: email.to_string(),
            phone: String::new(),
            avatar: format!("https://i.pravatar.cc/150?u={id}"),
            patient_display_id: None,
            linked_patient_id: None,
            caregiver_name: None,
            caregiver_email: None,
            caregiver_phone: None,
        }
    }

    pub fn guest(role: UserRole) -> Self {
        let mut user = Self::new(GUEST_USER_ID, "Guest User", role, "guest@pillcare.com");
        user.phone = "+1 (555) 000-0000".into();
        match role {
            UserRole::Patient => user.patient_display_id = Some("PC-GUEST".into()),
            UserRole::Caregiver => user.linked_patient_id = Some("PC-GUEST".into()),
        }
        user
    }

    pub fn is_patient(&self) -> bool {
        self.role == UserRole::Patient
    }
}
