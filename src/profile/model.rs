// SPDX-FileCopyrightText: 2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use serde::{Deserialize, Serialize};
use tabled::Tabled;
use validator::Validate;

use crate::error::Result;

/// A role the user holds within a company.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Tabled)]
#[serde(rename_all = "camelCase")]
pub struct Role {
    #[tabled(rename = "ID")]
    pub id: String,
    #[tabled(rename = "Role")]
    pub role: String,
    #[tabled(rename = "Company ID")]
    pub company_id: String,
    #[tabled(rename = "Company")]
    pub company_name: String,
}

/// The authenticated principal, as returned by the session-info endpoint.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    #[validate(email)]
    pub email: String,
    #[validate(email)]
    pub company_email: String,
    pub subscription_type: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub is_verified: bool,
    pub is_blocked: bool,
    pub is_invited: Option<bool>,
    #[validate(length(min = 1, message = "user profile does not carry any role assignments"))]
    pub roles: Vec<Role>,
}

impl UserProfile {
    /// Parses and validates a session-info payload.
    pub fn from_json(payload: &[u8]) -> Result<Self> {
        let profile: Self = serde_json::from_slice(payload)?;
        profile.validate()?;
        Ok(profile)
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_owned()
    }

    /// The company the user acts for by default.
    pub fn company_id(&self) -> Option<&str> {
        self.roles.first().map(|role| role.company_id.as_str())
    }

    /// Shallow-merges every field present in `patch`.
    pub fn apply(&mut self, patch: ProfilePatch) {
        if let Some(value) = patch.id {
            self.id = value;
        }
        if let Some(value) = patch.first_name {
            self.first_name = value;
        }
        if let Some(value) = patch.last_name {
            self.last_name = value;
        }
        if let Some(value) = patch.email {
            self.email = value;
        }
        if let Some(value) = patch.company_email {
            self.company_email = value;
        }
        if let Some(value) = patch.subscription_type {
            self.subscription_type = value;
        }
        if let Some(value) = patch.start_date {
            self.start_date = value;
        }
        if let Some(value) = patch.end_date {
            self.end_date = value;
        }
        if let Some(value) = patch.is_verified {
            self.is_verified = value;
        }
        if let Some(value) = patch.is_blocked {
            self.is_blocked = value;
        }
        if let Some(value) = patch.is_invited {
            self.is_invited = value;
        }
        if let Some(value) = patch.roles {
            self.roles = value;
        }
    }
}

/// A partial profile update. Absent fields leave the held value untouched;
/// nullable fields take `Some(None)` to be cleared.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProfilePatch {
    pub id: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub company_email: Option<String>,
    #[serde(deserialize_with = "present")]
    pub subscription_type: Option<Option<String>>,
    #[serde(deserialize_with = "present")]
    pub start_date: Option<Option<String>>,
    #[serde(deserialize_with = "present")]
    pub end_date: Option<Option<String>>,
    pub is_verified: Option<bool>,
    pub is_blocked: Option<bool>,
    #[serde(deserialize_with = "present")]
    pub is_invited: Option<Option<bool>>,
    pub roles: Option<Vec<Role>>,
}

/// Distinguishes an explicit `null` from an absent field.
fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}


#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::error::{self, Error};

    #[test]
    fn session_info_payload_parses() {
        let payload = json!({
            "id": "1",
            "firstName": "A",
            "lastName": "Organizer",
            "email": "a@example.com",
            "companyEmail": "events@example.com",
            "subscriptionType": null,
            "startDate": null,
            "endDate": null,
            "isVerified": true,
            "isBlocked": false,
            "isInvited": null,
            "roles": [{
                "id": "r1",
                "role": "ADMIN",
                "companyId": "c42",
                "companyName": "Example Events"
            }]
        });

        let profile = UserProfile::from_json(payload.to_string().as_bytes()).unwrap();
        assert_eq!(profile.full_name(), "A Organizer");
        assert_eq!(profile.company_id(), Some("c42"));
        assert_eq!(profile.subscription_type, None);
    }

    #[test]
    fn missing_fields_are_rejected() {
        let mut payload = fixtures::profile_json();
        _ = payload.as_object_mut().unwrap().remove("isBlocked");
        let err = UserProfile::from_json(payload.to_string().as_bytes()).unwrap_err();
        assert!(matches!(err, Error::Validation(error::Validation::Json(_))));
    }

    #[test]
    fn empty_roles_are_rejected() {
        let mut payload = fixtures::profile_json();
        payload["roles"] = json!([]);
        let err = UserProfile::from_json(payload.to_string().as_bytes()).unwrap_err();
        match err {
            Error::Validation(e) => assert!(e.concerns_only("roles")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn malformed_emails_are_rejected() {
        for email in ["", "a", "@example.com", "a@b@c.com", "a b@example.com"] {
            let mut profile = fixtures::profile();
            profile.company_email = email.to_owned();
            let err = error::Validation::from(profile.validate().unwrap_err());
            assert!(err.concerns_only("company_email"), "{email:?}");
        }

        let mut profile = fixtures::profile();
        profile.email = "first.last@mail.example.com".to_owned();
        assert!(profile.validate().is_ok());
    }

    #[test]
    fn patches_merge_shallowly() {
        let mut profile = fixtures::profile();
        let patch: ProfilePatch = serde_json::from_value(json!({
            "firstName": "B",
            "subscriptionType": null
        }))
        .unwrap();

        profile.apply(patch);
        assert_eq!(profile.first_name, "B");
        assert_eq!(profile.subscription_type, None);
        assert_eq!(profile.last_name, "Organizer");
        assert_eq!(profile.roles.len(), 1);
    }

    #[test]
    fn absent_nullable_fields_are_kept() {
        let mut profile = fixtures::profile();
        profile.apply(ProfilePatch {
            last_name: Some("Planner".to_owned()),
            ..ProfilePatch::default()
        });
        assert_eq!(profile.subscription_type.as_deref(), Some("PREMIUM"));
        assert_eq!(profile.last_name, "Planner");
    }
}
