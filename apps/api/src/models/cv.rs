use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::user::{PublicUser, Role};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonalInfo {
    pub name: String,
    pub email: String,
    pub phone: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Education {
    pub institution: String,
    pub degree: String,
    pub year: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Experience {
    pub title: String,
    pub company: String,
    pub years: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub projects: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reference {
    pub name: String,
    pub contact_info: String,
}

/// A CV record as stored by the CRUD backend.
///
/// `personal_info` is optional on the wire: records without it can still be
/// listed, but the composer refuses to render them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cv {
    #[serde(rename = "_uuid", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub user_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub personal_info: Option<PersonalInfo>,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub education: Vec<Education>,
    #[serde(default)]
    pub experience: Vec<Experience>,
    #[serde(default)]
    pub references: Vec<Reference>,
}

impl Cv {
    /// Builds a new, not yet persisted record owned by `user_id`.
    /// Both timestamps are stamped with `now`.
    pub fn from_draft(draft: CvDraft, user_id: &str, now: DateTime<Utc>) -> Self {
        Cv {
            id: None,
            user_id: user_id.to_string(),
            created_at: now,
            updated_at: now,
            personal_info: Some(draft.personal_info),
            skills: draft.skills,
            education: draft.education,
            experience: draft.experience,
            references: draft.references,
        }
    }

    /// Admins see every CV. Everyone else sees the CVs they own, plus CVs
    /// carrying their email address.
    pub fn is_visible_to(&self, user: &PublicUser) -> bool {
        if user.role == Role::Admin {
            return true;
        }
        let owns = user.id.as_deref().is_some_and(|id| id == self.user_id);
        let same_email = self
            .personal_info
            .as_ref()
            .is_some_and(|info| info.email == user.email);
        owns || same_email
    }

    /// Returns the editable part of the record, as the create/edit form sees it.
    pub fn to_draft(&self) -> CvDraft {
        CvDraft {
            personal_info: self.personal_info.clone().unwrap_or(PersonalInfo {
                name: String::new(),
                email: String::new(),
                phone: String::new(),
            }),
            skills: self.skills.clone(),
            education: self.education.clone(),
            experience: self.experience.clone(),
            references: self.references.clone(),
        }
    }

    /// Applies a partial update locally. Used to validate the merged record
    /// before the patch is sent.
    pub fn merged_with(&self, patch: &CvPatch) -> CvDraft {
        let mut draft = self.to_draft();
        if let Some(info) = &patch.personal_info {
            draft.personal_info = info.clone();
        }
        if let Some(skills) = &patch.skills {
            draft.skills = skills.clone();
        }
        if let Some(education) = &patch.education {
            draft.education = education.clone();
        }
        if let Some(experience) = &patch.experience {
            draft.experience = experience.clone();
        }
        if let Some(references) = &patch.references {
            draft.references = references.clone();
        }
        draft
    }
}

/// The CV create form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CvDraft {
    pub personal_info: PersonalInfo,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub education: Vec<Education>,
    #[serde(default)]
    pub experience: Vec<Experience>,
    #[serde(default)]
    pub references: Vec<Reference>,
}

/// Partial CV update. Absent fields are left untouched by the backend.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CvPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub personal_info: Option<PersonalInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skills: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub education: Option<Vec<Education>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub experience: Option<Vec<Experience>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub references: Option<Vec<Reference>>,
    /// Stamped by the store on every update; clients never set it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}


#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;
    use serde_json::json;

    fn public_user(id: &str, email: &str, role: Role) -> PublicUser {
        PublicUser {
            id: Some(id.to_string()),
            name: "Someone".to_string(),
            email: email.to_string(),
            username: "someone".to_string(),
            role,
        }
    }

    #[test]
    fn test_wire_format_is_camel_case_with_uuid() {
        let cv = sample_cv("cv-1", "user-1");
        let value = serde_json::to_value(&cv).unwrap();
        assert_eq!(value["_uuid"], "cv-1");
        assert_eq!(value["userId"], "user-1");
        assert_eq!(value["personalInfo"]["name"], "Kari Nordmann");
        assert_eq!(value["references"][0]["contactInfo"], "ola@example.com");
        assert!(value.get("createdAt").is_some());
    }

    #[test]
    fn test_deserialize_without_personal_info() {
        let cv: Cv = serde_json::from_value(json!({
            "_uuid": "x",
            "userId": "u",
            "createdAt": "2024-01-01T00:00:00Z",
            "updatedAt": "2024-01-01T00:00:00Z"
        }))
        .unwrap();
        assert!(cv.personal_info.is_none());
        assert!(cv.skills.is_empty());
    }

    #[test]
    fn test_patch_skips_absent_fields() {
        let patch = CvPatch {
            skills: Some(vec!["Rust".to_string()]),
            ..Default::default()
        };
        let value = serde_json::to_value(&patch).unwrap();
        assert_eq!(value, json!({ "skills": ["Rust"] }));
    }

    #[test]
    fn test_from_draft_stamps_both_timestamps() {
        let now = Utc::now();
        let cv = Cv::from_draft(sample_draft(), "u1", now);
        assert_eq!(cv.created_at, now);
        assert_eq!(cv.updated_at, now);
        assert!(cv.id.is_none());
    }

    #[test]
    fn test_visibility_owner_email_and_admin() {
        let cv = sample_cv("cv-1", "user-1");
        assert!(cv.is_visible_to(&public_user("user-1", "other@example.com", Role::User)));
        assert!(cv.is_visible_to(&public_user("user-2", "kari@example.com", Role::User)));
        assert!(cv.is_visible_to(&public_user("user-3", "x@example.com", Role::Admin)));
        assert!(!cv.is_visible_to(&public_user("user-3", "x@example.com", Role::User)));
    }

    #[test]
    fn test_merged_with_overrides_only_present_fields() {
        let cv = sample_cv("cv-1", "user-1");
        let patch = CvPatch {
            skills: Some(vec!["Zig".to_string()]),
            ..Default::default()
        };
        let merged = cv.merged_with(&patch);
        assert_eq!(merged.skills, vec!["Zig".to_string()]);
        assert_eq!(merged.education, cv.education);
    }
}
