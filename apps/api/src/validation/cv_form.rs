use serde::Serialize;

use crate::models::cv::{CvDraft, Education, Experience, PersonalInfo, Reference};
use crate::validation::fields::{
    validate_company, validate_contact_info, validate_degree, validate_description,
    validate_email, validate_institution, validate_name, validate_phone, validate_projects,
    validate_ref_name, validate_skill, validate_title, validate_year, validate_years,
};
use crate::validation::{message_if, FormValidation};

const NAME_MSG: &str = "Name must be at least 2 characters and contain only letters, spaces, or hyphens";
const EMAIL_MSG: &str = "Please enter a valid email address (e.g., user@example.com)";
const PHONE_MSG: &str = "Phone must be 8 digits, optionally prefixed with a country code (e.g., +47 12345678)";
const SKILL_MSG: &str = "Skill must be at least 2 characters and contain only letters, spaces, hyphens, +, # or .";
const INSTITUTION_MSG: &str = "Institution must be at least 2 characters and contain only letters, spaces, or hyphens";
const DEGREE_MSG: &str = "Degree must be at least 2 characters and contain only letters, spaces, or hyphens";
const YEAR_MSG: &str = "Year must be between 1960 and the current year";
const TITLE_MSG: &str = "Title must be at least 2 characters and contain only letters, spaces, or hyphens";
const COMPANY_MSG: &str = "Company must be at least 2 characters and contain only letters, spaces, or hyphens";
const YEARS_MSG: &str = "Years must be in the format YYYY-YYYY or YYYY-Present";
const DESCRIPTION_MSG: &str = "Description cannot exceed 150 words";
const PROJECTS_MSG: &str = "Projects cannot exceed 150 words";
const REF_NAME_MSG: &str = "Reference name must be at least 2 characters and contain only letters, spaces, or hyphens";
const CONTACT_MSG: &str = "Contact info must be a valid email address or phone number";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PersonalInfoErrors {
    pub name: String,
    pub email: String,
    pub phone: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EducationErrors {
    pub institution: String,
    pub degree: String,
    pub year: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExperienceErrors {
    pub title: String,
    pub company: String,
    pub years: String,
    pub description: String,
    pub projects: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferenceErrors {
    pub name: String,
    pub contact_info: String,
}

/// Mirrors the shape of [`CvDraft`] one-for-one, so `errors.education[i].year`
/// addresses the same entry as `draft.education[i].year`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CvFormErrors {
    pub personal_info: PersonalInfoErrors,
    pub skills: Vec<String>,
    pub education: Vec<EducationErrors>,
    pub experience: Vec<ExperienceErrors>,
    pub references: Vec<ReferenceErrors>,
}

impl CvFormErrors {
    pub fn is_empty(&self) -> bool {
        self.personal_info == PersonalInfoErrors::default()
            && self.skills.iter().all(String::is_empty)
            && self.education.iter().all(|e| *e == EducationErrors::default())
            && self.experience.iter().all(|e| *e == ExperienceErrors::default())
            && self.references.iter().all(|e| *e == ReferenceErrors::default())
    }
}

fn personal_info_errors(info: &PersonalInfo) -> PersonalInfoErrors {
    PersonalInfoErrors {
        name: message_if(!validate_name(&info.name), NAME_MSG),
        email: message_if(!validate_email(&info.email), EMAIL_MSG),
        phone: message_if(!validate_phone(&info.phone), PHONE_MSG),
    }
}

fn education_errors(edu: &Education) -> EducationErrors {
    EducationErrors {
        institution: message_if(!validate_institution(&edu.institution), INSTITUTION_MSG),
        degree: message_if(!validate_degree(&edu.degree), DEGREE_MSG),
        year: message_if(!validate_year(&edu.year), YEAR_MSG),
    }
}

fn experience_errors(exp: &Experience) -> ExperienceErrors {
    ExperienceErrors {
        title: message_if(!validate_title(&exp.title), TITLE_MSG),
        company: message_if(!validate_company(&exp.company), COMPANY_MSG),
        years: message_if(!validate_years(&exp.years), YEARS_MSG),
        description: message_if(
            !exp.description.is_empty() && !validate_description(&exp.description),
            DESCRIPTION_MSG,
        ),
        projects: message_if(
            !exp.projects.is_empty() && !validate_projects(&exp.projects),
            PROJECTS_MSG,
        ),
    }
}

fn reference_errors(reference: &Reference) -> ReferenceErrors {
    ReferenceErrors {
        name: message_if(!validate_ref_name(&reference.name), REF_NAME_MSG),
        contact_info: message_if(!validate_contact_info(&reference.contact_info), CONTACT_MSG),
    }
}

/// Validates every field and sub-record of a CV form.
///
/// Fields are evaluated independently: an invalid skill never masks an error
/// in the education list, and the validity flag is derived from the full
/// error object.
pub fn validate_cv_form(draft: &CvDraft) -> FormValidation<CvFormErrors> {
    let errors = CvFormErrors {
        personal_info: personal_info_errors(&draft.personal_info),
        skills: draft
            .skills
            .iter()
            .map(|skill| message_if(!validate_skill(skill), SKILL_MSG))
            .collect(),
        education: draft.education.iter().map(education_errors).collect(),
        experience: draft.experience.iter().map(experience_errors).collect(),
        references: draft.references.iter().map(reference_errors).collect(),
    };

    FormValidation {
        is_valid: errors.is_empty(),
        errors,
    }
}
