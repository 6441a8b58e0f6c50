use serde::{Deserialize, Serialize};

use crate::models::user::{NewUser, Role, UserPatch};
use crate::validation::fields::{is_name_like, validate_email};
use crate::validation::{message_if, FormValidation};

const PASSWORD_SYMBOLS: &str = "@$!%*#?&";
const MIN_USERNAME_LEN: usize = 4;
const MIN_PASSWORD_LEN: usize = 8;
const MIN_USER_NAME_LEN: usize = 2;

const USERNAME_MSG: &str =
    "Username must be at least 4 characters and contain only letters, numbers, underscores or hyphens";
const PASSWORD_MSG: &str = "Password must contain at least 8 characters, one uppercase letter, one lowercase letter, one number, and one special character";
const EMAIL_MSG: &str = "Please enter a valid email address (e.g., user@example.com)";
const NAME_MSG: &str =
    "Name must be at least 2 characters and contain only letters, spaces, or hyphens";
const ROLE_MSG: &str = "Role must be either \"admin\" or \"user\"";

/// Raw user form input. `role` stays a string until it has been validated.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UserForm {
    pub username: String,
    pub password: String,
    pub email: String,
    pub name: String,
    pub role: String,
}

impl UserForm {
    /// Converts a validated form into a create payload.
    pub fn into_new_user(self) -> Option<NewUser> {
        let role = parse_role(&self.role)?;
        Some(NewUser {
            name: self.name,
            email: self.email,
            username: self.username,
            password: self.password,
            role,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UserFormErrors {
    pub username: String,
    pub password: String,
    pub email: String,
    pub name: String,
    pub role: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LoginFormErrors {
    pub username: String,
    pub password: String,
}

pub fn validate_username(username: &str) -> bool {
    username.chars().count() >= MIN_USERNAME_LEN
        && username
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

/// At least 8 characters drawn from letters, digits and `@$!%*#?&`, with at
/// least one uppercase letter, one lowercase letter, one digit and one symbol.
pub fn validate_password(password: &str) -> bool {
    let allowed = password
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || PASSWORD_SYMBOLS.contains(c));

    allowed
        && password.chars().count() >= MIN_PASSWORD_LEN
        && password.chars().any(|c| c.is_ascii_uppercase())
        && password.chars().any(|c| c.is_ascii_lowercase())
        && password.chars().any(|c| c.is_ascii_digit())
        && password.chars().any(|c| PASSWORD_SYMBOLS.contains(c))
}

pub fn validate_user_email(email: &str) -> bool {
    validate_email(email)
}

/// Same charset as CV names.
pub fn validate_user_name(name: &str) -> bool {
    is_name_like(name, MIN_USER_NAME_LEN)
}

pub fn parse_role(role: &str) -> Option<Role> {
    match role {
        "admin" => Some(Role::Admin),
        "user" => Some(Role::User),
        _ => None,
    }
}

pub fn validate_role(role: &str) -> bool {
    parse_role(role).is_some()
}

pub fn validate_user_form(form: &UserForm) -> FormValidation<UserFormErrors> {
    let errors = UserFormErrors {
        username: message_if(!validate_username(&form.username), USERNAME_MSG),
        password: message_if(!validate_password(&form.password), PASSWORD_MSG),
        email: message_if(!validate_user_email(&form.email), EMAIL_MSG),
        name: message_if(!validate_user_name(&form.name), NAME_MSG),
        role: message_if(!validate_role(&form.role), ROLE_MSG),
    };

    FormValidation {
        is_valid: errors == UserFormErrors::default(),
        errors,
    }
}

/// Validates only the fields present in a partial update. The username is
/// immutable and the role is already typed, so both stay empty.
pub fn validate_user_patch(patch: &UserPatch) -> FormValidation<UserFormErrors> {
    let errors = UserFormErrors {
        password: message_if(
            patch.password.as_deref().is_some_and(|p| !validate_password(p)),
            PASSWORD_MSG,
        ),
        email: message_if(
            patch.email.as_deref().is_some_and(|e| !validate_user_email(e)),
            EMAIL_MSG,
        ),
        name: message_if(
            patch.name.as_deref().is_some_and(|n| !validate_user_name(n)),
            NAME_MSG,
        ),
        ..Default::default()
    };
    FormValidation {
        is_valid: errors == UserFormErrors::default(),
        errors,
    }
}

pub fn validate_login_form(form: &LoginForm) -> FormValidation<LoginFormErrors> {
    let errors = LoginFormErrors {
        username: message_if(form.username.is_empty(), "Username is required"),
        password: message_if(form.password.is_empty(), "Password is required"),
    };
    FormValidation {
        is_valid: errors == LoginFormErrors::default(),
        errors,
    }
}
