// Form validation: field predicates plus one aggregator per form.
// Validators never fail; they return a flag and a mirrored error structure.

pub mod cv_form;
pub mod fields;
pub mod user_form;

use serde::Serialize;

/// Outcome of validating a whole form. `errors` mirrors the form's shape and
/// holds an empty string for every valid field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormValidation<E> {
    pub is_valid: bool,
    pub errors: E,
}

pub(crate) fn message_if(failed: bool, message: &str) -> String {
    if failed {
        message.to_string()
    } else {
        String::new()
    }
}
