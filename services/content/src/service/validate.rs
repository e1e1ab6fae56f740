//! Request shape checks run before any side effect.
use super::{ExistingContentAttributes, NewContentAttributes, ServiceError, ServiceResult};
use regex::Regex;
use std::sync::LazyLock;

static EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("static email pattern")
});

fn required(field: &str, value: &str) -> ServiceResult<()> {
    if value.trim().is_empty() {
        return Err(ServiceError::InvalidArgument(format!("{field} is required")));
    }
    Ok(())
}

fn email(field: &str, value: &str) -> ServiceResult<()> {
    required(field, value)?;
    if !EMAIL.is_match(value) {
        return Err(ServiceError::InvalidArgument(format!(
            "{field} must be an email address"
        )));
    }
    Ok(())
}

pub(super) fn new_content(attributes: &NewContentAttributes) -> ServiceResult<()> {
    required("name", &attributes.name)?;
    required("namespace", &attributes.namespace)?;
    required("content", &attributes.content)?;
    email("created_by", &attributes.created_by)
}

pub(super) fn existing_content(attributes: &ExistingContentAttributes) -> ServiceResult<()> {
    required("content", &attributes.content)?;
    email("updated_by", &attributes.updated_by)
}
