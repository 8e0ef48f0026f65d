//! Configuration validation
//!
//! Rules:
//! - field-level constraints (derive `Validate`)
//! - batch_size > 0
//! - analyzer.url is non-empty and contains no whitespace
//! - timeout_secs > 0
//! - ca_file must exist when TLS is enabled

use ::validator::{Validate, ValidationErrors, ValidationErrorsKind};
use contracts::{ContractError, ShufflerBlueprint};

/// Validate a ShufflerBlueprint
///
/// Returns the first error encountered.
pub fn validate(blueprint: &ShufflerBlueprint) -> Result<(), ContractError> {
    validate_fields(blueprint)?;
    validate_dispatch(blueprint)?;
    validate_analyzer(blueprint)?;
    Ok(())
}

/// Field-level constraints
fn validate_fields(blueprint: &ShufflerBlueprint) -> Result<(), ContractError> {
    blueprint.validate().map_err(|errors| {
        let (field, message) = first_error(&errors, "")
            .unwrap_or_else(|| (String::from("<root>"), errors.to_string()));
        ContractError::config_validation(field, message)
    })
}

/// Depth-first search for the first failing field, returning its dotted path
fn first_error(errors: &ValidationErrors, prefix: &str) -> Option<(String, String)> {
    for (field, kind) in errors.errors() {
        let path = if prefix.is_empty() {
            field.to_string()
        } else {
            format!("{prefix}.{field}")
        };
        match kind {
            ValidationErrorsKind::Field(list) => {
                if let Some(err) = list.first() {
                    let message = err
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("failed '{}' check", err.code));
                    return Some((path, message));
                }
            }
            ValidationErrorsKind::Struct(nested) => {
                if let Some(found) = first_error(nested, &path) {
                    return Some(found);
                }
            }
            ValidationErrorsKind::List(items) => {
                for (idx, nested) in items {
                    if let Some(found) = first_error(nested, &format!("{path}[{idx}]")) {
                        return Some(found);
                    }
                }
            }
        }
    }
    None
}

/// Dispatch policy checks
fn validate_dispatch(blueprint: &ShufflerBlueprint) -> Result<(), ContractError> {
    let dispatch = &blueprint.dispatch;

    if dispatch.batch_size == 0 {
        return Err(ContractError::config_validation(
            "dispatch.batch_size",
            "batch_size must be > 0",
        ));
    }

    if dispatch.min_wait_secs == 0 {
        return Err(ContractError::config_validation(
            "dispatch.min_wait_secs",
            "min_wait_secs must be > 0",
        ));
    }

    Ok(())
}

/// Analyzer connection checks
fn validate_analyzer(blueprint: &ShufflerBlueprint) -> Result<(), ContractError> {
    let analyzer = &blueprint.analyzer;

    if analyzer.url.trim().is_empty() {
        return Err(ContractError::config_validation(
            "analyzer.url",
            "analyzer url cannot be empty",
        ));
    }

    if analyzer.url.chars().any(char::is_whitespace) {
        return Err(ContractError::config_validation(
            "analyzer.url",
            format!("analyzer url '{}' contains whitespace", analyzer.url),
        ));
    }

    if analyzer.timeout_secs == 0 {
        return Err(ContractError::config_validation(
            "analyzer.timeout_secs",
            "timeout_secs must be > 0",
        ));
    }

    if analyzer.enable_tls {
        if let Some(ref ca_file) = analyzer.ca_file {
            if !ca_file.exists() {
                return Err(ContractError::config_validation(
                    "analyzer.ca_file",
                    format!("ca_file '{}' not found", ca_file.display()),
                ));
            }
        }
    }

    Ok(())
}
