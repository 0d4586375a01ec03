//! Assertions over settled (or rejected) API calls.

use std::sync::OnceLock;

use regex::Regex;
use reqwest::StatusCode;
use serde_json::Value;

use crate::client::{ApiResponse, ClientError};

/// Pattern every `Location` of a created todo must match.
pub const LOCATION_PATTERN: &str = r"^https?://.+/todos/[0-9]+$";

pub fn location_regex() -> &'static Regex {
    static LOCATION: OnceLock<Regex> = OnceLock::new();
    LOCATION.get_or_init(|| Regex::new(LOCATION_PATTERN).expect("location pattern is valid"))
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CheckError {
    #[error("request was rejected: {0}")]
    Request(String),
    #[error("expected status {expected}, got {actual}")]
    Status { expected: u16, actual: u16 },
    #[error("missing header `{0}`")]
    MissingHeader(String),
    #[error("header `{name}` is {actual:?}, expected {expected:?}")]
    HeaderMismatch {
        name: String,
        expected: String,
        actual: String,
    },
    #[error("header `{name}` value {actual:?} does not match {pattern}")]
    PatternMismatch {
        name: String,
        pattern: String,
        actual: String,
    },
    #[error("response has no body")]
    MissingBody,
    #[error("field `{field}` is {actual}, expected {expected}")]
    FieldMismatch {
        field: String,
        expected: Value,
        actual: Value,
    },
    #[error("expected rejection with {0:?}, but the request succeeded")]
    UnexpectedSuccess(String),
    #[error("expected rejection with {expected:?}, got {actual:?}")]
    WrongRejection { expected: String, actual: String },
}

impl From<&ClientError> for CheckError {
    fn from(err: &ClientError) -> Self {
        CheckError::Request(err.to_string())
    }
}

impl From<ClientError> for CheckError {
    fn from(err: ClientError) -> Self {
        CheckError::from(&err)
    }
}

pub type CheckResult = Result<(), CheckError>;

/// Unwraps a settled response, turning a rejection into a failed check.
pub fn settled(result: &Result<ApiResponse, ClientError>) -> Result<&ApiResponse, CheckError> {
    result.as_ref().map_err(CheckError::from)
}

pub fn status(response: &ApiResponse, expected: StatusCode) -> CheckResult {
    if response.status == expected {
        Ok(())
    } else {
        Err(CheckError::Status {
            expected: expected.as_u16(),
            actual: response.status.as_u16(),
        })
    }
}

pub fn header<'a>(response: &'a ApiResponse, name: &str) -> Result<&'a str, CheckError> {
    response
        .header(name)
        .ok_or_else(|| CheckError::MissingHeader(name.to_string()))
}

/// Every header in `names` is present.
pub fn header_keys(response: &ApiResponse, names: &[&str]) -> CheckResult {
    for name in names {
        header(response, name)?;
    }
    Ok(())
}

pub fn header_eq(response: &ApiResponse, name: &str, expected: &str) -> CheckResult {
    let actual = header(response, name)?;
    if actual == expected {
        Ok(())
    } else {
        Err(CheckError::HeaderMismatch {
            name: name.to_string(),
            expected: expected.to_string(),
            actual: actual.to_string(),
        })
    }
}

pub fn header_matches(response: &ApiResponse, name: &str, pattern: &Regex) -> CheckResult {
    let actual = header(response, name)?;
    if pattern.is_match(actual) {
        Ok(())
    } else {
        Err(CheckError::PatternMismatch {
            name: name.to_string(),
            pattern: pattern.as_str().to_string(),
            actual: actual.to_string(),
        })
    }
}

pub fn field_eq(response: &ApiResponse, field: &str, expected: impl Into<Value>) -> CheckResult {
    if response.body.is_none() {
        return Err(CheckError::MissingBody);
    }
    let expected = expected.into();
    let actual = response.field(field).cloned().unwrap_or(Value::Null);
    if actual == expected {
        Ok(())
    } else {
        Err(CheckError::FieldMismatch {
            field: field.to_string(),
            expected,
            actual,
        })
    }
}

pub fn empty_body(response: &ApiResponse) -> CheckResult {
    match &response.body {
        None => Ok(()),
        Some(body) => Err(CheckError::FieldMismatch {
            field: "<body>".to_string(),
            expected: Value::Null,
            actual: body.clone(),
        }),
    }
}

/// The call was rejected and its message is exactly `reason`.
pub fn rejected_with(result: &Result<ApiResponse, ClientError>, reason: &str) -> CheckResult {
    match result {
        Ok(_) => Err(CheckError::UnexpectedSuccess(reason.to_string())),
        Err(err) if err.to_string() == reason => Ok(()),
        Err(err) => Err(CheckError::WrongRejection {
            expected: reason.to_string(),
            actual: err.to_string(),
        }),
    }
}
