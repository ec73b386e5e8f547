//! Uniform result envelope returned by every provider operation

use std::collections::BTreeMap;

use serde::Serialize;

use crate::core::error::StoreError;

/// Status code carried by an [`Outcome`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, serde::Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResultCode {
    Success,
    Error,
    NotFound,
    InvalidData,
    /// Duplicate unique-key binding
    Conflict,
}

impl std::fmt::Display for ResultCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResultCode::Success => write!(f, "SUCCESS"),
            ResultCode::Error => write!(f, "ERROR"),
            ResultCode::NotFound => write!(f, "NOT_FOUND"),
            ResultCode::InvalidData => write!(f, "INVALID_DATA"),
            ResultCode::Conflict => write!(f, "CONFLICT"),
        }
    }
}

/// Status code, optional payload, optional message and a field -> message
/// error map. Callers branch on `code`; an empty collection may come back
/// with `NOT_FOUND`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Outcome<T> {
    pub code: ResultCode,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub errors: BTreeMap<String, String>,
}

impl<T> Outcome<T> {
    fn with_code(code: ResultCode) -> Self {
        Self {
            code,
            data: None,
            message: None,
            errors: BTreeMap::new(),
        }
    }

    pub fn success(data: T) -> Self {
        Self {
            data: Some(data),
            ..Self::with_code(ResultCode::Success)
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            ..Self::with_code(ResultCode::NotFound)
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            ..Self::with_code(ResultCode::Error)
        }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            ..Self::with_code(ResultCode::Conflict)
        }
    }

    pub fn invalid(message: impl Into<String>, errors: BTreeMap<String, String>) -> Self {
        Self {
            message: Some(message.into()),
            errors,
            ..Self::with_code(ResultCode::InvalidData)
        }
    }

    pub fn is_success(&self) -> bool {
        self.code == ResultCode::Success
    }

    /// Convert a storage result, mapping each error variant to its code
    pub fn from_result(result: Result<T, StoreError>) -> Self {
        match result {
            Ok(data) => Self::success(data),
            Err(e) => e.into(),
        }
    }

    /// Replace the payload type, keeping code and diagnostics
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        Outcome {
            code: self.code,
            data: self.data.map(f),
            message: self.message,
            errors: self.errors,
        }
    }

    /// Payload when successful, otherwise None
    pub fn into_data(self) -> Option<T> {
        if self.is_success() {
            self.data
        } else {
            None
        }
    }
}

impl<T> Outcome<Vec<T>> {
    /// SUCCESS with the rows, or NOT_FOUND carrying an empty collection
    pub fn from_collection(rows: Vec<T>, what: &str) -> Self {
        if rows.is_empty() {
            Self {
                data: Some(rows),
                message: Some(format!("No {} found", what)),
                ..Self::with_code(ResultCode::NotFound)
            }
        } else {
            Self::success(rows)
        }
    }
}

impl<T> From<StoreError> for Outcome<T> {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound { .. } => Outcome::not_found(e.to_string()),
            StoreError::Invalid(violations) => {
                Outcome::invalid("Validation failed", violations.to_map())
            }
            StoreError::Conflict(msg) => Outcome::conflict(msg),
            StoreError::Storage(msg) => Outcome::error(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::integrity::Violations;

    #[test]
    fn test_empty_collection_is_not_found_with_data() {
        let outcome: Outcome<Vec<u32>> = Outcome::from_collection(vec![], "tasks");
        assert_eq!(outcome.code, ResultCode::NotFound);
        assert_eq!(outcome.data, Some(vec![]));
    }

    #[test]
    fn test_store_errors_map_to_codes() {
        let mut v = Violations::new();
        v.invalid("name", "Name must not be empty");

        let invalid: Outcome<()> = StoreError::Invalid(v).into();
        assert_eq!(invalid.code, ResultCode::InvalidData);
        assert_eq!(invalid.errors["name"], "Name must not be empty");

        let missing: Outcome<()> = StoreError::not_found("Task", "42").into();
        assert_eq!(missing.code, ResultCode::NotFound);
        assert!(missing.data.is_none());

        let broken: Outcome<()> = StoreError::Storage("disk full".into()).into();
        assert_eq!(broken.code, ResultCode::Error);
        assert_eq!(broken.message.as_deref(), Some("disk full"));
    }

    #[test]
    fn test_serializes_code_names() {
        let outcome = Outcome::success(1.5_f64);
        let json = serde_json::to_string(&outcome).unwrap();
        assert_eq!(json, r#"{"code":"SUCCESS","data":1.5}"#);
    }
}
