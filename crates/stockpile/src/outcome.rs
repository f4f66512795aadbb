//! Structured operation outcomes.
//!
//! Every load and mutating store operation returns an [`Outcome`]: a success
//! flag and a message meant to be shown to the user verbatim, whichever way
//! the operation went.

use serde::Serialize;

use crate::error::{Error, ErrorKind};

/// The result of a store operation as presented to a caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Outcome {
    /// Whether the operation succeeded.
    pub ok: bool,
    /// Human-readable description of what happened.
    pub message: String,
    /// The failure category, set only when `ok` is false.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<ErrorKind>,
}

impl Outcome {
    /// A successful outcome.
    #[must_use]
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            ok: true,
            message: message.into(),
            kind: None,
        }
    }

    /// A failed outcome carrying the error's kind and message.
    #[must_use]
    pub fn failure(err: &Error) -> Self {
        Self {
            ok: false,
            message: err.to_string(),
            kind: Some(err.kind()),
        }
    }

    /// A failed outcome whose message prefixes the error's own.
    #[must_use]
    pub fn failure_with_context(context: &str, err: &Error) -> Self {
        Self {
            ok: false,
            message: format!("{context}: {err}"),
            kind: Some(err.kind()),
        }
    }

    /// Check whether this is a failure of the given kind.
    #[must_use]
    pub fn is(&self, kind: ErrorKind) -> bool {
        self.kind == Some(kind)
    }

    /// The `(ok, message)` pair.
    #[must_use]
    pub fn into_pair(self) -> (bool, String) {
        (self.ok, self.message)
    }
}

impl From<std::result::Result<String, Error>> for Outcome {
    fn from(result: std::result::Result<String, Error>) -> Self {
        match result {
            Ok(message) => Self::success(message),
            Err(err) => Self::failure(&err),
        }
    }
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success() {
        let outcome = Outcome::success("saved");
        assert!(outcome.ok);
        assert_eq!(outcome.message, "saved");
        assert!(outcome.kind.is_none());
    }

    #[test]
    fn test_failure_carries_kind() {
        let outcome = Outcome::failure(&Error::not_found("X9"));
        assert!(!outcome.ok);
        assert!(outcome.is(ErrorKind::NotFound));
        assert!(!outcome.is(ErrorKind::DuplicateId));
        assert!(outcome.message.contains("X9"));
    }

    #[test]
    fn test_failure_with_context() {
        let outcome = Outcome::failure_with_context("could not save", &Error::not_found("X9"));
        assert!(outcome.message.starts_with("could not save: "));
        assert!(outcome.is(ErrorKind::NotFound));
    }

    #[test]
    fn test_from_result() {
        let ok: Outcome = Ok::<_, Error>("done".to_string()).into();
        assert!(ok.ok);

        let err: Outcome = Err::<String, _>(Error::duplicate_id("A1")).into();
        assert!(err.is(ErrorKind::DuplicateId));
    }

    #[test]
    fn test_into_pair() {
        assert_eq!(
            Outcome::success("fine").into_pair(),
            (true, "fine".to_string())
        );
    }

    #[test]
    fn test_serialize_skips_kind_on_success() {
        let json = serde_json::to_string(&Outcome::success("fine")).unwrap();
        assert_eq!(json, r#"{"ok":true,"message":"fine"}"#);
    }
}
