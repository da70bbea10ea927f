//! OperationOutcome, the body of every error response and of `$validate`.
//!
//! The same type parses outcomes returned by the remote store so their
//! diagnostics can be carried into upstream errors.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum IssueSeverity {
    Fatal,
    Error,
    Warning,
    Information,
}

/// Issue types this service emits. Anything else found in a remote outcome
/// parses as `Other`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum IssueType {
    Invalid,
    Required,
    Value,
    CodeInvalid,
    BusinessRule,
    Duplicate,
    NotFound,
    Transient,
    Throttled,
    Exception,
    Informational,
    #[serde(other, rename = "unknown")]
    Other,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OperationOutcomeIssue {
    pub severity: IssueSeverity,
    pub code: IssueType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diagnostics: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OperationOutcome {
    pub resource_type: String,
    #[serde(default)]
    pub issue: Vec<OperationOutcomeIssue>,
}

impl OperationOutcome {
    fn with_issue(severity: IssueSeverity, code: IssueType, diagnostics: &str) -> Self {
        let issue = OperationOutcomeIssue {
            severity,
            code,
            diagnostics: Some(diagnostics.to_owned()),
        };
        Self {
            resource_type: "OperationOutcome".to_owned(),
            issue: vec![issue],
        }
    }

    pub fn error(code: IssueType, diagnostics: &str) -> Self {
        Self::with_issue(IssueSeverity::Error, code, diagnostics)
    }

    pub fn invalid(diagnostics: &str) -> Self {
        Self::error(IssueType::Invalid, diagnostics)
    }

    pub fn not_found(diagnostics: &str) -> Self {
        Self::error(IssueType::NotFound, diagnostics)
    }

    pub fn success(diagnostics: &str) -> Self {
        Self::with_issue(IssueSeverity::Information, IssueType::Informational, diagnostics)
    }

    /// `None` when the body is not an OperationOutcome (HTML error pages,
    /// empty bodies, other resources).
    pub fn from_body(body: &[u8]) -> Option<Self> {
        let outcome: Self = serde_json::from_slice(body).ok()?;
        (outcome.resource_type == "OperationOutcome").then_some(outcome)
    }

    /// Diagnostics of every issue, joined with `; `
    pub fn diagnostics(&self) -> String {
        let parts: Vec<&str> = self
            .issue
            .iter()
            .filter_map(|issue| issue.diagnostics.as_deref())
            .collect();
        parts.join("; ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_wire_shape() {
        let json = serde_json::to_value(OperationOutcome::invalid("missing encounter ID")).unwrap();
        assert_eq!(json["resourceType"], "OperationOutcome");
        assert_eq!(json["issue"][0]["severity"], "error");
        assert_eq!(json["issue"][0]["code"], "invalid");
        assert_eq!(json["issue"][0]["diagnostics"], "missing encounter ID");
    }

    #[test]
    fn test_remote_outcome() {
        let body = br#"{"resourceType":"OperationOutcome","issue":[
            {"severity":"error","code":"processing","diagnostics":"invalid reference"},
            {"severity":"warning","code":"not-found","diagnostics":"gone"}
        ]}"#;
        let outcome = OperationOutcome::from_body(body).unwrap();
        assert_eq!(outcome.issue[0].code, IssueType::Other);
        assert_eq!(outcome.diagnostics(), "invalid reference; gone");

        assert!(OperationOutcome::from_body(b"<html>").is_none());
        assert!(OperationOutcome::from_body(br#"{"resourceType":"Patient"}"#).is_none());
    }
}
