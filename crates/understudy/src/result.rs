//! Result and error types for Understudy.

use thiserror::Error;

/// Result type for Understudy operations
pub type MockResult<T> = Result<T, MockError>;

/// Errors that can occur while building, configuring or dispatching doubles
#[derive(Debug, Error)]
pub enum MockError {
    /// The contract asked to be mocked is not an interface
    #[error("Cannot mock '{contract}': only interface contracts can be substituted")]
    ContractViolation {
        /// Contract display name
        contract: String,
    },

    /// The type under test does not expose exactly one public constructor
    #[error("'{subject}' must expose exactly one public constructor, found {found}")]
    ConstructorAmbiguity {
        /// Type under test
        subject: String,
        /// Number of public constructors discovered
        found: usize,
    },

    /// No mocked dependency exists for the requested contract
    #[error("'{subject}' has no mocked dependency of type '{contract}'")]
    UnknownDependency {
        /// Type under test
        subject: String,
        /// Requested contract
        contract: String,
    },

    /// A strict double received a call nobody arranged
    #[error("No arrangement for {classification} '{contract}::{member}' (strict behavior)")]
    MissingArrangement {
        /// Declaring contract
        contract: String,
        /// Member name
        member: String,
        /// "method", "property getter" or "property setter"
        classification: &'static str,
    },

    /// An invocation was queried for a feature it does not carry
    #[error("Invocation of '{member}' has no {feature} feature")]
    MissingFeature {
        /// Member whose invocation was queried
        member: String,
        /// Requested feature kind
        feature: String,
    },

    /// Fluent configuration named a member the contract does not declare
    #[error("'{contract}' declares no {kind} named '{member}'")]
    UnknownMember {
        /// Contract display name
        contract: String,
        /// Requested member
        member: String,
        /// "method" or "property"
        kind: &'static str,
    },

    /// A named parameter is not present on the invocation
    #[error("'{member}' has no {mode} parameter named '{parameter}'")]
    UnknownParameter {
        /// Member whose invocation was queried
        member: String,
        /// "input", "ref" or "out"
        mode: &'static str,
        /// Requested parameter name
        parameter: String,
    },

    /// A value of the wrong type was written to or read from a typed slot
    #[error("Type mismatch for {slot}: declared '{expected}', got '{found}'")]
    TypeMismatch {
        /// Slot description (e.g. "return value of Repo::find")
        slot: String,
        /// Declared type
        expected: String,
        /// Type actually supplied
        found: String,
    },

    /// A journal assertion failed
    #[error("Verification failed: {message}")]
    VerificationFailed {
        /// Error message
        message: String,
    },

    /// Options could not be loaded
    #[error("Invalid options: {message}")]
    Config {
        /// Error message
        message: String,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl MockError {
    /// Whether this error is the strict-miss failure surfaced to test authors
    #[must_use]
    pub const fn is_missing_arrangement(&self) -> bool {
        matches!(self, Self::MissingArrangement { .. })
    }
}
