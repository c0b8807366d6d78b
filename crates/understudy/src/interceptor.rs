//! Interceptor behaviors
//!
//! An interceptor decides what happens when a proxied call has no
//! arrangement. All three variants consult the same collection; they differ
//! only on a miss:
//!
//! | Behavior      | Miss                                         |
//! |---------------|----------------------------------------------|
//! | `Permissive`  | handled, outputs keep their zero values      |
//! | `PassThrough` | unhandled, the proxy forwards to a decoratee |
//! | `Strict`      | `MissingArrangement` error                   |

use crate::arrangement::ArrangementCollection;
use crate::invocation::Invocation;
use crate::result::{MockError, MockResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, trace};

/// Per-call policy of a mocked dependency.
///
/// Returns whether the call was handled. `false` asks the proxy to forward
/// the call to its decoratee, if it has one.
pub trait Interceptor: Send + Sync + fmt::Debug {
    /// Process one call
    fn intercept(&self, invocation: &mut Invocation) -> MockResult<bool>;

    /// Behavior this interceptor implements
    fn behavior(&self) -> Behavior;
}

/// Selects an interceptor variant
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Behavior {
    /// Unmatched calls succeed with zero values
    #[default]
    #[serde(alias = "loose")]
    Permissive,
    /// Unmatched calls are forwarded to the decoratee
    #[serde(alias = "partial")]
    PassThrough,
    /// Unmatched calls fail
    Strict,
}

impl Behavior {
    /// Every behavior, in declaration order
    pub const ALL: [Self; 3] = [Self::Permissive, Self::PassThrough, Self::Strict];

    /// Canonical name
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Permissive => "permissive",
            Self::PassThrough => "pass_through",
            Self::Strict => "strict",
        }
    }

    /// Interceptor bound to `arrangements`
    #[must_use]
    pub fn interceptor(self, arrangements: Arc<ArrangementCollection>) -> Arc<dyn Interceptor> {
        match self {
            Self::Permissive => Arc::new(Permissive::new(arrangements)),
            Self::PassThrough => Arc::new(PassThrough::new(arrangements)),
            Self::Strict => Arc::new(Strict::new(arrangements)),
        }
    }
}

impl fmt::Display for Behavior {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Behavior {
    type Err = MockError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace(['-', ' '], "_");
        match normalized.as_str() {
            "permissive" | "loose" => Ok(Self::Permissive),
            "pass_through" | "passthrough" | "partial" => Ok(Self::PassThrough),
            "strict" => Ok(Self::Strict),
            _ => Err(MockError::Config {
                message: format!("unknown behavior '{s}'"),
            }),
        }
    }
}

/// Unmatched calls succeed; return and out slots keep their zero values
#[derive(Debug, Clone)]
pub struct Permissive {
    arrangements: Arc<ArrangementCollection>,
}

impl Permissive {
    /// Bind to a collection
    #[must_use]
    pub const fn new(arrangements: Arc<ArrangementCollection>) -> Self {
        Self { arrangements }
    }
}

impl Interceptor for Permissive {
    fn intercept(&self, invocation: &mut Invocation) -> MockResult<bool> {
        self.arrangements.apply_to(invocation)?;
        Ok(true)
    }

    fn behavior(&self) -> Behavior {
        Behavior::Permissive
    }
}

/// Unmatched calls are reported unhandled so the proxy can forward them
#[derive(Debug, Clone)]
pub struct PassThrough {
    arrangements: Arc<ArrangementCollection>,
}

impl PassThrough {
    /// Bind to a collection
    #[must_use]
    pub const fn new(arrangements: Arc<ArrangementCollection>) -> Self {
        Self { arrangements }
    }
}

impl Interceptor for PassThrough {
    fn intercept(&self, invocation: &mut Invocation) -> MockResult<bool> {
        let handled = self.arrangements.try_apply_to(invocation)?;
        if !handled {
            trace!(member = %invocation.signature(), "unhandled, eligible for forwarding");
        }
        Ok(handled)
    }

    fn behavior(&self) -> Behavior {
        Behavior::PassThrough
    }
}

/// Unmatched calls fail with [`MockError::MissingArrangement`]
#[derive(Debug, Clone)]
pub struct Strict {
    arrangements: Arc<ArrangementCollection>,
}

impl Strict {
    /// Bind to a collection
    #[must_use]
    pub const fn new(arrangements: Arc<ArrangementCollection>) -> Self {
        Self { arrangements }
    }
}

impl Interceptor for Strict {
    fn intercept(&self, invocation: &mut Invocation) -> MockResult<bool> {
        if self.arrangements.try_apply_to(invocation)? {
            return Ok(true);
        }
        let signature = *invocation.signature();
        let classification = self.arrangements.descriptor().classify(&signature);
        debug!(
            contract = signature.declaring().name(),
            member = signature.name(),
            classification = classification.as_str(),
            "strict miss"
        );
        Err(MockError::MissingArrangement {
            contract: signature.declaring().name().to_string(),
            member: signature.name().to_string(),
            classification: classification.as_str(),
        })
    }

    fn behavior(&self) -> Behavior {
        Behavior::Strict
    }
}
