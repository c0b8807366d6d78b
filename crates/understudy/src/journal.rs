//! Call journal
//!
//! Records every call that reaches a mocked dependency's interceptor so
//! tests can verify interactions after the fact.

use crate::contract::MemberSignature;
use crate::interceptor::{Behavior, Interceptor};
use crate::invocation::Invocation;
use crate::result::{MockError, MockResult};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// How the interceptor disposed of a call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallOutcome {
    /// An arrangement applied, or the behavior accepted the miss
    Handled,
    /// Left to the decoratee
    Unhandled,
    /// The interceptor failed (strict miss or malformed effect)
    Rejected,
}

/// One journal entry
#[derive(Debug, Clone, Serialize)]
pub struct RecordedCall {
    /// Position among all calls to the dependency, starting at 0
    pub sequence: u64,
    /// Declaring contract name
    pub contract: &'static str,
    /// Member name
    pub member: &'static str,
    /// Disposition
    pub outcome: CallOutcome,
    #[serde(skip)]
    signature: MemberSignature,
}

impl RecordedCall {
    /// Signature of the called member
    #[must_use]
    pub const fn signature(&self) -> &MemberSignature {
        &self.signature
    }
}

/// Bounded, thread-safe record of calls to one dependency.
///
/// When full, the oldest entries are evicted. [`CallJournal::count`] and
/// [`CallJournal::received`] still report every call ever recorded.
#[derive(Debug)]
pub struct CallJournal {
    enabled: bool,
    capacity: usize,
    entries: Mutex<Entries>,
    total: AtomicU64,
}

#[derive(Debug, Default)]
struct Entries {
    retained: VecDeque<RecordedCall>,
    per_member: HashMap<MemberSignature, usize>,
}

impl Default for CallJournal {
    fn default() -> Self {
        Self::new(10_000)
    }
}

impl CallJournal {
    /// Recording journal retaining at most `capacity` calls
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            enabled: true,
            capacity,
            entries: Mutex::new(Entries::default()),
            total: AtomicU64::new(0),
        }
    }

    /// Journal that records nothing
    #[must_use]
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::new(0)
        }
    }

    /// Whether calls are recorded
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Maximum retained calls
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    fn lock(&self) -> MutexGuard<'_, Entries> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Record one call
    pub fn record(&self, signature: &MemberSignature, outcome: CallOutcome) {
        if !self.enabled {
            return;
        }
        let sequence = self.total.fetch_add(1, Ordering::SeqCst);
        let mut entries = self.lock();
        *entries.per_member.entry(*signature).or_default() += 1;
        if self.capacity == 0 {
            return;
        }
        while entries.retained.len() >= self.capacity {
            entries.retained.pop_front();
        }
        entries.retained.push_back(RecordedCall {
            sequence,
            contract: signature.declaring().name(),
            member: signature.name(),
            outcome,
            signature: *signature,
        });
    }

    /// Calls ever recorded, including evicted ones
    #[must_use]
    pub fn count(&self) -> u64 {
        self.total.load(Ordering::SeqCst)
    }

    /// Retained calls, oldest first
    #[must_use]
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.lock().retained.iter().cloned().collect()
    }

    /// Calls of `signature` ever recorded, including evicted ones
    #[must_use]
    pub fn received(&self, signature: &MemberSignature) -> usize {
        self.lock()
            .per_member
            .get(signature)
            .copied()
            .unwrap_or(0)
    }

    /// Calls of `signature` still retained
    #[must_use]
    pub fn retained(&self, signature: &MemberSignature) -> usize {
        self.lock()
            .retained
            .iter()
            .filter(|call| call.signature == *signature)
            .count()
    }

    /// Assert `signature` was called exactly `times` times
    pub fn assert_received(&self, signature: &MemberSignature, times: usize) -> MockResult<()> {
        let found = self.received(signature);
        if found != times {
            return Err(MockError::VerificationFailed {
                message: format!("Expected {times} calls to {signature}, but found {found}"),
            });
        }
        Ok(())
    }

    /// Assert `signature` was never called
    pub fn assert_not_received(&self, signature: &MemberSignature) -> MockResult<()> {
        let found = self.received(signature);
        if found != 0 {
            return Err(MockError::VerificationFailed {
                message: format!("Expected no calls to {signature}, but found {found}"),
            });
        }
        Ok(())
    }

    /// Retained calls as pretty-printed JSON
    pub fn to_json(&self) -> MockResult<String> {
        Ok(serde_json::to_string_pretty(&self.calls())?)
    }

    /// Forget retained calls and reset the counters
    pub fn clear(&self) {
        let mut entries = self.lock();
        entries.retained.clear();
        entries.per_member.clear();
        drop(entries);
        self.total.store(0, Ordering::SeqCst);
    }
}

/// Interceptor decorator that records every call in a [`CallJournal`]
#[derive(Debug, Clone)]
pub struct Journaled {
    inner: Arc<dyn Interceptor>,
    journal: Arc<CallJournal>,
}

impl Journaled {
    /// Wrap `inner`
    #[must_use]
    pub fn new(inner: Arc<dyn Interceptor>, journal: Arc<CallJournal>) -> Self {
        Self { inner, journal }
    }
}

impl Interceptor for Journaled {
    fn intercept(&self, invocation: &mut Invocation) -> MockResult<bool> {
        let result = self.inner.intercept(invocation);
        let outcome = match result {
            Ok(true) => CallOutcome::Handled,
            Ok(false) => CallOutcome::Unhandled,
            Err(_) => CallOutcome::Rejected,
        };
        self.journal.record(invocation.signature(), outcome);
        result
    }

    fn behavior(&self) -> Behavior {
        self.inner.behavior()
    }
}
