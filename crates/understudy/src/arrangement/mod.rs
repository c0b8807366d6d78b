//! Arrangements
//!
//! An [`Arrangement`] pairs a member signature and a set of predicates with
//! the effects to apply when a call matches: a return value, out/ref
//! assignments, async resolution or an arbitrary callback.
//!
//! An [`ArrangementCollection`] holds the arrangements of one mocked
//! dependency in registration order. Lookup is first-match: the earliest
//! arrangement whose signature equals the call's and whose predicates all
//! accept it wins. Later registrations never override earlier ones.
//!
//! ```rust
//! use understudy::{ArrangementCollection, ContractDescriptor, Invocation};
//!
//! trait Clock {}
//! let collection = ArrangementCollection::new(
//!     ContractDescriptor::interface::<dyn Clock>("Clock").method("now"),
//! );
//! collection.method("now").unwrap().returns(1_700_000_000u64);
//!
//! let signature = collection.descriptor().method_signature("now").unwrap();
//! let mut call = Invocation::builder(signature).returns::<u64>().build();
//! assert!(collection.try_apply_to(&mut call).unwrap());
//! assert_eq!(call.take_return::<u64>().unwrap(), 1_700_000_000);
//! ```

mod builder;

pub use builder::ArrangementBuilder;

use crate::contract::{ContractDescriptor, MemberKind, MemberSignature};
use crate::invocation::{AsyncKind, FeatureKind, Invocation, Value};
use crate::result::{MockError, MockResult};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, trace, warn};

/// Decides whether an arrangement applies to a call
pub type Predicate = Arc<dyn Fn(&Invocation) -> bool + Send + Sync>;

/// Produces a fresh value each time an arrangement is applied
pub type ValueFactory = Arc<dyn Fn(&Invocation) -> Value + Send + Sync>;

/// Produces the elements of an arranged stream
pub type StreamFactory = Arc<dyn Fn() -> Vec<Value> + Send + Sync>;

/// Arbitrary callback run against the matched call
pub type Callback = Arc<dyn Fn(&mut Invocation) + Send + Sync>;

/// One mutation applied to a matched invocation
#[derive(Clone)]
pub enum Effect {
    /// Fill the synchronous return slot, or resolve an async value
    Return(ValueFactory),
    /// Assign a named out parameter
    Out {
        /// Parameter name
        name: String,
        /// Value producer
        value: ValueFactory,
    },
    /// Overwrite a named ref parameter
    Ref {
        /// Parameter name
        name: String,
        /// Value producer
        value: ValueFactory,
    },
    /// Resolve an async completion
    Complete,
    /// Resolve an async stream
    Stream(StreamFactory),
    /// Run a callback
    Invoke(Callback),
}

impl Effect {
    /// Apply this effect to `invocation`
    pub fn apply(&self, invocation: &mut Invocation) -> MockResult<()> {
        match self {
            Self::Return(value) => {
                let value = value(invocation);
                if invocation.has_feature(FeatureKind::ReturnValue) {
                    invocation.return_value_mut()?.set_value(value)
                } else if invocation.has_feature(FeatureKind::AsyncResult(AsyncKind::Value)) {
                    invocation.async_result_mut()?.set_erased_value(value)
                } else {
                    // Neither slot exists; report the synchronous one
                    invocation.return_value().map(|_| ())
                }
            }
            Self::Out { name, value } => {
                let value = value(invocation);
                invocation.out_parameters_mut()?.set_value(name, value)
            }
            Self::Ref { name, value } => {
                let value = value(invocation);
                invocation.ref_parameters_mut()?.set_value(name, value)
            }
            Self::Complete => invocation.async_result_mut()?.complete(),
            Self::Stream(items) => invocation.async_result_mut()?.set_stream(items()),
            Self::Invoke(callback) => {
                callback(invocation);
                Ok(())
            }
        }
    }

    const fn label(&self) -> &'static str {
        match self {
            Self::Return(_) => "return",
            Self::Out { .. } => "out",
            Self::Ref { .. } => "ref",
            Self::Complete => "complete",
            Self::Stream(_) => "stream",
            Self::Invoke(_) => "invoke",
        }
    }
}

impl fmt::Debug for Effect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Out { name, .. } | Self::Ref { name, .. } => {
                write!(f, "{}({name})", self.label())
            }
            _ => f.write_str(self.label()),
        }
    }
}

/// A configured response to calls of one member
#[derive(Clone)]
pub struct Arrangement {
    signature: MemberSignature,
    predicates: Vec<Predicate>,
    effects: Vec<Effect>,
    description: Option<String>,
}

impl Arrangement {
    /// Unconditional arrangement with no effects
    #[must_use]
    pub fn new(signature: MemberSignature) -> Self {
        Self {
            signature,
            predicates: Vec::new(),
            effects: Vec::new(),
            description: None,
        }
    }

    /// Add a predicate; all predicates must accept the call
    #[must_use]
    pub fn with_predicate(mut self, predicate: Predicate) -> Self {
        self.predicates.push(predicate);
        self
    }

    /// Add an effect; effects run in insertion order
    #[must_use]
    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }

    /// Attach a description shown in logs
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Arranged member
    #[must_use]
    pub const fn signature(&self) -> &MemberSignature {
        &self.signature
    }

    /// Effects in application order
    #[must_use]
    pub fn effects(&self) -> &[Effect] {
        &self.effects
    }

    /// Description, if any
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Whether the arrangement accepts every call of its member
    #[must_use]
    pub fn is_unconditional(&self) -> bool {
        self.predicates.is_empty()
    }

    /// Whether the arrangement applies to `invocation`
    #[must_use]
    pub fn matches(&self, invocation: &Invocation) -> bool {
        self.signature == *invocation.signature()
            && self.predicates.iter().all(|accepts| accepts(invocation))
    }

    /// Apply every effect to `invocation`
    pub fn apply(&self, invocation: &mut Invocation) -> MockResult<()> {
        self.effects
            .iter()
            .try_for_each(|effect| effect.apply(invocation))
    }
}

impl fmt::Debug for Arrangement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Arrangement")
            .field("signature", &self.signature.to_string())
            .field("predicates", &self.predicates.len())
            .field("effects", &self.effects)
            .field("description", &self.description)
            .finish()
    }
}

/// Ordered arrangements of one mocked dependency.
///
/// Shared between the test (which registers) and the interceptor (which
/// matches), so registration goes through `&self`.
pub struct ArrangementCollection {
    descriptor: Arc<ContractDescriptor>,
    arrangements: Mutex<Vec<Arc<Arrangement>>>,
    warn_on_shadowed: bool,
}

impl ArrangementCollection {
    /// Empty collection for a contract
    #[must_use]
    pub fn new(descriptor: ContractDescriptor) -> Self {
        Self {
            descriptor: Arc::new(descriptor),
            arrangements: Mutex::new(Vec::new()),
            warn_on_shadowed: true,
        }
    }

    /// Enable or disable the warning for arrangements that can never match
    #[must_use]
    pub const fn with_shadow_warnings(mut self, enabled: bool) -> Self {
        self.warn_on_shadowed = enabled;
        self
    }

    /// Contract this collection arranges
    #[must_use]
    pub fn descriptor(&self) -> &ContractDescriptor {
        &self.descriptor
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Arc<Arrangement>>> {
        self.arrangements
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Append an arrangement (registration order is match order)
    pub fn add(&self, arrangement: Arrangement) -> &Self {
        let mut arrangements = self.lock();
        let shadowed = arrangements
            .iter()
            .any(|a| a.signature == arrangement.signature && a.is_unconditional());
        if shadowed && self.warn_on_shadowed {
            warn!(
                contract = arrangement.signature.declaring().name(),
                member = arrangement.signature.name(),
                "arrangement registered behind an unconditional one will never match"
            );
        }
        debug!(
            contract = arrangement.signature.declaring().name(),
            member = arrangement.signature.name(),
            effects = arrangement.effects.len(),
            position = arrangements.len(),
            "arrangement registered"
        );
        arrangements.push(Arc::new(arrangement));
        self
    }

    fn snapshot(&self) -> Vec<Arc<Arrangement>> {
        self.lock().clone()
    }

    /// First arrangement accepting `invocation`.
    ///
    /// Predicates run against a snapshot taken under the lock, so they may
    /// call back into the same dependency.
    #[must_use]
    pub fn find(&self, invocation: &Invocation) -> Option<Arc<Arrangement>> {
        self.snapshot()
            .into_iter()
            .find(|a| a.matches(invocation))
    }

    /// Apply the first matching arrangement; returns whether one matched.
    ///
    /// A miss leaves the invocation untouched. Neither predicates nor
    /// effects run under the lock, so both may re-enter the dependency.
    pub fn try_apply_to(&self, invocation: &mut Invocation) -> MockResult<bool> {
        let Some(arrangement) = self.find(invocation) else {
            trace!(member = %invocation.signature(), "no arrangement matched");
            return Ok(false);
        };
        trace!(
            member = %invocation.signature(),
            description = arrangement.description().unwrap_or(""),
            "arrangement matched"
        );
        arrangement.apply(invocation)?;
        Ok(true)
    }

    /// Apply the first matching arrangement; a miss is a no-op
    pub fn apply_to(&self, invocation: &mut Invocation) -> MockResult<()> {
        self.try_apply_to(invocation).map(|_| ())
    }

    /// Number of registered arrangements
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether nothing is registered
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Remove every arrangement
    pub fn clear(&self) {
        self.lock().clear();
    }

    /// Arrangements registered for `signature`, in match order
    #[must_use]
    pub fn arrangements_for(&self, signature: &MemberSignature) -> Vec<Arc<Arrangement>> {
        self.lock()
            .iter()
            .filter(|a| a.signature == *signature)
            .map(Arc::clone)
            .collect()
    }

    /// Arrange a method (or accessor) by name
    pub fn method(&self, name: &str) -> MockResult<ArrangementBuilder<'_>> {
        let signature = self.descriptor.method_signature(name)?;
        Ok(ArrangementBuilder::new(self, signature))
    }

    /// Arrange a property getter
    pub fn getter(&self, property: &str) -> MockResult<ArrangementBuilder<'_>> {
        let signature = self.descriptor.getter_signature(property)?;
        Ok(ArrangementBuilder::new(self, signature))
    }

    /// Arrange a property setter
    pub fn setter(&self, property: &str) -> MockResult<ArrangementBuilder<'_>> {
        let signature = self.descriptor.setter_signature(property)?;
        Ok(ArrangementBuilder::new(self, signature))
    }

    /// Arrange a callable member by signature; it must belong to this contract.
    ///
    /// Property signatures are rejected: calls carry the accessor's
    /// signature, so an arrangement on the property itself never matches.
    pub fn member(&self, signature: MemberSignature) -> MockResult<ArrangementBuilder<'_>> {
        if signature.kind() != MemberKind::Method
            || signature.declaring() != self.descriptor.contract()
            || !self.descriptor.declares(signature.name())
        {
            return Err(MockError::UnknownMember {
                contract: self.descriptor.contract().name().to_string(),
                member: signature.to_string(),
                kind: "member",
            });
        }
        Ok(ArrangementBuilder::new(self, signature))
    }
}

impl fmt::Debug for ArrangementCollection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArrangementCollection")
            .field("contract", &self.descriptor.contract())
            .field("arrangements", &self.len())
            .finish()
    }
}
