//! Invocation Model
//!
//! An [`Invocation`] is the record of one intercepted call: the member's
//! signature plus the set of [`Feature`]s its static shape implies. The
//! proxy boundary builds it immediately before dispatch, the arrangement
//! pipeline mutates its return/out/ref slots, and the proxy reads those
//! slots back into the real call frame afterwards.
//!
//! ## Example
//!
//! ```rust
//! use understudy::{ContractType, Invocation, MemberSignature};
//!
//! trait Parser {}
//! let contract = ContractType::named::<dyn Parser>("Parser");
//!
//! // fn try_parse(&self, text: String, parsed: &mut i32) -> bool
//! let mut invocation = Invocation::builder(MemberSignature::method(contract, "try_parse"))
//!     .input("text", "42".to_string())
//!     .out::<i32>("parsed")
//!     .returns::<bool>()
//!     .build();
//!
//! // Nothing arranged: every output resolves to its zero value.
//! assert_eq!(invocation.take_out::<i32>("parsed").unwrap(), 0);
//! assert!(!invocation.take_return::<bool>().unwrap());
//! ```

pub mod feature;
pub mod parameters;
pub mod value;

pub use feature::{Feature, FeatureKind, FeatureSet, FeatureType};
pub use parameters::{InputParameters, OutParameters, Parameter, RefParameters};
pub use value::{
    AsyncKind, AsyncOutcome, AsyncResult, PropertyIdentity, PropertySetterValue, ReturnValue,
    Slot, SlotRole, TypeDescriptor, Value,
};

use crate::contract::MemberSignature;
use crate::result::{MockError, MockResult};
use std::any::Any;

/// Record of one intercepted call.
///
/// Feature presence is fixed at construction; only slot contents change.
#[derive(Debug)]
pub struct Invocation {
    signature: MemberSignature,
    features: FeatureSet,
}

impl Invocation {
    /// Start describing a call to `signature`
    #[must_use]
    pub fn builder(signature: MemberSignature) -> InvocationBuilder {
        InvocationBuilder::new(signature)
    }

    /// Signature of the called member
    #[must_use]
    pub const fn signature(&self) -> &MemberSignature {
        &self.signature
    }

    /// All features
    #[must_use]
    pub const fn features(&self) -> &FeatureSet {
        &self.features
    }

    /// Whether a feature of `kind` is present
    #[must_use]
    pub fn has_feature(&self, kind: FeatureKind) -> bool {
        self.features.contains(kind)
    }

    /// Feature of `kind`; absence is a caller bug
    pub fn get_feature(&self, kind: FeatureKind) -> MockResult<&Feature> {
        self.features
            .get(kind)
            .ok_or_else(|| self.missing(&kind.to_string()))
    }

    /// Mutable feature of `kind`; absence is a caller bug
    pub fn get_feature_mut(&mut self, kind: FeatureKind) -> MockResult<&mut Feature> {
        let missing = self.missing(&kind.to_string());
        self.features.get_mut(kind).ok_or(missing)
    }

    /// Feature of `kind`, if present
    #[must_use]
    pub fn try_get_feature(&self, kind: FeatureKind) -> Option<&Feature> {
        self.features.get(kind)
    }

    /// Mutable feature of `kind`, if present
    pub fn try_get_feature_mut(&mut self, kind: FeatureKind) -> Option<&mut Feature> {
        self.features.get_mut(kind)
    }

    /// Typed feature; fails closed with `MissingFeature`
    pub fn feature<F: FeatureType>(&self) -> MockResult<&F> {
        self.features.find::<F>().ok_or_else(|| self.missing(F::NAME))
    }

    /// Typed mutable feature; fails closed with `MissingFeature`
    pub fn feature_mut<F: FeatureType>(&mut self) -> MockResult<&mut F> {
        let missing = self.missing(F::NAME);
        self.features.find_mut::<F>().ok_or(missing)
    }

    /// Input parameters
    pub fn input_parameters(&self) -> MockResult<&InputParameters> {
        self.feature()
    }

    /// Ref parameters
    pub fn ref_parameters(&self) -> MockResult<&RefParameters> {
        self.feature()
    }

    /// Mutable ref parameters
    pub fn ref_parameters_mut(&mut self) -> MockResult<&mut RefParameters> {
        self.feature_mut()
    }

    /// Out parameters
    pub fn out_parameters(&self) -> MockResult<&OutParameters> {
        self.feature()
    }

    /// Mutable out parameters
    pub fn out_parameters_mut(&mut self) -> MockResult<&mut OutParameters> {
        self.feature_mut()
    }

    /// Synchronous return slot
    pub fn return_value(&self) -> MockResult<&ReturnValue> {
        self.feature()
    }

    /// Mutable synchronous return slot
    pub fn return_value_mut(&mut self) -> MockResult<&mut ReturnValue> {
        self.feature_mut()
    }

    /// Property the accessor belongs to
    pub fn property_identity(&self) -> MockResult<&PropertyIdentity> {
        self.feature()
    }

    /// Value handed to a setter
    pub fn setter_value(&self) -> MockResult<&PropertySetterValue> {
        self.feature()
    }

    /// Asynchronous return slot (any shape)
    pub fn async_result(&self) -> MockResult<&AsyncResult> {
        self.feature()
    }

    /// Mutable asynchronous return slot (any shape)
    pub fn async_result_mut(&mut self) -> MockResult<&mut AsyncResult> {
        self.feature_mut()
    }

    /// Input argument by name, for predicates
    #[must_use]
    pub fn arg<T: Any>(&self, name: &str) -> Option<&T> {
        self.features.find::<InputParameters>()?.value(name)
    }

    /// Current value of a ref argument by name, for predicates
    #[must_use]
    pub fn ref_arg<T: Any>(&self, name: &str) -> Option<&T> {
        self.features.find::<RefParameters>()?.value(name)
    }

    /// Whether this call is a property (or indexer) accessor
    #[must_use]
    pub fn is_property_access(&self) -> bool {
        self.has_feature(FeatureKind::PropertyIdentity)
    }

    /// Take the return value (zero value when nothing was arranged)
    pub fn take_return<T: Any>(&mut self) -> MockResult<T> {
        self.return_value_mut()?.take()
    }

    /// Take the final value of a ref argument
    pub fn take_ref<T: Any>(&mut self, name: &str) -> MockResult<T> {
        self.ref_parameters_mut()?.take(name)
    }

    /// Take the final value of an out argument
    pub fn take_out<T: Any>(&mut self, name: &str) -> MockResult<T> {
        self.out_parameters_mut()?.take(name)
    }

    /// Take an input argument back (used when forwarding to a decoratee)
    pub fn take_input<T: Any>(&mut self, name: &str) -> MockResult<T> {
        self.feature_mut::<InputParameters>()?.take(name)
    }

    /// Take the setter value back (used when forwarding to a decoratee)
    pub fn take_setter_value<T: Any>(&mut self) -> MockResult<T> {
        self.feature_mut::<PropertySetterValue>()?.take()
    }

    /// Take the resolved async value (zero value when unresolved)
    pub fn take_async_value<T: Any>(&mut self) -> MockResult<T> {
        self.async_result_mut()?.take_value()
    }

    /// Take the resolved stream elements (empty when unresolved)
    pub fn take_async_stream<T: Any>(&mut self) -> MockResult<Vec<T>> {
        self.async_result_mut()?.take_stream()
    }

    /// Whether an async completion is present
    pub fn is_completed(&self) -> MockResult<bool> {
        Ok(self.async_result()?.is_completed())
    }

    fn missing(&self, feature: &str) -> MockError {
        MockError::MissingFeature {
            member: self.signature.to_string(),
            feature: feature.to_string(),
        }
    }
}

/// Result shape of a call; sync and async returns are mutually exclusive
#[derive(Debug)]
enum ResultShape {
    Unit,
    Sync(ReturnValue),
    Async(AsyncResult),
}

/// Builder used by the proxy boundary to describe one call.
///
/// Features are only attached when the member's shape calls for them: a
/// call without `&mut` arguments never carries `RefParameters`.
#[derive(Debug)]
pub struct InvocationBuilder {
    signature: MemberSignature,
    inputs: InputParameters,
    refs: RefParameters,
    outs: OutParameters,
    result: ResultShape,
    property: Option<PropertyIdentity>,
    setter: Option<PropertySetterValue>,
}

impl InvocationBuilder {
    fn new(signature: MemberSignature) -> Self {
        let member = signature.name();
        Self {
            signature,
            inputs: InputParameters::new(member),
            refs: RefParameters::new(member),
            outs: OutParameters::new(member),
            result: ResultShape::Unit,
            property: None,
            setter: None,
        }
    }

    /// Add a by-value argument
    #[must_use]
    pub fn input<T: Any + Send>(mut self, name: &'static str, value: T) -> Self {
        self.inputs
            .push(name, TypeDescriptor::opaque::<T>(), Box::new(value));
        self
    }

    /// Add an argument whose value cannot be captured because it borrows
    /// from the caller; only its name and type name are recorded
    #[must_use]
    pub fn unrecorded_input<T: ?Sized>(mut self, name: &'static str, _value: &T) -> Self {
        self.inputs
            .push_unrecorded(name, TypeDescriptor::unrecorded::<T>());
        self
    }

    /// Add a `&mut` argument carrying its current value
    #[must_use]
    pub fn reference<T: Any + Send + Default>(mut self, name: &'static str, value: T) -> Self {
        self.refs.push(name, TypeDescriptor::of::<T>(), Box::new(value));
        self
    }

    /// Add an out argument (starts at the zero value)
    #[must_use]
    pub fn out<T: Any + Send + Default>(mut self, name: &'static str) -> Self {
        self.outs.push(name, TypeDescriptor::of::<T>());
        self
    }

    /// Declare a synchronous return of type `T`
    #[must_use]
    pub fn returns<T: Any + Send + Default>(mut self) -> Self {
        self.result = ResultShape::Sync(ReturnValue::new(
            self.signature.name(),
            TypeDescriptor::of::<T>(),
        ));
        self
    }

    /// Declare a future resolving to `T`
    #[must_use]
    pub fn returns_async<T: Any + Send + Default>(mut self) -> Self {
        self.result = ResultShape::Async(AsyncResult::new(
            self.signature.name(),
            AsyncKind::Value,
            TypeDescriptor::of::<T>(),
        ));
        self
    }

    /// Declare a future resolving to nothing
    #[must_use]
    pub fn completes_async(mut self) -> Self {
        self.result = ResultShape::Async(AsyncResult::new(
            self.signature.name(),
            AsyncKind::Completion,
            TypeDescriptor::of::<()>(),
        ));
        self
    }

    /// Declare a stream yielding `T`
    #[must_use]
    pub fn streams<T: Any + Send>(mut self) -> Self {
        self.result = ResultShape::Async(AsyncResult::new(
            self.signature.name(),
            AsyncKind::Stream,
            TypeDescriptor::opaque::<T>(),
        ));
        self
    }

    /// Mark the call as an accessor of `property`
    #[must_use]
    pub fn property(mut self, property: MemberSignature) -> Self {
        self.property = Some(PropertyIdentity::new(property));
        self
    }

    /// Attach the value handed to a setter
    #[must_use]
    pub fn setter_value<T: Any + Send>(mut self, value: T) -> Self {
        self.setter = Some(PropertySetterValue::new(
            self.signature.name(),
            TypeDescriptor::opaque::<T>(),
            Box::new(value),
        ));
        self
    }

    /// Finish the invocation
    #[must_use]
    pub fn build(self) -> Invocation {
        let mut features = FeatureSet::default();
        if !self.inputs.is_empty() {
            features.insert(self.inputs.into());
        }
        if !self.refs.is_empty() {
            features.insert(self.refs.into());
        }
        if !self.outs.is_empty() {
            features.insert(self.outs.into());
        }
        match self.result {
            ResultShape::Unit => {}
            ResultShape::Sync(ret) => features.insert(ret.into()),
            ResultShape::Async(result) => features.insert(result.into()),
        }
        if let Some(property) = self.property {
            features.insert(property.into());
        }
        if let Some(setter) = self.setter {
            features.insert(setter.into());
        }
        Invocation {
            signature: self.signature,
            features,
        }
    }
}
