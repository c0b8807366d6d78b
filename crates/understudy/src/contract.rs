//! Contract Metadata
//!
//! Runtime description of the trait a double stands in for: its identity,
//! its callable members and its property accessor pairs.
//!
//! A contract is a trait used as a trait object (`dyn Repo`). The
//! [`Contract`] trait is the seam between the engine and the proxy
//! boundary: `#[double]` implements it for `dyn Trait`, hand-written
//! proxies implement it directly.

use crate::proxy::ProxyCore;
use crate::result::{MockError, MockResult};
use std::any::TypeId;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Identity of a contract type.
///
/// Equality and hashing use the [`TypeId`] only; the name is for messages.
#[derive(Clone, Copy)]
pub struct ContractType {
    id: TypeId,
    name: &'static str,
}

impl ContractType {
    /// Identity of `C`, named after the last path segment of its type name
    #[must_use]
    pub fn of<C: ?Sized + 'static>() -> Self {
        Self::named::<C>(short_type_name(std::any::type_name::<C>()))
    }

    /// Identity of `C` with an explicit display name
    #[must_use]
    pub fn named<C: ?Sized + 'static>(name: &'static str) -> Self {
        Self {
            id: TypeId::of::<C>(),
            name,
        }
    }

    /// Underlying type id
    #[must_use]
    pub const fn id(&self) -> TypeId {
        self.id
    }

    /// Display name
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Whether this identifies `C`
    #[must_use]
    pub fn is<C: ?Sized + 'static>(&self) -> bool {
        self.id == TypeId::of::<C>()
    }
}

impl PartialEq for ContractType {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ContractType {}

impl Hash for ContractType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for ContractType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContractType({})", self.name)
    }
}

impl fmt::Display for ContractType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// Strip `dyn ` and the module path from a `type_name` result.
pub(crate) fn short_type_name(full: &'static str) -> &'static str {
    let trimmed = full.strip_prefix("dyn ").unwrap_or(full);
    let head_end = trimmed.find(['<', ' ', '+']).unwrap_or(trimmed.len());
    let start = trimmed[..head_end].rfind("::").map_or(0, |i| i + 2);
    &trimmed[start..]
}

/// Whether a signature names a callable member or a property
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MemberKind {
    /// Method or property accessor
    Method,
    /// The property itself (carried by the `PropertyIdentity` feature)
    Property,
}

/// Comparable identity of one declared member of a contract.
///
/// Two signatures are equal iff they name the same member (of the same
/// kind) declared on the same contract type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MemberSignature {
    declaring: ContractType,
    name: &'static str,
    kind: MemberKind,
}

impl MemberSignature {
    /// Signature of a method (or property accessor)
    #[must_use]
    pub const fn method(declaring: ContractType, name: &'static str) -> Self {
        Self {
            declaring,
            name,
            kind: MemberKind::Method,
        }
    }

    /// Signature of a property
    #[must_use]
    pub const fn property(declaring: ContractType, name: &'static str) -> Self {
        Self {
            declaring,
            name,
            kind: MemberKind::Property,
        }
    }

    /// Declaring contract
    #[must_use]
    pub const fn declaring(&self) -> ContractType {
        self.declaring
    }

    /// Member name
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Member kind
    #[must_use]
    pub const fn kind(&self) -> MemberKind {
        self.kind
    }
}

impl fmt::Display for MemberSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}", self.declaring.name(), self.name)
    }
}

/// Human-readable classification of a member, used in strict failures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MemberClassification {
    /// Plain method
    Method,
    /// Property (or indexer) getter
    PropertyGetter,
    /// Property (or indexer) setter
    PropertySetter,
}

impl MemberClassification {
    /// Lowercase description
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Method => "method",
            Self::PropertyGetter => "property getter",
            Self::PropertySetter => "property setter",
        }
    }
}

impl fmt::Display for MemberClassification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A property and its accessor pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyDescriptor {
    name: &'static str,
    getter: Option<&'static str>,
    setter: Option<&'static str>,
    indexed: bool,
}

impl PropertyDescriptor {
    /// Property name
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Getter accessor name, if readable
    #[must_use]
    pub const fn getter(&self) -> Option<&'static str> {
        self.getter
    }

    /// Setter accessor name, if writable
    #[must_use]
    pub const fn setter(&self) -> Option<&'static str> {
        self.setter
    }

    /// Whether the accessors take index arguments
    #[must_use]
    pub const fn is_indexer(&self) -> bool {
        self.indexed
    }
}

/// Whether a contract can be substituted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContractKind {
    /// A trait object type; can be mocked
    Interface,
    /// A concrete type; mocking it is a `ContractViolation`
    Concrete,
}

/// Static shape of a contract: methods and properties.
#[derive(Debug, Clone)]
pub struct ContractDescriptor {
    contract: ContractType,
    kind: ContractKind,
    methods: Vec<&'static str>,
    properties: Vec<PropertyDescriptor>,
}

impl ContractDescriptor {
    /// Describe an interface contract
    #[must_use]
    pub fn interface<C: ?Sized + 'static>(name: &'static str) -> Self {
        Self::with_kind(ContractType::named::<C>(name), ContractKind::Interface)
    }

    /// Describe a concrete type
    #[must_use]
    pub fn concrete<C: ?Sized + 'static>(name: &'static str) -> Self {
        Self::with_kind(ContractType::named::<C>(name), ContractKind::Concrete)
    }

    fn with_kind(contract: ContractType, kind: ContractKind) -> Self {
        Self {
            contract,
            kind,
            methods: Vec::new(),
            properties: Vec::new(),
        }
    }

    /// Declare a plain method
    #[must_use]
    pub fn method(mut self, name: &'static str) -> Self {
        self.methods.push(name);
        self
    }

    /// Declare a property with its accessor names
    #[must_use]
    pub fn property(
        self,
        name: &'static str,
        getter: Option<&'static str>,
        setter: Option<&'static str>,
    ) -> Self {
        self.push_property(name, getter, setter, false)
    }

    /// Declare an indexer with its accessor names
    #[must_use]
    pub fn indexer(
        self,
        name: &'static str,
        getter: Option<&'static str>,
        setter: Option<&'static str>,
    ) -> Self {
        self.push_property(name, getter, setter, true)
    }

    fn push_property(
        mut self,
        name: &'static str,
        getter: Option<&'static str>,
        setter: Option<&'static str>,
        indexed: bool,
    ) -> Self {
        self.properties.push(PropertyDescriptor {
            name,
            getter,
            setter,
            indexed,
        });
        self
    }

    /// Contract identity
    #[must_use]
    pub const fn contract(&self) -> ContractType {
        self.contract
    }

    /// Contract kind
    #[must_use]
    pub const fn kind(&self) -> ContractKind {
        self.kind
    }

    /// Whether the contract can be mocked
    #[must_use]
    pub fn is_interface(&self) -> bool {
        self.kind == ContractKind::Interface
    }

    /// Plain methods, in declaration order
    #[must_use]
    pub fn methods(&self) -> &[&'static str] {
        &self.methods
    }

    /// Properties, in declaration order
    #[must_use]
    pub fn properties(&self) -> &[PropertyDescriptor] {
        &self.properties
    }

    /// Whether `name` is a callable member (method or accessor)
    #[must_use]
    pub fn declares(&self, name: &str) -> bool {
        self.methods.contains(&name) || self.accessor(name).is_some()
    }

    /// Signature of a callable member (method or accessor)
    pub fn method_signature(&self, name: &str) -> MockResult<MemberSignature> {
        let declared = self
            .methods
            .iter()
            .copied()
            .chain(
                self.properties
                    .iter()
                    .flat_map(|p| p.getter.into_iter().chain(p.setter)),
            )
            .find(|m| *m == name);
        declared
            .map(|m| MemberSignature::method(self.contract, m))
            .ok_or_else(|| self.unknown(name, "method"))
    }

    /// Property by name
    pub fn property_named(&self, name: &str) -> MockResult<&PropertyDescriptor> {
        self.properties
            .iter()
            .find(|p| p.name == name)
            .ok_or_else(|| self.unknown(name, "property"))
    }

    /// Signature of the property itself
    pub fn property_signature(&self, name: &str) -> MockResult<MemberSignature> {
        let property = self.property_named(name)?;
        Ok(MemberSignature::property(self.contract, property.name))
    }

    /// Signature of a property's getter
    pub fn getter_signature(&self, property: &str) -> MockResult<MemberSignature> {
        self.property_named(property)?
            .getter
            .map(|g| MemberSignature::method(self.contract, g))
            .ok_or_else(|| self.unknown(property, "readable property"))
    }

    /// Signature of a property's setter
    pub fn setter_signature(&self, property: &str) -> MockResult<MemberSignature> {
        self.property_named(property)?
            .setter
            .map(|s| MemberSignature::method(self.contract, s))
            .ok_or_else(|| self.unknown(property, "writable property"))
    }

    /// Property whose getter or setter is `accessor`
    #[must_use]
    pub fn accessor(&self, accessor: &str) -> Option<&PropertyDescriptor> {
        self.properties
            .iter()
            .find(|p| p.getter == Some(accessor) || p.setter == Some(accessor))
    }

    /// Classify a signature against the known accessor pairs
    #[must_use]
    pub fn classify(&self, signature: &MemberSignature) -> MemberClassification {
        if signature.declaring() != self.contract {
            return MemberClassification::Method;
        }
        match self.accessor(signature.name()) {
            Some(p) if p.getter == Some(signature.name()) => MemberClassification::PropertyGetter,
            Some(_) => MemberClassification::PropertySetter,
            None => MemberClassification::Method,
        }
    }

    fn unknown(&self, member: &str, kind: &'static str) -> MockError {
        MockError::UnknownMember {
            contract: self.contract.name().to_string(),
            member: member.to_string(),
            kind,
        }
    }
}

/// The seam between the engine and the proxy boundary.
///
/// Implemented for `dyn Trait` by `#[double]`. Hand-written
/// implementations construct a forwarding struct around the supplied
/// [`ProxyCore`]. Concrete types may implement only [`Contract::descriptor`]
/// (with [`ContractKind::Concrete`]); the defaults reject proxy creation.
pub trait Contract: 'static {
    /// Static shape of the contract
    fn descriptor() -> ContractDescriptor;

    /// Instance implementing the contract whose calls go through `core`
    fn create_proxy(core: ProxyCore) -> MockResult<Arc<Self>> {
        let _ = core;
        Err(MockError::ContractViolation {
            contract: Self::descriptor().contract().name().to_string(),
        })
    }

    /// Like [`Contract::create_proxy`], forwarding unhandled calls to `decoratee`
    fn create_decorator(core: ProxyCore, decoratee: Arc<Self>) -> MockResult<Arc<Self>> {
        let _ = (core, decoratee);
        Err(MockError::ContractViolation {
            contract: Self::descriptor().contract().name().to_string(),
        })
    }
}
