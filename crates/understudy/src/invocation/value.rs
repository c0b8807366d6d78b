//! Type-erased values and the typed slots that hold them.

use crate::contract::MemberSignature;
use crate::result::{MockError, MockResult};
use std::any::{Any, TypeId};
use std::fmt;

/// A type-erased value carried by an invocation
pub type Value = Box<dyn Any + Send>;

fn zero_of<T: Any + Send + Default>() -> Value {
    Box::new(T::default())
}

/// Marker id shared by every argument whose value is not captured
enum Unrecorded {}

/// Declared type of a parameter, return slot or setter value.
///
/// `zero` produces the type's `Default` value. Return, out and ref slots
/// always have one; opaque input parameters may not.
#[derive(Clone, Copy)]
pub struct TypeDescriptor {
    id: TypeId,
    name: &'static str,
    zero: Option<fn() -> Value>,
}

impl TypeDescriptor {
    /// Descriptor for a type with a zero value
    #[must_use]
    pub fn of<T: Any + Send + Default>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
            zero: Some(zero_of::<T>),
        }
    }

    /// Descriptor for a type without a zero value
    #[must_use]
    pub fn opaque<T: Any + Send>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
            zero: None,
        }
    }

    /// Descriptor naming a type whose values are never captured, such as
    /// an argument borrowing from the caller
    #[must_use]
    pub fn unrecorded<T: ?Sized>() -> Self {
        Self {
            id: TypeId::of::<Unrecorded>(),
            name: std::any::type_name::<T>(),
            zero: None,
        }
    }

    /// Whether values of this type are captured
    #[must_use]
    pub fn is_recorded(&self) -> bool {
        self.id != TypeId::of::<Unrecorded>()
    }

    /// Type id
    #[must_use]
    pub const fn id(&self) -> TypeId {
        self.id
    }

    /// Type name
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Whether this describes `T`
    #[must_use]
    pub fn is<T: Any>(&self) -> bool {
        self.id == TypeId::of::<T>()
    }

    /// Whether a zero value exists
    #[must_use]
    pub const fn has_zero(&self) -> bool {
        self.zero.is_some()
    }

    /// Fresh zero value, if the type has one
    #[must_use]
    pub fn zero_value(&self) -> Option<Value> {
        self.zero.map(|zero| zero())
    }

    /// Whether an erased value has this type
    #[must_use]
    pub fn accepts(&self, value: &Value) -> bool {
        (**value).type_id() == self.id
    }
}

impl PartialEq for TypeDescriptor {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeDescriptor {}

impl fmt::Debug for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// Role of a slot within an invocation, used in error messages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotRole {
    /// Input parameter
    Input,
    /// Ref parameter
    Ref,
    /// Out parameter
    Out,
    /// Return value
    Return,
    /// Property setter value
    SetterValue,
}

impl SlotRole {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Input => "input parameter",
            Self::Ref => "ref parameter",
            Self::Out => "out parameter",
            Self::Return => "return value",
            Self::SetterValue => "setter value",
        }
    }
}

/// A typed, possibly empty, value holder.
pub struct Slot {
    member: &'static str,
    role: SlotRole,
    name: &'static str,
    declared: TypeDescriptor,
    value: Option<Value>,
}

impl Slot {
    pub(crate) fn empty(
        member: &'static str,
        role: SlotRole,
        name: &'static str,
        declared: TypeDescriptor,
    ) -> Self {
        Self {
            member,
            role,
            name,
            declared,
            value: None,
        }
    }

    pub(crate) fn zeroed(
        member: &'static str,
        role: SlotRole,
        name: &'static str,
        declared: TypeDescriptor,
    ) -> Self {
        Self {
            value: declared.zero_value(),
            ..Self::empty(member, role, name, declared)
        }
    }

    pub(crate) fn filled(
        member: &'static str,
        role: SlotRole,
        name: &'static str,
        declared: TypeDescriptor,
        value: Value,
    ) -> Self {
        Self {
            value: Some(value),
            ..Self::empty(member, role, name, declared)
        }
    }

    /// Declared type
    #[must_use]
    pub const fn declared(&self) -> &TypeDescriptor {
        &self.declared
    }

    /// Slot role
    #[must_use]
    pub const fn role(&self) -> SlotRole {
        self.role
    }

    /// Whether a value is present
    #[must_use]
    pub const fn is_set(&self) -> bool {
        self.value.is_some()
    }

    /// Borrow the value as `T`
    #[must_use]
    pub fn get<T: Any>(&self) -> Option<&T> {
        self.value.as_ref()?.downcast_ref::<T>()
    }

    /// Mutably borrow the value as `T`
    pub fn get_mut<T: Any>(&mut self) -> Option<&mut T> {
        self.value.as_mut()?.downcast_mut::<T>()
    }

    /// Store a typed value
    pub fn set<T: Any + Send>(&mut self, value: T) -> MockResult<()> {
        if !self.declared.is::<T>() {
            return Err(self.mismatch(std::any::type_name::<T>()));
        }
        self.value = Some(Box::new(value));
        Ok(())
    }

    /// Store an erased value
    pub fn set_value(&mut self, value: Value) -> MockResult<()> {
        if !self.declared.accepts(&value) {
            return Err(self.mismatch("<erased value>"));
        }
        self.value = Some(value);
        Ok(())
    }

    /// Take the value as `T`, falling back to the zero value when empty
    pub fn take<T: Any>(&mut self) -> MockResult<T> {
        if !self.declared.is::<T>() {
            return Err(self.mismatch(std::any::type_name::<T>()));
        }
        let value = match self.value.take().or_else(|| self.declared.zero_value()) {
            Some(value) => value,
            None => return Err(self.mismatch("nothing (no value and no default)")),
        };
        value
            .downcast::<T>()
            .map(|boxed| *boxed)
            .map_err(|_| self.mismatch(std::any::type_name::<T>()))
    }

    /// Reset to empty
    pub fn clear(&mut self) {
        self.value = None;
    }

    fn mismatch(&self, found: &str) -> MockError {
        let slot = if self.name.is_empty() {
            format!("{} of '{}'", self.role.as_str(), self.member)
        } else {
            format!("{} '{}' of '{}'", self.role.as_str(), self.name, self.member)
        };
        MockError::TypeMismatch {
            slot,
            expected: self.declared.name().to_string(),
            found: found.to_string(),
        }
    }
}

impl fmt::Debug for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Slot")
            .field("role", &self.role)
            .field("name", &self.name)
            .field("declared", &self.declared)
            .field("set", &self.value.is_some())
            .finish()
    }
}

/// Return slot of a synchronous call or property getter
#[derive(Debug)]
pub struct ReturnValue {
    slot: Slot,
}

impl ReturnValue {
    pub(crate) fn new(member: &'static str, declared: TypeDescriptor) -> Self {
        Self {
            slot: Slot::empty(member, SlotRole::Return, "", declared),
        }
    }

    /// Declared return type
    #[must_use]
    pub const fn declared(&self) -> &TypeDescriptor {
        self.slot.declared()
    }

    /// Whether an arrangement supplied a value
    #[must_use]
    pub const fn is_set(&self) -> bool {
        self.slot.is_set()
    }

    /// Borrow the value as `T`
    #[must_use]
    pub fn get<T: Any>(&self) -> Option<&T> {
        self.slot.get()
    }

    /// Store a typed value
    pub fn set<T: Any + Send>(&mut self, value: T) -> MockResult<()> {
        self.slot.set(value)
    }

    /// Store an erased value
    pub fn set_value(&mut self, value: Value) -> MockResult<()> {
        self.slot.set_value(value)
    }

    /// Take the value, or the zero value when nothing was arranged
    pub fn take<T: Any>(&mut self) -> MockResult<T> {
        self.slot.take()
    }
}

/// Which property an accessor call belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PropertyIdentity {
    property: MemberSignature,
}

impl PropertyIdentity {
    pub(crate) const fn new(property: MemberSignature) -> Self {
        Self { property }
    }

    /// Property signature
    #[must_use]
    pub const fn property(&self) -> MemberSignature {
        self.property
    }
}

/// Value passed to a property (or indexer) setter
#[derive(Debug)]
pub struct PropertySetterValue {
    slot: Slot,
}

impl PropertySetterValue {
    pub(crate) fn new(member: &'static str, declared: TypeDescriptor, value: Value) -> Self {
        Self {
            slot: Slot::filled(member, SlotRole::SetterValue, "value", declared, value),
        }
    }

    /// Declared value type
    #[must_use]
    pub const fn declared(&self) -> &TypeDescriptor {
        self.slot.declared()
    }

    /// Borrow the value as `T`
    #[must_use]
    pub fn get<T: Any>(&self) -> Option<&T> {
        self.slot.get()
    }

    /// Take the value (used when forwarding to a decoratee)
    pub fn take<T: Any>(&mut self) -> MockResult<T> {
        self.slot.take()
    }
}

/// Shape of an asynchronous return
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AsyncKind {
    /// Resolves with no value
    Completion,
    /// Resolves with one value
    Value,
    /// Yields a sequence of elements
    Stream,
}

impl AsyncKind {
    /// Lowercase description
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Completion => "completion",
            Self::Value => "value",
            Self::Stream => "stream",
        }
    }
}

impl fmt::Display for AsyncKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resolved content of an asynchronous result
pub enum AsyncOutcome {
    /// Bare completion
    Completed,
    /// Single typed result
    Value(Value),
    /// Element stream
    Stream(Vec<Value>),
}

impl fmt::Debug for AsyncOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Completed => f.write_str("Completed"),
            Self::Value(_) => f.write_str("Value(..)"),
            Self::Stream(items) => write!(f, "Stream({} items)", items.len()),
        }
    }
}

/// Result slot of a call returning a future or a stream.
///
/// Holds an already-resolved outcome; the proxy wraps it in a ready
/// future or stream after dispatch.
#[derive(Debug)]
pub struct AsyncResult {
    member: &'static str,
    kind: AsyncKind,
    element: TypeDescriptor,
    outcome: Option<AsyncOutcome>,
}

impl AsyncResult {
    pub(crate) fn new(member: &'static str, kind: AsyncKind, element: TypeDescriptor) -> Self {
        Self {
            member,
            kind,
            element,
            outcome: None,
        }
    }

    /// Async shape
    #[must_use]
    pub const fn kind(&self) -> AsyncKind {
        self.kind
    }

    /// Declared result (or element) type; `()` for completions
    #[must_use]
    pub const fn element(&self) -> &TypeDescriptor {
        &self.element
    }

    /// Whether an arrangement resolved this result
    #[must_use]
    pub const fn is_resolved(&self) -> bool {
        self.outcome.is_some()
    }

    /// Current outcome
    #[must_use]
    pub const fn outcome(&self) -> Option<&AsyncOutcome> {
        self.outcome.as_ref()
    }

    /// Resolve a completion
    pub fn complete(&mut self) -> MockResult<()> {
        self.expect_kind(AsyncKind::Completion)?;
        self.outcome = Some(AsyncOutcome::Completed);
        Ok(())
    }

    /// Resolve with a typed value
    pub fn set_value<T: Any + Send>(&mut self, value: T) -> MockResult<()> {
        self.set_erased_value(Box::new(value))
    }

    /// Resolve with an erased value
    pub fn set_erased_value(&mut self, value: Value) -> MockResult<()> {
        self.expect_kind(AsyncKind::Value)?;
        if !self.element.accepts(&value) {
            return Err(self.mismatch("<erased value>"));
        }
        self.outcome = Some(AsyncOutcome::Value(value));
        Ok(())
    }

    /// Resolve a stream with erased elements
    pub fn set_stream(&mut self, items: Vec<Value>) -> MockResult<()> {
        self.expect_kind(AsyncKind::Stream)?;
        if items.iter().any(|item| !self.element.accepts(item)) {
            return Err(self.mismatch("<erased element>"));
        }
        self.outcome = Some(AsyncOutcome::Stream(items));
        Ok(())
    }

    /// Whether the result is a completion (resolved or not, a completion
    /// always finishes)
    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.kind == AsyncKind::Completion
    }

    /// Take the resolved value, or the zero value when unresolved
    pub fn take_value<T: Any>(&mut self) -> MockResult<T> {
        self.expect_kind(AsyncKind::Value)?;
        if !self.element.is::<T>() {
            return Err(self.mismatch(std::any::type_name::<T>()));
        }
        let value = match self.outcome.take() {
            Some(AsyncOutcome::Value(value)) => Some(value),
            _ => self.element.zero_value(),
        };
        value
            .and_then(|v| v.downcast::<T>().ok())
            .map(|boxed| *boxed)
            .ok_or_else(|| self.mismatch("nothing (no value and no default)"))
    }

    /// Take the resolved elements, or an empty stream when unresolved
    pub fn take_stream<T: Any>(&mut self) -> MockResult<Vec<T>> {
        self.expect_kind(AsyncKind::Stream)?;
        if !self.element.is::<T>() {
            return Err(self.mismatch(std::any::type_name::<T>()));
        }
        let items = match self.outcome.take() {
            Some(AsyncOutcome::Stream(items)) => items,
            _ => Vec::new(),
        };
        items
            .into_iter()
            .map(|item| {
                item.downcast::<T>()
                    .map(|boxed| *boxed)
                    .map_err(|_| self.mismatch("<erased element>"))
            })
            .collect()
    }

    fn expect_kind(&self, kind: AsyncKind) -> MockResult<()> {
        if self.kind == kind {
            Ok(())
        } else {
            Err(MockError::TypeMismatch {
                slot: format!("async result of '{}'", self.member),
                expected: self.kind.to_string(),
                found: kind.to_string(),
            })
        }
    }

    fn mismatch(&self, found: &str) -> MockError {
        MockError::TypeMismatch {
            slot: format!("async {} of '{}'", self.kind, self.member),
            expected: self.element.name().to_string(),
            found: found.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_descriptor_zero() {
        let d = TypeDescriptor::of::<u32>();
        assert!(d.has_zero());
        let zero = d.zero_value().unwrap();
        assert_eq!(zero.downcast_ref::<u32>(), Some(&0));
        assert!(d.accepts(&zero));
        assert!(!d.accepts(&(Box::new(1i64) as Value)));

        let opaque = TypeDescriptor::opaque::<std::fs::File>();
        assert!(!opaque.has_zero());
        assert!(opaque.zero_value().is_none());
    }

    #[test]
    fn test_return_value_defaults_to_zero() {
        let mut ret = ReturnValue::new("count", TypeDescriptor::of::<u64>());
        assert!(!ret.is_set());
        assert_eq!(ret.take::<u64>().unwrap(), 0);
    }

    #[test]
    fn test_return_value_set_and_take() {
        let mut ret = ReturnValue::new("name", TypeDescriptor::of::<String>());
        ret.set("alice".to_string()).unwrap();
        assert_eq!(ret.get::<String>().map(String::as_str), Some("alice"));
        assert_eq!(ret.take::<String>().unwrap(), "alice");
    }

    #[test]
    fn test_return_value_rejects_wrong_type() {
        let mut ret = ReturnValue::new("count", TypeDescriptor::of::<u64>());
        let err = ret.set("oops").unwrap_err();
        match err {
            MockError::TypeMismatch { slot, expected, .. } => {
                assert!(slot.contains("count"));
                assert_eq!(expected, "u64");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(ret.set_value(Box::new(1u8)).is_err());
        assert!(ret.take::<u8>().is_err());
    }

    #[test]
    fn test_async_value_zero_and_resolved() {
        let mut unresolved =
            AsyncResult::new("fetch", AsyncKind::Value, TypeDescriptor::of::<i32>());
        assert_eq!(unresolved.take_value::<i32>().unwrap(), 0);

        let mut resolved = AsyncResult::new("fetch", AsyncKind::Value, TypeDescriptor::of::<i32>());
        resolved.set_value(9i32).unwrap();
        assert!(resolved.is_resolved());
        assert_eq!(resolved.take_value::<i32>().unwrap(), 9);
    }

    #[test]
    fn test_async_stream() {
        let mut stream =
            AsyncResult::new("list", AsyncKind::Stream, TypeDescriptor::opaque::<u8>());
        assert!(stream.take_stream::<u8>().unwrap().is_empty());

        stream
            .set_stream(vec![Box::new(1u8) as Value, Box::new(2u8) as Value])
            .unwrap();
        assert_eq!(stream.take_stream::<u8>().unwrap(), vec![1, 2]);
        assert!(stream.set_stream(vec![Box::new(1u16) as Value]).is_err());
    }

    #[test]
    fn test_async_kind_mismatch() {
        let mut completion =
            AsyncResult::new("flush", AsyncKind::Completion, TypeDescriptor::of::<()>());
        assert!(completion.set_value(()).is_err());
        completion.complete().unwrap();
        assert!(completion.is_completed());
        assert!(matches!(
            completion.outcome(),
            Some(AsyncOutcome::Completed)
        ));
    }
}
