//! Parameter features: input, ref and out parameter lists.

use super::value::{Slot, SlotRole, TypeDescriptor, Value};
use crate::result::{MockError, MockResult};
use std::any::Any;

/// One named, typed parameter
#[derive(Debug)]
pub struct Parameter {
    name: &'static str,
    slot: Slot,
}

impl Parameter {
    /// Parameter name
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Declared type
    #[must_use]
    pub const fn declared(&self) -> &TypeDescriptor {
        self.slot.declared()
    }

    /// Borrow the value as `T`
    #[must_use]
    pub fn value<T: Any>(&self) -> Option<&T> {
        self.slot.get()
    }

    /// Whether the parameter currently holds a value
    #[must_use]
    pub const fn is_set(&self) -> bool {
        self.slot.is_set()
    }
}

/// Ordered parameters of one passing mode with by-name lookup
#[derive(Debug)]
struct ParameterList {
    member: &'static str,
    mode: &'static str,
    params: Vec<Parameter>,
}

impl ParameterList {
    fn new(member: &'static str, mode: &'static str) -> Self {
        Self {
            member,
            mode,
            params: Vec::new(),
        }
    }

    fn push(&mut self, name: &'static str, slot: Slot) {
        self.params.push(Parameter { name, slot });
    }

    fn find(&self, name: &str) -> Option<&Parameter> {
        self.params.iter().find(|p| p.name == name)
    }

    fn slot_mut(&mut self, name: &str) -> MockResult<&mut Slot> {
        let member = self.member;
        let mode = self.mode;
        self.params
            .iter_mut()
            .find(|p| p.name == name)
            .map(|p| &mut p.slot)
            .ok_or_else(|| MockError::UnknownParameter {
                member: member.to_string(),
                mode,
                parameter: name.to_string(),
            })
    }
}

macro_rules! parameter_list_accessors {
    () => {
        /// Number of parameters
        #[must_use]
        pub fn len(&self) -> usize {
            self.list.params.len()
        }

        /// Whether there are no parameters
        #[must_use]
        pub fn is_empty(&self) -> bool {
            self.list.params.is_empty()
        }

        /// Parameter at a position
        #[must_use]
        pub fn get(&self, index: usize) -> Option<&Parameter> {
            self.list.params.get(index)
        }

        /// Parameter by name
        #[must_use]
        pub fn by_name(&self, name: &str) -> Option<&Parameter> {
            self.list.find(name)
        }

        /// Value of a named parameter as `T`
        #[must_use]
        pub fn value<T: Any>(&self, name: &str) -> Option<&T> {
            self.list.find(name)?.value()
        }

        /// Parameters in declaration order
        pub fn iter(&self) -> impl Iterator<Item = &Parameter> {
            self.list.params.iter()
        }

        /// Parameter names in declaration order
        #[must_use]
        pub fn names(&self) -> Vec<&'static str> {
            self.list.params.iter().map(|p| p.name).collect()
        }

        /// Take a named value (read back by the proxy after dispatch)
        pub fn take<T: Any>(&mut self, name: &str) -> MockResult<T> {
            self.list.slot_mut(name)?.take()
        }
    };
}

/// By-value (and by-shared-reference) arguments
#[derive(Debug)]
pub struct InputParameters {
    list: ParameterList,
}

impl InputParameters {
    pub(crate) fn new(member: &'static str) -> Self {
        Self {
            list: ParameterList::new(member, "input"),
        }
    }

    pub(crate) fn push(&mut self, name: &'static str, declared: TypeDescriptor, value: Value) {
        let slot = Slot::filled(self.list.member, SlotRole::Input, name, declared, value);
        self.list.push(name, slot);
    }

    pub(crate) fn push_unrecorded(&mut self, name: &'static str, declared: TypeDescriptor) {
        let slot = Slot::empty(self.list.member, SlotRole::Input, name, declared);
        self.list.push(name, slot);
    }

    parameter_list_accessors!();
}

/// `&mut` arguments whose final value flows back to the caller
#[derive(Debug)]
pub struct RefParameters {
    list: ParameterList,
}

impl RefParameters {
    pub(crate) fn new(member: &'static str) -> Self {
        Self {
            list: ParameterList::new(member, "ref"),
        }
    }

    pub(crate) fn push(&mut self, name: &'static str, declared: TypeDescriptor, value: Value) {
        let slot = Slot::filled(self.list.member, SlotRole::Ref, name, declared, value);
        self.list.push(name, slot);
    }

    parameter_list_accessors!();

    /// Overwrite a named value
    pub fn set<T: Any + Send>(&mut self, name: &str, value: T) -> MockResult<()> {
        self.list.slot_mut(name)?.set(value)
    }

    /// Overwrite a named value with an erased value
    pub fn set_value(&mut self, name: &str, value: Value) -> MockResult<()> {
        self.list.slot_mut(name)?.set_value(value)
    }

    /// Mutably borrow a named value in place
    pub fn value_mut<T: Any>(&mut self, name: &str) -> MockResult<Option<&mut T>> {
        Ok(self.list.slot_mut(name)?.get_mut())
    }
}

/// `&mut` arguments treated as pure outputs; they start at the zero value
#[derive(Debug)]
pub struct OutParameters {
    list: ParameterList,
}

impl OutParameters {
    pub(crate) fn new(member: &'static str) -> Self {
        Self {
            list: ParameterList::new(member, "out"),
        }
    }

    pub(crate) fn push(&mut self, name: &'static str, declared: TypeDescriptor) {
        let slot = Slot::zeroed(self.list.member, SlotRole::Out, name, declared);
        self.list.push(name, slot);
    }

    parameter_list_accessors!();

    /// Assign a named output
    pub fn set<T: Any + Send>(&mut self, name: &str, value: T) -> MockResult<()> {
        self.list.slot_mut(name)?.set(value)
    }

    /// Assign a named output with an erased value
    pub fn set_value(&mut self, name: &str, value: Value) -> MockResult<()> {
        self.list.slot_mut(name)?.set_value(value)
    }
}
