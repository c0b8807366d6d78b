//! Fluent arrangement configuration.

use super::{Arrangement, ArrangementCollection, Effect, ValueFactory};
use crate::contract::MemberSignature;
use crate::invocation::{Invocation, Value};
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// Accumulates predicates and effects for one member, then registers them.
///
/// Obtained from [`ArrangementCollection::method`], [`getter`] or
/// [`setter`]. Terminal methods register the arrangement and hand the
/// collection back so further members can be arranged.
///
/// [`getter`]: ArrangementCollection::getter
/// [`setter`]: ArrangementCollection::setter
#[must_use = "an arrangement is only registered by a terminal method"]
pub struct ArrangementBuilder<'a> {
    collection: &'a ArrangementCollection,
    arrangement: Arrangement,
}

fn cloning<T: Any + Send + Sync + Clone>(value: T) -> ValueFactory {
    Arc::new(move |_: &Invocation| -> Value { Box::new(value.clone()) })
}

impl<'a> ArrangementBuilder<'a> {
    pub(crate) fn new(collection: &'a ArrangementCollection, signature: MemberSignature) -> Self {
        Self {
            collection,
            arrangement: Arrangement::new(signature),
        }
    }

    /// Only match calls accepted by `predicate`
    pub fn when<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&Invocation) -> bool + Send + Sync + 'static,
    {
        self.arrangement = self.arrangement.with_predicate(Arc::new(predicate));
        self
    }

    /// Only match calls whose input `name` equals `expected`
    pub fn with_arg<T>(self, name: &'static str, expected: T) -> Self
    where
        T: Any + PartialEq + Send + Sync,
    {
        self.when(move |invocation| invocation.arg::<T>(name) == Some(&expected))
    }

    /// Only match setter calls receiving `expected`
    pub fn with_setter_value<T>(self, expected: T) -> Self
    where
        T: Any + PartialEq + Send + Sync,
    {
        self.when(move |invocation| {
            invocation
                .setter_value()
                .ok()
                .and_then(|setter| setter.get::<T>())
                == Some(&expected)
        })
    }

    /// Describe the arrangement in logs
    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.arrangement = self.arrangement.with_description(description);
        self
    }

    /// Assign out parameter `name`
    pub fn sets_out<T>(mut self, name: impl Into<String>, value: T) -> Self
    where
        T: Any + Clone + Send + Sync,
    {
        self.arrangement = self.arrangement.with_effect(Effect::Out {
            name: name.into(),
            value: cloning(value),
        });
        self
    }

    /// Overwrite ref parameter `name`
    pub fn sets_ref<T>(mut self, name: impl Into<String>, value: T) -> Self
    where
        T: Any + Clone + Send + Sync,
    {
        self.arrangement = self.arrangement.with_effect(Effect::Ref {
            name: name.into(),
            value: cloning(value),
        });
        self
    }

    /// Run `callback` against the matched call
    pub fn invokes<F>(mut self, callback: F) -> Self
    where
        F: Fn(&mut Invocation) + Send + Sync + 'static,
    {
        self.arrangement = self.arrangement.with_effect(Effect::Invoke(Arc::new(callback)));
        self
    }

    /// Return `value` (a clone per call); resolves async values too
    pub fn returns<T>(self, value: T) -> &'a ArrangementCollection
    where
        T: Any + Clone + Send + Sync,
    {
        self.finish(Effect::Return(cloning(value)))
    }

    /// Return a value computed from the call
    pub fn returns_with<T, F>(self, produce: F) -> &'a ArrangementCollection
    where
        T: Any + Send,
        F: Fn(&Invocation) -> T + Send + Sync + 'static,
    {
        self.finish(Effect::Return(Arc::new(
            move |invocation: &Invocation| -> Value { Box::new(produce(invocation)) },
        )))
    }

    /// Resolve an async completion
    pub fn completes(self) -> &'a ArrangementCollection {
        self.finish(Effect::Complete)
    }

    /// Resolve an async stream with `items` (cloned per call)
    pub fn streams<T>(self, items: impl IntoIterator<Item = T>) -> &'a ArrangementCollection
    where
        T: Any + Clone + Send + Sync,
    {
        let items: Vec<T> = items.into_iter().collect();
        self.finish(Effect::Stream(Arc::new(move || -> Vec<Value> {
            items
                .iter()
                .cloned()
                .map(|item| Box::new(item) as Value)
                .collect()
        })))
    }

    /// Match without touching return slots
    pub fn does_nothing(self) -> &'a ArrangementCollection {
        self.register()
    }

    /// Register the predicates and effects accumulated so far
    pub fn register(self) -> &'a ArrangementCollection {
        self.collection.add(self.arrangement)
    }

    fn finish(mut self, effect: Effect) -> &'a ArrangementCollection {
        self.arrangement = self.arrangement.with_effect(effect);
        self.register()
    }
}

impl fmt::Debug for ArrangementBuilder<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArrangementBuilder")
            .field("arrangement", &self.arrangement)
            .finish()
    }
}
