//! Mocked instances
//!
//! [`Mocked<T>`] builds the type under test with every constructor
//! dependency replaced by a mocked one, then lets the test arrange each
//! dependency by contract type.
//!
//! Constructors are discovered through [`Subject`], which `#[subject]`
//! implements from an inherent impl block. The type must expose exactly
//! one public constructor.

use crate::arrangement::ArrangementCollection;
use crate::contract::{short_type_name, Contract, ContractType};
use crate::config::MockOptions;
use crate::dependency::{create_erased, ErasedDependency, MockFactory};
use crate::interceptor::Behavior;
use crate::journal::CallJournal;
use crate::result::{MockError, MockResult};
use std::any::TypeId;
use std::collections::HashMap;
use std::fmt;
use std::ops::{Deref, DerefMut};
use std::sync::Arc;
use tracing::{debug, warn};

/// A type whose public constructors can be enumerated
pub trait Subject: Sized + 'static {
    /// Public constructors, in declaration order
    fn constructors() -> Vec<Constructor<Self>>;

    /// Name used in error messages
    fn subject_name() -> &'static str {
        short_type_name(std::any::type_name::<Self>())
    }
}

type CreateDependency = fn(&MockFactory, Behavior) -> MockResult<ErasedDependency>;

/// One constructor parameter that receives a mocked dependency
#[derive(Clone, Copy)]
pub struct DependencySlot {
    name: &'static str,
    contract: ContractType,
    create: CreateDependency,
}

impl DependencySlot {
    /// Parameter name
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Contract injected into the parameter
    #[must_use]
    pub const fn contract(&self) -> ContractType {
        self.contract
    }
}

impl fmt::Debug for DependencySlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: Arc<{}>", self.name, self.contract)
    }
}

type Build<T> = Box<dyn Fn(&mut ConstructorArgs<'_>) -> MockResult<T>>;

/// A public constructor of `T` and the dependencies it takes
pub struct Constructor<T> {
    name: &'static str,
    parameters: Vec<DependencySlot>,
    build: Build<T>,
}

impl<T> Constructor<T> {
    /// Constructor `name`; `build` pulls each dependency from the args in
    /// parameter order
    pub fn new<F>(name: &'static str, build: F) -> Self
    where
        F: Fn(&mut ConstructorArgs<'_>) -> MockResult<T> + 'static,
    {
        Self {
            name,
            parameters: Vec::new(),
            build: Box::new(build),
        }
    }

    /// Declare the next parameter as a mocked `C`
    #[must_use]
    pub fn parameter<C: ?Sized + Contract>(mut self, name: &'static str) -> Self {
        self.parameters.push(DependencySlot {
            name,
            contract: C::descriptor().contract(),
            create: create_erased::<C>,
        });
        self
    }

    /// Constructor name
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Dependency parameters, in order
    #[must_use]
    pub fn parameters(&self) -> &[DependencySlot] {
        &self.parameters
    }
}

impl<T> fmt::Debug for Constructor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Constructor")
            .field("name", &self.name)
            .field("parameters", &self.parameters)
            .finish_non_exhaustive()
    }
}

/// Dependencies handed to a constructor, consumed in parameter order
pub struct ConstructorArgs<'a> {
    subject: &'static str,
    dependencies: &'a [ErasedDependency],
    position: usize,
}

impl ConstructorArgs<'_> {
    /// Proxy instance for the next parameter
    ///
    /// # Errors
    /// `UnknownDependency` when the parameters are exhausted or the next one
    /// is not a `C`
    pub fn next<C: ?Sized + Contract>(&mut self) -> MockResult<Arc<C>> {
        let instance = self
            .dependencies
            .get(self.position)
            .and_then(ErasedDependency::instance::<C>);
        self.position += 1;
        instance.ok_or_else(|| MockError::UnknownDependency {
            subject: self.subject.to_string(),
            contract: C::descriptor().contract().name().to_string(),
        })
    }
}

impl fmt::Debug for ConstructorArgs<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConstructorArgs")
            .field("subject", &self.subject)
            .field("remaining", &(self.dependencies.len().saturating_sub(self.position)))
            .finish()
    }
}

/// The type under test built with mocked dependencies
pub struct Mocked<T: Subject> {
    instance: T,
    dependencies: Vec<ErasedDependency>,
    index: HashMap<TypeId, usize>,
}

impl<T: Subject> Mocked<T> {
    /// Build `T` with every dependency mocked with `behavior`
    ///
    /// # Errors
    /// `ConstructorAmbiguity` unless `T` has exactly one public constructor;
    /// `ContractViolation` if a parameter is not an interface contract
    pub fn new(behavior: Behavior) -> MockResult<Self> {
        Self::builder().behavior(behavior).build()
    }

    /// Configure construction
    #[must_use]
    pub fn builder() -> MockedBuilder<T> {
        MockedBuilder::new()
    }

    /// Arrangements of the dependency substituting `C`
    ///
    /// # Errors
    /// `UnknownDependency` if no constructor parameter is a `C`
    pub fn arrange_for<C: ?Sized + Contract>(&self) -> MockResult<&ArrangementCollection> {
        self.dependency::<C>().map(ErasedDependency::arrangements)
    }

    /// Dependency substituting `C`
    ///
    /// # Errors
    /// `UnknownDependency` if no constructor parameter is a `C`
    pub fn dependency<C: ?Sized + Contract>(&self) -> MockResult<&ErasedDependency> {
        self.index
            .get(&TypeId::of::<C>())
            .map(|&i| &self.dependencies[i])
            .ok_or_else(|| MockError::UnknownDependency {
                subject: T::subject_name().to_string(),
                contract: C::descriptor().contract().name().to_string(),
            })
    }

    /// Journal of the dependency substituting `C`
    ///
    /// # Errors
    /// `UnknownDependency` if no constructor parameter is a `C`
    pub fn journal_for<C: ?Sized + Contract>(&self) -> MockResult<&CallJournal> {
        self.dependency::<C>().map(ErasedDependency::journal)
    }

    /// Proxy instance injected for `C`
    ///
    /// # Errors
    /// `UnknownDependency` if no constructor parameter is a `C`
    pub fn mock_of<C: ?Sized + Contract>(&self) -> MockResult<Arc<C>> {
        let dependency = self.dependency::<C>()?;
        dependency
            .instance::<C>()
            .ok_or_else(|| MockError::UnknownDependency {
                subject: T::subject_name().to_string(),
                contract: dependency.contract().name().to_string(),
            })
    }

    /// All mocked dependencies, in constructor parameter order
    #[must_use]
    pub fn dependencies(&self) -> &[ErasedDependency] {
        &self.dependencies
    }

    /// The type under test
    #[must_use]
    pub const fn instance(&self) -> &T {
        &self.instance
    }

    /// The type under test, mutably
    pub fn instance_mut(&mut self) -> &mut T {
        &mut self.instance
    }

    /// Drop the dependency handles and keep the type under test
    pub fn into_inner(self) -> T {
        self.instance
    }
}

impl<T: Subject> Deref for Mocked<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.instance
    }
}

impl<T: Subject> DerefMut for Mocked<T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.instance
    }
}

impl<T: Subject> fmt::Debug for Mocked<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mocked")
            .field("subject", &T::subject_name())
            .field("dependencies", &self.dependencies)
            .finish_non_exhaustive()
    }
}

/// Configures how a [`Mocked`] instance is built
pub struct MockedBuilder<T: Subject> {
    factory: MockFactory,
    behavior: Option<Behavior>,
    overrides: HashMap<TypeId, Behavior>,
    subject: std::marker::PhantomData<fn() -> T>,
}

impl<T: Subject> MockedBuilder<T> {
    fn new() -> Self {
        Self {
            factory: MockFactory::default(),
            behavior: None,
            overrides: HashMap::new(),
            subject: std::marker::PhantomData,
        }
    }

    /// Use `factory` to create dependencies
    #[must_use]
    pub fn factory(mut self, factory: MockFactory) -> Self {
        self.factory = factory;
        self
    }

    /// Create dependencies with `options`
    #[must_use]
    pub fn options(self, options: MockOptions) -> Self {
        self.factory(MockFactory::with_options(options))
    }

    /// Behavior for every dependency without an override
    #[must_use]
    pub const fn behavior(mut self, behavior: Behavior) -> Self {
        self.behavior = Some(behavior);
        self
    }

    /// Behavior for the dependency substituting `C`
    #[must_use]
    pub fn behavior_for<C: ?Sized + Contract>(mut self, behavior: Behavior) -> Self {
        self.overrides.insert(TypeId::of::<C>(), behavior);
        self
    }

    /// Select the constructor, mock its dependencies and build `T`
    ///
    /// # Errors
    /// `ConstructorAmbiguity` unless `T` has exactly one public constructor;
    /// `ContractViolation` if a parameter is not an interface contract
    pub fn build(self) -> MockResult<Mocked<T>> {
        let subject = T::subject_name();
        let mut constructors = T::constructors();
        if constructors.len() != 1 {
            return Err(MockError::ConstructorAmbiguity {
                subject: subject.to_string(),
                found: constructors.len(),
            });
        }
        let constructor = constructors.remove(0);
        let default_behavior = self
            .behavior
            .unwrap_or(self.factory.options().default_behavior);

        let mut dependencies = Vec::with_capacity(constructor.parameters.len());
        let mut index = HashMap::new();
        for slot in &constructor.parameters {
            let behavior = self
                .overrides
                .get(&slot.contract.id())
                .copied()
                .unwrap_or(default_behavior);
            let dependency = (slot.create)(&self.factory, behavior)?;
            if index.contains_key(&slot.contract.id()) {
                warn!(
                    subject,
                    parameter = slot.name,
                    contract = slot.contract.name(),
                    "contract injected twice; arrange_for resolves to the first parameter"
                );
            } else {
                index.insert(slot.contract.id(), dependencies.len());
            }
            dependencies.push(dependency);
        }

        let instance = (constructor.build)(&mut ConstructorArgs {
            subject,
            dependencies: &dependencies,
            position: 0,
        })?;
        debug!(
            subject,
            constructor = constructor.name,
            dependencies = dependencies.len(),
            "mocked instance built"
        );

        Ok(Mocked {
            instance,
            dependencies,
            index,
        })
    }
}

impl<T: Subject> fmt::Debug for MockedBuilder<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockedBuilder")
            .field("subject", &T::subject_name())
            .field("factory", &self.factory)
            .field("behavior", &self.behavior)
            .field("overrides", &self.overrides.len())
            .finish()
    }
}
