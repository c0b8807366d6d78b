//! Mocked dependencies
//!
//! A [`MockedDependency`] bundles everything created for one substituted
//! contract: the proxy instance handed to the code under test, the
//! arrangement collection tests configure, the interceptor that consults
//! it and the call journal.

use crate::arrangement::ArrangementCollection;
use crate::config::MockOptions;
use crate::contract::{Contract, ContractType};
use crate::interceptor::{Behavior, Interceptor};
use crate::journal::{CallJournal, Journaled};
use crate::proxy::ProxyCore;
use crate::result::{MockError, MockResult};
use std::any::Any;
use std::fmt;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

/// A proxy instance of `C` together with its arrangements and journal
pub struct MockedDependency<C: ?Sized + Contract> {
    id: Uuid,
    contract: ContractType,
    behavior: Behavior,
    arrangements: Arc<ArrangementCollection>,
    interceptor: Arc<dyn Interceptor>,
    journal: Arc<CallJournal>,
    instance: Arc<C>,
}

impl<C: ?Sized + Contract> MockedDependency<C> {
    /// Identity shared with the proxy
    #[must_use]
    pub const fn id(&self) -> Uuid {
        self.id
    }

    /// Substituted contract
    #[must_use]
    pub const fn contract(&self) -> ContractType {
        self.contract
    }

    /// Behavior on unmatched calls
    #[must_use]
    pub const fn behavior(&self) -> Behavior {
        self.behavior
    }

    /// Arrangements consulted on every call
    #[must_use]
    pub fn arrangements(&self) -> &ArrangementCollection {
        &self.arrangements
    }

    /// Interceptor the proxy dispatches to
    #[must_use]
    pub fn interceptor(&self) -> &Arc<dyn Interceptor> {
        &self.interceptor
    }

    /// Calls received so far
    #[must_use]
    pub fn journal(&self) -> &CallJournal {
        &self.journal
    }

    /// Proxy instance; clones share all state
    #[must_use]
    pub fn instance(&self) -> Arc<C> {
        Arc::clone(&self.instance)
    }

    /// Forget the static contract type
    #[must_use]
    pub fn into_erased(self) -> ErasedDependency {
        ErasedDependency {
            id: self.id,
            contract: self.contract,
            behavior: self.behavior,
            arrangements: self.arrangements,
            interceptor: self.interceptor,
            journal: self.journal,
            instance: Box::new(self.instance),
        }
    }
}

impl<C: ?Sized + Contract> fmt::Debug for MockedDependency<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockedDependency")
            .field("id", &self.id)
            .field("contract", &self.contract)
            .field("behavior", &self.behavior)
            .field("arrangements", &self.arrangements.len())
            .finish_non_exhaustive()
    }
}

/// A [`MockedDependency`] whose contract is only known at runtime
pub struct ErasedDependency {
    id: Uuid,
    contract: ContractType,
    behavior: Behavior,
    arrangements: Arc<ArrangementCollection>,
    interceptor: Arc<dyn Interceptor>,
    journal: Arc<CallJournal>,
    instance: Box<dyn Any>,
}

impl ErasedDependency {
    /// Identity shared with the proxy
    #[must_use]
    pub const fn id(&self) -> Uuid {
        self.id
    }

    /// Substituted contract
    #[must_use]
    pub const fn contract(&self) -> ContractType {
        self.contract
    }

    /// Behavior on unmatched calls
    #[must_use]
    pub const fn behavior(&self) -> Behavior {
        self.behavior
    }

    /// Arrangements consulted on every call
    #[must_use]
    pub fn arrangements(&self) -> &ArrangementCollection {
        &self.arrangements
    }

    /// Interceptor the proxy dispatches to
    #[must_use]
    pub fn interceptor(&self) -> &Arc<dyn Interceptor> {
        &self.interceptor
    }

    /// Calls received so far
    #[must_use]
    pub fn journal(&self) -> &CallJournal {
        &self.journal
    }

    /// Proxy instance, if this dependency substitutes `C`
    #[must_use]
    pub fn instance<C: ?Sized + Contract>(&self) -> Option<Arc<C>> {
        self.instance.downcast_ref::<Arc<C>>().map(Arc::clone)
    }

    /// Whether this dependency substitutes `C`
    #[must_use]
    pub fn is<C: ?Sized + Contract>(&self) -> bool {
        self.contract.is::<C>()
    }
}

impl fmt::Debug for ErasedDependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ErasedDependency")
            .field("id", &self.id)
            .field("contract", &self.contract)
            .field("behavior", &self.behavior)
            .field("arrangements", &self.arrangements.len())
            .finish_non_exhaustive()
    }
}

/// Creates mocked dependencies.
///
/// There is no global registry; a factory is passed where needed and
/// carries the [`MockOptions`] applied to everything it creates.
#[derive(Debug, Clone, Default)]
pub struct MockFactory {
    options: MockOptions,
}

impl MockFactory {
    /// Factory with default options
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Factory with explicit options
    #[must_use]
    pub const fn with_options(options: MockOptions) -> Self {
        Self { options }
    }

    /// Options applied to created dependencies
    #[must_use]
    pub const fn options(&self) -> &MockOptions {
        &self.options
    }

    /// Mock `C` with `behavior`
    ///
    /// # Errors
    /// `ContractViolation` unless `C` is an interface contract
    pub fn create<C: ?Sized + Contract>(&self, behavior: Behavior) -> MockResult<MockedDependency<C>> {
        self.assemble(behavior, C::create_proxy)
    }

    /// Mock `C` with the options' default behavior
    ///
    /// # Errors
    /// `ContractViolation` unless `C` is an interface contract
    pub fn create_default<C: ?Sized + Contract>(&self) -> MockResult<MockedDependency<C>> {
        self.create(self.options.default_behavior)
    }

    /// Mock `C` around a real implementation; calls the interceptor leaves
    /// unhandled are forwarded to `decoratee`
    ///
    /// # Errors
    /// `ContractViolation` unless `C` is an interface contract
    pub fn decorate<C: ?Sized + Contract>(
        &self,
        decoratee: Arc<C>,
        behavior: Behavior,
    ) -> MockResult<MockedDependency<C>> {
        self.assemble(behavior, move |core| C::create_decorator(core, decoratee))
    }

    fn assemble<C, F>(&self, behavior: Behavior, proxy: F) -> MockResult<MockedDependency<C>>
    where
        C: ?Sized + Contract,
        F: FnOnce(ProxyCore) -> MockResult<Arc<C>>,
    {
        let descriptor = C::descriptor();
        let contract = descriptor.contract();
        if !descriptor.is_interface() {
            return Err(MockError::ContractViolation {
                contract: contract.name().to_string(),
            });
        }

        let arrangements = Arc::new(
            ArrangementCollection::new(descriptor).with_shadow_warnings(self.options.warn_on_shadowed),
        );
        let journal = Arc::new(if self.options.record_calls {
            CallJournal::new(self.options.max_recorded_calls)
        } else {
            CallJournal::disabled()
        });
        let mut interceptor = behavior.interceptor(Arc::clone(&arrangements));
        if journal.is_enabled() {
            interceptor = Arc::new(Journaled::new(interceptor, Arc::clone(&journal)));
        }

        let core = ProxyCore::new(contract, Arc::clone(&interceptor));
        let id = core.id();
        let instance = proxy(core)?;
        debug!(contract = contract.name(), %behavior, %id, "mocked dependency created");

        Ok(MockedDependency {
            id,
            contract,
            behavior,
            arrangements,
            interceptor,
            journal,
            instance,
        })
    }
}

/// Create an erased dependency of `C`; used as a function pointer by
/// constructor parameter slots
///
/// # Errors
/// `ContractViolation` unless `C` is an interface contract
pub fn create_erased<C: ?Sized + Contract>(
    factory: &MockFactory,
    behavior: Behavior,
) -> MockResult<ErasedDependency> {
    factory.create::<C>(behavior).map(MockedDependency::into_erased)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::ContractDescriptor;
    use crate::proxy::settle;

    trait Counter: Send + Sync {
        fn next(&self) -> u64;
    }

    struct CounterProxy {
        core: ProxyCore,
        decoratee: Option<Arc<dyn Counter>>,
    }

    impl Counter for CounterProxy {
        fn next(&self) -> u64 {
            let mut call = self.core.call("next").returns::<u64>().build();
            if !self.core.dispatch(&mut call) {
                if let Some(real) = &self.decoratee {
                    self.core.forwarding(&call);
                    return real.next();
                }
            }
            settle(call.take_return())
        }
    }

    impl Contract for dyn Counter {
        fn descriptor() -> ContractDescriptor {
            ContractDescriptor::interface::<dyn Counter>("ICounter").method("next")
        }

        fn create_proxy(core: ProxyCore) -> MockResult<Arc<Self>> {
            Ok(Arc::new(CounterProxy {
                core,
                decoratee: None,
            }))
        }

        fn create_decorator(core: ProxyCore, decoratee: Arc<Self>) -> MockResult<Arc<Self>> {
            Ok(Arc::new(CounterProxy {
                core,
                decoratee: Some(decoratee),
            }))
        }
    }

    struct Fixed;

    impl Counter for Fixed {
        fn next(&self) -> u64 {
            100
        }
    }

    struct Wallclock;

    impl Contract for Wallclock {
        fn descriptor() -> ContractDescriptor {
            ContractDescriptor::concrete::<Self>("Wallclock")
        }
    }

    #[test]
    fn test_create_wires_proxy_to_arrangements() {
        let factory = MockFactory::new();
        let counter = factory.create::<dyn Counter>(Behavior::Permissive).unwrap();
        assert_eq!(counter.instance().next(), 0);

        counter.arrangements().method("next").unwrap().returns(5u64);
        assert_eq!(counter.instance().next(), 5);
        assert_eq!(counter.journal().count(), 2);
        assert_eq!(counter.interceptor().behavior(), Behavior::Permissive);
        assert!(counter.contract().is::<dyn Counter>());
    }

    #[test]
    fn test_concrete_contract_is_rejected() {
        let err = MockFactory::new()
            .create::<Wallclock>(Behavior::Permissive)
            .unwrap_err();
        assert!(matches!(err, MockError::ContractViolation { ref contract } if contract == "Wallclock"));
    }

    #[test]
    fn test_decorator_forwards_only_misses() {
        let factory = MockFactory::new();
        let counter = factory
            .decorate::<dyn Counter>(Arc::new(Fixed), Behavior::PassThrough)
            .unwrap();
        assert_eq!(counter.instance().next(), 100);

        counter.arrangements().method("next").unwrap().returns(1u64);
        assert_eq!(counter.instance().next(), 1);
    }

    #[test]
    fn test_strict_miss_panics_in_caller() {
        let counter = MockFactory::new()
            .create::<dyn Counter>(Behavior::Strict)
            .unwrap();
        let instance = counter.instance();
        let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| instance.next()));
        let payload = outcome.unwrap_err();
        let message = payload
            .downcast_ref::<String>()
            .cloned()
            .unwrap_or_default();
        assert!(message.contains("ICounter"));
        assert!(message.contains("next"));
    }

    #[test]
    fn test_options_control_journal_and_default_behavior() {
        let factory = MockFactory::with_options(
            MockOptions::default()
                .with_record_calls(false)
                .with_default_behavior(Behavior::Strict),
        );
        let counter = factory.create_default::<dyn Counter>().unwrap();
        assert_eq!(counter.behavior(), Behavior::Strict);
        assert!(!counter.journal().is_enabled());

        counter.arrangements().method("next").unwrap().returns(3u64);
        assert_eq!(counter.instance().next(), 3);
        assert_eq!(counter.journal().count(), 0);
    }

    #[test]
    fn test_erased_dependency_downcasts() {
        let erased = create_erased::<dyn Counter>(&MockFactory::new(), Behavior::Permissive).unwrap();
        assert!(erased.is::<dyn Counter>());
        assert!(erased.instance::<dyn Counter>().is_some());
        assert!(erased.instance::<Wallclock>().is_none());
        assert_eq!(erased.instance::<dyn Counter>().unwrap().next(), 0);
        assert!(erased.arrangements().is_empty());
    }
}
