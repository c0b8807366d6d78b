//! Proxy boundary
//!
//! A proxy is a struct implementing a contract trait whose every member
//! builds an [`Invocation`], hands it to a [`ProxyCore`] and reads the
//! outputs back. `#[double]` generates these structs; they can also be
//! written by hand:
//!
//! ```rust
//! use std::sync::Arc;
//! use understudy::{settle, Contract, ContractDescriptor, MockResult, ProxyCore};
//!
//! pub trait Greeter: Send + Sync {
//!     fn greet(&self, name: &str) -> String;
//! }
//!
//! struct GreeterProxy {
//!     core: ProxyCore,
//! }
//!
//! impl Greeter for GreeterProxy {
//!     fn greet(&self, name: &str) -> String {
//!         let mut call = self
//!             .core
//!             .call("greet")
//!             .input("name", name.to_owned())
//!             .returns::<String>()
//!             .build();
//!         self.core.dispatch(&mut call);
//!         settle(call.take_return())
//!     }
//! }
//!
//! impl Contract for dyn Greeter {
//!     fn descriptor() -> ContractDescriptor {
//!         ContractDescriptor::interface::<dyn Greeter>("Greeter").method("greet")
//!     }
//!
//!     fn create_proxy(core: ProxyCore) -> MockResult<Arc<Self>> {
//!         Ok(Arc::new(GreeterProxy { core }))
//!     }
//! }
//! ```

use crate::contract::{ContractType, MemberSignature};
use crate::interceptor::{Behavior, Interceptor};
use crate::invocation::{Invocation, InvocationBuilder};
use crate::result::MockResult;
use std::sync::Arc;
use tracing::trace;
use uuid::Uuid;

/// Shared state of one proxy instance: its contract and its interceptor
#[derive(Debug, Clone)]
pub struct ProxyCore {
    id: Uuid,
    contract: ContractType,
    interceptor: Arc<dyn Interceptor>,
}

impl ProxyCore {
    /// Core dispatching calls on `contract` to `interceptor`
    #[must_use]
    pub fn new(contract: ContractType, interceptor: Arc<dyn Interceptor>) -> Self {
        Self {
            id: Uuid::new_v4(),
            contract,
            interceptor,
        }
    }

    /// Proxy identity, also carried by the owning dependency
    #[must_use]
    pub const fn id(&self) -> Uuid {
        self.id
    }

    /// Contract the proxy implements
    #[must_use]
    pub const fn contract(&self) -> ContractType {
        self.contract
    }

    /// Interceptor every call goes through
    #[must_use]
    pub fn interceptor(&self) -> &Arc<dyn Interceptor> {
        &self.interceptor
    }

    /// Behavior of the interceptor
    #[must_use]
    pub fn behavior(&self) -> Behavior {
        self.interceptor.behavior()
    }

    /// Start describing a call to a method (or accessor) of this contract
    #[must_use]
    pub fn call(&self, member: &'static str) -> InvocationBuilder {
        Invocation::builder(MemberSignature::method(self.contract, member))
    }

    /// Start describing a call to a property accessor
    #[must_use]
    pub fn accessor(&self, accessor: &'static str, property: &'static str) -> InvocationBuilder {
        self.call(accessor)
            .property(MemberSignature::property(self.contract, property))
    }

    /// Run the interceptor; `Ok(false)` means the call was left unhandled
    pub fn try_dispatch(&self, invocation: &mut Invocation) -> MockResult<bool> {
        trace!(
            proxy = %self.id,
            member = %invocation.signature(),
            behavior = %self.behavior(),
            "dispatch"
        );
        self.interceptor.intercept(invocation)
    }

    /// Run the interceptor, panicking on failure.
    ///
    /// Contract methods cannot return engine errors, so a strict miss
    /// surfaces as a panic in the code under test and fails the test.
    pub fn dispatch(&self, invocation: &mut Invocation) -> bool {
        settle(self.try_dispatch(invocation))
    }

    /// Log that an unhandled call is being forwarded to the decoratee
    pub fn forwarding(&self, invocation: &Invocation) {
        trace!(
            proxy = %self.id,
            member = %invocation.signature(),
            "forwarding to decoratee"
        );
    }
}

/// Unwrap an engine result inside a proxy member, panicking with the
/// error message on failure.
#[track_caller]
pub fn settle<T>(result: MockResult<T>) -> T {
    match result {
        Ok(value) => value,
        Err(err) => panic!("{err}"),
    }
}
