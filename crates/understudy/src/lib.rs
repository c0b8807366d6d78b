//! Understudy: Test Doubles for Trait Objects
//!
//! Understudy substitutes the dependencies of a type under test with
//! proxies whose calls are intercepted, matched against test-configured
//! arrangements and resolved according to a behavior.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                     UNDERSTUDY Architecture                     │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  ┌──────────────┐    ┌──────────────┐    ┌──────────────┐       │
//! │  │ Proxy        │    │ Interceptor  │    │ Arrangement  │       │
//! │  │ (#[double])  │───►│ Permissive   │───►│ Collection   │       │
//! │  │ Invocation   │    │ PassThrough  │    │ first match  │       │
//! │  └──────────────┘    │ Strict       │    └──────────────┘       │
//! │         ▲            └──────────────┘                           │
//! │         │                                                       │
//! │  ┌──────┴───────┐    ┌──────────────┐                           │
//! │  │ Mocked<T>    │───►│ MockFactory  │                           │
//! │  │ (#[subject]) │    │ + Journal    │                           │
//! │  └──────────────┘    └──────────────┘                           │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use understudy::prelude::*;
//!
//! #[double]
//! pub trait Repo: Send + Sync {
//!     fn find(&self, id: u32) -> Option<String>;
//! }
//!
//! pub struct Service {
//!     repo: Arc<dyn Repo>,
//! }
//!
//! #[subject]
//! impl Service {
//!     pub fn new(repo: Arc<dyn Repo>) -> Self {
//!         Self { repo }
//!     }
//! }
//!
//! impl Service {
//!     fn describe(&self, id: u32) -> String {
//!         self.repo.find(id).unwrap_or_else(|| "nobody".to_string())
//!     }
//! }
//!
//! let mocked = Mocked::<Service>::new(Behavior::Strict).unwrap();
//! mocked
//!     .arrange_for::<dyn Repo>()
//!     .unwrap()
//!     .method("find")
//!     .unwrap()
//!     .with_arg("id", 7u32)
//!     .returns(Some("ada".to_string()));
//!
//! assert_eq!(mocked.describe(7), "ada");
//! ```

#![warn(missing_docs)]
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::panic))]

/// Invocation model: the record of one intercepted call and its features
#[allow(clippy::missing_errors_doc, clippy::must_use_candidate)]
pub mod invocation;

/// Arrangements and the first-match arrangement collection
#[allow(clippy::missing_errors_doc, clippy::must_use_candidate)]
pub mod arrangement;

mod config;
mod contract;
mod dependency;
#[allow(clippy::missing_errors_doc)]
mod instance;
mod interceptor;
mod journal;
mod proxy;
mod result;

/// Subscriber setup for test logging
pub mod logging;

pub use arrangement::{
    Arrangement, ArrangementBuilder, ArrangementCollection, Callback, Effect, Predicate,
    StreamFactory, ValueFactory,
};
pub use config::{MockOptions, BEHAVIOR_ENV};
pub use contract::{
    Contract, ContractDescriptor, ContractKind, ContractType, MemberClassification, MemberKind,
    MemberSignature, PropertyDescriptor,
};
pub use dependency::{create_erased, ErasedDependency, MockFactory, MockedDependency};
pub use instance::{Constructor, ConstructorArgs, DependencySlot, Mocked, MockedBuilder, Subject};
pub use interceptor::{Behavior, Interceptor, PassThrough, Permissive, Strict};
pub use invocation::{
    AsyncKind, AsyncOutcome, AsyncResult, Feature, FeatureKind, FeatureSet, FeatureType,
    InputParameters, Invocation, InvocationBuilder, OutParameters, Parameter, PropertyIdentity,
    PropertySetterValue, RefParameters, ReturnValue, Slot, SlotRole, TypeDescriptor, Value,
};
pub use journal::{CallJournal, CallOutcome, Journaled, RecordedCall};
pub use proxy::{settle, ProxyCore};
pub use result::{MockError, MockResult};

/// Everything a test usually needs
pub mod prelude {
    pub use super::{
        Behavior, CallJournal, Contract, ContractDescriptor, Invocation, MockError, MockFactory,
        MockOptions, MockResult, Mocked, MockedDependency, Subject,
    };
    pub use futures::future::BoxFuture;
    pub use futures::stream::BoxStream;

    #[cfg(feature = "derive")]
    pub use super::{double, subject};
}

// Re-export proxy generation macros when the `derive` feature is enabled
#[cfg(feature = "derive")]
pub use understudy_derive::{double, subject};

/// Items referenced by generated code; not part of the public API
#[doc(hidden)]
pub mod __private {
    pub use futures;
}
