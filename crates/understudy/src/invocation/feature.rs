//! Feature Catalog
//!
//! The closed vocabulary of facets an invocation may carry. A call is
//! described by which features it has, not by its concrete shape, so
//! matchers and interceptors ask "does this call have out parameters"
//! instead of switching over every member arity.

use super::parameters::{InputParameters, OutParameters, RefParameters};
use super::value::{AsyncKind, AsyncResult, PropertyIdentity, PropertySetterValue, ReturnValue};
use std::collections::BTreeMap;
use std::fmt;

/// Kind of feature; an invocation carries at most one feature per kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FeatureKind {
    /// By-value arguments
    InputParameters,
    /// `&mut` arguments flowing back to the caller
    RefParameters,
    /// `&mut` arguments written by the callee only
    OutParameters,
    /// Synchronous return slot
    ReturnValue,
    /// Property the accessor belongs to
    PropertyIdentity,
    /// Value handed to a setter
    PropertySetterValue,
    /// Asynchronous return slot of the given shape
    AsyncResult(AsyncKind),
}

impl fmt::Display for FeatureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InputParameters => f.write_str("input parameters"),
            Self::RefParameters => f.write_str("ref parameters"),
            Self::OutParameters => f.write_str("out parameters"),
            Self::ReturnValue => f.write_str("return value"),
            Self::PropertyIdentity => f.write_str("property identity"),
            Self::PropertySetterValue => f.write_str("property setter value"),
            Self::AsyncResult(kind) => write!(f, "async result ({kind})"),
        }
    }
}

/// One facet of an invocation
#[derive(Debug)]
pub enum Feature {
    /// By-value arguments
    InputParameters(InputParameters),
    /// `&mut` arguments
    RefParameters(RefParameters),
    /// Out arguments
    OutParameters(OutParameters),
    /// Synchronous return slot
    ReturnValue(ReturnValue),
    /// Property identity
    PropertyIdentity(PropertyIdentity),
    /// Setter value
    PropertySetterValue(PropertySetterValue),
    /// Asynchronous return slot
    AsyncResult(AsyncResult),
}

impl Feature {
    /// Kind of this feature
    #[must_use]
    pub fn kind(&self) -> FeatureKind {
        match self {
            Self::InputParameters(_) => FeatureKind::InputParameters,
            Self::RefParameters(_) => FeatureKind::RefParameters,
            Self::OutParameters(_) => FeatureKind::OutParameters,
            Self::ReturnValue(_) => FeatureKind::ReturnValue,
            Self::PropertyIdentity(_) => FeatureKind::PropertyIdentity,
            Self::PropertySetterValue(_) => FeatureKind::PropertySetterValue,
            Self::AsyncResult(result) => FeatureKind::AsyncResult(result.kind()),
        }
    }
}

/// Typed view of one [`Feature`] variant, used by `Invocation::feature::<F>()`
pub trait FeatureType: Sized {
    /// Name used in `MissingFeature` errors
    const NAME: &'static str;

    /// Borrow the payload if `feature` is this variant
    fn from_feature(feature: &Feature) -> Option<&Self>;

    /// Mutably borrow the payload if `feature` is this variant
    fn from_feature_mut(feature: &mut Feature) -> Option<&mut Self>;
}

macro_rules! feature_type {
    ($ty:ident, $name:literal) => {
        impl FeatureType for $ty {
            const NAME: &'static str = $name;

            fn from_feature(feature: &Feature) -> Option<&Self> {
                match feature {
                    Feature::$ty(inner) => Some(inner),
                    _ => None,
                }
            }

            fn from_feature_mut(feature: &mut Feature) -> Option<&mut Self> {
                match feature {
                    Feature::$ty(inner) => Some(inner),
                    _ => None,
                }
            }
        }

        impl From<$ty> for Feature {
            fn from(inner: $ty) -> Self {
                Feature::$ty(inner)
            }
        }
    };
}

feature_type!(InputParameters, "input parameters");
feature_type!(RefParameters, "ref parameters");
feature_type!(OutParameters, "out parameters");
feature_type!(ReturnValue, "return value");
feature_type!(PropertyIdentity, "property identity");
feature_type!(PropertySetterValue, "property setter value");
feature_type!(AsyncResult, "async result");

/// Features of one invocation, unique by kind
#[derive(Debug, Default)]
pub struct FeatureSet {
    features: BTreeMap<FeatureKind, Feature>,
}

impl FeatureSet {
    pub(crate) fn insert(&mut self, feature: Feature) {
        self.features.insert(feature.kind(), feature);
    }

    /// Whether a feature of `kind` is present
    #[must_use]
    pub fn contains(&self, kind: FeatureKind) -> bool {
        self.features.contains_key(&kind)
    }

    /// Feature of `kind`
    #[must_use]
    pub fn get(&self, kind: FeatureKind) -> Option<&Feature> {
        self.features.get(&kind)
    }

    /// Mutable feature of `kind`
    pub fn get_mut(&mut self, kind: FeatureKind) -> Option<&mut Feature> {
        self.features.get_mut(&kind)
    }

    /// First feature of variant `F`
    #[must_use]
    pub fn find<F: FeatureType>(&self) -> Option<&F> {
        self.features.values().find_map(F::from_feature)
    }

    /// First mutable feature of variant `F`
    pub fn find_mut<F: FeatureType>(&mut self) -> Option<&mut F> {
        self.features.values_mut().find_map(F::from_feature_mut)
    }

    /// Kinds present, in catalog order
    pub fn kinds(&self) -> impl Iterator<Item = FeatureKind> + '_ {
        self.features.keys().copied()
    }

    /// Number of features
    #[must_use]
    pub fn len(&self) -> usize {
        self.features.len()
    }

    /// Whether no feature is present
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}
