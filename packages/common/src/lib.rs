pub mod feature_kind;
pub mod storage;

pub use feature_kind::{FeatureKind, FeatureValueError, ParseKindError};
