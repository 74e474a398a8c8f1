//! Classification heads
//!
//! A [`Classifier`] answers one [`TaskKind`] from a [`FeatureView`]. The
//! standard classifier is a [`ModelAdapter`] around an opaque
//! [`ModelHandle`]; the [`ClassifierRegistry`] maps every task to its
//! classifier and is filled once when the pipeline is built.
//!
//! [`FeatureView`]: crate::features::FeatureView

mod adapter;
mod loader;
mod registry;
mod result;
mod task;

pub use adapter::{Classifier, ModelAdapter, ModelHandle};
pub use loader::{BuiltinModelLoader, ModelLoader};
pub use registry::ClassifierRegistry;
pub use result::{
    DateValue, ExtractedTask, LabelResult, ResolvedDate, SentenceLabel, TaskCategory, TaskResult,
};
pub use task::{TaskKind, TaskSet, UnknownTaskError};

pub(crate) use registry::{not_registered, run_guarded};
