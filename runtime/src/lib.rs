pub mod error;
pub mod host;
pub mod library;
pub mod resolver;

pub use error::RuntimeError;
pub use host::{ChoicePresenter, DocumentFetcher, ExpressionEvaluator, FsFetcher, Selection};
pub use library::Library;
pub use resolver::{Resolution, NO_CANCEL};
