use std::fs;
use std::path::PathBuf;

use crate::error::RuntimeError;

/// Outcome reported by a [`ChoicePresenter`]: an index into the presented
/// (already filtered) list, or cancellation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    Picked(usize),
    Cancelled,
}

/// Evaluates a condition expression against live host state.
///
/// The contract is deliberately narrow: the expression language belongs to
/// the host, and the only thing asked of it is a boolean or a failure.
pub trait ExpressionEvaluator {
    fn evaluate(&mut self, expr: &str) -> Result<bool, RuntimeError>;
}

/// Shows an ordered list of labels to the end user and reports the pick.
///
/// The extra parameters carry the set's presentation settings: default
/// index, cancel index (already coerced), position type, and background.
pub trait ChoicePresenter {
    fn present(
        &mut self,
        labels: &[String],
        default_index: i64,
        cancel_index: i64,
        position_type: i64,
        background: i64,
    ) -> Result<Selection, RuntimeError>;
}

/// Retrieves a named document's source text.
pub trait DocumentFetcher {
    fn fetch(&mut self, name: &str) -> Result<String, RuntimeError>;
}

/// Fetcher reading documents from a base directory. Suits tools and tests;
/// an engine host would implement [`DocumentFetcher`] over its own assets.
pub struct FsFetcher {
    base_dir: PathBuf,
}

impl FsFetcher {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        FsFetcher {
            base_dir: base_dir.into(),
        }
    }
}

impl DocumentFetcher for FsFetcher {
    fn fetch(&mut self, name: &str) -> Result<String, RuntimeError> {
        fs::read_to_string(self.base_dir.join(name)).map_err(|e| RuntimeError::Fetch {
            name: name.to_string(),
            message: e.to_string(),
        })
    }
}
