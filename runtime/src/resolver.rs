use procml::choice::{Candidate, ChoiceSet};

use crate::error::RuntimeError;
use crate::host::{ChoicePresenter, ExpressionEvaluator, Selection};

/// Canonical sentinel for "no cancel branch" after coercion.
pub const NO_CANCEL: i64 = -2;

/// Terminal outcome of resolving one choice set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// Ordinal of the picked candidate in the original, unfiltered list.
    Branch(usize),
    Cancelled,
}

/// Run one choice set to its terminal state.
///
/// Candidates whose condition fails are filtered out before presentation,
/// preserving relative order. An empty condition is always true and never
/// reaches the evaluator. The presenter's pick indexes the filtered list;
/// the result maps it back through the candidate's symbol to its original
/// ordinal, which is what downstream branching keys on.
pub fn resolve(
    set: &ChoiceSet,
    evaluator: &mut dyn ExpressionEvaluator,
    presenter: &mut dyn ChoicePresenter,
) -> Result<Resolution, RuntimeError> {
    let mut survivors: Vec<&Candidate> = Vec::new();
    for candidate in &set.candidates {
        if candidate.condition.is_empty() || evaluator.evaluate(&candidate.condition)? {
            survivors.push(candidate);
        }
    }

    // A cancel index pointing past the filtered list means no cancel branch.
    let cancel_index = if set.cancel_index >= survivors.len() as i64 {
        NO_CANCEL
    } else {
        set.cancel_index
    };

    let labels: Vec<String> = survivors.iter().map(|c| c.text.clone()).collect();
    let picked = match presenter.present(
        &labels,
        set.default_index,
        cancel_index,
        set.position_type,
        set.background,
    )? {
        Selection::Cancelled => return Ok(Resolution::Cancelled),
        Selection::Picked(n) => n,
    };

    let survivor = survivors.get(picked).ok_or_else(|| {
        RuntimeError::Presenter(format!(
            "picked index {} but only {} candidates were presented",
            picked,
            survivors.len()
        ))
    })?;
    let ordinal = set
        .candidates
        .iter()
        .position(|c| c.symbol == survivor.symbol)
        .ok_or_else(|| {
            RuntimeError::Presenter(format!("symbol '{}' vanished from its set", survivor.symbol))
        })?;
    Ok(Resolution::Branch(ordinal))
}
