use std::collections::HashMap;

use procml::choice::{ChoiceRegistry, ChoiceSet};
use procml::compiler::{Compiler, IdLookup};
use procml::parser::Parser;
use procml::validate::StringRules;
use procml::Procedure;

use crate::error::RuntimeError;
use crate::host::{ChoicePresenter, DocumentFetcher, ExpressionEvaluator};
use crate::resolver::{self, Resolution};

/// The document store: compiled procedures, the choice registry they share,
/// and per-document load state.
///
/// An explicit value threaded through calls, never process-wide state, so
/// independent libraries cannot contaminate each other's ids.
#[derive(Debug, Default)]
pub struct Library {
    procedures: HashMap<String, Procedure>,
    choices: ChoiceRegistry,
    files: HashMap<String, bool>,
}

impl Library {
    pub fn new() -> Self {
        Library::default()
    }

    /// Fetch, parse, and compile a named document, registering every
    /// top-level `proc` element as a procedure. Loading a name that already
    /// finished is a no-op. A procedure id that collides with an earlier one
    /// overwrites it, so a document can be re-loaded during authoring.
    pub fn load(
        &mut self,
        name: &str,
        fetcher: &mut dyn DocumentFetcher,
        ids: &dyn IdLookup,
    ) -> Result<(), RuntimeError> {
        if self.files.get(name) == Some(&true) {
            return Ok(());
        }
        self.files.insert(name.to_string(), false);

        let source = fetcher.fetch(name)?;
        let parser = Parser::new(source, 0);
        let nodes = parser.parse().map_err(|errors| RuntimeError::Parse {
            name: name.to_string(),
            message: errors
                .iter()
                .map(|e| e.message.clone())
                .collect::<Vec<_>>()
                .join("; "),
        })?;

        for node in &nodes {
            let Some(element) = node.as_element() else {
                continue;
            };
            if element.name != "proc" {
                continue;
            }
            let id = element
                .require_word("id", &StringRules::none())
                .map_err(|e| RuntimeError::Compile {
                    name: name.to_string(),
                    message: e.to_string(),
                })?;
            let commands = Compiler::new(ids, &mut self.choices)
                .compile(element)
                .map_err(|e| RuntimeError::Compile {
                    name: name.to_string(),
                    message: e.to_string(),
                })?;
            self.procedures.insert(id.clone(), Procedure { id, commands });
        }

        self.files.insert(name.to_string(), true);
        Ok(())
    }

    /// True once every load ever requested has completed.
    pub fn has_loaded(&self) -> bool {
        self.files.values().all(|&done| done)
    }

    pub fn procedure(&self, id: &str) -> Result<&Procedure, RuntimeError> {
        self.procedures
            .get(id)
            .ok_or_else(|| RuntimeError::UndefinedProcedure(id.to_string()))
    }

    /// Ids of every registered procedure, sorted for stable output.
    pub fn procedure_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.procedures.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    pub fn choice_sets(&self) -> &[ChoiceSet] {
        self.choices.sets()
    }

    /// Resolve the choice set with the given registry id.
    pub fn resolve_choice(
        &self,
        id: usize,
        evaluator: &mut dyn ExpressionEvaluator,
        presenter: &mut dyn ChoicePresenter,
    ) -> Result<Resolution, RuntimeError> {
        let set = self
            .choices
            .get(id)
            .ok_or(RuntimeError::UndefinedChoiceSet(id))?;
        resolver::resolve(set, evaluator, presenter)
    }
}
