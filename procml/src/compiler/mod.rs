pub mod table;

use std::fmt;

use serde::Serialize;

use crate::choice::{Candidate, ChoiceRegistry, ChoiceSet};
use crate::element::{AttrError, Element};
use crate::validate::StringRules;

/// Name under which compiled programs address the host plugin layer.
pub const PLUGIN_COMMAND: &str = "procml";

const CODE_TERMINATOR: i64 = 0;
const CODE_MESSAGE_HEADER: i64 = 101;
const CODE_ELSE: i64 = 110;
const CODE_CHOICE_INVOKE: i64 = 356;
const CODE_TEXT_LINE: i64 = 401;
const CODE_CHOICE_BRANCH: i64 = 402;

/// One flat instruction. `indent` is the block nesting depth the host
/// interpreter uses to skip over branches.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Command {
    pub code: i64,
    pub indent: usize,
    pub parameters: Vec<Param>,
}

/// Instruction parameter. Serialized untagged so the output matches the
/// host's plain JSON arrays.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Param {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    IntList(Vec<i64>),
}

/// Name-to-id resolution for the host's variable and location tables.
pub trait IdLookup {
    fn variable_id(&self, name: &str) -> Option<i64>;
    fn location_id(&self, name: &str) -> Option<i64>;
}

/// Lookup that knows no names. Compiles documents that never reference
/// variables or locations.
pub struct NoIds;

impl IdLookup for NoIds {
    fn variable_id(&self, _name: &str) -> Option<i64> {
        None
    }

    fn location_id(&self, _name: &str) -> Option<i64> {
        None
    }
}

#[derive(Debug)]
pub enum CompileError {
    UnknownTag(String),
    UnknownVariable(String),
    UnknownLocation(String),
    DuplicateChoiceSymbol { symbol: String },
    Attr(AttrError),
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompileError::UnknownTag(name) => write!(f, "unknown tag '{}'", name),
            CompileError::UnknownVariable(name) => write!(f, "unknown variable '{}'", name),
            CompileError::UnknownLocation(name) => write!(f, "unknown location '{}'", name),
            CompileError::DuplicateChoiceSymbol { symbol } => {
                write!(f, "duplicate choice symbol '{}'", symbol)
            }
            CompileError::Attr(e) => e.fmt(f),
        }
    }
}

impl std::error::Error for CompileError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CompileError::Attr(e) => Some(e),
            _ => None,
        }
    }
}

impl From<AttrError> for CompileError {
    fn from(e: AttrError) -> Self {
        CompileError::Attr(e)
    }
}

/// Compiles one procedure element into a flat command list. Choice sets are
/// registered into the shared registry as they are encountered, so ids stay
/// stable across every document compiled with the same registry.
pub struct Compiler<'a> {
    commands: Vec<Command>,
    ids: &'a dyn IdLookup,
    choices: &'a mut ChoiceRegistry,
}

impl<'a> Compiler<'a> {
    pub fn new(ids: &'a dyn IdLookup, choices: &'a mut ChoiceRegistry) -> Self {
        Compiler {
            commands: Vec::new(),
            ids,
            choices,
        }
    }

    /// Compile the children of `root` at depth zero.
    pub fn compile(mut self, root: &Element) -> Result<Vec<Command>, CompileError> {
        self.compile_block(root, 0)?;
        Ok(self.commands)
    }

    /// Compile every element child of `parent` at the given depth, then
    /// terminate the block.
    fn compile_block(&mut self, parent: &Element, depth: usize) -> Result<(), CompileError> {
        let mut prev_was_if = false;
        for child in parent.children() {
            match child.name.as_str() {
                "m" => self.compile_message(child, depth)?,
                "choice" => self.compile_choice(child, depth)?,
                "else" => {
                    if prev_was_if {
                        self.compile_else(child, depth)?;
                    }
                }
                name => {
                    let Some(spec) = table::lookup(name) else {
                        return Err(CompileError::UnknownTag(name.to_string()));
                    };
                    let parameters = (spec.build)(child, self.ids)?;
                    self.push(spec.code, depth, parameters);
                    if spec.has_block {
                        self.compile_block(child, depth + 1)?;
                        if let Some(closer) = spec.closer {
                            self.push(closer, depth, Vec::new());
                        }
                    }
                }
            }
            prev_was_if = child.name == "if";
        }
        self.push(CODE_TERMINATOR, depth, Vec::new());
        Ok(())
    }

    /// A message block: text lines, blank-line runs, and `:header:`
    /// directives.
    ///
    /// Blank lines buffer up and flush as empty text lines just before the
    /// next non-blank line. Blanks pending when a header directive arrives
    /// are dropped, as are blanks left over at the end of the block. The
    /// first plain text line with no header yet in force opens an implicit
    /// anonymous header, and the buffered blanks then flush beneath it.
    fn compile_message(&mut self, element: &Element, depth: usize) -> Result<(), CompileError> {
        let data = element.data();
        let mut header_open = false;
        let mut blanks = 0usize;
        for line in split_lines(&data) {
            let line = line.trim();
            if line.is_empty() {
                blanks += 1;
                continue;
            }
            if line.len() >= 2 && line.starts_with(':') && line.ends_with(':') {
                let label = &line[1..line.len() - 1];
                self.push_message_header(label, depth);
                header_open = true;
                blanks = 0;
                continue;
            }
            if !header_open {
                self.push_message_header("", depth);
                header_open = true;
            }
            for _ in 0..blanks {
                self.push(CODE_TEXT_LINE, depth, vec![Param::Str(String::new())]);
            }
            blanks = 0;
            self.push(CODE_TEXT_LINE, depth, vec![Param::Str(line.to_string())]);
        }
        Ok(())
    }

    fn push_message_header(&mut self, label: &str, depth: usize) {
        self.push(
            CODE_MESSAGE_HEADER,
            depth,
            vec![
                Param::Str(label.to_string()),
                Param::Int(0),
                Param::Int(0),
                Param::Int(2),
            ],
        );
    }

    /// A choice block. The set itself goes into the registry; the command
    /// stream carries only a plugin invocation naming the set's id, followed
    /// by one branch opener per candidate in document order.
    fn compile_choice(&mut self, element: &Element, depth: usize) -> Result<(), CompileError> {
        let mut candidates: Vec<Candidate> = Vec::new();
        for child in element.children() {
            if candidates.iter().any(|c| c.symbol == child.name) {
                return Err(CompileError::DuplicateChoiceSymbol {
                    symbol: child.name.clone(),
                });
            }
            let text = child.require_word("text", &StringRules::none())?;
            let condition = child.word("cond", &StringRules::none(), "")?;
            candidates.push(Candidate {
                symbol: child.name.clone(),
                text,
                condition,
            });
        }

        let set = ChoiceSet {
            candidates: candidates.clone(),
            default_index: element.int("default", None, None, 0)?,
            cancel_index: element.int("cancel", None, None, 0)?,
            position_type: element.int("position", Some(0), Some(2), 2)?,
            background: element.int("background", Some(0), Some(2), 0)?,
        };
        let id = self.choices.register(set);

        self.push(
            CODE_CHOICE_INVOKE,
            depth,
            vec![Param::Str(format!(
                "{PLUGIN_COMMAND} conditional-choices {id}"
            ))],
        );

        for (i, (child, candidate)) in element.children().zip(candidates.iter()).enumerate() {
            self.push(
                CODE_CHOICE_BRANCH,
                depth,
                vec![Param::Int(i as i64), Param::Str(candidate.text.clone())],
            );
            self.compile_block(child, depth + 1)?;
        }
        Ok(())
    }

    /// An else block. Only reachable when the preceding sibling was an `if`;
    /// an orphaned else is skipped by the caller.
    fn compile_else(&mut self, element: &Element, depth: usize) -> Result<(), CompileError> {
        self.push(CODE_ELSE, depth, Vec::new());
        self.compile_block(element, depth + 1)
    }

    fn push(&mut self, code: i64, depth: usize, parameters: Vec<Param>) {
        self.commands.push(Command {
            code,
            indent: depth,
            parameters,
        });
    }
}

/// Split on any of the three line-ending conventions.
fn split_lines(s: &str) -> Vec<&str> {
    let mut lines = Vec::new();
    let mut start = 0;
    let bytes = s.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'\n' => {
                lines.push(&s[start..i]);
                i += 1;
                start = i;
            }
            b'\r' => {
                lines.push(&s[start..i]);
                i += 1;
                if bytes.get(i) == Some(&b'\n') {
                    i += 1;
                }
                start = i;
            }
            _ => i += 1,
        }
    }
    lines.push(&s[start..]);
    lines
}
