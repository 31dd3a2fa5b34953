pub mod error;
mod scanner;

pub use error::ParseError;

use crate::element::Node;

/// Parser entry point.
pub struct Parser {
    source: String,
    file_id: usize,
}

impl Parser {
    pub fn new(source: String, file_id: usize) -> Self {
        Parser { source, file_id }
    }

    /// Parse the markup source into a list of top-level nodes.
    ///
    /// Structural errors are accumulated across the whole document and
    /// returned as one batch; the scanner recovers past each defect so a
    /// single call surfaces all of them.
    pub fn parse(&self) -> Result<Vec<Node>, Vec<ParseError>> {
        scanner::scan_nodes(&self.source, self.file_id)
    }
}
