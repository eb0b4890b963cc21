//! Line-oriented reference parser for `.unit` source files.
//!
//! Syntax errors never abort a parse: they are collected as [`Problem`]s
//! in the returned [`ParseResult`] and the parser keeps what it could
//! build. The format:
//!
//! ```text
//! package com.acme.widgets
//!
//! import com.acme.util
//!
//! type Button
//!     field label = Ok
//! end
//! ```

use std::fmt;

use regex::Regex;
use tracing::instrument;

use crate::config::ParserConfig;
use crate::domain::arena::{NodeId, SyntaxTree};

/// File extension of parseable sources.
pub const SOURCE_EXTENSION: &str = "unit";

/// One diagnostic produced during a parse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Problem {
    pub message: String,
    pub line: Option<usize>,
}

impl Problem {
    pub fn new(message: impl Into<String>, line: Option<usize>) -> Self {
        Self {
            message: message.into(),
            line,
        }
    }
}

impl fmt::Display for Problem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.line {
            Some(line) => write!(f, "line {}: {}", line, self.message),
            None => f.write_str(&self.message),
        }
    }
}

/// Outcome of one parse: a tree (possibly partial) plus an ordered list of
/// problems. Successful iff a tree is present and the list is empty.
#[derive(Debug, Clone)]
pub struct ParseResult {
    tree: Option<SyntaxTree>,
    problems: Vec<Problem>,
}

impl ParseResult {
    pub fn new(tree: Option<SyntaxTree>, problems: Vec<Problem>) -> Self {
        Self { tree, problems }
    }

    pub fn success(tree: SyntaxTree) -> Self {
        Self {
            tree: Some(tree),
            problems: Vec::new(),
        }
    }

    pub fn is_successful(&self) -> bool {
        self.tree.is_some() && self.problems.is_empty()
    }

    pub fn tree(&self) -> Option<&SyntaxTree> {
        self.tree.as_ref()
    }

    pub fn into_tree(self) -> Option<SyntaxTree> {
        self.tree
    }

    pub fn problems(&self) -> &[Problem] {
        &self.problems
    }
}

/// The default parser collaborator. Stateless between calls.
pub struct UnitParser {
    package_line: Regex,
    import_line: Regex,
    type_line: Regex,
    field_line: Regex,
}

impl Default for UnitParser {
    fn default() -> Self {
        Self::new()
    }
}

impl UnitParser {
    pub fn new() -> Self {
        Self {
            package_line: Regex::new(r"^package\s+([A-Za-z_][\w.]*)$").expect("static regex"),
            import_line: Regex::new(r"^import\s+([A-Za-z_][\w.]*)$").expect("static regex"),
            type_line: Regex::new(r"^type\s+([A-Za-z_]\w*)$").expect("static regex"),
            field_line: Regex::new(r"^field\s+([A-Za-z_]\w*)\s*=\s*(.+)$").expect("static regex"),
        }
    }

    /// Parse one source text. The configuration is propagated for
    /// collaborators (language level, tab width); the reference grammar
    /// does not branch on it.
    #[instrument(level = "debug", skip(self, source, _config))]
    pub fn parse(&self, source: &str, _config: &ParserConfig) -> ParseResult {
        let mut tree = SyntaxTree::new();
        let mut problems: Vec<Problem> = Vec::new();
        let mut open_type: Option<NodeId> = None;

        for (idx, raw) in source.lines().enumerate() {
            let line_no = idx + 1;
            let line = raw.trim();

            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            if let Some(caps) = self.package_line.captures(line) {
                if tree.package_name().is_some() {
                    problems.push(Problem::new("duplicate package declaration", Some(line_no)));
                    continue;
                }
                if let Err(e) = tree.set_package(&caps[1]) {
                    problems.push(Problem::new(e.to_string(), Some(line_no)));
                }
            } else if let Some(caps) = self.import_line.captures(line) {
                if let Err(e) = tree.add_import(&caps[1]) {
                    problems.push(Problem::new(e.to_string(), Some(line_no)));
                }
            } else if let Some(caps) = self.type_line.captures(line) {
                if open_type.is_some() {
                    problems.push(Problem::new(
                        "nested type declarations are not supported",
                        Some(line_no),
                    ));
                    continue;
                }
                match tree.add_type(&caps[1]) {
                    Ok(id) => open_type = Some(id),
                    Err(e) => problems.push(Problem::new(e.to_string(), Some(line_no))),
                }
            } else if line == "end" {
                if open_type.take().is_none() {
                    problems.push(Problem::new(
                        "'end' without an open type declaration",
                        Some(line_no),
                    ));
                }
            } else if let Some(caps) = self.field_line.captures(line) {
                match open_type {
                    Some(ty) => {
                        if let Err(e) = tree.add_field(ty, &caps[1], caps[2].trim()) {
                            problems.push(Problem::new(e.to_string(), Some(line_no)));
                        }
                    }
                    None => problems.push(Problem::new(
                        "field declaration outside a type",
                        Some(line_no),
                    )),
                }
            } else if line.starts_with("field") {
                problems.push(Problem::new("field declaration missing value", Some(line_no)));
            } else {
                problems.push(Problem::new("unrecognized syntax", Some(line_no)));
            }
        }

        if open_type.is_some() {
            problems.push(Problem::new(
                "unterminated type declaration at end of input",
                None,
            ));
        }

        ParseResult::new(Some(tree), problems)
    }
}
