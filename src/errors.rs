//! Crate-wide error type.
//!
//! Syntax problems are NOT errors: they travel as data inside
//! [`ParseResult`](crate::parser::ParseResult). This enum covers I/O and
//! encoding failures, configuration issues, and tree-contract violations.

use std::path::PathBuf;

use itertools::Itertools;
use thiserror::Error;

use crate::config::Encoding;
use crate::domain::arena::SlotName;
use crate::parser::Problem;

#[derive(Error, Debug)]
pub enum Error {
    #[error("failed to read {}: {source}", path.display())]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {}: {source}", path.display())]
    FileWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("source root not found: {0}")]
    RootNotFound(PathBuf),

    #[error("cannot decode {} as {encoding}", path.display())]
    Decode { path: PathBuf, encoding: Encoding },

    #[error("cannot encode output for {} as {encoding}", path.display())]
    Encode { path: PathBuf, encoding: Encoding },

    #[error("configuration error: {message}")]
    Config { message: String },

    #[error("slot '{slot}' on {kind} requires a child")]
    RequiredSlot { kind: &'static str, slot: SlotName },

    #[error("no slot '{slot}' on {kind}")]
    UnknownSlot { kind: &'static str, slot: SlotName },

    #[error("slot '{slot}' on {kind} holds a list of children")]
    SlotShape { kind: &'static str, slot: SlotName },

    #[error("node is not part of the tree")]
    StaleNode,

    #[error("attaching the node would create an ownership cycle")]
    Cycle,

    #[error("the root node cannot be detached or removed")]
    RootRemoval,

    #[error("unresolved parse problems in {}: {}", path.display(), format_problems(problems))]
    ParseProblems {
        path: PathBuf,
        problems: Vec<Problem>,
    },
}

fn format_problems(problems: &[Problem]) -> String {
    problems.iter().map(|p| p.to_string()).join("; ")
}

pub type Result<T> = std::result::Result<T, Error>;
