//! srcroot: federated source roots with mutable syntax trees
//!
//! The structural backbone of a source-tree toolkit: an arena-backed,
//! observable AST node model with strict parent/child ownership
//! ([`domain`]), a package-prefix router ([`router`]), and a federation of
//! source roots that parses and saves across several independent trees as
//! one logical target ([`multi`]).

pub mod cli;
pub mod config;
pub mod domain;
pub mod errors;
pub mod multi;
pub mod parser;
pub mod print;
pub mod root;
pub mod router;

pub use config::{Encoding, LanguageLevel, ParserConfig};
pub use errors::{Error, Result};
pub use multi::MultiSourceRoot;
pub use parser::{ParseResult, Problem, UnitParser};
pub use print::{default_printer, PrettyPrinter, Printer};
pub use root::SourceRoot;
pub use router::PackageRouter;
