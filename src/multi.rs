//! A federation of source roots behind the single-root API.
//!
//! The primary root behaves exactly like a plain [`SourceRoot`]; delegate
//! roots are selected per operation by package-prefix match. An unmatched
//! package is not an error: the operation falls through to the primary.
//! Delegates are built at construction time and never replaced.

use std::path::{Path, PathBuf};

use tracing::{debug, instrument};

use crate::config::{Encoding, ParserConfig};
use crate::domain::arena::SyntaxTree;
use crate::errors::Result;
use crate::parser::ParseResult;
use crate::print::Printer;
use crate::root::SourceRoot;
use crate::router::PackageRouter;

pub struct MultiSourceRoot {
    primary: SourceRoot,
    // The router holds indices into `delegates`; both preserve
    // registration order.
    router: PackageRouter<usize>,
    delegates: Vec<SourceRoot>,
}

impl std::fmt::Debug for MultiSourceRoot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MultiSourceRoot")
            .field("primary", &self.primary)
            .field("delegates", &self.delegates.len())
            .finish()
    }
}

impl MultiSourceRoot {
    /// Build a federation from a primary root, an optional shared
    /// configuration, and ordered `(package prefix, root directory)`
    /// registrations. A duplicate normalized prefix replaces the earlier
    /// delegate for that prefix.
    pub fn new(
        primary_root: impl Into<PathBuf>,
        config: Option<ParserConfig>,
        additional_roots: Vec<(String, PathBuf)>,
    ) -> Self {
        let config = config.unwrap_or_default();
        let primary = SourceRoot::with_config(primary_root, config.clone());

        let mut router = PackageRouter::new();
        let mut delegates: Vec<SourceRoot> = Vec::new();
        for (prefix, path) in additional_roots {
            let delegate = SourceRoot::with_config(path, config.clone());
            match router.get(&prefix).copied() {
                Some(index) => delegates[index] = delegate,
                None => {
                    router.register(&prefix, delegates.len());
                    delegates.push(delegate);
                }
            }
        }

        Self {
            primary,
            router,
            delegates,
        }
    }

    pub fn primary(&self) -> &SourceRoot {
        &self.primary
    }

    /// Read-only view of the prefix registry, for diagnostics.
    pub fn delegated_roots(&self) -> impl Iterator<Item = (&str, &SourceRoot)> {
        self.router
            .entries()
            .map(|(prefix, &index)| (prefix, &self.delegates[index]))
    }

    /// Parse one file, routed by package. The federation's shared
    /// configuration travels with the call to a matched delegate.
    #[instrument(level = "debug", skip(self))]
    pub fn try_to_parse(&mut self, package: &str, filename: &str) -> Result<ParseResult> {
        let config = self.primary.config().clone();
        match self.route(package) {
            Some(index) => {
                debug!(package, "routing parse to delegate");
                self.delegates[index].try_to_parse_with(package, filename, &config)
            }
            None => self.primary.try_to_parse(package, filename),
        }
    }

    /// Parse one file with a per-call configuration override. A matched
    /// delegate adopts the override before the parse.
    pub fn try_to_parse_with(
        &mut self,
        package: &str,
        filename: &str,
        config: &ParserConfig,
    ) -> Result<ParseResult> {
        match self.route(package) {
            Some(index) => {
                let delegate = &mut self.delegates[index];
                delegate.set_parser_config(config.clone());
                delegate.try_to_parse_with(package, filename, config)
            }
            None => self.primary.try_to_parse_with(package, filename, config),
        }
    }

    /// Routed variant of [`SourceRoot::parse`]: demands a problem-free
    /// tree.
    pub fn parse(&mut self, package: &str, filename: &str) -> Result<SyntaxTree> {
        match self.route(package) {
            Some(index) => self.delegates[index].parse(package, filename),
            None => self.primary.parse(package, filename),
        }
    }

    /// Bulk-parse one package. The call commits to a single resolved root;
    /// it never splits across delegates. An empty package addresses the
    /// primary.
    #[instrument(level = "debug", skip(self))]
    pub fn try_to_parse_package(&mut self, package: &str) -> Result<Vec<ParseResult>> {
        if package.is_empty() {
            return self.primary.try_to_parse_package("");
        }
        match self.route(package) {
            Some(index) => self.delegates[index].try_to_parse_package(package),
            None => self.primary.try_to_parse_package(package),
        }
    }

    /// Bulk-parse the primary root only. Delegates are independently
    /// scoped trees; parsing them implicitly would be surprising I/O, so
    /// callers must address them explicitly.
    pub fn try_to_parse_all(&mut self) -> Result<Vec<ParseResult>> {
        self.primary.try_to_parse_all()
    }

    /// Insert or replace a cache entry in the root resolved for `package`.
    pub fn add(&mut self, package: &str, filename: &str, tree: SyntaxTree) {
        match self.route(package) {
            Some(index) => self.delegates[index].add(package, filename, tree),
            None => self.primary.add(package, filename, tree),
        }
    }

    /// Insert a unit, routed by its own declared package (empty when the
    /// unit declares none).
    pub fn add_unit(&mut self, tree: SyntaxTree) {
        let package = tree.package_name().unwrap_or_default();
        match self.route(&package) {
            Some(index) => self.delegates[index].add_unit(tree),
            None => self.primary.add_unit(tree),
        }
    }

    /// Apply a configuration to the primary and then to every delegate in
    /// registration order, keeping the federation consistent.
    pub fn set_parser_config(&mut self, config: ParserConfig) {
        self.primary.set_parser_config(config.clone());
        for delegate in &mut self.delegates {
            delegate.set_parser_config(config.clone());
        }
    }

    /// Install a printer on the primary and every delegate.
    pub fn set_printer(&mut self, printer: Printer) {
        self.primary.set_printer(printer.clone());
        for delegate in &mut self.delegates {
            delegate.set_printer(printer.clone());
        }
    }

    /// Persist every root to its own configured location.
    pub fn save_all(&self) -> Result<()> {
        self.primary.save_all()?;
        for delegate in &self.delegates {
            delegate.save_all()?;
        }
        Ok(())
    }

    /// Persist the primary under `root`; each delegate is written under
    /// its own configured root, because its files physically live there.
    #[instrument(level = "debug", skip(self))]
    pub fn save_all_in(&self, root: &Path) -> Result<()> {
        self.primary.save_all_in(root)?;
        for delegate in &self.delegates {
            delegate.save_all()?;
        }
        Ok(())
    }

    /// Persist every root to its own location in an explicit encoding.
    pub fn save_all_as(&self, encoding: Encoding) -> Result<()> {
        self.primary.save_all_as(encoding)?;
        for delegate in &self.delegates {
            delegate.save_all_as(encoding)?;
        }
        Ok(())
    }

    /// Like [`save_all_in`](Self::save_all_in) with an explicit encoding
    /// applied to every root.
    pub fn save_all_with(&self, root: &Path, encoding: Encoding) -> Result<()> {
        self.primary.save_all_with(root, encoding)?;
        for delegate in &self.delegates {
            delegate.save_all_with(delegate.root(), encoding)?;
        }
        Ok(())
    }

    /// Fresh copies of every parsed unit: the primary's first, then each
    /// delegate's in registration order.
    pub fn compilation_units(&self) -> Vec<SyntaxTree> {
        let mut units = self.primary.compilation_units();
        for delegate in &self.delegates {
            units.extend(delegate.compilation_units());
        }
        units
    }

    /// Fresh copies of every cached result, primary first, then delegates
    /// in registration order.
    pub fn cache(&self) -> Vec<ParseResult> {
        let mut cache = self.primary.cache();
        for delegate in &self.delegates {
            cache.extend(delegate.cache());
        }
        cache
    }

    fn route(&self, package: &str) -> Option<usize> {
        self.router.resolve(package).copied()
    }
}
