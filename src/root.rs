//! A single physical source root with an ordered parse cache.
//!
//! Cache keys are package-relative paths; entries keep insertion (parse)
//! order and are overwritten on reparse, never implicitly evicted. Syntax
//! problems land inside cached [`ParseResult`]s; only I/O and encoding
//! failures surface as errors.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, instrument};
use walkdir::WalkDir;

use crate::config::{Encoding, ParserConfig};
use crate::errors::{Error, Result};
use crate::parser::{ParseResult, UnitParser, SOURCE_EXTENSION};
use crate::print::{default_printer, Printer};
use crate::domain::arena::SyntaxTree;

pub struct SourceRoot {
    root: PathBuf,
    config: ParserConfig,
    printer: Printer,
    parser: UnitParser,
    cache: Vec<(PathBuf, ParseResult)>,
}

impl fmt::Debug for SourceRoot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceRoot")
            .field("root", &self.root)
            .field("config", &self.config)
            .field("cached", &self.cache.len())
            .finish()
    }
}

impl SourceRoot {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self::with_config(root, ParserConfig::default())
    }

    pub fn with_config(root: impl Into<PathBuf>, config: ParserConfig) -> Self {
        Self {
            root: root.into(),
            config,
            printer: default_printer(),
            parser: UnitParser::new(),
            cache: Vec::new(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    pub fn set_parser_config(&mut self, config: ParserConfig) {
        self.config = config;
    }

    pub fn set_printer(&mut self, printer: Printer) {
        self.printer = printer;
    }

    /// Parse one file addressed by package and filename, caching the
    /// result under the root's own configuration.
    #[instrument(level = "debug", skip(self))]
    pub fn try_to_parse(&mut self, package: &str, filename: &str) -> Result<ParseResult> {
        let config = self.config.clone();
        self.try_to_parse_with(package, filename, &config)
    }

    /// Like [`try_to_parse`](Self::try_to_parse) with a per-call
    /// configuration override.
    pub fn try_to_parse_with(
        &mut self,
        package: &str,
        filename: &str,
        config: &ParserConfig,
    ) -> Result<ParseResult> {
        let key = Self::cache_key(package, filename);
        self.parse_file(key, config)
    }

    /// Convenience entry point that demands a tree: a result still carrying
    /// problems is promoted to an error.
    pub fn parse(&mut self, package: &str, filename: &str) -> Result<SyntaxTree> {
        let key = Self::cache_key(package, filename);
        let result = self.try_to_parse(package, filename)?;
        let problems = result.problems().to_vec();
        match result.into_tree() {
            Some(tree) if problems.is_empty() => Ok(tree),
            _ => Err(Error::ParseProblems {
                path: self.root.join(key),
                problems,
            }),
        }
    }

    /// Parse every `.unit` file under the package's directory, in
    /// deterministic discovery order. An empty package parses the whole
    /// root.
    #[instrument(level = "debug", skip(self))]
    pub fn try_to_parse_package(&mut self, package: &str) -> Result<Vec<ParseResult>> {
        let dir = self.root.join(Self::package_path(package));
        if !dir.is_dir() {
            return Err(Error::RootNotFound(dir));
        }

        let mut files = Vec::new();
        for entry in WalkDir::new(&dir).sort_by_file_name() {
            let entry = entry.map_err(|e| Error::FileRead {
                path: dir.clone(),
                source: e.into(),
            })?;
            if entry.file_type().is_file()
                && entry
                    .path()
                    .extension()
                    .is_some_and(|ext| ext == SOURCE_EXTENSION)
            {
                files.push(entry.into_path());
            }
        }
        debug!(count = files.len(), "discovered source files");

        let config = self.config.clone();
        let mut results = Vec::with_capacity(files.len());
        for path in files {
            let key = path
                .strip_prefix(&self.root)
                .unwrap_or(&path)
                .to_path_buf();
            results.push(self.parse_file(key, &config)?);
        }
        Ok(results)
    }

    /// Parse every source file under the root.
    pub fn try_to_parse_all(&mut self) -> Result<Vec<ParseResult>> {
        self.try_to_parse_package("")
    }

    /// Insert or replace the cache entry for `filename` in `package`.
    pub fn add(&mut self, package: &str, filename: &str, tree: SyntaxTree) {
        self.insert(Self::cache_key(package, filename), ParseResult::success(tree));
    }

    /// Insert a unit under its own declared package; the filename is
    /// derived from the first declared type.
    pub fn add_unit(&mut self, tree: SyntaxTree) {
        let package = tree.package_name().unwrap_or_default();
        let stem = tree
            .primary_type_name()
            .unwrap_or_else(|| "unnamed".to_string());
        let filename = format!("{stem}.{SOURCE_EXTENSION}");
        self.add(&package, &filename, tree);
    }

    /// Write every cached tree back under the root, in the configured
    /// encoding.
    pub fn save_all(&self) -> Result<()> {
        self.save_all_with(&self.root, self.config.encoding)
    }

    /// Write every cached tree under a different target root.
    pub fn save_all_in(&self, root: &Path) -> Result<()> {
        self.save_all_with(root, self.config.encoding)
    }

    /// Write every cached tree back under the root in an explicit
    /// encoding, overriding the configured one for this call.
    pub fn save_all_as(&self, encoding: Encoding) -> Result<()> {
        self.save_all_with(&self.root, encoding)
    }

    /// Write every cached tree under `root` in `encoding`. Target paths
    /// derive from each tree's declared package plus its original
    /// filename.
    #[instrument(level = "debug", skip(self))]
    pub fn save_all_with(&self, root: &Path, encoding: Encoding) -> Result<()> {
        for (key, result) in &self.cache {
            let Some(tree) = result.tree() else {
                continue;
            };
            let filename = key
                .file_name()
                .map(PathBuf::from)
                .unwrap_or_else(|| key.clone());
            let dir = root.join(Self::package_path(
                &tree.package_name().unwrap_or_default(),
            ));
            fs::create_dir_all(&dir).map_err(|source| Error::FileWrite {
                path: dir.clone(),
                source,
            })?;

            let path = dir.join(filename);
            let text = (self.printer)(tree);
            let bytes = encoding
                .encode(&text)
                .ok_or(Error::Encode { path: path.clone(), encoding })?;
            fs::write(&path, bytes).map_err(|source| Error::FileWrite {
                path: path.clone(),
                source,
            })?;
            debug!(path = %path.display(), "saved unit");
        }
        Ok(())
    }

    /// Fresh copies of every successfully parsed unit, in parse order.
    pub fn compilation_units(&self) -> Vec<SyntaxTree> {
        self.cache
            .iter()
            .filter_map(|(_, result)| result.tree().cloned())
            .collect()
    }

    /// Fresh copies of every cached result, in parse order.
    pub fn cache(&self) -> Vec<ParseResult> {
        self.cache.iter().map(|(_, result)| result.clone()).collect()
    }

    fn parse_file(&mut self, key: PathBuf, config: &ParserConfig) -> Result<ParseResult> {
        let path = self.root.join(&key);
        let bytes = fs::read(&path).map_err(|source| Error::FileRead {
            path: path.clone(),
            source,
        })?;
        let text = config.encoding.decode(&bytes).ok_or(Error::Decode {
            path,
            encoding: config.encoding,
        })?;
        let result = self.parser.parse(&text, config);
        self.insert(key, result.clone());
        Ok(result)
    }

    fn insert(&mut self, key: PathBuf, result: ParseResult) {
        match self.cache.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => *slot = result,
            None => self.cache.push((key, result)),
        }
    }

    fn cache_key(package: &str, filename: &str) -> PathBuf {
        Self::package_path(package).join(filename)
    }

    fn package_path(package: &str) -> PathBuf {
        package
            .split('.')
            .filter(|segment| !segment.is_empty())
            .collect()
    }
}
