//! Command dispatch

use std::path::{Path, PathBuf};

use crate::cli::args::{Cli, Commands};
use crate::cli::output;
use crate::config::ParserConfig;
use crate::errors::{Error, Result};
use crate::multi::MultiSourceRoot;
use crate::print::PrettyPrinter;

pub fn execute_command(cli: &Cli) -> Result<()> {
    match &cli.command {
        Commands::Parse {
            root,
            package,
            routes,
            config,
        } => cmd_parse(root, package.as_deref(), routes, config.as_deref()),
        Commands::Print {
            root,
            package,
            file,
            config,
        } => cmd_print(root, package, file, config.as_deref()),
        Commands::Save {
            root,
            to,
            routes,
            config,
        } => cmd_save(root, to.as_deref(), routes, config.as_deref()),
    }
}

fn cmd_parse(
    root: &Path,
    package: Option<&str>,
    routes: &[String],
    config: Option<&Path>,
) -> Result<()> {
    let cfg = ParserConfig::load(config)?;
    let mut mroot = MultiSourceRoot::new(root, Some(cfg), parse_routes(routes)?);

    let results = match package {
        Some(pkg) => mroot.try_to_parse_package(pkg)?,
        None => mroot.try_to_parse_all()?,
    };

    let mut failed = 0;
    for result in &results {
        if result.is_successful() {
            continue;
        }
        failed += 1;
        for problem in result.problems() {
            output::failure(problem);
        }
    }

    if failed == 0 {
        output::success(&format!("parsed {} units", results.len()));
    } else {
        output::error(&format!(
            "parsed {} units, {} with problems",
            results.len(),
            failed
        ));
    }
    Ok(())
}

fn cmd_print(root: &Path, package: &str, file: &str, config: Option<&Path>) -> Result<()> {
    let cfg = ParserConfig::load(config)?;
    let tab_width = cfg.tab_width;
    let mut mroot = MultiSourceRoot::new(root, Some(cfg), Vec::new());

    let tree = mroot.parse(package, file)?;
    let text = PrettyPrinter::new(usize::from(tab_width)).print(&tree);
    output::info(text.trim_end());
    Ok(())
}

fn cmd_save(
    root: &Path,
    to: Option<&Path>,
    routes: &[String],
    config: Option<&Path>,
) -> Result<()> {
    let cfg = ParserConfig::load(config)?;
    let routes = parse_routes(routes)?;
    let prefixes: Vec<String> = routes.iter().map(|(prefix, _)| prefix.clone()).collect();
    let mut mroot = MultiSourceRoot::new(root, Some(cfg), routes);

    mroot.try_to_parse_all()?;
    for prefix in &prefixes {
        mroot.try_to_parse_package(prefix)?;
    }

    match to {
        Some(target) => mroot.save_all_in(target)?,
        None => mroot.save_all()?,
    }
    output::success(&format!("saved {} units", mroot.compilation_units().len()));
    Ok(())
}

fn parse_routes(specs: &[String]) -> Result<Vec<(String, PathBuf)>> {
    specs
        .iter()
        .map(|spec| {
            spec.split_once('=')
                .map(|(prefix, dir)| (prefix.to_string(), PathBuf::from(dir)))
                .ok_or_else(|| Error::Config {
                    message: format!("invalid route '{spec}', expected PKG=DIR"),
                })
        })
        .collect()
}
