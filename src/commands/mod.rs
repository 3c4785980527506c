//! CLI command handlers.
//!
//! Each handler discovers `config.cat`, loads it into a fresh arena, and
//! drives the builder. The arena lives for exactly one command.

pub mod build;
pub mod run;
pub mod scaffold;
pub mod targets;

use crate::arena::Arena;
use crate::build::{
    BuildError, BuildOptions, BuildReport, Builder, ConsoleReporter, ProcessExecutor,
    default_jobs,
};
use crate::config::{self, ProjectConfig, Target, TargetKind};
use anyhow::{Context, Result, bail};
use colored::*;
use std::path::PathBuf;
use std::time::Instant;

/// Flags shared by every command.
#[derive(Debug, Clone, Default)]
pub struct GlobalOptions {
    /// Compile jobs per wave; defaults to the number of logical cores.
    pub jobs: Option<usize>,
    /// Echo every compiler and linker command.
    pub verbose: bool,
}

impl GlobalOptions {
    pub fn build_options(&self) -> BuildOptions {
        BuildOptions {
            jobs: self.jobs.unwrap_or_else(default_jobs).max(1),
            base: PathBuf::new(),
        }
    }
}

/// Finds and parses the project around the current directory, then hands
/// the model to `f`.
pub fn with_project<T>(f: impl FnOnce(&ProjectConfig<'_>) -> Result<T>) -> Result<T> {
    let cwd = std::env::current_dir().context("Failed to read current directory")?;
    let location = config::find_config(&cwd)?;

    let arena = Arena::default();
    let project = config::load(&arena, &location)?;
    f(&project)
}

/// Runs `f` against a builder that spawns the real toolchain and reports
/// to the terminal.
pub(crate) fn with_builder<'a, T>(
    project: &ProjectConfig<'a>,
    global: &GlobalOptions,
    f: impl FnOnce(&Builder<'a, '_>) -> Result<T, BuildError>,
) -> Result<T> {
    let reporter = ConsoleReporter::new(global.verbose);
    let builder = Builder::new(*project, global.build_options(), &ProcessExecutor, &reporter)?;
    Ok(f(&builder)?)
}

/// Builds already selected `targets` in order, stopping at the first
/// failure.
pub(crate) fn build_each<'a>(
    project: &ProjectConfig<'a>,
    targets: &[&'a Target<'a>],
    global: &GlobalOptions,
) -> Result<Vec<BuildReport>> {
    with_builder(project, global, |builder| {
        targets.iter().map(|target| builder.build(target)).collect()
    })
}

/// Looks up each name in order. The first unknown name is an error.
pub(crate) fn resolve_targets<'a>(
    project: &ProjectConfig<'a>,
    names: &[String],
) -> Result<Vec<&'a Target<'a>>, BuildError> {
    names
        .iter()
        .map(|name| {
            project
                .target(name)
                .ok_or_else(|| BuildError::TargetNotFound(name.clone()))
        })
        .collect()
}

/// Resolves target names restricted to `kind`. With no names, every
/// target of that kind is selected, and there must be at least one.
pub(crate) fn select_targets<'a>(
    project: &ProjectConfig<'a>,
    names: &[String],
    kind: TargetKind,
) -> Result<Vec<&'a Target<'a>>> {
    if names.is_empty() {
        let all: Vec<_> = project.targets_of(kind).collect();
        if all.is_empty() {
            bail!("No {} targets found", kind);
        }
        return Ok(all);
    }

    let targets = resolve_targets(project, names)?;
    if let Some(target) = targets.iter().find(|t| t.kind != kind) {
        bail!(
            "Target `{}` is not of {} type (it is {})",
            target.name,
            kind,
            target.kind
        );
    }
    Ok(targets)
}

pub(crate) fn print_finished(start: Instant) {
    println!(
        "\n{} Compiling {}! Took {:.3} seconds",
        "✓".green(),
        "finished".bold(),
        start.elapsed().as_secs_f64()
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ParseContext, parse};

    fn project(arena: &Arena) -> ProjectConfig<'_> {
        let src = "config { compiler: cc build_dir: build/ }\n\
                   target executable app { sources: [a.c] output: bin/app }\n\
                   target debug app_dbg { sources: [a.c] output: dbg/app }\n\
                   target debug other_dbg { sources: [b.c] output: dbg/other }";
        parse(arena, arena.alloc_str(src), &ParseContext::default()).unwrap()
    }

    #[test]
    fn test_select_all_of_kind() {
        let arena = Arena::default();
        let project = project(&arena);
        let selected = select_targets(&project, &[], TargetKind::Debug).unwrap();
        let names: Vec<_> = selected.iter().map(|t| t.name).collect();
        assert_eq!(names, vec!["app_dbg", "other_dbg"]);
    }

    #[test]
    fn test_select_requires_matching_kind() {
        let arena = Arena::default();
        let project = project(&arena);

        let err = select_targets(&project, &["app".into()], TargetKind::Debug).unwrap_err();
        assert!(err.to_string().contains("is not of debug type"));

        let err = select_targets(&project, &[], TargetKind::Test).unwrap_err();
        assert_eq!(err.to_string(), "No test targets found");

        let err = select_targets(&project, &["ghost".into()], TargetKind::Debug).unwrap_err();
        assert_eq!(err.to_string(), "target `ghost` not found");
    }

    #[test]
    fn test_resolve_keeps_order_and_stops_at_unknown() {
        let arena = Arena::default();
        let project = project(&arena);

        let names = ["other_dbg".to_string(), "app".to_string()];
        let found = resolve_targets(&project, &names).unwrap();
        let found: Vec<_> = found.iter().map(|t| t.name).collect();
        assert_eq!(found, vec!["other_dbg", "app"]);

        let names = ["app".to_string(), "ghost".to_string(), "nope".to_string()];
        let err = resolve_targets(&project, &names).unwrap_err();
        assert!(matches!(err, BuildError::TargetNotFound(ref name) if name == "ghost"));
    }

    #[test]
    fn test_jobs_default_and_floor() {
        let opts = GlobalOptions {
            jobs: Some(0),
            verbose: false,
        };
        assert_eq!(opts.build_options().jobs, 1);
        assert!(GlobalOptions::default().build_options().jobs >= 1);
    }
}
