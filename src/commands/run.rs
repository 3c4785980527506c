//! Commands that build targets and then execute what they produced.

use super::{
    GlobalOptions, build_each, print_finished, resolve_targets, select_targets, with_project,
};
use crate::config::{ProjectConfig, Target, TargetKind};
use anyhow::{Context, Result, bail};
use colored::*;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus};
use std::time::Instant;

fn binary_path(project: &ProjectConfig<'_>, target: &Target<'_>) -> PathBuf {
    let path = project.output_path(Path::new(""), target);
    // A bare relative name would be looked up on PATH.
    if path.is_relative() && !path.starts_with("..") {
        Path::new(".").join(path)
    } else {
        path
    }
}

fn execute(path: &Path, args: &[String]) -> Result<ExitStatus> {
    Command::new(path)
        .args(args)
        .status()
        .with_context(|| format!("Failed to execute {}", path.display()))
}

fn execute_checked(path: &Path, args: &[String]) -> Result<()> {
    let status = execute(path, args)?;
    if !status.success() {
        bail!("{} exited with {}", path.display(), status);
    }
    Ok(())
}

/// `run [targets...] [-- args]`: builds every named target, then runs each
/// in order with `args`. With no names, every executable target is used.
pub fn run(names: &[String], args: &[String], global: &GlobalOptions) -> Result<()> {
    with_project(|project| {
        let targets = if names.is_empty() {
            project.targets_of(TargetKind::Executable).collect()
        } else {
            resolve_targets(project, names)?
        };

        if let Some(target) = targets.iter().find(|t| !t.kind.is_runnable()) {
            bail!("Target `{}` is a {} and cannot be run", target.name, target.kind);
        }

        if targets.is_empty() {
            bail!("No executable targets found");
        }

        build_each(project, &targets, global)?;

        for target in targets {
            let path = binary_path(project, target);
            println!("{} Running {}...\n", "▶".green(), target.name.bold());
            execute_checked(&path, args)?;
        }
        Ok(())
    })
}

/// `debug [targets...]`: builds and runs debug targets only.
pub fn debug(names: &[String], global: &GlobalOptions) -> Result<()> {
    with_project(|project| {
        let start = Instant::now();
        let targets = select_targets(project, names, TargetKind::Debug)?;

        build_each(project, &targets, global)?;
        print_finished(start);

        for target in targets {
            let path = binary_path(project, target);
            println!("{} Debugging {}...\n", "▶".green(), target.name.bold());
            execute_checked(&path, &[])?;
        }
        Ok(())
    })
}

/// `test [targets...]`: builds every selected test target, runs each
/// binary and reports PASS or FAIL per target.
pub fn test(names: &[String], global: &GlobalOptions) -> Result<()> {
    with_project(|project| {
        let targets = select_targets(project, names, TargetKind::Test)?;
        build_each(project, &targets, global)?;

        println!("\n{} Running tests...", "→".cyan());

        let mut passed = 0;
        for target in &targets {
            let path = binary_path(project, target);
            let result = Command::new(&path).output();
            print!("   TEST {} ... ", target.name.bold());
            match result {
                Ok(out) if out.status.success() => {
                    println!("{}", "PASS".green());
                    passed += 1;
                }
                Ok(out) => {
                    println!("{} ({})", "FAIL".red(), out.status);
                    for stream in [&out.stdout, &out.stderr] {
                        for line in String::from_utf8_lossy(stream).lines() {
                            println!("      {line}");
                        }
                    }
                }
                Err(e) => println!("{} ({})", "EXEC FAIL".red(), e),
            }
        }

        let total = targets.len();
        println!("\nTest Result: {}/{} passed.", passed, total);
        if passed != total {
            bail!("{} of {} test binaries failed", total - passed, total);
        }
        println!("{}", "All tests passed".green().bold());
        Ok(())
    })
}
