use super::{GlobalOptions, print_finished, with_builder, with_project};
use crate::build::{COMPILE_COMMANDS_FILE, write_compile_commands};
use crate::config::TargetKind;
use anyhow::{Context, Result};
use colored::*;
use std::path::Path;
use std::time::Instant;

/// `build [targets...]`: the named targets in order, or every executable
/// target when none are named.
pub fn build(names: &[String], compile_commands: bool, global: &GlobalOptions) -> Result<()> {
    with_project(|project| {
        let start = Instant::now();

        if names.is_empty() && project.targets_of(TargetKind::Executable).next().is_none() {
            println!("{} No executable targets to build.", "!".yellow());
            return Ok(());
        }

        let reports = with_builder(project, global, |builder| {
            if names.is_empty() {
                builder.build_all()
            } else {
                builder.build_targets(names)
            }
        })?;

        if compile_commands {
            let path = project.build_path(Path::new("")).join(COMPILE_COMMANDS_FILE);
            write_compile_commands(&path, &reports)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            println!("{} Wrote {}", "✓".green(), path.display());
        }

        print_finished(start);
        Ok(())
    })
}
