use super::with_project;
use crate::config::{ProjectConfig, TargetKind};
use crate::ui::Table;
use anyhow::Result;
use colored::*;
use std::path::Path;

fn kind_label(kind: TargetKind) -> String {
    match kind {
        TargetKind::Executable => kind.as_str().green().to_string(),
        TargetKind::Debug => kind.as_str().yellow().to_string(),
        TargetKind::Test => kind.as_str().magenta().to_string(),
        TargetKind::StaticLib | TargetKind::SharedLib => kind.as_str().blue().to_string(),
    }
}

pub fn targets_table(project: &ProjectConfig<'_>) -> Table {
    let mut table = Table::new(&["Target", "Kind", "Sources", "Flags", "Output"]);
    for target in project.targets {
        table.add_row(vec![
            target.name.bold().to_string(),
            kind_label(target.kind),
            target.sources.join(" "),
            project.effective_flags(target).join(" "),
            project
                .output_path(Path::new(""), target)
                .display()
                .to_string(),
        ]);
    }
    table
}

/// `targets`: the parsed project as a table.
pub fn list() -> Result<()> {
    with_project(|project| {
        println!(
            "{} {} (build dir {}){}",
            "Compiler:".bold(),
            project.compiler,
            project.build_dir,
            if project.auto_discovery {
                ", auto discovery on"
            } else {
                ""
            }
        );
        targets_table(project).print();
        Ok(())
    })
}
