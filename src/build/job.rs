//! Compiler and linker command lines.

use super::error::BuildError;
use crate::config::{ProjectConfig, Target, TargetKind};
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

pub const OBJECT_SUFFIX: &str = "o";
pub const ARCHIVER: &str = "ar";

/// A program and its literal argument vector. Nothing here goes through a
/// shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
}

impl Invocation {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn path(self, path: &Path) -> Self {
        self.arg(path.to_string_lossy())
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// One source file to compile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileJob {
    /// As written in `config.cat`.
    pub source: String,
    pub source_path: PathBuf,
    pub object_path: PathBuf,
    pub invocation: Invocation,
}

/// `src/net/tcp.c` becomes `tcp.o`.
pub fn object_name(source: &str) -> Option<String> {
    let stem = Path::new(source).file_stem()?;
    Some(format!("{}.{OBJECT_SUFFIX}", stem.to_string_lossy()))
}

/// Builds one job per source of `target`, in source-list order.
///
/// Objects land flat in the build directory, so two sources sharing a
/// stem are rejected before anything runs.
pub fn compile_jobs<'a>(
    project: &ProjectConfig<'a>,
    target: &Target<'a>,
    base: &Path,
) -> Result<Vec<CompileJob>, BuildError> {
    if target.sources.is_empty() {
        return Err(BuildError::NoSources(target.name.to_string()));
    }

    let build_dir = project.build_path(base);
    let flags = project.effective_flags(target);
    let mut seen: HashMap<String, &str> = HashMap::new();
    let mut jobs = Vec::with_capacity(target.sources.len());

    for &source in target.sources {
        let object = object_name(source).ok_or_else(|| BuildError::InvalidSource {
            target: target.name.to_string(),
            file: source.to_string(),
        })?;

        if let Some(first) = seen.insert(object.clone(), source) {
            return Err(BuildError::ObjectCollision {
                target: target.name.to_string(),
                first: first.to_string(),
                second: source.to_string(),
                object,
            });
        }

        let source_path = project.resolve(base, source);
        let object_path = build_dir.join(&object);
        let invocation = Invocation::new(project.compiler)
            .arg("-c")
            .path(&source_path)
            .arg("-o")
            .path(&object_path)
            .args(flags.iter().copied());

        jobs.push(CompileJob {
            source: source.to_string(),
            source_path,
            object_path,
            invocation,
        });
    }

    Ok(jobs)
}

/// The single link step run after every object of `target` exists.
pub fn link_invocation<'a>(
    project: &ProjectConfig<'a>,
    target: &Target<'a>,
    objects: &[PathBuf],
    output: &Path,
) -> Invocation {
    let objects = objects.iter().map(|p| p.to_string_lossy().into_owned());

    match target.kind {
        TargetKind::StaticLib => Invocation::new(ARCHIVER)
            .arg("rcs")
            .path(output)
            .args(objects),
        TargetKind::SharedLib => Invocation::new(project.compiler)
            .arg("-shared")
            .args(objects)
            .arg("-o")
            .path(output)
            .args(project.effective_flags(target)),
        TargetKind::Executable | TargetKind::Debug | TargetKind::Test => {
            Invocation::new(project.compiler)
                .args(objects)
                .arg("-o")
                .path(output)
                .args(project.effective_flags(target))
        }
    }
}
