//! Project model and `config.cat` loading.
//!
//! A `config.cat` file holds one `config` block followed by one or more
//! `target` blocks:
//!
//! ```text
//! config {
//!     compiler: cc
//!     build_dir: build/
//!     default_flags: [-Wall -Wextra]
//! }
//!
//! target executable app {
//!     sources: [src/main.c src/util.c]
//!     flags: [-O2]
//!     output: bin/app
//! }
//! ```
//!
//! The parsed [`ProjectConfig`] borrows every string from the arena that
//! holds the file text, so it lives exactly as long as that arena.

mod discovery;
mod error;
pub mod lexer;
mod parser;

pub use discovery::{
    CONFIG_FILE, MAX_DISCOVERY_DEPTH, ProjectLocation, SOURCE_EXTENSIONS, WalkDirResolver,
    find_config,
};
pub use error::{ConfigError, ParseError, ParseErrorKind};
pub use parser::{ParseContext, SourceResolver, parse};

use crate::arena::{self, Arena};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

pub const MAX_TARGETS: usize = 16;
pub const MAX_SOURCES: usize = 128;
pub const MAX_FLAGS: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TargetKind {
    Executable,
    Debug,
    Test,
    StaticLib,
    SharedLib,
}

impl TargetKind {
    pub fn from_ident(ident: &str) -> Option<Self> {
        match ident {
            "executable" => Some(TargetKind::Executable),
            "debug" => Some(TargetKind::Debug),
            "test" => Some(TargetKind::Test),
            "static_lib" => Some(TargetKind::StaticLib),
            "shared_lib" => Some(TargetKind::SharedLib),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TargetKind::Executable => "executable",
            TargetKind::Debug => "debug",
            TargetKind::Test => "test",
            TargetKind::StaticLib => "static_lib",
            TargetKind::SharedLib => "shared_lib",
        }
    }

    /// Whether the linked output is a program that can be executed.
    pub fn is_runnable(&self) -> bool {
        matches!(
            self,
            TargetKind::Executable | TargetKind::Debug | TargetKind::Test
        )
    }
}

impl fmt::Display for TargetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One buildable unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Target<'a> {
    pub kind: TargetKind,
    pub name: &'a str,
    pub sources: &'a [&'a str],
    /// Appended after the project's default flags.
    pub flags: &'a [&'a str],
    pub output_dir: &'a str,
    pub output_name: &'a str,
}

/// The parsed project: global settings plus targets in file order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProjectConfig<'a> {
    pub compiler: &'a str,
    pub build_dir: &'a str,
    pub default_flags: &'a [&'a str],
    pub auto_discovery: bool,
    /// How many directories discovery climbed from the invocation
    /// directory to reach `config.cat`.
    pub depth: usize,
    pub targets: &'a [Target<'a>],
}

impl<'a> ProjectConfig<'a> {
    /// Linear lookup by name; the first match wins.
    pub fn target(&self, name: &str) -> Option<&'a Target<'a>> {
        self.targets.iter().find(|t| t.name == name)
    }

    pub fn targets_of(&self, kind: TargetKind) -> impl Iterator<Item = &'a Target<'a>> + use<'a> {
        self.targets.iter().filter(move |t| t.kind == kind)
    }

    /// `../` repeated `depth` times.
    pub fn prefix(&self) -> PathBuf {
        std::iter::repeat_n("..", self.depth).collect()
    }

    /// Resolves a project-relative path against the invocation directory.
    pub fn resolve(&self, base: &Path, path: &str) -> PathBuf {
        base.join(self.prefix()).join(path)
    }

    pub fn build_path(&self, base: &Path) -> PathBuf {
        self.resolve(base, self.build_dir)
    }

    pub fn output_path(&self, base: &Path, target: &Target<'_>) -> PathBuf {
        self.resolve(base, target.output_dir).join(target.output_name)
    }

    /// Default flags followed by the target's own flags.
    pub fn effective_flags(&self, target: &Target<'a>) -> Vec<&'a str> {
        self.default_flags
            .iter()
            .chain(target.flags)
            .copied()
            .collect()
    }
}

/// Reads `config.cat` at `location` into `arena` and parses it.
///
/// When the file enables `auto_discovery`, directory entries in `sources`
/// are expanded by walking the project root.
pub fn load<'a>(
    arena: &'a Arena,
    location: &ProjectLocation,
) -> Result<ProjectConfig<'a>, ConfigError> {
    let path = location.config_path();
    let io_err = |source| ConfigError::Io {
        path: path.clone(),
        source,
    };

    let file = fs::File::open(&path).map_err(io_err)?;
    let hint = file.metadata().map(|m| m.len() as usize).unwrap_or(0);
    let bytes = arena::read_to_arena(arena, file, hint).map_err(io_err)?;

    let text = std::str::from_utf8(bytes).map_err(|e| ConfigError::Utf8 {
        path: path.clone(),
        offset: e.valid_up_to(),
    })?;

    let resolver = WalkDirResolver::new(location.root.clone());
    let ctx = ParseContext {
        depth: location.depth,
        resolver: Some(&resolver as &dyn SourceResolver),
    };

    parse(arena, text, &ctx).map_err(|error| ConfigError::Parse { path, error })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample<'a>(arena: &'a Arena, depth: usize) -> ProjectConfig<'a> {
        let src = "config { compiler: cc build_dir: build/ default_flags: [-Wall] }\n\
                   target executable app { sources: [a.c] flags: [-O2] output: bin/app }\n\
                   target debug app_dbg { sources: [a.c] output: dbg/app }";
        let ctx = ParseContext {
            depth,
            resolver: None,
        };
        parse(arena, arena.alloc_str(src), &ctx).unwrap()
    }

    #[test]
    fn test_target_kind_names_round_trip() {
        for kind in [
            TargetKind::Executable,
            TargetKind::Debug,
            TargetKind::Test,
            TargetKind::StaticLib,
            TargetKind::SharedLib,
        ] {
            assert_eq!(TargetKind::from_ident(kind.as_str()), Some(kind));
        }
        assert_eq!(TargetKind::from_ident("library"), None);
    }

    #[test]
    fn test_effective_flags_puts_defaults_first() {
        let arena = Arena::default();
        let project = sample(&arena, 0);
        let app = project.target("app").unwrap();
        assert_eq!(project.effective_flags(app), vec!["-Wall", "-O2"]);

        let dbg = project.target("app_dbg").unwrap();
        assert_eq!(project.effective_flags(dbg), vec!["-Wall"]);
    }

    #[test]
    fn test_prefix_and_resolution_follow_depth() {
        let arena = Arena::default();
        let project = sample(&arena, 2);
        assert_eq!(project.prefix(), Path::new("../.."));
        assert_eq!(
            project.resolve(Path::new(""), "src/a.c"),
            Path::new("../../src/a.c")
        );

        let app = project.target("app").unwrap();
        assert_eq!(
            project.output_path(Path::new("/work"), app),
            Path::new("/work/../../bin/app")
        );
    }

    #[test]
    fn test_prefix_is_empty_at_root() {
        let arena = Arena::default();
        let project = sample(&arena, 0);
        assert_eq!(project.resolve(Path::new(""), "src/a.c"), Path::new("src/a.c"));
    }

    #[test]
    fn test_targets_of_filters_by_kind() {
        let arena = Arena::default();
        let project = sample(&arena, 0);
        let names: Vec<_> = project
            .targets_of(TargetKind::Debug)
            .map(|t| t.name)
            .collect();
        assert_eq!(names, vec!["app_dbg"]);
        assert!(project.target("missing").is_none());
    }
}
