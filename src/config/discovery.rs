use super::error::ConfigError;
use super::parser::SourceResolver;
use std::io;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

pub const CONFIG_FILE: &str = "config.cat";

/// Parent directories searched above the starting directory.
pub const MAX_DISCOVERY_DEPTH: usize = 14;

pub const SOURCE_EXTENSIONS: &[&str] = &["c", "cc", "cpp", "cxx"];

/// Where `config.cat` was found relative to the invocation directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectLocation {
    /// Directory containing `config.cat`.
    pub root: PathBuf,
    /// Levels climbed from the starting directory to reach `root`.
    pub depth: usize,
}

impl ProjectLocation {
    pub fn config_path(&self) -> PathBuf {
        self.root.join(CONFIG_FILE)
    }
}

/// Looks for `config.cat` in `start`, then in each parent up to
/// [`MAX_DISCOVERY_DEPTH`] levels.
pub fn find_config(start: &Path) -> Result<ProjectLocation, ConfigError> {
    start
        .ancestors()
        .take(MAX_DISCOVERY_DEPTH + 1)
        .enumerate()
        .find(|(_, dir)| dir.join(CONFIG_FILE).is_file())
        .map(|(depth, dir)| ProjectLocation {
            root: dir.to_path_buf(),
            depth,
        })
        .ok_or_else(|| ConfigError::NotFound {
            file: CONFIG_FILE,
            start: start.to_path_buf(),
        })
}

/// Expands directory entries into the C/C++ sources beneath them.
pub struct WalkDirResolver {
    root: PathBuf,
}

impl WalkDirResolver {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }
}

fn is_source(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| SOURCE_EXTENSIONS.contains(&ext))
}

impl SourceResolver for WalkDirResolver {
    fn expand(&self, entry: &str) -> io::Result<Option<Vec<String>>> {
        let dir = self.root.join(entry);
        if !dir.is_dir() {
            return Ok(None);
        }

        let mut files = Vec::new();
        for item in WalkDir::new(&dir).sort_by_file_name() {
            let item = item?;
            let path = item.path();
            if !item.file_type().is_file() || !is_source(path) {
                continue;
            }
            let relative = path.strip_prefix(&self.root).unwrap_or(path);
            let joined: Vec<_> = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect();
            files.push(joined.join("/"));
        }

        Ok(Some(files))
    }
}
