//! `init` and `new`: starter projects.

use crate::config::CONFIG_FILE;
use crate::config::lexer::is_ident;
use anyhow::{Context, Result, bail};
use colored::*;
use std::fs;
use std::path::{Path, PathBuf};

const MAIN_C: &str = "#include <stdio.h>\n\nint main(int argc, char *argv[]) {\n\t(void)argc;\n\t(void)argv;\n\tprintf(\"Hello world!\\n\");\n\treturn 0;\n}\n";

fn config_template(name: &str) -> String {
    format!(
        "config {{\n\
         \tcompiler: cc\n\
         \tbuild_dir: build/\n\
         \tdefault_flags: [-Wall -Wextra]\n\
         }}\n\
         \n\
         target executable {name} {{\n\
         \tsources: [src/main.c]\n\
         \tflags: [-O3]\n\
         \toutput: build/bin/{name}\n\
         }}\n\
         \n\
         target debug {name}_debug {{\n\
         \tsources: [src/main.c]\n\
         \tflags: [-O0 -g3]\n\
         \toutput: build/debug/{name}_debug\n\
         }}\n"
    )
}

/// Maps bytes the config language cannot hold in a name to `_`.
fn sanitize_name(raw: &str) -> String {
    raw.bytes()
        .map(|b| if is_ident(b) && b != b'/' { b as char } else { '_' })
        .collect()
}

/// Writes `config.cat` and `src/main.c` into `dir`. Returns the target name.
pub fn init_in(dir: &Path) -> Result<String> {
    let config_path = dir.join(CONFIG_FILE);
    if config_path.exists() {
        bail!("Project already initialized ({} exists)", config_path.display());
    }

    let name = dir
        .file_name()
        .map(|n| sanitize_name(&n.to_string_lossy()))
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| "app".to_string());

    let src = dir.join("src");
    fs::create_dir_all(&src).with_context(|| format!("Failed to create {}", src.display()))?;

    fs::write(&config_path, config_template(&name))
        .with_context(|| format!("Failed to write {}", config_path.display()))?;

    let main = src.join("main.c");
    if !main.exists() {
        fs::write(&main, MAIN_C).with_context(|| format!("Failed to write {}", main.display()))?;
    }

    Ok(name)
}

/// Creates `parent/name` and initializes a project inside it.
pub fn new_in(parent: &Path, name: &str) -> Result<PathBuf> {
    if name.is_empty() || name.starts_with('.') || sanitize_name(name) != name {
        bail!(
            "Invalid project name `{}` (use letters, digits and any of _-.+=,@%~)",
            name
        );
    }

    let dir = parent.join(name);
    if dir.join(CONFIG_FILE).exists() {
        bail!("Project `{}` already exists", name);
    }
    fs::create_dir_all(&dir).with_context(|| format!("Failed to create {}", dir.display()))?;
    init_in(&dir)?;
    Ok(dir)
}

pub fn init() -> Result<()> {
    let cwd = std::env::current_dir().context("Failed to read current directory")?;
    let name = init_in(&cwd)?;
    println!(
        "{} Initialized project {}. Run {} to build.",
        "✓".green(),
        name.bold(),
        "catalyze run".bold().white()
    );
    Ok(())
}

pub fn new(name: &str) -> Result<()> {
    let cwd = std::env::current_dir().context("Failed to read current directory")?;
    new_in(&cwd, name)?;
    println!("{} Created project {}", "✓".green(), name.bold());
    println!("\nNext steps:\n  cd {}\n  catalyze run", name);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arena::Arena;
    use crate::config::{self, TargetKind};
    use tempfile::tempdir;

    #[test]
    fn test_new_project_parses() {
        let dir = tempdir().unwrap();
        let root = new_in(dir.path(), "hello").unwrap();
        assert!(root.join("src/main.c").is_file());

        let location = config::find_config(&root).unwrap();
        let arena = Arena::default();
        let project = config::load(&arena, &location).unwrap();

        assert_eq!(project.targets.len(), 2);
        let app = project.target("hello").unwrap();
        assert_eq!(app.kind, TargetKind::Executable);
        assert_eq!(app.output_dir, "build/bin");
        assert_eq!(project.target("hello_debug").unwrap().kind, TargetKind::Debug);
        assert_eq!(project.default_flags, &["-Wall", "-Wextra"]);
    }

    #[test]
    fn test_init_refuses_existing_config() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join(CONFIG_FILE), "keep me").unwrap();
        assert!(init_in(dir.path()).is_err());
        assert_eq!(fs::read_to_string(dir.path().join(CONFIG_FILE)).unwrap(), "keep me");
    }

    #[test]
    fn test_init_keeps_existing_main() {
        let dir = tempdir().unwrap();
        let project = dir.path().join("my project");
        fs::create_dir_all(project.join("src")).unwrap();
        fs::write(project.join("src/main.c"), "int main(void) { return 7; }").unwrap();

        let name = init_in(&project).unwrap();
        assert_eq!(name, "my_project");
        assert_eq!(
            fs::read_to_string(project.join("src/main.c")).unwrap(),
            "int main(void) { return 7; }"
        );
    }

    #[test]
    fn test_new_rejects_bad_names() {
        let dir = tempdir().unwrap();
        assert!(new_in(dir.path(), "a/b").is_err());
        assert!(new_in(dir.path(), "").is_err());
        assert!(new_in(dir.path(), "has space").is_err());
    }
}
