use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BuildError {
    #[error("target `{0}` not found")]
    TargetNotFound(String),

    #[error("failed to create directory {}", path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("source `{file}` in target `{target}` has no file name")]
    InvalidSource { target: String, file: String },

    #[error("`{first}` and `{second}` in target `{target}` both compile to {object}")]
    ObjectCollision {
        target: String,
        first: String,
        second: String,
        object: String,
    },

    #[error("target `{0}` has no sources")]
    NoSources(String),

    #[error("failed to launch `{program}`")]
    Launch {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to compile {file} ({})", exit_status(*code))]
    Compile { file: String, code: Option<i32> },

    #[error("failed to link {} ({})", output.display(), exit_status(*code))]
    Link { output: PathBuf, code: Option<i32> },

    #[error("failed to start compile workers")]
    Pool(#[from] rayon::ThreadPoolBuildError),
}

fn exit_status(code: Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {code}"),
        None => "terminated by signal".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        let err = BuildError::Compile {
            file: "src/a.c".into(),
            code: Some(1),
        };
        assert_eq!(err.to_string(), "failed to compile src/a.c (exit code 1)");

        let err = BuildError::Link {
            output: PathBuf::from("bin/app"),
            code: None,
        };
        assert_eq!(err.to_string(), "failed to link bin/app (terminated by signal)");

        let err = BuildError::TargetNotFound("ghost".into());
        assert_eq!(err.to_string(), "target `ghost` not found");
    }
}
