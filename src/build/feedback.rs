use colored::*;

/// Turns common compiler and linker failures into a short hint.
pub struct FeedbackAnalyzer;

impl FeedbackAnalyzer {
    pub fn analyze(output: &str) -> Option<String> {
        // Entry point missing while linking a program
        if output.contains("undefined reference to `main'")
            || output.contains("undefined reference to `main\u{2019}")
            || output.contains("_main\", referenced from")
        {
            return Some(format!(
                "No {} function was linked.\nCheck that the file defining it is listed in {}, or build the target as {}.",
                "main()".bold().yellow(),
                "sources".bold().green(),
                "static_lib".bold().green()
            ));
        }

        // Missing symbol from another object or library
        if output.contains("undefined reference to") || output.contains("Undefined symbols") {
            return Some(format!(
                "It looks like a {} error.\nA source may be missing from {} or a library from {} (e.g. -lm).",
                "Linker".bold().red(),
                "sources".bold().yellow(),
                "flags".bold().yellow()
            ));
        }

        // Missing header
        if output.contains("fatal error: ")
            && (output.contains("No such file or directory") || output.contains("file not found"))
        {
            return Some(format!(
                "It looks like a {} error.\nAdd the include directory to {} or {} in config.cat (e.g. -Iinclude).",
                "Missing Header".bold().red(),
                "default_flags".bold().yellow(),
                "flags".bold().yellow()
            ));
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linker_error() {
        let err = "foo.c:(.text+0x5): undefined reference to `bar'";
        let msg = FeedbackAnalyzer::analyze(err).unwrap();
        assert!(msg.contains("Linker"));
        assert!(msg.contains("flags"));
    }

    #[test]
    fn test_include_error() {
        let err = "src/main.c:1:10: fatal error: foo.h: No such file or directory";
        let msg = FeedbackAnalyzer::analyze(err).unwrap();
        assert!(msg.contains("Missing Header"));
        assert!(msg.contains("config.cat"));
    }

    #[test]
    fn test_main_error() {
        let err = "/usr/bin/ld: crt1.o: in function `_start': undefined reference to `main'";
        let msg = FeedbackAnalyzer::analyze(err).unwrap();
        assert!(msg.contains("main()"));
    }

    #[test]
    fn test_unrelated_output() {
        assert!(FeedbackAnalyzer::analyze("warning: unused variable 'x'").is_none());
    }
}
