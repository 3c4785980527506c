use super::error::BuildError;
use super::executor::Executor;
use super::job::{CompileJob, compile_jobs, link_invocation};
use super::progress::{BuildObserver, TargetState};
use super::waves::{WaveScheduler, wave_count};
use crate::config::{ProjectConfig, Target, TargetKind};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

pub const COMPILE_COMMANDS_FILE: &str = "compile_commands.json";

/// Logical cores, or 1 when that cannot be determined.
pub fn default_jobs() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

#[derive(Debug, Clone)]
pub struct BuildOptions {
    /// Maximum compile jobs per wave.
    pub jobs: usize,
    /// Directory the command was invoked from. Project paths are resolved
    /// against it through the discovery prefix.
    pub base: PathBuf,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            jobs: default_jobs(),
            base: PathBuf::new(),
        }
    }
}

/// What a successful target build produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildReport {
    pub target: String,
    pub kind: TargetKind,
    /// One per source, in source-list order.
    pub objects: Vec<PathBuf>,
    pub output: PathBuf,
    pub waves: usize,
    pub commands: Vec<CompileCommand>,
}

/// One `compile_commands.json` entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompileCommand {
    pub directory: String,
    pub file: String,
    pub arguments: Vec<String>,
}

impl CompileCommand {
    fn from_job(job: &CompileJob, directory: &Path) -> Self {
        let mut arguments = Vec::with_capacity(job.invocation.args.len() + 1);
        arguments.push(job.invocation.program.clone());
        arguments.extend(job.invocation.args.iter().cloned());
        Self {
            directory: directory.to_string_lossy().into_owned(),
            file: job.source_path.to_string_lossy().into_owned(),
            arguments,
        }
    }
}

/// Writes every compile command of `reports` as one JSON array.
pub fn write_compile_commands(path: &Path, reports: &[BuildReport]) -> anyhow::Result<()> {
    let entries: Vec<&CompileCommand> = reports.iter().flat_map(|r| &r.commands).collect();
    let json = serde_json::to_string_pretty(&entries)?;
    fs::write(path, json)?;
    Ok(())
}

/// Drives targets through directory setup, wave compilation and linking.
pub struct Builder<'a, 'r> {
    project: ProjectConfig<'a>,
    base: PathBuf,
    scheduler: WaveScheduler,
    executor: &'r dyn Executor,
    observer: &'r dyn BuildObserver,
}

impl<'a, 'r> Builder<'a, 'r> {
    pub fn new(
        project: ProjectConfig<'a>,
        options: BuildOptions,
        executor: &'r dyn Executor,
        observer: &'r dyn BuildObserver,
    ) -> Result<Self, BuildError> {
        Ok(Self {
            project,
            base: options.base,
            scheduler: WaveScheduler::new(options.jobs)?,
            executor,
            observer,
        })
    }

    pub fn build_target(&self, name: &str) -> Result<BuildReport, BuildError> {
        let target = self
            .project
            .target(name)
            .ok_or_else(|| BuildError::TargetNotFound(name.to_string()))?;
        self.build(target)
    }

    /// Builds each named target in order, stopping at the first failure.
    pub fn build_targets<S: AsRef<str>>(
        &self,
        names: &[S],
    ) -> Result<Vec<BuildReport>, BuildError> {
        names.iter().map(|n| self.build_target(n.as_ref())).collect()
    }

    /// Builds every executable target in file order. Debug and test
    /// targets are only built when asked for by name.
    pub fn build_all(&self) -> Result<Vec<BuildReport>, BuildError> {
        self.project
            .targets_of(TargetKind::Executable)
            .map(|t| self.build(t))
            .collect()
    }

    pub fn build(&self, target: &Target<'a>) -> Result<BuildReport, BuildError> {
        self.observer.target_state(target.name, TargetState::Pending);
        let result = self.run_target(target);
        let state = match result {
            Ok(_) => TargetState::Linked,
            Err(_) => TargetState::Failed,
        };
        self.observer.target_state(target.name, state);
        result
    }

    fn run_target(&self, target: &Target<'a>) -> Result<BuildReport, BuildError> {
        let jobs = compile_jobs(&self.project, target, &self.base)?;

        ensure_dir(&self.project.build_path(&self.base))?;
        ensure_dir(&self.project.resolve(&self.base, target.output_dir))?;
        self.observer
            .target_state(target.name, TargetState::DirectoriesReady);

        let waves = wave_count(jobs.len(), self.scheduler.width());
        self.observer.planned(target.name, jobs.len(), waves);

        let objects = self.scheduler.run(
            &jobs,
            |wave, size| {
                self.observer
                    .target_state(target.name, TargetState::Compiling { wave, size })
            },
            |job| self.compile(job),
        )?;

        let output = self.project.output_path(&self.base, target);
        self.link(target, &objects, &output)?;

        let commands = jobs
            .iter()
            .map(|job| CompileCommand::from_job(job, &self.base))
            .collect();

        Ok(BuildReport {
            target: target.name.to_string(),
            kind: target.kind,
            objects,
            output,
            waves,
            commands,
        })
    }

    fn compile(&self, job: &CompileJob) -> Result<PathBuf, BuildError> {
        self.observer.command(&job.invocation);
        let outcome = self.executor.run(&job.invocation)?;
        self.observer.compiled(job, &outcome);

        if !outcome.success {
            return Err(BuildError::Compile {
                file: job.source.clone(),
                code: outcome.code,
            });
        }
        Ok(job.object_path.clone())
    }

    fn link(
        &self,
        target: &Target<'a>,
        objects: &[PathBuf],
        output: &Path,
    ) -> Result<(), BuildError> {
        let invocation = link_invocation(&self.project, target, objects, output);
        self.observer.command(&invocation);
        let outcome = self.executor.run(&invocation)?;
        self.observer.linked(output, &outcome);

        if !outcome.success {
            return Err(BuildError::Link {
                output: output.to_path_buf(),
                code: outcome.code,
            });
        }
        Ok(())
    }
}

/// Recursive and idempotent: an existing directory is not an error.
fn ensure_dir(path: &Path) -> Result<(), BuildError> {
    if path.as_os_str().is_empty() {
        return Ok(());
    }
    fs::create_dir_all(path).map_err(|source| BuildError::CreateDir {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arena::Arena;
    use crate::build::executor::Outcome;
    use crate::build::job::Invocation;
    use crate::build::progress::Silent;
    use crate::config::{ParseContext, parse};
    use std::sync::Mutex;
    use tempfile::tempdir;

    /// Records every invocation; fails compiles whose source path ends
    /// with one of `fail_sources`, and links when `fail_link` is set.
    #[derive(Default)]
    struct FakeExecutor {
        fail_sources: Vec<&'static str>,
        fail_link: bool,
        calls: Mutex<Vec<Invocation>>,
    }

    impl FakeExecutor {
        fn failing(sources: &[&'static str]) -> Self {
            Self {
                fail_sources: sources.to_vec(),
                ..Default::default()
            }
        }

        fn calls(&self) -> Vec<Invocation> {
            self.calls.lock().unwrap().clone()
        }

        fn compiled_sources(&self) -> Vec<String> {
            let mut sources: Vec<String> = self
                .calls()
                .iter()
                .filter(|i| i.args.first().map(String::as_str) == Some("-c"))
                .map(|i| i.args[1].clone())
                .collect();
            sources.sort();
            sources
        }

        fn links(&self) -> Vec<Invocation> {
            self.calls()
                .into_iter()
                .filter(|i| i.args.first().map(String::as_str) != Some("-c"))
                .collect()
        }
    }

    impl Executor for FakeExecutor {
        fn run(&self, invocation: &Invocation) -> Result<Outcome, BuildError> {
            self.calls.lock().unwrap().push(invocation.clone());

            let is_compile = invocation.args.first().map(String::as_str) == Some("-c");
            let fails = if is_compile {
                let source = &invocation.args[1];
                self.fail_sources.iter().any(|s| source.ends_with(s))
            } else {
                self.fail_link
            };

            if fails {
                Ok(Outcome::failed(1, "error: boom"))
            } else {
                Ok(Outcome::ok())
            }
        }
    }

    #[derive(Default)]
    struct Recorder {
        states: Mutex<Vec<(String, TargetState)>>,
    }

    impl Recorder {
        fn states_of(&self, target: &str) -> Vec<TargetState> {
            self.states
                .lock()
                .unwrap()
                .iter()
                .filter(|(t, _)| t == target)
                .map(|(_, s)| *s)
                .collect()
        }
    }

    impl BuildObserver for Recorder {
        fn target_state(&self, target: &str, state: TargetState) {
            self.states.lock().unwrap().push((target.to_string(), state));
        }
    }

    const PROJECT: &str = "config { compiler: cc build_dir: build/ default_flags: [-Wall] }\n\
        target executable app { sources: [s1.c s2.c s3.c s4.c s5.c] flags: [-O2] output: bin/app }\n\
        target debug app_dbg { sources: [s1.c] flags: [-g] output: dbg/app }\n\
        target test app_test { sources: [t.c] output: tests/app_test }\n\
        target executable tool { sources: [tool.c] output: bin/tool }";

    fn project(arena: &Arena) -> ProjectConfig<'_> {
        parse(arena, arena.alloc_str(PROJECT), &ParseContext::default()).unwrap()
    }

    fn options(base: &Path, jobs: usize) -> BuildOptions {
        BuildOptions {
            jobs,
            base: base.to_path_buf(),
        }
    }

    #[test]
    fn test_successful_build_compiles_in_waves_then_links() {
        let dir = tempdir().unwrap();
        let arena = Arena::default();
        let executor = FakeExecutor::default();
        let recorder = Recorder::default();
        let builder =
            Builder::new(project(&arena), options(dir.path(), 2), &executor, &recorder).unwrap();

        let report = builder.build_target("app").unwrap();

        assert_eq!(report.waves, 3);
        assert_eq!(report.objects.len(), 5);
        assert_eq!(report.objects[3], dir.path().join("build/s4.o"));
        assert_eq!(report.output, dir.path().join("bin/app"));
        assert!(dir.path().join("build").is_dir());
        assert!(dir.path().join("bin").is_dir());

        assert_eq!(
            recorder.states_of("app"),
            vec![
                TargetState::Pending,
                TargetState::DirectoriesReady,
                TargetState::Compiling { wave: 0, size: 2 },
                TargetState::Compiling { wave: 1, size: 2 },
                TargetState::Compiling { wave: 2, size: 1 },
                TargetState::Linked,
            ]
        );

        let calls = executor.calls();
        assert_eq!(calls.len(), 6);
        let link = calls.last().unwrap();
        assert_eq!(link.program, "cc");
        assert_eq!(link.args.len(), 5 + 2 + 2);
        assert_eq!(
            &link.args[5..],
            &["-o", &*dir.path().join("bin/app").to_string_lossy(), "-Wall", "-O2"]
        );
    }

    #[test]
    fn test_failure_in_second_wave_stops_third_and_skips_link() {
        let dir = tempdir().unwrap();
        let arena = Arena::default();
        let executor = FakeExecutor::failing(&["s4.c"]);
        let recorder = Recorder::default();
        let builder =
            Builder::new(project(&arena), options(dir.path(), 2), &executor, &recorder).unwrap();

        let err = builder.build_target("app").unwrap_err();
        assert!(matches!(err, BuildError::Compile { ref file, code: Some(1) } if file == "s4.c"));

        let compiled = executor.compiled_sources();
        assert_eq!(compiled.len(), 4);
        assert!(!compiled.iter().any(|s| s.ends_with("s5.c")));
        assert!(executor.links().is_empty());

        assert_eq!(
            recorder.states_of("app"),
            vec![
                TargetState::Pending,
                TargetState::DirectoriesReady,
                TargetState::Compiling { wave: 0, size: 2 },
                TargetState::Compiling { wave: 1, size: 2 },
                TargetState::Failed,
            ]
        );
    }

    #[test]
    fn test_link_failure_is_reported() {
        let dir = tempdir().unwrap();
        let arena = Arena::default();
        let executor = FakeExecutor {
            fail_link: true,
            ..Default::default()
        };
        let builder =
            Builder::new(project(&arena), options(dir.path(), 4), &executor, &Silent).unwrap();

        let err = builder.build_target("tool").unwrap_err();
        assert!(matches!(err, BuildError::Link { .. }));
    }

    #[test]
    fn test_build_all_only_sweeps_executables() {
        let dir = tempdir().unwrap();
        let arena = Arena::default();
        let executor = FakeExecutor::default();
        let builder =
            Builder::new(project(&arena), options(dir.path(), 8), &executor, &Silent).unwrap();

        let reports = builder.build_all().unwrap();
        let names: Vec<_> = reports.iter().map(|r| r.target.as_str()).collect();
        assert_eq!(names, vec!["app", "tool"]);
        assert_eq!(executor.links().len(), 2);
        assert!(!executor.compiled_sources().iter().any(|s| s.ends_with("t.c")));
    }

    #[test]
    fn test_build_all_is_fail_fast_across_targets() {
        let dir = tempdir().unwrap();
        let arena = Arena::default();
        let executor = FakeExecutor::failing(&["s2.c"]);
        let recorder = Recorder::default();
        let builder =
            Builder::new(project(&arena), options(dir.path(), 8), &executor, &recorder).unwrap();

        assert!(builder.build_all().is_err());
        assert!(recorder.states_of("tool").is_empty());
        assert!(!executor.compiled_sources().iter().any(|s| s.ends_with("tool.c")));
    }

    #[test]
    fn test_unknown_target() {
        let arena = Arena::default();
        let executor = FakeExecutor::default();
        let builder =
            Builder::new(project(&arena), BuildOptions::default(), &executor, &Silent).unwrap();
        let err = builder.build_target("nope").unwrap_err();
        assert!(matches!(err, BuildError::TargetNotFound(ref n) if n == "nope"));
    }

    #[test]
    fn test_named_targets_build_in_order() {
        let dir = tempdir().unwrap();
        let arena = Arena::default();
        let executor = FakeExecutor::default();
        let builder =
            Builder::new(project(&arena), options(dir.path(), 1), &executor, &Silent).unwrap();

        let reports = builder.build_targets(&["app_test", "app_dbg"]).unwrap();
        assert_eq!(reports[0].kind, TargetKind::Test);
        assert_eq!(reports[1].output, dir.path().join("dbg/app"));
        assert_eq!(reports[1].waves, 1);
    }

    #[test]
    fn test_directory_creation_failure() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("build"), "not a directory").unwrap();
        let arena = Arena::default();
        let executor = FakeExecutor::default();
        let builder =
            Builder::new(project(&arena), options(dir.path(), 2), &executor, &Silent).unwrap();

        let err = builder.build_target("tool").unwrap_err();
        assert!(matches!(err, BuildError::CreateDir { .. }));
        assert!(executor.calls().is_empty());
    }

    #[test]
    fn test_compile_commands_cover_every_target() {
        let dir = tempdir().unwrap();
        let arena = Arena::default();
        let executor = FakeExecutor::default();
        let builder =
            Builder::new(project(&arena), options(dir.path(), 4), &executor, &Silent).unwrap();
        let reports = builder.build_all().unwrap();

        let path = dir.path().join(COMPILE_COMMANDS_FILE);
        write_compile_commands(&path, &reports).unwrap();

        let json: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        let entries = json.as_array().unwrap();
        assert_eq!(entries.len(), 6);
        assert_eq!(entries[0]["arguments"][0], "cc");
        assert_eq!(entries[0]["arguments"][1], "-c");
        assert!(entries[5]["file"].as_str().unwrap().ends_with("tool.c"));
    }
}
