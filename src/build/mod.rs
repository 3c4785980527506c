mod core;
mod error;
mod executor;
mod feedback;
mod job;
mod progress;
mod waves;

pub use core::{
    BuildOptions, BuildReport, Builder, COMPILE_COMMANDS_FILE, CompileCommand, default_jobs,
    write_compile_commands,
};
pub use error::BuildError;
pub use executor::{Executor, Outcome, ProcessExecutor};
pub use feedback::FeedbackAnalyzer;
pub use job::{CompileJob, Invocation, compile_jobs, link_invocation, object_name};
pub use progress::{BuildObserver, ConsoleReporter, Silent, TargetState};
pub use waves::{WaveScheduler, wave_count};
