use std::path::Path;

use clap::{ArgAction, CommandFactory, Parser};
use constcat::concat;
use log::{info, warn};

use crate::{
    component::{CLIENT_CONTEXT, SERVER_CONTEXT},
    engine::{DockerEngine, Engine},
    log_sink::LogSink,
    orchestrator::{BuildOptions, BuildOrchestrator, BuildReport, Selection},
    Result,
};

pub const DEFAULT_REPOSITORY: &str = "lstavenhagen";

/// Written to the working directory and truncated on every run.
pub const LOG_FILE: &str = "dockerbuild.log";

/// Exit status used when only the usage is printed.
pub const USAGE_EXIT_CODE: i32 = 2;

const AFTER_HELP: &str = concat!(
    "The server image is built from ./",
    SERVER_CONTEXT,
    " and the client image from ./",
    CLIENT_CONTEXT,
    ". Build output is written to ./",
    LOG_FILE,
    "."
);

#[derive(Debug, Parser)]
#[command(
    version = crate::version::VERSION,
    about,
    arg_required_else_help = true,
    disable_help_flag = true,
    after_help = AFTER_HELP
)]
pub struct Cli {
    /// Repository prefix of the image tags.
    #[arg(long = "repo", value_name = "PREFIX", default_value = DEFAULT_REPOSITORY)]
    pub repository: String,

    /// Version tag applied to both images. Without it the image tags carry no version.
    #[arg(long = "tag")]
    pub tag: Option<String>,

    /// Build the server image.
    #[arg(long = "server", default_value_t)]
    pub server: bool,

    /// Build the client image.
    #[arg(long = "client", default_value_t)]
    pub client: bool,

    /// Do not use the build cache.
    #[arg(long = "nocache", default_value_t)]
    pub no_cache: bool,

    /// Always attempt to pull newer versions of the base images.
    #[arg(long = "pull", default_value_t)]
    pub pull: bool,

    /// Print help.
    #[arg(short = 'h', long = "help", action = ArgAction::SetTrue)]
    pub help: bool,
}

/// Prints the usage to stdout.
pub fn print_help() -> std::io::Result<()> {
    Cli::command().print_help()
}

impl Cli {
    pub fn selection(&self) -> Selection {
        Selection {
            server: self.server,
            client: self.client,
        }
    }

    pub fn run(self) -> Result<()> {
        let engine = DockerEngine::connect()?;
        info!("using docker {version}", version = engine.server_version());

        self.run_with(engine, &Path::new(".").join(LOG_FILE))?;
        Ok(())
    }

    /// Builds the selected components with `engine` while logging to a freshly truncated file at
    /// `log_path`. Failed builds are reported but do not make the run fail.
    pub fn run_with(self, engine: impl Engine, log_path: &Path) -> Result<BuildReport> {
        let selection = self.selection();
        let Cli {
            repository,
            tag,
            no_cache,
            pull,
            ..
        } = self;

        let sink = LogSink::create(log_path)
            .map_err(|error| format!("failed to create {}: {error}", log_path.display()))?;

        let orchestrator = BuildOrchestrator::new(
            engine,
            &repository,
            tag.as_deref(),
            BuildOptions { no_cache, pull },
            sink,
        );

        let report = orchestrator.build_selected(selection);

        let failed = report
            .failed()
            .map(|component| component.name())
            .collect::<Vec<_>>();
        if !failed.is_empty() {
            warn!(
                "failed to build {failed}, see {log} for details",
                failed = failed.join(" and "),
                log = log_path.display()
            );
        }

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use clap::error::ErrorKind;

    use super::*;
    use crate::{
        component::Component, engine::testing::FakeEngine, orchestrator::BuildOutcome, temp_path,
    };

    /// Parses `args`, runs against `engine` and returns the report together with the log file.
    fn run_with(args: &[&str], engine: &FakeEngine) -> (BuildReport, String) {
        let log_path = temp_path::tmp_path(".log");
        let cli = Cli::try_parse_from(std::iter::once("buildapp").chain(args.iter().copied()))
            .unwrap();
        let report = cli.run_with(engine, &log_path).unwrap();
        let log = std::fs::read_to_string(&log_path).unwrap();
        std::fs::remove_file(&log_path).unwrap();
        (report, log)
    }

    #[test]
    fn no_component_selected_is_a_quiet_success() {
        let engine = FakeEngine::succeeding();
        let (report, log) = run_with(&["--tag", "1.0"], &engine);
        assert!(engine.invocations.borrow().is_empty());
        assert!(report.outcomes.is_empty());
        assert_eq!(log, "");
    }

    #[test]
    fn selected_components_are_built_and_logged() {
        let engine = FakeEngine::succeeding();
        let (report, log) = run_with(
            &["--repo", "acme", "--tag", "2", "--client", "--server", "--pull"],
            &engine,
        );
        let tags = engine
            .invocations
            .borrow()
            .iter()
            .map(|invocation| (invocation.tag.clone(), invocation.use_cache, invocation.pull))
            .collect::<Vec<_>>();
        assert_eq!(
            tags,
            [
                ("acme/rest-server:2".to_owned(), true, true),
                ("acme/react-client:2".to_owned(), true, true),
            ]
        );
        assert_eq!(report.failed().count(), 0);
        assert!(log.contains("created image. ID: sha256:acme/rest-server:2"));
        assert!(log.contains("created image. ID: sha256:acme/react-client:2"));
    }

    #[test]
    fn failed_builds_do_not_fail_the_run() {
        let engine = FakeEngine::failing();
        let (report, log) = run_with(&["--server", "--client", "--nocache"], &engine);
        assert_eq!(engine.invocations.borrow().len(), 2);
        assert!(engine
            .invocations
            .borrow()
            .iter()
            .all(|invocation| !invocation.use_cache));
        assert_eq!(
            report.outcomes,
            [
                (Component::Server, BuildOutcome::Failed),
                (Component::Client, BuildOutcome::Failed),
            ]
        );
        assert!(log.contains(
            " ERROR buildapp: build error: failed to solve: lstavenhagen/rest-server"
        ));
        assert!(log.contains(
            " ERROR buildapp: build error: failed to solve: lstavenhagen/react-client"
        ));
    }

    #[test]
    fn unwritable_log_file_is_an_error() {
        let engine = FakeEngine::succeeding();
        let log_path = temp_path::tmp_path("").join("missing-dir").join(LOG_FILE);
        let cli = Cli::try_parse_from(["buildapp", "--server"]).unwrap();
        let error = cli.run_with(&engine, &log_path).unwrap_err();
        assert!(error.to_string().starts_with("failed to create"));
        assert!(engine.invocations.borrow().is_empty());
    }

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn no_arguments_prints_usage() {
        let error = Cli::try_parse_from(["buildapp"]).unwrap_err();
        assert_eq!(
            error.kind(),
            ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand
        );
        assert_ne!(error.exit_code(), 0);
    }

    #[test]
    fn help_flag_is_reported_instead_of_exiting() {
        for flag in ["-h", "--help"] {
            let cli = Cli::try_parse_from(["buildapp", flag]).unwrap();
            assert!(cli.help);
        }
    }

    #[test]
    fn unknown_flag_is_a_parse_error() {
        let error = Cli::try_parse_from(["buildapp", "--server", "--push"]).unwrap_err();
        assert_eq!(error.kind(), ErrorKind::UnknownArgument);
        assert_ne!(error.exit_code(), 0);
    }

    #[test]
    fn defaults() {
        let cli = Cli::try_parse_from(["buildapp", "--nocache"]).unwrap();
        assert_eq!(cli.repository, "lstavenhagen");
        assert_eq!(cli.tag, None);
        assert!(cli.no_cache);
        assert!(!cli.pull);
        assert_eq!(cli.selection(), Selection::default());
    }

    #[test]
    fn all_flags() {
        let cli = Cli::try_parse_from([
            "buildapp", "--repo", "acme", "--tag", "1.4", "--server", "--client", "--nocache",
            "--pull",
        ])
        .unwrap();
        assert_eq!(cli.repository, "acme");
        assert_eq!(cli.tag.as_deref(), Some("1.4"));
        assert!(cli.no_cache);
        assert!(cli.pull);
        assert_eq!(cli.selection(), Selection::ALL);
    }

    #[test]
    fn help_mentions_contexts_and_log_file() {
        let help = Cli::command().render_help().to_string();
        assert!(help.contains("./rest-server"));
        assert!(help.contains("./react-client"));
        assert!(help.contains("./dockerbuild.log"));
        assert!(help.contains("--nocache"));
    }
}
