use crate::demo::{run_demo, run_pipeline, run_screening, DemoArgs, PipelineRunArgs, ScreenArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use talent_ai::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Talent AI Recruiting Pipeline",
    about = "Source, screen, contact, and follow up with candidates from the command line",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Score a CSV export of candidates against a job description
    Screen(ScreenArgs),
    /// Run the recruiting pipeline over local files
    Pipeline {
        #[command(subcommand)]
        command: PipelineCommand,
    },
    /// Run the full pipeline on built-in sample candidates and replies
    Demo(DemoArgs),
}

#[derive(Subcommand, Debug)]
enum PipelineCommand {
    /// Source, screen, contact, and process replies in one run
    Run(PipelineRunArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Screen(args) => run_screening(args),
        Command::Pipeline {
            command: PipelineCommand::Run(args),
        } => run_pipeline(args),
        Command::Demo(args) => run_demo(args),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn serve_is_the_default_command() {
        let cli = Cli::try_parse_from(["talent-ai-api"]).expect("parses");
        assert!(cli.command.is_none());
    }

    #[test]
    fn pipeline_run_requires_a_job_file() {
        assert!(Cli::try_parse_from(["talent-ai-api", "pipeline", "run"]).is_err());
        let cli = Cli::try_parse_from([
            "talent-ai-api",
            "pipeline",
            "run",
            "--job",
            "job.json",
            "--candidates",
            "candidates.csv",
            "--today",
            "2026-03-06",
        ])
        .expect("parses");
        assert!(matches!(
            cli.command,
            Some(Command::Pipeline {
                command: PipelineCommand::Run(_)
            })
        ));
    }
}
