use crate::console::{
    run_all, run_module, show_ledger, show_module, show_modules, LedgerArgs, ModulesListArgs,
    RunAllArgs, RunArgs,
};
use crate::server;
use clap::{Args, Parser, Subcommand};
use labkit::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Engineering Lab Toolkit",
    about = "Evaluate the engineering lab models from the command line or over HTTP",
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
    /// Browse the model catalog
    Modules {
        #[command(subcommand)]
        command: ModulesCommand,
    },
    /// Evaluate one model and print its outputs
    Run(RunArgs),
    /// Evaluate every catalog model with its default parameters
    RunAll(RunAllArgs),
    /// Print recorded results
    Ledger(LedgerArgs),
}

#[derive(Subcommand, Debug)]
enum ModulesCommand {
    /// List registered models, optionally for one suite
    List(ModulesListArgs),
    /// Show the parameter schema and outputs of a model
    Show {
        /// Model name, e.g. `brick_compression`
        name: String,
    },
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
        Command::Modules {
            command: ModulesCommand::List(args),
        } => show_modules(args),
        Command::Modules {
            command: ModulesCommand::Show { name },
        } => show_module(&name),
        Command::Run(args) => run_module(args),
        Command::RunAll(args) => run_all(args),
        Command::Ledger(args) => show_ledger(args),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn command_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn serve_is_the_default_command() {
        let cli = Cli::try_parse_from(["labkit-api"]).expect("parses");
        assert!(cli.command.is_none());
    }

    #[test]
    fn run_collects_repeated_params() {
        let cli = Cli::try_parse_from([
            "labkit-api",
            "run",
            "slump_test",
            "--param",
            "mix=plastic",
            "--param",
            "water_cement=0.6",
            "--record",
        ])
        .expect("parses");

        match cli.command {
            Some(Command::Run(args)) => {
                assert_eq!(args.name, "slump_test");
                assert_eq!(args.params.len(), 2);
                assert_eq!(args.params[0].0, "mix");
                assert!(args.record);
            }
            other => panic!("expected run command, got {other:?}"),
        }
    }

    #[test]
    fn malformed_params_are_rejected_by_the_parser() {
        let result = Cli::try_parse_from(["labkit-api", "run", "bmi", "--param", "weight"]);
        assert!(result.is_err());
    }
}
