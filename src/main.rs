use clap::{Parser, Subcommand};

mod cmd;
mod tax;

#[derive(Parser, Debug)]
#[command(
    name = "taxpol",
    version,
    about = "UK income tax marginal rates and policy change modelling"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Tax, NI and marginal rate across a range of gross incomes
    Sweep(cmd::sweep::SweepCommand),
    /// Fiscal and behavioural impact of switching between two regimes
    Delta(cmd::delta::DeltaCommand),
    /// List the regimes in a dataset
    Regimes(cmd::regimes::RegimesCommand),
    /// Print expected input formats
    Schema(cmd::schema::SchemaCommand),
}

fn main() -> anyhow::Result<()> {
    pretty_env_logger::init();
    let cli = Cli::parse();
    match cli.command {
        Command::Sweep(cmd) => cmd.exec(),
        Command::Delta(cmd) => cmd.exec(),
        Command::Regimes(cmd) => cmd.exec(),
        Command::Schema(cmd) => cmd.exec(),
    }
}
