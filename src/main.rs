use clap::{Parser, Subcommand};

use commands::GlobalArgs;

mod commands;
mod output;

use commands::{check, rules, run};

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Parser)]
#[command(name = "fixsweep")]
#[command(version = VERSION)]
#[command(about = "Sweep a source tree and rewrite known-broken code fragments")]
struct Cli {
    /// Print a JSON envelope instead of text
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Rewrite matching files under a root
    Run(run::RunArgs),
    /// List the effective pattern catalog
    Rules(rules::RulesArgs),
    /// Print the rewritten content of one file without writing it
    Check(check::CheckArgs),
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_env("FIXSWEEP_LOG")
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> std::process::ExitCode {
    init_tracing();

    let cli = Cli::parse();
    let global = GlobalArgs { json: cli.json };

    let exit_code = commands::run(cli.command, &global);
    std::process::ExitCode::from(exit_code_to_u8(exit_code))
}

fn exit_code_to_u8(code: i32) -> u8 {
    if code <= 0 {
        0
    } else if code >= 255 {
        255
    } else {
        code as u8
    }
}
