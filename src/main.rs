//! Crash-tolerant debugger-extension test harness
//!
//! `run` drives one debugger session process per scenario and reports
//! from durable on-disk state; `session` is the hidden in-process half
//! launched by the driver; `report` re-renders an existing summary log.

use clap::Parser;

use harness::commands::Commands;
use harness::common::{logging, FileConfig, LaunchConfig, LaunchOverrides, Result};
use harness::scenario::Registry;
use harness::session::SessionConfig;
use harness::{driver, report, session};

#[derive(Parser)]
#[command(name = "harness", about = "Crash-tolerant debugger-extension test harness")]
#[command(version, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run {
            scenarios,
            lldb,
            corerun,
            plugin,
            assembly,
            timeout,
            work_dir,
            list,
        } => {
            logging::init_driver();
            if list {
                for name in Registry::builtin().names() {
                    println!("{name}");
                }
                Ok(())
            } else {
                let overrides = LaunchOverrides {
                    lldb,
                    corerun,
                    plugin,
                    assembly,
                    timeout_secs: timeout,
                    work_dir,
                };
                run(overrides, scenarios).await
            }
        }
        Commands::Session {
            lldb,
            corerun,
            plugin,
            assembly,
            work_dir,
            scenario,
        } => {
            logging::init_session();
            let cfg = SessionConfig {
                launch: LaunchConfig::from_resolved(lldb, corerun, plugin, assembly, work_dir),
                scenario,
            };
            session::run(cfg).await
        }
        Commands::Report { summary, json } => {
            logging::init_driver();
            report::print_from_file(&summary, json)
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn run(overrides: LaunchOverrides, scenarios: Vec<String>) -> Result<()> {
    let file = FileConfig::load()?;
    let cfg = LaunchConfig::resolve(overrides, file)?;
    let summary = driver::run(cfg, scenarios).await?;

    if summary.failed > 0 {
        std::process::exit(1);
    }
    Ok(())
}
