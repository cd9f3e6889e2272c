use std::fs;
use std::path::PathBuf;

use agentstudio::{execute_graph, AgentGraph, ExecutionMode, LoggingConfig};
use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "agentstudio", version, about = "Agent Studio CLI", author)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Execute a graph document and print the run record as JSON.
    Run {
        file: PathBuf,
        #[arg(long, value_enum, default_value_t = ModeArg::Sandbox)]
        mode: ModeArg,
    },
    /// Check a graph document for structural problems.
    Validate {
        file: PathBuf,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum ModeArg {
    Sandbox,
    Byok,
}

impl From<ModeArg> for ExecutionMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Sandbox => ExecutionMode::Sandbox,
            ModeArg::Byok => ExecutionMode::Byok,
        }
    }
}

fn main() -> anyhow::Result<()> {
    LoggingConfig::init();

    let cli = Cli::parse();
    match cli.command {
        Command::Run { file, mode } => {
            let raw = fs::read_to_string(&file)?;
            let graph = AgentGraph::from_json(&raw)?;
            graph.validate()?;
            let run = execute_graph(graph, mode.into());
            println!("{}", serde_json::to_string_pretty(&run)?);
        }
        Command::Validate { file } => {
            let raw = fs::read_to_string(&file)?;
            let graph = AgentGraph::from_json(&raw)?;
            graph.validate()?;
            println!(
                "{}: {} nodes, {} edges, OK",
                file.display(),
                graph.nodes.len(),
                graph.edges.len()
            );
        }
    }
    Ok(())
}
