use anyhow::Result;
use clap::{Parser, Subcommand};
use std::process::Command;

#[derive(Parser)]
#[command(name = "xtask", about = "Workspace automation for volray")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// fmt, clippy, tests, then the headless smoke run
    Check,
    /// cargo fmt --check on all crates
    Fmt,
    /// clippy with warnings denied
    Clippy,
    /// All workspace tests
    Test,
    /// Volume generation timing bench
    Bench,
    /// Generate a volume and run scripted frames through the CLI
    Smoke,
}

const FMT: &[&str] = &["fmt", "--all", "--", "--check"];
const CLIPPY: &[&str] = &[
    "clippy",
    "--workspace",
    "--all-targets",
    "--",
    "-D",
    "warnings",
];
const TEST: &[&str] = &["test", "--workspace"];
const BENCH: &[&str] = &["bench", "-p", "volray-volume"];
const SMOKE_GENERATE: &[&str] = &[
    "run", "-q", "-p", "volray-cli", "--", "--grid-size", "32", "generate",
];
const SMOKE_SIMULATE: &[&str] = &[
    "run", "-q", "-p", "volray-cli", "--", "--grid-size", "32", "simulate", "--ticks", "30",
    "--hold", "w", "--look", "4,-2",
];

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Check => {
            cargo("fmt", FMT)?;
            cargo("clippy", CLIPPY)?;
            cargo("test", TEST)?;
            smoke()?;
        }
        Commands::Fmt => cargo("fmt", FMT)?,
        Commands::Clippy => cargo("clippy", CLIPPY)?,
        Commands::Test => cargo("test", TEST)?,
        Commands::Bench => cargo("bench", BENCH)?,
        Commands::Smoke => smoke()?,
    }

    Ok(())
}

fn smoke() -> Result<()> {
    cargo("smoke generate", SMOKE_GENERATE)?;
    cargo("smoke simulate", SMOKE_SIMULATE)
}

fn cargo(step: &str, args: &[&str]) -> Result<()> {
    println!("==> {step}: cargo {}", args.join(" "));
    let status = Command::new("cargo").args(args).status()?;
    if !status.success() {
        anyhow::bail!("{step} failed ({status})");
    }
    Ok(())
}
