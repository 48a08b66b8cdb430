use anyhow::Context;
use clap::Parser;
use colored::*;
use kpmenu::cli::Cli;
use kpmenu::commands;
use std::process::ExitCode;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn setup_logging() {
    // RUST_LOG로 조정 가능, 기본은 info (표준 에러로)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    setup_logging();

    let args: Vec<String> = std::env::args().skip(1).collect();
    match commands::run(&cli, args).await.context("kpmenu failed") {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{} {:#}", "[X]".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}
