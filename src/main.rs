// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod cli;
use cli::{Cli, Commands};

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    let result = match cli.command {
        Commands::Index { root, scope, force } => cli::run_index(&root, scope, force),
        Commands::Search {
            root,
            query,
            scope,
            limit,
            timeout_ms,
            json,
        } => cli::run_search(&root, &query, scope, limit, timeout_ms, json),
        Commands::Inspect { root } => cli::run_inspect(&root),
    };

    if let Err(e) = result {
        eprintln!("❌ {}", e);
        std::process::exit(1);
    }
}

fn init_tracing(verbose: u8, quiet: bool) {
    if quiet {
        return;
    }

    let filter = match verbose {
        0 => "warn,loresift=info",
        1 => "info,loresift=debug",
        2 => "debug,loresift=trace",
        _ => "trace",
    };

    // An explicit -v beats RUST_LOG
    let env_filter = if verbose == 0 {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter))
    } else {
        EnvFilter::new(filter)
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .init();
}
