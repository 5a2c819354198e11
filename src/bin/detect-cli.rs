// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use anyhow::Result;
use car_parts_detector::cli::{execute, Cli};
use car_parts_detector::config::ServiceConfig;
use clap::Parser;

fn main() -> Result<()> {
    dotenv::dotenv().ok();

    // Initialize logging
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "info");
    }
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let config = ServiceConfig::load()?;

    match execute(cli, config) {
        Ok(_) => Ok(()),
        Err(e) => {
            tracing::error!("❌ {:#}", e);
            std::process::exit(1);
        }
    }
}
