use clap::Parser;

mod cli;
mod commands;
mod domain;
mod errors;
mod services;

use cli::{Cli, Commands};

fn main() {
    let cli = Cli::parse();
    let result = match &cli.command {
        Commands::Disable { .. } => commands::handle_disable(&cli),
        Commands::Restore { .. } => commands::handle_restore(&cli),
        Commands::Status { .. } => commands::handle_status(&cli),
    };
    if let Err(err) = result {
        report_failure(cli.json, &err);
        std::process::exit(1);
    }
}

fn report_failure(json: bool, err: &anyhow::Error) {
    let code = err
        .downcast_ref::<errors::Error>()
        .map(errors::Error::code)
        .unwrap_or("INTERNAL");
    if json {
        let body = serde_json::json!({
            "ok": false,
            "error": { "code": code, "message": format!("{err:#}") }
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&body).unwrap_or_else(|_| body.to_string())
        );
    } else {
        eprintln!("error[{code}]: {err:#}");
    }
}
