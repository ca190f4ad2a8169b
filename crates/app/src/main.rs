use std::process::ExitCode;

use clap::Parser;

use client::Session;

mod cli;
mod commands;
mod config;
mod error;
mod export;
mod local_state;

use crate::{cli::Cli, error::AppError, local_state::LocalState};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let settings = match config::load(&cli) {
        Ok(settings) => settings,
        Err(err) => {
            eprintln!("failed to load settings: {err}");
            return ExitCode::FAILURE;
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "tally={level},client={level},engine={level}",
            level = settings.level
        ))
        .with_writer(std::io::stderr)
        .init();

    let mut state = match LocalState::load(&settings.state_path) {
        Ok(state) => state,
        Err(err) => {
            tracing::warn!("ignoring unreadable session file: {err}");
            LocalState::default()
        }
    };

    let session = match Session::connect(&settings.base_url, settings.timeout()) {
        Ok(session) => session,
        Err(err) => {
            eprintln!("error: {err}");
            return ExitCode::FAILURE;
        }
    };
    if let Some(token) = &state.token {
        session.resume(token.clone());
    }

    match commands::run(&session, &mut state, &settings, cli.command).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            if let AppError::Client(client_err) = &err
                && client_err.is_unauthorized()
                && state.token.is_some()
            {
                state.sign_out();
                if let Err(save_err) = state.save(&settings.state_path) {
                    tracing::error!("failed to forget expired session: {save_err}");
                }
                eprintln!("session expired, run `tally login` again");
            }
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}
