use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use changehelper::cli::{execute, Cli};
use changehelper::config;
use changehelper::error::{ChangehelperError, ExitCode};
use changehelper::git::GitCli;
use changehelper::ui;

fn init_tracing(log_level: u8) {
    let filter = match log_level {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("off")),
        1 => EnvFilter::new("changehelper=error"),
        2 => EnvFilter::new("changehelper=warn"),
        3 => EnvFilter::new("changehelper=info"),
        _ => EnvFilter::new("changehelper=debug"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();
}

fn run(cli: &Cli) -> Result<()> {
    let config = config::load_config(cli.config.as_deref())?;
    let repo = GitCli::new(cli.workdir(&config));
    execute(cli, &config, &repo)?;
    Ok(())
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.log_level);

    if let Err(e) = run(&cli) {
        ui::display_error(&e.to_string());
        let code = e
            .downcast_ref::<ChangehelperError>()
            .map(ChangehelperError::exit_code)
            .unwrap_or(ExitCode::General);
        std::process::exit(code.code());
    }
}
