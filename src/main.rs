use clap::Parser;
use quantdesk::cli::{Cli, log_settings, run};
use quantdesk::logging::init_tracing;

fn main() -> std::process::ExitCode {
    let cli = Cli::parse();
    let (level, format) = log_settings(&cli);
    if let Err(e) = init_tracing(&level, &format) {
        eprintln!("error: {e}");
        return std::process::ExitCode::from(2);
    }
    run(cli)
}
