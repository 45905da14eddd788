use std::process::ExitCode;

use clap::Parser;
use dynamic_media::Cli;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let invocation = Cli::parse().into_invocation();
    match dynamic_media::handle(&invocation) {
        Ok(result) => {
            println!("{result}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("error: {err}");
            if let dynamic_media::DynamicMediaError::UnknownKeys(keys) = &err {
                for key in keys {
                    eprintln!("  {key}");
                }
            }
            ExitCode::FAILURE
        }
    }
}
