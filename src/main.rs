use std::process::ExitCode;

use clap::Parser;

use mediareport::cli::{self, Cli, Command, ConfigCommand};

#[tokio::main]
async fn main() -> ExitCode {
    let args = Cli::parse();
    let config_path = args.config.as_deref();

    let result = match args.command {
        Command::Analyze {
            reference,
            telegram,
            json,
        } => tokio::select! {
            result = cli::handle_analyze(config_path, &reference, telegram, json) => {
                result.map(|delivered| {
                    if delivered {
                        ExitCode::SUCCESS
                    } else {
                        ExitCode::FAILURE
                    }
                })
            }
            _ = tokio::signal::ctrl_c() => {
                eprintln!("interrupted");
                Ok(ExitCode::from(130))
            }
        },
        Command::Config(ConfigCommand::Show) => {
            cli::handle_config_show(config_path).map(|()| ExitCode::SUCCESS)
        }
        Command::Config(ConfigCommand::Path) => {
            cli::handle_config_path();
            Ok(ExitCode::SUCCESS)
        }
        Command::Version => {
            cli::handle_version();
            Ok(ExitCode::SUCCESS)
        }
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::from(2)
        }
    }
}
