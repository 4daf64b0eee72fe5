use clap::Parser;
use editor::config::{Args, EditorConfig};
use editor::console::{execute, format_notice, parse_command, Command};
use editor::Session;
use interaction::Severity;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = EditorConfig::from_env().with_args(&args)?;
    info!(
        wms = %config.wms_url,
        layer = %config.wms_layer,
        backend = %config.backend_url,
        crs = %config.crs,
        "polygon editor starting"
    );

    let mut session = Session::from_config(&config)?;
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Some(line) = lines.next_line().await? {
        let command = match parse_command(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(e) => {
                eprintln!("{e}");
                continue;
            }
        };
        if command == Command::Quit {
            break;
        }

        let output = execute(&mut session, command).await;
        for notice in session.drain_notices() {
            if notice.severity == Severity::Error {
                eprintln!("{}", format_notice(&notice));
            } else {
                println!("{}", format_notice(&notice));
            }
        }
        if !output.is_empty() {
            println!("{output}");
        }
    }

    info!("polygon editor stopped");
    Ok(())
}
