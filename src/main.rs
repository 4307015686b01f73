use anyhow::Result;
use env_logger::Env;
use log::{debug, error};

use inverter_check::cli::{build_cli, formatter_from_matches, run_check};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let matches = build_cli().get_matches();

    let default_filter = if matches.get_flag("verbose") { "debug" } else { "off" };
    env_logger::Builder::from_env(Env::default().default_filter_or(default_filter))
        .format_timestamp_millis()
        .try_init()?;

    debug!("inverter-check {}", inverter_check::VERSION);

    let formatter = formatter_from_matches(&matches);
    let report = match run_check(&matches, formatter.as_ref()).await {
        Ok(report) => report,
        Err(e) => {
            error!("Check aborted: {}", e);
            if let Some(text) = formatter.format_error(&e)? {
                println!("{}", text);
            }
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    if let Some(failure) = &report.failure {
        eprintln!("Error: {}", failure);
        std::process::exit(1);
    }

    Ok(())
}
