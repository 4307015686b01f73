use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use log::info;

use crate::config::{
    SessionConfig, DEFAULT_CONNECT_DELAY_MS, DEFAULT_CONNECT_TIMEOUT_MS, DEFAULT_PORT,
    DEFAULT_RESPONSE_TIMEOUT_MS, DEFAULT_UNIT_ID,
};
use crate::devices::SUN2000_FIELDS;
use crate::modbus::TcpSession;
use crate::output::{ConsoleFormatter, JsonFormatter, ReportFormatter};
use crate::services::{DiagnosticReport, DiagnosticService};
use crate::utils::error::ModbusError;

pub fn build_cli() -> Command {
    Command::new("inverter-check")
        .version(crate::VERSION)
        .about("Check the Modbus TCP communication to Huawei SUN2000 inverters")
        .arg(
            Arg::new("ip")
                .long("ip")
                .value_name("HOST")
                .help("Inverter IP address or hostname")
                .required(true),
        )
        .arg(
            Arg::new("port")
                .long("port")
                .value_name("PORT")
                .help("Inverter Modbus TCP port")
                .value_parser(value_parser!(u16))
                .default_value(DEFAULT_PORT.to_string()),
        )
        .arg(
            Arg::new("unit-id")
                .long("unit-id")
                .alias("unitID")
                .value_name("ID")
                .help("Modbus unit identifier")
                .value_parser(value_parser!(u8))
                .default_value(DEFAULT_UNIT_ID.to_string()),
        )
        .arg(
            Arg::new("timeout")
                .long("timeout")
                .value_name("MS")
                .help("Response timeout per request in milliseconds")
                .value_parser(value_parser!(u64))
                .default_value(DEFAULT_RESPONSE_TIMEOUT_MS.to_string()),
        )
        .arg(
            Arg::new("connect-timeout")
                .long("connect-timeout")
                .value_name("MS")
                .help("TCP connect timeout in milliseconds")
                .value_parser(value_parser!(u64))
                .default_value(DEFAULT_CONNECT_TIMEOUT_MS.to_string()),
        )
        .arg(
            Arg::new("connect-delay")
                .long("connect-delay")
                .value_name("MS")
                .help("Wait after connecting before the first request, in milliseconds")
                .value_parser(value_parser!(u64))
                .default_value(DEFAULT_CONNECT_DELAY_MS.to_string()),
        )
        .arg(
            Arg::new("format")
                .long("format")
                .value_name("FORMAT")
                .help("Output format")
                .value_parser(["console", "json"])
                .default_value("console"),
        )
        .arg(
            Arg::new("raw")
                .long("raw")
                .help("Also print each field's raw register bytes")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Enable debug logging")
                .action(ArgAction::SetTrue),
        )
}

pub fn formatter_from_matches(matches: &ArgMatches) -> Box<dyn ReportFormatter> {
    match matches.get_one::<String>("format").map(String::as_str) {
        Some("json") => {
            info!("🎨 Using JSON formatter");
            Box::new(JsonFormatter)
        }
        _ => Box::new(ConsoleFormatter::new(matches.get_flag("raw"))),
    }
}

/// Run the diagnostic sequence described by `matches`, printing readings as
/// they arrive. Returns the finished report; failure is carried inside it.
/// `Err` means the run never started.
pub async fn run_check(
    matches: &ArgMatches,
    formatter: &dyn ReportFormatter,
) -> Result<DiagnosticReport, ModbusError> {
    let config = SessionConfig::from_matches(matches)?;
    let streaming = matches!(
        matches.get_one::<String>("format").map(String::as_str),
        Some("console") | None
    );

    if streaming {
        println!(
            "Connecting to inverter... (Waiting {:?} after connected)",
            config.connect_delay()
        );
    }

    let mut service = DiagnosticService::new(SUN2000_FIELDS);
    let report = service
        .run(TcpSession::connect(&config), |reading| {
            if let Some(line) = formatter.format_reading(reading) {
                println!("{}", line);
            }
        })
        .await;

    if let Some(text) = formatter.format_report(&report)? {
        println!("{}", text);
    }

    Ok(report)
}
