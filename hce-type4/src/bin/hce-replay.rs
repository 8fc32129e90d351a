//! Replay APDUs against an emulated Type 4 Tag
//!
//! Loads a tag configuration, feeds it hex-encoded command APDUs and prints
//! each response. APDUs come from the command line or, when none are given,
//! from stdin one per line. A `deactivate` line resets the session as if the
//! reader had left the field.
//!
//! Usage:
//!   hce-replay 00A4040007D2760000850101 00A4000C02E103 00B000000F
//!   hce-replay -c tag.json < session.txt

use std::io::{self, BufRead};
use std::path::PathBuf;
use std::process;
use std::sync::Arc;

use argh::FromArgs;
use log::error;

use hce_type4::{HceConfig, HceService, HceStateMachine};

#[derive(FromArgs, Debug)]
/// Replay command APDUs against an emulated NFC Forum Type 4 Tag.
struct Args {
    #[argh(option, short = 'c')]
    /// tag configuration file (defaults to $HCE_TYPE4_CONFIG or ~/.hce-type4/config.json).
    config: Option<PathBuf>,
    #[argh(switch, short = 'v')]
    /// log every APDU exchange.
    verbose: bool,
    #[argh(positional)]
    /// hex-encoded command APDUs.
    apdus: Vec<String>,
}

fn main() {
    let args: Args = argh::from_env();

    let default_filter = if args.verbose { "debug" } else { "warn" };
    env_logger::init_from_env(
        env_logger::Env::default().filter_or(env_logger::DEFAULT_FILTER_ENV, default_filter),
    );

    let path = args.config.clone().unwrap_or_else(HceConfig::default_path);
    let config = match HceConfig::load_or_default(&path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };
    let machine = match HceStateMachine::from_config(&config) {
        Ok(machine) => machine,
        Err(e) => {
            eprintln!("Error: {} ({})", e, e.code());
            process::exit(1);
        }
    };

    let service = HceService::new();
    service.install(Arc::new(machine));

    let mut failed = false;
    if args.apdus.is_empty() {
        for line in io::stdin().lock().lines() {
            match line {
                Ok(line) => failed |= !replay_line(&service, &line),
                Err(e) => {
                    error!("Failed to read stdin: {}", e);
                    process::exit(1);
                }
            }
        }
    } else {
        for apdu in &args.apdus {
            failed |= !replay_line(&service, apdu);
        }
    }

    service.clear();
    if failed {
        process::exit(2);
    }
}

/// Replay one input line, returning false if it could not be decoded
fn replay_line(service: &HceService, line: &str) -> bool {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return true;
    }
    if line.eq_ignore_ascii_case("deactivate") {
        service.on_deactivated();
        println!("-- deactivated");
        return true;
    }

    let compact: String = line.chars().filter(|c| !c.is_whitespace()).collect();
    match hex::decode(&compact) {
        Ok(apdu) => {
            let response = service.process_command_apdu(&apdu);
            println!("> {}", hex::encode_upper(&apdu));
            println!("< {}", hex::encode_upper(&response));
            true
        }
        Err(e) => {
            eprintln!("Skipping {:?}: {}", line, e);
            false
        }
    }
}
