use clap::{Arg, Command};
use scip2_data::ScanData;
use scip2_decoder::{run_serial_decoder, DecoderConfig, SerialConfig};
use serde::Serialize;
use std::time::UNIX_EPOCH;

#[derive(Serialize)]
struct Record<'a> {
    receive_time: f64,
    echo_back: &'a str,
    status: &'a str,
    scan: &'a ScanData,
}

fn get_args() -> (String, Vec<String>) {
    let matches = Command::new("SCIP 2.0 scan receiver.")
        .about("Prints scan responses read from a range finder as JSON lines.")
        .disable_version_flag(true)
        .arg(
            Arg::new("port")
                .help("The device path to a serial port")
                .use_value_delimiter(false)
                .required(true),
        )
        .arg(
            Arg::new("command")
                .help("Commands whose responses are decoded")
                .long("command")
                .num_args(1..)
                .default_values(["MD"]),
        )
        .get_matches();

    let port_name: &String = matches.get_one("port").unwrap();
    let commands = matches
        .get_many::<String>("command")
        .unwrap()
        .cloned()
        .collect();
    (port_name.to_string(), commands)
}

fn main() {
    let (port_name, commands) = get_args();
    let commands: Vec<&str> = commands.iter().map(String::as_str).collect();

    let serial_config = SerialConfig::new(&port_name);
    let (decoder_thread, scan_rx) =
        match run_serial_decoder(&serial_config, &commands, DecoderConfig::default()) {
            Ok(t) => t,
            Err(e) => {
                eprintln!("Failed to open \"{}\". Error: {}", port_name, e);
                std::process::exit(1);
            }
        };

    while let Ok(event) = scan_rx.recv() {
        let receive_time = event
            .receive_time
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs_f64())
            .unwrap_or(0.);
        let record = Record {
            receive_time,
            echo_back: &event.echo_back,
            status: &event.status,
            scan: &event.scan,
        };
        match serde_json::to_string(&record) {
            Ok(line) => println!("{line}"),
            Err(e) => eprintln!("{e}"),
        }
    }

    drop(decoder_thread);
}
