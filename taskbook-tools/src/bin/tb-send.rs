/* Copyright (c) Fortanix, Inc.
 *
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

use std::io::Write;
use std::process;

use anyhow::Context;
use clap::{crate_authors, crate_version, value_t, App, Arg, ArgMatches};
use log::{info, LevelFilter};

use taskbook_client::{ClientConfig, CommandClient, CommandRecord, PING};

const ENDPOINT_ENV: &str = "TASKBOOK_ENDPOINT";

fn millis(s: String) -> Result<(), String> {
    match s.parse::<u64>() {
        Ok(0) => Err("timeout must be non-zero".to_owned()),
        Ok(_) => Ok(()),
        Err(e) => Err(format!("expected milliseconds: {}", e)),
    }
}

fn app<'a, 'b>() -> App<'a, 'b> {
    App::new("tb-send")
        .author(crate_authors!())
        .version(crate_version!())
        .about("Send one command to a taskbook server and print the reply")
        .arg(Arg::with_name("command")
            .default_value(PING)
            .help("Command to send"))
        .arg(Arg::with_name("endpoint")
            .short("e")
            .long("endpoint")
            .value_name("HOST:PORT")
            .takes_value(true)
            .env(ENDPOINT_ENV)
            .help("Address of the taskbook server [default: 127.0.0.1:2222]"))
        .arg(Arg::with_name("config")
            .short("c")
            .long("config")
            .value_name("FILE")
            .takes_value(true)
            .help("TOML file with client settings"))
        .arg(Arg::with_name("item")
            .short("i")
            .long("item")
            .value_name("ID")
            .takes_value(true)
            .multiple(true)
            .number_of_values(1)
            .help("Item id to include in the command, may be repeated"))
        .arg(Arg::with_name("arg")
            .short("a")
            .long("arg")
            .value_name("VALUE")
            .takes_value(true)
            .multiple(true)
            .number_of_values(1)
            .allow_hyphen_values(true)
            .help("Argument to include in the command, may be repeated"))
        .arg(Arg::with_name("connect-timeout")
            .long("connect-timeout")
            .value_name("MS")
            .takes_value(true)
            .validator(millis)
            .help("Give up connecting after this many milliseconds"))
        .arg(Arg::with_name("read-timeout")
            .long("read-timeout")
            .value_name("MS")
            .takes_value(true)
            .validator(millis)
            .help("Give up waiting for the reply after this many milliseconds. \
                Without it a server that never answers blocks forever."))
        .arg(Arg::with_name("write-timeout")
            .long("write-timeout")
            .value_name("MS")
            .takes_value(true)
            .validator(millis)
            .help("Give up sending the command after this many milliseconds"))
        .arg(Arg::with_name("verbose")
            .short("v")
            .long("verbose")
            .help("Print information about the exchange"))
}

fn record_from_args(args: &ArgMatches) -> CommandRecord {
    let command = args.value_of("command").unwrap_or(PING);
    CommandRecord::new(command)
        .with_items(args.values_of("item").into_iter().flatten())
        .with_arguments(args.values_of("arg").into_iter().flatten())
}

fn client_from_args(args: &ArgMatches) -> Result<CommandClient, anyhow::Error> {
    let mut config = match args.value_of_os("config") {
        Some(path) => ClientConfig::load(path).context("Unable to load client configuration")?,
        None => ClientConfig::default(),
    };

    // Flag beats environment beats config file.
    if let Some(endpoint) = args.value_of("endpoint") {
        config.endpoint = Some(endpoint.to_owned());
    }
    if args.is_present("connect-timeout") {
        config.connect_timeout_ms = Some(value_t!(args, "connect-timeout", u64)?);
    }
    if args.is_present("read-timeout") {
        config.read_timeout_ms = Some(value_t!(args, "read-timeout", u64)?);
    }
    if args.is_present("write-timeout") {
        config.write_timeout_ms = Some(value_t!(args, "write-timeout", u64)?);
    }

    Ok(config.into_client()?)
}

fn init_logger(verbose: bool) {
    let mut logger = env_logger::Builder::from_default_env();
    let logger = logger.format(|buf, record| writeln!(buf, "[{}] {}", record.level(), record.args()));
    if verbose {
        logger.filter_level(LevelFilter::Info).init();
    } else {
        logger.filter_level(LevelFilter::Error).init();
    }
}

fn run() -> Result<(), anyhow::Error> {
    let args = app().get_matches();
    init_logger(args.is_present("verbose"));

    let client = client_from_args(&args)?;
    let record = record_from_args(&args);

    info!("connecting to taskbook server at {}", client.endpoint());
    let reply = client.send(&record)
        .with_context(|| format!("Failed to send {:?}", record.command()))?;

    println!("status: {}", reply.bytes_written());
    println!("reply from server= {}", reply.text());
    Ok(())
}

fn main() {
    if let Err(e) = run() {
        eprintln!("ERROR: {:#}", e);
        process::exit(match e.downcast_ref::<taskbook_client::Error>() {
            Some(err) => err.kind().exit_code(),
            None => 1,
        });
    }
}
