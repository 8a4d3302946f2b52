use getopts::Options;
use std::env;
use std::net::IpAddr;
use std::process;
use std::time::Duration;

use koala_lookup::transport::{DEFAULT_TIMEOUT, DNS_PORT};

#[derive(Debug, PartialEq, Eq)]
pub struct Config {
    pub root_server: IpAddr,
    pub port: u16,
    pub timeout: Duration,
    pub verbose: bool,
    pub expire: bool,
}

pub fn parse_args() -> Config {
    let args: Vec<String> = env::args().collect();
    let program = args.first().cloned().unwrap_or_else(|| "koala_lookup".to_string());
    let opts = options();

    match parse_from(&opts, &args[1.min(args.len())..]) {
        Ok(Some(config)) => config,
        Ok(None) => {
            print_usage(&program, &opts);
            process::exit(0);
        }
        Err(e) => {
            eprintln!("{}", e);
            print_usage(&program, &opts);
            process::exit(1);
        }
    }
}

fn options() -> Options {
    let mut opts = Options::new();
    opts.optopt("t", "timeout", "Per query response timeout in milliseconds", "5000");
    opts.optopt("p", "port", "Port nameservers are queried on", "53");
    opts.optflag("v", "trace", "Start with verbose tracing on");
    opts.optflag("e", "expire", "Drop cached records once their TTL has passed");
    opts.optflag("h", "help", "print this help menu");
    opts
}

///`None` when help was asked for.
fn parse_from(opts: &Options, args: &[String]) -> Result<Option<Config>, String> {
    debug!("Parsing command line options");
    let matches = opts
        .parse(args)
        .map_err(|e| format!("Failed to parse command line options. {}", e))?;
    if matches.opt_present("h") {
        return Ok(None);
    }

    // Root server
    let root_server = match matches.free.as_slice() {
        [server] => server
            .parse::<IpAddr>()
            .map_err(|e| format!("Invalid root server ({}).", e))?,
        _ => return Err("Expected exactly one root server address.".to_string()),
    };
    debug!("Root server is {:?}", root_server);

    // Port
    let port = match matches.opt_str("p") {
        Some(port) => port
            .parse::<u16>()
            .map_err(|e| format!("port must be an integer. {}", e))?,
        None => DNS_PORT,
    };

    // Timeout
    let timeout = match matches.opt_str("t") {
        Some(timeout) => timeout
            .parse::<u64>()
            .map(Duration::from_millis)
            .map_err(|e| format!("timeout must be an integer. {}", e))?,
        None => DEFAULT_TIMEOUT,
    };
    debug!("Timeout is {:?}", timeout);

    Ok(Some(Config {
        root_server,
        port,
        timeout,
        verbose: matches.opt_present("v"),
        expire: matches.opt_present("e"),
    }))
}

fn print_usage(program: &str, opts: &Options) {
    let brief = format!("Usage: {} [options] ROOT_SERVER", program);
    println!("{}", opts.usage(&brief));
}
