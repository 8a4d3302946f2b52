#[macro_use]
extern crate log;

mod command_line;

use std::io::{self, IsTerminal};
use std::process;

use koala_lookup::resolver::{Resolver, ResolverConfig};
use koala_lookup::shell::Shell;
use koala_lookup::trace::Tracer;
use koala_lookup::{Cache, UdpTransport};
use rand::rngs::StdRng;
use rand::SeedableRng;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .try_init()
        .unwrap_or_else(|err| println!("Failed to initialize logger. {:?}", err));

    let config = command_line::parse_args();
    let transport = UdpTransport::with_options(config.port, config.timeout).unwrap_or_else(|e| {
        eprintln!("Failed to open socket. {}", e);
        process::exit(1);
    });
    println!("Root DNS server is: {}", config.root_server);

    let cache = if config.expire {
        Cache::expiring()
    } else {
        Cache::new()
    };
    let resolver = Resolver::with_parts(
        ResolverConfig {
            root_server: config.root_server,
            verbose: config.verbose,
        },
        transport,
        cache,
        StdRng::from_entropy(),
        Tracer::stdout(),
    );

    let mut shell = Shell::new(resolver, io::stdout());
    let prompt = io::stdin().is_terminal();
    if let Err(e) = shell.run(io::stdin().lock(), prompt) {
        error!("Shell stopped. {}", e);
    }
    println!("Goodbye!");
}
