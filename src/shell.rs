//! The interactive `DNSLOOKUP>` command loop.

use std::collections::HashSet;
use std::io::{self, Write};
use std::net::IpAddr;

use rand::Rng;
use thiserror::Error;

use crate::dns::{Node, RecordType, ResourceRecord};
use crate::error::Error;
use crate::resolver::Resolver;
use crate::transport::Transport;

pub const PROMPT: &str = "DNSLOOKUP> ";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Lookup {
        host_name: String,
        record_type: RecordType,
    },
    Trace(bool),
    Server(IpAddr),
    Dump,
    Quit,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("Invalid call. Format:\n\tlookup hostName [type]")]
    LookupUsage,

    #[error("Invalid query type. Must be one of:\n\tA, AAAA, NS, MX, CNAME")]
    InvalidType,

    #[error("Invalid call. Format:\n\ttrace on|off")]
    TraceUsage,

    #[error("Invalid call. Format:\n\tserver IP")]
    ServerUsage,

    #[error("Invalid root server ({0}).")]
    InvalidServer(String),

    #[error("Invalid command. Valid commands are:\n\tlookup fqdn [type]\n\ttrace on|off\n\tserver IP\n\tdump\n\tquit")]
    Unknown,
}

impl Command {
    ///Parses one input line. Anything after `#` is a comment; blank lines give `None`.
    pub fn parse(line: &str) -> Result<Option<Command>, CommandError> {
        let line = line.split('#').next().unwrap_or_default().trim();
        let args = line.split_whitespace().collect::<Vec<_>>();
        let Some(name) = args.first() else {
            return Ok(None);
        };

        let command = match name.to_ascii_lowercase().as_str() {
            "quit" | "exit" => Command::Quit,
            "dump" => Command::Dump,
            "lookup" | "l" => {
                let record_type = match args.len() {
                    2 => RecordType::A,
                    3 => args[2].parse().map_err(|_| CommandError::InvalidType)?,
                    _ => return Err(CommandError::LookupUsage),
                };
                Command::Lookup {
                    host_name: args[1].to_string(),
                    record_type,
                }
            }
            "trace" => match args.get(1).map(|arg| arg.to_ascii_lowercase()) {
                Some(ref arg) if args.len() == 2 && arg == "on" => Command::Trace(true),
                Some(ref arg) if args.len() == 2 && arg == "off" => Command::Trace(false),
                _ => return Err(CommandError::TraceUsage),
            },
            "server" => {
                if args.len() != 2 {
                    return Err(CommandError::ServerUsage);
                }
                let server = args[1]
                    .parse()
                    .map_err(|e| CommandError::InvalidServer(format!("{}: {}", args[1], e)))?;
                Command::Server(server)
            }
            _ => return Err(CommandError::Unknown),
        };
        Ok(Some(command))
    }
}

pub struct Shell<T, R, W> {
    resolver: Resolver<T, R>,
    out: W,
}

impl<T: Transport, R: Rng, W: Write> Shell<T, R, W> {
    pub fn new(resolver: Resolver<T, R>, out: W) -> Shell<T, R, W> {
        Shell { resolver, out }
    }

    pub fn resolver(&self) -> &Resolver<T, R> {
        &self.resolver
    }

    pub fn into_parts(self) -> (Resolver<T, R>, W) {
        (self.resolver, self.out)
    }

    ///Reads commands until `quit` or end of input.
    pub fn run<I: io::BufRead>(&mut self, input: I, prompt: bool) -> io::Result<()> {
        let mut lines = input.lines();
        loop {
            if prompt {
                write!(self.out, "{}", PROMPT)?;
                self.out.flush()?;
            }
            let Some(line) = lines.next().transpose()? else {
                break;
            };
            match Command::parse(&line) {
                Ok(Some(command)) => {
                    if !self.execute(command)? {
                        break;
                    }
                }
                Ok(None) => {}
                Err(e) => writeln!(self.out, "{}", e)?,
            }
        }
        Ok(())
    }

    ///Runs one command. False when the shell should stop.
    pub fn execute(&mut self, command: Command) -> io::Result<bool> {
        match command {
            Command::Quit => return Ok(false),
            Command::Dump => self.dump()?,
            Command::Trace(on) => {
                self.resolver.set_verbose(on);
                writeln!(
                    self.out,
                    "Verbose tracing is now: {}",
                    if on { "ON" } else { "OFF" }
                )?;
            }
            Command::Server(server) => {
                self.resolver.set_root_server(server);
                writeln!(
                    self.out,
                    "Root DNS server is now: {}",
                    self.resolver.root_server()
                )?;
            }
            Command::Lookup {
                host_name,
                record_type,
            } => match self.resolver.resolve(&host_name, record_type) {
                Ok(results) => {
                    let node = Node::new(&host_name, record_type);
                    print_results(&mut self.out, &node, &results)?;
                }
                Err(Error::Encoding(msg)) => writeln!(self.out, "Invalid host name ({}).", msg)?,
                Err(e) => writeln!(self.out, "{}", e)?,
            },
        }
        Ok(true)
    }

    fn dump(&mut self) -> io::Result<()> {
        let Shell { resolver, out } = self;
        let mut result = Ok(());
        resolver.cache().for_each(|node, records| {
            if result.is_ok() {
                result = print_results(&mut *out, node, records);
            }
        });
        result
    }
}

///One line per record, or a single `-1 0.0.0.0` line when there are none.
pub fn print_results<W: Write>(
    out: &mut W,
    node: &Node,
    results: &HashSet<ResourceRecord>,
) -> io::Result<()> {
    if results.is_empty() {
        writeln!(
            out,
            "{:<30} {:<5} {:<8} {}",
            node.host_name, node.record_type, -1, "0.0.0.0"
        )?;
    }
    let mut records = results.iter().collect::<Vec<_>>();
    records.sort();
    for record in records {
        writeln!(
            out,
            "{:<30} {:<5} {:<8} {}",
            node.host_name, node.record_type, record.ttl, record.value
        )?;
    }
    Ok(())
}
