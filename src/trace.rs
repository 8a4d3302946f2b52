//! Verbose, human readable tracing of every query and reply, switched on and off
//! with the shell's `trace` command. Independent of the `log` output.

use std::fmt;
use std::io::{self, Write};
use std::net::IpAddr;

use crate::dns::{DnsMessage, Node, RecordType, ResourceRecord};

pub struct Tracer {
    enabled: bool,
    out: Box<dyn Write>,
}

impl Tracer {
    pub fn new(out: Box<dyn Write>) -> Tracer {
        Tracer {
            enabled: false,
            out,
        }
    }

    pub fn stdout() -> Tracer {
        Tracer::new(Box::new(io::stdout()))
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn query(&mut self, id: u16, node: &Node, server: IpAddr) {
        if !self.enabled {
            return;
        }
        self.emit(format_args!("\n"));
        self.emit(format_args!(
            "Query ID     {} {}  {} --> {}",
            id, node.host_name, node.record_type, server
        ));
    }

    pub fn response(&mut self, message: &DnsMessage) {
        if !self.enabled {
            return;
        }
        self.emit(format_args!(
            "Response ID: Authoritative = {}",
            message.header.aa
        ));
        self.section("Answers", &message.answers);
        self.section("Nameservers", &message.nameservers);
        self.section("Additional Information", &message.additional);
    }

    ///An exchange for `node` produced nothing usable.
    pub fn miss(&mut self, node: &Node) {
        if !self.enabled {
            return;
        }
        self.emit(format_args!(
            "{:<30} {:<5} {:<8} {}",
            node.host_name, node.record_type, -1, "0.0.0.0"
        ));
    }

    fn section(&mut self, title: &str, records: &[ResourceRecord]) {
        self.emit(format_args!("  {} ({})", title, records.len()));
        for record in records {
            let rtype = match record.record_type {
                RecordType::Other(code) => code.to_string(),
                known => known.to_string(),
            };
            self.emit(format_args!(
                "       {:<30} {:<10} {:<4} {}",
                record.host_name, record.ttl, rtype, record.value
            ));
        }
    }

    fn emit(&mut self, line: fmt::Arguments<'_>) {
        if let Err(e) = writeln!(self.out, "{}", line) {
            warn!("Failed to write trace output. {:?}", e);
        }
    }
}
