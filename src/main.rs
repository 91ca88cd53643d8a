use clap::Parser;
use color_eyre::eyre::WrapErr;
use color_eyre::Result;
use env_logger::Env;
use log::info;
use std::net::Ipv4Addr;
use std::path::PathBuf;

use srtopo::config_loader;
use srtopo::orchestrator::{self, GenerationRequest};
use srtopo::scenarios;
use srtopo::tables::{RoutingMode, RoutingOptions};
use srtopo::topology::Mode;

/// Topology, address and routing table generator for router assignments
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Built-in topology name or path to a topology YAML file
    #[arg(short, long, required_unless_present = "list")]
    topology: Option<String>,

    /// Build the router variant or the switch variant of the topology
    #[arg(short, long, default_value = "router")]
    mode: Mode,

    /// Generate the interface table(s) at this path
    #[arg(short, long)]
    itable: Option<PathBuf>,

    /// Generate the routing table(s) at this path
    #[arg(short, long)]
    rtable: Option<PathBuf>,

    /// External gateway behind the border router's uplink
    #[arg(short = 'g', long)]
    extgw: Option<Ipv4Addr>,

    /// No dynamic routing: generate complete routing tables for every router
    #[arg(long = "static")]
    static_routes: bool,

    /// Don't connect to the internet
    #[arg(short, long, conflicts_with = "extgw")]
    no_internet: bool,

    /// Write the emulation driver manifest (JSON) to this path
    #[arg(long)]
    manifest: Option<PathBuf>,

    /// List the built-in topologies and exit
    #[arg(long)]
    list: bool,

    /// Log level, overridden by RUST_LOG
    #[arg(long, default_value = "info")]
    log_level: String,
}

impl Args {
    fn request(&self) -> GenerationRequest {
        GenerationRequest {
            mode: self.mode,
            routing: RoutingOptions {
                mode: if self.static_routes {
                    RoutingMode::Static
                } else {
                    RoutingMode::Minimal
                },
                internet: !self.no_internet,
                gateway: self.extgw,
            },
            itable: self.itable.clone(),
            rtable: self.rtable.clone(),
            manifest: self.manifest.clone(),
        }
    }
}

fn main() -> Result<()> {
    // Initialize error handling
    color_eyre::install()?;

    let args = Args::parse();

    env_logger::Builder::from_env(Env::default().default_filter_or(args.log_level.as_str())).init();

    if args.list {
        for name in scenarios::names() {
            println!("{}", name);
        }
        return Ok(());
    }

    let Some(topology) = args.topology.as_deref() else {
        return Ok(());
    };
    info!("Topology: {}", topology);

    let spec = config_loader::resolve_topology(topology)
        .wrap_err_with(|| format!("Failed to load topology '{}'", topology))?;

    let written = orchestrator::run(&spec, &args.request())
        .wrap_err_with(|| format!("Failed to generate artifacts for '{}'", spec.name))?;

    for path in &written {
        info!("Wrote {:?}", path);
    }
    info!("Initialisation complete");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parsing() {
        let args = Args::parse_from(["srtopo", "--topology", "humber"]);

        assert_eq!(args.topology.as_deref(), Some("humber"));
        assert_eq!(args.mode, Mode::Router);
        assert!(args.itable.is_none());
        assert!(!args.static_routes);

        let request = args.request();
        assert_eq!(request.routing.mode, RoutingMode::Minimal);
        assert!(request.routing.internet);
    }

    #[test]
    fn test_table_flags() {
        let args = Args::parse_from([
            "srtopo",
            "-t",
            "ouse",
            "-i",
            "itable.conf",
            "-r",
            "rtable.conf",
            "-g",
            "10.0.1.100",
            "--static",
            "--mode",
            "switch",
        ]);

        assert_eq!(args.mode, Mode::Switch);
        let request = args.request();
        assert_eq!(request.itable, Some(PathBuf::from("itable.conf")));
        assert_eq!(request.routing.mode, RoutingMode::Static);
        assert_eq!(request.routing.gateway, Some(Ipv4Addr::new(10, 0, 1, 100)));
    }

    #[test]
    fn test_invalid_arguments() {
        assert!(Args::try_parse_from(["srtopo", "-t", "tyne", "--mode", "hub"]).is_err());
        assert!(Args::try_parse_from(["srtopo", "-t", "tyne", "-n", "-g", "10.0.1.100"]).is_err());
        assert!(Args::try_parse_from(["srtopo"]).is_err());
        assert!(Args::try_parse_from(["srtopo", "--list"]).is_ok());
    }
}
