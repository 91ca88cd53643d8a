//! # srtopo - topology, address and table generator for router assignments
//!
//! This library builds small virtual internetworks for a networking course
//! and derives the configuration a student-written router reads at startup.
//!
//! ## Overview
//!
//! A topology is declared once as nodes (routers, hosts, switches) and links.
//! From it srtopo computes a deterministic address plan and two flat
//! artifacts per router:
//!
//! - **Interface Table**: `name ip netmask mac`, one line per interface
//! - **Routing Table**: `prefix nexthop netmask iface`, one line per route
//!
//! An optional JSON manifest describes the same network to an external
//! emulation driver.
//!
//! ## Architecture
//!
//! - `topology`: node/link types, the graph builder and YAML descriptions
//! - `ip`: subnet, IP and MAC assignment with uniqueness checks
//! - `tables`: interface and routing table generation
//! - `driver`: manifest for the emulation driver
//! - `scenarios`: the built-in course topologies
//! - `config_loader`: topology file loading
//! - `orchestrator`: build, plan, generate, write
//! - `error`: crate-wide error type
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use srtopo::{config_loader, orchestrator::{self, GenerationRequest}};
//! use std::path::PathBuf;
//!
//! let spec = config_loader::resolve_topology("humber")?;
//! let request = GenerationRequest {
//!     itable: Some(PathBuf::from("itable.conf")),
//!     rtable: Some(PathBuf::from("rtable.conf")),
//!     ..GenerationRequest::default()
//! };
//!
//! // Writes r0-itable.conf, r1-itable.conf, ... and the matching rtables
//! orchestrator::run(&spec, &request)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Error Handling
//!
//! Library functions return typed errors (`srtopo::error::Error`). Every
//! failure is detected before the first artifact is written.

pub mod config_loader;
pub mod driver;
pub mod error;
pub mod ip;
pub mod orchestrator;
pub mod scenarios;
pub mod tables;
pub mod topology;

pub use error::{Error, Result};
