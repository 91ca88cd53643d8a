//! Generation orchestrator.
//!
//! One-shot pipeline: build the graph, assign addresses, compute the
//! requested tables and only then write them. Any error aborts before the
//! first file is touched.

use log::{info, warn};
use std::path::{Path, PathBuf};

use crate::driver::DriverManifest;
use crate::error::Result;
use crate::ip::AddressPlan;
use crate::tables::{InterfaceTable, RouterAdjacency, RoutingOptions, RoutingTable};
use crate::topology::{Mode, TopologyGraph, TopologySpec};

/// What to generate and where to put it. A `None` path means the artifact
/// is not generated.
#[derive(Debug, Clone, Default)]
pub struct GenerationRequest {
    pub mode: Mode,
    pub routing: RoutingOptions,
    pub itable: Option<PathBuf>,
    pub rtable: Option<PathBuf>,
    pub manifest: Option<PathBuf>,
}

/// Everything computed for one request, before anything is written
#[derive(Debug, Clone)]
pub struct GeneratedNetwork {
    pub graph: TopologyGraph,
    pub plan: AddressPlan,
    pub itables: Vec<InterfaceTable>,
    pub rtables: Vec<RoutingTable>,
    pub manifest: Option<DriverManifest>,
}

impl GeneratedNetwork {
    pub fn router_count(&self) -> usize {
        self.graph.routers().count()
    }
}

/// Compute every requested artifact in memory
pub fn generate(spec: &TopologySpec, request: &GenerationRequest) -> Result<GeneratedNetwork> {
    info!("Generating {} in {} mode", spec.name, request.mode);

    let graph = spec.build(request.mode)?;
    let plan = AddressPlan::assign(&graph)?;
    let routers: Vec<String> = graph.routers().map(|router| router.id.clone()).collect();

    if routers.is_empty() && (request.itable.is_some() || request.rtable.is_some()) {
        warn!("{} has no routers in {} mode, no tables to generate", spec.name, request.mode);
    }

    let itables = if request.itable.is_some() {
        routers
            .iter()
            .map(|router| InterfaceTable::generate(&plan, router))
            .collect()
    } else {
        Vec::new()
    };

    let rtables = if request.rtable.is_some() && !routers.is_empty() {
        request.routing.validate(&graph, &plan)?;
        let adjacency = RouterAdjacency::build(&graph, &plan);
        routers
            .iter()
            .map(|router| RoutingTable::generate(&graph, &plan, &adjacency, router, &request.routing))
            .collect::<std::result::Result<Vec<_>, _>>()?
    } else {
        Vec::new()
    };

    let manifest = request
        .manifest
        .as_ref()
        .map(|_| DriverManifest::build(&graph, &plan, request.mode));

    Ok(GeneratedNetwork {
        graph,
        plan,
        itables,
        rtables,
        manifest,
    })
}

/// Write the computed artifacts, returning the paths written
pub fn write_artifacts(network: &GeneratedNetwork, request: &GenerationRequest) -> Result<Vec<PathBuf>> {
    let router_count = network.router_count();
    let mut contents: Vec<(PathBuf, String)> = Vec::new();

    if let Some(base) = &request.itable {
        for table in &network.itables {
            contents.push((artifact_path(base, &table.router, router_count), table.to_text()));
        }
    }
    if let Some(base) = &request.rtable {
        for table in &network.rtables {
            contents.push((artifact_path(base, &table.router, router_count), table.to_text()));
        }
    }
    if let (Some(path), Some(manifest)) = (&request.manifest, &network.manifest) {
        contents.push((path.clone(), manifest.to_json()?));
    }

    let mut written = Vec::with_capacity(contents.len());
    for (path, text) in contents {
        info!("Writing {:?}", path);
        std::fs::write(&path, text)?;
        written.push(path);
    }
    Ok(written)
}

/// Generate and write in one step
pub fn run(spec: &TopologySpec, request: &GenerationRequest) -> Result<Vec<PathBuf>> {
    let network = generate(spec, request)?;
    let written = write_artifacts(&network, request)?;
    info!("Generation complete: {} files written", written.len());
    Ok(written)
}

/// Per-router artifact path.
///
/// With more than one router the router id is prefixed to the file name
/// (`out/itable.conf` becomes `out/r1-itable.conf`); a single router writes
/// the path as given.
pub fn artifact_path(base: &Path, router: &str, router_count: usize) -> PathBuf {
    if router_count <= 1 {
        return base.to_path_buf();
    }
    match base.file_name() {
        Some(name) => base.with_file_name(format!("{}-{}", router, name.to_string_lossy())),
        None => PathBuf::from(format!("{}-{}", router, base.display())),
    }
}
