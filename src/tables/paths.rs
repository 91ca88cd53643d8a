//! First-hop selection between routers.
//!
//! Only router-to-router links carry transit traffic. For a destination the
//! candidate first hops of a router are its adjacent router links; each costs
//! one plus the neighbour's hop distance to the nearest target router. The
//! cheapest candidate wins and ties go to the lowest link ordinal, which is
//! what keeps ring and mesh tables deterministic.

use std::collections::{HashMap, VecDeque};
use std::net::Ipv4Addr;

use crate::ip::AddressPlan;
use crate::topology::{NodeKind, TopologyGraph};

/// One router-to-router adjacency, seen from the local router
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hop {
    pub link: usize,
    pub neighbour: String,
    /// Neighbour's address on the shared link
    pub next_hop: Ipv4Addr,
    /// Local interface facing the neighbour
    pub egress: String,
}

#[derive(Debug, Clone, Default)]
pub struct RouterAdjacency {
    /// Hops per router, sorted by link ordinal
    hops: HashMap<String, Vec<Hop>>,
}

impl RouterAdjacency {
    pub fn build(graph: &TopologyGraph, plan: &AddressPlan) -> Self {
        let mut hops: HashMap<String, Vec<Hop>> = HashMap::new();

        for router in graph.routers() {
            let mut adjacent: Vec<Hop> = graph
                .slots(&router.id)
                .into_iter()
                .filter(|slot| graph.kind_of(&slot.remote.node) == Some(NodeKind::Router))
                .filter_map(|slot| {
                    let local = plan.address_of(slot.local)?;
                    let remote = plan.address_of(slot.remote)?;
                    Some(Hop {
                        link: slot.link.ordinal,
                        neighbour: slot.remote.node.clone(),
                        next_hop: remote.ip,
                        egress: local.name.clone(),
                    })
                })
                .collect();
            adjacent.sort_by_key(|hop| hop.link);
            hops.insert(router.id.clone(), adjacent);
        }

        Self { hops }
    }

    pub fn hops(&self, router: &str) -> &[Hop] {
        self.hops.get(router).map_or(&[], Vec::as_slice)
    }

    /// Hop distance from every router that can reach one of `targets`
    pub fn distances(&self, targets: &[&str]) -> HashMap<String, usize> {
        let mut dist: HashMap<String, usize> = HashMap::new();
        let mut queue = VecDeque::new();

        for &target in targets {
            if self.hops.contains_key(target) && !dist.contains_key(target) {
                dist.insert(target.to_string(), 0);
                queue.push_back(target);
            }
        }

        while let Some(router) = queue.pop_front() {
            let d = dist.get(router).copied().unwrap_or(0);
            for hop in self.hops(router) {
                if !dist.contains_key(&hop.neighbour) {
                    dist.insert(hop.neighbour.clone(), d + 1);
                    queue.push_back(hop.neighbour.as_str());
                }
            }
        }

        dist
    }

    /// First hop from `source` toward the nearest of `targets`.
    ///
    /// Returns `None` when `source` is itself a target or no path exists.
    pub fn first_hop(&self, source: &str, targets: &[&str]) -> Option<&Hop> {
        if targets.contains(&source) {
            return None;
        }
        let dist = self.distances(targets);

        let mut best: Option<(usize, &Hop)> = None;
        for hop in self.hops(source) {
            let Some(d) = dist.get(&hop.neighbour) else {
                continue;
            };
            let cost = d + 1;
            if best.map_or(true, |(best_cost, _)| cost < best_cost) {
                best = Some((cost, hop));
            }
        }
        best.map(|(_, hop)| hop)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topology::LinkOptions;

    /// r0 - r1 - r2 - r3 - r0 ring
    fn ring() -> (TopologyGraph, AddressPlan) {
        let mut graph = TopologyGraph::new("ring");
        for r in ["r0", "r1", "r2", "r3"] {
            graph.add_node(r, NodeKind::Router).unwrap();
        }
        for (a, b) in [("r0", "r1"), ("r1", "r2"), ("r2", "r3"), ("r3", "r0")] {
            graph.add_link(a, None, b, None, LinkOptions::default()).unwrap();
        }
        let plan = AddressPlan::assign(&graph).unwrap();
        (graph, plan)
    }

    #[test]
    fn test_hops_are_sorted_by_link() {
        let (graph, plan) = ring();
        let adjacency = RouterAdjacency::build(&graph, &plan);
        let r0: Vec<usize> = adjacency.hops("r0").iter().map(|hop| hop.link).collect();
        assert_eq!(r0, vec![0, 3]);
        assert_eq!(adjacency.hops("r0")[0].next_hop, Ipv4Addr::new(10, 0, 1, 2));
        assert_eq!(adjacency.hops("r0")[0].egress, "r0-eth0");
    }

    #[test]
    fn test_distances() {
        let (graph, plan) = ring();
        let adjacency = RouterAdjacency::build(&graph, &plan);
        let dist = adjacency.distances(&["r2"]);
        assert_eq!(dist["r2"], 0);
        assert_eq!(dist["r1"], 1);
        assert_eq!(dist["r3"], 1);
        assert_eq!(dist["r0"], 2);
    }

    #[test]
    fn test_equal_cost_tie_goes_to_lowest_link() {
        let (graph, plan) = ring();
        let adjacency = RouterAdjacency::build(&graph, &plan);

        // r2 is two hops away both ways round the ring
        let hop = adjacency.first_hop("r0", &["r2"]).unwrap();
        assert_eq!(hop.neighbour, "r1");

        // The r2-r3 link: r3 is adjacent, r0 is one hop from either end
        let hop = adjacency.first_hop("r0", &["r2", "r3"]).unwrap();
        assert_eq!(hop.neighbour, "r3");
        assert!(adjacency.first_hop("r3", &["r2", "r3"]).is_none());
    }

    #[test]
    fn test_unreachable_target() {
        let mut graph = TopologyGraph::new("split");
        for r in ["r0", "r1", "r2"] {
            graph.add_node(r, NodeKind::Router).unwrap();
        }
        graph.add_node("h0", NodeKind::Host).unwrap();
        graph.add_link("r0", None, "r1", None, LinkOptions::default()).unwrap();
        graph.add_link("r2", None, "h0", None, LinkOptions::default()).unwrap();
        let plan = AddressPlan::assign(&graph).unwrap();

        let adjacency = RouterAdjacency::build(&graph, &plan);
        assert!(adjacency.first_hop("r0", &["r2"]).is_none());
        assert!(adjacency.hops("r2").is_empty());
    }
}
