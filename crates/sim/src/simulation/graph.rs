//! Region graph and travel closures.

use crate::base::RegionId;
use crate::errors::{SimError, SimResult};
use crate::region::Region;
use std::collections::{HashSet, VecDeque};

/// All regions of a simulation, addressed by [`RegionId`].
#[derive(Debug, Clone, Default)]
pub struct RegionGraph {
    regions: Vec<Region>,
}

impl RegionGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a region and return its handle.
    pub fn add_region(&mut self, name: impl Into<String>, population: u64, mobility: f64) -> SimResult<RegionId> {
        let id = RegionId(self.regions.len() as u32);
        self.regions.push(Region::new(id, name, population, mobility)?);
        Ok(id)
    }

    pub fn find(&self, name: &str) -> Option<RegionId> {
        self.regions.iter().find(|r| r.name() == name).map(|r| r.id())
    }

    pub fn get(&self, id: RegionId) -> SimResult<&Region> {
        self.regions
            .get(id.index())
            .ok_or_else(|| SimError::UnknownRegion(id.to_string()))
    }

    pub(crate) fn get_mut(&mut self, id: RegionId) -> SimResult<&mut Region> {
        self.regions
            .get_mut(id.index())
            .ok_or_else(|| SimError::UnknownRegion(id.to_string()))
    }

    #[inline]
    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    #[inline]
    pub(crate) fn regions_mut(&mut self) -> &mut [Region] {
        &mut self.regions
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.regions.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    /// Add or update the directed travel edge `from -> to`.
    pub fn connect(&mut self, from: RegionId, to: RegionId, travel_percentage: f64) -> SimResult<()> {
        self.get(to)?;
        self.get_mut(from)?.connect(to, travel_percentage)
    }

    /// Close travel between `origin` and every target reachable from it
    /// through the target set. Returns the number of edges flagged.
    pub fn close_flow(&mut self, origin: RegionId, targets: &[RegionId]) -> SimResult<usize> {
        self.propagate(origin, targets, true)
    }

    /// Reopen travel between `origin` and every target reachable from it
    /// through the target set. Travel percentages are left untouched.
    pub fn open_flow(&mut self, origin: RegionId, targets: &[RegionId]) -> SimResult<usize> {
        self.propagate(origin, targets, false)
    }

    /// Close only the edges between `origin` and each of `neighbors`, in
    /// both directions. Edges among the neighbors are left alone.
    pub fn close_direct(&mut self, origin: RegionId, neighbors: &[RegionId]) -> SimResult<usize> {
        self.flag_direct(origin, neighbors, true)
    }

    /// Reopen only the edges between `origin` and each of `neighbors`.
    pub fn open_direct(&mut self, origin: RegionId, neighbors: &[RegionId]) -> SimResult<usize> {
        self.flag_direct(origin, neighbors, false)
    }

    fn flag_direct(&mut self, origin: RegionId, neighbors: &[RegionId], closed: bool) -> SimResult<usize> {
        self.get(origin)?;
        for &neighbor in neighbors {
            self.get(neighbor)?;
        }
        let mut flagged = 0;
        for &neighbor in neighbors {
            if self.regions[origin.index()].set_link_closed(neighbor, closed) {
                flagged += 1;
            }
            if self.regions[neighbor.index()].set_link_closed(origin, closed) {
                flagged += 1;
            }
        }
        Ok(flagged)
    }

    /// Walk the subgraph induced by `origin` and `targets` breadth-first,
    /// setting the closure flag on both directions of every edge crossed.
    fn propagate(&mut self, origin: RegionId, targets: &[RegionId], closed: bool) -> SimResult<usize> {
        if targets.is_empty() {
            return Err(SimError::EmptyClosureTarget);
        }
        self.get(origin)?;
        for &target in targets {
            self.get(target)?;
        }

        let members: Vec<RegionId> = std::iter::once(origin)
            .chain(targets.iter().copied())
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        let mut visited = HashSet::from([origin]);
        let mut crossed = HashSet::new();
        let mut queue = VecDeque::from([origin]);
        let mut flagged = 0;

        while let Some(current) = queue.pop_front() {
            for &next in &members {
                if next == current || !self.adjacent(current, next) {
                    continue;
                }
                if !crossed.insert((current.min(next), current.max(next))) {
                    continue;
                }
                if self.regions[current.index()].set_link_closed(next, closed) {
                    flagged += 1;
                }
                if self.regions[next.index()].set_link_closed(current, closed) {
                    flagged += 1;
                }
                if visited.insert(next) {
                    queue.push_back(next);
                }
            }
        }
        Ok(flagged)
    }

    fn adjacent(&self, a: RegionId, b: RegionId) -> bool {
        self.regions[a.index()].link(b).is_some() || self.regions[b.index()].link(a).is_some()
    }

    /// Visitors each region receives this step from open incoming edges,
    /// `sum(floor(travel_percentage * source_population / 100))`.
    pub fn inflows(&self) -> Vec<u64> {
        let mut inflow = vec![0u64; self.regions.len()];
        for source in &self.regions {
            for link in source.neighbors().iter().filter(|l| !l.closed) {
                inflow[link.region.index()] +=
                    (link.travel_percentage * source.population() as f64 / 100.0).floor() as u64;
            }
        }
        inflow
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A - B - C - A triangle plus a detached D.
    fn triangle() -> (RegionGraph, [RegionId; 4]) {
        let mut graph = RegionGraph::new();
        let a = graph.add_region("A", 1_000, 2.0).unwrap();
        let b = graph.add_region("B", 2_000, 2.0).unwrap();
        let c = graph.add_region("C", 3_000, 2.0).unwrap();
        let d = graph.add_region("D", 4_000, 2.0).unwrap();
        for (x, y) in [(a, b), (b, c), (c, a)] {
            graph.connect(x, y, 10.0).unwrap();
            graph.connect(y, x, 5.0).unwrap();
        }
        (graph, [a, b, c, d])
    }

    fn closed(graph: &RegionGraph, from: RegionId, to: RegionId) -> bool {
        graph.get(from).unwrap().link(to).unwrap().closed
    }

    #[test]
    fn test_close_and_open_preserve_percentage() {
        let (mut graph, [a, b, ..]) = triangle();
        assert_eq!(graph.close_flow(a, &[b]).unwrap(), 2);
        assert!(closed(&graph, a, b));
        assert!(closed(&graph, b, a));

        graph.open_flow(a, &[b]).unwrap();
        assert!(!closed(&graph, a, b));
        assert_eq!(graph.get(a).unwrap().link(b).unwrap().travel_percentage, 10.0);
        assert_eq!(graph.get(b).unwrap().link(a).unwrap().travel_percentage, 5.0);
    }

    #[test]
    fn test_closure_terminates_on_cycles() {
        let (mut graph, [a, b, c, _]) = triangle();
        // every edge of the triangle, both directions
        assert_eq!(graph.close_flow(a, &[b, c]).unwrap(), 6);
        assert!(closed(&graph, b, c));
        assert!(closed(&graph, c, b));
    }

    #[test]
    fn test_closure_only_reaches_through_targets() {
        let (mut graph, [a, b, c, d]) = triangle();
        graph.connect(d, c, 1.0).unwrap();

        // D is a target but only reachable through C, which is not
        graph.close_flow(a, &[b, d]).unwrap();
        assert!(closed(&graph, a, b));
        assert!(!closed(&graph, a, c));
        assert!(!closed(&graph, d, c));
    }

    #[test]
    fn test_closure_errors() {
        let (mut graph, [a, ..]) = triangle();
        assert_eq!(graph.close_flow(a, &[]), Err(SimError::EmptyClosureTarget));
        assert!(matches!(
            graph.open_flow(a, &[RegionId(42)]),
            Err(SimError::UnknownRegion(_))
        ));
    }

    #[test]
    fn test_direct_flags_leave_edges_among_neighbors() {
        let (mut graph, [a, b, c, _]) = triangle();
        graph.close_flow(b, &[c]).unwrap();

        assert_eq!(graph.close_direct(a, &[b, c]).unwrap(), 4);
        assert!(closed(&graph, a, b));
        assert!(closed(&graph, c, a));

        graph.open_direct(a, &[b, c]).unwrap();
        assert!(!closed(&graph, a, b));
        assert!(!closed(&graph, c, a));
        // closed separately, stays closed
        assert!(closed(&graph, b, c));
        assert!(closed(&graph, c, b));
    }

    #[test]
    fn test_inflows_floor_each_edge() {
        let mut graph = RegionGraph::new();
        let a = graph.add_region("A", 15, 1.0).unwrap();
        let b = graph.add_region("B", 15, 1.0).unwrap();
        let c = graph.add_region("C", 10, 1.0).unwrap();
        graph.connect(a, c, 10.0).unwrap();
        graph.connect(b, c, 10.0).unwrap();
        // floor(1.5) + floor(1.5), not floor(3.0)
        assert_eq!(graph.inflows()[c.index()], 2);
    }

    #[test]
    fn test_inflows_skip_closed_edges() {
        let (mut graph, [a, b, c, d]) = triangle();
        // into A: 5% of B (2_000) + 10% of C (3_000)
        assert_eq!(graph.inflows()[a.index()], 100 + 300);
        assert_eq!(graph.inflows()[d.index()], 0);

        graph.close_flow(a, &[c]).unwrap();
        assert_eq!(graph.inflows()[a.index()], 100);
        // into B: 10% of A + 5% of C
        assert_eq!(graph.inflows()[b.index()], 100 + 150);
    }
}
