//! Movement ranges over the hex grid and trade routes.

use crate::model::SystemId;
use crate::sector::{HexCoord, Sector};
use std::collections::{BTreeSet, HashSet, VecDeque};
use tracing::debug;

/// Hops an ordinary move covers.
pub const DEFAULT_MOVE_RANGE: u32 = 1;

/// Systems reachable from `origin` within `range` hops.
///
/// A hop is a step to an adjacent hex (occupied or empty) or along a trade
/// route from a system. The origin itself is never part of the result; an
/// unknown origin reaches nothing.
pub fn reachable(sector: &Sector, origin: SystemId, range: u32) -> BTreeSet<SystemId> {
    let mut out = BTreeSet::new();
    let Some(start) = sector.system(origin) else {
        return out;
    };
    let mut seen: HashSet<HexCoord> = HashSet::from([start.hex]);
    let mut frontier: VecDeque<(HexCoord, u32)> = VecDeque::from([(start.hex, 0)]);

    while let Some((hex, depth)) = frontier.pop_front() {
        if depth == range {
            continue;
        }
        let mut step = |next: HexCoord, frontier: &mut VecDeque<(HexCoord, u32)>| {
            if seen.insert(next) {
                if let Some(id) = sector.system_at(next) {
                    out.insert(id);
                }
                frontier.push_back((next, depth + 1));
            }
        };
        for n in hex.neighbors() {
            step(n, &mut frontier);
        }
        if let Some(here) = sector.system_at(hex) {
            for to in sector.route_neighbors(here) {
                if let Some(sys) = sector.system(to) {
                    step(sys.hex, &mut frontier);
                }
            }
        }
    }
    out.remove(&origin);
    debug!(?origin, range, found = out.len(), "movement range computed");
    out
}
