//! Sector map: star systems on a hex grid joined by trade routes.

use crate::model::{FactionId, SystemId};
use crate::ValidationError;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;

/// Offset hex coordinate ("odd-q": odd columns sit half a hex lower).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct HexCoord {
    pub col: i32,
    pub row: i32,
}

const CUBE_DIRECTIONS: [(i32, i32, i32); 6] = [
    (1, -1, 0),
    (1, 0, -1),
    (0, 1, -1),
    (-1, 1, 0),
    (-1, 0, 1),
    (0, -1, 1),
];

impl HexCoord {
    pub const fn new(col: i32, row: i32) -> Self {
        Self { col, row }
    }

    /// Cube coordinates `(x, y, z)` with `x + y + z == 0`.
    pub fn to_cube(self) -> (i32, i32, i32) {
        let x = self.col;
        let z = self.row - (self.col - (self.col & 1)) / 2;
        (x, -x - z, z)
    }

    pub fn from_cube(x: i32, _y: i32, z: i32) -> Self {
        Self {
            col: x,
            row: z + (x - (x & 1)) / 2,
        }
    }

    /// Hex steps between two cells: Chebyshev distance in cube space.
    pub fn distance(self, other: HexCoord) -> u32 {
        let (ax, ay, az) = self.to_cube();
        let (bx, by, bz) = other.to_cube();
        (ax - bx)
            .unsigned_abs()
            .max((ay - by).unsigned_abs())
            .max((az - bz).unsigned_abs())
    }

    /// The six adjacent cells.
    pub fn neighbors(self) -> [HexCoord; 6] {
        let (x, y, z) = self.to_cube();
        CUBE_DIRECTIONS.map(|(dx, dy, dz)| HexCoord::from_cube(x + dx, y + dy, z + dz))
    }
}

impl fmt::Display for HexCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.col, self.row)
    }
}

/// A star system and its primary world.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StarSystem {
    pub id: SystemId,
    pub name: String,
    pub hex: HexCoord,
    /// Primary-world tech level, 0..=5.
    pub tech_level: u8,
    /// Trade routes; each is a single movement hop regardless of distance.
    #[serde(default)]
    pub routes: Vec<SystemId>,
    /// Faction holding the planetary government, if any.
    #[serde(default)]
    pub government: Option<FactionId>,
}

/// The sector graph. Routes are treated as two-way.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(try_from = "Vec<StarSystem>", into = "Vec<StarSystem>")]
pub struct Sector {
    systems: BTreeMap<SystemId, StarSystem>,
    by_hex: HashMap<HexCoord, SystemId>,
    links: BTreeMap<SystemId, BTreeSet<SystemId>>,
}

impl Sector {
    /// Build the sector, rejecting duplicate ids or hexes and dangling routes.
    pub fn new(systems: Vec<StarSystem>) -> Result<Self, ValidationError> {
        let mut by_id = BTreeMap::new();
        let mut by_hex = HashMap::new();
        for s in systems {
            if s.tech_level > crate::tags::MAX_TECH_LEVEL {
                return Err(ValidationError::TechLevelOutOfRange(s.id, s.tech_level));
            }
            if by_hex.insert(s.hex, s.id).is_some() {
                return Err(ValidationError::DuplicateHex(s.hex));
            }
            let id = s.id;
            if by_id.insert(id, s).is_some() {
                return Err(ValidationError::DuplicateSystem(id));
            }
        }
        let mut links: BTreeMap<SystemId, BTreeSet<SystemId>> = BTreeMap::new();
        for s in by_id.values() {
            for &to in &s.routes {
                if !by_id.contains_key(&to) {
                    return Err(ValidationError::UnknownSystem(to));
                }
                if to == s.id {
                    continue;
                }
                links.entry(s.id).or_default().insert(to);
                links.entry(to).or_default().insert(s.id);
            }
        }
        Ok(Self {
            systems: by_id,
            by_hex,
            links,
        })
    }

    pub fn system(&self, id: SystemId) -> Option<&StarSystem> {
        self.systems.get(&id)
    }

    pub fn system_mut(&mut self, id: SystemId) -> Option<&mut StarSystem> {
        self.systems.get_mut(&id)
    }

    pub fn contains(&self, id: SystemId) -> bool {
        self.systems.contains_key(&id)
    }

    /// Systems in id order.
    pub fn systems(&self) -> impl Iterator<Item = &StarSystem> {
        self.systems.values()
    }

    pub fn len(&self) -> usize {
        self.systems.len()
    }

    pub fn is_empty(&self) -> bool {
        self.systems.is_empty()
    }

    pub fn system_at(&self, hex: HexCoord) -> Option<SystemId> {
        self.by_hex.get(&hex).copied()
    }

    /// Systems one trade-route hop away.
    pub fn route_neighbors(&self, id: SystemId) -> impl Iterator<Item = SystemId> + '_ {
        self.links.get(&id).into_iter().flatten().copied()
    }

    /// Hex distance between two systems.
    pub fn hex_distance(&self, a: SystemId, b: SystemId) -> Option<u32> {
        Some(self.system(a)?.hex.distance(self.system(b)?.hex))
    }
}

impl TryFrom<Vec<StarSystem>> for Sector {
    type Error = ValidationError;

    fn try_from(value: Vec<StarSystem>) -> Result<Self, Self::Error> {
        Sector::new(value)
    }
}

impl From<Sector> for Vec<StarSystem> {
    fn from(value: Sector) -> Self {
        value.systems.into_values().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sys(id: u32, col: i32, row: i32, routes: &[u32]) -> StarSystem {
        StarSystem {
            id: SystemId(id),
            name: format!("S{id}"),
            hex: HexCoord::new(col, row),
            tech_level: 4,
            routes: routes.iter().map(|&r| SystemId(r)).collect(),
            government: None,
        }
    }

    #[test]
    fn cube_round_trip() {
        for col in -3..4 {
            for row in -3..4 {
                let h = HexCoord::new(col, row);
                let (x, y, z) = h.to_cube();
                assert_eq!(x + y + z, 0);
                assert_eq!(HexCoord::from_cube(x, y, z), h);
            }
        }
    }

    #[test]
    fn neighbors_are_distance_one() {
        for h in [HexCoord::new(0, 0), HexCoord::new(1, 2), HexCoord::new(-3, 5)] {
            for n in h.neighbors() {
                assert_eq!(h.distance(n), 1);
            }
        }
    }

    #[test]
    fn odd_column_offsets() {
        // Odd-q: (1,0) touches the origin, (1,1) does not.
        let origin = HexCoord::new(0, 0);
        assert_eq!(origin.distance(HexCoord::new(1, 0)), 1);
        assert_eq!(origin.distance(HexCoord::new(1, 1)), 2);
        assert_eq!(HexCoord::new(1, 0).distance(HexCoord::new(2, 1)), 1);
        assert_eq!(origin.distance(HexCoord::new(4, 0)), 4);
    }

    #[test]
    fn routes_are_symmetric() {
        let sector = Sector::new(vec![sys(1, 0, 0, &[2]), sys(2, 4, 0, &[])]).unwrap();
        assert_eq!(sector.route_neighbors(SystemId(2)).collect::<Vec<_>>(), vec![SystemId(1)]);
        assert_eq!(sector.hex_distance(SystemId(1), SystemId(2)), Some(4));
    }

    #[test]
    fn rejects_bad_maps() {
        assert_eq!(
            Sector::new(vec![sys(1, 0, 0, &[9])]).unwrap_err(),
            ValidationError::UnknownSystem(SystemId(9))
        );
        assert_eq!(
            Sector::new(vec![sys(1, 0, 0, &[]), sys(1, 1, 0, &[])]).unwrap_err(),
            ValidationError::DuplicateSystem(SystemId(1))
        );
        assert_eq!(
            Sector::new(vec![sys(1, 0, 0, &[]), sys(2, 0, 0, &[])]).unwrap_err(),
            ValidationError::DuplicateHex(HexCoord::new(0, 0))
        );
    }
}
