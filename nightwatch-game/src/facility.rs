//! Static facility topology and BFS pathfinding.
//!
//! The facility is loaded once from [`FacilityData`] and validated into an
//! immutable [`Facility`]. Rooms are addressed by [`RoomIdx`], their position
//! in the data file, which also fixes neighbour order for tie-breaking.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt;
use thiserror::Error;

use crate::constants::{FRONT_DOOR_DEAD_ZONE, MAX_ROOMS};

const DEFAULT_FACILITY_DATA: &str = include_str!("../assets/data/facility.json");

/// Index of a room inside the facility, stable for the engine's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomIdx(pub u8);

impl RoomIdx {
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for RoomIdx {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Door through which a subject approaches the control room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Front,
    Left,
    Right,
}

impl Direction {
    pub const ALL: [Self; 3] = [Self::Front, Self::Left, Self::Right];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Front => "front",
            Self::Left => "left",
            Self::Right => "right",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Serialized room entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomData {
    pub id: String,
    pub name: String,
    pub x: f32,
    pub y: f32,
    #[serde(default)]
    pub neighbors: Vec<String>,
    #[serde(default)]
    pub spawn: bool,
    #[serde(default, rename = "final")]
    pub final_room: bool,
    #[serde(default)]
    pub control: bool,
}

/// Serialized facility document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FacilityData {
    pub neutral_room: String,
    pub rooms: Vec<RoomData>,
}

impl FacilityData {
    /// Load facility data from JSON string
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON cannot be parsed into facility data.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Embedded default facility.
    ///
    /// # Errors
    ///
    /// Returns an error if the embedded document is malformed.
    pub fn load_from_static() -> Result<Self, serde_json::Error> {
        Self::from_json(DEFAULT_FACILITY_DATA)
    }
}

/// Violations of the facility invariants detected at load time.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FacilityError {
    #[error("facility has no rooms")]
    Empty,
    #[error("facility has {count} rooms, at most {max} are supported")]
    TooManyRooms { count: usize, max: usize },
    #[error("room id `{0}` is declared more than once")]
    DuplicateRoom(String),
    #[error("room `{room}` lists unknown neighbour `{neighbor}`")]
    UnknownNeighbor { room: String, neighbor: String },
    #[error("room `{0}` lists itself as a neighbour")]
    SelfLoop(String),
    #[error("edge `{from}` -> `{to}` has no reverse edge")]
    AsymmetricEdge { from: String, to: String },
    #[error("expected exactly one control room, found {0}")]
    ControlRoomCount(usize),
    #[error("control room `{0}` cannot also be a spawn or final room")]
    ControlRoomFlags(String),
    #[error("control room is adjacent to `{0}`, which is not a final room")]
    ControlAdjacentToNonFinal(String),
    #[error("final room `{0}` is not adjacent to the control room")]
    FinalNotAdjacent(String),
    #[error("facility has no final room")]
    NoFinalRoom,
    #[error("facility has no spawn room")]
    NoSpawnRoom,
    #[error("neutral room `{0}` is missing or is a control/final room")]
    InvalidNeutralRoom(String),
    #[error("room `{0}` cannot reach the control room")]
    Disconnected(String),
}

/// Validated room.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Room {
    pub id: String,
    pub name: String,
    pub x: f32,
    pub y: f32,
    pub neighbors: Vec<RoomIdx>,
    pub is_spawn: bool,
    pub is_final_room: bool,
    pub is_control_room: bool,
}

/// Immutable, validated facility graph.
#[derive(Debug, Clone, PartialEq)]
pub struct Facility {
    rooms: Vec<Room>,
    control: RoomIdx,
    neutral: RoomIdx,
    spawns: Vec<RoomIdx>,
    /// Hop count from each room to control.
    depths: Vec<usize>,
    diameter: usize,
}

impl Facility {
    /// Validate facility data and build the graph.
    ///
    /// # Errors
    ///
    /// Returns a [`FacilityError`] describing the first violated invariant.
    pub fn from_data(data: &FacilityData) -> Result<Self, FacilityError> {
        if data.rooms.is_empty() {
            return Err(FacilityError::Empty);
        }
        if data.rooms.len() > MAX_ROOMS {
            return Err(FacilityError::TooManyRooms {
                count: data.rooms.len(),
                max: MAX_ROOMS,
            });
        }

        let mut lookup: HashMap<&str, RoomIdx> = HashMap::with_capacity(data.rooms.len());
        for (i, room) in data.rooms.iter().enumerate() {
            let idx = RoomIdx(u8::try_from(i).unwrap_or(u8::MAX));
            if lookup.insert(room.id.as_str(), idx).is_some() {
                return Err(FacilityError::DuplicateRoom(room.id.clone()));
            }
        }

        let mut rooms = Vec::with_capacity(data.rooms.len());
        for room in &data.rooms {
            let mut neighbors = Vec::with_capacity(room.neighbors.len());
            for neighbor in &room.neighbors {
                if neighbor == &room.id {
                    return Err(FacilityError::SelfLoop(room.id.clone()));
                }
                let Some(&idx) = lookup.get(neighbor.as_str()) else {
                    return Err(FacilityError::UnknownNeighbor {
                        room: room.id.clone(),
                        neighbor: neighbor.clone(),
                    });
                };
                if !neighbors.contains(&idx) {
                    neighbors.push(idx);
                }
            }
            rooms.push(Room {
                id: room.id.clone(),
                name: room.name.clone(),
                x: room.x,
                y: room.y,
                neighbors,
                is_spawn: room.spawn,
                is_final_room: room.final_room,
                is_control_room: room.control,
            });
        }

        for (i, room) in rooms.iter().enumerate() {
            for neighbor in &room.neighbors {
                let back = &rooms[neighbor.index()].neighbors;
                if !back.iter().any(|b| b.index() == i) {
                    return Err(FacilityError::AsymmetricEdge {
                        from: room.id.clone(),
                        to: rooms[neighbor.index()].id.clone(),
                    });
                }
            }
        }

        let controls: Vec<RoomIdx> = index_where(&rooms, |r| r.is_control_room);
        let [control] = controls.as_slice() else {
            return Err(FacilityError::ControlRoomCount(controls.len()));
        };
        let control = *control;
        let control_room = &rooms[control.index()];
        if control_room.is_spawn || control_room.is_final_room {
            return Err(FacilityError::ControlRoomFlags(control_room.id.clone()));
        }
        for neighbor in &control_room.neighbors {
            let room = &rooms[neighbor.index()];
            if !room.is_final_room {
                return Err(FacilityError::ControlAdjacentToNonFinal(room.id.clone()));
            }
        }
        let finals = index_where(&rooms, |r| r.is_final_room);
        if finals.is_empty() {
            return Err(FacilityError::NoFinalRoom);
        }
        for idx in &finals {
            if !control_room.neighbors.contains(idx) {
                return Err(FacilityError::FinalNotAdjacent(rooms[idx.index()].id.clone()));
            }
        }

        let spawns = index_where(&rooms, |r| r.is_spawn);
        if spawns.is_empty() {
            return Err(FacilityError::NoSpawnRoom);
        }

        let neutral = lookup
            .get(data.neutral_room.as_str())
            .copied()
            .filter(|idx| {
                let room = &rooms[idx.index()];
                !room.is_control_room && !room.is_final_room
            })
            .ok_or_else(|| FacilityError::InvalidNeutralRoom(data.neutral_room.clone()))?;

        let mut depths = Vec::with_capacity(rooms.len());
        let from_control = bfs_distances(&rooms, control);
        for (i, distance) in from_control.iter().enumerate() {
            match distance {
                Some(d) => depths.push(*d),
                None => return Err(FacilityError::Disconnected(rooms[i].id.clone())),
            }
        }

        let diameter = (0..rooms.len())
            .filter_map(|i| {
                let origin = RoomIdx(u8::try_from(i).ok()?);
                bfs_distances(&rooms, origin).into_iter().flatten().max()
            })
            .max()
            .unwrap_or(0);

        Ok(Self {
            rooms,
            control,
            neutral,
            spawns,
            depths,
            diameter,
        })
    }

    /// Embedded default facility, validated.
    ///
    /// # Errors
    ///
    /// Returns an error if the embedded data fails to parse or validate.
    pub fn load_from_static() -> Result<Self, crate::WorldError> {
        let data = FacilityData::load_from_static()?;
        Ok(Self::from_data(&data)?)
    }

    #[must_use]
    pub fn rooms(&self) -> &[Room] {
        &self.rooms
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }

    #[must_use]
    pub fn room(&self, idx: RoomIdx) -> Option<&Room> {
        self.rooms.get(idx.index())
    }

    #[must_use]
    pub fn contains(&self, idx: RoomIdx) -> bool {
        idx.index() < self.rooms.len()
    }

    #[must_use]
    pub fn room_index(&self, id: &str) -> Option<RoomIdx> {
        self.rooms
            .iter()
            .position(|r| r.id == id)
            .and_then(|i| u8::try_from(i).ok())
            .map(RoomIdx)
    }

    /// Human-readable id for logs and reports.
    #[must_use]
    pub fn room_id(&self, idx: RoomIdx) -> &str {
        self.room(idx).map_or("?", |r| r.id.as_str())
    }

    #[must_use]
    pub fn neighbors(&self, idx: RoomIdx) -> &[RoomIdx] {
        self.room(idx).map_or(&[], |r| r.neighbors.as_slice())
    }

    #[must_use]
    pub const fn control_room(&self) -> RoomIdx {
        self.control
    }

    #[must_use]
    pub const fn neutral_room(&self) -> RoomIdx {
        self.neutral
    }

    #[must_use]
    pub fn spawn_rooms(&self) -> &[RoomIdx] {
        &self.spawns
    }

    #[must_use]
    pub fn is_final(&self, idx: RoomIdx) -> bool {
        self.room(idx).is_some_and(|r| r.is_final_room)
    }

    /// Longest shortest-path hop count between any two rooms.
    #[must_use]
    pub const fn diameter(&self) -> usize {
        self.diameter
    }

    /// Hops from `room` to the control room.
    #[must_use]
    pub fn depth(&self, room: RoomIdx) -> Option<usize> {
        self.depths.get(room.index()).copied()
    }

    /// Shortest path from `from` to `to`, both ends included.
    ///
    /// Neighbours are expanded in declaration order, so ties resolve to the
    /// earliest-declared room. The control room is only ever a path's end:
    /// routes between other rooms go around it. Returns an empty vec when no
    /// path exists.
    #[must_use]
    pub fn shortest_path(&self, from: RoomIdx, to: RoomIdx) -> Vec<RoomIdx> {
        if !self.contains(from) || !self.contains(to) {
            return Vec::new();
        }
        if from == to {
            return vec![from];
        }

        let mut parent: Vec<Option<RoomIdx>> = vec![None; self.rooms.len()];
        let mut visited = HashSet::with_capacity(self.rooms.len());
        let mut queue = VecDeque::new();
        visited.insert(from);
        queue.push_back(from);

        while let Some(current) = queue.pop_front() {
            if current == self.control && current != from {
                continue;
            }
            for &next in self.neighbors(current) {
                if !visited.insert(next) {
                    continue;
                }
                parent[next.index()] = Some(current);
                if next == to {
                    return unwind(&parent, from, to);
                }
                queue.push_back(next);
            }
        }

        Vec::new()
    }

    /// First step of the shortest path, if any.
    #[must_use]
    pub fn next_hop(&self, from: RoomIdx, to: RoomIdx) -> Option<RoomIdx> {
        self.shortest_path(from, to).get(1).copied()
    }

    /// Hop distance between two rooms.
    #[must_use]
    pub fn distance(&self, from: RoomIdx, to: RoomIdx) -> Option<usize> {
        let path = self.shortest_path(from, to);
        path.len().checked_sub(1)
    }

    /// Door a subject standing in `room` would come through.
    #[must_use]
    pub fn approach_direction(&self, room: RoomIdx) -> Direction {
        let control_x = self.rooms[self.control.index()].x;
        let room_x = self.room(room).map_or(control_x, |r| r.x);
        let dx = room_x - control_x;
        if dx.abs() < FRONT_DOOR_DEAD_ZONE {
            Direction::Front
        } else if dx < 0.0 {
            Direction::Left
        } else {
            Direction::Right
        }
    }
}

fn index_where(rooms: &[Room], pred: impl Fn(&Room) -> bool) -> Vec<RoomIdx> {
    rooms
        .iter()
        .enumerate()
        .filter(|(_, r)| pred(r))
        .filter_map(|(i, _)| u8::try_from(i).ok().map(RoomIdx))
        .collect()
}

fn bfs_distances(rooms: &[Room], origin: RoomIdx) -> Vec<Option<usize>> {
    let mut distances = vec![None; rooms.len()];
    let mut queue = VecDeque::new();
    distances[origin.index()] = Some(0);
    queue.push_back(origin);
    while let Some(current) = queue.pop_front() {
        let next_distance = distances[current.index()].unwrap_or(0) + 1;
        for next in &rooms[current.index()].neighbors {
            if distances[next.index()].is_none() {
                distances[next.index()] = Some(next_distance);
                queue.push_back(*next);
            }
        }
    }
    distances
}

fn unwind(parent: &[Option<RoomIdx>], from: RoomIdx, to: RoomIdx) -> Vec<RoomIdx> {
    let mut path = vec![to];
    let mut cursor = to;
    while cursor != from {
        let Some(prev) = parent[cursor.index()] else {
            return Vec::new();
        };
        path.push(prev);
        cursor = prev;
    }
    path.reverse();
    path
}
