use super::Point;
#[cfg(feature = "json_export")]
use json::{array, object, JsonValue};
use std::fmt;

/// A Point in Real Space identified by a mesh-wide unique ID
///
/// `Node`s are owned by the `Mesh`. `Elem`s hold shared handles to them and never copy their coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub id: usize,
    pub coords: Point,
}

impl Node {
    pub fn new(id: usize, coords: Point) -> Self {
        Self { id, coords }
    }

    /// Produce a Json Object that describes this Node
    #[cfg(feature = "json_export")]
    pub fn to_json(&self) -> JsonValue {
        object! {
            "id": self.id,
            "coords": array![self.coords.x, self.coords.y, self.coords.z],
        }
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "Node {} (x: {:.10}, y: {:.10}, z: {:.10})",
            self.id, self.coords.x, self.coords.y, self.coords.z
        )
    }
}
