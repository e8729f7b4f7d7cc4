/// Errors and helpers for splitting `Elem`s into children
pub mod h_refinement;

use h_refinement::{check_refineable, parent_side_of, HRefError};

use crate::elem::{Elem, ElemLinks, ElemType, GeometryError, SideKey, SubdomainId, UnknownElemType};
use crate::geom::{node::Node, point_key::PointKey, Point};

#[cfg(feature = "json_export")]
use json::object;
use json::JsonValue;
use rayon::prelude::*;
use smallvec::SmallVec;
use std::collections::{BTreeMap, BTreeSet};
use std::fs::read_to_string;
#[cfg(feature = "json_export")]
use std::fs::File;
#[cfg(feature = "json_export")]
use std::io::BufWriter;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MeshError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Unable to parse Mesh file as JSON: {0}")]
    Json(#[from] json::Error),
    #[error("Malformed Mesh file: {0}")]
    Format(String),
    #[error(transparent)]
    UnknownElemType(#[from] UnknownElemType),
    #[error("Node {0} shares its location with an existing Node; all Nodes must be at unique locations!")]
    DuplicateNode(usize),
    #[error("Node {node_id} doesn't exist; cannot build {elem_type} Elem!")]
    NodeDoesntExist { node_id: usize, elem_type: ElemType },
    #[error("{elem_type} Elems have {expected} Nodes; cannot build one from {found} Nodes!")]
    WrongNodeCount {
        elem_type: ElemType,
        expected: usize,
        found: usize,
    },
    #[error("Elem {0} doesn't exist!")]
    ElemDoesntExist(usize),
}

/// A collection of `Node`s and `Elem`s with h-refinement bookkeeping
///
/// `Elem`s are never removed: refining an `Elem` appends its children and leaves the parent in place (inactive).
/// Only active `Elem`s take part in neighbor, boundary and volume queries.
#[derive(Debug, Default)]
pub struct Mesh {
    pub nodes: Vec<Arc<Node>>,
    pub elems: Vec<Box<dyn Elem>>,
    node_lookup: BTreeMap<PointKey, usize>,
}

impl Mesh {
    /// Construct a completely empty Mesh
    pub fn blank() -> Self {
        Self {
            nodes: Vec::new(),
            elems: Vec::new(),
            node_lookup: BTreeMap::new(),
        }
    }

    /// Construct a Mesh from a JSON file with the following format
    ///
    /// The following describes two unit cubes sharing a face in subdomains 0 and 1:
    ///
    /// mesh.json
    /// ```JSON
    /// {
    ///     "Nodes": [
    ///         [0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, 1.0, 0.0], [0.0, 1.0, 0.0],
    ///         [0.0, 0.0, 1.0], [1.0, 0.0, 1.0], [1.0, 1.0, 1.0], [0.0, 1.0, 1.0],
    ///         [2.0, 0.0, 0.0], [2.0, 1.0, 0.0], [2.0, 0.0, 1.0], [2.0, 1.0, 1.0]
    ///     ],
    ///     "Elems": [
    ///         { "type": "HEX8", "nodes": [0, 1, 2, 3, 4, 5, 6, 7], "subdomain": 0 },
    ///         { "type": "HEX8", "nodes": [1, 8, 9, 2, 5, 10, 11, 6], "subdomain": 1 }
    ///     ]
    /// }
    /// ```
    ///
    /// `"subdomain"` is optional and defaults to 0
    ///
    /// Files written by [Mesh::export_to_json] are also accepted: Nodes may be `{ "coords": [x, y, z] }` objects and
    /// Elems marked `"active": false` are skipped, so the active `Elem`s are loaded as a flat Mesh.
    pub fn from_file(path: impl AsRef<str>) -> Result<Self, MeshError> {
        let mesh_file_contents = read_to_string(path.as_ref())?;
        let mesh_file_json = json::parse(&mesh_file_contents)?;
        Self::from_json(&mesh_file_json)
    }

    /// Construct a Mesh from a parsed JSON value (see [Mesh::from_file] for the format)
    pub fn from_json(mesh_json: &JsonValue) -> Result<Self, MeshError> {
        let mut mesh = Self::blank();

        for (node_index, point) in parse_node_information(mesh_json)?.iter().enumerate() {
            if mesh.add_node(*point) != node_index {
                return Err(MeshError::DuplicateNode(node_index));
            }
        }

        for (elem_type, node_ids, subdomain_id) in parse_elem_information(mesh_json)? {
            mesh.add_elem(elem_type, &node_ids, subdomain_id)?;
        }

        tracing::debug!(
            n_nodes = mesh.nodes.len(),
            n_elems = mesh.elems.len(),
            "constructed Mesh from JSON"
        );

        Ok(mesh)
    }

    /// Print the mesh to a JSON file specified by path.
    #[cfg(feature = "json_export")]
    pub fn export_to_json(&self, path: impl AsRef<str>) -> std::io::Result<()> {
        let f = File::create(path.as_ref())?;
        let mut w = BufWriter::new(&f);

        let mesh_object = object! {
            "Nodes": JsonValue::from(self.nodes.iter().map(|node| node.to_json()).collect::<Vec<_>>()),
            "Elems": JsonValue::from(self.elems.iter().map(|elem| elem.to_json()).collect::<Vec<_>>()),
        };

        mesh_object.write_pretty(&mut w, 4)?;

        Ok(())
    }

    // ----------------------------------------------------------------------------------------------------
    // Construction
    // ----------------------------------------------------------------------------------------------------

    /// Add a Node at `point`, returning its ID
    ///
    /// If a Node already exists at (or within [POINT_UNIQUENESS_ACCURACY](crate::geom::point_key::POINT_UNIQUENESS_ACCURACY)
    /// of) `point`, its ID is returned instead
    pub fn add_node(&mut self, point: Point) -> usize {
        let next_id = self.nodes.len();
        let id = *self.node_lookup.entry(PointKey::from(&point)).or_insert(next_id);

        if id == next_id {
            self.nodes.push(Arc::new(Node::new(id, point)));
        }

        id
    }

    /// Build a new `Elem` over existing Nodes, returning its ID
    pub fn add_elem(
        &mut self,
        elem_type: ElemType,
        node_ids: &[usize],
        subdomain_id: SubdomainId,
    ) -> Result<usize, MeshError> {
        let expected = elem_type.topology().n_nodes();
        if node_ids.len() != expected {
            return Err(MeshError::WrongNodeCount {
                elem_type,
                expected,
                found: node_ids.len(),
            });
        }

        let nodes = node_ids
            .iter()
            .map(|node_id| {
                self.nodes
                    .get(*node_id)
                    .cloned()
                    .ok_or(MeshError::NodeDoesntExist {
                        node_id: *node_id,
                        elem_type,
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let elem_id = self.elems.len();
        self.elems
            .push(elem_type.build(nodes, ElemLinks::new(Some(elem_id), subdomain_id)));

        Ok(elem_id)
    }

    // ----------------------------------------------------------------------------------------------------
    // General Data Retrieval
    // ----------------------------------------------------------------------------------------------------

    /// Get the [Point]s composing an [`Elem`]
    pub fn elem_points(&self, elem_id: usize) -> SmallVec<[Point; 8]> {
        assert!(
            elem_id < self.elems.len(),
            "Elem {} doesn't exist; cannot retrieve its Points!",
            elem_id
        );
        self.elems[elem_id].points()
    }

    /// Iterate over the leaves of the refinement tree along with their IDs
    pub fn active_elems(&self) -> impl Iterator<Item = (usize, &dyn Elem)> + '_ {
        self.elems
            .iter()
            .enumerate()
            .filter(|(_, elem)| elem.is_active())
            .map(|(elem_id, elem)| (elem_id, elem.as_ref()))
    }

    /// Get a list of an [`Elem`]s descendant's IDs
    pub fn descendant_elems(
        &self,
        elem_id: usize,
        include_starting_elem: bool,
    ) -> Result<Vec<usize>, MeshError> {
        if elem_id >= self.elems.len() {
            Err(MeshError::ElemDoesntExist(elem_id))
        } else {
            let mut descendants = Vec::new();
            self.rec_descendant_elems(elem_id, include_starting_elem, &mut descendants);
            Ok(descendants)
        }
    }

    fn rec_descendant_elems(&self, elem_id: usize, include: bool, desc: &mut Vec<usize>) {
        if include {
            desc.push(elem_id);
        }
        if let Some(child_elem_ids) = self.elems[elem_id].child_ids() {
            for cei in child_elem_ids {
                self.rec_descendant_elems(*cei, true, desc);
            }
        }
    }

    /// Get a list of an [`Elem`]s ancestors's IDs (nearest first)
    pub fn ancestor_elems(
        &self,
        elem_id: usize,
        include_starting_elem: bool,
    ) -> Result<Vec<usize>, MeshError> {
        if elem_id >= self.elems.len() {
            Err(MeshError::ElemDoesntExist(elem_id))
        } else {
            let mut ancestors = Vec::new();
            self.rec_ancestor_elems(elem_id, include_starting_elem, &mut ancestors);
            Ok(ancestors)
        }
    }

    fn rec_ancestor_elems(&self, elem_id: usize, include: bool, anc: &mut Vec<usize>) {
        if include {
            anc.push(elem_id);
        }
        if let Some(parent_elem_id) = self.elems[elem_id].parent_id() {
            self.rec_ancestor_elems(parent_elem_id, true, anc);
        }
    }

    // ----------------------------------------------------------------------------------------------------
    // Neighbors and Boundaries
    // ----------------------------------------------------------------------------------------------------

    /// The active `Elem` across each side of an active `Elem` (`None` on boundaries)
    ///
    /// Neighbors are found by matching [SideKey]s, so only conforming interfaces (identical side Nodes) are detected
    pub fn side_neighbors(&self, elem_id: usize) -> Result<SmallVec<[Option<usize>; 6]>, MeshError> {
        let elem = self
            .elems
            .get(elem_id)
            .ok_or(MeshError::ElemDoesntExist(elem_id))?;

        let mut side_owners: BTreeMap<SideKey, SmallVec<[usize; 2]>> = BTreeMap::new();
        for (other_id, other) in self.active_elems() {
            for s in 0..other.n_sides() {
                side_owners.entry(other.side_key(s)).or_default().push(other_id);
            }
        }

        Ok((0..elem.n_sides())
            .map(|s| {
                side_owners.get(&elem.side_key(s)).and_then(|owners| {
                    owners.iter().copied().find(|owner| *owner != elem_id)
                })
            })
            .collect())
    }

    /// `(elem_id, side)` pairs of every active `Elem` side on the exterior of the Mesh
    ///
    /// A side is interior if an unrelated `Elem` (active or not, but neither an ancestor nor a descendant) shares its
    /// Nodes. Sides of refined `Elem`s' children inherit the status of the parent side they lie on, so hanging
    /// interfaces are not reported as boundaries.
    pub fn boundary_sides(&self) -> Vec<(usize, usize)> {
        let mut side_owners: BTreeMap<SideKey, SmallVec<[usize; 2]>> = BTreeMap::new();
        for (elem_id, elem) in self.elems.iter().enumerate() {
            for s in 0..elem.n_sides() {
                side_owners.entry(elem.side_key(s)).or_default().push(elem_id);
            }
        }

        self.active_elems()
            .flat_map(|(elem_id, elem)| (0..elem.n_sides()).map(move |s| (elem_id, s)))
            .filter(|(elem_id, s)| self.is_boundary_side(*elem_id, *s, &side_owners))
            .collect()
    }

    fn is_boundary_side(
        &self,
        elem_id: usize,
        s: usize,
        side_owners: &BTreeMap<SideKey, SmallVec<[usize; 2]>>,
    ) -> bool {
        let elem = &self.elems[elem_id];
        let shared = side_owners.get(&elem.side_key(s)).map_or(false, |owners| {
            owners.iter().any(|other| {
                *other != elem_id
                    && !self.is_ancestor(*other, elem_id)
                    && !self.is_ancestor(elem_id, *other)
            })
        });
        if shared {
            return false;
        }

        match elem.parent_id() {
            None => true,
            Some(parent_id) => {
                let parent = self.elems[parent_id].as_ref();
                let c = parent
                    .child_ids()
                    .and_then(|ids| ids.iter().position(|id| *id == elem_id))
                    .unwrap_or_else(|| {
                        panic!(
                            "Elem {} is not listed among the children of its parent {}; the refinement tree is corrupt!",
                            elem_id, parent_id
                        )
                    });

                match parent_side_of(parent, c, s) {
                    Some(parent_side) => self.is_boundary_side(parent_id, parent_side, side_owners),
                    None => false,
                }
            }
        }
    }

    /// Is `ancestor` a strict ancestor of `elem_id` in the refinement tree
    fn is_ancestor(&self, ancestor: usize, elem_id: usize) -> bool {
        let mut current = self.elems[elem_id].parent_id();
        while let Some(parent_id) = current {
            if parent_id == ancestor {
                return true;
            }
            current = self.elems[parent_id].parent_id();
        }
        false
    }

    /// Build an owned `Elem` for every active boundary side
    pub fn extract_boundary(&self) -> Vec<Box<dyn Elem>> {
        let boundary: Vec<Box<dyn Elem>> = self
            .boundary_sides()
            .into_iter()
            .map(|(elem_id, s)| self.elems[elem_id].build_side(s))
            .collect();

        tracing::debug!(n_sides = boundary.len(), "extracted Mesh boundary");
        boundary
    }

    // ----------------------------------------------------------------------------------------------------
    // Geometry
    // ----------------------------------------------------------------------------------------------------

    /// Check the geometry of every active, finite `Elem` in parallel
    ///
    /// Returns the ID and error of each invalid `Elem`, ordered by ID
    pub fn validate_geometry(&self) -> Vec<(usize, GeometryError)> {
        let mut invalid: Vec<(usize, GeometryError)> = self
            .elems
            .par_iter()
            .enumerate()
            .filter(|(_, elem)| elem.is_active() && !elem.elem_type().is_infinite())
            .filter_map(|(elem_id, elem)| elem.volume().err().map(|err| (elem_id, err)))
            .collect();

        invalid.sort_by_key(|(elem_id, _)| *elem_id);

        for (elem_id, err) in invalid.iter() {
            tracing::warn!(elem_id, "{}", err);
        }

        invalid
    }

    /// Sum of the measures of all active, finite `Elem`s
    pub fn total_volume(&self) -> Result<f64, GeometryError> {
        self.active_elems()
            .filter(|(_, elem)| !elem.elem_type().is_infinite())
            .try_fold(0.0, |total, (_, elem)| Ok(total + elem.volume()?))
    }

    // ----------------------------------------------------------------------------------------------------
    // h-refinement methods
    // ----------------------------------------------------------------------------------------------------

    /// Determine if this Elem can be h-refined
    /// * returns false if the Elem already has children, cannot be refined or has reached [MAX_H_LEVEL](h_refinement::MAX_H_LEVEL)
    /// * returns an `Err` if the Mesh doesn't have `elem_id`
    pub fn elem_is_h_refineable(&self, elem_id: usize) -> Result<bool, HRefError> {
        match self.elems.get(elem_id) {
            None => Err(HRefError::ElemDoesntExist(elem_id)),
            Some(elem) => Ok(check_refineable(elem_id, elem.as_ref()).is_ok()),
        }
    }

    /// h-refine all `Elem`s in the Mesh that are eligible for h-refinement
    pub fn global_h_refinement(&mut self) -> Result<(), HRefError> {
        let elem_ids: Vec<usize> = (0..self.elems.len())
            .filter(|elem_id| check_refineable(*elem_id, self.elems[*elem_id].as_ref()).is_ok())
            .collect();

        self.h_refine_elems(elem_ids)
    }

    /// h-refine a list of `Elem`s by their ID
    ///
    /// Every `Elem` is checked before any is refined, so the Mesh is left unchanged if an `Err` is returned.
    /// Children are appended to the Mesh in the order of their parents' IDs.
    pub fn h_refine_elems(&mut self, elem_ids: Vec<usize>) -> Result<(), HRefError> {
        let mut refinements: BTreeSet<usize> = BTreeSet::new();
        for elem_id in elem_ids {
            let elem = self
                .elems
                .get(elem_id)
                .ok_or(HRefError::ElemDoesntExist(elem_id))?;
            check_refineable(elem_id, elem.as_ref())?;

            if !refinements.insert(elem_id) {
                return Err(HRefError::DoubleRefinement(elem_id));
            }
        }

        for elem_id in refinements {
            self.execute_h_refinement(elem_id);
        }

        Ok(())
    }

    fn execute_h_refinement(&mut self, parent_id: usize) {
        let parent = &self.elems[parent_id];
        let elem_type = parent.elem_type();
        let parent_links = parent.links().clone();
        let child_points: Vec<SmallVec<[Point; 8]>> = (0..parent.n_children())
            .map(|c| parent.child_points(c))
            .collect();

        let mut child_ids: SmallVec<[usize; 8]> = SmallVec::new();
        for points in child_points {
            let nodes: Vec<Arc<Node>> = points
                .into_iter()
                .map(|point| {
                    let node_id = self.add_node(point);
                    self.nodes[node_id].clone()
                })
                .collect();

            let child_id = self.elems.len();
            self.elems
                .push(elem_type.build(nodes, ElemLinks::child_of(child_id, &parent_links)));
            child_ids.push(child_id);
        }

        tracing::debug!(
            elem_id = parent_id,
            %elem_type,
            children = ?child_ids,
            "h-refined Elem"
        );

        self.elems[parent_id].links_mut().set_children(child_ids);
    }
}

fn parse_node_information(mesh_json: &JsonValue) -> Result<Vec<Point>, MeshError> {
    if !mesh_json["Nodes"].is_array() {
        return Err(MeshError::Format("Nodes must be an Array!".to_string()));
    }

    mesh_json["Nodes"]
        .members()
        .enumerate()
        .map(|(node_index, json_node)| {
            let json_node_point = if json_node.is_object() {
                &json_node["coords"]
            } else {
                json_node
            };
            let coords: Option<Vec<f64>> = json_node_point.members().map(|c| c.as_f64()).collect();

            match coords.as_deref() {
                Some([x, y, z]) if json_node_point.is_array() => Ok(Point::new(*x, *y, *z)),
                _ => Err(MeshError::Format(format!(
                    "Node {} must be an Array of 3 numerical values!",
                    node_index
                ))),
            }
        })
        .collect()
}

fn parse_elem_information(
    mesh_json: &JsonValue,
) -> Result<Vec<(ElemType, Vec<usize>, SubdomainId)>, MeshError> {
    if !mesh_json["Elems"].is_array() {
        return Err(MeshError::Format("Elems must be an Array!".to_string()));
    }

    mesh_json["Elems"]
        .members()
        .enumerate()
        .filter(|(_, json_elem)| json_elem["active"].as_bool() != Some(false))
        .map(|(elem_index, json_elem)| {
            let elem_type: ElemType = json_elem["type"]
                .as_str()
                .ok_or_else(|| {
                    MeshError::Format(format!("Elem {} must have a type string!", elem_index))
                })?
                .parse()?;

            if !json_elem["nodes"].is_array() {
                return Err(MeshError::Format(format!(
                    "Elem {} must have an Array of nodes!",
                    elem_index
                )));
            }

            let node_ids = json_elem["nodes"]
                .members()
                .map(|node_id| node_id.as_usize())
                .collect::<Option<Vec<usize>>>()
                .ok_or_else(|| {
                    MeshError::Format(format!(
                        "Elem {}'s nodes must be non-negative integers!",
                        elem_index
                    ))
                })?;

            let subdomain_id = if json_elem["subdomain"].is_null() {
                0
            } else {
                json_elem["subdomain"].as_u16().ok_or_else(|| {
                    MeshError::Format(format!(
                        "Elem {}'s subdomain must be an integer in 0..={}!",
                        elem_index,
                        SubdomainId::MAX
                    ))
                })?
            };

            Ok((elem_type, node_ids, subdomain_id))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn two_hexes() -> Mesh {
        Mesh::from_file("./test_input/two_hexes.json").unwrap()
    }

    #[test]
    fn mesh_from_file() {
        let mesh = two_hexes();

        assert_eq!(mesh.nodes.len(), 12);
        assert_eq!(mesh.elems.len(), 2);
        assert_eq!(mesh.elems[0].subdomain_id(), 0);
        assert_eq!(mesh.elems[1].subdomain_id(), 1);
        assert_eq!(mesh.elems[1].id(), Some(1));
        assert!(mesh.elems.iter().all(|elem| elem.elem_type() == ElemType::Hex8));

        assert_relative_eq!(mesh.elem_points(1)[1], Point::new(2.0, 0.0, 0.0));
        assert_relative_eq!(mesh.total_volume().unwrap(), 2.0, epsilon = 1e-12);
        assert!(mesh.validate_geometry().is_empty());
    }

    #[test]
    fn malformed_files() {
        assert!(matches!(
            Mesh::from_json(&json::parse(r#"{ "Nodes": [[0.0, 1.0]], "Elems": [] }"#).unwrap()),
            Err(MeshError::Format(_))
        ));
        assert!(matches!(
            Mesh::from_json(
                &json::parse(r#"{ "Nodes": [[0.0, 0.0, 0.0], [0.0, 0.0, 0.0]], "Elems": [] }"#).unwrap()
            ),
            Err(MeshError::DuplicateNode(1))
        ));
        assert!(matches!(
            Mesh::from_json(
                &json::parse(r#"{ "Nodes": [[0.0, 0.0, 0.0]], "Elems": [{ "type": "TET4", "nodes": [0] }] }"#)
                    .unwrap()
            ),
            Err(MeshError::UnknownElemType(_))
        ));
        assert!(matches!(
            Mesh::from_file("./test_input/does_not_exist.json"),
            Err(MeshError::Io(_))
        ));
    }

    #[test]
    fn add_elems() {
        let mut mesh = Mesh::blank();
        let a = mesh.add_node(Point::new(0.0, 0.0, 0.0));
        let b = mesh.add_node(Point::new(1.0, 0.0, 0.0));
        assert_eq!(mesh.add_node(Point::new(1.0, 0.0, 1e-14)), b);

        assert_eq!(mesh.add_elem(ElemType::Edge2, &[a, b], 2).unwrap(), 0);
        assert!(matches!(
            mesh.add_elem(ElemType::Edge2, &[a, 5], 0),
            Err(MeshError::NodeDoesntExist { node_id: 5, .. })
        ));
        assert!(matches!(
            mesh.add_elem(ElemType::Quad4, &[a, b], 0),
            Err(MeshError::WrongNodeCount { expected: 4, found: 2, .. })
        ));
        assert_eq!(mesh.elems.len(), 1);
        assert!(Arc::ptr_eq(mesh.elems[0].node(1), &mesh.nodes[b]));
    }

    #[test]
    fn neighbors() {
        let mesh = two_hexes();

        let left = mesh.side_neighbors(0).unwrap();
        assert_eq!(left[2], Some(1));
        assert_eq!(left.iter().flatten().count(), 1);

        let right = mesh.side_neighbors(1).unwrap();
        assert_eq!(right[4], Some(0));

        assert!(matches!(mesh.side_neighbors(2), Err(MeshError::ElemDoesntExist(2))));
    }

    #[test]
    fn boundary() {
        let mesh = two_hexes();
        let boundary = mesh.boundary_sides();

        assert_eq!(boundary.len(), 10);
        assert!(!boundary.contains(&(0, 2)));
        assert!(!boundary.contains(&(1, 4)));

        let sides = mesh.extract_boundary();
        assert_eq!(sides.len(), 10);
        assert!(sides.iter().all(|side| side.elem_type() == ElemType::Quad4 && side.id().is_none()));

        let area: f64 = sides.iter().map(|side| side.volume().unwrap()).sum();
        assert_relative_eq!(area, 10.0, epsilon = 1e-12);
    }

    #[test]
    fn basic_h_refinements() {
        let mut mesh = two_hexes();
        mesh.h_refine_elems(vec![0]).unwrap();

        assert_eq!(mesh.elems.len(), 10);
        assert!(!mesh.elems[0].is_active());
        assert_eq!(mesh.active_elems().count(), 9);
        assert_eq!(mesh.descendant_elems(0, false).unwrap(), (2..10).collect::<Vec<_>>());
        assert_eq!(mesh.ancestor_elems(7, true).unwrap(), vec![7, 0]);

        // 27 Nodes on the refined cube, 8 of which already existed
        assert_eq!(mesh.nodes.len(), 12 + 19);

        for child_id in 2..10 {
            let child = &mesh.elems[child_id];
            assert_eq!(child.parent_id(), Some(0));
            assert_eq!(child.subdomain_id(), 0);
            assert_eq!(child.links().level(), 1);
            assert_relative_eq!(child.volume().unwrap(), 0.125, epsilon = 1e-12);
        }

        assert_relative_eq!(mesh.total_volume().unwrap(), 2.0, epsilon = 1e-12);

        // the hanging interface is still interior
        let boundary = mesh.boundary_sides();
        assert_eq!(boundary.len(), 5 * 4 + 5);
        assert!(!boundary.iter().any(|(elem_id, _)| *elem_id == 0));
        let area: f64 = mesh
            .extract_boundary()
            .iter()
            .map(|side| side.volume().unwrap())
            .sum();
        assert_relative_eq!(area, 10.0, epsilon = 1e-12);
    }

    #[test]
    fn refined_neighbors_share_nodes() {
        let mut mesh = two_hexes();
        mesh.global_h_refinement().unwrap();

        assert_eq!(mesh.active_elems().count(), 16);
        // a 4 x 2 x 2 grid of Nodes spaced at 0.5: 5 * 3 * 3
        assert_eq!(mesh.nodes.len(), 45);
        assert_eq!(mesh.boundary_sides().len(), 40);

        // cells on the ends of the 4 x 2 x 2 grid have 3 neighbors, the rest have 4
        let n_neighbors: Vec<usize> = mesh
            .active_elems()
            .map(|(elem_id, _)| mesh.side_neighbors(elem_id).unwrap().iter().flatten().count())
            .collect();
        assert_eq!(n_neighbors.iter().filter(|n| **n == 3).count(), 8);
        assert_eq!(n_neighbors.iter().filter(|n| **n == 4).count(), 8);
    }

    #[test]
    fn h_refinement_errors() {
        let mut mesh = two_hexes();

        assert_eq!(mesh.h_refine_elems(vec![2]), Err(HRefError::ElemDoesntExist(2)));
        assert_eq!(mesh.h_refine_elems(vec![1, 1]), Err(HRefError::DoubleRefinement(1)));
        assert_eq!(mesh.elems.len(), 2);

        mesh.h_refine_elems(vec![1]).unwrap();
        assert_eq!(mesh.h_refine_elems(vec![0, 1]), Err(HRefError::ElemHasChildren(1)));
        assert_eq!(mesh.elems.len(), 10);
        assert!(!mesh.elem_is_h_refineable(1).unwrap());
        assert!(mesh.elem_is_h_refineable(0).unwrap());
    }

    #[test]
    fn max_h_level() {
        let mut mesh = Mesh::blank();
        let a = mesh.add_node(Point::new(0.0, 0.0, 0.0));
        let b = mesh.add_node(Point::new(1.0, 0.0, 0.0));
        mesh.add_elem(ElemType::Edge2, &[a, b], 0).unwrap();

        let mut leaf = 0;
        for _ in 0..h_refinement::MAX_H_LEVEL {
            mesh.h_refine_elems(vec![leaf]).unwrap();
            leaf = mesh.elems.len() - 1;
        }

        assert_eq!(mesh.elems[leaf].links().level(), h_refinement::MAX_H_LEVEL);
        assert_eq!(
            mesh.h_refine_elems(vec![leaf]),
            Err(HRefError::MaxLevelExceeded {
                elem_id: leaf,
                level: h_refinement::MAX_H_LEVEL
            })
        );
    }

    #[test]
    fn infinite_elems() {
        let mut mesh = Mesh::from_file("./test_input/inf_quads.json").unwrap();

        assert_eq!(mesh.elems.len(), 4);
        assert_relative_eq!(mesh.total_volume().unwrap(), 2.0, epsilon = 1e-12);
        assert!(mesh.validate_geometry().is_empty());

        // the infinite quads border the finite ones and each other
        let neighbors = mesh.side_neighbors(2).unwrap();
        assert_eq!(neighbors.as_slice(), &[Some(0), Some(3), None]);
        assert_eq!(mesh.boundary_sides().len(), 6);

        mesh.h_refine_elems(vec![2]).unwrap();
        let children = mesh.elems[2].child_ids().unwrap().to_vec();
        assert_eq!(children, vec![4, 5]);
        assert!(children
            .iter()
            .all(|child| mesh.elems[*child].elem_type() == ElemType::InfQuad4));
        assert_relative_eq!(mesh.elem_points(4)[3], Point::new(0.5, 2.0, 0.0));
        assert_eq!(mesh.boundary_sides().len(), 6);
    }

    #[test]
    fn invalid_geometry_is_reported() {
        let mut mesh = two_hexes();
        let below = mesh.add_node(Point::new(0.0, 0.0, -1.0));
        let mut node_ids: Vec<usize> = mesh.elems[0].nodes().iter().map(|node| node.id).collect();
        node_ids[6] = below;
        mesh.add_elem(ElemType::Hex8, &node_ids, 0).unwrap();

        let invalid = mesh.validate_geometry();
        assert_eq!(invalid.len(), 1);
        assert_eq!(invalid[0].0, 2);
        assert!(matches!(
            invalid[0].1,
            GeometryError::NonPositiveSubVolume { index: 1, .. }
        ));
        assert!(mesh.total_volume().is_err());
    }

    #[test]
    #[cfg(feature = "json_export")]
    fn export_round_trip() {
        let mut mesh = two_hexes();
        mesh.h_refine_elems(vec![1]).unwrap();
        mesh.export_to_json("./test_output/two_hexes_refined.json")
            .unwrap();

        let exported =
            json::parse(&read_to_string("./test_output/two_hexes_refined.json").unwrap()).unwrap();
        assert_eq!(exported["Nodes"].len(), mesh.nodes.len());
        assert_eq!(exported["Elems"].len(), 10);
        assert_eq!(exported["Elems"][1]["active"], false);
        assert_eq!(exported["Elems"][9]["parent"], 1);
        assert_eq!(exported["Elems"][9]["level"], 1);

        // the refined parent is dropped; its children are loaded as base Elems
        let reloaded = Mesh::from_file("./test_output/two_hexes_refined.json").unwrap();
        assert_eq!(reloaded.nodes.len(), mesh.nodes.len());
        assert_eq!(reloaded.elems.len(), 9);
        assert!(reloaded.elems.iter().all(|elem| elem.links().level() == 0));
        assert!(reloaded.elems[1]
            .nodes()
            .iter()
            .zip(mesh.elems[2].nodes())
            .all(|(a, b)| a.id == b.id));
        assert_relative_eq!(reloaded.total_volume().unwrap(), 2.0, epsilon = 1e-12);
        assert!(reloaded.validate_geometry().is_empty());
    }
}
