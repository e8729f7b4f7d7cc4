use crate::elem::{Elem, ElemType};
use thiserror::Error;

/// Maximum number of h-refinement layers below the base mesh. Refinements fail once an `Elem` reaches this level.
pub const MAX_H_LEVEL: u8 = 16;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HRefError {
    #[error("Elem {0} doesn't exist; cannot apply h-refinement!")]
    ElemDoesntExist(usize),
    #[error("Elem {0} has already been h-refined!")]
    ElemHasChildren(usize),
    #[error("Elem {elem_id} is a {elem_type}, which cannot be h-refined!")]
    NotRefinable { elem_id: usize, elem_type: ElemType },
    #[error("Elem {elem_id} is at h-level {level}; cannot refine past level {}!", MAX_H_LEVEL)]
    MaxLevelExceeded { elem_id: usize, level: u8 },
    #[error("Elem {0} was listed more than once in a single h-refinement!")]
    DoubleRefinement(usize),
}

/// Check that `elem` can be split into children
pub(crate) fn check_refineable(elem_id: usize, elem: &dyn Elem) -> Result<(), HRefError> {
    if elem.has_children() {
        Err(HRefError::ElemHasChildren(elem_id))
    } else if elem.topology().embedding.is_none() {
        Err(HRefError::NotRefinable {
            elem_id,
            elem_type: elem.elem_type(),
        })
    } else if elem.links().level() >= MAX_H_LEVEL {
        Err(HRefError::MaxLevelExceeded {
            elem_id,
            level: elem.links().level(),
        })
    } else {
        Ok(())
    }
}

/// The side of a parent `Elem` that side `child_side` of child `c` lies on (if any)
///
/// A child side lies on a parent side when every one of its Nodes is interpolated from that parent side's Nodes alone.
/// Child sides interior to the parent return `None`.
pub(crate) fn parent_side_of(parent: &dyn Elem, c: usize, child_side: usize) -> Option<usize> {
    let embedding = parent.embedding();
    let child_side_nodes = parent.elem_type().topology().side_nodes(child_side);

    (0..parent.n_sides()).find(|parent_side| {
        let parent_side_nodes = parent.topology().side_nodes(*parent_side);
        child_side_nodes.iter().all(|child_node| {
            embedding
                .row(c, *child_node)
                .iter()
                .enumerate()
                .all(|(parent_node, weight)| *weight == 0.0 || parent_side_nodes.contains(&parent_node))
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::elem::test_utils::*;

    #[test]
    fn hex_child_sides() {
        let hex = unit_cube();

        // child 0 sits in the corner of vertex 0, which joins sides 0, 1 and 4
        assert_eq!(parent_side_of(&hex, 0, 0), Some(0));
        assert_eq!(parent_side_of(&hex, 0, 1), Some(1));
        assert_eq!(parent_side_of(&hex, 0, 4), Some(4));
        assert_eq!(parent_side_of(&hex, 0, 2), None);
        assert_eq!(parent_side_of(&hex, 0, 5), None);

        // child 6 sits in the corner of vertex 7
        assert_eq!(parent_side_of(&hex, 6, 5), Some(5));
        assert_eq!(parent_side_of(&hex, 6, 3), Some(3));
        assert_eq!(parent_side_of(&hex, 6, 0), None);
    }

    #[test]
    fn inf_quad_child_sides() {
        let elems = sample_elems();
        let inf_quad = elems[4].as_ref();

        assert_eq!(parent_side_of(inf_quad, 0, 0), Some(0));
        assert_eq!(parent_side_of(inf_quad, 0, 2), Some(2));
        assert_eq!(parent_side_of(inf_quad, 0, 1), None);
        assert_eq!(parent_side_of(inf_quad, 1, 1), Some(1));
    }

    #[test]
    fn refineability() {
        let elems = sample_elems();
        assert_eq!(check_refineable(5, elems[5].as_ref()), Ok(()));
        assert_eq!(
            check_refineable(2, elems[2].as_ref()),
            Err(HRefError::NotRefinable {
                elem_id: 2,
                elem_type: ElemType::InfEdge2
            })
        );
    }
}
