use crate::elem::ElemType;
use std::fmt;
use thiserror::Error;

/// Interchange formats that `Elem` connectivity can be exported to
///
/// Each format fixes its own Node index base. New formats may be added in future releases.
#[non_exhaustive]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum IoPackage {
    /// 1-based Node indices
    Tecplot,
    /// 0-based Node indices
    Vtk,
    Gmsh,
    Gmv,
    Ucd,
    Tetgen,
    Diva,
}

impl IoPackage {
    /// Offset added to each Node ID on export. `None` if connectivity export is not implemented for this package
    pub fn index_offset(self) -> Option<usize> {
        match self {
            Self::Tecplot => Some(1),
            Self::Vtk => Some(0),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Tecplot => "Tecplot",
            Self::Vtk => "VTK",
            Self::Gmsh => "Gmsh",
            Self::Gmv => "GMV",
            Self::Ucd => "UCD",
            Self::Tetgen => "TetGen",
            Self::Diva => "DIVA",
        }
    }
}

impl fmt::Display for IoPackage {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Packages supported by every shape with a finite linear connectivity
pub(crate) const LINEAR_EXPORT_PACKAGES: [IoPackage; 2] = [IoPackage::Tecplot, IoPackage::Vtk];

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConnectivityError {
    #[error("unsupported IO package {package} for {elem_type} Elems")]
    UnsupportedFormat {
        package: IoPackage,
        elem_type: ElemType,
    },
}
