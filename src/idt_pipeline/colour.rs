//! Colour science module
//!
//! Colour spaces, chromatic adaptation, colour-difference metrics and the
//! reference colour-checker data the characterisation is anchored against.

pub mod adaptation;
pub mod delta_e;
pub mod illuminant;
pub mod reference;
pub mod spaces;

pub use adaptation::{ChromaticAdaptation, adaptation_matrix};
pub use delta_e::{delta_e_2000, euclidean_delta_e};
pub use illuminant::Illuminant;
pub use reference::{ReferenceColourChecker, ReferenceColourCheckerId, ReferencePatch};
pub use spaces::{
    ACES_WHITE_XY, D50_XY, OptimisationSpace, aces_rgb_to_xyz, aces_xyz_to_rgb, xy_to_xyz,
    xyy_to_xyz, xyz_to_ipt, xyz_to_lab, xyz_to_oklab,
};
