//! Resource identity: types, densities, paths and fully qualified names.

pub mod naming;
pub mod path;
pub mod tags;
pub mod types;

pub use naming::{parse_name, FullyQualifiedName, ANDROID_PACKAGE, RES_AUTO};
pub use path::{make_paths, parse_path, ResourcePath};
pub use types::{Density, Kind, ResourceType};
