//! Fully qualified resource names.

use super::types::ResourceType;
use crate::error::{Error, Result};
use serde::Serialize;
use std::fmt;

/// Package assigned to names that do not carry one.
pub const RES_AUTO: &str = "res-auto";

/// Package of the platform resources.
pub const ANDROID_PACKAGE: &str = "android";

/// `package:type/name`, the canonical identity of a resource.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct FullyQualifiedName {
    pub package: String,
    #[serde(rename = "type")]
    pub res_type: ResourceType,
    pub name: String,
}

impl FullyQualifiedName {
    pub fn new(package: impl Into<String>, res_type: ResourceType, name: impl Into<String>) -> Self {
        Self {
            package: package.into(),
            res_type,
            name: name.into(),
        }
    }
}

impl fmt::Display for FullyQualifiedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}/{}", self.package, self.res_type, self.name)
    }
}

/// Parses a resource reference or declaration name.
///
/// Accepted shapes, each optionally led by `@` or `?`:
/// `name`, `pkg:name`, `type/name`, `pkg:type/name` and the legacy
/// `type/pkg:name`. `context` supplies the type when the text has none;
/// passing [`ResourceType::Values`] means no type is known.
pub fn parse_name(raw: &str, context: ResourceType) -> Result<FullyQualifiedName> {
    let mut rest = raw;
    if rest.len() > 2 && (rest.starts_with('@') || rest.starts_with('?')) {
        rest = &rest[1..];
    }

    let pkg_idx = rest.find(':');
    let type_idx = rest.find('/');
    if pkg_idx == Some(0) || type_idx == Some(0) {
        return Err(Error::MalformedName(raw.to_string()));
    }

    let mut res_type = context;
    let mut package = "";
    let name;
    match (pkg_idx, type_idx) {
        (Some(p), Some(t)) if p < t => {
            res_type = ResourceType::parse(&rest[p + 1..t])?;
            package = &rest[..p];
            name = &rest[t + 1..];
        }
        (Some(p), Some(t)) => {
            res_type = ResourceType::parse(&rest[..t])?;
            package = &rest[t + 1..p];
            // A package never holds a '/', or the name would not print back.
            if package.contains('/') {
                return Err(Error::MalformedName(raw.to_string()));
            }
            name = &rest[p + 1..];
        }
        (None, Some(t)) => {
            res_type = ResourceType::parse(&rest[..t])?;
            name = &rest[t + 1..];
        }
        (Some(p), None) => {
            package = &rest[..p];
            name = &rest[p + 1..];
        }
        (None, None) => name = rest,
    }

    if res_type == ResourceType::Values {
        return Err(Error::UndeterminedType {
            raw: raw.to_string(),
            context,
        });
    }
    if name.is_empty() {
        return Err(Error::UndeterminedName {
            raw: raw.to_string(),
            context,
        });
    }

    Ok(FullyQualifiedName {
        package: if package.is_empty() { RES_AUTO } else { package }.to_string(),
        res_type,
        name: name.to_string(),
    })
}
