//! Resource types, kinds and screen densities.

use crate::error::{Error, Result};
use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// An Android resource type.
///
/// `Values` is a pseudo-type: it names the `values*` directories and never
/// appears in a fully qualified name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ResourceType {
    Values,
    Anim,
    Animator,
    Array,
    Attr,
    AttrPrivate,
    Bool,
    Color,
    ConfigVarying,
    Dimen,
    Drawable,
    Font,
    Fraction,
    Id,
    Integer,
    Interpolator,
    Layout,
    Menu,
    Mipmap,
    Navigation,
    Plurals,
    Raw,
    String,
    Style,
    Styleable,
    Transition,
    Xml,
}

/// Whether a resource type lives in `values*` files, its own files, or both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    Value,
    NonValue,
    Both,
}

impl ResourceType {
    /// Every real resource type, `Values` excluded.
    pub const ALL: [ResourceType; 26] = [
        ResourceType::Anim,
        ResourceType::Animator,
        ResourceType::Array,
        ResourceType::Attr,
        ResourceType::AttrPrivate,
        ResourceType::Bool,
        ResourceType::Color,
        ResourceType::ConfigVarying,
        ResourceType::Dimen,
        ResourceType::Drawable,
        ResourceType::Font,
        ResourceType::Fraction,
        ResourceType::Id,
        ResourceType::Integer,
        ResourceType::Interpolator,
        ResourceType::Layout,
        ResourceType::Menu,
        ResourceType::Mipmap,
        ResourceType::Navigation,
        ResourceType::Plurals,
        ResourceType::Raw,
        ResourceType::String,
        ResourceType::Style,
        ResourceType::Styleable,
        ResourceType::Transition,
        ResourceType::Xml,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ResourceType::Values => "values",
            ResourceType::Anim => "anim",
            ResourceType::Animator => "animator",
            ResourceType::Array => "array",
            ResourceType::Attr => "attr",
            ResourceType::AttrPrivate => "^attr-private",
            ResourceType::Bool => "bool",
            ResourceType::Color => "color",
            ResourceType::ConfigVarying => "configVarying",
            ResourceType::Dimen => "dimen",
            ResourceType::Drawable => "drawable",
            ResourceType::Font => "font",
            ResourceType::Fraction => "fraction",
            ResourceType::Id => "id",
            ResourceType::Integer => "integer",
            ResourceType::Interpolator => "interpolator",
            ResourceType::Layout => "layout",
            ResourceType::Menu => "menu",
            ResourceType::Mipmap => "mipmap",
            ResourceType::Navigation => "navigation",
            ResourceType::Plurals => "plurals",
            ResourceType::Raw => "raw",
            ResourceType::String => "string",
            ResourceType::Style => "style",
            ResourceType::Styleable => "styleable",
            ResourceType::Transition => "transition",
            ResourceType::Xml => "xml",
        }
    }

    pub fn kind(self) -> Kind {
        match self {
            ResourceType::Anim
            | ResourceType::Animator
            | ResourceType::Drawable
            | ResourceType::Font
            | ResourceType::Interpolator
            | ResourceType::Layout
            | ResourceType::Menu
            | ResourceType::Mipmap
            | ResourceType::Navigation
            | ResourceType::Raw
            | ResourceType::Transition
            | ResourceType::Xml => Kind::NonValue,
            ResourceType::Color => Kind::Both,
            _ => Kind::Value,
        }
    }

    /// Parses a real resource type name. `values` is rejected.
    pub fn parse(s: &str) -> Result<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| Error::UnknownType(s.to_string()))
    }

    /// Like [`ResourceType::parse`] but also accepts the `values` pseudo-type.
    pub fn parse_value_or_type(s: &str) -> Result<Self> {
        if s == ResourceType::Values.as_str() {
            return Ok(ResourceType::Values);
        }
        Self::parse(s)
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResourceType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl Serialize for ResourceType {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Screen density qualifier, in dots per inch.
///
/// Zero means no density qualifier was present. `ANY` and `NONE` are the
/// `anydpi` and `nodpi` sentinels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Density(pub u16);

impl Density {
    pub const UNSPECIFIED: Density = Density(0);
    pub const LDPI: Density = Density(120);
    pub const MDPI: Density = Density(160);
    pub const TVDPI: Density = Density(213);
    pub const HDPI: Density = Density(240);
    pub const XHDPI: Density = Density(320);
    pub const XXHDPI: Density = Density(480);
    pub const XXXHDPI: Density = Density(640);
    pub const ANY: Density = Density(0xfffe);
    pub const NONE: Density = Density(0xffff);

    /// Parses a single qualifier segment.
    ///
    /// Segments that are not density qualifiers yield `UNSPECIFIED`; a
    /// `<N>dpi` segment with a bad number is an error.
    pub fn parse(segment: &str) -> Result<Density> {
        let known = match segment {
            "ldpi" => Some(Density::LDPI),
            "mdpi" => Some(Density::MDPI),
            "tvdpi" => Some(Density::TVDPI),
            "hdpi" => Some(Density::HDPI),
            "xhdpi" => Some(Density::XHDPI),
            "xxhdpi" => Some(Density::XXHDPI),
            "xxxhdpi" => Some(Density::XXXHDPI),
            "anydpi" => Some(Density::ANY),
            "nodpi" => Some(Density::NONE),
            _ => None,
        };
        if let Some(density) = known {
            return Ok(density);
        }
        match segment.strip_suffix("dpi") {
            Some(number) => number.parse::<u16>().map(Density).map_err(|source| Error::Density {
                value: segment.to_string(),
                source,
            }),
            None => Ok(Density::UNSPECIFIED),
        }
    }

    pub fn is_specified(self) -> bool {
        self != Density::UNSPECIFIED
    }
}
