//! Well-known tags and attributes of Android resource XML.

use super::types::ResourceType;
use crate::error::{Error, Result};
use crate::xml::{Name, StartElement};

/// Namespace of `android:` attributes.
pub const ANDROID_NAMESPACE: &str = "http://schemas.android.com/apk/res/android";

pub const RESOURCES_TAG: &str = "resources";
pub const ITEM_TAG: &str = "item";
pub const ENUM_TAG: &str = "enum";
pub const FLAG_TAG: &str = "flag";
pub const NAME_ATTR: &str = "name";
pub const TYPE_ATTR: &str = "type";

/// Attribute values starting with this declare a new id.
pub const GENERATED_ID_PREFIX: &str = "@+id";

/// Resource type declared by a direct child of `<resources>`.
pub fn declared_type(tag: &str) -> Option<ResourceType> {
    let t = match tag {
        "array" | "integer-array" | "string-array" => ResourceType::Array,
        "attr" => ResourceType::Attr,
        "^attr-private" => ResourceType::AttrPrivate,
        "bool" => ResourceType::Bool,
        "color" => ResourceType::Color,
        "configVarying" => ResourceType::ConfigVarying,
        "dimen" => ResourceType::Dimen,
        "drawable" => ResourceType::Drawable,
        "fraction" => ResourceType::Fraction,
        "id" => ResourceType::Id,
        "integer" => ResourceType::Integer,
        "layout" => ResourceType::Layout,
        "plurals" => ResourceType::Plurals,
        "string" => ResourceType::String,
        "style" => ResourceType::Style,
        "declare-styleable" => ResourceType::Styleable,
        _ => return None,
    };
    Some(t)
}

/// Children of `<resources>` that never declare anything.
pub fn is_skipped(name: &Name) -> bool {
    name.space.is_empty() && matches!(name.local.as_str(), "skip" | "eat-comment" | "public")
}

pub fn is_resources(name: &Name) -> bool {
    name.strict_matches(&Name::local(RESOURCES_TAG))
}

pub fn is_item(name: &Name) -> bool {
    name.sloppy_matches(&Name::local(ITEM_TAG))
}

/// Non-empty value of attribute `attr`, matched without regard to its
/// namespace.
pub fn required_attr<'s>(start: &'s StartElement, attr: &'static str) -> Result<&'s str> {
    start
        .attr(&Name::local(attr))
        .filter(|value| !value.is_empty())
        .ok_or_else(|| Error::MissingAttribute {
            tag: start.name.to_string(),
            attr,
        })
}

/// `<enum>` and `<flag>` children of an `<attr>` declare ids.
pub fn is_enum_or_flag(name: &Name) -> bool {
    name.sloppy_matches(&Name::local(ENUM_TAG)) || name.sloppy_matches(&Name::local(FLAG_TAG))
}
