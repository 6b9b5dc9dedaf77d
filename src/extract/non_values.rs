//! Ids created inline by layouts, menus and other non-values XML.

use super::Resource;
use crate::error::Result;
use crate::pipeline::Context;
use crate::res::tags::GENERATED_ID_PREFIX;
use crate::res::{parse_name, ResourceType};
use crate::xml::XmlEvent;

/// Emits an id for every attribute value of the form `@+id/...`.
pub(crate) fn parse<I>(
    ctx: &Context,
    events: &mut I,
    emit: &mut dyn FnMut(Resource) -> Result<()>,
) -> Result<()>
where
    I: Iterator<Item = XmlEvent>,
{
    for event in events {
        for attr in event.attrs() {
            if !attr.value.starts_with(GENERATED_ID_PREFIX) {
                continue;
            }
            let reference = attr.value.replacen(GENERATED_ID_PREFIX, "@id", 1);
            let fqn = parse_name(&reference, ResourceType::Id).map_err(|e| {
                ctx.error(e.with_prefix(format!("{}: unparsable id attribute: ", attr.value)))
            })?;
            emit(Resource::new(fqn))?;
        }
    }
    Ok(())
}
