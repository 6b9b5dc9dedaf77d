//! Names declared in `values*` documents.

use super::Resource;
use crate::error::{Error, Result};
use crate::pipeline::Context;
use crate::res::tags::{self, required_attr, NAME_ATTR, RESOURCES_TAG, TYPE_ATTR};
use crate::res::{parse_name, ResourceType, ANDROID_PACKAGE};
use crate::xml::{consume_until, forward_children, Name, StartElement, Token, XmlEvent};

/// Emits every resource declared by the first `<resources>` block.
///
/// Later `<resources>` blocks are ignored, which is what the platform
/// resource compiler does too.
pub(crate) fn parse<I>(
    ctx: &Context,
    events: &mut I,
    emit: &mut dyn FnMut(Resource) -> Result<()>,
) -> Result<()>
where
    I: Iterator<Item = XmlEvent>,
{
    let Some(root) = consume_until(&Name::local(RESOURCES_TAG), events) else {
        return Ok(());
    };
    let Token::Start(root) = root.token else {
        return Ok(());
    };

    let mut children = forward_children(&root, events);
    while let Some(event) = children.next() {
        // Only start elements declare anything.
        let Token::Start(start) = &event.token else {
            continue;
        };
        let ctx = ctx.prefixed(format!("tag-name: {} at: {}: ", start.name, event.offset));
        let mut tag_children = forward_children(start, &mut children);
        if let Some(res_type) = tags::declared_type(&start.name.local) {
            declaration(&ctx, start, res_type, &mut tag_children, emit)?;
        } else if tags::is_item(&start.name) {
            item(&ctx, start, emit)?;
        }
        tag_children.skip_rest();
    }
    Ok(())
}

fn declaration<I>(
    ctx: &Context,
    start: &StartElement,
    res_type: ResourceType,
    children: &mut I,
    emit: &mut dyn FnMut(Resource) -> Result<()>,
) -> Result<()>
where
    I: Iterator<Item = XmlEvent>,
{
    let name = required_attr(start, NAME_ATTR).map_err(|e| ctx.error(e))?;
    let fqn = parse_name(name, res_type)
        .map_err(|e| ctx.error(e.with_prefix(format!("{}: invalid name: ", name))))?;

    let styleable_attrs = match fqn.res_type {
        ResourceType::Styleable => Some(styleable_children(ctx, children, emit)?),
        ResourceType::Attr => {
            attr_children(ctx, children, emit)?;
            None
        }
        _ => None,
    };
    emit(Resource {
        name: fqn,
        styleable_attrs,
    })
}

/// `<item name="..." type="..."/>` directly under `<resources>`.
fn item(ctx: &Context, start: &StartElement, emit: &mut dyn FnMut(Resource) -> Result<()>) -> Result<()> {
    let name = required_attr(start, NAME_ATTR).map_err(|e| ctx.error(e))?;
    let type_value = required_attr(start, TYPE_ATTR).map_err(|e| ctx.error(e))?;
    let res_type = ResourceType::parse(type_value).map_err(|e| ctx.error(e))?;
    let fqn = parse_name(name, res_type)
        .map_err(|e| ctx.error(e.with_prefix(format!("{:?} / type: {}: ", name, res_type))))?;
    emit(Resource::new(fqn))
}

/// `<enum>` and `<flag>` beneath an `<attr>` each declare an id.
fn attr_children<I>(ctx: &Context, children: &mut I, emit: &mut dyn FnMut(Resource) -> Result<()>) -> Result<()>
where
    I: Iterator<Item = XmlEvent>,
{
    for event in children {
        let Some(start) = event.as_start() else {
            continue;
        };
        if !tags::is_enum_or_flag(&start.name) {
            continue;
        }
        let name = required_attr(start, NAME_ATTR).map_err(|e| ctx.error(e))?;
        let fqn = parse_name(name, ResourceType::Id).map_err(|e| ctx.error(e))?;
        emit(Resource::new(fqn))?;
    }
    Ok(())
}

/// Every named child of a `<declare-styleable>` is an attr. Platform attrs
/// are listed but not declared again.
fn styleable_children<I>(
    ctx: &Context,
    children: &mut I,
    emit: &mut dyn FnMut(Resource) -> Result<()>,
) -> Result<Vec<String>>
where
    I: Iterator<Item = XmlEvent>,
{
    let mut attrs = Vec::new();
    while let Some(event) = children.next() {
        let Some(start) = event.as_start() else {
            continue;
        };
        let Ok(name) = required_attr(start, NAME_ATTR) else {
            continue;
        };
        let fqn = parse_name(name, ResourceType::Attr)
            .map_err(|e| ctx.error(e.with_prefix(format!("{:?}: could not parse name to fqn: ", name))))?;
        if fqn.res_type != ResourceType::Attr {
            return Err(ctx.error(Error::WrongType {
                expected: ResourceType::Attr,
                found: fqn.to_string(),
            }));
        }
        attrs.push(fqn.to_string());

        let mut attr_events = forward_children(start, children);
        if fqn.package == ANDROID_PACKAGE {
            attr_events.skip_rest();
            continue;
        }
        let ctx = ctx.prefixed(format!("{:?}: <attr> child: ", name));
        attr_children(&ctx, &mut attr_events, emit)?;
        emit(Resource::new(fqn))?;
    }
    Ok(attrs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xml::stream_document;

    fn names(doc: &str) -> Result<Vec<String>> {
        let mut got = Vec::new();
        let mut events = stream_document(doc.as_bytes());
        parse(&Context::new(), &mut events, &mut |r| {
            got.push(r.name.to_string());
            Ok(())
        })?;
        events.finish()?;
        Ok(got)
    }

    #[test]
    fn test_simple_declarations() {
        let doc = r#"<resources>
            <integer name='two'>2</integer>
            <string name='embedded_stuff'>hi <b>there</b></string>
            <fraction name='frac'>12dp</fraction>
            <item type='id' name='foo'/>
            <id name='two'/>
            <bool name='on'>true</bool>
        </resources>"#;
        assert_eq!(
            names(doc).unwrap(),
            vec![
                "res-auto:integer/two",
                "res-auto:string/embedded_stuff",
                "res-auto:fraction/frac",
                "res-auto:id/foo",
                "res-auto:id/two",
                "res-auto:bool/on",
            ]
        );
    }

    #[test]
    fn test_attr_enums_come_first() {
        let doc = r#"<resources>
            <color name='red'>#fff</color>
            <item name='hundred' type='dimen'>100%</item>
            <attr name="custom">
                <enum name="cars" value="21"/>
                <enum name="planes" value="42"/>
            </attr>
            <eat-comment/>
            <!-- a comment -->
            <attr name='textSize'/>
            <attr name='touch'>
                <flag name="tap" value="0"/>
            </attr>
            <integer-array name='five'><item>1</item></integer-array>
        </resources>"#;
        assert_eq!(
            names(doc).unwrap(),
            vec![
                "res-auto:color/red",
                "res-auto:dimen/hundred",
                "res-auto:id/cars",
                "res-auto:id/planes",
                "res-auto:attr/custom",
                "res-auto:attr/textSize",
                "res-auto:id/tap",
                "res-auto:attr/touch",
                "res-auto:array/five",
            ]
        );
    }

    #[test]
    fn test_styleable_children() {
        let doc = r#"<resources>
            <declare-styleable name='absPieChart'>
                <attr name='android:gravity'/>
                <attr name='local' format='string'/>
                <attr name='overlay'>
                    <flag name="transparent" value="0"/>
                    <flag name="awesome" value="2"/>
                </attr>
            </declare-styleable>
        </resources>"#;
        assert_eq!(
            names(doc).unwrap(),
            vec![
                "res-auto:attr/local",
                "res-auto:id/transparent",
                "res-auto:id/awesome",
                "res-auto:attr/overlay",
                "res-auto:styleable/absPieChart",
            ]
        );

        let mut styleable = None;
        let mut events = stream_document(doc.as_bytes());
        parse(&Context::new(), &mut events, &mut |r| {
            if r.styleable_attrs.is_some() {
                styleable = r.styleable_attrs;
            }
            Ok(())
        })
        .unwrap();
        assert_eq!(
            styleable.unwrap(),
            vec![
                "android:attr/gravity",
                "res-auto:attr/local",
                "res-auto:attr/overlay",
            ]
        );
    }

    #[test]
    fn test_only_first_resources_block() {
        let doc = r#"<resources><string name="a">x</string></resources>
            <resources><string name="b">y</string></resources>"#;
        let mut got = Vec::new();
        let mut events = stream_document(doc.as_bytes());
        parse(&Context::new(), &mut events, &mut |r| {
            got.push(r.name.name);
            Ok(())
        })
        .unwrap();
        assert_eq!(got, vec!["a"]);
    }

    #[test]
    fn test_missing_name_is_an_error() {
        let err = names("<resources><string>2</string></resources>").unwrap_err();
        let msg = err.to_string();
        assert!(msg.starts_with("tag-name: string at: "), "{msg}");
        assert!(msg.contains("missing \"name\" attribute"), "{msg}");
    }

    #[test]
    fn test_item_needs_type() {
        let err = names(r#"<resources><item name="x">1</item></resources>"#).unwrap_err();
        assert!(err.to_string().contains("missing \"type\" attribute"));

        let err = names(r#"<resources><item name="x" type="bogus"/></resources>"#).unwrap_err();
        assert!(err.to_string().contains("bogus: unknown type"));
    }

    #[test]
    fn test_unknown_tags_are_ignored() {
        assert_eq!(
            names(r#"<resources><public name="x" type="string"/><foo name="y"/></resources>"#).unwrap(),
            Vec::<String>::new()
        );
    }

    #[test]
    fn test_no_resources_tag() {
        assert!(names("<LinearLayout/>").unwrap().is_empty());
    }
}
