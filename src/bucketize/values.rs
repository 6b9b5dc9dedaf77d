//! Cuts a values file into one serialized payload per declaration.

use crate::error::{Error, Result};
use crate::pipeline::Context;
use crate::res::tags::{self, required_attr, NAME_ATTR, TYPE_ATTR};
use crate::res::{parse_name, FullyQualifiedName, ResourcePath, ResourceType};
use crate::xml::{forward_children, stream_document, Attr, Encoder, StartElement, Token, XmlEvent};
use std::fs::File;
use std::io::{self, BufRead, BufReader, Sink};

/// The serialized declaration of one resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValuesResource {
    pub source: ResourcePath,
    pub name: FullyQualifiedName,
    pub payload: Vec<u8>,
}

/// An attribute of the `<resources>` tag, namespace declarations included.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceRootAttribute {
    pub source: ResourcePath,
    pub attribute: Attr,
}

/// What a values file yields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Collected {
    Value(ValuesResource),
    Attribute(ResourceRootAttribute),
}

/// Reads `source` from disk and emits what it declares.
pub fn parse_file(ctx: &Context, source: &ResourcePath, emit: &mut dyn FnMut(Collected) -> Result<()>) -> Result<()> {
    let ctx = ctx.prefixed(format!("{} values-parse: ", source.path.display()));
    let file = File::open(&source.path).map_err(|err| ctx.error(Error::io("open failed", &source.path, err)))?;
    parse_document(&ctx, source, BufReader::new(file), emit)
}

/// Emits the root attributes and declarations of a values document.
pub fn parse_document<R: BufRead>(
    ctx: &Context,
    source: &ResourcePath,
    reader: R,
    emit: &mut dyn FnMut(Collected) -> Result<()>,
) -> Result<()> {
    let mut events = stream_document(reader).strict();
    let parsed = parse_values(ctx, source, &mut events, emit);
    if let Some(err) = events.take_error() {
        return Err(ctx.error(err.with_prefix("token failed: ")));
    }
    parsed
}

/// Everything up to and including the first `<resources>` start tag goes
/// through a shadow encoder, so that payload encoders can inherit the
/// namespace bindings in force at each declaration. Later `<resources>`
/// blocks are ignored.
pub fn parse_values<I>(
    ctx: &Context,
    source: &ResourcePath,
    events: &mut I,
    emit: &mut dyn FnMut(Collected) -> Result<()>,
) -> Result<()>
where
    I: Iterator<Item = XmlEvent>,
{
    let mut shadow = Encoder::new(io::sink());
    while let Some(event) = events.next() {
        shadow
            .encode_token(&event.token)
            .map_err(|e| ctx.error(e.with_prefix("encoding token failed: ")))?;
        let Token::Start(start) = &event.token else {
            continue;
        };
        if !tags::is_resources(&start.name) {
            continue;
        }

        for attribute in &start.attrs {
            emit(Collected::Attribute(ResourceRootAttribute {
                source: source.clone(),
                attribute: attribute.clone(),
            }))?;
        }
        let mut children = forward_children(start, events);
        parse_declarations(ctx, &mut shadow, source, &mut children, emit)?;
        if !children.is_closed() {
            return Err(ctx.error(unclosed(start, event.offset)));
        }
        return Ok(());
    }
    Ok(())
}

fn parse_declarations<I>(
    ctx: &Context,
    shadow: &mut Encoder<Sink>,
    source: &ResourcePath,
    events: &mut I,
    emit: &mut dyn FnMut(Collected) -> Result<()>,
) -> Result<()>
where
    I: Iterator<Item = XmlEvent>,
{
    while let Some(event) = events.next() {
        let Token::Start(start) = &event.token else {
            continue;
        };
        let mut children = forward_children(start, events);
        if tags::is_skipped(&start.name) {
            children.skip_rest();
            continue;
        }

        let name = declaration_name(start)
            .map_err(|e| ctx.error(e.with_prefix("extract name and type failed: ")))?;
        let styleable = name.res_type == ResourceType::Styleable;
        let end = Token::End(start.end());

        let mut payload = Encoder::child(Vec::new(), shadow);
        let mut nested = Vec::new();
        let mut encode = |token: &Token| {
            payload
                .encode_token(token)
                .map_err(|e| ctx.error(e.with_prefix("extracting element failed: ")))
        };
        encode(&event.token)?;
        for child in children.by_ref() {
            encode(&child.token)?;
            if styleable {
                nested.push(child);
            }
        }
        if !children.is_closed() {
            return Err(ctx.error(unclosed(start, event.offset)));
        }
        encode(&end)?;

        emit(Collected::Value(ValuesResource {
            source: source.clone(),
            name,
            payload: payload.into_inner(),
        }))?;

        // Attrs inside a styleable are declarations of their own.
        if styleable {
            shadow.encode_token(&event.token)?;
            parse_declarations(ctx, shadow, source, &mut nested.into_iter(), emit)?;
            shadow.encode_token(&end)?;
        }
    }
    Ok(())
}

fn declaration_name(start: &StartElement) -> Result<FullyQualifiedName> {
    if tags::is_item(&start.name) {
        let name = required_attr(start, NAME_ATTR)?;
        let res_type = ResourceType::parse(required_attr(start, TYPE_ATTR)?)?;
        return parse_name(name, res_type);
    }
    let name = required_attr(start, NAME_ATTR)?;
    match tags::declared_type(&start.name.local) {
        Some(res_type) => parse_name(name, res_type),
        None => Err(Error::UnhandledTag(start.name.local.clone())),
    }
}

fn unclosed(start: &StartElement, offset: usize) -> Error {
    Error::Truncated { offset, open: 1 }.with_prefix(format!("<{}>: ", start.name))
}
