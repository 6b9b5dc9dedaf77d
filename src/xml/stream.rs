//! Pull-based XML event streams.
//!
//! [`XmlStream`] decodes a document lazily into owned [`XmlEvent`]s.
//! [`forward_children`] narrows any event iterator to the descendants of
//! one element; the parent iterator resumes right after that element once
//! the returned view has been exhausted.

use super::token::{Attr, EndElement, Name, StartElement, Token, XmlEvent, XMLNS};
use crate::error::{Error, Result};
use quick_xml::escape::unescape;
use quick_xml::events::Event;
use quick_xml::name::ResolveResult;
use quick_xml::NsReader;
use std::io::BufRead;
use tracing::trace;

/// Streams the tokens of one document.
///
/// Iteration ends at end of input or at the first decode error. The error
/// is kept and must be collected with [`XmlStream::take_error`] or
/// [`XmlStream::finish`].
///
/// By default an entity reference that cannot be resolved is kept as
/// literal text and the references around it are still decoded. A
/// [`strict`](XmlStream::strict) stream treats it as a decode error.
pub struct XmlStream<R: BufRead> {
    reader: NsReader<R>,
    buf: Vec<u8>,
    error: Option<Error>,
    open: usize,
    strict: bool,
    done: bool,
}

/// Starts streaming `reader` as an XML document.
pub fn stream_document<R: BufRead>(reader: R) -> XmlStream<R> {
    let mut reader = NsReader::from_reader(reader);
    reader
        .expand_empty_elements(true)
        .trim_text(false)
        .check_end_names(true);
    XmlStream {
        reader,
        buf: Vec::new(),
        error: None,
        open: 0,
        strict: false,
        done: false,
    }
}

impl<R: BufRead> XmlStream<R> {
    /// Fails on unresolvable entity references instead of keeping them.
    pub fn strict(mut self) -> Self {
        self.strict = true;
        self
    }

    /// The decode error that ended the stream, if any. Reported once.
    pub fn take_error(&mut self) -> Option<Error> {
        self.error.take()
    }

    /// Consumes the stream, surfacing a pending decode error.
    pub fn finish(mut self) -> Result<()> {
        match self.take_error() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn read_event(&mut self) -> Result<Option<XmlEvent>> {
        self.buf.clear();
        let (resolved, event) = match self.reader.read_resolved_event_into(&mut self.buf) {
            Ok(read) => read,
            Err(source) => {
                return Err(Error::Decode {
                    offset: self.reader.buffer_position(),
                    source,
                })
            }
        };
        let space = namespace_of(resolved);
        let offset = self.reader.buffer_position();

        let token = match event {
            Event::Start(e) | Event::Empty(e) => {
                let mut attrs = Vec::new();
                for attr in e.attributes().with_checks(false) {
                    let attr = attr.map_err(|err| Error::Decode {
                        offset,
                        source: err.into(),
                    })?;
                    let key = attr.key.as_ref();
                    let name = if key == XMLNS.as_bytes() {
                        Name::local(XMLNS)
                    } else if let Some(prefix) = key.strip_prefix(b"xmlns:") {
                        Name::new(XMLNS, lossy(prefix))
                    } else {
                        let (resolved, local) = self.reader.resolve_attribute(attr.key);
                        Name::new(namespace_of(resolved), lossy(local.as_ref()))
                    };
                    let value = match attr.unescape_value() {
                        Ok(value) => value.into_owned(),
                        Err(source) if self.strict => return Err(Error::Decode { offset, source }),
                        Err(_) => unescape_lenient(&lossy(&attr.value)),
                    };
                    attrs.push(Attr { name, value });
                }
                self.open += 1;
                Token::Start(StartElement {
                    name: Name::new(space, lossy(e.local_name().as_ref())),
                    attrs,
                })
            }
            Event::End(e) => {
                self.open = self.open.saturating_sub(1);
                Token::End(EndElement {
                    name: Name::new(space, lossy(e.local_name().as_ref())),
                })
            }
            Event::Text(e) => match e.unescape() {
                Ok(text) => Token::Text(text.into_owned()),
                Err(source) if self.strict => return Err(Error::Decode { offset, source }),
                Err(_) => Token::Text(unescape_lenient(&lossy(&e))),
            },
            Event::CData(e) => Token::CData(lossy(&e)),
            Event::Comment(e) => Token::Comment(lossy(&e)),
            Event::PI(e) => Token::ProcInst(lossy(&e)),
            Event::Decl(e) => Token::ProcInst(lossy(&e)),
            Event::DocType(e) => Token::DocType(lossy(&e)),
            Event::Eof if self.open > 0 => {
                return Err(Error::Truncated {
                    offset,
                    open: self.open,
                })
            }
            Event::Eof => return Ok(None),
        };
        Ok(Some(XmlEvent { token, offset }))
    }
}

impl<R: BufRead> Iterator for XmlStream<R> {
    type Item = XmlEvent;

    fn next(&mut self) -> Option<XmlEvent> {
        if self.done {
            return None;
        }
        match self.read_event() {
            Ok(Some(event)) => Some(event),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(err) => {
                trace!("xml stream stopped: {}", err);
                self.done = true;
                self.error = Some(err);
                None
            }
        }
    }
}

fn lossy(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

/// Resolves entity references one at a time, keeping the ones that do
/// not resolve as written.
fn unescape_lenient(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let tail = &rest[amp..];
        let semi = tail.find(';');
        let next_amp = tail[1..].find('&').map(|i| i + 1);
        match semi {
            Some(semi) if next_amp.map_or(true, |next| semi < next) => {
                let reference = &tail[..=semi];
                match unescape(reference) {
                    Ok(text) => out.push_str(&text),
                    Err(_) => out.push_str(reference),
                }
                rest = &tail[semi + 1..];
            }
            _ => {
                out.push('&');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

/// Unknown prefixes surface as the prefix text itself.
fn namespace_of(resolved: ResolveResult<'_>) -> String {
    match resolved {
        ResolveResult::Bound(ns) => lossy(ns.as_ref()),
        ResolveResult::Unknown(prefix) => lossy(&prefix),
        ResolveResult::Unbound => String::new(),
    }
}

/// Skips events until a start element sloppily matching `name`.
///
/// Returns `None` when the iterator runs dry first.
pub fn consume_until<I>(name: &Name, events: &mut I) -> Option<XmlEvent>
where
    I: Iterator<Item = XmlEvent>,
{
    events.find(|event| matches!(&event.token, Token::Start(s) if s.name.sloppy_matches(name)))
}

/// Yields the descendants of `start`, which must be the element the
/// iterator just produced.
///
/// The closing tag of `start` is consumed but not yielded. Callers must
/// drain the view before reading from `events` again.
pub fn forward_children<'a, I>(start: &StartElement, events: &'a mut I) -> Children<'a, I>
where
    I: Iterator<Item = XmlEvent>,
{
    Children {
        events,
        name: start.name.clone(),
        depth: 1,
        done: false,
        closed: false,
    }
}

pub struct Children<'a, I> {
    events: &'a mut I,
    name: Name,
    depth: usize,
    done: bool,
    closed: bool,
}

impl<I> Children<'_, I>
where
    I: Iterator<Item = XmlEvent>,
{
    /// Drains what is left of the subtree.
    pub fn skip_rest(&mut self) {
        for _ in self.by_ref() {}
    }

    /// True once the closing tag of the element has been read. A view that
    /// ran out of events without it belongs to a truncated document.
    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

impl<I> Iterator for Children<'_, I>
where
    I: Iterator<Item = XmlEvent>,
{
    type Item = XmlEvent;

    fn next(&mut self) -> Option<XmlEvent> {
        if self.done {
            return None;
        }
        let Some(event) = self.events.next() else {
            self.done = true;
            return None;
        };
        match &event.token {
            Token::Start(s) if s.name.strict_matches(&self.name) => self.depth += 1,
            Token::End(e) => {
                if e.name.strict_matches(&self.name) {
                    self.depth -= 1;
                }
                if self.depth == 0 {
                    self.done = true;
                    self.closed = true;
                    return None;
                }
            }
            _ => {}
        }
        Some(event)
    }
}
