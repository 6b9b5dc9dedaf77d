//! Namespace-aware XML serialization of [`Token`]s.
//!
//! Decoded names carry namespace URIs, so writing them back needs the
//! prefixes that were in scope. The encoder tracks `xmlns` declarations
//! as it writes start elements and undoes them at the matching end tag.
//! An encoder created with [`Encoder::child`] starts from a copy of its
//! parent's bindings, which lets a fragment cut out of a document be
//! written with the prefixes its ancestors declared.

use super::token::{Attr, EndElement, Name, StartElement, Token, XMLNS, XML_NAMESPACE};
use crate::error::{Error, Result};
use std::borrow::Cow;
use std::collections::HashMap;
use std::io::Write;

enum Scope {
    Element(Name),
    Binding {
        prefix: String,
        previous: Option<String>,
    },
}

pub struct Encoder<W: Write> {
    w: W,
    scope: Vec<Scope>,
    /// prefix -> uri
    prefixes: HashMap<String, String>,
    /// uri -> prefixes bound to it, most recent last
    uris: HashMap<String, Vec<String>>,
    indent: Option<Indent>,
}

struct Indent {
    prefix: String,
    unit: String,
    depth: usize,
    indented_in: bool,
    put_newline: bool,
}

impl<W: Write> Encoder<W> {
    pub fn new(w: W) -> Self {
        Self {
            w,
            scope: Vec::new(),
            prefixes: HashMap::new(),
            uris: HashMap::new(),
            indent: None,
        }
    }

    /// An encoder that sees every namespace binding currently visible in
    /// `parent`. Later changes on either side are not shared.
    pub fn child<P: Write>(w: W, parent: &Encoder<P>) -> Self {
        Self {
            w,
            scope: Vec::new(),
            prefixes: parent.prefixes.clone(),
            uris: parent.uris.clone(),
            indent: None,
        }
    }

    /// Starts every element on a new line led by `prefix` and one `unit`
    /// per nesting level.
    pub fn indent(&mut self, prefix: impl Into<String>, unit: impl Into<String>) {
        self.indent = Some(Indent {
            prefix: prefix.into(),
            unit: unit.into(),
            depth: 0,
            indented_in: false,
            put_newline: false,
        });
    }

    pub fn into_inner(self) -> W {
        self.w
    }

    pub fn encode_token(&mut self, token: &Token) -> Result<()> {
        match token {
            Token::Start(start) => self.start(start),
            Token::End(end) => self.end(end),
            Token::Text(text) => {
                self.w.write_all(escape_text(text).as_bytes())?;
                Ok(())
            }
            Token::CData(data) => {
                write!(self.w, "<![CDATA[{}]]>", data)?;
                Ok(())
            }
            Token::Comment(comment) => {
                self.write_indent(0)?;
                write!(self.w, "<!--{}-->", comment)?;
                Ok(())
            }
            Token::ProcInst(inst) => {
                self.write_indent(0)?;
                write!(self.w, "<?{}?>", inst)?;
                Ok(())
            }
            Token::DocType(doctype) => {
                self.write_indent(0)?;
                write!(self.w, "<!DOCTYPE {}>", doctype.trim_start())?;
                Ok(())
            }
        }
    }

    pub fn encode_all<'t, I>(&mut self, tokens: I) -> Result<()>
    where
        I: IntoIterator<Item = &'t Token>,
    {
        tokens.into_iter().try_for_each(|t| self.encode_token(t))
    }

    fn start(&mut self, start: &StartElement) -> Result<()> {
        self.write_indent(1)?;
        self.scope.push(Scope::Element(start.name.clone()));
        for attr in &start.attrs {
            if let Some(prefix) = attr.name.declared_prefix() {
                self.bind(prefix, &attr.value);
            }
        }

        let tag = self.qualify(&start.name, false)?;
        write!(self.w, "<{}", tag)?;
        for Attr { name, value } in &start.attrs {
            let qualified = self.qualify(name, true)?;
            write!(self.w, " {}=\"{}\"", qualified, escape_attr(value))?;
        }
        self.w.write_all(b">")?;
        Ok(())
    }

    fn end(&mut self, end: &EndElement) -> Result<()> {
        let tag = self.qualify(&end.name, false)?;
        loop {
            match self.scope.pop() {
                Some(Scope::Binding { prefix, previous }) => self.unbind(prefix, previous),
                Some(Scope::Element(name)) if name == end.name => break,
                Some(Scope::Element(name)) => {
                    return Err(Error::UnbalancedTags {
                        expected: name.to_string(),
                        found: end.name.to_string(),
                    })
                }
                None => {
                    return Err(Error::UnbalancedTags {
                        expected: String::new(),
                        found: end.name.to_string(),
                    })
                }
            }
        }
        self.write_indent(-1)?;
        write!(self.w, "</{}>", tag)?;
        Ok(())
    }

    fn bind(&mut self, prefix: &str, uri: &str) {
        let previous = self.prefixes.insert(prefix.to_string(), uri.to_string());
        self.uris
            .entry(uri.to_string())
            .or_default()
            .push(prefix.to_string());
        self.scope.push(Scope::Binding {
            prefix: prefix.to_string(),
            previous,
        });
    }

    fn unbind(&mut self, prefix: String, previous: Option<String>) {
        let current = match previous {
            Some(uri) => self.prefixes.insert(prefix.clone(), uri),
            None => self.prefixes.remove(&prefix),
        };
        let Some(current) = current else { return };
        if let Some(bound) = self.uris.get_mut(&current) {
            if let Some(pos) = bound.iter().rposition(|p| *p == prefix) {
                bound.remove(pos);
            }
            if bound.is_empty() {
                self.uris.remove(&current);
            }
        }
    }

    /// Most recent prefix still bound to `uri`. Attributes never use the
    /// default namespace.
    fn visible_prefix(&self, uri: &str, for_attr: bool) -> Option<&str> {
        self.uris.get(uri)?.iter().rev().find_map(|prefix| {
            let live = self.prefixes.get(prefix).is_some_and(|u| u == uri);
            (live && !(for_attr && prefix.is_empty())).then_some(prefix.as_str())
        })
    }

    fn qualify<'n>(&self, name: &'n Name, for_attr: bool) -> Result<Cow<'n, str>> {
        let space = name.space.as_str();
        let local = name.local.as_str();
        if space.is_empty() {
            return Ok(Cow::Borrowed(local));
        }
        if space == XMLNS {
            return Ok(Cow::Owned(format!("{}:{}", XMLNS, local)));
        }
        if let Some(prefix) = self.visible_prefix(space, for_attr) {
            if prefix.is_empty() {
                return Ok(Cow::Borrowed(local));
            }
            return Ok(Cow::Owned(format!("{}:{}", prefix, local)));
        }
        if self.prefixes.contains_key(space) {
            return Ok(Cow::Owned(format!("{}:{}", space, local)));
        }
        if space == "xml" || space == XML_NAMESPACE {
            return Ok(Cow::Owned(format!("xml:{}", local)));
        }
        Err(Error::UnknownNamespace(space.to_string()))
    }

    fn write_indent(&mut self, delta: i32) -> Result<()> {
        let Some(indent) = self.indent.as_mut() else {
            return Ok(());
        };
        if delta < 0 {
            indent.depth = indent.depth.saturating_sub(1);
            if indent.indented_in {
                indent.indented_in = false;
                return Ok(());
            }
            indent.indented_in = false;
        }
        if indent.put_newline {
            self.w.write_all(b"\n")?;
        } else {
            indent.put_newline = true;
        }
        self.w.write_all(indent.prefix.as_bytes())?;
        for _ in 0..indent.depth {
            self.w.write_all(indent.unit.as_bytes())?;
        }
        if delta > 0 {
            indent.depth += 1;
            indent.indented_in = true;
        }
        Ok(())
    }
}

/// Text with `&`, `<` and `>` escaped.
fn escape_text(text: &str) -> Cow<'_, str> {
    quick_xml::escape::partial_escape(text)
}

/// Attribute value safe inside double quotes, whitespace preserved.
fn escape_attr(value: &str) -> Cow<'_, str> {
    if !value.contains(|c: char| matches!(c, '&' | '<' | '>' | '"' | '\t' | '\n' | '\r')) {
        return Cow::Borrowed(value);
    }
    let mut out = String::with_capacity(value.len() + 8);
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\t' => out.push_str("&#x9;"),
            '\n' => out.push_str("&#xA;"),
            '\r' => out.push_str("&#xD;"),
            c => out.push(c),
        }
    }
    Cow::Owned(out)
}
