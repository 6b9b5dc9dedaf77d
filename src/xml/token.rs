//! Owned XML tokens as produced by [`super::XmlStream`].
//!
//! Names carry the resolved namespace URI in `space`, never the prefix that
//! was written in the document. Namespace declarations are the exception:
//! `xmlns="uri"` is `("", "xmlns")` and `xmlns:p="uri"` is `("xmlns", "p")`.

use std::fmt;

/// Namespace used by namespace declaration attributes.
pub const XMLNS: &str = "xmlns";

/// The namespace bound to the `xml` prefix.
pub const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";

#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct Name {
    pub space: String,
    pub local: String,
}

impl Name {
    pub fn new(space: impl Into<String>, local: impl Into<String>) -> Self {
        Self {
            space: space.into(),
            local: local.into(),
        }
    }

    /// A name outside of any namespace.
    pub fn local(local: impl Into<String>) -> Self {
        Self::new(String::new(), local)
    }

    /// Local parts are equal and, when both sides carry one, so are the
    /// namespaces.
    pub fn sloppy_matches(&self, other: &Name) -> bool {
        if self.local != other.local {
            return false;
        }
        self.space.is_empty() || other.space.is_empty() || self.space == other.space
    }

    /// Both namespace and local part are equal.
    pub fn strict_matches(&self, other: &Name) -> bool {
        self == other
    }

    /// The prefix this attribute declares, if it is a namespace declaration.
    pub fn declared_prefix(&self) -> Option<&str> {
        if self.space == XMLNS {
            Some(&self.local)
        } else if self.space.is_empty() && self.local == XMLNS {
            Some("")
        } else {
            None
        }
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.space.is_empty() {
            f.write_str(&self.local)
        } else {
            write!(f, "{{{}}}{}", self.space, self.local)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attr {
    pub name: Name,
    pub value: String,
}

impl Attr {
    pub fn new(name: Name, value: impl Into<String>) -> Self {
        Self {
            name,
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartElement {
    pub name: Name,
    pub attrs: Vec<Attr>,
}

impl StartElement {
    pub fn new(name: Name, attrs: Vec<Attr>) -> Self {
        Self { name, attrs }
    }

    /// Value of the first attribute sloppily matching `name`.
    pub fn attr(&self, name: &Name) -> Option<&str> {
        self.attrs
            .iter()
            .find(|a| a.name.sloppy_matches(name))
            .map(|a| a.value.as_str())
    }

    /// The end element closing this start element.
    pub fn end(&self) -> EndElement {
        EndElement {
            name: self.name.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndElement {
    pub name: Name,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Start(StartElement),
    End(EndElement),
    /// Unescaped character data
    Text(String),
    /// Raw contents of a CDATA section
    CData(String),
    Comment(String),
    /// Processing instruction or XML declaration, without `<?` and `?>`
    ProcInst(String),
    /// Contents of `<!DOCTYPE ...>` after the keyword
    DocType(String),
}

/// A token and the byte offset the decoder had reached after reading it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlEvent {
    pub token: Token,
    pub offset: usize,
}

impl XmlEvent {
    pub fn new(token: Token, offset: usize) -> Self {
        Self { token, offset }
    }

    pub fn as_start(&self) -> Option<&StartElement> {
        match &self.token {
            Token::Start(start) => Some(start),
            _ => None,
        }
    }

    /// Attributes of a start element; empty for every other token.
    pub fn attrs(&self) -> &[Attr] {
        match self.as_start() {
            Some(start) => &start.attrs,
            None => &[],
        }
    }
}
