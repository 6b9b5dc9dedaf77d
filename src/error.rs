//! Crate-wide error type.
//!
//! Library code returns [`Error`]; the binary converts it into a
//! `miette` report at the edge.

use crate::res::ResourceType;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Not a resource path")]
    NotResPath,

    #[error("resource path that needs to be skipped")]
    SkipResPath,

    #[error("{0}: unknown type")]
    UnknownType(String),

    #[error("{value}: unparsable density: {source}")]
    Density {
        value: String,
        source: std::num::ParseIntError,
    },

    #[error("malformed name {0:?} - can not start with ':' or '/', nor hold '/' in its package")]
    MalformedName(String),

    #[error("cannot determine type from {raw:?} and {context} - not a valid name")]
    UndeterminedType { raw: String, context: ResourceType },

    #[error("cannot determine name from {raw:?} and {context} - not a valid name")]
    UndeterminedName { raw: String, context: ResourceType },

    #[error("{found}: expected resource of type {expected}")]
    WrongType {
        expected: ResourceType,
        found: String,
    },

    #[error("offset: {offset} xml error: {source}")]
    Decode {
        offset: usize,
        source: quick_xml::Error,
    },

    #[error("offset: {offset} xml error: document ended with {open} unclosed element(s)")]
    Truncated { offset: usize, open: usize },

    #[error("unknown namespace {0:?}")]
    UnknownNamespace(String),

    #[error("unbalanced tags: expected </{expected}> but got </{found}>")]
    UnbalancedTags { expected: String, found: String },

    #[error("{tag}: tag is missing {attr:?} attribute or is empty")]
    MissingAttribute { tag: String, attr: &'static str },

    #[error("{0}: is an unhandled tag")]
    UnhandledTag(String),

    #[error("different values for resource {0:?}")]
    ValueConflict(String),

    #[error("{sharder}: bad sharder f({key:?}, {shards}) -> {got} must be [0, {shards})")]
    BadShard {
        sharder: String,
        key: String,
        shards: usize,
        got: usize,
    },

    #[error("{0}: no output archives configured for this resource type")]
    NoOutput(ResourceType),

    #[error("got {paths} paths and {contents} contents")]
    ContentsMismatch { paths: usize, contents: usize },

    #[error("no output writers")]
    NoWriters,

    #[error("{spec:?}: expected <res-type>:<file>")]
    OutputSpec { spec: String },

    #[error("{}: {op}: {source}", .path.display())]
    Io {
        op: &'static str,
        path: PathBuf,
        source: io::Error,
    },

    #[error("write failed: {0}")]
    Write(#[from] io::Error),

    #[error("{entry}: {op}: {source}")]
    Archive {
        op: &'static str,
        entry: String,
        source: zip::result::ZipError,
    },

    #[error("could not spawn pipeline thread: {0}")]
    Spawn(io::Error),

    #[error("pipeline cancelled")]
    Cancelled,

    #[error("{prefix}{source}")]
    Prefixed { prefix: String, source: Box<Error> },
}

impl Error {
    /// Attaches the path an I/O operation failed on.
    pub fn io(op: &'static str, path: impl Into<PathBuf>, source: io::Error) -> Self {
        Error::Io {
            op,
            path: path.into(),
            source,
        }
    }

    /// Prepends `prefix` to the rendered message.
    pub fn with_prefix(self, prefix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        if prefix.is_empty() {
            return self;
        }
        Error::Prefixed {
            prefix,
            source: Box::new(self),
        }
    }

    /// True for the internal cancellation signal, even when prefixed.
    pub fn is_cancelled(&self) -> bool {
        match self {
            Error::Cancelled => true,
            Error::Prefixed { source, .. } => source.is_cancelled(),
            _ => false,
        }
    }

    /// The innermost error beneath any prefixes.
    pub fn root(&self) -> &Error {
        match self {
            Error::Prefixed { source, .. } => source.root(),
            other => other,
        }
    }
}
