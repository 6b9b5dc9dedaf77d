//! XML tokens, a streaming decoder and a namespace-aware encoder.

mod encoder;
mod stream;
mod token;

pub use encoder::Encoder;
pub use stream::{consume_until, forward_children, stream_document, Children, XmlStream};
pub use token::{Attr, EndElement, Name, StartElement, Token, XmlEvent, XMLNS, XML_NAMESPACE};
