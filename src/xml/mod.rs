pub mod sink;
pub mod stream;

pub use sink::XmlSink;
pub use stream::{XmlEvent, XmlStream};
