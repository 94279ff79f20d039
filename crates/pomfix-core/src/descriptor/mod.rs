pub mod extractor;
pub mod reader;

pub use extractor::{extract, extract_at};
pub use reader::{ProjectDescriptor, XmlElement};
