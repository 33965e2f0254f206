mod parser;
mod serializer;
pub(crate) mod utils;

pub use crate::rdfxml::parser::RdfXmlParser;
pub use crate::rdfxml::serializer::XmlBlock;
