//! XML documents produced by the bridge

mod fa3;
pub(crate) mod xml;

pub use fa3::InvoiceXmlBuilder;
pub use xml::escape_text;
