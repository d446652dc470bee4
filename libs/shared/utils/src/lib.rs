pub mod extractor;
pub mod ids;
pub mod jwt;
