pub mod vulnerabilities;

pub use vulnerabilities::{DomainView, SearchRequest, SearchResponse, VulnerabilityView};
