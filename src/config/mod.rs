//! Configuration module

mod site;

pub use site::CanonicalPolicy;
pub use site::OutputConfig;
pub use site::ResolverConfig;
pub use site::SimilarityMetric;
pub use site::SiteConfig;
