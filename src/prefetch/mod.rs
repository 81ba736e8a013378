//! Context prefetch: eager discovery of every file under a scope

mod binding;
mod host;

pub use binding::{
    register_all, register_discovery, BuildDiagnostics, ContextPrefetch, DiscoveryRequest,
    NULL_STAGE,
};
pub use host::{DiscoveredFile, DiscoveryHost, DiscoveryOutcome, FsDiscoveryHost};
