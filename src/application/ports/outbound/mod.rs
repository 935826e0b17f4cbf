//! Outbound ports - Interfaces that the application requires from external systems

mod resource_fetch_port;

pub use resource_fetch_port::{FetchError, ResourceFetchPort};

#[cfg(test)]
pub use resource_fetch_port::fake;
