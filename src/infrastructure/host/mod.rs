//! World host adapters

mod local_host;

pub use local_host::LocalWorldHost;
#[cfg(test)]
pub(crate) use local_host::DEFAULT_SPAWN;
