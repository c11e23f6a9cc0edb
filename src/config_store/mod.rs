//! Thread-safe configuration store over one document.
//!
//! Loads a document through a byte source and a codec, resolves dotted keys
//! against the decoded tree, and re-reads the source when its reload
//! strategy reports a change.

mod accessors;
mod builder;
mod file_watcher;
mod path_ops;
mod store;

#[cfg(test)]
mod tests;

pub use builder::ConfigStoreBuilder;
pub use file_watcher::SourceWatcher;
pub use store::ConfigStore;
