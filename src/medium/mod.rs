//! Storage Medium Module
//!
//! String key/value stores that back the durable tier.

mod file;
mod memory;

pub use file::FileMedium;
pub use memory::MemoryMedium;

use crate::error::MediumError;

// == Storage Medium ==
/// A persistent string store shared by any number of namespaces.
///
/// Every call may fail; the durable tier decides what a failure means.
pub trait StorageMedium: Send + Sync {
    fn get_item(&self, key: &str) -> Result<Option<String>, MediumError>;

    fn set_item(&self, key: &str, value: &str) -> Result<(), MediumError>;

    /// Removes `key`; returns whether it was present.
    fn remove_item(&self, key: &str) -> Result<bool, MediumError>;

    /// All keys currently stored, in no particular order.
    fn keys(&self) -> Result<Vec<String>, MediumError>;
}

impl<M: StorageMedium + ?Sized> StorageMedium for Box<M> {
    fn get_item(&self, key: &str) -> Result<Option<String>, MediumError> {
        (**self).get_item(key)
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), MediumError> {
        (**self).set_item(key, value)
    }

    fn remove_item(&self, key: &str) -> Result<bool, MediumError> {
        (**self).remove_item(key)
    }

    fn keys(&self) -> Result<Vec<String>, MediumError> {
        (**self).keys()
    }
}
