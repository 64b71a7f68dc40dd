// Adapters layer: concrete implementations of the domain ports.

pub mod address;
pub mod file_store;
pub mod memory;

pub use address::{DomesticCountry, SharedAddress};
pub use file_store::JsonFileStore;
pub use memory::MemoryStore;
