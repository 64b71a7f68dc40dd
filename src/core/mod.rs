pub mod bus;
pub mod component;
pub mod coordinator;
pub mod detector;
pub mod fields;
pub mod gateway;
pub mod session;

pub use crate::domain::model::{ComponentKind, Event, OptionKind};
pub use crate::domain::ports::{AddressSource, AddressValidator, FeeProvider, SelectionStore};
pub use crate::utils::error::Result;
