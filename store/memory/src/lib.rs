mod store;

pub use self::store::{MemoryStore, StoreCall};
