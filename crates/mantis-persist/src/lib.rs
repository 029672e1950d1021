pub mod error;
pub mod file;
pub mod key;
pub mod memory;
pub mod store;

pub use error::StoreError;
pub use file::FileStore;
pub use key::StorageKey;
pub use memory::MemoryStore;
pub use store::CredentialStore;
