pub mod jsonl;
pub mod table_store;

pub use jsonl::JsonlProvider;
pub use table_store::{StoreCredentials, TableStoreProvider};
