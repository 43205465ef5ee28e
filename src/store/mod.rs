/// Key-value persistence port and in-memory store.
pub mod kv;
