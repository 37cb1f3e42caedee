pub mod engine;
pub mod file;
pub mod marker;
pub mod memory;

pub use engine::KeyValueStore;
pub use file::FileStore;
pub use marker::{decode_version, encode_version, read_version, write_version};
pub use memory::InMemoryStore;
