//! URL repository implementations.
//!
//! # Repositories
//!
//! - [`MemoryUrlRepository`] - process-local storage, the default
//! - [`FileUrlRepository`] - JSON-lines file, enabled by `FILE_STORAGE_PATH`

pub mod file_url_repository;
pub mod memory_url_repository;

pub use file_url_repository::FileUrlRepository;
pub use memory_url_repository::MemoryUrlRepository;
