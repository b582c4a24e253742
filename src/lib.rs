//! Seekable views over one-shot byte streams of known length.
//!
//! [`LazySeeker`] passes a sequential reader straight through and only buffers
//! it in memory once a caller actually needs random access. The
//! [`object_store`] module builds file-like objects on top of it.

pub mod chunked_reader;
pub mod commands;
pub mod config;
pub mod error;
mod filelister;
pub mod inmem_file;
pub mod lazy_seeker;
pub mod object_store;

pub use chunked_reader::ChunkedReader;
pub use config::Config;
pub use error::{LazySeekError, StoreError};
pub use inmem_file::InMemFile;
pub use lazy_seeker::{LazySeeker, SeekerState, ShimPosition};
pub use object_store::{DirStore, ObjectFile, ObjectInfo, ObjectStore};
