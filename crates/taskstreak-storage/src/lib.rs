//! Concrete storage implementations for state documents.
//! Files are replaced atomically so a crash mid-write leaves the previous document intact.

pub mod file_store;
