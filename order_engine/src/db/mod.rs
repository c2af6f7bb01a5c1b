//! Store backends.
//!
//! Only the in-memory backend exists. The stores live for as long as the process does.
pub mod memory;
