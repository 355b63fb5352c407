//! Generic utility primitives with zero domain knowledge.
//!
//! - `artifact` - Glob matching and purging of files in a directory
//! - `io` - File I/O with consistent error handling
//! - `shell` - Shell quoting for displayed command lines

pub mod artifact;
pub mod io;
pub mod shell;
