//! Library components of the `dbf` command-line tool.

pub mod logging;
