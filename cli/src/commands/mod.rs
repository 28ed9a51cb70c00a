//! One module per subcommand, matching a
//! `commands::{generate,migrate,push,introspect,status}` layout.

pub mod apply;
pub mod dump;
pub mod plan;
