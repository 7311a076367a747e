//! A library for reading and verifying [Metamath](http://us.metamath.org/#faq)
//! proof databases.  The entry point is [`Database`]: feed it a
//! [`TokenStream`] and it checks every `$p` assertion against its proof as
//! the database is read, in a single pass.

// rust lints we want
#![warn(
    bare_trait_objects,
    elided_lifetimes_in_paths,
    missing_docs,
    missing_debug_implementations,
    future_incompatible,
    rust_2018_idioms,
    trivial_numeric_casts,
    unreachable_pub,
    unused
)]
// all the clippy
#![warn(clippy::all, clippy::pedantic)]
// the clippy lints we don't want
#![allow(
    clippy::enum_glob_use,
    clippy::if_not_else,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::module_name_repetitions,
    clippy::too_many_lines
)]

mod util;

pub mod database;
pub mod diag;
pub mod parser;
pub mod scopeck;
pub mod statement;
pub mod verify;

#[cfg(test)]
mod database_tests;
#[cfg(test)]
mod verify_tests;

pub use database::{Database, DbOptions};
pub use diag::Diagnostic;
pub use parser::TokenStream;
pub use statement::{as_str, Token};
