//! Core relational data types.
//!
//! Tables managed by the sync engine are plain in-memory relations: a
//! [`TableSchema`] describing typed columns, plus [`TableRow`]s made of
//! [`Cell`] values. Every mapper projects source objects into these types and
//! every store operation validates against them.

mod cell;
mod row;
mod schema;

pub use cell::*;
pub use row::*;
pub use schema::*;
