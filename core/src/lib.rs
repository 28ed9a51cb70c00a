//! schemaplan-core — IR construction, diffing, and application for
//! declarative PostgreSQL schema management.
//!
//! This crate is the engine behind three operations a front end wires up:
//!
//! - **dump**: inspect a live schema (C2) and render it as canonical DDL
//!   (C7 against an empty comparison IR).
//! - **plan**: inspect the live schema (C2), parse the desired-state SQL
//!   (C3), normalize and filter both (C4/C5), diff them (C6), and package
//!   the result as a `Plan` (C8).
//! - **apply**: execute a `Plan` against a target database, re-checking its
//!   fingerprint for drift before committing (C9).
//!
//! No component holds process-global state; every entry point takes an
//! explicit options value (`options::JobOptions`, `options::ConnectOptions`)
//! rather than reading from a global or the environment.
//!
//! ```text
//! inspect::build_ir ─┐
//!                     ├─▶ normalize::normalize ─▶ ignore::filter ─┐
//!      parser::parse ─┘                                          ├─▶ diff::diff ─▶ plan::Plan ─▶ apply::apply
//!                                                                 │
//!                                              (other IR) ────────┘
//! ```

pub mod apply;
pub mod collection;
pub mod diff;
pub mod entity;
pub mod error;
pub mod fingerprint;
pub mod ignore;
pub mod inspect;
pub mod ir;
pub mod normalize;
pub mod options;
pub mod parser;
pub mod plan;
pub mod sqlgen;

pub use entity::{DiffType, Entity, EntityKey, EntityKind};
pub use error::{ApplyError, CoreError, DiffError, IntrospectError, IoError, ParseError};
pub use ir::Ir;
pub use options::{ConnectOptions, JobOptions};
pub use plan::Plan;
