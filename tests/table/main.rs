//! Tables and readers through the database handle

#[path = "../common/mod.rs"]
mod common;

mod concurrency;
mod persistence;
mod readers;
