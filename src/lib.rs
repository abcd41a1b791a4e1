//! wine-digest
//!
//! トップリストのワインをカタログで探し、見つかったものをまとめて配信する。

pub mod catalog;
pub mod cli;
pub mod config;
pub mod details;
pub mod error;
pub mod pipeline;
pub mod publish;
pub mod retry;
pub mod search;
pub mod toplist;
