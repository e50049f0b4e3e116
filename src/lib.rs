//! `maildepot` — a local, folder-organized mailbox store.
//!
//! This crate provides the core library for normalizing raw MIME email
//! into canonical records and storing them durably, one JSON file per
//! message under one directory per folder, plus the ingestion sources
//! (IMAP, synthetic, bulk JSON) that feed it.

pub mod config;
pub mod error;
pub mod ingest;
pub mod model;
pub mod normalize;
pub mod store;
