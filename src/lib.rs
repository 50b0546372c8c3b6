//! # Phone List
//!
//! Cleans contact spreadsheets into canonical Brazilian phone lists.
//!
//! An uploaded spreadsheet (xlsx, xls, ods or CSV) is decoded into a grid,
//! the phone and name columns are located heuristically, every phone is
//! reduced to digits and prefixed with the `55` country code, duplicates are
//! dropped, and the result is exported as one or more `.xlsx` files zipped
//! together with a statistics report.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌────────┐   ┌──────────┐   ┌──────────┐   ┌─────────┐
//! │ extract  │──▶│ header │──▶│ classify │──▶│ sanitize │──▶│ archive │
//! │ xlsx/csv │   │ labels │   │ columns  │   │ phones   │   │ zip     │
//! └──────────┘   └────────┘   └──────────┘   └──────────┘   └────┬────┘
//!                                                                │
//!                                    ┌───────────────────────────┤
//!                                    ▼                           ▼
//!                               ┌──────────┐               ┌──────────┐
//!                               │   CLI    │               │   HTTP   │
//!                               │(process) │               │ (upload) │
//!                               └──────────┘               └──────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! phonelist process contatos.xlsx --chunk-size 200
//! phonelist inspect contatos.csv
//! phonelist serve                 # POST /api/upload
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Core data types |
//! | [`extract`] | Spreadsheet and CSV decoding |
//! | [`header`] | Header normalization |
//! | [`classify`] | Phone and name column detection |
//! | [`sanitize`] | Phone canonicalization and deduplication |
//! | [`xlsx`] | Workbook encoding |
//! | [`stats`] | Statistics report |
//! | [`archive`] | Chunking and zip assembly |
//! | [`pipeline`] | End-to-end processing |
//! | [`server`] | HTTP upload endpoint |
//! | [`error`] | Error taxonomy |

pub mod archive;
pub mod classify;
pub mod config;
pub mod error;
pub mod extract;
pub mod header;
pub mod models;
pub mod pipeline;
pub mod sanitize;
pub mod server;
pub mod stats;
pub mod xlsx;
