//! Analyzer for French land-registry filings (*état hypothécaire*): segments the
//! page dump into formalities, resolves current lot owners and classifies charges.

pub mod config;
pub mod db;
pub mod error;
pub mod expiry;
pub mod ownership;
pub mod pages;
pub mod parser;
pub mod query;

pub use error::{EhfError, Result};
pub use parser::{process_document, process_document_with, DocumentBundle, Summary};
