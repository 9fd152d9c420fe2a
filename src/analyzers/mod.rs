//! Diploma catalog statistics.
//!
//! This module filters diploma records, groups them by school, city,
//! filiere, mention and duration, ranks careers and employment
//! opportunities, and assembles the results into reports.

pub mod aggregate;
pub mod analyzer;
pub mod filter;
pub mod types;
pub mod utility;
