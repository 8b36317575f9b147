//! Heuristic product extraction from delivery-menu pages.
//!
//! Two independent strategies over a fetched page:
//! - mining the hidden JSON payload single-page apps embed in their markup
//! - regex-driven currency mining over visible text blocks
//!
//! Both are pure: document in, ordered records out. The fetch collaborator
//! and the CSV/table surface live at the edges.

pub mod export;
pub mod extractors;
pub mod fetch;
pub mod models;
