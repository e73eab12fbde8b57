//! Publishes a Notion-style database of entries as HTML documents and a JSON listing.
//!
//! The crate is layered the usual way: `domain` holds plain data types,
//! `application` the rendering pipeline and its seams, `infra` the Notion
//! client, HTTP surface and telemetry, `presentation` the document templates.

pub mod application;
pub mod config;
pub mod domain;
pub mod infra;
pub mod presentation;
pub mod util;
