//! Diana Bot: narrative catalog authoring.
//!
//! Parses the YAML/JSON catalogs content writers produce, checks the fragment
//! graph before it reaches users, and publishes validated catalogs into a
//! fragment store.

pub mod application;
pub mod domain;
