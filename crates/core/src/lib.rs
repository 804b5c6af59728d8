#![forbid(unsafe_code)]

//! Shared models and pure logic for submitting and tracking OXN experiments.

pub mod analysis;
pub mod api;
pub mod collection;
pub mod document;
pub mod ingest;
pub mod model;
pub mod report;
pub mod submission;
pub mod time;
pub mod variation;

pub use analysis::*;
pub use api::*;
pub use collection::*;
pub use document::*;
pub use ingest::*;
pub use model::*;
pub use report::*;
pub use submission::*;
pub use time::*;
pub use variation::*;
