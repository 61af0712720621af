//! Core of osfetch: resolve a destination path for every artifact URL of an
//! operating-system descriptor, skip what is already on disk, and fetch the
//! rest atomically (`<dest>.download` → rename → `<dest>`).

pub mod config;
pub mod logging;

pub mod batch;
pub mod cancel;
pub mod descriptor;
pub mod events;
pub mod fetch;
pub mod gate;
pub mod storage;
pub mod template;

pub use batch::{Batch, BatchSummary, UrlOutcome};
pub use cancel::CancelToken;
pub use descriptor::{FileMetadataSource, MetadataError, MetadataSource, OperatingSystem, OsDescriptor};
pub use events::{BatchEvent, EventSink, Stage};
pub use fetch::{fetch, FetchError, FetchOptions};
pub use template::{PathTemplate, TemplateError};
