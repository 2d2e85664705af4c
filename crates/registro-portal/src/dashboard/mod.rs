//! Records dashboard: filtering, pagination, CSV export and attachment links over the
//! fetched candidate list, plus the HTTP router that serves them.

pub mod download;
pub mod export;
pub mod filter;
pub mod pagination;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use download::{build_download_url, sanitize_file_name};
pub use export::{export_csv, export_file_name, ExportError, EXPORT_HEADERS};
pub use filter::{distinct_programs, filter_records, FilterCriteria};
pub use pagination::{paginate, DashboardView, Page};
pub use router::{dashboard_router, RecordQuery};
pub use service::{attachment_file_name, DashboardService, LoadState, RecordPage, RecordRow};
