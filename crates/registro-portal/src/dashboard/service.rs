use std::sync::Arc;

use serde::Serialize;
use tokio::sync::{Mutex, RwLock};
use tracing::{info, warn};

use super::download::build_download_url;
use super::export::{export_csv, ExportError};
use super::filter::{distinct_programs, filter_records, FilterCriteria};
use super::pagination::{paginate, Page};
use crate::catalog::RequirementsCatalog;
use crate::client::{ClientError, RecordSource};
use crate::matching::{evaluate, MatchResult};
use crate::records::{find_by_curp, CandidateRecord};

/// Where the record list stands after the last fetch.
#[derive(Debug, Clone)]
pub enum LoadState {
    Pending,
    Loaded(Arc<Vec<CandidateRecord>>),
    Failed(String),
}

/// Dashboard row: one record flattened for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordRow {
    pub id: String,
    pub full_name: String,
    pub curp: String,
    pub home_phone: String,
    pub mobile_phone: String,
    pub personal_email: String,
    pub institutional_email: String,
    pub institution: String,
    pub program: String,
    pub group: String,
    pub average: String,
    pub status: String,
    pub attachment_url: Option<String>,
    pub download_url: Option<String>,
}

impl RecordRow {
    pub fn from_record(record: &CandidateRecord) -> Self {
        let attachment_url = record.attachment_url().map(str::to_string);
        let download_url =
            build_download_url(record.attachment_url(), &attachment_file_name(record));

        Self {
            id: record.id.clone(),
            full_name: record.full_name(),
            curp: record.curp.clone(),
            home_phone: record.telefono_casa.clone(),
            mobile_phone: record.telefono_celular.clone(),
            personal_email: record.correo_personal.clone(),
            institutional_email: record.correo_institucional.clone(),
            institution: record.institution().to_string(),
            program: record.carrera.clone(),
            group: record.grupo.clone(),
            average: record.promedio.clone(),
            status: record.status_label(),
            attachment_url,
            download_url,
        }
    }
}

/// Save-as name offered for a record's CV.
pub fn attachment_file_name(record: &CandidateRecord) -> String {
    format!("cv_{}.pdf", record.nombre.trim())
}

/// One page of rows plus the load error, if the last fetch failed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordPage {
    #[serde(flatten)]
    pub page: Page<RecordRow>,
    pub load_error: Option<String>,
}

/// Holds the fetched record list and answers dashboard queries against it.
///
/// Fetches are serialized behind `loading`, so at most one request is in flight and a single
/// writer replaces the state. Readers work on a cloned `Arc` snapshot.
pub struct DashboardService<S> {
    source: Arc<S>,
    catalog: Arc<RequirementsCatalog>,
    state: RwLock<LoadState>,
    loading: Mutex<()>,
    page_size: usize,
}

impl<S> DashboardService<S>
where
    S: RecordSource + 'static,
{
    pub fn new(source: Arc<S>, catalog: Arc<RequirementsCatalog>, page_size: usize) -> Self {
        Self {
            source,
            catalog,
            state: RwLock::new(LoadState::Pending),
            loading: Mutex::new(()),
            page_size: page_size.max(1),
        }
    }

    pub fn catalog(&self) -> &RequirementsCatalog {
        &self.catalog
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Fetches the list and replaces the snapshot. A failure clears the list.
    pub async fn load(&self) -> Result<usize, ClientError> {
        let _loading = self.loading.lock().await;
        self.fetch_and_store().await
    }

    /// Loads once if nothing has been fetched yet. A fetch already in flight is awaited
    /// rather than repeated.
    pub async fn ensure_loaded(&self) {
        if !self.is_pending().await {
            return;
        }
        let _loading = self.loading.lock().await;
        if self.is_pending().await {
            // The failure is kept in the load state.
            let _ = self.fetch_and_store().await;
        }
    }

    async fn is_pending(&self) -> bool {
        matches!(*self.state.read().await, LoadState::Pending)
    }

    async fn fetch_and_store(&self) -> Result<usize, ClientError> {
        match self.source.fetch_records().await {
            Ok(records) => {
                self.warn_on_catalog_drift(&records);
                let count = records.len();
                *self.state.write().await = LoadState::Loaded(Arc::new(records));
                info!(count, "candidate records loaded");
                Ok(count)
            }
            Err(err) => {
                warn!(error = %err, "candidate records could not be loaded");
                *self.state.write().await = LoadState::Failed(err.to_string());
                Err(err)
            }
        }
    }

    pub async fn state(&self) -> LoadState {
        self.state.read().await.clone()
    }

    /// Current records; empty while pending or after a failed fetch.
    pub async fn snapshot(&self) -> Arc<Vec<CandidateRecord>> {
        match &*self.state.read().await {
            LoadState::Loaded(records) => Arc::clone(records),
            LoadState::Pending | LoadState::Failed(_) => Arc::new(Vec::new()),
        }
    }

    pub async fn load_error(&self) -> Option<String> {
        match &*self.state.read().await {
            LoadState::Failed(message) => Some(message.clone()),
            _ => None,
        }
    }

    pub async fn page(
        &self,
        criteria: &FilterCriteria,
        page_index: usize,
        page_size: Option<usize>,
    ) -> RecordPage {
        let records = self.snapshot().await;
        let page_size = page_size.unwrap_or(self.page_size).max(1);
        let matching = filter_records(&records, criteria);
        let total = matching.len();
        let page = Page {
            items: paginate(&matching, page_index, page_size).to_vec(),
            page_index,
            page_size,
            total,
            page_count: total.div_ceil(page_size),
        };

        RecordPage {
            page: page.map(RecordRow::from_record),
            load_error: self.load_error().await,
        }
    }

    pub async fn programs(&self) -> Vec<String> {
        distinct_programs(&self.snapshot().await)
    }

    /// CSV of every record passing `criteria`, ignoring pagination.
    pub async fn export(&self, criteria: &FilterCriteria) -> Result<Vec<u8>, ExportError> {
        let records = self.snapshot().await;
        let matching = filter_records(&records, criteria);
        export_csv(matching)
    }

    pub async fn find(&self, curp: &str) -> Option<CandidateRecord> {
        find_by_curp(&self.snapshot().await, curp).cloned()
    }

    pub async fn requirements(&self, curp: &str) -> Option<MatchResult> {
        self.find(curp)
            .await
            .map(|record| evaluate(&record, &self.catalog))
    }

    /// Rewritten attachment link for a record; `None` for unknown records or missing files.
    pub async fn download_url(&self, curp: &str) -> Option<String> {
        let record = self.find(curp).await?;
        build_download_url(record.attachment_url(), &attachment_file_name(&record))
    }

    fn warn_on_catalog_drift(&self, records: &[CandidateRecord]) {
        let unknown = self
            .catalog
            .unknown_titles(records.iter().map(|record| record.grupo.as_str()));
        if !unknown.is_empty() {
            warn!(
                catalog_version = %self.catalog.version,
                groups = ?unknown,
                "records reference groups missing from the requirements catalog"
            );
        }
    }
}
