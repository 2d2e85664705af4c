use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::response::Response;
use serde_json::Value;

use crate::catalog::RequirementsCatalog;
use crate::client::{ClientError, RecordSource};
use crate::dashboard::DashboardService;
use crate::records::CandidateRecord;

pub(super) const PYTHON_GROUP: &str = "Grupo 6: Ingeniero de Software Python";

pub(super) fn candidate(
    nombre: &str,
    apellido: &str,
    curp: &str,
    carrera: &str,
    promedio: &str,
    estado: &str,
) -> CandidateRecord {
    CandidateRecord {
        id: format!("id-{}", curp.to_lowercase()),
        nombre: nombre.to_string(),
        apellido_paterno: apellido.to_string(),
        apellido_materno: "Ruiz".to_string(),
        curp: curp.to_string(),
        telefono_casa: "7221234567".to_string(),
        telefono_celular: "7229876543".to_string(),
        correo_personal: format!("{}@example.com", nombre.to_lowercase()),
        institucion: "UAEM".to_string(),
        carrera: carrera.to_string(),
        promedio: promedio.to_string(),
        estado: estado.to_string(),
        ..CandidateRecord::default()
    }
}

/// Three candidates with averages 6.5, 8.0 and 9.2.
pub(super) fn records() -> Vec<CandidateRecord> {
    let mut ana = candidate(
        "Ana",
        "Garcia",
        "GARA000101MDFRNN01",
        "SISTEMAS",
        "9.2",
        "regular",
    );
    ana.grupo = PYTHON_GROUP.to_string();
    ana.fulfilled = vec![
        "Python: programación orientada a objetos".to_string(),
        "APIs y marcadores de language XML y JSON".to_string(),
    ];
    ana.pdf_url = "http://res.example.com/demo/image/upload/fl_attachment:false/v1/ana.pdf"
        .to_string();

    let luis = candidate(
        "Luis",
        "Martinez",
        "MALU990202HDFRSS02",
        "INFORMATICA",
        "6.5",
        "irregular",
    );

    let mut sofia = candidate(
        "Sofia",
        "Lopez",
        "LOSO980303MDFPFF03",
        "SISTEMAS",
        "8.0",
        "titulado",
    );
    sofia.grupo = "Grupo 9: Retirado".to_string();

    vec![ana, luis, sofia]
}

pub(super) fn catalog() -> Arc<RequirementsCatalog> {
    Arc::new(RequirementsCatalog::embedded().expect("embedded catalog"))
}

/// Record source that serves a fixed list, or fails when `records` is `None`.
#[derive(Default)]
pub(super) struct StaticSource {
    records: Mutex<Option<Vec<CandidateRecord>>>,
    calls: AtomicUsize,
    delay: Option<Duration>,
}

impl StaticSource {
    pub(super) fn serving(records: Vec<CandidateRecord>) -> Self {
        Self {
            records: Mutex::new(Some(records)),
            ..Self::default()
        }
    }

    pub(super) fn failing() -> Self {
        Self::default()
    }

    /// Holds every fetch open for `delay` before answering.
    pub(super) fn slow(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub(super) fn replace(&self, records: Option<Vec<CandidateRecord>>) {
        *self.records.lock().expect("source mutex poisoned") = records;
    }

    pub(super) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RecordSource for StaticSource {
    async fn fetch_records(&self) -> Result<Vec<CandidateRecord>, ClientError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.records
            .lock()
            .expect("source mutex poisoned")
            .clone()
            .ok_or(ClientError::LoadFailed { status: Some(503) })
    }
}

pub(super) fn build_service(source: Arc<StaticSource>) -> Arc<DashboardService<StaticSource>> {
    Arc::new(DashboardService::new(source, catalog(), 2))
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

pub(super) async fn read_text_body(response: Response) -> String {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    String::from_utf8(body.to_vec()).expect("utf8 body")
}
