//! End-to-end dashboard scenarios over a raw API payload: decoding, matching, filtering,
//! pagination, CSV export and attachment links through the public crate surface.

use registro_portal::catalog::RequirementsCatalog;
use registro_portal::dashboard::{
    build_download_url, export_csv, filter_records, paginate, DashboardView, FilterCriteria,
};
use registro_portal::matching::evaluate;
use registro_portal::records::decode_records;

const PAYLOAD: &str = r#"[
  {
    "_id": "65f0a1",
    "nombre": "María",
    "apellidoPaterno": "Pérez",
    "apellidoMaterno": "Soto",
    "curp": "PESM000101MDFRTRA1",
    "correoPersonal": "maria@example.com",
    "institucion": "UAEM",
    "carrera": "SISTEMAS",
    "promedio": 9.2,
    "estado": "regular",
    "grupo": "Grupo 6: Ingeniero de Software Python",
    "fulfilled": "[\"python: programacion orientada a objetos\",\"APIs y marcadores de language XML y JSON\"]",
    "pdfUrl": "http://res.example.com/demo/image/upload/fl_attachment:false/v1/maria.pdf"
  },
  {
    "_id": "65f0a2",
    "nombre": "Jorge",
    "apellidoPaterno": "Luna",
    "curp": "LUJO990202HDFNRR02",
    "claveEscuela": "TESCO",
    "carrera": "INFORMATICA",
    "promedio": "6.5",
    "estado": "irregular",
    "grupo": "Grupo 1: Ingeniero de software, Desarrollador Full Stack (.NET/Angular)",
    "fulfilled": ["NET core, asp.net, y c++", "Angular"]
  },
  42,
  {
    "_id": "65f0a3",
    "nombre": "Elena",
    "apellidoPaterno": "Ríos",
    "curp": "RIEL980303MDFSLN03",
    "carrera": "SISTEMAS",
    "promedio": "8.0",
    "estado": "titulado",
    "fulfilled": null
  }
]"#;

fn catalog() -> RequirementsCatalog {
    RequirementsCatalog::embedded().expect("embedded catalog")
}

#[test]
fn decodes_mixed_payload_and_skips_non_objects() {
    let records = decode_records(PAYLOAD.as_bytes()).expect("array payload");
    assert_eq!(records.len(), 3);
    assert_eq!(records[0].id, "65f0a1");
    assert_eq!(records[0].promedio, "9.2");
    assert_eq!(records[1].institution(), "TESCO");
    assert!(records[2].fulfilled.is_empty());
}

#[test]
fn non_array_payload_is_a_load_error() {
    assert!(decode_records(br#"{"records": []}"#).is_err());
}

#[test]
fn matching_is_accent_and_case_insensitive() {
    let records = decode_records(PAYLOAD.as_bytes()).expect("array payload");
    let catalog = catalog();

    let maria = evaluate(&records[0], &catalog);
    assert_eq!(maria.matched_count, 2);
    assert_eq!(maria.total_items, 6);
    assert_eq!(maria.match_percent, 33);

    let jorge = evaluate(&records[1], &catalog);
    assert!(jorge
        .obligatorio
        .matched
        .contains(&"NET Core, ASP.NET, y C++".to_string()));
    assert!(jorge.obligatorio.matched.contains(&"Angular".to_string()));

    let elena = evaluate(&records[2], &catalog);
    assert_eq!(elena.group, None);
    assert_eq!(elena.match_percent, 0);
}

#[test]
fn filter_paginate_and_export_agree() {
    let records = decode_records(PAYLOAD.as_bytes()).expect("array payload");
    let criteria = FilterCriteria {
        program: Some("SISTEMAS".to_string()),
        ..FilterCriteria::default()
    };

    let filtered = filter_records(&records, &criteria);
    assert_eq!(filtered.len(), 2);
    assert_eq!(paginate(&filtered, 0, 1)[0].curp, "PESM000101MDFRTRA1");
    assert!(paginate(&filtered, 2, 1).is_empty());

    let mut view = DashboardView::new(1);
    view.set_criteria(criteria);
    view.go_to_page(1);
    let page = view.render(&records);
    assert_eq!(page.items[0].curp, "RIEL980303MDFSLN03");

    let csv = String::from_utf8(export_csv(filtered).expect("csv")).expect("utf8");
    let mut lines = csv.lines().skip(1);
    assert!(lines
        .next()
        .expect("first row")
        .starts_with("\"María\",\"Pérez\",\"Soto\""));
    assert!(lines
        .next()
        .expect("second row")
        .ends_with("\"8.0\",\"Titulado\""));
}

#[test]
fn attachment_links_force_download() {
    let records = decode_records(PAYLOAD.as_bytes()).expect("array payload");
    let url = build_download_url(records[0].attachment_url(), "María Pérez.pdf");
    assert_eq!(
        url.as_deref(),
        Some("https://res.example.com/demo/raw/upload/fl_attachment:Maria_Perez.pdf/v1/maria.pdf")
    );
    assert_eq!(build_download_url(records[1].attachment_url(), "x.pdf"), None);
}
