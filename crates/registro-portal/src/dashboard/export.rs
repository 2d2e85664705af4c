use chrono::NaiveDate;

use crate::records::CandidateRecord;

const BOM: &str = "\u{feff}";

pub const EXPORT_HEADERS: [&str; 12] = [
    "Nombre",
    "Apellido Paterno",
    "Apellido Materno",
    "CURP",
    "Teléfono Casa",
    "Teléfono Celular",
    "Correo Personal",
    "Institución",
    "Carrera",
    "Grupo",
    "Promedio",
    "Estado",
];

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("failed to write CSV row: {0}")]
    Csv(#[from] csv::Error),
    #[error("failed to flush CSV buffer: {0}")]
    Io(#[from] std::io::Error),
}

/// Serializes records as a BOM-prefixed UTF-8 CSV with every cell quoted.
pub fn export_csv<'a, I>(records: I) -> Result<Vec<u8>, ExportError>
where
    I: IntoIterator<Item = &'a CandidateRecord>,
{
    let mut buffer = BOM.as_bytes().to_vec();
    {
        let mut writer = csv::WriterBuilder::new()
            .quote_style(csv::QuoteStyle::Always)
            .double_quote(true)
            .terminator(csv::Terminator::Any(b'\n'))
            .from_writer(&mut buffer);

        writer.write_record(EXPORT_HEADERS)?;
        for record in records {
            writer.write_record(export_row(record))?;
        }
        writer.flush()?;
    }
    Ok(buffer)
}

fn export_row(record: &CandidateRecord) -> [String; 12] {
    [
        record.nombre.clone(),
        record.apellido_paterno.clone(),
        record.apellido_materno.clone(),
        record.curp.clone(),
        record.telefono_casa.clone(),
        record.telefono_celular.clone(),
        record.correo_personal.clone(),
        record.institution().to_string(),
        record.carrera.clone(),
        record.grupo.clone(),
        record.promedio.clone(),
        record.status_label(),
    ]
}

/// `registros_estudiantes_<YYYY-MM-DD>.csv`
pub fn export_file_name(date: NaiveDate) -> String {
    format!("registros_estudiantes_{}.csv", date.format("%Y-%m-%d"))
}
