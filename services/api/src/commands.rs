use crate::infra::parse_date;
use chrono::{Local, NaiveDate};
use clap::Args;
use registro_portal::catalog::RequirementsCatalog;
use registro_portal::client::{Attachment, PortalClient, RecordSource};
use registro_portal::config::AppConfig;
use registro_portal::dashboard::{
    build_download_url, export_csv, export_file_name, filter_records, DashboardView,
    FilterCriteria,
};
use registro_portal::error::AppError;
use registro_portal::matching::{evaluate, CategoryBreakdown};
use registro_portal::records::find_by_curp;
use registro_portal::registration::{RegistrationDraft, RegistrationFlow};
use registro_portal::telemetry;
use std::fs;
use std::path::PathBuf;

#[derive(Args, Debug, Default, Clone)]
pub(crate) struct FilterArgs {
    /// Case-insensitive match against full name, CURP or personal email
    #[arg(long)]
    pub(crate) search: Option<String>,
    /// Exact program (carrera) to keep
    #[arg(long)]
    pub(crate) program: Option<String>,
    /// Exact stored status to keep (e.g. regular, titulado)
    #[arg(long)]
    pub(crate) status: Option<String>,
    /// Inclusive lower bound on the average
    #[arg(long)]
    pub(crate) min_average: Option<f64>,
    /// Inclusive upper bound on the average
    #[arg(long)]
    pub(crate) max_average: Option<f64>,
}

impl FilterArgs {
    fn criteria(&self) -> FilterCriteria {
        FilterCriteria {
            search: self.search.clone().unwrap_or_default(),
            program: self.program.clone(),
            status: self.status.clone(),
            min_average: self.min_average,
            max_average: self.max_average,
        }
    }
}

#[derive(Args, Debug)]
pub(crate) struct ListArgs {
    #[command(flatten)]
    pub(crate) filter: FilterArgs,
    /// Zero-based page index
    #[arg(long, default_value_t = 0)]
    pub(crate) page: usize,
    /// Rows per page (defaults to DASHBOARD_PAGE_SIZE)
    #[arg(long)]
    pub(crate) page_size: Option<usize>,
}

#[derive(Args, Debug)]
pub(crate) struct ExportArgs {
    #[command(flatten)]
    pub(crate) filter: FilterArgs,
    /// Destination file (defaults to registros_estudiantes_<date>.csv)
    #[arg(long)]
    pub(crate) output: Option<PathBuf>,
    /// Date used in the default file name (defaults to today)
    #[arg(long, value_parser = parse_date)]
    pub(crate) date: Option<NaiveDate>,
}

#[derive(Args, Debug)]
pub(crate) struct MatchArgs {
    /// CURP of the candidate to evaluate
    #[arg(long)]
    pub(crate) curp: String,
}

#[derive(Args, Debug)]
pub(crate) struct DownloadUrlArgs {
    /// Stored attachment URL
    pub(crate) url: String,
    /// Desired save-as file name
    #[arg(long, default_value = "documento.pdf")]
    pub(crate) name: String,
}

#[derive(Args, Debug)]
pub(crate) struct CatalogCheckArgs {
    /// Catalog file to validate (defaults to REQUIREMENTS_CATALOG_PATH or the embedded catalog)
    #[arg(long)]
    pub(crate) path: Option<PathBuf>,
    /// Also fetch records and list group titles the catalog does not know
    #[arg(long)]
    pub(crate) against_records: bool,
}

#[derive(Args, Debug)]
pub(crate) struct RegisterArgs {
    /// JSON object keyed by form field names (nombre, curp, grupo, fulfilled, ...)
    #[arg(long)]
    pub(crate) form: PathBuf,
    /// Optional CV to upload as the `pdf` part
    #[arg(long)]
    pub(crate) pdf: Option<PathBuf>,
    /// Validate and print the payload without submitting it
    #[arg(long)]
    pub(crate) dry_run: bool,
}

struct PortalContext {
    config: AppConfig,
    catalog: RequirementsCatalog,
    client: PortalClient,
}

fn portal_context() -> Result<PortalContext, AppError> {
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;
    let catalog = RequirementsCatalog::load(config.portal.catalog_path.as_deref())?;
    let client = PortalClient::new(
        config.portal.formulation_url.clone(),
        config.portal.request_timeout(),
    )?;

    Ok(PortalContext {
        config,
        catalog,
        client,
    })
}

pub(crate) async fn run_records_list(args: ListArgs) -> Result<(), AppError> {
    let context = portal_context()?;
    let records = context.client.fetch_records().await?;

    let mut view = DashboardView::new(args.page_size.unwrap_or(context.config.portal.page_size));
    view.set_criteria(args.filter.criteria());
    view.go_to_page(args.page);
    let page = view.render(&records);

    println!(
        "Records page {}/{} ({} matching of {} loaded)",
        page.page_index + 1,
        page.page_count.max(1),
        page.total,
        records.len()
    );
    if page.items.is_empty() {
        println!("- no records on this page");
    }
    for record in &page.items {
        println!(
            "- {} | {} | {} | avg {} | {} | {}",
            record.full_name(),
            record.curp,
            display_or_dash(&record.carrera),
            display_or_dash(&record.promedio),
            display_or_dash(&record.status_label()),
            display_or_dash(&record.grupo),
        );
    }

    Ok(())
}

pub(crate) async fn run_records_export(args: ExportArgs) -> Result<(), AppError> {
    let context = portal_context()?;
    let records = context.client.fetch_records().await?;
    let matching = filter_records(&records, &args.filter.criteria());
    let count = matching.len();
    let bytes = export_csv(matching)?;

    let date = args.date.unwrap_or_else(|| Local::now().date_naive());
    let output = args
        .output
        .unwrap_or_else(|| PathBuf::from(export_file_name(date)));
    fs::write(&output, bytes)?;

    println!("Exported {} records to {}", count, output.display());
    Ok(())
}

pub(crate) async fn run_records_match(args: MatchArgs) -> Result<(), AppError> {
    let context = portal_context()?;
    let records = context.client.fetch_records().await?;
    let record = find_by_curp(&records, &args.curp)
        .ok_or_else(|| AppError::NotFound(format!("no record with CURP {}", args.curp)))?;

    let result = evaluate(record, &context.catalog);
    println!("{} ({})", record.full_name(), record.curp);
    println!(
        "Group: {}",
        result.group.as_deref().unwrap_or("(not in catalog)")
    );
    println!(
        "Coverage: {}/{} items ({}%)",
        result.matched_count, result.total_items, result.match_percent
    );
    render_breakdown("Mandatory", &result.obligatorio);
    render_breakdown("Desirable", &result.deseable);
    if result.levels_scored {
        render_breakdown("Levels", &result.niveles);
    } else {
        render_breakdown("Levels (not scored)", &result.niveles);
    }
    if let Some(url) = record.attachment_url() {
        println!("CV: {url}");
    }

    Ok(())
}

pub(crate) fn run_download_url(args: DownloadUrlArgs) -> Result<(), AppError> {
    match build_download_url(Some(&args.url), &args.name) {
        Some(url) => println!("{url}"),
        None => println!("no attachment URL provided"),
    }
    Ok(())
}

pub(crate) async fn run_catalog_check(args: CatalogCheckArgs) -> Result<(), AppError> {
    let context = portal_context()?;
    let catalog = match args.path.as_deref() {
        Some(path) => RequirementsCatalog::load(Some(path))?,
        None => context.catalog,
    };

    println!("Requirements catalog {} is valid", catalog.version);
    for group in &catalog.groups {
        println!(
            "- {} {} | {} mandatory | {} desirable | {} levels{}",
            group.id,
            group.title,
            group.obligatorio.len(),
            group.deseable.len(),
            group.levels().len(),
            if group.has_custom_levels() {
                ""
            } else {
                " (default)"
            }
        );
    }

    if args.against_records {
        let records = context.client.fetch_records().await?;
        let unknown = catalog.unknown_titles(records.iter().map(|record| record.grupo.as_str()));
        if unknown.is_empty() {
            println!("All {} records reference known groups", records.len());
        } else {
            println!("Group titles on records missing from the catalog:");
            for title in unknown {
                println!("  - {title}");
            }
        }
    }

    Ok(())
}

pub(crate) async fn run_register(args: RegisterArgs) -> Result<(), AppError> {
    let context = portal_context()?;
    let raw = fs::read_to_string(&args.form)?;
    let value: serde_json::Value = serde_json::from_str(&raw).map_err(|err| {
        AppError::InvalidInput(format!("{} is not valid JSON: {err}", args.form.display()))
    })?;

    let draft = RegistrationDraft::from_json(&value);
    let problems = draft.problems(&context.catalog);
    if let Some(first) = problems.first().cloned() {
        println!("The form has {} problem(s):", problems.len());
        for problem in &problems {
            println!("- {}: {}", problem.field.label(), problem.message);
        }
        return Err(first.into());
    }

    let flow = RegistrationFlow::with_draft(draft)
        .advance(&context.catalog)?
        .advance(&context.catalog)?;
    let payload = flow.confirm(&context.catalog)?;

    if args.dry_run {
        println!("Registration payload (not submitted):");
        for (name, value) in payload.text_parts() {
            println!("  {name}: {value}");
        }
        return Ok(());
    }

    let attachment = args
        .pdf
        .as_deref()
        .map(Attachment::from_path)
        .transpose()?;
    context.client.submit(&payload, attachment).await?;
    println!(
        "Registration submitted for CURP {} to {}",
        payload.curp(),
        context.client.formulation_url()
    );
    Ok(())
}

fn render_breakdown(label: &str, breakdown: &CategoryBreakdown) {
    if breakdown.total() == 0 {
        return;
    }
    println!(
        "{label} ({}/{}):",
        breakdown.matched.len(),
        breakdown.total()
    );
    for item in &breakdown.matched {
        println!("  [x] {item}");
    }
    for item in &breakdown.unmatched {
        println!("  [ ] {item}");
    }
}

fn display_or_dash(value: &str) -> &str {
    if value.trim().is_empty() {
        "-"
    } else {
        value
    }
}
