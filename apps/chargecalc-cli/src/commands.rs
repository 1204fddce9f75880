//! Command handlers.
//!
//! Each handler writes to the given sink and returns the process exit code,
//! so the binary stays a thin orchestration layer and the handlers can be
//! tested against an in-memory buffer.

use std::io::Write;
use std::process::ExitCode;

use anyhow::Context;
use chargecalc_core::catalog::CatalogExportRow;
use chargecalc_core::validation::ConfigurationValidator;
use chargecalc_core::{
    BaseItemKind, CalculationTypeCatalog, ChargeConfiguration, ChargeRole, ChargeTime, Code,
};
use serde::Serialize;
use tracing::{debug, info};

use crate::config::OutputFormat;

// =============================================================================
// Output Shapes
// =============================================================================

#[derive(Debug, Serialize)]
struct EntryView {
    id: i32,
    code: Option<String>,
    label: String,
    acronym: String,
    components: Vec<BaseItemKind>,
}

#[derive(Debug, Serialize)]
struct DecodeView {
    code: String,
    positions: Vec<usize>,
    components: Vec<BaseItemKind>,
    entry: Option<CatalogExportRow>,
}

#[derive(Debug, Serialize)]
struct VerifyView {
    name: String,
    role: ChargeRole,
    charge_time: ChargeTime,
    code: String,
    valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    error_code: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<String>,
}

fn write_json<T: Serialize>(out: &mut impl Write, value: &T) -> anyhow::Result<()> {
    serde_json::to_writer_pretty(&mut *out, value).context("Failed to serialize output")?;
    writeln!(out)?;
    Ok(())
}

fn components(
    catalog: &CalculationTypeCatalog,
    positions: impl IntoIterator<Item = usize>,
) -> Vec<BaseItemKind> {
    positions
        .into_iter()
        .filter_map(|position| catalog.base_items().item(position))
        .map(|item| item.kind)
        .collect()
}

// =============================================================================
// export
// =============================================================================

/// Lists the catalog, optionally restricted to entries containing every
/// given component.
pub fn export(
    catalog: &CalculationTypeCatalog,
    containing: &[BaseItemKind],
    format: OutputFormat,
    out: &mut impl Write,
) -> anyhow::Result<ExitCode> {
    let rows: Vec<CatalogExportRow> = if containing.is_empty() {
        catalog.export()
    } else {
        catalog
            .combinations_containing(containing)
            .into_iter()
            .map(CatalogExportRow::from)
            .collect()
    };
    info!(rows = rows.len(), filter = ?containing, "Exporting calculation types");

    match format {
        OutputFormat::Json => write_json(out, &rows)?,
        OutputFormat::Table => {
            let code_width = catalog.base_items().full_width().max(4);
            writeln!(out, "{:>6}  {:<code_width$}  LABEL", "ID", "CODE")?;
            for row in &rows {
                writeln!(
                    out,
                    "{:>6}  {:<code_width$}  {}",
                    row.id,
                    row.code.as_deref().unwrap_or("-"),
                    row.label
                )?;
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}

// =============================================================================
// lookup
// =============================================================================

/// Shows one entry by numeric id. Unknown ids print the `INVALID` sentinel
/// and fail.
pub fn lookup(
    catalog: &CalculationTypeCatalog,
    id: i32,
    format: OutputFormat,
    out: &mut impl Write,
) -> anyhow::Result<ExitCode> {
    let entry = catalog.resolve_id(id);
    let view = EntryView {
        id: entry.id.value(),
        code: entry.code.as_ref().map(Code::to_string),
        label: entry.label.clone(),
        acronym: entry.acronym.clone(),
        components: components(catalog, entry.combination.iter().copied()),
    };

    match format {
        OutputFormat::Json => write_json(out, &view)?,
        OutputFormat::Table => {
            writeln!(out, "{}", entry)?;
            writeln!(out, "acronym: {}", view.acronym)?;
            if !view.components.is_empty() {
                let names: Vec<&str> = view.components.iter().map(|kind| kind.as_str()).collect();
                writeln!(out, "components: {}", names.join(", "))?;
            }
        }
    }

    if entry.is_invalid() {
        debug!(id, "Unknown calculation type id");
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}

// =============================================================================
// decode
// =============================================================================

/// Expands a code into its components and the matching entry, if any.
pub fn decode(
    catalog: &CalculationTypeCatalog,
    code: &Code,
    format: OutputFormat,
    out: &mut impl Write,
) -> anyhow::Result<ExitCode> {
    let positions = catalog.decode(code)?;
    let entry = catalog
        .lookup_code(code)
        .ok()
        .map(CatalogExportRow::from);

    let view = DecodeView {
        code: code.to_string(),
        components: components(catalog, positions.iter().copied()),
        positions: positions.into_iter().collect(),
        entry,
    };

    match format {
        OutputFormat::Json => write_json(out, &view)?,
        OutputFormat::Table => {
            writeln!(out, "code: {}", view.code)?;
            for (position, kind) in view.positions.iter().zip(&view.components) {
                writeln!(out, "  [{}] {}", position, kind.default_label())?;
            }
            match &view.entry {
                Some(row) => writeln!(out, "entry: {} {}", row.id, row.label)?,
                None => writeln!(out, "entry: none")?,
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}

// =============================================================================
// verify
// =============================================================================

/// Checks a charge configuration and reports the verdict. Fails on violation.
pub fn verify(
    catalog: &CalculationTypeCatalog,
    config: &ChargeConfiguration,
    format: OutputFormat,
    out: &mut impl Write,
) -> anyhow::Result<ExitCode> {
    let validator = ConfigurationValidator::new(catalog.base_items());
    let verdict = validator.verify(config);

    let view = VerifyView {
        name: config.name.clone(),
        role: config.role,
        charge_time: config.charge_time,
        code: config.declared_code.to_string(),
        valid: verdict.is_ok(),
        error_code: verdict.as_ref().err().map(|err| err.error_code()),
        reason: verdict.as_ref().err().map(|err| err.reason().to_string()),
    };

    match format {
        OutputFormat::Json => write_json(out, &view)?,
        OutputFormat::Table => match &verdict {
            Ok(()) => writeln!(out, "ok: '{}' ({}) accepts {}", view.name, view.role, view.code)?,
            Err(err) => writeln!(out, "{}: {}", err.error_code(), err)?,
        },
    }

    Ok(if verdict.is_ok() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

// =============================================================================
// Unit Tests
// =============================================================================
