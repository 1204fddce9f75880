//! # chargecalc
//!
//! Command line front end for the charge calculation type catalog.
//!
//! ## Usage
//! ```text
//! chargecalc export [--json] [--containing flat,honorarios]
//! chargecalc lookup 109
//! chargecalc decode 1000000010
//! chargecalc verify --role flat-honorarios --code 1000000010 --name Honorarios
//! ```
//!
//! `verify` exits with a non-zero status when the configuration is rejected.

mod commands;
mod config;

use std::borrow::Cow;
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use chargecalc_core::base_item::BaseItemCatalog;
use chargecalc_core::{
    standard_catalog, BaseItemKind, CalculationTypeCatalog, ChargeConfiguration, ChargeRole,
    ChargeTime, Code, DEFAULT_COMBINATION_ID_BASE,
};
use clap::{Args, Parser, Subcommand};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use crate::config::{CliConfig, OutputFormat};

#[derive(Parser, Debug)]
#[command(
    name = "chargecalc",
    about = "Inspect charge calculation types and check charge configurations",
    version
)]
struct Cli {
    /// Path to a TOML config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Override the combination id base
    #[arg(long, global = true)]
    id_base: Option<i32>,

    /// Output format (table or json)
    #[arg(long, global = true)]
    format: Option<OutputFormat>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List every calculation type
    Export(ExportArgs),
    /// Show the calculation type with the given numeric id
    Lookup {
        id: i32,
    },
    /// Expand a code into its components
    Decode {
        #[arg(value_parser = parse_code)]
        code: Code,
    },
    /// Check a charge configuration against its calculation type code
    Verify(VerifyArgs),
}

#[derive(Args, Debug)]
struct ExportArgs {
    /// Shorthand for --format json
    #[arg(long)]
    json: bool,
    /// Only combinations containing all of these components
    #[arg(long, value_delimiter = ',')]
    containing: Vec<BaseItemKind>,
}

#[derive(Args, Debug)]
struct VerifyArgs {
    /// Charge role (e.g. penalty, aval, flat-honorarios)
    #[arg(long)]
    role: ChargeRole,
    /// Declared calculation type code
    #[arg(long, value_parser = parse_code)]
    code: Code,
    /// Charge time; defaults to overdue-installment for penalties and
    /// installment-fee otherwise
    #[arg(long)]
    time: Option<ChargeTime>,
    /// The charge references an interest rate
    #[arg(long)]
    interest_rate_linked: bool,
    /// The charge takes its percentage from the rate table
    #[arg(long)]
    percent_from_table: bool,
    /// Display name reported in violations
    #[arg(long, default_value = "charge")]
    name: String,
}

impl VerifyArgs {
    fn into_configuration(self) -> ChargeConfiguration {
        let time = self.time.unwrap_or(if self.role.is_penalty() {
            ChargeTime::OverdueInstallment
        } else {
            ChargeTime::InstallmentFee
        });

        let mut config = ChargeConfiguration::new(self.name, self.role, time, self.code);
        if self.interest_rate_linked {
            config = config.with_interest_rate_link();
        }
        if self.percent_from_table {
            config = config.with_percentage_from_table();
        }
        config
    }
}

fn parse_code(input: &str) -> Result<Code, String> {
    Code::parse(input).map_err(|err| err.to_string())
}

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    let (mut config, report) =
        CliConfig::load(cli.config.clone()).context("Failed to load configuration")?;
    config.apply_flags(cli.id_base, cli.format);

    init_tracing(&config.output.log_filter);
    report.log();

    config.validate().context("Invalid configuration")?;
    debug!(?config, "Configuration loaded");

    let catalog = load_catalog(config.catalog.combination_id_base)?;
    let format = config.output.format;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    let status = match cli.command {
        Command::Export(args) => {
            let format = if args.json { OutputFormat::Json } else { format };
            commands::export(&catalog, &args.containing, format, &mut out)?
        }
        Command::Lookup { id } => commands::lookup(&catalog, id, format, &mut out)?,
        Command::Decode { code } => commands::decode(&catalog, &code, format, &mut out)?,
        Command::Verify(args) => {
            commands::verify(&catalog, &args.into_configuration(), format, &mut out)?
        }
    };

    out.flush()?;
    Ok(status)
}

/// Initializes the tracing subscriber on stderr.
///
/// `RUST_LOG` takes precedence over the configured filter.
fn init_tracing(default_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// The shared standard catalog for the default base, a fresh one otherwise.
fn load_catalog(id_base: i32) -> anyhow::Result<Cow<'static, CalculationTypeCatalog>> {
    if id_base == DEFAULT_COMBINATION_ID_BASE {
        return Ok(Cow::Borrowed(standard_catalog()));
    }

    info!(id_base, "Building catalog with custom id base");
    let catalog = CalculationTypeCatalog::build(BaseItemCatalog::standard(), id_base)
        .with_context(|| format!("Failed to build catalog with id base {}", id_base))?;
    Ok(Cow::Owned(catalog))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verify_args_default_time_follows_role() {
        let cli = Cli::try_parse_from([
            "chargecalc",
            "verify",
            "--role",
            "penalty",
            "--code",
            "0000101111",
            "--interest-rate-linked",
        ])
        .unwrap();

        let Command::Verify(args) = cli.command else {
            panic!("expected verify");
        };
        let config = args.into_configuration();
        assert_eq!(config.charge_time, ChargeTime::OverdueInstallment);
        assert!(config.interest_rate_linked);
        assert!(!config.gets_percentage_from_table);
    }

    #[test]
    fn test_export_containing_list() {
        let cli = Cli::try_parse_from([
            "chargecalc",
            "--format",
            "json",
            "export",
            "--containing",
            "flat,HO",
        ])
        .unwrap();

        assert_eq!(cli.format, Some(OutputFormat::Json));
        let Command::Export(args) = cli.command else {
            panic!("expected export");
        };
        assert_eq!(
            args.containing,
            vec![BaseItemKind::Flat, BaseItemKind::Honorarios]
        );
    }

    #[test]
    fn test_malformed_code_is_rejected_by_parser() {
        assert!(Cli::try_parse_from(["chargecalc", "decode", "10x1"]).is_err());
    }

    #[test]
    fn test_custom_base_builds_fresh_catalog() {
        let catalog = load_catalog(500).unwrap();
        assert_eq!(catalog.id_base(), 500);
        assert!(matches!(load_catalog(DEFAULT_COMBINATION_ID_BASE).unwrap(), Cow::Borrowed(_)));
        assert!(load_catalog(5).is_err());
    }
}
