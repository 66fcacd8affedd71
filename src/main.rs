use anyhow::{anyhow, bail, Context, Result};
use crossterm::style::Stylize;
use filterable_table::config::config::Config;
use filterable_table::config::table_config::TableConfig;
use filterable_table::data::datatable_loaders::load_datatable;
use filterable_table::data::export_worker::{request_export, wait_for_export};
use filterable_table::logging::init_tracing;
use filterable_table::{trace_export, DataView, ExportFormat, FilterMap, PageState};
use std::path::{Path, PathBuf};
use std::sync::Arc;

mod table_display;

use table_display::{display_page, display_page_links};

#[derive(Debug, Default)]
struct CliArgs {
    data_file: Option<PathBuf>,
    columns: Option<PathBuf>,
    filter: Option<String>,
    preset: Option<String>,
    sorts: Vec<usize>,
    page: Option<usize>,
    rows: Option<usize>,
    export: Option<PathBuf>,
    format: Option<ExportFormat>,
    generate_config: bool,
    help: bool,
}

impl CliArgs {
    fn parse<I: Iterator<Item = String>>(mut args: I) -> Result<Self> {
        let mut parsed = CliArgs::default();

        while let Some(arg) = args.next() {
            let mut value = |flag: &str| {
                args.next()
                    .ok_or_else(|| anyhow!("{} expects a value", flag))
            };

            match arg.as_str() {
                "--help" | "-h" => parsed.help = true,
                "--generate-config" => parsed.generate_config = true,
                "--columns" => parsed.columns = Some(PathBuf::from(value("--columns")?)),
                "--filter" => parsed.filter = Some(value("--filter")?),
                "--preset" => parsed.preset = Some(value("--preset")?),
                "--sort" => parsed.sorts.push(parse_number("--sort", &value("--sort")?)?),
                "--page" => parsed.page = Some(parse_number("--page", &value("--page")?)?),
                "--rows" => parsed.rows = Some(parse_number("--rows", &value("--rows")?)?),
                "--export" => parsed.export = Some(PathBuf::from(value("--export")?)),
                "--format" => parsed.format = Some(value("--format")?.parse()?),
                flag if flag.starts_with("--") => bail!("Unknown option {}", flag),
                _ => {
                    if parsed.data_file.is_some() {
                        bail!("Only one data file can be shown at a time");
                    }
                    parsed.data_file = Some(PathBuf::from(&arg));
                }
            }
        }

        Ok(parsed)
    }
}

fn parse_number(flag: &str, value: &str) -> Result<usize> {
    value
        .parse()
        .with_context(|| format!("{} expects a non-negative integer, got '{}'", flag, value))
}

fn print_help() {
    println!("{}", "Filterable table - filter, sort, page and export tabular data".blue().bold());
    println!();
    println!("{}", "Usage:".yellow());
    println!("  filterable-table [OPTIONS] <FILE.csv|FILE.json>");
    println!();
    println!("{}", "Options:".yellow());
    println!("  {}  - Column labels, visibility and filters", "--columns <cfg.json|cfg.toml>".green());
    println!("  {}           - Filter map as JSON", "--filter <JSON>".green());
    println!("  {}         - Filter preset from the config file", "--preset <LABEL>".green());
    println!("  {}    - Sort by column (repeat to toggle direction)", "--sort <N>".green());
    println!("  {}              - Page to show (starts at 1)", "--page <N>".green());
    println!("  {}              - Rows per page", "--rows <N>".green());
    println!("  {}         - Export every filtered row", "--export <PATH>".green());
    println!("  {} - Export format", "--format <csv|tsv|json>".green());
    println!("  {}     - Generate config file with defaults", "--generate-config".green());
    println!();
    println!("{}", "Filter example:".yellow());
    println!(r#"  --filter '{{"site": {{"value": "MTL", "exactMatch": true}}, "age": {{"value": 30}}}}'"#);
    println!();
}

fn generate_config() -> Result<()> {
    let path = Config::get_config_path()?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Error creating config directory {:?}", parent))?;
    }
    std::fs::write(&path, Config::create_default_with_comments())
        .with_context(|| format!("Error writing config file {:?}", path))?;

    println!("Configuration file created at: {:?}", path);
    println!("Edit this file to customize page sizes, export and filter presets.");
    Ok(())
}

fn load_config() -> Config {
    match Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", format!("Using default configuration: {:#}", e).yellow());
            Config::default()
        }
    }
}

/// Preset first, then the explicit filter on top of it
fn build_filter(args: &CliArgs, config: &Config) -> Result<FilterMap> {
    let mut filter = match &args.preset {
        Some(label) => config
            .find_preset(label)
            .map(|preset| preset.filter.clone())
            .ok_or_else(|| anyhow!("No filter preset named '{}'", label))?,
        None => FilterMap::new(),
    };

    if let Some(json) = &args.filter {
        let explicit: FilterMap =
            serde_json::from_str(json).context("Failed to parse --filter JSON")?;
        for (name, entry) in explicit.iter() {
            filter.insert(name, entry.clone());
        }
    }

    Ok(filter)
}

fn export_view(view: &DataView, target: &Path, format: ExportFormat, prefix: &str) -> Result<()> {
    let request = view.export_request();
    trace_export!(view.row_count(), format);

    let receiver = request_export(request, format, prefix);
    let (filename, payload) = wait_for_export(&receiver)?;

    let path = if target.is_dir() {
        target.join(&filename)
    } else {
        target.to_path_buf()
    };
    std::fs::write(&path, &payload)
        .with_context(|| format!("Failed to write export to {:?}", path))?;

    println!(
        "{}",
        format!("Exported {} rows to {}", view.row_count(), path.display()).green()
    );
    Ok(())
}

fn run(args: CliArgs) -> Result<()> {
    let config = load_config();
    init_tracing(&config.logging.level);

    let Some(data_file) = &args.data_file else {
        print_help();
        bail!("No data file given");
    };

    let mut table = load_datatable(data_file)?;
    let table_config = match &args.columns {
        Some(columns_path) => TableConfig::load(columns_path)?,
        None => TableConfig::inferred(&table),
    };
    table_config.apply(&mut table);

    let filter = build_filter(&args, &config)?.validated(&table.columns);
    let mut view = DataView::new(Arc::new(table));
    view.apply_filter(filter);

    for &column in &args.sorts {
        view.sort_by(column)?;
    }

    let rows = args.rows.unwrap_or(config.view.default_page_size);
    let mut page = PageState::new(args.page.unwrap_or(1), rows)?;
    if view.sync_page(&mut page) {
        eprintln!("{}", "Requested page is past the end, showing page 1".yellow());
    }

    display_page(&view.render_page(&page));
    display_page_links(view.row_count(), view.raw_row_count(), &page);

    if let Some(target) = &args.export {
        let format = args.format.unwrap_or(config.export.format);
        export_view(&view, target, format, &config.export.filename_prefix)?;
    }

    Ok(())
}

fn main() {
    let args = match CliArgs::parse(std::env::args().skip(1)) {
        Ok(args) => args,
        Err(e) => {
            eprintln!("{}", format!("Error: {:#}", e).red());
            eprintln!("Run with --help for usage.");
            std::process::exit(2);
        }
    };

    if args.help {
        print_help();
        return;
    }

    if args.generate_config {
        if let Err(e) = generate_config() {
            eprintln!("{}", format!("Error: {:#}", e).red());
            std::process::exit(1);
        }
        return;
    }

    if let Err(e) = run(args) {
        eprintln!("{}", format!("Error: {:#}", e).red());
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<CliArgs> {
        CliArgs::parse(args.iter().map(|s| s.to_string()))
    }

    #[test]
    fn test_parse_full_command_line() {
        let args = parse(&[
            "candidates.csv",
            "--sort",
            "2",
            "--sort",
            "2",
            "--rows",
            "50",
            "--format",
            "json",
        ])
        .unwrap();

        assert_eq!(args.data_file, Some(PathBuf::from("candidates.csv")));
        assert_eq!(args.sorts, vec![2, 2]);
        assert_eq!(args.rows, Some(50));
        assert_eq!(args.format, Some(ExportFormat::Json));
        assert!(args.export.is_none());
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        assert!(parse(&["--rows"]).is_err());
        assert!(parse(&["--page", "two"]).is_err());
        assert!(parse(&["--format", "xml"]).is_err());
        assert!(parse(&["--verbose"]).is_err());
        assert!(parse(&["a.csv", "b.csv"]).is_err());
    }

    #[test]
    fn test_explicit_filter_overrides_preset() {
        let config: Config = toml::from_str(
            r#"
            [[filter_presets]]
            label = "mtl"
            [filter_presets.filter.site]
            value = "MTL"
            [filter_presets.filter.active]
            value = true
            "#,
        )
        .unwrap();
        let args = parse(&["x.csv", "--preset", "MTL", "--filter", r#"{"site": {"value": "OTT"}}"#])
            .unwrap();

        let filter = build_filter(&args, &config).unwrap();
        assert_eq!(filter.len(), 2);
        assert_eq!(
            filter.get("site").map(|e| e.value.clone()),
            Some(filterable_table::FilterValue::from("OTT"))
        );
    }

    #[test]
    fn test_unknown_preset_is_an_error() {
        let args = parse(&["x.csv", "--preset", "nope"]).unwrap();
        assert!(build_filter(&args, &Config::default()).is_err());
    }
}
