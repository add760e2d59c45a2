//! Split a DSLIP PDF by producer
//!
//! With no arguments the current directory is scanned for the source PDF
//! (names containing "dslip" preferred) and the reference workbook (names
//! containing "produttori" preferred); outputs go to `./output`.
//!
//! Usage:
//!   dslip_split
//!   dslip_split --source dslip.pdf --table produttori.xlsx --output-dir out
//!   dslip_split --assign 12=ROSSI --zip
//!   dslip_split --preview

use std::path::PathBuf;
use std::process;

use dslip_split::pipeline::{self, Analysis};
use dslip_split::{ColumnMapping, DuplicatePolicy, SplitConfig};

struct CliOptions {
    config: SplitConfig,
    preview: bool,
    json: bool,
    verbose: bool,
}

impl CliOptions {
    fn from_args() -> Result<Self, String> {
        let args: Vec<String> = std::env::args().collect();
        let mut config = SplitConfig::new(".");
        let mut columns = ColumnMapping::default();
        let mut preview = false;
        let mut json = false;
        let mut verbose = false;

        let mut i = 1;
        while i < args.len() {
            let flag = args[i].as_str();
            let mut value = || {
                i += 1;
                args.get(i)
                    .cloned()
                    .ok_or_else(|| format!("missing value for {}", flag))
            };
            match flag {
                "--dir" => config.working_dir = PathBuf::from(value()?),
                "--source" => config.source = Some(PathBuf::from(value()?)),
                "--table" => config.table = Some(PathBuf::from(value()?)),
                "--output-dir" => config.output_dir = Some(PathBuf::from(value()?)),
                "--producer-column" => columns.producer = value()?,
                "--identifier-column" => columns.identifier = value()?,
                "--client-column" => columns.client = value()?,
                "--header-row" => {
                    let raw = value()?;
                    let row: usize = raw
                        .parse()
                        .map_err(|_| format!("invalid --header-row: {}", raw))?;
                    if row == 0 {
                        return Err("--header-row is 1-based".to_string());
                    }
                    config.header_row = row - 1;
                },
                "--assign" => {
                    let raw = value()?;
                    let (page, producer) = raw
                        .split_once('=')
                        .ok_or_else(|| format!("expected PAGE=PRODUCER, got {}", raw))?;
                    let page: u32 = page
                        .trim()
                        .parse()
                        .map_err(|_| format!("invalid page in --assign: {}", raw))?;
                    config.manual_assignments.insert(page, producer.trim().to_string());
                },
                "--strict" => config.duplicate_policy = DuplicatePolicy::Reject,
                "--zip" => config.bundle = true,
                "--preview" => preview = true,
                "--json" => json = true,
                "--verbose" | "-v" => verbose = true,
                other => return Err(format!("unknown argument: {}", other)),
            }
            i += 1;
        }

        config.columns = columns;
        Ok(Self {
            config,
            preview,
            json,
            verbose,
        })
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default)).init();
}

fn print_preview(analysis: &Analysis) {
    println!("{:>6}  {:<16}  {:<32}  PRODUTTORE", "PAGINA", "NUMERO", "CLIENTE");
    for page in &analysis.resolved {
        println!(
            "{:>6}  {:<16}  {:<32}  {}",
            page.page_number(),
            page.page.extracted_identifier.as_deref().unwrap_or("-"),
            page.page.extracted_client_label.as_deref().unwrap_or("-"),
            page.producer.as_deref().unwrap_or("-")
        );
    }
    let seg = &analysis.segmentation;
    println!(
        "\n{} pagine, {} con produttore, {} senza produttore",
        seg.total_pages,
        seg.matched_pages(),
        seg.unresolved_pages()
    );
}

fn execute(options: &CliOptions) -> Result<(), Box<dyn std::error::Error>> {
    if options.preview {
        let analysis = pipeline::preview(&options.config)?;
        print_preview(&analysis);
        return Ok(());
    }

    let summary = pipeline::run(&options.config)?;
    if options.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    println!("Produttore                          Pagine  File");
    for producer in &summary.producers {
        println!("{:<34}  {:>6}  {}", producer.producer, producer.pages, producer.file);
    }
    println!(
        "\n{} pagine totali, {} assegnate, {} senza produttore",
        summary.total_pages, summary.matched_pages, summary.unmatched_pages
    );
    println!("Output: {}", summary.output_dir.display());
    Ok(())
}

fn main() {
    let options = match CliOptions::from_args() {
        Ok(options) => options,
        Err(e) => {
            println!("Errore: {}", e);
            process::exit(1);
        },
    };
    init_logging(options.verbose);

    if let Err(e) = execute(&options) {
        println!("Errore: {}", e);
        process::exit(1);
    }
}
