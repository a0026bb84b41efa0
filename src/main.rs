//! CLI entry point for `mbox2eaxs`.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::{Duration, Instant};

use clap::{CommandFactory, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};

use mbox2eaxs::config::{self, Config, ConversionSettings};
use mbox2eaxs::eaxs::validate_document;
use mbox2eaxs::{ConversionReport, Converter};

#[derive(Parser)]
#[command(
    name = "mbox2eaxs",
    version,
    about = "Convert mbox mail archives into EAXS XML for long-term preservation"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose logging (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert an mbox file, or a folder of mbox files, to EAXS
    Convert {
        /// mbox file or directory of mbox files
        input: PathBuf,
        /// Output folder for the XML, CSV and external content
        #[arg(short, long)]
        output: PathBuf,
        /// Globally unique URI identifying the account
        #[arg(long, value_name = "URI")]
        global_id: String,
        /// Owner addresses, comma separated
        #[arg(long, value_name = "ADDRESSES", default_value = "")]
        emails: String,
        /// Hash algorithm (SHA256, SHA384, SHA512, SHA1, MD5)
        #[arg(long, value_name = "NAME")]
        hash: Option<String>,
        /// Write attachments and binary bodies to side files
        #[arg(long, value_name = "BOOL")]
        save_external: Option<bool>,
        /// Wrap side files in a BodyContent XML document
        #[arg(long, value_name = "BOOL")]
        wrap_external: Option<bool>,
        /// Keep the declared transfer encoding when possible
        #[arg(long, value_name = "BOOL")]
        preserve_encoding: Option<bool>,
        /// Include Thunderbird-style sub-folders
        #[arg(long, value_name = "BOOL")]
        sub_folders: Option<bool>,
        /// One XML document per mbox when converting a folder
        #[arg(long, value_name = "BOOL")]
        one_file_per_mbox: Option<bool>,
        /// Folder for side files, relative to the document
        #[arg(long, value_name = "DIR")]
        external_folder: Option<String>,
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Re-check a written document: content model, LocalIds and hashes
    Validate {
        xml: PathBuf,
        #[arg(long)]
        json: bool,
    },
    /// Generate shell completions
    Completions {
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
    /// Generate a man page
    Manpage,
}

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    let config = config::load_config();

    // Configure logging: stderr + optional log file
    let log_level = match cli.verbose {
        0 => config.general.log_level.as_str(),
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    setup_logging(log_level, &config);

    match cli.command {
        Commands::Convert {
            input,
            output,
            global_id,
            emails,
            hash,
            save_external,
            wrap_external,
            preserve_encoding,
            sub_folders,
            one_file_per_mbox,
            external_folder,
            json,
        } => {
            let mut settings = config.conversion.clone();
            if let Some(hash) = hash {
                settings.hash_algorithm_name = hash;
            }
            if let Some(folder) = external_folder {
                settings.external_content_folder = folder;
            }
            apply(&mut settings.save_attachments_and_binary_content_externally, save_external);
            apply(&mut settings.wrap_external_content_in_xml, wrap_external);
            apply(
                &mut settings.preserve_content_transfer_encoding_if_possible,
                preserve_encoding,
            );
            apply(&mut settings.include_sub_folders, sub_folders);
            apply(&mut settings.one_file_per_mbox, one_file_per_mbox);
            cmd_convert(&input, &output, &global_id, &emails, settings, json)
        }
        Commands::Validate { xml, json } => cmd_validate(&xml, json),
        Commands::Completions { shell } => cmd_completions(shell),
        Commands::Manpage => cmd_manpage(),
    }
}

fn apply(target: &mut bool, flag: Option<bool>) {
    if let Some(value) = flag {
        *target = value;
    }
}

/// Set up tracing with stderr output and optional file logging.
fn setup_logging(level: &str, config: &Config) {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    let stderr_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    let log_dir = config::cache_dir(config);
    if std::fs::create_dir_all(&log_dir).is_ok() {
        let file_appender = tracing_appender::rolling::never(&log_dir, "mbox2eaxs.log");
        let file_layer = tracing_subscriber::fmt::layer()
            .with_ansi(false)
            .with_writer(file_appender);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(stderr_layer)
            .with(file_layer)
            .init();
    } else {
        // Fall back to stderr only
        tracing_subscriber::registry()
            .with(env_filter)
            .with(stderr_layer)
            .init();
    }
}

/// Generate shell completions and print to stdout.
fn cmd_completions(shell: clap_complete::Shell) -> anyhow::Result<ExitCode> {
    let mut cmd = Cli::command();
    clap_complete::generate(shell, &mut cmd, "mbox2eaxs", &mut std::io::stdout());
    Ok(ExitCode::SUCCESS)
}

/// Generate a man page and print to stdout.
fn cmd_manpage() -> anyhow::Result<ExitCode> {
    let cmd = Cli::command();
    let man = clap_mangen::Man::new(cmd);
    let mut buf = Vec::new();
    man.render(&mut buf)?;
    std::io::Write::write_all(&mut std::io::stdout(), &buf)?;
    Ok(ExitCode::SUCCESS)
}

fn cmd_convert(
    input: &Path,
    output: &Path,
    global_id: &str,
    emails: &str,
    settings: ConversionSettings,
    json: bool,
) -> anyhow::Result<ExitCode> {
    if !input.exists() {
        anyhow::bail!("Input not found: {}", input.display());
    }
    let input_size = input_size(input)?;

    let pb = ProgressBar::new(0);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(
                "{spinner:.green} {msg} [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({eta})",
            )?
            .progress_chars("#>-"),
    );
    let progress = |file: &Path, current: u64, total: u64| {
        if let Some(name) = file.file_name() {
            pb.set_message(name.to_string_lossy().into_owned());
        }
        pb.set_length(total);
        pb.set_position(current);
    };

    let start = Instant::now();
    let converter = Converter::new(settings).with_progress(&progress);
    let result = if input.is_dir() {
        converter.convert_folder(input, output, global_id, emails)
    } else {
        converter.convert_file(input, output, global_id, emails)
    };
    pb.finish_and_clear();
    let report = result?;
    let elapsed = start.elapsed();

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report_table(input, input_size, &report, elapsed);
    }

    Ok(if report.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

/// Bytes of the mbox files about to be read (top level only for folders).
fn input_size(input: &Path) -> anyhow::Result<u64> {
    if input.is_dir() {
        let mut total = 0;
        for path in mbox2eaxs::paths::list_mbox_files(input)? {
            total += std::fs::metadata(&path)?.len();
        }
        Ok(total)
    } else {
        Ok(std::fs::metadata(input)?.len())
    }
}

fn print_report_table(
    input: &Path,
    input_size: u64,
    report: &ConversionReport,
    elapsed: Duration,
) {
    use humansize::{format_size, BINARY};

    println!();
    println!("  {:<22} {}", "Input:", input.display());
    println!("  {:<22} {}", "Input size:", format_size(input_size, BINARY));
    println!("  {:<22} {}", "Documents:", report.documents.len());
    for doc in &report.documents {
        println!("    {}", doc.display());
    }
    println!("  {:<22} {}", "Valid messages:", report.valid_messages);
    println!("  {:<22} {}", "Incomplete messages:", report.incomplete_messages);
    println!("  {:<22} {}", "External files:", report.external_files);
    println!("  {:<22} {}", "Errors:", report.errors);
    println!("  {:<22} {}", "Warnings:", report.warnings);
    if report.validation_failures + report.integrity_failures > 0 {
        println!(
            "  {:<22} {} validation, {} integrity",
            "Failed checks:", report.validation_failures, report.integrity_failures
        );
    }
    println!("  {:<22} {:.2?}", "Time:", elapsed);
    println!();
}

fn cmd_validate(xml: &Path, json: bool) -> anyhow::Result<ExitCode> {
    if !xml.exists() {
        anyhow::bail!("Document not found: {}", xml.display());
    }
    let report = validate_document(xml)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!();
        println!("  {:<22} {}", "Document:", xml.display());
        println!("  {:<22} {}", "Messages:", report.messages);
        println!("  {:<22} {}", "LocalIds:", report.local_ids);
        println!("  {:<22} {}", "Mbox files:", report.mboxes);
        println!("  {:<22} {}", "External files:", report.external_files);
        for problem in report
            .validation_errors
            .iter()
            .chain(&report.integrity_errors)
        {
            println!("  ERROR: {problem}");
        }
        println!(
            "  {:<22} {}",
            "Result:",
            if report.is_valid() { "valid" } else { "INVALID" }
        );
        println!();
    }

    Ok(if report.is_valid() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use mbox2eaxs::digest::HashAlgorithm;

    #[test]
    fn test_hash_help_lists_every_algorithm() {
        let cmd = Cli::command();
        let convert = cmd.find_subcommand("convert").unwrap();
        let hash = convert
            .get_arguments()
            .find(|a| a.get_id() == "hash")
            .unwrap();
        let help = hash.get_help().unwrap().to_string();
        for algorithm in HashAlgorithm::ALL {
            assert!(help.contains(algorithm.name()), "{help}");
        }
    }
}
