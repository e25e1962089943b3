//! CLI tool to explore and bulk-edit HL7 message files.
//!
//! Usage:
//!   hl7-edit catalog <files..>
//!   hl7-edit census --address PID.5.1 <files..>
//!   hl7-edit preview --rules fix.rules <files..>
//!   hl7-edit apply --rules fix.rules <files..> -o edited.hl7
//!   hl7-edit apply --filter PID.5.1=SMITH --edit PID.5.2=DELETE <files..>
//!   hl7-edit split --size 1000 --out parts/ <files..>

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use hl7_edit_rs::{
    EditGroup, Markers, Session, join_messages, parse_inline_group, parse_rules,
    parse_segment_address,
};
use serde::Serialize;
use tracing::{debug, info};

/// Explore, filter and bulk-edit pipe-delimited HL7 messages.
#[derive(Parser)]
#[command(name = "hl7-edit", version)]
struct Cli {
    /// Marker that starts every message
    #[arg(long, global = true, default_value = hl7_edit_rs::MESSAGE_HEADER)]
    header: String,

    /// Log progress on stderr (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Cmd,
}

#[derive(Subcommand)]
enum Cmd {
    /// List the field/component addresses seen per segment type
    Catalog {
        #[command(flatten)]
        input: Input,
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Count the distinct values at one address
    Census {
        /// Address as SEG.field[.component], e.g. PID.5.1
        #[arg(short, long)]
        address: String,
        #[command(flatten)]
        input: Input,
        #[arg(long)]
        json: bool,
    },
    /// Print the parsed rules and flag addresses absent from the input
    Check {
        #[command(flatten)]
        rules: Rules,
        #[command(flatten)]
        input: Input,
    },
    /// List the messages that satisfy every group's filters
    Match {
        #[command(flatten)]
        rules: Rules,
        #[command(flatten)]
        input: Input,
        #[arg(long)]
        json: bool,
    },
    /// Show the first matching message before and after editing
    Preview {
        #[command(flatten)]
        rules: Rules,
        #[command(flatten)]
        input: Input,
        #[arg(long)]
        json: bool,
    },
    /// Apply the rules to every message and write the edited corpus
    Apply {
        #[command(flatten)]
        rules: Rules,
        #[command(flatten)]
        input: Input,
        #[command(flatten)]
        output: Output,
    },
    /// Write all input messages as one file
    Merge {
        #[command(flatten)]
        input: Input,
        #[command(flatten)]
        output: Output,
    },
    /// Write the input messages as numbered files of a fixed size
    Split {
        /// Messages per file
        #[arg(short, long, default_value_t = 1000)]
        size: usize,
        /// Directory for part_<n>.hl7 files
        #[arg(long)]
        out: PathBuf,
        #[command(flatten)]
        input: Input,
    },
}

#[derive(Args)]
struct Input {
    /// Message files (.hl7 / .txt)
    #[arg(required = true)]
    files: Vec<PathBuf>,
}

#[derive(Args)]
struct Rules {
    /// Rule file with GROUP / FILTER / EDIT lines
    #[arg(
        short,
        long,
        required_unless_present_any = ["filters", "edits"],
        conflicts_with_all = ["filters", "edits"]
    )]
    rules: Option<PathBuf>,

    /// Inline filter for a single group (repeatable)
    #[arg(long = "filter", value_name = "SEG.F[.C]=VALUE")]
    filters: Vec<String>,

    /// Inline edit for a single group; DELETE clears (repeatable)
    #[arg(long = "edit", value_name = "SEG.F[.C]=VALUE")]
    edits: Vec<String>,
}

#[derive(Args)]
struct Output {
    /// Write output to file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "info" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_writer(io::stderr)
        .init();

    match cli.command {
        Cmd::Catalog { input, json } => {
            let session = load_session(&cli.header, &input)?;
            let catalog = session.catalog();
            if json {
                print_json(catalog)?;
            } else {
                for (seg, addrs) in catalog.iter() {
                    let shown: Vec<String> = addrs.iter().map(|a| a.to_string()).collect();
                    println!("{seg}: {}", shown.join(" "));
                }
            }
        }
        Cmd::Census {
            address,
            input,
            json,
        } => {
            let (seg, addr) = parse_segment_address(&address)?;
            let session = load_session(&cli.header, &input)?;
            let census = session.census(&seg, addr);
            if json {
                print_json(&census.ranked())?;
            } else {
                for entry in census.ranked() {
                    println!("{} ({})", entry.value, entry.count);
                }
            }
        }
        Cmd::Check { rules, input } => {
            let mut session = load_session(&cli.header, &input)?;
            session.set_groups(load_rules(&rules)?);
            for group in session.groups() {
                println!("{group}");
            }
            let unknown = session.unknown_addresses();
            for u in &unknown {
                eprintln!(
                    "warning: group {}: {}.{} does not occur in the input",
                    u.group + 1,
                    u.segment_type,
                    u.address
                );
            }
            eprintln!(
                "{} group(s), {} unknown address(es)",
                session.groups().len(),
                unknown.len()
            );
        }
        Cmd::Match { rules, input, json } => {
            let mut session = load_session(&cli.header, &input)?;
            session.set_groups(load_rules(&rules)?);
            let matches = session.matching();
            if json {
                print_json(&matches)?;
            } else {
                for m in &matches {
                    let lines: Vec<String> = m
                        .groups
                        .iter()
                        .flat_map(|g| g.lines.iter())
                        .map(|(seg, ordinal)| format!("{seg}#{}", ordinal + 1))
                        .collect();
                    println!("{}\t{}", m.index + 1, lines.join(" "));
                }
            }
            eprintln!(
                "{} of {} message(s) match all groups",
                matches.len(),
                session.messages().len()
            );
        }
        Cmd::Preview { rules, input, json } => {
            let mut session = load_session(&cli.header, &input)?;
            session.set_groups(load_rules(&rules)?);
            let Some(preview) = session.preview() else {
                eprintln!("No message matches all groups");
                return Ok(());
            };
            if json {
                print_json(&PreviewJson {
                    index: preview.index,
                    before: preview.before.as_str(),
                    after: preview.after.as_str(),
                    highlight: &preview.highlight,
                })?;
            } else {
                let (before, after) =
                    preview
                        .highlight
                        .render(&preview.before, &preview.after, &Markers::default());
                println!("--- message {} (before)", preview.index + 1);
                println!("{before}");
                println!("+++ message {} (after)", preview.index + 1);
                println!("{after}");
            }
        }
        Cmd::Apply {
            rules,
            input,
            output,
        } => {
            let mut session = load_session(&cli.header, &input)?;
            session.set_groups(load_rules(&rules)?);
            let edited = session.apply();
            let changed = edited
                .iter()
                .zip(session.messages())
                .filter(|(a, b)| a != b)
                .count();
            info!(changed, total = edited.len(), "edits applied");
            write_output(output.output.as_deref(), &join_messages(&edited))?;
        }
        Cmd::Merge { input, output } => {
            let session = load_session(&cli.header, &input)?;
            write_output(output.output.as_deref(), &session.merged())?;
        }
        Cmd::Split { size, out, input } => {
            let session = load_session(&cli.header, &input)?;
            let parts = session.partitions(size)?;
            fs::create_dir_all(&out)
                .with_context(|| format!("failed to create '{}'", out.display()))?;
            for (i, part) in parts.iter().enumerate() {
                let path = out.join(format!("part_{}.hl7", i + 1));
                fs::write(&path, join_messages(part))
                    .with_context(|| format!("failed to write '{}'", path.display()))?;
                debug!(path = %path.display(), messages = part.len(), "wrote partition");
            }
            eprintln!(
                "Wrote {} file(s) for {} message(s) to {}",
                parts.len(),
                session.messages().len(),
                out.display()
            );
        }
    }

    Ok(())
}

#[derive(Serialize)]
struct PreviewJson<'a> {
    index: usize,
    before: &'a str,
    after: &'a str,
    highlight: &'a hl7_edit_rs::Highlight,
}

fn load_session(header: &str, input: &Input) -> Result<Session> {
    if header.is_empty() {
        bail!("--header must not be empty");
    }
    let mut session = Session::new(header);
    for path in &input.files {
        let text = read_file_lossy(path)?;
        let added = session.load(&text);
        info!(file = %path.display(), messages = added, "read input");
    }
    Ok(session)
}

fn load_rules(rules: &Rules) -> Result<Vec<EditGroup>> {
    let Some(path) = rules.rules.as_deref() else {
        let group = parse_inline_group(&rules.filters, &rules.edits)
            .context("invalid --filter/--edit options")?;
        return Ok(vec![group]);
    };
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read rules '{}'", path.display()))?;
    let groups =
        parse_rules(&text).with_context(|| format!("invalid rules in '{}'", path.display()))?;
    if groups.is_empty() {
        bail!("'{}' defines no groups", path.display());
    }
    info!(groups = groups.len(), "loaded rules");
    Ok(groups)
}

fn read_file_lossy(path: &Path) -> Result<String> {
    let bytes = fs::read(path).with_context(|| format!("failed to read '{}'", path.display()))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

fn write_output(path: Option<&Path>, text: &str) -> Result<()> {
    match path {
        Some(path) => {
            if let Some(parent) = path.parent()
                && !parent.as_os_str().is_empty()
            {
                fs::create_dir_all(parent).with_context(|| {
                    format!("failed to create output directory for '{}'", path.display())
                })?;
            }
            fs::write(path, text)
                .with_context(|| format!("failed to write '{}'", path.display()))?;
        }
        None => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(text.as_bytes())?;
            if !text.is_empty() && !text.ends_with('\n') {
                writeln!(stdout)?;
            }
        }
    }
    Ok(())
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
