use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use deep_engine::{EntryForm, RenderMode, RenderedAttribute, load_entries_file, load_framework_file, validate_framework};
use deep_types::{Entry, Widget};
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

mod config;

use config::CliConfig;

#[derive(Debug, Parser)]
#[command(name = "deep", version, about = "Inspect DEEP tagging frameworks and entries")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Report configuration issues in a framework's conditional rules
    Validate {
        /// Framework document (YAML or JSON)
        framework: PathBuf,
    },
    /// List the widgets an entry shows, per section
    Visible {
        framework: PathBuf,
        /// Entry document holding one entry or an `entries:` list
        entry: PathBuf,
        /// Client id of the entry to use; defaults to the first
        #[arg(long = "entry")]
        entry_id: Option<String>,
        /// Also list hidden widgets
        #[arg(long)]
        show_hidden: bool,
    },
    /// Render an entry's visible widgets
    Render {
        framework: PathBuf,
        entry: PathBuf,
        #[arg(long = "entry")]
        entry_id: Option<String>,
        /// edit, compact or read-only
        #[arg(long)]
        mode: Option<RenderMode>,
        /// Print the rendered sections as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let config = CliConfig::load().unwrap_or_else(|error| {
        warn!(error = %error, "using default CLI settings");
        CliConfig::default()
    });
    debug!(?config, "CLI settings loaded");

    match cli.command {
        Command::Validate { framework } => run_validate(&framework, &config),
        Command::Visible {
            framework,
            entry,
            entry_id,
            show_hidden,
        } => run_visible(&framework, &entry, entry_id.as_deref(), show_hidden || config.show_hidden),
        Command::Render {
            framework,
            entry,
            entry_id,
            mode,
            json,
        } => run_render(&framework, &entry, entry_id.as_deref(), mode.unwrap_or(config.default_mode), json),
    }
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_env_filter(log_filter()).with_writer(std::io::stderr).try_init();
}

fn log_filter() -> EnvFilter {
    let filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into());
    EnvFilter::new(filter)
}

fn run_validate(framework_path: &Path, config: &CliConfig) -> Result<()> {
    let framework = load_framework_file(framework_path)?;
    let issues = validate_framework(&framework);
    if issues.is_empty() {
        println!("{}: no issues", framework_path.display());
        return Ok(());
    }

    for issue in &issues {
        println!("{issue}");
    }
    if config.fail_on_issues {
        bail!("{} configuration issue(s) in {}", issues.len(), framework_path.display());
    }
    Ok(())
}

fn run_visible(framework_path: &Path, entry_path: &Path, entry_id: Option<&str>, show_hidden: bool) -> Result<()> {
    let framework = load_framework_file(framework_path)?;
    let entry = select_entry(entry_path, entry_id)?;
    let form = EntryForm::new(&framework, &entry);
    let plan = form.plan();

    let mut sections: Vec<_> = framework.primary_tagging.iter().collect();
    sections.sort_by_key(|section| section.order);
    let mut listing: Vec<(&str, Vec<&Widget>)> = sections
        .into_iter()
        .map(|section| (section.title.as_str(), ordered(&section.widgets)))
        .collect();
    if !framework.secondary_tagging.is_empty() {
        listing.push(("Secondary tagging", ordered(&framework.secondary_tagging)));
    }

    for (title, widgets) in listing {
        println!("{title}");
        for widget in widgets {
            let hidden = plan.is_hidden(&widget.client_id);
            if hidden && !show_hidden {
                continue;
            }
            let marker = if hidden { "hidden " } else { "" };
            println!("  {marker}{} ({}, {})", widget.title, widget.client_id, widget.kind);
        }
    }
    Ok(())
}

fn run_render(framework_path: &Path, entry_path: &Path, entry_id: Option<&str>, mode: RenderMode, json: bool) -> Result<()> {
    let framework = load_framework_file(framework_path)?;
    let entry = select_entry(entry_path, entry_id)?;
    let mut form = EntryForm::new(&framework, &entry);
    if let Err(error) = form.validate() {
        debug!(?error, "entry has invalid attributes");
    }

    let sections = form.render(mode);
    if json {
        println!("{}", serde_json::to_string_pretty(&sections)?);
        return Ok(());
    }

    for section in &sections {
        println!("{}", section.title);
        for attribute in &section.attributes {
            println!("  {}", render_line(attribute));
        }
    }
    Ok(())
}

fn render_line(attribute: &RenderedAttribute) -> String {
    let mut line = format!(
        "{} [{}]: {}",
        attribute.title,
        attribute.renderer,
        attribute.display.as_deref().unwrap_or("-")
    );
    if !attribute.interactive {
        line.push_str(" (disabled)");
    }
    if let Some(error) = &attribute.error {
        line.push_str(&format!(" ! {error}"));
    }
    line
}

fn select_entry(entry_path: &Path, entry_id: Option<&str>) -> Result<Entry> {
    let entries = load_entries_file(entry_path)?;
    match entry_id {
        Some(id) => entries
            .into_iter()
            .find(|entry| entry.client_id == id)
            .with_context(|| format!("entry '{}' not found in {}", id, entry_path.display())),
        None => entries.into_iter().next().context("entry file contains no entries"),
    }
}

fn ordered(widgets: &[Widget]) -> Vec<&Widget> {
    let mut widgets: Vec<&Widget> = widgets.iter().collect();
    widgets.sort_by_key(|widget| widget.order);
    widgets
}
