use anyhow::bail;
use colored::Colorize;
use mapmerge_sdk::{
    AggregateStatus, ElementId, ElementStatus, InMemoryElementSource, MergeOutcome,
    ReconcileConfig, Reconciler, RecordingSink, SdkError, GEOMETRY_KEY,
};

use crate::cli::*;
use crate::input::WorkingSet;

type CliReconciler = Reconciler<InMemoryElementSource, RecordingSink>;

pub async fn run_command(cli: Cli) -> anyhow::Result<()> {
    let config = match &cli.config {
        Some(path) => ReconcileConfig::load(path)?,
        None => ReconcileConfig::default(),
    };
    match cli.command {
        Command::Status(args) => cmd_status(args, config, &cli.format).await,
        Command::Diff(args) => cmd_diff(args, config, &cli.format).await,
        Command::Resolve(args) => cmd_resolve(args, config, &cli.format).await,
        Command::Submit(args) => cmd_submit(args, config, &cli.format).await,
    }
}

/// Build a reconciler over the file's elements with its saved choices.
async fn open(
    path: &std::path::Path,
    config: ReconcileConfig,
) -> anyhow::Result<(CliReconciler, usize)> {
    let set = WorkingSet::load(path)?;
    if !set.malformed.is_empty() && !config.exclude_malformed {
        bail!("malformed element: {}", set.malformed[0]);
    }
    let reconciler = Reconciler::new(
        InMemoryElementSource::new(set.elements),
        RecordingSink::new(),
        config,
    )?;
    reconciler.load().await?;
    for (id, choices) in set.choices {
        match reconciler.restore_choices(id, choices) {
            Ok(()) => {}
            Err(SdkError::ElementNotFound(_)) => {
                tracing::warn!(element = %id, "ignoring choices for unknown element");
            }
            Err(e) => return Err(e.into()),
        }
    }
    Ok((reconciler, set.malformed.len()))
}

fn progress_with(r: &CliReconciler, undecodable: usize) -> anyhow::Result<AggregateStatus> {
    let progress = r.progress()?;
    Ok(progress.with_excluded(progress.excluded_elements + undecodable))
}

fn status_label(status: ElementStatus) -> colored::ColoredString {
    match status {
        ElementStatus::Resolved => "resolved".green(),
        ElementStatus::PartiallyResolved => "partial".yellow(),
        ElementStatus::Unresolved => "unresolved".red(),
    }
}

async fn cmd_status(args: StatusArgs, config: ReconcileConfig, format: &OutputFormat) -> anyhow::Result<()> {
    let (r, undecodable) = open(&args.input, config).await?;
    let progress = progress_with(&r, undecodable)?;

    if let OutputFormat::Json = format {
        let mut rows = Vec::new();
        for id in r.element_ids()? {
            rows.push(serde_json::json!({
                "elementId": id,
                "status": r.status(id)?,
                "progress": r.element_progress(id)?,
                "ready": r.is_ready(id)?,
            }));
        }
        let out = serde_json::json!({ "elements": rows, "aggregate": progress });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    for id in r.element_ids()? {
        let diff = r.diff(id)?;
        if let Some(side) = diff.deleted {
            let decision = r.choices(id)?.decision;
            let label = match decision {
                Some(action) => format!("decided: {action}").green(),
                None => format!("deleted in {side}: keep or delete?").yellow(),
            };
            println!("  {:<10} {}", id.to_string().bold(), label);
            continue;
        }
        let tally = r.element_progress(id)?;
        println!(
            "  {:<10} {:<12} {}/{} ({:.0}%)",
            id.to_string().bold(),
            status_label(tally.status()),
            tally.resolved_conflicts,
            tally.total_conflicts,
            tally.percentage(),
        );
    }
    println!(
        "\n{} {}/{} resolved, {} partial, {} unresolved ({:.0}%)",
        "Progress:".bold(),
        progress.resolved_elements,
        progress.total_elements,
        progress.partially_resolved_elements,
        progress.unresolved_elements(),
        progress.percentage(),
    );
    if progress.excluded_elements > 0 {
        println!("  {} {} malformed element(s) excluded", "!".red().bold(), progress.excluded_elements);
    }
    Ok(())
}

fn show(value: &Option<String>) -> String {
    match value {
        Some(v) => format!("{v:?}"),
        None => "-".into(),
    }
}

async fn cmd_diff(args: DiffArgs, config: ReconcileConfig, format: &OutputFormat) -> anyhow::Result<()> {
    let (r, _) = open(&args.input, config).await?;
    let diff = r.diff(args.element)?;
    let choices = r.choices(args.element)?;

    if let OutputFormat::Json = format {
        println!("{}", serde_json::to_string_pretty(&*diff)?);
        return Ok(());
    }

    let element = r.element(args.element)?;
    println!("{} {} ({})", "Element".bold(), args.element.to_string().yellow(), element.kind());
    if let Some(side) = diff.deleted {
        println!("  {} deleted in {}; resolve with --decision keep|delete", "!".yellow().bold(), side);
    }
    println!("  {:<20} {:<16} {:<16} {:<16}", "key", "original", "ours", "theirs");
    for field in &diff.tags.fields {
        let marker = if field.conflicted {
            match choices.choice(&field.key).side() {
                Some(side) => format!("✓ {side}").green(),
                None => "✗ conflict".red(),
            }
        } else {
            "".normal()
        };
        println!(
            "  {:<20} {:<16} {:<16} {:<16} {}",
            field.key,
            show(&field.original_value),
            show(&field.ours_value),
            show(&field.theirs_value),
            marker,
        );
    }
    if diff.geometry_conflicted {
        let marker = match choices.geometry().side() {
            Some(side) => format!("✓ {side}").green(),
            None => "✗ conflict".red(),
        };
        println!("  {:<20} {:<50} {}", GEOMETRY_KEY, "(geometry differs)", marker);
    }
    let tally = r.element_progress(args.element)?;
    println!(
        "\n{} {}/{} conflicts resolved, {} of {} keys changed",
        "Progress:".bold(),
        tally.resolved_conflicts,
        tally.total_conflicts,
        diff.tags.changed_count(),
        diff.tags.len(),
    );
    Ok(())
}

async fn cmd_resolve(args: ResolveArgs, config: ReconcileConfig, format: &OutputFormat) -> anyhow::Result<()> {
    let (r, _) = open(&args.input, config).await?;
    let id = args.element;
    let mut choices = r.choices(id)?;
    for (key, side) in &args.choose {
        choices.set(key, *side);
    }
    if let Some(decision) = args.decision {
        choices.decision = Some(decision.into());
    }
    r.restore_choices(id, choices)?;

    match r.resolve(id) {
        Ok(outcome) => print_outcome(id, &outcome, format),
        Err(SdkError::Merge(e)) => {
            let pending: Vec<String> = e.pending().iter().map(ToString::to_string).collect();
            if let OutputFormat::Json = format {
                let out = serde_json::json!({ "elementId": id, "pending": e.pending() });
                println!("{}", serde_json::to_string_pretty(&out)?);
            } else {
                println!("{} {} still needs: {}", "✗".red().bold(), id.to_string().yellow(), pending.join(", "));
            }
            bail!("incomplete resolution for {id}");
        }
        Err(e) => Err(e.into()),
    }
}

fn print_outcome(id: ElementId, outcome: &MergeOutcome, format: &OutputFormat) -> anyhow::Result<()> {
    let request = outcome.to_request();
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&request)?),
        OutputFormat::Text => {
            println!("{} {} resolved", "✓".green().bold(), id.to_string().yellow());
            println!("  Request: {}", request.to_json()?);
        }
    }
    Ok(())
}

async fn cmd_submit(args: SubmitArgs, config: ReconcileConfig, format: &OutputFormat) -> anyhow::Result<()> {
    let (r, _) = open(&args.input, config).await?;
    let receipts = r.submit_ready().await?;
    let remaining = r.element_ids()?;

    let json = serde_json::to_string_pretty(&receipts)?;
    match &args.out {
        Some(path) => std::fs::write(path, json)?,
        None if matches!(format, OutputFormat::Json) => println!("{json}"),
        None => {}
    }

    if let OutputFormat::Text = format {
        for receipt in &receipts {
            println!(
                "  {} {} submitted ({})",
                "✓".green(),
                receipt.element_id.to_string().yellow(),
                receipt.submission_id.short_id().dimmed()
            );
        }
        println!(
            "{} {} submitted, {} still pending",
            "Done:".bold(),
            receipts.len(),
            remaining.len()
        );
        if let Some(path) = &args.out {
            println!("  Receipts written to {}", path.display().to_string().bold());
        }
    }
    Ok(())
}
