//! Full-listing commands: `contacts`, `tags`, `automations`, `automation-contacts`.

use anyhow::{Context as _, Result};
use console::style;
use pagefetch::FetchOutcome;
use serde::Serialize;

use super::{Completion, Context};

pub async fn cmd_contacts(ctx: &Context) -> Result<Completion> {
    let client = ctx.activecampaign()?;
    let outcome = client
        .list_contacts()
        .await
        .context("Failed to list contacts")?;

    report(ctx, "contacts", outcome, |c| {
        format!("{:<8} {:<40} {}", c.id, c.email, c.full_name())
    })
}

pub async fn cmd_tags(ctx: &Context, filter: Option<&str>) -> Result<Completion> {
    let client = ctx.activecampaign()?;
    let mut outcome = client.list_tags().await.context("Failed to list tags")?;

    if let Some(needle) = filter {
        let needle = needle.to_lowercase();
        outcome
            .items
            .retain(|t| t.tag.to_lowercase().contains(&needle));
    }

    report(ctx, "tags", outcome, |t| format!("{:<8} {}", t.id, t.tag))
}

pub async fn cmd_automations(ctx: &Context) -> Result<Completion> {
    let client = ctx.activecampaign()?;
    let outcome = client
        .list_automations()
        .await
        .context("Failed to list automations")?;

    report(ctx, "automations", outcome, |a| {
        let status = if a.is_active() { "active" } else { "inactive" };
        format!("{:<8} {:<10} {}", a.id, status, a.name)
    })
}

pub async fn cmd_automation_contacts(ctx: &Context, automation_id: &str) -> Result<Completion> {
    let client = ctx.activecampaign()?;
    let outcome = client
        .list_automation_contacts(automation_id)
        .await
        .with_context(|| format!("Failed to list contacts in automation {automation_id}"))?;

    report(ctx, "enrollments", outcome, |e| {
        let status = if e.is_completed() { "completed" } else { "active" };
        format!(
            "{:<8} contact {:<8} {:<10} {}",
            e.id,
            e.contact,
            status,
            e.adddate.as_deref().unwrap_or("")
        )
    })
}

/// Print a listing. Partial listings still print what was collected, but the
/// command reports `Completion::Partial` so the exit status reflects it.
fn report<T: Serialize>(
    ctx: &Context,
    noun: &str,
    outcome: FetchOutcome<T>,
    line: impl Fn(&T) -> String,
) -> Result<Completion> {
    if ctx.json {
        let page_count = outcome.page_count;
        let collected = outcome.items.len();
        let total = outcome.total;
        return match outcome.into_complete() {
            Ok(items) => {
                ctx.print_result(&items)?;
                Ok(Completion::Complete)
            }
            Err(e) => {
                // A single envelope is either a result or an error, so the
                // collected items are summarized here rather than printed.
                let message = format!(
                    "incomplete {noun} listing: {e}; {collected} of {total} items collected"
                );
                tracing::warn!(noun, page_count, "{message}");
                println!("{}", enrollkit::Envelope::err(&message).to_line());
                Ok(Completion::Partial { message })
            }
        };
    }

    for item in &outcome.items {
        println!("{}", line(item));
    }
    println!();
    println!(
        "{} {} (listing total {}, {} pages)",
        outcome.items.len(),
        noun,
        outcome.total,
        outcome.page_count
    );

    if outcome.is_complete() {
        return Ok(Completion::Complete);
    }

    let message = format!(
        "incomplete {noun} listing: {} of {} pages failed",
        outcome.failures.len(),
        outcome.page_count
    );
    eprintln!("{} {}", style("warning:").yellow().bold(), message);
    for failure in &outcome.failures {
        eprintln!("  {failure}");
    }
    Ok(Completion::Partial { message })
}
