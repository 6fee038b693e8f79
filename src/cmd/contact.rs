//! Single-contact commands: `contact` and `tag-contact`.

use anyhow::{Context as _, Result};
use console::style;
use serde::Serialize;

use enrollkit::activecampaign::{Contact, ContactTag};
use enrollkit::errors::ClientError;

use super::{Completion, Context};

#[derive(Debug, Serialize)]
struct ContactView<'a> {
    contact: &'a Contact,
    tags: &'a [ContactTag],
}

#[derive(Debug, Serialize)]
struct TagChange<'a> {
    contact: &'a str,
    tag: &'a str,
    tag_id: &'a str,
    already_tagged: bool,
    applied: bool,
    dry_run: bool,
}

async fn require_contact(
    client: &enrollkit::ActiveCampaignClient,
    email: &str,
) -> Result<Contact> {
    client
        .find_contact_by_email(email)
        .await
        .with_context(|| format!("Failed to look up contact {email}"))?
        .ok_or_else(|| {
            ClientError::NotFound {
                what: "Contact",
                name: email.to_string(),
            }
            .into()
        })
}

pub async fn cmd_contact(ctx: &Context, email: &str) -> Result<Completion> {
    let client = ctx.activecampaign()?;
    let contact = require_contact(&client, email).await?;
    let tags = client
        .contact_tags(&contact.id)
        .await
        .with_context(|| format!("Failed to load tags for contact {}", contact.id))?;

    if ctx.json {
        ctx.print_result(&ContactView {
            contact: &contact,
            tags: &tags,
        })?;
        return Ok(Completion::Complete);
    }

    println!();
    println!("Contact {}", style(&contact.id).bold());
    println!("  email:   {}", contact.email);
    println!("  name:    {}", contact.full_name());
    if let Some(phone) = contact.phone.as_deref().filter(|p| !p.is_empty()) {
        println!("  phone:   {phone}");
    }
    if let Some(created) = &contact.cdate {
        println!("  created: {created}");
    }
    println!("  tags:    {}", tags.len());
    for tag in &tags {
        println!(
            "    tag id {:<8} applied {}",
            tag.tag,
            tag.cdate.as_deref().unwrap_or("-")
        );
    }
    println!();
    Ok(Completion::Complete)
}

pub async fn cmd_tag_contact(
    ctx: &Context,
    email: &str,
    tag_name: &str,
    dry_run: bool,
) -> Result<Completion> {
    let client = ctx.activecampaign()?;
    let contact = require_contact(&client, email).await?;
    let tag = client
        .find_tag_by_name(tag_name)
        .await
        .with_context(|| format!("Failed to look up tag {tag_name}"))?
        .ok_or_else(|| ClientError::NotFound {
            what: "Tag",
            name: tag_name.to_string(),
        })?;

    let existing = client
        .contact_tags(&contact.id)
        .await
        .with_context(|| format!("Failed to load tags for contact {}", contact.id))?;
    let already_tagged = existing.iter().any(|ct| ct.tag == tag.id);

    let applied = if already_tagged || dry_run {
        false
    } else {
        client
            .add_tag(&contact.id, &tag.id)
            .await
            .with_context(|| format!("Failed to add tag {} to {}", tag.tag, contact.email))?;
        true
    };

    if ctx.json {
        ctx.print_result(&TagChange {
            contact: &contact.id,
            tag: &tag.tag,
            tag_id: &tag.id,
            already_tagged,
            applied,
            dry_run,
        })?;
        return Ok(Completion::Complete);
    }

    if already_tagged {
        println!("{} already has tag '{}'", contact.email, tag.tag);
    } else if dry_run {
        println!(
            "{} would add tag '{}' ({}) to {}",
            style("[dry run]").dim(),
            tag.tag,
            tag.id,
            contact.email
        );
    } else {
        println!("Added tag '{}' to {}", tag.tag, contact.email);
    }
    Ok(Completion::Complete)
}
