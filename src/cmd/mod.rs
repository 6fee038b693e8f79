//! CLI command implementations.
//!
//! Each submodule owns one or more related `Commands` variants:
//!
//! | Module      | Commands handled                                        |
//! |-------------|---------------------------------------------------------|
//! | `listings`  | `Contacts`, `Tags`, `Automations`, `AutomationContacts` |
//! | `contact`   | `Contact`, `TagContact`                                 |
//! | `config`    | `Config`                                                |

pub mod config;
pub mod contact;
pub mod listings;

pub use config::cmd_config;
pub use contact::{cmd_contact, cmd_tag_contact};
pub use listings::{cmd_automation_contacts, cmd_automations, cmd_contacts, cmd_tags};

use anyhow::{Context as _, Result};
use serde::Serialize;
use std::path::PathBuf;

use enrollkit::ActiveCampaignClient;
use enrollkit::config::EnrollToml;
use enrollkit::output::Envelope;
use enrollkit::secrets::SecretsDir;

/// How a command finished when it did not fail outright.
#[derive(Debug)]
pub enum Completion {
    Complete,
    /// Output was produced but some listing pages are missing.
    Partial { message: String },
}

/// Settings shared by every command.
pub struct Context {
    pub json: bool,
    pub config: EnrollToml,
    pub config_path: PathBuf,
    pub secrets: SecretsDir,
}

impl Context {
    pub fn activecampaign(&self) -> Result<ActiveCampaignClient> {
        let secrets = self.secrets.activecampaign()?;
        ActiveCampaignClient::new(&secrets, self.config.fetch_config())
            .context("Failed to create ActiveCampaign client")
    }

    /// Print `{"result": value}` on one line.
    pub fn print_result<T: Serialize>(&self, value: &T) -> Result<()> {
        let envelope = Envelope::ok(value).context("Failed to encode command output")?;
        println!("{}", envelope.to_line());
        Ok(())
    }
}
