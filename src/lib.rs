pub mod activecampaign;
pub mod config;
pub mod errors;
pub mod http;
pub mod logging;
pub mod notify;
pub mod output;
pub mod secrets;

pub use activecampaign::ActiveCampaignClient;
pub use config::EnrollToml;
pub use output::Envelope;
