use std::time::Duration;

use reqwest::blocking::Client;

use crate::error::Result;

const USER_AGENT: &str = concat!("fbref_stats/", env!("CARGO_PKG_VERSION"));

pub fn build_http_client(timeout: Duration) -> Result<Client> {
    let client = Client::builder()
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .build()?;
    Ok(client)
}
