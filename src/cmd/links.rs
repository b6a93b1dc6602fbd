use anyhow::{bail, Result};

use fanes::{FanesProvider, MediaProvider};

use super::output::{print_events, print_json};

pub async fn cmd_links(provider: &FanesProvider, url: &str, json: bool) -> Result<()> {
    let links = provider.resolve_links(url).await?;
    if json {
        return print_json(&links);
    }
    if !links.found {
        bail!("No player found at {url}");
    }
    if links.events.is_empty() {
        println!("Player found, but no playable link could be resolved.");
        return Ok(());
    }
    print_events(&links.events);
    Ok(())
}
