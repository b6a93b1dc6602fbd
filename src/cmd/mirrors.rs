use anyhow::Result;
use serde::Serialize;

use fanes::FanesProvider;

use super::output::print_json;

#[derive(Serialize)]
struct MirrorReport {
    primary: String,
    mirrors: Vec<String>,
}

pub async fn cmd_mirrors(provider: &FanesProvider, refresh: bool, json: bool) -> Result<()> {
    let fetcher = provider.fetcher();
    if refresh {
        fetcher.refresh_mirrors().await;
    }
    let report = MirrorReport {
        primary: fetcher.base_url().await,
        mirrors: fetcher.mirrors().candidates().await,
    };
    if json {
        return print_json(&report);
    }
    for mirror in &report.mirrors {
        let marker = if *mirror == report.primary { "*" } else { " " };
        println!("{marker} {mirror}");
    }
    Ok(())
}
