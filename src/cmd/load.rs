use anyhow::{bail, Result};

use fanes::{FanesProvider, MediaProvider};

use super::output::print_json;

pub async fn cmd_load(provider: &FanesProvider, url: &str, json: bool) -> Result<()> {
    let Some(detail) = provider.load_detail(url).await? else {
        bail!("No title found at {url}");
    };
    if json {
        return print_json(&detail);
    }

    match detail.year {
        Some(year) => println!("🎞️  {} ({year})", detail.title),
        None => println!("🎞️  {}", detail.title),
    }
    println!("   {}", detail.url);
    if let Some(poster) = &detail.poster {
        println!("   Poster: {poster}");
    }
    if !detail.tags.is_empty() {
        println!("   Tags: {}", detail.tags.join(", "));
    }
    if !detail.actors.is_empty() {
        let names: Vec<_> = detail.actors.iter().map(|a| a.name.as_str()).collect();
        println!("   Cast: {}", names.join(", "));
    }
    if let Some(plot) = &detail.plot {
        println!("\n{plot}");
    }

    if !detail.episodes.is_empty() {
        println!("\nEpisodes:");
        for episode in &detail.episodes {
            let number = match (episode.season, episode.episode) {
                (Some(s), Some(e)) => format!("S{s:02}E{e:02}"),
                (None, Some(e)) => format!("E{e:02}"),
                _ => "   ".to_string(),
            };
            println!("  {number} {} {}", episode.name, episode.url);
        }
    }
    if !detail.recommendations.is_empty() {
        println!("\nRecommended: {} titles", detail.recommendations.len());
    }
    Ok(())
}
