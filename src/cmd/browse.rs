use anyhow::{bail, Result};

use fanes::{CatalogSection, FanesProvider, MediaProvider, SiteConfig};

use super::output::{print_json, print_summaries};

pub fn cmd_sections(config: &SiteConfig, json: bool) -> Result<()> {
    if json {
        return print_json(&config.sections);
    }
    for (i, section) in config.sections.iter().enumerate() {
        println!("{:>2}. {} ({})", i + 1, section.name, section.path);
    }
    Ok(())
}

/// Match a section by 1-based index or case-insensitive name.
fn find_section<'a>(sections: &'a [CatalogSection], key: &str) -> Option<&'a CatalogSection> {
    if let Ok(index) = key.parse::<usize>() {
        return index.checked_sub(1).and_then(|i| sections.get(i));
    }
    sections
        .iter()
        .find(|section| section.name.eq_ignore_ascii_case(key))
}

pub async fn cmd_catalog(provider: &FanesProvider, section: &str, page: u32, json: bool) -> Result<()> {
    let Some(section) = find_section(provider.sections(), section) else {
        bail!("Unknown section: {section}. Run `fanes sections` to list them.");
    };
    let items = provider.list_catalog(section, page.max(1)).await?;
    if json {
        return print_json(&items);
    }
    println!("📚 {} (page {page})\n", section.name);
    print_summaries(&items);
    Ok(())
}

pub async fn cmd_search(provider: &FanesProvider, query: &str, json: bool) -> Result<()> {
    let items = provider.search(query).await?;
    if json {
        return print_json(&items);
    }
    println!("🔍 {query}\n");
    print_summaries(&items);
    Ok(())
}
