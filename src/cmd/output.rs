use anyhow::Result;
use serde::Serialize;

use fanes::{LinkEvent, MediaSummary};

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub fn print_summaries(items: &[MediaSummary]) {
    for item in items {
        let kind = match item.kind {
            fanes::site::MediaKind::Movie => "film",
            fanes::site::MediaKind::Series => "dizi",
        };
        println!("[{kind}] {}", item.title);
        println!("       {}", item.url);
    }
    println!("\n({} results)", items.len());
}

pub fn print_events(events: &[LinkEvent]) {
    for event in events {
        match event {
            LinkEvent::Stream(stream) => {
                println!("🎬 {} [{}]", stream.source, stream.content_type.mime());
                println!("   {}", stream.url);
                if let Some(referer) = &stream.referer {
                    println!("   Referer: {referer}");
                }
            }
            LinkEvent::Subtitle(track) => {
                println!("💬 {}: {}", track.label, track.url);
            }
        }
    }
}
