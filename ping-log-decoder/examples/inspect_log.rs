//! Inspect a Ping Viewer recording: header fields and message id statistics
//!
//! Usage:
//!   inspect_log <recording.bin> [more.bin ...]

use ping_log_decoder::{Classification, Decoder, MessageSource, PingViewerLog};
use ping_log_decoder::timestamp::clean_offset;
use std::collections::BTreeMap;
use std::env;
use std::path::Path;

fn inspect(decoder: &Decoder, path: &Path) {
    println!("\n═══════════════════════════════════════");
    println!("Inspecting: {:?}", path);
    println!("═══════════════════════════════════════");

    let source = match PingViewerLog::open(path) {
        Ok(source) => source,
        Err(e) => {
            println!("✗ Error: {}", e);
            return;
        }
    };

    let header = source.header().clone();
    println!("✓ {} (version {})", header.identifier, header.version);
    println!("  Recorded with {} ({}) on {} {}", header.tag, header.hash_commit, header.os_name, header.os_version);
    println!("  Build date: {}\n", header.date);

    let mut id_counts: BTreeMap<u16, usize> = BTreeMap::new();
    let mut first_offset = None;
    let mut last_offset = None;

    let mut total = 0usize;
    for record in source {
        match record {
            Ok(r) => {
                total += 1;
                *id_counts.entry(r.message_id()).or_insert(0) += 1;
                let offset = clean_offset(&r.timestamp_offset);
                if first_offset.is_none() {
                    first_offset = Some(offset.clone());
                }
                last_offset = Some(offset);
            }
            Err(e) => {
                println!("✗ Stopped after {} messages: {}", total, e);
                break;
            }
        }
    }

    println!("Message Id Statistics:");
    println!("─────────────────────────");
    for (id, count) in &id_counts {
        let known = match Classification::from_message_id(*id) {
            Classification::Unknown => "",
            _ => "  <- device data",
        };
        println!("  {:>5}: {:>8}{}", id, count, known);
    }
    if let (Some(first), Some(last)) = (first_offset, last_offset) {
        println!("\n{} messages spanning {} .. {}", total, first, last);
    }
    println!("Classified as: {}", decoder.classify_file(path));
}

fn main() {
    let paths: Vec<String> = env::args().skip(1).collect();
    if paths.is_empty() {
        eprintln!("Usage: inspect_log <recording.bin> [more.bin ...]");
        std::process::exit(1);
    }

    let decoder = Decoder::new();
    for path in &paths {
        inspect(&decoder, Path::new(path));
    }
}
