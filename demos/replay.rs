//! Replays a scripted torrent scan through the engine.
//!
//! This example shows how to:
//! - Derive a session ID from the uploaded artifact
//! - Feed scan events to a registry through the event feed
//! - Watch the latest view and keep an operator log
//! - Print the final report and export the log
//!
//! Run with: cargo run --example replay

use std::sync::Arc;
use std::time::Duration;

use torrentguard::core::ArtifactHasher;
use torrentguard::prelude::*;
use torrentguard::sink::WatchSink;
use torrentguard::source::MockSource;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing for logging
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    println!("=== Torrentguard Replay Example ===\n");

    let torrent = b"d8:announce35:udp://tracker.example.org:1337/announce4:infod6:lengthi262144000ee";
    let digest = ArtifactHasher::new().with_sha256(true).hash_bytes(torrent);
    let session_id = digest.session_id();

    println!("Artifact BLAKE3: {}", digest.blake3);
    println!("Artifact SHA256: {}", digest.sha256.as_deref().unwrap_or("-"));

    let config = EngineConfig::new().with_log_capacity(20);
    let registry = Arc::new(SessionRegistry::new(config.clone())?);

    let source = MockSource::new(1000, 25)
        .with_piece_size(262_144)
        .with_piece(7, Verdict::Suspicious, 48.2)
        .with_piece(19, Verdict::Malicious, 91.7)
        .with_file_path("/downloads/specimen.bin");

    registry.create(session_id.clone(), source.total_pieces(), source.requested_pieces())?;

    let log = Arc::new(SessionLog::from_config(&config));
    let (watch, mut latest) = WatchSink::for_session(session_id.clone());

    let (feed, stopped) = EventFeed::new(Arc::clone(&registry))
        .add_sink(TracingSink::new())
        .add_arc_sink(log.clone())
        .add_sink(watch)
        .spawn();

    let observer = tokio::spawn(async move {
        while latest.changed().await.is_ok() {
            let view = latest.borrow_and_update().clone();
            if let Some(view) = view {
                if view.is_complete() {
                    return Some(view);
                }
            }
        }
        None
    });

    source
        .stream_into(&session_id, &feed, Some(Duration::from_millis(20)))
        .await?;

    // Both are reported in the log; neither changes the outcome.
    feed.send(Envelope::raw(
        session_id.clone(),
        r#"{"event":"download_complete","verdict":"CLEAN","max_risk_score":0,
            "quarantined":false,"malicious_pieces":0,"pieces_downloaded":25}"#,
    ))
    .await?;
    feed.send(Envelope::raw(
        session_id.clone(),
        r#"{"event":"piece_downloaded","piece_index":3,"verdict":"UNKNOWN","risk_score":1}"#,
    ))
    .await?;
    drop(feed);

    let stats = stopped.await?;
    println!("\nFeed stats: {stats:?}");

    if let Some(view) = observer.await? {
        println!("\n=== {} ===", view.disposition.headline());
        println!("{}", view.disposition.description());
        println!(
            "RISK_FACTOR: {:.1}% ({})  pieces: {}/{}",
            view.max_risk,
            view.risk_level.name(),
            view.pieces_seen,
            view.requested_pieces
        );
    }

    let report = registry.report(&session_id)?;
    println!("\n=== Report ===\n{}", report.to_json_pretty()?);

    println!("\n=== Operator Log ===\n{}", log.export_text());

    let path = log.export_to_dir(&std::env::temp_dir()).await?;
    println!("\nLog saved to {}", path.display());

    Ok(())
}
