use std::{sync::Arc, time::Duration};

use anyhow::Result;
use log::info;
use tokio::time::sleep;

use gamereel::{
    Catalog, ContentItem, Crossing, FeedController, FeedTuning, LogHost, LogSink, NavKey,
};

/// Built-in demo catalog. Replace the URLs with your own hosted games, or
/// pass a JSON catalog file as the first argument.
fn demo_catalog() -> Result<Catalog> {
    Catalog::new(vec![
        ContentItem {
            title: "Snake Game".into(),
            url: "https://snakegame123.vercel.app".into(),
            description: "Classic snake game - collect food and grow!".into(),
        },
        ContentItem {
            title: "Flappy Bird".into(),
            url: "https://flappybird3.vercel.app".into(),
            description: "Tap to fly and avoid the pipes!".into(),
        },
        ContentItem {
            title: "Plane Fighter".into(),
            url: "https://plane-sable.vercel.app".into(),
            description: "Shoot down enemy planes in the sky!".into(),
        },
        ContentItem {
            title: "Hit Ball".into(),
            url: "https://hitball-game.vercel.app".into(),
            description: "Hit the ball and collect coins!".into(),
        },
        ContentItem {
            title: "Tower Block".into(),
            url: "https://tower-block-game.vercel.app".into(),
            description: "Stack blocks as high as you can!".into(),
        },
    ])
}

const VIEWPORT_HEIGHT: f64 = 800.0;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging (reads RUST_LOG env var)
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    info!("gamereel demo starting up...");

    let catalog = match std::env::args().nth(1) {
        Some(path) => Catalog::from_json_file(path)?,
        None => demo_catalog()?,
    };

    // Shortened dwell so the scripted session below produces a played
    // signal without sitting around for the production 10s threshold.
    let tuning = FeedTuning {
        dwell_threshold_ms: 1500,
        ..FeedTuning::load_or_default("feed-tuning.json")
    };

    let controller = FeedController::new(
        catalog.into_shared(),
        Arc::new(LogHost),
        Arc::new(LogSink),
        tuning,
    );

    controller.start(VIEWPORT_HEIGHT, true).await?;

    // Scripted session standing in for real scroll/keyboard wiring.
    controller.frame_loaded(0).await;
    sleep(Duration::from_millis(700)).await;
    controller.frame_loaded(1).await;

    // Dwell long enough on the first item for the played signal.
    sleep(Duration::from_millis(1800)).await;

    // Swipe to the second item.
    controller.note_scroll(VIEWPORT_HEIGHT).await;
    controller
        .observe(&[Crossing {
            index: 1,
            ratio: 0.8,
        }])
        .await;
    sleep(Duration::from_millis(1200)).await;

    // Jump to the end, then wrap around with the keyboard.
    controller.go_to_index(4, true).await;
    controller.frame_loaded(4).await;
    sleep(Duration::from_millis(2500)).await;
    controller.key_down(NavKey::ArrowDown).await;
    sleep(Duration::from_millis(800)).await;

    if let Some(snapshot) = controller.snapshot().await {
        info!(
            "live slots before shutdown: {:?} (dominant {:?})",
            snapshot.live_indices, snapshot.dominant
        );
    }

    let summary = controller.end_session().await?;
    info!(
        "viewed {} items, played {}, reached last: {}",
        summary.viewed_count, summary.played_count, summary.reached_last
    );

    Ok(())
}
