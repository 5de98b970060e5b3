//! Show source duration and tracks.

use std::path::PathBuf;

use reelcut_common::config::AppConfig;
use reelcut_media_io::FfmpegProvider;

pub async fn run(path: PathBuf, json: bool, config: &AppConfig) -> anyhow::Result<()> {
    let provider = FfmpegProvider::new(&config.media);
    let info = provider
        .probe(&path)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to probe {}: {e}", path.display()))?;

    if json {
        let value = serde_json::json!({
            "path": path,
            "duration_secs": info.duration_secs,
            "video": info.video.map(|(w, h)| serde_json::json!({ "width": w, "height": h })),
            "audio": info.audio.map(|(rate, channels)| {
                serde_json::json!({ "sample_rate": rate, "channels": channels })
            }),
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    println!("Source: {}", path.display());
    println!("  Duration: {:.3}s", info.duration_secs);
    match info.video {
        Some((w, h)) => println!("  Video: {w}x{h}"),
        None => println!("  Video: none"),
    }
    match info.audio {
        Some((rate, channels)) => println!("  Audio: {rate}Hz, {channels}ch"),
        None => println!("  Audio: none"),
    }
    Ok(())
}
