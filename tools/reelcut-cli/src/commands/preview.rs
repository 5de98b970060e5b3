//! Render one preview frame to an image file.

use std::path::PathBuf;

use anyhow::bail;

use reelcut_common::config::AppConfig;
use reelcut_media_io::FfmpegProvider;
use reelcut_render_engine::preview::PreviewDriver;

use super::overlay_font;
use super::timeline_args::TimelineArgs;

pub async fn run(
    args: TimelineArgs,
    at: f64,
    output: PathBuf,
    width: Option<u32>,
    height: Option<u32>,
    config: &AppConfig,
) -> anyhow::Result<()> {
    let provider = FfmpegProvider::new(&config.media);
    if !provider.is_available() {
        bail!("ffmpeg and ffprobe are required in PATH (see `reelcut check`)");
    }

    let timeline = args.build(&provider).await?;
    let width = width.unwrap_or(config.preview.width);
    let height = height.unwrap_or(config.preview.height);

    let mut driver = PreviewDriver::new(&provider, width, height, config.preview.fps)
        .with_font(overlay_font(&config.media));
    let canvas = driver.frame_at(&timeline, at).await?;
    canvas.image().save(&output)?;

    let report = driver.last_report();
    println!("Preview frame at {at:.3}s: {}", output.display());
    println!(
        "  Base: {}",
        if report.base_drawn {
            "drawn"
        } else if report.base_skipped {
            "decode failed"
        } else {
            "none"
        }
    );
    println!(
        "  Overlays: {} drawn, {} skipped",
        report.overlays_drawn, report.overlays_skipped
    );
    Ok(())
}
