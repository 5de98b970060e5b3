//! Export a timeline to video.

use std::io::Write;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{anyhow, bail};

use reelcut_common::config::{AppConfig, HeadroomPolicy};
use reelcut_media_io::FfmpegProvider;
use reelcut_project_model::export::{ContainerFormat, ExportSettings};
use reelcut_render_engine::export::{
    export_timeline, export_trimmed, ExportOptions, ExportProgress, ProgressCallback,
};

use super::overlay_font;
use super::timeline_args::TimelineArgs;

#[allow(clippy::too_many_arguments)]
pub async fn run(
    args: TimelineArgs,
    output: PathBuf,
    width: u32,
    height: u32,
    fps: Option<u32>,
    headroom: Option<String>,
    trimmed: bool,
    config: &AppConfig,
) -> anyhow::Result<()> {
    let provider = FfmpegProvider::new(&config.media);
    if !provider.is_available() {
        bail!("ffmpeg and ffprobe are required in PATH (see `reelcut check`)");
    }

    let headroom = match headroom.as_deref() {
        None => config.export.headroom,
        Some("none") => HeadroomPolicy::None,
        Some("hard-clip") => HeadroomPolicy::HardClip,
        Some("peak-normalize") => HeadroomPolicy::PeakNormalize,
        Some(other) => {
            return Err(anyhow!(
                "Unknown headroom policy: {other}. Use: none, hard-clip, peak-normalize"
            ));
        }
    };

    let timeline = args.build(&provider).await?;

    let settings = ExportSettings {
        width,
        height,
        fps: fps.unwrap_or(config.export.fps),
        sample_rate: config.export.sample_rate,
        channels: config.export.channels,
    };

    println!("Exporting {} clip(s)", timeline.len());
    println!("  Duration: {:.2}s", timeline.duration_secs());
    println!("  Resolution: {width}x{height} @ {}fps", settings.fps);

    let cancel = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&cancel);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            flag.store(true, Ordering::SeqCst);
        }
    });

    let progress_cb: ProgressCallback = Box::new(|p: ExportProgress| {
        print!(
            "\r  Progress: {:.1}% ({}/{} frames, ETA: {:.0}s)  ",
            p.progress * 100.0,
            p.frames_rendered,
            p.total_frames,
            p.eta_secs,
        );
        let _ = std::io::stdout().flush();
    });

    let options = ExportOptions::new(settings)
        .with_headroom(headroom)
        .with_font(overlay_font(&config.media))
        .with_cancel(cancel)
        .with_progress(progress_cb);

    let result = if trimmed {
        let first = timeline
            .clips()
            .first()
            .ok_or_else(|| anyhow!("--trimmed needs a clip"))?;
        export_trimmed(first, &provider, options).await
    } else {
        export_timeline(&timeline, &provider, options).await
    };

    match result {
        Ok(artifact) => {
            let extension = [ContainerFormat::Mp4, ContainerFormat::Webm]
                .into_iter()
                .find(|c| c.mime_type() == artifact.mime_type)
                .map_or("mp4", |c| c.extension());
            let output_path = if output.extension().is_some() {
                output
            } else {
                output.with_extension(extension)
            };
            if let Some(parent) = output_path.parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent)?;
                }
            }
            std::fs::write(&output_path, &artifact.bytes)?;
            println!(
                "\nExport complete: {} ({}, {} bytes)",
                output_path.display(),
                artifact.mime_type,
                artifact.bytes.len()
            );
            Ok(())
        }
        Err(e) => {
            println!("\nExport failed: {e}");
            Err(e.into())
        }
    }
}
