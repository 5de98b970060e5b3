//! Check system capabilities.

use reelcut_common::config::AppConfig;
use reelcut_media_io::{FfmpegProvider, MediaProvider};
use reelcut_project_model::export::FormatSelection;

pub async fn run(config: &AppConfig) -> anyhow::Result<()> {
    println!("Reelcut System Check");
    println!("{}", "=".repeat(50));

    let provider = FfmpegProvider::new(&config.media);
    let available = provider.is_available();
    if available {
        println!(
            "[OK] Media tools: {} / {}",
            config.media.ffmpeg_bin, config.media.ffprobe_bin
        );
    } else {
        println!(
            "[FAIL] Media tools: {} / {} not found in PATH",
            config.media.ffmpeg_bin, config.media.ffprobe_bin
        );
    }

    let mut format_ok = false;
    if available {
        match provider.probe_encodable(&FormatSelection::PREFERENCE).await {
            Some(selection) => {
                println!("[OK] Export format: {selection} ({})", selection.mime_type());
                format_ok = true;
            }
            None => println!("[FAIL] Export format: no MP4 or WebM encoder available"),
        }
    }

    match &config.media.font_path {
        Some(path) if path.exists() => println!("[OK] Overlay font: {}", path.display()),
        Some(path) => println!("[WARN] Overlay font missing: {}", path.display()),
        None => println!("[WARN] Overlay font: none configured, text overlays are skipped"),
    }

    println!();
    if available && format_ok {
        println!("All required capabilities are available. Reelcut is ready.");
    } else {
        println!("Some required capabilities are missing. Install ffmpeg with H.264/AAC or VP8/VP9/Opus encoders.");
    }

    Ok(())
}
