//! ffmpeg-backed media provider.
//!
//! Decoding runs one short-lived `ffmpeg` process per request. Encoding
//! runs one long-lived process per export: raw RGBA frames go in on stdin,
//! the muxed container comes out on stdout and is accumulated in memory.
//! Writes to stdin complete only once the pipe has room, which gives the
//! export loop its backpressure.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::process::{Command as StdCommand, Stdio};

use image::RgbaImage;
use serde::Deserialize;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::process::{Child, ChildStdin, Command};
use tokio::sync::OnceCell;
use tokio::task::JoinHandle;

use reelcut_common::config::MediaConfig;
use reelcut_common::error::{ReelcutError, ReelcutResult};
use reelcut_project_model::clip::SourceRef;
use reelcut_project_model::export::{AudioCodec, ContainerFormat, FormatSelection, VideoCodec};
use reelcut_project_model::overlay::ImageRef;

use crate::audio::{AudioBuffer, AudioTarget};
use crate::provider::{
    AudioTrack, EncodedArtifact, Encoder, EncoderSpec, MediaProvider, OpenedMedia, VideoTrack,
};

const STDOUT_CHUNK_BYTES: usize = 64 * 1024;

/// Media provider driving the `ffmpeg` and `ffprobe` binaries.
#[derive(Debug)]
pub struct FfmpegProvider {
    ffmpeg_bin: String,
    ffprobe_bin: String,
    encoders: OnceCell<HashSet<String>>,
}

/// Stream facts reported by ffprobe.
#[derive(Debug, Clone, PartialEq)]
pub struct ProbeInfo {
    pub duration_secs: f64,
    pub video: Option<(u32, u32)>,
    pub audio: Option<(u32, u16)>,
}

impl FfmpegProvider {
    pub fn new(config: &MediaConfig) -> Self {
        Self {
            ffmpeg_bin: config.ffmpeg_bin.clone(),
            ffprobe_bin: config.ffprobe_bin.clone(),
            encoders: OnceCell::new(),
        }
    }

    /// Check that both binaries can be found.
    pub fn is_available(&self) -> bool {
        command_exists(&self.ffmpeg_bin) && command_exists(&self.ffprobe_bin)
    }

    /// Probe duration and primary streams of a media file.
    pub async fn probe(&self, path: &Path) -> ReelcutResult<ProbeInfo> {
        if !path.exists() {
            return Err(ReelcutError::FileNotFound {
                path: path.to_path_buf(),
            });
        }

        let output = Command::new(&self.ffprobe_bin)
            .args([
                "-v",
                "error",
                "-show_entries",
                "format=duration:stream=codec_type,width,height,sample_rate,channels",
                "-of",
                "json",
            ])
            .arg(path)
            .kill_on_drop(true)
            .output()
            .await?;

        if !output.status.success() {
            return Err(ReelcutError::decode(format!(
                "ffprobe failed for {}: {}",
                path.display(),
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        parse_probe_output(&String::from_utf8_lossy(&output.stdout))
    }

    /// Probe a file and describe it as a timeline source.
    ///
    /// Returns the source reference and whether it carries audio.
    pub async fn import(&self, path: &Path) -> ReelcutResult<(SourceRef, bool)> {
        let info = self.probe(path).await?;
        Ok((
            SourceRef::new(path, info.duration_secs),
            info.audio.is_some(),
        ))
    }

    async fn available_encoders(&self) -> ReelcutResult<&HashSet<String>> {
        self.encoders
            .get_or_try_init(|| async {
                let output = Command::new(&self.ffmpeg_bin)
                    .args(["-hide_banner", "-encoders"])
                    .kill_on_drop(true)
                    .output()
                    .await?;
                if !output.status.success() {
                    return Err(ReelcutError::unsupported("ffmpeg -encoders failed"));
                }
                Ok::<_, ReelcutError>(parse_encoder_list(&String::from_utf8_lossy(
                    &output.stdout,
                )))
            })
            .await
    }
}

#[async_trait::async_trait]
impl MediaProvider for FfmpegProvider {
    fn name(&self) -> &str {
        "ffmpeg"
    }

    async fn open(&self, source: &SourceRef) -> ReelcutResult<OpenedMedia> {
        let info = self.probe(&source.path).await?;
        Ok(OpenedMedia {
            video: info.video.map(|(width, height)| VideoTrack {
                source: source.clone(),
                width,
                height,
            }),
            audio: info.audio.map(|(sample_rate, channels)| AudioTrack {
                source: source.clone(),
                sample_rate,
                channels,
            }),
        })
    }

    async fn decode_image_at(
        &self,
        track: &VideoTrack,
        source_time: f64,
        width: u32,
        height: u32,
    ) -> ReelcutResult<RgbaImage> {
        let args = frame_decode_args(&track.source.path, source_time, width, height);
        let output = Command::new(&self.ffmpeg_bin)
            .args(&args)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| ReelcutError::decode(format!("failed to spawn ffmpeg: {e}")))?;

        if !output.status.success() {
            return Err(ReelcutError::decode(format!(
                "ffmpeg could not decode {} at {source_time:.3}s: {}",
                track.source.path.display(),
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        let expected = width as usize * height as usize * 4;
        if output.stdout.len() < expected {
            return Err(ReelcutError::decode(format!(
                "no frame in {} at {source_time:.3}s",
                track.source.path.display()
            )));
        }

        let mut raw = output.stdout;
        raw.truncate(expected);
        RgbaImage::from_raw(width, height, raw)
            .ok_or_else(|| ReelcutError::decode("decoded frame has the wrong size"))
    }

    async fn decode_audio_range(
        &self,
        track: &AudioTrack,
        start_secs: f64,
        end_secs: f64,
        target: AudioTarget,
    ) -> ReelcutResult<AudioBuffer> {
        let args = audio_decode_args(&track.source.path, start_secs, end_secs, target);
        let output = Command::new(&self.ffmpeg_bin)
            .args(&args)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| ReelcutError::decode(format!("failed to spawn ffmpeg: {e}")))?;

        if !output.status.success() {
            return Err(ReelcutError::decode(format!(
                "ffmpeg could not decode audio of {}: {}",
                track.source.path.display(),
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        let frame_bytes = 4 * target.channels as usize;
        let whole = output.stdout.len() - output.stdout.len() % frame_bytes.max(1);
        AudioBuffer::from_le_bytes(target, &output.stdout[..whole])
    }

    async fn load_image(&self, image: &ImageRef) -> ReelcutResult<RgbaImage> {
        let path = image.path.clone();
        tokio::task::spawn_blocking(move || {
            image::open(&path)
                .map(|img| img.to_rgba8())
                .map_err(|e| ReelcutError::decode(format!("{}: {e}", path.display())))
        })
        .await
        .map_err(|e| ReelcutError::decode(format!("image loader task failed: {e}")))?
    }

    async fn probe_encodable(&self, candidates: &[FormatSelection]) -> Option<FormatSelection> {
        let available = match self.available_encoders().await {
            Ok(available) => available,
            Err(e) => {
                tracing::warn!(error = %e, "Could not list ffmpeg encoders");
                return None;
            }
        };

        candidates.iter().copied().find(|candidate| {
            let supported = encoder_names(*candidate, available).is_some();
            tracing::debug!(format = %candidate, supported, "Probed output format");
            supported
        })
    }

    async fn create_encoder(
        &self,
        selection: FormatSelection,
        spec: EncoderSpec,
    ) -> ReelcutResult<Box<dyn Encoder>> {
        let available = self.available_encoders().await?;
        let names = encoder_names(selection, available).ok_or_else(|| {
            ReelcutError::unsupported_format(format!("ffmpeg cannot encode {selection}"))
        })?;

        Ok(Box::new(FfmpegEncoder {
            ffmpeg_bin: self.ffmpeg_bin.clone(),
            selection,
            spec,
            names,
            audio_path: None,
            running: None,
            finished: false,
        }))
    }
}

/// Encoder names chosen for a format selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct EncoderNames {
    video: &'static str,
    audio: &'static str,
}

struct FfmpegEncoder {
    ffmpeg_bin: String,
    selection: FormatSelection,
    spec: EncoderSpec,
    names: EncoderNames,
    audio_path: Option<PathBuf>,
    running: Option<RunningEncode>,
    finished: bool,
}

struct RunningEncode {
    child: Child,
    stdin: Option<ChildStdin>,
    stdout_task: JoinHandle<std::io::Result<Vec<u8>>>,
    stderr_task: JoinHandle<String>,
    frames_written: u64,
}

#[async_trait::async_trait]
impl Encoder for FfmpegEncoder {
    async fn add_audio_track(&mut self, buffer: &AudioBuffer) -> ReelcutResult<()> {
        if self.running.is_some() || self.finished {
            return Err(ReelcutError::render(
                "audio track must be added before the encoder starts",
            ));
        }
        if buffer.target() != self.spec.audio {
            return Err(ReelcutError::invariant(format!(
                "audio track is {}Hz/{}ch but the encoder expects {}Hz/{}ch",
                buffer.sample_rate,
                buffer.channels,
                self.spec.audio.sample_rate,
                self.spec.audio.channels
            )));
        }

        let path = std::env::temp_dir().join(format!("reelcut-audio-{}.f32", uuid::Uuid::new_v4()));
        tokio::fs::write(&path, buffer.to_le_bytes()).await?;
        if let Some(previous) = self.audio_path.replace(path) {
            std::fs::remove_file(previous).ok();
        }
        Ok(())
    }

    async fn start(&mut self) -> ReelcutResult<()> {
        if self.running.is_some() || self.finished {
            return Err(ReelcutError::render("encoder already started"));
        }

        let args = encode_args(
            self.selection,
            self.names,
            &self.spec,
            self.audio_path.as_deref(),
        );
        tracing::debug!(args = ?args, "Running ffmpeg encoder");

        let mut child = Command::new(&self.ffmpeg_bin)
            .args(&args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| ReelcutError::render(format!("failed to spawn ffmpeg: {e}")))?;

        let stdin = child.stdin.take();
        let mut stdout = child
            .stdout
            .take()
            .ok_or_else(|| ReelcutError::render("ffmpeg stdout was not captured"))?;
        let mut stderr = child
            .stderr
            .take()
            .ok_or_else(|| ReelcutError::render("ffmpeg stderr was not captured"))?;

        let stdout_task = tokio::spawn(async move {
            let mut chunks: Vec<Vec<u8>> = Vec::new();
            let mut buf = vec![0u8; STDOUT_CHUNK_BYTES];
            loop {
                let n = stdout.read(&mut buf).await?;
                if n == 0 {
                    break;
                }
                chunks.push(buf[..n].to_vec());
            }
            Ok(chunks.concat())
        });
        let stderr_task = tokio::spawn(async move {
            let mut text = String::new();
            stderr.read_to_string(&mut text).await.ok();
            text
        });

        self.running = Some(RunningEncode {
            child,
            stdin,
            stdout_task,
            stderr_task,
            frames_written: 0,
        });
        Ok(())
    }

    async fn add_video_frame(
        &mut self,
        frame: &RgbaImage,
        timestamp_secs: f64,
        duration_secs: f64,
    ) -> ReelcutResult<()> {
        let fps = self.spec.fps.max(1) as f64;
        let (width, height) = (self.spec.width, self.spec.height);
        let running = self.running.as_mut().ok_or_else(|| {
            ReelcutError::encode_submission(timestamp_secs, "encoder has not been started")
        })?;

        if frame.width() != width || frame.height() != height {
            return Err(ReelcutError::encode_submission(
                timestamp_secs,
                format!(
                    "frame is {}x{} but the encoder expects {width}x{height}",
                    frame.width(),
                    frame.height()
                ),
            ));
        }

        let expected = running.frames_written as f64 / fps;
        let half_frame = 0.5 / fps;
        if (timestamp_secs - expected).abs() > half_frame
            || (duration_secs - 1.0 / fps).abs() > half_frame
        {
            return Err(ReelcutError::encode_submission(
                timestamp_secs,
                format!("expected a {:.4}s frame at {expected:.4}s", 1.0 / fps),
            ));
        }

        let stdin = running.stdin.as_mut().ok_or_else(|| {
            ReelcutError::encode_submission(timestamp_secs, "encoder input is closed")
        })?;
        stdin
            .write_all(frame.as_raw())
            .await
            .map_err(|e| ReelcutError::encode_submission(timestamp_secs, e.to_string()))?;

        running.frames_written += 1;
        Ok(())
    }

    async fn finalize(&mut self) -> ReelcutResult<EncodedArtifact> {
        let mut running = self
            .running
            .take()
            .ok_or_else(|| ReelcutError::render("encoder has not been started"))?;
        self.finished = true;

        if let Some(mut stdin) = running.stdin.take() {
            stdin.shutdown().await.ok();
        }

        let status = running.child.wait().await?;
        let bytes = running
            .stdout_task
            .await
            .map_err(|e| ReelcutError::render(format!("ffmpeg output reader failed: {e}")))??;
        let stderr = running.stderr_task.await.unwrap_or_default();

        if !status.success() {
            return Err(ReelcutError::render(format!(
                "ffmpeg exited with {status}: {}",
                stderr.trim()
            )));
        }

        tracing::debug!(
            frames = running.frames_written,
            bytes = bytes.len(),
            "ffmpeg encoder finalized"
        );

        Ok(EncodedArtifact {
            bytes,
            mime_type: self.selection.mime_type().to_string(),
        })
    }
}

impl Drop for FfmpegEncoder {
    fn drop(&mut self) {
        if let Some(running) = self.running.take() {
            running.stdout_task.abort();
            running.stderr_task.abort();
        }
        if let Some(path) = self.audio_path.take() {
            std::fs::remove_file(path).ok();
        }
    }
}

fn encoder_names(selection: FormatSelection, available: &HashSet<String>) -> Option<EncoderNames> {
    let video_candidates: &[&'static str] = match selection.video_codec {
        VideoCodec::H264 => &["libx264", "libopenh264", "h264_videotoolbox"],
        VideoCodec::Vp9 => &["libvpx-vp9"],
        VideoCodec::Vp8 => &["libvpx"],
    };
    let audio_candidates: &[&'static str] = match selection.audio_codec {
        AudioCodec::Aac => &["aac", "libfdk_aac"],
        AudioCodec::Opus => &["libopus", "opus"],
    };

    let video = video_candidates
        .iter()
        .copied()
        .find(|name| available.contains(*name))?;
    let audio = audio_candidates
        .iter()
        .copied()
        .find(|name| available.contains(*name))?;
    Some(EncoderNames { video, audio })
}

/// Parse `ffmpeg -encoders` output into the set of encoder names.
fn parse_encoder_list(output: &str) -> HashSet<String> {
    output
        .lines()
        .skip_while(|line| !line.trim_start().starts_with("---"))
        .skip(1)
        .filter_map(|line| {
            let mut parts = line.split_whitespace();
            let flags = parts.next()?;
            let name = parts.next()?;
            (flags.len() == 6).then(|| name.to_string())
        })
        .collect()
}

#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    #[serde(default)]
    streams: Vec<FfprobeStream>,
    format: Option<FfprobeFormat>,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    codec_type: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    sample_rate: Option<String>,
    channels: Option<u16>,
}

#[derive(Debug, Deserialize)]
struct FfprobeFormat {
    duration: Option<String>,
}

fn parse_probe_output(json: &str) -> ReelcutResult<ProbeInfo> {
    let parsed: FfprobeOutput = serde_json::from_str(json)?;

    let duration_secs = parsed
        .format
        .and_then(|f| f.duration)
        .and_then(|d| d.parse::<f64>().ok())
        .filter(|d| d.is_finite() && *d > 0.0)
        .ok_or_else(|| ReelcutError::decode("ffprobe reported no usable duration"))?;

    let video = parsed.streams.iter().find_map(|s| {
        if s.codec_type.as_deref() != Some("video") {
            return None;
        }
        match (s.width, s.height) {
            (Some(w), Some(h)) if w > 0 && h > 0 => Some((w, h)),
            _ => None,
        }
    });

    let audio = parsed.streams.iter().find_map(|s| {
        if s.codec_type.as_deref() != Some("audio") {
            return None;
        }
        let rate = s.sample_rate.as_deref()?.parse::<u32>().ok()?;
        Some((rate, s.channels.unwrap_or(2)))
    });

    Ok(ProbeInfo {
        duration_secs,
        video,
        audio,
    })
}

fn frame_decode_args(path: &Path, source_time: f64, width: u32, height: u32) -> Vec<String> {
    vec![
        "-hide_banner".to_string(),
        "-loglevel".to_string(),
        "error".to_string(),
        "-ss".to_string(),
        format!("{source_time:.6}"),
        "-i".to_string(),
        path.display().to_string(),
        "-frames:v".to_string(),
        "1".to_string(),
        "-an".to_string(),
        "-vf".to_string(),
        format!("scale={width}:{height}"),
        "-f".to_string(),
        "rawvideo".to_string(),
        "-pix_fmt".to_string(),
        "rgba".to_string(),
        "pipe:1".to_string(),
    ]
}

fn audio_decode_args(
    path: &Path,
    start_secs: f64,
    end_secs: f64,
    target: AudioTarget,
) -> Vec<String> {
    vec![
        "-hide_banner".to_string(),
        "-loglevel".to_string(),
        "error".to_string(),
        "-ss".to_string(),
        format!("{start_secs:.6}"),
        "-t".to_string(),
        format!("{:.6}", (end_secs - start_secs).max(0.0)),
        "-i".to_string(),
        path.display().to_string(),
        "-vn".to_string(),
        "-f".to_string(),
        "f32le".to_string(),
        "-ac".to_string(),
        target.channels.to_string(),
        "-ar".to_string(),
        target.sample_rate.to_string(),
        "pipe:1".to_string(),
    ]
}

fn encode_args(
    selection: FormatSelection,
    names: EncoderNames,
    spec: &EncoderSpec,
    audio_path: Option<&Path>,
) -> Vec<String> {
    let mut args = vec![
        "-hide_banner".to_string(),
        "-loglevel".to_string(),
        "error".to_string(),
        "-nostats".to_string(),
        "-f".to_string(),
        "rawvideo".to_string(),
        "-pix_fmt".to_string(),
        "rgba".to_string(),
        "-s".to_string(),
        format!("{}x{}", spec.width, spec.height),
        "-r".to_string(),
        spec.fps.max(1).to_string(),
        "-i".to_string(),
        "pipe:0".to_string(),
    ];

    if let Some(path) = audio_path {
        args.extend([
            "-f".to_string(),
            "f32le".to_string(),
            "-ar".to_string(),
            spec.audio.sample_rate.to_string(),
            "-ac".to_string(),
            spec.audio.channels.to_string(),
            "-i".to_string(),
            path.display().to_string(),
            "-map".to_string(),
            "0:v:0".to_string(),
            "-map".to_string(),
            "1:a:0".to_string(),
        ]);
    }

    args.extend(["-c:v".to_string(), names.video.to_string()]);
    match selection.video_codec {
        VideoCodec::H264 => args.extend([
            "-preset".to_string(),
            "medium".to_string(),
            "-crf".to_string(),
            "18".to_string(),
            "-pix_fmt".to_string(),
            "yuv420p".to_string(),
        ]),
        VideoCodec::Vp9 | VideoCodec::Vp8 => args.extend([
            "-b:v".to_string(),
            "0".to_string(),
            "-crf".to_string(),
            "32".to_string(),
            "-pix_fmt".to_string(),
            "yuv420p".to_string(),
        ]),
    }

    if audio_path.is_some() {
        let bitrate = match selection.audio_codec {
            AudioCodec::Aac => "192k",
            AudioCodec::Opus => "128k",
        };
        args.extend([
            "-c:a".to_string(),
            names.audio.to_string(),
            "-b:a".to_string(),
            bitrate.to_string(),
        ]);
    }

    match selection.container {
        ContainerFormat::Mp4 => args.extend([
            "-movflags".to_string(),
            "frag_keyframe+empty_moov+default_base_moof".to_string(),
            "-f".to_string(),
            "mp4".to_string(),
        ]),
        ContainerFormat::Webm => args.extend(["-f".to_string(), "webm".to_string()]),
    }
    args.push("pipe:1".to_string());
    args
}

fn command_exists(binary: &str) -> bool {
    StdCommand::new("sh")
        .arg("-c")
        .arg(format!("command -v {binary} >/dev/null 2>&1"))
        .status()
        .map(|status| status.success())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    const ENCODERS_OUTPUT: &str = "Encoders:
 V..... = Video
 A..... = Audio
 ------
 V....D libx264              libx264 H.264 / AVC / MPEG-4 AVC (codec h264)
 V....D libvpx-vp9           libvpx VP9 (codec vp9)
 A....D aac                  AAC (Advanced Audio Coding)
 A....D libopus              libopus Opus (codec opus)
";

    #[test]
    fn test_parse_encoder_list() {
        let names = parse_encoder_list(ENCODERS_OUTPUT);
        assert!(names.contains("libx264"));
        assert!(names.contains("libvpx-vp9"));
        assert!(names.contains("aac"));
        assert!(names.contains("libopus"));
        assert!(!names.contains("="));
    }

    #[test]
    fn test_encoder_names_prefers_first_candidate() {
        let names = parse_encoder_list(ENCODERS_OUTPUT);
        let chosen = encoder_names(FormatSelection::PREFERENCE[0], &names).unwrap();
        assert_eq!(chosen.video, "libx264");
        assert_eq!(chosen.audio, "aac");
    }

    #[test]
    fn test_encoder_names_missing_codec() {
        let names: HashSet<String> = ["libvpx-vp9", "libopus"]
            .into_iter()
            .map(String::from)
            .collect();
        assert!(encoder_names(FormatSelection::PREFERENCE[0], &names).is_none());
        assert!(encoder_names(FormatSelection::PREFERENCE[1], &names).is_some());
    }

    #[test]
    fn test_parse_probe_output() {
        let json = r#"{
            "streams": [
                {"codec_type": "video", "width": 1920, "height": 1080},
                {"codec_type": "audio", "sample_rate": "44100", "channels": 1}
            ],
            "format": {"duration": "12.500000"}
        }"#;
        let info = parse_probe_output(json).unwrap();
        assert_eq!(info.duration_secs, 12.5);
        assert_eq!(info.video, Some((1920, 1080)));
        assert_eq!(info.audio, Some((44100, 1)));
    }

    #[test]
    fn test_parse_probe_output_audio_only() {
        let json = r#"{
            "streams": [{"codec_type": "audio", "sample_rate": "48000", "channels": 2}],
            "format": {"duration": "3.0"}
        }"#;
        let info = parse_probe_output(json).unwrap();
        assert_eq!(info.video, None);
        assert_eq!(info.audio, Some((48000, 2)));
    }

    #[test]
    fn test_parse_probe_output_requires_duration() {
        let json = r#"{"streams": [], "format": {}}"#;
        assert!(parse_probe_output(json).is_err());
    }

    #[test]
    fn test_encode_args_mp4_streams_fragmented_output() {
        let spec = EncoderSpec {
            width: 1280,
            height: 720,
            fps: 30,
            audio: AudioTarget::default(),
        };
        let names = EncoderNames {
            video: "libx264",
            audio: "aac",
        };
        let args = encode_args(
            FormatSelection::PREFERENCE[0],
            names,
            &spec,
            Some(Path::new("/tmp/mix.f32")),
        );
        let joined = args.join(" ");
        assert!(joined.contains("-s 1280x720 -r 30 -i pipe:0"));
        assert!(joined.contains("-f f32le -ar 48000 -ac 2 -i /tmp/mix.f32"));
        assert!(joined.contains("-c:v libx264"));
        assert!(joined.contains("-c:a aac"));
        assert!(joined.contains("empty_moov"));
        assert_eq!(args.last().map(String::as_str), Some("pipe:1"));
    }

    #[test]
    fn test_encode_args_without_audio_has_no_audio_codec() {
        let spec = EncoderSpec {
            width: 640,
            height: 360,
            fps: 24,
            audio: AudioTarget::default(),
        };
        let names = EncoderNames {
            video: "libvpx-vp9",
            audio: "libopus",
        };
        let args = encode_args(FormatSelection::PREFERENCE[1], names, &spec, None);
        assert!(!args.iter().any(|a| a == "-c:a"));
        assert!(args.windows(2).any(|w| w[0] == "-f" && w[1] == "webm"));
    }

    #[test]
    fn test_frame_decode_args_scale_and_seek() {
        let args = frame_decode_args(Path::new("clip.mp4"), 1.5, 320, 180);
        let joined = args.join(" ");
        assert!(joined.contains("-ss 1.500000 -i clip.mp4"));
        assert!(joined.contains("scale=320:180"));
        assert!(joined.contains("-pix_fmt rgba"));
    }

    #[test]
    fn test_audio_decode_args_duration() {
        let args = audio_decode_args(Path::new("a.wav"), 2.0, 4.5, AudioTarget::new(44100, 1));
        let joined = args.join(" ");
        assert!(joined.contains("-ss 2.000000 -t 2.500000"));
        assert!(joined.contains("-ac 1 -ar 44100"));
    }
}
