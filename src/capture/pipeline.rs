use crate::audio::path::OUTPUT_CHANNELS;
use crate::encode::encoder::{CaptureEncoder, EncodedChunk, EncoderConfig};
use crate::foundation::core::{Fps, FrameIndex, frame_to_sample};
use crate::foundation::error::{ReelError, ReelResult};
use crate::playback::player::Player;
use crate::playback::sequencer::{PlaybackMode, PlaybackStatus};
use crate::render::cpu::FrameRenderer;

/// Capture session lifecycle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CaptureState {
    /// No session; [`CapturePipeline::begin`] is allowed.
    #[default]
    Idle,
    /// Frames are being produced.
    Recording,
    /// The encoder is assembling the artifact.
    Finalizing,
}

/// Finished capture output.
#[derive(Clone, Debug, PartialEq)]
pub struct CaptureArtifact {
    /// Encoded container bytes.
    pub bytes: Vec<u8>,
    /// Suggested filename including extension.
    pub filename: String,
    /// Total frames encoded.
    pub frames: u64,
    /// `frames / fps`.
    pub duration_secs: f64,
    /// Frames encoded per scene, by index.
    pub per_scene_frames: Vec<u64>,
}

/// Result of one [`CapturePipeline::step`].
#[derive(Clone, Debug, PartialEq)]
pub enum CaptureStep {
    /// A frame was encoded.
    Progress {
        /// 0-based index of the scene the frame belongs to.
        scene: usize,
        /// Number of scenes in the run.
        total: usize,
        /// 0-based frame number.
        frame: u64,
    },
    /// The last scene ended and the artifact is ready; the pipeline is idle again.
    Finished(CaptureArtifact),
}

struct Session {
    encoder: Box<dyn CaptureEncoder>,
    renderer: FrameRenderer,
    fps: Fps,
    chunks: Vec<EncodedChunk>,
    frame: u64,
    per_scene_frames: Vec<u64>,
}

/// Single-session capture driver.
///
/// Each [`step`](Self::step) samples the player's visuals, renders and encodes one frame, then
/// advances the audio clock by exactly one frame's worth of samples and encodes the mixed audio
/// rendered in that span. Audio and video therefore share one clock.
#[derive(Default)]
pub struct CapturePipeline {
    state: CaptureState,
    font: Option<Vec<u8>>,
    session: Option<Session>,
}

impl std::fmt::Debug for CapturePipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CapturePipeline")
            .field("state", &self.state)
            .field("has_font", &self.font.is_some())
            .field("frame", &self.session.as_ref().map(|s| s.frame))
            .finish()
    }
}

impl CapturePipeline {
    /// Create an idle pipeline. Captions are not drawn until a font is set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Draw captions with the given font (TTF/OTF bytes).
    pub fn with_font(mut self, font_bytes: Vec<u8>) -> Self {
        self.font = Some(font_bytes);
        self
    }

    /// Current state.
    pub fn state(&self) -> CaptureState {
        self.state
    }

    /// Frames encoded so far in the running session.
    pub fn frames_encoded(&self) -> u64 {
        self.session.as_ref().map_or(0, |s| s.frame)
    }

    /// Start a session from scene 0.
    ///
    /// Fails without touching `player` when a session is already running. Any setup failure
    /// leaves both the pipeline and the player as they would be after [`cancel`](Self::cancel).
    #[tracing::instrument(skip_all)]
    pub fn begin(
        &mut self,
        player: &mut Player,
        mut encoder: Box<dyn CaptureEncoder>,
    ) -> ReelResult<()> {
        if self.state != CaptureState::Idle {
            return Err(ReelError::capture(format!(
                "a capture session is already {:?}",
                self.state
            )));
        }
        if player.mode() == PlaybackMode::Capture {
            return Err(ReelError::capture(
                "player is already driven by another capture session",
            ));
        }
        if player.scenes().is_empty() {
            return Err(ReelError::capture("scene list is empty"));
        }

        player.stop();
        player.seek(0);
        player.set_mode(PlaybackMode::Capture);

        match self.setup(player, encoder.as_mut()) {
            Ok((renderer, fps)) => {
                if !player.start() {
                    encoder.abort();
                    rollback(player);
                    return Err(ReelError::capture("player refused to start"));
                }
                tracing::info!(
                    scenes = player.scenes().len(),
                    width = renderer.canvas().width,
                    height = renderer.canvas().height,
                    "capture started"
                );
                self.session = Some(Session {
                    encoder,
                    renderer,
                    fps,
                    chunks: Vec::new(),
                    frame: 0,
                    per_scene_frames: vec![0; player.scenes().len()],
                });
                self.state = CaptureState::Recording;
                Ok(())
            }
            Err(e) => {
                encoder.abort();
                rollback(player);
                Err(e)
            }
        }
    }

    fn setup(
        &self,
        player: &mut Player,
        encoder: &mut dyn CaptureEncoder,
    ) -> ReelResult<(FrameRenderer, Fps)> {
        let cfg = player.config().clone();
        let fps = cfg.fps()?;
        let canvas = player.canvas();

        let mut renderer = FrameRenderer::new(canvas, cfg.capture.background_rgba)?;
        if let Some(font) = &self.font {
            renderer = renderer.with_font(font.clone())?;
        }

        let graph = player.graph_mut();
        graph.ensure_graph();
        graph.attach_capture_sink()?;

        encoder.begin(&EncoderConfig {
            width: canvas.width,
            height: canvas.height,
            fps,
            sample_rate: player.sample_rate(),
            channels: OUTPUT_CHANNELS as u16,
            video_bitrate_kbps: cfg.capture.video_bitrate_kbps,
            audio_bitrate_kbps: cfg.capture.audio_bitrate_kbps,
            bg_rgba: cfg.capture.background_rgba,
        })?;
        Ok((renderer, fps))
    }

    /// Encode one frame and advance the clock by one frame.
    ///
    /// On encoder failure the session is abandoned, buffered output is discarded and the
    /// pipeline returns to [`CaptureState::Idle`] before the error is returned.
    pub fn step(&mut self, player: &mut Player) -> ReelResult<CaptureStep> {
        if self.state != CaptureState::Recording {
            return Err(ReelError::capture("no capture session is recording"));
        }
        let Some(session) = self.session.as_mut() else {
            return Err(ReelError::capture("capture session state is missing"));
        };

        let scene = player.index();
        let frame = session.frame;
        let result = encode_frame(session, player);
        if let Err(e) = result {
            tracing::warn!(frame, error = %e, "capture aborted");
            self.cancel(player);
            return Err(e);
        }
        session.frame += 1;
        if let Some(n) = session.per_scene_frames.get_mut(scene) {
            *n += 1;
        }

        if player.status() != PlaybackStatus::Ended {
            return Ok(CaptureStep::Progress {
                scene,
                total: session.per_scene_frames.len(),
                frame,
            });
        }

        self.state = CaptureState::Finalizing;
        match self.finalize(player) {
            Ok(artifact) => Ok(CaptureStep::Finished(artifact)),
            Err(e) => {
                tracing::warn!(error = %e, "capture finalization failed");
                self.cancel(player);
                Err(e)
            }
        }
    }

    fn finalize(&mut self, player: &mut Player) -> ReelResult<CaptureArtifact> {
        let Some(mut session) = self.session.take() else {
            return Err(ReelError::capture("capture session state is missing"));
        };
        let chunks = std::mem::take(&mut session.chunks);
        let bytes = match session.encoder.finish(chunks) {
            Ok(bytes) => bytes,
            Err(e) => {
                session.encoder.abort();
                return Err(e);
            }
        };

        let artifact = CaptureArtifact {
            filename: player
                .config()
                .suggested_filename(session.encoder.file_extension()),
            frames: session.frame,
            duration_secs: session.fps.frames_to_secs(session.frame),
            per_scene_frames: session.per_scene_frames,
            bytes,
        };
        rollback(player);
        self.state = CaptureState::Idle;
        tracing::info!(
            frames = artifact.frames,
            bytes = artifact.bytes.len(),
            filename = %artifact.filename,
            "capture finished"
        );
        Ok(artifact)
    }

    /// Step until the run finishes, reporting each encoded frame to `on_progress`.
    pub fn run(
        &mut self,
        player: &mut Player,
        encoder: Box<dyn CaptureEncoder>,
        mut on_progress: impl FnMut(usize, usize, u64),
    ) -> ReelResult<CaptureArtifact> {
        self.begin(player, encoder)?;
        loop {
            match self.step(player)? {
                CaptureStep::Progress {
                    scene,
                    total,
                    frame,
                } => on_progress(scene, total, frame),
                CaptureStep::Finished(artifact) => return Ok(artifact),
            }
        }
    }

    /// Abandon the running session, if any. Returns `true` when a session was cancelled.
    pub fn cancel(&mut self, player: &mut Player) -> bool {
        if self.state == CaptureState::Idle {
            return false;
        }
        if let Some(mut session) = self.session.take() {
            session.encoder.abort();
        }
        rollback(player);
        self.state = CaptureState::Idle;
        true
    }
}

fn encode_frame(session: &mut Session, player: &mut Player) -> ReelResult<()> {
    if let Some(visual) = player.visual_frame_with(session.renderer.text_measure()) {
        let rgba = session.renderer.render(&visual)?;
        let index = FrameIndex(session.frame);
        session.encoder.push_frame(index, &rgba)?;
    }

    let rate = player.sample_rate();
    let span = frame_to_sample(session.frame + 1, session.fps, rate)
        - frame_to_sample(session.frame, session.fps, rate);
    player.pump(span as usize)?;

    let audio = player.graph_mut().drain_capture();
    session.encoder.push_audio(&audio)?;
    session.chunks.extend(session.encoder.drain_chunks());
    Ok(())
}

/// Detach the recording tap and hand the player back to preview at scene 0.
fn rollback(player: &mut Player) {
    player.graph_mut().detach_capture_sink();
    player.stop();
    player.set_mode(PlaybackMode::Preview);
    player.seek(0);
}

#[cfg(test)]
#[path = "../../tests/unit/capture/pipeline.rs"]
mod tests;
