use crate::capture::cancel::CancelToken;
use crate::capture::sampler::{FrameSample, FrameSampler};
use crate::capture::stepper::{SeekStepper, StepStats};
use crate::capture::timeline::sample_times;
use crate::encode::session::{EncodedStream, EncoderSession};
use crate::encode::sink::{EncoderConfig, EncoderFactory};
use crate::foundation::core::Dimensions;
use crate::foundation::error::{FramecapError, FramecapResult};
use crate::pipeline::artifact::OutputArtifact;
use crate::pipeline::config::{CaptureConfig, PipelineOpts};
use crate::pipeline::state::PipelineState;
use crate::raster::surface::{DrawMode, RasterSurface};
use crate::source::decoder::{DecodeService, SourceInput};
use crate::source::handle::{SourceDescriptor, SourceHandle};

/// Resources referenced by the orchestrator at a point in time.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct HeldResources {
    /// Open source handles.
    pub sources: usize,
    /// Allocated raster surfaces.
    pub surfaces: usize,
    /// Live encoder sessions.
    pub sessions: usize,
}

impl HeldResources {
    /// Return `true` when nothing is held.
    pub fn is_empty(&self) -> bool {
        self.sources == 0 && self.surfaces == 0 && self.sessions == 0
    }
}

#[derive(Debug, Default)]
struct RunResources {
    sources: Vec<SourceHandle>,
    surface: Option<RasterSurface>,
    session: Option<EncoderSession>,
}

impl RunResources {
    fn held(&self) -> HeldResources {
        HeldResources {
            sources: self.sources.len(),
            surfaces: usize::from(self.surface.is_some()),
            sessions: usize::from(self.session.is_some()),
        }
    }

    fn release(&mut self) {
        // Session first: its drop joins the encoder thread.
        drop(self.session.take());
        drop(self.surface.take());
        self.sources.clear();
    }
}

/// Composes sources, the surface, the stepper and the encoder session into the three
/// operations: `compress`, `extract_frames` and `merge`.
///
/// One run at a time. Each run starts from `Idle`, moves through the [`PipelineState`]
/// lifecycle, and releases every source handle, surface and session before returning, on
/// success and on failure alike. No partial artifact is ever returned.
pub struct PipelineOrchestrator {
    decoder: Box<dyn DecodeService>,
    encoders: Box<dyn EncoderFactory>,
    opts: PipelineOpts,

    state: PipelineState,
    cancel: CancelToken,
    run: RunResources,
}

impl std::fmt::Debug for PipelineOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineOrchestrator")
            .field("opts", &self.opts)
            .field("state", &self.state)
            .field("held", &self.run.held())
            .finish()
    }
}

impl PipelineOrchestrator {
    /// Build an orchestrator over a decode service and an encoder factory.
    pub fn new(
        decoder: impl DecodeService + 'static,
        encoders: impl EncoderFactory + 'static,
        opts: PipelineOpts,
    ) -> FramecapResult<Self> {
        opts.validate()?;
        Ok(Self {
            decoder: Box::new(decoder),
            encoders: Box::new(encoders),
            opts,
            state: PipelineState::Idle,
            cancel: CancelToken::new(),
            run: RunResources::default(),
        })
    }

    /// Share `token` with the caller instead of the orchestrator's own.
    pub fn with_cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = token;
        self
    }

    /// State of the current or most recent run.
    pub fn state(&self) -> &PipelineState {
        &self.state
    }

    /// Runtime options.
    pub fn opts(&self) -> &PipelineOpts {
        &self.opts
    }

    /// Resources currently referenced. Empty between runs.
    pub fn held_resources(&self) -> HeldResources {
        self.run.held()
    }

    /// Token that cancels the current run before its next seek.
    ///
    /// A cancelled token stays cancelled (failing every later run) until [`Self::reset`].
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Return to `Idle` and clear the cancel token.
    pub fn reset(&mut self) {
        self.run.release();
        self.cancel.clear();
        self.state = PipelineState::Idle;
    }

    /// Resolve metadata of `input` without capturing anything.
    #[tracing::instrument(skip_all, fields(source = %input.name))]
    pub fn probe(&self, input: &SourceInput) -> FramecapResult<SourceDescriptor> {
        let handle = SourceHandle::open(&*self.decoder, input, self.opts.seek_timeout)?;
        Ok(handle.descriptor().clone())
    }

    /// Resample one source to `cfg.target_width` at `cfg.frame_rate` and re-encode it.
    #[tracing::instrument(skip_all, fields(source = %input.name))]
    pub fn compress(
        &mut self,
        input: &SourceInput,
        cfg: &CaptureConfig,
    ) -> FramecapResult<OutputArtifact> {
        self.begin()?;
        let result = self.compress_inner(input, cfg);
        self.finish(result)
    }

    /// Take a PNG snapshot of one source every `cfg.sampling_interval_secs`.
    ///
    /// Samples are ordered by timestamp and always include `0` and the source duration.
    #[tracing::instrument(skip_all, fields(source = %input.name))]
    pub fn extract_frames(
        &mut self,
        input: &SourceInput,
        cfg: &CaptureConfig,
    ) -> FramecapResult<Vec<FrameSample>> {
        self.begin()?;
        let result = self.extract_inner(input, cfg);
        self.finish(result)
    }

    /// Concatenate `inputs` in order into one encoded artifact.
    ///
    /// All sources are rendered at the first source's output size. Later sources keep their
    /// aspect ratio and are never upscaled; the uncovered area is black.
    #[tracing::instrument(skip_all, fields(sources = inputs.len()))]
    pub fn merge(
        &mut self,
        inputs: &[SourceInput],
        cfg: &CaptureConfig,
    ) -> FramecapResult<OutputArtifact> {
        self.begin()?;
        let result = self.merge_inner(inputs, cfg);
        self.finish(result)
    }

    fn begin(&mut self) -> FramecapResult<()> {
        if !matches!(self.state, PipelineState::Idle) && !self.state.is_terminal() {
            return Err(FramecapError::validation(format!(
                "a run is already in progress ({})",
                self.state
            )));
        }
        self.run.release();
        self.state = PipelineState::Idle;
        Ok(())
    }

    fn finish<T>(&mut self, result: FramecapResult<T>) -> FramecapResult<T> {
        self.run.release();
        match result {
            Ok(out) => {
                self.state.advance(PipelineState::Complete)?;
                tracing::info!("run complete");
                Ok(out)
            }
            Err(e) => {
                let reason = e.reason();
                tracing::error!(kind = ?reason.kind, "run failed: {}", reason.message);
                self.state = PipelineState::Failed(reason);
                Err(e)
            }
        }
    }

    fn open_source(&mut self, input: &SourceInput) -> FramecapResult<SourceDescriptor> {
        let handle = SourceHandle::open(&*self.decoder, input, self.opts.seek_timeout)?;
        let descriptor = handle.descriptor().clone();
        self.run.sources.push(handle);
        Ok(descriptor)
    }

    fn start_session(&mut self, dims: Dimensions, cfg: &CaptureConfig) -> FramecapResult<()> {
        let enc_cfg = EncoderConfig {
            dims,
            fps: cfg.fps()?,
        };
        let session = EncoderSession::start(
            &*self.encoders,
            &cfg.codecs,
            enc_cfg,
            self.opts.session_opts(),
        )?;
        self.run.session = Some(session);
        Ok(())
    }

    fn stepper(&self, interval_secs: f64) -> FramecapResult<SeekStepper> {
        SeekStepper::with_pacing(self.opts.pacing_fraction, interval_secs)
    }

    /// Step source `index` into the live session; chunk timestamps are shifted by `offset_secs`.
    ///
    /// With `include_end` unset the sample at the source duration is skipped: the next source's
    /// first frame lands on the same merged timestamp.
    fn encode_source(
        &mut self,
        index: usize,
        interval_secs: f64,
        offset_secs: f64,
        include_end: bool,
    ) -> FramecapResult<StepStats> {
        self.state.advance(PipelineState::Capturing)?;
        let stepper = self.stepper(interval_secs)?;

        let RunResources {
            sources,
            surface,
            session,
        } = &mut self.run;
        let source = sources
            .get_mut(index)
            .ok_or_else(|| FramecapError::validation(format!("no open source #{index}")))?;
        let surface = surface
            .as_mut()
            .ok_or_else(|| FramecapError::validation("no raster surface allocated"))?;
        let session = session
            .as_mut()
            .ok_or_else(|| FramecapError::validation("no encoder session running"))?;

        let mut times = sample_times(source.descriptor().duration_secs, interval_secs)?;
        if !include_end && times.len() > 1 {
            times.pop();
        }
        tracing::debug!(
            source = %source.descriptor().origin.name,
            steps = times.len(),
            offset_secs,
            "capturing source"
        );
        stepper.run(source, surface, &times, &self.cancel, |step| {
            session.ingest(offset_secs + step.timestamp_secs, step.surface.copy_frame())
        })
    }

    fn stop_session(&mut self) -> FramecapResult<EncodedStream> {
        self.state.advance(PipelineState::Finalizing)?;
        let session = self
            .run
            .session
            .take()
            .ok_or_else(|| FramecapError::validation("no encoder session running"))?;
        session.stop()
    }

    fn compress_inner(
        &mut self,
        input: &SourceInput,
        cfg: &CaptureConfig,
    ) -> FramecapResult<OutputArtifact> {
        cfg.validate()?;
        let descriptor = self.open_source(input)?;
        self.state.advance(PipelineState::MetadataResolved)?;

        let dims = Dimensions::derive(descriptor.native, cfg.target_width)?;
        self.run.surface = Some(RasterSurface::new(dims));
        self.start_session(dims, cfg)?;

        let interval = cfg.fps()?.frame_duration_secs();
        self.encode_source(0, interval, 0.0, true)?;

        let stream = self.stop_session()?;
        Ok(OutputArtifact::assemble(
            stream,
            &format!("{}-compressed", input.stem()),
            descriptor.duration_secs,
        ))
    }

    fn extract_inner(
        &mut self,
        input: &SourceInput,
        cfg: &CaptureConfig,
    ) -> FramecapResult<Vec<FrameSample>> {
        cfg.validate()?;
        let descriptor = self.open_source(input)?;
        self.state.advance(PipelineState::MetadataResolved)?;

        let dims = Dimensions::derive(descriptor.native, cfg.target_width)?;
        self.run.surface = Some(RasterSurface::new(dims));

        self.state.advance(PipelineState::Capturing)?;
        let times = sample_times(descriptor.duration_secs, cfg.sampling_interval_secs)?;
        let stepper = self.stepper(cfg.sampling_interval_secs)?;
        let sampler = FrameSampler;
        let mut samples = Vec::with_capacity(times.len());

        let RunResources {
            sources, surface, ..
        } = &mut self.run;
        let source = sources
            .first_mut()
            .ok_or_else(|| FramecapError::validation("no open source"))?;
        let surface = surface
            .as_mut()
            .ok_or_else(|| FramecapError::validation("no raster surface allocated"))?;
        stepper.run(source, surface, &times, &self.cancel, |step| {
            samples.push(sampler.sample(step.surface, step.timestamp_secs)?);
            Ok(())
        })?;

        self.state.advance(PipelineState::Finalizing)?;
        tracing::debug!(samples = samples.len(), "frames extracted");
        Ok(samples)
    }

    fn merge_inner(
        &mut self,
        inputs: &[SourceInput],
        cfg: &CaptureConfig,
    ) -> FramecapResult<OutputArtifact> {
        cfg.validate()?;
        if inputs.is_empty() {
            return Err(FramecapError::validation("merge needs at least one source"));
        }

        let mut durations = Vec::with_capacity(inputs.len());
        let mut canonical = None;
        for input in inputs {
            let descriptor = self.open_source(input)?;
            if canonical.is_none() {
                canonical = Some(Dimensions::derive(descriptor.native, cfg.target_width)?);
            }
            durations.push(descriptor.duration_secs);
        }
        self.state.advance(PipelineState::MetadataResolved)?;

        let dims = canonical.ok_or_else(|| FramecapError::validation("no sources resolved"))?;
        tracing::debug!(canonical = %dims, "merge output size");
        self.run.surface = Some(RasterSurface::new(dims).with_mode(DrawMode::Fit));
        self.start_session(dims, cfg)?;

        let interval = cfg.fps()?.frame_duration_secs();
        let last = durations.len() - 1;
        let mut offset = 0.0;
        for (index, duration) in durations.iter().enumerate() {
            self.encode_source(index, interval, offset, index == last)?;
            offset += duration;
        }

        let stream = self.stop_session()?;
        Ok(OutputArtifact::assemble(stream, "merged", offset))
    }
}
