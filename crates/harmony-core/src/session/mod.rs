//! Capture session orchestration
//!
//! A [`Session`] owns the UI side of one microphone session: the consumer,
//! the shared counters and the capture handle. Toggling on builds a fresh
//! frame ring, lets the backend open the device and construct the producer
//! for the negotiated sample rate, then hands the writer over to the audio
//! thread. Toggling off tears the producer down first and only then
//! discards whatever is still buffered.
//!
//! ```ignore
//! let mut session = Session::new(CpalCaptureBackend::new(), config);
//! session.toggle();
//! while session.state().is_running() {
//!     if let Some(frame) = session.tick() {
//!         selection = session.consumer().merge_candidates(selection);
//!     }
//! }
//! ```

mod error;
mod state;

pub use error::{SessionError, SessionResult};
pub use state::{SessionEvent, SessionState};

use std::sync::Arc;

use crate::analysis::{AnalysisError, SpectralExtractor};
use crate::audio::{CaptureBackend, CaptureHandle};
use crate::config::HarmonyConfig;
use crate::engine::{
    writer_handoff, CandidateTracker, FrameConsumer, FrameProducer, RingTransport,
    TransportAtomics,
};
use crate::types::FrameTuple;

/// Check that this platform can run the lock-free transport
pub fn check_environment() -> SessionResult<()> {
    if cfg!(target_has_atomic = "64") {
        Ok(())
    } else {
        Err(SessionError::EnvironmentUnsupported)
    }
}

pub struct Session<B: CaptureBackend> {
    backend: B,
    config: HarmonyConfig,
    state: SessionState,
    last_error: Option<SessionError>,
    /// Keeps capture alive while `Running`
    handle: Option<B::Handle>,
    consumer: FrameConsumer,
    atomics: Arc<TransportAtomics>,
}

impl<B: CaptureBackend> Session<B> {
    /// Create a session, probing the environment first
    pub fn new(backend: B, config: HarmonyConfig) -> Self {
        Self::with_environment(backend, config, check_environment())
    }

    /// Create a session from an already known environment check result
    pub fn with_environment(
        backend: B,
        config: HarmonyConfig,
        environment: SessionResult<()>,
    ) -> Self {
        let (state, last_error) = match environment {
            Ok(()) => (SessionState::Ready, None),
            Err(e) => {
                log::error!("Session unavailable: {}", e);
                (SessionState::Unavailable, Some(e))
            }
        };

        Self {
            backend,
            config,
            state,
            last_error,
            handle: None,
            consumer: FrameConsumer::new(),
            atomics: Arc::new(TransportAtomics::new()),
        }
    }

    /// User toggle: start from `Ready`/`Failed`, stop from `Running`
    ///
    /// Any other state ignores the toggle. Returns the resulting state.
    pub fn toggle(&mut self) -> SessionState {
        match self.state {
            SessionState::Ready | SessionState::Failed => self.start(),
            SessionState::Running => self.stop(),
            other => log::debug!("Toggle ignored while {}", other),
        }
        self.state
    }

    fn start(&mut self) {
        self.transition(SessionEvent::ToggleOn);
        self.last_error = None;
        self.atomics.reset();

        match self.acquire() {
            Ok(handle) => {
                log::info!(
                    "Capturing from {} ({}Hz, {} ch)",
                    handle.device_name(),
                    handle.sample_rate(),
                    handle.channels()
                );
                self.handle = Some(handle);
                self.transition(SessionEvent::Acquired);
            }
            Err(e) => {
                log::error!("Session failed to start: {}", e);
                self.consumer.disconnect();
                self.last_error = Some(e);
                self.transition(SessionEvent::AcquisitionError);
            }
        }
    }

    /// Open the device, load the analysis module and connect both ends of the ring
    fn acquire(&mut self) -> SessionResult<B::Handle> {
        let (writer, reader) = RingTransport::with_capacity(self.config.transport.capacity);
        let analysis = &self.config.analysis;
        let tracker_config = &self.config.tracker;
        let atomics = &self.atomics;
        let mut handoff = None;

        let handle = self.backend.start(
            &self.config.audio,
            &mut |sample_rate: u32| -> Result<FrameProducer, AnalysisError> {
                let extractor = SpectralExtractor::new(analysis, sample_rate)?;
                let tracker =
                    CandidateTracker::new(tracker_config.clone(), analysis.lowest_frequency);
                let (tx, inbox) = writer_handoff();
                handoff = Some(tx);
                Ok(FrameProducer::new(
                    Box::new(extractor),
                    tracker,
                    inbox,
                    Arc::clone(atomics),
                ))
            },
        )?;

        let mut handoff = handoff.ok_or_else(|| {
            SessionError::ModuleLoadFailed("capture started without an analysis module".into())
        })?;
        if handoff.deliver(writer).is_err() {
            return Err(SessionError::ModuleLoadFailed(
                "frame writer already delivered".into(),
            ));
        }

        self.consumer.connect(reader);
        Ok(handle)
    }

    fn stop(&mut self) {
        self.transition(SessionEvent::ToggleOff);
        self.teardown();
        self.transition(SessionEvent::TeardownComplete);
    }

    /// Release capture first, then the buffered frames and mask history
    fn teardown(&mut self) {
        self.handle = None;
        let discarded = self.consumer.disconnect();
        log::info!(
            "Capture stopped: {} frames produced, {} dropped, {} discarded",
            self.atomics.frames_produced(),
            self.atomics.frames_dropped(),
            discarded
        );
    }

    /// One consumer tick, returns the frame dequeued this tick
    ///
    /// If the capture stream reported a lost device, or the producer vanished
    /// while running, the session moves to `Failed`.
    pub fn tick(&mut self) -> Option<FrameTuple> {
        if !self.state.is_running() {
            return None;
        }

        if self.atomics.stream_failed() {
            self.fail_running("capture device lost");
            return None;
        }

        let frame = self.consumer.poll();
        if frame.is_none() && self.consumer.is_abandoned() {
            self.fail_running("capture stream ended");
        }
        frame
    }

    /// Tear a running session down after the capture side gave up
    fn fail_running(&mut self, reason: &str) {
        let error = SessionError::AcquisitionFailed(reason.to_string());
        log::error!("{}", error);
        self.teardown();
        self.last_error = Some(error);
        self.transition(SessionEvent::AcquisitionError);
    }

    fn transition(&mut self, event: SessionEvent) {
        match self.state.on_event(event) {
            Some(next) => {
                log::info!("Session {} -> {} ({:?})", self.state, next, event);
                self.state = next;
            }
            None => log::warn!("Session ignored {:?} while {}", event, self.state),
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn last_error(&self) -> Option<&SessionError> {
        self.last_error.as_ref()
    }

    pub fn consumer(&self) -> &FrameConsumer {
        &self.consumer
    }

    pub fn atomics(&self) -> &TransportAtomics {
        &self.atomics
    }

    pub fn handle(&self) -> Option<&B::Handle> {
        self.handle.as_ref()
    }

    pub fn config(&self) -> &HarmonyConfig {
        &self.config
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }
}

#[cfg(test)]
mod tests {
    use std::f32::consts::PI;
    use std::sync::Mutex;

    use super::*;
    use crate::audio::{AudioConfig, AudioError, AudioResult, ProducerFactory};

    const SAMPLE_RATE: u32 = 48000;

    type SharedProducer = Arc<Mutex<Option<FrameProducer>>>;

    /// Stands in for the platform: stores the producer so the test can play
    /// the audio thread
    #[derive(Default)]
    struct TestBackend {
        producer: SharedProducer,
        fail_next: Option<AudioError>,
        starts: usize,
    }

    struct TestHandle {
        producer: SharedProducer,
    }

    impl Drop for TestHandle {
        fn drop(&mut self) {
            if let Ok(mut producer) = self.producer.lock() {
                producer.take();
            }
        }
    }

    impl CaptureHandle for TestHandle {
        fn sample_rate(&self) -> u32 {
            SAMPLE_RATE
        }

        fn channels(&self) -> u16 {
            1
        }

        fn device_name(&self) -> &str {
            "test input"
        }
    }

    impl CaptureBackend for TestBackend {
        type Handle = TestHandle;

        fn start(
            &mut self,
            _config: &AudioConfig,
            factory: &mut ProducerFactory<'_>,
        ) -> AudioResult<TestHandle> {
            self.starts += 1;
            if let Some(err) = self.fail_next.take() {
                return Err(err);
            }
            let producer = factory(SAMPLE_RATE)?;
            *self.producer.lock().unwrap() = Some(producer);
            Ok(TestHandle {
                producer: self.producer.clone(),
            })
        }
    }

    fn sine(freq: f32, len: usize) -> Vec<f32> {
        (0..len)
            .map(|i| 0.5 * (2.0 * PI * freq * i as f32 / SAMPLE_RATE as f32).sin())
            .collect()
    }

    fn play(producer: &SharedProducer, samples: &[f32]) {
        let mut guard = producer.lock().unwrap();
        guard.as_mut().expect("capture running").push_samples(samples);
    }

    #[test]
    fn test_start_run_stop() {
        let backend = TestBackend::default();
        let producer = backend.producer.clone();
        let mut session = Session::new(backend, HarmonyConfig::default());
        assert_eq!(session.state(), SessionState::Ready);
        assert!(session.tick().is_none());

        assert_eq!(session.toggle(), SessionState::Running);
        assert!(session.consumer().is_connected());
        assert_eq!(session.handle().map(|h| h.device_name()), Some("test input"));

        let block = session.config().analysis.block_size;
        play(&producer, &sine(440.0, block * 3));
        assert_eq!(session.atomics().frames_produced(), 3);
        assert_eq!(session.atomics().frames_dropped(), 0);

        let frames: Vec<_> = std::iter::from_fn(|| session.tick()).collect();
        assert_eq!(frames.len(), 3);
        let a = 1 << 9;
        assert_ne!(frames[2].usual_suspects & a, 0);

        assert_eq!(session.toggle(), SessionState::Ready);
        assert!(producer.lock().unwrap().is_none());
        assert!(!session.consumer().is_connected());
        assert_eq!(session.consumer().candidate_delta().previous(), 0);
        assert!(session.tick().is_none());
    }

    #[test]
    fn test_stop_discards_buffered_frames() {
        let backend = TestBackend::default();
        let producer = backend.producer.clone();
        let mut session = Session::new(backend, HarmonyConfig::default());
        session.toggle();

        let block = session.config().analysis.block_size;
        play(&producer, &vec![0.0; block * 5]);
        assert_eq!(session.consumer().pending(), 3);
        assert_eq!(session.atomics().frames_dropped(), 2);

        session.toggle();
        assert_eq!(session.consumer().pending(), 0);

        // Counters start over with the next session
        session.toggle();
        assert_eq!(session.state(), SessionState::Running);
        assert_eq!(session.atomics().frames_produced(), 0);
    }

    #[test]
    fn test_acquisition_error_then_retry() {
        let backend = TestBackend {
            fail_next: Some(AudioError::DeviceUnavailable("test input".into())),
            ..TestBackend::default()
        };
        let mut session = Session::new(backend, HarmonyConfig::default());

        assert_eq!(session.toggle(), SessionState::Failed);
        assert_eq!(
            session.last_error(),
            Some(&SessionError::AcquisitionDenied("test input".into()))
        );
        assert!(!session.consumer().is_connected());

        assert_eq!(session.toggle(), SessionState::Running);
        assert!(session.last_error().is_none());
        assert_eq!(session.backend().starts, 2);
    }

    #[test]
    fn test_invalid_analysis_config_is_module_load_failure() {
        let mut config = HarmonyConfig::default();
        config.analysis.block_size = 1000;
        config.analysis.pitch_frame_divisor = 3;
        let mut session = Session::new(TestBackend::default(), config);

        assert_eq!(session.toggle(), SessionState::Failed);
        assert!(matches!(
            session.last_error(),
            Some(SessionError::ModuleLoadFailed(_))
        ));
    }

    #[test]
    fn test_unavailable_is_terminal() {
        let mut session = Session::with_environment(
            TestBackend::default(),
            HarmonyConfig::default(),
            Err(SessionError::EnvironmentUnsupported),
        );
        assert_eq!(session.state(), SessionState::Unavailable);
        assert_eq!(session.toggle(), SessionState::Unavailable);
        assert_eq!(session.backend().starts, 0);
        assert_eq!(
            session.last_error(),
            Some(&SessionError::EnvironmentUnsupported)
        );
    }

    #[test]
    fn test_lost_stream_fails_running_session() {
        let backend = TestBackend::default();
        let producer = backend.producer.clone();
        let mut session = Session::new(backend, HarmonyConfig::default());
        session.toggle();

        // Platform drops the callback (device unplugged)
        producer.lock().unwrap().take();

        assert!(session.tick().is_none());
        assert_eq!(session.state(), SessionState::Failed);
        assert!(matches!(
            session.last_error(),
            Some(SessionError::AcquisitionFailed(_))
        ));
        assert!(session.handle().is_none());

        assert_eq!(session.toggle(), SessionState::Running);
    }

    #[test]
    fn test_stream_failure_flag_fails_running_session() {
        let backend = TestBackend::default();
        let producer = backend.producer.clone();
        let mut session = Session::new(backend, HarmonyConfig::default());
        session.toggle();

        let block = session.config().analysis.block_size;
        play(&producer, &vec![0.0; block]);

        // Device unplugged: the error callback fires, the data callback stays
        producer
            .lock()
            .unwrap()
            .as_ref()
            .expect("capture running")
            .shared_atomics()
            .record_stream_failure();

        assert!(session.tick().is_none());
        assert_eq!(session.state(), SessionState::Failed);
        assert_eq!(
            session.last_error(),
            Some(&SessionError::AcquisitionFailed("capture device lost".into()))
        );
        assert!(session.handle().is_none());
        assert!(producer.lock().unwrap().is_none());
        assert!(!session.consumer().is_connected());

        // Retry clears the flag
        assert_eq!(session.toggle(), SessionState::Running);
        assert!(!session.atomics().stream_failed());
        assert!(session.tick().is_none());
        assert_eq!(session.state(), SessionState::Running);
    }

    #[test]
    fn test_environment_check_on_supported_platform() {
        assert_eq!(check_environment(), Ok(()));
    }
}
