//! Session controller: the command surface a UI drives.
//!
//! Every command is a non-blocking dispatch to the session's sequencer task.
//! Commands that make no sense in the current state are ignored, so callers
//! never need to check state first.

use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use story_client::{Story, StoryBackend};

use super::types::{Illustration, SessionOptions};
use crate::audio::{AudioSink, HandleLedger};
use crate::captions::segment;
use crate::error::PlayerError;
use crate::playback::{Command, PlaybackSequencer, PlaybackSnapshot, PlayerEvent};
use crate::tts::AudioSourceResolver;

/// Handle to a running story session.
///
/// Dropping the controller ends the session the same way [`shutdown`] does,
/// without waiting for the teardown to finish.
///
/// [`shutdown`]: SessionController::shutdown
pub struct SessionController {
    story: Arc<Story>,
    backend: Arc<dyn StoryBackend>,
    ledger: HandleLedger,
    commands: mpsc::UnboundedSender<Command>,
    snapshot: watch::Receiver<PlaybackSnapshot>,
    task: JoinHandle<()>,
}

impl SessionController {
    /// Fetch a story and open a session for it.
    ///
    /// A story that cannot be fetched or parsed yields [`PlayerError::Story`].
    pub async fn load(
        backend: Arc<dyn StoryBackend>,
        story_id: &str,
        options: SessionOptions,
        sink: Box<dyn AudioSink>,
    ) -> Result<(Self, mpsc::UnboundedReceiver<PlayerEvent>), PlayerError> {
        let story = backend.fetch_story(story_id).await?;
        log::info!(
            "Loaded \"{}\" ({} scenes) from {}",
            story.title,
            story.scene_count(),
            backend.name()
        );
        Ok(Self::start(backend, story, options, sink))
    }

    /// Open a session for an already loaded story. Must run inside a tokio
    /// runtime.
    pub fn start(
        backend: Arc<dyn StoryBackend>,
        story: Story,
        options: SessionOptions,
        sink: Box<dyn AudioSink>,
    ) -> (Self, mpsc::UnboundedReceiver<PlayerEvent>) {
        let story = Arc::new(story);
        let resolver = Arc::new(AudioSourceResolver::new(
            Arc::clone(&backend),
            options.voice.clone(),
        ));
        let ledger = resolver.ledger().clone();

        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (snapshot_tx, snapshot_rx) = watch::channel(PlaybackSnapshot {
            captions_enabled: options.captions,
            ..PlaybackSnapshot::default()
        });
        let (commands_tx, commands_rx) = mpsc::unbounded_channel();

        let sequencer = PlaybackSequencer::new(
            Arc::clone(&story),
            resolver,
            sink,
            options.sequencer_settings(),
            events_tx,
            snapshot_tx,
        );
        let task = tokio::spawn(sequencer.run(commands_rx));

        let controller = Self {
            story,
            backend,
            ledger,
            commands: commands_tx,
            snapshot: snapshot_rx,
            task,
        };
        (controller, events_rx)
    }

    pub fn story(&self) -> &Story {
        &self.story
    }

    /// Latest published snapshot.
    pub fn status(&self) -> PlaybackSnapshot {
        self.snapshot.borrow().clone()
    }

    /// Receiver that sees every snapshot change.
    pub fn watch(&self) -> watch::Receiver<PlaybackSnapshot> {
        self.snapshot.clone()
    }

    /// Ledger of audio handles held by this session.
    pub fn ledger(&self) -> HandleLedger {
        self.ledger.clone()
    }

    /// Caption units of a scene, for untimed display.
    pub fn caption_units(&self, index: usize) -> Vec<String> {
        self.story
            .scene(index)
            .map(|scene| segment(&scene.text))
            .unwrap_or_default()
    }

    /// Play the current scene, or resume it when paused.
    pub fn listen(&self) {
        self.send(Command::Listen);
    }

    pub fn pause(&self) {
        self.send(Command::Pause);
    }

    /// Halt narration and any auto-play run, keeping the scene.
    pub fn stop(&self) {
        self.send(Command::Stop);
    }

    /// Auto-play the whole story from the first scene.
    pub fn restart(&self) {
        self.send(Command::Restart);
    }

    /// Auto-play from the current scene to the end.
    pub fn play_all(&self) {
        self.send(Command::PlayAll);
    }

    /// Select a scene without playing it. Ignored during auto-play and for
    /// indexes past the last scene.
    pub fn go_to_scene(&self, index: usize) {
        if index >= self.story.scene_count() {
            log::debug!(
                "Ignored go to scene {}: story has {} scenes",
                index,
                self.story.scene_count()
            );
            return;
        }
        self.send(Command::GoToScene(index));
    }

    pub fn next_scene(&self) {
        self.send(Command::NextScene);
    }

    pub fn previous_scene(&self) {
        self.send(Command::PreviousScene);
    }

    pub fn toggle_ambient(&self) {
        self.send(Command::ToggleAmbient);
    }

    pub fn toggle_captions(&self) {
        self.send(Command::ToggleCaptions);
    }

    /// Fetch a scene's illustration. Unflagged scenes and failed fetches give
    /// `None`.
    pub async fn illustration(&self, index: usize) -> Option<Illustration> {
        let scene = self.story.scene(index)?;
        if !scene.has_cached_image {
            return None;
        }

        match self.backend.fetch_image(&self.story.id, scene.artifact_index).await {
            Ok(bytes) if !bytes.is_empty() => Some(Illustration::new(index, bytes)),
            Ok(_) => {
                log::warn!("Empty illustration for scene {}", index + 1);
                None
            }
            Err(e) => {
                log::warn!("Illustration for scene {} unavailable: {}", index + 1, e);
                None
            }
        }
    }

    /// End the session: stop every channel, cancel any run and release all
    /// audio. Returns once teardown is complete.
    pub async fn shutdown(self) {
        let Self { commands, task, .. } = self;
        drop(commands);
        if let Err(e) = task.await {
            log::warn!("Session task ended abnormally: {}", e);
        }
    }

    fn send(&self, command: Command) {
        if self.commands.send(command).is_err() {
            log::debug!("Session closed, dropped {:?}", command);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::testing::wav_secs;
    use crate::audio::{AmbientCategory, Channel, RecordingSink, SinkCall};
    use crate::playback::PlaybackState;
    use crate::session::ImageFormat;
    use std::future::Future;
    use std::time::Duration;
    use story_client::{ArtifactKey, MockBackend, StoryError};
    use tokio::time::Instant;

    fn audio(secs: u64) -> Vec<u8> {
        wav_secs(secs)
    }

    struct Harness {
        controller: SessionController,
        events: mpsc::UnboundedReceiver<PlayerEvent>,
        backend: Arc<MockBackend>,
        sink: RecordingSink,
        t0: Instant,
    }

    impl Harness {
        fn new(story: Story, backend: MockBackend) -> Self {
            Self::with_options(story, backend, SessionOptions::default())
        }

        fn with_options(story: Story, backend: MockBackend, options: SessionOptions) -> Self {
            let backend = Arc::new(backend);
            let sink = RecordingSink::default();
            let (controller, events) =
                SessionController::start(backend.clone(), story, options, Box::new(sink.clone()));
            Self {
                controller,
                events,
                backend,
                sink,
                t0: Instant::now(),
            }
        }

        fn elapsed(&self) -> Duration {
            Instant::now() - self.t0
        }

        /// Collect events up to and including the first matching one.
        async fn until(&mut self, done: impl Fn(&PlayerEvent) -> bool) -> Vec<PlayerEvent> {
            let mut seen = Vec::new();
            loop {
                let event = within(self.events.recv()).await.expect("session closed");
                let matched = done(&event);
                seen.push(event);
                if matched {
                    return seen;
                }
            }
        }

        async fn until_state(&self, state: PlaybackState) {
            let mut rx = self.controller.watch();
            within(rx.wait_for(|s| s.state == state)).await.unwrap();
        }

        /// Drain everything emitted so far.
        fn drain(&mut self) -> Vec<PlayerEvent> {
            let mut seen = Vec::new();
            while let Ok(event) = self.events.try_recv() {
                seen.push(event);
            }
            seen
        }
    }

    async fn within<F: Future>(future: F) -> F::Output {
        tokio::time::timeout(Duration::from_secs(3600), future)
            .await
            .expect("timed out waiting for the session")
    }

    fn started_scenes(events: &[PlayerEvent]) -> Vec<usize> {
        events
            .iter()
            .filter_map(|e| match e {
                PlayerEvent::NarrationStarted { scene, .. } => Some(*scene),
                _ => None,
            })
            .collect()
    }

    fn three_scenes() -> Story {
        Story::from_texts("s1", "Three", &["One.", "Two.", "Three."])
    }

    #[tokio::test(start_paused = true)]
    async fn test_captions_follow_narration() {
        let mut story =
            Story::from_texts("s1", "Cat", &["A cat sat. It purred.", "The sun rose."]);
        story.scenes[0].has_cached_narration = true;
        let backend = MockBackend::new(story.clone())
            .with_cached_audio(ArtifactKey::Narration(0), audio(4));
        let mut h = Harness::new(story, backend);

        h.controller.listen();

        let mut timeline = Vec::new();
        loop {
            let event = within(h.events.recv()).await.unwrap();
            match event {
                PlayerEvent::CaptionChanged { unit, text, .. } => {
                    timeline.push((h.elapsed(), unit, text));
                }
                PlayerEvent::NarrationFinished { scene } => {
                    assert_eq!(scene, 0);
                    break;
                }
                _ => {}
            }
        }

        assert_eq!(
            timeline,
            vec![
                (Duration::ZERO, Some(0), Some("A cat sat.".to_string())),
                (Duration::from_secs(2), Some(1), Some("It purred.".to_string())),
                (Duration::from_secs(4), None, None),
            ]
        );
        h.until_state(PlaybackState::Idle).await;
        assert!(h.backend.synthesized_texts().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_play_all_visits_every_scene_then_idles() {
        let backend = MockBackend::new(three_scenes()).with_synthesis(audio(1));
        let mut h = Harness::new(three_scenes(), backend);

        h.controller.play_all();
        let events = h.until(|e| *e == PlayerEvent::RunFinished).await;

        assert_eq!(started_scenes(&events), vec![0, 1, 2]);
        assert_eq!(h.backend.synthesized_texts(), vec!["One.", "Two.", "Three."]);
        // Three one-second scenes and two pacing pauses
        assert_eq!(h.elapsed(), Duration::from_secs(5));

        h.until_state(PlaybackState::Idle).await;
        let status = h.controller.status();
        assert_eq!(status.scene, 2);
        assert!(!status.auto_play);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_during_play_all_keeps_scene() {
        let backend = MockBackend::new(three_scenes()).with_synthesis(audio(2));
        let mut h = Harness::new(three_scenes(), backend);

        h.controller.play_all();
        h.until(|e| {
            *e == PlayerEvent::NarrationStarted {
                scene: 1,
                duration: Duration::from_secs(2),
            }
        })
        .await;
        h.controller.stop();
        h.until(|e| matches!(e, PlayerEvent::RunCancelled { scene: 1 })).await;

        tokio::time::sleep(Duration::from_secs(30)).await;

        assert_eq!(h.backend.synthesized_texts(), vec!["One.", "Two."]);
        let status = h.controller.status();
        assert_eq!(status.state, PlaybackState::Stopped);
        assert_eq!(status.scene, 1);
        assert_eq!(status.caption, None);
        assert!(!started_scenes(&h.drain()).contains(&2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_during_pacing_pause() {
        let backend = MockBackend::new(three_scenes()).with_synthesis(audio(1));
        let mut h = Harness::new(three_scenes(), backend);

        h.controller.play_all();
        h.until(|e| *e == PlayerEvent::NarrationFinished { scene: 0 }).await;
        h.controller.stop();
        h.until_state(PlaybackState::Stopped).await;

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(h.backend.synthesized_texts(), vec!["One."]);
        assert_eq!(h.controller.status().scene, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_pause_freezes_pacing_pause() {
        let backend = MockBackend::new(three_scenes()).with_synthesis(audio(1));
        let mut h = Harness::new(three_scenes(), backend);

        h.controller.play_all();
        h.until(|e| *e == PlayerEvent::NarrationFinished { scene: 0 }).await;
        tokio::time::sleep(Duration::from_millis(400)).await;
        h.controller.pause();
        h.until_state(PlaybackState::Paused).await;

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert!(started_scenes(&h.drain()).is_empty());
        assert_eq!(h.backend.synthesized_texts(), vec!["One."]);
        let status = h.controller.status();
        assert_eq!(status.state, PlaybackState::Paused);
        assert_eq!(status.scene, 0);
        assert!(status.auto_play);

        h.controller.listen();
        h.until(|e| matches!(e, PlayerEvent::NarrationStarted { scene: 1, .. }))
            .await;
        // 1s narration, 0.4s of the pause, 10s held, then the remaining 0.6s
        assert_eq!(h.elapsed(), Duration::from_secs(12));
        assert_eq!(h.backend.synthesized_texts(), vec!["One.", "Two."]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_while_paused_cancels_run() {
        let backend = MockBackend::new(three_scenes()).with_synthesis(audio(2));
        let mut h = Harness::new(three_scenes(), backend);

        h.controller.play_all();
        h.until(|e| matches!(e, PlayerEvent::NarrationStarted { scene: 1, .. }))
            .await;
        h.controller.pause();
        h.until_state(PlaybackState::Paused).await;
        h.controller.stop();
        h.until(|e| *e == PlayerEvent::RunCancelled { scene: 1 }).await;

        tokio::time::sleep(Duration::from_secs(30)).await;

        assert_eq!(h.backend.synthesized_texts(), vec!["One.", "Two."]);
        assert!(!started_scenes(&h.drain()).contains(&2));
        let status = h.controller.status();
        assert_eq!(status.state, PlaybackState::Stopped);
        assert_eq!(status.scene, 1);
        assert!(!status.auto_play);

        let calls = h.sink.calls();
        let paused = calls
            .iter()
            .position(|c| *c == SinkCall::Pause(Channel::Narration))
            .unwrap();
        assert!(calls[paused..].contains(&SinkCall::Stop(Channel::Narration)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_during_loading() {
        let backend = MockBackend::new(three_scenes())
            .with_synthesis(audio(1))
            .with_latency(Duration::from_secs(5));
        let mut h = Harness::new(three_scenes(), backend);

        h.controller.listen();
        h.until_state(PlaybackState::Loading).await;
        h.controller.stop();
        h.until_state(PlaybackState::Stopped).await;

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert!(started_scenes(&h.drain()).is_empty());
        assert_eq!(h.controller.ledger().live(), 0);
        assert_eq!(h.sink.starts(Channel::Narration), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_pause_freezes_narration_and_captions() {
        let story = Story::from_texts("s1", "T", &["First part. Second part."]);
        let backend = MockBackend::new(story.clone()).with_synthesis(audio(4));
        let mut h = Harness::new(story, backend);

        h.controller.listen();
        h.until_state(PlaybackState::Playing).await;
        tokio::time::sleep(Duration::from_secs(1)).await;
        h.controller.pause();
        h.until_state(PlaybackState::Paused).await;

        tokio::time::sleep(Duration::from_secs(10)).await;
        let seen = h.drain();
        assert!(!seen.iter().any(|e| matches!(e, PlayerEvent::NarrationFinished { .. })));
        assert_eq!(h.controller.status().caption, Some(0));

        h.controller.listen();
        let events = h
            .until(|e| matches!(e, PlayerEvent::CaptionChanged { unit: Some(1), .. }))
            .await;
        assert!(events.contains(&PlayerEvent::StateChanged(PlaybackState::Playing)));
        assert_eq!(h.elapsed(), Duration::from_secs(12));

        h.until(|e| matches!(e, PlayerEvent::NarrationFinished { .. })).await;
        assert_eq!(h.elapsed(), Duration::from_secs(14));
        assert!(h.sink.calls().contains(&SinkCall::Pause(Channel::Narration)));
        assert!(h.sink.calls().contains(&SinkCall::Resume(Channel::Narration)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_restart_resets_scene_and_caption() {
        for setup in ["playing", "paused", "stopped"] {
            let backend = MockBackend::new(three_scenes()).with_synthesis(audio(4));
            let mut h = Harness::new(three_scenes(), backend);

            h.controller.go_to_scene(1);
            h.controller.listen();
            h.until(|e| matches!(e, PlayerEvent::CaptionChanged { unit: Some(0), .. }))
                .await;
            match setup {
                "paused" => {
                    h.controller.pause();
                    h.until_state(PlaybackState::Paused).await;
                }
                "stopped" => {
                    h.controller.stop();
                    h.until_state(PlaybackState::Stopped).await;
                }
                _ => {}
            }

            h.controller.restart();
            let events = h.until(|e| *e == PlayerEvent::SceneChanged(0)).await;
            if setup != "stopped" {
                assert!(
                    events.contains(&PlayerEvent::CaptionChanged {
                        scene: 1,
                        unit: None,
                        text: None
                    }),
                    "caption not cleared from {}",
                    setup
                );
            }

            h.until(|e| matches!(e, PlayerEvent::NarrationStarted { scene: 0, .. }))
                .await;
            let status = h.controller.status();
            assert_eq!(status.scene, 0, "from {}", setup);
            assert!(status.auto_play);
            assert_eq!(h.backend.synthesized_texts(), vec!["Two.", "One."]);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_toggle_ambient_twice_restores_state() {
        let mut story = three_scenes();
        story.scenes[0].has_cached_ambient = true;
        story.scenes[0].has_cached_music = true;
        let backend = MockBackend::new(story.clone())
            .with_cached_audio(ArtifactKey::SoundEffects, audio(10))
            .with_cached_audio(ArtifactKey::Music, audio(20));
        let mut h = Harness::new(story, backend);

        h.controller.toggle_ambient();
        h.until(|e| matches!(e, PlayerEvent::AmbientStarted(_))).await;
        h.until(|e| matches!(e, PlayerEvent::AmbientStarted(_))).await;
        assert!(h.controller.status().ambient_enabled);
        assert_eq!(h.controller.ledger().live(), 2);

        h.controller.toggle_ambient();
        h.until(|e| *e == PlayerEvent::AmbientToggled(false)).await;
        h.until_state(PlaybackState::Idle).await;

        assert!(!h.controller.status().ambient_enabled);
        assert_eq!(h.controller.ledger().live(), 0);
        assert_eq!(h.backend.cached_requests().len(), 2);
        for category in AmbientCategory::ALL {
            assert_eq!(h.sink.starts(Channel::Ambient(category)), 1);
            assert_eq!(h.sink.stops(Channel::Ambient(category)), 1);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_ambient_survives_scene_changes() {
        let mut story = three_scenes();
        story.scenes[0].has_cached_ambient = true;
        let backend = MockBackend::new(story.clone())
            .with_cached_audio(ArtifactKey::SoundEffects, audio(10))
            .with_synthesis(audio(1));
        let mut h = Harness::new(story, backend);

        h.controller.play_all();
        h.until(|e| *e == PlayerEvent::RunFinished).await;

        assert!(h.controller.status().ambient_enabled);
        assert_eq!(h.sink.starts(Channel::Ambient(AmbientCategory::SoundEffects)), 1);
        assert_eq!(h.sink.stops(Channel::Ambient(AmbientCategory::SoundEffects)), 0);
        assert_eq!(h.backend.cached_requests(), vec![ArtifactKey::SoundEffects]);

        // A second run keeps the loop going rather than refetching
        h.controller.restart();
        h.until(|e| *e == PlayerEvent::RunFinished).await;
        assert_eq!(h.backend.cached_requests(), vec![ArtifactKey::SoundEffects]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_scene_does_not_abort_run() {
        let backend = MockBackend::new(three_scenes())
            .with_synthesis_for("One.", audio(1))
            .with_synthesis_for("Three.", audio(1));
        let mut h = Harness::new(three_scenes(), backend);

        h.controller.play_all();
        let events = h.until(|e| *e == PlayerEvent::RunFinished).await;

        assert_eq!(started_scenes(&events), vec![0, 2]);
        assert!(events.iter().any(|e| matches!(e, PlayerEvent::AudioUnavailable { scene: 1, .. })));
        // One second each for scenes 0 and 2, one pause after scene 0, none after the failure
        assert_eq!(h.elapsed(), Duration::from_secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_listen_returns_to_idle() {
        let mut h = Harness::new(three_scenes(), MockBackend::new(three_scenes()));

        h.controller.listen();
        let events = h
            .until(|e| matches!(e, PlayerEvent::AudioUnavailable { scene: 0, .. }))
            .await;
        assert!(events.contains(&PlayerEvent::StateChanged(PlaybackState::Loading)));
        h.until_state(PlaybackState::Idle).await;
        assert_eq!(h.controller.ledger().issued(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_listen_again_reuses_loaded_narration() {
        let backend = MockBackend::new(three_scenes()).with_synthesis(audio(1));
        let mut h = Harness::new(three_scenes(), backend);

        h.controller.listen();
        h.until(|e| matches!(e, PlayerEvent::NarrationFinished { .. })).await;
        h.controller.listen();
        h.until(|e| matches!(e, PlayerEvent::NarrationFinished { .. })).await;

        assert_eq!(h.backend.synthesized_texts(), vec!["One."]);
        assert_eq!(h.sink.starts(Channel::Narration), 2);
        assert_eq!(h.controller.ledger().issued(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_navigation_is_ignored_during_run() {
        let backend = MockBackend::new(three_scenes()).with_synthesis(audio(2));
        let mut h = Harness::new(three_scenes(), backend);

        h.controller.play_all();
        h.until(|e| matches!(e, PlayerEvent::NarrationStarted { scene: 0, .. }))
            .await;
        h.controller.go_to_scene(2);
        h.controller.next_scene();
        let events = h.until(|e| *e == PlayerEvent::RunFinished).await;

        assert_eq!(started_scenes(&events), vec![1, 2]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_go_to_scene_resets_without_playing() {
        let backend = MockBackend::new(three_scenes()).with_synthesis(audio(4));
        let mut h = Harness::new(three_scenes(), backend);

        h.controller.listen();
        h.until(|e| matches!(e, PlayerEvent::CaptionChanged { unit: Some(0), .. }))
            .await;
        h.controller.go_to_scene(2);
        let events = h.until(|e| *e == PlayerEvent::SceneChanged(2)).await;
        assert!(events.contains(&PlayerEvent::CaptionChanged {
            scene: 0,
            unit: None,
            text: None
        }));
        h.until_state(PlaybackState::Idle).await;

        h.controller.go_to_scene(7);
        h.controller.previous_scene();
        h.until(|e| *e == PlayerEvent::SceneChanged(1)).await;

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(h.controller.status().state, PlaybackState::Idle);
        assert_eq!(h.controller.ledger().live(), 0);
        assert_eq!(h.sink.stops(Channel::Narration), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_toggle_captions_midway() {
        let story = Story::from_texts("s1", "T", &["First part. Second part."]);
        let backend = MockBackend::new(story.clone()).with_synthesis(audio(4));
        let options = SessionOptions {
            captions: false,
            ..SessionOptions::default()
        };
        let mut h = Harness::with_options(story, backend, options);

        h.controller.listen();
        h.until_state(PlaybackState::Playing).await;
        tokio::time::sleep(Duration::from_secs(3)).await;
        assert!(!h.drain().iter().any(|e| matches!(e, PlayerEvent::CaptionChanged { .. })));

        h.controller.toggle_captions();
        let events = h.until(|e| matches!(e, PlayerEvent::CaptionChanged { .. })).await;
        assert_eq!(
            events.last(),
            Some(&PlayerEvent::CaptionChanged {
                scene: 0,
                unit: Some(1),
                text: Some("Second part.".to_string()),
            })
        );

        h.until(|e| matches!(e, PlayerEvent::CaptionChanged { unit: None, .. }))
            .await;
        assert_eq!(h.elapsed(), Duration::from_secs(4));

        h.controller.toggle_captions();
        h.until(|e| *e == PlayerEvent::CaptionsToggled(false)).await;
        assert!(!h.controller.status().captions_enabled);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_releases_everything() {
        let mut story = three_scenes();
        story.scenes[0].has_cached_music = true;
        let backend = MockBackend::new(story.clone())
            .with_cached_audio(ArtifactKey::Music, audio(10))
            .with_synthesis(audio(4));
        let mut h = Harness::new(story, backend);

        h.controller.play_all();
        let events = h
            .until(|e| matches!(e, PlayerEvent::AmbientStarted(AmbientCategory::Music)))
            .await;
        if started_scenes(&events).is_empty() {
            h.until(|e| matches!(e, PlayerEvent::NarrationStarted { .. })).await;
        }

        let ledger = h.controller.ledger();
        let watch = h.controller.watch();
        assert_eq!(ledger.live(), 2);

        h.controller.shutdown().await;
        assert_eq!(ledger.live(), 0);
        assert_eq!(watch.borrow().state, PlaybackState::Idle);
        assert!(!watch.borrow().auto_play);
        assert!(h.sink.stops(Channel::Narration) >= 1);
        assert_eq!(h.sink.stops(Channel::Ambient(AmbientCategory::Music)), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_illustration() {
        let mut story = three_scenes();
        story.scenes[1].has_cached_image = true;
        story.scenes[2].has_cached_image = true;
        let backend = MockBackend::new(story.clone()).with_image(1, b"\x89PNG\r\n\x1a\n".to_vec());
        let h = Harness::new(story, backend);

        let image = h.controller.illustration(1).await.unwrap();
        assert_eq!(image.format, ImageFormat::Png);
        assert_eq!(image.scene, 1);

        assert!(h.controller.illustration(0).await.is_none());
        assert!(h.controller.illustration(2).await.is_none());
        assert!(h.controller.illustration(9).await.is_none());
    }

    #[tokio::test]
    async fn test_load_failure_cannot_display() {
        let backend: Arc<dyn StoryBackend> = Arc::new(MockBackend::offline());
        let result = SessionController::load(
            backend,
            "s1",
            SessionOptions::default(),
            Box::new(RecordingSink::default()),
        )
        .await;
        assert!(matches!(
            result,
            Err(PlayerError::Story(StoryError::NetworkFailure(_)))
        ));
    }

    #[tokio::test]
    async fn test_load_and_inspect() {
        let backend: Arc<dyn StoryBackend> = Arc::new(MockBackend::new(three_scenes()));
        let (controller, _events) = SessionController::load(
            backend,
            "s1",
            SessionOptions::default(),
            Box::new(RecordingSink::default()),
        )
        .await
        .unwrap();

        assert_eq!(controller.story().title, "Three");
        assert_eq!(controller.caption_units(2), vec!["Three."]);
        assert!(controller.caption_units(5).is_empty());
        assert_eq!(controller.status().state, PlaybackState::Idle);
        controller.shutdown().await;
    }
}
