//! Playback sequencing: the state machine behind a story session.
//!
//! The sequencer runs as a single task. Commands, fetch results and timer
//! deadlines are handled one at a time, so no two transitions ever interleave.
//! Network work runs in spawned tasks that report back over channels; results
//! that arrive after the sequencer has moved on are dropped as stale.
//!
//! Stopping an auto-play run removes it and cancels its token. Narration
//! fetches started for the run hold child tokens, so an in-flight fetch is
//! abandoned at once; a result that still slips through fails the ticket
//! check. With the run gone, nothing schedules the next scene.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::time::{Instant, sleep_until};
use tokio_util::sync::CancellationToken;

use story_client::{Story, StoryError};

use super::state::{PlaybackSnapshot, PlaybackState, PlayerEvent};
use crate::audio::{
    AmbientLoaded, AmbientMixer, AudioHandle, AudioSink, Channel, MixLevels, PlayClock,
};
use crate::captions::{CaptionCursor, segment};
use crate::error::PlayerError;
use crate::tts::AudioSourceResolver;

/// User intents accepted by the sequencer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Listen,
    Pause,
    Stop,
    Restart,
    PlayAll,
    GoToScene(usize),
    NextScene,
    PreviousScene,
    ToggleAmbient,
    ToggleCaptions,
}

impl Command {
    fn name(self) -> &'static str {
        match self {
            Self::Listen => "listen",
            Self::Pause => "pause",
            Self::Stop => "stop",
            Self::Restart => "restart",
            Self::PlayAll => "play all",
            Self::GoToScene(_) => "go to scene",
            Self::NextScene => "next scene",
            Self::PreviousScene => "previous scene",
            Self::ToggleAmbient => "toggle ambient",
            Self::ToggleCaptions => "toggle captions",
        }
    }
}

#[derive(Debug, Clone)]
pub struct SequencerSettings {
    /// Silence between scenes of an auto-play run
    pub scene_pause: Duration,
    pub levels: MixLevels,
    /// Captions shown from the start
    pub captions: bool,
    /// Switch ambient sound on when an auto-play run starts
    pub auto_ambient: bool,
}

impl Default for SequencerSettings {
    fn default() -> Self {
        Self {
            scene_pause: Duration::from_millis(1000),
            levels: MixLevels::default(),
            captions: true,
            auto_ambient: true,
        }
    }
}

/// Outcome of a narration fetch.
struct Resolved {
    ticket: u64,
    scene: usize,
    result: Result<AudioHandle, StoryError>,
}

/// The narration fetch in flight.
struct PendingLoad {
    ticket: u64,
    token: CancellationToken,
}

/// Loaded narration for one scene and its playback position.
struct Narration {
    scene: usize,
    handle: AudioHandle,
    clock: PlayClock,
    units: Vec<String>,
}

impl Narration {
    fn duration(&self) -> Duration {
        self.handle.duration()
    }

    fn end_deadline(&self) -> Option<Instant> {
        self.clock.instant_at(self.duration())
    }
}

#[derive(Debug, Clone, Copy)]
enum Gap {
    Waiting(Instant),
    Frozen(Duration),
}

/// An auto-play run in progress.
struct AutoPlayRun {
    /// Parent of every narration fetch made for the run
    token: CancellationToken,
    /// Pacing pause before the next scene
    gap: Option<Gap>,
}

pub struct PlaybackSequencer {
    story: Arc<Story>,
    resolver: Arc<AudioSourceResolver>,
    mixer: AmbientMixer,
    sink: Box<dyn AudioSink>,
    settings: SequencerSettings,
    captions_enabled: bool,

    state: PlaybackState,
    scene: usize,
    narration: Option<Narration>,
    captions: Option<CaptionCursor>,
    pending: Option<PendingLoad>,
    next_ticket: u64,
    run: Option<AutoPlayRun>,

    resolved_tx: mpsc::UnboundedSender<Resolved>,
    resolved_rx: mpsc::UnboundedReceiver<Resolved>,
    ambient_tx: mpsc::UnboundedSender<AmbientLoaded>,
    ambient_rx: mpsc::UnboundedReceiver<AmbientLoaded>,
    events: mpsc::UnboundedSender<PlayerEvent>,
    snapshot_tx: watch::Sender<PlaybackSnapshot>,
}

impl PlaybackSequencer {
    pub fn new(
        story: Arc<Story>,
        resolver: Arc<AudioSourceResolver>,
        sink: Box<dyn AudioSink>,
        settings: SequencerSettings,
        events: mpsc::UnboundedSender<PlayerEvent>,
        snapshot_tx: watch::Sender<PlaybackSnapshot>,
    ) -> Self {
        let (resolved_tx, resolved_rx) = mpsc::unbounded_channel();
        let (ambient_tx, ambient_rx) = mpsc::unbounded_channel();
        let mixer = AmbientMixer::new(Arc::clone(&resolver), settings.levels);

        Self {
            story,
            resolver,
            mixer,
            sink,
            captions_enabled: settings.captions,
            settings,
            state: PlaybackState::Idle,
            scene: 0,
            narration: None,
            captions: None,
            pending: None,
            next_ticket: 0,
            run: None,
            resolved_tx,
            resolved_rx,
            ambient_tx,
            ambient_rx,
            events,
            snapshot_tx,
        }
    }

    /// Process commands until the command channel closes, then tear down.
    pub async fn run(mut self, mut commands: mpsc::UnboundedReceiver<Command>) {
        self.publish();

        loop {
            let caption_tick = self.captions.as_ref().and_then(CaptionCursor::next_deadline);
            let narration_end = self.narration.as_ref().and_then(Narration::end_deadline);
            let gap_end = self.gap_deadline();

            tokio::select! {
                biased;

                command = commands.recv() => match command {
                    Some(command) => self.dispatch(command),
                    None => break,
                },
                Some(resolved) = self.resolved_rx.recv() => self.on_resolved(resolved),
                Some(loaded) = self.ambient_rx.recv() => self.on_ambient_loaded(loaded),
                _ = wait_until(caption_tick) => self.on_caption_tick(),
                _ = wait_until(narration_end) => self.on_narration_end(),
                _ = wait_until(gap_end) => self.on_gap_elapsed(),
            }

            self.publish();
        }

        self.teardown();
        self.publish();
    }

    /// Apply one command. Illegal commands change nothing.
    pub fn dispatch(&mut self, command: Command) {
        let result = match command {
            Command::Listen => self.listen(),
            Command::Pause => self.pause(),
            Command::Stop => self.stop(),
            Command::Restart => self.restart(),
            Command::PlayAll => self.play_all(),
            Command::GoToScene(index) => self.go_to_scene(index),
            Command::NextScene => self.go_to_scene(self.scene + 1),
            Command::PreviousScene => self.previous_scene(),
            Command::ToggleAmbient => self.toggle_ambient(),
            Command::ToggleCaptions => self.toggle_captions(),
        };

        if let Err(e) = result {
            log::debug!("Ignored {}: {}", command.name(), e);
        }
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn scene(&self) -> usize {
        self.scene
    }

    pub fn snapshot(&self) -> PlaybackSnapshot {
        PlaybackSnapshot {
            state: self.state,
            scene: self.scene,
            caption: self.captions.as_ref().and_then(CaptionCursor::active),
            ambient_enabled: self.mixer.is_enabled(),
            captions_enabled: self.captions_enabled,
            auto_play: self.run.is_some(),
            live_handles: self.resolver.ledger().live(),
        }
    }

    // Commands

    fn listen(&mut self) -> Result<(), PlayerError> {
        match self.state {
            PlaybackState::Paused => {
                self.resume();
                Ok(())
            }
            PlaybackState::Idle | PlaybackState::Stopped => {
                self.begin_load();
                Ok(())
            }
            _ => self.reject("listen"),
        }
    }

    fn pause(&mut self) -> Result<(), PlayerError> {
        if self.state != PlaybackState::Playing {
            return self.reject("pause");
        }

        let now = Instant::now();
        if let Some(run) = self.run.as_mut() {
            if let Some(Gap::Waiting(until)) = run.gap {
                run.gap = Some(Gap::Frozen(until.saturating_duration_since(now)));
            }
        }
        if let Some(narration) = self.narration.as_mut() {
            if narration.clock.is_running() {
                narration.clock.pause(now);
                self.sink.pause(Channel::Narration);
            }
        }
        if let Some(cursor) = self.captions.as_mut() {
            cursor.pause(now);
        }

        self.set_state(PlaybackState::Paused);
        Ok(())
    }

    fn resume(&mut self) {
        let now = Instant::now();
        if let Some(run) = self.run.as_mut() {
            if let Some(Gap::Frozen(left)) = run.gap {
                run.gap = Some(Gap::Waiting(now + left));
            }
        }
        if let Some(narration) = self.narration.as_mut() {
            if narration.clock.has_started() && !narration.clock.is_running() {
                narration.clock.run(now);
                self.sink.resume(Channel::Narration);
            }
        }
        if let Some(cursor) = self.captions.as_mut() {
            cursor.resume(now);
        }

        self.set_state(PlaybackState::Playing);
    }

    fn stop(&mut self) -> Result<(), PlayerError> {
        if !self.state.is_busy() {
            return self.reject("stop");
        }
        self.halt();
        self.set_state(PlaybackState::Stopped);
        Ok(())
    }

    fn restart(&mut self) -> Result<(), PlayerError> {
        self.halt();
        self.set_state(PlaybackState::Stopped);
        self.set_scene(0);
        self.play_all()
    }

    fn play_all(&mut self) -> Result<(), PlayerError> {
        if !matches!(self.state, PlaybackState::Idle | PlaybackState::Stopped) {
            return self.reject("play all");
        }

        log::info!(
            "Auto-play from scene {} of {}",
            self.scene + 1,
            self.story.scene_count()
        );
        self.run = Some(AutoPlayRun {
            token: CancellationToken::new(),
            gap: None,
        });
        self.emit(PlayerEvent::RunStarted { from: self.scene });

        if self.settings.auto_ambient && !self.mixer.is_enabled() {
            self.mixer.enable(&self.story, &self.ambient_tx);
            self.emit(PlayerEvent::AmbientToggled(true));
        }

        self.begin_load();
        Ok(())
    }

    fn go_to_scene(&mut self, index: usize) -> Result<(), PlayerError> {
        if self.run.is_some() {
            return self.reject("go to scene");
        }
        let count = self.story.scene_count();
        if index >= count {
            return Err(PlayerError::SceneOutOfRange { index, count });
        }

        self.halt();
        self.set_scene(index);
        self.release_narration();
        self.set_state(PlaybackState::Idle);
        Ok(())
    }

    fn previous_scene(&mut self) -> Result<(), PlayerError> {
        match self.scene.checked_sub(1) {
            Some(index) => self.go_to_scene(index),
            None => {
                log::debug!("Already at the first scene");
                Ok(())
            }
        }
    }

    fn toggle_ambient(&mut self) -> Result<(), PlayerError> {
        let enabled = self
            .mixer
            .toggle(&self.story, self.sink.as_mut(), &self.ambient_tx);
        log::info!("Ambient sound {}", if enabled { "on" } else { "off" });
        self.emit(PlayerEvent::AmbientToggled(enabled));
        Ok(())
    }

    fn toggle_captions(&mut self) -> Result<(), PlayerError> {
        self.captions_enabled = !self.captions_enabled;
        if self.captions_enabled {
            self.start_captions_midway();
        } else {
            self.clear_captions();
        }
        self.emit(PlayerEvent::CaptionsToggled(self.captions_enabled));
        Ok(())
    }

    fn reject(&self, command: &'static str) -> Result<(), PlayerError> {
        Err(PlayerError::InvalidState {
            command,
            state: self.state,
        })
    }

    // Narration

    /// Enter `Loading` for the current scene. A narration already loaded for
    /// this scene is reused instead of resolved again.
    fn begin_load(&mut self) {
        self.cancel_pending();
        self.set_state(PlaybackState::Loading);

        let scene = self.scene;
        if self.narration.as_ref().is_some_and(|n| n.scene == scene) {
            self.start_narration();
            return;
        }
        self.release_narration();

        self.next_ticket += 1;
        let ticket = self.next_ticket;
        let token = match &self.run {
            Some(run) => run.token.child_token(),
            None => CancellationToken::new(),
        };

        let resolver = Arc::clone(&self.resolver);
        let story = Arc::clone(&self.story);
        let tx = self.resolved_tx.clone();
        let cancelled = token.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = cancelled.cancelled() => {
                    log::debug!("Narration fetch for scene {} cancelled", scene + 1);
                }
                result = resolver.resolve(&story, scene) => {
                    let _ = tx.send(Resolved { ticket, scene, result });
                }
            }
        });

        self.pending = Some(PendingLoad { ticket, token });
    }

    fn on_resolved(&mut self, resolved: Resolved) {
        let current = self
            .pending
            .as_ref()
            .is_some_and(|pending| pending.ticket == resolved.ticket);
        if !current || self.state != PlaybackState::Loading {
            log::debug!("Dropping stale narration for scene {}", resolved.scene + 1);
            return;
        }
        self.pending = None;

        match resolved.result {
            Ok(handle) => {
                let units = self
                    .story
                    .scene(resolved.scene)
                    .map(|scene| segment(&scene.text))
                    .unwrap_or_default();
                self.narration = Some(Narration {
                    scene: resolved.scene,
                    handle,
                    clock: PlayClock::new(),
                    units,
                });
                self.start_narration();
            }
            Err(e) => {
                log::warn!("No audio for scene {}: {}", resolved.scene + 1, e);
                self.emit(PlayerEvent::AudioUnavailable {
                    scene: resolved.scene,
                    reason: e.to_string(),
                });
                if self.run.is_some() {
                    self.advance_run();
                } else {
                    self.set_state(PlaybackState::Idle);
                }
            }
        }
    }

    fn start_narration(&mut self) {
        let now = Instant::now();
        let volume = self.settings.levels.narration();
        let Some(narration) = self.narration.as_mut() else {
            return;
        };

        self.sink
            .start(Channel::Narration, narration.handle.clip(), volume, false);
        narration.clock.run(now);
        let scene = narration.scene;
        let duration = narration.duration();

        self.set_state(PlaybackState::Playing);
        self.emit(PlayerEvent::NarrationStarted { scene, duration });
        if self.captions_enabled {
            self.start_captions(Duration::ZERO, now);
        }
    }

    fn on_narration_end(&mut self) {
        let Some(narration) = self.narration.as_mut() else {
            return;
        };
        narration.clock.reset();
        let scene = narration.scene;

        self.sink.stop(Channel::Narration);
        self.clear_captions();
        self.emit(PlayerEvent::NarrationFinished { scene });

        if self.run.is_none() {
            self.set_state(PlaybackState::Idle);
            return;
        }

        if scene + 1 < self.story.scene_count() {
            let until = Instant::now() + self.settings.scene_pause;
            if let Some(run) = self.run.as_mut() {
                run.gap = Some(Gap::Waiting(until));
            }
        } else {
            self.finish_run();
        }
    }

    /// Stop narration and captions and rewind. Keeps the scene and ambient.
    fn halt(&mut self) {
        self.cancel_run();
        self.cancel_pending();
        self.clear_captions();
        if let Some(narration) = self.narration.as_mut() {
            if narration.clock.has_started() {
                self.sink.stop(Channel::Narration);
            }
            narration.clock.reset();
        }
    }

    fn cancel_pending(&mut self) {
        if let Some(pending) = self.pending.take() {
            pending.token.cancel();
        }
    }

    fn release_narration(&mut self) {
        if let Some(narration) = self.narration.take() {
            if narration.clock.has_started() {
                self.sink.stop(Channel::Narration);
            }
        }
    }

    // Captions

    fn start_captions(&mut self, offset: Duration, now: Instant) {
        let Some(narration) = &self.narration else {
            return;
        };
        self.captions =
            CaptionCursor::start(narration.units.len(), narration.duration(), offset, now);
        if let Some(cursor) = &self.captions {
            self.emit_caption(cursor.active());
        }
    }

    /// Captions switched on while narration is under way.
    fn start_captions_midway(&mut self) {
        let now = Instant::now();
        let Some(narration) = &self.narration else {
            return;
        };
        if !narration.clock.has_started() {
            return;
        }
        let offset = narration.clock.elapsed(now);
        let paused = !narration.clock.is_running();

        self.start_captions(offset, now);
        if paused {
            if let Some(cursor) = self.captions.as_mut() {
                cursor.pause(now);
            }
        }
    }

    fn on_caption_tick(&mut self) {
        let Some(cursor) = self.captions.as_mut() else {
            return;
        };
        if !cursor.advance(Instant::now()) {
            return;
        }
        let unit = cursor.active();
        self.emit_caption(unit);
        if unit.is_none() {
            self.captions = None;
        }
    }

    fn clear_captions(&mut self) {
        if let Some(cursor) = self.captions.take() {
            if !cursor.is_done() {
                self.emit_caption(None);
            }
        }
    }

    fn emit_caption(&self, unit: Option<usize>) {
        let Some(narration) = &self.narration else {
            return;
        };
        let text = unit.and_then(|i| narration.units.get(i).cloned());
        self.emit(PlayerEvent::CaptionChanged {
            scene: narration.scene,
            unit,
            text,
        });
    }

    // Auto-play

    fn advance_run(&mut self) {
        let next = self.scene + 1;
        if next >= self.story.scene_count() {
            self.finish_run();
            return;
        }
        self.set_scene(next);
        self.begin_load();
    }

    fn on_gap_elapsed(&mut self) {
        if let Some(run) = self.run.as_mut() {
            run.gap = None;
        }
        self.advance_run();
    }

    fn gap_deadline(&self) -> Option<Instant> {
        match self.run.as_ref()?.gap {
            Some(Gap::Waiting(until)) => Some(until),
            _ => None,
        }
    }

    fn finish_run(&mut self) {
        if self.run.take().is_some() {
            log::info!("Auto-play finished");
            self.set_state(PlaybackState::Idle);
            self.emit(PlayerEvent::RunFinished);
        }
    }

    fn cancel_run(&mut self) {
        if let Some(run) = self.run.take() {
            run.token.cancel();
            log::info!("Auto-play cancelled at scene {}", self.scene + 1);
            self.emit(PlayerEvent::RunCancelled { scene: self.scene });
        }
    }

    // Ambient

    fn on_ambient_loaded(&mut self, loaded: AmbientLoaded) {
        if let Some(category) = self.mixer.on_loaded(loaded, self.sink.as_mut()) {
            self.emit(PlayerEvent::AmbientStarted(category));
        }
    }

    // Bookkeeping

    fn set_state(&mut self, state: PlaybackState) {
        if self.state != state {
            log::debug!("{} -> {}", self.state, state);
            self.state = state;
            self.emit(PlayerEvent::StateChanged(state));
        }
    }

    fn set_scene(&mut self, index: usize) {
        if self.narration.as_ref().is_some_and(|n| n.scene != index) {
            self.release_narration();
        }
        if self.scene != index {
            self.scene = index;
            log::info!("Scene {} of {}", index + 1, self.story.scene_count());
            self.emit(PlayerEvent::SceneChanged(index));
        }
    }

    fn emit(&self, event: PlayerEvent) {
        // Nobody listening is fine
        let _ = self.events.send(event);
    }

    fn publish(&self) {
        self.snapshot_tx.send_replace(self.snapshot());
    }

    /// Release everything the session holds.
    fn teardown(&mut self) {
        self.halt();
        self.mixer.disable(self.sink.as_mut());
        self.release_narration();
        self.set_state(PlaybackState::Idle);
        log::debug!(
            "Session for story {} closed, {} audio handles live",
            self.story.id,
            self.resolver.ledger().live()
        );
    }
}

async fn wait_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::testing::wav_secs;
    use crate::audio::{AudioClip, RecordingSink};
    use crate::tts::VoiceOptions;
    use story_client::MockBackend;

    type Parts = (
        PlaybackSequencer,
        RecordingSink,
        mpsc::UnboundedReceiver<PlayerEvent>,
    );

    fn sequencer(backend: MockBackend, story: Story) -> Parts {
        let sink = RecordingSink::default();
        let resolver = Arc::new(AudioSourceResolver::new(
            Arc::new(backend),
            VoiceOptions::new(),
        ));
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (snapshot_tx, _) = watch::channel(PlaybackSnapshot::default());
        let sequencer = PlaybackSequencer::new(
            Arc::new(story),
            resolver,
            Box::new(sink.clone()),
            SequencerSettings::default(),
            events_tx,
            snapshot_tx,
        );
        (sequencer, sink, events_rx)
    }

    fn story() -> Story {
        Story::from_texts("s1", "Test", &["One.", "Two.", "Three."])
    }

    #[test]
    fn test_illegal_commands_are_rejected() {
        let (mut seq, sink, _events) = sequencer(MockBackend::new(story()), story());

        assert!(matches!(
            seq.pause(),
            Err(PlayerError::InvalidState { command: "pause", state: PlaybackState::Idle })
        ));
        assert!(seq.stop().is_err());
        assert!(matches!(
            seq.go_to_scene(3),
            Err(PlayerError::SceneOutOfRange { index: 3, count: 3 })
        ));
        assert_eq!(seq.state(), PlaybackState::Idle);
        assert!(sink.calls().is_empty());
    }

    #[test]
    fn test_dispatch_swallows_errors() {
        let (mut seq, _sink, mut events) = sequencer(MockBackend::new(story()), story());
        seq.dispatch(Command::Pause);
        seq.dispatch(Command::PreviousScene);
        seq.dispatch(Command::GoToScene(9));
        assert_eq!(seq.snapshot(), PlaybackSnapshot {
            captions_enabled: true,
            ..PlaybackSnapshot::default()
        });
        assert!(events.try_recv().is_err());
    }

    #[test]
    fn test_navigation_changes_scene_without_playing() {
        let (mut seq, _sink, mut events) = sequencer(MockBackend::new(story()), story());
        seq.dispatch(Command::NextScene);
        seq.dispatch(Command::NextScene);
        seq.dispatch(Command::NextScene);
        assert_eq!(seq.scene(), 2);
        assert_eq!(seq.state(), PlaybackState::Idle);

        seq.dispatch(Command::PreviousScene);
        assert_eq!(seq.scene(), 1);
        assert_eq!(events.try_recv().unwrap(), PlayerEvent::SceneChanged(1));
    }

    #[tokio::test]
    async fn test_listen_enters_loading() {
        let (mut seq, _sink, _events) = sequencer(MockBackend::new(story()), story());
        seq.dispatch(Command::Listen);
        assert_eq!(seq.state(), PlaybackState::Loading);
        assert!(seq.listen().is_err());

        seq.dispatch(Command::Stop);
        assert_eq!(seq.state(), PlaybackState::Stopped);
        assert!(seq.pending.is_none());
    }

    #[tokio::test]
    async fn test_stale_results_are_dropped() {
        let (mut seq, sink, _events) = sequencer(MockBackend::new(story()), story());

        seq.dispatch(Command::Listen);
        let ticket = seq.pending.as_ref().map(|p| p.ticket).unwrap();
        seq.dispatch(Command::Stop);

        let handle = seq
            .resolver
            .ledger()
            .acquire(AudioClip::decode(wav_secs(1)).unwrap());
        seq.on_resolved(Resolved {
            ticket,
            scene: 0,
            result: Ok(handle),
        });

        assert_eq!(seq.state(), PlaybackState::Stopped);
        assert!(seq.narration.is_none());
        assert_eq!(seq.resolver.ledger().live(), 0);
        assert!(sink.calls().is_empty());
    }

    #[tokio::test]
    async fn test_stop_cancels_the_runs_fetch() {
        let (mut seq, _sink, mut events) = sequencer(MockBackend::new(story()), story());

        seq.dispatch(Command::PlayAll);
        let run_token = seq.run.as_ref().map(|run| run.token.clone()).unwrap();
        let fetch_token = seq.pending.as_ref().map(|p| p.token.clone()).unwrap();
        assert!(!fetch_token.is_cancelled());

        seq.dispatch(Command::Stop);
        assert!(run_token.is_cancelled());
        assert!(fetch_token.is_cancelled());
        assert!(seq.run.is_none());
        assert_eq!(seq.state(), PlaybackState::Stopped);

        let mut seen = Vec::new();
        while let Ok(event) = events.try_recv() {
            seen.push(event);
        }
        assert!(seen.contains(&PlayerEvent::RunCancelled { scene: 0 }));
    }
}
