//! story-player - Play narrated stories with live captions and ambient sound

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};

use story_client::{StoryBackend, create_backend};
#[cfg(feature = "speaker")]
use story_player::audio::RodioSink;
use story_player::audio::{AudioSink, LogSink};
use story_player::captions::segment;
use story_player::{PlaybackState, PlayerConfig, PlayerEvent, SessionController};

#[derive(Parser, Debug)]
#[command(name = "story-player")]
#[command(about = "Play narrated stories with live captions and ambient sound", long_about = None)]
#[command(version)]
struct Args {
    /// Story service base URL (overrides config)
    #[arg(long, global = true)]
    api: Option<String>,

    /// Narrator voice for synthesis (overrides config)
    #[arg(long, global = true)]
    voice: Option<String>,

    /// Narration language for synthesis (overrides config)
    #[arg(long, global = true)]
    language: Option<String>,

    /// Log channel commands instead of playing sound
    #[arg(long, global = true, default_value_t = false)]
    mute: bool,

    /// Enable debug output
    #[arg(short, long, global = true, default_value_t = false)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Play a story with live captions (Ctrl-C stops)
    Play {
        /// Story identifier
        story_id: String,

        /// Scene to start from (1-based)
        #[arg(long, default_value_t = 1)]
        scene: usize,

        /// Play only the starting scene
        #[arg(long)]
        single: bool,

        /// Do not switch ambient sound on
        #[arg(long)]
        no_ambient: bool,

        /// Do not show captions
        #[arg(long)]
        no_captions: bool,
    },
    /// Control playback with typed commands
    Interactive {
        /// Story identifier
        story_id: String,
    },
    /// Print a story's scenes, cached artifacts and caption units
    Show {
        /// Story identifier
        story_id: String,
    },
    /// Save a scene's illustration
    Image {
        /// Story identifier
        story_id: String,

        /// Scene number (1-based)
        scene: usize,

        /// Output file (default: scene-<n>.<ext>)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Show current configuration
    Show,
    /// Set the story service base URL
    SetApi {
        /// URL, e.g. http://localhost:8000
        url: String,
    },
    /// Set the default narrator voice
    SetVoice {
        /// Voice identifier
        voice_id: String,
    },
    /// Set the default narration language
    SetLanguage {
        /// Language tag, e.g. "en"
        language: String,
    },
    /// Set the pause between scenes when playing all
    SetPause {
        /// Milliseconds
        millis: u64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.debug);

    if let Commands::Config { action } = &args.command {
        return handle_config_command(action);
    }

    let mut config = PlayerConfig::load().context("Failed to load configuration")?;
    if let Some(api) = &args.api {
        config.server.base_url = api.clone();
    }
    if let Some(voice) = &args.voice {
        config.server.voice_id = voice.clone();
    }
    if let Some(language) = &args.language {
        config.server.language = language.clone();
    }

    let backend: Arc<dyn StoryBackend> =
        Arc::from(create_backend(&config.server).context("Invalid story service settings")?);
    log::debug!("Using {} at {}", backend.name(), config.server.base_url);

    match args.command {
        Commands::Play {
            story_id,
            scene,
            single,
            no_ambient,
            no_captions,
        } => {
            let mut options = config.session_options();
            options.captions = !no_captions;
            options.auto_ambient = !no_ambient;
            let (controller, events) =
                SessionController::load(backend, &story_id, options, open_sink(args.mute))
                    .await
                    .with_context(|| format!("Failed to load story {}", story_id))?;
            play(controller, events, scene, single).await
        }
        Commands::Interactive { story_id } => {
            let (controller, events) = SessionController::load(
                backend,
                &story_id,
                config.session_options(),
                open_sink(args.mute),
            )
            .await
            .with_context(|| format!("Failed to load story {}", story_id))?;
            interactive(controller, events).await
        }
        Commands::Show { story_id } => show(backend.as_ref(), &story_id).await,
        Commands::Image {
            story_id,
            scene,
            output,
        } => save_image(backend, &config, &story_id, scene, output).await,
        Commands::Config { .. } => Ok(()),
    }
}

/// Speaker output when built with it and a device opens, log-only otherwise.
fn open_sink(mute: bool) -> Box<dyn AudioSink> {
    if mute {
        return Box::new(LogSink);
    }

    #[cfg(feature = "speaker")]
    match RodioSink::open() {
        Ok(sink) => return Box::new(sink),
        Err(e) => log::warn!("{}; playing without sound", e),
    }
    #[cfg(not(feature = "speaker"))]
    log::warn!("Built without the speaker feature; playing without sound");

    Box::new(LogSink)
}

fn init_logging(debug: bool) {
    let default_filter = if debug { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp(None)
        .init();
}

async fn play(
    controller: SessionController,
    mut events: tokio::sync::mpsc::UnboundedReceiver<PlayerEvent>,
    scene: usize,
    single: bool,
) -> Result<()> {
    let story = controller.story();
    let count = story.scene_count();
    eprintln!("Story: \"{}\" ({} scenes)", story.title, count);
    if scene == 0 || scene > count {
        anyhow::bail!("Scene {} is out of range (1-{})", scene, count);
    }

    controller.go_to_scene(scene - 1);
    if single {
        controller.listen();
    } else {
        controller.play_all();
    }

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    let mut stopping = false;

    loop {
        tokio::select! {
            _ = &mut ctrl_c, if !stopping => {
                eprintln!("\nStopping...");
                controller.stop();
                stopping = true;
            }
            event = events.recv() => {
                let Some(event) = event else { break };
                print_event(&controller, &event);
                if playback_over(&event, single) {
                    break;
                }
            }
        }
    }

    controller.shutdown().await;
    Ok(())
}

/// Whether `event` ends a `play` invocation.
fn playback_over(event: &PlayerEvent, single: bool) -> bool {
    match event {
        PlayerEvent::RunFinished | PlayerEvent::RunCancelled { .. } => true,
        PlayerEvent::StateChanged(PlaybackState::Stopped) => true,
        PlayerEvent::NarrationFinished { .. } | PlayerEvent::AudioUnavailable { .. } => single,
        _ => false,
    }
}

fn print_event(controller: &SessionController, event: &PlayerEvent) {
    let story = controller.story();
    match event {
        PlayerEvent::NarrationStarted { scene, duration } => {
            println!(
                "\n[Scene {}/{}] ({:.1}s)",
                scene + 1,
                story.scene_count(),
                duration.as_secs_f32()
            );
            if !controller.status().captions_enabled {
                print_scene_text(controller, *scene);
            }
        }
        PlayerEvent::CaptionChanged {
            text: Some(text), ..
        } => println!("  {}", text),
        PlayerEvent::AudioUnavailable { scene, reason } => {
            eprintln!("Scene {}: no audio ({})", scene + 1, reason);
            println!("\n[Scene {}/{}]", scene + 1, story.scene_count());
            print_scene_text(controller, *scene);
        }
        PlayerEvent::AmbientStarted(category) => eprintln!("Ambient {} on", category.label()),
        PlayerEvent::AmbientToggled(false) => eprintln!("Ambient off"),
        PlayerEvent::CaptionsToggled(enabled) => {
            eprintln!("Captions {}", if *enabled { "on" } else { "off" })
        }
        PlayerEvent::StateChanged(PlaybackState::Paused) => eprintln!("Paused"),
        PlayerEvent::SceneChanged(scene) => {
            log::debug!("Scene {} selected", scene + 1)
        }
        PlayerEvent::RunFinished => eprintln!("\nThe end."),
        PlayerEvent::RunCancelled { scene } => eprintln!("Stopped at scene {}", scene + 1),
        _ => {}
    }
}

/// Untimed text for scenes without captions or audio.
fn print_scene_text(controller: &SessionController, scene: usize) {
    for unit in controller.caption_units(scene) {
        println!("  {}", unit);
    }
}

/// A line typed in interactive mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Input {
    Listen,
    Pause,
    Stop,
    Restart,
    PlayAll,
    Next,
    Previous,
    GoTo(usize),
    Ambient,
    Captions,
    Status,
    Help,
    Quit,
}

fn parse_input(line: &str) -> Option<Input> {
    let mut words = line.split_whitespace();
    let command = words.next()?.to_lowercase();
    let input = match command.as_str() {
        "listen" | "l" | "play" => Input::Listen,
        "pause" | "p" => Input::Pause,
        "stop" | "s" => Input::Stop,
        "restart" | "r" => Input::Restart,
        "all" | "a" => Input::PlayAll,
        "next" | "n" => Input::Next,
        "prev" | "previous" | "b" => Input::Previous,
        "goto" | "g" => {
            // Scenes are numbered from 1 for the user
            let scene: usize = words.next()?.parse().ok()?;
            Input::GoTo(scene.checked_sub(1)?)
        }
        "ambient" | "m" => Input::Ambient,
        "captions" | "c" => Input::Captions,
        "status" => Input::Status,
        "help" | "h" | "?" => Input::Help,
        "quit" | "q" | "exit" => Input::Quit,
        _ => return None,
    };
    Some(input)
}

fn print_help() {
    eprintln!("Commands:");
    eprintln!("  listen (l)     play or resume the current scene");
    eprintln!("  pause (p)      pause narration");
    eprintln!("  stop (s)       stop narration and auto-play");
    eprintln!("  all (a)        play from the current scene to the end");
    eprintln!("  restart (r)    play from the first scene");
    eprintln!("  next (n)       select the next scene");
    eprintln!("  prev (b)       select the previous scene");
    eprintln!("  goto N (g N)   select scene N");
    eprintln!("  ambient (m)    toggle ambient sound");
    eprintln!("  captions (c)   toggle captions");
    eprintln!("  status         show playback status");
    eprintln!("  quit (q)       leave");
}

async fn interactive(
    controller: SessionController,
    mut events: tokio::sync::mpsc::UnboundedReceiver<PlayerEvent>,
) -> Result<()> {
    let story = controller.story();
    eprintln!("Story: \"{}\" ({} scenes)", story.title, story.scene_count());
    print_help();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("Failed to read input")? else { break };
                if line.trim().is_empty() {
                    continue;
                }
                match parse_input(&line) {
                    Some(Input::Listen) => controller.listen(),
                    Some(Input::Pause) => controller.pause(),
                    Some(Input::Stop) => controller.stop(),
                    Some(Input::Restart) => controller.restart(),
                    Some(Input::PlayAll) => controller.play_all(),
                    Some(Input::Next) => controller.next_scene(),
                    Some(Input::Previous) => controller.previous_scene(),
                    Some(Input::GoTo(scene)) => controller.go_to_scene(scene),
                    Some(Input::Ambient) => controller.toggle_ambient(),
                    Some(Input::Captions) => controller.toggle_captions(),
                    Some(Input::Status) => {
                        let status = controller.status();
                        eprintln!(
                            "{} | scene {}/{} | ambient {} | captions {}{}",
                            status.state,
                            status.scene + 1,
                            controller.story().scene_count(),
                            if status.ambient_enabled { "on" } else { "off" },
                            if status.captions_enabled { "on" } else { "off" },
                            if status.auto_play { " | auto-play" } else { "" }
                        );
                    }
                    Some(Input::Help) => print_help(),
                    Some(Input::Quit) => break,
                    None => eprintln!("Unknown command: {} (try 'help')", line.trim()),
                }
            }
            Some(event) = events.recv() => print_event(&controller, &event),
        }
    }

    controller.shutdown().await;
    Ok(())
}

async fn show(backend: &dyn StoryBackend, story_id: &str) -> Result<()> {
    let story = backend
        .fetch_story(story_id)
        .await
        .with_context(|| format!("Failed to load story {}", story_id))?;

    println!("{} (id {})", story.title, story.id);
    if let Some(language) = &story.language {
        println!("Language: {}", language);
    }
    if let Some(mood) = &story.mood {
        println!("Mood: {}", mood);
    }
    if let Some(voice) = &story.voice_id {
        println!("Voice: {}", voice);
    }

    for scene in &story.scenes {
        let mut cached = Vec::new();
        if scene.has_cached_narration {
            cached.push("narration");
        }
        if scene.has_cached_ambient {
            cached.push("sfx");
        }
        if scene.has_cached_music {
            cached.push("music");
        }
        if scene.has_cached_image {
            cached.push("image");
        }

        println!();
        match &scene.mood {
            Some(mood) => println!("Scene {} ({})", scene.index + 1, mood),
            None => println!("Scene {}", scene.index + 1),
        }
        if !cached.is_empty() {
            println!("  cached: {}", cached.join(", "));
        }
        for unit in segment(&scene.text) {
            println!("  - {}", unit);
        }
    }
    Ok(())
}

async fn save_image(
    backend: Arc<dyn StoryBackend>,
    config: &PlayerConfig,
    story_id: &str,
    scene: usize,
    output: Option<PathBuf>,
) -> Result<()> {
    let (controller, _events) = SessionController::load(
        backend,
        story_id,
        config.session_options(),
        Box::new(LogSink),
    )
    .await
    .with_context(|| format!("Failed to load story {}", story_id))?;

    let illustration = match scene.checked_sub(1) {
        Some(index) => controller.illustration(index).await,
        None => None,
    };
    controller.shutdown().await;

    let Some(illustration) = illustration else {
        anyhow::bail!("Scene {} has no illustration", scene);
    };
    let path = output.unwrap_or_else(|| PathBuf::from(illustration.file_name()));
    tokio::fs::write(&path, &illustration.bytes)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))?;
    eprintln!("Saved {}", path.display());
    Ok(())
}

fn handle_config_command(action: &ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Show => {
            let config = PlayerConfig::load()?;
            println!("Configuration file: {:?}", PlayerConfig::config_path()?);
            println!();
            println!("base_url = \"{}\"", config.server.base_url);
            println!("timeout_secs = {}", config.server.timeout_secs);
            println!("voice_id = \"{}\"", config.server.voice_id);
            println!("language = \"{}\"", config.server.language);
            println!("scene_pause_ms = {}", config.scene_pause_ms);
            println!("narration_volume = {}", config.narration_volume);
            println!("sfx_volume = {}", config.sfx_volume);
            println!("music_volume = {}", config.music_volume);
            println!("captions = {}", config.captions);
        }
        ConfigAction::SetApi { url } => {
            let mut config = PlayerConfig::load()?;
            config.server.base_url = url.trim().to_string();
            config.server.validate()?;
            config.save()?;
            println!("Story service set to: {}", config.server.base_url);
        }
        ConfigAction::SetVoice { voice_id } => {
            let mut config = PlayerConfig::load()?;
            config.server.voice_id = voice_id.clone();
            config.save()?;
            println!("Default voice set to: {}", voice_id);
        }
        ConfigAction::SetLanguage { language } => {
            let mut config = PlayerConfig::load()?;
            config.server.language = language.clone();
            config.save()?;
            println!("Default language set to: {}", language);
        }
        ConfigAction::SetPause { millis } => {
            let mut config = PlayerConfig::load()?;
            config.scene_pause_ms = *millis;
            config.save()?;
            println!("Pause between scenes set to: {} ms", millis);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_input() {
        assert_eq!(parse_input("listen"), Some(Input::Listen));
        assert_eq!(parse_input("  P "), Some(Input::Pause));
        assert_eq!(parse_input("goto 3"), Some(Input::GoTo(2)));
        assert_eq!(parse_input("g 1"), Some(Input::GoTo(0)));
        assert_eq!(parse_input("q"), Some(Input::Quit));
    }

    #[test]
    fn test_parse_invalid_input() {
        assert_eq!(parse_input(""), None);
        assert_eq!(parse_input("dance"), None);
        assert_eq!(parse_input("goto"), None);
        assert_eq!(parse_input("goto zero"), None);
        assert_eq!(parse_input("goto 0"), None);
    }

    #[test]
    fn test_playback_over() {
        assert!(playback_over(&PlayerEvent::RunFinished, false));
        assert!(playback_over(&PlayerEvent::StateChanged(PlaybackState::Stopped), true));
        assert!(playback_over(&PlayerEvent::NarrationFinished { scene: 0 }, true));
        assert!(!playback_over(&PlayerEvent::NarrationFinished { scene: 0 }, false));
        assert!(!playback_over(&PlayerEvent::SceneChanged(1), false));
    }

    #[test]
    fn test_cli_parses() {
        let args =
            Args::try_parse_from(["story-player", "play", "42", "--scene", "2", "--single"])
                .unwrap();
        match args.command {
            Commands::Play { story_id, scene, single, .. } => {
                assert_eq!(story_id, "42");
                assert_eq!(scene, 2);
                assert!(single);
            }
            other => panic!("unexpected command: {:?}", other),
        }

        let args =
            Args::try_parse_from(["story-player", "--api", "http://x:1", "show", "7"]).unwrap();
        assert_eq!(args.api.as_deref(), Some("http://x:1"));
        assert!(!args.mute);

        let args = Args::try_parse_from(["story-player", "play", "42", "--mute"]).unwrap();
        assert!(args.mute);
    }
}
