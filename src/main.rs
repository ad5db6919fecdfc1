use color_eyre::{eyre::eyre, Result};
use openpad::config::PadSettings;
use openpad::controller::{CollectorHandle, CollectorSettings};
use openpad::mapping::KeyOutcome;
use openpad::persistence::TomlStore;
use openpad::session::{ChannelSink, Initializing, InputSession, SinkUpdate};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn, Level};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    setup()?;

    let settings_path = PadSettings::default_path();
    PadSettings::ensure_default(&settings_path).await?;
    let settings = PadSettings::load(&settings_path).await?;
    debug!("Settings: {:?}", settings);

    let store = TomlStore::open(settings.preferences_path())
        .map_err(|e| eyre!("Failed to open preferences: {}", e))?;
    let autosave = TomlStore::start_autosave_task(store.clone(), settings.autosave_interval_secs);

    // Stand-in for the emulator core: log what would be written to it
    let (sink, mut sink_receiver) = ChannelSink::channel(settings.sink_capacity);
    let sink_task = tokio::spawn(async move {
        while let Some(update) = sink_receiver.recv().await {
            match update {
                SinkUpdate::Local(frame) => debug!(
                    "Port 0 at {}: {:?}",
                    frame.timestamp.format("%H:%M:%S.%3f"),
                    frame.state
                ),
                SinkUpdate::Remote { player, buttons } => {
                    debug!("Port {}: buttons {:#06x}", player, buttons)
                }
            }
        }
    });

    let mut session = InputSession::<Initializing>::create(
        Box::new(store.clone()),
        Box::new(sink),
        settings.viewport(),
    )
    .with_game(settings.game_id.clone())
    .start();

    let (event_sender, mut event_receiver) = mpsc::channel(1000);
    let cancel = CancellationToken::new();
    let collector = CollectorHandle::spawn(
        Some(CollectorSettings {
            joystick_deadzone: settings.joystick_deadzone,
            ..CollectorSettings::default()
        }),
        event_sender,
        cancel.clone(),
    );

    loop {
        tokio::select! {
            event = event_receiver.recv() => match event {
                Some(event) => {
                    if let Some(KeyOutcome::MenuRequested { slot }) = session.on_device_event(&event) {
                        info!("Menu requested by player {}", slot + 1);
                    }
                }
                None => {
                    warn!("Controller input stopped");
                    break;
                }
            },
            _ = tokio::signal::ctrl_c() => {
                info!("Shutting down");
                break;
            }
        }
    }

    if let Err(e) = collector.shutdown().await {
        error!("Collector ended with error: {}", e);
    }
    autosave.abort();
    drop(session);
    sink_task.abort();
    store
        .flush()
        .map_err(|e| eyre!("Failed to save preferences: {}", e))?;

    Ok(())
}

fn setup() -> Result<()> {
    if std::env::var("RUST_LIB_BACKTRACE").is_err() {
        std::env::set_var("RUST_LIB_BACKTRACE", "0")
    }
    color_eyre::install()?;
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "info")
    }
    setup_logging_env();
    Ok(())
}

fn setup_logging_env() {
    FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .pretty()
        .init();
}
