use std::sync::Arc;

use elina::render::{describe, ChannelObserver};
use elina::{Command, Config, USAGE};
use iot_backend::Client;
use relay_state::{Error, Session};
use transport::DeviceId;

use log::{error, info, warn};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tokio::task;

type ErasedError = Box<dyn std::error::Error + Send + Sync + 'static>;

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<(), ErasedError> {
    pretty_env_logger::init_timed();

    info!("elina version {VERSION}");

    let config = Config::from_env()?;

    let client = Client::new(&config.api_base_url, config.auth_token.clone())?;
    info!("using backend at {}", config.api_base_url);

    let (tx, rx) = mpsc::unbounded_channel();
    let session = Arc::new(Session::new(
        Arc::new(client),
        Arc::new(ChannelObserver::new(tx)),
        config.session_config(),
    ));

    if let Err(err) = session.refresh_rate().await {
        warn!("unable to fetch electricity rate: {err}");
    }
    session.start_rate_refresh()?;

    match session.load_devices().await {
        Ok(devices) => {
            for device in devices {
                info!("found {} ({})", device.device_id, device.name);
            }
        }
        Err(err) => error!("unable to load devices: {err}"),
    }

    if let Some(device_id) = &config.focus_device {
        if let Err(err) = session.focus(device_id).await {
            error!("unable to focus {device_id}: {err}");
        }
    }

    let render_handle = task::spawn(render_updates(session.clone(), rx));
    let input_handle = task::spawn(read_commands(session.clone()));
    let mut sigterm = signal(SignalKind::terminate())?;

    tokio::select! {
        _ = render_handle => {},
        _ = input_handle => { info!("input closed, exiting...") },
        _ = sigterm.recv() => { info!("got SIGTERM, exiting...") },
        _ = tokio::signal::ctrl_c() => { info!("interrupted, exiting...") },
    };

    session.shutdown();

    Ok(())
}

async fn render_updates(session: Arc<Session>, mut rx: UnboundedReceiver<DeviceId>) {
    while let Some(device_id) = rx.recv().await {
        let device = session.store().device(&device_id);
        let detailed = session.focused().as_ref() == Some(&device_id);

        info!(
            "{}",
            describe(&device_id, device.as_ref(), &session.rate(), detailed)
        );
    }
}

async fn read_commands(session: Arc<Session>) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(err) => {
                error!("unable to read input: {err}");
                break;
            }
        };

        if line.trim().is_empty() {
            continue;
        }

        let command = match line.parse::<Command>() {
            Ok(command) => command,
            Err(err) => {
                warn!("{err}");
                continue;
            }
        };

        if command == Command::Quit {
            break;
        }

        if let Err(err) = execute(&session, command).await {
            error!("{err}");
        }
    }
}

async fn execute(session: &Session, command: Command) -> Result<(), Error> {
    match command {
        Command::Devices => {
            for device in session.load_devices().await? {
                info!("{} ({})", device.device_id, device.name);
            }
        }
        Command::Switch {
            device_id,
            slot,
            on,
        } => {
            session.set_relay(&device_id, slot, on).await?;
        }
        Command::SwitchAll { device_id, on } => {
            match session.set_all_relays(&device_id, on).await {
                Err(err @ Error::PartialFailure { .. }) => {
                    warn!("{err}, fetching actual state");
                    session.refresh_device(&device_id).await?;
                }
                result => result?,
            }
        }
        Command::Focus(device_id) => session.focus(&device_id).await?,
        Command::Unfocus => {
            if let Some(device_id) = session.clear_focus() {
                info!("stopped polling telemetry of {device_id}");
            }
        }
        Command::Refresh(device_id) => session.refresh_device(&device_id).await?,
        Command::Power { device_id, ratings } => {
            session.configure_power(&device_id, &ratings).await?;
            info!("power ratings of {device_id} updated");
        }
        Command::Add(device) => {
            session.add_device(&device).await?;
            info!("added {} ({})", device.device_id, device.name);
        }
        Command::Delete(device_id) => session.delete_device(&device_id).await?,
        Command::Rate => {
            session.refresh_rate().await?;
            let rate = session.rate();
            info!("electricity rate is {} {}/kWh", rate.rate_per_unit, rate.currency);
        }
        Command::Help => info!("\n{USAGE}"),
        Command::Quit => {}
    }

    Ok(())
}
