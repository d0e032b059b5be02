mod client;
mod dispatch;
mod feed;
mod model;
mod ring;
mod store;
mod ui;

use anyhow::Context;
use crossterm::{
    event::{Event, EventStream, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use futures_util::StreamExt;
use ratatui::{backend::CrosstermBackend, Terminal};
use std::{io, time::Duration};
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;
use url::Url;

use crate::client::ApiClient;
use crate::dispatch::dispatch_frame;
use crate::feed::{feed_loop, FeedEvent};
use crate::ring::LOG_CAPACITY;
use crate::store::{StateStore, StoreUpdate};

const DEFAULT_API_URL: &str = "http://127.0.0.1:8000";
const DEFAULT_WS_URL: &str = "ws://127.0.0.1:8000/ws";
const DEFAULT_POLL_SECS: u64 = 5;
const FEED_QUEUE_CAPACITY: usize = 256;
const UPDATE_QUEUE_CAPACITY: usize = 64;
const SUBMIT_MODE: &str = "auto";

#[derive(Clone, Debug)]
struct Config {
    api_url: String,
    ws_url: Url,
    poll_interval: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    None,
    Submit,
}

pub struct App {
    pub store: StateStore,
    pub input: InputMode,
    pub input_buffer: String,
    pub status_note: Option<String>,
    dirty: bool,
}

impl App {
    fn new() -> Self {
        Self {
            store: StateStore::default(),
            input: InputMode::None,
            input_buffer: String::new(),
            status_note: None,
            dirty: true,
        }
    }

    fn set_note(&mut self, note: impl Into<String>) {
        self.status_note = Some(note.into());
        self.dirty = true;
    }

    fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    fn take_render(&mut self) -> bool {
        let store_dirty = self.store.take_dirty();
        let value = self.dirty || store_dirty;
        self.dirty = false;
        value
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = load_config()?;
    init_logging();

    let client = ApiClient::new(&config.api_url);
    let (update_tx, mut update_rx) = mpsc::channel(UPDATE_QUEUE_CAPACITY);
    let (feed_tx, mut feed_rx) = mpsc::channel(FEED_QUEUE_CAPACITY);
    let feed_task = tokio::spawn(feed_loop(config.ws_url.clone(), feed_tx));

    // Cold fetch: the first poll tick covers status/tasks; logs are seeded
    // once here and kept fresh by the push path afterwards.
    spawn_log_seed(&client, &update_tx);

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    let mut events = EventStream::new();
    let mut poll_ticker = tokio::time::interval(config.poll_interval);

    let mut app = App::new();

    loop {
        if app.take_render() {
            terminal.draw(|frame| ui::render_ui(frame, &app))?;
        }
        tokio::select! {
            _ = poll_ticker.tick() => {
                spawn_snapshot_refresh(&client, &update_tx);
            }
            Some(event) = feed_rx.recv() => {
                handle_feed_event(event, &mut app, &client, &update_tx);
            }
            Some(update) = update_rx.recv() => {
                app.store.apply(update);
            }
            maybe_event = events.next() => {
                match maybe_event {
                    Some(Ok(Event::Key(key))) => {
                        if handle_key(key, &mut app, &client, &update_tx) {
                            break;
                        }
                    }
                    Some(Ok(_)) | Some(Err(_)) => {}
                    None => break,
                }
            }
        }
    }

    // Teardown: drop the push connection and pending timers with the view.
    // Late fetch responses land on a closed channel and are discarded.
    feed_task.abort();
    drop(update_rx);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

fn handle_feed_event(
    event: FeedEvent,
    app: &mut App,
    client: &ApiClient,
    update_tx: &mpsc::Sender<StoreUpdate>,
) {
    match event {
        FeedEvent::Connected => {
            app.store.set_connected(true);
            app.set_note("push feed connected");
        }
        FeedEvent::Disconnected => {
            app.store.set_connected(false);
            app.set_note("push feed lost; holding last snapshot");
        }
        FeedEvent::Frame(frame) => {
            let plan = dispatch_frame(frame, &mut app.store);
            if plan.status {
                spawn_status_refresh(client, update_tx);
            }
            if plan.tasks {
                spawn_tasks_refresh(client, update_tx);
            }
        }
    }
}

fn handle_key(
    key: KeyEvent,
    app: &mut App,
    client: &ApiClient,
    update_tx: &mpsc::Sender<StoreUpdate>,
) -> bool {
    if key.kind != KeyEventKind::Press {
        return false;
    }
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return true;
    }

    if app.input == InputMode::Submit {
        match key.code {
            KeyCode::Esc => {
                app.input = InputMode::None;
                app.input_buffer.clear();
                app.mark_dirty();
            }
            KeyCode::Enter => {
                let description = app.input_buffer.trim().to_string();
                app.input = InputMode::None;
                app.input_buffer.clear();
                if description.is_empty() {
                    // Rejected before it ever reaches the network.
                    app.set_note("task description is empty; not submitted");
                } else {
                    spawn_submit(client, update_tx, description.clone());
                    app.set_note(format!("task submitted: {}", ui::ellipsize(&description, 48)));
                }
            }
            KeyCode::Backspace => {
                app.input_buffer.pop();
                app.mark_dirty();
            }
            KeyCode::Char(c) => {
                app.input_buffer.push(c);
                app.mark_dirty();
            }
            _ => {}
        }
        return false;
    }

    match key.code {
        KeyCode::Char('q') => return true,
        KeyCode::Char('s') => {
            spawn_start(client, update_tx);
            app.set_note("start requested");
        }
        KeyCode::Char('x') => {
            spawn_stop(client, update_tx);
            app.set_note("stop requested");
        }
        KeyCode::Char('i') => {
            app.input = InputMode::Submit;
            app.input_buffer.clear();
            app.mark_dirty();
        }
        KeyCode::Char('r') => {
            spawn_snapshot_refresh(client, update_tx);
            spawn_log_seed(client, update_tx);
            app.set_note("refresh requested");
        }
        _ => {}
    }
    false
}

fn spawn_status_refresh(client: &ApiClient, update_tx: &mpsc::Sender<StoreUpdate>) {
    let client = client.clone();
    let tx = update_tx.clone();
    tokio::spawn(async move {
        client.refresh_status(&tx).await;
    });
}

fn spawn_tasks_refresh(client: &ApiClient, update_tx: &mpsc::Sender<StoreUpdate>) {
    let client = client.clone();
    let tx = update_tx.clone();
    tokio::spawn(async move {
        client.refresh_tasks(&tx).await;
    });
}

fn spawn_snapshot_refresh(client: &ApiClient, update_tx: &mpsc::Sender<StoreUpdate>) {
    let client = client.clone();
    let tx = update_tx.clone();
    tokio::spawn(async move {
        client.refresh_status(&tx).await;
        client.refresh_tasks(&tx).await;
    });
}

fn spawn_log_seed(client: &ApiClient, update_tx: &mpsc::Sender<StoreUpdate>) {
    let client = client.clone();
    let tx = update_tx.clone();
    tokio::spawn(async move {
        client.seed_logs(LOG_CAPACITY, &tx).await;
    });
}

fn spawn_start(client: &ApiClient, update_tx: &mpsc::Sender<StoreUpdate>) {
    let client = client.clone();
    let tx = update_tx.clone();
    tokio::spawn(async move {
        client.run_start(&tx).await;
    });
}

fn spawn_stop(client: &ApiClient, update_tx: &mpsc::Sender<StoreUpdate>) {
    let client = client.clone();
    let tx = update_tx.clone();
    tokio::spawn(async move {
        client.run_stop(&tx).await;
    });
}

fn spawn_submit(client: &ApiClient, update_tx: &mpsc::Sender<StoreUpdate>, description: String) {
    let client = client.clone();
    let tx = update_tx.clone();
    tokio::spawn(async move {
        client.run_submit(description, SUBMIT_MODE.to_string(), &tx).await;
    });
}

fn load_config() -> anyhow::Result<Config> {
    let api_url =
        resolve_env("NEXUS_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_string());
    let ws_url = resolve_env("NEXUS_WS_URL").unwrap_or_else(|| DEFAULT_WS_URL.to_string());
    let ws_url = Url::parse(&ws_url).context("invalid NEXUS_WS_URL")?;
    let poll_secs = resolve_env("NEXUS_POLL_SECS")
        .and_then(|value| value.parse::<u64>().ok())
        .filter(|value| *value > 0)
        .unwrap_or(DEFAULT_POLL_SECS);
    Ok(Config {
        api_url,
        ws_url,
        poll_interval: Duration::from_secs(poll_secs),
    })
}

fn resolve_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let stdout_enabled = matches!(
        std::env::var("NEXUS_LOG_STDOUT").ok().as_deref(),
        Some("1") | Some("true") | Some("TRUE") | Some("yes") | Some("YES")
    );
    if stdout_enabled {
        let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
    } else {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(io::sink)
            .try_init();
    }
}
