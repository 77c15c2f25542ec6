//! Chat with a hermit crab living in a box directory.

#[macro_use]
extern crate tracing;

use std::env;
use std::io::Write as _;
use std::path::PathBuf;
use std::pin::pin;
use std::time::Duration;

use hermitclaw::SessionBuilder;
use hermitclaw::core::tool::Location;
use hermitclaw_openai::{OpenAIConfigBuilder, OpenAIProvider};
use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use tokio::io::{self, AsyncBufReadExt};
use tokio::select;
use tokio::sync::mpsc;
use tokio::time::sleep;

enum SessionEvent {
    Thought(String),
    Speech(String),
    Move(Location),
}

const BAR_CHAR: &str = "▎";

#[tokio::main(flavor = "current_thread")]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let Some(config) = OpenAIConfigBuilder::from_env() else {
        eprintln!("OPENAI_API_KEY environment variable is not set");
        return;
    };
    let config = config.build();
    debug!("using {config:?}");
    let model_provider = OpenAIProvider::new(config);

    let box_dir = match env::var_os("HERMITCLAW_BOX") {
        Some(dir) => PathBuf::from(dir),
        None => PathBuf::from("."),
    };
    if !box_dir.is_dir() {
        eprintln!("{} is not a directory", box_dir.display());
        return;
    }

    let (event_tx, mut event_rx) = mpsc::unbounded_channel();

    let mut session = SessionBuilder::with_model_provider(model_provider)
        .with_system_prompt(
            include_str!("./system_prompt.md")
                .replace("{{HOST_OS}}", host_os()),
        )
        .with_box_dir(box_dir)
        .on_thought({
            let event_tx = event_tx.clone();
            move |text| {
                event_tx.send(SessionEvent::Thought(text.to_owned())).ok();
            }
        })
        .on_speech({
            let event_tx = event_tx.clone();
            move |text| {
                event_tx.send(SessionEvent::Speech(text.to_owned())).ok();
            }
        })
        .on_move({
            let event_tx = event_tx.clone();
            move |location| {
                event_tx.send(SessionEvent::Move(location)).ok();
            }
        })
        .build();

    let progress_style = ProgressStyle::with_template("{spinner} {wide_msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
        .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏");

    loop {
        print!("> ");
        std::io::stdout().flush().ok();

        let Some(line) = read_line().await else {
            break;
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let mut turn = pin!(session.send_message(line));
        let mut progress_bar = None;

        let result = loop {
            // Create a new progress bar if it has been finished.
            progress_bar
                .get_or_insert_with(|| {
                    let progress_bar = ProgressBar::new_spinner();
                    progress_bar.set_style(progress_style.clone());
                    progress_bar.set_message("🦀 Thinking...");
                    progress_bar
                })
                .inc(1);

            let sleep = sleep(Duration::from_millis(100));
            select! {
                result = turn.as_mut() => break result,
                Some(event) = event_rx.recv() => {
                    // Finish the progress bar before printing anything else.
                    if let Some(progress_bar) = progress_bar.take() {
                        progress_bar.finish_and_clear();
                    }
                    print_event(event);
                }
                _ = sleep => {}
            }
        };

        if let Some(progress_bar) = progress_bar.take() {
            progress_bar.finish_and_clear();
        }
        while let Ok(event) = event_rx.try_recv() {
            print_event(event);
        }
        if let Err(err) = result {
            println!("{}❌ {}", BAR_CHAR.bright_red(), err.bright_white());
        }
    }
}

fn print_event(event: SessionEvent) {
    match event {
        SessionEvent::Thought(text) => {
            println!("{}💭 {}", BAR_CHAR.bright_black(), text.dimmed());
        }
        SessionEvent::Speech(text) => {
            println!("{}🦀 {}", BAR_CHAR.bright_cyan(), text.bright_white());
        }
        SessionEvent::Move(location) => {
            println!(
                "{}🚶 moved to the {}",
                BAR_CHAR.bright_yellow(),
                location.bold()
            );
        }
    }
}

async fn read_line() -> Option<String> {
    let mut stdin = io::BufReader::new(io::stdin());
    let mut line = String::new();

    match stdin.read_line(&mut line).await {
        Ok(count) => {
            if count == 0 {
                return None;
            }
            Some(line)
        }
        Err(err) => {
            error!("error reading input: {}", err);
            None
        }
    }
}

#[inline]
fn host_os() -> &'static str {
    let os = std::env::consts::OS;
    match os {
        "linux" => "Linux",
        "macos" => "macOS",
        "windows" => "Windows",
        _ => "some other OS",
    }
}
