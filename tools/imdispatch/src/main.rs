//! Drive the key-event core from the terminal.
//!
//! Each stdin line holds whitespace separated chords (`n i SPACE`,
//! `CTRL_SPACE`, `L_CTRL`), each sent as a press followed by its release.
//! Lines starting with `:` are commands:
//!
//! - `:switch N` - activate the input method at index N
//! - `:context N` - send following keys to input context N
//! - `:reset` - discard the current composition
//! - `:save` - persist every input method
//! - `:reload` - re-read the configuration file
//! - `:list` - list registered input methods
//! - `:quit`
//!
//! Commits, forwarded keys and window redraws are printed as JSON lines.

mod backends;

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::time::Instant;

use anyhow::{bail, Context, Result};
use clap::Parser;
use imdispatch_core::{
    Chord, ContextId, DispatchConfig, InputMethodInfo, InputState, InputWindow, KeyEvent, KeyEventProcessor,
    Message, Transport,
};
use serde_json::json;
use tracing::{debug, info, warn};

use backends::{LatinMethod, TableMethod};

#[derive(Parser)]
#[command(name = "imdispatch", about = "Feed key chords through the input-method dispatcher")]
struct Args {
    /// TOML file with hotkeys and selection keys
    #[arg(long)]
    config: Option<PathBuf>,

    /// JSON file mapping codes to word lists (built-in table if omitted)
    #[arg(long)]
    table: Option<PathBuf>,

    /// JSON file where selection counts are kept between runs
    #[arg(long)]
    usage: Option<PathBuf>,

    /// Keep the composition when switching input methods
    #[arg(long)]
    keep_state: bool,
}

/// Prints commits and forwarded keys.
struct StdoutTransport;

impl Transport for StdoutTransport {
    fn commit_string(&mut self, ctx: ContextId, text: &str) {
        emit(json!({ "event": "commit", "context": ctx.0, "text": text }));
    }

    fn forward_key(&mut self, ctx: ContextId, event: KeyEvent) {
        emit(json!({
            "event": "forward",
            "context": ctx.0,
            "key": Chord::new(event.sym, event.modifiers).to_string(),
            "kind": format!("{:?}", event.kind),
        }));
    }
}

/// Prints the input window contents on every redraw request.
struct StdoutWindow;

impl StdoutWindow {
    fn draw(&self, ctx: ContextId, state: &InputState, last_page: bool) {
        let candidates: Vec<_> = state
            .candidates
            .current_page_candidates()
            .iter()
            .map(|c| c.text().to_string())
            .collect();
        emit(json!({
            "event": "window",
            "context": ctx.0,
            "preedit": state.preedit.joined(),
            "cursor": state.show_cursor.then(|| state.cursor()),
            "aux_up": texts(state.aux_up.iter()),
            "aux_down": texts(state.aux_down.iter()),
            "candidates": candidates,
            "page": state.candidates.current_page(),
            "pages": state.candidates.num_pages(),
            "remind": state.in_remind,
            "last_page": last_page,
        }));
    }
}

impl InputWindow for StdoutWindow {
    fn update_input_window(&mut self, ctx: ContextId, state: &InputState) {
        self.draw(ctx, state, false);
    }

    fn display_last_page(&mut self, ctx: ContextId, state: &InputState) {
        self.draw(ctx, state, true);
    }
}

fn texts<'a>(messages: impl Iterator<Item = &'a Message>) -> Vec<&'a str> {
    messages.map(|m| m.text.as_str()).collect()
}

fn emit(value: serde_json::Value) {
    let mut out = io::stdout().lock();
    if writeln!(out, "{}", value).is_err() {
        warn!("stdout closed");
    }
}

fn load_config(args: &Args) -> Result<DispatchConfig> {
    let mut config = match &args.config {
        Some(path) => DispatchConfig::load_toml(path).with_context(|| format!("loading {}", path.display()))?,
        None => DispatchConfig::default(),
    };
    if args.keep_state {
        config.keep_state_on_switch = true;
    }
    Ok(config)
}

struct Session {
    processor: KeyEventProcessor,
    context: ContextId,
    started: Instant,
}

impl Session {
    fn timestamp(&self) -> u64 {
        self.started.elapsed().as_millis() as u64
    }

    fn send_chord(&mut self, chord: Chord) {
        let mut transport = StdoutTransport;
        let mut window = StdoutWindow;
        let press = KeyEvent::press(chord.sym, chord.modifiers, self.timestamp());
        let result = self
            .processor
            .handle_key_event(self.context, press, &mut transport, &mut window);
        debug!(%chord, ?result, "key press");
        let release = KeyEvent::release(chord.sym, chord.modifiers, self.timestamp());
        self.processor
            .handle_key_event(self.context, release, &mut transport, &mut window);
    }

    /// Returns false when the session should end.
    fn command(&mut self, line: &str, args: &Args) -> Result<bool> {
        let mut parts = line.split_whitespace();
        match (parts.next(), parts.next()) {
            (Some(":quit"), _) => return Ok(false),
            (Some(":switch"), Some(n)) => {
                let index: usize = n.parse().context("index must be a number")?;
                self.processor.create_context(self.context);
                self.processor.switch_input_method(self.context, index)?;
            }
            (Some(":context"), Some(n)) => {
                self.context = ContextId(n.parse().context("context must be a number")?);
                self.processor.create_context(self.context);
            }
            (Some(":reset"), _) => self.processor.reset_input(self.context),
            (Some(":save"), _) => self.processor.save_all(),
            (Some(":reload"), _) => {
                let config = load_config(args)?;
                self.processor.reload_config(config);
                info!("configuration reloaded");
            }
            (Some(":list"), _) => {
                let current = self.processor.current_input_method(self.context).cloned();
                for (i, m) in self.processor.registry().iter().enumerate() {
                    emit(json!({
                        "event": "method",
                        "index": i,
                        "name": m.info().name(),
                        "icon": m.info().icon_name(),
                        "active": current.as_ref() == Some(m.info()),
                    }));
                }
            }
            (Some(other), _) => bail!("unknown command {other}"),
            (None, _) => {}
        }
        Ok(true)
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();
    let config = load_config(&args)?;

    let mut processor = KeyEventProcessor::new(config);
    processor.register(
        "table",
        InputMethodInfo::new("Table", "表", 0)?,
        Box::new(TableMethod::new(args.table.clone(), args.usage.clone())),
    )?;
    processor.register("latin", InputMethodInfo::new("Latin", "A", 10)?, Box::new(LatinMethod))?;

    let context = ContextId(1);
    processor.create_context(context);
    processor.switch_input_method(context, 0)?;

    let mut session = Session {
        processor,
        context,
        started: Instant::now(),
    };

    for line in io::stdin().lock().lines() {
        let line = line?;
        let line = line.trim();
        if line.starts_with(':') {
            match session.command(line, &args) {
                Ok(true) => continue,
                Ok(false) => break,
                Err(e) => {
                    warn!(error = %e, "command failed");
                    continue;
                }
            }
        }
        for token in line.split_whitespace() {
            match token.parse::<Chord>() {
                Ok(chord) => session.send_chord(chord),
                Err(e) => warn!(%token, error = %e, "skipping chord"),
            }
        }
    }

    session.processor.shutdown();
    Ok(())
}
