//! # Terminal Adapter
//!
//! A line-oriented front end over the core. Reads stdin, translates lines
//! into core actions, and prints new log entries as they appear.
//!
//! Backend calls run on spawned tasks and report back through a channel, so
//! stdin stays live while a send is in flight. A second send during that
//! time is turned away by `update()`.
//!
//! ```text
//! stdin ──▶ ReplEvent ──▶ update() ──▶ Effect ──spawn──▶ backend
//!                            ▲                             │
//!                            └──── Action (via mpsc) ◀─────┘
//! ```

mod command;
pub mod render;

use std::io::Write;
use std::sync::Arc;

use log::{debug, info, warn};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc::{self, Sender};

use crate::backend::{ChatBackend, StagedFile};
use crate::client::perform;
use crate::core::action::{Action, Effect, update};
use crate::core::state::{App, LogKind};

pub use command::{HELP, ReplEvent, parse_line};

/// Completed backend call, tagged with the session it was made for.
type Tagged = (u64, Action);

/// Spawns the backend call for `effect`, if there is one.
fn dispatch(effect: Effect, generation: u64, backend: &Arc<dyn ChatBackend>, tx: &Sender<Tagged>) {
    if matches!(effect, Effect::None | Effect::Busy) {
        return;
    }
    let backend = Arc::clone(backend);
    let tx = tx.clone();
    tokio::spawn(async move {
        if let Some(action) = perform(backend.as_ref(), effect).await
            && tx.send((generation, action)).await.is_err()
        {
            warn!("Backend result dropped: REPL already closed");
        }
    });
}

/// A typed line. New text replaces the input only while idle, so a send
/// turned away as busy leaves the in-flight turn's input alone.
fn on_send(app: &mut App, text: String) -> Effect {
    if app.phase.is_idle() && !text.trim().is_empty() {
        app.input = text;
    }
    update(app, Action::Submit)
}

/// A finished backend call. Results made for an earlier session are dropped.
fn on_result(app: &mut App, generation: u64, (tag, action): Tagged) -> Effect {
    if tag != generation {
        debug!("Discarding result from session generation {}", tag);
        return Effect::None;
    }
    update(app, action)
}

/// Prints whatever was logged since the last call.
fn flush_log(app: &App, printed: &mut usize, width: usize) -> std::io::Result<()> {
    let mut out = std::io::stdout().lock();
    for entry in app.log.iter().skip(*printed) {
        writeln!(out, "{}", render::render_entry(entry, width))?;
    }
    *printed = app.log.len();
    out.flush()
}

pub async fn run(backend: Arc<dyn ChatBackend>, mut app: App) -> std::io::Result<()> {
    let (tx, mut rx) = mpsc::channel::<Tagged>(16);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let width = render::terminal_width();

    // Bumped on /reset so late replies from the old session are discarded.
    let mut generation = 0u64;
    let mut printed = 0usize;

    println!("courier: connected to the {} backend. /help for commands.", backend.name());
    flush_log(&app, &mut printed, width)?;

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    info!("stdin closed, leaving REPL");
                    break;
                };
                match parse_line(&line) {
                    ReplEvent::Send(text) => {
                        let effect = on_send(&mut app, text);
                        if effect != Effect::None && effect != Effect::Busy {
                            println!("   ... {}", app.status_message);
                        }
                        dispatch(effect, generation, &backend, &tx);
                    }
                    ReplEvent::Attach(path) => match StagedFile::from_path(&path).await {
                        Ok(file) => {
                            app.push_log(
                                LogKind::Notice,
                                format!("Attached {} ({} bytes)", file.name, file.bytes.len()),
                            );
                            app.staged_file = Some(file);
                        }
                        Err(e) => app.push_log(LogKind::Error, e.to_string()),
                    },
                    ReplEvent::Detach => {
                        if let Some(file) = app.staged_file.take() {
                            app.push_log(LogKind::Notice, format!("Detached {}", file.name));
                        }
                    }
                    ReplEvent::Status => println!("{}", render::render_status(&app)),
                    ReplEvent::Reset => {
                        generation += 1;
                        app.reset();
                        printed = 0;
                        app.push_log(LogKind::Notice, "New session");
                        debug!("Session reset, generation {}", generation);
                    }
                    ReplEvent::Help => println!("{HELP}"),
                    ReplEvent::Quit => break,
                    ReplEvent::Unknown(cmd) => {
                        app.push_log(LogKind::Error, format!("Unknown command {cmd}, try /help"));
                    }
                }
            }
            Some(result) = rx.recv() => {
                let effect = on_result(&mut app, generation, result);
                dispatch(effect, generation, &backend, &tx);
            }
        }
        flush_log(&app, &mut printed, width)?;
    }

    if !app.phase.is_idle() {
        warn!("Exiting while {}", app.phase.label());
    }
    Ok(())
}
