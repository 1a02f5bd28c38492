pub mod render;

use crate::host::MessageSource;
use crate::images::ImageProber;
use crate::overlay::{InboundMessage, OverlayController, SubmitOutcome};
use anyhow::Result;
use crossterm::{
    event::{Event, EventStream, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    ExecutableCommand,
};
use futures_util::StreamExt;
use ratatui::prelude::*;
use std::io::stdout;
use tokio::sync::mpsc;

/// What the event loop should do after a key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Run the overlay in the terminal until the user quits.
pub async fn run_tui(
    controller: OverlayController,
    source: Option<Box<dyn MessageSource>>,
    prober: Option<ImageProber>,
    title: String,
) -> Result<()> {
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    let result = tui_loop(&mut terminal, controller, source, prober, &title).await;

    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    result
}

async fn tui_loop(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    mut controller: OverlayController,
    source: Option<Box<dyn MessageSource>>,
    prober: Option<ImageProber>,
    title: &str,
) -> Result<()> {
    let (failed_tx, mut failed_rx) = mpsc::channel::<String>(32);
    let mut events = EventStream::new();

    controller.initialize();
    terminal.draw(|f| render::draw(f, controller.surface(), title))?;

    let mut inbound_rx = start_feed(&mut controller, source);

    let mut feed_open = true;
    loop {
        if let Some(prober) = &prober {
            for url in controller.take_image_probes() {
                prober.spawn_check(url, failed_tx.clone());
            }
        }
        terminal.draw(|f| render::draw(f, controller.surface(), title))?;

        tokio::select! {
            event = events.next() => match event {
                Some(Ok(Event::Key(key))) => {
                    if handle_key(&mut controller, key) == Flow::Quit {
                        return Ok(());
                    }
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => return Err(e.into()),
                None => return Ok(()),
            },
            msg = inbound_rx.recv(), if feed_open => match msg {
                Some(msg) => {
                    controller.handle_message(msg);
                }
                None => {
                    tracing::info!("host message feed ended");
                    feed_open = false;
                }
            },
            Some(url) = failed_rx.recv() => {
                controller.image_failed(&url);
            }
        }
    }
}

/// Mark the overlay ready, then start `source` on its own task. Nothing can
/// arrive before the ready flag is set, so the first `open` is never lost.
/// The returned receiver closes when the source finishes (at once if none).
pub fn start_feed(
    controller: &mut OverlayController,
    source: Option<Box<dyn MessageSource>>,
) -> mpsc::Receiver<InboundMessage> {
    controller.mark_ready();

    let (tx, rx) = mpsc::channel(64);
    match source {
        Some(source) => {
            tracing::debug!(source = source.name(), "display ready, starting host messages");
            tokio::spawn(async move {
                if let Err(e) = source.run(tx).await {
                    tracing::error!(source = source.name(), "message source failed: {:#}", e);
                }
            });
        }
        None => {
            tracing::debug!("no host message source configured");
        }
    }
    rx
}

/// Route a key press to the topmost layer: warning, form, modal, then pages.
pub fn handle_key(controller: &mut OverlayController, key: KeyEvent) -> Flow {
    if key.kind != KeyEventKind::Press {
        return Flow::Continue;
    }
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return Flow::Quit;
    }

    if controller.surface().warning.is_some() {
        controller.dismiss_warning();
        return Flow::Continue;
    }

    if controller.surface().form.visible {
        handle_form_key(controller, key);
        return Flow::Continue;
    }

    if controller.surface().modal.is_some() {
        match key.code {
            KeyCode::Esc | KeyCode::Enter | KeyCode::Backspace | KeyCode::Char('x') => {
                controller.close_detail();
            }
            KeyCode::Char('q') => return Flow::Quit,
            _ => {}
        }
        return Flow::Continue;
    }

    match key.code {
        KeyCode::Char('q') => return Flow::Quit,
        KeyCode::Esc => {
            controller.handle_escape();
        }
        _ if !controller.is_open() => {}
        KeyCode::Left | KeyCode::Char('h') => {
            controller.prev_page();
        }
        KeyCode::Right | KeyCode::Char('l') => {
            controller.next_page();
        }
        KeyCode::Enter => {
            if let Some(id) = controller.current_article_id() {
                controller.open_detail(id);
            }
        }
        KeyCode::Char('d') => {
            if let Some(id) = controller.current_article_id() {
                controller.delete_article(id);
            }
        }
        KeyCode::Char('n') => controller.toggle_form(),
        _ => {}
    }
    Flow::Continue
}

fn handle_form_key(controller: &mut OverlayController, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => controller.cancel_form(),
        KeyCode::Enter => {
            let outcome = controller.submit_article();
            if outcome != SubmitOutcome::Sent {
                tracing::debug!(?outcome, "submission not sent");
            }
        }
        KeyCode::Tab => {
            let form = controller.form_mut();
            form.focus = form.focus.next();
        }
        KeyCode::BackTab => {
            let form = controller.form_mut();
            form.focus = form.focus.prev();
        }
        KeyCode::Backspace => {
            let form = controller.form_mut();
            let focus = form.focus;
            form.field_mut(focus).pop();
        }
        KeyCode::Char(c) => {
            let form = controller.form_mut();
            let focus = form.focus;
            form.field_mut(focus).push(c);
        }
        _ => {}
    }
}
