mod tui;

use std::env;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use ccs_browser::action::Handoff;
use ccs_browser::app::{App, Exit};
use ccs_browser::config::Config;
use ccs_browser::logging;
use ccs_browser::session::SessionIndex;
use ccs_browser::store::Store;
use crossterm::event::{self, Event, KeyEventKind};

use crate::tui::Tui;

fn main() -> Result<ExitCode> {
    let config = Config::load()?;
    logging::init(&config)?;
    let output = env::args_os().nth(1).map(PathBuf::from);

    let store = Store::new(config.state_dir());
    let home = dirs::home_dir();
    let index = SessionIndex::new(config.projects_dir(), home.as_deref());
    tracing::debug!("projects dir {}", index.root().display());
    let mut app = App::new(index, store.clone(), config.sort, config.status_frames);

    let mut tui = Tui::new()?;
    let run_result = run_app(&mut tui, &mut app, config.poll_interval());
    let restore_result = tui.restore();

    let exit = run_result?;
    restore_result?;

    let Exit::Launch(action) = exit else {
        return Ok(ExitCode::SUCCESS);
    };
    tracing::info!("exit action: {action:?}");
    match action.into_handoff(&store, &config.assistant) {
        Ok(handoff) => {
            write_handoff(&handoff, output.as_deref())?;
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => {
            tracing::warn!("launch refused: {err}");
            eprintln!("ccs: {err}");
            Ok(ExitCode::FAILURE)
        }
    }
}

fn run_app(tui: &mut Tui, app: &mut App, poll: Duration) -> Result<Exit> {
    loop {
        app.fit_to(tui.area()?);
        tui.draw(app)?;

        let ready = event::poll(poll)?;
        app.tick();
        if !ready {
            continue;
        }

        match event::read()? {
            Event::Key(key) => {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                if let Some(exit) = app.handle_key(key) {
                    return Ok(exit);
                }
            }
            Event::Mouse(mouse) => app.handle_mouse(mouse),
            _ => {}
        }
    }
}

fn write_handoff(handoff: &Handoff, output: Option<&Path>) -> Result<()> {
    let json = serde_json::to_string(handoff).context("failed to encode hand-off")?;
    match output {
        Some(path) => fs::write(path, json)
            .with_context(|| format!("failed to write {}", path.display())),
        None => {
            let mut stdout = io::stdout().lock();
            writeln!(stdout, "{json}").context("failed to write hand-off")
        }
    }
}
