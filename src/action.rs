use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::store::Store;

/// What the browser asks its caller to do once the loop ends.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ExitAction {
    Resume {
        session_id: String,
        working_dir: String,
        extra_args: Vec<String>,
    },
    NewSession {
        name: String,
    },
    Ephemeral,
}

#[derive(Debug, Error)]
pub enum LaunchError {
    #[error("session directory no longer exists: {}", .0.display())]
    MissingWorkingDir(PathBuf),

    #[error("failed to record session name: {0:#}")]
    Store(#[from] anyhow::Error),
}

/// A fully resolved invocation of the assistant program.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Handoff {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: Option<PathBuf>,
}

impl ExitAction {
    pub fn into_handoff(self, store: &Store, program: &str) -> Result<Handoff, LaunchError> {
        match self {
            ExitAction::Resume {
                session_id,
                working_dir,
                extra_args,
            } => {
                let cwd = if working_dir.is_empty() {
                    None
                } else {
                    let dir = PathBuf::from(&working_dir);
                    if !dir.is_dir() {
                        return Err(LaunchError::MissingWorkingDir(dir));
                    }
                    Some(dir)
                };
                let mut args = vec![String::from("--resume"), session_id];
                args.extend(extra_args);
                Ok(Handoff {
                    program: program.to_string(),
                    args,
                    cwd,
                })
            }
            ExitAction::NewSession { name } => {
                let id = Uuid::new_v4().to_string();
                store.set_tag(&id, &name)?;
                tracing::info!("new session {id} named {name}");
                Ok(Handoff {
                    program: program.to_string(),
                    args: vec![String::from("--session-id"), id],
                    cwd: None,
                })
            }
            ExitAction::Ephemeral => Ok(Handoff {
                program: program.to_string(),
                args: vec![String::from("--session-id"), Uuid::new_v4().to_string()],
                cwd: None,
            }),
        }
    }
}
