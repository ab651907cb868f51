//! Project-level operations: new, open, save and exit.
//!
//! Every operation that can change the project ends with a state sync, so
//! [`Session::project_state`] reflects the server afterwards.

use crate::config::ProjectConfig;
use crate::session::{ProjectState, Session};
use crate::{Result, XflrError};
use serde_json::json;
use tracing::{debug, info};

#[derive(Debug, Clone)]
pub struct ProjectManager {
    session: Session,
}

impl ProjectManager {
    pub fn new(session: Session) -> Self {
        Self { session }
    }

    /// Sync with the server and return the project metadata.
    pub async fn state(&self) -> Result<ProjectState> {
        self.session.sync_state().await?;
        Ok(self.session.project_state())
    }

    /// Start an empty project.
    ///
    /// With `save_current`, the open project is saved first when it already
    /// has a path. A non-empty `path` saves the new project there, adding
    /// the `.xfl` extension when missing.
    pub async fn new_project(&self, path: Option<&str>, save_current: bool) -> Result<()> {
        if save_current {
            self.save_if_known().await?;
        }
        self.session.call("newProject", Vec::new()).await?;
        match path.filter(|p| !p.is_empty()) {
            Some(path) => self.save(Some(&with_project_extension(path))).await?,
            None => {
                self.session.sync_state().await?;
            }
        }
        Ok(())
    }

    /// Open a project file or a set of foil files with `loadProject`.
    pub async fn open<P: AsRef<str>>(&self, files: &[P], save_current: bool) -> Result<()> {
        if files.is_empty() {
            return Err(XflrError::Validation {
                field: "files".to_string(),
                message: "provide a .xfl project or one or more .dat files".to_string(),
            });
        }
        if save_current {
            self.save_if_known().await?;
        }
        let files: Vec<&str> = files.iter().map(|f| f.as_ref()).collect();
        self.session.call("loadProject", vec![json!(files)]).await?;
        info!("Opened {} file(s)", files.len());
        self.session.sync_state().await?;
        Ok(())
    }

    /// Save the project, to `path` when given, else to its current path.
    ///
    /// Fails when no path is given and the project has never been saved.
    pub async fn save(&self, path: Option<&str>) -> Result<()> {
        match path.filter(|p| !p.is_empty()) {
            Some(path) => {
                self.session
                    .call("setProjectPath", vec![json!(path)])
                    .await?;
            }
            None if self.session.project_state().project_path.is_none() => {
                return Err(XflrError::Validation {
                    field: "path".to_string(),
                    message: "the current project has no path, save it with one".to_string(),
                });
            }
            None => {}
        }
        self.session.call("saveProject", Vec::new()).await?;
        self.session.sync_state().await?;
        Ok(())
    }

    /// Shut down the server application and release the connection.
    pub async fn exit(&self) -> Result<()> {
        info!("Closing XFLR5 server");
        self.session.call("exit", Vec::new()).await?;
        self.session.close().await
    }

    async fn save_if_known(&self) -> Result<()> {
        if self.session.project_state().project_path.is_some() {
            self.save(None).await
        } else {
            debug!("Current project has no path, not saving it");
            Ok(())
        }
    }
}

impl std::fmt::Display for ProjectManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.session.project_state();
        write!(f, "<ProjectManager>(")?;
        if let Some(name) = &state.project_name {
            write!(f, "project={}, ", name)?;
        }
        let status = if state.saved == Some(true) {
            "saved"
        } else {
            "not saved"
        };
        write!(f, "status={})", status)
    }
}

fn with_project_extension(path: &str) -> String {
    if path.ends_with(ProjectConfig::PROJECT_EXTENSION) {
        path.to_string()
    } else {
        format!("{}{}", path, ProjectConfig::PROJECT_EXTENSION)
    }
}
