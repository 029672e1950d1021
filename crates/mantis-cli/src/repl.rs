use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use mantis::client::{ProgressCallback, UploadProgress};
use mantis::session::{AuthStore, ChatTurnCoordinator, DocumentTracker, TeamStore, ThreadBrowser};
use mantis::types::validation::{validate_email, validate_message, validate_upload};
use mantis::types::{LoginRequest, ProjectScope};
use mantis::{Mantis, TurnOutcome, UploadFile};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{debug, warn};

use crate::render;

pub const HELP: &str = "\
Commands:
  /login <email> <password>  sign in
  /logout                    sign out
  /teams                     list your teams
  /use <team> <project>      switch to a project
  /threads                   list recent threads
  /more                      load the next page of threads
  /open <thread-id|number>   continue a historical thread
  /new                       start a new conversation
  /upload <path>             upload a document and track its processing
  /docs                      show tracked documents
  /help                      show this help
  /quit                      exit
Anything else is sent to the assistant.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Login { email: String, password: String },
    Logout,
    Teams,
    Use { team_id: String, project_id: String },
    Threads,
    More,
    Open(String),
    New,
    Upload(PathBuf),
    Docs,
    Help,
    Quit,
    Message(String),
}

impl Command {
    pub fn parse(line: &str) -> Result<Option<Command>, String> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(None);
        }
        if !line.starts_with('/') {
            return validate_message(line)
                .map(|text| Some(Command::Message(text.to_string())))
                .map_err(|e| e.to_string());
        }

        let mut parts = line.split_whitespace();
        let name = parts.next().unwrap_or_default();
        let args: Vec<&str> = parts.collect();
        let command = match (name, args.as_slice()) {
            ("/login", [email, password]) => {
                validate_email(email).map_err(|e| e.to_string())?;
                Command::Login {
                    email: email.to_string(),
                    password: password.to_string(),
                }
            }
            ("/logout", []) => Command::Logout,
            ("/teams", []) => Command::Teams,
            ("/use", [team_id, project_id]) => Command::Use {
                team_id: team_id.to_string(),
                project_id: project_id.to_string(),
            },
            ("/threads", []) => Command::Threads,
            ("/more", []) => Command::More,
            ("/open", [thread]) => Command::Open(thread.to_string()),
            ("/new", []) => Command::New,
            ("/upload", [_, ..]) => Command::Upload(PathBuf::from(line["/upload".len()..].trim())),
            ("/docs", []) => Command::Docs,
            ("/help", []) => Command::Help,
            ("/quit" | "/exit", []) => Command::Quit,
            _ => return Err(format!("Unknown command or wrong arguments: {line}. Type /help.")),
        };
        Ok(Some(command))
    }
}

/// Per-project chat, thread list and documents
struct ProjectSession {
    chat: ChatTurnCoordinator,
    threads: ThreadBrowser,
    documents: DocumentTracker,
}

pub struct Repl {
    mantis: Mantis,
    title: String,
    auth: AuthStore,
    teams: TeamStore,
    project: Option<ProjectSession>,
}

impl Repl {
    pub fn new(mantis: Mantis, title: impl Into<String>) -> Self {
        Self {
            auth: mantis.auth(),
            teams: mantis.teams(),
            mantis,
            title: title.into(),
            project: None,
        }
    }

    pub async fn run(&mut self) -> Result<()> {
        let _watcher = self.auth.watch_session(self.mantis.session_bus());
        if self.auth.restore_session().await.context("Failed to read stored session")? {
            let name = self.auth.state().borrow().user.as_ref().map(|u| u.name.clone());
            println!("Welcome back{}.", name.map(|n| format!(", {n}")).unwrap_or_default());
        }
        println!("{} - type /help for commands.", self.title);

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            prompt().await?;
            let Some(line) = lines.next_line().await? else {
                break;
            };
            match Command::parse(&line) {
                Ok(None) => {}
                Ok(Some(Command::Quit)) => break,
                Ok(Some(command)) => {
                    if let Err(e) = self.execute(command).await {
                        println!("Error: {e:#}");
                    }
                }
                Err(message) => println!("{message}"),
            }
        }

        if let Some(project) = &self.project {
            project.documents.stop_all();
        }
        Ok(())
    }

    async fn execute(&mut self, command: Command) -> Result<()> {
        match command {
            Command::Login { email, password } => {
                self.auth.login(&LoginRequest { email, password }).await?;
                println!("Signed in.");
            }
            Command::Logout => {
                if let Some(project) = self.project.take() {
                    project.documents.stop_all();
                }
                self.auth.logout().await?;
            }
            Command::Teams => {
                let teams = self.teams.fetch_teams().await?;
                if teams.is_empty() {
                    println!("No teams.");
                }
                for team in &teams {
                    println!("{}", render::team(team));
                }
            }
            Command::Use { team_id, project_id } => {
                self.use_project(ProjectScope::new(team_id, project_id))?;
            }
            Command::Threads => {
                let project = self.project()?;
                project.threads.load_initial().await?;
                print_threads(project);
            }
            Command::More => {
                let project = self.project()?;
                if project.threads.load_more().await? {
                    print_threads(project);
                } else {
                    println!("No more threads.");
                }
            }
            Command::Open(reference) => {
                let project = self.project()?;
                let thread_id = resolve_thread(project, &reference);
                project.chat.select_thread(&thread_id).await?;
                for message in &project.chat.state().borrow().messages {
                    println!("{}", render::message(message));
                }
            }
            Command::New => {
                self.project()?.chat.start_new_conversation();
                println!("Started a new conversation.");
            }
            Command::Upload(path) => self.upload(&path).await?,
            Command::Docs => {
                let board = self.project()?.documents.board().snapshot();
                if board.is_empty() {
                    println!("No documents uploaded in this session.");
                }
                for tracked in board.values() {
                    println!("{}", render::document(tracked));
                }
            }
            Command::Help => println!("{HELP}"),
            Command::Message(text) => self.send(&text).await?,
            Command::Quit => {}
        }
        Ok(())
    }

    fn project(&self) -> Result<&ProjectSession> {
        self.project
            .as_ref()
            .context("No project selected. Use /teams and /use <team> <project> first.")
    }

    fn use_project(&mut self, scope: ProjectScope) -> Result<()> {
        let user_id = self
            .auth
            .state()
            .borrow()
            .user
            .as_ref()
            .map(|u| u.id.clone())
            .context("Sign in first with /login")?;

        if let Some(previous) = self.project.take() {
            previous.documents.stop_all();
        }
        debug!("Switching to project {}/{}", scope.team_id, scope.project_id);
        self.project = Some(ProjectSession {
            chat: self.mantis.chat(scope.clone(), user_id),
            threads: self.mantis.threads(scope.clone()),
            documents: self.mantis.documents(scope.clone()),
        });
        println!("Using project {} in team {}.", scope.project_id, scope.team_id);
        Ok(())
    }

    async fn send(&self, text: &str) -> Result<()> {
        let project = self.project()?;
        let chat = &project.chat;
        let before = chat.state().borrow().messages.len();

        let mut changes = chat.state().subscribe();
        let progress = tokio::spawn(async move {
            let mut last = None;
            while changes.changed().await.is_ok() {
                let status = changes.borrow_and_update().run.as_ref().map(|run| run.status.clone());
                if status.is_some() && status != last {
                    if let Some(status) = &status {
                        println!("  ({})", render::run_status(status));
                    }
                    last = status;
                }
            }
        });

        let outcome = chat.send_message(text).await;
        progress.abort();

        let state = chat.state().snapshot();
        match outcome? {
            TurnOutcome::RunCompleted { .. } => {
                for message in &state.messages {
                    println!("{}", render::message(message));
                }
            }
            TurnOutcome::Replied { .. } | TurnOutcome::Failed { .. } => {
                for message in state.messages.iter().skip(before + 1) {
                    println!("{}", render::message(message));
                }
            }
        }
        Ok(())
    }

    async fn upload(&self, path: &Path) -> Result<()> {
        let project = self.project()?;
        let size = tokio::fs::metadata(path)
            .await
            .with_context(|| format!("Cannot read {}", path.display()))?
            .len();
        let content_type = validate_upload(path, size)?;
        let file = UploadFile::from_path(path, content_type).await?;

        let progress: ProgressCallback = Arc::new(|p: UploadProgress| debug!("Upload progress: {}%", p.percent()));
        let document = project.documents.upload_and_track(file, None, Some(progress)).await?;
        println!("Uploaded {} ({}); processing...", document.name, document.id);
        Ok(())
    }
}

fn print_threads(project: &ProjectSession) {
    let state = project.threads.state().snapshot();
    if state.threads.is_empty() {
        println!("No threads yet.");
    }
    for (index, thread) in state.threads.iter().enumerate() {
        println!("{}", render::thread(index + 1, thread));
    }
    if state.has_more {
        println!("  /more for older threads");
    }
}

/// Accepts either a thread id or its 1-based position in the last listing
fn resolve_thread(project: &ProjectSession, reference: &str) -> String {
    reference
        .parse::<usize>()
        .ok()
        .and_then(|n| n.checked_sub(1))
        .and_then(|index| project.threads.state().borrow().threads.get(index).map(|t| t.id.clone()))
        .unwrap_or_else(|| reference.to_string())
}

async fn prompt() -> Result<()> {
    let mut stdout = tokio::io::stdout();
    if let Err(e) = stdout.write_all(b"> ").await {
        warn!("Failed to write prompt: {}", e);
    }
    stdout.flush().await?;
    Ok(())
}
