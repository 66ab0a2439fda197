//! `sics` — command-line client for the SICS sanitary control backend.
//!
//! # Usage
//!
//! ```text
//! sics login --user mlopez --password secreta
//! sics list afiliados --query lopez --page 2
//! sics can certificados delete
//! sics --config ~/.config/sics/sics.toml whoami
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result, bail};
use clap::{Parser, Subcommand};
use serde::Serialize;
use sics_client::{ApiClient, ClientConfig, FileStore, ListPage, Notice, Transport, Upload};
use sics_core::{
  Action, EntityKind, Record, SessionManager, has_permission,
  records::{
    Affiliate, Certificate, ClinicalExam, Doctor, Laboratory, MedicalNote, Person, User, Workplace,
  },
};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "sics", version, about = "Client for the SICS sanitary control backend")]
struct Cli {
  /// Path to a TOML config file (base_url, storage_path, page_size, timeout_secs).
  #[arg(short, long, value_name = "FILE", env = "SICS_CONFIG")]
  config: Option<PathBuf>,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Sign in and persist the session.
  Login {
    #[arg(short, long)]
    user:     String,
    #[arg(short, long, env = "SICS_PASSWORD")]
    password: String,
  },
  /// Forget the persisted session.
  Logout,
  /// Show the signed-in user and their granted modules.
  Whoami,
  /// List a collection, filtered and paged client-side.
  List {
    /// Module name, e.g. `afiliados` or `notas_medicas`.
    entity: EntityKind,
    #[arg(short, long, default_value = "")]
    query:  String,
    /// One-based page number.
    #[arg(short, long, default_value_t = 1)]
    page:   usize,
  },
  /// Show one record as JSON.
  Show { entity: EntityKind, id: String },
  /// Delete one record.
  Delete { entity: EntityKind, id: String },
  /// Attach a file to a record.
  Upload {
    entity: EntityKind,
    id:     String,
    file:   PathBuf,
    /// Multipart field name.
    #[arg(long, default_value = "archivo")]
    field:  String,
  },
  /// Check whether the current session may perform an action.
  Can { module: String, action: Action },
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_writer(std::io::stderr)
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();
  let config = load_config(cli.config.as_deref())?;

  let storage_path = expand_tilde(&config.storage_path);
  let store = FileStore::open(&storage_path)
    .with_context(|| format!("failed to open session file {}", storage_path.display()))?;
  let mut manager = SessionManager::new(store);
  manager.restore();

  let transport = Transport::new(&config)
    .context("failed to build HTTP client")?
    .with_token(manager.token());
  let api = ApiClient::new(transport);

  let mut ctx = Ctx { api, manager, page_size: config.page_size };
  ctx.run(cli.command).await
}

fn load_config(path: Option<&Path>) -> Result<ClientConfig> {
  let defaults = ClientConfig::default();
  let mut builder = config::Config::builder()
    .set_default("base_url", defaults.base_url)?
    .set_default("storage_path", defaults.storage_path.to_string_lossy().into_owned())?
    .set_default("page_size", defaults.page_size as u64)?
    .set_default("timeout_secs", defaults.timeout_secs)?;
  if let Some(path) = path {
    builder = builder.add_source(config::File::from(path).required(false));
  }
  builder
    .add_source(config::Environment::with_prefix("SICS"))
    .build()
    .context("failed to read config")?
    .try_deserialize()
    .context("failed to deserialise ClientConfig")
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}

// ─── Commands ─────────────────────────────────────────────────────────────────

struct Ctx {
  api:       ApiClient,
  manager:   SessionManager<FileStore>,
  page_size: usize,
}

impl Command {
  /// Whether the command runs under the stored session. `login` runs
  /// without one, so its 401 says nothing about the stored session.
  fn uses_session(&self) -> bool { !matches!(self, Self::Login { .. }) }
}

/// The backend refused the credentials the request carried.
fn is_rejected(err: &anyhow::Error) -> bool {
  err
    .downcast_ref::<sics_client::Error>()
    .is_some_and(sics_client::Error::is_unauthorized)
}

impl Ctx {
  async fn run(&mut self, command: Command) -> Result<()> {
    let uses_session = command.uses_session();
    let outcome = self.dispatch(command).await;

    if uses_session
      && let Err(e) = &outcome
      && is_rejected(e)
    {
      tracing::warn!("session rejected by the server, signing out");
      self.manager.invalidate().context("failed to clear session")?;
    }
    outcome
  }

  async fn dispatch(&mut self, command: Command) -> Result<()> {
    match command {
      Command::Login { user, password } => self.login(&user, &password).await,
      Command::Logout => self.logout().await,
      Command::Whoami => self.whoami(),
      Command::List { entity, query, page } => self.list(entity, &query, page).await,
      Command::Show { entity, id } => self.show(entity, &id).await,
      Command::Delete { entity, id } => self.delete(entity, &id).await,
      Command::Upload { entity, id, file, field } => self.upload(entity, &id, &file, field).await,
      Command::Can { module, action } => {
        let allowed = has_permission(self.manager.session(), &module, action);
        println!("{}", if allowed { "allowed" } else { "denied" });
        Ok(())
      }
    }
  }

  fn require(&self, kind: EntityKind, action: Action) -> Result<()> {
    if self.manager.session().is_none() {
      bail!("not signed in; run `sics login` first");
    }
    if !has_permission(self.manager.session(), kind.module(), action) {
      bail!("your role may not {action} {kind}");
    }
    Ok(())
  }

  async fn login(&mut self, user: &str, password: &str) -> Result<()> {
    let payload = self.api.login(user, password).await?;
    let session = self.manager.login(&payload).context("login rejected")?;
    tracing::info!(user_id = %session.user_id, role = %session.role.name, "signed in");
    println!("Signed in as {} ({})", session.display_name(), session.role.name);
    Ok(())
  }

  async fn logout(&mut self) -> Result<()> {
    if self.manager.session().is_some()
      && let Err(e) = self.api.logout().await
    {
      tracing::warn!(error = %e, "server logout failed");
    }
    self.manager.logout()?;
    println!("Signed out");
    Ok(())
  }

  fn whoami(&self) -> Result<()> {
    let Some(session) = self.manager.session() else {
      println!("{}", self.manager.state().label());
      return Ok(());
    };
    println!("{} <{}> ({})", session.display_name(), session.username, session.role.name);
    for (module, actions) in &session.role.permissions.modules {
      let actions: Vec<&str> = actions.iter().map(|a| a.as_str()).collect();
      println!("  {module:<16} {}", actions.join(", "));
    }
    Ok(())
  }

  async fn list(&self, kind: EntityKind, query: &str, page: usize) -> Result<()> {
    self.require(kind, Action::Read)?;
    match kind {
      EntityKind::Person => self.list_as::<Person>(query, page).await,
      EntityKind::Affiliate => self.list_as::<Affiliate>(query, page).await,
      EntityKind::Doctor => self.list_as::<Doctor>(query, page).await,
      EntityKind::Workplace => self.list_as::<Workplace>(query, page).await,
      EntityKind::Laboratory => self.list_as::<Laboratory>(query, page).await,
      EntityKind::ClinicalExam => self.list_as::<ClinicalExam>(query, page).await,
      EntityKind::MedicalNote => self.list_as::<MedicalNote>(query, page).await,
      EntityKind::Certificate => self.list_as::<Certificate>(query, page).await,
      EntityKind::User => self.list_as::<User>(query, page).await,
    }
  }

  async fn list_as<R: Record + Serialize>(&self, query: &str, page: usize) -> Result<()> {
    let mut list: ListPage<R> = ListPage::new(self.page_size);
    let fetched = self.api.fetch::<R>().await;
    let unauthorized = fetched.as_ref().is_err_and(sics_client::Error::is_unauthorized);
    list.load(fetched);
    list.set_query(query);

    if let Some(notice) = list.notice() {
      if unauthorized {
        bail!(sics_client::Error::Status { status: 401, message: notice.message.clone() });
      }
      bail!("{}", notice.message);
    }

    let rows = list.page(page.saturating_sub(1));
    for record in &rows {
      println!("{}", serde_json::to_string(record)?);
    }
    if rows.is_empty() {
      list.set_notice(Notice::info("no records"));
    }
    if let Some(notice) = list.notice() {
      println!("{}", notice.message);
    }
    eprintln!("page {}/{} ({} matching)", page.max(1), list.page_count(), list.filtered().len());
    Ok(())
  }

  async fn show(&self, kind: EntityKind, id: &str) -> Result<()> {
    self.require(kind, Action::Read)?;
    let record = match kind {
      EntityKind::Person => self.show_as::<Person>(id).await?,
      EntityKind::Affiliate => self.show_as::<Affiliate>(id).await?,
      EntityKind::Doctor => self.show_as::<Doctor>(id).await?,
      EntityKind::Workplace => self.show_as::<Workplace>(id).await?,
      EntityKind::Laboratory => self.show_as::<Laboratory>(id).await?,
      EntityKind::ClinicalExam => self.show_as::<ClinicalExam>(id).await?,
      EntityKind::MedicalNote => self.show_as::<MedicalNote>(id).await?,
      EntityKind::Certificate => self.show_as::<Certificate>(id).await?,
      EntityKind::User => self.show_as::<User>(id).await?,
    };
    match record {
      Some(json) => println!("{json}"),
      None => bail!("{kind} {id} not found"),
    }
    Ok(())
  }

  async fn show_as<R: Record + Serialize>(&self, id: &str) -> Result<Option<String>> {
    let record = self.api.fetch_one::<R>(id).await?;
    record
      .map(|r| serde_json::to_string_pretty(&r))
      .transpose()
      .map_err(Into::into)
  }

  async fn delete(&self, kind: EntityKind, id: &str) -> Result<()> {
    self.require(kind, Action::Delete)?;
    self.api.delete(kind, id).await?;
    println!("Deleted {kind} {id}");
    Ok(())
  }

  async fn upload(&self, kind: EntityKind, id: &str, file: &Path, field: String) -> Result<()> {
    self.require(kind, Action::Update)?;
    let bytes = tokio::fs::read(file)
      .await
      .with_context(|| format!("failed to read {}", file.display()))?;
    let file_name = file
      .file_name()
      .map(|n| n.to_string_lossy().into_owned())
      .unwrap_or_else(|| "upload".to_string());
    let mime = match file.extension().and_then(|e| e.to_str()) {
      Some("pdf") => Some("application/pdf".to_string()),
      Some("png") => Some("image/png".to_string()),
      Some("jpg" | "jpeg") => Some("image/jpeg".to_string()),
      _ => None,
    };
    let body = self
      .api
      .upload(kind, id, Upload { field, file_name, mime, bytes })
      .await?;
    println!("{}", serde_json::to_string_pretty(&body)?);
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use clap::CommandFactory;

  use super::*;

  #[test]
  fn cli_definition_is_valid() { Cli::command().debug_assert(); }

  #[test]
  fn list_parses_module_and_page() {
    let cli = Cli::try_parse_from(["sics", "list", "notasMedicas", "--page", "3"]).unwrap();
    let Command::List { entity, query, page } = cli.command else {
      panic!("expected list");
    };
    assert_eq!(entity, EntityKind::MedicalNote);
    assert_eq!(query, "");
    assert_eq!(page, 3);
  }

  #[test]
  fn only_session_commands_invalidate_on_unauthorized() {
    let login = Cli::try_parse_from(["sics", "login", "-u", "mlopez", "-p", "x"]).unwrap();
    let list = Cli::try_parse_from(["sics", "list", "afiliados"]).unwrap();
    assert!(!login.command.uses_session());
    assert!(list.command.uses_session());

    let unauthorized = anyhow::Error::from(sics_client::Error::Status {
      status:  401,
      message: "Credenciales inválidas".into(),
    });
    assert!(is_rejected(&unauthorized));
    assert!(is_rejected(&unauthorized.context("login rejected")));

    let server_error = anyhow::Error::from(sics_client::Error::Status {
      status:  500,
      message: "boom".into(),
    });
    assert!(!is_rejected(&server_error));
    assert!(!is_rejected(&anyhow::anyhow!("not signed in")));
  }

  #[test]
  fn unknown_action_is_rejected() {
    assert!(Cli::try_parse_from(["sics", "can", "afiliados", "borrar"]).is_err());
  }

  #[test]
  fn tilde_expands_to_home() {
    let Ok(home) = std::env::var("HOME") else { return };
    assert_eq!(
      expand_tilde(Path::new("~/.local/share/sics/session.json")),
      PathBuf::from(home).join(".local/share/sics/session.json")
    );
    assert_eq!(expand_tilde(Path::new("/tmp/s.json")), PathBuf::from("/tmp/s.json"));
  }
}
