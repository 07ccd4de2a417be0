//! Shared entity command infrastructure
//!
//! Every command starts from a [`Context`]: configuration, the saved session
//! and an HTTP backend carrying the session's token. The helpers here turn
//! library errors into diagnostics so command handlers stay short.

use console::style;
use miette::{IntoDiagnostic, Report, Result};
use std::io::Write;
use tracing::warn;

use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::api::{ApiError, HttpBackend};
use crate::core::editor::{Confirmed, EditorError};
use crate::core::notice::{Level, Notice};
use crate::core::session::{Session, SessionError, SessionStore, View};
use crate::core::Config;
use crate::entities::UserProfile;

// =========================================================================
// Command context
// =========================================================================

pub struct Context {
    pub config: Config,
    pub store: SessionStore,
    pub session: Session,
    pub format: OutputFormat,
}

impl Context {
    /// Load configuration and hydrate the saved session
    pub fn load(global: &GlobalOpts) -> Result<Self> {
        let config = Config::load()
            .map_err(|e| miette::miette!("{}", e))?
            .with_api_url(global.api_url.as_deref());
        let store = SessionStore::new(config.home());
        let session = match Session::hydrate(&store) {
            Ok(session) => session,
            // An unreadable profile must not lock the user out of login/logout
            Err(SessionError::Corrupt(e)) => {
                warn!("ignoring unreadable saved session: {}", e);
                Session::default()
            }
            Err(e) => return Err(session_error(e)),
        };

        Ok(Self {
            config,
            store,
            session,
            format: global.format,
        })
    }

    /// Backend client authenticated as the current session
    pub fn backend(&self) -> Result<HttpBackend> {
        HttpBackend::new(&self.config)
            .map(|b| b.with_token(self.session.token().map(str::to_string)))
            .map_err(api_error)
    }

    /// Require the signed-in user to have access to `view`
    pub fn authorize(&self, view: View) -> Result<&UserProfile> {
        self.session.authorize(view).map_err(session_error)
    }

    /// Require `ROLE_ADMIN` for an admin-only action
    pub fn require_admin(&self, action: &str) -> Result<()> {
        if self.session.is_admin() {
            Ok(())
        } else {
            Err(miette::miette!(
                help = "Ask an administrator to perform this action",
                "Only administrators can {}",
                action
            ))
        }
    }
}

// =========================================================================
// Error conversion
// =========================================================================

/// Turn a failed request into a diagnostic carrying the user notice
pub fn api_error(err: ApiError) -> Report {
    let notice = Notice::from_api_error(&err);
    let message = notice.messages.join("\n");
    if notice.login_hint {
        miette::miette!(help = "Run `drx login` to sign in again", "{}", message)
    } else {
        miette::miette!("{}", message)
    }
}

pub fn session_error(err: SessionError) -> Report {
    match err {
        SessionError::NotLoggedIn => {
            miette::miette!(help = "Run `drx login` or `drx register` first", "Not logged in")
        }
        other => miette::miette!("{}", other),
    }
}

pub fn editor_error(err: EditorError) -> Report {
    match err {
        EditorError::Invalid(e) => miette::miette!("Invalid input: {}", e),
        EditorError::Api(e) => api_error(e),
    }
}

// =========================================================================
// Interaction
// =========================================================================

/// Ask for confirmation unless `--yes` was given
///
/// Returns `None` when the user declined.
pub fn confirm(prompt: &str, yes: bool) -> Result<Option<Confirmed>> {
    if yes {
        return Ok(Confirmed::from_answer(true));
    }
    print!("{} [y/N] ", prompt);
    std::io::stdout().flush().into_diagnostic()?;
    let mut input = String::new();
    std::io::stdin().read_line(&mut input).into_diagnostic()?;
    let answer = Confirmed::from_answer(input.trim().eq_ignore_ascii_case("y"));
    if answer.is_none() {
        println!("Aborted.");
    }
    Ok(answer)
}

/// Print a notice with a severity marker
pub fn print_notice(notice: &Notice) {
    for message in &notice.messages {
        match notice.level {
            Level::Success => println!("{} {}", style("✓").green(), message),
            Level::Info => println!("{} {}", style("•").cyan(), message),
            Level::Warning => eprintln!("{} {}", style("!").yellow(), message),
            Level::Error => eprintln!("{} {}", style("✗").red(), message),
        }
    }
    if notice.login_hint {
        eprintln!("   Run {} to sign in again", style("drx login").yellow());
    }
}
