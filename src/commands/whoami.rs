//! `tasktree whoami` command.

use std::fmt::Write as _;

use crate::context::ServiceContext;
use crate::view::TableSession;

/// Execute the `whoami` command.
///
/// # Errors
///
/// Returns an error string if the user cannot be fetched.
pub async fn run(ctx: &ServiceContext, out: &mut String) -> Result<(), String> {
    let session = TableSession::new(ctx.api(), None);
    let user = session.current_user().await.map_err(|e| e.to_string())?;
    if user.name.is_empty() {
        let _ = writeln!(out, "{} (#{})", user.username, user.id);
    } else {
        let _ = writeln!(out, "{} <{}> (#{})", user.name, user.username, user.id);
    }
    let _ = writeln!(out, "Language: {}", user.language().unwrap_or("default"));
    Ok(())
}
