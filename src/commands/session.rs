//! Session lifecycle CLI commands.

use clap::{Args, Subcommand};
use serde::Serialize;

use cerberus_auth::TokenPair;
use cerberus_core::error::AppError;
use cerberus_core::types::UserId;

use super::CommandContext;
use crate::output::{self, FieldRow, OutputFormat};

/// Arguments for session commands
#[derive(Debug, Args)]
pub struct SessionArgs {
    /// Session subcommand
    #[command(subcommand)]
    pub command: SessionCommand,
}

/// Session subcommands
#[derive(Debug, Subcommand)]
pub enum SessionCommand {
    /// Start a session for a user, replacing any existing one
    Issue {
        /// User ID
        user_id: String,
    },
    /// Check whether an access token is the user's live one
    Validate {
        /// User ID
        user_id: String,
        /// Access token
        token: String,
    },
    /// Exchange a refresh token for a new pair
    Refresh {
        /// User ID
        user_id: String,
        /// Refresh token
        refresh_token: String,
    },
    /// End a user's session, reporting slots that could not be deleted
    Logout {
        /// User ID
        user_id: String,
    },
    /// End a user's session, failing on any backend error
    Revoke {
        /// User ID
        user_id: String,
    },
}

#[derive(Debug, Serialize)]
struct ValidationResult<'a> {
    user_id: &'a str,
    active: bool,
}

#[derive(Debug, Serialize)]
struct LogoutResult<'a> {
    user_id: &'a str,
    failed_slots: Vec<String>,
}

fn pair_rows(user_id: &UserId, pair: &TokenPair) -> Vec<FieldRow> {
    vec![
        FieldRow::new("user_id", user_id),
        FieldRow::new("access_token", &pair.access_token),
        FieldRow::new("access_expires_at", pair.access_expires_at.to_rfc3339()),
        FieldRow::new("refresh_token", &pair.refresh_token),
        FieldRow::new("refresh_expires_at", pair.refresh_expires_at.to_rfc3339()),
    ]
}

/// Execute session commands
pub async fn execute(
    args: &SessionArgs,
    ctx: &CommandContext,
    format: OutputFormat,
) -> Result<(), AppError> {
    let service = &ctx.service;

    match &args.command {
        SessionCommand::Issue { user_id } => {
            let user_id = UserId::new(user_id.as_str())?;
            let pair = service.login(&user_id, ctx.deadline()).await?;
            output::print_record(&pair, pair_rows(&user_id, &pair), format);
        }
        SessionCommand::Validate { user_id, token } => {
            let id = UserId::new(user_id.as_str())?;
            let active = service.validate(&id, token, ctx.deadline()).await?;
            let result = ValidationResult {
                user_id: id.as_str(),
                active,
            };
            output::print_record(
                &result,
                vec![
                    FieldRow::new("user_id", &id),
                    FieldRow::new("active", active),
                ],
                format,
            );
        }
        SessionCommand::Refresh {
            user_id,
            refresh_token,
        } => {
            let user_id = UserId::new(user_id.as_str())?;
            let pair = service
                .refresh(&user_id, refresh_token, ctx.deadline())
                .await?;
            output::print_record(&pair, pair_rows(&user_id, &pair), format);
        }
        SessionCommand::Logout { user_id } => {
            let id = UserId::new(user_id.as_str())?;
            let outcome = service.logout(&id, ctx.deadline()).await;
            let result = LogoutResult {
                user_id: id.as_str(),
                failed_slots: outcome
                    .failures
                    .iter()
                    .map(|(kind, _)| kind.to_string())
                    .collect(),
            };

            match format {
                OutputFormat::Json => output::print_record(&result, Vec::new(), format),
                OutputFormat::Table if outcome.is_clean() => {
                    output::print_success(&format!("Session of '{id}' ended"));
                }
                OutputFormat::Table => {
                    for (kind, err) in &outcome.failures {
                        output::print_warning(&format!("Could not delete {kind} slot: {err}"));
                    }
                }
            }
        }
        SessionCommand::Revoke { user_id } => {
            let id = UserId::new(user_id.as_str())?;
            service.revoke(&id, ctx.deadline()).await?;
            if format == OutputFormat::Table {
                output::print_success(&format!("Session of '{id}' revoked"));
            } else {
                output::print_record(
                    &LogoutResult {
                        user_id: id.as_str(),
                        failed_slots: Vec::new(),
                    },
                    Vec::new(),
                    format,
                );
            }
        }
    }

    Ok(())
}
