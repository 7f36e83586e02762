//! Backend health check.

use serde::Serialize;

use cerberus_core::error::AppError;

use super::CommandContext;
use crate::output::{self, FieldRow, OutputFormat};

#[derive(Debug, Serialize)]
struct HealthReport {
    backend: &'static str,
}

/// Execute the health command
pub async fn execute(ctx: &CommandContext, format: OutputFormat) -> Result<(), AppError> {
    let healthy = ctx.service.health_check(ctx.deadline()).await?;
    let report = HealthReport {
        backend: if healthy { "up" } else { "down" },
    };

    output::print_record(&report, vec![FieldRow::new("backend", report.backend)], format);

    if healthy {
        Ok(())
    } else {
        Err(AppError::backend("Backend reported unhealthy"))
    }
}
