// file: src/doctor.rs
// description: environment health checks for the sandbox root, local shells and the model server
// reference: health reporting via utils::telemetry

use crate::chat::ChatClient;
use crate::config::Config;
use crate::filesystem::Sandbox;
use crate::shell::{ShellExecutor, ShellKind};
use crate::utils::{HealthCheck, HealthReport, Validator};
use futures::future::join_all;
use std::time::Instant;

pub async fn run_checks(config: &Config) -> HealthReport {
    let mut checks = vec![check_base_dir(config)];
    checks.extend(check_shells(config).await);
    checks.push(check_model_server(config).await);

    HealthReport::new(checks, env!("CARGO_PKG_VERSION").to_string())
}

fn check_base_dir(config: &Config) -> HealthCheck {
    let start = Instant::now();
    let result = Validator::validate_directory(&config.filesystem.base_dir)
        .and_then(|_| Sandbox::new(&config.filesystem));

    match result {
        Ok(sandbox) if !sandbox.allows_write() || !sandbox.allows_delete() => HealthCheck::degraded(
            "base_dir",
            format!(
                "{} (write: {}, delete: {})",
                sandbox.base_dir().display(),
                sandbox.allows_write(),
                sandbox.allows_delete()
            ),
            start.elapsed(),
        ),
        Ok(_) => HealthCheck::healthy("base_dir", start.elapsed()),
        Err(e) => HealthCheck::unhealthy("base_dir", e.to_string(), start.elapsed()),
    }
}

/// A missing shell only degrades the report; the other tools keep working
async fn check_shells(config: &Config) -> Vec<HealthCheck> {
    let executor = ShellExecutor::new(&config.shell);

    join_all(ShellKind::ALL.into_iter().map(|kind| {
        let executor = &executor;
        async move {
            let start = Instant::now();
            let component = format!("shell:{}", kind.display_name());
            if executor.is_available(kind).await {
                HealthCheck::healthy(&component, start.elapsed())
            } else {
                HealthCheck::degraded(&component, "not available".to_string(), start.elapsed())
            }
        }
    }))
    .await
}

async fn check_model_server(config: &Config) -> HealthCheck {
    let start = Instant::now();
    let client = match ChatClient::new(config.chat.clone()) {
        Ok(client) => client,
        Err(e) => return HealthCheck::unhealthy("model_server", e.to_string(), start.elapsed()),
    };

    match client.list_models().await {
        Ok(models) if models.iter().any(|m| m == &config.chat.model) => {
            HealthCheck::healthy("model_server", start.elapsed())
        }
        Ok(models) => HealthCheck::degraded(
            "model_server",
            format!(
                "model {} not listed by {} (available: {})",
                config.chat.model,
                config.chat.base_url,
                models.join(", ")
            ),
            start.elapsed(),
        ),
        Err(e) => HealthCheck::unhealthy(
            "model_server",
            format!("{} unreachable: {}", config.chat.base_url, e),
            start.elapsed(),
        ),
    }
}
