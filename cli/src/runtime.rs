use std::path::PathBuf;

use anyhow::{Context, Result};
use cloud_core::{ClientConfig, EndpointType, Verify};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::args::Cli;

pub fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "warn" };
    // A second init (tests) is harmless.
    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level)),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init();
}

pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("cloudctl").join("config.toml"))
}

/// File, then `CLOUD_*` environment, then command-line flags.
pub fn load_config(cli: &Cli) -> Result<ClientConfig> {
    let mut config = match &cli.config {
        Some(path) => ClientConfig::load(path)?,
        None => match default_config_path().filter(|path| path.is_file()) {
            Some(path) => {
                tracing::debug!(path = %path.display(), "loading config");
                ClientConfig::load(&path)?
            }
            None => ClientConfig::default(),
        },
    };
    config.apply_env()?;
    apply_flags(&mut config, cli)?;
    Ok(config)
}

pub fn apply_flags(config: &mut ClientConfig, cli: &Cli) -> Result<()> {
    if let Some(endpoint) = &cli.endpoint {
        config.endpoint = Some(endpoint.clone());
    }
    if let Some(token) = &cli.token {
        config.token = Some(token.clone());
    }
    if let Some(region) = &cli.region {
        config.region = Some(region.clone());
    }
    if let Some(kind) = &cli.endpoint_type {
        config.endpoint_type = kind
            .parse::<EndpointType>()
            .with_context(|| format!("--endpoint-type {kind}"))?;
    }
    if let Some(secs) = cli.timeout {
        config.timeout_secs = Some(secs);
    }
    if let Some(path) = &cli.cacert {
        config.verify = Verify::CaBundle(path.clone());
    }
    if cli.insecure {
        config.verify = Verify::Enabled(false);
    }
    if let Some(attempts) = cli.retries {
        config.retry.max_attempts = attempts;
    }
    if let Some(ms) = cli.retry_delay_ms {
        config.retry.delay_ms = ms;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn flags_override_file_values() {
        let mut config = ClientConfig::from_toml_str(
            "token = \"file\"\nverify = \"/etc/ca.pem\"\n[retry]\nmax_attempts = 2",
        )
        .unwrap();
        let cli = Cli::try_parse_from([
            "cloudctl",
            "--token",
            "flag",
            "--insecure",
            "--retries",
            "5",
            "--retry-delay-ms",
            "250",
            "--endpoint-type",
            "admin",
            "list",
            "networks",
        ])
        .unwrap();

        apply_flags(&mut config, &cli).unwrap();

        assert_eq!(config.token.as_deref(), Some("flag"));
        assert_eq!(config.verify, Verify::Enabled(false));
        assert_eq!(config.retry.max_attempts, 5);
        assert_eq!(config.retry.delay_ms, 250);
        assert_eq!(config.endpoint_type, EndpointType::Admin);
    }

    #[test]
    fn absent_flags_keep_file_values() {
        let mut config = ClientConfig::from_toml_str("token = \"file\"").unwrap();
        let cli = Cli::try_parse_from(["cloudctl", "list", "networks"]).unwrap();

        apply_flags(&mut config, &cli).unwrap();

        assert_eq!(config.token.as_deref(), Some("file"));
        assert_eq!(config.verify, Verify::Enabled(true));
    }

    #[test]
    fn bad_endpoint_type_flag_is_an_error() {
        let mut config = ClientConfig::default();
        let cli =
            Cli::try_parse_from(["cloudctl", "--endpoint-type", "private", "list", "networks"])
                .unwrap();
        assert!(apply_flags(&mut config, &cli).is_err());
    }
}
