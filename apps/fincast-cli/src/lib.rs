//! Shared start-up for the fincast binaries.

use std::path::{Path, PathBuf};

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use fincast_core::config::{resolve_with_base, Config, Settings};

/// Installs a stderr subscriber filtered by `RUST_LOG` (default `info`).
pub fn init_tracing() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info,lance=warn,lancedb=warn".into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

pub fn load_settings() -> anyhow::Result<Settings> {
    let config = Config::load().map_err(|e| { eprintln!("Error loading config: {:#}", e); e })?;
    config.settings()
}

/// Value following a flag, or exit with a usage error.
pub fn flag_value(args: &[String], i: usize, flag: &str) -> String {
    match args.get(i + 1) {
        Some(v) if !v.starts_with("--") => v.clone(),
        _ => { eprintln!("Error: {} requires a value", flag); std::process::exit(2); }
    }
}

/// Path following a flag, expanded and resolved against `base` when relative.
pub fn flag_path(args: &[String], i: usize, flag: &str, base: &Path) -> PathBuf {
    resolve_with_base(base, flag_value(args, i, flag))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_flag_paths_resolve_against_the_base() {
        let args: Vec<String> = ["--reports", "docs/Reports", "--index", "/var/idx"].iter().map(|s| s.to_string()).collect();
        let base = Path::new("/work");
        assert_eq!(flag_path(&args, 0, "--reports", base), PathBuf::from("/work/docs/Reports"));
        assert_eq!(flag_path(&args, 2, "--index", base), PathBuf::from("/var/idx"));
    }
}
