use anyhow::{bail, Context, Result};
use clap::builder::BoolishValueParser;
use clap::{ArgAction, Parser, Subcommand};
use ripe_sync::{
    BackupStore, Collaborators, DisabledBackupStore, Environment, FsBackupStore, FsTemplateStore,
    HttpRegistry, InventoryIpam, Reconciler, SandboxOverrides, SyncConfig, SyncError, SyncOutcome,
    TemplateStore, TracingNotifier, WebhookEvent,
};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tokio::io::AsyncReadExt;
use tracing::{error, info, Level};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// ripe-sync - keep RIPE inetnum/inet6num objects in line with IPAM prefix events
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Registry database to write to: RIPE or TEST
    #[arg(long, env = "RIPE_DB", default_value = "TEST")]
    ripe_db: String,

    /// Maintainer password with write permission on your objects
    #[arg(long, env = "RIPE_MNT_PASSWORD", hide_env_values = true)]
    mnt_password: Option<String>,

    /// Maintainer used in the TEST database
    #[arg(long, env = "RIPE_TEST_MNT", default_value = "TEST-DBM-MNT")]
    test_mnt: String,

    /// Organisation used in the TEST database
    #[arg(long, env = "RIPE_TEST_ORG", default_value = "ORG-EIPB1-TEST")]
    test_org: String,

    /// Person (admin-c, tech-c, abuse-c) used in the TEST database
    #[arg(long, env = "RIPE_TEST_PERSON", default_value = "AA1-TEST")]
    test_person: String,

    /// inetnum status used in the TEST database
    #[arg(long, env = "RIPE_TEST_STATUS_V4", default_value = "ALLOCATED PA")]
    test_status_v4: String,

    /// inet6num status used in the TEST database
    #[arg(long, env = "RIPE_TEST_STATUS_V6", default_value = "ALLOCATED PA")]
    test_status_v6: String,

    /// IPv4 prefixes longer than this are skipped
    #[arg(long, env = "SMALLEST_PREFIX_V4", default_value_t = 31)]
    smallest_prefix_v4: u8,

    /// IPv6 prefixes longer than this are skipped
    #[arg(long, env = "SMALLEST_PREFIX_V6", default_value_t = 127)]
    smallest_prefix_v6: u8,

    /// Directory holding templates.json, master templates and lir_org.json
    #[arg(long, env = "TEMPLATES_DIR", default_value = "/opt/ripeupdater/templates")]
    templates_dir: PathBuf,

    /// Country (ISO 3166 alpha-2) used when none can be derived from the site
    #[arg(long, env = "DEFAULT_COUNTRY")]
    default_country: Option<String>,

    /// Directory for object backups; backups are disabled when unset
    #[arg(long, env = "BACKUP_DIR")]
    backup_dir: Option<PathBuf>,

    /// IPAM inventory export (aggregates, prefixes, sites)
    #[arg(long, env = "IPAM_INVENTORY")]
    ipam_inventory: Option<PathBuf>,

    /// Enable verbose logging (DEBUG=yes|no)
    #[arg(long, env = "DEBUG", action = ArgAction::SetTrue, value_parser = BoolishValueParser::new())]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Reconcile one webhook event
    Apply {
        /// Webhook JSON file, or "-" for stdin
        #[arg(long, default_value = "-")]
        event: String,
    },
    /// List stored backups
    Backups,
    /// Print one stored backup
    Backup {
        /// Backup key as shown by `backups`
        key: String,
    },
}

impl Args {
    fn sync_config(&self) -> Result<SyncConfig> {
        let environment: Environment = self.ripe_db.parse()?;
        Ok(SyncConfig {
            environment,
            maintainer_password: self.mnt_password.clone(),
            sandbox: SandboxOverrides {
                org: self.test_org.clone(),
                maintainer: self.test_mnt.clone(),
                contact: self.test_person.clone(),
                status_v4: self.test_status_v4.clone(),
                status_v6: self.test_status_v6.clone(),
            },
            smallest_prefix_v4: self.smallest_prefix_v4,
            smallest_prefix_v6: self.smallest_prefix_v6,
            templates_dir: self.templates_dir.clone(),
            default_country: self.default_country.clone(),
            backup_dir: self.backup_dir.clone(),
            ipam_inventory: self.ipam_inventory.clone(),
        })
    }
}

fn init_logging(debug: bool) -> Result<()> {
    let level = if debug { Level::DEBUG } else { Level::INFO };

    if std::env::var_os("RUST_LOG").is_some() {
        let subscriber = FmtSubscriber::builder()
            .with_env_filter(EnvFilter::from_default_env())
            .finish();
        tracing::subscriber::set_global_default(subscriber)?;
    } else {
        let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
        tracing::subscriber::set_global_default(subscriber)?;
    }
    Ok(())
}

fn backup_store(config: &SyncConfig) -> Arc<dyn BackupStore> {
    match &config.backup_dir {
        Some(dir) => {
            info!(dir = %dir.display(), "Backups enabled");
            Arc::new(FsBackupStore::new(dir))
        }
        None => {
            info!("Backups disabled");
            Arc::new(DisabledBackupStore)
        }
    }
}

async fn read_event(source: &str) -> Result<Vec<u8>> {
    if source == "-" {
        let mut buf = Vec::new();
        tokio::io::stdin()
            .read_to_end(&mut buf)
            .await
            .context("reading event from stdin")?;
        Ok(buf)
    } else {
        tokio::fs::read(source)
            .await
            .with_context(|| format!("reading event from {}", source))
    }
}

async fn apply(config: SyncConfig, source: &str) -> Result<ExitCode> {
    let Some(inventory) = config.ipam_inventory.clone() else {
        bail!("IPAM_INVENTORY must be set to reconcile events");
    };

    let templates: Arc<dyn TemplateStore> = Arc::new(FsTemplateStore::new(&config.templates_dir));
    let ipam = InventoryIpam::load(&inventory, Arc::clone(&templates))
        .await
        .with_context(|| format!("loading IPAM inventory {}", inventory.display()))?;
    let transport = HttpRegistry::new(config.environment, config.maintainer_password.clone())?;

    let collaborators = Collaborators {
        transport: Arc::new(transport),
        ipam: Arc::new(ipam),
        backup: backup_store(&config),
        notifier: Arc::new(TracingNotifier),
        templates,
    };
    let reconciler = Reconciler::new(config, collaborators);

    let payload = read_event(source).await?;
    let result = match WebhookEvent::from_slice(&payload).and_then(|e| e.validate()) {
        Ok(event) => reconciler.handle(&event).await,
        Err(e) => Err(SyncError::from(e)),
    };

    match result {
        Ok(SyncOutcome::Skipped(reason)) => {
            println!("200 {}", reason);
            Ok(ExitCode::SUCCESS)
        }
        Ok(outcome @ SyncOutcome::Completed(_)) => {
            println!("{}", outcome.status_code());
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            error!(error = %e, "Reconciliation failed");
            println!("{} {}", e.status_code(), e);
            Ok(if e.status_code() == 400 {
                ExitCode::from(2)
            } else {
                ExitCode::FAILURE
            })
        }
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let args = Args::parse();
    init_logging(args.debug)?;

    let config = args.sync_config()?;
    info!(environment = %config.environment, "Starting ripe-sync");

    match &args.command {
        Command::Apply { event } => apply(config, event).await,
        Command::Backups => {
            for key in backup_store(&config).list().await? {
                println!("{}", key);
            }
            Ok(ExitCode::SUCCESS)
        }
        Command::Backup { key } => {
            let content = backup_store(&config).get(key).await?;
            println!("{}", String::from_utf8_lossy(&content));
            Ok(ExitCode::SUCCESS)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_args_definition() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_debug_accepts_yes_and_no() {
        std::env::set_var("DEBUG", "yes");
        let args = Args::try_parse_from(["ripe-sync", "backups"]).unwrap();
        assert!(args.debug);

        std::env::set_var("DEBUG", "no");
        let args = Args::try_parse_from(["ripe-sync", "backups"]).unwrap();
        assert!(!args.debug);

        std::env::remove_var("DEBUG");
        let args = Args::try_parse_from(["ripe-sync", "--debug", "backups"]).unwrap();
        assert!(args.debug);
        let args = Args::try_parse_from(["ripe-sync", "backups"]).unwrap();
        assert!(!args.debug);
    }
}
