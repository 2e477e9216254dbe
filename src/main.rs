use clap::Parser;
use form_snapshot::cli::commands::{cmd_clear, cmd_delete, cmd_export, cmd_fill, cmd_list, cmd_save, cmd_sites};
use form_snapshot::cli::config::{Cli, Commands, load_config};
use form_snapshot::store::site_record::SnapshotRef;
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = load_config(cli.config.as_deref());
    let store_path = config.store_path(cli.store.as_deref()).to_path_buf();
    let require_whitelist = cli.require_whitelist || config.require_whitelist;

    match cli.command {
        Commands::Save {
            dom,
            host,
            name,
            form,
            fallback_keys,
            document_passwords,
        } => {
            let capture = config.capture_options(fallback_keys, document_passwords);
            cmd_save(&dom, &host, &name, form, &store_path, capture, require_whitelist)?;
        }
        Commands::Fill {
            dom,
            host,
            name,
            timestamp,
            out,
            max_attempts,
            retry_interval_ms,
        } => {
            let which = match (name, timestamp) {
                (Some(name), _) => SnapshotRef::Name(name),
                (None, Some(ts)) => SnapshotRef::Timestamp(ts),
                (None, None) => return Err("either --name or --timestamp is required".into()),
            };
            let fill = config.fill_config(max_attempts, retry_interval_ms);
            cmd_fill(&dom, &host, which, out.as_deref(), &store_path, fill, require_whitelist)?;
        }
        Commands::List { host } => cmd_list(host.as_deref(), &store_path)?,
        Commands::Delete { host, timestamp } => {
            if !cmd_delete(&host, timestamp, &store_path)? {
                std::process::exit(1);
            }
        }
        Commands::Clear => {
            cmd_clear(&store_path)?;
        }
        Commands::Sites { action } => cmd_sites(&action, &store_path)?,
        Commands::Export { output } => cmd_export(&output, &store_path)?,
    }

    Ok(())
}

/// `RUST_LOG` wins; otherwise each `-v` raises the level one step from warn.
fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
