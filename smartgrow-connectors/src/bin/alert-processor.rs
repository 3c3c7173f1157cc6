use std::fs::File;
use std::io::{self, Read};
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use log::{info, warn};

use smartgrow_connectors::{MemoryNotifier, MemoryTable};
use smartgrow_core::config::{ALERTS_TOPIC_VAR, TABLE_NAME_VAR};
use smartgrow_core::{ChangeBatch, Notifier, ProcessorConfig, StreamDispatcher};

/// Evaluate a batch of table change records and publish threshold alerts.
#[derive(Debug, Parser)]
#[clap(rename_all = "kebab-case", version)]
struct Args {
    #[clap(long, default_value = "info", env = "RUST_LOG")]
    log: String,

    /// Path to the change batch JSON. Defaults to '-', which represents stdin.
    #[clap(long, default_value = "-")]
    events: String,

    /// JSON array of plain table items to serve lookups from.
    #[clap(long)]
    table_fixture: Option<String>,

    /// Webhook receiving alerts. When absent, alerts are only logged.
    #[clap(long)]
    notify_url: Option<String>,

    /// Bearer token sent to the webhook.
    #[clap(long, env = "NOTIFY_TOKEN", hide_env_values = true)]
    notify_token: Option<String>,

    #[clap(long, env = TABLE_NAME_VAR)]
    table_name: String,

    #[clap(long, env = ALERTS_TOPIC_VAR)]
    alerts_topic: Option<String>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    env_logger::Builder::new().parse_filters(&args.log).init();

    let config = ProcessorConfig::from_lookup(|name| match name {
        TABLE_NAME_VAR => Some(args.table_name.clone()),
        ALERTS_TOPIC_VAR => args.alerts_topic.clone(),
        _ => None,
    })?;
    if !config.publishing_enabled() {
        warn!("{} is not set; alerts will be evaluated but not published", ALERTS_TOPIC_VAR);
    }

    let table = MemoryTable::new(&config.table_name);
    if let Some(path) = &args.table_fixture {
        let count = table
            .load_fixture(path)
            .with_context(|| format!("failed to load table fixture {}", path))?;
        info!("Loaded {} items into table {}", count, config.table_name);
    }

    let notifier = build_notifier(&args)?;
    let batch = read_batch(&args.events)?;

    let dispatcher = StreamDispatcher::new(config, table, notifier);
    let summary = dispatcher.handle_batch(&batch).await;

    serde_json::to_writer_pretty(io::stdout(), &summary).context("failed to write summary")?;
    println!();
    Ok(())
}

fn read_batch(path: &str) -> anyhow::Result<ChangeBatch> {
    let mut text = String::new();
    if path == "-" {
        io::stdin()
            .read_to_string(&mut text)
            .context("failed to read change batch from stdin")?;
    } else {
        File::open(path)
            .and_then(|mut file| file.read_to_string(&mut text))
            .with_context(|| format!("failed to read change batch {}", path))?;
    }
    serde_json::from_str(&text).context("change batch is not valid JSON")
}

#[cfg(feature = "http")]
fn build_notifier(args: &Args) -> anyhow::Result<Arc<dyn Notifier>> {
    use smartgrow_connectors::{HttpConfig, HttpNotifier};

    let Some(url) = &args.notify_url else {
        return Ok(Arc::new(MemoryNotifier::new()));
    };
    let mut config = HttpConfig::new(url.as_str());
    if let Some(token) = &args.notify_token {
        config = config.bearer_token(token.as_str());
    }
    let notifier = HttpNotifier::new(config).context("invalid --notify-url")?;
    Ok(Arc::new(notifier))
}

#[cfg(not(feature = "http"))]
fn build_notifier(args: &Args) -> anyhow::Result<Arc<dyn Notifier>> {
    if args.notify_url.is_some() || args.notify_token.is_some() {
        anyhow::bail!("--notify-url requires the `http` feature");
    }
    Ok(Arc::new(MemoryNotifier::new()))
}
