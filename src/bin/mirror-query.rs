use anyhow::Context;
use clap::Parser;
use comfy_table::Table;
use resource_mirror::aggregate::address_space_metrics;
use resource_mirror::{CacheConfig, ObjectRecord, QueryRequest, StoredObject};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Clone, Copy, Default, clap::ValueEnum)]
enum OutputFormat {
  #[default]
  Table,
  Json,
}

#[derive(Parser)]
#[command(
  name = "mirror-query",
  about = "Load an object snapshot into the cache and query it",
  version
)]
struct Args {
  /// JSON array of objects: kind, uid, namespace, name, spec, status
  #[arg(short, long, env = "RESOURCE_MIRROR_SNAPSHOT")]
  snapshot: String,
  #[arg(short, long)]
  config: Option<String>,
  #[arg(short, long, default_value = "AddressSpace")]
  kind: String,
  #[arg(short, long)]
  namespace: Option<String>,
  /// e.g. "`$.ObjectMeta.Name` = 'myspace'"
  #[arg(short, long)]
  filter: Option<String>,
  /// e.g. "`$.ObjectMeta.Name` DESC"
  #[arg(short, long)]
  order_by: Option<String>,
  #[arg(long)]
  offset: Option<usize>,
  #[arg(long)]
  limit: Option<usize>,
  /// Print relational counts for <namespace>/<addressspace> instead
  #[arg(long)]
  metrics: Option<String>,
  #[arg(long, value_enum, default_value = "table")]
  format: OutputFormat,
  #[arg(long)]
  log_level: Option<String>,
}

fn main() -> Result<(), anyhow::Error> {
  let args = Args::parse();

  // explicit path > auto-detect > defaults
  let mut config = if let Some(path) = &args.config {
    CacheConfig::from_file(path)?
  } else {
    CacheConfig::find_and_load()?.unwrap_or_default()
  };
  if let Some(level) = args.log_level.clone() {
    config.logging.level = level;
  }

  tracing_subscriber::registry()
    .with(
      tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| config.logging.level.clone().into()),
    )
    .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
    .init();

  let cache = config.build()?;

  let content = std::fs::read_to_string(&args.snapshot)
    .with_context(|| format!("reading snapshot {}", args.snapshot))?;
  let records: Vec<ObjectRecord> = serde_json::from_str(&content)
    .with_context(|| format!("parsing snapshot {}", args.snapshot))?;
  let count = records.len();
  cache.add(records.into_iter().map(StoredObject::from))?;
  tracing::info!("Loaded {} objects from {}", count, args.snapshot);

  if let Some(root) = &args.metrics {
    let (namespace, name) = root
      .split_once('/')
      .context("--metrics expects <namespace>/<addressspace>")?;
    let metrics = address_space_metrics(&cache, namespace, name)?;
    match args.format {
      OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&metrics)?),
      OutputFormat::Table => {
        let mut table = Table::new();
        table.set_header(vec!["METRIC", "VALUE"]);
        for metric in &metrics {
          table.add_row(vec![metric.name.clone(), metric.value.to_string()]);
        }
        println!("{table}");
      }
    }
    return Ok(());
  }

  let request = QueryRequest {
    kind: args.kind,
    namespace: args.namespace,
    filter: args.filter,
    order_by: args.order_by,
    offset: args.offset,
    limit: args.limit,
  };
  let result = cache.query(&request)?;

  match args.format {
    OutputFormat::Json => {
      let items: Vec<_> = result.items.iter().map(|o| o.attributes()).collect();
      println!(
        "{}",
        serde_json::to_string_pretty(&serde_json::json!({
          "total": result.total,
          "items": items,
        }))?
      );
    }
    OutputFormat::Table => {
      let mut table = Table::new();
      table.set_header(vec!["NAMESPACE", "NAME", "UID"]);
      for obj in &result.items {
        table.add_row(vec![
          obj.namespace().to_string(),
          obj.name().to_string(),
          obj.uid().to_string(),
        ]);
      }
      println!("{table}");
      println!("{} of {} matching {}", result.items.len(), result.total, request.kind);
    }
  }

  Ok(())
}
