//! aftercare: classify post-operative patient records against independent
//! clinical flows, one record at a time or a whole CSV batch.

mod table_io;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use tracing::warn;

use aftercare_ai::{OracleClient, OracleConfig};
use aftercare_batch::{
    DEFAULT_MAX_CONCURRENT, classify_all_flows, classify_batch, classify_one, to_logged,
};
use aftercare_core::{FieldRegistry, FlowRegistry, PatientRecord, logbook};

#[derive(Parser)]
#[command(name = "aftercare", version, about = "Post-operative risk triage")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List the registered assessment flows
    Flows,
    /// Classify one patient record from a JSON file
    Classify {
        /// Path to a JSON object mapping field ids to values
        record: PathBuf,
        /// Run only this flow instead of all flows
        #[arg(long)]
        flow: Option<String>,
        /// Append a label-keyed row to this local CSV log afterwards
        #[arg(long)]
        log_file: Option<PathBuf>,
    },
    /// Classify every row of a CSV file and write the result table
    Batch {
        /// Input CSV with one patient record per row
        input: PathBuf,
        /// Output CSV path
        #[arg(short, long)]
        output: PathBuf,
        /// Cap on simultaneous oracle calls
        #[arg(long, default_value_t = DEFAULT_MAX_CONCURRENT)]
        max_concurrent: usize,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let fields = FieldRegistry::builtin();
    let flows = FlowRegistry::builtin();

    match cli.command {
        Command::Flows => {
            for flow in flows.all() {
                println!("{}  {}", flow.id, flow.name);
            }
            Ok(())
        }
        Command::Classify {
            record,
            flow,
            log_file,
        } => run_classify(&fields, &flows, &record, flow.as_deref(), log_file.as_deref()).await,
        Command::Batch {
            input,
            output,
            max_concurrent,
        } => run_batch(&fields, &flows, &input, &output, max_concurrent).await,
    }
}

fn oracle_from_env() -> anyhow::Result<OracleClient> {
    let config = OracleConfig::from_env().context("loading oracle configuration")?;
    OracleClient::new(config).context("building oracle client")
}

fn load_record(path: &std::path::Path) -> anyhow::Result<PatientRecord> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    let value: serde_json::Value = serde_json::from_str(&raw)
        .with_context(|| format!("parsing {}", path.display()))?;
    let object = value
        .as_object()
        .context("record file must contain a JSON object")?;
    Ok(PatientRecord::from_json_object(object))
}

async fn run_classify(
    fields: &FieldRegistry,
    flows: &FlowRegistry,
    record_path: &std::path::Path,
    flow_id: Option<&str>,
    log_file: Option<&std::path::Path>,
) -> anyhow::Result<()> {
    let record = load_record(record_path)?;
    let oracle = oracle_from_env()?;
    let model = oracle.model().to_string();

    if let Some(flow_id) = flow_id {
        let Some(flow) = flows.get(flow_id) else {
            bail!(
                "unknown flow {flow_id}; available: {}",
                flows.ids().collect::<Vec<_>>().join(", ")
            );
        };
        let assessment = classify_one(&record, fields, flow, &oracle).await?;
        println!("{} ({})", flow.name, flow.id);
        println!("  ระดับความเสี่ยง: {}", assessment.tier);
        println!("  เหตุผล: {}", assessment.reason);
        println!("  คำแนะนำ: {}", assessment.recommendation);
        return Ok(());
    }

    let outcome = classify_all_flows(&record, fields, flows, Arc::new(oracle)).await?;
    for (flow_id, assessment) in &outcome.results {
        let name = flows.get(flow_id).map(|f| f.name.as_str()).unwrap_or(flow_id);
        println!("{name} ({flow_id})");
        println!("  ระดับความเสี่ยง: {}", assessment.tier);
        println!("  เหตุผล: {}", assessment.reason);
        println!("  คำแนะนำ: {}", assessment.recommendation);
    }
    for (flow_id, error) in &outcome.errors {
        eprintln!("{flow_id}: failed ({error})");
    }

    // Logging is best-effort: a classification the user already has must
    // never fail because the log write did.
    if let Some(path) = log_file {
        let logged = to_logged(&outcome, flows);
        let header = logbook::result_columns(fields, flows);
        let row =
            logbook::project_with_results(&record, fields, &logged, &model, chrono::Utc::now());
        if let Err(e) = table_io::append_log_row(path, &header, &row) {
            warn!(path = %path.display(), error = %e, "failed to append log row");
        }
    }

    Ok(())
}

async fn run_batch(
    fields: &FieldRegistry,
    flows: &FlowRegistry,
    input: &std::path::Path,
    output: &std::path::Path,
    max_concurrent: usize,
) -> anyhow::Result<()> {
    let table = table_io::read_csv(input)?;
    let rows = table.row_count();
    eprintln!("Classifying {rows} rows x {} flows...", flows.len());

    let oracle = oracle_from_env()?;
    let outcome = classify_batch(table, fields, flows, Arc::new(oracle), max_concurrent)
        .await
        .context("batch classification")?;

    table_io::write_csv(&outcome.table, output)?;
    eprintln!(
        "Wrote {} rows to {} ({} failed units)",
        outcome.table.row_count(),
        output.display(),
        outcome.failures.len()
    );
    for failure in &outcome.failures {
        eprintln!("  row {} / {}: {}", failure.row + 1, failure.flow_id, failure.error);
    }
    Ok(())
}
