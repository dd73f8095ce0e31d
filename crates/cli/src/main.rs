//! Cluster node report CLI
//!
//! Lists every node of a Kubernetes cluster grouped by how it was
//! provisioned (Karpenter, EKS nodegroups, Fargate), with usage, status and
//! taints sized to the terminal.

mod client;
mod config;
mod output;
mod source;

use anyhow::Result;
use clap::Parser;
use knodes_lib::{GroupingRequest, Report, ReportLogger, ReportOptions, SortKey};
use output::{OutputFormat, SortArg};
use source::SnapshotSource;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::time::Instant;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Cluster node report
#[derive(Parser)]
#[command(name = "knodes")]
#[command(author, version, about = "Kubernetes node report grouped by nodepool, labels or tags", long_about = None)]
pub struct Cli {
    /// Group nodes by one or more label keys
    #[arg(long = "group-by-label", short = 'l', value_name = "LABEL", num_args = 1..)]
    pub labels: Vec<String>,

    /// Group nodes by one or more instance tag keys
    #[arg(long = "group-by-tag", short = 't', value_name = "TAG", num_args = 1..)]
    pub tags: Vec<String>,

    /// Group nodes by nodepool (the default when no grouping is given)
    #[arg(long = "group-by-nodepool", short = 'p')]
    pub nodepool: bool,

    /// Show all nodes in one table, ignoring other grouping flags
    #[arg(long, short = 'a')]
    pub all: bool,

    /// Sort nodes within each group [default: cpu]
    #[arg(long, short = 's', value_enum)]
    pub sort: Option<SortArg>,

    /// Output format
    #[arg(long, short, default_value = "table")]
    pub format: OutputFormat,

    /// Path to kubeconfig file (uses default discovery if not specified)
    #[arg(long)]
    pub kubeconfig: Option<PathBuf>,

    /// Kubeconfig context to use
    #[arg(long)]
    pub context: Option<String>,

    /// Read nodes from saved `kubectl get nodes -o json` output instead of the cluster
    #[arg(long, value_name = "PATH")]
    pub nodes_file: Option<PathBuf>,

    /// Read usage from saved `kubectl top nodes` output
    #[arg(long, value_name = "PATH", requires = "nodes_file")]
    pub top_file: Option<PathBuf>,

    /// Enable verbose logging on stderr
    #[arg(long, short)]
    pub verbose: bool,
}

impl Cli {
    fn grouping(&self) -> GroupingRequest {
        GroupingRequest {
            labels: self.labels.clone(),
            tags: self.tags.clone(),
            by_nodepool: self.nodepool,
            show_all: self.all,
        }
    }

    fn source(&self, config: &config::Config) -> SnapshotSource {
        match &self.nodes_file {
            Some(nodes) => SnapshotSource::Files {
                nodes: nodes.clone(),
                top: self.top_file.clone(),
            },
            None => SnapshotSource::Cluster {
                kubeconfig: self.kubeconfig.clone(),
                context: self.context.clone().or_else(|| config.context.clone()),
            },
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = config::Config::load().unwrap_or_else(|e| {
        output::print_warning(&format!("Ignoring configuration: {e:#}"));
        config::Config::default()
    });

    let options = ReportOptions {
        grouping: cli.grouping(),
        sort: cli
            .sort
            .map(SortKey::from)
            .or_else(|| config.sort_key())
            .unwrap_or_default(),
    };

    let source = cli.source(&config);
    let logger = ReportLogger::new(source.describe());
    let started = Instant::now();

    let snapshot = source.load(&logger).await?;
    let report = Report::build(&snapshot, &options);

    let stdout = io::stdout().lock();
    match cli.format {
        OutputFormat::Table => {
            let probe = output::width_probe(config.width);
            let mut out = report.render(BufWriter::new(stdout), probe.as_ref())?;
            out.flush()?;
        }
        OutputFormat::Json => {
            let mut out = BufWriter::new(stdout);
            report.write_json(&mut out)?;
            writeln!(out)?;
            out.flush()?;
        }
    }

    logger.log_report(
        report.records().len(),
        report.topology(),
        started.elapsed().as_millis(),
    );

    Ok(())
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(io::stderr).with_target(false))
        .init();
}
