//! # Ledger Node
//!
//! Hosts the trade ledger behind a command line. Each run performs one
//! invocation against the configured state store and exits.
//!
//! ```text
//! ledger-node --state-file ledger.state invoke init 0
//! ledger-node --state-file ledger.state invoke init_trade 2021-01-01 2021-01-02 buy 100 sec1 99.5 cpty1 alice corr1 0 0
//! ledger-node --state-file ledger.state query 2021-01-01
//! ledger-node --state-file ledger.state set-user 2021-01-01 bob
//! ledger-node --state-file ledger.state audit
//! ```

mod config;

use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use ledger_telemetry::{gather_text, init_telemetry, InvocationTimer};
use serde_json::json;
use tracing::{info, warn};
use trade_ledger::ipc::QUERY_FUNCTION;
use trade_ledger::prelude::*;

use crate::config::{NodeConfig, Overrides};

/// Trade ledger node
#[derive(Parser, Debug)]
#[command(name = "ledger-node")]
#[command(about = "Run one invocation against the trade ledger")]
struct Cli {
    /// Snapshot file for persistent state (default: in-memory, from TL_STATE_FILE)
    #[arg(long, global = true)]
    state_file: Option<PathBuf>,

    /// Log filter, e.g. `info` or `trade_ledger=debug`
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,

    /// Print Prometheus metrics to stdout before exiting
    #[arg(long, global = true)]
    metrics: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Invoke a ledger function with positional arguments
    Invoke {
        function: String,
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },
    /// Print the bytes stored under a key
    Query { key: String },
    /// Change the user of a stored trade
    SetUser { key: String, user: String },
    /// List indexed trades with their records
    List,
    /// Report index entries that do not resolve to a trade
    Audit,
}

impl Command {
    /// Label used for invocation metrics.
    fn metric_label(&self) -> &str {
        match self {
            Self::Invoke { function, .. } => function,
            Self::Query { .. } => "query",
            Self::SetUser { .. } => "set_user",
            Self::List => "list",
            Self::Audit => "audit",
        }
    }
}

impl Cli {
    fn overrides(&self) -> Overrides {
        Overrides {
            state_file: self.state_file.clone(),
            log_level: self.log_level.clone(),
            json_logs: self.json_logs,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = NodeConfig::from_env()
        .context("invalid ledger configuration")?
        .with_overrides(cli.overrides());
    let _telemetry = init_telemetry(&config.telemetry).context("failed to initialize telemetry")?;

    let result = match &config.storage.state_file {
        Some(path) => {
            let store = FileStateStore::open(path)
                .with_context(|| format!("failed to open state file {}", path.display()))?;
            run(Arc::new(store), &config, &cli.command)
        }
        None => {
            info!("No state file configured, state lives for this run only");
            run(Arc::new(InMemoryStateStore::new()), &config, &cli.command)
        }
    };

    if cli.metrics {
        print!("{}", gather_text().context("failed to encode metrics")?);
    }
    result
}

fn run<S: StateStore + 'static>(
    store: Arc<S>,
    config: &NodeConfig,
    command: &Command,
) -> anyhow::Result<()> {
    let ledger = TradeLedger::new(store, Arc::new(SystemClock), config.ledger.clone())?;
    let handler = InvocationHandler::new(Arc::new(ledger));

    let timer = InvocationTimer::start(command.metric_label());
    let outcome = execute(&handler, command, &mut io::stdout().lock());
    timer.finish(outcome.is_ok());
    outcome
}

fn execute<L: TradeLedgerApi>(
    handler: &InvocationHandler<L>,
    command: &Command,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    match command {
        Command::Invoke { function, args } => {
            if let Some(payload) = handler.invoke(function, args)? {
                out.write_all(&payload)?;
                writeln!(out)?;
            }
        }
        Command::Query { key } => match handler.query(QUERY_FUNCTION, std::slice::from_ref(key)) {
            Ok(bytes) => {
                out.write_all(&bytes)?;
                writeln!(out)?;
            }
            Err(err) => {
                out.write_all(&err.to_payload())?;
                writeln!(out)?;
                bail!(err);
            }
        },
        Command::SetUser { key, user } => {
            let record = handler.ledger().set_user(key, user)?;
            serde_json::to_writer_pretty(&mut *out, &record)?;
            writeln!(out)?;
        }
        Command::List => {
            let trades: Vec<_> = handler
                .ledger()
                .list_trades()?
                .into_iter()
                .map(|trade| json!({ "key": trade.key, "record": trade.record }))
                .collect();
            serde_json::to_writer_pretty(&mut *out, &trades)?;
            writeln!(out)?;
        }
        Command::Audit => {
            let audit = handler.ledger().audit_index()?;
            if !audit.is_consistent() {
                warn!(dangling = audit.dangling.len(), "Index audit found unresolved entries");
            }
            serde_json::to_writer_pretty(&mut *out, &audit)?;
            writeln!(out)?;
        }
    }
    Ok(())
}
