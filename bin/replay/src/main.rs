#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

mod config;

use std::path::PathBuf;

use alloy_primitives::U256;
use anyhow::{Context, Result};
use clap::Parser;
use tabled::{settings::Style, Table, Tabled};
use tracing::{info, warn};

use seda_core::{
    fee_manager::PayoutLedger,
    input::ReplayInput,
    receipts::CallOutput,
    state::SedaCore,
    transactions::CoreTransaction,
};
use seda_logging::LogFormat;

use crate::config::Settings;

/// Replays a list of calls against a fresh SEDA core and prints what happened.
#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// The JSON file with the genesis configuration and the calls to replay.
    input: PathBuf,
    /// The format for logging. Overrides `SEDA_LOG_FORMAT`.
    #[arg(long)]
    log_format: Option<LogFormat>,
    /// The timeout period, in seconds. Overrides `SEDA_TIMEOUT_PERIOD` and the input.
    #[arg(long)]
    timeout_period: Option<u64>,
    /// The max batch age. Overrides `SEDA_MAX_BATCH_AGE` and the input.
    #[arg(long)]
    max_batch_age: Option<u64>,
    /// Stop at the first failing call.
    #[arg(long)]
    fail_fast: bool,
}

/// One row of the summary table.
#[derive(Tabled)]
struct CallRow {
    #[tabled(rename = "#")]
    index: usize,
    #[tabled(rename = "Call")]
    call: String,
    #[tabled(rename = "Caller")]
    caller: String,
    #[tabled(rename = "Outcome")]
    outcome: String,
    #[tabled(rename = "Events")]
    events: usize,
}

/// Returns a short name for a call.
fn call_name(tx: &CoreTransaction) -> &'static str {
    match tx {
        CoreTransaction::PostRequest(_) => "postRequest",
        CoreTransaction::PostResult(_) => "postResult",
        CoreTransaction::PostBatch(_) => "postBatch",
        CoreTransaction::IncreaseFees(_) => "increaseFees",
        CoreTransaction::WithdrawTimedOutRequest { .. } => "withdrawTimedOutRequest",
        CoreTransaction::WithdrawFees => "withdrawFees",
        CoreTransaction::SetTimeoutPeriod { .. } => "setTimeoutPeriod",
        CoreTransaction::Pause => "pause",
        CoreTransaction::Unpause => "unpause",
        CoreTransaction::PauseProver => "prover.pause",
        CoreTransaction::UnpauseProver => "prover.unpause",
        CoreTransaction::TransferOwnership { .. } => "transferOwnership",
        CoreTransaction::AcceptOwnership => "acceptOwnership",
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    let settings = Settings::new().context("failed to load settings")?;
    seda_logging::init(args.log_format.unwrap_or(settings.log_format));

    // Load the input.
    let json = std::fs::read_to_string(&args.input)
        .with_context(|| format!("failed to read {}", args.input.display()))?;
    let mut input = ReplayInput::from_json(&json).context("failed to parse replay input")?;
    if let Some(timeout_period) = args.timeout_period.or(settings.timeout_period) {
        input.config.timeout_period = timeout_period;
    }
    if let Some(max_batch_age) = args.max_batch_age.or(settings.max_batch_age) {
        input.config.max_batch_age = max_batch_age;
    }

    // Setup the core.
    let mut core = SedaCore::new(&input.config, &input.initial_batch)?;
    let mut sink = PayoutLedger::default();
    info!(
        owner = %input.config.owner,
        timeout_period = input.config.timeout_period,
        max_batch_age = input.config.max_batch_age,
        calls = input.calls.len(),
        "Replaying calls"
    );

    // Replay the calls.
    let mut rows = Vec::with_capacity(input.calls.len());
    let mut failures = 0usize;
    for (index, call) in input.calls.iter().enumerate() {
        let (outcome, events) = match core.execute(call, &mut sink) {
            Ok(receipt) => {
                let outcome = match receipt.output {
                    CallOutput::RequestId(id) => format!("request {id}"),
                    CallOutput::ResultId(id) => format!("result {id}"),
                    CallOutput::Withdrawn(amount) => format!("withdrawn {amount}"),
                    CallOutput::None => "ok".to_string(),
                };
                (outcome, receipt.events.len())
            }
            Err(err) => {
                warn!("call {index} failed: {err}");
                failures += 1;
                if args.fail_fast {
                    return Err(err).with_context(|| format!("call {index} failed"));
                }
                (format!("error: {err}"), 0)
            }
        };
        rows.push(CallRow {
            index,
            call: call_name(&call.tx).to_string(),
            caller: call.ctx.caller.to_string(),
            outcome,
            events,
        });
    }

    // Print the results.
    let mut table = Table::new(rows);
    table.with(Style::modern());
    println!("\nReplay Results:");
    println!("{table}\n");

    let escrowed = core.balance();
    let held = core.get_fee_manager().map_or(U256::ZERO, |fee_manager| fee_manager.held());
    println!("Last batch height: {}", core.prover().get_last_batch_height());
    println!("Pending requests:  {}", core.ledger().pending().len());
    println!("Escrowed:          {escrowed}");
    println!("Fee manager held:  {held}");
    println!("Paid out:          {}", sink.total_paid());
    println!("Failed calls:      {failures}");

    Ok(())
}
