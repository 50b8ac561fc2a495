use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use seedfork_core::guard;
use seedfork_core::io::session::{run_session, DrawKind, Session, Step};
use seedfork_core::RootSeed;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(
    name = "seedstep",
    about = "Batch runner for deterministic fork sessions"
)]
struct Args {
    /// Path to the session JSON document.
    #[arg(long, value_name = "PATH", conflicts_with_all = ["seed", "label"])]
    session: Option<PathBuf>,

    /// Root seed when constructing a session from CLI parameters. Numeric
    /// values are used as integers; anything else is a text seed.
    #[arg(long, value_name = "SEED")]
    seed: Option<String>,

    /// Owner name reported in diagnostics.
    #[arg(long, default_value = "seedstep")]
    owner: String,

    /// Fork labels to draw from when constructing from CLI parameters.
    #[arg(long = "label", value_name = "LABEL")]
    label: Vec<String>,

    /// Float draws per label when constructing from CLI parameters.
    #[arg(long, default_value_t = 3)]
    draws: u32,

    /// Checkpoint after the first pass and replay every fork once.
    #[arg(long)]
    replay: bool,

    /// Output NDJSON file path.
    #[arg(long)]
    out: PathBuf,

    /// Report ambient randomness used during the run.
    #[arg(long)]
    guard: bool,
}

fn parse_seed(raw: &str) -> RootSeed {
    match raw.parse::<i64>() {
        Ok(value) => RootSeed::Int(value),
        Err(_) => RootSeed::Text(raw.to_string()),
    }
}

fn build_session(args: &Args) -> Result<Session> {
    if let Some(path) = &args.session {
        return Session::load_from_path(path)
            .with_context(|| format!("failed to load session from {:?}", path));
    }

    anyhow::ensure!(
        !args.label.is_empty(),
        "--label is required when --session is not provided"
    );

    let draw_pass = |steps: &mut Vec<Step>| {
        for label in &args.label {
            steps.push(Step::Draw {
                label: label.clone(),
                kind: DrawKind::Float,
                count: args.draws,
            });
        }
    };

    let mut steps = Vec::new();
    draw_pass(&mut steps);
    if args.replay {
        steps.push(Step::Checkpoint);
        steps.push(Step::ReplayAll);
        draw_pass(&mut steps);
    }

    Ok(Session {
        owner: args.owner.clone(),
        seed: args.seed.as_deref().map(parse_seed).unwrap_or_default(),
        steps,
    })
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .init();

    let args = Args::parse();
    let session = build_session(&args)?;

    let handle = args.guard.then(|| {
        let handle = guard::install();
        handle.activate();
        handle
    });

    let records = run_session(&session)?;

    if let Some(handle) = handle {
        let drift = handle.drift_count();
        handle.restore();
        if drift > 0 {
            warn!(drift, "ambient randomness used during run");
        }
    }

    let file =
        File::create(&args.out).with_context(|| format!("failed to create {:?}", args.out))?;
    let mut writer = BufWriter::new(file);
    for record in &records {
        writer.write_all(record.to_ndjson()?.as_bytes())?;
    }
    writer.flush()?;

    info!(owner = %session.owner, steps = records.len(), out = ?args.out, "session complete");
    Ok(())
}
