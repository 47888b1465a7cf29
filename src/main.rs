//! CLI driver: run the engine against a captured page fixture.
//!
//! Useful for exercising scans and plans without a live browser; the
//! fixture format mirrors what a DOM capture produces.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use formpilot::flow::{FillEngine, FillEvent, FlowPolicy};
use formpilot::page::{MemoryPage, PageFixture};
use formpilot::FillPlanItem;

#[derive(Parser)]
#[command(name = "formpilot", about = "Form fill engine over captured page fixtures")]
struct Cli {
    /// Policy file (YAML); defaults apply when omitted.
    #[arg(long, global = true)]
    policy: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Scan a page fixture and print the field descriptors as JSON.
    Scan {
        #[arg(long)]
        page: PathBuf,
    },
    /// Execute a fill plan against a page fixture, printing every event.
    Fill {
        #[arg(long)]
        page: PathBuf,
        #[arg(long)]
        plan: PathBuf,
    },
    /// Probe the fixture for CAPTCHA widgets.
    DetectCaptcha {
        #[arg(long)]
        page: PathBuf,
    },
}

fn load_page(path: &Path) -> Result<Arc<MemoryPage>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading page fixture {}", path.display()))?;
    let fixture: PageFixture =
        serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))?;
    let page = MemoryPage::from_fixture(&fixture)
        .with_context(|| format!("building page from {}", path.display()))?;
    Ok(Arc::new(page))
}

fn load_policy(path: Option<&Path>) -> Result<FlowPolicy> {
    match path {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("reading policy {}", path.display()))?;
            Ok(FlowPolicy::from_yaml(&text)?)
        }
        None => Ok(FlowPolicy::default()),
    }
}

fn print_event(event: &FillEvent) {
    match serde_json::to_string(event) {
        Ok(line) => println!("{line}"),
        Err(e) => eprintln!("unprintable event: {e}"),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .init();

    let cli = Cli::parse();
    let policy = load_policy(cli.policy.as_deref())?;

    match cli.command {
        Command::Scan { page } => {
            let page = load_page(&page)?;
            let tempo = Arc::new(policy.tempo.to_tempo());
            let engine = FillEngine::new(page, tempo, policy);
            let fields = engine.scan_page().await?;
            println!("{}", serde_json::to_string_pretty(&fields)?);
        }
        Command::Fill { page, plan } => {
            let page = load_page(&page)?;
            let plan_text = std::fs::read_to_string(&plan)
                .with_context(|| format!("reading plan {}", plan.display()))?;
            let plan: Vec<FillPlanItem> = serde_json::from_str(&plan_text)?;

            let tempo = Arc::new(policy.tempo.to_tempo());
            let engine = Arc::new(FillEngine::new(page, tempo, policy));
            let mut events = engine.subscribe();

            let fields = engine.scan_page().await?;
            engine.start_filling(plan, fields).await?;
            while let Ok(event) = events.try_recv() {
                print_event(&event);
            }
        }
        Command::DetectCaptcha { page } => {
            let page = load_page(&page)?;
            let tempo = Arc::new(policy.tempo.to_tempo());
            let engine = FillEngine::new(page, tempo, policy);
            println!("{}", engine.detect_captcha().await?);
        }
    }
    Ok(())
}
