//! otiflow CLI - OTI workflow tracker for the council IT pipeline.

use std::sync::Arc;

use anyhow::{anyhow, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use tokio::sync::Mutex;
use tracing::Level;

use otiflow_catalog::{
    BasicBlockCatalog, BasicTemplateStore, BlockCatalog, BlockIndex, NewBlock, NewTemplate,
    TemplateStore,
};
use otiflow_core::{
    BlockCategory, BlockId, BlockStatus, Oti, OtiId, OtiPriority, TemplateBlockRef, TemplateId,
};
use otiflow_engine::{is_overdue, progress_of, AdvanceRequest, WorkflowService};
use otiflow_storage::{JsonStorage, Storage};

#[derive(Parser)]
#[command(name = "otiflow")]
#[command(about = "OTI workflow tracker", long_about = None)]
struct Cli {
    /// Data directory
    #[arg(long, default_value = ".otiflow")]
    data_dir: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage the building block catalog
    #[command(subcommand)]
    Block(BlockCommands),
    /// Manage workflow templates
    #[command(subcommand)]
    Template(TemplateCommands),
    /// Manage OTIs
    #[command(subcommand)]
    Oti(OtiCommands),
    /// Drive a per-OTI workflow
    #[command(subcommand)]
    Workflow(WorkflowCommands),
}

#[derive(Subcommand)]
enum BlockCommands {
    /// Add a building block to the catalog
    Add {
        /// Block name
        name: String,
        /// Category (intake, assessment, procurement, security,
        /// implementation, testing, deployment, review)
        #[arg(long)]
        category: String,
        /// Responsible team
        #[arg(long)]
        team: String,
        /// Estimated business days
        #[arg(long)]
        days: u32,
        /// Checklist item (repeatable)
        #[arg(long = "check")]
        checklist: Vec<String>,
    },
    /// List active blocks
    List {
        /// Filter by category
        #[arg(long)]
        category: Option<String>,
    },
    /// Archive a block (soft delete)
    Archive {
        /// Block ID
        id: String,
    },
}

#[derive(Subcommand)]
enum TemplateCommands {
    /// Create a template from an ordered list of blocks
    Create {
        /// Template name
        name: String,
        /// Block reference, `<block-id>` or `<block-id>:<days>` to
        /// override the duration (repeatable, in execution order)
        #[arg(long = "block", required = true)]
        blocks: Vec<String>,
    },
    /// List active templates
    List,
    /// Archive a template
    Archive {
        /// Template ID
        id: String,
    },
}

#[derive(Subcommand)]
enum OtiCommands {
    /// Register a new OTI
    Add {
        /// Initiative title
        title: String,
        /// Target completion date (YYYY-MM-DD)
        #[arg(long)]
        target: Option<String>,
        /// Priority (low, medium, high, critical)
        #[arg(long, default_value = "medium")]
        priority: String,
    },
    /// List OTIs
    List,
    /// Show one OTI with its workflow
    Show {
        /// OTI ID
        id: String,
    },
}

#[derive(Subcommand)]
enum WorkflowCommands {
    /// Instantiate a template as the OTI's workflow
    Start {
        /// OTI ID
        oti: String,
        /// Template ID
        template: String,
        /// Replace an existing workflow, discarding its progress
        #[arg(long)]
        force: bool,
    },
    /// Move a block to a new status
    Advance {
        /// OTI ID
        oti: String,
        /// Block sequence number
        sequence: u32,
        /// New status (not-started, in-progress, completed)
        status: String,
        /// Assign the block while transitioning
        #[arg(long)]
        assign: Option<String>,
        /// Attach working notes
        #[arg(long)]
        notes: Option<String>,
        /// Override the sequential-execution guard
        #[arg(long)]
        force: bool,
    },
    /// Toggle a checklist item on a block
    Check {
        /// OTI ID
        oti: String,
        /// Block sequence number
        sequence: u32,
        /// 0-based checklist item index
        item: usize,
        /// Un-check instead of checking
        #[arg(long)]
        undo: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(Level::WARN)
        .init();

    let cli = Cli::parse();

    let storage = JsonStorage::new(&cli.data_dir).await?;
    let storage = Arc::new(Mutex::new(storage));
    let catalog = BasicBlockCatalog::new(storage.clone());
    let templates = BasicTemplateStore::new(storage.clone());
    let workflows = WorkflowService::new(storage.clone());

    match cli.command {
        Commands::Block(cmd) => run_block(cmd, &catalog).await?,
        Commands::Template(cmd) => run_template(cmd, &templates).await?,
        Commands::Oti(cmd) => run_oti(cmd, &storage).await?,
        Commands::Workflow(cmd) => run_workflow(cmd, &workflows).await?,
    }

    Ok(())
}

async fn run_block(cmd: BlockCommands, catalog: &impl BlockCatalog) -> Result<()> {
    match cmd {
        BlockCommands::Add {
            name,
            category,
            team,
            days,
            checklist,
        } => {
            let category: BlockCategory = category.parse().map_err(|e: String| anyhow!(e))?;
            let mut spec = NewBlock::new(name, category, team, days);
            spec.checklist_items = checklist;
            let block = catalog.create(spec).await?;
            println!("Added block: {} - {}", block.id, block.name);
        }
        BlockCommands::List { category } => {
            let category = category
                .map(|c| c.parse::<BlockCategory>())
                .transpose()
                .map_err(|e| anyhow!(e))?;
            let blocks = catalog.list_active(category).await?;

            println!("Blocks ({})", blocks.len());
            for block in blocks {
                println!(
                    "  {} | {} | {} | {}d | {}",
                    block.id, block.category, block.responsible_team, block.estimated_days,
                    block.name,
                );
            }
        }
        BlockCommands::Archive { id } => {
            let id: BlockId = id.parse()?;
            let receipt = catalog.archive(id).await?;
            println!("Archived block: {}", receipt.block.id);
            if receipt.in_use {
                println!(
                    "  note: {} template(s) still reference this block; existing references stay valid",
                    receipt.block.usage_count
                );
            }
        }
    }
    Ok(())
}

async fn run_template(cmd: TemplateCommands, templates: &impl TemplateStore) -> Result<()> {
    match cmd {
        TemplateCommands::Create { name, blocks } => {
            let refs = blocks
                .iter()
                .map(|s| parse_block_ref(s))
                .collect::<Result<Vec<_>>>()?;
            let template = templates.create(NewTemplate::new(name, refs)).await?;
            println!(
                "Created template: {} - {} ({} blocks, est. {} business days)",
                template.id,
                template.name,
                template.blocks.len(),
                template.estimated_total_days,
            );
        }
        TemplateCommands::List => {
            let all = templates.list_active().await?;
            println!("Templates ({})", all.len());
            for t in all {
                println!(
                    "  {} | {} blocks | {}d | used {}x | {}",
                    t.id,
                    t.blocks.len(),
                    t.estimated_total_days,
                    t.usage_count,
                    t.name,
                );
            }
        }
        TemplateCommands::Archive { id } => {
            let id: TemplateId = id.parse()?;
            let template = templates.archive(id).await?;
            println!("Archived template: {}", template.id);
        }
    }
    Ok(())
}

async fn run_oti<S: Storage>(cmd: OtiCommands, storage: &Arc<Mutex<S>>) -> Result<()> {
    match cmd {
        OtiCommands::Add {
            title,
            target,
            priority,
        } => {
            let mut oti = Oti::new(title);
            oti.priority = priority.parse::<OtiPriority>().map_err(|e| anyhow!(e))?;
            oti.target_completion_date = target.map(|t| parse_date(&t)).transpose()?;

            let mut storage = storage.lock().await;
            let mut otis = storage.load_otis().await?;
            otis.push(oti.clone());
            storage.save_otis(&otis).await?;
            println!("Added OTI: {} - {}", oti.id, oti.title);
        }
        OtiCommands::List => {
            let storage = storage.lock().await;
            let otis = storage.load_otis().await?;
            let now = chrono::Utc::now();

            println!("OTIs ({})", otis.len());
            for oti in otis {
                let overdue = if is_overdue(&oti, now) { " OVERDUE" } else { "" };
                println!(
                    "  {} | {} | {}%{} | {}",
                    oti.id,
                    oti.status,
                    progress_of(&oti),
                    overdue,
                    oti.title,
                );
            }
        }
        OtiCommands::Show { id } => {
            let id: OtiId = id.parse()?;
            let storage = storage.lock().await;
            let otis = storage.load_otis().await?;
            let Some(oti) = otis.into_iter().find(|o| o.id == id) else {
                println!("OTI not found");
                return Ok(());
            };
            let index = BlockIndex::new(storage.load_blocks().await?);
            print_oti(&oti, &index);
        }
    }
    Ok(())
}

async fn run_workflow<S: Storage + 'static>(
    cmd: WorkflowCommands,
    workflows: &WorkflowService<S>,
) -> Result<()> {
    match cmd {
        WorkflowCommands::Start {
            oti,
            template,
            force,
        } => {
            let oti_id: OtiId = oti.parse()?;
            let template_id: TemplateId = template.parse()?;
            let oti = workflows.instantiate(oti_id, template_id, force).await?;
            if let Some(wf) = &oti.workflow {
                println!(
                    "Started workflow on {}: {} blocks, current block {}",
                    oti.id,
                    wf.blocks_total,
                    wf.current_block.unwrap_or(0),
                );
            }
        }
        WorkflowCommands::Advance {
            oti,
            sequence,
            status,
            assign,
            notes,
            force,
        } => {
            let oti_id: OtiId = oti.parse()?;
            let status: BlockStatus = status.parse().map_err(|e: String| anyhow!(e))?;
            let mut req = AdvanceRequest::new(sequence, status);
            req.assigned_to = assign;
            req.notes = notes;
            req.force = force;

            let oti = workflows.advance(oti_id, req).await?;
            println!(
                "Block {} -> {} | progress {}% | OTI status {}",
                sequence,
                status,
                progress_of(&oti),
                oti.status,
            );
        }
        WorkflowCommands::Check {
            oti,
            sequence,
            item,
            undo,
        } => {
            let oti_id: OtiId = oti.parse()?;
            let oti = workflows
                .set_checklist_item(oti_id, sequence, item, !undo)
                .await?;
            if let Some(block) = oti.workflow.as_ref().and_then(|wf| wf.block(sequence)) {
                println!(
                    "Block {} checklist: {}/{}",
                    sequence,
                    block.checklist.done(),
                    block.checklist.total,
                );
            }
        }
    }
    Ok(())
}

fn print_oti(oti: &Oti, index: &BlockIndex) {
    println!("OTI: {}", oti.id);
    println!("  Title: {}", oti.title);
    println!("  Status: {}", oti.status);
    println!("  Priority: {}", oti.priority);
    println!("  Progress: {}%", progress_of(oti));
    if let Some(target) = oti.target_completion_date {
        println!("  Target: {}", target.date_naive());
    }
    if let Some(actual) = oti.actual_completion_date {
        println!("  Completed: {}", actual.date_naive());
    }
    if is_overdue(oti, chrono::Utc::now()) {
        println!("  OVERDUE");
    }

    let Some(wf) = &oti.workflow else {
        println!("  No workflow started");
        return;
    };

    println!(
        "  Workflow: {}/{} blocks complete, current block {}",
        wf.blocks_completed,
        wf.blocks_total,
        wf.current_block
            .map_or_else(|| "-".to_string(), |s| s.to_string()),
    );
    for block in &wf.blocks {
        let name = index
            .get(block.block_id)
            .map_or("(unknown block)", |b| b.name.as_str());
        let assignee = block.assigned_to.as_deref().unwrap_or("-");
        println!(
            "    {}. [{}] {} | {}d est | {} | checklist {}/{}",
            block.sequence,
            block.status,
            name,
            block.estimated_days,
            assignee,
            block.checklist.done(),
            block.checklist.total,
        );
    }
}

fn parse_block_ref(s: &str) -> Result<TemplateBlockRef> {
    let (id, duration) = match s.split_once(':') {
        Some((id, days)) => (id, Some(days.parse::<u32>()?)),
        None => (s, None),
    };
    let mut r = TemplateBlockRef::new(id.parse::<BlockId>()?);
    r.custom_duration = duration;
    Ok(r)
}

fn parse_date(s: &str) -> Result<otiflow_core::Time> {
    let date = NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|_| anyhow!("expected date as YYYY-MM-DD, got {s}"))?;
    let end_of_day = date
        .and_hms_opt(23, 59, 59)
        .ok_or_else(|| anyhow!("invalid date: {s}"))?;
    Ok(end_of_day.and_utc())
}
