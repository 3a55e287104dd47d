use anyhow::{Context, Result};
use chrono::Local;
use clap::{Args, Parser, Subcommand};
use rsvp_admin::config::DashboardConfig;
use rsvp_admin::domain::filter::FilterCriteria;
use rsvp_admin::domain::rsvp::{answer_text, Answer, RsvpId, RsvpPatch, UNASSIGNED_GROUP};
use rsvp_admin::domain::table::{SortColumn, SortSpec};
use rsvp_admin::repository::database::init_database;
use rsvp_admin::repository::group_names::{
    GroupNameStore, MemoryGroupNameStore, SqliteGroupNameStore,
};
use rsvp_admin::services::bulk::BulkOutcome;
use rsvp_admin::services::export_service::default_export_path;
use rsvp_admin::services::error_handling::{LogHelper, UserErrorFormatter};
use rsvp_admin::services::{CsvLayout, RsvpDashboard};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::warn;
use tracing_subscriber::EnvFilter;

/// Admin tools for the wedding RSVP list.
#[derive(Debug, Parser)]
#[command(name = "rsvp-admin", version, about)]
struct Cli {
    /// Config file to use instead of the default location.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(flatten)]
    filters: FilterArgs,

    /// Restrict the selection to these ids instead of every filtered record.
    #[arg(long = "select", global = true, value_name = "ID", num_args = 1..)]
    select: Vec<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Args)]
struct FilterArgs {
    /// Case-insensitive match on name or email.
    #[arg(long, global = true)]
    search: Option<String>,

    /// yes or no.
    #[arg(long, global = true)]
    attending: Option<Answer>,

    /// Bringing a guest: yes or no.
    #[arg(long, global = true)]
    guest: Option<Answer>,

    /// Case-insensitive match on food restrictions.
    #[arg(long, global = true)]
    food: Option<String>,

    /// Exact group; "Unassigned" matches records without one.
    #[arg(long, global = true)]
    group: Option<String>,
}

impl FilterArgs {
    fn criteria(&self) -> FilterCriteria {
        let mut criteria = FilterCriteria::new();
        if let Some(search) = &self.search {
            criteria = criteria.with_text(search.clone());
        }
        if let Some(answer) = self.attending {
            criteria = criteria.with_attending(answer);
        }
        if let Some(answer) = self.guest {
            criteria = criteria.with_bringing_guest(answer);
        }
        if let Some(food) = &self.food {
            criteria = criteria.with_food(food.clone());
        }
        if let Some(group) = &self.group {
            let group = if group.eq_ignore_ascii_case(UNASSIGNED_GROUP) {
                ""
            } else {
                group.as_str()
            };
            criteria = criteria.with_group(group);
        }
        criteria
    }
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Summary cards and per-group breakdown over every RSVP.
    Summary,
    /// Sorted, paginated table of the filtered RSVPs.
    List {
        #[arg(long, value_name = "COLUMN")]
        sort: Option<SortColumn>,
        #[arg(long, requires = "sort")]
        desc: bool,
        /// 1-based page number.
        #[arg(long, default_value_t = 1)]
        page: usize,
    },
    /// Write the filtered (or selected) RSVPs as CSV.
    Export {
        #[arg(long, value_name = "PATH")]
        out: Option<PathBuf>,
        /// Name and email only.
        #[arg(long)]
        contacts: bool,
    },
    /// Print selected emails, comma separated.
    Emails,
    /// Assign a group to every selected RSVP.
    AssignGroup { name: String },
    /// Delete RSVPs by id.
    Delete {
        #[arg(required = true)]
        ids: Vec<String>,
    },
    /// Change one field of one RSVP.
    Edit {
        id: String,
        #[arg(long)]
        field: String,
        #[arg(long)]
        value: String,
    },
    /// Show the seating plan, optionally moving guests and saving it.
    Seating {
        /// ID:TABLE pairs.
        #[arg(long = "move", value_name = "ID:TABLE", value_parser = parse_move)]
        moves: Vec<(String, u32)>,
        #[arg(long)]
        save: bool,
    },
}

fn parse_move(raw: &str) -> Result<(String, u32), String> {
    let (id, table) = raw
        .rsplit_once(':')
        .ok_or_else(|| format!("expected ID:TABLE, got '{raw}'"))?;
    let table = table
        .trim()
        .parse::<u32>()
        .map_err(|error| format!("invalid table in '{raw}': {error}"))?;
    Ok((id.trim().to_string(), table))
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match start(&cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            LogHelper::log_error_with_context("rsvp-admin", &error);
            eprintln!("{}", UserErrorFormatter::format_for_ui(&error));
            ExitCode::FAILURE
        }
    }
}

async fn start(cli: &Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => {
            let mut config = DashboardConfig::load_from(path)?;
            config.apply_overrides(|key| std::env::var(key).ok());
            config
        }
        None => DashboardConfig::load()?,
    };
    let store = config.record_store()?;

    let group_store: Arc<dyn GroupNameStore> = match init_database(&config.group_store_path).await
    {
        Ok(pool) => Arc::new(SqliteGroupNameStore::new(pool)),
        Err(error) => {
            LogHelper::log_error_with_context("group_store", &error);
            warn!("Custom group names will not persist this run");
            Arc::new(MemoryGroupNameStore::new())
        }
    };

    let dashboard = RsvpDashboard::new(Arc::new(store), group_store, config.dashboard_options());
    let result = if dashboard.load().await.is_ok() {
        dashboard.set_criteria(cli.filters.criteria());
        select(&dashboard, &cli.select);
        run(&dashboard, &config, cli).await
    } else {
        Ok(())
    };

    for notification in dashboard.take_notifications() {
        eprintln!("{notification}");
    }
    result
}

fn select(dashboard: &RsvpDashboard, ids: &[String]) {
    if ids.is_empty() {
        dashboard.select_all_visible();
        return;
    }
    let visible: Vec<RsvpId> = dashboard.filtered().into_iter().map(|r| r.id).collect();
    for id in ids.iter().map(|id| RsvpId::new(id.as_str())) {
        if visible.contains(&id) {
            dashboard.toggle_selection(&id);
        } else {
            warn!(rsvp_id = %id, "Ignoring selection of a record outside the filtered view");
        }
    }
}

async fn run(dashboard: &RsvpDashboard, config: &DashboardConfig, cli: &Cli) -> Result<()> {
    match &cli.command {
        Command::Summary => print_summary(dashboard),
        Command::List { sort, desc, page } => {
            dashboard.set_sort(sort.map(|column| {
                if *desc {
                    SortSpec::descending(column)
                } else {
                    SortSpec::ascending(column)
                }
            }));
            dashboard.set_page(page.saturating_sub(1));
            print_page(dashboard);
        }
        Command::Export { out, contacts } => {
            let layout = if *contacts {
                CsvLayout::ContactList
            } else {
                CsvLayout::Dashboard
            };
            let path = out.clone().unwrap_or_else(|| {
                default_export_path(&config.export_directory, Local::now().date_naive())
            });
            match dashboard
                .export_to_file(layout, !cli.select.is_empty(), &path)
                .await
            {
                Ok(rows) => println!("Wrote {rows} RSVPs to {}", path.display()),
                Err(error) => eprintln!("{}", UserErrorFormatter::format_dashboard_error(&error)),
            }
        }
        Command::Emails => println!("{}", dashboard.clipboard_text()),
        Command::AssignGroup { name } => {
            if let Ok(outcome) = dashboard.bulk_assign_group(name).await {
                print_outcome(&outcome);
            }
        }
        Command::Delete { ids } => {
            dashboard.clear_selection();
            for id in ids {
                dashboard.toggle_selection(&RsvpId::new(id.as_str()));
            }
            print_outcome(&dashboard.bulk_delete().await);
        }
        Command::Edit { id, field, value } => {
            let patch = RsvpPatch::from_field(field, value)
                .map_err(anyhow::Error::msg)
                .with_context(|| format!("Cannot edit '{field}'"))?;
            if let Ok(updated) = dashboard.update_record(&RsvpId::new(id.as_str()), &patch).await {
                println!("{} updated", updated.full_name());
            }
        }
        Command::Seating { moves, save } => {
            for (id, table) in moves {
                // A rejected move is reported as a notification; keep going.
                let _ = dashboard.move_guest(&RsvpId::new(id.as_str()), *table);
            }
            print_seating(dashboard);
            if *save {
                print_outcome(&dashboard.save_seating().await);
            }
        }
    }
    Ok(())
}

fn print_summary(dashboard: &RsvpDashboard) {
    let metrics = dashboard.metrics();
    println!("Total responses:      {}", metrics.total_responses);
    println!(
        "Attending:            {} ({}%)",
        metrics.attending, metrics.attending_percentage
    );
    println!("Not attending:        {}", metrics.not_attending);
    println!("With guests:          {}", metrics.with_guests);
    println!("Total guests:         {}", metrics.total_guests);
    println!("Dietary restrictions: {}", metrics.dietary_restrictions);
    println!();
    println!(
        "{:<20} {:>9} {:>9} {:>6} {:>6}",
        "Group", "Responses", "Attending", "+1s", "Total"
    );
    for group in dashboard.group_breakdown() {
        println!(
            "{:<20} {:>9} {:>9} {:>6} {:>6}",
            group.label, group.responses, group.attending, group.bringing_guest, group.total_guests
        );
    }
}

fn print_page(dashboard: &RsvpDashboard) {
    let page = dashboard.current_page();
    println!(
        "{:<24} {:<30} {:<4} {:<4} {:<20} {:<16} {:<12} {}",
        "Name", "Email", "Att.", "+1", "Guest Name", "Food", "Group", "Note"
    );
    for row in &page.rows {
        println!(
            "{:<24} {:<30} {:<4} {:<4} {:<20} {:<16} {:<12} {}",
            clip(&row.full_name(), 24),
            clip(&row.email, 30),
            answer_text(row.attending),
            answer_text(row.bringing_guest),
            clip(&row.guest_name(), 20),
            clip(&row.food_restrictions, 16),
            clip(row.group_label(), 12),
            row.admin_note
        );
    }
    println!(
        "Page {} of {} ({} rows)",
        page.page_index + 1,
        page.page_count,
        page.total_rows
    );
}

fn print_seating(dashboard: &RsvpDashboard) {
    let plan = dashboard.seating_plan();
    for (table, guests) in plan.tables() {
        let names: Vec<String> = guests
            .iter()
            .map(|id| {
                dashboard
                    .record(id)
                    .map(|r| r.full_name())
                    .unwrap_or_else(|| id.to_string())
            })
            .collect();
        println!(
            "Table {table} ({}/{}): {}",
            guests.len(),
            plan.capacity(),
            names.join(", ")
        );
    }
    println!("{} guests seated", plan.seated_count());
}

fn print_outcome(outcome: &BulkOutcome) {
    println!(
        "{} succeeded, {} failed",
        outcome.success_count, outcome.error_count
    );
    for id in &outcome.failed_ids {
        println!("  failed: {id}");
    }
}

fn clip(value: &str, width: usize) -> String {
    if value.chars().count() <= width {
        value.to_string()
    } else {
        let mut clipped: String = value.chars().take(width.saturating_sub(1)).collect();
        clipped.push('…');
        clipped
    }
}
