mod init;
pub use init::cmd_init;

use std::path::PathBuf;
use std::sync::Mutex;

use chrono::{Duration, NaiveTime, Utc};

/// Global override for board directory (set by -C flag)
static BOARD_DIR_OVERRIDE: Mutex<Option<PathBuf>> = Mutex::new(None);

use crate::cli::commands::*;
use crate::cli::output::*;
use crate::engine::schedule::{self, DropSpot, ScheduleError};
use crate::engine::status::classify;
use crate::engine::viewmode::ViewModeController;
use crate::model::item::{ItemPatch, ItemStatus, TimelineItem};
use crate::model::layer::{visible_sorted, Layer};
use crate::model::recurrence::{Recurrence, RecurrenceRule};
use crate::model::settings::ViewMode;
use crate::model::tray::NewTrayTask;
use crate::store::journal;
use crate::store::json_store::JsonStore;
use crate::store::{ItemFilter, Store, StoreError};
use crate::util::parse_duration;

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

pub fn dispatch(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let json = cli.json;

    // Store -C override for open_board_cwd()
    if let Some(ref dir) = cli.board_dir {
        let abs = std::fs::canonicalize(dir)
            .map_err(|e| format!("cannot resolve -C path '{}': {}", dir, e))?;
        BOARD_DIR_OVERRIDE.lock().unwrap().replace(abs);
    }

    match cli.command {
        None => {
            // No subcommand launches the TUI; main.rs handles it before dispatch
            Ok(())
        }
        Some(cmd) => match cmd {
            // Init is handled in main.rs before board discovery
            Commands::Init(args) => cmd_init(args),

            // Read commands
            Commands::List(args) => cmd_list(args, json),
            Commands::Tray(args) => match args.action {
                None | Some(TrayAction::Ls) => cmd_tray_ls(json),
                Some(TrayAction::Rm(rm)) => cmd_tray_rm(rm, json),
            },
            Commands::Mode(args) => cmd_mode(args, json),
            Commands::Check => cmd_check(json),
            Commands::Journal(args) => cmd_journal(args, json),

            // Write commands
            Commands::Add(args) => cmd_add(args, json),
            Commands::Schedule(args) => cmd_schedule(args, json),
            Commands::Done(args) => cmd_done(args, json),
            Commands::Park(args) => cmd_park(args, json),
            Commands::Restore(args) => cmd_restore(args, json),
            Commands::Move(args) => cmd_move(args, json),
            Commands::Rm(args) => cmd_rm(args, json),

            // Layer management
            Commands::Layer(args) => cmd_layer(args, json),
        },
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Open the board discovered from the -C override or the current directory.
/// Every mutation through the store commits atomically under the board lock,
/// so handlers hold no extra lock of their own.
fn open_board_cwd() -> Result<JsonStore, StoreError> {
    let start = match BOARD_DIR_OVERRIDE.lock().unwrap().as_ref() {
        Some(dir) => dir.clone(),
        None => std::env::current_dir().map_err(StoreError::IoError)?,
    };
    JsonStore::open(&start)
}

fn find_item(store: &JsonStore, id: &str) -> Result<TimelineItem, Box<dyn std::error::Error>> {
    store
        .board()
        .items
        .get(id)
        .cloned()
        .ok_or_else(|| format!("item not found: {}", id).into())
}

fn require_layer(store: &JsonStore, id: &str) -> Result<(), Box<dyn std::error::Error>> {
    if store.board().layer(id).is_none() {
        return Err(format!("layer not found: {}", id).into());
    }
    Ok(())
}

fn layer_item_count(store: &JsonStore, layer_id: &str) -> usize {
    store
        .board()
        .items
        .values()
        .filter(|i| i.layer_id == layer_id)
        .count()
}

fn print_item(item: &TimelineItem, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    if json {
        println!("{}", serde_json::to_string_pretty(&item_to_json(item))?);
    } else {
        println!("{}", format_item_line(item));
    }
    Ok(())
}

fn print_layer(
    layer: &Layer,
    items: usize,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    if json {
        println!("{}", serde_json::to_string_pretty(&layer_to_json(layer, items))?);
    } else {
        println!("{}", format_layer_line(layer, items));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Read command handlers
// ---------------------------------------------------------------------------

fn cmd_list(args: ListArgs, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let store = open_board_cwd()?;

    let status = args
        .status
        .as_deref()
        .map(parse_item_status)
        .transpose()
        .map_err(Box::<dyn std::error::Error>::from)?;

    let mut filter = ItemFilter {
        layer_id: args.layer.clone(),
        status,
        series_id: args.series.clone(),
        ..Default::default()
    };
    if let Some(ref day_str) = args.on {
        let day = parse_day(day_str).map_err(Box::<dyn std::error::Error>::from)?;
        let from = day.and_time(NaiveTime::MIN).and_utc();
        filter.from = Some(from);
        filter.to = Some(from + Duration::days(1));
    }

    let mut items = store.list_items(&filter);
    items.sort_by_key(|i| i.start_time);

    if json {
        let out: Vec<ItemJson> = items.iter().map(item_to_json).collect();
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        for item in &items {
            println!("{}", format_item_line(item));
        }
    }
    Ok(())
}

fn cmd_tray_ls(json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let store = open_board_cwd()?;
    let tray = &store.board().tray;

    if json {
        let out: Vec<TrayTaskJson> = tray.iter().map(tray_task_to_json).collect();
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        for task in tray {
            println!("{}", format_tray_line(task));
        }
    }
    Ok(())
}

fn cmd_mode(args: ModeArgs, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let mut store = open_board_cwd()?;

    if let Some(ref mode_str) = args.mode {
        let mode = ViewMode::parse_mode(mode_str).ok_or_else(|| {
            format!("unknown mode '{}' (expected: day, week, month, year)", mode_str)
        })?;
        let mut settings = store.board().settings.clone();
        let mut controller = ViewModeController::new();
        controller.switch_to(mode);
        controller.run_to_completion(&mut settings, &mut store)?;
    }

    let settings = &store.board().settings;
    if json {
        let out = ModeJson {
            mode: settings.view_mode,
            zoom_horizontal: settings.zoom_horizontal,
            zoom_vertical: settings.zoom_vertical,
            locked: settings.is_locked,
        };
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        println!(
            "{}  zoom {:.0}%/{:.0}%{}",
            settings.view_mode,
            settings.zoom_horizontal,
            settings.zoom_vertical,
            if settings.is_locked { "" } else { "  (unlocked)" }
        );
    }
    Ok(())
}

fn cmd_check(json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let store = open_board_cwd()?;
    let problems = store.board().validate(store.config().timeline.zoom_bounds());
    let valid = problems.is_empty();

    if json {
        let out = CheckJson { valid, problems };
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        for problem in &problems {
            println!("  {}", problem);
        }
        if valid {
            println!("✓ board is valid");
        } else {
            println!("✗ board has problems");
        }
    }
    Ok(())
}

fn cmd_journal(args: JournalCmd, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let store = open_board_cwd()?;
    let drift_dir = store.drift_dir();

    match args.action {
        Some(JournalAction::Path) => {
            println!("{}", journal::journal_path(drift_dir).display());
            Ok(())
        }
        Some(JournalAction::Prune(prune)) => {
            let before = prune
                .before
                .as_deref()
                .map(parse_instant)
                .transpose()
                .map_err(Box::<dyn std::error::Error>::from)?;
            let removed = journal::prune_journal(drift_dir, before, prune.all)?;
            if json {
                let out = serde_json::json!({ "pruned": removed });
                println!("{}", serde_json::to_string_pretty(&out)?);
            } else {
                println!(
                    "pruned {} entr{}",
                    removed,
                    if removed == 1 { "y" } else { "ies" }
                );
            }
            Ok(())
        }
        None => {
            let since = args
                .since
                .as_deref()
                .map(parse_instant)
                .transpose()
                .map_err(Box::<dyn std::error::Error>::from)?;
            let limit = args.limit.or(Some(10));
            let entries = journal::read_journal_entries(drift_dir, limit, since);

            if json {
                let out: Vec<serde_json::Value> = entries.iter().map(|e| e.to_json()).collect();
                println!("{}", serde_json::to_string_pretty(&out)?);
            } else if entries.is_empty() {
                println!("journal is empty");
            } else {
                for entry in &entries {
                    println!("{}", entry.to_display_markdown());
                }
            }
            Ok(())
        }
    }
}

// ---------------------------------------------------------------------------
// Write command handlers
// ---------------------------------------------------------------------------

fn cmd_add(args: AddArgs, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let mut store = open_board_cwd()?;

    let minutes = parse_duration(&args.duration)
        .ok_or_else(|| format!("could not parse duration '{}'", args.duration))?;
    let recurrence = match args.every.as_deref() {
        Some(rule) => {
            let recurrence = Recurrence::parse_rule(rule).ok_or_else(|| {
                format!(
                    "unknown recurrence '{}' (expected: daily, weekly:<day>, monthly:<day>, every:<n>)",
                    rule
                )
            })?;
            Some(RecurrenceRule::new(recurrence))
        }
        None => None,
    };

    let task = store.create_tray_task(NewTrayTask {
        title: args.title,
        duration_minutes: minutes,
        color: args.color,
        is_meeting: args.meeting,
        is_flexible: args.flexible,
        is_template: args.template,
        recurrence,
    })?;

    if json {
        println!("{}", serde_json::to_string_pretty(&tray_task_to_json(&task))?);
    } else {
        println!("{}", task.id);
    }
    Ok(())
}

fn cmd_tray_rm(args: TrayRmArgs, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let mut store = open_board_cwd()?;
    let removed = store.delete_tray_task(&args.id)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&tray_task_to_json(&removed))?);
    } else {
        println!("removed {} ({})", removed.id, removed.title);
    }
    Ok(())
}

fn cmd_schedule(args: ScheduleArgs, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let mut store = open_board_cwd()?;

    let start = parse_instant(&args.start).map_err(Box::<dyn std::error::Error>::from)?;
    let task = store
        .board()
        .tray_task(&args.id)
        .ok_or_else(|| format!("tray task not found: {}", args.id))?
        .clone();

    let layer_id = match args.layer {
        Some(id) => {
            require_layer(&store, &id)?;
            id
        }
        None => visible_sorted(&store.board().layers)
            .first()
            .map(|l| l.id.clone())
            .ok_or("no visible layers to schedule onto")?,
    };

    let spot = DropSpot {
        start,
        layer_id,
        lane: 0,
    };
    let max_occurrences = store.config().timeline.max_occurrences;

    let outcome = match schedule::place_tray_task(&mut store, &task, &spot, max_occurrences) {
        Ok(outcome) => outcome,
        Err(err) => {
            if let ScheduleError::NothingCreated { attempted } = err {
                let indices: Vec<u32> = (0..attempted).collect();
                journal::log_batch_failure(
                    store.drift_dir(),
                    "-",
                    &task.title,
                    &indices,
                    "no occurrence could be created",
                );
            }
            return Err(err.into());
        }
    };

    if !outcome.failed_indices.is_empty() {
        journal::log_batch_failure(
            store.drift_dir(),
            outcome.series_id.as_deref().unwrap_or("-"),
            &task.title,
            &outcome.failed_indices,
            "create failed",
        );
    }

    if json {
        let out = PlacementJson {
            created: outcome.created_ids.clone(),
            failed_occurrences: outcome.failed_indices.clone(),
            series: outcome.series_id.clone(),
            source_removed: outcome.source_removed,
        };
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        match &outcome.series_id {
            Some(series_id) => {
                println!("{}: {} occurrence(s) created", series_id, outcome.created());
                if !outcome.failed_indices.is_empty() {
                    println!(
                        "{} failed; recorded in the journal",
                        outcome.failed_indices.len()
                    );
                }
            }
            None => {
                for id in &outcome.created_ids {
                    println!("{}", id);
                }
            }
        }
    }
    Ok(())
}

fn cmd_done(args: IdArg, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    set_item_status(&args.id, ItemStatus::Completed, json)
}

fn cmd_park(args: IdArg, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    set_item_status(&args.id, ItemStatus::Parked, json)
}

fn set_item_status(
    id: &str,
    status: ItemStatus,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut store = open_board_cwd()?;
    let updated = store.update_item(id, &ItemPatch::set_status(status))?;
    print_item(&updated, json)
}

fn cmd_restore(args: IdArg, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let mut store = open_board_cwd()?;

    // An elapsed item comes back as a logjam, not as scheduled
    let mut probe = find_item(&store, &args.id)?;
    probe.status = ItemStatus::Scheduled;
    let grace = store.config().timeline.logjam_grace_minutes;
    let status = classify(&probe, Utc::now(), grace);

    let updated = store.update_item(&args.id, &ItemPatch::set_status(status))?;
    print_item(&updated, json)
}

fn cmd_move(args: MoveArgs, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let mut store = open_board_cwd()?;
    let start = parse_instant(&args.start).map_err(Box::<dyn std::error::Error>::from)?;

    let layer_id = match args.layer {
        Some(id) => {
            require_layer(&store, &id)?;
            id
        }
        None => find_item(&store, &args.id)?.layer_id,
    };

    let spot = DropSpot {
        start,
        layer_id,
        lane: 0,
    };
    let updated = schedule::move_item(&mut store, &args.id, &spot)?;
    print_item(&updated, json)
}

fn cmd_rm(args: RmArgs, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let mut store = open_board_cwd()?;

    if args.following || args.series {
        let item = find_item(&store, &args.id)?;
        let series_id = item
            .series_id
            .clone()
            .ok_or_else(|| format!("{} is not part of a series", args.id))?;
        let from_index = if args.series {
            0
        } else {
            item.occurrence_index.unwrap_or(0)
        };
        let deleted = schedule::truncate_series(&mut store, &series_id, from_index)?;

        if json {
            let out = serde_json::json!({ "series": series_id, "deleted": deleted });
            println!("{}", serde_json::to_string_pretty(&out)?);
        } else {
            println!("deleted {} occurrence(s) from {}", deleted, series_id);
        }
    } else {
        let removed = store.delete_item(&args.id)?;
        if json {
            println!("{}", serde_json::to_string_pretty(&item_to_json(&removed))?);
        } else {
            println!("deleted {}", removed.id);
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Layer management
// ---------------------------------------------------------------------------

fn cmd_layer(args: LayerCmd, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    match args.action {
        LayerAction::Ls => cmd_layer_ls(json),
        LayerAction::Add(a) => cmd_layer_add(a, json),
        LayerAction::Rename(a) => cmd_layer_rename(a, json),
        LayerAction::Color(a) => cmd_layer_color(a, json),
        LayerAction::Show(a) => cmd_layer_visible(a, true, json),
        LayerAction::Hide(a) => cmd_layer_visible(a, false, json),
        LayerAction::Rm(a) => cmd_layer_rm(a, json),
    }
}

fn cmd_layer_ls(json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let store = open_board_cwd()?;
    let mut layers: Vec<&Layer> = store.board().layers.iter().collect();
    layers.sort_by_key(|l| l.order);

    if json {
        let out: Vec<LayerJson> = layers
            .iter()
            .map(|l| layer_to_json(l, layer_item_count(&store, &l.id)))
            .collect();
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        for layer in &layers {
            println!(
                "{}",
                format_layer_line(layer, layer_item_count(&store, &layer.id))
            );
        }
    }
    Ok(())
}

fn cmd_layer_add(args: LayerAddArgs, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let mut store = open_board_cwd()?;
    let color = match args.color {
        Some(color) => color,
        None => store.config().ui.layer_color(store.board().layers.len()),
    };
    let layer = store.create_layer(&args.name, &color)?;
    print_layer(&layer, 0, json)
}

fn cmd_layer_rename(args: LayerRenameArgs, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let mut store = open_board_cwd()?;
    let layer = store.rename_layer(&args.id, &args.name)?;
    let items = layer_item_count(&store, &layer.id);
    print_layer(&layer, items, json)
}

fn cmd_layer_color(args: LayerColorArgs, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let mut store = open_board_cwd()?;
    let layer = store.set_layer_color(&args.id, &args.color)?;
    let items = layer_item_count(&store, &layer.id);
    print_layer(&layer, items, json)
}

fn cmd_layer_visible(
    args: LayerIdArg,
    visible: bool,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut store = open_board_cwd()?;
    let layer = store.set_layer_visible(&args.id, visible)?;
    let items = layer_item_count(&store, &layer.id);
    print_layer(&layer, items, json)
}

fn cmd_layer_rm(args: LayerIdArg, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let mut store = open_board_cwd()?;
    let removed = store.delete_layer(&args.id)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&layer_to_json(&removed, 0))?);
    } else {
        println!("deleted {} ({})", removed.id, removed.name);
    }
    Ok(())
}
