use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "dr", about = concat!("[~] drift v", env!("CARGO_PKG_VERSION"), " - your plans move with time"), version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Run against a different board directory
    #[arg(short = 'C', long = "board-dir", global = true)]
    pub board_dir: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new drift board in the current directory
    Init(InitArgs),
    /// Add an unscheduled task to the tray
    Add(AddArgs),
    /// List tray tasks, or remove one
    Tray(TrayCmd),
    /// List timeline items
    List(ListArgs),
    /// Place a tray task on the timeline
    Schedule(ScheduleArgs),
    /// Mark an item completed
    Done(IdArg),
    /// Park an item (stays on the timeline, never flagged as a logjam)
    Park(IdArg),
    /// Return a completed or parked item to the flow
    Restore(IdArg),
    /// Move an item to a new start time or layer
    Move(MoveArgs),
    /// Delete an item, or part of its series
    Rm(RmArgs),
    /// Layer management
    Layer(LayerCmd),
    /// Show or switch the view mode
    Mode(ModeArgs),
    /// Validate board integrity
    Check,
    /// View or manage the journal
    Journal(JournalCmd),
}

// ---------------------------------------------------------------------------
// Init args
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct InitArgs {
    /// Board name (default: inferred from directory name)
    #[arg(long)]
    pub name: Option<String>,
    /// Create an extra layer with this name (repeatable)
    #[arg(long, action = clap::ArgAction::Append)]
    pub layer: Vec<String>,
}

// ---------------------------------------------------------------------------
// Tray args
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct AddArgs {
    /// Task title
    pub title: String,
    /// Block size like 1h30m, 45m, or bare minutes (default: 1h)
    #[arg(long, default_value = "1h")]
    pub duration: String,
    /// Recur when placed: daily, weekly:<day>, monthly:<day>, every:<n>
    #[arg(long)]
    pub every: Option<String>,
    /// Hex color override like "#44DDFF"
    #[arg(long)]
    pub color: Option<String>,
    /// Mark as a meeting (fixed commitment)
    #[arg(long)]
    pub meeting: bool,
    /// Mark as flexible (free to slide)
    #[arg(long)]
    pub flexible: bool,
    /// Keep in the tray after placement
    #[arg(long)]
    pub template: bool,
}

#[derive(Args)]
pub struct TrayCmd {
    #[command(subcommand)]
    pub action: Option<TrayAction>,
}

#[derive(Subcommand)]
pub enum TrayAction {
    /// List tray tasks (default)
    Ls,
    /// Remove a tray task
    Rm(TrayRmArgs),
}

#[derive(Args)]
pub struct TrayRmArgs {
    /// Tray task ID
    pub id: String,
}

// ---------------------------------------------------------------------------
// Timeline args
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct ListArgs {
    /// Filter by layer ID
    #[arg(long)]
    pub layer: Option<String>,
    /// Filter by status (scheduled, completed, parked, logjam)
    #[arg(long)]
    pub status: Option<String>,
    /// Only items whose window overlaps this day (YYYY-MM-DD)
    #[arg(long)]
    pub on: Option<String>,
    /// Only items in this series
    #[arg(long)]
    pub series: Option<String>,
}

#[derive(Args)]
pub struct ScheduleArgs {
    /// Tray task ID
    pub id: String,
    /// Start instant: "YYYY-MM-DD HH:MM" or RFC 3339
    pub start: String,
    /// Target layer ID (default: topmost visible layer)
    #[arg(long)]
    pub layer: Option<String>,
}

#[derive(Args)]
pub struct IdArg {
    /// Item ID
    pub id: String,
}

#[derive(Args)]
pub struct MoveArgs {
    /// Item ID
    pub id: String,
    /// New start instant: "YYYY-MM-DD HH:MM" or RFC 3339
    pub start: String,
    /// Move to a different layer
    #[arg(long)]
    pub layer: Option<String>,
}

#[derive(Args)]
pub struct RmArgs {
    /// Item ID
    pub id: String,
    /// Also delete every later occurrence in the item's series
    #[arg(long)]
    pub following: bool,
    /// Delete the whole series the item belongs to
    #[arg(long)]
    pub series: bool,
}

// ---------------------------------------------------------------------------
// Layer management
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct LayerCmd {
    #[command(subcommand)]
    pub action: LayerAction,
}

#[derive(Subcommand)]
pub enum LayerAction {
    /// Create a new layer
    Add(LayerAddArgs),
    /// List layers
    Ls,
    /// Rename a layer
    Rename(LayerRenameArgs),
    /// Change a layer's color
    Color(LayerColorArgs),
    /// Make a layer visible
    Show(LayerIdArg),
    /// Hide a layer from the timeline
    Hide(LayerIdArg),
    /// Delete an empty layer
    Rm(LayerIdArg),
}

#[derive(Args)]
pub struct LayerAddArgs {
    /// Layer name
    pub name: String,
    /// Hex color (default: next palette color)
    #[arg(long)]
    pub color: Option<String>,
}

#[derive(Args)]
pub struct LayerIdArg {
    /// Layer ID
    pub id: String,
}

#[derive(Args)]
pub struct LayerRenameArgs {
    /// Layer ID
    pub id: String,
    /// New name
    pub name: String,
}

#[derive(Args)]
pub struct LayerColorArgs {
    /// Layer ID
    pub id: String,
    /// Hex color like "#44DDFF"
    pub color: String,
}

// ---------------------------------------------------------------------------
// View mode
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct ModeArgs {
    /// New mode: day, week, month, year (omit to show the current one)
    pub mode: Option<String>,
}

// ---------------------------------------------------------------------------
// Journal
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct JournalCmd {
    #[command(subcommand)]
    pub action: Option<JournalAction>,
    /// Maximum number of entries to show (default: 10)
    #[arg(long)]
    pub limit: Option<usize>,
    /// Show entries after this timestamp (ISO-8601)
    #[arg(long)]
    pub since: Option<String>,
}

#[derive(Subcommand)]
pub enum JournalAction {
    /// Remove old entries
    Prune(JournalPruneArgs),
    /// Print the absolute path to the journal
    Path,
}

#[derive(Args)]
pub struct JournalPruneArgs {
    /// Remove entries older than this timestamp (default: 30 days ago)
    #[arg(long)]
    pub before: Option<String>,
    /// Remove all entries
    #[arg(long)]
    pub all: bool,
}
