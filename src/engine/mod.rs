pub mod clock;
pub mod lanes;
pub mod recur;
pub mod scale;
pub mod schedule;
pub mod status;
pub mod viewmode;

pub use clock::{AutoScroll, Clock, ManualClock, SystemClock};
pub use lanes::{LaneGeometry, HEADER_ROWS};
pub use recur::{align_start, expand, Occurrences};
pub use scale::{cols_per_hour, Viewport};
pub use schedule::{
    move_item, place_one_off, place_recurring, place_tray_task, resolve_drop,
    snap_to_quarter_hour, truncate_series, DropSpot, PlaceOutcome, ScheduleError,
};
pub use status::{classify, is_active, stale_status_ids};
pub use viewmode::ViewModeController;
