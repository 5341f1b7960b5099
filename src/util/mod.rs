pub mod duration;
pub mod text;

pub use duration::{format_duration, parse_duration};
pub use text::{
    byte_offset_to_display_col, display_width, next_grapheme_boundary, prev_grapheme_boundary,
    truncate_to_width,
};
