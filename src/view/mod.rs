pub mod calendar;
pub mod flatten;

pub use calendar::{CalendarMatrix, CalendarRow, Cell, build_calendar_matrix, generate_date_range};
pub use flatten::{FlatRow, flatten, flatten_all, flatten_visible};
