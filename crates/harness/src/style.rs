//! Computed-style parsing and the page's layout expectations.
//!
//! Browsers report `grid-template-columns` as a whitespace-separated list of
//! resolved track values (e.g. `"714px 714px"`). All track counting goes
//! through [`parse_track_list`] so the input format is documented in exactly
//! one place.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Split a computed CSS track-list string into its resolved track values.
///
/// Input is the computed value of `grid-template-columns` (or `-rows`):
/// whitespace-separated lengths such as `"714px 714px"` or `"1fr"`. The
/// keyword `none` (no explicit tracks) yields an empty list.
pub fn parse_track_list(value: &str) -> Vec<&str> {
    if value.trim() == "none" {
        return Vec::new();
    }
    value.split_whitespace().collect()
}

/// Computed `flex-direction` values the page uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FlexDirection {
    Row,
    Column,
    RowReverse,
    ColumnReverse,
}

impl FlexDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            FlexDirection::Row => "row",
            FlexDirection::Column => "column",
            FlexDirection::RowReverse => "row-reverse",
            FlexDirection::ColumnReverse => "column-reverse",
        }
    }
}

impl fmt::Display for FlexDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FlexDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "row" => Ok(FlexDirection::Row),
            "column" => Ok(FlexDirection::Column),
            "row-reverse" => Ok(FlexDirection::RowReverse),
            "column-reverse" => Ok(FlexDirection::ColumnReverse),
            other => Err(format!("not a flex-direction value: {other:?}")),
        }
    }
}

/// The hero grid switches from one column to two side-by-side columns at
/// this viewport width.
pub const TWO_COLUMN_MIN_WIDTH: u32 = 1025;

/// The hero stats row stacks vertically at and below this viewport width.
pub const STATS_STACK_MAX_WIDTH: u32 = 767;

/// Expected hero grid column count at a given viewport width.
pub fn expected_grid_columns(width: u32) -> usize {
    if width >= TWO_COLUMN_MIN_WIDTH {
        2
    } else {
        1
    }
}

/// Expected hero stats flex direction at a given viewport width.
pub fn expected_stats_direction(width: u32) -> FlexDirection {
    if width <= STATS_STACK_MAX_WIDTH {
        FlexDirection::Column
    } else {
        FlexDirection::Row
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test]
    fn splits_resolved_track_values() {
        assert_eq!(parse_track_list("714px 714px"), vec!["714px", "714px"]);
        assert_eq!(parse_track_list("1fr"), vec!["1fr"]);
        assert_eq!(parse_track_list("  320px   320px "), vec!["320px", "320px"]);
    }

    #[test]
    fn none_and_empty_yield_no_tracks() {
        assert!(parse_track_list("none").is_empty());
        assert!(parse_track_list("").is_empty());
        assert!(parse_track_list("   ").is_empty());
    }

    #[test_case(1920, 2; "large desktop is two columns")]
    #[test_case(1440, 2; "desktop is two columns")]
    #[test_case(1025, 2; "threshold itself is two columns")]
    #[test_case(1024, 1; "one below threshold stacks")]
    #[test_case(900, 1; "tablet stacks")]
    #[test_case(375, 1; "mobile stacks")]
    fn grid_column_threshold(width: u32, expected: usize) {
        assert_eq!(expected_grid_columns(width), expected);
    }

    // The 768/900 band straddles the tablet and mobile definitions, so pin
    // both sides of the stats boundary explicitly.
    #[test_case(1440, FlexDirection::Row; "desktop lays stats in a row")]
    #[test_case(900, FlexDirection::Row; "tablet keeps the row")]
    #[test_case(768, FlexDirection::Row; "768 is still a row")]
    #[test_case(767, FlexDirection::Column; "767 stacks")]
    #[test_case(375, FlexDirection::Column; "mobile stacks")]
    fn stats_direction_boundary(width: u32, expected: FlexDirection) {
        assert_eq!(expected_stats_direction(width), expected);
    }

    #[test]
    fn flex_direction_round_trips() {
        for dir in [
            FlexDirection::Row,
            FlexDirection::Column,
            FlexDirection::RowReverse,
            FlexDirection::ColumnReverse,
        ] {
            assert_eq!(dir.as_str().parse::<FlexDirection>().unwrap(), dir);
        }
        assert!("diagonal".parse::<FlexDirection>().is_err());
    }
}
