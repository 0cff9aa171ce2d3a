//! Odds grid types.
//!
//! Cells are ephemeral: the whole grid is rebuilt from the latest price on
//! every refresh and a cell is never mutated or carried across rebuilds.

use serde::{Deserialize, Serialize};

/// Which side of the current price a bet targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Target above the price at generation time
    Long,
    /// Target below the price at generation time
    Short,
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Direction::Long => write!(f, "long"),
            Direction::Short => write!(f, "short"),
        }
    }
}

/// One tappable (price level, time window) cell.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GridBox {
    /// Deterministic cell id ("{direction}-{row}-{col}")
    pub id: String,
    /// Row index, 0 = nearest level to the current price
    pub row: usize,
    /// Column index into the time window list
    pub col: usize,
    /// Target price level for this cell
    pub price: f64,
    /// Seconds until expiry, measured from generation time
    pub time_window_secs: u64,
    /// Payout multiplier offered for this cell
    pub multiplier: f64,
    /// Long iff the target sits above the generation-time price
    pub direction: Direction,
}

/// A freshly generated two-sided grid.
///
/// `long_boxes[row][col]` ascends away from the current price; the short
/// side mirrors it downward.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GridView {
    /// Price used to generate this grid
    pub current_price: f64,
    /// Cells above the current price
    pub long_boxes: Vec<Vec<GridBox>>,
    /// Cells below the current price
    pub short_boxes: Vec<Vec<GridBox>>,
    /// Generation timestamp (ms since epoch)
    pub generated_at: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_display() {
        assert_eq!(Direction::Long.to_string(), "long");
        assert_eq!(Direction::Short.to_string(), "short");
    }

    #[test]
    fn test_direction_serde_snake_case() {
        assert_eq!(serde_json::to_string(&Direction::Long).unwrap(), "\"long\"");
        assert_eq!(serde_json::to_string(&Direction::Short).unwrap(), "\"short\"");
    }

    #[test]
    fn test_grid_box_camel_case_fields() {
        let cell = GridBox {
            id: "long-0-0".to_string(),
            row: 0,
            col: 0,
            price: 60010.0,
            time_window_secs: 5,
            multiplier: 1.35,
            direction: Direction::Long,
        };
        let json = serde_json::to_string(&cell).unwrap();
        assert!(json.contains("\"timeWindowSecs\":5"));
        assert!(json.contains("\"direction\":\"long\""));
    }
}
