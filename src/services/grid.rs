//! Odds grid generation.
//!
//! Pure functions from (current price, asset, volatility, parameters) to a
//! two-sided grid of tappable cells. Rows are discrete price levels spaced
//! by the asset's increment; columns are fixed time windows. Each cell's
//! multiplier comes from a touch-probability model: the chance that a
//! log-normal walk touches the target level within the window, priced via
//! the reflection principle, with a flat house edge.
//!
//! The surface is monotone in distance (further targets never pay less)
//! and monotone in time (shorter windows never pay less).

use crate::config::GridParams;
use crate::types::{AssetSpec, Direction, GridBox, GridView};

/// Probability floor (prevents unbounded multipliers).
const MIN_PROBABILITY: f64 = 0.001;

/// Probability ceiling.
const MAX_PROBABILITY: f64 = 0.999;

const MS_PER_YEAR: f64 = 365.25 * 24.0 * 3600.0 * 1000.0;

/// Snap a price to the asset's grid: nearest multiple of the increment.
pub fn base_price(current_price: f64, increment: f64) -> f64 {
    (current_price / increment).round() * increment
}

/// Payout multiplier for a single (target, window) cell.
///
/// Returns None for degenerate inputs (non-positive prices).
pub fn cell_multiplier(
    current_price: f64,
    target_price: f64,
    window_secs: u64,
    volatility: f64,
    params: &GridParams,
) -> Option<f64> {
    if current_price <= 0.0 || target_price <= 0.0 {
        return None;
    }

    let probability = touch_probability(current_price, target_price, window_secs, volatility);
    let raw = 1.0 / probability;
    let with_edge = raw * (1.0 - params.house_edge);
    let clamped = with_edge.clamp(params.min_multiplier, params.max_multiplier);

    // Two decimals for display; the clamp keeps rounding inside bounds.
    Some((clamped * 100.0).round() / 100.0)
}

/// Probability that price touches `target` within `window_secs`, under a
/// log-normal walk with the given annualized volatility.
///
/// Reflection principle: P(touch) = 2 * N(-d), d = |ln(target/current)| / (sigma * sqrt(t)).
fn touch_probability(current: f64, target: f64, window_secs: u64, volatility: f64) -> f64 {
    let t_years = (window_secs as f64 * 1000.0) / MS_PER_YEAR;
    let sigma_sqrt_t = volatility * t_years.sqrt();

    if sigma_sqrt_t < 1e-10 {
        // Degenerate window or volatility: touch is certain only at the price.
        return if (current - target).abs() / current < 1e-6 {
            MAX_PROBABILITY
        } else {
            MIN_PROBABILITY
        };
    }

    let d = (target / current).ln().abs() / sigma_sqrt_t;
    (2.0 * normal_cdf(-d)).clamp(MIN_PROBABILITY, MAX_PROBABILITY)
}

/// Generate a fresh two-sided grid for the given price.
///
/// `long_boxes[row][col]`: row 0 is the level nearest above the snapped
/// base price, columns follow `params.time_windows_secs`. The short side
/// mirrors downward; rows whose target would be non-positive are skipped.
pub fn generate_grid(
    current_price: f64,
    asset: &AssetSpec,
    volatility: f64,
    params: &GridParams,
    generated_at: i64,
) -> GridView {
    let increment = asset.price_increment;
    let base = base_price(current_price, increment);

    let mut long_boxes = Vec::with_capacity(params.rows_per_side);
    let mut short_boxes = Vec::with_capacity(params.rows_per_side);

    for row in 0..params.rows_per_side {
        let offset = (row as f64 + 1.0) * increment;

        let long_target = base + offset;
        if let Some(cells) =
            build_row(current_price, long_target, Direction::Long, row, volatility, params, )
        {
            long_boxes.push(cells);
        }

        let short_target = base - offset;
        if short_target > 0.0 {
            if let Some(cells) =
                build_row(current_price, short_target, Direction::Short, row, volatility, params)
            {
                short_boxes.push(cells);
            }
        }
    }

    GridView {
        current_price,
        long_boxes,
        short_boxes,
        generated_at,
    }
}

fn build_row(
    current_price: f64,
    target_price: f64,
    direction: Direction,
    row: usize,
    volatility: f64,
    params: &GridParams,
) -> Option<Vec<GridBox>> {
    let mut cells = Vec::with_capacity(params.time_windows_secs.len());
    for (col, &window) in params.time_windows_secs.iter().enumerate() {
        let multiplier = cell_multiplier(current_price, target_price, window, volatility, params)?;
        cells.push(GridBox {
            id: format!("{}-{}-{}", direction, row, col),
            row,
            col,
            price: target_price,
            time_window_secs: window,
            multiplier,
            direction,
        });
    }
    Some(cells)
}

/// Standard normal CDF approximation (Abramowitz & Stegun 26.2.17).
/// Accurate to about 1.5e-7.
fn normal_cdf(x: f64) -> f64 {
    if x < -8.0 {
        return 0.0;
    }
    if x > 8.0 {
        return 1.0;
    }

    let sign = if x < 0.0 { -1.0 } else { 1.0 };
    let x = x.abs();

    let b1 = 0.319381530;
    let b2 = -0.356563782;
    let b3 = 1.781477937;
    let b4 = -1.821255978;
    let b5 = 1.330274429;
    let p = 0.2316419;

    let t = 1.0 / (1.0 + p * x);
    let t2 = t * t;
    let t3 = t2 * t;
    let t4 = t3 * t;
    let t5 = t4 * t;

    let pdf = (-x * x / 2.0).exp() / (2.0 * std::f64::consts::PI).sqrt();
    let cdf = 1.0 - pdf * (b1 * t + b2 * t2 + b3 * t3 + b4 * t4 + b5 * t5);

    0.5 * (1.0 + sign * (2.0 * cdf - 1.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::lookup_asset;

    fn btc() -> &'static AssetSpec {
        lookup_asset("BTC").unwrap()
    }

    // =========================================================================
    // Base price
    // =========================================================================

    #[test]
    fn test_base_price_rounds_to_nearest() {
        assert_eq!(base_price(100.0, 1.0), 100.0);
        assert_eq!(base_price(100.4, 1.0), 100.0);
        assert_eq!(base_price(100.6, 1.0), 101.0);
        assert_eq!(base_price(60004.0, 10.0), 60000.0);
        assert_eq!(base_price(60006.0, 10.0), 60010.0);
    }

    // =========================================================================
    // normal_cdf
    // =========================================================================

    #[test]
    fn test_normal_cdf_symmetry() {
        assert!((normal_cdf(0.0) - 0.5).abs() < 1e-7);
        let sum = normal_cdf(1.3) + normal_cdf(-1.3);
        assert!((sum - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_normal_cdf_known_values() {
        assert!((normal_cdf(1.96) - 0.975).abs() < 1e-3);
        assert!((normal_cdf(-1.96) - 0.025).abs() < 1e-3);
        assert_eq!(normal_cdf(-9.0), 0.0);
        assert_eq!(normal_cdf(9.0), 1.0);
    }

    // =========================================================================
    // Multiplier properties
    // =========================================================================

    #[test]
    fn test_multiplier_monotone_in_distance() {
        let params = GridParams::default();
        let mut prev = 0.0;
        for row in 1..=15 {
            let target = 60000.0 + row as f64 * 10.0;
            let m = cell_multiplier(60000.0, target, 15, 0.55, &params).unwrap();
            assert!(
                m >= prev,
                "multiplier fell from {} to {} at row {}",
                prev,
                m,
                row
            );
            prev = m;
        }
    }

    #[test]
    fn test_multiplier_monotone_in_time() {
        let params = GridParams::default();
        let mut prev = f64::INFINITY;
        for window in [5u64, 10, 15, 20, 25, 30] {
            let m = cell_multiplier(60000.0, 60050.0, window, 0.55, &params).unwrap();
            assert!(
                m <= prev,
                "multiplier rose from {} to {} at window {}s",
                prev,
                m,
                window
            );
            prev = m;
        }
    }

    #[test]
    fn test_multiplier_clamped() {
        let params = GridParams::default();
        // Far target, tiny window: capped at max.
        let far = cell_multiplier(60000.0, 90000.0, 5, 0.55, &params).unwrap();
        assert_eq!(far, params.max_multiplier);
        // Target at the current price: floored at min.
        let near = cell_multiplier(60000.0, 60000.0, 30, 0.55, &params).unwrap();
        assert!(near >= params.min_multiplier);
    }

    #[test]
    fn test_multiplier_rejects_degenerate_prices() {
        let params = GridParams::default();
        assert!(cell_multiplier(0.0, 100.0, 5, 0.55, &params).is_none());
        assert!(cell_multiplier(100.0, -1.0, 5, 0.55, &params).is_none());
    }

    // =========================================================================
    // Grid generation
    // =========================================================================

    #[test]
    fn test_grid_shape() {
        let params = GridParams::default();
        let grid = generate_grid(60004.0, btc(), 0.55, &params, 0);

        assert_eq!(grid.long_boxes.len(), params.rows_per_side);
        assert_eq!(grid.short_boxes.len(), params.rows_per_side);
        for row in grid.long_boxes.iter().chain(grid.short_boxes.iter()) {
            assert_eq!(row.len(), params.time_windows_secs.len());
        }
    }

    #[test]
    fn test_grid_targets_step_from_base() {
        let params = GridParams::default();
        let grid = generate_grid(60004.0, btc(), 0.55, &params, 0);

        // base = 60000; long rows ascend, short rows descend.
        assert_eq!(grid.long_boxes[0][0].price, 60010.0);
        assert_eq!(grid.long_boxes[1][0].price, 60020.0);
        assert_eq!(grid.short_boxes[0][0].price, 59990.0);
        assert_eq!(grid.short_boxes[1][0].price, 59980.0);
    }

    #[test]
    fn test_grid_directions() {
        let params = GridParams::default();
        let grid = generate_grid(60004.0, btc(), 0.55, &params, 0);

        for row in &grid.long_boxes {
            for cell in row {
                assert_eq!(cell.direction, Direction::Long);
                assert!(cell.price > grid.current_price);
            }
        }
        for row in &grid.short_boxes {
            for cell in row {
                assert_eq!(cell.direction, Direction::Short);
                assert!(cell.price < grid.current_price);
            }
        }
    }

    #[test]
    fn test_grid_regenerates_from_moved_price() {
        // Row targets shift when the snapped base moves.
        let params = GridParams::default();
        let eth = lookup_asset("ETH").unwrap();

        let before = generate_grid(100.0, eth, 0.7, &params, 0);
        assert_eq!(before.long_boxes[0][0].price, 101.0);

        let after = generate_grid(100.6, eth, 0.7, &params, 0);
        assert_eq!(after.long_boxes[0][0].price, 102.0);
        assert_eq!(after.short_boxes[0][0].price, 100.0);
    }

    #[test]
    fn test_grid_skips_non_positive_short_rows() {
        let params = GridParams::default();
        let doge = lookup_asset("DOGE").unwrap();

        // Price low enough that deep short rows would cross zero.
        let grid = generate_grid(0.0008, doge, 1.1, &params, 0);
        assert!(grid.short_boxes.len() < params.rows_per_side);
        for row in &grid.short_boxes {
            for cell in row {
                assert!(cell.price > 0.0);
            }
        }
    }

    #[test]
    fn test_grid_cell_ids_deterministic() {
        let params = GridParams::default();
        let grid = generate_grid(60004.0, btc(), 0.55, &params, 0);
        assert_eq!(grid.long_boxes[0][0].id, "long-0-0");
        assert_eq!(grid.short_boxes[2][3].id, "short-2-3");
    }
}
