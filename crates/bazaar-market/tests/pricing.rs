//! Pricing properties of the market: curve shape, sell bounds, and the
//! unknown-commodity path.

use bazaar_market::{Commodity, Market, MarketConfig};
use bazaar_protocol::CommodityType;

// =========================================================================
// Helpers
// =========================================================================

fn corn() -> CommodityType {
    CommodityType::new("corn")
}

fn market_with(supply: i64, value: f64, demand: f64) -> Market {
    Market::new(MarketConfig {
        commodities: vec![Commodity::new("corn", supply, value, demand)],
    })
}

// =========================================================================
// Price curve
// =========================================================================

#[test]
fn test_price_halves_when_supply_equals_demand() {
    for (value, demand) in [(100.0, 100.0), (37.5, 12.0), (1.0, 3.0), (250.0, 7.0)] {
        let c = Commodity::new("corn", demand as i64, value, demand);
        assert_eq!(c.price(), value / 2.0, "value={value} demand={demand}");
    }
}

#[test]
fn test_price_halves_again_at_twice_demand() {
    let c = Commodity::new("corn", 200, 100.0, 100.0);
    assert_eq!(c.price(), 25.0);
}

#[test]
fn test_price_strictly_decreasing_in_supply() {
    let c = Commodity::new("corn", 0, 100.0, 100.0);
    let mut previous = c.price_at(-50);
    for supply in -49..=1_000 {
        let price = c.price_at(supply);
        assert!(price < previous, "price did not drop at supply {supply}");
        previous = price;
    }
}

// =========================================================================
// Sell
// =========================================================================

#[test]
fn test_sell_increases_supply_by_quantity() {
    let mut market = market_with(100, 100.0, 100.0);
    for quantity in [1, 5, 42, 100] {
        let before = market.commodity(&corn()).unwrap().supply;
        market.sell(&corn(), quantity);
        let after = market.commodity(&corn()).unwrap().supply;
        assert_eq!(after - before, quantity as i64);
    }
}

#[test]
fn test_sell_price_lies_between_before_and_after_prices() {
    for quantity in [0, 1, 2, 10, 99, 500] {
        let mut market = market_with(100, 100.0, 100.0);
        let before = market.price(&corn());
        let sold = market.sell(&corn(), quantity);
        let after = market.price(&corn());

        let low = before.min(after);
        let high = before.max(after);
        assert!(
            low <= sold && sold <= high,
            "quantity {quantity}: {sold} not in [{low}, {high}]"
        );
    }
}

#[test]
fn test_bulk_sale_beats_post_sale_price() {
    let mut market = market_with(100, 100.0, 100.0);
    let sold = market.sell(&corn(), 50);
    assert!(sold > market.price(&corn()));
}

#[test]
fn test_single_unit_from_empty_market_sells_at_full_value() {
    // Both ends of the average sit at supply 0; the stored supply ends at 1.
    let mut market = market_with(0, 100.0, 100.0);
    assert_eq!(market.sell(&corn(), 1), 100.0);
    assert_eq!(market.commodity(&corn()).unwrap().supply, 1);
}

// =========================================================================
// Unknown commodity
// =========================================================================

#[test]
fn test_unknown_commodity_has_zero_price() {
    let market = Market::default();
    assert_eq!(market.price(&CommodityType::new("gold")), 0.0);
}

#[test]
fn test_unknown_commodity_sell_is_a_no_op() {
    let mut market = Market::default();
    let before: Vec<i64> = market
        .commodities()
        .iter()
        .map(|c| market.commodity(c).unwrap().supply)
        .collect();

    assert_eq!(market.sell(&CommodityType::new("gold"), 10), 0.0);

    let after: Vec<i64> = market
        .commodities()
        .iter()
        .map(|c| market.commodity(c).unwrap().supply)
        .collect();
    assert_eq!(before, after);
    assert!(market.commodity(&CommodityType::new("gold")).is_none());
}
