//! Commodity price discovery for Bazaar.
//!
//! Every commodity is priced by an exponential supply/demand curve:
//!
//! ```text
//! price = value * 2^(-supply / demand)
//! ```
//!
//! The price is `value` when the market holds nothing and halves every time
//! supply grows by `demand` units. Selling adds product to the market, so
//! every sale pushes the price down for the next seller.
//!
//! The market knows nothing about phases, timers, or players. The trade
//! phase is its only caller.

use std::collections::HashMap;

use bazaar_protocol::CommodityType;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

// ---------------------------------------------------------------------------
// Commodity
// ---------------------------------------------------------------------------

/// One commodity's pricing parameters and current stock.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Commodity {
    /// Display name, also used as the commodity's [`CommodityType`].
    pub name: String,

    /// How much product the market is holding, trying to sell.
    pub supply: i64,

    /// The price of one unit if the product were infinitely rare
    /// (supply is zero).
    pub value: f64,

    /// The supply at which the price is half of `value`.
    pub demand: f64,
}

impl Commodity {
    /// Creates a commodity with the given starting parameters.
    pub fn new(name: impl Into<String>, supply: i64, value: f64, demand: f64) -> Self {
        Self {
            name: name.into(),
            supply,
            value,
            demand,
        }
    }

    /// The commodity type this record is keyed under.
    pub fn kind(&self) -> CommodityType {
        CommodityType::new(self.name.clone())
    }

    /// Current unit price.
    pub fn price(&self) -> f64 {
        self.price_at(self.supply)
    }

    /// Unit price the curve gives for an arbitrary supply.
    ///
    /// Supply may be negative here: [`sell`](Self::sell) evaluates the curve
    /// one unit below the current stock when selling a single unit.
    pub fn price_at(&self, supply: i64) -> f64 {
        self.value * (-(supply as f64) / self.demand).exp2()
    }

    /// Sells `quantity` units and returns the per-unit price for the lot.
    ///
    /// The price is the mean of the price at the original supply and the
    /// price of the last unit sold (`supply + quantity - 1`). Charging the
    /// pre-sale price for every unit would let bulk sellers escape the drop
    /// they cause; charging the post-sale price would make them pay for it
    /// twice. The midpoint sits between the two and leans slightly in the
    /// bulk seller's favour.
    ///
    /// Stored supply grows by exactly `quantity`. Selling nothing returns
    /// the current price and leaves the stock alone.
    pub fn sell(&mut self, quantity: u64) -> f64 {
        if quantity == 0 {
            return self.price();
        }
        let quantity = i64::try_from(quantity).unwrap_or(i64::MAX);

        let initial = self.price();
        let last_unit = self.price_at(self.supply.saturating_add(quantity - 1));
        self.supply = self.supply.saturating_add(quantity);

        (initial + last_unit) / 2.0
    }
}

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// The commodities a market starts with, in listing order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketConfig {
    pub commodities: Vec<Commodity>,
}

impl Default for MarketConfig {
    /// Four commodities, each with supply 100, value 100.0 and demand 100.0.
    fn default() -> Self {
        let commodities = ["tomato", "blueberry", "corn", "purple"]
            .into_iter()
            .map(|name| Commodity::new(name, 100, 100.0, 100.0))
            .collect();
        Self { commodities }
    }
}

impl MarketConfig {
    /// Drops entries the price curve can't handle.
    ///
    /// Called automatically by [`Market::new`]. Rules:
    /// - `value` and `demand` must be finite and strictly positive.
    /// - Names must be unique; later duplicates are dropped.
    pub fn validated(mut self) -> Self {
        let mut seen = Vec::with_capacity(self.commodities.len());
        self.commodities.retain(|c| {
            let usable = c.value.is_finite()
                && c.value > 0.0
                && c.demand.is_finite()
                && c.demand > 0.0;
            if !usable {
                warn!(commodity = %c.name, value = c.value, demand = c.demand, "unusable commodity parameters, dropping");
                return false;
            }
            if seen.contains(&c.name) {
                warn!(commodity = %c.name, "duplicate commodity, dropping");
                return false;
            }
            seen.push(c.name.clone());
            true
        });
        self
    }
}

// ---------------------------------------------------------------------------
// Market
// ---------------------------------------------------------------------------

/// The session-wide pricing table.
///
/// The commodity set is closed at construction. Operations on a type the
/// market doesn't list answer with a zero price and change nothing.
#[derive(Debug, Clone)]
pub struct Market {
    commodities: HashMap<CommodityType, Commodity>,
    /// Commodity types in configured order. `HashMap` has no order of its own.
    order: Vec<CommodityType>,
}

impl Market {
    /// Builds a market from config.
    pub fn new(config: MarketConfig) -> Self {
        let config = config.validated();
        let order: Vec<CommodityType> = config.commodities.iter().map(Commodity::kind).collect();
        let commodities = config
            .commodities
            .into_iter()
            .map(|c| (c.kind(), c))
            .collect();
        Self { commodities, order }
    }

    /// Current unit price of a commodity, or `0.0` if it isn't listed.
    pub fn price(&self, kind: &CommodityType) -> f64 {
        self.commodities.get(kind).map_or(0.0, Commodity::price)
    }

    /// Sells `quantity` units of a commodity and returns the per-unit price.
    ///
    /// See [`Commodity::sell`] for how the price is computed. Returns `0.0`
    /// and changes nothing if the commodity isn't listed.
    pub fn sell(&mut self, kind: &CommodityType, quantity: u64) -> f64 {
        let Some(commodity) = self.commodities.get_mut(kind) else {
            debug!(commodity = %kind, "sell of unlisted commodity ignored");
            return 0.0;
        };
        let price = commodity.sell(quantity);
        debug!(
            commodity = %kind,
            quantity,
            price,
            supply = commodity.supply,
            "commodity sold"
        );
        price
    }

    /// Looks up a commodity record.
    pub fn commodity(&self, kind: &CommodityType) -> Option<&Commodity> {
        self.commodities.get(kind)
    }

    /// Listed commodity types, in configured order.
    pub fn commodities(&self) -> &[CommodityType] {
        &self.order
    }
}

impl Default for Market {
    fn default() -> Self {
        Self::new(MarketConfig::default())
    }
}
