//! The three phases of a session and their rules.
//!
//! ```text
//!            all ready, ≥ min players        last round closed
//!   Waiting ─────────────────────────→ Auction ───────────────→ Trade
//!      ↑                                                          │
//!      └──────────────────────── trading time up ─────────────────┘
//! ```
//!
//! A phase never replaces itself. Each hook gets the session's shared state
//! through a [`GameContext`] and returns the phase it wants next, if any;
//! [`Game`](crate::Game) performs the switch once the hook has returned.

use std::collections::VecDeque;
use std::time::Duration;

use bazaar_protocol::{CommodityType, Message, PhaseName, PlayerInfo, UserId};
use rand::Rng;
use tracing::{debug, info};

use crate::game::GameContext;
use crate::{GameConnection, User};

/// What a hook asks the game to do next.
pub(crate) type Transition = Option<PhaseName>;

/// The active phase with its phase-local state.
///
/// Built fresh on every entry and dropped on exit, so nothing leaks from
/// one round of the cycle into the next.
#[derive(Debug)]
pub enum Phase {
    Waiting(Waiting),
    Auction(Auction),
    Trade(Trade),
}

impl Phase {
    /// A freshly entered phase with empty local state.
    pub fn new(name: PhaseName) -> Self {
        match name {
            PhaseName::Waiting => Self::Waiting(Waiting::default()),
            PhaseName::Auction => Self::Auction(Auction::default()),
            PhaseName::Trade => Self::Trade(Trade::default()),
        }
    }

    pub fn name(&self) -> PhaseName {
        match self {
            Self::Waiting(_) => PhaseName::Waiting,
            Self::Auction(_) => PhaseName::Auction,
            Self::Trade(_) => PhaseName::Trade,
        }
    }

    pub(crate) fn begin<C: GameConnection>(&mut self, ctx: &mut GameContext<C>) -> Transition {
        match self {
            Self::Waiting(_) => None,
            Self::Auction(auction) => auction.begin(ctx),
            Self::Trade(trade) => trade.begin(ctx),
        }
    }

    pub(crate) fn end<C: GameConnection>(&mut self, ctx: &mut GameContext<C>) {
        if let Self::Trade(trade) = self {
            debug!(game = %ctx.name, sales = trade.sales, "trading closed");
        }
    }

    pub(crate) fn timer<C: GameConnection>(
        &mut self,
        ctx: &mut GameContext<C>,
        now: Duration,
    ) -> Transition {
        debug!(game = %ctx.name, phase = %self.name(), now_ms = now.as_millis() as u64, "timeout fired");
        match self {
            Self::Waiting(_) => None,
            Self::Auction(auction) => auction.timer(ctx),
            Self::Trade(_) => Some(PhaseName::Waiting),
        }
    }

    pub(crate) fn receive<C: GameConnection>(
        &mut self,
        ctx: &mut GameContext<C>,
        user: &mut dyn User,
        message: &Message,
    ) -> Transition {
        match self {
            Self::Waiting(waiting) => waiting.receive(ctx, user, message),
            Self::Auction(auction) => auction.receive(ctx, user, message),
            Self::Trade(trade) => trade.receive(ctx, user, message),
        }
    }
}

// ---------------------------------------------------------------------------
// Waiting
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
struct RosterEntry {
    user: UserId,
    name: String,
    ready: bool,
}

/// The lobby: collects players and their readiness.
#[derive(Debug, Default)]
pub struct Waiting {
    /// Known users in first-contact order.
    roster: Vec<RosterEntry>,
}

impl Waiting {
    /// Roster snapshot in first-contact order.
    pub fn players(&self) -> Vec<PlayerInfo> {
        self.roster
            .iter()
            .map(|e| PlayerInfo {
                name: e.name.clone(),
                ready: e.ready,
            })
            .collect()
    }

    /// Whether enough known users are present and every one is ready.
    pub fn can_start(&self, min_players: usize) -> bool {
        self.roster.len() >= min_players && self.roster.iter().all(|e| e.ready)
    }

    fn entry(&mut self, user: &dyn User) -> &mut RosterEntry {
        let id = user.id();
        let index = match self.roster.iter().position(|e| e.user == id) {
            Some(index) => index,
            None => {
                self.roster.push(RosterEntry {
                    user: id,
                    name: user.name().to_owned(),
                    ready: false,
                });
                self.roster.len() - 1
            }
        };
        &mut self.roster[index]
    }

    fn receive<C: GameConnection>(
        &mut self,
        ctx: &mut GameContext<C>,
        user: &mut dyn User,
        message: &Message,
    ) -> Transition {
        match message {
            Message::Join => {
                if self.roster.iter().any(|e| e.user == user.id()) {
                    return None;
                }
                self.entry(user);
            }
            Message::Ready { ready } => {
                self.entry(user).ready = *ready;
            }
            Message::Leave => {
                let before = self.roster.len();
                self.roster.retain(|e| e.user != user.id());
                if self.roster.len() == before {
                    return None;
                }
            }
            Message::SetName { .. } => {
                let id = user.id();
                let Some(entry) = self.roster.iter_mut().find(|e| e.user == id) else {
                    return None;
                };
                entry.name = user.name().to_owned();
            }
            _ => {
                debug!(game = %ctx.name, user = %user.id(), action = %message.action(), "ignored while waiting");
                return None;
            }
        }

        ctx.broadcast(&Message::PlayerInfoUpdated {
            info: self.players(),
        });

        if self.can_start(ctx.config.min_players) {
            info!(game = %ctx.name, players = self.roster.len(), "everyone ready");
            return Some(PhaseName::Auction);
        }
        None
    }
}

// ---------------------------------------------------------------------------
// Auction
// ---------------------------------------------------------------------------

/// The best bid of the open round so far.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeadingBid {
    pub amount: i64,
    /// Display name of the bidder when the bid was placed.
    pub bidder: String,
}

/// Sequential single-lot rounds, each closed by the bid timeout.
#[derive(Debug, Default)]
pub struct Auction {
    lots: VecDeque<CommodityType>,
    round: Option<CommodityType>,
    leading: Option<LeadingBid>,
}

impl Auction {
    /// The commodity of the open round.
    pub fn round(&self) -> Option<&CommodityType> {
        self.round.as_ref()
    }

    pub fn leading_bid(&self) -> Option<&LeadingBid> {
        self.leading.as_ref()
    }

    /// Lots still waiting for a round of their own.
    pub fn remaining_lots(&self) -> usize {
        self.lots.len()
    }

    fn begin<C: GameConnection>(&mut self, ctx: &mut GameContext<C>) -> Transition {
        self.lots = ctx.config.lots(&ctx.market);
        info!(game = %ctx.name, lots = self.lots.len(), "auction opened");
        self.open_round(ctx)
    }

    fn timer<C: GameConnection>(&mut self, ctx: &mut GameContext<C>) -> Transition {
        let bid_time = ctx.config.auction_bid_time;
        if let Some(leading) = self.leading.take() {
            info!(
                game = %ctx.name,
                commodity = ?self.round,
                bid = leading.amount,
                winner = %leading.bidder,
                "round closed"
            );
            ctx.broadcast(&Message::BidUpdated {
                bid: leading.amount,
                winner: leading.bidder,
            });
            ctx.broadcast(&Message::set_clock(bid_time));
        } else {
            debug!(game = %ctx.name, commodity = ?self.round, "round closed without bids");
        }
        self.open_round(ctx)
    }

    /// Opens the next round, or asks for the trade stage once the lots
    /// run out.
    fn open_round<C: GameConnection>(&mut self, ctx: &mut GameContext<C>) -> Transition {
        let Some(lot) = self.lots.pop_front() else {
            self.round = None;
            return Some(PhaseName::Trade);
        };

        let bid_time = ctx.config.auction_bid_time;
        let seed: u32 = ctx.rng.random();
        debug!(game = %ctx.name, commodity = %lot, seed, "round opened");

        ctx.broadcast(&Message::AuctionSeed { seed });
        ctx.broadcast(&Message::set_clock(bid_time));
        ctx.clock.set_timeout(bid_time);
        self.leading = None;
        self.round = Some(lot);
        None
    }

    fn receive<C: GameConnection>(
        &mut self,
        ctx: &mut GameContext<C>,
        user: &mut dyn User,
        message: &Message,
    ) -> Transition {
        match message {
            Message::Bid { amount } if self.round.is_some() => {
                debug!(game = %ctx.name, user = %user.id(), amount, "bid placed");
                self.leading = Some(LeadingBid {
                    amount: *amount,
                    bidder: user.name().to_owned(),
                });
            }
            _ => {
                debug!(game = %ctx.name, user = %user.id(), action = %message.action(), "ignored during auction");
            }
        }
        None
    }
}

// ---------------------------------------------------------------------------
// Trade
// ---------------------------------------------------------------------------

/// Free trading against the shared market until the stage times out.
#[derive(Debug, Default)]
pub struct Trade {
    sales: u64,
}

impl Trade {
    /// Sales completed this stage.
    pub fn sales(&self) -> u64 {
        self.sales
    }

    fn begin<C: GameConnection>(&mut self, ctx: &mut GameContext<C>) -> Transition {
        let trading_time = ctx.config.trading_stage_time;
        ctx.broadcast(&Message::set_clock(trading_time));
        ctx.clock.set_timeout(trading_time);
        None
    }

    fn receive<C: GameConnection>(
        &mut self,
        ctx: &mut GameContext<C>,
        user: &mut dyn User,
        message: &Message,
    ) -> Transition {
        match message {
            Message::Sell {
                commodity,
                quantity,
            } => {
                if ctx.market.commodity(commodity).is_none() {
                    debug!(game = %ctx.name, user = %user.id(), %commodity, "sell of unlisted commodity ignored");
                    return None;
                }
                let price = ctx.market.sell(commodity, *quantity);
                self.sales += 1;
                ctx.reply(
                    user,
                    &Message::SaleCompleted {
                        commodity: commodity.clone(),
                        quantity: *quantity,
                        price,
                    },
                );
                let quote = ctx.market.price(commodity);
                ctx.broadcast(&Message::PriceUpdated {
                    commodity: commodity.clone(),
                    price: quote,
                });
            }
            Message::Trade { materials } => {
                ctx.reply(
                    user,
                    &Message::TradeCompleted {
                        materials: materials.clone(),
                    },
                );
            }
            _ => {
                debug!(game = %ctx.name, user = %user.id(), action = %message.action(), "ignored while trading");
            }
        }
        None
    }
}
