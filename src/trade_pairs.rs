use crate::input_output::{K33Record, TradeId};
use std::collections::HashMap;

#[derive(Debug, Copy, Clone, PartialEq)]
pub enum TradeSide {
    Buy,
    Sell,
}

impl TradeSide {
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "Buy" => Some(TradeSide::Buy),
            "Sell" => Some(TradeSide::Sell),
            _ => None,
        }
    }
}

/// A trade for which only some of its legs have been seen so far.
#[derive(Debug)]
pub struct PendingTrade {
    pub trade_id: TradeId,
    /// Koinly formatted timestamp of the first leg that arrived.
    pub timestamp: String,
    buy_leg: Option<K33Record>,
    sell_leg: Option<K33Record>,
}

impl PendingTrade {
    fn new(trade_id: TradeId, timestamp: String) -> Self {
        PendingTrade {
            trade_id,
            timestamp,
            buy_leg: None,
            sell_leg: None,
        }
    }

    pub fn has_legs(&self) -> bool {
        self.buy_leg.is_some() || self.sell_leg.is_some()
    }
}

/// Both legs of a trade, ready to become a single Koinly row.
#[derive(Debug)]
pub struct CompletedTrade {
    pub trade_id: TradeId,
    pub timestamp: String,
    pub buy_leg: K33Record,
    pub sell_leg: K33Record,
}

/// Trades waiting for their second leg, keyed by trade ID.
#[derive(Debug, Default)]
pub struct TradePairs {
    pending: HashMap<TradeId, PendingTrade>,
}

impl TradePairs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a trade leg and hands back the whole trade once its other leg is
    /// already present. Legs without a trade ID are dropped.
    ///
    /// A leg whose side is neither `Buy` nor `Sell` still opens the pending
    /// trade but fills no slot, so its data never reaches the output.
    pub fn add_leg(&mut self, leg: K33Record, timestamp: &str) -> Option<CompletedTrade> {
        let trade_id = leg.trade_id.clone()?;
        let mut pending = self
            .pending
            .remove(&trade_id)
            .unwrap_or_else(|| PendingTrade::new(trade_id.clone(), timestamp.to_owned()));
        match TradeSide::from_label(&leg.side) {
            Some(TradeSide::Buy) => pending.buy_leg = Some(leg),
            Some(TradeSide::Sell) => pending.sell_leg = Some(leg),
            None => {}
        }
        match (pending.buy_leg, pending.sell_leg) {
            (Some(buy_leg), Some(sell_leg)) => Some(CompletedTrade {
                trade_id,
                timestamp: pending.timestamp,
                buy_leg,
                sell_leg,
            }),
            (buy_leg, sell_leg) => {
                self.pending.insert(
                    trade_id,
                    PendingTrade {
                        buy_leg,
                        sell_leg,
                        ..pending
                    },
                );
                None
            }
        }
    }

    /// Pending trades holding at least one leg, ordered by trade ID.
    pub fn unpaired(&self) -> Vec<&PendingTrade> {
        let mut unpaired = self
            .pending
            .values()
            .filter(|trade| trade.has_legs())
            .collect::<Vec<_>>();
        unpaired.sort_by(|a, b| a.trade_id.cmp(&b.trade_id));
        unpaired
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leg(trade_id: &str, side: &str, amount: &str, asset: &str) -> K33Record {
        K33Record {
            type_status: "Trade".into(),
            trade_id: TradeId::parse(trade_id),
            side: side.into(),
            amount: amount.into(),
            asset: asset.into(),
            timestamp: "2023/01/15 10:30:45".into(),
            ..K33Record::default()
        }
    }

    #[test]
    fn pairs_sell_then_buy() {
        let mut pairs = TradePairs::new();
        assert!(pairs
            .add_leg(leg("7", "Sell", "-0.5", "BTC"), "2023-01-15 10:30:45")
            .is_none());
        assert_eq!(1, pairs.len());

        let trade = pairs
            .add_leg(leg("7", "Buy", "1000", "USD"), "2023-01-15 10:30:46")
            .expect("completed trade");
        assert_eq!("7", trade.trade_id.as_str());
        assert_eq!("2023-01-15 10:30:45", trade.timestamp);
        assert_eq!("BTC", trade.sell_leg.asset);
        assert_eq!("USD", trade.buy_leg.asset);
        assert!(pairs.is_empty());
    }

    #[test]
    fn pairs_buy_then_sell() {
        let mut pairs = TradePairs::new();
        assert!(pairs
            .add_leg(leg("7", "Buy", "1000", "USD"), "2023-01-15 10:30:45")
            .is_none());
        let trade = pairs
            .add_leg(leg("7", "Sell", "-0.5", "BTC"), "2023-01-15 10:30:45")
            .expect("completed trade");
        assert_eq!("-0.5", trade.sell_leg.amount);
        assert_eq!("1000", trade.buy_leg.amount);
    }

    #[test]
    fn keeps_trades_apart_by_id() {
        let mut pairs = TradePairs::new();
        assert!(pairs.add_leg(leg("1", "Sell", "-1", "BTC"), "t").is_none());
        assert!(pairs.add_leg(leg("2", "Buy", "1", "ETH"), "t").is_none());
        assert_eq!(2, pairs.unpaired().len());
    }

    #[test]
    fn drops_legs_without_trade_id() {
        let mut pairs = TradePairs::new();
        assert!(pairs.add_leg(leg("", "Buy", "1", "USD"), "t").is_none());
        assert!(pairs.is_empty());
    }

    #[test]
    fn unknown_side_never_completes() {
        let mut pairs = TradePairs::new();
        assert!(pairs.add_leg(leg("9", "Sell", "-1", "BTC"), "t").is_none());
        assert!(pairs.add_leg(leg("9", "Swap", "2", "ETH"), "t").is_none());
        assert_eq!(1, pairs.unpaired().len());

        let mut pairs = TradePairs::new();
        assert!(pairs.add_leg(leg("10", "Swap", "2", "ETH"), "t").is_none());
        assert_eq!(1, pairs.len());
        assert!(pairs.unpaired().is_empty());
    }

    #[test]
    fn reused_trade_id_starts_a_new_pair() {
        let mut pairs = TradePairs::new();
        pairs.add_leg(leg("5", "Buy", "1", "USD"), "first");
        assert!(pairs.add_leg(leg("5", "Sell", "-1", "BTC"), "first").is_some());
        assert!(pairs.is_empty());
        assert!(pairs.add_leg(leg("5", "Buy", "2", "USD"), "second").is_none());
        let unpaired = pairs.unpaired();
        assert_eq!(1, unpaired.len());
        assert_eq!("second", unpaired[0].timestamp);
    }

    #[test]
    fn single_leg_stays_buffered_until_its_pair_arrives() {
        let mut pairs = TradePairs::new();
        assert!(pairs.add_leg(leg("3", "Sell", "-2", "BTC"), "first").is_none());
        assert!(pairs.add_leg(leg("3", "Sell", "-3", "BTC"), "later").is_none());
        assert_eq!(1, pairs.unpaired().len());

        let trade = pairs
            .add_leg(leg("3", "Buy", "60000", "USD"), "last")
            .expect("completed trade");
        assert_eq!("first", trade.timestamp);
        assert_eq!("-3", trade.sell_leg.amount);
        assert_eq!("60000", trade.buy_leg.amount);
        assert!(pairs.is_empty());
    }

    #[test]
    fn unpaired_is_ordered_by_trade_id() {
        let mut pairs = TradePairs::new();
        pairs.add_leg(leg("b", "Buy", "1", "USD"), "t");
        pairs.add_leg(leg("a", "Sell", "-1", "BTC"), "t");
        let ids = pairs
            .unpaired()
            .iter()
            .map(|trade| trade.trade_id.as_str())
            .collect::<Vec<_>>();
        assert_eq!(vec!["a", "b"], ids);
    }
}
