use crate::trade_pairs::CompletedTrade;
use csv::StringRecord;
use derive_more::Display;
use rust_decimal::Decimal;
use serde::Serialize;
use std::{fmt, str::FromStr};

pub const KOINLY_HEADER: [&str; 12] = [
    "Date",
    "Sent Amount",
    "Sent Currency",
    "Received Amount",
    "Received Currency",
    "Fee Amount",
    "Fee Currency",
    "Net Worth Amount",
    "Net Worth Currency",
    "Label",
    "Description",
    "TxHash",
];

#[derive(Debug, Display, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TradeId(String);

impl TradeId {
    /// Builds a trade ID from a raw K33 value. Empty values carry no key.
    pub fn parse(raw: &str) -> Option<Self> {
        let normalized = normalize_trade_id(raw);
        (!normalized.is_empty()).then(|| Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// A single K33 export row, reduced to the columns the conversion needs.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct K33Record {
    pub type_status: String,
    pub trade_id: Option<TradeId>,
    pub side: String,
    pub amount: String,
    pub trade_status: String,
    pub asset: String,
    pub timestamp: String,
    pub deposit_tx_hash: String,
    pub withdrawal_tx_hash: String,
}

impl K33Record {
    pub fn is_rejected(&self) -> bool {
        self.trade_status == "Reject"
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
enum K33Column {
    TypeStatus,
    TradeId,
    Side,
    Amount,
    TradeStatus,
    Asset,
    Timestamp,
    DepositTxHash,
    WithdrawalTxHash,
}

impl FromStr for K33Column {
    type Err = ();

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        let column = match name.trim_start_matches('\u{feff}').trim() {
            "Type/Status" => Self::TypeStatus,
            "TradeID" => Self::TradeId,
            "Side" => Self::Side,
            "Amount" => Self::Amount,
            "Trade Status" => Self::TradeStatus,
            "Asset" => Self::Asset,
            "Timestamp (UTC)" => Self::Timestamp,
            "DepositTxhash" => Self::DepositTxHash,
            "WithdrawalTxhash" => Self::WithdrawalTxHash,
            _ => return Err(()),
        };
        Ok(column)
    }
}

/// Positions of the recognized K33 columns within a header row.
///
/// Columns may come in any order; unknown ones are ignored. When a recognized
/// name repeats, the right-most column wins.
#[derive(Debug, Clone, Default)]
pub struct K33Columns {
    positions: Vec<(usize, K33Column)>,
}

impl K33Columns {
    pub fn from_header<'a>(header: impl IntoIterator<Item = &'a str>) -> Self {
        let positions = header
            .into_iter()
            .enumerate()
            .filter_map(|(position, name)| Some((position, name.parse::<K33Column>().ok()?)))
            .collect();
        Self { positions }
    }

    pub fn parse(&self, row: &StringRecord) -> K33Record {
        let mut record = K33Record::default();
        for &(position, column) in &self.positions {
            let value = match row.get(position) {
                Some(value) => value,
                None => continue,
            };
            match column {
                K33Column::TypeStatus => record.type_status = value.into(),
                K33Column::TradeId => record.trade_id = TradeId::parse(value),
                K33Column::Side => record.side = value.into(),
                K33Column::Amount => record.amount = value.into(),
                K33Column::TradeStatus => record.trade_status = value.into(),
                K33Column::Asset => record.asset = value.into(),
                K33Column::Timestamp => record.timestamp = value.into(),
                K33Column::DepositTxHash => record.deposit_tx_hash = value.into(),
                K33Column::WithdrawalTxHash => record.withdrawal_tx_hash = value.into(),
            }
        }
        record
    }
}

/// Rewrites trade IDs that a spreadsheet turned into floats (`1.000000012345e+12`)
/// back into plain integers. Non-numeric IDs are returned as they are.
pub fn normalize_trade_id(raw: &str) -> String {
    match raw.parse::<f64>() {
        Ok(number) if number.is_finite() => format!("{:.0}", number),
        _ => raw.to_owned(),
    }
}

/// Amount without its leading `-`, otherwise exactly as K33 wrote it.
pub fn unsigned_amount(amount: &str) -> String {
    if !amount.is_empty() && Decimal::from_str(amount).is_err() {
        log::warn!("amount <{}> is not a decimal number. Continuing.", amount);
    }
    amount.strip_prefix('-').unwrap_or(amount).to_owned()
}

/// One row of the Koinly universal CSV format.
#[derive(Serialize, Debug, Default, Clone, PartialEq)]
pub struct KoinlyRecord {
    #[serde(rename = "Date")]
    pub date: String,
    #[serde(rename = "Sent Amount")]
    pub sent_amount: String,
    #[serde(rename = "Sent Currency")]
    pub sent_currency: String,
    #[serde(rename = "Received Amount")]
    pub received_amount: String,
    #[serde(rename = "Received Currency")]
    pub received_currency: String,
    #[serde(rename = "Fee Amount")]
    pub fee_amount: String,
    #[serde(rename = "Fee Currency")]
    pub fee_currency: String,
    #[serde(rename = "Net Worth Amount")]
    pub net_worth_amount: String,
    #[serde(rename = "Net Worth Currency")]
    pub net_worth_currency: String,
    #[serde(rename = "Label")]
    pub label: String,
    #[serde(rename = "Description")]
    pub description: String,
    #[serde(rename = "TxHash")]
    pub tx_hash: Option<String>,
}

impl KoinlyRecord {
    pub fn deposit(record: &K33Record, date: String) -> Self {
        Self {
            date,
            received_amount: unsigned_amount(&record.amount),
            received_currency: record.asset.clone(),
            description: "Deposit (K33)".into(),
            tx_hash: non_empty(&record.deposit_tx_hash),
            ..Self::default()
        }
    }

    pub fn withdrawal(record: &K33Record, date: String) -> Self {
        Self {
            date,
            sent_amount: unsigned_amount(&record.amount),
            sent_currency: record.asset.clone(),
            description: "Withdrawal (K33)".into(),
            tx_hash: non_empty(&record.withdrawal_tx_hash),
            ..Self::default()
        }
    }
}

impl From<CompletedTrade> for KoinlyRecord {
    fn from(trade: CompletedTrade) -> Self {
        Self {
            date: trade.timestamp,
            sent_amount: unsigned_amount(&trade.sell_leg.amount),
            sent_currency: trade.sell_leg.asset,
            received_amount: unsigned_amount(&trade.buy_leg.amount),
            received_currency: trade.buy_leg.asset,
            description: format!("Trade (K33) - {}", trade.trade_id),
            ..Self::default()
        }
    }
}

/// Preview line used by the dry run.
impl fmt::Display for KoinlyRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} | {} {} -> {} {} | {}",
            self.date,
            self.sent_amount,
            self.sent_currency,
            self.received_amount,
            self.received_currency,
            self.description
        )
    }
}

fn non_empty(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_owned())
}
