#![forbid(unsafe_code)]

mod input_output;
mod timestamp;
mod trade_pairs;
mod transaction;

use anyhow::{bail, Context, Result};
use csv::{ReaderBuilder, WriterBuilder};
pub use input_output::{
    normalize_trade_id, unsigned_amount, K33Columns, K33Record, KoinlyRecord, TradeId,
    KOINLY_HEADER,
};
use std::io::{Read, Write};
use thiserror::Error;
pub use timestamp::{convert_timestamp, try_convert_timestamp, TimestampError};
pub use trade_pairs::{CompletedTrade, PendingTrade, TradePairs, TradeSide};
pub use transaction::Transaction;

/// Converts K33 exports into Koinly universal CSV.
///
/// Trade legs are buffered per converter, so each conversion job should use its
/// own instance.
#[derive(Debug, Default)]
pub struct Converter {
    trades: TradePairs,
}

impl Converter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Maps one K33 row to the Koinly row it produces, if any.
    ///
    /// Trade rows only produce output once both legs of the trade have been seen.
    pub fn convert_record(&mut self, record: K33Record) -> Option<KoinlyRecord> {
        if record.type_status.is_empty() || record.timestamp.is_empty() {
            return None;
        }
        let date = convert_timestamp(&record.timestamp);
        match Transaction::from(record) {
            Transaction::Deposit(deposit) => Some(KoinlyRecord::deposit(&deposit, date)),
            Transaction::Withdrawal(withdrawal) => {
                Some(KoinlyRecord::withdrawal(&withdrawal, date))
            }
            Transaction::Trade(leg) => self.trades.add_leg(leg, &date).map(KoinlyRecord::from),
            Transaction::Unrecognized(_) => None,
        }
    }

    /// Converts a whole K33 export and writes the Koinly CSV to `output`.
    pub fn process(&mut self, input: impl Read, output: impl Write) -> Result<()> {
        let mut records = vec![];
        for record in read_k33_records(input)? {
            let record = record?;
            if record.is_rejected() {
                continue;
            }
            records.extend(self.convert_record(record));
        }
        self.report_unpaired();

        let mut writer = WriterBuilder::new().has_headers(false).from_writer(output);
        writer.write_record(&KOINLY_HEADER).context("writing header")?;
        for record in &records {
            writer.serialize(record).context("writing record")?;
        }
        writer.flush().context("flushing output")?;
        Ok(())
    }

    /// Runs the same conversion as [`Converter::process`] but only describes
    /// the resulting rows on `report`.
    pub fn preview(&mut self, input: impl Read, report: &mut impl Write) -> Result<()> {
        let records = read_k33_records(input)?;
        writeln!(report, "K33 to Koinly Conversion (Dry Run)")?;
        writeln!(report, "==================================")?;
        for record in records {
            let record = record?;
            if record.is_rejected() {
                writeln!(report, "SKIPPED (Rejected): {}", record.type_status)?;
                continue;
            }
            if let Some(koinly) = self.convert_record(record) {
                writeln!(report, "{}", koinly)?;
            }
        }
        self.report_unpaired();
        Ok(())
    }

    /// Trades still waiting for a leg, ordered by trade ID.
    pub fn unpaired_trades(&self) -> impl Iterator<Item = &TradeId> {
        self.trades
            .unpaired()
            .into_iter()
            .map(|trade| &trade.trade_id)
    }

    fn report_unpaired(&self) {
        for trade_id in self.unpaired_trades() {
            log::warn!("Unpaired trade {}", trade_id);
        }
    }
}

fn read_k33_records(input: impl Read) -> Result<impl Iterator<Item = Result<K33Record>>> {
    let mut reader = ReaderBuilder::new().flexible(true).from_reader(input);
    let header = reader.headers().context("reading header")?;
    if header.is_empty() {
        bail!(ConversionError::MissingHeader);
    }
    let columns = K33Columns::from_header(header);
    let mut line_number = 1; // The header is line 1.
    Ok(reader.into_records().map(move |row| {
        line_number += 1;
        let row = row.with_context(|| format!("reading line number {}", line_number))?;
        Ok(columns.parse(&row))
    }))
}

#[derive(Error, Debug)]
pub enum ConversionError {
    #[error("input has no header row")]
    MissingHeader,
}
