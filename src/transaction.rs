use crate::input_output::K33Record;

/// K33 row categorised by its `Type/Status` label.
#[derive(Debug, Clone, PartialEq)]
pub enum Transaction {
    Deposit(K33Record),
    Withdrawal(K33Record),
    Trade(K33Record),
    Unrecognized(K33Record),
}

impl From<K33Record> for Transaction {
    fn from(record: K33Record) -> Self {
        use Transaction::*;
        // "Deposit" and "Withdrawal" match anywhere in the label (e.g. "Deposit Complete"),
        // trades only on the exact label.
        if record.type_status.contains("Deposit") {
            Deposit(record)
        } else if record.type_status.contains("Withdrawal") {
            Withdrawal(record)
        } else if record.type_status == "Trade" {
            Trade(record)
        } else {
            Unrecognized(record)
        }
    }
}
