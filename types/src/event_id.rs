//! Order-preserving event identifiers.
//!
//! Every contract event gets a globally unique id built from its position
//! in the chain: a 19-digit zero-padded total-order value for the
//! emitting operation, a hyphen, and a 10-digit zero-padded index of the
//! event within that operation's transaction. Zero padding makes the ids
//! sort into emission order lexicographically, so a plain string index
//! over event ids is also a time index.

/// Pack `(ledger_seq, tx_index, op_index)` into a single total-order value.
///
/// Layout: ledger sequence in the high 32 bits, transaction index in the
/// next 20, operation index in the low 12. `ledger_seq` must not exceed
/// `i32::MAX` (the chain will not reach it), `tx_index` must be below
/// 2^20 and `op_index` below 2^12.
pub fn operation_order(ledger_seq: u32, tx_index: u32, op_index: u32) -> i64 {
    debug_assert!(
        ledger_seq <= i32::MAX as u32,
        "ledger_seq out of range: {ledger_seq}"
    );
    debug_assert!(tx_index < 1 << 20, "tx_index out of range: {tx_index}");
    debug_assert!(op_index < 1 << 12, "op_index out of range: {op_index}");
    ((ledger_seq as i64) << 32) | ((tx_index as i64) << 12) | op_index as i64
}

/// Encode the unique id for an event.
pub fn encode_event_id(ledger_seq: u32, tx_index: u32, op_index: u32, event_index: u32) -> String {
    let order = operation_order(ledger_seq, tx_index, op_index);
    format!("{order:019}-{event_index:010}")
}
