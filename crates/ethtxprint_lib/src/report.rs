//! Fixed layout transaction report.
//!
//! Labels are padded to 26 columns and appear in a fixed order. A `Status`
//! line follows `Transaction Hash`, so every later label sits one line lower
//! than in the layout without it. Readers should match lines by label, see
//! [`parse_report`].

use chrono::{DateTime, Duration, Utc};
use std::fmt::Write;
use web3::ethabi::ethereum_types::U512;
use web3::types::{Address, U256};

use crate::model::{ChainState, FeeModel, MinedView, TransactionSnapshot};
use crate::utils::{
    parse_wide_units, to_checksum_address, wei_to_ether, wei_to_gwei, wide_wei_to_ether,
    ETHER_DECIMALS,
};

const LABEL_WIDTH: usize = 26;
/// Line inserted after `Transaction Hash`.
pub const STATUS_LABEL: &str = "Status";
const PENDING: &str = "Pending";
const UNKNOWN: &str = "Unknown";

fn push_line(out: &mut String, label: &str, value: &str) {
    let label = format!("{label}:");
    let _ = writeln!(out, "{:<width$}{}", label, value, width = LABEL_WIDTH);
}

fn ether_and_gwei(amount: U256) -> String {
    format!("{} Ether ({} Gwei)", wei_to_ether(amount), wei_to_gwei(amount))
}

fn address_or(address: Option<Address>, placeholder: &str) -> String {
    address
        .map(|a| to_checksum_address(&a))
        .unwrap_or_else(|| placeholder.to_string())
}

/// Largest unit that is at least one, with the next smaller one for days and
/// hours.
pub fn format_age(age: Duration) -> String {
    let secs = age.num_seconds().max(0);
    if secs >= 24 * 3600 {
        format!("{} days {} hours ago", secs / (24 * 3600), secs % (24 * 3600) / 3600)
    } else if secs >= 3600 {
        format!("{} hours {} minutes ago", secs / 3600, secs % 3600 / 60)
    } else if secs >= 60 {
        format!("{} mins ago", secs / 60)
    } else {
        format!("{} seconds ago", secs)
    }
}

fn timestamp_text(mined: &MinedView, now: DateTime<Utc>) -> String {
    match mined.block_timestamp {
        Some(ts) => format!(
            "{} ({})",
            format_age(now - ts),
            ts.format("%Y-%m-%d %H:%M:%S +0000 UTC")
        ),
        None => UNKNOWN.to_string(),
    }
}

pub fn render_report(snapshot: &TransactionSnapshot) -> String {
    render_report_at(snapshot, Utc::now())
}

/// Fixed layout report. Only `now` is taken from outside the snapshot.
pub fn render_report_at(snapshot: &TransactionSnapshot, now: DateTime<Utc>) -> String {
    let mut out = String::new();
    push_line(&mut out, "Transaction Hash", &format!("{:#x}", snapshot.hash));
    push_line(&mut out, STATUS_LABEL, &snapshot.status().to_string());

    let mined = match &snapshot.state {
        ChainState::Pending(_) => None,
        ChainState::Mined(mined) => Some(mined),
    };

    match mined {
        None => {
            push_line(&mut out, "Block", "(Pending)");
            push_line(&mut out, "Timestamp", PENDING);
        }
        Some(mined) => {
            push_line(
                &mut out,
                "Block",
                &format!("{} ({} confirmations)", mined.block_number, mined.confirmations),
            );
            push_line(&mut out, "Timestamp", &timestamp_text(mined, now));
        }
    }

    push_line(&mut out, "From", &address_or(snapshot.from, "(Unknown)"));
    push_line(&mut out, "To", &address_or(snapshot.to, "(Contract Creation)"));
    push_line(&mut out, "Value", &format!("{} Ether", wei_to_ether(snapshot.value)));

    let fee = match mined {
        None => PENDING.to_string(),
        Some(mined) => mined
            .transaction_fee
            .map(|fee| format!("{} Ether", wide_wei_to_ether(fee)))
            .unwrap_or_else(|| UNKNOWN.to_string()),
    };
    push_line(&mut out, "Transaction Fee", &fee);
    push_line(
        &mut out,
        "Gas Price",
        &snapshot
            .gas_price()
            .map(ether_and_gwei)
            .unwrap_or_else(|| UNKNOWN.to_string()),
    );
    push_line(
        &mut out,
        "Txn Type",
        &format!("{} ({})", snapshot.fee_model.type_byte(), snapshot.fee_model),
    );
    push_line(&mut out, "Gas Limit", &snapshot.gas_limit.to_string());

    let (gas_used, base_fee) = match mined {
        None => (PENDING.to_string(), PENDING.to_string()),
        Some(mined) => (
            match (mined.gas_used, mined.gas_used_percent) {
                (Some(used), Some(pct)) => format!("{used} ({pct:.2}%)"),
                (Some(used), None) => used.to_string(),
                (None, _) => UNKNOWN.to_string(),
            },
            mined
                .base_fee_per_gas
                .map(|base_fee| format!("{} Wei ({} Gwei)", base_fee, wei_to_gwei(base_fee)))
                .unwrap_or_else(|| UNKNOWN.to_string()),
        ),
    };
    push_line(&mut out, "Gas Used By Transaction", &gas_used);
    push_line(&mut out, "Base Fee Per Gas", &base_fee);

    match snapshot.fee_model {
        FeeModel::FeeMarket => {
            push_line(
                &mut out,
                "Max Fee Per Gas",
                &ether_and_gwei(snapshot.max_fee_per_gas()),
            );
            push_line(
                &mut out,
                "Max Priority Fee Per Gas",
                &ether_and_gwei(snapshot.max_priority_fee_per_gas()),
            );
        }
        FeeModel::Legacy | FeeModel::Unknown(_) => {}
    }

    if let Some(mined) = mined {
        push_line(
            &mut out,
            "Burnt Fees",
            &mined
                .burnt_fees
                .map(|burnt| format!("{} Ether", wide_wei_to_ether(burnt)))
                .unwrap_or_else(|| UNKNOWN.to_string()),
        );
        match snapshot.fee_model {
            FeeModel::FeeMarket => push_line(
                &mut out,
                "Txn Savings",
                &mined
                    .savings
                    .map(|savings| format!("{} Ether", wide_wei_to_ether(savings)))
                    .unwrap_or_else(|| UNKNOWN.to_string()),
            ),
            FeeModel::Legacy | FeeModel::Unknown(_) => {}
        }
    }

    let position = match mined {
        None => PENDING.to_string(),
        Some(mined) => mined.block_index.to_string(),
    };
    push_line(
        &mut out,
        "Nonce (position)",
        &format!("{} ({})", snapshot.nonce, position),
    );
    push_line(&mut out, "Input Data", &hex::encode(&snapshot.input));
    out
}

/// Labelled lines of a rendered report, in order.
#[derive(Debug, Clone, Default)]
pub struct ParsedReport {
    pub fields: Vec<(String, String)>,
}

impl ParsedReport {
    pub fn get(&self, label: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(l, _)| l == label)
            .map(|(_, v)| v.as_str())
    }

    fn first_token(&self, label: &str) -> Option<&str> {
        self.get(label)?.split_whitespace().next()
    }

    pub fn gas_limit(&self) -> Option<u64> {
        self.first_token("Gas Limit")?.parse().ok()
    }

    pub fn gas_used(&self) -> Option<U256> {
        U256::from_dec_str(self.first_token("Gas Used By Transaction")?).ok()
    }

    pub fn transaction_fee_wei(&self) -> Option<U512> {
        let value = self.get("Transaction Fee")?.strip_suffix(" Ether")?;
        parse_wide_units(value, ETHER_DECIMALS).ok()
    }

    pub fn base_fee_wei(&self) -> Option<U256> {
        U256::from_dec_str(self.first_token("Base Fee Per Gas")?).ok()
    }
}

pub fn parse_report(text: &str) -> ParsedReport {
    ParsedReport {
        fields: text
            .lines()
            .filter_map(|line| line.split_once(':'))
            .map(|(label, value)| (label.trim().to_string(), value.trim().to_string()))
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::*;
    use crate::model::*;
    use crate::process::{derive_snapshot, RecoveryPolicy};
    use chrono::TimeZone;
    use web3::types::H256;

    const LABELS: [&str; 19] = [
        "Transaction Hash",
        "Status",
        "Block",
        "Timestamp",
        "From",
        "To",
        "Value",
        "Transaction Fee",
        "Gas Price",
        "Txn Type",
        "Gas Limit",
        "Gas Used By Transaction",
        "Base Fee Per Gas",
        "Max Fee Per Gas",
        "Max Priority Fee Per Gas",
        "Burnt Fees",
        "Txn Savings",
        "Nonce (position)",
        "Input Data",
    ];

    async fn snapshot_of(source: &MockSource) -> TransactionSnapshot {
        derive_snapshot(
            source,
            &FixedRecovery(Some(sender())),
            H256::from_low_u64_be(1),
            RecoveryPolicy::Lenient,
        )
        .await
        .unwrap()
    }

    fn labels(text: &str) -> Vec<String> {
        parse_report(text).fields.into_iter().map(|(l, _)| l).collect()
    }

    fn now() -> DateTime<Utc> {
        Utc.timestamp_opt(1_660_000_000 + 2 * 3600 + 5 * 60, 0).unwrap()
    }

    #[test]
    fn test_format_age() {
        assert_eq!(format_age(Duration::seconds(5)), "5 seconds ago");
        assert_eq!(format_age(Duration::seconds(59)), "59 seconds ago");
        assert_eq!(format_age(Duration::seconds(60)), "1 mins ago");
        assert_eq!(format_age(Duration::seconds(3599)), "59 mins ago");
        assert_eq!(format_age(Duration::seconds(3600 + 120)), "1 hours 2 minutes ago");
        assert_eq!(
            format_age(Duration::seconds(3 * 86400 + 4 * 3600 + 59)),
            "3 days 4 hours ago"
        );
        assert_eq!(format_age(Duration::seconds(-30)), "0 seconds ago");
    }

    #[tokio::test]
    async fn test_render_mined_fee_market() {
        let source = mined_source(fee_market_tx(), 42_000, 1);
        let text = render_report_at(&snapshot_of(&source).await, now());
        let report = parse_report(&text);

        assert_eq!(labels(&text), LABELS.to_vec());
        assert_eq!(report.fields[1].0, STATUS_LABEL);
        assert_eq!(report.get("Status"), Some("Successful"));
        assert_eq!(report.get("Block"), Some("100 (12 confirmations)"));
        assert_eq!(
            report.get("Timestamp"),
            Some("2 hours 5 minutes ago (2022-08-08 23:06:40 +0000 UTC)")
        );
        assert_eq!(report.get("Value"), Some("0.1 Ether"));
        assert_eq!(report.get("Transaction Fee"), Some("0.001344 Ether"));
        assert_eq!(report.get("Gas Price"), Some("0.000000032 Ether (32 Gwei)"));
        assert_eq!(report.get("Txn Type"), Some("2 (EIP-1559)"));
        assert_eq!(report.get("Gas Used By Transaction"), Some("42000 (84.00%)"));
        assert_eq!(
            report.get("Base Fee Per Gas"),
            Some("30000000000 Wei (30 Gwei)")
        );
        assert_eq!(
            report.get("Max Fee Per Gas"),
            Some("0.00000005 Ether (50 Gwei)")
        );
        assert_eq!(
            report.get("Max Priority Fee Per Gas"),
            Some("0.000000002 Ether (2 Gwei)")
        );
        assert_eq!(report.get("Burnt Fees"), Some("0.00126 Ether"));
        assert_eq!(report.get("Txn Savings"), Some("0.000756 Ether"));
        assert_eq!(report.get("Nonce (position)"), Some("42 (5)"));
        assert_eq!(report.get("Input Data"), Some("deadbeef"));
        assert_eq!(
            report.get("To"),
            Some(to_checksum_address(&recipient()).as_str())
        );
        assert!(text.starts_with(
            "Transaction Hash:         0x0000000000000000000000000000000000000000000000000000000000000001\n"
        ));
        assert!(text.contains("\nMax Priority Fee Per Gas: 0.000000002 Ether"));
    }

    #[tokio::test]
    async fn test_round_trip_of_numeric_fields() {
        let source = mined_source(fee_market_tx(), 42_000, 1);
        let snapshot = snapshot_of(&source).await;
        let mined = snapshot.mined().unwrap().clone();
        let report = parse_report(&render_report_at(&snapshot, now()));

        assert_eq!(report.gas_used(), mined.gas_used);
        assert_eq!(report.gas_limit(), Some(snapshot.gas_limit));
        assert_eq!(report.base_fee_wei(), mined.base_fee_per_gas);
        assert_eq!(report.transaction_fee_wei(), mined.transaction_fee);
    }

    #[tokio::test]
    async fn test_round_trip_of_fee_wider_than_256_bits() {
        let mut tx = fee_market_tx();
        tx.max_fee_per_gas = Some(U256::max_value());
        tx.max_priority_fee_per_gas = Some(U256::max_value() - U256::from(31 * GWEI));
        let source = mined_source(tx, 42_000, 1);
        let snapshot = snapshot_of(&source).await;
        let mined = snapshot.mined().unwrap().clone();
        let fee = mined.transaction_fee.unwrap();
        assert!(fee > U512::from(U256::max_value()));

        let report = parse_report(&render_report_at(&snapshot, now()));
        assert_eq!(report.transaction_fee_wei(), Some(fee));
        assert_eq!(
            report.get("Transaction Fee"),
            Some(format!("{} Ether", wide_wei_to_ether(fee)).as_str())
        );
    }

    #[tokio::test]
    async fn test_render_legacy_full_gas() {
        let source = mined_source(legacy_tx(), 21_000, 1);
        let text = render_report_at(&snapshot_of(&source).await, now());
        let report = parse_report(&text);

        assert_eq!(report.get("Gas Used By Transaction"), Some("21000 (100.00%)"));
        assert_eq!(report.get("Txn Type"), Some("0 (Legacy)"));
        assert!(report.get("Max Fee Per Gas").is_none());
        assert!(report.get("Max Priority Fee Per Gas").is_none());
        assert!(report.get("Txn Savings").is_none());
        assert!(report.get("Burnt Fees").is_some());
    }

    #[tokio::test]
    async fn test_render_pending_fee_market() {
        let source = pending_source(fee_market_tx());
        let snapshot = snapshot_of(&source).await;
        let text = render_report_at(&snapshot, now());
        let report = parse_report(&text);

        assert_eq!(report.get("Status"), Some("Pending"));
        assert_eq!(report.get("Block"), Some("(Pending)"));
        for label in [
            "Timestamp",
            "Transaction Fee",
            "Gas Used By Transaction",
            "Base Fee Per Gas",
        ] {
            assert_eq!(report.get(label), Some("Pending"), "{label}");
        }
        assert_eq!(report.get("Nonce (position)"), Some("42 (Pending)"));
        assert_eq!(report.get("Value"), Some("0.1 Ether"));
        assert_eq!(report.get("Gas Limit"), Some("50000"));
        assert_eq!(report.get("Input Data"), Some("deadbeef"));
        assert_eq!(report.get("Max Fee Per Gas"), Some("0 Ether (0 Gwei)"));
        assert_eq!(report.get("Max Priority Fee Per Gas"), Some("0 Ether (0 Gwei)"));
        assert!(report.get("From").unwrap().starts_with("0x"));
        assert!(report.get("To").unwrap().starts_with("0x"));
        assert!(report.get("Burnt Fees").is_none());
        assert!(report.get("Txn Savings").is_none());
        assert!(!text.contains("confirmations"));
    }

    #[tokio::test]
    async fn test_pending_has_no_numbers_for_any_fee_model() {
        for tx in [fee_market_tx(), legacy_tx()] {
            let source = pending_source(tx);
            let report = parse_report(&render_report_at(&snapshot_of(&source).await, now()));
            for label in [
                "Block",
                "Timestamp",
                "Transaction Fee",
                "Gas Used By Transaction",
                "Base Fee Per Gas",
            ] {
                let value = report.get(label).unwrap();
                assert!(!value.chars().any(|c| c.is_ascii_digit()), "{label}: {value}");
            }
        }
    }

    #[tokio::test]
    async fn test_render_unknown_status() {
        let source = mined_source(fee_market_tx(), 42_000, 2);
        let report = parse_report(&render_report_at(&snapshot_of(&source).await, now()));
        assert_eq!(report.get("Status"), Some("Unknown"));
        assert_eq!(report.get("Transaction Fee"), Some("0.001344 Ether"));
        assert_eq!(report.get("Block"), Some("100 (12 confirmations)"));
    }

    #[tokio::test]
    async fn test_render_negative_savings_and_contract_creation() {
        let mut tx = fee_market_tx();
        tx.max_fee_per_gas = Some(U256::from(31 * GWEI));
        tx.to = None;
        let source = mined_source(tx, 42_000, 1);
        let snapshot = snapshot_of(&source).await;
        let report = parse_report(&render_report_at(&snapshot, now()));
        assert_eq!(report.get("Txn Savings"), Some("-0.000042 Ether"));
        assert_eq!(report.get("To"), Some("(Contract Creation)"));
    }

    #[tokio::test]
    async fn test_render_unknown_sender() {
        let source = mined_source(legacy_tx(), 21_000, 1);
        let snapshot = derive_snapshot(
            &source,
            &FixedRecovery(None),
            H256::from_low_u64_be(1),
            RecoveryPolicy::Lenient,
        )
        .await
        .unwrap();
        let report = parse_report(&render_report_at(&snapshot, now()));
        assert_eq!(report.get("From"), Some("(Unknown)"));
    }
}
