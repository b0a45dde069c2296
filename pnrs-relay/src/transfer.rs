//! Copy source records into the destination, tagged with an investigation id
//!
//! Documents are copied as stored; the only change is the added `invest_id`.
//!
//! A phone already present in the destination is never copied again, whatever
//! investigation it was tagged with. The destination's unique phone index
//! backs the existence check, so two concurrent transfers of one number still
//! produce a single record.
//!
//! Not atomic: records inserted before a store failure stay inserted.
//! Re-running the same transfer is safe and only adds what is missing.

use pnrs_common::{Collection, InsertOutcome, Result};
use serde::Serialize;
use tracing::{debug, info};

/// Outcome counts for one transfer
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TransferReport {
    /// Source records matching the requested phones
    pub matched: usize,
    /// Records newly inserted into the destination
    pub moved: usize,
    /// Records whose phone was already in the destination
    pub skipped: usize,
}

/// Copy every source record whose phone is in `phone_numbers` into
/// `destination`, tagging each copy with `invest_id`.
pub async fn transfer(
    source: &Collection,
    destination: &Collection,
    phone_numbers: &[String],
    invest_id: &str,
) -> Result<TransferReport> {
    let documents = source.find_by_phones(phone_numbers).await?;

    let mut report = TransferReport {
        matched: documents.len(),
        ..Default::default()
    };

    for mut document in documents {
        let phone = document.phone();
        if destination.find_one_by_phone(&phone).await?.is_some() {
            debug!("Skipping {}: already in destination", phone);
            report.skipped += 1;
            continue;
        }

        document.tag(invest_id);

        match destination.insert(&document).await? {
            InsertOutcome::Inserted(_) => report.moved += 1,
            InsertOutcome::Duplicate => {
                // Lost a race with a concurrent transfer of the same phone
                debug!("Skipping {}: inserted concurrently", phone);
                report.skipped += 1;
            }
        }
    }

    info!(
        "Transfer for investigation '{}': {} requested, {} matched, {} moved, {} skipped",
        invest_id,
        phone_numbers.len(),
        report.matched,
        report.moved,
        report.skipped
    );

    Ok(report)
}
