//! CSV import of a reservation ledger.
//!
//! The surrounding platform exports bookings as
//! `reference,guest,guests,status,start_date,end_date`; importing one lets the
//! engine run against real reservation data offline. Import is all-or-nothing:
//! the first malformed row fails the whole file with its 1-based data row
//! number.

use chrono::NaiveDate;
use serde::Deserialize;
use std::collections::HashSet;
use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use ulid::Ulid;

use crate::booking::model::{Booking, BookingStatus, DateRange, Listing};
use crate::booking::pricing;

/// One imported reservation, not yet bound to a listing.
#[derive(Debug, Clone)]
pub struct LedgerEntry {
    pub reference: Ulid,
    pub guest: String,
    pub guests: u32,
    pub status: BookingStatus,
    pub range: DateRange,
}

impl LedgerEntry {
    /// Bind the entry to a listing, pricing the stay at the listing's current
    /// rates. Imported rows bypass the stay-length bounds: they record stays
    /// that already happened under whatever rules applied then.
    pub fn into_booking(self, listing: &Listing) -> Booking {
        let price = pricing::breakdown(listing, self.range.nights());
        Booking {
            reference: self.reference,
            listing_id: listing.id,
            guest: self.guest,
            guests: self.guests,
            range: self.range,
            status: self.status,
            price,
        }
    }
}

#[derive(Debug)]
pub enum LedgerError {
    Io(std::io::Error),
    Csv(csv::Error),
    Row { row: usize, reason: String },
}

impl fmt::Display for LedgerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LedgerError::Io(err) => write!(f, "failed to read ledger: {err}"),
            LedgerError::Csv(err) => write!(f, "failed to parse ledger: {err}"),
            LedgerError::Row { row, reason } => write!(f, "ledger row {row}: {reason}"),
        }
    }
}

impl std::error::Error for LedgerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LedgerError::Io(err) => Some(err),
            LedgerError::Csv(err) => Some(err),
            LedgerError::Row { .. } => None,
        }
    }
}

impl From<std::io::Error> for LedgerError {
    fn from(err: std::io::Error) -> Self {
        LedgerError::Io(err)
    }
}

impl From<csv::Error> for LedgerError {
    fn from(err: csv::Error) -> Self {
        LedgerError::Csv(err)
    }
}

/// Raw CSV row; every field is validated into a [`LedgerEntry`].
#[derive(Debug, Deserialize)]
struct LedgerRow {
    #[serde(default)]
    reference: String,
    guest: String,
    guests: String,
    status: String,
    start_date: String,
    end_date: String,
}

pub fn read_ledger_from_path(path: impl AsRef<Path>) -> Result<Vec<LedgerEntry>, LedgerError> {
    let file = File::open(path)?;
    read_ledger(file)
}

/// Parse a ledger export. The header row is required; data rows are numbered
/// from 1 in error reports. A booking reference may appear only once; a
/// repeat fails the file at its second occurrence.
pub fn read_ledger<R: Read>(reader: R) -> Result<Vec<LedgerEntry>, LedgerError> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    let mut entries = Vec::new();
    let mut seen = HashSet::new();

    for (idx, record) in csv_reader.deserialize::<LedgerRow>().enumerate() {
        let row = idx + 1;
        let entry = parse_row(row, record?)?;
        if !seen.insert(entry.reference) {
            return Err(LedgerError::Row {
                row,
                reason: format!("duplicate booking reference '{}'", entry.reference),
            });
        }
        entries.push(entry);
    }

    Ok(entries)
}

fn parse_row(row: usize, raw: LedgerRow) -> Result<LedgerEntry, LedgerError> {
    let fail = |reason: String| LedgerError::Row { row, reason };

    let reference = match raw.reference.trim() {
        // Rows exported before the reference column existed are blank; mint
        // a fresh id for them.
        "" => Ulid::new(),
        value => Ulid::from_string(value)
            .map_err(|err| fail(format!("invalid booking reference '{value}' ({err})")))?,
    };

    let guest = raw.guest.trim();
    if guest.is_empty() {
        return Err(fail("guest must not be blank".to_string()));
    }

    let guests: u32 = raw
        .guests
        .trim()
        .parse()
        .map_err(|_| fail(format!("invalid guest count '{}'", raw.guests.trim())))?;
    if guests == 0 {
        return Err(fail("guest count must be at least 1".to_string()));
    }

    let status: BookingStatus = raw.status.parse().map_err(fail)?;

    let start_date = parse_ledger_date(&raw.start_date)
        .map_err(|reason| fail(format!("start_date {reason}")))?;
    let end_date =
        parse_ledger_date(&raw.end_date).map_err(|reason| fail(format!("end_date {reason}")))?;
    let range = DateRange::new(start_date, end_date).map_err(|err| fail(err.to_string()))?;

    Ok(LedgerEntry {
        reference,
        guest: guest.to_string(),
        guests,
        status,
        range,
    })
}

fn parse_ledger_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("'{}' is not a YYYY-MM-DD date ({err})", raw.trim()))
}
