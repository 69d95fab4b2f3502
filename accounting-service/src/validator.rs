// Journal entry validation: the single gate in front of every ledger write
use tracing::debug;
use uuid::Uuid;

use crate::chart::ChartOfAccounts;
use crate::error::ValidationError;
use crate::models::{EntryDraft, EntryHeader, JournalEntry, JournalLine};
use crate::money::Money;

pub struct JournalValidator<'a> {
    chart: &'a ChartOfAccounts,
}

impl<'a> JournalValidator<'a> {
    pub fn new(chart: &'a ChartOfAccounts) -> Self {
        Self { chart }
    }

    /// Accept or reject a draft.
    ///
    /// An accepted draft becomes a [`JournalEntry`] with a fresh id and
    /// `sequence == 0`; the store assigns the sequence on append.
    ///
    /// # Errors
    ///
    /// Returns the first [`ValidationError`] found, checking the entry shape,
    /// then every line, then the debit/credit totals.
    pub fn validate(&self, draft: EntryDraft) -> Result<JournalEntry, ValidationError> {
        if draft.lines.is_empty() {
            return Err(ValidationError::EmptyEntry);
        }
        if draft.description.trim().is_empty() {
            return Err(ValidationError::MissingDescription);
        }
        if draft.settles.is_some() && !draft.entry_type.may_name_provision() {
            return Err(ValidationError::UnexpectedSettlementLink {
                entry_type: draft.entry_type,
            });
        }

        let mut total_debit = Money::ZERO;
        let mut total_credit = Money::ZERO;

        for (index, line) in draft.lines.iter().enumerate() {
            if line.debit.is_negative() || line.credit.is_negative() {
                return Err(ValidationError::InvalidLine {
                    index,
                    reason: "amounts must not be negative".to_string(),
                });
            }
            match (line.debit.is_zero(), line.credit.is_zero()) {
                (true, true) => {
                    return Err(ValidationError::InvalidLine {
                        index,
                        reason: "line has neither a debit nor a credit".to_string(),
                    })
                }
                (false, false) => {
                    return Err(ValidationError::InvalidLine {
                        index,
                        reason: "line has both a debit and a credit".to_string(),
                    })
                }
                _ => {}
            }

            let account = self.chart.get(&line.account_code).ok_or_else(|| {
                ValidationError::UnknownAccount {
                    index,
                    account_code: line.account_code.clone(),
                }
            })?;
            if account.is_synthetic {
                return Err(ValidationError::SyntheticAccount {
                    index,
                    account_code: line.account_code.clone(),
                });
            }
            if !account.is_active {
                return Err(ValidationError::InactiveAccount {
                    index,
                    account_code: line.account_code.clone(),
                });
            }

            total_debit = total_debit
                .checked_add(line.debit)
                .ok_or(ValidationError::AmountOverflow)?;
            total_credit = total_credit
                .checked_add(line.credit)
                .ok_or(ValidationError::AmountOverflow)?;
        }

        if total_debit != total_credit {
            let delta = total_debit
                .checked_sub(total_credit)
                .ok_or(ValidationError::AmountOverflow)?;
            return Err(ValidationError::Unbalanced {
                total_debit,
                total_credit,
                delta,
            });
        }

        let header = EntryHeader {
            id: Uuid::new_v4(),
            sequence: 0,
            date: draft.date,
            description: draft.description,
            document_number: draft.document_number,
            entry_type: draft.entry_type,
            reference: draft.reference,
            settles: draft.settles,
        };
        let lines: Vec<JournalLine> = draft.lines.into_iter().map(JournalLine::from).collect();
        let entry = JournalEntry::from_parts(header, lines);

        debug!(
            entry_id = %entry.id,
            entry_type = %entry.entry_type,
            total = entry.total_debit.minor_units(),
            "Journal entry accepted"
        );
        Ok(entry)
    }
}
