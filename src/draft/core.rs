//! Defines the draft state and its settlement arithmetic.

use serde::{Deserialize, Serialize};

use crate::{
    Error,
    database_id::{LayananId, TransaksiId},
    money::round_dp2,
    pasien::Nik,
    transaksi::MAX_NAMA_PASIEN_LENGTH,
};

/// A service selected onto a draft.
///
/// The name and unit price are carried alongside the ID because the draft
/// mirrors what the transaction screen holds: totals must be derivable
/// without a catalog round trip on every keystroke.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DraftLayanan {
    /// The selected service's ID.
    pub id_layanan: LayananId,
    /// The selected service's display name.
    pub nama_layanan: String,
    /// The selected service's unit price.
    pub total_harga: f64,
}

/// The amendment context carried when a draft edits an existing
/// transaction instead of creating a new one.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Amendment {
    /// The transaction being amended.
    pub id_transaksi: TransaksiId,
    /// The total already paid on that transaction before this amendment.
    pub total_bayar_sebelumnya: f64,
}

/// An in-progress billing transaction.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Draft {
    /// The patient name as typed at the desk.
    pub nama_pasien: String,
    /// The NIK of the bound registered patient, if any. A draft without
    /// one records a walk-in.
    pub nik_pasien: Option<Nik>,
    /// The selected services, unique by service ID, in selection order.
    pub layanan: Vec<DraftLayanan>,
    /// The amount tendered by the payer.
    pub bayar: f64,
    /// Present when the draft amends an existing transaction.
    pub amendment: Option<Amendment>,
}

/// The derived money figures of a draft at one point in time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Settlement {
    /// The sum of the selected services' unit prices.
    pub total: f64,
    /// Change due back to the payer (kembalian). Never negative.
    pub kembalian: f64,
    /// The balance still owed after the tendered amount is applied (sisa
    /// tagihan). Zero for new transactions; may be negative in amendment
    /// mode before any amount is tendered, signalling an overpayment
    /// already on record.
    pub sisa_tagihan: f64,
}

impl Draft {
    /// Select a service onto the draft.
    ///
    /// Selecting a service that is already on the draft is a no-op;
    /// returns whether the selection changed.
    pub fn tambah_layanan(&mut self, layanan: DraftLayanan) -> bool {
        if self
            .layanan
            .iter()
            .any(|selected| selected.id_layanan == layanan.id_layanan)
        {
            return false;
        }

        self.layanan.push(layanan);
        true
    }

    /// Remove a service from the draft by ID; returns whether it was
    /// selected.
    pub fn hapus_layanan(&mut self, id_layanan: LayananId) -> bool {
        let before = self.layanan.len();
        self.layanan
            .retain(|selected| selected.id_layanan != id_layanan);

        self.layanan.len() != before
    }

    /// The sum of the selected services' unit prices.
    pub fn total(&self) -> f64 {
        round_dp2(self.layanan.iter().map(|layanan| layanan.total_harga).sum())
    }

    /// The balance owed before the tendered amount is applied: the full
    /// total for a new transaction, or the total minus what was already
    /// paid when amending. May be negative in amendment mode.
    fn amount_due(&self) -> f64 {
        match self.amendment {
            Some(amendment) => round_dp2(self.total() - amendment.total_bayar_sebelumnya),
            None => self.total(),
        }
    }

    /// Recompute the derived money figures for the current state.
    pub fn settlement(&self) -> Settlement {
        let total = self.total();

        let Some(_) = self.amendment else {
            return Settlement {
                total,
                kembalian: round_dp2((self.bayar - total).max(0.0)),
                sisa_tagihan: 0.0,
            };
        };

        let sisa = self.amount_due();

        if self.bayar > 0.0 {
            let new_remaining = round_dp2(sisa - self.bayar);

            if new_remaining <= 0.0 {
                // Fully covered: the absolute overshoot is change due.
                Settlement {
                    total,
                    kembalian: -new_remaining,
                    sisa_tagihan: 0.0,
                }
            } else {
                // A partial payment leaves the rest outstanding.
                Settlement {
                    total,
                    kembalian: 0.0,
                    sisa_tagihan: new_remaining,
                }
            }
        } else {
            Settlement {
                total,
                kembalian: 0.0,
                sisa_tagihan: sisa,
            }
        }
    }

    /// Whether submission must be blocked because the tendered amount does
    /// not cover what is owed.
    pub fn is_underpaid(&self) -> bool {
        match self.amendment {
            Some(_) => {
                let sisa = self.amount_due();
                sisa > 0.0 && self.bayar < sisa
            }
            None => self.bayar < self.total(),
        }
    }

    /// The total paid-to-date to record if this draft is committed now.
    ///
    /// Payments accumulate: when amending, the tendered amount is added to
    /// what was already paid, never overwritten.
    pub fn total_bayar_tercatat(&self) -> f64 {
        match self.amendment {
            Some(amendment) => round_dp2(amendment.total_bayar_sebelumnya + self.bayar),
            None => self.bayar,
        }
    }

    /// Check the submission preconditions, in order: patient name, service
    /// selection, then payment sufficiency. Each failure is a hard stop
    /// with a user-facing message.
    pub fn validate(&self) -> Result<(), Error> {
        let nama = self.nama_pasien.trim();
        if nama.is_empty() {
            return Err(Error::EmptyNamaPasien);
        }
        if nama.chars().count() > MAX_NAMA_PASIEN_LENGTH {
            return Err(Error::NamaPasienTooLong(nama.chars().count()));
        }

        if self.layanan.is_empty() {
            return Err(Error::EmptyLayanan);
        }

        if self.is_underpaid() {
            return Err(Error::Underpaid {
                due: self.amount_due(),
                bayar: self.bayar,
            });
        }

        Ok(())
    }
}
