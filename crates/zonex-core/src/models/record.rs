//! Per-zone extraction output.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::zone::{FieldKind, FormVariant, Rect, Zone};

/// Value written in name slots when a zone yields nothing.
pub const UNREADABLE: &str = "UNREADABLE";

/// Which tier of the extraction strategy produced a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Resolution {
    /// Fragments inside the zone.
    Direct,
    /// Fragments inside the enlarged zone.
    Expanded,
    /// Page-wide pattern search.
    Pattern,
    /// Nothing found, or the page could not be read.
    Unreadable,
}

/// One value per field slot, only the zone's own slot being meaningful.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FieldSlots<T> {
    pub name: T,
    pub first_name: T,
    pub amount: T,
}

impl<T: Default> FieldSlots<T> {
    /// Slots with `value` in the `kind` slot and defaults elsewhere.
    pub fn only(kind: FieldKind, value: T) -> Self {
        let mut slots = Self::default();
        *slots.get_mut(kind) = value;
        slots
    }
}

impl<T> FieldSlots<T> {
    pub fn get(&self, kind: FieldKind) -> &T {
        match kind {
            FieldKind::Name => &self.name,
            FieldKind::FirstName => &self.first_name,
            FieldKind::Amount => &self.amount,
        }
    }

    pub fn get_mut(&mut self, kind: FieldKind) -> &mut T {
        match kind {
            FieldKind::Name => &mut self.name,
            FieldKind::FirstName => &mut self.first_name,
            FieldKind::Amount => &mut self.amount,
        }
    }
}

/// Result of processing one zone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionRecord {
    /// Field the zone holds.
    pub kind: FieldKind,
    /// Page number (1-indexed).
    pub page: u32,
    /// Form layout of the zone.
    pub variant: FormVariant,
    /// Text as found on the page, before cleaning.
    pub raw_text: String,
    /// Cleaned last name, empty unless this is a name zone.
    pub name: String,
    /// Cleaned first name, empty unless this is a first-name zone.
    pub first_name: String,
    /// Parsed amount, zero unless this is an amount zone.
    pub amount: Decimal,
    /// Cleaned text per slot.
    pub extracted_text: FieldSlots<String>,
    /// Source rectangle per slot.
    pub coordinates: FieldSlots<Rect>,
    /// Tier that produced the value.
    pub resolution: Resolution,
}

impl ExtractionRecord {
    /// Record for a zone whose text was found and cleaned.
    pub fn resolved(
        zone: &Zone,
        raw_text: impl Into<String>,
        cleaned: String,
        amount: Decimal,
        resolution: Resolution,
    ) -> Self {
        let (name, first_name, amount) = match zone.kind {
            FieldKind::Name => (cleaned.clone(), String::new(), Decimal::ZERO),
            FieldKind::FirstName => (String::new(), cleaned.clone(), Decimal::ZERO),
            FieldKind::Amount => (String::new(), String::new(), amount),
        };

        Self {
            kind: zone.kind,
            page: zone.page,
            variant: zone.variant,
            raw_text: raw_text.into(),
            name,
            first_name,
            amount,
            extracted_text: FieldSlots::only(zone.kind, cleaned),
            coordinates: FieldSlots::only(zone.kind, zone.rect),
            resolution,
        }
    }

    /// Sentinel record for a zone that yielded nothing.
    pub fn unreadable(zone: &Zone) -> Self {
        let marker = |kind: FieldKind| {
            if zone.kind == kind {
                UNREADABLE.to_string()
            } else {
                String::new()
            }
        };
        let cleaned = if zone.kind.is_name_like() {
            UNREADABLE.to_string()
        } else {
            String::new()
        };

        Self {
            kind: zone.kind,
            page: zone.page,
            variant: zone.variant,
            raw_text: String::new(),
            name: marker(FieldKind::Name),
            first_name: marker(FieldKind::FirstName),
            amount: Decimal::ZERO,
            extracted_text: FieldSlots::only(zone.kind, cleaned),
            coordinates: FieldSlots::only(zone.kind, zone.rect),
            resolution: Resolution::Unreadable,
        }
    }

    pub fn is_unreadable(&self) -> bool {
        self.resolution == Resolution::Unreadable
    }
}
