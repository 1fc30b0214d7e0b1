//! Zone definitions: user-drawn rectangles tagged with the field they hold.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::ZoneError;

/// Axis-aligned rectangle in reference units.
///
/// Reference units are PDF points at scale 1.0 with the origin at the
/// top-left corner of the page and `y` growing downwards.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Right edge.
    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    /// Bottom edge.
    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    /// Whether both dimensions are strictly positive and finite.
    pub fn has_positive_size(&self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0
    }
}

/// Field held by a zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FieldKind {
    /// Last name.
    Name,
    /// First name.
    #[serde(rename = "FIRSTNAME")]
    FirstName,
    /// Amount owed.
    Amount,
}

impl FieldKind {
    /// Name and first name share the same cleaning and sentinel rules.
    pub fn is_name_like(&self) -> bool {
        matches!(self, FieldKind::Name | FieldKind::FirstName)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FieldKind::Name => "NAME",
            FieldKind::FirstName => "FIRSTNAME",
            FieldKind::Amount => "AMOUNT",
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Layout variant of the expense form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum FormVariant {
    #[default]
    T1,
    T2,
}

impl FormVariant {
    pub fn as_str(&self) -> &'static str {
        match self {
            FormVariant::T1 => "T1",
            FormVariant::T2 => "T2",
        }
    }
}

/// Combined kind and variant, e.g. `NAME-T1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ZoneTag {
    pub kind: FieldKind,
    pub variant: FormVariant,
}

impl ZoneTag {
    pub fn new(kind: FieldKind, variant: FormVariant) -> Self {
        Self { kind, variant }
    }

    /// Parse a tag such as `AMOUNT-T2`.
    ///
    /// The French tags of the paper forms (`NOM-T1`, `PRENOM-T1`,
    /// `MONTANT A PAYER-T1`) are accepted as well.
    pub fn parse(s: &str) -> Result<Self, ZoneError> {
        let trimmed = s.trim();
        let (head, tail) = trimmed
            .rsplit_once('-')
            .ok_or_else(|| ZoneError::UnknownTag(s.to_string()))?;

        let variant = match tail.trim().to_uppercase().as_str() {
            "T1" | "TYPE1" => FormVariant::T1,
            "T2" | "TYPE2" => FormVariant::T2,
            _ => return Err(ZoneError::UnknownTag(s.to_string())),
        };

        let kind = match head.trim().to_uppercase().as_str() {
            "NAME" | "NOM" => FieldKind::Name,
            "FIRSTNAME" | "PRENOM" | "PRÉNOM" => FieldKind::FirstName,
            "AMOUNT" | "MONTANT" | "MONTANT A PAYER" | "MONTANT À PAYER" => FieldKind::Amount,
            _ => return Err(ZoneError::UnknownTag(s.to_string())),
        };

        Ok(Self { kind, variant })
    }
}

impl fmt::Display for ZoneTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.kind.as_str(), self.variant.as_str())
    }
}

/// A rectangle on one page marking where a field is printed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Zone {
    /// Identifier assigned by the editor.
    pub id: String,

    /// Position in reference units.
    #[serde(flatten)]
    pub rect: Rect,

    /// Field this zone holds.
    pub kind: FieldKind,

    /// Form layout the zone was drawn on.
    #[serde(default)]
    pub variant: FormVariant,

    /// Page number (1-indexed).
    pub page: u32,

    /// Free-form label shown in the editor.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl Zone {
    /// Create a zone, checking its invariants.
    pub fn new(
        id: impl Into<String>,
        rect: Rect,
        tag: ZoneTag,
        page: u32,
    ) -> Result<Self, ZoneError> {
        let zone = Self {
            id: id.into(),
            rect,
            kind: tag.kind,
            variant: tag.variant,
            page,
            label: None,
        };
        zone.validate()?;
        Ok(zone)
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn tag(&self) -> ZoneTag {
        ZoneTag::new(self.kind, self.variant)
    }

    /// Check size and page invariants.
    ///
    /// Zones read from files bypass [`Zone::new`], so the pipeline calls this
    /// on every zone before a run.
    pub fn validate(&self) -> Result<(), ZoneError> {
        if !self.rect.has_positive_size() {
            return Err(ZoneError::NonPositiveSize {
                id: self.id.clone(),
                width: self.rect.width,
                height: self.rect.height,
            });
        }
        if self.page == 0 {
            return Err(ZoneError::InvalidPage {
                id: self.id.clone(),
            });
        }
        Ok(())
    }
}

/// Conversion between a canvas rendered at some scale and reference units.
///
/// Zones are drawn on a page rendered at `scale` (1.5 in the editor) and
/// must be divided back to scale 1.0 before they reach the extraction core.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CanvasTransform {
    pub scale: f64,
}

impl CanvasTransform {
    pub fn new(scale: f64) -> Self {
        Self { scale }
    }

    /// Canvas pixels to reference units.
    pub fn to_reference(&self, rect: Rect) -> Rect {
        Rect::new(
            rect.x / self.scale,
            rect.y / self.scale,
            rect.width / self.scale,
            rect.height / self.scale,
        )
    }

    /// Reference units to canvas pixels.
    pub fn to_canvas(&self, rect: Rect) -> Rect {
        Rect::new(
            rect.x * self.scale,
            rect.y * self.scale,
            rect.width * self.scale,
            rect.height * self.scale,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_zone_tag_parsing() {
        assert_eq!(
            ZoneTag::parse("NAME-T1").unwrap(),
            ZoneTag::new(FieldKind::Name, FormVariant::T1)
        );
        assert_eq!(
            ZoneTag::parse("PRENOM-T2").unwrap(),
            ZoneTag::new(FieldKind::FirstName, FormVariant::T2)
        );
        assert_eq!(
            ZoneTag::parse("MONTANT A PAYER-T1").unwrap(),
            ZoneTag::new(FieldKind::Amount, FormVariant::T1)
        );
        assert!(ZoneTag::parse("SIGNATURE-T1").is_err());
        assert!(ZoneTag::parse("NAME").is_err());
    }

    #[test]
    fn test_zone_tag_display() {
        let tag = ZoneTag::new(FieldKind::FirstName, FormVariant::T2);
        assert_eq!(tag.to_string(), "FIRSTNAME-T2");
        assert_eq!(ZoneTag::parse(&tag.to_string()).unwrap(), tag);
    }

    #[test]
    fn test_zone_invariants() {
        let tag = ZoneTag::new(FieldKind::Name, FormVariant::T1);
        assert!(Zone::new("z1", Rect::new(10.0, 10.0, 50.0, 20.0), tag, 1).is_ok());
        assert!(matches!(
            Zone::new("z2", Rect::new(10.0, 10.0, 0.0, 20.0), tag, 1),
            Err(ZoneError::NonPositiveSize { .. })
        ));
        assert!(matches!(
            Zone::new("z3", Rect::new(10.0, 10.0, 50.0, f64::NAN), tag, 1),
            Err(ZoneError::NonPositiveSize { .. })
        ));
        assert!(matches!(
            Zone::new("z4", Rect::new(10.0, 10.0, 50.0, 20.0), tag, 0),
            Err(ZoneError::InvalidPage { .. })
        ));
    }

    #[test]
    fn test_zone_json_shape() {
        let json = r#"{"id":"a","x":1.0,"y":2.0,"width":3.0,"height":4.0,"kind":"FIRSTNAME","variant":"T2","page":3}"#;
        let zone: Zone = serde_json::from_str(json).unwrap();
        assert_eq!(zone.rect, Rect::new(1.0, 2.0, 3.0, 4.0));
        assert_eq!(zone.kind, FieldKind::FirstName);
        assert_eq!(zone.variant, FormVariant::T2);
        assert_eq!(zone.page, 3);
        assert_eq!(zone.label, None);
    }

    #[test]
    fn test_canvas_transform() {
        let transform = CanvasTransform::new(1.5);
        let drawn = Rect::new(150.0, 300.0, 75.0, 30.0);
        assert_eq!(transform.to_reference(drawn), Rect::new(100.0, 200.0, 50.0, 20.0));
        assert_eq!(transform.to_canvas(transform.to_reference(drawn)), drawn);
    }
}
