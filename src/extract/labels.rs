//! Field label table: detail-page label text to record attribute.

use crate::record::Field;

/// Labels rendered in the detail panel of an article page, in source script.
///
/// Two citation labels exist because the portal renamed the metric at some
/// point; both populate [`Field::Citation`].
pub const FIELD_LABELS: &[(&str, Field)] = &[
    ("저자", Field::Author),
    ("발행기관", Field::Organization),
    ("학술지명", Field::Name),
    ("권호사항", Field::VolNo),
    ("발행연도", Field::Year),
    ("작성언어", Field::Language),
    ("주제어", Field::Keyword),
    ("KDC", Field::Kdc),
    ("등재정보", Field::Kci),
    ("자료형태", Field::Media),
    ("수록면", Field::Page),
    ("KCI 피인용지수", Field::Citation),
    ("KCI 피인용횟수", Field::Citation),
    ("제공처", Field::Link),
    ("소장기관", Field::Location),
];

/// Looks up the field a label populates. `None` means the label is unknown.
#[must_use]
pub fn lookup_label(label: &str) -> Option<Field> {
    let label = label.trim();
    FIELD_LABELS
        .iter()
        .find(|(text, _)| *text == label)
        .map(|(_, field)| *field)
}
