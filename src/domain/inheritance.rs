//! Inheritance - Post-Transform Field Setting Resolution
//!
//! Fields produced by transformation rules get their own settings table. Each
//! setting falls back to the same field's pre-transform value, then to a fixed
//! default:
//!
//! ```text
//! post-transform override ──► pre-transform value ──► default
//!      (Explicit)                 (Inherited)         (Default)
//! ```
//!
//! Tips only count as present when non-empty.

use crate::constants::{DEFAULT_FIELD_ENABLED, DEFAULT_INFO_TIP, DEFAULT_NUMERIC_FORMAT};
use crate::domain::scenario::{FieldSettings, SettingKind};

/// Where a resolved value came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueSource {
    /// Post-transform override
    Explicit,
    /// Pre-transform value of the same field
    Inherited,
    /// Hardcoded default
    Default,
}

/// A resolved setting value and its source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved<T> {
    pub value: T,
    pub source: ValueSource,
}

impl<T> Resolved<T> {
    fn new(value: T, source: ValueSource) -> Self {
        Self { value, source }
    }

    /// Whether the table should mark this value as inherited
    pub fn is_inherited(&self) -> bool {
        self.source == ValueSource::Inherited
    }

    /// Whether a post-transform override produced this value
    pub fn is_explicit(&self) -> bool {
        self.source == ValueSource::Explicit
    }
}

fn resolve<T>(post: Option<T>, pre: Option<T>, default: T) -> Resolved<T> {
    match (post, pre) {
        (Some(value), _) => Resolved::new(value, ValueSource::Explicit),
        (None, Some(value)) => Resolved::new(value, ValueSource::Inherited),
        (None, None) => Resolved::new(default, ValueSource::Default),
    }
}

/// Resolve the enabled flag of a post-transform field
pub fn resolve_enabled(post: Option<bool>, pre: Option<bool>) -> Resolved<bool> {
    resolve(post, pre, DEFAULT_FIELD_ENABLED)
}

/// Resolve the numeric format code of a post-transform field
pub fn resolve_format(post: Option<&str>, pre: Option<&str>) -> Resolved<String> {
    resolve(
        post.map(str::to_string),
        pre.map(str::to_string),
        DEFAULT_NUMERIC_FORMAT.to_string(),
    )
}

/// Resolve the info tip of a post-transform field; empty tips do not count
pub fn resolve_tip(post: Option<&str>, pre: Option<&str>) -> Resolved<String> {
    let non_empty = |tip: Option<&str>| tip.filter(|t| !t.is_empty()).map(str::to_string);
    resolve(non_empty(post), non_empty(pre), DEFAULT_INFO_TIP.to_string())
}

/// One row of the post-transform settings table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedField {
    pub field: String,
    pub enabled: Resolved<bool>,
    pub format: Resolved<String>,
    pub tip: Resolved<String>,
}

impl ResolvedField {
    /// Source of one of the three settings
    pub fn source(&self, kind: SettingKind) -> ValueSource {
        match kind {
            SettingKind::Enabled => self.enabled.source,
            SettingKind::Format => self.format.source,
            SettingKind::Tip => self.tip.source,
        }
    }

    /// Whether a reset control should be offered for `kind`
    pub fn can_reset(&self, kind: SettingKind) -> bool {
        self.source(kind) == ValueSource::Explicit
    }
}

/// Resolve all three settings of `field`
pub fn resolve_field(field: &str, post: &FieldSettings, pre: &FieldSettings) -> ResolvedField {
    ResolvedField {
        field: field.to_string(),
        enabled: resolve_enabled(post.enabled(field), pre.enabled(field)),
        format: resolve_format(post.format(field), pre.format(field)),
        tip: resolve_tip(post.tip(field), pre.tip(field)),
    }
}

/// Resolve every field of the post-transform table, in the given order
pub fn resolve_fields<'a>(
    fields: impl IntoIterator<Item = &'a str>,
    post: &FieldSettings,
    pre: &FieldSettings,
) -> Vec<ResolvedField> {
    fields
        .into_iter()
        .map(|field| resolve_field(field, post, pre))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn precedence_for_enabled() {
        let mut pre = FieldSettings::default();
        let mut post = FieldSettings::default();
        pre.enabled.insert("growth".into(), false);

        let row = resolve_field("growth", &post, &pre);
        assert!(!row.enabled.value);
        assert!(row.enabled.is_inherited());

        post.enabled.insert("growth".into(), true);
        let row = resolve_field("growth", &post, &pre);
        assert!(row.enabled.value);
        assert!(!row.enabled.is_inherited());
        assert!(row.can_reset(SettingKind::Enabled));

        post.clear("growth", SettingKind::Enabled);
        let row = resolve_field("growth", &post, &pre);
        assert!(!row.enabled.value);
        assert!(row.enabled.is_inherited());
    }

    #[test]
    fn defaults_when_nothing_stored() {
        let empty = FieldSettings::default();
        let row = resolve_field("score", &empty, &empty);

        assert_eq!(row.enabled, Resolved::new(true, ValueSource::Default));
        assert_eq!(row.format.value, "default");
        assert_eq!(row.tip.value, "");
        assert!(!row.tip.is_inherited());
        assert!(!row.can_reset(SettingKind::Format));
    }

    #[test]
    fn empty_tips_fall_through() {
        assert_eq!(
            resolve_tip(Some(""), Some("From pre")),
            Resolved::new("From pre".to_string(), ValueSource::Inherited)
        );
        assert_eq!(resolve_tip(Some(""), Some("")).source, ValueSource::Default);
    }

    #[test]
    fn empty_format_still_counts_as_explicit() {
        let resolved = resolve_format(Some(""), Some("percent"));
        assert!(resolved.is_explicit());
        assert_eq!(resolved.value, "");
    }

    #[test]
    fn resolves_fields_in_order() {
        let mut pre = FieldSettings::default();
        pre.formats.insert("b".into(), "currency".into());
        let rows = resolve_fields(["b", "a"], &FieldSettings::default(), &pre);

        assert_eq!(rows[0].field, "b");
        assert!(rows[0].format.is_inherited());
        assert_eq!(rows[1].format.source, ValueSource::Default);
    }
}
