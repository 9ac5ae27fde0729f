use std::borrow::Cow;

use crate::{codec::Encode, wire::WireTag};

/// An expected field of an object: the alias it is written under and the
/// wire tag of its declared type.
///
/// The tag is fixed when the descriptor is built, so encoding a field never
/// has to inspect the value's type again.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    alias: Cow<'static, str>,
    tag: WireTag,
}

impl Field {
    /// A descriptor usable in `static` field tables.
    #[must_use]
    pub const fn new(alias: &'static str, tag: WireTag) -> Self {
        Self {
            alias: Cow::Borrowed(alias),
            tag,
        }
    }

    /// A descriptor whose alias is only known at runtime.
    #[must_use]
    pub fn owned(alias: impl Into<String>, tag: WireTag) -> Self {
        Self {
            alias: Cow::Owned(alias.into()),
            tag,
        }
    }

    /// Derives the tag from the declared type `T`.
    #[must_use]
    pub const fn of<T: Encode + ?Sized>(alias: &'static str) -> Self {
        Self::new(alias, T::WIRE_TAG)
    }

    #[must_use]
    pub fn alias(&self) -> &str {
        &self.alias
    }

    #[must_use]
    pub fn tag(&self) -> WireTag {
        self.tag
    }
}

/// Rotating search position over a reader's expected fields.
///
/// Fields usually arrive in declaration order, so the search starts where
/// the previous match was and only wraps around on a miss.
#[derive(Debug, Default, Clone)]
pub(crate) struct FieldCursor {
    index: usize,
}

impl FieldCursor {
    pub fn reset(&mut self) {
        self.index = 0;
    }

    pub fn find(&mut self, fields: &[Field], alias: &str) -> Option<usize> {
        self.probe(fields, alias).0
    }

    /// Returns the match and how many aliases were compared.
    fn probe(&mut self, fields: &[Field], alias: &str) -> (Option<usize>, usize) {
        if self.index >= fields.len() {
            self.index = 0;
        }
        let start = self.index;
        let order = (start..fields.len()).chain(0..start);
        let mut compared = 0;
        for k in order {
            compared += 1;
            if fields[k].alias() == alias {
                self.index = k;
                return (Some(k), compared);
            }
        }
        (None, compared)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    static FIELDS: [Field; 4] = [
        Field::new("id", WireTag::Int),
        Field::new("name", WireTag::String),
        Field::new("score", WireTag::Double),
        Field::new("tags", WireTag::StringArray),
    ];

    #[test]
    fn tag_from_declared_type() {
        assert_eq!(Field::of::<i64>("n").tag(), WireTag::Long);
        assert_eq!(Field::of::<Vec<String>>("n").tag(), WireTag::StringArray);
        assert_eq!(Field::of::<Vec<Vec<i32>>>("n").tag(), WireTag::Object);
        assert_eq!(Field::owned(String::from("x"), WireTag::Byte).alias(), "x");
    }

    #[test]
    fn sequential_fields_need_few_comparisons() {
        let mut cursor = FieldCursor::default();
        for (i, field) in FIELDS.iter().enumerate() {
            let (found, compared) = cursor.probe(&FIELDS, field.alias());
            assert_eq!(found, Some(i));
            assert!(compared <= 2, "field {i} took {compared} comparisons");
        }
    }

    #[test]
    fn out_of_order_wraps_around() {
        let mut cursor = FieldCursor::default();
        assert_eq!(cursor.find(&FIELDS, "tags"), Some(3));
        assert_eq!(cursor.find(&FIELDS, "id"), Some(0));
        assert_eq!(cursor.find(&FIELDS, "score"), Some(2));
        assert_eq!(cursor.find(&FIELDS, "name"), Some(1));
        assert_eq!(cursor.find(&FIELDS, "missing"), None);
        assert_eq!(cursor.find(&[], "id"), None);
    }
}
