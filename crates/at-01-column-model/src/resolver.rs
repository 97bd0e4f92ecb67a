//! Field normalization.

use std::iter::Enumerate;
use std::slice::Iter;

use crate::domain::column::Column;
use crate::domain::field::{FieldItem, FieldSpec};
use crate::error::ColumnError;

/// Normalize one spec, or `None` when it matches no accepted shape.
///
/// Shapes are tried in a fixed order: bare items, then `(display, item)`,
/// then `(display, description, item)`. The display and description slots
/// must be text.
pub fn resolve_field(spec: &FieldSpec) -> Option<Column> {
    match spec {
        FieldSpec::Bare(FieldItem::Text(reference)) => {
            Some(Column::plain(reference.clone(), reference.clone()))
        }
        FieldSpec::Bare(FieldItem::Column(native)) => {
            Some(Column::plain(native.key.clone(), native.key.clone()))
        }
        FieldSpec::Bare(_) => None,
        FieldSpec::Pair(display, item) => {
            let display = display.as_text()?;
            from_item(display, item)
        }
        FieldSpec::Triple(display, description, item) => {
            let display = display.as_text()?;
            let description = description.as_text()?;
            from_item(display, item).map(|c| c.with_description(description))
        }
    }
}

fn from_item(display: &str, item: &FieldItem) -> Option<Column> {
    let column = match item {
        FieldItem::Text(reference) => Column::plain(display, reference.clone()),
        FieldItem::Column(native) => Column::plain(display, native.key.clone()),
        FieldItem::Compute(f) => Column::computed(display, f.clone()),
        FieldItem::LinkDetail(link) => Column::link_detail(display, link.clone()),
        FieldItem::LinkTable(link) => Column::link_table(display, link.clone()),
        FieldItem::Live(live) => Column::live(display, live.clone()),
        FieldItem::Literal(_) => return None,
    };
    Some(column)
}

/// Lazy normalization: yields one result per spec, in input order.
pub struct FieldResolver<'a> {
    specs: Enumerate<Iter<'a, FieldSpec>>,
}

impl<'a> FieldResolver<'a> {
    pub fn new(specs: &'a [FieldSpec]) -> Self {
        Self {
            specs: specs.iter().enumerate(),
        }
    }
}

impl Iterator for FieldResolver<'_> {
    type Item = Result<Column, ColumnError>;

    fn next(&mut self) -> Option<Self::Item> {
        let (index, spec) = self.specs.next()?;
        Some(resolve_field(spec).ok_or_else(|| ColumnError::InvalidFieldSpec {
            index,
            spec: format!("{spec:?}"),
        }))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.specs.size_hint()
    }
}

impl ExactSizeIterator for FieldResolver<'_> {}

/// Normalize every spec, failing on the first one that matches no shape.
pub fn resolve_fields(specs: &[FieldSpec]) -> Result<Vec<Column>, ColumnError> {
    FieldResolver::new(specs).collect()
}
