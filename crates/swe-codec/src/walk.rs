//! Recursive record walks shared by the token based codecs.
//!
//! Decoding and encoding both traverse the bound component tree in document
//! order: record fields in declaration order, array elements in index
//! order, the choice selector before the selected item. Binary and text
//! formats only differ in how a single token is read or written.

use swe_common::{ComponentKind, DataBlock, DataComponent, DataError, DataType, ElementCount, SiblingScope, Value};
use tracing::trace;

use crate::config::CodecConfig;
use crate::error::{CodecError, CodecResult};

/// Source of tokens for [`read_record`].
///
/// `path` arguments are `/`-separated component names below the root, the
/// same form binary encodings use for member references.
pub(crate) trait TokenReader {
    /// Offset of the next unread byte.
    fn offset(&self) -> u64;

    /// Position the reader at the next record. Returns false at end of stream.
    fn begin_record(&mut self) -> CodecResult<bool>;

    fn end_record(&mut self) -> CodecResult<()>;

    fn read_scalar(&mut self, path: &str, data_type: DataType) -> CodecResult<Value>;

    /// Size of an array whose count is written right before its elements.
    fn read_count(&mut self, path: &str) -> CodecResult<i64>;

    /// Index of the selected choice item.
    fn read_choice(&mut self, path: &str, items: &[DataComponent]) -> CodecResult<i64>;
}

/// Sink of tokens for [`write_record`].
pub(crate) trait TokenWriter {
    fn begin_record(&mut self) -> CodecResult<()>;

    fn end_record(&mut self) -> CodecResult<()>;

    fn write_scalar(&mut self, path: &str, data_type: DataType, value: &Value) -> CodecResult<()>;

    fn write_count(&mut self, path: &str, count: usize) -> CodecResult<()>;

    fn write_choice(&mut self, path: &str, index: usize, item: &str) -> CodecResult<()>;
}

/// What to do at a component, extracted before mutating it.
enum Step {
    Scalar(DataType),
    Record,
    Array,
    Choice,
}

fn step_of(component: &DataComponent) -> Step {
    match component.kind() {
        ComponentKind::Scalar(scalar) => Step::Scalar(scalar.data_type()),
        ComponentKind::Record(_) => Step::Record,
        ComponentKind::Array(_) => Step::Array,
        ComponentKind::Choice(_) => Step::Choice,
    }
}

/// Append `name` to `path`, returning the length to truncate back to.
pub(crate) fn push_path(path: &mut String, name: &str) -> usize {
    let mark = path.len();
    if !path.is_empty() {
        path.push('/');
    }
    path.push_str(name);
    mark
}

/// Check a size read from the stream against the configured limit.
pub(crate) fn checked_size(
    size: i64,
    offset: u64,
    path: &str,
    config: &CodecConfig,
) -> CodecResult<usize> {
    match usize::try_from(size) {
        Ok(size) if size <= config.max_array_size => Ok(size),
        Ok(size) => Err(CodecError::parse(
            offset,
            format!(
                "array '{}' size {} exceeds limit {}",
                path, size, config.max_array_size
            ),
        )),
        Err(_) => Err(CodecError::parse(
            offset,
            format!("array '{}' has negative size {}", path, size),
        )),
    }
}

// ============================================================================
// Decoding
// ============================================================================

/// Decode one record into the block bound to `root`.
///
/// Returns false when the stream ended cleanly before the record.
pub(crate) fn read_record<T: TokenReader>(
    reader: &mut T,
    root: &mut DataComponent,
    config: &CodecConfig,
) -> CodecResult<bool> {
    if !reader.begin_record()? {
        return Ok(false);
    }
    let start = reader.offset();
    let mut path = String::new();
    read_component(reader, root, &SiblingScope::root(), &mut path, config)?;
    reader.end_record()?;
    trace!(start, end = reader.offset(), "decoded record");
    Ok(true)
}

fn read_component<T: TokenReader>(
    reader: &mut T,
    component: &mut DataComponent,
    scope: &SiblingScope<'_>,
    path: &mut String,
    config: &CodecConfig,
) -> CodecResult<()> {
    match step_of(component) {
        Step::Scalar(data_type) => {
            let offset = reader.offset();
            let value = reader.read_scalar(path, data_type)?;
            component.set_value(&value).map_err(|err| match err {
                DataError::Conversion { .. } => {
                    CodecError::parse(offset, format!("'{}': {}", path, err))
                }
                other => other.into(),
            })
        }

        Step::Record => component.for_each_field_mut(Some(scope), |field, inner| {
            let mark = push_path(path, field.name());
            let result = read_component(reader, field, inner, path, config);
            path.truncate(mark);
            result
        }),

        Step::Array => {
            let offset = reader.offset();
            let size = match component.element_count()? {
                ElementCount::Fixed(n) => *n,
                ElementCount::Inline => {
                    let size = reader.read_count(path)?;
                    checked_size(size, offset, path, config)?
                }
                ElementCount::Sibling(name) => {
                    let count = scope
                        .lookup(name)
                        .ok_or_else(|| {
                            DataError::structure(format!("array size field '{}' not found", name))
                        })?
                        .value()?
                        .as_long()?;
                    checked_size(count, offset, path, config)?
                }
            };
            component.resize_array(size)?;
            component.for_each_element_mut(scope, |_, element, scope| {
                let mark = push_path(path, element.name());
                let result = read_component(reader, element, scope, path, config);
                path.truncate(mark);
                result
            })
        }

        Step::Choice => {
            let offset = reader.offset();
            let index = reader.read_choice(path, component.children())?;
            let count = component.component_count();
            let index = usize::try_from(index)
                .ok()
                .filter(|i| *i < count)
                .ok_or_else(|| {
                    CodecError::parse(
                        offset,
                        format!("choice '{}' has no item {} ({} items)", path, index, count),
                    )
                })?;

            let reuse = component.selected_index()? == Some(index)
                && component.selected_item()?.has_data();
            if !reuse {
                component.select_item(index)?;
            }

            let item = component.selected_item_mut()?;
            let mark = push_path(path, item.name());
            let result = read_component(reader, item, scope, path, config);
            path.truncate(mark);
            component.sync_selected_item();
            result
        }
    }
}

// ============================================================================
// Encoding
// ============================================================================

/// Encode `block` as one record, using `root` to interpret it.
///
/// `root` is bound to an alias of `block` for the duration of the walk.
pub(crate) fn write_record<W: TokenWriter>(
    writer: &mut W,
    root: &mut DataComponent,
    block: &DataBlock,
) -> CodecResult<()> {
    root.assign(block.alias())?;
    writer.begin_record()?;
    let mut path = String::new();
    write_component(writer, root, &SiblingScope::root(), &mut path)?;
    writer.end_record()
}

fn write_component<W: TokenWriter>(
    writer: &mut W,
    component: &mut DataComponent,
    scope: &SiblingScope<'_>,
    path: &mut String,
) -> CodecResult<()> {
    match step_of(component) {
        Step::Scalar(data_type) => {
            let value = component.value()?;
            writer.write_scalar(path, data_type, &value)
        }

        Step::Record => component.for_each_field_mut(Some(scope), |field, inner| {
            let mark = push_path(path, field.name());
            let result = write_component(writer, field, inner, path);
            path.truncate(mark);
            result
        }),

        Step::Array => {
            let size = component.array_size()?;
            match component.element_count()? {
                ElementCount::Fixed(_) => {}
                ElementCount::Inline => writer.write_count(path, size)?,
                ElementCount::Sibling(name) => {
                    let declared = scope.count_of(name)?;
                    if declared != size {
                        return Err(CodecError::write(format!(
                            "array '{}' has {} elements but size field '{}' holds {}",
                            path, size, name, declared
                        )));
                    }
                }
            }
            component.for_each_element_mut(scope, |_, element, scope| {
                let mark = push_path(path, element.name());
                let result = write_component(writer, element, scope, path);
                path.truncate(mark);
                result
            })
        }

        Step::Choice => {
            let index = component.selected_index()?.ok_or_else(|| {
                CodecError::write(format!("choice '{}' has no selected item", path))
            })?;
            let item = component.selected_item_mut()?;
            writer.write_choice(path, index, item.name())?;
            let mark = push_path(path, item.name());
            let result = write_component(writer, item, scope, path);
            path.truncate(mark);
            result
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_path_marks() {
        let mut path = String::new();
        let root = push_path(&mut path, "values");
        let inner = push_path(&mut path, "value");
        assert_eq!(path, "values/value");
        path.truncate(inner);
        assert_eq!(path, "values");
        path.truncate(root);
        assert!(path.is_empty());
    }

    #[test]
    fn test_checked_size_limits() {
        let config = CodecConfig {
            max_array_size: 10,
            ..Default::default()
        };
        assert_eq!(checked_size(10, 0, "a", &config).unwrap(), 10);
        assert!(checked_size(11, 0, "a", &config).is_err());
        assert!(checked_size(-1, 0, "a", &config).is_err());
    }
}
