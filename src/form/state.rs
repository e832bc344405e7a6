//! Mutable form values bound to one specification.
//!
//! Array fields hold an [`ArrayGroup`]: an arena of item states plus their
//! display order. Item ids are assigned once on append and never reused, so an
//! item keeps its identity when an earlier sibling is removed.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use thiserror::Error;

use crate::path::{FieldPath, Segment};
use crate::spec::{FieldKind, FieldSpec};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(u64);

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum FormError {
    #[error("no field at '{0}'")]
    UnknownField(String),
    #[error("'{0}' is a repeatable group, not a single value")]
    NotAValue(String),
    #[error("'{0}' is not a repeatable group")]
    NotAGroup(String),
    #[error("no entry at position {position} of '{path}'")]
    ItemOutOfRange { path: String, position: usize },
    #[error("'{0}' only accepts a single text or number value")]
    InvalidValue(String),
}

#[derive(Debug, Clone, PartialEq)]
enum Slot {
    Value(Value),
    Group(ArrayGroup),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArrayGroup {
    next_id: u64,
    order: Vec<ItemId>,
    arena: HashMap<ItemId, FormState>,
}

impl ArrayGroup {
    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Items in display order.
    pub fn iter(&self) -> impl Iterator<Item = (ItemId, &FormState)> {
        self.order
            .iter()
            .filter_map(move |id| self.arena.get(id).map(|item| (*id, item)))
    }

    pub fn id_at(&self, position: usize) -> Option<ItemId> {
        self.order.get(position).copied()
    }

    pub fn get(&self, id: ItemId) -> Option<&FormState> {
        self.arena.get(&id)
    }

    pub fn position_of(&self, id: ItemId) -> Option<usize> {
        self.order.iter().position(|candidate| *candidate == id)
    }

    fn push(&mut self, item: FormState) -> ItemId {
        let id = ItemId(self.next_id);
        self.next_id += 1;
        self.order.push(id);
        self.arena.insert(id, item);
        id
    }

    fn remove(&mut self, position: usize) -> Option<ItemId> {
        if position >= self.order.len() {
            return None;
        }
        let id = self.order.remove(position);
        self.arena.remove(&id);
        Some(id)
    }

    fn item_mut(&mut self, position: usize) -> Option<&mut FormState> {
        let id = self.order.get(position)?;
        self.arena.get_mut(id)
    }

    fn item(&self, position: usize) -> Option<&FormState> {
        let id = self.order.get(position)?;
        self.arena.get(id)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormState {
    slots: BTreeMap<String, Slot>,
}

impl FormState {
    /// Empty state: blank scalars (or the field's `default`) and empty groups.
    pub fn new(fields: &[FieldSpec]) -> Self {
        let slots = fields
            .iter()
            .map(|field| (field.key.clone(), initial_slot(field)))
            .collect();
        Self { slots }
    }

    /// State seeded from caller-supplied values. Keys outside the specification
    /// are dropped; array defaults become one instance per listed object.
    pub fn with_defaults(fields: &[FieldSpec], defaults: &Map<String, Value>) -> Self {
        let mut state = Self::new(fields);
        for (key, value) in defaults {
            let Some(field) = fields.iter().find(|field| &field.key == key) else {
                log::debug!("Ignoring default for unknown field '{}'", key);
                continue;
            };
            match (state.slots.get_mut(key), value) {
                (Some(Slot::Group(group)), Value::Array(entries)) => {
                    for entry in entries {
                        let item = match entry {
                            Value::Object(values) => {
                                FormState::with_defaults(field.item_fields(), values)
                            }
                            _ => FormState::new(field.item_fields()),
                        };
                        group.push(item);
                    }
                }
                (Some(Slot::Value(slot)), value) if is_scalar(value) => {
                    *slot = value.clone();
                }
                _ => log::debug!("Ignoring default of the wrong shape for '{}'", key),
            }
        }
        state
    }

    pub fn value(&self, key: &str) -> Option<&Value> {
        match self.slots.get(key) {
            Some(Slot::Value(value)) => Some(value),
            _ => None,
        }
    }

    pub fn group(&self, key: &str) -> Option<&ArrayGroup> {
        match self.slots.get(key) {
            Some(Slot::Group(group)) => Some(group),
            _ => None,
        }
    }

    /// Value at a full path such as `dependents.0.name`.
    pub fn get(&self, path: &FieldPath) -> Option<&Value> {
        match path.segments().split_last()? {
            (Segment::Key(key), parents) => self.descend(parents)?.value(key),
            (Segment::Index(_), _) => None,
        }
    }

    /// Group at a full path such as `households.1.members`.
    pub fn group_at(&self, path: &FieldPath) -> Option<&ArrayGroup> {
        match path.segments().split_last()? {
            (Segment::Key(key), parents) => self.descend(parents)?.group(key),
            (Segment::Index(_), _) => None,
        }
    }

    /// Follows `key.position` pairs down to a nested item state.
    fn descend(&self, segments: &[Segment]) -> Option<&FormState> {
        match segments {
            [] => Some(self),
            [Segment::Key(key), Segment::Index(position), rest @ ..] => {
                self.group(key)?.item(*position)?.descend(rest)
            }
            _ => None,
        }
    }

    pub fn set(
        &mut self,
        fields: &[FieldSpec],
        path: &FieldPath,
        value: Value,
    ) -> Result<(), FormError> {
        if !is_scalar(&value) {
            return Err(FormError::InvalidValue(path.to_string()));
        }
        match resolve_mut(self, fields, path.segments(), path)? {
            (Slot::Value(slot), _) => {
                *slot = value;
                Ok(())
            }
            (Slot::Group(_), _) => Err(FormError::NotAValue(path.to_string())),
        }
    }

    /// Appends one instance with every child initialised to blank or its default.
    pub fn append_item(&mut self, fields: &[FieldSpec], path: &FieldPath) -> Result<ItemId, FormError> {
        match resolve_mut(self, fields, path.segments(), path)? {
            (Slot::Group(group), field) => Ok(group.push(FormState::new(field.item_fields()))),
            (Slot::Value(_), _) => Err(FormError::NotAGroup(path.to_string())),
        }
    }

    /// Removes the instance at `position`; later instances keep their ids.
    pub fn remove_item(
        &mut self,
        fields: &[FieldSpec],
        path: &FieldPath,
        position: usize,
    ) -> Result<ItemId, FormError> {
        match resolve_mut(self, fields, path.segments(), path)? {
            (Slot::Group(group), _) => {
                group.remove(position).ok_or_else(|| FormError::ItemOutOfRange {
                    path: path.to_string(),
                    position,
                })
            }
            (Slot::Value(_), _) => Err(FormError::NotAGroup(path.to_string())),
        }
    }

    /// Plain value map, arrays as ordered lists of item maps.
    pub fn snapshot(&self) -> Map<String, Value> {
        self.slots
            .iter()
            .map(|(key, slot)| {
                let value = match slot {
                    Slot::Value(value) => value.clone(),
                    Slot::Group(group) => Value::Array(
                        group
                            .iter()
                            .map(|(_, item)| Value::Object(item.snapshot()))
                            .collect(),
                    ),
                };
                (key.clone(), value)
            })
            .collect()
    }
}

fn is_scalar(value: &Value) -> bool {
    !matches!(value, Value::Array(_) | Value::Object(_))
}

fn initial_slot(field: &FieldSpec) -> Slot {
    match field.kind {
        FieldKind::Array => Slot::Group(ArrayGroup::default()),
        FieldKind::Number => Slot::Value(
            field
                .default
                .as_ref()
                .map(|default| default.to_json())
                .unwrap_or(Value::Null),
        ),
        _ => Slot::Value(match field.default.as_ref().map(|default| default.to_json()) {
            Some(Value::String(text)) => Value::String(text),
            Some(Value::Number(number)) => Value::String(number.to_string()),
            _ => Value::String(String::new()),
        }),
    }
}

fn resolve_mut<'a>(
    state: &'a mut FormState,
    fields: &'a [FieldSpec],
    segments: &[Segment],
    full: &FieldPath,
) -> Result<(&'a mut Slot, &'a FieldSpec), FormError> {
    let unknown = || FormError::UnknownField(full.to_string());
    let Some((Segment::Key(key), rest)) = segments.split_first() else {
        return Err(unknown());
    };
    let field = fields.iter().find(|field| &field.key == key).ok_or_else(unknown)?;
    let slot = state.slots.get_mut(key).ok_or_else(unknown)?;

    match (slot, rest) {
        (slot, []) => Ok((slot, field)),
        (Slot::Group(group), [Segment::Index(position), tail @ ..]) => {
            let item = group.item_mut(*position).ok_or_else(|| {
                let consumed = full.segments().len() - rest.len();
                FormError::ItemOutOfRange {
                    path: full.truncated(consumed).to_string(),
                    position: *position,
                }
            })?;
            resolve_mut(item, field.item_fields(), tail, full)
        }
        _ => Err(unknown()),
    }
}
