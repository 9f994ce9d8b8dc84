//! Boolean predicate algebra over entities.
//!
//! An [`EntitySelector`] is an immutable expression tree. Evaluation
//! short-circuits: `And` stops at the first failing child, `Or` at the first
//! passing one. Both evaluate to `false` when they have no children.
//!
//! The `&`, `|` and `!` operators build trees with two rewrite rules and no
//! others:
//!
//! - `And(xs) & y` appends `y` to `xs` (likewise `Or(xs) | y`). Only the
//!   left-hand side is ever flattened.
//! - `!Not(x)` unwraps to `x`.
//!
//! De Morgan's laws are never applied.

use std::fmt;
use std::ops;
use std::rc::Rc;

use engine_component::{Component, ComponentTypeId};
use serde::{Deserialize, Serialize};

use crate::entity::{Entity, EntityRef};

/// A caller-supplied test, compared by identity.
#[derive(Clone)]
pub struct Predicate(Rc<dyn Fn(&Entity) -> bool>);

impl Predicate {
    pub fn new(test: impl Fn(&Entity) -> bool + 'static) -> Self {
        Self(Rc::new(test))
    }

    fn test(&self, entity: &Entity) -> bool {
        (self.0)(entity)
    }
}

impl PartialEq for Predicate {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::addr_eq(Rc::as_ptr(&self.0), Rc::as_ptr(&other.0))
    }
}

impl fmt::Debug for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Predicate(..)")
    }
}

/// A boolean expression over an entity.
///
/// Every variant except [`Predicate`](EntitySelector::Predicate) is plain
/// data and can be serialised.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub enum EntitySelector {
    /// Rejects every entity.
    #[default]
    None,
    /// Accepts every entity.
    Any,
    Not(Box<EntitySelector>),
    /// Passes if any child passes. Empty never passes.
    Or(Vec<EntitySelector>),
    /// Passes if every child passes. Empty never passes.
    And(Vec<EntitySelector>),
    /// Has at least one component whose type id is exactly this one.
    Component(ComponentTypeId),
    /// `entity.id` equals this value.
    Id(u64),
    /// `entity.type_flags & mask` is non-zero.
    TypeFlag(u64),
    #[serde(skip)]
    Predicate(Predicate),
}

impl EntitySelector {
    /// Matches entities carrying a component of type `T`.
    #[must_use]
    pub fn component<T: Component>() -> Self {
        Self::Component(T::component_type_id())
    }

    #[must_use]
    pub fn id(id: u64) -> Self {
        Self::Id(id)
    }

    #[must_use]
    pub fn type_flag(mask: u64) -> Self {
        Self::TypeFlag(mask)
    }

    pub fn predicate(test: impl Fn(&Entity) -> bool + 'static) -> Self {
        Self::Predicate(Predicate::new(test))
    }

    pub fn all_of(selectors: impl IntoIterator<Item = EntitySelector>) -> Self {
        Self::And(selectors.into_iter().collect())
    }

    pub fn any_of(selectors: impl IntoIterator<Item = EntitySelector>) -> Self {
        Self::Or(selectors.into_iter().collect())
    }

    /// Conjunction, appending to `self` if it already is an `And`.
    #[must_use]
    pub fn and(self, rhs: EntitySelector) -> Self {
        match self {
            Self::And(mut children) => {
                children.push(rhs);
                Self::And(children)
            }
            lhs => Self::And(vec![lhs, rhs]),
        }
    }

    /// Disjunction, appending to `self` if it already is an `Or`.
    #[must_use]
    pub fn or(self, rhs: EntitySelector) -> Self {
        match self {
            Self::Or(mut children) => {
                children.push(rhs);
                Self::Or(children)
            }
            lhs => Self::Or(vec![lhs, rhs]),
        }
    }

    /// Test `entity` against this selector.
    #[must_use]
    pub fn evaluate(&self, entity: &Entity) -> bool {
        match self {
            Self::None => false,
            Self::Any => true,
            Self::Not(inner) => !inner.evaluate(entity),
            Self::Or(children) => children.iter().any(|child| child.evaluate(entity)),
            Self::And(children) => {
                !children.is_empty() && children.iter().all(|child| child.evaluate(entity))
            }
            Self::Component(type_id) => entity.has_component_type(*type_id),
            Self::Id(id) => entity.id == *id,
            Self::TypeFlag(mask) => entity.type_flags & mask != 0,
            Self::Predicate(predicate) => predicate.test(entity),
        }
    }

    /// Lazily filter `entities` down to those this selector accepts.
    ///
    /// The returned iterator is `Clone`, so it can be restarted; each pass
    /// re-evaluates the selector.
    pub fn select<'a>(
        &'a self,
        entities: &'a [EntityRef],
    ) -> impl Iterator<Item = &'a EntityRef> + Clone + 'a {
        entities
            .iter()
            .filter(move |entity| self.evaluate(&entity.borrow()))
    }
}

impl ops::BitAnd for EntitySelector {
    type Output = EntitySelector;

    fn bitand(self, rhs: EntitySelector) -> EntitySelector {
        self.and(rhs)
    }
}

impl ops::BitOr for EntitySelector {
    type Output = EntitySelector;

    fn bitor(self, rhs: EntitySelector) -> EntitySelector {
        self.or(rhs)
    }
}

impl ops::Not for EntitySelector {
    type Output = EntitySelector;

    fn not(self) -> EntitySelector {
        match self {
            Self::Not(inner) => *inner,
            other => Self::Not(Box::new(other)),
        }
    }
}
