//! Type identities and assignability facts
//!
//! Provides [`TypeRef`], the handle used for service and implementation types.
//! There is no runtime reflection to consult, so each handle carries the
//! facts the validators need: its identity, its generic shape, and the set of
//! type keys it has been declared assignable to.

use crate::error::TypeParseError;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt::{self, Display, Formatter};
use std::hash::{Hash, Hasher};
use std::str::FromStr;

/// Generic shape of a type
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum GenericShape {
    /// Plain type
    #[default]
    NonGeneric,

    /// Generic definition with unbound parameters (`IRepository<_>`)
    Open {
        /// Number of type parameters
        arity: usize,
    },

    /// Constructed generic (`IRepository<Order>`)
    Closed {
        /// Bound type arguments, in declaration order
        arguments: Vec<TypeRef>,
    },
}

/// Handle to a service or implementation type
///
/// Identity (equality, ordering, hashing) is namespace + name + generic
/// shape. Assignability facts ride along but never affect identity, so two
/// handles to the same type compare equal even if only one of them knows
/// what it implements.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TypeRef {
    namespace: String,
    name: String,
    generic: GenericShape,
    assignable_to: BTreeSet<String>,
}

impl TypeRef {
    /// Create a non-generic type
    #[must_use]
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self::with_generic(namespace, name, GenericShape::NonGeneric)
    }

    /// Create an open generic definition with `arity` parameters
    #[must_use]
    pub fn open_generic(namespace: impl Into<String>, name: impl Into<String>, arity: usize) -> Self {
        Self::with_generic(namespace, name, GenericShape::Open { arity })
    }

    /// Create a constructed generic type
    #[must_use]
    pub fn closed_generic(
        namespace: impl Into<String>,
        name: impl Into<String>,
        arguments: Vec<TypeRef>,
    ) -> Self {
        Self::with_generic(namespace, name, GenericShape::Closed { arguments })
    }

    /// Create a type with an explicit generic shape
    #[must_use]
    pub fn with_generic(
        namespace: impl Into<String>,
        name: impl Into<String>,
        generic: GenericShape,
    ) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
            generic,
            assignable_to: BTreeSet::new(),
        }
    }

    /// Record that values of this type may be used where `target` is required
    #[must_use]
    pub fn implements(mut self, target: &TypeRef) -> Self {
        self.assignable_to.insert(target.key());
        self
    }

    /// Namespace (may be empty)
    #[inline]
    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Simple name without namespace or generic suffix
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Generic shape
    #[inline]
    #[must_use]
    pub fn generic(&self) -> &GenericShape {
        &self.generic
    }

    /// `namespace.Name` without generic suffix
    #[must_use]
    pub fn full_name(&self) -> String {
        if self.namespace.is_empty() {
            self.name.clone()
        } else {
            format!("{}.{}", self.namespace, self.name)
        }
    }

    /// Identity key: full name plus generic suffix
    #[must_use]
    pub fn key(&self) -> String {
        let mut key = self.full_name();
        match &self.generic {
            GenericShape::NonGeneric => {}
            GenericShape::Open { arity } => {
                key.push('<');
                key.push_str(&vec!["_"; *arity].join(", "));
                key.push('>');
            }
            GenericShape::Closed { arguments } => {
                let args: Vec<String> = arguments.iter().map(TypeRef::key).collect();
                key.push('<');
                key.push_str(&args.join(", "));
                key.push('>');
            }
        }
        key
    }

    /// Whether this is a generic definition with unbound parameters
    #[inline]
    #[must_use]
    pub fn is_open_generic(&self) -> bool {
        matches!(self.generic, GenericShape::Open { .. })
    }

    /// Number of generic parameters (0 for plain types)
    #[must_use]
    pub fn generic_arity(&self) -> usize {
        match &self.generic {
            GenericShape::NonGeneric => 0,
            GenericShape::Open { arity } => *arity,
            GenericShape::Closed { arguments } => arguments.len(),
        }
    }

    /// Whether a value of this type can be used wherever `target` is required
    #[must_use]
    pub fn is_assignable_to(&self, target: &TypeRef) -> bool {
        self == target || self.assignable_to.contains(&target.key())
    }

    /// Keys of the types this one was declared assignable to
    pub fn assignable_targets(&self) -> impl Iterator<Item = &str> {
        self.assignable_to.iter().map(String::as_str)
    }
}

impl PartialEq for TypeRef {
    fn eq(&self, other: &Self) -> bool {
        self.namespace == other.namespace && self.name == other.name && self.generic == other.generic
    }
}

impl Eq for TypeRef {}

impl Hash for TypeRef {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.namespace.hash(state);
        self.name.hash(state);
        self.generic.hash(state);
    }
}

impl PartialOrd for TypeRef {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TypeRef {
    fn cmp(&self, other: &Self) -> Ordering {
        (&self.namespace, &self.name, &self.generic).cmp(&(
            &other.namespace,
            &other.name,
            &other.generic,
        ))
    }
}

impl Display for TypeRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key())
    }
}

impl FromStr for TypeRef {
    type Err = TypeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_type(s)
    }
}

impl TryFrom<String> for TypeRef {
    type Error = TypeParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        parse_type(&value)
    }
}

impl From<TypeRef> for String {
    fn from(value: TypeRef) -> Self {
        value.key()
    }
}

/// Serde adapter that keeps assignability facts
///
/// The plain string form of [`TypeRef`] carries identity only, which is what
/// configuration files use. Registration records go through this adapter so a
/// round trip preserves `is_assignable_to`:
/// `{"type": "Shop.DefaultPricing", "implements": ["Shop.IPricingService"]}`.
pub mod with_facts {
    use super::TypeRef;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::collections::BTreeSet;

    #[derive(Serialize)]
    struct Record {
        #[serde(rename = "type")]
        ty: String,
        #[serde(skip_serializing_if = "BTreeSet::is_empty")]
        implements: BTreeSet<String>,
    }

    #[derive(Deserialize)]
    struct OwnedRecord {
        #[serde(rename = "type")]
        ty: TypeRef,
        #[serde(default)]
        implements: BTreeSet<String>,
    }

    /// Serialize `ty` with its declared targets
    ///
    /// # Errors
    /// Propagates serializer errors
    pub fn serialize<S: Serializer>(ty: &TypeRef, serializer: S) -> Result<S::Ok, S::Error> {
        Record {
            ty: ty.key(),
            implements: ty.assignable_to.clone(),
        }
        .serialize(serializer)
    }

    /// Deserialize a type and restore its declared targets
    ///
    /// # Errors
    /// Malformed type names or an unexpected shape
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<TypeRef, D::Error> {
        let record = OwnedRecord::deserialize(deserializer)?;
        let mut ty = record.ty;
        ty.assignable_to = record.implements;
        Ok(ty)
    }
}

fn parse_type(input: &str) -> Result<TypeRef, TypeParseError> {
    let text = input.trim();
    if text.is_empty() {
        return Err(TypeParseError::Empty);
    }

    let (head, generic) = match text.find('<') {
        None if text.contains('>') => {
            return Err(TypeParseError::UnbalancedGenerics(text.to_string()));
        }
        None => (text, GenericShape::NonGeneric),
        Some(open) => {
            if !text.ends_with('>') {
                return Err(TypeParseError::UnbalancedGenerics(text.to_string()));
            }
            let inner = &text[open + 1..text.len() - 1];
            (&text[..open], parse_arguments(text, inner)?)
        }
    };

    let (namespace, name) = head.rsplit_once('.').unwrap_or(("", head));
    if !is_identifier(name) {
        return Err(TypeParseError::InvalidName(text.to_string()));
    }
    if !namespace.is_empty() && !namespace.split('.').all(is_identifier) {
        return Err(TypeParseError::InvalidName(text.to_string()));
    }

    Ok(TypeRef::with_generic(namespace, name, generic))
}

fn parse_arguments(full: &str, inner: &str) -> Result<GenericShape, TypeParseError> {
    if inner.trim().is_empty() {
        return Err(TypeParseError::EmptyGenericArguments(full.to_string()));
    }

    let parts = split_arguments(full, inner)?;
    let open = parts.iter().filter(|part| **part == "_").count();

    if open == parts.len() {
        Ok(GenericShape::Open { arity: parts.len() })
    } else if open == 0 {
        let arguments = parts
            .into_iter()
            .map(parse_type)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(GenericShape::Closed { arguments })
    } else {
        Err(TypeParseError::PartiallyOpen(full.to_string()))
    }
}

/// Split on top-level commas only, so `Map<Key, List<Value>>` yields two parts
fn split_arguments<'a>(full: &str, inner: &'a str) -> Result<Vec<&'a str>, TypeParseError> {
    let mut depth = 0usize;
    let mut start = 0;
    let mut parts = Vec::new();

    for (i, c) in inner.char_indices() {
        match c {
            '<' => depth += 1,
            '>' => {
                depth = depth
                    .checked_sub(1)
                    .ok_or_else(|| TypeParseError::UnbalancedGenerics(full.to_string()))?;
            }
            ',' if depth == 0 => {
                parts.push(inner[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }

    if depth != 0 {
        return Err(TypeParseError::UnbalancedGenerics(full.to_string()));
    }
    parts.push(inner[start..].trim());
    Ok(parts)
}

fn is_identifier(segment: &str) -> bool {
    let mut chars = segment.chars();
    match chars.next() {
        Some(first) if first.is_alphabetic() || first == '_' => {
            chars.all(|c| c.is_alphanumeric() || c == '_')
        }
        _ => false,
    }
}
