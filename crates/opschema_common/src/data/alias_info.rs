use id_collections::id_type;
use std::cmp::Ordering;
use std::collections::BTreeSet;

/// An interned alias-set name.  Ids are only meaningful relative to the schema which interned
/// them; see `FunctionSchema::alias_set_name`.
#[id_type]
pub struct AliasSetId(u32);

/// The alias annotation attached to a single argument or return, after interning.
///
/// An argument with no `AliasInfo` at all never aliases anything and is never written.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AliasInfo {
    /// Alias sets the value belongs to as it is passed in.
    pub before: BTreeSet<AliasSetId>,
    /// Alias sets the value belongs to once the call returns.
    pub after: BTreeSet<AliasSetId>,
    pub is_write: bool,
    /// The value may alias storage not named anywhere in the schema, and so may alias every other
    /// aliasable value in it.
    pub is_wildcard: bool,
}

impl AliasInfo {
    pub fn sets(&self, side: Side) -> &BTreeSet<AliasSetId> {
        match side {
            Side::Before => &self.before,
            Side::After => &self.after,
        }
    }
}

/// Whether two alias-set lists share a member.
pub fn sets_intersect(lhs: &BTreeSet<AliasSetId>, rhs: &BTreeSet<AliasSetId>) -> bool {
    // Both sides are sorted, so walk them together instead of doing repeated lookups.
    let mut lhs = lhs.iter().peekable();
    let mut rhs = rhs.iter().peekable();
    while let (Some(l), Some(r)) = (lhs.peek().copied(), rhs.peek().copied()) {
        match l.cmp(r) {
            Ordering::Less => {
                lhs.next();
            }
            Ordering::Greater => {
                rhs.next();
            }
            Ordering::Equal => return true,
        }
    }
    false
}

/// Which of an `AliasInfo`'s two set lists is being observed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Side {
    Before,
    After,
}

/// The name-based form of an alias annotation, as written in a signature.  Names are interned
/// into `AliasSetId`s by `SchemaBuilder` when the annotation is attached to an argument.
///
/// | signature        | annotation                                        |
/// |------------------|---------------------------------------------------|
/// | `Tensor(a)`      | `AliasAnnotation::set("a")`                       |
/// | `Tensor(a!)`     | `AliasAnnotation::set("a").write()`               |
/// | `Tensor(a\|b)`   | `AliasAnnotation::sets(["a", "b"])`               |
/// | `Tensor(a -> b)` | `AliasAnnotation::transition(["a"], ["b"])`       |
/// | `Tensor(*)`      | `AliasAnnotation::wildcard()`                     |
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AliasAnnotation {
    pub(crate) before: Vec<String>,
    pub(crate) after: Vec<String>,
    pub(crate) is_write: bool,
    pub(crate) is_wildcard: bool,
}

impl AliasAnnotation {
    pub fn set(name: impl Into<String>) -> Self {
        Self::sets([name])
    }

    pub fn sets<S: Into<String>>(names: impl IntoIterator<Item = S>) -> Self {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();
        AliasAnnotation {
            before: names.clone(),
            after: names,
            is_write: false,
            is_wildcard: false,
        }
    }

    pub fn transition<B, A>(
        before: impl IntoIterator<Item = B>,
        after: impl IntoIterator<Item = A>,
    ) -> Self
    where
        B: Into<String>,
        A: Into<String>,
    {
        AliasAnnotation {
            before: before.into_iter().map(Into::into).collect(),
            after: after.into_iter().map(Into::into).collect(),
            is_write: false,
            is_wildcard: false,
        }
    }

    pub fn wildcard() -> Self {
        AliasAnnotation {
            before: Vec::new(),
            after: Vec::new(),
            is_write: false,
            is_wildcard: true,
        }
    }

    pub fn write(mut self) -> Self {
        self.is_write = true;
        self
    }
}
