use id_collections::IdVec;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::data::alias_info::{AliasAnnotation, AliasInfo, AliasSetId, Side};

#[derive(Clone, Debug)]
pub struct Argument {
    /// Returns are frequently unnamed, in which case this is empty.
    pub name: String,
    pub alias_info: Option<AliasInfo>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Role {
    Input,
    Output,
}

impl Role {
    /// Inputs are observed as they are passed in, outputs as they are returned.
    pub fn side(self) -> Side {
        match self {
            Role::Input => Side::Before,
            Role::Output => Side::After,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Input => write!(f, "input"),
            Role::Output => write!(f, "output"),
        }
    }
}

/// Addresses one argument (`Role::Input`) or return (`Role::Output`) of a schema by position.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct OperandRef {
    pub role: Role,
    pub index: usize,
}

impl OperandRef {
    pub fn input(index: usize) -> Self {
        OperandRef {
            role: Role::Input,
            index,
        }
    }

    pub fn output(index: usize) -> Self {
        OperandRef {
            role: Role::Output,
            index,
        }
    }
}

/// The signature of a single operator overload, with every alias annotation interned.
#[derive(Clone, Debug)]
pub struct FunctionSchema {
    name: String,
    overload_name: String,
    arguments: Vec<Argument>,
    returns: Vec<Argument>,
    alias_sets: IdVec<AliasSetId, String>,
}

impl FunctionSchema {
    pub fn builder(name: impl Into<String>) -> SchemaBuilder {
        SchemaBuilder {
            name: name.into(),
            overload_name: String::new(),
            arguments: Vec::new(),
            returns: Vec::new(),
            alias_sets: IdVec::new(),
            alias_set_ids: BTreeMap::new(),
        }
    }

    /// The operator name without its overload, e.g. `aten::add`.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn overload_name(&self) -> &str {
        &self.overload_name
    }

    /// The operator name with its overload, e.g. `aten::add.Tensor`.
    pub fn qualified_name(&self) -> String {
        if self.overload_name.is_empty() {
            self.name.clone()
        } else {
            format!("{}.{}", self.name, self.overload_name)
        }
    }

    pub fn arguments(&self) -> &[Argument] {
        &self.arguments
    }

    pub fn returns(&self) -> &[Argument] {
        &self.returns
    }

    pub fn operands(&self, role: Role) -> &[Argument] {
        match role {
            Role::Input => &self.arguments,
            Role::Output => &self.returns,
        }
    }

    pub fn operand(&self, operand: OperandRef) -> Option<&Argument> {
        self.operands(operand.role).get(operand.index)
    }

    /// Returns the position of the first input named `name`.
    pub fn argument_index_with_name(&self, name: &str) -> Option<usize> {
        self.arguments.iter().position(|arg| arg.name == name)
    }

    pub fn alias_set_name(&self, id: AliasSetId) -> &str {
        &self.alias_sets[id]
    }

    fn fmt_alias_sets(
        &self,
        f: &mut fmt::Formatter<'_>,
        sets: &BTreeSet<AliasSetId>,
    ) -> fmt::Result {
        for (i, id) in sets.iter().enumerate() {
            if i != 0 {
                write!(f, "|")?;
            }
            write!(f, "{}", self.alias_set_name(*id))?;
        }
        Ok(())
    }

    fn fmt_alias_info(&self, f: &mut fmt::Formatter<'_>, info: &AliasInfo) -> fmt::Result {
        write!(f, "(")?;
        if info.is_wildcard {
            write!(f, "*")?;
        } else {
            self.fmt_alias_sets(f, &info.before)?;
            if info.after != info.before {
                write!(f, " -> ")?;
                self.fmt_alias_sets(f, &info.after)?;
            }
        }
        if info.is_write {
            write!(f, "!")?;
        }
        write!(f, ")")
    }

    fn fmt_argument(&self, f: &mut fmt::Formatter<'_>, arg: &Argument) -> fmt::Result {
        match (&arg.alias_info, arg.name.is_empty()) {
            (None, true) => write!(f, "_"),
            (None, false) => write!(f, "{}", arg.name),
            (Some(info), _) => {
                write!(f, "{}", arg.name)?;
                self.fmt_alias_info(f, info)
            }
        }
    }
}

/// Renders the schema in the style of the annotation grammar, e.g.
/// `aten::add_.Tensor(self(a!), other) -> ((a))`.  Types are not tracked, so only names and alias
/// annotations appear.
impl fmt::Display for FunctionSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.qualified_name())?;
        for (i, arg) in self.arguments.iter().enumerate() {
            if i != 0 {
                write!(f, ", ")?;
            }
            self.fmt_argument(f, arg)?;
        }
        write!(f, ") -> (")?;
        for (i, ret) in self.returns.iter().enumerate() {
            if i != 0 {
                write!(f, ", ")?;
            }
            self.fmt_argument(f, ret)?;
        }
        write!(f, ")")
    }
}

/// Assembles a `FunctionSchema`, interning alias-set names as annotations are attached.  This is
/// the programmatic counterpart of parsing a signature string.
#[derive(Clone, Debug)]
pub struct SchemaBuilder {
    name: String,
    overload_name: String,
    arguments: Vec<Argument>,
    returns: Vec<Argument>,
    alias_sets: IdVec<AliasSetId, String>,
    alias_set_ids: BTreeMap<String, AliasSetId>,
}

impl SchemaBuilder {
    pub fn overload(mut self, overload_name: impl Into<String>) -> Self {
        self.overload_name = overload_name.into();
        self
    }

    pub fn arg(mut self, name: impl Into<String>) -> Self {
        self.arguments.push(Argument {
            name: name.into(),
            alias_info: None,
        });
        self
    }

    pub fn arg_alias(mut self, name: impl Into<String>, annot: AliasAnnotation) -> Self {
        let alias_info = Some(self.intern_annotation(annot));
        self.arguments.push(Argument {
            name: name.into(),
            alias_info,
        });
        self
    }

    pub fn ret(mut self, name: impl Into<String>) -> Self {
        self.returns.push(Argument {
            name: name.into(),
            alias_info: None,
        });
        self
    }

    pub fn ret_alias(mut self, name: impl Into<String>, annot: AliasAnnotation) -> Self {
        let alias_info = Some(self.intern_annotation(annot));
        self.returns.push(Argument {
            name: name.into(),
            alias_info,
        });
        self
    }

    pub fn build(self) -> FunctionSchema {
        FunctionSchema {
            name: self.name,
            overload_name: self.overload_name,
            arguments: self.arguments,
            returns: self.returns,
            alias_sets: self.alias_sets,
        }
    }

    fn intern_set(&mut self, name: String) -> AliasSetId {
        if let Some(id) = self.alias_set_ids.get(&name) {
            return *id;
        }
        let id = self.alias_sets.push(name.clone());
        self.alias_set_ids.insert(name, id);
        id
    }

    fn intern_annotation(&mut self, annot: AliasAnnotation) -> AliasInfo {
        let before = annot
            .before
            .into_iter()
            .map(|name| self.intern_set(name))
            .collect();
        let after = annot
            .after
            .into_iter()
            .map(|name| self.intern_set(name))
            .collect();
        AliasInfo {
            before,
            after,
            is_write: annot.is_write,
            is_wildcard: annot.is_wildcard,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn add_inplace() -> FunctionSchema {
        FunctionSchema::builder("aten::add_")
            .overload("Tensor")
            .arg_alias("self", AliasAnnotation::set("a").write())
            .arg("other")
            .arg("alpha")
            .ret_alias("", AliasAnnotation::set("a"))
            .build()
    }

    #[test]
    fn test_interning_is_per_name() {
        let schema = FunctionSchema::builder("aten::split")
            .arg_alias("self", AliasAnnotation::set("a"))
            .arg_alias("other", AliasAnnotation::set("b"))
            .ret_alias("", AliasAnnotation::set("a"))
            .build();

        let self_sets = &schema.arguments()[0].alias_info.as_ref().unwrap().before;
        let other_sets = &schema.arguments()[1].alias_info.as_ref().unwrap().before;
        let ret_sets = &schema.returns()[0].alias_info.as_ref().unwrap().after;

        assert_eq!(self_sets, ret_sets);
        assert_ne!(self_sets, other_sets);

        let id = *self_sets.iter().next().unwrap();
        assert_eq!(schema.alias_set_name(id), "a");
    }

    #[test]
    fn test_operand_lookup() {
        let schema = add_inplace();

        assert_eq!(schema.operand(OperandRef::input(1)).unwrap().name, "other");
        assert!(schema.operand(OperandRef::output(0)).is_some());
        assert!(schema.operand(OperandRef::input(3)).is_none());
        assert!(schema.operand(OperandRef::output(1)).is_none());

        assert_eq!(schema.argument_index_with_name("alpha"), Some(2));
        assert_eq!(schema.argument_index_with_name("beta"), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(
            add_inplace().to_string(),
            "aten::add_.Tensor(self(a!), other, alpha) -> ((a))"
        );

        let schema = FunctionSchema::builder("aten::foo")
            .arg_alias("x", AliasAnnotation::transition(["a"], ["a", "b"]))
            .arg_alias("y", AliasAnnotation::wildcard().write())
            .ret("")
            .ret("out")
            .build();
        assert_eq!(schema.to_string(), "aten::foo(x(a -> a|b), y(*!)) -> (_, out)");
        assert_eq!(schema.qualified_name(), "aten::foo");
    }
}
