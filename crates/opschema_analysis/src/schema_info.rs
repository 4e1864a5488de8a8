use opschema_common::config::{AnalysisOptions, SpecialCaseMode};
use opschema_common::data::alias_info::sets_intersect;
use opschema_common::data::schema::{Argument, FunctionSchema, OperandRef};
use opschema_common::data::value::ArgValue;
use opschema_common::error::{InvalidArgument, Result};

use crate::special_cases::{self, ArgValues, SpecialCase};

/// Publicizes an operator's behavior (mutation, aliasing, nondeterminism) as implied by its
/// schema, refined by any concrete argument values recorded for the call being analyzed.
///
/// Queries take `&self` and may run concurrently; recording values takes `&mut self`, so all
/// recording has to happen before the analyzer is shared.
#[derive(Clone, Debug)]
pub struct SchemaInfo {
    schema: FunctionSchema,
    options: AnalysisOptions,
    special_case: Option<&'static SpecialCase>,
    values: ArgValues,
}

impl SchemaInfo {
    pub fn new(schema: FunctionSchema) -> Self {
        Self::with_options(schema, AnalysisOptions::default())
    }

    pub fn with_options(schema: FunctionSchema, options: AnalysisOptions) -> Self {
        let special_case = match options.special_cases {
            SpecialCaseMode::Enabled => special_cases::lookup(schema.name()),
            SpecialCaseMode::Disabled => None,
        };
        SchemaInfo {
            schema,
            options,
            special_case,
            values: ArgValues::new(),
        }
    }

    pub fn schema(&self) -> &FunctionSchema {
        &self.schema
    }

    pub fn options(&self) -> &AnalysisOptions {
        &self.options
    }

    /// Whether calling the operator writes to the input at position `index`.
    pub fn is_mutating(&self, index: usize) -> Result<bool> {
        let arg = self.resolve(OperandRef::input(index))?;
        Ok(self.argument_is_mutating(arg))
    }

    /// Whether calling the operator writes to the first input named `name`.
    pub fn is_mutating_by_name(&self, name: &str) -> Result<bool> {
        let index = self.input_index(name)?;
        self.is_mutating(index)
    }

    /// Whether any input is written.
    pub fn is_mutable(&self) -> bool {
        self.schema
            .arguments()
            .iter()
            .any(|arg| self.argument_is_mutating(arg))
    }

    /// Whether `lhs` and `rhs` may share storage.  Symmetric in its arguments.
    pub fn are_aliasing(&self, lhs: OperandRef, rhs: OperandRef) -> Result<bool> {
        let lhs_arg = self.resolve(lhs)?;
        let rhs_arg = self.resolve(rhs)?;

        if let Some(case) = self.special_case {
            if let Some(verdict) = case.refine_aliasing(lhs, rhs, &self.values) {
                tracing::debug!(
                    schema = %self.schema,
                    lhs = %lhs_arg.name,
                    rhs = %rhs_arg.name,
                    verdict,
                    "aliasing decided by special case"
                );
                return Ok(verdict);
            }
        }

        let verdict = match (&lhs_arg.alias_info, &rhs_arg.alias_info) {
            // An unannotated value never aliases, not even a wildcard.
            (None, _) | (_, None) => false,
            (Some(lhs_info), Some(rhs_info)) => {
                lhs_info.is_wildcard
                    || rhs_info.is_wildcard
                    || sets_intersect(
                        lhs_info.sets(lhs.role.side()),
                        rhs_info.sets(rhs.role.side()),
                    )
            }
        };
        tracing::trace!(?lhs, ?rhs, verdict, "aliasing decided by annotations");
        Ok(verdict)
    }

    /// Whether repeated calls with the same arguments may produce different results.
    pub fn is_nondeterministic(&self) -> bool {
        self.special_case
            .and_then(|case| case.is_nondeterministic(&self.values))
            .unwrap_or(false)
    }

    pub fn has_input_argument_named(&self, name: &str) -> bool {
        self.schema.argument_index_with_name(name).is_some()
    }

    /// Records the concrete value passed for the input `name`, replacing any earlier value.  Only
    /// operators with a registered special case consult recorded values.
    pub fn add_argument_value(&mut self, name: &str, value: impl Into<ArgValue>) -> Result<()> {
        self.input_index(name)?;
        let value = value.into();
        tracing::debug!(schema = %self.schema, arg = name, %value, "recorded argument value");
        self.values.insert(name.to_owned(), value);
        Ok(())
    }

    /// Records several values, stopping at the first name which is not an input.
    pub fn add_argument_values<N, V>(
        &mut self,
        values: impl IntoIterator<Item = (N, V)>,
    ) -> Result<()>
    where
        N: AsRef<str>,
        V: Into<ArgValue>,
    {
        for (name, value) in values {
            self.add_argument_value(name.as_ref(), value)?;
        }
        Ok(())
    }

    pub fn argument_value(&self, name: &str) -> Option<&ArgValue> {
        self.values.get(name)
    }

    fn resolve(&self, operand: OperandRef) -> Result<&Argument> {
        self.schema
            .operand(operand)
            .ok_or_else(|| InvalidArgument::IndexOutOfRange {
                schema: self.schema.qualified_name(),
                role: operand.role,
                index: operand.index,
                len: self.schema.operands(operand.role).len(),
            })
    }

    fn input_index(&self, name: &str) -> Result<usize> {
        self.schema
            .argument_index_with_name(name)
            .ok_or_else(|| InvalidArgument::UnknownArgument {
                schema: self.schema.qualified_name(),
                name: name.to_owned(),
            })
    }

    fn argument_is_mutating(&self, arg: &Argument) -> bool {
        if let Some(case) = self.special_case {
            if let Some(verdict) = case.refine_mutation(&arg.name, &self.values) {
                tracing::debug!(
                    schema = %self.schema,
                    arg = %arg.name,
                    verdict,
                    "mutation decided by special case"
                );
                return verdict;
            }
        }
        let verdict = arg.alias_info.as_ref().map_or(false, |info| info.is_write);
        tracing::trace!(arg = %arg.name, verdict, "mutation decided by annotations");
        verdict
    }
}
