use once_cell::sync::Lazy;
use opschema_common::data::schema::OperandRef;
use opschema_common::data::value::ArgValue;
use rustc_hash::FxHashMap;
use std::collections::BTreeMap;

/// Concrete values recorded for a call, keyed by input-argument name.
pub type ArgValues = BTreeMap<String, ArgValue>;

// To register an operator whose behavior depends on its argument values:
// 1. Add an entry to `SPECIAL_CASES` below, keyed by the operator name without its overload.
// 2. If none of the existing rules express it, add a variant to the relevant rule enum and give it
//    a conservative answer for the case where the deciding argument was never recorded.

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MutationRule {
    /// The inputs named in `mutated` are written exactly when the boolean argument `flag` is true.
    MutatesIfFlag {
        flag: &'static str,
        mutated: &'static [&'static str],
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AliasRule {
    /// When the boolean argument `flag` is true the operator returns freshly allocated storage, so
    /// no output aliases any input.
    FreshOutputsIfFlag { flag: &'static str },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NondeterminismRule {
    Always,
    /// Deterministic only when the boolean argument `flag` is known to be false.
    UnlessFlagFalse { flag: &'static str },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SpecialCase {
    pub mutation: Option<MutationRule>,
    pub aliasing: Option<AliasRule>,
    pub nondeterminism: Option<NondeterminismRule>,
}

impl SpecialCase {
    const NONE: SpecialCase = SpecialCase {
        mutation: None,
        aliasing: None,
        nondeterminism: None,
    };

    const fn with_mutation(self, rule: MutationRule) -> Self {
        SpecialCase {
            mutation: Some(rule),
            ..self
        }
    }

    const fn with_aliasing(self, rule: AliasRule) -> Self {
        SpecialCase {
            aliasing: Some(rule),
            ..self
        }
    }

    const fn with_nondeterminism(self, rule: NondeterminismRule) -> Self {
        SpecialCase {
            nondeterminism: Some(rule),
            ..self
        }
    }

    /// Returns `None` when this special case has nothing to say about `arg_name`, in which case the
    /// static annotation decides.
    pub fn refine_mutation(&self, arg_name: &str, values: &ArgValues) -> Option<bool> {
        match self.mutation? {
            MutationRule::MutatesIfFlag { flag, mutated } => {
                if mutated.iter().any(|name| *name == arg_name) {
                    // Without a usable flag we must assume the write happens.
                    Some(read_flag(values, flag).unwrap_or(true))
                } else {
                    None
                }
            }
        }
    }

    /// Symmetric in `lhs` and `rhs`.
    pub fn refine_aliasing(
        &self,
        lhs: OperandRef,
        rhs: OperandRef,
        values: &ArgValues,
    ) -> Option<bool> {
        match self.aliasing? {
            AliasRule::FreshOutputsIfFlag { flag } => {
                if lhs.role != rhs.role && read_flag(values, flag) == Some(true) {
                    Some(false)
                } else {
                    None
                }
            }
        }
    }

    pub fn is_nondeterministic(&self, values: &ArgValues) -> Option<bool> {
        match self.nondeterminism? {
            NondeterminismRule::Always => Some(true),
            NondeterminismRule::UnlessFlagFalse { flag } => {
                Some(read_flag(values, flag) != Some(false))
            }
        }
    }
}

fn read_flag(values: &ArgValues, flag: &str) -> Option<bool> {
    let value = values.get(flag)?;
    let flag_value = value.as_bool();
    if flag_value.is_none() {
        tracing::warn!(
            flag,
            kind = value.kind_name(),
            "recorded flag is not a bool; falling back to the conservative answer"
        );
    }
    flag_value
}

const fn mutates_if(flag: &'static str, mutated: &'static [&'static str]) -> MutationRule {
    MutationRule::MutatesIfFlag { flag, mutated }
}

const fn nondeterministic_unless(flag: &'static str) -> NondeterminismRule {
    NondeterminismRule::UnlessFlagFalse { flag }
}

const RUNNING_STATS: &[&str] = &["running_mean", "running_var"];

const NONDETERMINISTIC: SpecialCase =
    SpecialCase::NONE.with_nondeterminism(NondeterminismRule::Always);

const SPECIAL_CASES: &[(&str, SpecialCase)] = &[
    // Running statistics are only updated in training mode, and their schemas carry no alias
    // annotation at all.
    (
        "aten::batch_norm",
        SpecialCase::NONE.with_mutation(mutates_if("training", RUNNING_STATS)),
    ),
    (
        "aten::instance_norm",
        SpecialCase::NONE.with_mutation(mutates_if("use_input_stats", RUNNING_STATS)),
    ),
    (
        "aten::rrelu_with_noise",
        SpecialCase::NONE
            .with_mutation(mutates_if("training", &["noise"]))
            .with_nondeterminism(nondeterministic_unless("training")),
    ),
    (
        "aten::to",
        SpecialCase::NONE.with_aliasing(AliasRule::FreshOutputsIfFlag { flag: "copy" }),
    ),
    (
        "aten::dropout",
        SpecialCase::NONE.with_nondeterminism(nondeterministic_unless("train")),
    ),
    (
        "aten::native_dropout",
        SpecialCase::NONE.with_nondeterminism(nondeterministic_unless("train")),
    ),
    (
        "aten::rrelu",
        SpecialCase::NONE.with_nondeterminism(nondeterministic_unless("training")),
    ),
    ("aten::_fused_dropout", NONDETERMINISTIC),
    ("aten::_standard_gamma", NONDETERMINISTIC),
    ("aten::bernoulli", NONDETERMINISTIC),
    ("aten::multinomial", NONDETERMINISTIC),
    ("aten::normal", NONDETERMINISTIC),
    ("aten::poisson", NONDETERMINISTIC),
    ("aten::binomial", NONDETERMINISTIC),
    ("aten::rand_like", NONDETERMINISTIC),
    ("aten::randint_like", NONDETERMINISTIC),
    ("aten::randn_like", NONDETERMINISTIC),
    ("aten::randperm", NONDETERMINISTIC),
];

static TABLE: Lazy<FxHashMap<&'static str, &'static SpecialCase>> =
    Lazy::new(|| SPECIAL_CASES.iter().map(|(name, case)| (*name, case)).collect());

/// Looks up the special case registered for an operator name (without overload), if any.
pub fn lookup(op_name: &str) -> Option<&'static SpecialCase> {
    TABLE.get(op_name).copied()
}

pub fn registered_operators() -> impl Iterator<Item = &'static str> {
    SPECIAL_CASES.iter().map(|(name, _)| *name)
}
