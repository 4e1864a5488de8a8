use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64Mcg;

use opschema_common::data::alias_info::AliasAnnotation;
use opschema_common::data::schema::{FunctionSchema, OperandRef, Role};

use crate::schema_info::SchemaInfo;

const NUM_TESTS_PER_OP: u32 = 200;
const SET_NAMES: &[&str] = &["a", "b", "c"];
const OP_NAMES: &[&str] = &["custom::op", "aten::to", "aten::batch_norm"];

fn random_sets(gen: &mut Pcg64Mcg) -> Vec<&'static str> {
    SET_NAMES
        .iter()
        .copied()
        .filter(|_| gen.random_bool(0.5))
        .collect()
}

fn random_annotation(gen: &mut Pcg64Mcg) -> Option<AliasAnnotation> {
    let annot = match gen.random_range(0..6) {
        0 | 1 => return None,
        2 => AliasAnnotation::wildcard(),
        3 => AliasAnnotation::transition(random_sets(gen), random_sets(gen)),
        _ => AliasAnnotation::sets(random_sets(gen)),
    };
    if gen.random_bool(0.3) {
        Some(annot.write())
    } else {
        Some(annot)
    }
}

fn random_schema(gen: &mut Pcg64Mcg, op_name: &str) -> FunctionSchema {
    let mut builder = FunctionSchema::builder(op_name);
    for i in 0..gen.random_range(1..5) {
        let name = format!("arg{}", i);
        builder = match random_annotation(gen) {
            Some(annot) => builder.arg_alias(name, annot),
            None => builder.arg(name),
        };
    }
    // Flags the registered special cases branch on.
    builder = builder.arg("copy").arg("training");
    for _ in 0..gen.random_range(0..4) {
        builder = match random_annotation(gen) {
            Some(annot) => builder.ret_alias("", annot),
            None => builder.ret(""),
        };
    }
    builder.build()
}

fn random_info(gen: &mut Pcg64Mcg, op_name: &str) -> SchemaInfo {
    let mut info = SchemaInfo::new(random_schema(gen, op_name));
    for flag in ["copy", "training"] {
        match gen.random_range(0..3) {
            0 => info.add_argument_value(flag, true).unwrap(),
            1 => info.add_argument_value(flag, false).unwrap(),
            _ => {}
        }
    }
    info
}

fn all_operands(schema: &FunctionSchema) -> Vec<OperandRef> {
    (0..schema.arguments().len())
        .map(OperandRef::input)
        .chain((0..schema.returns().len()).map(OperandRef::output))
        .collect()
}

#[test]
fn test_aliasing_is_symmetric() {
    // Seed generated once for deterministic tests
    let mut gen = Pcg64Mcg::seed_from_u64(0x5a3c_91e0_d4b7_2f68);

    for &op_name in OP_NAMES {
        for _ in 0..NUM_TESTS_PER_OP {
            let info = random_info(&mut gen, op_name);
            let operands = all_operands(info.schema());
            for &lhs in &operands {
                for &rhs in &operands {
                    assert_eq!(
                        info.are_aliasing(lhs, rhs),
                        info.are_aliasing(rhs, lhs),
                        "{:?} vs {:?} in {}",
                        lhs,
                        rhs,
                        info.schema()
                    );
                }
            }
        }
    }
}

#[test]
fn test_unannotated_operands_never_alias() {
    let mut gen = Pcg64Mcg::seed_from_u64(0x0f1e_2d3c_4b5a_6978);

    for &op_name in OP_NAMES {
        for _ in 0..NUM_TESTS_PER_OP {
            let info = random_info(&mut gen, op_name);
            let operands = all_operands(info.schema());
            for &lhs in &operands {
                if info.schema().operand(lhs).unwrap().alias_info.is_some() {
                    continue;
                }
                for &rhs in &operands {
                    assert_eq!(info.are_aliasing(lhs, rhs), Ok(false));
                }
            }
        }
    }
}

#[test]
fn test_static_answers_without_special_case() {
    let mut gen = Pcg64Mcg::seed_from_u64(0x7c2b_e815_39a0_d64f);

    for _ in 0..NUM_TESTS_PER_OP {
        let info = random_info(&mut gen, "custom::op");
        let schema = info.schema();

        for (index, arg) in schema.arguments().iter().enumerate() {
            let written = arg.alias_info.as_ref().map_or(false, |a| a.is_write);
            assert_eq!(info.is_mutating(index), Ok(written));
            assert_eq!(info.is_mutating_by_name(&arg.name), Ok(written));
        }

        let operands = all_operands(schema);
        for &lhs in &operands {
            let lhs_info = match &schema.operand(lhs).unwrap().alias_info {
                Some(lhs_info) => lhs_info,
                None => continue,
            };
            for &rhs in &operands {
                let rhs_info = match &schema.operand(rhs).unwrap().alias_info {
                    Some(rhs_info) => rhs_info,
                    None => continue,
                };
                if lhs_info.is_wildcard || rhs_info.is_wildcard {
                    assert_eq!(info.are_aliasing(lhs, rhs), Ok(true));
                }
            }

            let own_sets = lhs_info.sets(lhs.role.side());
            if lhs_info.is_wildcard || !own_sets.is_empty() {
                assert_eq!(info.are_aliasing(lhs, lhs), Ok(true));
            }
        }
    }
}

#[test]
fn test_out_of_range_always_rejected() {
    let mut gen = Pcg64Mcg::seed_from_u64(0x3e9d_52c4_a0b1_f876);

    for _ in 0..NUM_TESTS_PER_OP {
        let info = random_info(&mut gen, "custom::op");
        let num_inputs = info.schema().arguments().len();

        assert!(info.is_mutating(num_inputs).is_err());
        for role in [Role::Input, Role::Output] {
            let past_end = OperandRef {
                role,
                index: info.schema().operands(role).len(),
            };
            assert!(info.are_aliasing(past_end, OperandRef::input(0)).is_err());
            assert!(info.are_aliasing(OperandRef::input(0), past_end).is_err());
        }
    }
}
