// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![cfg(test)]

use anyhow::Result;
use fhegraph::*;

fn scalar(dtype: DataType, encrypted: bool) -> Value {
    if encrypted {
        Value::encrypted_scalar(dtype)
    } else {
        Value::clear_scalar(dtype)
    }
}

#[test]
fn mixing_follows_promotion_and_keeps_encryption_sticky() -> Result<()> {
    let dtypes = [
        DataType::unsigned(1),
        DataType::unsigned(4),
        DataType::unsigned(8),
        DataType::signed(2),
        DataType::signed(8),
        DataType::float(32),
        DataType::float(64),
    ];
    for &left_dtype in &dtypes {
        for &right_dtype in &dtypes {
            for left_encrypted in [false, true] {
                for right_encrypted in [false, true] {
                    let left = scalar(left_dtype, left_encrypted);
                    let right = scalar(right_dtype, right_encrypted);
                    let mixed = mix_values(&left, &right)?;

                    assert_eq!(
                        mixed.data_type(),
                        find_type_to_hold_both(left_dtype, right_dtype)
                    );
                    assert_eq!(
                        mixed.is_encrypted(),
                        left_encrypted || right_encrypted,
                        "mixing {left} with {right}"
                    );
                    assert!(mixed.is_scalar());
                }
            }
        }
    }
    Ok(())
}

#[test]
fn mixing_is_symmetric() -> Result<()> {
    let left = Value::encrypted_scalar(DataType::signed(3));
    let right = Value::clear_scalar(DataType::unsigned(7));
    assert_eq!(mix_values(&left, &right)?, mix_values(&right, &left)?);
    Ok(())
}

#[test]
fn tensors_mix_elementwise_over_the_shared_shape() -> Result<()> {
    let left = Value::encrypted_tensor(DataType::unsigned(8), vec![3, 4]);
    let right = Value::clear_tensor(DataType::signed(8), vec![3, 4]);
    let mixed = mix_values(&left, &right)?;
    assert_eq!(mixed, Value::encrypted_tensor(DataType::signed(9), vec![3, 4]));
    assert_eq!(mixed.shape(), Some(&[3, 4][..]));
    Ok(())
}

#[test]
fn shape_mismatches_are_contract_violations() {
    let left = Value::clear_tensor(DataType::unsigned(3), vec![2]);
    let right = Value::clear_tensor(DataType::unsigned(3), vec![2, 1]);
    let err = mix_values(&left, &right).unwrap_err();
    assert_eq!(
        err.to_string(),
        "cannot mix tensors with shapes [2] and [2, 1]"
    );
}

#[test]
fn value_descriptors_round_trip_through_json() -> Result<()> {
    let value = Value::encrypted_scalar(DataType::unsigned(4));
    let json = serde_json::to_string(&value)?;
    assert_eq!(json, r#"{"Scalar":{"data_type":"uint4","is_encrypted":true}}"#);
    assert_eq!(serde_json::from_str::<Value>(&json)?, value);

    let tensor = Value::clear_tensor(DataType::signed(5), vec![2, 3]);
    let json = serde_json::to_string(&tensor)?;
    assert_eq!(
        json,
        r#"{"Tensor":{"data_type":"int5","is_encrypted":false,"shape":[2,3]}}"#
    );
    assert_eq!(serde_json::from_str::<Value>(&json)?, tensor);

    Ok(())
}

#[test]
fn scalar_predicates_split_by_kind_and_type() {
    let encrypted_integer = Value::encrypted_scalar(DataType::unsigned(4));
    assert!(encrypted_integer.is_scalar_integer());
    assert!(!encrypted_integer.is_tensor_integer());
    assert!(encrypted_integer.shape().is_none());

    let clear_float = Value::clear_scalar(DataType::float(64));
    assert!(!clear_float.is_scalar_integer());
    assert!(clear_float.is_scalar());

    let tensor = Value::encrypted_tensor(DataType::signed(6), vec![7]);
    assert!(tensor.is_tensor_integer());
    assert!(!tensor.is_scalar());
}
