// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Descriptors of the values nodes produce: data type, encryption status
//! and shape.

use crate::dtypes::{find_type_to_hold_both, DataType};

use core::fmt;

use serde::{Deserialize, Serialize};

/// A scalar value descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScalarValue {
    pub data_type: DataType,
    pub is_encrypted: bool,
}

/// A tensor value descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TensorValue {
    pub data_type: DataType,
    pub is_encrypted: bool,
    pub shape: Vec<usize>,
}

/// What a node evaluates to: a scalar or a tensor, encrypted or clear.
///
/// Values are descriptors only; no payload data is carried.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Value {
    Scalar(ScalarValue),
    Tensor(TensorValue),
}

impl Value {
    pub fn encrypted_scalar(data_type: DataType) -> Value {
        Value::Scalar(ScalarValue {
            data_type,
            is_encrypted: true,
        })
    }

    pub fn clear_scalar(data_type: DataType) -> Value {
        Value::Scalar(ScalarValue {
            data_type,
            is_encrypted: false,
        })
    }

    pub fn encrypted_tensor(data_type: DataType, shape: Vec<usize>) -> Value {
        debug_assert!(!shape.is_empty(), "tensors have at least one dimension");
        Value::Tensor(TensorValue {
            data_type,
            is_encrypted: true,
            shape,
        })
    }

    pub fn clear_tensor(data_type: DataType, shape: Vec<usize>) -> Value {
        debug_assert!(!shape.is_empty(), "tensors have at least one dimension");
        Value::Tensor(TensorValue {
            data_type,
            is_encrypted: false,
            shape,
        })
    }

    pub fn data_type(&self) -> DataType {
        match self {
            Value::Scalar(scalar) => scalar.data_type,
            Value::Tensor(tensor) => tensor.data_type,
        }
    }

    pub fn is_encrypted(&self) -> bool {
        match self {
            Value::Scalar(scalar) => scalar.is_encrypted,
            Value::Tensor(tensor) => tensor.is_encrypted,
        }
    }

    pub fn is_clear(&self) -> bool {
        !self.is_encrypted()
    }

    pub const fn is_scalar(&self) -> bool {
        matches!(self, Value::Scalar(_))
    }

    pub const fn is_tensor(&self) -> bool {
        matches!(self, Value::Tensor(_))
    }

    /// The tensor shape, or `None` for scalars.
    pub fn shape(&self) -> Option<&[usize]> {
        match self {
            Value::Scalar(_) => None,
            Value::Tensor(tensor) => Some(&tensor.shape),
        }
    }

    pub fn is_scalar_integer(&self) -> bool {
        self.is_scalar() && self.data_type().is_integer()
    }

    pub fn is_tensor_integer(&self) -> bool {
        self.is_tensor() && self.data_type().is_integer()
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let encryption = if self.is_encrypted() {
            "Encrypted"
        } else {
            "Clear"
        };
        match self {
            Value::Scalar(scalar) => write!(f, "{encryption}Scalar<{}>", scalar.data_type),
            Value::Tensor(tensor) => {
                write!(f, "{encryption}Tensor<{}, shape=", tensor.data_type)?;
                write_shape(f, &tensor.shape)?;
                write!(f, ">")
            }
        }
    }
}

// Single-dimension shapes keep a trailing comma, `(2,)`.
fn write_shape(f: &mut fmt::Formatter<'_>, shape: &[usize]) -> fmt::Result {
    write!(f, "(")?;
    for (i, dimension) in shape.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{dimension}")?;
    }
    if shape.len() == 1 {
        write!(f, ",")?;
    }
    write!(f, ")")
}

/// Error raised when two values cannot be mixed.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MixError {
    /// A scalar was mixed with a tensor.
    #[error("cannot mix {left} with {right}: operands must both be scalars or both be tensors")]
    VariantMismatch { left: Value, right: Value },

    /// Two tensors of different shapes were mixed.
    #[error("cannot mix tensors with shapes {left_shape:?} and {right_shape:?}")]
    ShapeMismatch {
        left_shape: Vec<usize>,
        right_shape: Vec<usize>,
    },
}

/// Mix two values into the descriptor of their combination.
///
/// The resulting data type is [`find_type_to_hold_both`] of the operand
/// types, and the result is encrypted if either operand is: once encryption
/// enters a computation it never silently leaves it. Mixing a scalar with a
/// tensor, or tensors of different shapes, is a contract violation.
pub fn mix_values(value1: &Value, value2: &Value) -> Result<Value, MixError> {
    let data_type = find_type_to_hold_both(value1.data_type(), value2.data_type());
    let is_encrypted = value1.is_encrypted() || value2.is_encrypted();
    match (value1, value2) {
        (Value::Scalar(_), Value::Scalar(_)) => Ok(Value::Scalar(ScalarValue {
            data_type,
            is_encrypted,
        })),
        (Value::Tensor(left), Value::Tensor(right)) => {
            if left.shape != right.shape {
                return Err(MixError::ShapeMismatch {
                    left_shape: left.shape.clone(),
                    right_shape: right.shape.clone(),
                });
            }
            Ok(Value::Tensor(TensorValue {
                data_type,
                is_encrypted,
                shape: left.shape.clone(),
            }))
        }
        _ => Err(MixError::VariantMismatch {
            left: value1.clone(),
            right: value2.clone(),
        }),
    }
}
