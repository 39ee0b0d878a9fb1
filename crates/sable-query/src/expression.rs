//! Bound expressions.
//!
//! The subsystem only ever sees bound, typed plans, so evaluation treats
//! type errors as plan bugs (assertions), while data-dependent failures such
//! as mismatched vector lengths surface as real errors.

use std::fmt;

use sable_vector::{Metric, Result, VectorError};

use crate::value::{Schema, Tuple, Value};

/// A bound scalar expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    /// Positional reference into the input tuple.
    ColumnRef { col_idx: usize },
    Constant(Value),
    /// `ARRAY[..]` literal; evaluates to a vector value.
    Array(Vec<Expression>),
    /// A distance-function call such as `l2_dist(a, b)`.
    VectorDistance {
        metric: Metric,
        left: Box<Expression>,
        right: Box<Expression>,
    },
}

impl Expression {
    pub fn column(col_idx: usize) -> Self {
        Expression::ColumnRef { col_idx }
    }

    /// Convenience constructor for a constant `ARRAY[..]` literal.
    pub fn array_literal(components: &[f64]) -> Self {
        Expression::Array(
            components
                .iter()
                .map(|c| Expression::Constant(Value::Double(*c)))
                .collect(),
        )
    }

    pub fn distance(metric: Metric, left: Expression, right: Expression) -> Self {
        Expression::VectorDistance {
            metric,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    /// Evaluate against a tuple of the given schema.
    pub fn evaluate(&self, tuple: &Tuple, schema: &Schema) -> Result<Value> {
        match self {
            Expression::ColumnRef { col_idx } => Ok(tuple.value(*col_idx).clone()),
            Expression::Constant(value) => Ok(value.clone()),
            Expression::Array(elements) => {
                let mut components = Vec::with_capacity(elements.len());
                for element in elements {
                    let value = element.evaluate(tuple, schema)?;
                    components.push(
                        value
                            .as_double()
                            .expect("array elements evaluate to scalars"),
                    );
                }
                Ok(Value::Vector(components))
            }
            Expression::VectorDistance { metric, left, right } => {
                let lhs = left.evaluate(tuple, schema)?;
                let rhs = right.evaluate(tuple, schema)?;
                let lhs = lhs.as_vector().expect("distance operands are vectors");
                let rhs = rhs.as_vector().expect("distance operands are vectors");
                if lhs.len() != rhs.len() {
                    return Err(VectorError::DimensionMismatch {
                        expected: lhs.len(),
                        actual: rhs.len(),
                    });
                }
                Ok(Value::Double(metric.distance(lhs, rhs)))
            }
        }
    }

    /// For an array literal whose elements are all constants, the vector it
    /// evaluates to. `None` for anything else.
    pub fn as_constant_vector(&self) -> Option<Vec<f64>> {
        match self {
            Expression::Array(elements) => constant_vector(elements),
            _ => None,
        }
    }
}

/// Fold a list of constant scalar expressions into a vector.
pub fn constant_vector(elements: &[Expression]) -> Option<Vec<f64>> {
    elements
        .iter()
        .map(|element| match element {
            Expression::Constant(value) => value.as_double(),
            _ => None,
        })
        .collect()
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::ColumnRef { col_idx } => write!(f, "#{col_idx}"),
            Expression::Constant(value) => write!(f, "{value}"),
            Expression::Array(elements) => {
                write!(f, "[")?;
                for (i, element) in elements.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{element}")?;
                }
                write!(f, "]")
            }
            Expression::VectorDistance { metric, left, right } => {
                write!(f, "{}({left}, {right})", metric.function_name())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::{Column, TypeId};
    use sable_vector::Metric;

    fn vector_schema() -> Schema {
        Schema::new(vec![Column::new("v", TypeId::Vector)])
    }

    #[test]
    fn distance_over_column_and_literal() {
        let schema = vector_schema();
        let tuple = Tuple::new(vec![Value::Vector(vec![3.0, 4.0])]);

        let expr = Expression::distance(
            Metric::L2,
            Expression::column(0),
            Expression::array_literal(&[0.0, 0.0]),
        );
        let value = expr.evaluate(&tuple, &schema).unwrap();
        assert_eq!(value, Value::Double(5.0));
    }

    #[test]
    fn mismatched_operand_lengths_fail() {
        let schema = vector_schema();
        let tuple = Tuple::new(vec![Value::Vector(vec![3.0, 4.0])]);

        let expr = Expression::distance(
            Metric::L2,
            Expression::column(0),
            Expression::array_literal(&[1.0, 2.0, 3.0]),
        );
        assert!(expr.evaluate(&tuple, &schema).is_err());
    }

    #[test]
    fn constant_array_folds() {
        let expr = Expression::array_literal(&[1.0, 2.0, 3.0]);
        assert_eq!(expr.as_constant_vector(), Some(vec![1.0, 2.0, 3.0]));

        let not_constant = Expression::Array(vec![Expression::column(0)]);
        assert_eq!(not_constant.as_constant_vector(), None);
    }

    #[test]
    fn display_reads_like_sql() {
        let expr = Expression::distance(
            Metric::L2,
            Expression::column(0),
            Expression::array_literal(&[1.0, 2.0]),
        );
        assert_eq!(expr.to_string(), "l2_dist(#0, [1, 2])");
    }
}
