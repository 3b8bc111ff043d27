pub mod operator;

pub use operator::{Operator, OPERATOR_HEADER};
