//! Operator definitions for binding expressions.

use std::fmt;

/// Binary operators.
///
/// Organized by precedence from lowest to highest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    /// `??`
    NullCoalescing,

    /// `||`
    LogicalOr,
    /// `&&`
    LogicalAnd,

    /// `|`
    BitwiseOr,
    /// `^`
    BitwiseXor,
    /// `&`
    BitwiseAnd,

    /// `==`
    Equal,
    /// `!=`
    NotEqual,

    /// `<`
    Less,
    /// `<=`
    LessEqual,
    /// `>`
    Greater,
    /// `>=`
    GreaterEqual,

    /// `<<`
    ShiftLeft,
    /// `>>`
    ShiftRight,

    /// `+`
    Add,
    /// `-`
    Sub,

    /// `*`
    Mul,
    /// `/`
    Div,
    /// `%`
    Rem,
}

impl BinaryOp {
    /// The operator's source symbol.
    pub const fn as_str(self) -> &'static str {
        use BinaryOp::*;
        match self {
            NullCoalescing => "??",
            LogicalOr => "||",
            LogicalAnd => "&&",
            BitwiseOr => "|",
            BitwiseXor => "^",
            BitwiseAnd => "&",
            Equal => "==",
            NotEqual => "!=",
            Less => "<",
            LessEqual => "<=",
            Greater => ">",
            GreaterEqual => ">=",
            ShiftLeft => "<<",
            ShiftRight => ">>",
            Add => "+",
            Sub => "-",
            Mul => "*",
            Div => "/",
            Rem => "%",
        }
    }

    /// Look up an operator by symbol.
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        use BinaryOp::*;
        Some(match symbol {
            "??" => NullCoalescing,
            "||" => LogicalOr,
            "&&" => LogicalAnd,
            "|" => BitwiseOr,
            "^" => BitwiseXor,
            "&" => BitwiseAnd,
            "==" => Equal,
            "!=" => NotEqual,
            "<" => Less,
            "<=" => LessEqual,
            ">" => Greater,
            ">=" => GreaterEqual,
            "<<" => ShiftLeft,
            ">>" => ShiftRight,
            "+" => Add,
            "-" => Sub,
            "*" => Mul,
            "/" => Div,
            "%" => Rem,
            _ => return None,
        })
    }

    /// Check if this is an arithmetic operator.
    pub fn is_arithmetic(self) -> bool {
        matches!(
            self,
            BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Rem
        )
    }

    /// Check if this is a comparison or equality operator.
    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            BinaryOp::Equal
                | BinaryOp::NotEqual
                | BinaryOp::Less
                | BinaryOp::LessEqual
                | BinaryOp::Greater
                | BinaryOp::GreaterEqual
        )
    }

    /// Check if the right operand is evaluated only on demand.
    pub fn is_short_circuit(self) -> bool {
        matches!(
            self,
            BinaryOp::LogicalAnd | BinaryOp::LogicalOr | BinaryOp::NullCoalescing
        )
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unary prefix operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    /// `-`
    Minus,
    /// `!`
    Not,
    /// `~`
    BitwiseNot,
    /// `$` - dynamic macro, resolved into an observable binding member
    DynamicExpression,
    /// `$$` - static macro, evaluated once while rewriting
    StaticExpression,
}

impl UnaryOp {
    /// The operator's source symbol.
    pub const fn as_str(self) -> &'static str {
        match self {
            UnaryOp::Minus => "-",
            UnaryOp::Not => "!",
            UnaryOp::BitwiseNot => "~",
            UnaryOp::DynamicExpression => "$",
            UnaryOp::StaticExpression => "$$",
        }
    }

    /// Check if this is a macro marker rather than an arithmetic operator.
    pub fn is_macro(self) -> bool {
        matches!(self, UnaryOp::DynamicExpression | UnaryOp::StaticExpression)
    }
}

impl fmt::Display for UnaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn binary_symbols_round_trip() {
        for op in [BinaryOp::NullCoalescing, BinaryOp::ShiftRight, BinaryOp::Rem] {
            assert_eq!(BinaryOp::from_symbol(op.as_str()), Some(op));
        }
        assert_eq!(BinaryOp::from_symbol("**"), None);
    }

    #[test]
    fn binary_categories() {
        assert!(BinaryOp::Add.is_arithmetic());
        assert!(!BinaryOp::Add.is_comparison());
        assert!(BinaryOp::LessEqual.is_comparison());
        assert!(BinaryOp::NullCoalescing.is_short_circuit());
        assert!(!BinaryOp::BitwiseAnd.is_short_circuit());
    }

    #[test]
    fn unary_macro_markers() {
        assert!(UnaryOp::DynamicExpression.is_macro());
        assert!(UnaryOp::StaticExpression.is_macro());
        assert!(!UnaryOp::Not.is_macro());
        assert_eq!(UnaryOp::StaticExpression.to_string(), "$$");
    }
}
