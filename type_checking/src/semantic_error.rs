use derive_more::Display;
use failure::Fail;

#[derive(Debug, Clone, PartialEq, Eq, Fail)]
pub enum SemanticError {
    // declarations
    #[fail(
        display = "declaration of '{}' here conflicts with earlier declaration at {}",
        name, earlier
    )]
    DuplicateDeclaration { name: String, earlier: String },
    #[fail(display = "class '{}' not found", name)]
    ClassNotFound { name: String },
    #[fail(display = "illegal class inheritance (should be acyclic)")]
    BadInheritance,
    #[fail(display = "cannot declare identifier '{}' as void type", name)]
    BadVarType { name: String },
    #[fail(display = "overriding variable is not allowed for var '{}'", name)]
    OverridingVar { name: String },
    #[fail(
        display = "overriding method '{}' doesn't match the type signature in class '{}'",
        name, class
    )]
    BadOverride { name: String, class: String },
    #[fail(display = "no legal Main class named 'Main' was found")]
    NoMainClass,

    // lookup and references
    #[fail(display = "undeclared variable '{}'", name)]
    UndeclaredVariable { name: String },
    #[fail(display = "field '{}' not found in '{}'", name, owner)]
    FieldNotFound { name: String, owner: String },
    #[fail(display = "field '{}' of '{}' not accessible here", name, owner)]
    FieldNotAccessible { name: String, owner: String },
    #[fail(display = "cannot access field '{}' from '{}'", name, owner)]
    NotClassField { name: String, owner: String },
    #[fail(display = "'{}' is not a method in class '{}'", name, owner)]
    NotClassMethod { name: String, owner: String },
    #[fail(
        display = "can not reference a non-static field '{}' from static method '{}'",
        name, method
    )]
    ReferenceToNonStaticFromStatic { name: String, method: String },
    #[fail(display = "can not use this in static function")]
    ThisInStaticMethod,

    // typing
    #[fail(display = "incompatible operands: {} {} {}", left, op, right)]
    IncompatibleBinaryOperands {
        left: String,
        op: &'static str,
        right: String,
    },
    #[fail(display = "incompatible operand: {} {}", op, operand)]
    IncompatibleUnaryOperand { op: &'static str, operand: String },
    #[fail(display = "incompatible return: {} given, {} expected", given, expected)]
    BadReturnType { given: String, expected: String },
    #[fail(display = "test expression must have bool type")]
    BadTestExpression,
    #[fail(display = "[] can only be applied to arrays")]
    NotArray,
    #[fail(display = "{} is not a class type", ty)]
    NotClassType { ty: String },
    #[fail(display = "array element type must be non-void known type")]
    BadArrayElementType,
    #[fail(display = "new array length must be an integer")]
    BadArrayLength,
    #[fail(
        display = "incompatible argument {}: {} given, int/bool/string/double expected",
        index, given
    )]
    BadPrintArgument { index: usize, given: String },
    #[fail(display = "array subscript must be an integer")]
    IndexNotInteger,

    // calls
    #[fail(
        display = "function '{}' expects {} argument(s) but {} given",
        name, expected, given
    )]
    BadArgCount {
        name: String,
        expected: usize,
        given: usize,
    },
    #[fail(
        display = "incompatible argument {}: {} given, {} expected",
        index, given, expected
    )]
    BadArgType {
        index: usize,
        given: String,
        expected: String,
    },
    #[fail(display = "'length' can only be applied to arrays")]
    BadLength,
    #[fail(display = "function 'length' expects 0 argument(s) but {} given", given)]
    BadLengthArg { given: usize },

    // control flow
    #[fail(display = "'break' is only allowed inside a loop")]
    BreakOutsideLoop,
}

/// Name of an error variant, used to tag machine readable messages
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SemanticErrorKind {
    DuplicateDeclaration,
    ClassNotFound,
    BadInheritance,
    BadVarType,
    OverridingVar,
    BadOverride,
    NoMainClass,
    UndeclaredVariable,
    FieldNotFound,
    FieldNotAccessible,
    NotClassField,
    NotClassMethod,
    ReferenceToNonStaticFromStatic,
    ThisInStaticMethod,
    IncompatibleBinaryOperands,
    IncompatibleUnaryOperand,
    BadReturnType,
    BadTestExpression,
    NotArray,
    NotClassType,
    BadArrayElementType,
    BadArrayLength,
    BadPrintArgument,
    IndexNotInteger,
    BadArgCount,
    BadArgType,
    BadLength,
    BadLengthArg,
    BreakOutsideLoop,
}

impl SemanticError {
    pub fn kind(&self) -> SemanticErrorKind {
        SemanticErrorKind::from(self)
    }
}

impl From<&SemanticError> for SemanticErrorKind {
    fn from(error: &SemanticError) -> Self {
        use self::SemanticErrorKind::*;
        match error {
            SemanticError::DuplicateDeclaration { .. } => DuplicateDeclaration,
            SemanticError::ClassNotFound { .. } => ClassNotFound,
            SemanticError::BadInheritance => BadInheritance,
            SemanticError::BadVarType { .. } => BadVarType,
            SemanticError::OverridingVar { .. } => OverridingVar,
            SemanticError::BadOverride { .. } => BadOverride,
            SemanticError::NoMainClass => NoMainClass,
            SemanticError::UndeclaredVariable { .. } => UndeclaredVariable,
            SemanticError::FieldNotFound { .. } => FieldNotFound,
            SemanticError::FieldNotAccessible { .. } => FieldNotAccessible,
            SemanticError::NotClassField { .. } => NotClassField,
            SemanticError::NotClassMethod { .. } => NotClassMethod,
            SemanticError::ReferenceToNonStaticFromStatic { .. } => ReferenceToNonStaticFromStatic,
            SemanticError::ThisInStaticMethod => ThisInStaticMethod,
            SemanticError::IncompatibleBinaryOperands { .. } => IncompatibleBinaryOperands,
            SemanticError::IncompatibleUnaryOperand { .. } => IncompatibleUnaryOperand,
            SemanticError::BadReturnType { .. } => BadReturnType,
            SemanticError::BadTestExpression => BadTestExpression,
            SemanticError::NotArray => NotArray,
            SemanticError::NotClassType { .. } => NotClassType,
            SemanticError::BadArrayElementType => BadArrayElementType,
            SemanticError::BadArrayLength => BadArrayLength,
            SemanticError::BadPrintArgument { .. } => BadPrintArgument,
            SemanticError::IndexNotInteger => IndexNotInteger,
            SemanticError::BadArgCount { .. } => BadArgCount,
            SemanticError::BadArgType { .. } => BadArgType,
            SemanticError::BadLength => BadLength,
            SemanticError::BadLengthArg { .. } => BadLengthArg,
            SemanticError::BreakOutsideLoop => BreakOutsideLoop,
        }
    }
}
