use crate::Name;
use itertools::Itertools;
use std::{collections::HashSet, fmt};

/// Types of Decaf values. `Error` is the type of every expression whose
/// checking already produced a diagnostic, it is compatible with everything
/// so that one mistake is reported once.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Type<'f> {
    Int,
    Double,
    Bool,
    String,
    Void,
    Null,
    Error,
    /// Classes are identified by name, the global scope holds at most one
    /// class per name.
    Class(Name<'f>),
    Array(Box<Type<'f>>),
    Function(Box<FunctionType<'f>>),
}

/// Signature of a method. For instance methods `params[0]` is the type of
/// the implicit receiver.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FunctionType<'f> {
    pub return_type: Type<'f>,
    pub params: Vec<Type<'f>>,
}

/// Answers subclass questions for `Type::compatible`. Implemented by the
/// symbol table, which resolves superclass names in the global scope.
pub trait ClassHierarchy<'f> {
    fn superclass_of(&self, class: Name<'f>) -> Option<Name<'f>>;

    /// `class` is `ancestor` or inherits from it. Terminates on cyclic
    /// hierarchies, which are rejected before any type is compared.
    fn is_subclass_of(&self, class: Name<'f>, ancestor: Name<'f>) -> bool {
        let mut visited = HashSet::new();
        let mut current = Some(class);

        while let Some(name) = current {
            if name == ancestor {
                return true;
            }
            if !visited.insert(name) {
                return false;
            }
            current = self.superclass_of(name);
        }

        false
    }
}

impl<'f> Type<'f> {
    pub fn array_of(element: Type<'f>, depth: u64) -> Type<'f> {
        (0..depth).fold(element, |ty, _| Type::Array(Box::new(ty)))
    }

    pub fn function(return_type: Type<'f>, params: Vec<Type<'f>>) -> Type<'f> {
        Type::Function(Box::new(FunctionType {
            return_type,
            params,
        }))
    }

    /// Structural identity
    pub fn equal(&self, other: &Type<'f>) -> bool {
        self == other
    }

    /// Whether a value of type `self` can be used where `target` is
    /// expected.
    pub fn compatible(&self, target: &Type<'f>, hierarchy: &dyn ClassHierarchy<'f>) -> bool {
        use self::Type::*;
        match (self, target) {
            (Error, _) | (_, Error) => true,
            (Null, Class(_)) => true,
            (Class(class), Class(ancestor)) => hierarchy.is_subclass_of(*class, *ancestor),
            // no covariance for arrays
            (Array(element), Array(target_element)) => element == target_element,
            (Function(function), Function(target_function)) => {
                function.compatible(target_function, hierarchy)
            }
            (ty, target) => ty == target,
        }
    }

    pub fn is_array_type(&self) -> bool {
        match self {
            Type::Array(_) => true,
            _ => false,
        }
    }

    pub fn is_class_type(&self) -> bool {
        match self {
            Type::Class(_) => true,
            _ => false,
        }
    }

    pub fn is_function_type(&self) -> bool {
        match self {
            Type::Function(_) => true,
            _ => false,
        }
    }

    pub fn is_error(&self) -> bool {
        *self == Type::Error
    }

    pub fn element_type(&self) -> Option<&Type<'f>> {
        match self {
            Type::Array(element) => Some(element),
            _ => None,
        }
    }

    pub fn class_name(&self) -> Option<Name<'f>> {
        match self {
            Type::Class(name) => Some(*name),
            _ => None,
        }
    }

    pub fn as_function(&self) -> Option<&FunctionType<'f>> {
        match self {
            Type::Function(function) => Some(function),
            _ => None,
        }
    }
}

impl<'f> FunctionType<'f> {
    /// Covariant in the return type, contravariant in the parameters.
    pub fn compatible(&self, target: &FunctionType<'f>, hierarchy: &dyn ClassHierarchy<'f>) -> bool {
        self.params.len() == target.params.len()
            && self.return_type.compatible(&target.return_type, hierarchy)
            && self
                .params
                .iter()
                .zip(&target.params)
                .all(|(param, target_param)| target_param.compatible(param, hierarchy))
    }

    /// Whether an instance method with this signature may override one with
    /// the signature `inherited`. The receiver slots are not compared.
    pub fn overrides(&self, inherited: &FunctionType<'f>, hierarchy: &dyn ClassHierarchy<'f>) -> bool {
        self.params.len() == inherited.params.len()
            && self.return_type.compatible(&inherited.return_type, hierarchy)
            && self
                .params
                .iter()
                .zip(&inherited.params)
                .skip(1)
                .all(|(param, inherited_param)| inherited_param.compatible(param, hierarchy))
    }
}

impl fmt::Display for Type<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use self::Type::*;
        match self {
            Int => write!(f, "int"),
            Double => write!(f, "double"),
            Bool => write!(f, "bool"),
            String => write!(f, "string"),
            Void => write!(f, "void"),
            Null => write!(f, "null"),
            Error => write!(f, "Error"),
            Class(name) => write!(f, "class : {}", name),
            Array(element) => write!(f, "{}[]", element),
            Function(function) => write!(f, "{}", function),
        }
    }
}

/// `int->class : A->void` for `void f(int, class A)`
impl fmt::Display for FunctionType<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}",
            self.params
                .iter()
                .format_with("", |param, f| f(&format_args!("{}->", param))),
            self.return_type
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use strtab::StringTable;

    struct Parents<'f>(HashMap<Name<'f>, Name<'f>>);

    impl<'f> ClassHierarchy<'f> for Parents<'f> {
        fn superclass_of(&self, class: Name<'f>) -> Option<Name<'f>> {
            self.0.get(&class).cloned()
        }
    }

    fn primitives() -> Vec<Type<'static>> {
        vec![
            Type::Int,
            Type::Double,
            Type::Bool,
            Type::String,
            Type::Void,
            Type::Null,
        ]
    }

    #[test]
    fn primitives_are_only_compatible_with_themselves_and_error() {
        let hierarchy = Parents(HashMap::new());

        for ty in primitives() {
            assert!(ty.compatible(&ty, &hierarchy));
            assert!(ty.compatible(&Type::Error, &hierarchy));
            assert!(Type::Error.compatible(&ty, &hierarchy));

            for other in primitives().into_iter().filter(|other| *other != ty) {
                assert!(!ty.compatible(&other, &hierarchy), "{} vs {}", ty, other);
            }
        }
    }

    #[test]
    fn equality_is_structural() {
        let mut strtab = StringTable::new();
        let (a, b) = (strtab.intern("A"), strtab.intern("B"));

        assert!(Type::array_of(Type::Int, 2).equal(&Type::array_of(Type::Int, 2)));
        assert!(!Type::array_of(Type::Int, 2).equal(&Type::array_of(Type::Int, 1)));
        assert!(!Type::array_of(Type::Int, 1).equal(&Type::array_of(Type::Double, 1)));
        assert!(Type::Class(a).equal(&Type::Class(a)));
        assert!(!Type::Class(a).equal(&Type::Class(b)));
        // compatible with everything, but only equal to itself
        assert!(!Type::Error.equal(&Type::Int));
        assert!(Type::Error.equal(&Type::Error));
    }

    #[test]
    fn classes_upcast_only() {
        let mut strtab = StringTable::new();
        let (a, b, c) = (strtab.intern("A"), strtab.intern("B"), strtab.intern("C"));
        // C extends B extends A
        let mut parents = HashMap::new();
        parents.insert(c, b);
        parents.insert(b, a);
        let hierarchy = Parents(parents);

        let (a, b, c) = (Type::Class(a), Type::Class(b), Type::Class(c));
        assert!(c.compatible(&a, &hierarchy));
        assert!(c.compatible(&b, &hierarchy));
        assert!(b.compatible(&a, &hierarchy));
        assert!(!a.compatible(&b, &hierarchy));
        assert!(!a.compatible(&c, &hierarchy));

        assert!(Type::Null.compatible(&a, &hierarchy));
        assert!(!a.compatible(&Type::Null, &hierarchy));
        assert!(!Type::Null.compatible(&Type::array_of(Type::Int, 1), &hierarchy));
    }

    #[test]
    fn arrays_are_invariant() {
        let mut strtab = StringTable::new();
        let (a, b) = (strtab.intern("A"), strtab.intern("B"));
        let mut parents = HashMap::new();
        parents.insert(b, a);
        let hierarchy = Parents(parents);

        let ints = Type::array_of(Type::Int, 1);
        assert!(ints.compatible(&ints, &hierarchy));
        assert!(!ints.compatible(&Type::array_of(Type::Double, 1), &hierarchy));
        assert!(!ints.compatible(&Type::array_of(Type::Int, 2), &hierarchy));
        assert!(!Type::array_of(Type::Class(b), 1)
            .compatible(&Type::array_of(Type::Class(a), 1), &hierarchy));
    }

    #[test]
    fn functions_are_contravariant_in_params() {
        let mut strtab = StringTable::new();
        let (a, b) = (strtab.intern("A"), strtab.intern("B"));
        let mut parents = HashMap::new();
        parents.insert(b, a);
        let hierarchy = Parents(parents);

        let takes_a_returns_b = Type::function(Type::Class(b), vec![Type::Class(a)]);
        let takes_b_returns_a = Type::function(Type::Class(a), vec![Type::Class(b)]);

        assert!(takes_a_returns_b.compatible(&takes_b_returns_a, &hierarchy));
        assert!(!takes_b_returns_a.compatible(&takes_a_returns_b, &hierarchy));
        assert!(!takes_a_returns_b.compatible(&Type::function(Type::Class(b), vec![]), &hierarchy));
    }

    #[test]
    fn overriding_ignores_the_receiver() {
        let mut strtab = StringTable::new();
        let (a, b) = (strtab.intern("A"), strtab.intern("B"));
        let mut parents = HashMap::new();
        parents.insert(b, a);
        let hierarchy = Parents(parents);

        let inherited = FunctionType {
            return_type: Type::Class(a),
            params: vec![Type::Class(a), Type::Int],
        };
        let narrower_return = FunctionType {
            return_type: Type::Class(b),
            params: vec![Type::Class(b), Type::Int],
        };
        let other_param = FunctionType {
            return_type: Type::Class(a),
            params: vec![Type::Class(b), Type::Bool],
        };

        assert!(narrower_return.overrides(&inherited, &hierarchy));
        assert!(!other_param.overrides(&inherited, &hierarchy));
        assert!(!inherited.overrides(&narrower_return, &hierarchy));
    }

    #[test]
    fn cyclic_hierarchy_terminates() {
        let mut strtab = StringTable::new();
        let (a, b, c) = (strtab.intern("A"), strtab.intern("B"), strtab.intern("C"));
        let mut parents = HashMap::new();
        parents.insert(a, b);
        parents.insert(b, a);
        let hierarchy = Parents(parents);

        assert!(!hierarchy.is_subclass_of(a, c));
    }

    #[test]
    fn display() {
        let mut strtab = StringTable::new();
        let a = Type::Class(strtab.intern("A"));

        assert_eq!(a.to_string(), "class : A");
        assert_eq!(Type::array_of(Type::Int, 2).to_string(), "int[][]");
        assert_eq!(
            Type::function(Type::Void, vec![a.clone(), Type::Int]).to_string(),
            "class : A->int->void"
        );
        assert_eq!(Type::function(Type::Bool, vec![]).to_string(), "bool");
    }
}
