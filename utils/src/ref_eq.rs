//! Hash map keys that compare by address instead of by value.
//!
//! Semantic analysis attaches information to AST nodes without mutating the
//! tree. Two structurally identical expressions at different places in the
//! program must get different entries, so the node's address is the key.
use std::hash::{Hash, Hasher};

#[derive(Debug)]
pub struct RefEq<'a, T>(pub &'a T);

impl<'a, T> Clone for RefEq<'a, T> {
    fn clone(&self) -> Self {
        RefEq(self.0)
    }
}

impl<'a, T> Copy for RefEq<'a, T> {}

impl<'a, T> Hash for RefEq<'a, T> {
    fn hash<H>(&self, state: &mut H)
    where
        H: Hasher,
    {
        (self.0 as *const T).hash(state)
    }
}

impl<'a, 'b, T> PartialEq<RefEq<'b, T>> for RefEq<'a, T> {
    fn eq(&self, other: &RefEq<'b, T>) -> bool {
        std::ptr::eq(self.0, other.0)
    }
}

impl<'a, T> Eq for RefEq<'a, T> {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn equal_values_at_different_addresses_are_different_keys() {
        let a = String::from("x");
        let b = String::from("x");

        let mut map = HashMap::new();
        map.insert(RefEq(&a), 1);
        map.insert(RefEq(&b), 2);
        map.insert(RefEq(&a), 3);

        assert_eq!(map.len(), 2);
        assert_eq!(map[&RefEq(&a)], 3);
        assert_eq!(map[&RefEq(&b)], 2);
    }
}
