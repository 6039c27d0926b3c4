//! Element registry - the set of named elements on a canvas

use crate::element::Element;
use crate::error::{Error, Result};
use crate::{ELEMENT_NAME_PREFIX, RESERVED_NAMES};

/// Insertion-ordered collection of elements, keyed by name
///
/// The canvas owns the registry; a recalculation pass borrows it, overwrites
/// every element's results and never adds or removes entries.
#[derive(Debug, Clone, Default)]
pub struct ElementRegistry {
    elements: Vec<Element>,
    /// Number used for the next generated `E<n>` name
    next_number: u64,
}

impl ElementRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            elements: Vec::new(),
            next_number: 1,
        }
    }

    /// Get the number of elements
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// Check if the registry has no elements
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Check if an element with this name exists
    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    /// Get an element by name
    pub fn get(&self, name: &str) -> Option<&Element> {
        self.elements.iter().find(|e| e.name() == name)
    }

    /// Get a mutable element by name
    pub fn get_mut(&mut self, name: &str) -> Option<&mut Element> {
        self.elements.iter_mut().find(|e| e.name() == name)
    }

    /// Iterate over all elements in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &Element> {
        self.elements.iter()
    }

    /// Iterate over all elements mutably
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Element> {
        self.elements.iter_mut()
    }

    /// Element names in insertion order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.elements.iter().map(|e| e.name())
    }

    /// Add a new element with a generated `E<n>` name and content `"0"`
    ///
    /// Returns the new element's name.
    pub fn add_element(&mut self) -> String {
        let (name, number) = self.generate_name();
        self.next_number = number + 1;
        self.elements
            .push(Element::new(name.clone(), Element::DEFAULT_CONTENT));
        name
    }

    /// Insert an element with an explicit name
    ///
    /// Generated names continue after the highest `E<n>` inserted so far.
    ///
    /// # Example
    /// ```
    /// use visualcalc_core::ElementRegistry;
    ///
    /// let mut registry = ElementRegistry::new();
    /// registry.insert("E7", "1 + 2").unwrap();
    /// assert_eq!(registry.add_element(), "E8");
    /// ```
    pub fn insert<N: Into<String>, C: Into<String>>(&mut self, name: N, content: C) -> Result<()> {
        let name = name.into();
        validate_name(&name)?;
        if self.contains(&name) {
            return Err(Error::DuplicateName(name));
        }

        if let Some(number) = generated_number(&name) {
            if number >= self.next_number {
                self.next_number = number.saturating_add(1);
            }
        }

        self.elements.push(Element::new(name, content));
        Ok(())
    }

    /// Remove an element by name
    ///
    /// Elements that referenced it fail with an unknown variable error on
    /// the next pass.
    pub fn remove(&mut self, name: &str) -> Result<Element> {
        let index = self
            .position(name)
            .ok_or_else(|| Error::ElementNotFound(name.into()))?;
        Ok(self.elements.remove(index))
    }

    /// Replace an element's content
    pub fn set_content<C: Into<String>>(&mut self, name: &str, content: C) -> Result<()> {
        let element = self
            .get_mut(name)
            .ok_or_else(|| Error::ElementNotFound(name.into()))?;
        element.set_content(content);
        Ok(())
    }

    /// Remove every element and restart name generation at `E1`
    pub fn clear(&mut self) {
        self.elements.clear();
        self.next_number = 1;
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.elements.iter().position(|e| e.name() == name)
    }

    fn generate_name(&self) -> (String, u64) {
        let mut n = self.next_number.max(1);
        loop {
            let name = format!("{}{}", ELEMENT_NAME_PREFIX, n);
            if !self.contains(&name) {
                return (name, n);
            }
            n += 1;
        }
    }
}

/// Check that a name can be referenced from formula text
///
/// Names are ASCII identifiers (letter or underscore, then letters, digits or
/// underscores) and must not shadow a reserved formula name.
pub fn validate_name(name: &str) -> Result<()> {
    let mut chars = name.chars();
    let valid = match chars.next() {
        Some(first) => {
            (first.is_ascii_alphabetic() || first == '_')
                && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        None => false,
    };

    if !valid {
        return Err(Error::InvalidName(format!(
            "'{}' is not a valid identifier",
            name
        )));
    }
    if RESERVED_NAMES.contains(&name) {
        return Err(Error::InvalidName(format!("'{}' is reserved", name)));
    }
    Ok(())
}

/// `Some(n)` for names of the form `E<n>`
fn generated_number(name: &str) -> Option<u64> {
    let digits = name.strip_prefix(ELEMENT_NAME_PREFIX)?;
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_add_elements() {
        let mut registry = ElementRegistry::new();
        assert_eq!(registry.add_element(), "E1");
        assert_eq!(registry.add_element(), "E2");
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.get("E1").unwrap().content(), "0");
    }

    #[test]
    fn test_insert_advances_counter() {
        let mut registry = ElementRegistry::new();
        registry.insert("E5", "1").unwrap();
        registry.insert("E2", "2").unwrap();
        registry.insert("Total", "E5 + E2").unwrap();
        assert_eq!(registry.add_element(), "E6");
    }

    #[test]
    fn test_insertion_order() {
        let mut registry = ElementRegistry::new();
        registry.insert("E3", "1").unwrap();
        registry.insert("E1", "2").unwrap();
        registry.add_element();
        let names: Vec<&str> = registry.names().collect();
        assert_eq!(names, vec!["E3", "E1", "E4"]);
    }

    #[test]
    fn test_duplicate_name() {
        let mut registry = ElementRegistry::new();
        registry.insert("E1", "1").unwrap();
        assert_eq!(
            registry.insert("E1", "2"),
            Err(Error::DuplicateName("E1".into()))
        );
        // Names are case-sensitive
        assert!(registry.insert("e1", "2").is_ok());
    }

    #[test]
    fn test_invalid_names() {
        let mut registry = ElementRegistry::new();
        assert!(registry.insert("", "1").is_err());
        assert!(registry.insert("1E", "1").is_err());
        assert!(registry.insert("E-1", "1").is_err());
        assert!(registry.insert("E 1", "1").is_err());
        assert!(registry.insert("math", "1").is_err());
        assert!(registry.insert("IF", "1").is_err());
        assert!(registry.insert("_tmp2", "1").is_ok());
    }

    #[test]
    fn test_remove_and_set_content() {
        let mut registry = ElementRegistry::new();
        let name = registry.add_element();
        registry.set_content(&name, "E2 * 2").unwrap();
        assert_eq!(registry.get(&name).unwrap().content(), "E2 * 2");

        let removed = registry.remove(&name).unwrap();
        assert_eq!(removed.name(), "E1");
        assert!(registry.is_empty());
        assert_eq!(
            registry.remove("E1"),
            Err(Error::ElementNotFound("E1".into()))
        );
        assert!(registry.set_content("E1", "3").is_err());

        // Removal never recycles names
        assert_eq!(registry.add_element(), "E2");
    }

    #[test]
    fn test_clear_resets_names() {
        let mut registry = ElementRegistry::new();
        registry.add_element();
        registry.add_element();
        registry.clear();
        assert!(registry.is_empty());
        assert_eq!(registry.add_element(), "E1");
    }
}
