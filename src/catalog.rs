//! Static catalog of the 23 design patterns shown in the sidebar.
//!
//! This is the navigation list the hover machinery consumes: identifier,
//! display name, category, plus the one-line intent used when no content
//! directory is configured.

use std::borrow::Borrow;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Kebab-case identifier: `singleton`, `chain-of-responsibility`.
static PATTERN_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z][a-z0-9]*(-[a-z0-9]+)*$").unwrap());

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid pattern id {0:?} (expected kebab-case like \"factory-method\")")]
pub struct InvalidPatternId(pub String);

/// Identifier of a catalog item. Never empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PatternId(String);

impl PatternId {
    pub fn new(id: impl Into<String>) -> Result<Self, InvalidPatternId> {
        let id = id.into();
        if PATTERN_ID_RE.is_match(&id) {
            Ok(Self(id))
        } else {
            Err(InvalidPatternId(id))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PatternId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for PatternId {
    type Err = InvalidPatternId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for PatternId {
    type Error = InvalidPatternId;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<PatternId> for String {
    fn from(id: PatternId) -> Self {
        id.0
    }
}

impl Borrow<str> for PatternId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for PatternId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Creational,
    Structural,
    Behavioral,
}

impl Category {
    pub const ALL: [Category; 3] = [Self::Creational, Self::Structural, Self::Behavioral];
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Creational => write!(f, "Creational"),
            Self::Structural => write!(f, "Structural"),
            Self::Behavioral => write!(f, "Behavioral"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown category {0:?} (expected creational, structural or behavioral)")]
pub struct UnknownCategory(pub String);

impl FromStr for Category {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "creational" => Ok(Self::Creational),
            "structural" => Ok(Self::Structural),
            "behavioral" | "behavioural" => Ok(Self::Behavioral),
            _ => Err(UnknownCategory(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PatternEntry {
    pub id: &'static str,
    pub name: &'static str,
    /// Shorter name for narrow sidebars.
    pub label: &'static str,
    pub category: Category,
    pub intent: &'static str,
}

impl PatternEntry {
    pub fn pattern_id(&self) -> PatternId {
        PatternId(self.id.to_string())
    }
}

const fn entry(
    id: &'static str,
    name: &'static str,
    label: &'static str,
    category: Category,
    intent: &'static str,
) -> PatternEntry {
    PatternEntry { id, name, label, category, intent }
}

#[rustfmt::skip]
pub static CATALOG: [PatternEntry; 23] = [
    // Creational
    entry("singleton", "Singleton", "Singleton", Category::Creational,
        "Ensure a class has only one instance, and provide a global point of access to it."),
    entry("prototype", "Prototype", "Prototype", Category::Creational,
        "Specify the kinds of objects to create using a prototypical instance, and create new objects by copying this prototype."),
    entry("builder", "Builder", "Builder", Category::Creational,
        "Separate the construction of a complex object from its representation so that the same construction process can create different representations."),
    entry("factory-method", "Factory Method", "Factory Method", Category::Creational,
        "Define an interface for creating an object, but let subclasses decide which class to instantiate."),
    entry("abstract-factory", "Abstract Factory", "Abstract Factory", Category::Creational,
        "Provide an interface for creating families of related or dependent objects without specifying their concrete classes."),
    // Structural
    entry("adapter", "Adapter", "Adapter", Category::Structural,
        "Convert the interface of a class into another interface that clients expect."),
    entry("bridge", "Bridge", "Bridge", Category::Structural,
        "Decouple an abstraction from its implementation so that the two can vary independently."),
    entry("composite", "Composite", "Composite", Category::Structural,
        "Compose objects into tree structures to represent part-whole hierarchies."),
    entry("decorator", "Decorator", "Decorator", Category::Structural,
        "Attach additional responsibilities to an object dynamically."),
    entry("facade", "Facade", "Facade", Category::Structural,
        "Provide a unified interface to a set of interfaces in a subsystem."),
    entry("flyweight", "Flyweight", "Flyweight", Category::Structural,
        "Use sharing to support large numbers of fine-grained objects efficiently."),
    entry("proxy", "Proxy", "Proxy", Category::Structural,
        "Provide a surrogate or placeholder for another object to control access to it."),
    // Behavioral
    entry("chain-of-responsibility", "Chain of Responsibility", "Chain of Resp.", Category::Behavioral,
        "Avoid coupling the sender of a request to its receiver by giving more than one object a chance to handle the request."),
    entry("command", "Command", "Command", Category::Behavioral,
        "Encapsulate a request as an object, letting you parameterize clients, queue or log requests, and support undo."),
    entry("interpreter", "Interpreter", "Interpreter", Category::Behavioral,
        "Given a language, define a representation for its grammar along with an interpreter for its sentences."),
    entry("iterator", "Iterator", "Iterator", Category::Behavioral,
        "Provide a way to access the elements of an aggregate object sequentially without exposing its representation."),
    entry("mediator", "Mediator", "Mediator", Category::Behavioral,
        "Define an object that encapsulates how a set of objects interact."),
    entry("memento", "Memento", "Memento", Category::Behavioral,
        "Without violating encapsulation, capture and externalize an object's internal state so it can be restored later."),
    entry("observer", "Observer", "Observer", Category::Behavioral,
        "Define a one-to-many dependency so that when one object changes state, all its dependents are notified."),
    entry("state", "State", "State", Category::Behavioral,
        "Allow an object to alter its behavior when its internal state changes."),
    entry("strategy", "Strategy", "Strategy", Category::Behavioral,
        "Define a family of algorithms, encapsulate each one, and make them interchangeable."),
    entry("template-method", "Template Method", "Template Method", Category::Behavioral,
        "Define the skeleton of an algorithm in an operation, deferring some steps to subclasses."),
    entry("visitor", "Visitor", "Visitor", Category::Behavioral,
        "Represent an operation to be performed on the elements of an object structure."),
];

pub fn by_id(id: &str) -> Option<&'static PatternEntry> {
    CATALOG.iter().find(|e| e.id == id)
}

pub fn by_category(category: Category) -> impl Iterator<Item = &'static PatternEntry> {
    CATALOG.iter().filter(move |e| e.category == category)
}
