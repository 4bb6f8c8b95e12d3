use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Identification strategy a locator candidate is built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrategyKind {
    TestId,
    Role,
    Label,
    Placeholder,
    Text,
    Id,
    Name,
    Class,
    Css,
    Xpath,
}

impl StrategyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TestId => "testid",
            Self::Role => "role",
            Self::Label => "label",
            Self::Placeholder => "placeholder",
            Self::Text => "text",
            Self::Id => "id",
            Self::Name => "name",
            Self::Class => "class",
            Self::Css => "css",
            Self::Xpath => "xpath",
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A scored locator string for one strategy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    pub kind: StrategyKind,
    pub text: String,
    pub score: u8,
}

impl Candidate {
    pub fn new(kind: StrategyKind, text: impl Into<String>, score: u8) -> Self {
        Self {
            kind,
            text: text.into(),
            score: score.min(100),
        }
    }
}

/// Attribute name/value pairs in document order.
///
/// Serialized as a JSON/YAML mapping. On input, `null` values are dropped so
/// host scanners can report absent attributes without special casing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttributeMap(Vec<(String, String)>);

impl AttributeMap {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn contains_key(&self, name: &str) -> bool {
        self.0.iter().any(|(key, _)| key == name)
    }

    /// Insert or replace. A replaced attribute keeps its original position.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.0.iter_mut().find(|(key, _)| *key == name) {
            Some(slot) => slot.1 = value,
            None => self.0.push((name, value)),
        }
    }

    pub fn remove(&mut self, name: &str) -> Option<String> {
        let index = self.0.iter().position(|(key, _)| key == name)?;
        Some(self.0.remove(index).1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for AttributeMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = AttributeMap::new();
        for (k, v) in iter {
            map.insert(k, v);
        }
        map
    }
}

impl Serialize for AttributeMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (k, v) in &self.0 {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for AttributeMap {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct AttributeMapVisitor;

        impl<'de> Visitor<'de> for AttributeMapVisitor {
            type Value = AttributeMap;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of attribute names to string values")
            }

            fn visit_unit<E: serde::de::Error>(self) -> Result<Self::Value, E> {
                Ok(AttributeMap::new())
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut map = AttributeMap::new();
                while let Some((key, value)) = access.next_entry::<String, Option<String>>()? {
                    if let Some(value) = value {
                        map.insert(key, value);
                    }
                }
                Ok(map)
            }
        }

        deserializer.deserialize_any(AttributeMapVisitor)
    }
}

/// Serialized host tree used to seed and mutate an in-memory document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NodeSnapshot {
    Text { text: String },
    Element(ElementSnapshot),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementSnapshot {
    pub tag: String,
    #[serde(default, skip_serializing_if = "AttributeMap::is_empty")]
    pub attributes: AttributeMap,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<NodeSnapshot>,
}

impl ElementSnapshot {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attributes: AttributeMap::new(),
            children: Vec::new(),
        }
    }

    pub fn attr(mut self, name: &str, value: &str) -> Self {
        self.attributes.insert(name, value);
        self
    }

    pub fn child(mut self, child: ElementSnapshot) -> Self {
        self.children.push(NodeSnapshot::Element(child));
        self
    }

    pub fn text(mut self, text: &str) -> Self {
        self.children.push(NodeSnapshot::Text {
            text: text.to_string(),
        });
        self
    }
}

/// The two target-grammar locators composed for one node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComposedLocators {
    /// Semantic-query grammar with declarative `.or()` alternation.
    pub playwright: String,
    /// Explicit-selector grammar with a try/except fallback.
    pub selenium: String,
    /// Every scored candidate, highest score first.
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

/// Everything the engine reports about one selected node.
///
/// The engine keeps no reference to a record once it is returned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectionRecord {
    pub structural_selector: String,
    /// False when the depth bound ran out before a unique selector was found.
    pub selector_unique: bool,
    pub path_locator: String,
    pub display_name: String,
    pub html_snapshot: String,
    pub attributes: AttributeMap,
    pub is_dynamic: bool,
    pub playwright: String,
    pub selenium: String,
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}
