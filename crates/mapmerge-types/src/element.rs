//! Map elements and their three variants.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::attributes::AttributeMap;
use crate::error::{TypeError, TypeResult};
use crate::geometry::Geometry;
use crate::resolution::Side;

/// The OSM element type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementKind {
    Node,
    Way,
    Relation,
}

impl ElementKind {
    /// Single-letter prefix used in the short id form.
    pub fn prefix(&self) -> char {
        match self {
            Self::Node => 'n',
            Self::Way => 'w',
            Self::Relation => 'r',
        }
    }

    fn from_prefix(c: char) -> Option<Self> {
        match c {
            'n' => Some(Self::Node),
            'w' => Some(Self::Way),
            'r' => Some(Self::Relation),
            _ => None,
        }
    }
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Node => "node",
            Self::Way => "way",
            Self::Relation => "relation",
        };
        f.write_str(name)
    }
}

/// Typed element identifier, written `n123`, `w45`, or `r7`.
///
/// Negative ids are allowed; editors use them for not-yet-uploaded elements.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ElementId {
    pub kind: ElementKind,
    pub id: i64,
}

impl ElementId {
    pub fn new(kind: ElementKind, id: i64) -> Self {
        Self { kind, id }
    }

    pub fn node(id: i64) -> Self {
        Self::new(ElementKind::Node, id)
    }

    pub fn way(id: i64) -> Self {
        Self::new(ElementKind::Way, id)
    }

    pub fn relation(id: i64) -> Self {
        Self::new(ElementKind::Relation, id)
    }
}

impl fmt::Debug for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ElementId({self})")
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.kind.prefix(), self.id)
    }
}

impl FromStr for ElementId {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.chars();
        let kind = chars
            .next()
            .and_then(ElementKind::from_prefix)
            .ok_or_else(|| TypeError::InvalidElementId(s.to_string()))?;
        let id = chars
            .as_str()
            .parse::<i64>()
            .map_err(|_| TypeError::InvalidElementId(s.to_string()))?;
        Ok(Self { kind, id })
    }
}

impl TryFrom<String> for ElementId {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<ElementId> for String {
    fn from(id: ElementId) -> Self {
        id.to_string()
    }
}

/// One version of an element: original, ours, or theirs.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ElementVariant {
    pub id: i64,
    pub version: u64,
    #[serde(default, alias = "tags")]
    pub attributes: AttributeMap,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geometry: Option<Geometry>,
}

impl ElementVariant {
    pub fn new(id: i64, version: u64, attributes: AttributeMap) -> Self {
        Self {
            id,
            version,
            attributes,
            geometry: None,
        }
    }

    pub fn with_geometry(mut self, geometry: Geometry) -> Self {
        self.geometry = Some(geometry);
        self
    }
}

/// An element whose local and upstream edits diverged from a common original.
///
/// `ours` is `None` when the element was deleted locally, `theirs` is `None`
/// when it was deleted upstream.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConflictElement {
    pub element_id: ElementId,
    pub original: ElementVariant,
    #[serde(default)]
    pub ours: Option<ElementVariant>,
    #[serde(default)]
    pub theirs: Option<ElementVariant>,
}

impl ConflictElement {
    pub fn new(
        element_id: ElementId,
        original: ElementVariant,
        ours: Option<ElementVariant>,
        theirs: Option<ElementVariant>,
    ) -> Self {
        Self {
            element_id,
            original,
            ours,
            theirs,
        }
    }

    pub fn kind(&self) -> ElementKind {
        self.element_id.kind
    }

    /// The branch that deleted the element, if any. `ours` is checked first.
    pub fn deleted_branch(&self) -> Option<Side> {
        if self.ours.is_none() {
            Some(Side::Ours)
        } else if self.theirs.is_none() {
            Some(Side::Theirs)
        } else {
            None
        }
    }

    /// The variant on `side`, if that branch kept the element.
    pub fn variant(&self, side: Side) -> Option<&ElementVariant> {
        match side {
            Side::Ours => self.ours.as_ref(),
            Side::Theirs => self.theirs.as_ref(),
        }
    }

    /// Check that every variant can be interpreted.
    pub fn validate(&self) -> TypeResult<()> {
        let variants = [
            ("original", Some(&self.original)),
            ("ours", self.ours.as_ref()),
            ("theirs", self.theirs.as_ref()),
        ];
        for (label, variant) in variants {
            let Some(variant) = variant else { continue };
            if variant.id != self.element_id.id {
                return Err(self.malformed(format!(
                    "{label} variant has id {}, expected {}",
                    variant.id, self.element_id.id
                )));
            }
            if let Some(geometry) = &variant.geometry {
                geometry
                    .check()
                    .map_err(|reason| self.malformed(format!("{label} geometry: {reason}")))?;
            }
        }
        Ok(())
    }

    /// Decode and validate an element from an untyped JSON value.
    ///
    /// Any decoding failure is reported as [`TypeError::MalformedVariant`],
    /// naming the element when its id can still be read.
    pub fn from_json_value(value: serde_json::Value) -> TypeResult<Self> {
        let label = value
            .get("elementId")
            .and_then(|v| v.as_str())
            .unwrap_or("<unknown>")
            .to_string();
        let element: Self =
            serde_json::from_value(value).map_err(|e| TypeError::MalformedVariant {
                element: label,
                reason: e.to_string(),
            })?;
        element.validate()?;
        Ok(element)
    }

    fn malformed(&self, reason: String) -> TypeError {
        TypeError::MalformedVariant {
            element: self.element_id.to_string(),
            reason,
        }
    }
}
