//! Compiles the supported subset of XML Schema into a [`SchemaDefinition`].
//!
//! Supported: global element declarations, inline and named complex types
//! built from `xs:sequence` particles, `minOccurs`/`maxOccurs`, `mixed`,
//! attribute declarations with `use`, `xs:simpleContent` extensions, named
//! simple-type restrictions (facets are not enforced) and element `ref`s.
//! Anything else is refused with [`SchemaError::Unsupported`].

use super::types::SimpleType;
use crate::source::{DocumentSource, SourceError};
use std::collections::HashMap;
use thiserror::Error;

const XS_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema";

#[derive(Debug, Error)]
pub enum SchemaError {
    #[error(transparent)]
    Source(#[from] SourceError),
    #[error("schema is not well-formed: {0}")]
    Xml(#[from] roxmltree::Error),
    #[error("root element is not xs:schema")]
    NotASchema,
    #[error("unsupported schema construct 'xs:{0}'")]
    Unsupported(String),
    #[error("{kind} declaration without a name")]
    MissingName { kind: &'static str },
    #[error("type '{0}' is not defined")]
    UnknownType(String),
    #[error("element '{0}' is referenced but not declared")]
    UnknownElement(String),
    #[error("type '{0}' is defined recursively")]
    RecursiveType(String),
    #[error("invalid occurrence value '{0}'")]
    InvalidOccurs(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaxOccurs {
    Bounded(u32),
    Unbounded,
}

impl MaxOccurs {
    pub fn allows(self, count: u32) -> bool {
        match self {
            Self::Bounded(max) => count <= max,
            Self::Unbounded => true,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ElementDecl {
    pub name: String,
    pub min_occurs: u32,
    pub max_occurs: MaxOccurs,
    pub ty: TypeDef,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TypeDef {
    /// No type given: any attributes and content are accepted unchecked.
    Any,
    Simple(SimpleType),
    Complex(ComplexType),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ComplexType {
    pub attributes: Vec<AttributeDecl>,
    pub content: Content,
    pub mixed: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Content {
    Empty,
    Elements(Vec<ElementDecl>),
    Text(SimpleType),
}

#[derive(Debug, Clone, PartialEq)]
pub struct AttributeDecl {
    pub name: String,
    pub ty: SimpleType,
    pub required: bool,
}

/// Compiled schema: the global element declarations, any of which may be the
/// document root.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaDefinition {
    elements: Vec<ElementDecl>,
}

impl SchemaDefinition {
    pub fn compile(source: &DocumentSource) -> Result<Self, SchemaError> {
        let text = source.read_to_string()?;
        let schema = Self::parse(&text)?;
        tracing::debug!(source = %source.describe(), roots = schema.elements.len(), "schema compiled");
        Ok(schema)
    }

    pub fn parse(xsd: &str) -> Result<Self, SchemaError> {
        let doc = roxmltree::Document::parse(xsd)?;
        let root = doc.root_element();
        if !is_xs(root, "schema") {
            return Err(SchemaError::NotASchema);
        }
        Compiler::new(root).compile_globals()
    }

    pub fn root(&self, name: &str) -> Option<&ElementDecl> {
        self.elements.iter().find(|e| e.name == name)
    }
}

fn is_xs(node: roxmltree::Node<'_, '_>, local: &str) -> bool {
    node.is_element()
        && node.tag_name().namespace() == Some(XS_NAMESPACE)
        && node.tag_name().name() == local
}

fn xs_children<'a, 'input: 'a>(
    node: roxmltree::Node<'a, 'input>,
) -> impl Iterator<Item = roxmltree::Node<'a, 'input>> {
    node.children()
        .filter(|n| n.is_element() && n.tag_name().namespace() == Some(XS_NAMESPACE))
        .filter(|n| n.tag_name().name() != "annotation")
}

fn find_xs<'a, 'input: 'a>(
    node: roxmltree::Node<'a, 'input>,
    local: &str,
) -> Option<roxmltree::Node<'a, 'input>> {
    xs_children(node).find(|n| n.tag_name().name() == local)
}

fn required_name<'a>(
    node: roxmltree::Node<'a, '_>,
    kind: &'static str,
) -> Result<&'a str, SchemaError> {
    node.attribute("name").ok_or(SchemaError::MissingName { kind })
}

fn parse_occurs(node: roxmltree::Node<'_, '_>) -> Result<(u32, MaxOccurs), SchemaError> {
    let min = match node.attribute("minOccurs") {
        Some(v) => v
            .trim()
            .parse()
            .map_err(|_| SchemaError::InvalidOccurs(v.to_string()))?,
        None => 1,
    };
    let max = match node.attribute("maxOccurs").map(str::trim) {
        Some("unbounded") => MaxOccurs::Unbounded,
        Some(v) => MaxOccurs::Bounded(
            v.parse()
                .map_err(|_| SchemaError::InvalidOccurs(v.to_string()))?,
        ),
        None => MaxOccurs::Bounded(1),
    };
    Ok((min, max))
}

/// A type attribute value resolved against the schema's namespaces.
enum TypeRef<'s> {
    Builtin(&'s str),
    Named(&'s str),
}

struct Compiler<'a, 'input> {
    complex_types: HashMap<&'a str, roxmltree::Node<'a, 'input>>,
    simple_types: HashMap<&'a str, roxmltree::Node<'a, 'input>>,
    elements: HashMap<&'a str, roxmltree::Node<'a, 'input>>,
    resolving: Vec<String>,
    root: roxmltree::Node<'a, 'input>,
}

impl<'a, 'input: 'a> Compiler<'a, 'input> {
    fn new(root: roxmltree::Node<'a, 'input>) -> Self {
        let mut complex_types = HashMap::new();
        let mut simple_types = HashMap::new();
        let mut elements = HashMap::new();
        for node in xs_children(root) {
            if let Some(name) = node.attribute("name") {
                match node.tag_name().name() {
                    "complexType" => {
                        complex_types.insert(name, node);
                    }
                    "simpleType" => {
                        simple_types.insert(name, node);
                    }
                    "element" => {
                        elements.insert(name, node);
                    }
                    _ => {}
                }
            }
        }
        Self {
            complex_types,
            simple_types,
            elements,
            resolving: Vec::new(),
            root,
        }
    }

    fn compile_globals(mut self) -> Result<SchemaDefinition, SchemaError> {
        let mut elements = Vec::new();
        for node in xs_children(self.root) {
            match node.tag_name().name() {
                "element" => {
                    let mut decl = self.element(node)?;
                    decl.min_occurs = 1;
                    decl.max_occurs = MaxOccurs::Bounded(1);
                    elements.push(decl);
                }
                "complexType" | "simpleType" | "import" | "include" => {}
                other => return Err(SchemaError::Unsupported(other.to_string())),
            }
        }
        Ok(SchemaDefinition { elements })
    }

    fn type_ref(&self, node: roxmltree::Node<'a, 'input>, qname: &'a str) -> TypeRef<'a> {
        let (prefix, local) = match qname.split_once(':') {
            Some((prefix, local)) => (Some(prefix), local),
            None => (None, qname),
        };
        if node.lookup_namespace_uri(prefix) == Some(XS_NAMESPACE) {
            TypeRef::Builtin(local)
        } else {
            TypeRef::Named(local)
        }
    }

    fn element(&mut self, node: roxmltree::Node<'a, 'input>) -> Result<ElementDecl, SchemaError> {
        let (min_occurs, max_occurs) = parse_occurs(node)?;

        if let Some(reference) = node.attribute("ref") {
            let local = reference.rsplit(':').next().unwrap_or(reference);
            let target = *self
                .elements
                .get(local)
                .ok_or_else(|| SchemaError::UnknownElement(local.to_string()))?;
            let decl = self.guarded(format!("element {local}"), |c| c.element(target))?;
            return Ok(ElementDecl {
                min_occurs,
                max_occurs,
                ..decl
            });
        }

        let name = required_name(node, "element")?.to_string();
        let ty = if let Some(type_name) = node.attribute("type") {
            self.resolve_type(node, type_name)?
        } else if let Some(inline) = find_xs(node, "complexType") {
            TypeDef::Complex(self.complex_type(inline)?)
        } else if let Some(inline) = find_xs(node, "simpleType") {
            TypeDef::Simple(self.simple_type(inline)?)
        } else {
            TypeDef::Any
        };

        Ok(ElementDecl {
            name,
            min_occurs,
            max_occurs,
            ty,
        })
    }

    fn resolve_type(
        &mut self,
        node: roxmltree::Node<'a, 'input>,
        qname: &'a str,
    ) -> Result<TypeDef, SchemaError> {
        match self.type_ref(node, qname) {
            TypeRef::Builtin("anyType") => Ok(TypeDef::Any),
            TypeRef::Builtin(local) => SimpleType::from_builtin(local)
                .map(TypeDef::Simple)
                .ok_or_else(|| SchemaError::UnknownType(qname.to_string())),
            TypeRef::Named(local) => {
                if let Some(&def) = self.complex_types.get(local) {
                    let ty = self.guarded(format!("type {local}"), |c| c.complex_type(def))?;
                    Ok(TypeDef::Complex(ty))
                } else if let Some(&def) = self.simple_types.get(local) {
                    let ty = self.guarded(format!("type {local}"), |c| c.simple_type(def))?;
                    Ok(TypeDef::Simple(ty))
                } else {
                    Err(SchemaError::UnknownType(qname.to_string()))
                }
            }
        }
    }

    fn resolve_simple(
        &mut self,
        node: roxmltree::Node<'a, 'input>,
        qname: &'a str,
    ) -> Result<SimpleType, SchemaError> {
        match self.resolve_type(node, qname)? {
            TypeDef::Simple(ty) => Ok(ty),
            TypeDef::Any => Ok(SimpleType::String),
            TypeDef::Complex(_) => Err(SchemaError::UnknownType(qname.to_string())),
        }
    }

    /// Runs `f` with `key` marked as being resolved, refusing re-entry.
    fn guarded<T>(
        &mut self,
        key: String,
        f: impl FnOnce(&mut Self) -> Result<T, SchemaError>,
    ) -> Result<T, SchemaError> {
        if self.resolving.contains(&key) {
            let name = key.split_once(' ').map_or(key.as_str(), |(_, n)| n);
            return Err(SchemaError::RecursiveType(name.to_string()));
        }
        self.resolving.push(key);
        let result = f(self);
        self.resolving.pop();
        result
    }

    fn simple_type(&mut self, node: roxmltree::Node<'a, 'input>) -> Result<SimpleType, SchemaError> {
        let Some(derivation) = xs_children(node).next() else {
            return Ok(SimpleType::String);
        };
        match derivation.tag_name().name() {
            "restriction" => match derivation.attribute("base") {
                Some(base) => self.resolve_simple(derivation, base),
                None => match find_xs(derivation, "simpleType") {
                    Some(inner) => self.simple_type(inner),
                    None => Ok(SimpleType::String),
                },
            },
            // lists and unions are checked as plain text
            "list" | "union" => Ok(SimpleType::String),
            other => Err(SchemaError::Unsupported(other.to_string())),
        }
    }

    fn complex_type(&mut self, node: roxmltree::Node<'a, 'input>) -> Result<ComplexType, SchemaError> {
        let mixed = node.attribute("mixed").map(str::trim) == Some("true");
        let mut attributes = Vec::new();
        let mut content = Content::Empty;

        for child in xs_children(node) {
            match child.tag_name().name() {
                "sequence" => content = Content::Elements(self.sequence(child)?),
                "attribute" => {
                    if let Some(attr) = self.attribute(child)? {
                        attributes.push(attr);
                    }
                }
                "simpleContent" => {
                    let extension = xs_children(child)
                        .next()
                        .ok_or_else(|| SchemaError::Unsupported("simpleContent".to_string()))?;
                    if extension.tag_name().name() != "extension" {
                        return Err(SchemaError::Unsupported(
                            extension.tag_name().name().to_string(),
                        ));
                    }
                    let base = extension.attribute("base").unwrap_or("xs:string");
                    content = Content::Text(self.resolve_simple(extension, base)?);
                    for attr in xs_children(extension) {
                        if attr.tag_name().name() != "attribute" {
                            return Err(SchemaError::Unsupported(attr.tag_name().name().to_string()));
                        }
                        if let Some(attr) = self.attribute(attr)? {
                            attributes.push(attr);
                        }
                    }
                }
                other => return Err(SchemaError::Unsupported(other.to_string())),
            }
        }

        Ok(ComplexType {
            attributes,
            content,
            mixed,
        })
    }

    fn sequence(&mut self, node: roxmltree::Node<'a, 'input>) -> Result<Vec<ElementDecl>, SchemaError> {
        let mut particles = Vec::new();
        for child in xs_children(node) {
            match child.tag_name().name() {
                "element" => particles.push(self.element(child)?),
                other => return Err(SchemaError::Unsupported(other.to_string())),
            }
        }
        Ok(particles)
    }

    /// `None` for prohibited attributes, which are left undeclared.
    fn attribute(
        &mut self,
        node: roxmltree::Node<'a, 'input>,
    ) -> Result<Option<AttributeDecl>, SchemaError> {
        let name = required_name(node, "attribute")?.to_string();
        let ty = match (node.attribute("type"), find_xs(node, "simpleType")) {
            (Some(type_name), _) => self.resolve_simple(node, type_name)?,
            (None, Some(inline)) => self.simple_type(inline)?,
            (None, None) => SimpleType::String,
        };
        let required = match node.attribute("use").map(str::trim) {
            Some("required") => true,
            Some("prohibited") => return Ok(None),
            _ => false,
        };
        Ok(Some(AttributeDecl { name, ty, required }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HOTELS_XSD: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema" elementFormDefault="qualified">
  <xs:element name="Hotels">
    <xs:complexType>
      <xs:sequence>
        <xs:element name="Hotel" type="HotelType" maxOccurs="unbounded"/>
      </xs:sequence>
    </xs:complexType>
  </xs:element>
  <xs:complexType name="HotelType">
    <xs:sequence>
      <xs:element name="Name" type="xs:string"/>
      <xs:element name="Phone" type="xs:string" maxOccurs="unbounded"/>
    </xs:sequence>
    <xs:attribute name="Rating" type="RatingType" use="optional"/>
  </xs:complexType>
  <xs:simpleType name="RatingType">
    <xs:restriction base="xs:decimal">
      <xs:maxInclusive value="5"/>
    </xs:restriction>
  </xs:simpleType>
</xs:schema>"#;

    #[test]
    fn named_types_are_resolved() {
        let schema = SchemaDefinition::parse(HOTELS_XSD).unwrap();
        let hotels = schema.root("Hotels").unwrap();
        let TypeDef::Complex(hotels_ty) = &hotels.ty else {
            panic!("Hotels should be complex");
        };
        let Content::Elements(particles) = &hotels_ty.content else {
            panic!("Hotels should have element content");
        };
        assert_eq!(particles[0].name, "Hotel");
        assert_eq!(particles[0].max_occurs, MaxOccurs::Unbounded);
        let TypeDef::Complex(hotel_ty) = &particles[0].ty else {
            panic!("Hotel should be complex");
        };
        assert_eq!(
            hotel_ty.attributes,
            vec![AttributeDecl {
                name: "Rating".to_string(),
                ty: SimpleType::Decimal,
                required: false,
            }]
        );
        assert!(schema.root("Hotel").is_none());
    }

    #[test]
    fn choice_is_unsupported() {
        let xsd = r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
  <xs:element name="A"><xs:complexType><xs:choice/></xs:complexType></xs:element>
</xs:schema>"#;
        assert!(matches!(
            SchemaDefinition::parse(xsd),
            Err(SchemaError::Unsupported(c)) if c == "choice"
        ));
    }

    #[test]
    fn recursive_named_type_is_refused() {
        let xsd = r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
  <xs:element name="Node" type="NodeType"/>
  <xs:complexType name="NodeType">
    <xs:sequence><xs:element name="Node" type="NodeType" minOccurs="0"/></xs:sequence>
  </xs:complexType>
</xs:schema>"#;
        assert!(matches!(
            SchemaDefinition::parse(xsd),
            Err(SchemaError::RecursiveType(t)) if t == "NodeType"
        ));
    }

    #[test]
    fn unknown_type_is_reported() {
        let xsd = r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
  <xs:element name="A" type="Missing"/>
</xs:schema>"#;
        assert!(matches!(
            SchemaDefinition::parse(xsd),
            Err(SchemaError::UnknownType(t)) if t == "Missing"
        ));
    }

    #[test]
    fn element_ref_takes_occurrence_from_use_site() {
        let xsd = r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
  <xs:element name="Phone" type="xs:string"/>
  <xs:element name="Card">
    <xs:complexType><xs:sequence><xs:element ref="Phone" minOccurs="0" maxOccurs="3"/></xs:sequence></xs:complexType>
  </xs:element>
</xs:schema>"#;
        let schema = SchemaDefinition::parse(xsd).unwrap();
        let TypeDef::Complex(card) = &schema.root("Card").unwrap().ty else {
            panic!("Card should be complex");
        };
        let Content::Elements(particles) = &card.content else {
            panic!("Card should have element content");
        };
        assert_eq!(particles[0].name, "Phone");
        assert_eq!(particles[0].min_occurs, 0);
        assert_eq!(particles[0].max_occurs, MaxOccurs::Bounded(3));
    }

    #[test]
    fn simple_content_extension_keeps_text_type_and_attributes() {
        let xsd = r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
  <xs:element name="Price">
    <xs:complexType><xs:simpleContent><xs:extension base="xs:decimal">
      <xs:attribute name="currency" type="xs:string" use="required"/>
    </xs:extension></xs:simpleContent></xs:complexType>
  </xs:element>
</xs:schema>"#;
        let schema = SchemaDefinition::parse(xsd).unwrap();
        let TypeDef::Complex(price) = &schema.root("Price").unwrap().ty else {
            panic!("Price should be complex");
        };
        assert_eq!(price.content, Content::Text(SimpleType::Decimal));
        assert!(price.attributes[0].required);
    }

    #[test]
    fn non_schema_root_is_rejected() {
        assert!(matches!(
            SchemaDefinition::parse("<Hotels/>"),
            Err(SchemaError::NotASchema)
        ));
    }
}
