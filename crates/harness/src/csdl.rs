//! CSDL XML reader for `$metadata` documents.
//!
//! Only the parts the suites and fixtures rely on are kept: schema
//! namespaces, entity and complex type declarations with their base types
//! and keys, and entity sets. Comments, annotations and documentation text
//! never contribute declarations.

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use crate::error::FixtureError;

/// An entity or complex type declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeDecl {
    pub namespace: String,
    pub name: String,
    pub base_type: Option<String>,
    /// `PropertyRef` names of the declared `<Key>`, empty when inherited.
    pub keys: Vec<String>,
}

impl TypeDecl {
    /// Returns `Namespace.Name`.
    pub fn qualified_name(&self) -> String {
        if self.namespace.is_empty() {
            self.name.clone()
        } else {
            format!("{}.{}", self.namespace, self.name)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntitySetDecl {
    pub name: String,
    pub entity_type: String,
}

/// An entity set whose element type has a derived entity type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CastTarget {
    pub entity_set: String,
    /// Namespace-qualified derived type name.
    pub derived_type: String,
}

/// The declarations read from one `$metadata` document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CsdlDocument {
    namespaces: Vec<String>,
    entity_types: Vec<TypeDecl>,
    complex_types: Vec<TypeDecl>,
    entity_sets: Vec<EntitySetDecl>,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum TypeKind {
    Entity,
    Complex,
}

/// Strips a namespace or alias qualifier.
pub fn unqualified(name: &str) -> &str {
    name.rsplit('.').next().unwrap_or(name)
}

fn attribute(e: &BytesStart<'_>, name: &[u8]) -> Result<Option<String>, FixtureError> {
    for attr in e.attributes() {
        let attr =
            attr.map_err(|err| FixtureError::malformed(format!("invalid CSDL attribute: {err}")))?;
        if attr.key.local_name().as_ref() == name {
            return Ok(Some(String::from_utf8_lossy(&attr.value).into_owned()));
        }
    }
    Ok(None)
}

/// Parses a CSDL XML document.
pub fn parse(document: &str) -> Result<CsdlDocument, FixtureError> {
    let mut reader = Reader::from_str(document);
    reader.config_mut().trim_text(true);

    let mut parser = Parser::default();
    loop {
        match reader
            .read_event()
            .map_err(|e| FixtureError::malformed(format!("invalid CSDL document: {e}")))?
        {
            Event::Start(e) => parser.open(&e, false)?,
            Event::Empty(e) => parser.open(&e, true)?,
            Event::End(e) => parser.close(e.local_name().as_ref()),
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(parser.csdl)
}

#[derive(Default)]
struct Parser {
    csdl: CsdlDocument,
    schemas: Vec<String>,
    open_type: Option<(TypeKind, TypeDecl)>,
    in_key: bool,
}

impl Parser {
    fn open(&mut self, e: &BytesStart<'_>, empty: bool) -> Result<(), FixtureError> {
        match e.local_name().as_ref() {
            b"Schema" => {
                let namespace = attribute(e, b"Namespace")?.unwrap_or_default();
                if !namespace.is_empty() {
                    self.csdl.namespaces.push(namespace.clone());
                }
                if !empty {
                    self.schemas.push(namespace);
                }
            }
            tag @ (b"EntityType" | b"ComplexType") => {
                let kind = if tag == b"EntityType" {
                    TypeKind::Entity
                } else {
                    TypeKind::Complex
                };
                let decl = TypeDecl {
                    namespace: self.schemas.last().cloned().unwrap_or_default(),
                    name: attribute(e, b"Name")?.unwrap_or_default(),
                    base_type: attribute(e, b"BaseType")?,
                    keys: Vec::new(),
                };
                if empty {
                    self.csdl.push_type(kind, decl);
                } else {
                    self.open_type = Some((kind, decl));
                }
            }
            b"Key" => self.in_key = !empty,
            b"PropertyRef" if self.in_key => {
                if let (Some((_, decl)), Some(name)) =
                    (self.open_type.as_mut(), attribute(e, b"Name")?)
                {
                    decl.keys.push(name);
                }
            }
            b"EntitySet" => {
                if let (Some(name), Some(entity_type)) =
                    (attribute(e, b"Name")?, attribute(e, b"EntityType")?)
                {
                    self.csdl.entity_sets.push(EntitySetDecl { name, entity_type });
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn close(&mut self, tag: &[u8]) {
        match tag {
            b"Schema" => {
                self.schemas.pop();
            }
            b"Key" => self.in_key = false,
            b"EntityType" | b"ComplexType" => {
                if let Some((kind, decl)) = self.open_type.take() {
                    self.csdl.push_type(kind, decl);
                }
            }
            _ => {}
        }
    }
}

impl CsdlDocument {
    fn push_type(&mut self, kind: TypeKind, decl: TypeDecl) {
        match kind {
            TypeKind::Entity => self.entity_types.push(decl),
            TypeKind::Complex => self.complex_types.push(decl),
        }
    }

    /// Namespace of the first schema.
    pub fn namespace(&self) -> Option<&str> {
        self.namespaces.first().map(String::as_str)
    }

    pub fn entity_types(&self) -> &[TypeDecl] {
        &self.entity_types
    }

    pub fn entity_sets(&self) -> &[EntitySetDecl] {
        &self.entity_sets
    }

    /// True when any entity or complex type declares a base type.
    pub fn has_derived_types(&self) -> bool {
        self.entity_types
            .iter()
            .chain(&self.complex_types)
            .any(|t| t.base_type.is_some())
    }

    fn entity_type(&self, name: &str) -> Option<&TypeDecl> {
        let short = unqualified(name);
        self.entity_types.iter().find(|t| t.name == short)
    }

    /// Key property names of the entity set's type, following base types
    /// for inherited keys.
    pub fn key_of(&self, entity_set: &str) -> Option<&[String]> {
        let set = self.entity_sets.iter().find(|s| s.name == entity_set)?;
        let mut current = self.entity_type(&set.entity_type)?;
        // bounded so a cyclic BaseType chain cannot loop
        for _ in 0..=self.entity_types.len() {
            if !current.keys.is_empty() {
                return Some(&current.keys);
            }
            current = self.entity_type(current.base_type.as_deref()?)?;
        }
        None
    }

    /// Finds the first entity set whose element type has a derived entity
    /// type.
    pub fn cast_target(&self) -> Option<CastTarget> {
        self.entity_sets.iter().find_map(|set| {
            let set_type = unqualified(&set.entity_type);
            self.entity_types
                .iter()
                .find(|t| t.base_type.as_deref().map(unqualified) == Some(set_type))
                .map(|derived| CastTarget {
                    entity_set: set.name.clone(),
                    derived_type: derived.qualified_name(),
                })
        })
    }
}
