//! The registry that tells the execution engine how to resolve each field
//! of each object type. It is built once at startup and shared by all
//! operations.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

use graph::prelude::{QueryExecutionError, Value};

use crate::execution::Resolve;
use crate::loader::{FieldLoader, Key};
use crate::query::OperationKind;

/// Extracts the key a batched field loads by from the parent object.
/// Returning `None` means the parent references nothing.
pub type KeyFn = Arc<dyn Fn(&Value) -> Option<Key> + Send + Sync>;

/// A `KeyFn` that reads the string field `name` of the parent.
pub fn key_field(name: &str) -> KeyFn {
    let name = name.to_owned();
    Arc::new(move |parent: &Value| {
        parent
            .get(&name)
            .and_then(Value::as_str)
            .map(ToOwned::to_owned)
    })
}

/// The type of value a field produces.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FieldType {
    Scalar,
    Object(String),
    List(String),
}

impl FieldType {
    pub fn object(name: &str) -> Self {
        FieldType::Object(name.to_owned())
    }

    pub fn list(name: &str) -> Self {
        FieldType::List(name.to_owned())
    }

    /// The object type of the field's values, if they are objects
    pub fn object_type(&self) -> Option<&str> {
        match self {
            FieldType::Scalar => None,
            FieldType::Object(name) | FieldType::List(name) => Some(name),
        }
    }

    /// The value of a field whose parent references nothing
    pub fn missing(&self) -> Value {
        match self {
            FieldType::List(_) => Value::List(vec![]),
            _ => Value::Null,
        }
    }
}

/// How the value of a field is produced.
#[derive(Clone)]
pub enum FieldKind {
    /// Read the field of the same name from the parent object
    Property,
    /// Call a resolver
    Resolve(Arc<dyn Resolve>),
    /// Load through a batch loader, keyed by a value of the parent
    Batched {
        key_of: KeyFn,
        loader: Arc<dyn FieldLoader>,
    },
    /// Root field of a subscription, fed by the events of a topic
    Subscribe { event: String },
}

impl fmt::Debug for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldKind::Property => write!(f, "Property"),
            FieldKind::Resolve(_) => write!(f, "Resolve"),
            FieldKind::Batched { .. } => write!(f, "Batched"),
            FieldKind::Subscribe { event } => write!(f, "Subscribe({})", event),
        }
    }
}

#[derive(Clone, Debug)]
pub struct FieldDef {
    pub name: String,
    /// `Type.field`, used to tell apart the batches and cache entries of
    /// fields with the same name on different types
    pub qualified_name: String,
    pub field_type: FieldType,
    pub kind: FieldKind,
}

#[derive(Clone, Debug)]
pub struct ObjectType {
    pub name: String,
    fields: BTreeMap<String, FieldDef>,
}

impl ObjectType {
    pub fn field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.get(name)
    }

    pub fn fields(&self) -> impl Iterator<Item = &FieldDef> {
        self.fields.values()
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SchemaError {
    #[error("Field `{0}` refers to undefined type `{1}`")]
    UnknownFieldType(String, String),
    #[error("Root {0} type `{1}` has no fields")]
    EmptyRootType(String, String),
}

#[derive(Debug)]
pub struct Schema {
    types: BTreeMap<String, ObjectType>,
    roots: BTreeMap<OperationKind, String>,
}

impl Schema {
    pub fn object_type(&self, name: &str) -> Option<&ObjectType> {
        self.types.get(name)
    }

    pub fn root_type(&self, kind: OperationKind) -> Result<&ObjectType, QueryExecutionError> {
        self.roots
            .get(&kind)
            .and_then(|name| self.types.get(name))
            .ok_or_else(|| QueryExecutionError::NoRootType(kind.to_string()))
    }

    pub fn types(&self) -> impl Iterator<Item = &ObjectType> {
        self.types.values()
    }
}

/// Collects the fields of one object type.
pub struct ObjectTypeBuilder {
    name: String,
    fields: BTreeMap<String, FieldDef>,
}

impl ObjectTypeBuilder {
    fn add(&mut self, name: &str, field_type: FieldType, kind: FieldKind) -> &mut Self {
        let def = FieldDef {
            name: name.to_owned(),
            qualified_name: format!("{}.{}", self.name, name),
            field_type,
            kind,
        };
        self.fields.insert(name.to_owned(), def);
        self
    }

    /// Scalar fields read from the parent object
    pub fn scalars(&mut self, names: &[&str]) -> &mut Self {
        for name in names {
            self.add(name, FieldType::Scalar, FieldKind::Property);
        }
        self
    }

    /// A field read from the parent object
    pub fn property(&mut self, name: &str, field_type: FieldType) -> &mut Self {
        self.add(name, field_type, FieldKind::Property)
    }

    pub fn resolve(
        &mut self,
        name: &str,
        field_type: FieldType,
        resolver: impl Resolve,
    ) -> &mut Self {
        self.add(name, field_type, FieldKind::Resolve(Arc::new(resolver)))
    }

    pub fn batched(
        &mut self,
        name: &str,
        field_type: FieldType,
        key_of: KeyFn,
        loader: impl FieldLoader,
    ) -> &mut Self {
        let loader: Arc<dyn FieldLoader> = Arc::new(loader);
        self.add(name, field_type, FieldKind::Batched { key_of, loader })
    }

    pub fn subscribe(&mut self, name: &str, field_type: FieldType, event: &str) -> &mut Self {
        let kind = FieldKind::Subscribe {
            event: event.to_owned(),
        };
        self.add(name, field_type, kind)
    }
}

/// Builds a `Schema`. Types are created on first mention.
///
/// ```ignore
/// let mut builder = SchemaBuilder::new();
/// builder.query().resolve("allPosts", FieldType::list("Post"), all_posts);
/// builder
///     .object("Post")
///     .scalars(&["id", "title"])
///     .batched("author", FieldType::object("Author"), key_field("authorId"), authors);
/// builder.object("Author").scalars(&["id", "name"]);
/// let schema = builder.build()?;
/// ```
#[derive(Default)]
pub struct SchemaBuilder {
    types: BTreeMap<String, ObjectTypeBuilder>,
    roots: BTreeMap<OperationKind, String>,
}

impl SchemaBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn object(&mut self, name: &str) -> &mut ObjectTypeBuilder {
        self.types
            .entry(name.to_owned())
            .or_insert_with(|| ObjectTypeBuilder {
                name: name.to_owned(),
                fields: BTreeMap::new(),
            })
    }

    pub fn query(&mut self) -> &mut ObjectTypeBuilder {
        self.root(OperationKind::Query, "Query")
    }

    pub fn mutation(&mut self) -> &mut ObjectTypeBuilder {
        self.root(OperationKind::Mutation, "Mutation")
    }

    pub fn subscription(&mut self) -> &mut ObjectTypeBuilder {
        self.root(OperationKind::Subscription, "Subscription")
    }

    fn root(&mut self, kind: OperationKind, name: &str) -> &mut ObjectTypeBuilder {
        self.roots.insert(kind, name.to_owned());
        self.object(name)
    }

    pub fn build(self) -> Result<Schema, SchemaError> {
        for ty in self.types.values() {
            for field in ty.fields.values() {
                if let Some(target) = field.field_type.object_type() {
                    if !self.types.contains_key(target) {
                        return Err(SchemaError::UnknownFieldType(
                            field.qualified_name.clone(),
                            target.to_owned(),
                        ));
                    }
                }
            }
        }
        for (kind, name) in &self.roots {
            if self.types.get(name).map_or(true, |ty| ty.fields.is_empty()) {
                return Err(SchemaError::EmptyRootType(kind.to_string(), name.clone()));
            }
        }

        let types = self
            .types
            .into_iter()
            .map(|(name, ty)| {
                let ty = ObjectType {
                    name: ty.name,
                    fields: ty.fields,
                };
                (name, ty)
            })
            .collect();
        Ok(Schema {
            types,
            roots: self.roots,
        })
    }
}
