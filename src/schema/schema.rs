use crate::ast::{ASTContext, DefaultIn, OperationKind};
use bumpalo::collections::Vec;
use bumpalo::Bump;
use hashbrown::hash_map::DefaultHashBuilder;
use hashbrown::{HashMap, HashSet};

/// A map allocated on the arena of an [`ASTContext`].
pub type ArenaMap<'a, V> = HashMap<&'a str, V, DefaultHashBuilder, &'a Bump>;

/// The types of a GraphQL service, which documents are resolved against.
///
/// A schema is only ever used for type information: it tells the analysis what type a field
/// returns, which arguments it accepts and which objects an abstract type may resolve to.
/// [Reference](https://spec.graphql.org/October2021/#sec-Schema)
#[derive(Debug, Clone, PartialEq)]
pub struct Schema<'a> {
    pub(crate) query_type: Option<&'a SchemaObject<'a>>,
    pub(crate) mutation_type: Option<&'a SchemaObject<'a>>,
    pub(crate) subscription_type: Option<&'a SchemaObject<'a>>,
    pub(crate) types: ArenaMap<'a, &'a SchemaType<'a>>,
}

impl<'a> DefaultIn<'a> for Schema<'a> {
    fn default_in(arena: &'a Bump) -> Self {
        Schema {
            query_type: None,
            mutation_type: None,
            subscription_type: None,
            types: HashMap::new_in(arena),
        }
    }
}

impl<'a> Schema<'a> {
    #[inline]
    pub fn query_type(&self) -> Option<&'a SchemaObject<'a>> {
        self.query_type
    }

    #[inline]
    pub fn mutation_type(&self) -> Option<&'a SchemaObject<'a>> {
        self.mutation_type
    }

    #[inline]
    pub fn subscription_type(&self) -> Option<&'a SchemaObject<'a>> {
        self.subscription_type
    }

    /// Returns the type that operations of the given kind select on.
    #[inline]
    pub fn get_root_type(&self, operation_kind: OperationKind) -> Option<&'a SchemaObject<'a>> {
        match operation_kind {
            OperationKind::Query => self.query_type,
            OperationKind::Mutation => self.mutation_type,
            OperationKind::Subscription => self.subscription_type,
        }
    }

    #[inline]
    pub fn get_type(&self, name: &str) -> Option<&'a SchemaType<'a>> {
        self.types.get(name).copied()
    }

    /// Retrieves a field on an object or interface type by the type's and the field's names.
    pub fn get_field(&self, type_name: &str, field_name: &str) -> Option<&'a SchemaField<'a>> {
        match self.get_type(type_name)? {
            SchemaType::Object(object) => object.get_field(field_name),
            SchemaType::Interface(interface) => interface.get_field(field_name),
            _ => None,
        }
    }

    /// Returns the names of all concrete object types that a value of the named type may have.
    ///
    /// Object types only have themselves as a possible type, while interfaces and unions list
    /// the object types that implement or belong to them.
    pub fn possible_types(&self, type_name: &str) -> std::vec::Vec<&'a str> {
        match self.get_type(type_name) {
            Some(SchemaType::Object(object)) => vec![object.name],
            Some(SchemaType::Interface(interface)) => interface.get_possible_types().to_vec(),
            Some(SchemaType::Union(schema_union)) => schema_union.get_possible_types().to_vec(),
            _ => std::vec::Vec::new(),
        }
    }

    /// Returns the names of types that are related to the named type for lookups of fields.
    ///
    /// This is the type itself followed by its possible types when it's abstract, or the
    /// interfaces it implements when it's an object type.
    pub fn related_types(&self, type_name: &str) -> std::vec::Vec<&'a str> {
        let Some(schema_type) = self.get_type(type_name) else {
            return std::vec::Vec::new();
        };
        let mut related = vec![schema_type.name()];
        match schema_type {
            SchemaType::Object(object) => related.extend_from_slice(object.get_interfaces()),
            SchemaType::Interface(_) | SchemaType::Union(_) => {
                related.extend(self.possible_types(type_name))
            }
            _ => {}
        }
        related
    }

    /// Checks whether a value of type `sub_type` may be returned where `super_type` is expected.
    pub fn is_sub_type(&self, super_type: &str, sub_type: &str) -> bool {
        super_type == sub_type || self.possible_types(super_type).contains(&sub_type)
    }
}

/// Trait for types that define output fields.
pub trait SchemaFields<'a>: Sized {
    fn add_field(&mut self, ctx: &'a ASTContext, field: SchemaField<'a>);

    fn get_fields(&self) -> &ArenaMap<'a, &'a SchemaField<'a>>;

    #[inline]
    fn get_field(&self, name: &str) -> Option<&'a SchemaField<'a>> {
        self.get_fields().get(name).copied()
    }
}

/// Trait for types that implement interfaces.
pub trait SchemaInterfaces<'a>: Sized {
    fn add_interface(&mut self, interface: &'a str);

    fn get_interfaces(&self) -> &[&'a str];
}

/// Trait for abstract types, which resolve to one of their possible object types.
pub trait SchemaPossibleTypes<'a>: Sized {
    fn add_possible_type(&mut self, object: &'a str);

    fn get_possible_types(&self) -> &[&'a str];
}

macro_rules! impl_fields {
    ($($schema_type:ident),+) => {
        $(
            impl<'a> SchemaFields<'a> for $schema_type<'a> {
                fn add_field(&mut self, ctx: &'a ASTContext, field: SchemaField<'a>) {
                    self.fields.insert(field.name, ctx.alloc(field));
                }

                #[inline]
                fn get_fields(&self) -> &ArenaMap<'a, &'a SchemaField<'a>> {
                    &self.fields
                }
            }
        )+
    };
}

/// Names are kept once each, in the order they were first added.
macro_rules! impl_name_list {
    ($trait:ident, $add:ident, $get:ident, $list:ident, [$($schema_type:ident),+]) => {
        $(
            impl<'a> $trait<'a> for $schema_type<'a> {
                fn $add(&mut self, name: &'a str) {
                    if !self.$list.contains(&name) {
                        self.$list.push(name);
                    }
                }

                #[inline]
                fn $get(&self) -> &[&'a str] {
                    &self.$list
                }
            }
        )+
    };
}

impl_fields!(SchemaObject, SchemaInterface);
impl_name_list!(
    SchemaInterfaces,
    add_interface,
    get_interfaces,
    interfaces,
    [SchemaObject, SchemaInterface]
);
impl_name_list!(
    SchemaPossibleTypes,
    add_possible_type,
    get_possible_types,
    possible_types,
    [SchemaInterface, SchemaUnion]
);

/// An object type, which is what every entity in a cache is an instance of.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaObject<'a> {
    pub name: &'a str,
    pub(crate) fields: ArenaMap<'a, &'a SchemaField<'a>>,
    pub(crate) interfaces: Vec<'a, &'a str>,
}

impl<'a> SchemaObject<'a> {
    #[inline]
    pub fn new(ctx: &'a ASTContext, name: &'a str) -> Self {
        SchemaObject {
            name,
            fields: HashMap::new_in(&ctx.arena),
            interfaces: Vec::new_in(&ctx.arena),
        }
    }
}

/// An interface, whose fields every implementing object shares.
///
/// [Reference](https://spec.graphql.org/October2021/#sec-Interfaces)
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaInterface<'a> {
    pub name: &'a str,
    pub(crate) fields: ArenaMap<'a, &'a SchemaField<'a>>,
    pub(crate) interfaces: Vec<'a, &'a str>,
    pub(crate) possible_types: Vec<'a, &'a str>,
}

impl<'a> SchemaInterface<'a> {
    #[inline]
    pub fn new(ctx: &'a ASTContext, name: &'a str) -> Self {
        SchemaInterface {
            name,
            fields: HashMap::new_in(&ctx.arena),
            interfaces: Vec::new_in(&ctx.arena),
            possible_types: Vec::new_in(&ctx.arena),
        }
    }
}

/// An output field, with the arguments it accepts and the type it returns.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaField<'a> {
    pub name: &'a str,
    pub arguments: ArenaMap<'a, SchemaInputField<'a>>,
    pub output_type: &'a TypeRef<'a>,
}

impl<'a> SchemaField<'a> {
    #[inline]
    pub fn new(ctx: &'a ASTContext, name: &'a str, output_type: &'a TypeRef<'a>) -> Self {
        SchemaField {
            name,
            arguments: HashMap::new_in(&ctx.arena),
            output_type,
        }
    }

    pub fn add_argument(&mut self, arg: SchemaInputField<'a>) {
        self.arguments.insert(arg.name, arg);
    }

    #[inline]
    pub fn get_argument(&self, name: &str) -> Option<&SchemaInputField<'a>> {
        self.arguments.get(name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SchemaUnion<'a> {
    pub name: &'a str,
    possible_types: Vec<'a, &'a str>,
}

impl<'a> SchemaUnion<'a> {
    #[inline]
    pub fn new(ctx: &'a ASTContext, name: &'a str) -> Self {
        SchemaUnion {
            name,
            possible_types: Vec::new_in(&ctx.arena),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SchemaScalar<'a> {
    pub name: &'a str,
}

impl<'a> SchemaScalar<'a> {
    #[inline]
    pub fn new(name: &'a str) -> Self {
        SchemaScalar { name }
    }
}

/// An enum type. Its values are what enum literals in conditions are checked against.
#[derive(Debug, PartialEq, Clone)]
pub struct SchemaEnum<'a> {
    pub name: &'a str,
    pub values: HashSet<&'a str, DefaultHashBuilder, &'a Bump>,
}

impl<'a> SchemaEnum<'a> {
    #[inline]
    pub fn new(ctx: &'a ASTContext, name: &'a str) -> Self {
        SchemaEnum {
            name,
            values: HashSet::new_in(&ctx.arena),
        }
    }

    pub fn add_value(&mut self, value: &'a str) {
        self.values.insert(value);
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SchemaInputObject<'a> {
    pub name: &'a str,
    pub fields: ArenaMap<'a, SchemaInputField<'a>>,
}

impl<'a> SchemaInputObject<'a> {
    #[inline]
    pub fn new(ctx: &'a ASTContext, name: &'a str) -> Self {
        SchemaInputObject {
            name,
            fields: HashMap::new_in(&ctx.arena),
        }
    }

    pub fn add_field(&mut self, field: SchemaInputField<'a>) {
        self.fields.insert(field.name, field);
    }
}

/// An argument of a field or a field of an input object.
#[derive(Debug, PartialEq, Clone, Copy)]
pub struct SchemaInputField<'a> {
    pub name: &'a str,
    pub input_type: &'a TypeRef<'a>,
}

impl<'a> SchemaInputField<'a> {
    #[inline]
    pub fn new(name: &'a str, input_type: &'a TypeRef<'a>) -> Self {
        SchemaInputField { name, input_type }
    }
}

macro_rules! schema_types {
    ($($variant:ident($definition:ident),)+) => {
        /// A named type of any kind, as stored in a [Schema].
        #[derive(Debug, PartialEq, Clone, Copy)]
        pub enum SchemaType<'a> {
            $($variant(&'a $definition<'a>),)+
        }

        impl<'a> SchemaType<'a> {
            #[inline]
            pub fn name(&self) -> &'a str {
                match self {
                    $(SchemaType::$variant(definition) => definition.name,)+
                }
            }
        }

        /// A type definition that's still owned by the loader while a schema is being built.
        #[derive(Debug, PartialEq, Clone)]
        pub enum OwnedSchemaType<'a> {
            $($variant($definition<'a>),)+
        }

        impl<'a> OwnedSchemaType<'a> {
            #[inline]
            pub fn name(&self) -> &'a str {
                match self {
                    $(OwnedSchemaType::$variant(definition) => definition.name,)+
                }
            }

            /// Moves this type into the arena.
            pub fn into_schema_type(self, ctx: &'a ASTContext) -> &'a SchemaType<'a> {
                ctx.alloc(match self {
                    $(OwnedSchemaType::$variant(definition) => {
                        SchemaType::$variant(ctx.alloc(definition))
                    })+
                })
            }
        }
    };
}

schema_types! {
    InputObject(SchemaInputObject),
    Object(SchemaObject),
    Union(SchemaUnion),
    Interface(SchemaInterface),
    Scalar(SchemaScalar),
    Enum(SchemaEnum),
}

impl<'a> SchemaType<'a> {
    /// Returns whether this type may carry a selection set.
    #[inline]
    pub fn is_composite(&self) -> bool {
        matches!(
            self,
            SchemaType::Object(_) | SchemaType::Interface(_) | SchemaType::Union(_)
        )
    }
}

/// A reference to a named type that may be wrapped in list and non-null types.
#[derive(Clone, Copy, PartialEq)]
pub enum TypeRef<'a> {
    Type(&'a str),
    ListType(&'a TypeRef<'a>),
    NonNullType(&'a TypeRef<'a>),
}

impl<'a> TypeRef<'a> {
    /// Unwraps all list and non-null wrappers and returns the name of the named type.
    #[inline]
    pub fn named(&self) -> &'a str {
        match self {
            TypeRef::Type(name) => name,
            TypeRef::ListType(of_type) | TypeRef::NonNullType(of_type) => of_type.named(),
        }
    }

    /// Returns whether this type is a list type, whether it's nullable or not.
    #[inline]
    pub fn is_list(&self) -> bool {
        match self {
            TypeRef::ListType(_) => true,
            TypeRef::NonNullType(of_type) => of_type.is_list(),
            TypeRef::Type(_) => false,
        }
    }
}

/// The type of the `__typename` meta field which every composite type has.
pub(crate) static TYPENAME_TYPE: TypeRef<'static> = TypeRef::NonNullType(&TypeRef::Type("String"));

/// Prints the type reference as it'd be written in GraphQL, e.g. `[User!]!`.
impl<'a> std::fmt::Display for TypeRef<'a> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TypeRef::Type(name) => f.write_str(name),
            TypeRef::ListType(of_type) => write!(f, "[{}]", of_type),
            TypeRef::NonNullType(of_type) => write!(f, "{}!", of_type),
        }
    }
}

impl<'a> std::fmt::Debug for TypeRef<'a> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "TypeRef({self})")
    }
}
