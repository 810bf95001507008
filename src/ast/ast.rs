use bumpalo::collections::Vec;

/// Owner of the arena that documents, schemas and synthesized fragments are allocated into.
///
/// Every document, schema type and synthesized fragment of an analysis run lives in the same
/// arena, which hence defines the lifetime `'a` that the whole analysis borrows from.
/// Once the produced artifacts have been taken out of a run, the arena can be dropped at once.
pub struct ASTContext {
    pub arena: bumpalo::Bump,
}

impl ASTContext {
    pub fn new() -> Self {
        ASTContext {
            arena: bumpalo::Bump::new(),
        }
    }

    /// Moves `item` into the arena.
    #[inline]
    pub fn alloc<T>(&self, item: T) -> &T {
        self.arena.alloc(item)
    }

    /// Copies a string slice into the arena.
    #[inline]
    pub fn alloc_str(&self, str: &str) -> &str {
        self.arena.alloc_str(str)
    }

    /// Moves an owned `String` into the arena without copying its contents.
    #[inline]
    pub fn alloc_string(&self, str: String) -> &str {
        self.arena.alloc(str)
    }
}

impl Default for ASTContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Trait for creating empty, arena-backed AST nodes.
pub trait DefaultIn<'a> {
    fn default_in(arena: &'a bumpalo::Bump) -> Self;
}

macro_rules! default_in {
    ($($node:ident { $list:ident }),+) => {
        $(
            impl<'a> DefaultIn<'a> for $node<'a> {
                #[inline]
                fn default_in(arena: &'a bumpalo::Bump) -> Self {
                    $node {
                        $list: Vec::new_in(arena),
                    }
                }
            }
        )+
    };
}

/// `true` or `false`
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub struct BooleanValue {
    pub value: bool,
}

/// A `$variable`, referring to a value passed alongside a document.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub struct Variable<'a> {
    pub name: &'a str,
}

#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub struct EnumValue<'a> {
    pub value: &'a str,
}

/// An integer literal as written in the source. Its range is only checked once it's typed
/// against the schema.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub struct IntValue<'a> {
    pub value: &'a str,
}

/// A float literal as written in the source.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub struct FloatValue<'a> {
    pub value: &'a str,
}

/// A string literal with its escape sequences and block string indentation already resolved.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub struct StringValue<'a> {
    pub value: &'a str,
}

/// An input value, as passed to the arguments of fields and directives.
///
/// [Reference](https://spec.graphql.org/October2021/#sec-Input-Values)
#[derive(Debug, PartialEq, Clone)]
pub enum Value<'a> {
    Variable(Variable<'a>),
    String(StringValue<'a>),
    Float(FloatValue<'a>),
    Int(IntValue<'a>),
    Boolean(BooleanValue),
    Enum(EnumValue<'a>),
    List(ListValue<'a>),
    Object(ObjectValue<'a>),
    Null,
}

impl<'a> Value<'a> {
    /// Returns the contents of a string literal.
    #[inline]
    pub fn as_str(&self) -> Option<&'a str> {
        match self {
            Value::String(StringValue { value }) => Some(value),
            _ => None,
        }
    }
}

#[derive(Debug, PartialEq, Clone)]
pub struct ListValue<'a> {
    pub children: Vec<'a, Value<'a>>,
}

#[derive(Debug, PartialEq, Clone)]
pub struct ObjectField<'a> {
    pub name: &'a str,
    pub value: Value<'a>,
}

/// An input object literal, such as the `{ online: true }` conditions of `@append(when:)`.
#[derive(Debug, PartialEq, Clone)]
pub struct ObjectValue<'a> {
    pub children: Vec<'a, ObjectField<'a>>,
}

#[derive(Debug, PartialEq, Clone)]
pub struct Argument<'a> {
    pub name: &'a str,
    pub value: Value<'a>,
}

/// The arguments of a field or directive in source order.
#[derive(Debug, PartialEq, Clone)]
pub struct Arguments<'a> {
    pub children: Vec<'a, Argument<'a>>,
}

impl<'a> Arguments<'a> {
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Finds an argument's value by the argument's name.
    #[inline]
    pub fn get(&self, name: &str) -> Option<&Value<'a>> {
        self.children
            .iter()
            .find(|argument| argument.name == name)
            .map(|argument| &argument.value)
    }
}

/// A directive annotating a selection or definition.
///
/// The analysis is driven by directives: `@connection` marks managed lists while `@prepend`,
/// `@append`, `@parentID`, `@when` and `@when_not` describe how mutations patch them.
#[derive(Debug, PartialEq, Clone)]
pub struct Directive<'a> {
    pub name: &'a str,
    pub arguments: Arguments<'a>,
}

#[derive(Debug, PartialEq, Clone)]
pub struct Directives<'a> {
    pub children: Vec<'a, Directive<'a>>,
}

impl<'a> Directives<'a> {
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Finds the first directive with the given name.
    #[inline]
    pub fn get(&self, name: &str) -> Option<&Directive<'a>> {
        self.children.iter().find(|directive| directive.name == name)
    }
}

/// The selections made on a composite type. Leaf fields carry an empty selection set.
#[derive(Debug, PartialEq, Clone)]
pub struct SelectionSet<'a> {
    pub selections: Vec<'a, Selection<'a>>,
}

impl<'a> SelectionSet<'a> {
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.selections.is_empty()
    }
}

default_in!(
    Arguments { children },
    Directives { children },
    SelectionSet { selections },
    VariableDefinitions { children }
);

/// A selected field, whose value appears under its alias or name in a response.
///
/// [Reference](https://spec.graphql.org/October2021/#sec-Language.Fields)
#[derive(Debug, PartialEq, Clone)]
pub struct Field<'a> {
    pub alias: Option<&'a str>,
    pub name: &'a str,
    pub arguments: Arguments<'a>,
    pub directives: Directives<'a>,
    pub selection_set: SelectionSet<'a>,
}

impl<'a> Field<'a> {
    /// Returns the key that the field's value is found under in a response.
    #[inline]
    pub fn alias_or_name(&self) -> &'a str {
        self.alias.unwrap_or(self.name)
    }

    /// Creates a field without arguments, directives or selections.
    #[inline]
    pub fn new_leaf(ctx: &'a ASTContext, name: &'a str) -> Self {
        Field {
            alias: None,
            name,
            arguments: Arguments::default_in(&ctx.arena),
            directives: Directives::default_in(&ctx.arena),
            selection_set: SelectionSet::default_in(&ctx.arena),
        }
    }
}

/// A spread of a named fragment. Insert and remove operations on connections are written as
/// spreads of generated fragments.
#[derive(Debug, PartialEq, Clone)]
pub struct FragmentSpread<'a> {
    pub name: NamedType<'a>,
    pub directives: Directives<'a>,
}

/// An inline fragment, which narrows the selections to a type when it has a type condition.
#[derive(Debug, PartialEq, Clone)]
pub struct InlineFragment<'a> {
    pub type_condition: Option<NamedType<'a>>,
    pub directives: Directives<'a>,
    pub selection_set: SelectionSet<'a>,
}

/// One entry of a [`SelectionSet`].
#[derive(Debug, PartialEq, Clone)]
pub enum Selection<'a> {
    Field(Field<'a>),
    FragmentSpread(FragmentSpread<'a>),
    InlineFragment(InlineFragment<'a>),
}

impl<'a> Selection<'a> {
    #[inline]
    pub fn field(&self) -> Option<&Field<'a>> {
        match self {
            Selection::Field(field) => Some(field),
            Selection::FragmentSpread(_) | Selection::InlineFragment(_) => None,
        }
    }
}

/// The name of a type, fragment or operation.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub struct NamedType<'a> {
    pub name: &'a str,
}

/// A possibly wrapped type reference, as written in variable definitions and the schema.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub enum Type<'a> {
    NamedType(NamedType<'a>),
    ListType(&'a Type<'a>),
    NonNullType(&'a Type<'a>),
}

#[derive(Debug, PartialEq, Clone)]
pub struct VariableDefinition<'a> {
    pub variable: Variable<'a>,
    pub of_type: Type<'a>,
    /// `Value::Null` when there's no default value.
    pub default_value: Value<'a>,
    pub directives: Directives<'a>,
}

#[derive(Debug, PartialEq, Clone)]
pub struct VariableDefinitions<'a> {
    pub children: Vec<'a, VariableDefinition<'a>>,
}

/// A named fragment, selecting on its type condition.
///
/// [Reference](https://spec.graphql.org/October2021/#sec-Language.Fragments)
#[derive(Debug, PartialEq, Clone)]
pub struct FragmentDefinition<'a> {
    pub name: NamedType<'a>,
    pub type_condition: NamedType<'a>,
    pub directives: Directives<'a>,
    pub selection_set: SelectionSet<'a>,
}

#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub enum OperationKind {
    Query,
    Mutation,
    Subscription,
}

/// A query, mutation or subscription.
///
/// [Reference](https://spec.graphql.org/October2021/#sec-Language.Operations)
#[derive(Debug, PartialEq, Clone)]
pub struct OperationDefinition<'a> {
    pub operation: OperationKind,
    /// Operations without a name can't be collected for an analysis run, since their artifacts
    /// are addressed by name.
    pub name: Option<NamedType<'a>>,
    pub variable_definitions: VariableDefinitions<'a>,
    pub directives: Directives<'a>,
    pub selection_set: SelectionSet<'a>,
}

/// A parsed source file, holding one or more operations and fragments.
#[derive(Debug, PartialEq, Clone)]
pub struct Document<'a> {
    pub definitions: Vec<'a, Definition<'a>>,
}

impl<'a> Document<'a> {
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}

#[derive(Debug, PartialEq, Clone)]
pub enum Definition<'a> {
    Operation(OperationDefinition<'a>),
    Fragment(FragmentDefinition<'a>),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::ParseNode;

    #[test]
    fn alias_or_name() {
        let ctx = ASTContext::new();
        let document = Document::parse(&ctx, "{ a: b c }").unwrap();
        let Definition::Operation(operation) = &document.definitions[0] else {
            panic!("expected an operation");
        };
        let keys: std::vec::Vec<&str> = operation
            .selection_set
            .selections
            .iter()
            .filter_map(|selection| selection.field())
            .map(|field| field.alias_or_name())
            .collect();
        assert_eq!(keys, ["a", "c"]);
    }

    #[test]
    fn directive_and_argument_lookup() {
        let ctx = ASTContext::new();
        let document =
            Document::parse(&ctx, r#"{ friends @connection(name: "Friends") { id } }"#).unwrap();
        let Definition::Operation(operation) = &document.definitions[0] else {
            panic!("expected an operation");
        };
        let field = operation.selection_set.selections[0].field().unwrap();
        let directive = field.directives.get("connection").unwrap();
        assert_eq!(
            directive.arguments.get("name").and_then(Value::as_str),
            Some("Friends")
        );
        assert!(field.directives.get("append").is_none());
    }

    #[test]
    fn leaf_fields() {
        let ctx = ASTContext::new();
        let field = Field::new_leaf(&ctx, "id");
        assert_eq!(field.alias_or_name(), "id");
        assert!(field.arguments.is_empty());
        assert!(field.directives.is_empty());
        assert!(field.selection_set.is_empty());
    }
}
