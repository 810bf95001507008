//! Loading a [Schema] from schema definition language source text.

use super::schema::*;
use crate::ast::parser::private::{ParseNode, ParserContext};
use crate::ast::{ASTContext, ASTKind, Directives, Type, Value};
use crate::ast::lexer::Token;
use crate::ast::DefaultIn;
use crate::error::{Error, ErrorType, Result};
use bumpalo::Bump;
use hashbrown::hash_map::DefaultHashBuilder;
use hashbrown::HashMap;

type ParseResult<T> = std::result::Result<T, ASTKind>;

const BUILTIN_SCALARS: [&str; 5] = ["String", "Int", "Float", "Boolean", "ID"];

/// The type definitions found in an SDL document, in their order of appearance.
struct SchemaBuilder<'a> {
    ctx: &'a ASTContext,
    types: std::vec::Vec<OwnedSchemaType<'a>>,
    index: HashMap<&'a str, usize>,
    query_type: Option<&'a str>,
    mutation_type: Option<&'a str>,
    subscription_type: Option<&'a str>,
}

impl<'a> SchemaBuilder<'a> {
    fn new(ctx: &'a ASTContext) -> Self {
        SchemaBuilder {
            ctx,
            types: std::vec::Vec::new(),
            index: HashMap::new(),
            query_type: None,
            mutation_type: None,
            subscription_type: None,
        }
    }

    fn get_mut(&mut self, name: &str) -> Option<&mut OwnedSchemaType<'a>> {
        let index = *self.index.get(name)?;
        self.types.get_mut(index)
    }

    /// Adds a type definition, or merges it into an existing definition of the same kind.
    fn define(&mut self, definition: OwnedSchemaType<'a>, is_extension: bool) -> Result<()> {
        let name = definition.name();
        let Some(existing) = self.get_mut(name) else {
            self.index.insert(name, self.types.len());
            self.types.push(definition);
            return Ok(());
        };
        match (existing, definition) {
            (OwnedSchemaType::Object(existing), OwnedSchemaType::Object(extension))
                if is_extension =>
            {
                existing.fields.extend(extension.fields);
                for interface in extension.interfaces {
                    existing.add_interface(interface);
                }
            }
            (OwnedSchemaType::Interface(existing), OwnedSchemaType::Interface(extension))
                if is_extension =>
            {
                existing.fields.extend(extension.fields);
                for interface in extension.interfaces {
                    existing.add_interface(interface);
                }
            }
            (OwnedSchemaType::Union(existing), OwnedSchemaType::Union(extension))
                if is_extension =>
            {
                for possible_type in extension.get_possible_types() {
                    existing.add_possible_type(*possible_type);
                }
            }
            (OwnedSchemaType::Enum(existing), OwnedSchemaType::Enum(extension))
                if is_extension =>
            {
                existing.values.extend(extension.values);
            }
            (OwnedSchemaType::InputObject(existing), OwnedSchemaType::InputObject(extension))
                if is_extension =>
            {
                existing.fields.extend(extension.fields);
            }
            (OwnedSchemaType::Scalar(_), OwnedSchemaType::Scalar(_)) if is_extension => {}
            _ => {
                return Err(Error::new(
                    format!("Type \"{}\" is defined more than once.", name),
                    ErrorType::Structural,
                ))
            }
        }
        Ok(())
    }

    /// Checks that every referenced type exists and builds the arena-allocated [Schema].
    fn build(mut self) -> Result<&'a Schema<'a>> {
        for name in BUILTIN_SCALARS {
            if !self.index.contains_key(name) {
                self.define(OwnedSchemaType::Scalar(SchemaScalar::new(name)), false)?;
            }
        }

        let mut implementations: std::vec::Vec<(&'a str, &'a str)> = std::vec::Vec::new();
        for definition in self.types.iter() {
            match definition {
                OwnedSchemaType::Object(object) => {
                    for interface in object.get_interfaces() {
                        implementations.push((*interface, object.name));
                    }
                    self.check_fields(object.name, object.get_fields())?;
                }
                OwnedSchemaType::Interface(interface) => {
                    self.check_fields(interface.name, interface.get_fields())?;
                }
                OwnedSchemaType::Union(schema_union) => {
                    for possible_type in schema_union.get_possible_types() {
                        if !matches!(
                            self.index.get(possible_type).map(|index| &self.types[*index]),
                            Some(OwnedSchemaType::Object(_))
                        ) {
                            return Err(Error::new(
                                format!(
                                    "Union \"{}\" references unknown object type \"{}\".",
                                    schema_union.name, possible_type
                                ),
                                ErrorType::Structural,
                            ));
                        }
                    }
                }
                _ => {}
            }
        }

        for (interface_name, object_name) in implementations {
            match self.get_mut(interface_name) {
                Some(OwnedSchemaType::Interface(interface)) => {
                    interface.add_possible_type(object_name)
                }
                _ => {
                    return Err(Error::new(
                        format!(
                            "Type \"{}\" implements unknown interface \"{}\".",
                            object_name, interface_name
                        ),
                        ErrorType::Structural,
                    ))
                }
            }
        }

        let ctx = self.ctx;
        let mut schema = Schema::default_in(&ctx.arena);
        for definition in self.types {
            let schema_type = definition.into_schema_type(ctx);
            schema.types.insert(schema_type.name(), schema_type);
        }

        schema.query_type = root_type(&schema, self.query_type, "Query")?;
        schema.mutation_type = root_type(&schema, self.mutation_type, "Mutation")?;
        schema.subscription_type = root_type(&schema, self.subscription_type, "Subscription")?;
        Ok(ctx.alloc(schema))
    }

    fn check_fields(
        &self,
        type_name: &str,
        fields: &HashMap<&'a str, &'a SchemaField<'a>, DefaultHashBuilder, &'a Bump>,
    ) -> Result<()> {
        for (name, field) in fields.iter() {
            let output_type = field.output_type.named();
            if !self.index.contains_key(output_type) {
                return Err(Error::new(
                    format!(
                        "Field \"{}.{}\" references unknown type \"{}\".",
                        type_name, name, output_type
                    ),
                    ErrorType::Structural,
                ));
            }
        }
        Ok(())
    }
}

/// Resolves a root operation type, which must be an object type when it's named explicitly.
fn root_type<'a>(
    schema: &Schema<'a>,
    name: Option<&'a str>,
    default: &'a str,
) -> Result<Option<&'a SchemaObject<'a>>> {
    match (schema.get_type(name.unwrap_or(default)), name) {
        (Some(SchemaType::Object(object)), _) => Ok(Some(*object)),
        (_, Some(name)) => Err(Error::new(
            format!("Root type \"{}\" must be a defined object type.", name),
            ErrorType::Structural,
        )),
        (_, None) => Ok(None),
    }
}

/// Converts a parsed type reference into a [TypeRef] on the arena.
fn type_ref<'a>(ctx: &'a ASTContext, of_type: &Type<'a>) -> &'a TypeRef<'a> {
    let type_ref = match of_type {
        Type::NamedType(named) => TypeRef::Type(named.name),
        Type::ListType(inner) => TypeRef::ListType(type_ref(ctx, inner)),
        Type::NonNullType(inner) => TypeRef::NonNullType(type_ref(ctx, inner)),
    };
    ctx.alloc(type_ref)
}

fn skip_description(parser: &mut ParserContext<'_>) {
    if let Token::String(_) = parser.peek() {
        parser.next();
    }
}

fn parse_name<'a>(parser: &mut ParserContext<'a>, kind: ASTKind) -> ParseResult<&'a str> {
    match parser.next() {
        Token::Name(name) => Ok(name),
        _ => Err(kind),
    }
}

fn expect<'a>(parser: &mut ParserContext<'a>, token: Token<'a>, kind: ASTKind) -> ParseResult<()> {
    if parser.eat(token) {
        Ok(())
    } else {
        Err(kind)
    }
}

/// Parses an input value definition, e.g. `id: ID! = "1" @deprecated`.
fn parse_input_value<'a>(
    ctx: &'a ASTContext,
    parser: &mut ParserContext<'a>,
) -> ParseResult<SchemaInputField<'a>> {
    skip_description(parser);
    let name = parse_name(parser, ASTKind::InputValueDefinition)?;
    expect(parser, Token::Colon, ASTKind::InputValueDefinition)?;
    let input_type = type_ref(ctx, &Type::new_with_ctx(parser)?);
    if parser.eat(Token::Equal) {
        Value::new_with_ctx(parser)?;
    }
    Directives::new_with_ctx(parser)?;
    Ok(SchemaInputField::new(name, input_type))
}

fn parse_arguments_definition<'a>(
    ctx: &'a ASTContext,
    parser: &mut ParserContext<'a>,
) -> ParseResult<std::vec::Vec<SchemaInputField<'a>>> {
    let mut arguments = std::vec::Vec::new();
    if parser.eat(Token::ParenOpen) {
        while !parser.eat(Token::ParenClose) {
            arguments.push(parse_input_value(ctx, parser)?);
        }
    }
    Ok(arguments)
}

fn parse_fields_definition<'a>(
    ctx: &'a ASTContext,
    parser: &mut ParserContext<'a>,
) -> ParseResult<std::vec::Vec<SchemaField<'a>>> {
    let mut fields = std::vec::Vec::new();
    if parser.eat(Token::BraceOpen) {
        while !parser.eat(Token::BraceClose) {
            skip_description(parser);
            let name = parse_name(parser, ASTKind::FieldDefinition)?;
            let arguments = parse_arguments_definition(ctx, parser)?;
            expect(parser, Token::Colon, ASTKind::FieldDefinition)?;
            let output_type = type_ref(ctx, &Type::new_with_ctx(parser)?);
            Directives::new_with_ctx(parser)?;
            let mut field = SchemaField::new(ctx, name, output_type);
            for argument in arguments {
                field.add_argument(argument);
            }
            fields.push(field);
        }
    }
    Ok(fields)
}

fn parse_implements<'a>(parser: &mut ParserContext<'a>) -> ParseResult<std::vec::Vec<&'a str>> {
    let mut interfaces = std::vec::Vec::new();
    if parser.eat(Token::Name("implements")) {
        parser.eat(Token::Ampersand);
        interfaces.push(parse_name(parser, ASTKind::NamedType)?);
        while parser.eat(Token::Ampersand) {
            interfaces.push(parse_name(parser, ASTKind::NamedType)?);
        }
    }
    Ok(interfaces)
}

/// Parses a single type definition after its keyword has been consumed.
fn parse_type_definition<'a>(
    ctx: &'a ASTContext,
    parser: &mut ParserContext<'a>,
    keyword: &str,
) -> ParseResult<OwnedSchemaType<'a>> {
    let name = parse_name(parser, ASTKind::TypeDefinition)?;
    let definition = match keyword {
        "scalar" => {
            Directives::new_with_ctx(parser)?;
            OwnedSchemaType::Scalar(SchemaScalar::new(name))
        }
        "type" => {
            let mut object = SchemaObject::new(ctx, name);
            for interface in parse_implements(parser)? {
                object.add_interface(interface);
            }
            Directives::new_with_ctx(parser)?;
            for field in parse_fields_definition(ctx, parser)? {
                object.add_field(ctx, field);
            }
            OwnedSchemaType::Object(object)
        }
        "interface" => {
            let mut interface = SchemaInterface::new(ctx, name);
            for implemented in parse_implements(parser)? {
                interface.add_interface(implemented);
            }
            Directives::new_with_ctx(parser)?;
            for field in parse_fields_definition(ctx, parser)? {
                interface.add_field(ctx, field);
            }
            OwnedSchemaType::Interface(interface)
        }
        "union" => {
            let mut schema_union = SchemaUnion::new(ctx, name);
            Directives::new_with_ctx(parser)?;
            if parser.eat(Token::Equal) {
                parser.eat(Token::Pipe);
                schema_union.add_possible_type(parse_name(parser, ASTKind::NamedType)?);
                while parser.eat(Token::Pipe) {
                    schema_union.add_possible_type(parse_name(parser, ASTKind::NamedType)?);
                }
            }
            OwnedSchemaType::Union(schema_union)
        }
        "enum" => {
            let mut schema_enum = SchemaEnum::new(ctx, name);
            Directives::new_with_ctx(parser)?;
            if parser.eat(Token::BraceOpen) {
                while !parser.eat(Token::BraceClose) {
                    skip_description(parser);
                    schema_enum.add_value(parse_name(parser, ASTKind::TypeDefinition)?);
                    Directives::new_with_ctx(parser)?;
                }
            }
            OwnedSchemaType::Enum(schema_enum)
        }
        "input" => {
            let mut input_object = SchemaInputObject::new(ctx, name);
            Directives::new_with_ctx(parser)?;
            if parser.eat(Token::BraceOpen) {
                while !parser.eat(Token::BraceClose) {
                    input_object.add_field(parse_input_value(ctx, parser)?);
                }
            }
            OwnedSchemaType::InputObject(input_object)
        }
        _ => return Err(ASTKind::TypeDefinition),
    };
    Ok(definition)
}

/// Parses `directive @name(args) repeatable on A | B`, which is read and discarded.
fn skip_directive_definition<'a>(
    ctx: &'a ASTContext,
    parser: &mut ParserContext<'a>,
) -> ParseResult<()> {
    if !matches!(parser.next(), Token::DirectiveName(_)) {
        return Err(ASTKind::DirectiveDefinition);
    }
    parse_arguments_definition(ctx, parser)?;
    parser.eat(Token::Name("repeatable"));
    expect(parser, Token::Name("on"), ASTKind::DirectiveDefinition)?;
    parser.eat(Token::Pipe);
    parse_name(parser, ASTKind::DirectiveDefinition)?;
    while parser.eat(Token::Pipe) {
        parse_name(parser, ASTKind::DirectiveDefinition)?;
    }
    Ok(())
}

fn parse_schema_definition<'a>(
    builder: &mut SchemaBuilder<'a>,
    parser: &mut ParserContext<'a>,
) -> ParseResult<()> {
    Directives::new_with_ctx(parser)?;
    expect(parser, Token::BraceOpen, ASTKind::SchemaDefinition)?;
    while !parser.eat(Token::BraceClose) {
        let operation = parse_name(parser, ASTKind::SchemaDefinition)?;
        expect(parser, Token::Colon, ASTKind::SchemaDefinition)?;
        let name = parse_name(parser, ASTKind::SchemaDefinition)?;
        match operation {
            "query" => builder.query_type = Some(name),
            "mutation" => builder.mutation_type = Some(name),
            "subscription" => builder.subscription_type = Some(name),
            _ => return Err(ASTKind::SchemaDefinition),
        }
    }
    Ok(())
}

/// Parses all definitions of an SDL document into the builder.
fn parse_definitions<'a>(
    ctx: &'a ASTContext,
    builder: &mut SchemaBuilder<'a>,
    parser: &mut ParserContext<'a>,
) -> Result<()> {
    loop {
        skip_description(parser);
        let is_extension = parser.eat(Token::Name("extend"));
        let keyword = match parser.next() {
            Token::End if !is_extension => return Ok(()),
            Token::Name(keyword) => keyword,
            _ => return Err(parser.to_error(ASTKind::Definition)),
        };
        match keyword {
            "schema" => parse_schema_definition(builder, parser)
                .map_err(|kind| parser.to_error(kind))?,
            "directive" if !is_extension => {
                skip_directive_definition(ctx, parser).map_err(|kind| parser.to_error(kind))?
            }
            _ => {
                let definition = parse_type_definition(ctx, parser, keyword)
                    .map_err(|kind| parser.to_error(kind))?;
                builder.define(definition, is_extension)?;
            }
        }
    }
}

impl<'a> Schema<'a> {
    /// Parses a schema definition language document into a [Schema] on the arena.
    ///
    /// Root types are taken from a `schema { ... }` definition when one is present, and otherwise
    /// default to the types named `Query`, `Mutation` and `Subscription`. The built-in scalars
    /// are always defined. Descriptions, directives and default values are skipped.
    pub fn parse<T: ToString>(ctx: &'a ASTContext, source: T) -> Result<&'a Schema<'a>> {
        let source = ctx.alloc_string(source.to_string());
        let mut parser = ParserContext::new(ctx, source);
        let mut builder = SchemaBuilder::new(ctx);
        parse_definitions(ctx, &mut builder, &mut parser)?;
        builder.build()
    }
}
