use super::ast::*;
use super::ast_kind::ASTKind;
use super::lexer::{Extras, Token};
use crate::error::{get_location, print_span, Error, ErrorType, Result};
use bumpalo::collections::Vec;
use logos::{Lexer, Logos, Span};

pub(crate) type ParseResult<T> = std::result::Result<T, ASTKind>;

pub(crate) mod private {
    use super::*;

    /// Cursor over the token stream with one token of lookahead, plus the arena that parsed
    /// nodes are allocated into.
    ///
    /// The schema definition language loader drives the same context with its own grammar.
    pub struct ParserContext<'a> {
        pub(crate) arena: &'a bumpalo::Bump,
        pub(crate) peek: Option<Token<'a>>,
        pub(crate) iter: Lexer<'a, Token<'a>>,
        pub(crate) in_var_def: bool,
    }

    impl<'a> ParserContext<'a> {
        /// Starts lexing `source` with the arena of `ctx`.
        pub(crate) fn new(ctx: &'a ASTContext, source: &'a str) -> Self {
            let extras = Extras { arena: &ctx.arena };
            ParserContext {
                arena: &ctx.arena,
                peek: None,
                iter: Token::lexer_with_extras(source, extras),
                in_var_def: false,
            }
        }

        #[inline]
        pub(crate) fn next(&mut self) -> Token<'a> {
            match self.peek.take() {
                Some(token) => token,
                None => self.iter.next().unwrap_or(Token::End),
            }
        }

        #[inline]
        pub(crate) fn peek(&mut self) -> &Token<'a> {
            let iter = &mut self.iter;
            self.peek
                .get_or_insert_with(|| iter.next().unwrap_or(Token::End))
        }

        /// Consumes the next token if it equals `token`.
        #[inline]
        pub(crate) fn eat(&mut self, token: Token<'a>) -> bool {
            if *self.peek() == token {
                self.next();
                true
            } else {
                false
            }
        }

        #[inline]
        pub(crate) fn source(&self) -> &'a str {
            self.iter.source()
        }

        #[inline]
        pub(crate) fn span(&self) -> Span {
            self.iter.span()
        }

        /// Converts a parsing failure at the current token into a syntax [Error].
        pub(crate) fn to_error(&self, kind: ASTKind) -> Error {
            let span = print_span(self.source(), self.span());
            let location = get_location(self.source(), self.span());
            Error::new_with_context(
                format!("Invalid {}", kind),
                Some(location),
                span,
                ErrorType::Syntax,
            )
        }
    }

    /// Recursive descent step for one node kind. Failures report the [`ASTKind`] being parsed
    /// and are turned into an [Error] by [`super::ParseNode::parse`].
    pub trait ParseNode<'a>: Sized {
        fn new_with_ctx(ctx: &mut ParserContext<'a>) -> ParseResult<Self>;
    }
}

/// Parses GraphQL source text into arena allocated AST nodes.
///
/// Any node can be parsed on its own, which is handy in tests, but documents are usually loaded
/// through `Document::parse` or a [`crate::documents::DocumentSet`].
pub trait ParseNode<'a>: private::ParseNode<'a> {
    /// Copies `source` into the arena, parses it and allocates the resulting node there too.
    fn parse<T: ToString>(ctx: &'a ASTContext, source: T) -> Result<&'a Self> {
        let source = ctx.alloc_string(source.to_string());
        let mut parser_ctx = private::ParserContext::new(ctx, source);
        match Self::new_with_ctx(&mut parser_ctx) {
            Ok(value) => Ok(ctx.alloc(value)),
            Err(kind) => Err(parser_ctx.to_error(kind)),
        }
    }
}

impl<'a, T: private::ParseNode<'a>> ParseNode<'a> for T {}

/// Parses a comma-free, delimited list of nodes until the closing token is found.
///
/// The opening token must already have been consumed.
#[inline]
fn parse_until<'a, T, F>(
    ctx: &mut private::ParserContext<'a>,
    close: Token<'a>,
    mut parse: F,
) -> ParseResult<Vec<'a, T>>
where
    F: FnMut(&mut private::ParserContext<'a>) -> ParseResult<T>,
{
    let mut builder = Vec::new_in(ctx.arena);
    while !ctx.eat(close) {
        builder.push(parse(ctx)?);
    }
    Ok(builder)
}

impl<'a> private::ParseNode<'a> for Variable<'a> {
    #[inline]
    fn new_with_ctx(ctx: &mut private::ParserContext<'a>) -> ParseResult<Variable<'a>> {
        if let Token::VariableName(name) = ctx.next() {
            Ok(Variable { name })
        } else {
            Err(ASTKind::Variable)
        }
    }
}

impl<'a> private::ParseNode<'a> for Value<'a> {
    fn new_with_ctx(ctx: &mut private::ParserContext<'a>) -> ParseResult<Value<'a>> {
        let in_var_def = ctx.in_var_def;
        match ctx.next() {
            Token::Name("null") => Ok(Value::Null),
            Token::Name("true") => Ok(Value::Boolean(BooleanValue { value: true })),
            Token::Name("false") => Ok(Value::Boolean(BooleanValue { value: false })),
            Token::Name(value) => Ok(Value::Enum(EnumValue { value })),
            Token::VariableName(_) if in_var_def => Err(ASTKind::VariableDefinition),
            Token::VariableName(name) => Ok(Value::Variable(Variable { name })),
            Token::Float(value) => Ok(Value::Float(FloatValue { value })),
            Token::Integer(value) => Ok(Value::Int(IntValue { value })),
            Token::String(value) => Ok(Value::String(StringValue { value })),
            Token::BracketOpen => {
                let children = parse_until(ctx, Token::BracketClose, Value::new_with_ctx)?;
                Ok(Value::List(ListValue { children }))
            }
            Token::BraceOpen => {
                let children = parse_until(ctx, Token::BraceClose, ObjectField::new_with_ctx)?;
                Ok(Value::Object(ObjectValue { children }))
            }
            _ => Err(ASTKind::Value),
        }
    }
}

impl<'a> private::ParseNode<'a> for ObjectField<'a> {
    #[inline]
    fn new_with_ctx(ctx: &mut private::ParserContext<'a>) -> ParseResult<ObjectField<'a>> {
        if let Token::Name(name) = ctx.next() {
            if let Token::Colon = ctx.next() {
                let value = Value::new_with_ctx(ctx)?;
                return Ok(ObjectField { name, value });
            }
        }
        Err(ASTKind::ObjectField)
    }
}

impl<'a> private::ParseNode<'a> for Argument<'a> {
    #[inline]
    fn new_with_ctx(ctx: &mut private::ParserContext<'a>) -> ParseResult<Argument<'a>> {
        if let Token::Name(name) = ctx.next() {
            if let Token::Colon = ctx.next() {
                let value = Value::new_with_ctx(ctx)?;
                return Ok(Argument { name, value });
            }
        }
        Err(ASTKind::Argument)
    }
}

impl<'a> private::ParseNode<'a> for Arguments<'a> {
    #[inline]
    fn new_with_ctx(ctx: &mut private::ParserContext<'a>) -> ParseResult<Arguments<'a>> {
        let children = if ctx.eat(Token::ParenOpen) {
            parse_until(ctx, Token::ParenClose, Argument::new_with_ctx)?
        } else {
            Vec::new_in(ctx.arena)
        };
        Ok(Arguments { children })
    }
}

impl<'a> private::ParseNode<'a> for Directive<'a> {
    #[inline]
    fn new_with_ctx(ctx: &mut private::ParserContext<'a>) -> ParseResult<Directive<'a>> {
        if let Token::DirectiveName(name) = ctx.next() {
            let arguments = Arguments::new_with_ctx(ctx)?;
            Ok(Directive { name, arguments })
        } else {
            Err(ASTKind::Directive)
        }
    }
}

impl<'a> private::ParseNode<'a> for Directives<'a> {
    #[inline]
    fn new_with_ctx(ctx: &mut private::ParserContext<'a>) -> ParseResult<Directives<'a>> {
        let mut builder = Vec::new_in(ctx.arena);
        while let Token::DirectiveName(_) = ctx.peek() {
            builder.push(Directive::new_with_ctx(ctx)?);
        }
        Ok(Directives { children: builder })
    }
}

impl<'a> private::ParseNode<'a> for Field<'a> {
    #[inline]
    fn new_with_ctx(ctx: &mut private::ParserContext<'a>) -> ParseResult<Field<'a>> {
        let Token::Name(name_or_alias) = ctx.next() else {
            return Err(ASTKind::Field);
        };
        let (alias, name) = if ctx.eat(Token::Colon) {
            match ctx.next() {
                Token::Name(name) => (Some(name_or_alias), name),
                _ => return Err(ASTKind::Field),
            }
        } else {
            (None, name_or_alias)
        };
        let arguments = Arguments::new_with_ctx(ctx)?;
        let directives = Directives::new_with_ctx(ctx)?;
        let selection_set = SelectionSet::new_with_ctx(ctx)?;
        Ok(Field {
            alias,
            name,
            arguments,
            directives,
            selection_set,
        })
    }
}

impl<'a> private::ParseNode<'a> for NamedType<'a> {
    #[inline]
    fn new_with_ctx(ctx: &mut private::ParserContext<'a>) -> ParseResult<NamedType<'a>> {
        if let Token::Name(name) = ctx.next() {
            Ok(NamedType { name })
        } else {
            Err(ASTKind::NamedType)
        }
    }
}

impl<'a> private::ParseNode<'a> for Selection<'a> {
    fn new_with_ctx(ctx: &mut private::ParserContext<'a>) -> ParseResult<Selection<'a>> {
        match ctx.peek() {
            Token::Name(_) => return Field::new_with_ctx(ctx).map(Selection::Field),
            Token::Ellipsis => {
                ctx.next();
            }
            _ => return Err(ASTKind::Selection),
        }
        match *ctx.peek() {
            Token::Name(name) if name != "on" => {
                ctx.next();
                let directives = Directives::new_with_ctx(ctx)?;
                Ok(Selection::FragmentSpread(FragmentSpread {
                    name: NamedType { name },
                    directives,
                }))
            }
            Token::Name(_) | Token::DirectiveName(_) | Token::BraceOpen => {
                let type_condition = if ctx.eat(Token::Name("on")) {
                    Some(NamedType::new_with_ctx(ctx)?)
                } else {
                    None
                };
                let directives = Directives::new_with_ctx(ctx)?;
                if !matches!(ctx.peek(), Token::BraceOpen) {
                    return Err(ASTKind::InlineFragment);
                }
                let selection_set = SelectionSet::new_with_ctx(ctx)?;
                Ok(Selection::InlineFragment(InlineFragment {
                    type_condition,
                    directives,
                    selection_set,
                }))
            }
            _ => Err(ASTKind::FragmentSpread),
        }
    }
}

impl<'a> private::ParseNode<'a> for SelectionSet<'a> {
    #[inline]
    fn new_with_ctx(ctx: &mut private::ParserContext<'a>) -> ParseResult<SelectionSet<'a>> {
        let selections = if ctx.eat(Token::BraceOpen) {
            let selections = parse_until(ctx, Token::BraceClose, Selection::new_with_ctx)?;
            if selections.is_empty() {
                return Err(ASTKind::Selection);
            }
            selections
        } else {
            Vec::new_in(ctx.arena)
        };
        Ok(SelectionSet { selections })
    }
}

impl<'a> private::ParseNode<'a> for Type<'a> {
    fn new_with_ctx(ctx: &mut private::ParserContext<'a>) -> ParseResult<Type<'a>> {
        let of_type = match ctx.next() {
            Token::BracketOpen => {
                let inner = Type::new_with_ctx(ctx)?;
                if !ctx.eat(Token::BracketClose) {
                    return Err(ASTKind::ListType);
                }
                Type::ListType(ctx.arena.alloc(inner))
            }
            Token::Name(name) => Type::NamedType(NamedType { name }),
            _ => return Err(ASTKind::Type),
        };
        if ctx.eat(Token::Exclam) {
            Ok(Type::NonNullType(ctx.arena.alloc(of_type)))
        } else {
            Ok(of_type)
        }
    }
}

impl<'a> private::ParseNode<'a> for VariableDefinition<'a> {
    #[inline]
    fn new_with_ctx(ctx: &mut private::ParserContext<'a>) -> ParseResult<VariableDefinition<'a>> {
        let variable = Variable::new_with_ctx(ctx)?;
        if !ctx.eat(Token::Colon) {
            return Err(ASTKind::VariableDefinition);
        }
        let of_type = Type::new_with_ctx(ctx)?;
        let default_value = if ctx.eat(Token::Equal) {
            ctx.in_var_def = true;
            let value = Value::new_with_ctx(ctx);
            ctx.in_var_def = false;
            value?
        } else {
            Value::Null
        };
        let directives = Directives::new_with_ctx(ctx)?;
        Ok(VariableDefinition {
            variable,
            of_type,
            default_value,
            directives,
        })
    }
}

impl<'a> private::ParseNode<'a> for VariableDefinitions<'a> {
    #[inline]
    fn new_with_ctx(ctx: &mut private::ParserContext<'a>) -> ParseResult<VariableDefinitions<'a>> {
        let children = if ctx.eat(Token::ParenOpen) {
            parse_until(ctx, Token::ParenClose, VariableDefinition::new_with_ctx)?
        } else {
            Vec::new_in(ctx.arena)
        };
        Ok(VariableDefinitions { children })
    }
}

impl<'a> private::ParseNode<'a> for FragmentDefinition<'a> {
    fn new_with_ctx(ctx: &mut private::ParserContext<'a>) -> ParseResult<FragmentDefinition<'a>> {
        if !ctx.eat(Token::Name("fragment")) {
            return Err(ASTKind::FragmentDefinition);
        }
        let name = match ctx.next() {
            Token::Name(name) if name != "on" => NamedType { name },
            _ => return Err(ASTKind::FragmentDefinition),
        };
        if !ctx.eat(Token::Name("on")) {
            return Err(ASTKind::FragmentDefinition);
        }
        let type_condition = NamedType::new_with_ctx(ctx)?;
        let directives = Directives::new_with_ctx(ctx)?;
        if !matches!(ctx.peek(), Token::BraceOpen) {
            return Err(ASTKind::FragmentDefinition);
        }
        let selection_set = SelectionSet::new_with_ctx(ctx)?;
        Ok(FragmentDefinition {
            name,
            type_condition,
            directives,
            selection_set,
        })
    }
}

impl<'a> private::ParseNode<'a> for OperationDefinition<'a> {
    fn new_with_ctx(ctx: &mut private::ParserContext<'a>) -> ParseResult<OperationDefinition<'a>> {
        let operation = match ctx.peek() {
            Token::BraceOpen => {
                let selection_set = SelectionSet::new_with_ctx(ctx)?;
                return Ok(OperationDefinition {
                    operation: OperationKind::Query,
                    name: None,
                    variable_definitions: VariableDefinitions::default_in(ctx.arena),
                    directives: Directives::default_in(ctx.arena),
                    selection_set,
                });
            }
            Token::Name("query") => OperationKind::Query,
            Token::Name("mutation") => OperationKind::Mutation,
            Token::Name("subscription") => OperationKind::Subscription,
            _ => return Err(ASTKind::OperationDefinition),
        };
        ctx.next();
        let name = match *ctx.peek() {
            Token::Name(name) => {
                ctx.next();
                Some(NamedType { name })
            }
            _ => None,
        };
        let variable_definitions = VariableDefinitions::new_with_ctx(ctx)?;
        let directives = Directives::new_with_ctx(ctx)?;
        if !matches!(ctx.peek(), Token::BraceOpen) {
            return Err(ASTKind::OperationDefinition);
        }
        let selection_set = SelectionSet::new_with_ctx(ctx)?;
        Ok(OperationDefinition {
            operation,
            name,
            variable_definitions,
            directives,
            selection_set,
        })
    }
}

impl<'a> private::ParseNode<'a> for Document<'a> {
    fn new_with_ctx(ctx: &mut private::ParserContext<'a>) -> ParseResult<Document<'a>> {
        let mut definitions = Vec::new_in(ctx.arena);
        loop {
            let definition = match ctx.peek() {
                Token::BraceOpen | Token::Name("query" | "mutation" | "subscription") => {
                    OperationDefinition::new_with_ctx(ctx).map(Definition::Operation)
                }
                Token::Name("fragment") => {
                    FragmentDefinition::new_with_ctx(ctx).map(Definition::Fragment)
                }
                Token::End => break,
                _ => Err(ASTKind::Definition),
            }?;
            definitions.push(definition);
        }
        if definitions.is_empty() {
            return Err(ASTKind::Document);
        }
        Ok(Document { definitions })
    }
}

#[cfg(test)]
mod tests {
    use super::{super::ast::*, ParseNode};
    use crate::error::{ErrorType, Location};

    fn operation<'a>(document: &'a Document<'a>) -> &'a OperationDefinition<'a> {
        match &document.definitions[0] {
            Definition::Operation(operation) => operation,
            Definition::Fragment(_) => panic!("expected an operation"),
        }
    }

    #[test]
    fn error_location() {
        let ctx = ASTContext::new();
        let error = Document::parse(&ctx, "query { document { $ }}").unwrap_err();
        assert_eq!(error.error_type(), ErrorType::Syntax);
        assert_eq!(
            *error.location(),
            Some(Location {
                line: 1,
                column: 19
            })
        );

        let error = Document::parse(&ctx, "query {\n  document {\n    $\n  }\n}").unwrap_err();
        assert_eq!(*error.location(), Some(Location { line: 3, column: 4 }));
    }

    #[test]
    fn empty_document() {
        let ctx = ASTContext::new();
        assert!(Document::parse(&ctx, "# nothing here").is_err());
        assert!(Document::parse(&ctx, "{ }").is_err());
    }

    #[test]
    fn values() {
        let ctx = ASTContext::new();
        let document = Document::parse(
            &ctx,
            r#"{ field(a: 1, b: 1.5, c: "x", d: true, e: null, f: ENUM, g: $var, h: [1, 2], i: { j: false }) }"#,
        )
        .unwrap();
        let field = operation(document).selection_set.selections[0]
            .field()
            .unwrap();
        let arguments = &field.arguments;
        assert_eq!(arguments.get("a"), Some(&Value::Int(IntValue { value: "1" })));
        assert_eq!(
            arguments.get("b"),
            Some(&Value::Float(FloatValue { value: "1.5" }))
        );
        assert_eq!(arguments.get("c").and_then(Value::as_str), Some("x"));
        assert_eq!(
            arguments.get("d"),
            Some(&Value::Boolean(BooleanValue { value: true }))
        );
        assert_eq!(arguments.get("e"), Some(&Value::Null));
        assert_eq!(
            arguments.get("f"),
            Some(&Value::Enum(EnumValue { value: "ENUM" }))
        );
        assert_eq!(
            arguments.get("g"),
            Some(&Value::Variable(Variable { name: "var" }))
        );
        assert!(matches!(arguments.get("h"), Some(Value::List(list)) if list.children.len() == 2));
        assert!(matches!(arguments.get("i"), Some(Value::Object(object)) if object.children[0].name == "j"));
    }

    #[test]
    fn selections() {
        let ctx = ASTContext::new();
        let document = Document::parse(
            &ctx,
            "query Q($id: ID!) { node(id: $id) { ...Frag @append ... on User { name } ... @skip(if: true) { id } } }",
        )
        .unwrap();
        let operation = operation(document);
        assert_eq!(operation.name, Some(NamedType { name: "Q" }));
        assert_eq!(operation.variable_definitions.children.len(), 1);
        let node = operation.selection_set.selections[0].field().unwrap();
        let selections = &node.selection_set.selections;
        assert!(matches!(
            &selections[0],
            Selection::FragmentSpread(spread) if spread.name.name == "Frag" && spread.directives.get("append").is_some()
        ));
        assert!(matches!(
            &selections[1],
            Selection::InlineFragment(InlineFragment { type_condition: Some(NamedType { name: "User" }), .. })
        ));
        assert!(matches!(
            &selections[2],
            Selection::InlineFragment(InlineFragment { type_condition: None, .. })
        ));
    }

    #[test]
    fn fragments_and_operations() {
        let ctx = ASTContext::new();
        let document = Document::parse(
            &ctx,
            "fragment UserFields on User { id }\nmutation AddUser { addUser { id } }",
        )
        .unwrap();
        assert_eq!(document.definitions.len(), 2);
        assert!(matches!(
            &document.definitions[0],
            Definition::Fragment(fragment) if fragment.type_condition.name == "User"
        ));
        assert!(matches!(
            &document.definitions[1],
            Definition::Operation(operation) if operation.operation == OperationKind::Mutation
        ));
    }

    #[test]
    fn variable_definition_defaults() {
        let ctx = ASTContext::new();
        assert!(Document::parse(&ctx, "query ($a: Int = 1) { a }").is_ok());
        assert!(Document::parse(&ctx, "query ($a: Int = $b) { a }").is_err());
    }
}
