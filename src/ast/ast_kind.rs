use std::fmt;

macro_rules! ast_kinds {
    ($($(#[$doc:meta])* $kind:ident => $label:literal,)+) => {
        /// Identifies the kind of AST node or schema definition that was being parsed when a
        /// syntax error occurred, printed as a readable label.
        #[derive(Debug, PartialEq, Eq, Clone, Copy)]
        pub enum ASTKind {
            $($(#[$doc])* $kind,)+
        }

        impl fmt::Display for ASTKind {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(match self {
                    $(ASTKind::$kind => $label,)+
                })
            }
        }
    };
}

ast_kinds! {
    Definition => "Definition",
    Document => "Document",
    OperationDefinition => "Operation Definition",
    FragmentDefinition => "Fragment Definition",
    VariableDefinition => "Variable Definition",
    Type => "Type",
    NamedType => "Type Name",
    ListType => "List Type",
    Field => "Field",
    FragmentSpread => "Fragment Spread",
    InlineFragment => "Inline Fragment",
    Selection => "Selection",
    Directive => "Directive",
    Argument => "Argument",
    Object => "Object",
    ObjectField => "Object Field",
    Value => "Value",
    Variable => "Variable",
    List => "List",
    /// A `schema { ... }` block
    SchemaDefinition => "Schema Definition",
    /// A type, interface, union, enum, scalar or input definition
    TypeDefinition => "Type Definition",
    /// A field of an object, interface or input type
    FieldDefinition => "Field Definition",
    /// An argument of a field or directive definition
    InputValueDefinition => "Input Value Definition",
    /// A `directive @name on ...` definition, which is skipped
    DirectiveDefinition => "Directive Definition",
}
