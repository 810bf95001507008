use crate::analysis::ConnectionRegistry;
use crate::config::Config;
use crate::documents::CollectedDocument;
use crate::error::{Error, ErrorType, Result};
use hashbrown::HashMap;

/// A connection as it's seen from a spread of one of its insert or remove fragments.
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectionUsage {
    pub connection: String,
    pub free: bool,
}

/// The `ValidationContext` carrying the configuration, the known connections and a list of errors.
///
/// New errors are added to the list as validation continues, so that every finding across all
/// documents is reported together.
pub struct ValidationContext<'a> {
    pub config: Config,
    pub(crate) connections: HashMap<String, ConnectionUsage>,
    /// The document that's currently validated.
    pub document: Option<CollectedDocument<'a>>,
    pub errors: Vec<Error>,
}

impl<'a> ValidationContext<'a> {
    /// Create a new `ValidationContext` that knows no connections.
    pub fn new(config: &Config) -> Self {
        ValidationContext {
            config: config.clone(),
            connections: HashMap::new(),
            document: None,
            errors: Vec::new(),
        }
    }

    /// Create a new `ValidationContext` that knows the insert and remove fragments of every
    /// registered connection.
    pub fn with_connections(config: &Config, registry: &ConnectionRegistry<'a>) -> Self {
        let mut ctx = ValidationContext::new(config);
        for descriptor in registry.iter() {
            let usage = ConnectionUsage {
                connection: descriptor.name.to_string(),
                free: descriptor.free,
            };
            ctx.connections
                .insert(config.insert_fragment_name(descriptor.name), usage.clone());
            ctx.connections
                .insert(config.remove_fragment_name(descriptor.name), usage);
        }
        ctx
    }

    /// Returns the connection that a spread of the named fragment operates on.
    #[inline]
    pub fn connection(&self, fragment_name: &str) -> Option<&ConnectionUsage> {
        self.connections.get(fragment_name)
    }

    /// Returns the name of the currently validated document, for use in error messages.
    #[inline]
    pub fn document_name(&self) -> &'a str {
        self.document.map_or("document", |document| document.name)
    }

    /// Add an error to the list of errors in the `ValidationContext`.
    ///
    /// This is called inside of validation rules to add an error to the list and fail validation
    /// of the currently validating documents.
    pub fn add_error<S: Into<String>>(&mut self, message: S, error_type: ErrorType) {
        self.errors.push(Error::new(message, error_type));
    }

    /// Convert the context into a result which carries a batch of all errors if validation has
    /// failed.
    pub fn to_result(self) -> Result<()> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(Error::batch(self.errors))
        }
    }
}
