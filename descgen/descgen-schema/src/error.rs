//! Generation-time errors. All of them are fatal.

/// Error raised while reading, resolving or assembling a schema.
///
/// `owner` is always the external name of the structure or object that
/// declares the offending member.
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    /// The IDL document is not a JSON object of records.
    #[error("failed to parse IDL document: {source}")]
    Parse {
        #[source]
        source: serde_json::Error,
    },

    /// A record of a known category has the wrong shape.
    #[error("malformed record '{name}': {source}")]
    Record {
        name: String,
        #[source]
        source: serde_json::Error,
    },

    /// Two records derive the same declaration name.
    #[error("records '{first}' and '{second}' both map to '{declaration_name}'")]
    DuplicateName {
        declaration_name: String,
        first: String,
        second: String,
    },

    /// A referenced type name has no matching node.
    #[error("cannot resolve type '{type_name}' of '{owner}'.'{member}'")]
    Unresolved {
        owner: String,
        member: String,
        type_name: String,
    },

    /// A default value cannot be expressed in the member's type.
    #[error("invalid default {value} for '{owner}'.'{member}': {reason}")]
    DefaultValue {
        owner: String,
        member: String,
        value: String,
        reason: String,
    },

    /// A member shape with no marshaling rule.
    #[error("unsupported member '{owner}'.'{member}': {shape}")]
    UnsupportedShape {
        owner: String,
        member: String,
        shape: String,
    },

    #[error("unknown annotation '{annotation}' on '{owner}'.'{member}'")]
    Annotation {
        owner: String,
        member: String,
        annotation: String,
    },

    /// An array member without a length member.
    #[error("array member '{owner}'.'{member}' has no length member")]
    MissingLength { owner: String, member: String },

    /// An array member names a length member that is absent or not an integer.
    #[error("length member '{length}' of '{owner}'.'{member}' is not an integer sibling")]
    UnknownLength {
        owner: String,
        member: String,
        length: String,
    },

    /// An enum or bitmask value that does not fit the native `uint32_t`.
    #[error("value '{name}' = {value} of '{owner}' is outside uint32_t")]
    ValueRange {
        owner: String,
        name: String,
        value: i64,
    },
}
