//! Error types for offstat.

/// Creates the Error, ErrorKind, ResultExt, and Result types
error_chain! {
    errors {
        MissingInput(what: String) {
            description("required input is absent")
            display("missing input: {}", what)
        }
        MalformedValue(field: String, raw: String) {
            description("value failed to parse")
            display("malformed {}: {:?}", field, raw)
        }
        EmptyGroup(group: String) {
            description("group has no contributing value")
            display("empty group: {}", group)
        }
        SchemaMismatch(source: String, column: String) {
            description("expected column is missing")
            display("{} has no column {}", source, column)
        }
        InvalidSetting(reason: String) {
            description("invalid setting")
            display("invalid setting: {}", reason)
        }
    }

    foreign_links {
        Io(::std::io::Error);
        Csv(::csv::Error);
        Toml(::toml::de::Error);
    }
}
