//! Identifier validation and quoting for dynamically generated SQL.
//!
//! Table and column names come from the source catalog at runtime. They
//! cannot be bound as statement parameters, so every name that ends up in
//! generated DDL/DML goes through [`quote_ident`], and every declared type
//! token goes through [`validate_type_token`].

/// Validate an identifier for security issues.
///
/// Rejects empty identifiers and identifiers containing null bytes. SQLite
/// itself imposes no length limit on names, so none is applied here.
pub fn validate_identifier(name: &str) -> Result<(), String> {
    if name.is_empty() {
        return Err("Identifier cannot be empty".to_string());
    }

    if name.contains('\0') {
        return Err(format!(
            "SECURITY: Identifier contains null byte (possible injection attempt): {:?}",
            name
        ));
    }

    Ok(())
}

/// Quote a SQLite identifier.
///
/// Escapes double quotes by doubling them and wraps in double quotes.
///
/// ```ignore
/// assert_eq!(quote_ident("users")?, "\"users\"");
/// assert_eq!(quote_ident("table\"name")?, "\"table\"\"name\"");
/// ```
pub fn quote_ident(name: &str) -> Result<String, String> {
    validate_identifier(name)?;
    Ok(format!("\"{}\"", name.replace('"', "\"\"")))
}

/// Validate a declared column type before splicing it into a CREATE TABLE.
///
/// SQLite accepts almost any token sequence as a type name, so this only
/// admits the shapes real schemas use: words, numbers, spaces, commas, signs
/// and balanced parentheses (`VARCHAR(20)`, `DECIMAL(10, 2)`,
/// `UNSIGNED BIG INT`). An empty token is valid and means "no declared type".
pub fn validate_type_token(token: &str) -> Result<(), String> {
    if token.contains(';') {
        return Err(format!(
            "SECURITY: Type contains semicolon (possible injection): {:?}",
            token
        ));
    }

    if token.contains("--") || token.contains("/*") || token.contains("*/") {
        return Err(format!(
            "SECURITY: Type contains SQL comment markers (possible injection): {:?}",
            token
        ));
    }

    let mut depth: i32 = 0;
    for ch in token.chars() {
        match ch {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth < 0 {
                    return Err(format!("Type has unbalanced parentheses: {:?}", token));
                }
            }
            c if c.is_alphanumeric() || c == '_' => {}
            ' ' | ',' | '+' | '-' | '.' => {}
            other => {
                return Err(format!(
                    "Type contains unsupported character {:?}: {:?}",
                    other, token
                ));
            }
        }
    }

    if depth != 0 {
        return Err(format!("Type has unbalanced parentheses: {:?}", token));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_identifier_normal() {
        assert!(validate_identifier("users").is_ok());
        assert!(validate_identifier("my_table").is_ok());
        assert!(validate_identifier("column with spaces").is_ok());
        assert!(validate_identifier("日本語").is_ok());
    }

    #[test]
    fn test_validate_identifier_rejects_empty() {
        let result = validate_identifier("");
        assert!(result.unwrap_err().contains("empty"));
    }

    #[test]
    fn test_validate_identifier_rejects_null_byte() {
        let result = validate_identifier("users\0; DROP TABLE x");
        assert!(result.unwrap_err().contains("null byte"));
    }

    #[test]
    fn test_validate_identifier_accepts_long_names() {
        let name = "a".repeat(1000);
        assert!(validate_identifier(&name).is_ok());
        assert_eq!(quote_ident(&name).unwrap().len(), 1002);
    }

    #[test]
    fn test_quote_ident_escapes_double_quote() {
        assert_eq!(quote_ident("users").unwrap(), "\"users\"");
        assert_eq!(quote_ident("table\"name").unwrap(), "\"table\"\"name\"");
    }

    #[test]
    fn test_quote_ident_sql_injection_safely_quoted() {
        assert_eq!(
            quote_ident("Robert\"); DROP TABLE Students;--").unwrap(),
            "\"Robert\"\"); DROP TABLE Students;--\""
        );
    }

    #[test]
    fn test_type_token_valid() {
        assert!(validate_type_token("").is_ok());
        assert!(validate_type_token("INTEGER").is_ok());
        assert!(validate_type_token("VARCHAR(20)").is_ok());
        assert!(validate_type_token("DECIMAL(10, 2)").is_ok());
        assert!(validate_type_token("UNSIGNED BIG INT").is_ok());
        assert!(validate_type_token("NUMERIC(-5, +3)").is_ok());
    }

    #[test]
    fn test_type_token_rejects_semicolon() {
        let result = validate_type_token("TEXT); DROP TABLE users");
        assert!(result.unwrap_err().contains("semicolon"));
    }

    #[test]
    fn test_type_token_rejects_comment() {
        assert!(validate_type_token("TEXT -- trailing").is_err());
        assert!(validate_type_token("TEXT /* x */").is_err());
    }

    #[test]
    fn test_type_token_rejects_unbalanced_parentheses() {
        assert!(validate_type_token("VARCHAR(20").is_err());
        assert!(validate_type_token("VARCHAR)20(").is_err());
    }

    #[test]
    fn test_type_token_rejects_quotes() {
        assert!(validate_type_token("TEXT DEFAULT 'x'").is_err());
        assert!(validate_type_token("\"TEXT\"").is_err());
    }
}
