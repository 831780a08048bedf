//! Book model

use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use crate::error::{AppError, AppResult, FieldError};

/// Book row as stored in the `book` table
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct Book {
    pub id: i64,
    pub title: String,
    pub author: String,
    pub genre: String,
    pub total_pages: i32,
}

/// Book representation returned to clients
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct BookResponse {
    pub id: i64,
    pub title: String,
    pub author: String,
    pub genre: String,
    pub total_pages: i32,
}

impl From<Book> for BookResponse {
    fn from(book: Book) -> Self {
        Self {
            id: book.id,
            title: book.title,
            author: book.author,
            genre: book.genre,
            total_pages: book.total_pages,
        }
    }
}

/// Create / update book request body.
///
/// Fields are kept loosely typed at decode time so that every missing or
/// malformed field can be reported at once by [`BookPayload::into_new_book`].
/// Keys other than these four are rejected while decoding.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct BookPayload {
    #[schema(value_type = String, max_length = 100)]
    pub title: Option<Value>,
    #[schema(value_type = String, max_length = 100)]
    pub author: Option<Value>,
    #[schema(value_type = String, max_length = 100)]
    pub genre: Option<Value>,
    /// Page count; integral numbers and numeric strings are accepted
    #[schema(value_type = i32, minimum = 0)]
    pub total_pages: Option<Value>,
}

/// Checked book fields, ready to be written to storage
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBook {
    pub title: String,
    pub author: String,
    pub genre: String,
    pub total_pages: i32,
}

/// Payload fields after decoding, `None` where decoding failed.
/// Length and range limits only apply to the fields that are present.
#[derive(Debug, Validate)]
struct DecodedFields {
    #[validate(length(min = 1, max = 100, message = "must be between 1 and 100 characters"))]
    title: Option<String>,
    #[validate(length(min = 1, max = 100, message = "must be between 1 and 100 characters"))]
    author: Option<String>,
    #[validate(length(min = 1, max = 100, message = "must be between 1 and 100 characters"))]
    genre: Option<String>,
    #[validate(range(min = 0, message = "must not be negative"))]
    total_pages: Option<i32>,
}

/// Order in which field errors are reported
const FIELD_ORDER: [&str; 4] = ["title", "author", "genre", "total_pages"];

impl BookPayload {
    /// Validate the payload, collecting an error for every offending field
    pub fn into_new_book(self) -> AppResult<NewBook> {
        let mut errors = Vec::new();

        let decoded = DecodedFields {
            title: required_string("title", self.title, &mut errors),
            author: required_string("author", self.author, &mut errors),
            genre: required_string("genre", self.genre, &mut errors),
            total_pages: required_integer("total_pages", self.total_pages, &mut errors),
        };

        if let Err(validation) = decoded.validate() {
            for (field, errs) in validation.field_errors() {
                let field = field.to_string();
                errors.extend(errs.iter().map(|e| {
                    let message = e
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| e.code.to_string());
                    FieldError::new(field.clone(), message)
                }));
            }
        }

        errors.sort_by_key(|e| FIELD_ORDER.iter().position(|f| *f == e.field));

        match decoded {
            DecodedFields {
                title: Some(title),
                author: Some(author),
                genre: Some(genre),
                total_pages: Some(total_pages),
            } if errors.is_empty() => Ok(NewBook {
                title,
                author,
                genre,
                total_pages,
            }),
            _ => Err(AppError::InvalidFields(errors)),
        }
    }
}

fn required_string(
    field: &str,
    value: Option<Value>,
    errors: &mut Vec<FieldError>,
) -> Option<String> {
    match value {
        None => {
            errors.push(FieldError::new(field, "is required"));
            None
        }
        Some(Value::String(s)) if s.trim().is_empty() => {
            errors.push(FieldError::new(field, "must not be blank"));
            None
        }
        Some(Value::String(s)) => Some(s),
        Some(_) => {
            errors.push(FieldError::new(field, "must be a string"));
            None
        }
    }
}

fn required_integer(
    field: &str,
    value: Option<Value>,
    errors: &mut Vec<FieldError>,
) -> Option<i32> {
    let Some(value) = value else {
        errors.push(FieldError::new(field, "is required"));
        return None;
    };

    let Some(n) = coerce_integer(&value) else {
        errors.push(FieldError::new(field, "must be an integer"));
        return None;
    };

    match i32::try_from(n) {
        Ok(n) => Some(n),
        Err(_) => {
            errors.push(FieldError::new(field, "is out of range"));
            None
        }
    }
}

/// Accepts JSON integers, floats without a fractional part and numeric strings
fn coerce_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.is_finite() && f.fract() == 0.0)
                .map(|f| f as i64)
        }),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}

/// Parse a book id taken from a path segment
pub fn parse_book_id(raw: &str) -> AppResult<i64> {
    let invalid = || AppError::Validation(format!("Invalid book id '{}': expected a positive integer", raw));

    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }

    match raw.parse::<i64>() {
        Ok(id) if id > 0 => Ok(id),
        _ => Err(invalid()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload(value: Value) -> BookPayload {
        serde_json::from_value(value).unwrap()
    }

    fn field_names(err: AppError) -> Vec<String> {
        match err {
            AppError::InvalidFields(fields) => fields.into_iter().map(|f| f.field).collect(),
            other => panic!("expected InvalidFields, got {:?}", other),
        }
    }

    #[test]
    fn test_valid_payload() {
        let book = payload(json!({
            "title": "Dune",
            "author": "Herbert",
            "genre": "SciFi",
            "total_pages": 412
        }))
        .into_new_book()
        .unwrap();

        assert_eq!(
            book,
            NewBook {
                title: "Dune".to_string(),
                author: "Herbert".to_string(),
                genre: "SciFi".to_string(),
                total_pages: 412,
            }
        );
    }

    #[test]
    fn test_total_pages_coercion() {
        let base = |pages: Value| {
            payload(json!({"title": "t", "author": "a", "genre": "g", "total_pages": pages}))
                .into_new_book()
        };

        assert_eq!(base(json!("300")).unwrap().total_pages, 300);
        assert_eq!(base(json!(" 42 ")).unwrap().total_pages, 42);
        assert_eq!(base(json!(120.0)).unwrap().total_pages, 120);
        assert_eq!(field_names(base(json!(12.5)).unwrap_err()), vec!["total_pages"]);
        assert_eq!(field_names(base(json!("many")).unwrap_err()), vec!["total_pages"]);
        assert_eq!(field_names(base(json!(true)).unwrap_err()), vec!["total_pages"]);
        assert_eq!(
            field_names(base(json!(10_000_000_000_i64)).unwrap_err()),
            vec!["total_pages"]
        );
        assert_eq!(field_names(base(json!(-1)).unwrap_err()), vec!["total_pages"]);
    }

    #[test]
    fn test_missing_fields_are_all_reported() {
        let err = payload(json!({"author": "Herbert"})).into_new_book().unwrap_err();
        assert_eq!(field_names(err), vec!["title", "genre", "total_pages"]);
    }

    #[test]
    fn test_null_counts_as_missing() {
        let err = payload(json!({
            "title": null,
            "author": "a",
            "genre": "g",
            "total_pages": 1
        }))
        .into_new_book()
        .unwrap_err();
        assert_eq!(field_names(err), vec!["title"]);
    }

    #[test]
    fn test_blank_and_wrong_type_strings() {
        let err = payload(json!({
            "title": "   ",
            "author": 7,
            "genre": "g",
            "total_pages": 1
        }))
        .into_new_book()
        .unwrap_err();
        assert_eq!(field_names(err), vec!["title", "author"]);
    }

    #[test]
    fn test_length_limit() {
        let long = "x".repeat(101);
        let err = payload(json!({
            "title": long,
            "author": "a",
            "genre": "g",
            "total_pages": 1
        }))
        .into_new_book()
        .unwrap_err();
        assert_eq!(field_names(err), vec!["title"]);

        let exact = "é".repeat(100);
        assert!(payload(json!({
            "title": exact,
            "author": "a",
            "genre": "g",
            "total_pages": 1
        }))
        .into_new_book()
        .is_ok());
    }

    #[test]
    fn test_decode_and_limit_errors_reported_together() {
        let err = payload(json!({
            "title": "x".repeat(101),
            "author": "a",
            "total_pages": -5
        }))
        .into_new_book()
        .unwrap_err();
        assert_eq!(field_names(err), vec!["title", "genre", "total_pages"]);

        let err = payload(json!({
            "title": "t",
            "author": "a".repeat(150),
            "genre": 3,
            "total_pages": "ten"
        }))
        .into_new_book()
        .unwrap_err();
        assert_eq!(field_names(err), vec!["author", "genre", "total_pages"]);
    }

    #[test]
    fn test_unknown_fields_rejected() {
        let result: Result<BookPayload, _> = serde_json::from_value(json!({
            "title": "t",
            "author": "a",
            "genre": "g",
            "total_pages": 1,
            "isbn": "123"
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_response_projection() {
        let book = Book {
            id: 3,
            title: "Dune".to_string(),
            author: "Herbert".to_string(),
            genre: "SciFi".to_string(),
            total_pages: 412,
        };
        let json = serde_json::to_value(BookResponse::from(book)).unwrap();
        assert_eq!(
            json,
            json!({
                "id": 3,
                "title": "Dune",
                "author": "Herbert",
                "genre": "SciFi",
                "total_pages": 412
            })
        );
    }

    #[test]
    fn test_parse_book_id() {
        assert_eq!(parse_book_id("1").unwrap(), 1);
        assert_eq!(parse_book_id("0042").unwrap(), 42);
        assert!(parse_book_id("").is_err());
        assert!(parse_book_id("0").is_err());
        assert!(parse_book_id("-1").is_err());
        assert!(parse_book_id("+1").is_err());
        assert!(parse_book_id("abc").is_err());
        assert!(parse_book_id("1.5").is_err());
        assert!(parse_book_id("99999999999999999999").is_err());
    }
}
