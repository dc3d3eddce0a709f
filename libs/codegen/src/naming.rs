//! Case conversion and derived symbol names
//!
//! Word boundaries come from explicit separators (`_`, `-`) and from
//! lower→upper transitions and acronym runs inside compact identifiers, so
//! `"XMLHttpRequest"` segments into `XML`, `Http`, `Request`. Digits stay with
//! the word they follow. PascalCase and camelCase output keeps a `_` between
//! two words that would otherwise read back as one (`a_b` becomes `A_B`, not
//! `AB`), so every conversion is idempotent and snake → Pascal → snake
//! recovers the original words.

use heck::{ToLowerCamelCase, ToSnakeCase, ToUpperCamelCase};

/// Split an identifier into its words, original casing preserved
pub fn split_words(s: &str) -> Vec<String> {
    let chars: Vec<char> = s.chars().collect();
    let mut words = Vec::new();
    let mut current = String::new();

    for (i, &c) in chars.iter().enumerate() {
        if !c.is_ascii_alphanumeric() {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            continue;
        }
        if !current.is_empty() && c.is_ascii_uppercase() {
            let prev = chars[i - 1];
            let next_is_lower = chars.get(i + 1).is_some_and(|n| n.is_ascii_lowercase());
            let boundary = prev.is_ascii_lowercase()
                || prev.is_ascii_digit()
                || (prev.is_ascii_uppercase() && next_is_lower);
            if boundary {
                words.push(std::mem::take(&mut current));
            }
        }
        current.push(c);
    }
    if !current.is_empty() {
        words.push(current);
    }
    words
}

/// Join already-cased words, keeping a `_` wherever two neighbours would merge
fn join_compact(words: impl Iterator<Item = String>) -> String {
    let mut out = String::new();
    let mut prev: Option<String> = None;

    for word in words {
        if let Some(prev) = &prev {
            if split_words(&format!("{}{}", prev, word)) != [prev.as_str(), word.as_str()] {
                out.push('_');
            }
        }
        out.push_str(&word);
        prev = Some(word);
    }
    out
}

pub fn to_camel_case(s: &str) -> String {
    let words = split_words(s).into_iter().enumerate().map(|(i, w)| {
        if i == 0 {
            w.to_lower_camel_case()
        } else {
            w.to_upper_camel_case()
        }
    });
    join_compact(words)
}

pub fn to_pascal_case(s: &str) -> String {
    join_compact(split_words(s).into_iter().map(|w| w.to_upper_camel_case()))
}

pub fn to_snake_case(s: &str) -> String {
    split_words(s)
        .iter()
        .map(|w| w.to_snake_case())
        .collect::<Vec<_>>()
        .join("_")
}

pub fn to_kebab_case(s: &str) -> String {
    split_words(s)
        .iter()
        .map(|w| w.to_snake_case())
        .collect::<Vec<_>>()
        .join("-")
}

/// `<Entity>QueryBy<Attr>Input`
pub fn query_input_name(entity: &str, attributes: &[&str]) -> String {
    let by = attributes
        .iter()
        .map(|a| to_pascal_case(a))
        .collect::<Vec<_>>()
        .join("And");
    format!("{}QueryBy{}Input", entity, by)
}

/// `query<Entity>By<Attr>`, the operation answering a query-input type
pub fn query_operation_name(entity: &str, attributes: &[&str]) -> String {
    let by = attributes
        .iter()
        .map(|a| to_pascal_case(a))
        .collect::<Vec<_>>()
        .join("And");
    format!("query{}By{}", entity, by)
}

pub fn create_input_name(entity: &str) -> String {
    format!("Create{}Input", entity)
}

pub fn update_input_name(entity: &str) -> String {
    format!("Update{}Input", entity)
}

pub fn delete_input_name(entity: &str) -> String {
    format!("Delete{}Input", entity)
}

/// Envelope carrying a single entity
pub fn response_name(entity: &str) -> String {
    format!("{}Response", entity)
}

/// Envelope carrying a list of entities
pub fn list_response_name(entity: &str) -> String {
    format!("{}ListResponse", entity)
}

/// API-schema input variant of an embedded object type
pub fn input_variant_name(type_name: &str) -> String {
    format!("{}Input", type_name)
}

pub fn mutation_name(verb: &str, entity: &str) -> String {
    format!("{}{}", to_camel_case(verb), entity)
}

/// `<Entity>.model.<ext>`
pub fn model_file_name(entity: &str, ext: &str) -> String {
    format!("{}.model.{}", entity, ext)
}

/// `<Entity>.graphql.<ext>`
pub fn operations_file_name(entity: &str, ext: &str) -> String {
    format!("{}.graphql.{}", entity, ext)
}

/// `<Enum>.enum.<ext>`
pub fn enum_file_name(name: &str, ext: &str) -> String {
    format!("{}.enum.{}", name, ext)
}

/// Rust module name for a generated file stem such as `Widgets.model`
pub fn rust_module_name(file_stem: &str) -> String {
    to_snake_case(&file_stem.replace('.', "_"))
}

/// Sanitize a field name to be a valid Rust identifier
pub fn rust_field_name(name: &str) -> String {
    let snake = to_snake_case(name);

    if is_rust_keyword(&snake) {
        format!("r#{}", snake)
    } else {
        snake
    }
}

/// Check if a string is a Rust keyword
pub fn is_rust_keyword(s: &str) -> bool {
    matches!(
        s,
        "as" | "break"
            | "const"
            | "continue"
            | "crate"
            | "else"
            | "enum"
            | "extern"
            | "false"
            | "fn"
            | "for"
            | "if"
            | "impl"
            | "in"
            | "let"
            | "loop"
            | "match"
            | "mod"
            | "move"
            | "mut"
            | "pub"
            | "ref"
            | "return"
            | "self"
            | "Self"
            | "static"
            | "struct"
            | "super"
            | "trait"
            | "true"
            | "type"
            | "unsafe"
            | "use"
            | "where"
            | "while"
            | "async"
            | "await"
            | "dyn"
            | "abstract"
            | "become"
            | "box"
            | "do"
            | "final"
            | "macro"
            | "override"
            | "priv"
            | "typeof"
            | "unsized"
            | "virtual"
            | "yield"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn acronym_runs_split() {
        assert_eq!(to_snake_case("XMLHttpRequest"), "xml_http_request");
        assert_eq!(to_kebab_case("XMLHttpRequest"), "xml-http-request");
        assert_eq!(to_pascal_case("xml_http_request"), "XmlHttpRequest");
        assert_eq!(to_camel_case("XMLHttpRequest"), "xmlHttpRequest");
    }

    #[test]
    fn separators_split() {
        assert_eq!(to_pascal_case("status-index"), "StatusIndex");
        assert_eq!(to_camel_case("created_at"), "createdAt");
        assert_eq!(to_snake_case("widgetId"), "widget_id");
    }

    #[test]
    fn conversions_are_idempotent() {
        for s in ["widgetId", "createdAt", "xmlHttpRequest"] {
            assert_eq!(to_camel_case(s), s);
        }
        for s in ["Widgets", "UserStatus", "XmlHttpRequest", "A_B"] {
            assert_eq!(to_pascal_case(s), s);
        }
        for s in ["widget_id", "address2_line"] {
            assert_eq!(to_snake_case(s), s);
        }
        for s in ["status-index", "by-created-at"] {
            assert_eq!(to_kebab_case(s), s);
        }
    }

    #[test]
    fn snake_pascal_snake_round_trip() {
        for s in ["widget_id", "user_status", "address2_line", "v2_api"] {
            assert_eq!(to_snake_case(&to_pascal_case(s)), s);
        }
    }

    #[test]
    fn single_letter_words_survive_round_trip() {
        assert_eq!(to_pascal_case("a_b"), "A_B");
        assert_eq!(to_snake_case("A_B"), "a_b");
        assert_eq!(to_pascal_case("x_y_z"), "X_Y_Z");
        assert_eq!(to_camel_case("x_y_z"), "xY_Z");
        for s in ["a_b", "x_y_z", "a_bc", "ab_c", "id_2", "v_2x", "a1_b2"] {
            let pascal = to_pascal_case(s);
            assert_eq!(to_snake_case(&pascal), s, "via {}", pascal);
            assert_eq!(to_pascal_case(&pascal), pascal);
            let camel = to_camel_case(s);
            assert_eq!(to_snake_case(&camel), s, "via {}", camel);
            assert_eq!(to_camel_case(&camel), camel);
        }
    }

    #[test]
    fn words_keep_their_digits() {
        assert_eq!(split_words("Address2Line"), ["Address2", "Line"]);
        assert_eq!(split_words("XMLHttpRequest"), ["XML", "Http", "Request"]);
        assert_eq!(split_words("userID"), ["user", "ID"]);
        assert_eq!(split_words("status-index__v2"), ["status", "index", "v2"]);
    }

    #[test]
    fn derived_symbol_names() {
        assert_eq!(
            query_input_name("Widgets", &["widgetId"]),
            "WidgetsQueryByWidgetIdInput"
        );
        assert_eq!(
            query_input_name("Widgets", &["widgetId", "createdAt"]),
            "WidgetsQueryByWidgetIdAndCreatedAtInput"
        );
        assert_eq!(query_operation_name("Widgets", &["status"]), "queryWidgetsByStatus");
        assert_eq!(mutation_name("create", "Widgets"), "createWidgets");
        assert_eq!(rust_module_name("Widgets.model"), "widgets_model");
        assert_eq!(rust_module_name("UserStatus.enum"), "user_status_enum");
    }

    #[test]
    fn keywords_are_escaped() {
        assert_eq!(rust_field_name("type"), "r#type");
        assert_eq!(rust_field_name("createdAt"), "created_at");
    }
}
